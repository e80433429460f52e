use std::fs::File;
use std::io::{self, Read};

use crate::traits::ReaderAt;

/// Read handle over a stored file, bounded by the descriptor's recorded size.
///
/// Positional reads do not move any cursor and may be issued from several
/// threads. The handle does not clamp reads to [`ReaderAt::size`]; staying
/// within it is up to the caller. The `io::Read` impl keeps its own cursor for
/// sequential consumers.
#[derive(Debug)]
pub struct SizedReaderAt {
    file: File,
    size: u64,
    position: u64,
}

impl SizedReaderAt {
    pub(crate) fn new(file: File, size: u64) -> Self {
        Self {
            file,
            size,
            position: 0,
        }
    }
}

impl ReaderAt for SizedReaderAt {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        pread(&self.file, buf, offset)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(unix)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

impl Read for SizedReaderAt {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.read_at(buf, self.position)?;
        self.position += n as u64;
        Ok(n)
    }
}
