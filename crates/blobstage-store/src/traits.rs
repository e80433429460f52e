use std::io;

use blobstage_types::{Descriptor, Digest};

use crate::error::StoreResult;
use crate::writer::{Status, WriterOptions};

/// Positional read access to a blob of known size.
pub trait ReaderAt: Send + Sync {
    /// Read into `buf` starting at `offset`, returning the number of bytes
    /// read. `Ok(0)` means end of file.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Size recorded in the descriptor the handle was opened for.
    fn size(&self) -> u64;
}

/// A write session producing one blob.
///
/// `write` calls must be sequential; `&mut self` enforces that, and keeps
/// [`ContentWriter::digest`] from racing with a write.
pub trait ContentWriter: io::Write + Send {
    /// Snapshot of the session's progress.
    fn status(&self) -> Status;

    /// Digest of the bytes written so far.
    fn digest(&self) -> Digest;

    /// Flush, verify, and register the written content.
    ///
    /// `expected_size == 0` and `expected_digest == None` skip the respective
    /// check. Succeeds at most once per session.
    fn commit(&mut self, expected_size: u64, expected_digest: Option<&Digest>)
        -> StoreResult<()>;

    /// Release the sink without verifying or registering. Idempotent.
    fn close(&mut self) -> StoreResult<()>;

    /// Discard everything written. Only `size == 0` is supported.
    fn truncate(&mut self, size: u64) -> StoreResult<()>;
}

/// Produces readable handles for registered descriptors.
///
/// Calls are synchronous and cannot be cancelled once started.
pub trait Provider: Send + Sync {
    fn reader_at(&self, desc: &Descriptor) -> StoreResult<Box<dyn ReaderAt>>;
}

/// Produces write sessions for new content.
///
/// Calls are synchronous and cannot be cancelled once started; abandon a
/// session with [`ContentWriter::close`].
pub trait Ingester: Send + Sync {
    fn writer(&self, opts: WriterOptions) -> StoreResult<Box<dyn ContentWriter>>;
}
