//! Write sessions: stream bytes to a file, hash them, verify and register on
//! commit.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blobstage_crypto::{digest_reader, Digester};
use blobstage_types::{Algorithm, Descriptor, Digest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{IoContext, StoreError, StoreResult};
use crate::registry::DescriptorRegistry;
use crate::traits::ContentWriter;

/// Progress of a write session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Logical reference of the session (the target's name by default).
    #[serde(rename = "ref")]
    pub reference: String,
    /// Expected size from the target descriptor; `0` if unknown.
    pub total: u64,
    /// Bytes written so far.
    pub offset: u64,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What happens to an existing file when a writer is opened on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Create or truncate the file; earlier bytes are discarded.
    #[default]
    Truncate,
    /// Keep existing bytes, replay them through the digester, and continue
    /// writing after them.
    Resume,
}

/// Options for opening a writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriterOptions {
    /// Target descriptor. Must carry a title annotation; digest and size may
    /// be unknown.
    pub descriptor: Descriptor,
    /// Status reference; defaults to the target's name.
    pub reference: Option<String>,
    pub mode: WriteMode,
}

impl WriterOptions {
    pub fn new(descriptor: Descriptor) -> Self {
        Self {
            descriptor,
            reference: None,
            mode: WriteMode::default(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A write session backed by a file.
///
/// Lifecycle: open → writing → committed, or closed without commit. After
/// either terminal transition the sink is released and further writes fail.
/// Two sessions on the same path are not coordinated; the last to commit
/// determines what is on disk.
pub struct FileWriter {
    registry: Arc<DescriptorRegistry>,
    file: Option<File>,
    path: PathBuf,
    desc: Descriptor,
    digester: Digester,
    status: Status,
    committed: bool,
}

impl FileWriter {
    /// Create (or truncate) the file at `path`, making parent directories.
    pub(crate) fn create(
        registry: Arc<DescriptorRegistry>,
        path: PathBuf,
        desc: Descriptor,
        reference: String,
        algorithm: Algorithm,
    ) -> StoreResult<Self> {
        create_parent_dirs(&path)?;
        let file = File::create(&path).io_context(|| format!("create {}", path.display()))?;
        Ok(Self::from_parts(
            registry,
            file,
            path,
            desc,
            reference,
            Digester::new(algorithm),
            0,
        ))
    }

    /// Open the file at `path` keeping its contents; the digester and offset
    /// are restored by reading it back. A missing file is created.
    pub(crate) fn resume(
        registry: Arc<DescriptorRegistry>,
        path: PathBuf,
        desc: Descriptor,
        reference: String,
        algorithm: Algorithm,
    ) -> StoreResult<Self> {
        create_parent_dirs(&path)?;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .io_context(|| format!("open {}", path.display()))?;
        let mut digester = Digester::new(algorithm);
        let offset = io::copy(&mut file, &mut digester)
            .io_context(|| format!("replay {}", path.display()))?;
        tracing::debug!(path = %path.display(), offset, "resumed write session");
        Ok(Self::from_parts(
            registry, file, path, desc, reference, digester, offset,
        ))
    }

    fn from_parts(
        registry: Arc<DescriptorRegistry>,
        file: File,
        path: PathBuf,
        desc: Descriptor,
        reference: String,
        digester: Digester,
        offset: u64,
    ) -> Self {
        let now = Utc::now();
        let status = Status {
            reference,
            total: desc.size,
            offset,
            started_at: now,
            updated_at: now,
        };
        Self {
            registry,
            file: Some(file),
            path,
            desc,
            digester,
            status,
            committed: false,
        }
    }

    /// Path of the file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` once a commit has succeeded.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// `true` while the sink is open (not yet committed or closed).
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl ContentWriter for FileWriter {
    fn status(&self) -> Status {
        self.status.clone()
    }

    fn digest(&self) -> Digest {
        self.digester.digest()
    }

    fn commit(
        &mut self,
        expected_size: u64,
        expected_digest: Option<&Digest>,
    ) -> StoreResult<()> {
        let file = self.file.take().ok_or_else(|| {
            StoreError::Precondition("cannot commit on closed writer".to_string())
        })?;

        file.sync_all().io_context(|| "sync failed")?;
        let metadata = file.metadata().io_context(|| "stat failed")?;
        drop(file);

        let size = metadata.len();
        if expected_size > 0 && expected_size != size {
            return Err(StoreError::Precondition(format!(
                "unexpected commit size {size}, expected {expected_size}"
            )));
        }
        // An expected digest in another algorithm is checked against the file
        // re-hashed in that algorithm.
        let digest = match expected_digest {
            Some(expected) if expected.algorithm() != self.digester.algorithm() => {
                let file = File::open(&self.path)
                    .io_context(|| format!("open {}", self.path.display()))?;
                digest_reader(expected.algorithm(), io::BufReader::new(file))
                    .io_context(|| format!("hash {}", self.path.display()))?
            }
            _ => self.digester.digest(),
        };
        if let Some(expected) = expected_digest {
            if *expected != digest {
                return Err(StoreError::Precondition(format!(
                    "unexpected commit digest {digest}, expected {expected}"
                )));
            }
        }

        let mut desc = self.desc.clone();
        desc.digest = Some(digest.clone());
        desc.size = size;
        self.registry.set(digest, desc);
        self.committed = true;
        tracing::debug!(path = %self.path.display(), size, "committed");
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        if let Err(e) = file.sync_all() {
            tracing::warn!(path = %self.path.display(), error = %e, "sync on close failed");
        }
        Ok(())
    }

    fn truncate(&mut self, size: u64) -> StoreResult<()> {
        if size != 0 {
            return Err(StoreError::UnsupportedSize(size));
        }
        let file = self.file.as_mut().ok_or_else(|| {
            StoreError::Precondition("cannot truncate closed writer".to_string())
        })?;
        file.seek(SeekFrom::Start(0)).io_context(|| "seek failed")?;
        file.set_len(0).io_context(|| "truncate failed")?;
        self.status.offset = 0;
        self.digester.reset();
        Ok(())
    }
}

impl Write for FileWriter {
    /// Writes all of `buf` unless the sink fails. Only bytes that reached the
    /// file are hashed, but the offset always advances by `buf.len()`.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("write on closed writer"))?;

        let mut written = 0;
        let result = loop {
            if written == buf.len() {
                break Ok(buf.len());
            }
            match file.write(&buf[written..]) {
                Ok(0) => break Err(io::Error::from(io::ErrorKind::WriteZero)),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => break Err(e),
            }
        };

        self.digester.update(&buf[..written]);
        self.status.offset += buf.len() as u64;
        self.status.updated_at = Utc::now();
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for FileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWriter")
            .field("path", &self.path)
            .field("offset", &self.status.offset)
            .field("open", &self.is_open())
            .field("committed", &self.committed)
            .finish()
    }
}

fn create_parent_dirs(path: &Path) -> StoreResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .io_context(|| format!("create directory {}", parent.display())),
        _ => Ok(()),
    }
}
