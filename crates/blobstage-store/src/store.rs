use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blobstage_crypto::digest_reader;
use blobstage_types::{Descriptor, Digest, DEFAULT_BLOB_MEDIA_TYPE};
use tracing::instrument;

use crate::config::StoreConfig;
use crate::error::{IoContext, StoreError, StoreResult};
use crate::path::PathResolver;
use crate::reader::SizedReaderAt;
use crate::registry::DescriptorRegistry;
use crate::traits::{ContentWriter, Ingester, Provider, ReaderAt};
use crate::writer::{FileWriter, WriteMode, WriterOptions};

/// Content store over a local directory.
///
/// Objects live as ordinary files at `root/<name>` (or wherever a name was
/// explicitly mapped). Digests verify content but do not decide where it is
/// stored. Descriptor and path state is kept in memory for the lifetime of
/// the store.
pub struct FileStore {
    config: StoreConfig,
    paths: PathResolver,
    registry: Arc<DescriptorRegistry>,
}

impl FileStore {
    /// Store rooted at `root` with default options.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(StoreConfig::new(root))
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            paths: PathResolver::new(config.root.clone()),
            registry: Arc::new(DescriptorRegistry::new()),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    /// Register an existing file under `name`.
    ///
    /// `media_type` defaults to [`DEFAULT_BLOB_MEDIA_TYPE`] and `path` to
    /// `name` when empty. The file is hashed in full and its descriptor,
    /// titled `name`, is registered and returned.
    #[instrument(skip(self, path), level = "debug")]
    pub fn add(
        &self,
        name: &str,
        media_type: &str,
        path: impl AsRef<Path>,
    ) -> StoreResult<Descriptor> {
        let media_type = if media_type.is_empty() {
            DEFAULT_BLOB_MEDIA_TYPE
        } else {
            media_type
        };
        let path = path.as_ref();
        let path = if path.as_os_str().is_empty() {
            Path::new(name)
        } else {
            path
        };
        let path = self.paths.map_path(name, path);

        let metadata = fs::metadata(&path).io_context(|| format!("stat {}", path.display()))?;
        let file = File::open(&path).io_context(|| format!("open {}", path.display()))?;
        let digest = digest_reader(self.config.algorithm, io::BufReader::new(file))
            .io_context(|| format!("hash {}", path.display()))?;

        let desc = Descriptor::new(media_type, digest.clone(), metadata.len()).with_name(name);
        self.registry.set(digest, desc.clone());
        Ok(desc)
    }

    /// Record `name -> path` (relative paths resolve under the root).
    pub fn map_path(&self, name: &str, path: impl AsRef<Path>) -> PathBuf {
        self.paths.map_path(name, path)
    }

    /// Filesystem path for `name`.
    pub fn resolve_path(&self, name: &str) -> PathBuf {
        self.paths.resolve_path(name)
    }

    /// Registered descriptor for `digest`, if any.
    pub fn get(&self, digest: &Digest) -> Option<Descriptor> {
        self.registry.get(digest)
    }

    /// All registered descriptors, sorted by digest.
    pub fn descriptors(&self) -> Vec<Descriptor> {
        self.registry.descriptors()
    }

    /// Open a registered blob for reading.
    ///
    /// The registry's copy of the descriptor decides the name and size, not
    /// the one passed in.
    pub fn open_reader(&self, desc: &Descriptor) -> StoreResult<SizedReaderAt> {
        let digest = desc
            .digest
            .as_ref()
            .ok_or_else(|| StoreError::DescriptorNotFound("<no digest>".to_string()))?;
        let desc = self
            .registry
            .get(digest)
            .ok_or_else(|| StoreError::DescriptorNotFound(digest.to_string()))?;
        let name = desc.name().ok_or(StoreError::NameMissing)?;
        let path = self.paths.resolve_path(name);
        let file = File::open(&path).io_context(|| format!("open {}", path.display()))?;
        Ok(SizedReaderAt::new(file, desc.size))
    }

    /// Open a write session for the descriptor in `opts`.
    ///
    /// Safety checks run before the filesystem is touched: the target must
    /// resolve inside the root (unless traversal is allowed) and must not
    /// exist (when overwrite is disabled).
    #[instrument(skip(self), level = "debug")]
    pub fn open_writer(&self, opts: WriterOptions) -> StoreResult<FileWriter> {
        let name = opts
            .descriptor
            .name()
            .ok_or(StoreError::NameMissing)?
            .to_string();
        let path = self.paths.resolve_path(&name);

        if !self.config.allow_path_traversal_on_write {
            self.paths.check_traversal(&path)?;
        }
        if self.config.disable_overwrite {
            match fs::metadata(&path) {
                Ok(_) => return Err(StoreError::OverwriteDisallowed(path)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(format!("stat {}", path.display()), e)),
            }
        }

        let reference = opts.reference.unwrap_or_else(|| name.clone());
        let registry = Arc::clone(&self.registry);
        let algorithm = self.config.algorithm;
        match opts.mode {
            WriteMode::Truncate => {
                FileWriter::create(registry, path, opts.descriptor, reference, algorithm)
            }
            WriteMode::Resume => {
                FileWriter::resume(registry, path, opts.descriptor, reference, algorithm)
            }
        }
    }
}

impl Provider for FileStore {
    fn reader_at(&self, desc: &Descriptor) -> StoreResult<Box<dyn ReaderAt>> {
        Ok(Box::new(self.open_reader(desc)?))
    }
}

impl Ingester for FileStore {
    fn writer(&self, opts: WriterOptions) -> StoreResult<Box<dyn ContentWriter>> {
        Ok(Box::new(self.open_writer(opts)?))
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("config", &self.config)
            .field("descriptor_count", &self.registry.len())
            .finish()
    }
}
