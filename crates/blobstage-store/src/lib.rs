//! Local filesystem content store for blobstage.
//!
//! A staging area that maps logical names to files under a root directory
//! and tracks a descriptor (media type, digest, size, name) for every blob it
//! knows about. New blobs are written through a [`FileWriter`] session whose
//! content is hashed as it streams and only becomes visible once
//! [`ContentWriter::commit`] has verified its size and digest.
//!
//! # Capabilities
//!
//! - [`Provider`] -- readable handles for registered descriptors
//! - [`Ingester`] -- write sessions for new content
//!
//! [`FileStore`] implements both.
//!
//! # Safety checks on write
//!
//! 1. A write target must resolve inside the store root, unless
//!    [`StoreConfig::allow_path_traversal_on_write`] is set.
//! 2. With [`StoreConfig::disable_overwrite`], an existing file is never
//!    opened for writing.
//!
//! Both are checked before anything is created on disk.
//!
//! # Not provided
//!
//! Storage is not sharded by digest, state is not persisted across restarts,
//! and files left behind by failed or abandoned writes are not cleaned up.

pub mod config;
pub mod error;
pub mod path;
pub mod reader;
pub mod registry;
pub mod store;
pub mod traits;
pub mod writer;

// Re-export primary types at crate root for ergonomic imports.
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use path::PathResolver;
pub use reader::SizedReaderAt;
pub use registry::DescriptorRegistry;
pub use store::FileStore;
pub use traits::{ContentWriter, Ingester, Provider, ReaderAt};
pub use writer::{FileWriter, Status, WriteMode, WriterOptions};
