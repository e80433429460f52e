//! Foundation types for blobstage.
//!
//! Every other blobstage crate depends on `blobstage-types`.
//!
//! # Key Types
//!
//! - [`Digest`] — algorithm-tagged content hash (`sha256:<hex>`)
//! - [`Algorithm`] — supported hash algorithms
//! - [`Descriptor`] — media type, digest, size and annotations of a stored object

pub mod descriptor;
pub mod digest;
pub mod error;

pub use descriptor::{Descriptor, ANNOTATION_TITLE, DEFAULT_BLOB_MEDIA_TYPE};
pub use digest::{Algorithm, Digest};
pub use error::TypeError;
