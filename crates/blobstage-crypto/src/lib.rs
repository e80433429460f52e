//! Content digesters for blobstage.
//!
//! Wraps `sha2` and `blake3` behind a single incremental [`Digester`] that
//! produces algorithm-tagged [`Digest`](blobstage_types::Digest) values.
//! No custom cryptography.

pub mod digester;

pub use digester::{digest_bytes, digest_reader, Digester};
