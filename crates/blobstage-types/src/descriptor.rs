use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::digest::Digest;

/// Annotation key holding an object's logical name.
pub const ANNOTATION_TITLE: &str = "org.opencontainers.image.title";

/// Media type applied to blobs registered without one.
pub const DEFAULT_BLOB_MEDIA_TYPE: &str = "application/vnd.oci.image.layer.v1.tar";

/// Metadata record identifying a stored object.
///
/// Serialized with OCI field names so descriptors can be handed to packaging
/// tools unchanged. `digest` is `None` and `size` is `0` only on the target of
/// a write that has not been committed yet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Descriptor {
    /// Create a descriptor for known content.
    pub fn new(media_type: impl Into<String>, digest: Digest, size: u64) -> Self {
        Self {
            media_type: media_type.into(),
            digest: Some(digest),
            size,
            annotations: BTreeMap::new(),
        }
    }

    /// Create a write target carrying only a logical name.
    ///
    /// Media type falls back to [`DEFAULT_BLOB_MEDIA_TYPE`]; digest and size
    /// are unknown until the write is committed.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            media_type: DEFAULT_BLOB_MEDIA_TYPE.to_string(),
            ..Default::default()
        }
        .with_name(name)
    }

    /// Set the title annotation.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.annotations
            .insert(ANNOTATION_TITLE.to_string(), name.into());
        self
    }

    pub fn with_digest(mut self, digest: Digest) -> Self {
        self.digest = Some(digest);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    /// The logical name from the title annotation, if any.
    ///
    /// An empty title counts as missing.
    pub fn name(&self) -> Option<&str> {
        self.annotations
            .get(ANNOTATION_TITLE)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }
}
