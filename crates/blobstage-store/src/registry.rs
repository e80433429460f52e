use std::collections::HashMap;
use std::sync::RwLock;

use blobstage_types::{Descriptor, Digest};

/// Concurrent digest → descriptor map.
///
/// The authoritative record of which blobs exist in a store. Inserting a
/// descriptor whose digest is already present replaces the earlier entry.
/// Only fully verified descriptors (with a digest) are ever inserted.
pub struct DescriptorRegistry {
    descriptors: RwLock<HashMap<Digest, Descriptor>>,
}

impl DescriptorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            descriptors: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a descriptor by digest.
    pub fn get(&self, digest: &Digest) -> Option<Descriptor> {
        self.descriptors
            .read()
            .expect("lock poisoned")
            .get(digest)
            .cloned()
    }

    /// Register `descriptor` under `digest`, replacing any previous entry.
    pub fn set(&self, digest: Digest, descriptor: Descriptor) {
        tracing::debug!(%digest, size = descriptor.size, "registered descriptor");
        self.descriptors
            .write()
            .expect("lock poisoned")
            .insert(digest, descriptor);
    }

    pub fn contains(&self, digest: &Digest) -> bool {
        self.descriptors
            .read()
            .expect("lock poisoned")
            .contains_key(digest)
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.read().expect("lock poisoned").len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.read().expect("lock poisoned").is_empty()
    }

    /// All registered descriptors, sorted by digest.
    pub fn descriptors(&self) -> Vec<Descriptor> {
        let map = self.descriptors.read().expect("lock poisoned");
        let mut entries: Vec<(&Digest, &Descriptor)> = map.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, desc)| desc.clone()).collect()
    }
}

impl Default for DescriptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DescriptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorRegistry")
            .field("descriptor_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobstage_crypto::digest_bytes;
    use blobstage_types::Algorithm;

    fn make(content: &[u8], name: &str) -> (Digest, Descriptor) {
        let digest = digest_bytes(Algorithm::Sha256, content);
        let desc = Descriptor::new("text/plain", digest.clone(), content.len() as u64)
            .with_name(name);
        (digest, desc)
    }

    #[test]
    fn set_and_get() {
        let registry = DescriptorRegistry::new();
        let (digest, desc) = make(b"hello", "a.txt");
        registry.set(digest.clone(), desc.clone());
        assert_eq!(registry.get(&digest), Some(desc));
        assert!(registry.contains(&digest));
    }

    #[test]
    fn get_missing_returns_none() {
        let registry = DescriptorRegistry::new();
        let digest = digest_bytes(Algorithm::Sha256, b"missing");
        assert!(registry.get(&digest).is_none());
        assert!(!registry.contains(&digest));
    }

    #[test]
    fn last_writer_wins() {
        let registry = DescriptorRegistry::new();
        let (digest, first) = make(b"same", "first.txt");
        let (_, second) = make(b"same", "second.txt");
        registry.set(digest.clone(), first);
        registry.set(digest.clone(), second.clone());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&digest).unwrap().name(), Some("second.txt"));
        assert_eq!(registry.get(&digest), Some(second));
    }

    #[test]
    fn len_and_is_empty() {
        let registry = DescriptorRegistry::default();
        assert!(registry.is_empty());
        let (digest, desc) = make(b"a", "a");
        registry.set(digest, desc);
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn descriptors_are_sorted_by_digest() {
        let registry = DescriptorRegistry::new();
        for content in [&b"aaa"[..], &b"bbb"[..], &b"ccc"[..]] {
            let (digest, desc) = make(content, "x");
            registry.set(digest, desc);
        }
        let listed = registry.descriptors();
        assert_eq!(listed.len(), 3);
        for w in listed.windows(2) {
            assert!(w[0].digest <= w[1].digest);
        }
    }

    #[test]
    fn concurrent_inserts_and_lookups() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(DescriptorRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let content = format!("content-{i}");
                    let (digest, desc) = make(content.as_bytes(), &content);
                    registry.set(digest.clone(), desc);
                    assert!(registry.get(&digest).is_some());
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn debug_format() {
        let registry = DescriptorRegistry::new();
        let debug = format!("{registry:?}");
        assert!(debug.contains("DescriptorRegistry"));
        assert!(debug.contains("descriptor_count"));
    }
}
