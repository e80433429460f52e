//! Logical name to filesystem path resolution.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use crate::error::{IoContext, StoreError, StoreResult};

/// Maps logical names to paths under a root directory.
///
/// Explicit mappings recorded with [`PathResolver::map_path`] take precedence;
/// any other name is treated as a path relative to the root. Absolute paths
/// pass through unchanged. The mapping table is shared and safe for concurrent
/// use; a later mapping for the same name replaces the earlier one.
pub struct PathResolver {
    root: PathBuf,
    mappings: RwLock<HashMap<String, PathBuf>>,
}

impl PathResolver {
    /// An empty root means the working directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut root = root.into();
        if root.as_os_str().is_empty() {
            root = PathBuf::from(".");
        }
        Self {
            root,
            mappings: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` against the root and record it as the location of `name`.
    pub fn map_path(&self, name: &str, path: impl AsRef<Path>) -> PathBuf {
        let resolved = self.join_root(path.as_ref());
        tracing::debug!(name, path = %resolved.display(), "mapped name");
        self.mappings
            .write()
            .expect("lock poisoned")
            .insert(name.to_string(), resolved.clone());
        resolved
    }

    /// Path for `name`: its recorded mapping, or `name` resolved as a path.
    ///
    /// Never fails; nothing needs to exist at the returned path.
    pub fn resolve_path(&self, name: &str) -> PathBuf {
        if let Some(path) = self.mappings.read().expect("lock poisoned").get(name) {
            return path.clone();
        }
        self.join_root(Path::new(name))
    }

    /// Fail with [`StoreError::PathTraversalDisallowed`] unless `target` lies
    /// inside the root.
    ///
    /// Both paths are made absolute against the working directory and
    /// normalized lexically. Symlinks are not followed.
    pub fn check_traversal(&self, target: &Path) -> StoreResult<()> {
        let base = std::path::absolute(&self.root)
            .io_context(|| format!("resolve root {}", self.root.display()))?;
        let absolute = std::path::absolute(target)
            .io_context(|| format!("resolve target {}", target.display()))?;
        if normalize(&absolute).starts_with(normalize(&base)) {
            Ok(())
        } else {
            Err(StoreError::PathTraversalDisallowed(target.to_path_buf()))
        }
    }

    /// Number of explicit mappings.
    pub fn len(&self) -> usize {
        self.mappings.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn join_root(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl std::fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathResolver")
            .field("root", &self.root)
            .field("mapping_count", &self.len())
            .finish()
    }
}

/// Lexically remove `.` and `..` components.
///
/// `..` at the root stays at the root; on a relative path with nothing left to
/// pop it is kept.
fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_name_resolves_under_root() {
        let resolver = PathResolver::new("/store");
        assert_eq!(resolver.resolve_path("a.txt"), PathBuf::from("/store/a.txt"));
        assert_eq!(
            resolver.resolve_path("dir/b.bin"),
            PathBuf::from("/store/dir/b.bin")
        );
    }

    #[test]
    fn absolute_name_passes_through() {
        let resolver = PathResolver::new("/store");
        assert_eq!(resolver.resolve_path("/tmp/x"), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn map_path_records_and_returns_resolved() {
        let resolver = PathResolver::new("/store");
        let mapped = resolver.map_path("logical", "actual/file.bin");
        assert_eq!(mapped, PathBuf::from("/store/actual/file.bin"));
        assert_eq!(resolver.resolve_path("logical"), mapped);
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn later_mapping_wins() {
        let resolver = PathResolver::new("/store");
        resolver.map_path("n", "first");
        resolver.map_path("n", "/elsewhere/second");
        assert_eq!(resolver.resolve_path("n"), PathBuf::from("/elsewhere/second"));
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn unmapped_name_falls_back_even_if_missing() {
        let resolver = PathResolver::new("/store");
        assert!(resolver.is_empty());
        assert_eq!(
            resolver.resolve_path("never/seen"),
            PathBuf::from("/store/never/seen")
        );
    }

    #[test]
    fn traversal_inside_root_is_allowed() {
        let resolver = PathResolver::new("/store");
        assert!(resolver.check_traversal(Path::new("/store/a.txt")).is_ok());
        assert!(resolver
            .check_traversal(&resolver.resolve_path("sub/../ok.bin"))
            .is_ok());
        assert!(resolver.check_traversal(Path::new("/store")).is_ok());
    }

    #[test]
    fn parent_escape_is_rejected() {
        let resolver = PathResolver::new("/store");
        let target = resolver.resolve_path("../escape.bin");
        let err = resolver.check_traversal(&target).unwrap_err();
        assert!(matches!(err, StoreError::PathTraversalDisallowed(p) if p == target));
    }

    #[test]
    fn absolute_outside_root_is_rejected() {
        let resolver = PathResolver::new("/store");
        assert!(matches!(
            resolver.check_traversal(Path::new("/etc/passwd")),
            Err(StoreError::PathTraversalDisallowed(_))
        ));
    }

    #[test]
    fn sibling_with_common_prefix_is_rejected() {
        let resolver = PathResolver::new("/store");
        assert!(resolver
            .check_traversal(Path::new("/store-other/file"))
            .is_err());
    }

    #[test]
    fn relative_root_is_made_absolute() {
        let resolver = PathResolver::new(".");
        assert!(resolver.check_traversal(&resolver.resolve_path("x/y")).is_ok());
        assert!(resolver
            .check_traversal(&resolver.resolve_path("../x"))
            .is_err());
    }

    #[test]
    fn empty_root_is_the_working_directory() {
        let resolver = PathResolver::new("");
        assert_eq!(resolver.root(), Path::new("."));
        let target = resolver.resolve_path("x.bin");
        assert_eq!(target, PathBuf::from("./x.bin"));
        assert!(resolver.check_traversal(&target).is_ok());
        assert!(resolver
            .check_traversal(&resolver.resolve_path("../x.bin"))
            .is_err());
    }

    #[test]
    fn concurrent_mappings_and_lookups() {
        use std::sync::Arc;
        use std::thread;

        let resolver = Arc::new(PathResolver::new("/store"));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let resolver = Arc::clone(&resolver);
                thread::spawn(move || {
                    let name = format!("name-{i}");
                    let mapped = resolver.map_path(&name, format!("files/{i}.bin"));
                    assert_eq!(resolver.resolve_path(&name), mapped);
                    // Every thread also remaps a shared name; one of them wins.
                    resolver.map_path("shared", format!("/shared/{i}"));
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(resolver.len(), 9);
        for i in 0..8 {
            assert_eq!(
                resolver.resolve_path(&format!("name-{i}")),
                PathBuf::from(format!("/store/files/{i}.bin"))
            );
        }
        let shared = resolver.resolve_path("shared");
        assert!((0..8).any(|i| shared == PathBuf::from(format!("/shared/{i}"))));
    }

    #[test]
    fn normalize_handles_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
    }
}
