use std::path::PathBuf;

/// Errors from file store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The descriptor's digest is not registered (or the descriptor has none).
    #[error("descriptor not found: {0}")]
    DescriptorNotFound(String),

    /// The descriptor carries no title annotation to resolve a path from.
    #[error("no name in descriptor annotations")]
    NameMissing,

    /// The resolved write target lies outside the store root.
    #[error("path traversal disallowed: {}", .0.display())]
    PathTraversalDisallowed(PathBuf),

    /// A file already exists at the write target and overwrite is disabled.
    #[error("overwrite disallowed: {}", .0.display())]
    OverwriteDisallowed(PathBuf),

    /// `truncate` was called with a size other than zero.
    #[error("unsupported size: {0}")]
    UnsupportedSize(u64),

    /// Commit preconditions failed: writer already released, or size/digest
    /// did not match what the caller expected.
    #[error("failed precondition: {0}")]
    Precondition(String),

    /// I/O failure annotated with the step that failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Wrap an I/O error with the step that failed.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Attach step context to an `io::Result`.
pub(crate) trait IoContext<T> {
    fn io_context<C: Into<String>>(self, context: impl FnOnce() -> C) -> StoreResult<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<C: Into<String>>(self, context: impl FnOnce() -> C) -> StoreResult<T> {
        self.map_err(|source| StoreError::io(context(), source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_context_names_the_step() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"));
        let err = result.io_context(|| "sync failed").unwrap_err();
        assert_eq!(err.to_string(), "sync failed: disk on fire");
        assert!(std::error::Error::source(&err).is_some());
    }
}
