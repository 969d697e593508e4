use thiserror::Error;

/// Errors surfaced by tree mutation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The key is already present; the tree is left untouched.
    #[error("key is already present in the tree")]
    DuplicateKey,
}

/// Convenience alias for fallible tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
