//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by the cache and its expiration constructors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A caller supplied an argument the cache cannot work with
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

// == Memoize Error Enum ==
/// Errors returned by the memoization layer.
///
/// `E` is the error type of the wrapped call. It is carried untouched in
/// [`MemoizeError::Upstream`].
#[derive(Error, Debug)]
pub enum MemoizeError<E> {
    /// The call arguments could not be turned into a cache key
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The wrapped call returned an error; nothing was cached
    #[error("Upstream call failed: {0}")]
    Upstream(E),

    /// The cached value under the call key has a different type than requested
    #[error("Cached value for {key} is not a {expected}")]
    Adaptation { key: String, expected: &'static str },

    /// The wrapped call panicked; the panic was contained
    #[error("Wrapped call panicked: {0}")]
    Panicked(String),
}

impl<E> MemoizeError<E> {
    /// Returns the wrapped call's own error, if that is what failed.
    pub fn into_upstream(self) -> Option<E> {
        match self {
            MemoizeError::Upstream(err) => Some(err),
            _ => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
