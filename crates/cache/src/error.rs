//! Errors raised by cache registration.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("a cache named `{0}` is already registered")]
    DuplicateName(String),

    #[error("cache capacity must be greater than zero (cache `{0}`)")]
    ZeroCapacity(String),
}
