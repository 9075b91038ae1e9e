#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The owning call was cancelled while waiting.
    #[error("output resolution was cancelled")]
    Cancelled,
    /// The value was rejected by its producer.
    #[error("output failed: {0}")]
    Failed(String),
    /// The resolved value does not fit the typed view.
    #[error("output expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },
    /// The slot was torn down without ever resolving.
    #[error("output was never resolved")]
    Unresolved,
}

pub type Result<T> = std::result::Result<T, Error>;
