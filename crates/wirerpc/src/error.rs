//! # Error Definitions
//!
//! Protocol failures (`Error`) and the reasons a remote side reports (`FailureReason`).

/// Operational failures within the RPC mechanism itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The underlying Wirepack serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] wirepack::Error),
    /// A message was missing a required field.
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    /// A field carried a value of the wrong shape.
    #[error("field '{field}' expected {expected}")]
    TypeMismatch { field: String, expected: &'static str },
    /// An unknown frame kind or failure reason was encountered.
    #[error("unknown variant '{0}'")]
    UnknownVariant(String),
    /// The structure of the frame was malformed.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
}

/// A specialized Result type for RPC operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons for an RPC failure (the "Err" side of a Reply).
///
/// These are distinct from `Error`; these represent the *remote* side failing,
/// whereas `Error` represents the *encoding* failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The frame could not be decoded.
    ProtocolViolation(String),
    /// The method does not exist on the provider.
    MethodNotFound(String),
    /// The construction routine or the adapter around it failed.
    ConstructFailed(String),
    /// The call was cancelled before it produced a response.
    Cancelled,
}

impl FailureReason {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::ProtocolViolation(_) => "ProtocolViolation",
            Self::MethodNotFound(_) => "MethodNotFound",
            Self::ConstructFailed(_) => "ConstructFailed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ProtocolViolation(msg) | Self::MethodNotFound(msg) | Self::ConstructFailed(msg) => msg,
            Self::Cancelled => "",
        }
    }

    pub fn from_tag(tag: &str, message: String) -> Result<Self> {
        match tag {
            "ProtocolViolation" => Ok(Self::ProtocolViolation(message)),
            "MethodNotFound" => Ok(Self::MethodNotFound(message)),
            "ConstructFailed" => Ok(Self::ConstructFailed(message)),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(Error::UnknownVariant(format!("failure reason: {}", other))),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "call cancelled"),
            other => write!(f, "{}: {}", other.as_tag(), other.message()),
        }
    }
}
