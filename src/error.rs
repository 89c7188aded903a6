use std::fmt;

/// Broad classification of session failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unknown session identifier, or a key missing from a session.
    NotFound,
    /// The external store is unreachable or refused the request.
    ///
    /// This is the connection error of the backend contract.
    Unavailable,
    /// The session map could not be encoded into a blob (the encode error).
    EncodeFailed,
    /// A persisted blob (or a stored value) could not be decoded (the decode error).
    DecodeFailed,
    /// The requested backend kind does not exist.
    UnsupportedKind,
    /// Backend parameters are malformed.
    InvalidConfig,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::EncodeFailed => "encode_failed",
            ErrorCode::DecodeFailed => "decode_failed",
            ErrorCode::UnsupportedKind => "unsupported_kind",
            ErrorCode::InvalidConfig => "invalid_config",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every fallible session and store operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct SessionError {
    pub code: ErrorCode,
    pub message: String,
}

impl SessionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

pub(crate) fn not_found(id: &str) -> SessionError {
    SessionError::new(ErrorCode::NotFound, format!("session `{id}` not found"))
}

pub(crate) fn key_not_found(key: &str) -> SessionError {
    SessionError::new(ErrorCode::NotFound, format!("key `{key}` not set"))
}

pub(crate) fn unavailable(message: impl Into<String>) -> SessionError {
    SessionError::new(ErrorCode::Unavailable, message)
}

pub(crate) fn encode_error(err: serde_json::Error) -> SessionError {
    SessionError::new(ErrorCode::EncodeFailed, err.to_string())
}

pub(crate) fn decode_error(err: serde_json::Error) -> SessionError {
    SessionError::new(ErrorCode::DecodeFailed, err.to_string())
}

pub(crate) fn unsupported_kind(kind: &str) -> SessionError {
    SessionError::new(
        ErrorCode::UnsupportedKind,
        format!("unsupported session store kind `{kind}`"),
    )
}

pub(crate) fn invalid_config(message: impl Into<String>) -> SessionError {
    SessionError::new(ErrorCode::InvalidConfig, message)
}

#[cfg(feature = "redis")]
pub(crate) fn redis_error(err: redis::RedisError) -> SessionError {
    unavailable(err.to_string())
}
