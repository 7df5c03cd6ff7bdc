use thiserror::Error;

use crate::storage::StorageError;

/// Reasons a token could not be turned into claims.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Malformed token: missing payload segment")]
    MissingPayload,

    #[error("Malformed token: payload is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Malformed token: payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Malformed token: payload is not a valid claims object: {0}")]
    InvalidClaims(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    MalformedToken(#[from] TokenError),

    #[error("Token storage failed: {0}")]
    Storage(#[from] StorageError),
}
