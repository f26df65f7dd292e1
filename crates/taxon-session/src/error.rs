//! Error types for the session layer.

/// Errors that can occur while obtaining a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The provider rejected the credentials.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Username or password was empty.
    #[error("missing credentials: {0} is empty")]
    MissingCredentials(&'static str),

    /// A token string is empty or contains characters that can't be sent
    /// in an HTTP header.
    #[error("invalid token")]
    InvalidToken,
}
