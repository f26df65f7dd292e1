//! Login hook for obtaining a token.
//!
//! The taxon service itself never sees a password: the client sends only
//! the token it was configured with. Where that token comes from is up to
//! the application (an auth service, an environment variable, a developer
//! pasting one in). [`SessionProvider`] is the seam for the first case.

use std::future::Future;

use crate::{Credentials, Session, SessionError, Token};

/// Exchanges credentials for a session.
///
/// # Example
///
/// ```rust
/// use taxon_session::{Credentials, Session, SessionError, SessionProvider, Token};
///
/// /// Accepts any password and mints the token from the username.
/// /// Only for local experiments.
/// struct EchoProvider;
///
/// impl SessionProvider for EchoProvider {
///     async fn login(&self, credentials: &Credentials) -> Result<Session, SessionError> {
///         credentials.check()?;
///         let token = Token::new(format!("token-for-{}", credentials.username))?;
///         Ok(Session::new(credentials.username.clone(), token))
///     }
/// }
/// ```
pub trait SessionProvider: Send + Sync + 'static {
    /// Validates the credentials and returns a session.
    ///
    /// # Returns
    /// - `Ok(Session)`: login succeeded
    /// - `Err(SessionError::AuthFailed)`: the credentials were rejected
    /// - `Err(SessionError::MissingCredentials)`: a field was empty
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Session, SessionError>> + Send;
}

/// A provider with one fixed user and token.
#[derive(Debug, Clone)]
pub struct StaticSession {
    username: String,
    token: Token,
}

impl StaticSession {
    pub fn new(username: impl Into<String>, token: Token) -> Self {
        Self {
            username: username.into(),
            token,
        }
    }
}

impl SessionProvider for StaticSession {
    async fn login(&self, credentials: &Credentials) -> Result<Session, SessionError> {
        credentials.check()?;
        if credentials.username != self.username {
            tracing::debug!(username = %credentials.username, "static session: unknown user");
            return Err(SessionError::AuthFailed(format!(
                "unknown user {}",
                credentials.username
            )));
        }
        Ok(Session::new(self.username.clone(), self.token.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> StaticSession {
        StaticSession::new("alice", Token::new("ALICE-TOKEN").unwrap())
    }

    #[tokio::test]
    async fn test_static_session_login_succeeds() {
        let session = provider()
            .login(&Credentials::new("alice", "anything"))
            .await
            .unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(session.token.as_str(), "ALICE-TOKEN");
    }

    #[tokio::test]
    async fn test_static_session_rejects_other_users() {
        let err = provider()
            .login(&Credentials::new("mallory", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn test_static_session_checks_credentials_first() {
        let err = provider()
            .login(&Credentials::new("alice", ""))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::MissingCredentials("password"));
    }
}
