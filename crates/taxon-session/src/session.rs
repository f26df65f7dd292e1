//! Session types: the token and what it takes to get one.
//!
//! Both [`Token`] and [`Credentials`] hold secrets, so their `Debug`
//! implementations are written by hand and print `<redacted>` instead of
//! the value. Neither type implements `Display`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SessionError;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// An opaque auth token, sent verbatim in the `Authorization` header.
///
/// Deserializing runs the same checks as [`Token::new`], so a config file
/// can't carry a token that would break the request header.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token(String);

impl Token {
    /// Wraps a token string.
    ///
    /// Surrounding whitespace is trimmed (tokens are often pasted from a
    /// terminal). Fails if nothing is left or the token contains control
    /// characters.
    pub fn new(token: impl Into<String>) -> Result<Self, SessionError> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_control) {
            return Err(SessionError::InvalidToken);
        }
        if trimmed.len() == token.len() {
            Ok(Self(token))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// The raw secret. Only the transport should need this.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

impl TryFrom<String> for Token {
    type Error = SessionError;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        Self::new(token)
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.0
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Username and password handed to a [`SessionProvider`](crate::SessionProvider).
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Rejects empty fields before anything goes over the network.
    pub fn check(&self) -> Result<(), SessionError> {
        if self.username.trim().is_empty() {
            return Err(SessionError::MissingCredentials("username"));
        }
        if self.password.is_empty() {
            return Err(SessionError::MissingCredentials("password"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A logged-in user and the token that proves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub token: Token,
}

impl Session {
    pub fn new(username: impl Into<String>, token: Token) -> Self {
        Self {
            username: username.into(),
            token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Token
    // =====================================================================

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("AB12CD34").unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("AB12CD34"));
        assert_eq!(debug, "Token(<redacted>)");
    }

    #[test]
    fn test_token_trims_whitespace() {
        let token = Token::new("  AB12CD34\n").unwrap();
        assert_eq!(token.as_str(), "AB12CD34");
    }

    #[test]
    fn test_token_rejects_empty_and_control_chars() {
        assert_eq!(Token::new(""), Err(SessionError::InvalidToken));
        assert_eq!(Token::new("   "), Err(SessionError::InvalidToken));
        assert_eq!(Token::new("AB\r\nX-Evil: 1"), Err(SessionError::InvalidToken));
    }

    #[test]
    fn test_token_serde_validates() {
        let token: Token = serde_json::from_str(r#""AB12""#).unwrap();
        assert_eq!(token.as_str(), "AB12");
        assert_eq!(serde_json::to_string(&token).unwrap(), r#""AB12""#);

        let bad: Result<Token, _> = serde_json::from_str(r#""""#);
        assert!(bad.is_err());
    }

    // =====================================================================
    // Credentials and Session
    // =====================================================================

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("alice", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credentials_check() {
        assert_eq!(Credentials::new("alice", "pw").check(), Ok(()));
        assert_eq!(
            Credentials::new(" ", "pw").check(),
            Err(SessionError::MissingCredentials("username"))
        );
        assert_eq!(
            Credentials::new("alice", "").check(),
            Err(SessionError::MissingCredentials("password"))
        );
    }

    #[test]
    fn test_session_debug_hides_token() {
        let session = Session::new("alice", Token::new("SECRET").unwrap());
        assert!(!format!("{session:?}").contains("SECRET"));
    }
}
