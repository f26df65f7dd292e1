//! Unified error type for the taxon client.

use std::time::Duration;

use taxon_protocol::{DecodeError, EncodeError, FaultCause, ProtocolError, RemoteFault};
use taxon_session::SessionError;
use taxon_transport::TransportError;

/// Machine-readable category of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Encoding,
    Protocol,
    Timeout,
    Network,
    HttpStatus,
    Authentication,
    Remote,
}

/// Every way a client call (or client construction) can fail.
///
/// Sub-crate errors convert into this with `?`. Three conversions are not
/// one-to-one: an HTTP 401, a remote `AuthenticationException` and a
/// rejected login all become [`ClientError::Authentication`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The client was configured with an unusable value.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The call could not be encoded. Indicates a bug, not a bad input.
    #[error(transparent)]
    Encoding(#[from] EncodeError),

    /// The response was not a valid reply to the call.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// No complete response arrived before the deadline.
    #[error("no response within {}ms", after.as_millis())]
    Timeout { after: Duration },

    /// The request never completed at the network level.
    #[error("network error: {message}")]
    Network {
        message: String,
        status: Option<u16>,
    },

    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The token was missing, invalid or expired.
    ///
    /// `fault` is set when the service said so with an
    /// `AuthenticationException`, and is `None` for an HTTP 401.
    #[error("authentication failed: {message}")]
    Authentication {
        message: String,
        fault: Option<RemoteFault>,
    },

    /// The service raised a declared or framework-level exception.
    #[error(transparent)]
    Remote(RemoteFault),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Network { .. } => ErrorKind::Network,
            Self::HttpStatus { .. } => ErrorKind::HttpStatus,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Remote(_) => ErrorKind::Remote,
        }
    }

    /// The remote fault behind this error, if the service raised one.
    pub fn remote_fault(&self) -> Option<&RemoteFault> {
        match self {
            Self::Remote(fault) => Some(fault),
            Self::Authentication { fault, .. } => fault.as_ref(),
            _ => None,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { after } => Self::Timeout { after },
            TransportError::Network { message, status } => Self::Network { message, status },
            TransportError::HttpStatus { status: 401, body } => Self::Authentication {
                message: if body.is_empty() {
                    "HTTP 401".to_string()
                } else {
                    format!("HTTP 401: {body}")
                },
                fault: None,
            },
            TransportError::HttpStatus { status, body } => Self::HttpStatus { status, body },
        }
    }
}

impl From<DecodeError> for ClientError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Protocol(e) => Self::Protocol(e),
            DecodeError::Remote(fault) if fault.cause == FaultCause::Authentication => {
                Self::Authentication {
                    message: fault.message.clone(),
                    fault: Some(fault),
                }
            }
            DecodeError::Remote(fault) => Self::Remote(fault),
        }
    }
}

impl From<SessionError> for ClientError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::AuthFailed(message) => Self::Authentication {
                message,
                fault: None,
            },
            other => Self::Configuration(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_timeout() {
        let err: ClientError = TransportError::Timeout {
            after: Duration::from_millis(250),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.to_string(), "no response within 250ms");
    }

    #[test]
    fn test_http_401_becomes_authentication() {
        let err: ClientError = TransportError::HttpStatus {
            status: 401,
            body: String::new(),
        }
        .into();
        assert_eq!(
            err,
            ClientError::Authentication {
                message: "HTTP 401".into(),
                fault: None
            }
        );
    }

    #[test]
    fn test_http_403_stays_http_status() {
        let err: ClientError = TransportError::HttpStatus {
            status: 403,
            body: "forbidden".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::HttpStatus);
    }

    #[test]
    fn test_from_network_keeps_status() {
        let err: ClientError = TransportError::Network {
            message: "connection reset".into(),
            status: Some(200),
        }
        .into();
        assert!(matches!(
            err,
            ClientError::Network {
                status: Some(200),
                ..
            }
        ));
    }

    #[test]
    fn test_remote_authentication_keeps_fault() {
        let fault = RemoteFault::new(FaultCause::Authentication, "Token has expired");
        let err: ClientError = DecodeError::Remote(fault.clone()).into();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.remote_fault(), Some(&fault));
        assert_eq!(err.to_string(), "authentication failed: Token has expired");
    }

    #[test]
    fn test_other_remote_faults_stay_remote() {
        let fault = RemoteFault::new(FaultCause::ObjectReference, "No object with id 7");
        let err: ClientError = DecodeError::Remote(fault).into();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(
            err.to_string(),
            "ObjectReferenceException: No object with id 7"
        );
    }

    #[test]
    fn test_from_protocol_error() {
        let err: ClientError = DecodeError::Protocol(ProtocolError::InvalidUtf8).into();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(err.remote_fault(), None);
    }

    #[test]
    fn test_from_session_error_is_configuration() {
        let err: ClientError = SessionError::InvalidToken.into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        let err: ClientError = SessionError::MissingCredentials("password").into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_rejected_login_is_authentication() {
        let err: ClientError = SessionError::AuthFailed("unknown user mallory".into()).into();
        assert_eq!(
            err,
            ClientError::Authentication {
                message: "unknown user mallory".into(),
                fault: None,
            }
        );
        assert_eq!(err.to_string(), "authentication failed: unknown user mallory");
    }
}
