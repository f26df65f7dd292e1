use std::time::Duration;

/// Errors that can occur in the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No complete response arrived before the deadline.
    #[error("no response within {}ms", after.as_millis())]
    Timeout { after: Duration },

    /// The exchange failed below HTTP: DNS, connect, reset, body read.
    #[error("network error: {message}")]
    Network {
        message: String,
        /// Set when the failure happened after a status line was received.
        status: Option<u16>,
    },

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

impl TransportError {
    /// The HTTP status involved, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Timeout { .. } => None,
            Self::Network { status, .. } => *status,
            Self::HttpStatus { status, .. } => Some(*status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_in_millis() {
        let err = TransportError::Timeout {
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "no response within 1500ms");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_http_status_exposes_status() {
        let err = TransportError::HttpStatus {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "HTTP 503: unavailable");
    }
}
