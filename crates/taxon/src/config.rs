//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use taxon_protocol::ObjectReference;
use taxon_session::{Session, Token};
use url::Url;

use crate::ClientError;

/// Deadline applied to each call when none is configured.
pub const DEFAULT_TIMEOUT_MILLIS: u64 = 30_000;

fn default_timeout_millis() -> u64 {
    DEFAULT_TIMEOUT_MILLIS
}

/// Everything a [`TaxonClient`](crate::TaxonClient) needs to know.
///
/// Fields are plain strings so a config can be deserialized first and
/// validated later: [`TaxonClient::create`](crate::TaxonClient::create)
/// reports every problem as [`ClientError::Configuration`].
///
/// ```json
/// {
///   "reference": "993/674615/1",
///   "endpoint": "https://ci.kbase.us/services/taxon_api",
///   "token": "...",
///   "timeout_millis": 6000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// The taxon object every call is about.
    pub reference: String,

    /// Absolute `http`/`https` URL of the service.
    pub endpoint: String,

    /// Auth token. Calls go out unauthenticated without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,

    /// Per-call deadline in milliseconds. Must be greater than zero.
    #[serde(default = "default_timeout_millis")]
    pub timeout_millis: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reference: String::new(),
            endpoint: String::new(),
            token: None,
            timeout_millis: DEFAULT_TIMEOUT_MILLIS,
        }
    }
}

impl ClientConfig {
    pub fn new(reference: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Builds a config that authenticates with a session's token.
    pub fn from_session(
        reference: impl Into<String>,
        endpoint: impl Into<String>,
        session: &Session,
    ) -> Self {
        Self::new(reference, endpoint).with_token(session.token.clone())
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Checks every field and converts it to its typed form.
    pub(crate) fn validate(&self) -> Result<Settings, ClientError> {
        let reference = ObjectReference::parse(&self.reference)
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        let endpoint = Url::parse(&self.endpoint).map_err(|e| {
            ClientError::Configuration(format!("endpoint `{}`: {e}", self.endpoint))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") || !endpoint.has_host() {
            return Err(ClientError::Configuration(format!(
                "endpoint `{}` must be an http or https URL with a host",
                self.endpoint
            )));
        }

        if self.timeout_millis == 0 {
            return Err(ClientError::Configuration(
                "timeout must be greater than zero".into(),
            ));
        }

        Ok(Settings {
            reference,
            endpoint,
            token: self.token.clone(),
            timeout: Duration::from_millis(self.timeout_millis),
        })
    }
}

/// A validated [`ClientConfig`]. Immutable once built.
#[derive(Debug)]
pub(crate) struct Settings {
    pub(crate) reference: ObjectReference,
    pub(crate) endpoint: Url,
    pub(crate) token: Option<Token>,
    pub(crate) timeout: Duration,
}
