//! Transport abstraction layer for the taxon client.
//!
//! Provides the [`Transport`] trait: hand it an encoded request, get back
//! the encoded response. The client never looks inside a transport, so the
//! same façade works over real HTTP and over in-memory test doubles.
//!
//! # Feature Flags
//!
//! - `http` (default): HTTP(S) transport via `reqwest`

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::{HttpTransport, DEFAULT_MAX_RESPONSE_BYTES, THRIFT_CONTENT_TYPE};

use std::fmt;
use std::future::Future;
use std::time::Duration;

pub use url::Url;

/// One request/response exchange.
///
/// Borrowed from the client for the duration of a single call; nothing in
/// here outlives it.
pub struct Exchange<'a> {
    /// Where to send the request.
    pub endpoint: &'a Url,
    /// The encoded call. Opaque to the transport.
    pub body: Vec<u8>,
    /// Auth token, sent out-of-band (never inside `body`).
    pub token: Option<&'a str>,
    /// Deadline for the whole exchange, response body included.
    pub timeout: Duration,
}

impl fmt::Debug for Exchange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("endpoint", &self.endpoint.as_str())
            .field("body_len", &self.body.len())
            .field("token", &self.token.map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Moves one encoded request to the service and its response back.
///
/// Implementations make exactly one attempt per call: no retries, no
/// caching. Dropping the returned future must abandon the exchange.
pub trait Transport: Send + Sync + 'static {
    /// Sends `exchange` and resolves to the raw response body.
    fn send(
        &self,
        exchange: Exchange<'_>,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}
