//! HTTP(S) transport implementation using `reqwest`.

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::{Exchange, Transport, TransportError};

/// Media type of the binary protocol.
pub const THRIFT_CONTENT_TYPE: &str = "application/x-thrift";

/// Error bodies longer than this are cut before being stored in an error.
const MAX_ERROR_BODY: usize = 512;

/// Default cap on a successful response body.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// A [`Transport`] that POSTs each request to the endpoint.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    max_response_bytes: usize,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::with_client(reqwest::Client::new())
    }
}

impl HttpTransport {
    /// Creates a transport with a fresh pooled client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (custom TLS roots, proxies, ...).
    ///
    /// Per-call deadlines are still enforced by the transport, whatever
    /// the client's own timeout says.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    /// Caps the size of a successful response body. Larger bodies fail
    /// with [`TransportError::Network`] without being buffered in full.
    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    async fn exchange(&self, exchange: Exchange<'_>) -> Result<Vec<u8>, TransportError> {
        let mut request = self
            .client
            .post(exchange.endpoint.clone())
            .header(CONTENT_TYPE, THRIFT_CONTENT_TYPE)
            .header(ACCEPT, THRIFT_CONTENT_TYPE)
            .body(exchange.body);
        if let Some(token) = exchange.token {
            request = request.header(AUTHORIZATION, token);
        }

        let mut response = request.send().await.map_err(network_error)?;
        let status = response.status();
        if !status.is_success() {
            // The body is only diagnostic here; failing to read it must not
            // hide the status. A few spare bytes let `truncate` see that the
            // body ran past the limit even when a character was cut.
            let body = read_capped(&mut response, MAX_ERROR_BODY + 4)
                .await
                .map(|capped| String::from_utf8_lossy(&capped.body).into_owned())
                .unwrap_or_default();
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                body: truncate(body),
            });
        }

        let limit = self.max_response_bytes;
        let too_large = || TransportError::Network {
            message: format!("response body exceeds {limit} bytes"),
            status: Some(status.as_u16()),
        };
        if response
            .content_length()
            .is_some_and(|len| len > limit as u64)
        {
            return Err(too_large());
        }
        let capped = read_capped(&mut response, limit)
            .await
            .map_err(network_error)?;
        if capped.overflowed {
            return Err(too_large());
        }
        Ok(capped.body)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, exchange: Exchange<'_>) -> Result<Vec<u8>, TransportError> {
        let timeout = exchange.timeout;
        tracing::trace!(endpoint = %exchange.endpoint, bytes = exchange.body.len(), "POST");

        // Dropping the inner future on timeout aborts the request; no
        // response can be delivered after this returns.
        match tokio::time::timeout(timeout, self.exchange(exchange)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout { after: timeout }),
        }
    }
}

fn network_error(e: reqwest::Error) -> TransportError {
    TransportError::Network {
        message: e.to_string(),
        status: e.status().map(|s| s.as_u16()),
    }
}

struct Capped {
    body: Vec<u8>,
    overflowed: bool,
}

/// Reads the body chunk by chunk, stopping once `limit` bytes are held.
async fn read_capped(
    response: &mut reqwest::Response,
    limit: usize,
) -> Result<Capped, reqwest::Error> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - body.len();
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            return Ok(Capped {
                body,
                overflowed: true,
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(Capped {
        body,
        overflowed: false,
    })
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}
