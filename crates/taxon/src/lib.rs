//! # taxon
//!
//! Async client for the taxon data service.
//!
//! A [`TaxonClient`] is bound to one taxon object. Each accessor sends one
//! binary-encoded call over HTTP and resolves to a plain Rust value:
//!
//! ```text
//! accessor → encode (taxon-protocol) → POST (taxon-transport) → decode → value
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taxon::prelude::*;
//!
//! # async fn run() -> Result<(), ClientError> {
//! let config = ClientConfig::new("993/674615/1", "https://ci.kbase.us/services/taxon_api")
//!     .with_token(Token::new("my-token")?);
//! let client = TaxonClient::create(config)?;
//!
//! println!("{}", client.get_scientific_name().await?);
//! for ancestor in client.get_scientific_lineage().await? {
//!     println!("  {ancestor}");
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;

pub use client::TaxonClient;
pub use config::{ClientConfig, DEFAULT_TIMEOUT_MILLIS};
pub use error::{ClientError, ErrorKind};

pub use taxon_protocol as protocol;
pub use taxon_session as session;
pub use taxon_transport as transport;

/// Re-exports for convenient use.
pub mod prelude {
    pub use crate::{ClientConfig, ClientError, ErrorKind, TaxonClient};
    pub use taxon_protocol::{
        FaultCause, Method, ObjectInfo, ObjectProvenanceAction, ObjectReference, RemoteFault,
        Value,
    };
    pub use taxon_session::{Credentials, Session, SessionProvider, StaticSession, Token};
    pub use taxon_transport::{HttpTransport, Transport};
}
