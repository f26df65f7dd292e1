//! Wire protocol for the Taxon RPC client.
//!
//! This crate defines the "language" that the client and the taxon service
//! speak:
//!
//! - **Values** ([`Value`], [`Record`], [`TypeTag`]): the dynamic data model
//!   of the binary protocol.
//! - **Service description** ([`Method`], [`TypeDesc`], [`MethodCall`]):
//!   the fixed set of remote methods and the shapes of their arguments and
//!   results.
//! - **Codec** ([`BinaryCodec`]): how calls and replies are converted
//!   to/from bytes.
//! - **Errors** ([`EncodeError`], [`ProtocolError`], [`DecodeError`]) and
//!   the remote exception model ([`RemoteFault`], [`FaultCause`]).
//!
//! # Architecture
//!
//! The protocol layer sits between the client façade (typed accessors) and
//! the transport (raw bytes). It doesn't know about HTTP or tokens; it only
//! knows how to serialize and deserialize messages.
//!
//! ```text
//! Client (typed results) → Protocol (MethodCall / Value) → Transport (bytes)
//! ```

mod codec;
mod error;
mod service;
mod types;
mod value;

pub use codec::{BinaryCodec, MessageType, MIN_FRAME_LEN, VERSION_1, VERSION_MASK};
pub use error::{DecodeError, EncodeError, ProtocolError};
pub use service::{Method, MethodCall, Param, TypeDesc, DECLARED_EXCEPTIONS};
pub use types::{
    ApplicationErrorKind, ExternalDataUnit, FaultCause, ObjectInfo,
    ObjectProvenanceAction, ObjectReference, ReferenceError, RemoteFault,
};
pub use value::{Record, TypeTag, Value};
