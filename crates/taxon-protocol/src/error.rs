//! Error types for the protocol layer.
//!
//! Encoding and decoding fail in different ways, so they get different
//! enums:
//!
//! - [`EncodeError`]: the caller (or the client itself) tried to build a
//!   call that doesn't match the service description. This is a bug, never
//!   a network condition.
//! - [`ProtocolError`]: the bytes that came back are not a valid reply.
//! - [`DecodeError`]: what `decode_reply` returns: either a
//!   [`ProtocolError`] or a [`RemoteFault`] signalled by the service.

use crate::types::RemoteFault;
use crate::value::TypeTag;

/// Errors raised while encoding a call or reply.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    /// The number of arguments differs from the declared parameter list.
    #[error("{method}: expected {expected} argument(s), got {found}")]
    ArgumentCount {
        method: &'static str,
        expected: usize,
        found: usize,
    },

    /// An argument's runtime type doesn't match the declared parameter type.
    #[error(
        "{method}: argument {position} (`{name}`) must be {expected:?}, got {found:?}"
    )]
    ArgumentType {
        method: &'static str,
        position: usize,
        name: &'static str,
        expected: TypeTag,
        found: TypeTag,
    },

    /// A result value doesn't match the method's declared result type.
    #[error("{method}: result must be {expected}, got {found:?}")]
    ResultType {
        method: &'static str,
        expected: String,
        found: TypeTag,
    },

    /// A string or container is too large for a 32-bit length prefix.
    #[error("{what} too large to encode ({len} elements)")]
    TooLarge { what: &'static str, len: usize },
}

/// Errors raised while decoding bytes received from the wire.
///
/// Every malformed input maps onto one of these variants. Decoding never
/// panics and never produces an uncategorized error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The input ended before a complete value could be read.
    #[error("truncated message: needed {needed} more byte(s), {available} available")]
    Truncated { needed: usize, available: usize },

    /// The message header doesn't carry the expected version marker.
    #[error("bad version marker {0:#010x}")]
    BadVersion(u32),

    /// The message type byte is not one the protocol defines.
    #[error("unknown message type {0}")]
    UnknownMessageType(u8),

    /// A well-formed message of the wrong kind (e.g. a CALL where a REPLY
    /// was expected).
    #[error("unexpected message type {0}")]
    UnexpectedMessageType(u8),

    /// A field or container element carries a type tag the codec doesn't know.
    #[error("unknown type tag {0}")]
    UnknownTypeTag(u8),

    /// A length or count prefix is negative.
    #[error("negative length {0}")]
    NegativeLength(i32),

    /// A string payload is not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    /// Bytes remain after the message was fully decoded.
    #[error("{0} trailing byte(s) after message")]
    TrailingBytes(usize),

    /// Structs or containers are nested deeper than the codec allows.
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),

    /// The message names a method the service description doesn't know.
    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    /// A reply arrived for a different method than the one called.
    #[error("reply for `{found}` while waiting for `{expected}`")]
    MethodMismatch { expected: &'static str, found: String },

    /// The result value doesn't match the method's declared result type.
    #[error("{method}: result should be {expected}, got {found:?}")]
    ResultType {
        method: &'static str,
        expected: String,
        found: TypeTag,
    },

    /// The reply carries neither a result nor a declared exception.
    #[error("{0}: reply carries no result")]
    MissingResult(&'static str),

    /// Structurally valid bytes that violate the service description
    /// (missing required field, both result and exception set, ...).
    #[error("malformed message: {0}")]
    Malformed(String),
}

/// The two ways decoding a reply can fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// The bytes are not a valid reply.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The bytes are a valid reply that carries a remote exception.
    #[error(transparent)]
    Remote(#[from] RemoteFault),
}
