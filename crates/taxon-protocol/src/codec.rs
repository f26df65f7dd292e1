//! Binary codec for calls and replies.
//!
//! A "codec" (coder/decoder) converts between protocol values and raw
//! bytes. The format is the strict binary RPC encoding: every integer is
//! fixed-width big-endian, strings are length-prefixed UTF-8, and every
//! struct field is written as `tag, id, value` so a reader can skip fields
//! it doesn't understand.
//!
//! ```text
//! ┌──────────────────────┬──────────────┬─────────┬──────────────────────┐
//! │ i32 VERSION_1 | type │ string name  │ i32 seq │ struct (args/result) │
//! └──────────────────────┴──────────────┴─────────┴──────────────────────┘
//! ```
//!
//! The client side uses [`BinaryCodec::encode_call`] and
//! [`BinaryCodec::decode_reply`]. The server-side counterparts
//! ([`decode_call`](BinaryCodec::decode_call),
//! [`encode_reply`](BinaryCodec::encode_reply),
//! [`encode_fault`](BinaryCodec::encode_fault)) exist so test doubles can
//! speak the protocol too.

use bytes::{Buf, BufMut, BytesMut};

use crate::{
    DecodeError, EncodeError, FaultCause, Method, MethodCall, ProtocolError,
    Record, RemoteFault, TypeTag, Value,
};

/// Version marker in the high 16 bits of the first header word.
pub const VERSION_1: u32 = 0x8001_0000;

/// Mask selecting the version marker from the first header word.
pub const VERSION_MASK: u32 = 0xffff_0000;

/// Smallest possible valid reply: header word, empty name, seqid, STOP.
pub const MIN_FRAME_LEN: usize = 4 + 4 + 4 + 1;

/// Structs and containers nested deeper than this are rejected.
const MAX_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// The kind of message, carried in the low byte of the header word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Call = 1,
    Reply = 2,
    /// Framework-level failure (unknown method, internal error, ...).
    Exception = 3,
    Oneway = 4,
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            1 => Ok(MessageType::Call),
            2 => Ok(MessageType::Reply),
            3 => Ok(MessageType::Exception),
            4 => Ok(MessageType::Oneway),
            other => Err(ProtocolError::UnknownMessageType(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// BinaryCodec
// ---------------------------------------------------------------------------

/// The strict binary codec.
///
/// Stateless: a single value can be shared by any number of concurrent
/// calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl BinaryCodec {
    /// Encodes a CALL message.
    ///
    /// # Errors
    /// Returns [`EncodeError`] if the arguments don't match the method's
    /// declared parameters.
    pub fn encode_call(
        &self,
        call: &MethodCall,
        seqid: i32,
    ) -> Result<Vec<u8>, EncodeError> {
        call.validate()?;
        let args: Record = call
            .method
            .params()
            .iter()
            .zip(&call.args)
            .map(|(param, arg)| (param.id, arg.clone()))
            .collect();
        self.encode_message(call.method.wire_name(), MessageType::Call, seqid, &args)
    }

    /// Decodes a REPLY (or EXCEPTION) message for `method`.
    ///
    /// Returns `Ok(None)` only for methods whose result is optional and
    /// whose reply carries no result.
    ///
    /// # Errors
    /// - [`DecodeError::Protocol`] if the bytes aren't a valid reply to
    ///   `method`.
    /// - [`DecodeError::Remote`] if the reply carries a declared exception
    ///   or is a framework-level EXCEPTION message.
    pub fn decode_reply(
        &self,
        method: Method,
        data: &[u8],
    ) -> Result<Option<Value>, DecodeError> {
        let mut reader = Reader::new(data);
        let header = reader.read_header()?;
        let mut body = reader.read_struct()?;
        reader.finish()?;

        match header.kind {
            MessageType::Reply => {}
            MessageType::Exception => {
                return Err(RemoteFault::from_application_record(body)?.into());
            }
            other => {
                return Err(ProtocolError::UnexpectedMessageType(other as u8).into());
            }
        }

        if header.name != method.wire_name() {
            return Err(ProtocolError::MethodMismatch {
                expected: method.wire_name(),
                found: header.name,
            }
            .into());
        }

        let success = body.take(0);
        let mut fault = None;
        for (id, value) in body.iter() {
            // Fields that are neither the result nor a declared exception
            // are skipped.
            let Some(cause) = FaultCause::from_field_id(*id) else {
                continue;
            };
            if fault.is_some() || success.is_some() {
                return Err(ProtocolError::Malformed(format!(
                    "{method}: reply sets more than one of result/exception"
                ))
                .into());
            }
            let Value::Struct(record) = value else {
                return Err(ProtocolError::Malformed(format!(
                    "{method}: {} must be a struct, got {:?}",
                    cause.name(),
                    value.tag()
                ))
                .into());
            };
            fault = Some(RemoteFault::from_record(cause, record.clone())?);
        }

        if let Some(fault) = fault {
            return Err(fault.into());
        }

        match success {
            Some(value) => {
                let expected = method.result();
                if !expected.matches(&value) {
                    return Err(ProtocolError::ResultType {
                        method: method.wire_name(),
                        expected: expected.to_string(),
                        found: value.tag(),
                    }
                    .into());
                }
                Ok(Some(value))
            }
            None if method.result_optional() => Ok(None),
            None => Err(ProtocolError::MissingResult(method.wire_name()).into()),
        }
    }

    /// Decodes a CALL message (server side).
    ///
    /// Returns the call and its sequence id.
    pub fn decode_call(&self, data: &[u8]) -> Result<(MethodCall, i32), DecodeError> {
        let mut reader = Reader::new(data);
        let header = reader.read_header()?;
        let mut args = reader.read_struct()?;
        reader.finish()?;

        if !matches!(header.kind, MessageType::Call | MessageType::Oneway) {
            return Err(ProtocolError::UnexpectedMessageType(header.kind as u8).into());
        }
        let method = Method::from_wire_name(&header.name)
            .ok_or_else(|| ProtocolError::UnknownMethod(header.name.clone()))?;

        let mut values = Vec::with_capacity(method.params().len());
        for param in method.params() {
            let value = args.take(param.id).ok_or_else(|| {
                ProtocolError::Malformed(format!("{method}: missing argument `{}`", param.name))
            })?;
            values.push(value);
        }
        let call = MethodCall::new(method, values);
        call.validate()
            .map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        Ok((call, header.seqid))
    }

    /// Encodes a successful REPLY (server side).
    ///
    /// `None` encodes a reply without a result, which is only meaningful
    /// for methods whose result is optional.
    pub fn encode_reply(
        &self,
        method: Method,
        seqid: i32,
        result: Option<&Value>,
    ) -> Result<Vec<u8>, EncodeError> {
        let mut body = Record::new();
        if let Some(value) = result {
            let expected = method.result();
            if !expected.matches(value) {
                return Err(EncodeError::ResultType {
                    method: method.wire_name(),
                    expected: expected.to_string(),
                    found: value.tag(),
                });
            }
            body.push(0, value.clone());
        }
        self.encode_message(method.wire_name(), MessageType::Reply, seqid, &body)
    }

    /// Encodes a remote fault (server side).
    ///
    /// Declared exceptions become a REPLY with the matching exception field
    /// set; application faults become an EXCEPTION message.
    pub fn encode_fault(
        &self,
        method: Method,
        seqid: i32,
        fault: &RemoteFault,
    ) -> Result<Vec<u8>, EncodeError> {
        match fault.cause {
            FaultCause::Application(kind) => self.encode_application_exception(
                method.wire_name(),
                seqid,
                kind.code(),
                &fault.message,
            ),
            cause => {
                // Every non-application cause has a declared field id.
                let id = cause.field_id().unwrap_or(1);
                let body = Record::new().with(id, Value::Struct(fault.to_record()));
                self.encode_message(method.wire_name(), MessageType::Reply, seqid, &body)
            }
        }
    }

    /// Encodes a framework-level EXCEPTION message.
    ///
    /// Takes the raw method name because servers send these for names they
    /// don't recognise.
    pub fn encode_application_exception(
        &self,
        name: &str,
        seqid: i32,
        code: i32,
        message: &str,
    ) -> Result<Vec<u8>, EncodeError> {
        let body = Record::new()
            .with(1, Value::string(message))
            .with(2, Value::I32(code));
        self.encode_message(name, MessageType::Exception, seqid, &body)
    }

    /// Encodes an arbitrary message. No validation against the service
    /// description is performed.
    pub fn encode_message(
        &self,
        name: &str,
        kind: MessageType,
        seqid: i32,
        body: &Record,
    ) -> Result<Vec<u8>, EncodeError> {
        let mut writer = Writer::default();
        writer.write_header(name, kind, seqid)?;
        writer.write_struct(body)?;
        Ok(writer.into_vec())
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Writer {
    buf: BytesMut,
}

impl Writer {
    fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    fn write_header(
        &mut self,
        name: &str,
        kind: MessageType,
        seqid: i32,
    ) -> Result<(), EncodeError> {
        self.buf.put_u32(VERSION_1 | kind as u32);
        self.write_string(name)?;
        self.buf.put_i32(seqid);
        Ok(())
    }

    fn write_len(&mut self, what: &'static str, len: usize) -> Result<(), EncodeError> {
        let len = i32::try_from(len).map_err(|_| EncodeError::TooLarge { what, len })?;
        self.buf.put_i32(len);
        Ok(())
    }

    fn write_string(&mut self, s: &str) -> Result<(), EncodeError> {
        self.write_len("string", s.len())?;
        self.buf.put_slice(s.as_bytes());
        Ok(())
    }

    fn write_struct(&mut self, record: &Record) -> Result<(), EncodeError> {
        for (id, value) in record.iter() {
            self.buf.put_u8(value.tag().as_u8());
            self.buf.put_i16(*id);
            self.write_value(value)?;
        }
        self.buf.put_u8(TypeTag::Stop.as_u8());
        Ok(())
    }

    fn write_value(&mut self, value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::Bool(v) => self.buf.put_u8(u8::from(*v)),
            Value::Byte(v) => self.buf.put_i8(*v),
            Value::I16(v) => self.buf.put_i16(*v),
            Value::I32(v) => self.buf.put_i32(*v),
            Value::I64(v) => self.buf.put_i64(*v),
            Value::Double(v) => self.buf.put_f64(*v),
            Value::String(s) => self.write_string(s)?,
            Value::Struct(record) => self.write_struct(record)?,
            Value::List { elem, items } | Value::Set { elem, items } => {
                self.buf.put_u8(elem.as_u8());
                self.write_len("list", items.len())?;
                for item in items {
                    self.write_value(item)?;
                }
            }
            Value::Map {
                key,
                value,
                entries,
            } => {
                self.buf.put_u8(key.as_u8());
                self.buf.put_u8(value.as_u8());
                self.write_len("map", entries.len())?;
                for (k, v) in entries {
                    self.write_value(k)?;
                    self.write_value(v)?;
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

struct Header {
    kind: MessageType,
    name: String,
    seqid: i32,
}

/// Cursor over the input. Every read checks the remaining length first, so
/// malformed input surfaces as [`ProtocolError::Truncated`], never a panic.
struct Reader<'a> {
    buf: &'a [u8],
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, depth: 0 }
    }

    fn ensure(&self, needed: usize) -> Result<(), ProtocolError> {
        if self.buf.remaining() < needed {
            return Err(ProtocolError::Truncated {
                needed,
                available: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), ProtocolError> {
        match self.buf.remaining() {
            0 => Ok(()),
            n => Err(ProtocolError::TrailingBytes(n)),
        }
    }

    fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    fn read_i16(&mut self) -> Result<i16, ProtocolError> {
        self.ensure(2)?;
        Ok(self.buf.get_i16())
    }

    fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        self.ensure(4)?;
        Ok(self.buf.get_i32())
    }

    fn read_i64(&mut self) -> Result<i64, ProtocolError> {
        self.ensure(8)?;
        Ok(self.buf.get_i64())
    }

    fn read_f64(&mut self) -> Result<f64, ProtocolError> {
        self.ensure(8)?;
        Ok(self.buf.get_f64())
    }

    fn read_tag(&mut self) -> Result<TypeTag, ProtocolError> {
        TypeTag::try_from(self.read_u8()?)
    }

    /// Reads a length/count prefix and checks that `len * min_each` bytes
    /// can still follow.
    fn read_len(&mut self, min_each: usize) -> Result<usize, ProtocolError> {
        let raw = self.read_i32()?;
        let len = usize::try_from(raw).map_err(|_| ProtocolError::NegativeLength(raw))?;
        self.ensure(len.saturating_mul(min_each))?;
        Ok(len)
    }

    fn read_string(&mut self) -> Result<String, ProtocolError> {
        let len = self.read_len(1)?;
        let bytes = self.buf[..len].to_vec();
        self.buf.advance(len);
        String::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)
    }

    fn read_header(&mut self) -> Result<Header, ProtocolError> {
        let word = self.read_i32()? as u32;
        if word & VERSION_MASK != VERSION_1 {
            return Err(ProtocolError::BadVersion(word));
        }
        let kind = MessageType::try_from((word & 0xff) as u8)?;
        let name = self.read_string()?;
        let seqid = self.read_i32()?;
        Ok(Header { kind, name, seqid })
    }

    /// Runs `read` one nesting level deeper. The level is released on
    /// every exit path, error or not.
    fn nested<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, ProtocolError>,
    ) -> Result<T, ProtocolError> {
        if self.depth >= MAX_DEPTH {
            return Err(ProtocolError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    fn read_struct(&mut self) -> Result<Record, ProtocolError> {
        self.nested(|reader| {
            let mut record = Record::new();
            loop {
                let tag = reader.read_tag()?;
                if tag == TypeTag::Stop {
                    break;
                }
                let id = reader.read_i16()?;
                let value = reader.read_value(tag)?;
                record.push(id, value);
            }
            Ok(record)
        })
    }

    fn read_value(&mut self, tag: TypeTag) -> Result<Value, ProtocolError> {
        Ok(match tag {
            TypeTag::Bool => Value::Bool(self.read_u8()? != 0),
            TypeTag::Byte => Value::Byte(self.read_u8()? as i8),
            TypeTag::I16 => Value::I16(self.read_i16()?),
            TypeTag::I32 => Value::I32(self.read_i32()?),
            TypeTag::I64 => Value::I64(self.read_i64()?),
            TypeTag::Double => Value::Double(self.read_f64()?),
            TypeTag::String => Value::String(self.read_string()?),
            TypeTag::Struct => Value::Struct(self.read_struct()?),
            TypeTag::List => self.nested(|reader| {
                let (elem, items) = reader.read_items()?;
                Ok(Value::List { elem, items })
            })?,
            TypeTag::Set => self.nested(|reader| {
                let (elem, items) = reader.read_items()?;
                Ok(Value::Set { elem, items })
            })?,
            TypeTag::Map => self.nested(Self::read_map)?,
            // STOP and VOID never carry a value; seeing one as a field
            // type means the stream is corrupt.
            TypeTag::Stop | TypeTag::Void => {
                return Err(ProtocolError::UnknownTypeTag(tag.as_u8()));
            }
        })
    }

    /// Reads a container's element, key or value tag. STOP and VOID are
    /// rejected here, before the count is trusted.
    fn read_element_tag(&mut self) -> Result<TypeTag, ProtocolError> {
        match self.read_tag()? {
            tag @ (TypeTag::Stop | TypeTag::Void) => {
                Err(ProtocolError::UnknownTypeTag(tag.as_u8()))
            }
            tag => Ok(tag),
        }
    }

    fn read_items(&mut self) -> Result<(TypeTag, Vec<Value>), ProtocolError> {
        let elem = self.read_element_tag()?;
        let count = self.read_len(elem.min_encoded_len())?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.read_value(elem)?);
        }
        Ok((elem, items))
    }

    fn read_map(&mut self) -> Result<Value, ProtocolError> {
        let key = self.read_element_tag()?;
        let value = self.read_element_tag()?;
        let count = self.read_len(key.min_encoded_len() + value.min_encoded_len())?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let k = self.read_value(key)?;
            let v = self.read_value(value)?;
            entries.push((k, v));
        }
        Ok(Value::Map {
            key,
            value,
            entries,
        })
    }
}

// =========================================================================
// Tests
// =========================================================================
