//! The dynamic value model of the binary protocol.
//!
//! Every field on the wire is self-describing: a one-byte [`TypeTag`]
//! followed by the value. [`Value`] mirrors that, one variant per
//! tag, so the decoder can read any well-formed message
//! without knowing its schema, and the service description
//! ([`TypeDesc`](crate::TypeDesc)) is checked afterwards.

use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// TypeTag
// ---------------------------------------------------------------------------

/// One-byte type marker that precedes every field and container element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    /// End of a struct's field list.
    Stop = 0,
    Void = 1,
    Bool = 2,
    Byte = 3,
    Double = 4,
    I16 = 6,
    I32 = 8,
    I64 = 10,
    /// Length-prefixed UTF-8.
    String = 11,
    Struct = 12,
    Map = 13,
    Set = 14,
    List = 15,
}

impl TypeTag {
    /// Returns the wire byte for this tag.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// The smallest number of bytes a value with this tag can occupy.
    ///
    /// Used to reject container counts that can't possibly fit in the
    /// remaining input before allocating for them.
    pub(crate) fn min_encoded_len(self) -> usize {
        match self {
            TypeTag::Stop | TypeTag::Void | TypeTag::Bool | TypeTag::Byte | TypeTag::Struct => 1,
            TypeTag::I16 => 2,
            TypeTag::I32 | TypeTag::String => 4,
            TypeTag::Double | TypeTag::I64 => 8,
            TypeTag::Set | TypeTag::List => 5,
            TypeTag::Map => 6,
        }
    }
}

impl TryFrom<u8> for TypeTag {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0 => TypeTag::Stop,
            1 => TypeTag::Void,
            2 => TypeTag::Bool,
            3 => TypeTag::Byte,
            4 => TypeTag::Double,
            6 => TypeTag::I16,
            8 => TypeTag::I32,
            10 => TypeTag::I64,
            11 => TypeTag::String,
            12 => TypeTag::Struct,
            13 => TypeTag::Map,
            14 => TypeTag::Set,
            15 => TypeTag::List,
            other => return Err(ProtocolError::UnknownTypeTag(other)),
        })
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// The body of a struct: `(field id, value)` pairs in wire order.
///
/// Order is preserved on purpose: re-encoding a decoded record reproduces
/// the fields in the order they were received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(i16, Value)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field and returns the record (builder style).
    pub fn with(mut self, id: i16, value: Value) -> Self {
        self.fields.push((id, value));
        self
    }

    /// Appends a field.
    pub fn push(&mut self, id: i16, value: Value) {
        self.fields.push((id, value));
    }

    /// Returns the first field with the given id.
    pub fn get(&self, id: i16) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field_id, _)| *field_id == id)
            .map(|(_, value)| value)
    }

    /// Removes and returns the first field with the given id.
    pub fn take(&mut self, id: i16) -> Option<Value> {
        let index = self.fields.iter().position(|(field_id, _)| *field_id == id)?;
        Some(self.fields.remove(index).1)
    }

    /// Iterates over the fields in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &(i16, Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(i16, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (i16, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A decoded (or to-be-encoded) protocol value.
///
/// Containers remember their element tags so that empty lists, sets and
/// maps survive a round trip unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    String(String),
    Struct(Record),
    List { elem: TypeTag, items: Vec<Value> },
    Set { elem: TypeTag, items: Vec<Value> },
    Map {
        key: TypeTag,
        value: TypeTag,
        entries: Vec<(Value, Value)>,
    },
}

impl Value {
    /// The tag this value is written with.
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::Byte(_) => TypeTag::Byte,
            Value::I16(_) => TypeTag::I16,
            Value::I32(_) => TypeTag::I32,
            Value::I64(_) => TypeTag::I64,
            Value::Double(_) => TypeTag::Double,
            Value::String(_) => TypeTag::String,
            Value::Struct(_) => TypeTag::Struct,
            Value::List { .. } => TypeTag::List,
            Value::Set { .. } => TypeTag::Set,
            Value::Map { .. } => TypeTag::Map,
        }
    }

    /// Shorthand for `Value::String(s.into())`.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Builds a `list<string>`.
    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List {
            elem: TypeTag::String,
            items: items.into_iter().map(Value::string).collect(),
        }
    }

    /// Builds a `map<string, string>`, keeping the iteration order.
    pub fn string_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Value::Map {
            key: TypeTag::String,
            value: TypeTag::String,
            entries: entries
                .into_iter()
                .map(|(k, v)| (Value::string(k), Value::string(v)))
                .collect(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Widens any integer variant to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Byte(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Value::Struct(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the items of a list or set.
    pub fn into_items(self) -> Option<Vec<Value>> {
        match self {
            Value::List { items, .. } | Value::Set { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Converts a `list<string>` (or `set<string>`) into `Vec<String>`.
    ///
    /// Returns `None` if this isn't a list/set or any item isn't a string.
    pub fn into_string_list(self) -> Option<Vec<String>> {
        self.into_items()?
            .into_iter()
            .map(Value::into_string)
            .collect()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Struct(record) => {
                f.write_str("{")?;
                for (i, (id, value)) in record.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{id}: {value}")?;
                }
                f.write_str("}")
            }
            Value::List { items, .. } | Value::Set { items, .. } => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map { entries, .. } => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}
