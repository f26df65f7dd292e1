//! Domain types that travel on the wire.
//!
//! - [`ObjectReference`]: which taxon object a call is about.
//! - [`RemoteFault`] / [`FaultCause`]: exceptions raised by the service.
//! - [`ObjectInfo`]: the record returned by `get_info`, and each entry of
//!   `get_history`.
//! - [`ObjectProvenanceAction`] / [`ExternalDataUnit`]: the entries of
//!   `get_provenance`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, Record, TypeTag, Value};

// ---------------------------------------------------------------------------
// ObjectReference
// ---------------------------------------------------------------------------

/// Reference to a data object: `workspace/id` or `workspace/id/version`.
///
/// The versioned form names one specific object version. The short form
/// means "the latest version of that object".
///
/// Serializes as the plain string, and deserialization runs the same
/// validation as [`FromStr`], so a config file can't smuggle in an invalid
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectReference(String);

/// Why a string isn't a valid [`ObjectReference`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("object reference is empty")]
    Empty,

    #[error("object reference `{0}` must look like workspace/id or workspace/id/version")]
    Shape(String),

    #[error("object reference `{0}` has an invalid version (must be a positive integer)")]
    Version(String),
}

impl ObjectReference {
    /// Parses and validates a reference.
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        if s.is_empty() {
            return Err(ReferenceError::Empty);
        }

        let segments: Vec<&str> = s.split('/').collect();
        if !(2..=3).contains(&segments.len())
            || segments.iter().any(|segment| segment.is_empty())
        {
            return Err(ReferenceError::Shape(s.to_string()));
        }

        if let Some(version) = segments.get(2) {
            match version.parse::<u64>() {
                Ok(v) if v > 0 => {}
                _ => return Err(ReferenceError::Version(s.to_string())),
            }
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The workspace segment (numeric id or name).
    pub fn workspace(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    /// The object segment (numeric id or name).
    pub fn object(&self) -> &str {
        self.0.split('/').nth(1).unwrap_or_default()
    }

    /// The version, if this is a versioned reference.
    pub fn version(&self) -> Option<u64> {
        self.0.split('/').nth(2).and_then(|v| v.parse().ok())
    }
}

impl FromStr for ObjectReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectReference {
    type Error = ReferenceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ObjectReference> for String {
    fn from(reference: ObjectReference) -> Self {
        reference.0
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Remote faults
// ---------------------------------------------------------------------------

/// Error codes carried by framework-level application exceptions.
///
/// These are raised by the RPC layer on the server side (unknown method,
/// internal error, ...) rather than by the taxon service itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationErrorKind {
    Unknown,
    UnknownMethod,
    InvalidMessageType,
    WrongMethodName,
    BadSequenceId,
    MissingResult,
    InternalError,
    ProtocolError,
    InvalidTransform,
    InvalidProtocol,
    UnsupportedClientType,
    /// A code this client doesn't know about.
    Other(i32),
}

impl ApplicationErrorKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Unknown,
            1 => Self::UnknownMethod,
            2 => Self::InvalidMessageType,
            3 => Self::WrongMethodName,
            4 => Self::BadSequenceId,
            5 => Self::MissingResult,
            6 => Self::InternalError,
            7 => Self::ProtocolError,
            8 => Self::InvalidTransform,
            9 => Self::InvalidProtocol,
            10 => Self::UnsupportedClientType,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::UnknownMethod => 1,
            Self::InvalidMessageType => 2,
            Self::WrongMethodName => 3,
            Self::BadSequenceId => 4,
            Self::MissingResult => 5,
            Self::InternalError => 6,
            Self::ProtocolError => 7,
            Self::InvalidTransform => 8,
            Self::InvalidProtocol => 9,
            Self::UnsupportedClientType => 10,
            Self::Other(code) => code,
        }
    }
}

/// The symbolic cause of a [`RemoteFault`].
///
/// The first six variants are the exception types the taxon service
/// declares on every method; `Application` covers framework-level
/// exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCause {
    /// Catch-all service failure.
    Service,
    /// The token is valid but may not read this object.
    Authorization,
    /// The token is missing, invalid or expired.
    Authentication,
    /// The object reference doesn't resolve to an object.
    ObjectReference,
    /// The object lacks the requested attribute.
    Attribute,
    /// The object isn't of a type the service can read as a taxon.
    Type,
    Application(ApplicationErrorKind),
}

impl FaultCause {
    /// The exception type name as declared by the service.
    pub fn name(self) -> &'static str {
        match self {
            Self::Service => "ServiceException",
            Self::Authorization => "AuthorizationException",
            Self::Authentication => "AuthenticationException",
            Self::ObjectReference => "ObjectReferenceException",
            Self::Attribute => "AttributeException",
            Self::Type => "TypeException",
            Self::Application(_) => "TApplicationException",
        }
    }
}

impl fmt::Display for FaultCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application(kind) => write!(f, "{}({kind:?})", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}

/// An exception raised by the remote service.
///
/// The message and cause are kept exactly as the service sent them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{cause}: {message}")]
pub struct RemoteFault {
    pub cause: FaultCause,
    pub message: String,
    /// Server-side stack trace, when the service includes one.
    pub stacktrace: Option<String>,
    /// The inputs the failing call was made with, when included.
    pub inputs: Option<BTreeMap<String, String>>,
}

impl RemoteFault {
    pub fn new(cause: FaultCause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
            stacktrace: None,
            inputs: None,
        }
    }

    pub fn with_stacktrace(mut self, stacktrace: impl Into<String>) -> Self {
        self.stacktrace = Some(stacktrace.into());
        self
    }

    pub fn with_inputs<I, K, V>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.inputs = Some(
            inputs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Builds the exception struct body (`message`, `stacktrace`, `inputs`).
    pub(crate) fn to_record(&self) -> Record {
        let mut record = Record::new().with(1, Value::string(&self.message));
        if let Some(stacktrace) = &self.stacktrace {
            record.push(2, Value::string(stacktrace));
        }
        if let Some(inputs) = &self.inputs {
            record.push(3, Value::string_map(inputs.clone()));
        }
        record
    }

    /// Reads a declared exception struct.
    pub(crate) fn from_record(
        cause: FaultCause,
        mut record: Record,
    ) -> Result<Self, ProtocolError> {
        let message = take_string(&mut record, 1, cause.name())?.ok_or_else(|| {
            ProtocolError::Malformed(format!("{} without a message", cause.name()))
        })?;
        let stacktrace = take_string(&mut record, 2, cause.name())?;
        let inputs = match record.take(3) {
            None => None,
            Some(value) => Some(string_map(value, cause.name())?),
        };
        Ok(Self {
            cause,
            message,
            stacktrace,
            inputs,
        })
    }

    /// Reads a framework-level application exception (`message`, `type`).
    pub(crate) fn from_application_record(
        mut record: Record,
    ) -> Result<Self, ProtocolError> {
        let message = take_string(&mut record, 1, "TApplicationException")?
            .unwrap_or_default();
        let code = match record.take(2) {
            None => 0,
            Some(Value::I32(code)) => code,
            Some(other) => {
                return Err(ProtocolError::Malformed(format!(
                    "TApplicationException type must be i32, got {:?}",
                    other.tag()
                )));
            }
        };
        Ok(Self::new(
            FaultCause::Application(ApplicationErrorKind::from_code(code)),
            message,
        ))
    }
}

// ---------------------------------------------------------------------------
// ObjectInfo
// ---------------------------------------------------------------------------

/// Basic properties of a stored object, as returned by `get_info`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub object_id: i64,
    pub object_name: String,
    pub object_reference: String,
    pub object_reference_versioned: String,
    pub type_string: String,
    pub save_date: String,
    pub version: i64,
    pub saved_by: String,
    pub workspace_id: i64,
    pub workspace_name: String,
    pub object_checksum: String,
    pub object_size: i64,
    pub object_metadata: BTreeMap<String, String>,
}

impl ObjectInfo {
    /// Shapes a decoded `ObjectInfo` struct. Unknown fields are ignored;
    /// missing fields keep their default value.
    pub fn from_record(mut record: Record) -> Result<Self, ProtocolError> {
        const NAME: &str = "ObjectInfo";
        let mut info = ObjectInfo::default();

        if let Some(v) = take_i64(&mut record, 1, NAME)? {
            info.object_id = v;
        }
        if let Some(v) = take_string(&mut record, 2, NAME)? {
            info.object_name = v;
        }
        if let Some(v) = take_string(&mut record, 3, NAME)? {
            info.object_reference = v;
        }
        if let Some(v) = take_string(&mut record, 4, NAME)? {
            info.object_reference_versioned = v;
        }
        if let Some(v) = take_string(&mut record, 5, NAME)? {
            info.type_string = v;
        }
        if let Some(v) = take_string(&mut record, 6, NAME)? {
            info.save_date = v;
        }
        if let Some(v) = take_i64(&mut record, 7, NAME)? {
            info.version = v;
        }
        if let Some(v) = take_string(&mut record, 8, NAME)? {
            info.saved_by = v;
        }
        if let Some(v) = take_i64(&mut record, 9, NAME)? {
            info.workspace_id = v;
        }
        if let Some(v) = take_string(&mut record, 10, NAME)? {
            info.workspace_name = v;
        }
        if let Some(v) = take_string(&mut record, 11, NAME)? {
            info.object_checksum = v;
        }
        if let Some(v) = take_i64(&mut record, 12, NAME)? {
            info.object_size = v;
        }
        if let Some(v) = record.take(13) {
            info.object_metadata = string_map(v, NAME)?;
        }
        Ok(info)
    }

    /// The inverse of [`from_record`](Self::from_record), in field-id order.
    pub fn to_value(&self) -> Value {
        Value::Struct(
            Record::new()
                .with(1, Value::I64(self.object_id))
                .with(2, Value::string(&self.object_name))
                .with(3, Value::string(&self.object_reference))
                .with(4, Value::string(&self.object_reference_versioned))
                .with(5, Value::string(&self.type_string))
                .with(6, Value::string(&self.save_date))
                .with(7, Value::I64(self.version))
                .with(8, Value::string(&self.saved_by))
                .with(9, Value::I64(self.workspace_id))
                .with(10, Value::string(&self.workspace_name))
                .with(11, Value::string(&self.object_checksum))
                .with(12, Value::I64(self.object_size))
                .with(13, Value::string_map(self.object_metadata.clone())),
        )
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// An external resource an object was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExternalDataUnit {
    pub resource_name: String,
    pub resource_url: String,
    pub resource_version: String,
    pub resource_release_date: String,
    pub data_url: String,
    pub data_id: String,
    pub description: String,
}

impl ExternalDataUnit {
    pub fn from_record(mut record: Record) -> Result<Self, ProtocolError> {
        const NAME: &str = "ExternalDataUnit";
        let mut unit = ExternalDataUnit::default();
        let fields = [
            (1, &mut unit.resource_name),
            (2, &mut unit.resource_url),
            (3, &mut unit.resource_version),
            (4, &mut unit.resource_release_date),
            (5, &mut unit.data_url),
            (6, &mut unit.data_id),
            (7, &mut unit.description),
        ];
        for (id, slot) in fields {
            if let Some(v) = take_string(&mut record, id, NAME)? {
                *slot = v;
            }
        }
        Ok(unit)
    }

    pub fn to_value(&self) -> Value {
        Value::Struct(
            Record::new()
                .with(1, Value::string(&self.resource_name))
                .with(2, Value::string(&self.resource_url))
                .with(3, Value::string(&self.resource_version))
                .with(4, Value::string(&self.resource_release_date))
                .with(5, Value::string(&self.data_url))
                .with(6, Value::string(&self.data_id))
                .with(7, Value::string(&self.description)),
        )
    }
}

/// One step in the recorded history of how an object was made.
///
/// Every field is optional on the wire; absent fields stay empty.
/// `method_parameters` carries each parameter as the service rendered it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectProvenanceAction {
    pub time: String,
    pub service_name: String,
    pub service_version: String,
    pub service_method: String,
    pub method_parameters: Vec<String>,
    pub script_name: String,
    pub script_version: String,
    pub script_command_line: String,
    pub input_object_references: Vec<String>,
    pub validated_object_references: Vec<String>,
    pub intermediate_input_ids: Vec<String>,
    pub intermediate_output_ids: Vec<String>,
    pub external_data: Vec<ExternalDataUnit>,
    pub description: String,
}

impl ObjectProvenanceAction {
    /// Shapes a decoded `ObjectProvenanceAction` struct.
    pub fn from_record(mut record: Record) -> Result<Self, ProtocolError> {
        const NAME: &str = "ObjectProvenanceAction";
        let mut action = ObjectProvenanceAction::default();

        let strings = [
            (1, &mut action.time),
            (2, &mut action.service_name),
            (3, &mut action.service_version),
            (4, &mut action.service_method),
            (6, &mut action.script_name),
            (7, &mut action.script_version),
            (8, &mut action.script_command_line),
            (14, &mut action.description),
        ];
        for (id, slot) in strings {
            if let Some(v) = take_string(&mut record, id, NAME)? {
                *slot = v;
            }
        }

        let lists = [
            (5, &mut action.method_parameters),
            (9, &mut action.input_object_references),
            (10, &mut action.validated_object_references),
            (11, &mut action.intermediate_input_ids),
            (12, &mut action.intermediate_output_ids),
        ];
        for (id, slot) in lists {
            if let Some(v) = take_string_list(&mut record, id, NAME)? {
                *slot = v;
            }
        }

        if let Some(v) = record.take(13) {
            let tag = v.tag();
            action.external_data = v
                .into_items()
                .ok_or_else(|| field_type(NAME, 13, TypeTag::List, tag))?
                .into_iter()
                .map(|item| match item {
                    Value::Struct(unit) => ExternalDataUnit::from_record(unit),
                    other => Err(field_type(NAME, 13, TypeTag::Struct, other.tag())),
                })
                .collect::<Result<_, _>>()?;
        }
        Ok(action)
    }

    /// The inverse of [`from_record`](Self::from_record), in field-id order.
    pub fn to_value(&self) -> Value {
        Value::Struct(
            Record::new()
                .with(1, Value::string(&self.time))
                .with(2, Value::string(&self.service_name))
                .with(3, Value::string(&self.service_version))
                .with(4, Value::string(&self.service_method))
                .with(5, Value::string_list(self.method_parameters.clone()))
                .with(6, Value::string(&self.script_name))
                .with(7, Value::string(&self.script_version))
                .with(8, Value::string(&self.script_command_line))
                .with(9, Value::string_list(self.input_object_references.clone()))
                .with(10, Value::string_list(self.validated_object_references.clone()))
                .with(11, Value::string_list(self.intermediate_input_ids.clone()))
                .with(12, Value::string_list(self.intermediate_output_ids.clone()))
                .with(
                    13,
                    Value::List {
                        elem: TypeTag::Struct,
                        items: self
                            .external_data
                            .iter()
                            .map(ExternalDataUnit::to_value)
                            .collect(),
                    },
                )
                .with(14, Value::string(&self.description)),
        )
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn take_string(
    record: &mut Record,
    id: i16,
    owner: &str,
) -> Result<Option<String>, ProtocolError> {
    match record.take(id) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(field_type(owner, id, TypeTag::String, other.tag())),
    }
}

fn take_i64(
    record: &mut Record,
    id: i16,
    owner: &str,
) -> Result<Option<i64>, ProtocolError> {
    match record.take(id) {
        None => Ok(None),
        Some(Value::I64(v)) => Ok(Some(v)),
        Some(other) => Err(field_type(owner, id, TypeTag::I64, other.tag())),
    }
}

fn take_string_list(
    record: &mut Record,
    id: i16,
    owner: &str,
) -> Result<Option<Vec<String>>, ProtocolError> {
    match record.take(id) {
        None => Ok(None),
        Some(value) => {
            let tag = value.tag();
            value
                .into_string_list()
                .map(Some)
                .ok_or_else(|| field_type(owner, id, TypeTag::List, tag))
        }
    }
}

fn string_map(
    value: Value,
    owner: &str,
) -> Result<BTreeMap<String, String>, ProtocolError> {
    let Value::Map { entries, .. } = value else {
        return Err(field_type(owner, 0, TypeTag::Map, value.tag()));
    };
    entries
        .into_iter()
        .map(|(k, v)| match (k, v) {
            (Value::String(k), Value::String(v)) => Ok((k, v)),
            (k, v) => Err(ProtocolError::Malformed(format!(
                "{owner}: expected map<string,string>, found {:?}/{:?} entry",
                k.tag(),
                v.tag()
            ))),
        })
        .collect()
}

fn field_type(owner: &str, id: i16, expected: TypeTag, found: TypeTag) -> ProtocolError {
    ProtocolError::Malformed(format!(
        "{owner} field {id} should be {expected:?}, got {found:?}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // ObjectReference
    // =====================================================================

    #[test]
    fn test_reference_accepts_short_and_versioned_forms() {
        let short = ObjectReference::parse("654/7").unwrap();
        assert_eq!(short.workspace(), "654");
        assert_eq!(short.object(), "7");
        assert_eq!(short.version(), None);

        let versioned: ObjectReference = "993/674615/1".parse().unwrap();
        assert_eq!(versioned.version(), Some(1));
        assert_eq!(versioned.to_string(), "993/674615/1");
    }

    #[test]
    fn test_reference_accepts_names() {
        // Workspaces and objects can be addressed by name as well as id.
        let named = ObjectReference::parse("ReferenceTaxons/562_taxon").unwrap();
        assert_eq!(named.workspace(), "ReferenceTaxons");
    }

    #[test]
    fn test_reference_rejects_empty() {
        assert_eq!(ObjectReference::parse(""), Err(ReferenceError::Empty));
    }

    #[test]
    fn test_reference_rejects_bad_shapes() {
        for bad in ["654", "654/", "/7", "654//1", "1/2/3/4"] {
            assert!(
                matches!(ObjectReference::parse(bad), Err(ReferenceError::Shape(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_reference_rejects_bad_version() {
        for bad in ["654/7/latest", "654/7/0", "654/7/-1"] {
            assert!(matches!(
                ObjectReference::parse(bad),
                Err(ReferenceError::Version(_))
            ));
        }
    }

    #[test]
    fn test_reference_serde_validates() {
        let ok: ObjectReference = serde_json::from_str(r#""654/7""#).unwrap();
        assert_eq!(ok.as_str(), "654/7");
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#""654/7""#);

        let bad: Result<ObjectReference, _> = serde_json::from_str(r#""nope""#);
        assert!(bad.is_err());
    }

    // =====================================================================
    // RemoteFault
    // =====================================================================

    #[test]
    fn test_fault_cause_names_match_declared_exceptions() {
        assert_eq!(FaultCause::Authentication.name(), "AuthenticationException");
        assert_eq!(FaultCause::ObjectReference.name(), "ObjectReferenceException");
        assert_eq!(
            FaultCause::Application(ApplicationErrorKind::UnknownMethod).to_string(),
            "TApplicationException(UnknownMethod)"
        );
    }

    #[test]
    fn test_remote_fault_display_preserves_remote_message() {
        let fault = RemoteFault::new(FaultCause::Type, "Invalid type! Expected Taxon");
        assert_eq!(fault.to_string(), "TypeException: Invalid type! Expected Taxon");
    }

    #[test]
    fn test_remote_fault_record_round_trip() {
        let fault = RemoteFault::new(FaultCause::Service, "boom")
            .with_stacktrace("Traceback ...")
            .with_inputs([("ref", "1/2/3")]);
        let decoded =
            RemoteFault::from_record(FaultCause::Service, fault.to_record()).unwrap();
        assert_eq!(decoded, fault);
    }

    #[test]
    fn test_remote_fault_requires_message() {
        let err = RemoteFault::from_record(FaultCause::Service, Record::new()).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_application_error_kind_codes_round_trip() {
        for code in 0..=12 {
            assert_eq!(ApplicationErrorKind::from_code(code).code(), code);
        }
    }

    // =====================================================================
    // ObjectInfo
    // =====================================================================

    #[test]
    fn test_object_info_record_round_trip() {
        let info = ObjectInfo {
            object_id: 674615,
            object_name: "98AG31_taxon".into(),
            object_reference: "993/674615".into(),
            object_reference_versioned: "993/674615/1".into(),
            type_string: "KBaseGenomeAnnotations.Taxon-1.0".into(),
            save_date: "2015-10-19T20:10:32+0000".into(),
            version: 1,
            saved_by: "mhenderson".into(),
            workspace_id: 993,
            workspace_name: "ReferenceTaxons".into(),
            object_checksum: "a2b5".into(),
            object_size: 1024,
            object_metadata: BTreeMap::from([("source".to_string(), "NCBI".to_string())]),
        };
        let record = info.to_value().into_record().unwrap();
        assert_eq!(ObjectInfo::from_record(record).unwrap(), info);
    }

    #[test]
    fn test_object_info_ignores_unknown_fields() {
        let record = Record::new()
            .with(2, Value::string("name"))
            .with(99, Value::Bool(true));
        let info = ObjectInfo::from_record(record).unwrap();
        assert_eq!(info.object_name, "name");
    }

    #[test]
    fn test_object_info_rejects_wrong_field_type() {
        let record = Record::new().with(1, Value::string("not a number"));
        assert!(ObjectInfo::from_record(record).is_err());
    }

    // =====================================================================
    // Provenance
    // =====================================================================

    #[test]
    fn test_provenance_action_record_round_trip() {
        let action = ObjectProvenanceAction {
            time: "2015-10-19T20:10:32+0000".into(),
            script_name: "make_taxons.py".into(),
            input_object_references: vec!["993/1/1".into()],
            external_data: vec![ExternalDataUnit {
                resource_name: "NCBI taxonomy".into(),
                resource_url: "ftp://ftp.ncbi.nih.gov/pub/taxonomy".into(),
                data_id: "747676".into(),
                ..ExternalDataUnit::default()
            }],
            description: "taxon loaded from NCBI dump".into(),
            ..ObjectProvenanceAction::default()
        };
        let record = action.to_value().into_record().unwrap();
        assert_eq!(ObjectProvenanceAction::from_record(record).unwrap(), action);
    }

    #[test]
    fn test_provenance_action_absent_fields_stay_empty() {
        let record = Record::new().with(2, Value::string("genome_loader"));
        let action = ObjectProvenanceAction::from_record(record).unwrap();
        assert_eq!(action.service_name, "genome_loader");
        assert!(action.external_data.is_empty());
        assert!(action.method_parameters.is_empty());
    }

    #[test]
    fn test_provenance_action_rejects_non_struct_external_data() {
        let record = Record::new().with(13, Value::string_list(["NCBI"]));
        assert!(matches!(
            ObjectProvenanceAction::from_record(record),
            Err(ProtocolError::Malformed(_))
        ));
    }
}
