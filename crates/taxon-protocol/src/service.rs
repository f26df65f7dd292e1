//! The taxon service interface description.
//!
//! This is the static "IDL" the codec validates against: which methods
//! exist, what arguments they take, what they return, and which exception
//! types they may raise. It is a closed enum rather than a string table, so
//! adding a method forces every `match` on [`Method`] to handle it.

use std::fmt;

use crate::{EncodeError, FaultCause, ObjectReference, TypeTag, Value};

// ---------------------------------------------------------------------------
// TypeDesc
// ---------------------------------------------------------------------------

/// A declared type from the service description.
///
/// Containers point at `'static` element descriptions so the whole table
/// can live in constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDesc {
    Bool,
    I32,
    I64,
    String,
    /// A named struct. Its fields are shaped by the typed accessor.
    Struct(&'static str),
    List(&'static TypeDesc),
    Map(&'static TypeDesc, &'static TypeDesc),
}

impl TypeDesc {
    /// The wire tag a value of this type is written with.
    pub fn tag(self) -> TypeTag {
        match self {
            TypeDesc::Bool => TypeTag::Bool,
            TypeDesc::I32 => TypeTag::I32,
            TypeDesc::I64 => TypeTag::I64,
            TypeDesc::String => TypeTag::String,
            TypeDesc::Struct(_) => TypeTag::Struct,
            TypeDesc::List(_) => TypeTag::List,
            TypeDesc::Map(_, _) => TypeTag::Map,
        }
    }

    /// Checks a value against this type, including container elements.
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (TypeDesc::List(elem), Value::List { elem: tag, items }) => {
                *tag == elem.tag() && items.iter().all(|item| elem.matches(item))
            }
            (
                TypeDesc::Map(key, val),
                Value::Map {
                    key: key_tag,
                    value: val_tag,
                    entries,
                },
            ) => {
                *key_tag == key.tag()
                    && *val_tag == val.tag()
                    && entries
                        .iter()
                        .all(|(k, v)| key.matches(k) && val.matches(v))
            }
            (TypeDesc::List(_) | TypeDesc::Map(_, _), _) => false,
            (scalar, value) => scalar.tag() == value.tag(),
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Bool => f.write_str("bool"),
            TypeDesc::I32 => f.write_str("i32"),
            TypeDesc::I64 => f.write_str("i64"),
            TypeDesc::String => f.write_str("string"),
            TypeDesc::Struct(name) => f.write_str(name),
            TypeDesc::List(elem) => write!(f, "list<{elem}>"),
            TypeDesc::Map(k, v) => write!(f, "map<{k},{v}>"),
        }
    }
}

const STRING_LIST: TypeDesc = TypeDesc::List(&TypeDesc::String);
const OBJECT_INFO: TypeDesc = TypeDesc::Struct("ObjectInfo");

// ---------------------------------------------------------------------------
// Parameters and exceptions
// ---------------------------------------------------------------------------

/// A declared method parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub id: i16,
    pub name: &'static str,
    pub ty: TypeDesc,
}

/// Every accessor takes the object reference as its only parameter.
/// The auth token is not a parameter: it travels out-of-band.
const REF_PARAMS: &[Param] = &[Param {
    id: 1,
    name: "ref",
    ty: TypeDesc::String,
}];

/// Exception fields declared on every method's reply struct.
///
/// Field 0 of a reply struct is the successful result; fields 1..=6 are
/// these exceptions, at most one of which is set.
pub const DECLARED_EXCEPTIONS: [(i16, FaultCause); 6] = [
    (1, FaultCause::Service),
    (2, FaultCause::Authorization),
    (3, FaultCause::Authentication),
    (4, FaultCause::ObjectReference),
    (5, FaultCause::Attribute),
    (6, FaultCause::Type),
];

impl FaultCause {
    /// Reply-struct field id for a declared exception.
    pub fn field_id(self) -> Option<i16> {
        DECLARED_EXCEPTIONS
            .iter()
            .find(|(_, cause)| *cause == self)
            .map(|(id, _)| *id)
    }

    /// The declared exception at a reply-struct field id.
    pub fn from_field_id(id: i16) -> Option<Self> {
        DECLARED_EXCEPTIONS
            .iter()
            .find(|(field_id, _)| *field_id == id)
            .map(|(_, cause)| *cause)
    }
}

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// The remote methods of the taxon service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GetParent,
    GetChildren,
    GetGenomeAnnotations,
    GetScientificLineage,
    GetScientificName,
    GetTaxonomicId,
    GetKingdom,
    GetDomain,
    GetGeneticCode,
    GetAliases,
    GetInfo,
    GetHistory,
    GetProvenance,
    GetId,
    GetName,
    GetVersion,
}

impl Method {
    /// Every method, in service-description order.
    pub const ALL: [Method; 16] = [
        Method::GetParent,
        Method::GetChildren,
        Method::GetGenomeAnnotations,
        Method::GetScientificLineage,
        Method::GetScientificName,
        Method::GetTaxonomicId,
        Method::GetKingdom,
        Method::GetDomain,
        Method::GetGeneticCode,
        Method::GetAliases,
        Method::GetInfo,
        Method::GetHistory,
        Method::GetProvenance,
        Method::GetId,
        Method::GetName,
        Method::GetVersion,
    ];

    /// The method name written into the message header.
    pub fn wire_name(self) -> &'static str {
        match self {
            Method::GetParent => "get_parent",
            Method::GetChildren => "get_children",
            Method::GetGenomeAnnotations => "get_genome_annotations",
            Method::GetScientificLineage => "get_scientific_lineage",
            Method::GetScientificName => "get_scientific_name",
            Method::GetTaxonomicId => "get_taxonomic_id",
            Method::GetKingdom => "get_kingdom",
            Method::GetDomain => "get_domain",
            Method::GetGeneticCode => "get_genetic_code",
            Method::GetAliases => "get_aliases",
            Method::GetInfo => "get_info",
            Method::GetHistory => "get_history",
            Method::GetProvenance => "get_provenance",
            Method::GetId => "get_id",
            Method::GetName => "get_name",
            Method::GetVersion => "get_version",
        }
    }

    /// Looks a method up by its wire name.
    pub fn from_wire_name(name: &str) -> Option<Method> {
        Method::ALL.into_iter().find(|m| m.wire_name() == name)
    }

    /// Declared parameters, in field-id order.
    pub fn params(self) -> &'static [Param] {
        REF_PARAMS
    }

    /// Declared result type.
    pub fn result(self) -> TypeDesc {
        match self {
            Method::GetParent
            | Method::GetScientificName
            | Method::GetKingdom
            | Method::GetDomain
            | Method::GetName
            | Method::GetVersion => TypeDesc::String,
            Method::GetChildren
            | Method::GetGenomeAnnotations
            | Method::GetScientificLineage
            | Method::GetAliases => STRING_LIST,
            Method::GetTaxonomicId | Method::GetId => TypeDesc::I64,
            Method::GetGeneticCode => TypeDesc::I32,
            Method::GetInfo => OBJECT_INFO,
            Method::GetHistory => TypeDesc::List(&OBJECT_INFO),
            Method::GetProvenance => {
                TypeDesc::List(&TypeDesc::Struct("ObjectProvenanceAction"))
            }
        }
    }

    /// Whether a reply may legitimately carry no result.
    ///
    /// A taxon at the root of the tree has no parent, and not every taxon
    /// records a kingdom.
    pub fn result_optional(self) -> bool {
        matches!(self, Method::GetParent | Method::GetKingdom)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.wire_name())
    }
}

// ---------------------------------------------------------------------------
// MethodCall
// ---------------------------------------------------------------------------

/// One invocation: a method plus its arguments in parameter order.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: Method,
    pub args: Vec<Value>,
}

impl MethodCall {
    pub fn new(method: Method, args: Vec<Value>) -> Self {
        Self { method, args }
    }

    /// The call every accessor makes: the object reference as sole argument.
    pub fn for_reference(method: Method, reference: &ObjectReference) -> Self {
        Self::new(method, vec![Value::string(reference.as_str())])
    }

    /// Checks the arguments against the declared parameters.
    pub fn validate(&self) -> Result<(), EncodeError> {
        let params = self.method.params();
        if params.len() != self.args.len() {
            return Err(EncodeError::ArgumentCount {
                method: self.method.wire_name(),
                expected: params.len(),
                found: self.args.len(),
            });
        }
        for (position, (param, arg)) in params.iter().zip(&self.args).enumerate() {
            if !param.ty.matches(arg) {
                return Err(EncodeError::ArgumentType {
                    method: self.method.wire_name(),
                    position,
                    name: param.name,
                    expected: param.ty.tag(),
                    found: arg.tag(),
                });
            }
        }
        Ok(())
    }

    /// The argument for the `ref` parameter, if it is a string.
    pub fn reference(&self) -> Option<&str> {
        self.args.first().and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_are_unique_and_resolvable() {
        for method in Method::ALL {
            assert_eq!(Method::from_wire_name(method.wire_name()), Some(method));
        }
        assert_eq!(Method::from_wire_name("get_everything"), None);
    }

    #[test]
    fn test_result_types_follow_service_description() {
        assert_eq!(Method::GetScientificName.result(), TypeDesc::String);
        assert_eq!(Method::GetTaxonomicId.result(), TypeDesc::I64);
        assert_eq!(Method::GetGeneticCode.result(), TypeDesc::I32);
        assert_eq!(
            Method::GetScientificLineage.result().to_string(),
            "list<string>"
        );
        assert_eq!(Method::GetInfo.result().to_string(), "ObjectInfo");
        assert_eq!(Method::GetHistory.result().to_string(), "list<ObjectInfo>");
        assert_eq!(
            Method::GetProvenance.result().to_string(),
            "list<ObjectProvenanceAction>"
        );
    }

    #[test]
    fn test_method_display_honours_width() {
        assert_eq!(format!("{:<12}|", Method::GetId), "get_id      |");
    }

    #[test]
    fn test_only_parent_and_kingdom_are_optional() {
        let optional: Vec<Method> = Method::ALL
            .into_iter()
            .filter(|m| m.result_optional())
            .collect();
        assert_eq!(optional, vec![Method::GetParent, Method::GetKingdom]);
    }

    #[test]
    fn test_declared_exception_ids_round_trip() {
        for (id, cause) in DECLARED_EXCEPTIONS {
            assert_eq!(cause.field_id(), Some(id));
            assert_eq!(FaultCause::from_field_id(id), Some(cause));
        }
        assert_eq!(FaultCause::from_field_id(0), None);
    }

    #[test]
    fn test_type_desc_matches_checks_elements() {
        let good = Value::string_list(["a", "b"]);
        let bad = Value::List {
            elem: TypeTag::String,
            items: vec![Value::I32(1)],
        };
        assert!(STRING_LIST.matches(&good));
        assert!(!STRING_LIST.matches(&bad));
        assert!(!STRING_LIST.matches(&Value::string("a")));
    }

    #[test]
    fn test_call_for_reference_validates() {
        let reference = ObjectReference::parse("993/674615/1").unwrap();
        let call = MethodCall::for_reference(Method::GetDomain, &reference);
        assert_eq!(call.validate(), Ok(()));
        assert_eq!(call.reference(), Some("993/674615/1"));
    }

    #[test]
    fn test_call_with_wrong_argument_type_fails() {
        let call = MethodCall::new(Method::GetDomain, vec![Value::I64(993)]);
        assert_eq!(
            call.validate(),
            Err(EncodeError::ArgumentType {
                method: "get_domain",
                position: 0,
                name: "ref",
                expected: TypeTag::String,
                found: TypeTag::I64,
            })
        );
    }

    #[test]
    fn test_call_with_wrong_argument_count_fails() {
        let call = MethodCall::new(Method::GetAliases, vec![]);
        assert!(matches!(
            call.validate(),
            Err(EncodeError::ArgumentCount {
                expected: 1,
                found: 0,
                ..
            })
        ));
    }
}
