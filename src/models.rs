//! Core data models used throughout schema-compass.
//!
//! Two families of types live here:
//!
//! - The **schema model** ([`TypeDefinition`], [`TypeExpr`], [`TypeRegistry`])
//!   built once per schema by [`crate::sdl`] and read by the flattener.
//! - The **document model** ([`FieldDoc`], [`FieldMetadata`],
//!   [`EmbeddingRecord`], [`QueryResult`]) that flows through embedding,
//!   persistence, and retrieval.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Kind tag stored on every persisted record.
pub const FIELD_DOC_KIND: &str = "TypeField";

// ============ Schema model ============

/// The kind of a top-level schema definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Object,
    Interface,
    Input,
    Enum,
    Union,
    Scalar,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Object => "object",
            TypeKind::Interface => "interface",
            TypeKind::Input => "input",
            TypeKind::Enum => "enum",
            TypeKind::Union => "union",
            TypeKind::Scalar => "scalar",
        }
    }

    /// Kinds whose members are fields with a type signature.
    pub fn has_fields(&self) -> bool {
        matches!(self, TypeKind::Object | TypeKind::Interface | TypeKind::Input)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field or argument type: a chain of list / non-null wrappers around a
/// named type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(String),
    List(Box<TypeExpr>),
    NonNull(Box<TypeExpr>),
}

impl TypeExpr {
    /// Unwrap every list / non-null layer and return the innermost name.
    ///
    /// Returns `None` when the innermost name is empty, which only happens
    /// for malformed input.
    pub fn named(&self) -> Option<&str> {
        match self {
            TypeExpr::Named(name) if name.is_empty() => None,
            TypeExpr::Named(name) => Some(name),
            TypeExpr::List(inner) | TypeExpr::NonNull(inner) => inner.named(),
        }
    }
}

/// Renders GraphQL signature notation, e.g. `[Book!]!`.
impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::List(inner) => write!(f, "[{}]", inner),
            TypeExpr::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

/// An argument of a field.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDef {
    pub name: String,
    pub ty: TypeExpr,
    /// Default value rendered as a GraphQL literal.
    pub default: Option<String>,
    pub description: Option<String>,
}

/// A field of an object / interface type, or an input field of an input
/// object (in which case `arguments` is empty).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeExpr,
    pub arguments: Vec<ArgumentDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
}

/// A named top-level schema definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    pub kind: TypeKind,
    pub description: Option<String>,
    /// SDL text of the definition as printed by the parser.
    pub raw: String,
    pub interfaces: Vec<String>,
    /// Populated for object, interface, and input kinds.
    pub fields: Vec<FieldDef>,
    /// Populated for enums.
    pub enum_values: Vec<EnumValueDef>,
    /// Populated for unions.
    pub union_members: Vec<String>,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            raw: String::new(),
            interfaces: Vec::new(),
            fields: Vec::new(),
            enum_values: Vec::new(),
            union_members: Vec::new(),
        }
    }
}

/// Name → [`TypeDefinition`] lookup that preserves schema order.
///
/// Built once and then only read; consumers receive it by reference.
/// When two definitions share a name, the first one inserted is kept.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: Vec<TypeDefinition>,
    by_name: HashMap<String, usize>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition. Returns `false` (and drops `def`) if a
    /// definition with the same name is already registered.
    pub fn insert(&mut self, def: TypeDefinition) -> bool {
        if self.by_name.contains_key(&def.name) {
            return false;
        }
        self.by_name.insert(def.name.clone(), self.types.len());
        self.types.push(def);
        true
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    /// Definitions in schema order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// ============ Document model ============

/// A field argument as stored in [`FieldMetadata::field_args`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentMeta {
    pub name: String,
    /// Signature with wrappers, e.g. `String!`. Serialized as `"type"`.
    #[serde(rename = "type")]
    pub ty: String,
    /// Default value as a GraphQL literal, e.g. `FICTION` or `10`.
    pub default: Option<String>,
    pub description: Option<String>,
}

/// One value of a referenced enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValueMeta {
    pub name: String,
    pub description: Option<String>,
}

/// `name: type` of one field on a referenced object, interface, or input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubFieldSummary {
    pub name: String,
    /// Serialized as `"type"`.
    #[serde(rename = "type")]
    pub ty: String,
}

/// Digest of the type a field points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencedType {
    pub kind: TypeKind,
    pub description: Option<String>,
    /// Set only for enums.
    #[serde(
        rename = "enumValues",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub enum_values: Option<Vec<EnumValueMeta>>,
    /// Set for object, interface, and input kinds; at most 50 entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields_summary: Option<Vec<SubFieldSummary>>,
    /// Set only for unions.
    #[serde(
        rename = "unionMembers",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub union_members: Option<Vec<String>>,
}

/// Everything known about a type→field pair except its flattened text.
///
/// Structured sub-payloads are deserialized leniently: a corrupt
/// `type_kind`, `field_args`, or `referenced` value reads back as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMetadata {
    /// Name of the type that owns the field.
    pub type_name: String,
    /// Kind of the owning type: object, interface, or input.
    #[serde(deserialize_with = "lenient")]
    pub type_kind: Option<TypeKind>,
    pub type_description: Option<String>,
    /// Interfaces the owning type implements, in declaration order.
    pub type_interfaces: Vec<String>,
    pub field_name: String,
    /// Signature with wrapper notation preserved, e.g. `[Book!]!`.
    pub field_type: String,
    pub field_description: Option<String>,
    /// Empty for input fields.
    #[serde(deserialize_with = "lenient_or_default")]
    pub field_args: Vec<ArgumentMeta>,
    /// Innermost named type of `field_type`. The traversal follows this
    /// to the records whose `type_name` matches it.
    pub referenced_type: Option<String>,
    /// Digest of `referenced_type` when it is defined in the schema.
    #[serde(deserialize_with = "lenient")]
    pub referenced: Option<ReferencedType>,
    /// SDL of the owning type, clipped to 4000 characters.
    pub sdl_snippet: String,
}

/// One embeddable document per type→field pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDoc {
    /// `"{Type}->{field}"`, unique within a schema.
    pub id: String,
    /// `"{Type}.{field}"`.
    pub name: String,
    pub kind: String,
    pub metadata: FieldMetadata,
    /// The text sent to the embedding provider.
    pub text: String,
}

/// A persisted index line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Same as [`FieldDoc::id`]; the resume key.
    pub id: String,
    pub name: String,
    /// Always [`FIELD_DOC_KIND`] for records written by this crate.
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub metadata: FieldMetadata,
    /// Raw provider vector, not normalized.
    pub embedding: Vec<f32>,
}

impl EmbeddingRecord {
    pub fn from_doc(doc: &FieldDoc, embedding: Vec<f32>) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.name.clone(),
            kind: doc.kind.clone(),
            metadata: doc.metadata.clone(),
            embedding,
        }
    }
}

/// A scored hit, borrowed from a loaded [`crate::index::VectorIndex`].
#[derive(Debug, Clone, Copy)]
pub struct QueryResult<'a> {
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub score: f32,
    pub record: &'a EmbeddingRecord,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(n: &str) -> TypeExpr {
        TypeExpr::Named(n.to_string())
    }

    #[test]
    fn test_signature_rendering() {
        let ty = TypeExpr::NonNull(Box::new(TypeExpr::List(Box::new(TypeExpr::NonNull(
            Box::new(named("Book")),
        )))));
        assert_eq!(ty.to_string(), "[Book!]!");
        assert_eq!(ty.named(), Some("Book"));
    }

    #[test]
    fn test_named_empty_is_unresolved() {
        let ty = TypeExpr::List(Box::new(named("")));
        assert_eq!(ty.named(), None);
    }

    #[test]
    fn test_registry_keeps_first_duplicate() {
        let mut reg = TypeRegistry::new();
        let mut first = TypeDefinition::new("Book", TypeKind::Object);
        first.description = Some("first".to_string());
        let second = TypeDefinition::new("Book", TypeKind::Interface);

        assert!(reg.insert(first));
        assert!(!reg.insert(second));
        assert_eq!(reg.len(), 1);
        let book = reg.get("Book").unwrap();
        assert_eq!(book.kind, TypeKind::Object);
        assert_eq!(book.description.as_deref(), Some("first"));
    }

    #[test]
    fn test_registry_preserves_order() {
        let mut reg = TypeRegistry::new();
        for name in ["Query", "Book", "Author"] {
            reg.insert(TypeDefinition::new(name, TypeKind::Object));
        }
        let names: Vec<&str> = reg.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Query", "Book", "Author"]);
    }

    #[test]
    fn test_corrupt_subpayloads_read_as_absent() {
        let line = r#"{
            "id": "Query->books",
            "name": "Query.books",
            "kind": "TypeField",
            "metadata": {
                "type_name": "Query",
                "type_kind": "object_type_definition",
                "field_name": "books",
                "field_type": "[Book]",
                "field_args": "not-a-list",
                "referenced": {"kind": 42}
            },
            "embedding": [0.1, 0.2]
        }"#;
        let rec: EmbeddingRecord = serde_json::from_str(line).unwrap();
        assert_eq!(rec.metadata.type_name, "Query");
        assert_eq!(rec.metadata.field_type, "[Book]");
        assert_eq!(rec.metadata.type_kind, None);
        assert!(rec.metadata.field_args.is_empty());
        assert!(rec.metadata.referenced.is_none());
    }

    #[test]
    fn test_document_payload_key_names() {
        let meta = FieldMetadata {
            type_name: "Query".to_string(),
            field_name: "books".to_string(),
            field_args: vec![ArgumentMeta {
                name: "genre".to_string(),
                ty: "Genre".to_string(),
                default: Some("FICTION".to_string()),
                description: None,
            }],
            referenced_type: Some("Genre".to_string()),
            referenced: Some(ReferencedType {
                kind: TypeKind::Enum,
                description: None,
                enum_values: Some(vec![EnumValueMeta {
                    name: "FICTION".to_string(),
                    description: None,
                }]),
                fields_summary: None,
                union_members: None,
            }),
            ..FieldMetadata::default()
        };
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["field_args"][0]["type"], "Genre");
        assert_eq!(value["referenced"]["kind"], "enum");
        assert_eq!(value["referenced"]["enumValues"][0]["name"], "FICTION");
        assert!(value["referenced"].get("fields_summary").is_none());
        assert!(value["referenced"].get("unionMembers").is_none());

        let back: FieldMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_corrupt_metadata_reads_as_default() {
        let line = r#"{"id":"A->b","name":"A.b","kind":"TypeField","metadata":"oops","embedding":[1.0]}"#;
        let rec: EmbeddingRecord = serde_json::from_str(line).unwrap();
        assert_eq!(rec.metadata, FieldMetadata::default());
        assert_eq!(rec.embedding, vec![1.0]);
    }
}
