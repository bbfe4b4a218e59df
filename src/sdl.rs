//! GraphQL SDL adapter.
//!
//! Parsing itself is delegated to `graphql-parser`; this module walks the
//! resulting AST once and converts every named top-level type definition
//! into the crate's own [`TypeDefinition`] model, collected in a
//! [`TypeRegistry`].
//!
//! Schema definitions, directive definitions, and type extensions carry no
//! type→field pairs of their own and are skipped.

use graphql_parser::schema::{self as ast, Definition, Type, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{
    ArgumentDef, EnumValueDef, FieldDef, TypeDefinition, TypeExpr, TypeKind, TypeRegistry,
};

/// Parse SDL text and build the name → definition registry.
///
/// Duplicate type names are not valid GraphQL, but they are tolerated: the
/// first definition in document order wins and later ones are dropped with
/// a warning.
pub fn parse_schema(sdl: &str) -> Result<TypeRegistry> {
    let document =
        ast::parse_schema::<String>(sdl).map_err(|e| Error::SchemaParse(e.to_string()))?;

    let mut registry = TypeRegistry::new();
    for definition in &document.definitions {
        match definition {
            Definition::TypeDefinition(type_def) => {
                let def = convert_type(type_def);
                let name = def.name.clone();
                if !registry.insert(def) {
                    warn!(type_name = %name, "duplicate type definition ignored");
                }
            }
            Definition::SchemaDefinition(_)
            | Definition::DirectiveDefinition(_)
            | Definition::TypeExtension(_) => {
                debug!("skipping non-type definition");
            }
        }
    }

    debug!(types = registry.len(), "parsed schema");
    Ok(registry)
}

fn convert_type(type_def: &ast::TypeDefinition<'_, String>) -> TypeDefinition {
    use ast::TypeDefinition as T;

    let (name, kind, description) = match type_def {
        T::Scalar(t) => (&t.name, TypeKind::Scalar, &t.description),
        T::Object(t) => (&t.name, TypeKind::Object, &t.description),
        T::Interface(t) => (&t.name, TypeKind::Interface, &t.description),
        T::Union(t) => (&t.name, TypeKind::Union, &t.description),
        T::Enum(t) => (&t.name, TypeKind::Enum, &t.description),
        T::InputObject(t) => (&t.name, TypeKind::Input, &t.description),
    };

    let mut def = TypeDefinition::new(name.clone(), kind);
    def.description = description.clone();
    def.raw = type_def.to_string();

    match type_def {
        T::Scalar(_) => {}
        T::Object(t) => {
            def.interfaces = t.implements_interfaces.clone();
            def.fields = t.fields.iter().map(convert_field).collect();
        }
        T::Interface(t) => {
            def.interfaces = t.implements_interfaces.clone();
            def.fields = t.fields.iter().map(convert_field).collect();
        }
        T::Union(t) => {
            def.union_members = t.types.clone();
        }
        T::Enum(t) => {
            def.enum_values = t
                .values
                .iter()
                .map(|v| EnumValueDef {
                    name: v.name.clone(),
                    description: v.description.clone(),
                })
                .collect();
        }
        T::InputObject(t) => {
            def.fields = t
                .fields
                .iter()
                .map(|input| FieldDef {
                    name: input.name.clone(),
                    description: input.description.clone(),
                    ty: convert_type_expr(&input.value_type),
                    arguments: Vec::new(),
                })
                .collect();
        }
    }

    def
}

fn convert_field(field: &ast::Field<'_, String>) -> FieldDef {
    FieldDef {
        name: field.name.clone(),
        description: field.description.clone(),
        ty: convert_type_expr(&field.field_type),
        arguments: field.arguments.iter().map(convert_argument).collect(),
    }
}

fn convert_argument(arg: &ast::InputValue<'_, String>) -> ArgumentDef {
    ArgumentDef {
        name: arg.name.clone(),
        ty: convert_type_expr(&arg.value_type),
        default: arg.default_value.as_ref().map(render_value),
        description: arg.description.clone(),
    }
}

fn convert_type_expr(ty: &Type<'_, String>) -> TypeExpr {
    match ty {
        Type::NamedType(name) => TypeExpr::Named(name.clone()),
        Type::ListType(inner) => TypeExpr::List(Box::new(convert_type_expr(inner))),
        Type::NonNullType(inner) => TypeExpr::NonNull(Box::new(convert_type_expr(inner))),
    }
}

/// Render a default value as a GraphQL literal.
fn render_value(value: &Value<'_, String>) -> String {
    match value {
        Value::Variable(name) => format!("${}", name),
        Value::Int(n) => n
            .as_i64()
            .map(|i| i.to_string())
            .unwrap_or_else(|| "0".to_string()),
        Value::Float(f) => f.to_string(),
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        Value::Boolean(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Enum(name) => name.clone(),
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(fields) => {
            let parts: Vec<String> = fields
                .iter()
                .map(|(k, v)| format!("{}: {}", k, render_value(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"
"""A shelf of books"""
type Query {
  "All books, optionally filtered"
  books(genre: Genre = FICTION, limit: Int = 10, title: String = "x"): [Book!]!
  search(term: String!): [SearchResult]
}

interface Node {
  id: ID!
}

type Book implements Node {
  id: ID!
  title: String
  author: Author
}

type Author {
  name: String!
}

enum Genre {
  "Made up"
  FICTION
  HISTORY
}

union SearchResult = Book | Author

input BookFilter {
  genre: Genre
  tags: [String!]
}

scalar Date
"#;

    #[test]
    fn test_parse_registry_order_and_kinds() {
        let reg = parse_schema(LIBRARY).unwrap();
        let kinds: Vec<(&str, TypeKind)> = reg.iter().map(|t| (t.name.as_str(), t.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("Query", TypeKind::Object),
                ("Node", TypeKind::Interface),
                ("Book", TypeKind::Object),
                ("Author", TypeKind::Object),
                ("Genre", TypeKind::Enum),
                ("SearchResult", TypeKind::Union),
                ("BookFilter", TypeKind::Input),
                ("Date", TypeKind::Scalar),
            ]
        );
    }

    #[test]
    fn test_parse_field_details() {
        let reg = parse_schema(LIBRARY).unwrap();
        let query = reg.get("Query").unwrap();
        assert_eq!(query.description.as_deref(), Some("A shelf of books"));

        let books = &query.fields[0];
        assert_eq!(books.name, "books");
        assert_eq!(books.ty.to_string(), "[Book!]!");
        assert_eq!(books.ty.named(), Some("Book"));
        assert_eq!(
            books.description.as_deref(),
            Some("All books, optionally filtered")
        );

        let defaults: Vec<Option<&str>> =
            books.arguments.iter().map(|a| a.default.as_deref()).collect();
        assert_eq!(defaults, vec![Some("FICTION"), Some("10"), Some("\"x\"")]);
    }

    #[test]
    fn test_parse_kind_specific_bodies() {
        let reg = parse_schema(LIBRARY).unwrap();
        assert_eq!(reg.get("Book").unwrap().interfaces, vec!["Node"]);
        assert_eq!(
            reg.get("SearchResult").unwrap().union_members,
            vec!["Book", "Author"]
        );
        let genre = reg.get("Genre").unwrap();
        assert_eq!(genre.enum_values.len(), 2);
        assert_eq!(genre.enum_values[0].description.as_deref(), Some("Made up"));

        let filter = reg.get("BookFilter").unwrap();
        assert_eq!(filter.fields[1].ty.to_string(), "[String!]");
        assert!(filter.fields.iter().all(|f| f.arguments.is_empty()));
        assert!(reg.get("Author").unwrap().raw.contains("type Author"));
    }

    #[test]
    fn test_duplicate_type_names_keep_first() {
        let sdl = "type A { x: Int }\ntype A { y: String }\n";
        let reg = parse_schema(sdl).unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("A").unwrap().fields[0].name, "x");
    }

    #[test]
    fn test_parse_error() {
        let err = parse_schema("type {").unwrap_err();
        assert!(matches!(err, Error::SchemaParse(_)));
    }
}
