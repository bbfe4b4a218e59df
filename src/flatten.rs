//! Schema flattening: one embeddable [`FieldDoc`] per type→field pair.
//!
//! Object and interface types yield one document per field; input objects
//! yield one per input field (no arguments). Enums, unions, and scalars
//! never get documents of their own; they only show up as the referenced
//! type digest inside other documents.
//!
//! # Text layout
//!
//! The flattened text is the sole embedding input and is rendered with a
//! fixed line order so identical schemas produce byte-identical text:
//!
//! ```text
//! Query -> books
//! Type description: ...          (if any)
//! Implements: Node, Entity       (if any)
//! Field: books: [Book!]!
//! Field description: ...         (if any)
//! Args: genre: Genre = FICTION   (if any)
//! Referenced type: Book          (if resolvable)
//! Referenced description: ...
//! Enum values: ... | Referenced fields: ... | Union members: ...
//! SDL snippet:
//! type Query { ... }             (truncated to 4000 chars)
//! ```

use crate::models::{
    ArgumentMeta, EnumValueMeta, FieldDef, FieldDoc, FieldMetadata, ReferencedType,
    SubFieldSummary, TypeDefinition, TypeKind, TypeRegistry, FIELD_DOC_KIND,
};

/// Cap on sub-fields kept in a referenced-type digest.
pub const MAX_SUBFIELDS: usize = 50;
/// Sub-fields of the digest actually rendered into the text.
pub const MAX_SUBFIELDS_IN_TEXT: usize = 20;
/// Cap, in characters, on the owning type's SDL excerpt.
pub const MAX_SDL_SNIPPET_CHARS: usize = 4000;

/// Flatten every object, interface, and input type in `registry` into
/// documents, in schema order then field order.
pub fn flatten_schema(registry: &TypeRegistry) -> Vec<FieldDoc> {
    registry
        .iter()
        .filter(|def| def.kind.has_fields())
        .flat_map(|def| {
            def.fields
                .iter()
                .map(move |field| build_field_doc(def, field, registry))
        })
        .collect()
}

/// Build the document for one field of `owner`.
pub fn build_field_doc(
    owner: &TypeDefinition,
    field: &FieldDef,
    registry: &TypeRegistry,
) -> FieldDoc {
    let referenced_type = field.ty.named().map(str::to_string);
    let referenced = referenced_type
        .as_deref()
        .and_then(|name| registry.get(name))
        .map(summarize_type);

    let field_args = if owner.kind == TypeKind::Input {
        Vec::new()
    } else {
        field
            .arguments
            .iter()
            .map(|a| ArgumentMeta {
                name: a.name.clone(),
                ty: a.ty.to_string(),
                default: a.default.clone(),
                description: a.description.clone(),
            })
            .collect()
    };

    let metadata = FieldMetadata {
        type_name: owner.name.clone(),
        type_kind: Some(owner.kind),
        type_description: owner.description.clone(),
        type_interfaces: owner.interfaces.clone(),
        field_name: field.name.clone(),
        field_type: field.ty.to_string(),
        field_description: field.description.clone(),
        field_args,
        referenced_type,
        referenced,
        sdl_snippet: truncate_chars(&owner.raw, MAX_SDL_SNIPPET_CHARS).to_string(),
    };

    let text = render_text(&metadata);

    FieldDoc {
        id: format!("{}->{}", owner.name, field.name),
        name: format!("{}.{}", owner.name, field.name),
        kind: FIELD_DOC_KIND.to_string(),
        metadata,
        text,
    }
}

/// Digest of a referenced type, by kind.
fn summarize_type(def: &TypeDefinition) -> ReferencedType {
    let mut summary = ReferencedType {
        kind: def.kind,
        description: def.description.clone(),
        enum_values: None,
        fields_summary: None,
        union_members: None,
    };

    match def.kind {
        TypeKind::Enum => {
            summary.enum_values = Some(
                def.enum_values
                    .iter()
                    .map(|v| EnumValueMeta {
                        name: v.name.clone(),
                        description: v.description.clone(),
                    })
                    .collect(),
            );
        }
        TypeKind::Object | TypeKind::Interface | TypeKind::Input => {
            summary.fields_summary = Some(
                def.fields
                    .iter()
                    .take(MAX_SUBFIELDS)
                    .map(|f| SubFieldSummary {
                        name: f.name.clone(),
                        ty: f.ty.to_string(),
                    })
                    .collect(),
            );
        }
        TypeKind::Union => {
            summary.union_members = Some(def.union_members.clone());
        }
        TypeKind::Scalar => {}
    }

    summary
}

/// Render the flattened text for a document's metadata.
pub fn render_text(meta: &FieldMetadata) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("{} -> {}", meta.type_name, meta.field_name));
    if let Some(desc) = non_empty(&meta.type_description) {
        lines.push(format!("Type description: {}", desc));
    }
    if !meta.type_interfaces.is_empty() {
        lines.push(format!("Implements: {}", meta.type_interfaces.join(", ")));
    }
    lines.push(format!("Field: {}: {}", meta.field_name, meta.field_type));
    if let Some(desc) = non_empty(&meta.field_description) {
        lines.push(format!("Field description: {}", desc));
    }
    if !meta.field_args.is_empty() {
        let args: Vec<String> = meta
            .field_args
            .iter()
            .map(|a| match &a.default {
                Some(default) => format!("{}: {} = {}", a.name, a.ty, default),
                None => format!("{}: {}", a.name, a.ty),
            })
            .collect();
        lines.push(format!("Args: {}", args.join(", ")));
    }

    if let Some(name) = &meta.referenced_type {
        lines.push(format!("Referenced type: {}", name));
        if let Some(referenced) = &meta.referenced {
            if let Some(desc) = non_empty(&referenced.description) {
                lines.push(format!("Referenced description: {}", desc));
            }
            if let Some(values) = &referenced.enum_values {
                let names: Vec<&str> = values.iter().map(|v| v.name.as_str()).collect();
                lines.push(format!("Enum values: {}", names.join(", ")));
            }
            if let Some(fields) = &referenced.fields_summary {
                let sample: Vec<String> = fields
                    .iter()
                    .take(MAX_SUBFIELDS_IN_TEXT)
                    .map(|f| format!("{}: {}", f.name, f.ty))
                    .collect();
                lines.push(format!("Referenced fields: {}", sample.join(", ")));
            }
            if let Some(members) = &referenced.union_members {
                lines.push(format!("Union members: {}", members.join(", ")));
            }
        }
    }

    if !meta.sdl_snippet.is_empty() {
        lines.push("SDL snippet:".to_string());
        lines.push(meta.sdl_snippet.clone());
    }

    lines.join("\n")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Truncate to at most `max` characters without splitting a code point.
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
