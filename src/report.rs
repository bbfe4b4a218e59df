//! Rendering of ranked results for the terminal and for scripts.
//!
//! | Function | Output |
//! |----------|--------|
//! | [`render_ranked`] | one block per result: header line, field description, SDL snippet |
//! | [`render_tree`] | results grouped by `->` id segments, indented two spaces per level |
//! | [`render_json`] | compact JSON array of `{rank, id, name, score, metadata}` |
//!
//! All functions take results in their final order and never re-sort.

use serde::Serialize;

use crate::error::Result;
use crate::flatten::truncate_chars;
use crate::models::{FieldMetadata, QueryResult};

fn or_unknown(s: &str) -> &str {
    if s.is_empty() {
        "?"
    } else {
        s
    }
}

/// Cut `s` to `max` characters, marking the cut with `...`.
fn clip(s: &str, max: usize) -> String {
    let cut = truncate_chars(s, max);
    if cut.len() < s.len() {
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

/// Render the ranked list.
///
/// ```text
/// --- Rank 1 | score=0.812345 | id=Query->books | type=Query | field=books | signature=[Book!]!
/// Field description: All books in the catalog
/// Snippet:
/// type Query { ... }
/// ```
pub fn render_ranked(results: &[QueryResult<'_>], snippet_chars: usize) -> String {
    let mut out = String::new();

    for (i, r) in results.iter().enumerate() {
        let meta = &r.record.metadata;
        out.push_str(&format!(
            "--- Rank {} | score={:.6} | id={} | type={} | field={} | signature={}\n",
            i + 1,
            r.score,
            r.record.id,
            or_unknown(&meta.type_name),
            or_unknown(&meta.field_name),
            or_unknown(&meta.field_type),
        ));

        if let Some(desc) = meta.field_description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!(
                "Field description: {}\n",
                clip(desc, snippet_chars)
            ));
        }

        if !meta.sdl_snippet.is_empty() {
            out.push_str("Snippet:\n");
            out.push_str(&clip(&meta.sdl_snippet, snippet_chars));
            out.push('\n');
        }

        out.push('\n');
    }

    out
}

// ============ Tree ============

#[derive(Default)]
struct TreeNode<'r> {
    children: Vec<(String, TreeNode<'r>)>,
    /// Set when a result's id ends at this node.
    hit: Option<(f32, &'r str)>,
}

impl<'r> TreeNode<'r> {
    fn child(&mut self, segment: &str) -> &mut TreeNode<'r> {
        let pos = match self.children.iter().position(|(s, _)| s == segment) {
            Some(pos) => pos,
            None => {
                self.children.push((segment.to_string(), TreeNode::default()));
                self.children.len() - 1
            }
        };
        &mut self.children[pos].1
    }

    fn write(&self, level: usize, out: &mut String) {
        for (segment, node) in &self.children {
            out.push_str(&"  ".repeat(level));
            out.push_str(segment);
            if let Some((score, signature)) = node.hit {
                out.push_str(&format!(
                    " [score={:.3}, signature={}]",
                    score,
                    or_unknown(signature)
                ));
            }
            out.push('\n');
            node.write(level + 1, out);
        }
    }
}

/// Render results as a tree keyed by `->`-separated id segments.
///
/// Sibling order is first-appearance order in `results`.
///
/// ```text
/// Query
///   books [score=0.812, signature=[Book!]!]
/// Book
///   title [score=0.640, signature=String]
/// ```
pub fn render_tree(results: &[QueryResult<'_>]) -> String {
    let mut root = TreeNode::default();

    for r in results {
        let mut node = &mut root;
        for segment in r.record.id.split("->") {
            node = node.child(segment);
        }
        node.hit = Some((r.score, r.record.metadata.field_type.as_str()));
    }

    let mut out = String::new();
    root.write(0, &mut out);
    out
}

// ============ JSON ============

#[derive(Serialize)]
struct JsonResult<'a> {
    rank: usize,
    id: &'a str,
    name: &'a str,
    score: f32,
    metadata: &'a FieldMetadata,
}

/// Render results as a compact JSON array.
pub fn render_json(results: &[QueryResult<'_>]) -> Result<String> {
    let rows: Vec<JsonResult<'_>> = results
        .iter()
        .enumerate()
        .map(|(i, r)| JsonResult {
            rank: i + 1,
            id: &r.record.id,
            name: &r.record.name,
            score: r.score,
            metadata: &r.record.metadata,
        })
        .collect();
    Ok(serde_json::to_string(&rows)?)
}
