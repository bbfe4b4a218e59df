//! Type-graph re-ranking of raw similarity results.
//!
//! Raw top-K similarity mixes unrelated schema branches. A question usually
//! maps to a connected path through the schema (`Query.books` →
//! `Book.title`), so this module re-selects results that are connected
//! through type references.
//!
//! A result A is a *child* of result B when A's owning type name equals
//! B's field type with list / non-null markers stripped (`[Book!]!` →
//! `Book`). The adjacency is never materialized as a graph; children are
//! looked up through an owning-type → result-indices map.
//!
//! # Modes
//!
//! | Mode | Behavior |
//! |------|----------|
//! | [`ConstraintMode::Traversal`] | depth-first, score-greedy expansion from successive roots |
//! | [`ConstraintMode::RootSibling`] | top result plus results owned by its field type |
//! | [`ConstraintMode::Raw`] | similarity order, truncated |

use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use crate::models::QueryResult;

/// How raw similarity results are constrained before reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintMode {
    #[default]
    Traversal,
    RootSibling,
    Raw,
}

impl FromStr for ConstraintMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "traversal" => Ok(ConstraintMode::Traversal),
            "root-sibling" => Ok(ConstraintMode::RootSibling),
            "raw" => Ok(ConstraintMode::Raw),
            other => Err(format!(
                "unknown constraint mode: {}. Use traversal, root-sibling, or raw.",
                other
            )),
        }
    }
}

impl fmt::Display for ConstraintMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstraintMode::Traversal => "traversal",
            ConstraintMode::RootSibling => "root-sibling",
            ConstraintMode::Raw => "raw",
        })
    }
}

/// Apply `mode` to score-sorted `results`, returning at most `k`.
pub fn constrain<'a>(
    results: &[QueryResult<'a>],
    k: usize,
    mode: ConstraintMode,
) -> Vec<QueryResult<'a>> {
    match mode {
        ConstraintMode::Traversal => expand_by_traversal(results, k),
        ConstraintMode::RootSibling => filter_root_siblings(results, k),
        ConstraintMode::Raw => results.iter().take(k).copied().collect(),
    }
}

/// Remove list and non-null markers from a field signature.
pub fn strip_wrappers(signature: &str) -> String {
    signature
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '!'))
        .collect()
}

/// Order indices by score descending, ties by input position.
fn sort_by_score(indices: &mut [usize], results: &[QueryResult<'_>]) {
    indices.sort_by(|&a, &b| {
        results[b]
            .score
            .total_cmp(&results[a].score)
            .then(a.cmp(&b))
    });
}

/// Select up to `k` results by depth-first, score-greedy type expansion.
///
/// Repeatedly takes the best unused result as a root, emits it, then
/// pushes its unused children (best first) onto the front of the queue so
/// the strongest branch is followed to the end before its siblings. When a
/// cluster is exhausted the next-best unused result starts a new one. The
/// returned order is the final ranking and is not re-sorted by score.
pub fn expand_by_traversal<'a>(results: &[QueryResult<'a>], k: usize) -> Vec<QueryResult<'a>> {
    if results.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut by_owner: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, r) in results.iter().enumerate() {
        by_owner
            .entry(r.record.metadata.type_name.as_str())
            .or_default()
            .push(i);
    }

    let mut roots: Vec<usize> = (0..results.len()).collect();
    sort_by_score(&mut roots, results);

    let mut used = vec![false; results.len()];
    let mut queued = vec![false; results.len()];
    let mut output: Vec<QueryResult<'a>> = Vec::with_capacity(k.min(results.len()));

    for &root in &roots {
        if output.len() >= k {
            break;
        }
        if used[root] {
            continue;
        }

        let mut queue: VecDeque<usize> = VecDeque::from([root]);
        queued[root] = true;

        while let Some(idx) = queue.pop_front() {
            queued[idx] = false;
            if used[idx] {
                continue;
            }
            used[idx] = true;
            output.push(results[idx]);
            if output.len() >= k {
                break;
            }

            let target = strip_wrappers(&results[idx].record.metadata.field_type);
            let mut children: Vec<usize> = by_owner
                .get(target.as_str())
                .map(|idxs| {
                    idxs.iter()
                        .copied()
                        .filter(|&j| !used[j] && !queued[j])
                        .collect()
                })
                .unwrap_or_default();
            sort_by_score(&mut children, results);

            for &child in children.iter().rev() {
                queued[child] = true;
                queue.push_front(child);
            }
        }

        for idx in queue {
            queued[idx] = false;
        }
    }

    output.truncate(k);
    output
}

/// Keep the top result and only those results owned by its field type.
pub fn filter_root_siblings<'a>(results: &[QueryResult<'a>], k: usize) -> Vec<QueryResult<'a>> {
    let Some(root) = results.first() else {
        return Vec::new();
    };
    if k == 0 {
        return Vec::new();
    }

    let target = strip_wrappers(&root.record.metadata.field_type);
    std::iter::once(*root)
        .chain(
            results[1..]
                .iter()
                .filter(|r| r.record.metadata.type_name == target)
                .copied(),
        )
        .take(k)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmbeddingRecord, FieldMetadata};
    use std::collections::HashSet;

    fn record(type_name: &str, field: &str, field_type: &str) -> EmbeddingRecord {
        EmbeddingRecord {
            id: format!("{}->{}", type_name, field),
            name: format!("{}.{}", type_name, field),
            kind: "TypeField".to_string(),
            metadata: FieldMetadata {
                type_name: type_name.to_string(),
                field_name: field.to_string(),
                field_type: field_type.to_string(),
                ..FieldMetadata::default()
            },
            embedding: vec![1.0],
        }
    }

    fn scored<'a>(records: &'a [EmbeddingRecord], scores: &[f32]) -> Vec<QueryResult<'a>> {
        records
            .iter()
            .zip(scores.iter())
            .map(|(record, &score)| QueryResult { score, record })
            .collect()
    }

    fn ids(results: &[QueryResult<'_>]) -> Vec<String> {
        results.iter().map(|r| r.record.id.clone()).collect()
    }

    fn bookstore() -> Vec<EmbeddingRecord> {
        vec![
            record("Store", "name", "String"),
            record("Query", "books", "[Book]"),
            record("Book", "title", "String"),
            record("Book", "author", "Author"),
        ]
    }

    const BOOKSTORE_SCORES: [f32; 4] = [0.95, 0.90, 0.80, 0.75];

    #[test]
    fn test_strip_wrappers() {
        assert_eq!(strip_wrappers("[Book!]!"), "Book");
        assert_eq!(strip_wrappers("String"), "String");
        assert_eq!(strip_wrappers("[[Int!]]"), "Int");
    }

    #[test]
    fn test_traversal_bookstore_k3() {
        let records = bookstore();
        let results = scored(&records, &BOOKSTORE_SCORES);
        let out = expand_by_traversal(&results, 3);
        assert_eq!(ids(&out), vec!["Store->name", "Query->books", "Book->title"]);
    }

    #[test]
    fn test_root_sibling_bookstore_k3() {
        let records = bookstore();
        let results = scored(&records, &BOOKSTORE_SCORES);
        let out = filter_root_siblings(&results, 3);
        assert_eq!(ids(&out), vec!["Store->name"]);
    }

    #[test]
    fn test_root_sibling_keeps_children_of_root() {
        let records = vec![
            record("Query", "books", "[Book!]!"),
            record("Store", "name", "String"),
            record("Book", "title", "String"),
            record("Book", "isbn", "ID"),
        ];
        let results = scored(&records, &[0.9, 0.8, 0.7, 0.6]);
        let out = filter_root_siblings(&results, 10);
        assert_eq!(ids(&out), vec!["Query->books", "Book->title", "Book->isbn"]);
        assert_eq!(ids(&filter_root_siblings(&results, 2)), vec!["Query->books", "Book->title"]);
    }

    #[test]
    fn test_traversal_follows_deep_branch_first() {
        // Query.books -> Book.author -> Author.name should be finished
        // before the lower-scoring sibling Book.title.
        let records = vec![
            record("Query", "books", "[Book!]!"),
            record("Book", "author", "Author"),
            record("Book", "title", "String"),
            record("Author", "name", "String"),
            record("Misc", "flag", "Boolean"),
        ];
        let results = scored(&records, &[0.9, 0.7, 0.6, 0.3, 0.8]);
        let out = expand_by_traversal(&results, 10);
        assert_eq!(
            ids(&out),
            vec![
                "Query->books",
                "Book->author",
                "Author->name",
                "Book->title",
                "Misc->flag",
            ]
        );
    }

    #[test]
    fn test_traversal_is_permutation_when_k_covers_all() {
        let records = vec![
            record("Query", "books", "[Book]"),
            record("Book", "related", "[Book]"),
            record("Book", "title", "String"),
            record("Author", "books", "[Book]"),
            record("Store", "name", "String"),
            record("Query", "authors", "[Author]"),
        ];
        let results = scored(&records, &[0.5, 0.9, 0.4, 0.3, 0.6, 0.2]);
        let out = expand_by_traversal(&results, 100);
        assert_eq!(out.len(), records.len());
        let unique: HashSet<String> = ids(&out).into_iter().collect();
        assert_eq!(unique.len(), records.len());
    }

    #[test]
    fn test_traversal_self_reference_terminates() {
        let records = vec![
            record("Book", "related", "[Book]"),
            record("Book", "sequel", "Book"),
        ];
        let results = scored(&records, &[0.9, 0.8]);
        let out = expand_by_traversal(&results, 5);
        assert_eq!(ids(&out), vec!["Book->related", "Book->sequel"]);
    }

    #[test]
    fn test_traversal_is_deterministic() {
        let records = bookstore();
        let results = scored(&records, &BOOKSTORE_SCORES);
        let first = ids(&expand_by_traversal(&results, 4));
        for _ in 0..10 {
            assert_eq!(ids(&expand_by_traversal(&results, 4)), first);
        }
    }

    #[test]
    fn test_traversal_ties_use_input_order() {
        let records = vec![
            record("Query", "books", "[Book]"),
            record("Book", "b", "String"),
            record("Book", "a", "String"),
        ];
        let results = scored(&records, &[0.9, 0.5, 0.5]);
        let out = expand_by_traversal(&results, 3);
        assert_eq!(ids(&out), vec!["Query->books", "Book->b", "Book->a"]);
    }

    #[test]
    fn test_empty_and_zero_k() {
        assert!(expand_by_traversal(&[], 3).is_empty());
        assert!(filter_root_siblings(&[], 3).is_empty());
        let records = bookstore();
        let results = scored(&records, &BOOKSTORE_SCORES);
        assert!(expand_by_traversal(&results, 0).is_empty());
        assert!(constrain(&results, 0, ConstraintMode::Raw).is_empty());
    }

    #[test]
    fn test_raw_mode_truncates() {
        let records = bookstore();
        let results = scored(&records, &BOOKSTORE_SCORES);
        let out = constrain(&results, 2, ConstraintMode::Raw);
        assert_eq!(ids(&out), vec!["Store->name", "Query->books"]);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("traversal".parse::<ConstraintMode>(), Ok(ConstraintMode::Traversal));
        assert_eq!(
            "root-sibling".parse::<ConstraintMode>(),
            Ok(ConstraintMode::RootSibling)
        );
        assert!("bfs".parse::<ConstraintMode>().is_err());
        assert_eq!(ConstraintMode::RootSibling.to_string(), "root-sibling");
    }
}
