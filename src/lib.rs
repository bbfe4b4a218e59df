//! # Schema Compass
//!
//! Natural-language retrieval over GraphQL schemas.
//!
//! Every type→field pair of a schema is flattened into a text document and
//! embedded. A question is embedded the same way, scored against the whole
//! index, and the ranking is then constrained to results that are connected
//! through type references, so the answer reads as a path through the
//! schema rather than a bag of unrelated fields.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐
//! │   SDL    │──▶│  Flatten  │──▶│  Indexer  │──▶│  JSONL   │
//! │  parser  │   │ FieldDocs │   │ (batched) │   │  index   │
//! └──────────┘   └───────────┘   └───────────┘   └────┬─────┘
//!                                                     │
//!                ┌──────────┐   ┌───────────┐   ┌────▼─────┐
//!                │  Report  │◀──│  Expand   │◀──│  Vector  │
//!                │ list/tree│   │ type graph│   │  index   │
//!                └──────────┘   └───────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! compass flatten schema.graphql          # dry run: count documents
//! compass index schema.graphql            # embed and append to the index
//! compass query "which books did an author write?" -k 5
//! compass stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Library error type |
//! | [`models`] | Schema model and document types |
//! | [`sdl`] | GraphQL SDL → [`models::TypeRegistry`] |
//! | [`flatten`] | One embeddable document per type→field pair |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | JSONL persistence |
//! | [`indexer`] | Batched embedding into the index |
//! | [`index`] | In-memory cosine top-K |
//! | [`expand`] | Type-graph constraint of ranked results |
//! | [`report`] | Ranked list, tree, and JSON output |
//! | [`index_cmd`] | `flatten` and `index` commands |
//! | [`query_cmd`] | `query` command |
//! | [`stats`] | `stats` command |

pub mod config;
pub mod embedding;
pub mod error;
pub mod expand;
pub mod flatten;
pub mod index;
pub mod index_cmd;
pub mod indexer;
pub mod models;
pub mod query_cmd;
pub mod report;
pub mod sdl;
pub mod stats;
pub mod store;
