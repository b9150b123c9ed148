//! # OBO Curation
//!
//! Tooling for the OBO ontology registry's metadata store: a directory of
//! Markdown documents, one per ontology, each opening with a YAML
//! front-matter block.
//!
//! The library reads and canonicalises the store, runs integrity checks
//! over it, aggregates GitHub contributors per ontology behind an on-disk
//! cache, and cross-references maintainers and contributors with Wikidata.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   store     │──▶│ contributors │──▶│   identity   │
//! │ YAML-in-MD  │   │  + cache     │   │  (Wikidata)  │
//! └──────┬──────┘   └──────┬───────┘   └──────┬───────┘
//!        │                 │                  │
//!        ▼                 ▼                  ▼
//!   ┌─────────┐      ┌──────────┐      ┌────────────────┐
//!   │ checks  │      │  GitHub  │      │ quickstatements│
//!   └─────────┘      └──────────┘      └────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! obo check                     # offline integrity checks
//! obo standardize               # canonicalise front matter
//! obo contributors              # aggregate GitHub contributors
//! obo discover                  # contributors missing from Wikidata
//! obo resolve maintainers       # QuickStatements for maintainers
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Library error taxonomy |
//! | [`models`] | Core data types |
//! | [`store`] | Metadata store reader and canonical formatter |
//! | [`cache`] | On-disk lookaside cache |
//! | [`github`] | Rate-limited GitHub client |
//! | [`sparql`] | Wikidata SPARQL client |
//! | [`contributors`] | Contributor aggregation pipeline |
//! | [`curation`] | Exclusion list and override table |
//! | [`identity`] | Forward resolution and discovery queries |
//! | [`quickstatements`] | Bulk-edit rows for Wikidata |
//! | [`checks`] | Offline and network integrity checks |
//! | [`prefixes`] | SHACL prefix declarations |
//! | [`status`] | Configuration health listing |
//! | [`progress`] | Progress reporting on stderr |
//! | [`commands`] | CLI command runners |

pub mod cache;
pub mod checks;
pub mod commands;
pub mod config;
pub mod contributors;
pub mod curation;
pub mod error;
pub mod github;
pub mod identity;
pub mod models;
pub mod prefixes;
pub mod progress;
pub mod quickstatements;
pub mod sparql;
pub mod status;
pub mod store;
