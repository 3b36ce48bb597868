//! Annocheck core library.
//!
//! This crate validates the annotation contracts of the LDLib sync and
//! configurator framework over source-tree snapshots, and describes (but
//! does not itself apply) the fixes for what it finds.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `engine`: Validation orchestrator and the parallel file runner.
//! - `rules`: One module per annotation kind, dispatched through `RuleKind`.
//! - `dependency`: Annotation dependency registry and checker.
//! - `type_check`: Field-shape requirements of configurator annotations.
//! - `lang`: Translation-key lookup and language file fixes.
//! - `usage`: Companion reverse lookup and navigation markers.
//! - `fix`: Fix appliers over owned snapshots and language files.
//! - `types`, `hierarchy`, `compat`: Java type model and compatibility predicates.
//! - `models`: Snapshot descriptors, diagnostics and result structs.
//! - `output`: Human/JSON printers.
pub mod annotations;
pub mod cli;
pub mod compat;
pub mod config;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod fix;
pub mod hierarchy;
pub mod lang;
pub mod models;
pub mod output;
pub mod rules;
pub mod type_check;
pub mod types;
pub mod usage;

pub use error::{Error, Result};
