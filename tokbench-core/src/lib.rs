#![warn(missing_docs)]
//! Tokbench Core - Sample Model and Input Parsing
//!
//! This crate provides the typed inputs the comparison pipeline runs on:
//! - `RunSample`/`FeatureSample` parsed from one engine invocation's output
//! - Dataset rows (`category<TAB>text`) with auditing and provenance digest
//! - The shared error taxonomy for malformed collaborator input

mod dataset;
mod error;
mod parse;
mod sample;

pub use dataset::{
    audit_rows, dataset_digest, filter_rows, load_dataset_rows, parse_dataset, DatasetAudit,
    DatasetRow,
};
pub use error::CoreError;
pub use parse::parse_run_output;
pub use sample::{FeatureSample, RunSample};

/// Category assigned to dataset rows that do not carry one.
pub const DEFAULT_CATEGORY: &str = "default";
