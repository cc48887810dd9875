//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`review_file`] (from [`unified`]) which:
//!
//! - checks the selected file is CSV
//! - parses it with one delimiter fallback and checks required headers
//! - validates every row against the schema
//! - optionally reports success/failure/alerts to an [`ImportObserver`]
//!
//! The delimited-text parser itself lives in [`csv`].

pub mod csv;
pub mod observability;
pub mod unified;

pub use observability::{
    CompositeObserver, ImportContext, ImportObserver, ImportSeverity, ImportStats, TracingObserver,
};
pub use unified::{ImportOptions, SelectedFile, ingest_file, ingest_from_path, review_file};
