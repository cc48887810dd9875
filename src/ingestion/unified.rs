//! Unified ingestion entrypoint.
//!
//! Most callers should use [`review_file`], which turns a [`SelectedFile`] into a
//! [`ValidationReport`] using a provided [`FieldSchema`]:
//!
//! - the file must look like CSV (`.csv` extension or a CSV MIME hint)
//! - it is parsed with [`ImportOptions::primary_delimiter`], falling back once to
//!   [`ImportOptions::fallback_delimiter`]
//! - rows are validated against the schema
//! - if an [`ImportObserver`] is configured, success/failure/alerts are reported to it

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ImportError, ImportResult};
use crate::types::{FieldSchema, ImportRecord, RawTable};
use crate::validation::{ValidationReport, validate_rows};

use super::csv::ingest_csv_from_bytes;
use super::observability::{ImportContext, ImportObserver, ImportSeverity, ImportStats};

const CSV_MIME_TYPES: &[&str] = &["text/csv", "application/csv", "application/vnd.ms-excel"];

/// A file handed over by the file picker.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// File name as chosen by the user (used for the extension check and in messages).
    pub name: String,
    /// MIME hint from the picker, if any.
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Whether the name or MIME hint identifies a CSV file.
    pub fn looks_like_csv(&self) -> bool {
        let by_extension = Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        let by_mime = self
            .mime
            .as_deref()
            .is_some_and(|m| CSV_MIME_TYPES.iter().any(|t| m.eq_ignore_ascii_case(t)));
        by_extension || by_mime
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Options controlling ingestion.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ImportOptions {
    /// Delimiter tried first.
    pub primary_delimiter: u8,
    /// Delimiter tried once after a structural failure. Ignored when equal to the primary.
    pub fallback_delimiter: Option<u8>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn ImportObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: ImportSeverity,
}

impl fmt::Debug for ImportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportOptions")
            .field("primary_delimiter", &char::from(self.primary_delimiter))
            .field("fallback_delimiter", &self.fallback_delimiter.map(char::from))
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            primary_delimiter: b',',
            fallback_delimiter: Some(b';'),
            observer: None,
            alert_at_or_above: ImportSeverity::Critical,
        }
    }
}

/// Parse a selected file into raw rows (format gate + delimiter fallback + header check).
///
/// Does not notify the observer; see [`review_file`].
pub fn ingest_file(file: &SelectedFile, schema: &FieldSchema, options: &ImportOptions) -> ImportResult<RawTable> {
    if !file.looks_like_csv() {
        return Err(ImportError::UnsupportedFormat {
            name: file.name.clone(),
        });
    }
    ingest_csv_from_bytes(
        &file.bytes,
        schema,
        options.primary_delimiter,
        options.fallback_delimiter,
    )
}

/// Parse and validate a selected file.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` with row/valid/invalid counts
/// - `on_failure` on a file-level failure, with a computed severity
/// - `on_alert` when that severity is >= `options.alert_at_or_above`
pub fn review_file<T: ImportRecord>(
    file: &SelectedFile,
    schema: &FieldSchema,
    options: &ImportOptions,
) -> ImportResult<ValidationReport<T>> {
    let ctx = ImportContext {
        file_name: file.name.clone(),
    };
    let result = ingest_file(file, schema, options).map(|table| {
        let report = validate_rows::<T>(&table.rows, schema);
        let stats = ImportStats {
            rows: table.row_count(),
            valid: report.valid_count(),
            invalid: report.error_count(),
            used_fallback: table.used_fallback(),
        };
        (report, stats)
    });

    match result {
        Ok((report, stats)) => {
            if let Some(obs) = options.observer.as_ref() {
                obs.on_success(&ctx, stats);
            }
            Ok(report)
        }
        Err(e) => {
            notify_failure(options, &ctx, &e);
            Err(e)
        }
    }
}

/// Read a file from disk and parse it as [`ingest_file`] does.
///
/// I/O failures are reported to the observer as [`ImportSeverity::Critical`].
pub fn ingest_from_path(
    path: impl AsRef<Path>,
    schema: &FieldSchema,
    options: &ImportOptions,
) -> ImportResult<RawTable> {
    let path = path.as_ref();
    let ctx = ImportContext {
        file_name: path.display().to_string(),
    };
    let result = std::fs::read(path)
        .map_err(ImportError::from)
        .and_then(|bytes| ingest_file(&SelectedFile::new(path.display().to_string(), bytes), schema, options));

    if let Err(e) = &result {
        notify_failure(options, &ctx, e);
    }
    result
}

fn notify_failure(options: &ImportOptions, ctx: &ImportContext, e: &ImportError) {
    if let Some(obs) = options.observer.as_ref() {
        let sev = ImportSeverity::for_error(e);
        obs.on_failure(ctx, sev, e);
        if sev >= options.alert_at_or_above {
            obs.on_alert(ctx, sev, e);
        }
    }
}
