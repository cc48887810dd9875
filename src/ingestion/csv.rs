//! Delimited-text ingestion with a single delimiter fallback.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ImportError, ImportResult};
use crate::types::{FieldSchema, RawRow, RawTable};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Parse `bytes` into header-keyed rows and check the header against `schema`.
///
/// Rules:
///
/// - The first non-blank line is the header. Header names are trimmed and lowercased.
/// - Blank (or whitespace-only) lines are skipped.
/// - A data row with fewer fields than the header is padded with empty values.
/// - On a structural failure with `primary`, parsing is retried once with `fallback` (if any and
///   different). A second failure is terminal. When the fallback only fails because the header
///   does not split under it, the primary attempt's error is reported.
/// - Zero data rows is a valid, empty result; the header is not checked in that case.
/// - Otherwise every required schema field must be present under its name or an alias.
///
/// Values are returned untrimmed.
pub fn ingest_csv_from_bytes(
    bytes: &[u8],
    schema: &FieldSchema,
    primary: u8,
    fallback: Option<u8>,
) -> ImportResult<RawTable> {
    if bytes.is_empty() {
        return Err(ImportError::EmptyFile);
    }
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let alternate = fallback.filter(|&fb| fb != primary);
    let table = match parse_with_delimiter(bytes, primary, alternate) {
        Ok((headers, rows)) => build_table(headers, rows, primary, 1),
        Err(first) => {
            let Some(fb) = alternate else {
                return Err(structural(primary, 1, first.to_string()));
            };
            debug!(
                primary = %char::from(primary),
                fallback = %char::from(fb),
                message = %first,
                "structural parse failure, retrying with fallback delimiter"
            );
            match parse_with_delimiter(bytes, fb, Some(primary)) {
                Ok((headers, rows)) => build_table(headers, rows, fb, 2),
                // The header only splits under the primary delimiter, so its error is the real one.
                Err(ParseFailure::HeaderCollapsed(_)) => {
                    return Err(structural(primary, 2, first.to_string()));
                }
                Err(second) => return Err(structural(fb, 2, second.to_string())),
            }
        }
    };

    if table.rows.is_empty() {
        return Ok(table);
    }

    let missing = schema.missing_columns(&table.headers);
    if !missing.is_empty() {
        return Err(ImportError::MissingHeaders { missing });
    }
    Ok(table)
}

fn structural(delimiter: u8, attempts: usize, message: String) -> ImportError {
    ImportError::StructuralParse {
        delimiter: char::from(delimiter),
        attempts,
        message,
    }
}

fn build_table(headers: Vec<String>, rows: Vec<Vec<String>>, delimiter: u8, attempts: usize) -> RawTable {
    let headers: Arc<[String]> = headers.into();
    let rows = rows
        .into_iter()
        .enumerate()
        .map(|(position, values)| RawRow::new(position, Arc::clone(&headers), values))
        .collect();
    RawTable {
        headers,
        rows,
        delimiter,
        attempts,
    }
}

/// Why one delimited-text attempt failed.
#[derive(Debug)]
enum ParseFailure {
    /// The header read as one column containing the competing delimiter.
    HeaderCollapsed(char),
    /// Reader error or a data row wider than the header.
    Malformed(String),
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderCollapsed(other) => {
                write!(f, "header row has a single column containing '{other}'")
            }
            Self::Malformed(message) => f.write_str(message),
        }
    }
}

/// Returns `(headers, rows)` or the structural problem.
///
/// `other` is the competing delimiter: a header that collapses into one column containing it
/// means this delimiter is the wrong one. Rows shorter than the header are padded with empty
/// values so validation reports them per row; rows wider than the header are structural.
fn parse_with_delimiter(
    bytes: &[u8],
    delimiter: u8,
    other: Option<u8>,
) -> Result<(Vec<String>, Vec<Vec<String>>), ParseFailure> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for (line_idx0, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| ParseFailure::Malformed(e.to_string()))?;
        if is_blank(&record) {
            continue;
        }

        match &headers {
            None => {
                let names: Vec<String> = record.iter().map(normalize_header).collect();
                if let (1, Some(other)) = (names.len(), other) {
                    if names[0].as_bytes().contains(&other) {
                        return Err(ParseFailure::HeaderCollapsed(char::from(other)));
                    }
                }
                headers = Some(names);
            }
            Some(h) => {
                if record.len() > h.len() {
                    return Err(ParseFailure::Malformed(format!(
                        "line {}: expected {} fields, found {}",
                        line_idx0 + 1,
                        h.len(),
                        record.len()
                    )));
                }
                let mut values: Vec<String> = record.iter().map(str::to_owned).collect();
                values.resize(h.len(), String::new());
                rows.push(values);
            }
        }
    }

    Ok((headers.unwrap_or_default(), rows))
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty()) && record.len() <= 1
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}
