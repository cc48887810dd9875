//! Core data model types for the import pipeline.
//!
//! Parsed input is held as [`RawRow`]s (header-keyed strings, one per data line). A
//! [`FieldSchema`] declares which canonical fields a target record has, which header spellings
//! each accepts, and which [`Rule`]s its values must satisfy. Rows that pass every rule become
//! [`ValidatedEntity`] values carrying a strongly-typed [`ImportRecord`]; rows that fail are
//! recorded in [`RowErrors`] under their original position.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

/// One parsed data line, keyed by the header names discovered at parse time.
///
/// Immutable once produced. `position` is the 0-based index among the parsed data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    position: usize,
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl RawRow {
    /// Create a row. `values` is aligned with `headers`.
    pub fn new(position: usize, headers: Arc<[String]>, values: Vec<String>) -> Self {
        Self {
            position,
            headers,
            values,
        }
    }

    /// 0-based position of this row in the parsed sequence.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Raw (untrimmed) value for a column, if the column exists.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
    }

    /// Iterate `(column, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

/// Result of a structurally successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Normalized header names, in file order.
    pub headers: Arc<[String]>,
    /// Data rows in file order.
    pub rows: Vec<RawRow>,
    /// Delimiter that produced this table.
    pub delimiter: u8,
    /// Number of parse attempts (1 without fallback, 2 with).
    pub attempts: usize,
}

impl RawTable {
    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether parsing needed the fallback delimiter.
    pub fn used_fallback(&self) -> bool {
        self.attempts > 1
    }
}

/// A single validation rule applied to a field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Value must be non-empty after trimming.
    NonEmpty,
    /// Value must have at least this many characters.
    MinLength(usize),
    /// Value must have at most this many characters.
    MaxLength(usize),
    /// Value must look like an email address.
    Email,
}

/// Declaration of one canonical field of the target record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical field name.
    pub name: String,
    /// Alternative header spellings accepted for this field.
    pub aliases: Vec<String>,
    /// Whether the column must be present in the header.
    pub required: bool,
    /// Rules applied to the trimmed value.
    pub rules: Vec<Rule>,
}

impl FieldSpec {
    /// A field whose column must be present and whose value must be non-empty.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            required: true,
            rules: vec![Rule::NonEmpty],
        }
    }

    /// A field whose column may be missing and whose value may be empty.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            required: false,
            rules: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Canonical name followed by every alias.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Index of the first header matching the canonical name or an alias.
    ///
    /// The canonical name wins over aliases when several are present.
    pub fn resolve_column(&self, headers: &[String]) -> Option<usize> {
        self.column_names()
            .find_map(|name| headers.iter().position(|h| h == name))
    }
}

/// Static declaration of a target record's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Ordered list of fields.
    pub fields: Vec<FieldSpec>,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Iterate canonical field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Canonical names of required fields absent from `headers` under every spelling.
    pub fn missing_columns(&self, headers: &[String]) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.required && f.resolve_column(headers).is_none())
            .map(|f| f.name.clone())
            .collect()
    }
}

/// Trimmed values of a row that passed validation, keyed by canonical field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFields {
    values: BTreeMap<String, String>,
}

impl ResolvedFields {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Remove a value, returning an empty string when absent.
    pub fn take(&mut self, name: &str) -> String {
        self.values.remove(name).unwrap_or_default()
    }

    /// Remove a value, mapping absent or empty to `None`.
    pub fn take_optional(&mut self, name: &str) -> Option<String> {
        self.values.remove(name).filter(|v| !v.is_empty())
    }
}

/// A strongly-typed record built from a validated row.
///
/// `from_fields` is only ever called with fields that satisfied the schema, so implementors may
/// assume required values are present.
pub trait ImportRecord: Sized + Send {
    /// Build the record from canonical, trimmed values.
    fn from_fields(fields: ResolvedFields) -> Self;

    /// Short human-readable identity used in failure reports (e.g. an email).
    fn label(&self) -> String;
}

/// A record ready for submission, tagged with its original input row position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEntity<T> {
    /// 0-based position of the originating [`RawRow`].
    pub position: usize,
    pub record: T,
}

/// Validation messages keyed by original row position.
///
/// Every entry holds at least one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RowErrors {
    by_row: BTreeMap<usize, Vec<String>>,
}

impl RowErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record messages for a row. Empty message lists are ignored.
    pub fn insert(&mut self, position: usize, messages: Vec<String>) {
        if !messages.is_empty() {
            self.by_row.insert(position, messages);
        }
    }

    pub fn get(&self, position: usize) -> Option<&[String]> {
        self.by_row.get(&position).map(Vec::as_slice)
    }

    pub fn contains(&self, position: usize) -> bool {
        self.by_row.contains_key(&position)
    }

    /// Number of rows with errors.
    pub fn len(&self) -> usize {
        self.by_row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_row.is_empty()
    }

    /// Iterate rows in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.by_row.iter().map(|(k, v)| (*k, v.as_slice()))
    }
}
