//! Row validation against a [`FieldSchema`].
//!
//! Every [`RawRow`] yields exactly one outcome: a [`ValidatedEntity`] or a non-empty message
//! list in [`RowErrors`]. A bad row never stops the pass. Both outcomes carry the row's original
//! position, so a preview can label rows correctly even after invalid rows are filtered out.
//!
//! ## Example
//!
//! ```rust
//! use roster_import::types::{FieldSchema, FieldSpec, ImportRecord, RawRow, ResolvedFields, Rule};
//! use roster_import::validation::validate_rows;
//!
//! struct Contact { email: String }
//!
//! impl ImportRecord for Contact {
//!     fn from_fields(mut fields: ResolvedFields) -> Self {
//!         Contact { email: fields.take("email") }
//!     }
//!     fn label(&self) -> String {
//!         self.email.clone()
//!     }
//! }
//!
//! let schema = FieldSchema::new(vec![FieldSpec::required("email").rule(Rule::Email)]);
//! let headers: std::sync::Arc<[String]> = vec!["email".to_string()].into();
//! let rows = vec![
//!     RawRow::new(0, headers.clone(), vec!["nope".to_string()]),
//!     RawRow::new(1, headers, vec![" ada@x.mx ".to_string()]),
//! ];
//!
//! let report = validate_rows::<Contact>(&rows, &schema);
//! assert_eq!(report.entities.len(), 1);
//! assert_eq!(report.entities[0].position, 1);
//! assert_eq!(report.entities[0].record.email, "ada@x.mx");
//! assert!(report.row_errors.contains(0));
//! ```

pub mod rules;

use rayon::prelude::*;

use crate::types::{FieldSchema, ImportRecord, RawRow, ResolvedFields, RowErrors, ValidatedEntity};

/// Outcome of validating a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome<T> {
    Valid(ValidatedEntity<T>),
    Invalid { position: usize, messages: Vec<String> },
}

/// Valid entities and per-row errors for one parsed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport<T> {
    /// Valid records, in input order.
    pub entities: Vec<ValidatedEntity<T>>,
    /// Messages for invalid rows, keyed by original position.
    pub row_errors: RowErrors,
}

impl<T> Default for ValidationReport<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            row_errors: RowErrors::new(),
        }
    }
}

impl<T> ValidationReport<T> {
    pub fn valid_count(&self) -> usize {
        self.entities.len()
    }

    pub fn error_count(&self) -> usize {
        self.row_errors.len()
    }

    /// Rows seen by the validator (valid + invalid).
    pub fn total_rows(&self) -> usize {
        self.valid_count() + self.error_count()
    }
}

/// Validate one row. Every violated rule contributes a message.
pub fn validate_row<T: ImportRecord>(row: &RawRow, schema: &FieldSchema) -> RowOutcome<T> {
    let mut messages = Vec::new();
    let mut fields = ResolvedFields::default();

    for spec in &schema.fields {
        let value = spec
            .column_names()
            .find_map(|name| row.get(name))
            .map(str::trim)
            .unwrap_or("");

        if value.is_empty() && !spec.required {
            continue;
        }

        messages.extend(
            spec.rules
                .iter()
                .filter_map(|rule| rules::check(rule, &spec.name, value)),
        );
        fields.insert(spec.name.as_str(), value);
    }

    if messages.is_empty() {
        RowOutcome::Valid(ValidatedEntity {
            position: row.position(),
            record: T::from_fields(fields),
        })
    } else {
        RowOutcome::Invalid {
            position: row.position(),
            messages,
        }
    }
}

/// Validate every row, preserving input order.
///
/// Rows are checked in parallel; results are folded back in position order, so the entity
/// sequence is deterministic.
pub fn validate_rows<T: ImportRecord>(rows: &[RawRow], schema: &FieldSchema) -> ValidationReport<T> {
    let outcomes: Vec<RowOutcome<T>> = rows.par_iter().map(|row| validate_row(row, schema)).collect();

    let mut report = ValidationReport::default();
    for outcome in outcomes {
        match outcome {
            RowOutcome::Valid(entity) => report.entities.push(entity),
            RowOutcome::Invalid { position, messages } => report.row_errors.insert(position, messages),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::{FieldSpec, Rule};

    #[derive(Debug, PartialEq, Eq)]
    struct Person {
        name: String,
        nickname: Option<String>,
        secret: String,
    }

    impl ImportRecord for Person {
        fn from_fields(mut fields: ResolvedFields) -> Self {
            Person {
                name: fields.take("name"),
                nickname: fields.take_optional("nickname"),
                secret: fields.take("secret"),
            }
        }

        fn label(&self) -> String {
            self.name.clone()
        }
    }

    fn schema() -> FieldSchema {
        FieldSchema::new(vec![
            FieldSpec::required("name"),
            FieldSpec::optional("nickname").rule(Rule::MinLength(3)),
            FieldSpec::required("secret").alias("password").rule(Rule::MinLength(8)),
        ])
    }

    fn rows(headers: &[&str], data: &[&[&str]]) -> Vec<RawRow> {
        let headers: Arc<[String]> = headers.iter().map(|s| s.to_string()).collect();
        data.iter()
            .enumerate()
            .map(|(i, r)| RawRow::new(i, Arc::clone(&headers), r.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn collects_every_violation_in_a_row() {
        let rows = rows(&["name", "nickname", "secret"], &[&["", "ab", "short"]]);
        match validate_row::<Person>(&rows[0], &schema()) {
            RowOutcome::Invalid { position, messages } => {
                assert_eq!(position, 0);
                assert_eq!(
                    messages,
                    vec![
                        "name: is required".to_string(),
                        "nickname: must be at least 3 characters".to_string(),
                        "secret: must be at least 8 characters".to_string(),
                    ]
                );
            }
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[test]
    fn trims_values_and_resolves_aliases() {
        let rows = rows(&["name", "password"], &[&["  Ada ", " correcthorse "]]);
        match validate_row::<Person>(&rows[0], &schema()) {
            RowOutcome::Valid(entity) => {
                assert_eq!(
                    entity.record,
                    Person {
                        name: "Ada".to_string(),
                        nickname: None,
                        secret: "correcthorse".to_string(),
                    }
                );
            }
            other => panic!("expected valid, got {other:?}"),
        }
    }

    #[test]
    fn empty_optional_value_skips_its_rules() {
        let rows = rows(&["name", "nickname", "secret"], &[&["Ada", "  ", "correcthorse"]]);
        assert!(matches!(validate_row::<Person>(&rows[0], &schema()), RowOutcome::Valid(_)));
    }

    #[test]
    fn every_row_has_exactly_one_outcome_and_order_is_kept() {
        let rows = rows(
            &["name", "secret"],
            &[
                &["A", "aaaaaaaa"],
                &["", "bbbbbbbb"],
                &["C", "c"],
                &["D", "dddddddd"],
                &["D", "dddddddd"],
            ],
        );
        let report = validate_rows::<Person>(&rows, &schema());

        assert_eq!(report.total_rows(), rows.len());
        for row in &rows {
            let is_valid = report.entities.iter().any(|e| e.position == row.position());
            assert_ne!(is_valid, report.row_errors.contains(row.position()));
        }

        let positions: Vec<usize> = report.entities.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 3, 4]);
        // Duplicates are kept.
        assert_eq!(report.entities[1].record, report.entities[2].record);
    }
}
