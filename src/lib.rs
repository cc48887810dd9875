//! `roster-import` is a small library for bulk-importing records (teacher accounts, by default)
//! from a user-supplied CSV file into a remote service.
//!
//! The pipeline has three stages:
//!
//! 1. **Ingestion** ([`ingestion`]): the file is parsed as delimited text. Comma is tried first;
//!    on a structural failure the parse is retried once with semicolon. Required headers are
//!    checked (accepting aliases) before any row is looked at.
//! 2. **Validation** ([`validation`]): every row is checked against a [`types::FieldSchema`].
//!    Each row yields either a typed [`types::ValidatedEntity`] or a list of messages in
//!    [`types::RowErrors`], both keyed by the row's original position.
//! 3. **Commit** ([`execution`]): valid records are submitted one at a time through a
//!    [`execution::CreateOperation`]. Failures are tallied per item and never stop the batch;
//!    progress is published after each attempt.
//!
//! [`session::UploadSession`] ties the stages together as a small state machine.
//!
//! ## Quick example
//!
//! ```rust
//! use async_trait::async_trait;
//! use roster_import::error::SubmissionError;
//! use roster_import::execution::CreateOperation;
//! use roster_import::ingestion::SelectedFile;
//! use roster_import::session::{SessionOptions, SessionState, TeacherUploadSession};
//! use roster_import::teacher::TeacherRecord;
//!
//! struct Api;
//!
//! #[async_trait]
//! impl CreateOperation<TeacherRecord> for Api {
//!     async fn create(&self, _teacher: &TeacherRecord) -> Result<(), SubmissionError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn demo() {
//! let mut session = TeacherUploadSession::for_teachers(SessionOptions::default());
//! session.select_file(SelectedFile::new(
//!     "docentes.csv",
//!     "nombre,apellido_paterno,apellido_materno,correo,contrasena\n\
//!      Ada,Lovelace,Byron,ada@escuela.mx,analytical\n",
//! ));
//! assert_eq!(session.valid_count(), 1);
//!
//! let summary = session.commit(&Api).await.unwrap();
//! assert_eq!(summary.succeeded, 1);
//! assert_eq!(session.state(), SessionState::Idle);
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: file gate, delimited-text parsing and observer hooks
//! - [`validation`]: schema rule interpreter and the per-row pass
//! - [`execution`]: sequential batch commit, metrics and summaries
//! - [`session`]: the upload session state machine
//! - [`types`]: rows, schemas and validated entities
//! - [`teacher`]: the teacher record and its schema
//! - [`error`]: error types

pub mod error;
pub mod execution;
pub mod ingestion;
pub mod session;
pub mod teacher;
pub mod types;
pub mod validation;

pub use error::{ImportError, ImportResult, SessionError, SubmissionError};
