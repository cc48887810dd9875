//! The teacher roster record and its import schema.
//!
//! Expected header (aliases in parentheses):
//!
//! `nombre, apellido_paterno, apellido_materno, correo (email), contrasena (contraseña, password)`
//!
//! `apellido_materno` is optional; every other column is required.

use std::fmt;

use serde::Serialize;

use crate::types::{FieldSchema, FieldSpec, ImportRecord, ResolvedFields, Rule};

const MAX_NAME_LEN: usize = 100;
const MIN_PASSWORD_LEN: usize = 8;

/// Build the field schema for teacher imports.
pub fn teacher_schema() -> FieldSchema {
    FieldSchema::new(vec![
        FieldSpec::required("nombre").rule(Rule::MaxLength(MAX_NAME_LEN)),
        FieldSpec::required("apellido_paterno").rule(Rule::MaxLength(MAX_NAME_LEN)),
        FieldSpec::optional("apellido_materno").rule(Rule::MaxLength(MAX_NAME_LEN)),
        FieldSpec::required("correo").alias("email").rule(Rule::Email),
        FieldSpec::required("contrasena")
            .alias("contraseña")
            .alias("password")
            .rule(Rule::MinLength(MIN_PASSWORD_LEN)),
    ])
}

/// A teacher account ready to be created remotely.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct TeacherRecord {
    pub nombre: String,
    pub apellido_paterno: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apellido_materno: Option<String>,
    pub correo: String,
    pub contrasena: String,
}

impl TeacherRecord {
    /// Full display name.
    pub fn full_name(&self) -> String {
        match &self.apellido_materno {
            Some(materno) => format!("{} {} {}", self.nombre, self.apellido_paterno, materno),
            None => format!("{} {}", self.nombre, self.apellido_paterno),
        }
    }
}

impl fmt::Debug for TeacherRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeacherRecord")
            .field("nombre", &self.nombre)
            .field("apellido_paterno", &self.apellido_paterno)
            .field("apellido_materno", &self.apellido_materno)
            .field("correo", &self.correo)
            .field("contrasena", &"<redacted>")
            .finish()
    }
}

impl ImportRecord for TeacherRecord {
    fn from_fields(mut fields: ResolvedFields) -> Self {
        Self {
            nombre: fields.take("nombre"),
            apellido_paterno: fields.take("apellido_paterno"),
            apellido_materno: fields.take_optional("apellido_materno"),
            correo: fields.take("correo"),
            contrasena: fields.take("contrasena"),
        }
    }

    fn label(&self) -> String {
        self.correo.clone()
    }
}
