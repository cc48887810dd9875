use roster_import::ImportError;
use roster_import::ingestion::csv::ingest_csv_from_bytes;
use roster_import::ingestion::{ImportOptions, SelectedFile, ingest_file, ingest_from_path};
use roster_import::teacher::teacher_schema;

const HEADER: &str = "nombre,apellido_paterno,apellido_materno,correo,contrasena";

#[test]
fn ingest_from_path_happy_path() {
    let table = ingest_from_path("tests/fixtures/docentes.csv", &teacher_schema(), &ImportOptions::default()).unwrap();

    assert_eq!(table.row_count(), 3);
    assert_eq!(table.attempts, 1);
    assert_eq!(table.rows[0].get("correo"), Some("ada@escuela.mx"));
    assert_eq!(table.rows[1].get("apellido_materno"), Some(""));
}

#[test]
fn semicolon_file_needs_exactly_one_fallback() {
    let table = ingest_from_path(
        "tests/fixtures/docentes_semicolon.csv",
        &teacher_schema(),
        &ImportOptions::default(),
    )
    .unwrap();

    assert_eq!(table.attempts, 2);
    assert_eq!(table.delimiter, b';');
    assert_eq!(table.row_count(), 2);
    // Password column spelled with the accented alias.
    assert_eq!(table.rows[0].get("contraseña"), Some("analytical"));
}

#[test]
fn missing_correo_column_is_reported_by_name() {
    let input = "nombre,apellido_paterno,apellido_materno,contrasena\nAda,Lovelace,Byron,analytical\n";
    let err = ingest_csv_from_bytes(input.as_bytes(), &teacher_schema(), b',', Some(b';')).unwrap_err();

    match &err {
        ImportError::MissingHeaders { missing } => assert_eq!(missing, &vec!["correo".to_string()]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("missing required headers: correo"));
}

#[test]
fn password_alias_satisfies_required_header() {
    let input = "nombre,apellido_paterno,correo,password\nAda,Lovelace,ada@escuela.mx,analytical\n";
    let table = ingest_csv_from_bytes(input.as_bytes(), &teacher_schema(), b',', Some(b';')).unwrap();
    assert_eq!(table.row_count(), 1);
}

#[test]
fn structural_failure_under_both_delimiters_is_terminal() {
    let input = format!("{HEADER}\nAda,Lovelace,Byron,ada@escuela.mx,analytical,extra\n");
    let err = ingest_csv_from_bytes(input.as_bytes(), &teacher_schema(), b',', Some(b';')).unwrap_err();
    assert!(matches!(err, ImportError::StructuralParse { attempts: 2, delimiter: ',', .. }));
    assert!(err.to_string().contains("line 2: expected 5 fields, found 6"));
}

#[test]
fn short_row_stays_in_the_table() {
    let input = format!(
        "{HEADER}\nAda,Lovelace,Byron,ada@escuela.mx,analytical\nGrace,Hopper,,grace@escuela.mx\n"
    );
    let table = ingest_csv_from_bytes(input.as_bytes(), &teacher_schema(), b',', Some(b';')).unwrap();
    assert_eq!(table.attempts, 1);
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.rows[1].get("contrasena"), Some(""));
}

#[test]
fn uppercase_accented_header_matches_alias() {
    let input = "NOMBRE,APELLIDO_PATERNO,CORREO,CONTRASEÑA\nAda,Lovelace,ada@escuela.mx,analytical\n";
    let table = ingest_csv_from_bytes(input.as_bytes(), &teacher_schema(), b',', Some(b';')).unwrap();
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.rows[0].get("contraseña"), Some("analytical"));
}

#[test]
fn no_fallback_configured_fails_after_one_attempt() {
    let input = format!("{HEADER}\nAda,Lovelace,Byron,ada@escuela.mx,analytical,extra\n");
    let err = ingest_csv_from_bytes(input.as_bytes(), &teacher_schema(), b',', None).unwrap_err();
    assert!(matches!(err, ImportError::StructuralParse { attempts: 1, delimiter: ',', .. }));
}

#[test]
fn invalid_utf8_is_structural() {
    let mut input = format!("{HEADER}\n").into_bytes();
    input.extend_from_slice(b"Ad\xFF,Lovelace,Byron,ada@escuela.mx,analytical\n");
    let err = ingest_csv_from_bytes(&input, &teacher_schema(), b',', Some(b';')).unwrap_err();
    assert!(matches!(err, ImportError::StructuralParse { .. }));
}

#[test]
fn header_only_file_yields_no_rows() {
    let file = SelectedFile::new("docentes.csv", format!("{HEADER}\n"));
    let table = ingest_file(&file, &teacher_schema(), &ImportOptions::default()).unwrap();
    assert_eq!(table.row_count(), 0);
}

#[test]
fn empty_and_unsupported_inputs_do_not_panic() {
    let schema = teacher_schema();
    let opts = ImportOptions::default();

    let err = ingest_file(&SelectedFile::new("docentes.csv", Vec::new()), &schema, &opts).unwrap_err();
    assert!(matches!(err, ImportError::EmptyFile));

    let err = ingest_file(&SelectedFile::new("docentes.pdf", "x"), &schema, &opts).unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat { .. }));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = ingest_from_path("tests/fixtures/does_not_exist.csv", &teacher_schema(), &ImportOptions::default())
        .unwrap_err();
    assert!(matches!(err, ImportError::Io(_)));
}
