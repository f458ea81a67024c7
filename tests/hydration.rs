mod common;

use std::fs;

use mte_service::io::excel_write;
use mte_service::lookup;
use mte_service::{Config, LoadOutcome, LoadSummary, MteError, Store, VariantMte, ensure_store};
use tempfile::tempdir;

use common::{fixture_config, fixture_sheets, number, staging_file, table, text, write_sheets};

#[test]
fn builds_store_from_workbook() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = fixture_config(temp_dir.path());

    let outcome = ensure_store(&config).expect("store created");

    assert_eq!(
        outcome,
        LoadOutcome::Created(LoadSummary {
            modules: 2,
            models: 3,
            variants: 4,
        })
    );
    assert!(config.database_path.exists());
    assert!(!staging_file(&config.database_path).exists());

    let store = Store::new(&config.database_path);
    store
        .with_connection(|conn| {
            assert_eq!(lookup::list_modules(conn)?, vec!["Engine", "Chassis"]);
            assert_eq!(lookup::list_models(conn, "engine")?, vec!["V8", " Inline-4 "]);
            assert_eq!(
                lookup::list_variants(conn, "inline-4")?,
                vec![VariantMte::new("Beta-1", 0.125)]
            );
            Ok(())
        })
        .expect("lookups succeed");
}

#[test]
fn numeric_ids_join_across_sheets() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = fixture_config(temp_dir.path());
    ensure_store(&config).expect("store created");

    let conn = rusqlite::Connection::open(&config.database_path).expect("database opened");
    let module_id: String = conn
        .query_row(
            "SELECT module_id FROM modules WHERE module_name = 'Engine'",
            [],
            |row| row.get(0),
        )
        .expect("module row");
    assert_eq!(module_id, "1");
}

#[test]
fn extra_columns_and_blank_cells_are_kept_as_text() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = fixture_config(temp_dir.path());
    ensure_store(&config).expect("store created");

    let conn = rusqlite::Connection::open(&config.database_path).expect("database opened");
    let notes: Vec<String> = conn
        .prepare("SELECT notes FROM variants")
        .expect("statement prepared")
        .query_map([], |row| row.get(0))
        .expect("query ran")
        .collect::<rusqlite::Result<_>>()
        .expect("rows read");
    assert_eq!(notes, vec!["baseline", "", "", ""]);
}

#[test]
fn second_run_is_a_no_op() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = fixture_config(temp_dir.path());
    ensure_store(&config).expect("store created");

    let store = Store::new(&config.database_path);
    let before = store
        .with_connection(|conn| lookup::list_variants(conn, "V8"))
        .expect("lookup before");

    // The existing store is trusted even once the workbook is gone.
    fs::remove_file(&config.workbook_path).expect("workbook removed");
    let outcome = ensure_store(&config).expect("second run");
    assert_eq!(outcome, LoadOutcome::Existing);

    let after = store
        .with_connection(|conn| lookup::list_variants(conn, "V8"))
        .expect("lookup after");
    assert_eq!(before, after);
}

#[test]
fn missing_workbook_is_fatal() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = Config::new(
        temp_dir.path().join("mte_data.db"),
        temp_dir.path().join("absent.xlsx"),
    );

    let result = ensure_store(&config);

    assert!(matches!(result, Err(MteError::MissingInput(path)) if path == config.workbook_path));
    assert!(!config.database_path.exists());
}

#[test]
fn missing_sheet_leaves_no_store() {
    let temp_dir = tempdir().expect("temporary directory");
    let workbook = temp_dir.path().join("database.xlsx");
    let mut sheets = fixture_sheets();
    sheets.retain(|sheet| sheet.name != "variants");
    write_sheets(&workbook, &sheets);
    let config = Config::new(temp_dir.path().join("mte_data.db"), workbook);

    let error = ensure_store(&config).expect_err("load fails");

    assert!(
        matches!(&error, MteError::InvalidWorkbook(message) if message.contains("variants")),
        "unexpected error: {error}"
    );
    assert!(!config.database_path.exists());
    assert!(!staging_file(&config.database_path).exists());
}

#[test]
fn missing_column_is_rejected() {
    let temp_dir = tempdir().expect("temporary directory");
    let workbook = temp_dir.path().join("database.xlsx");
    let mut sheets = fixture_sheets();
    sheets[1] = table(
        "models",
        &["model_id", "model_name"],
        vec![vec![number(10.0), text("V8")]],
    );
    write_sheets(&workbook, &sheets);
    let config = Config::new(temp_dir.path().join("mte_data.db"), workbook);

    let error = ensure_store(&config).expect_err("load fails");

    assert!(
        matches!(&error, MteError::InvalidWorkbook(message) if message.contains("module_id")),
        "unexpected error: {error}"
    );
    assert!(!config.database_path.exists());
}

#[test]
fn declared_columns_match_headers_ignoring_case() {
    let temp_dir = tempdir().expect("temporary directory");
    let workbook = temp_dir.path().join("database.xlsx");
    let mut sheets = fixture_sheets();
    sheets[2] = table(
        "variants",
        &["Model_ID", "Variant_Name", "mte"],
        vec![vec![number(10.0), text("Alpha-1"), text("2.5")]],
    );
    write_sheets(&workbook, &sheets);
    let config = Config::new(temp_dir.path().join("mte_data.db"), workbook);

    ensure_store(&config).expect("store created");

    let conn = rusqlite::Connection::open(&config.database_path).expect("database opened");
    let (name, kind): (String, String) = conn
        .query_row(
            "SELECT name, type FROM pragma_table_info('variants') WHERE name = 'MTE'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("MTE column declared");
    assert_eq!((name.as_str(), kind.as_str()), ("MTE", "REAL"));

    let store = Store::new(&config.database_path);
    let variants = store
        .with_connection(|conn| lookup::list_variants(conn, "v8"))
        .expect("lookup succeeds");
    assert_eq!(variants, vec![VariantMte::new("Alpha-1", 2.5)]);
}

#[test]
fn blank_mte_fails_with_cell_position() {
    let temp_dir = tempdir().expect("temporary directory");
    let workbook = temp_dir.path().join("database.xlsx");
    let mut sheets = fixture_sheets();
    sheets[2] = table(
        "variants",
        &["model_id", "variant_name", "MTE"],
        vec![
            vec![number(10.0), text("Alpha-1"), number(2.5)],
            vec![number(10.0), text("Alpha-2"), text("")],
        ],
    );
    write_sheets(&workbook, &sheets);
    let config = Config::new(temp_dir.path().join("mte_data.db"), workbook);

    let error = ensure_store(&config).expect_err("load fails");

    match error {
        MteError::InvalidCell {
            sheet, row, column, ..
        } => {
            assert_eq!(sheet, "variants");
            assert_eq!(row, 3);
            assert_eq!(column, "MTE");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!config.database_path.exists());
}

#[test]
fn template_workbook_has_headers_but_no_rows() {
    let temp_dir = tempdir().expect("temporary directory");
    let workbook = temp_dir.path().join("template.xlsx");
    excel_write::write_template(&workbook).expect("template written");
    let config = Config::new(temp_dir.path().join("mte_data.db"), workbook);

    let outcome = ensure_store(&config).expect("empty store created");

    assert_eq!(
        outcome,
        LoadOutcome::Created(LoadSummary {
            modules: 0,
            models: 0,
            variants: 0,
        })
    );
}
