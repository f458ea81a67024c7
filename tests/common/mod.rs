#![allow(dead_code)]

use std::path::{Path, PathBuf};

use mte_service::Config;
use mte_service::io::excel_write;
use mte_service::model::{CellValue, Column, SheetTable};
use mte_service::schema::ColumnKind;

pub fn text(value: &str) -> CellValue {
    CellValue::text(value)
}

pub fn number(value: f64) -> CellValue {
    CellValue::Number(value)
}

pub fn table(name: &str, columns: &[&str], rows: Vec<Vec<CellValue>>) -> SheetTable {
    SheetTable {
        name: name.to_string(),
        columns: columns
            .iter()
            .map(|column| Column::new(*column, ColumnKind::Text))
            .collect(),
        rows,
    }
}

pub fn modules_sheet() -> SheetTable {
    table(
        "modules",
        &["module_id", "module_name"],
        vec![
            vec![number(1.0), text("Engine")],
            vec![number(2.0), text("Chassis")],
        ],
    )
}

pub fn models_sheet() -> SheetTable {
    table(
        "models",
        &["model_id", "module_id", "model_name"],
        vec![
            vec![number(10.0), number(1.0), text("V8")],
            vec![number(11.0), number(1.0), text(" Inline-4 ")],
            vec![number(20.0), number(2.0), text("Frame")],
        ],
    )
}

pub fn variants_sheet() -> SheetTable {
    table(
        "variants",
        &["model_id", "variant_name", "MTE", "notes"],
        vec![
            vec![number(10.0), text("Alpha-1"), number(2.5), text("baseline")],
            vec![number(10.0), text("Alpha-2"), number(1.25), text("")],
            vec![number(11.0), text("Beta-1"), text("0.125"), text("")],
            vec![number(20.0), text("Gamma-1"), number(4.0), text("")],
        ],
    )
}

pub fn fixture_sheets() -> Vec<SheetTable> {
    vec![modules_sheet(), models_sheet(), variants_sheet()]
}

pub fn write_sheets(path: &Path, sheets: &[SheetTable]) {
    excel_write::write_workbook(path, sheets).expect("workbook written");
}

/// Writes the fixture workbook into `dir` and returns a config pointing at it
/// and at a not-yet-existing database next to it.
pub fn fixture_config(dir: &Path) -> Config {
    let workbook = dir.join("database.xlsx");
    write_sheets(&workbook, &fixture_sheets());
    Config::new(dir.join("mte_data.db"), workbook)
}

pub fn staging_file(database: &Path) -> PathBuf {
    let mut name = database.as_os_str().to_owned();
    name.push(".loading");
    PathBuf::from(name)
}
