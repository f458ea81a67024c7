use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::Result;
use crate::model::{CellValue, Column, SheetTable};
use crate::schema::SHEETS;

/// Writes the provided tables to the given path, one worksheet per table with
/// the column names as header row.
pub fn write_workbook(path: &Path, tables: &[SheetTable]) -> Result<()> {
    let mut workbook_writer = Workbook::new();

    for table in tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&table.name)?;

        for (col_idx, column) in table.columns.iter().enumerate() {
            worksheet.write_string(0, col_idx as u16, &column.name)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            let excel_row = (row_idx + 1) as u32;
            for (col_idx, cell) in row.iter().enumerate() {
                match cell {
                    CellValue::Text(value) if value.is_empty() => {}
                    CellValue::Text(value) => {
                        worksheet.write_string(excel_row, col_idx as u16, value)?;
                    }
                    CellValue::Number(value) => {
                        worksheet.write_number(excel_row, col_idx as u16, *value)?;
                    }
                }
            }
        }
    }

    workbook_writer.save(path)?;
    Ok(())
}

/// Writes an empty workbook holding every declared sheet with its header row.
pub fn write_template(path: &Path) -> Result<()> {
    let tables: Vec<SheetTable> = SHEETS
        .iter()
        .map(|schema| SheetTable {
            name: schema.name.to_string(),
            columns: schema
                .columns
                .iter()
                .map(|spec| Column::new(spec.name, spec.kind))
                .collect(),
            rows: Vec::new(),
        })
        .collect();

    write_workbook(path, &tables)
}
