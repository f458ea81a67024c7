use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use tracing::debug;

use crate::error::{MteError, Result};
use crate::model::{CellValue, Column, SheetTable};
use crate::schema::{ColumnKind, SHEETS, SheetSchema};

/// Reads every sheet declared in [`SHEETS`] from the workbook at `path`.
///
/// All sheets are read and validated before anything is returned, so a
/// workbook with a missing sheet or a malformed cell never yields a partial
/// set of tables.
pub fn read_tables(path: &Path) -> Result<Vec<SheetTable>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    SHEETS
        .iter()
        .map(|schema| {
            let range = read_required_sheet(&mut workbook, schema.name)?;
            let table = parse_sheet(&range, schema)?;
            debug!(
                sheet = schema.name,
                columns = table.columns.len(),
                rows = table.rows.len(),
                "sheet parsed"
            );
            Ok(table)
        })
        .collect()
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| MteError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(MteError::from)?;
    Ok(range)
}

fn parse_sheet(range: &Range<DataType>, schema: &SheetSchema) -> Result<SheetTable> {
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| cell_to_string(Some(cell)).trim().to_string())
            .collect(),
        None => {
            return Err(MteError::InvalidWorkbook(format!(
                "sheet '{}' has no header row",
                schema.name
            )));
        }
    };

    let mut columns: Vec<Column> = Vec::new();
    let mut positions: Vec<usize> = Vec::new();
    for (col_idx, header) in headers.iter().enumerate() {
        if header.is_empty() {
            continue;
        }
        // SQLite column names are case-insensitive.
        if columns
            .iter()
            .any(|column| column.name.eq_ignore_ascii_case(header))
        {
            return Err(MteError::InvalidWorkbook(format!(
                "sheet '{}' has duplicate column '{header}'",
                schema.name
            )));
        }
        // Declared columns keep their declared spelling.
        let column = match schema.column(header) {
            Some(spec) => Column::new(spec.name, spec.kind),
            None => Column::new(header.clone(), ColumnKind::Text),
        };
        columns.push(column);
        positions.push(col_idx);
    }

    for spec in schema.columns {
        if !columns.iter().any(|column| column.name == spec.name) {
            return Err(MteError::InvalidWorkbook(format!(
                "sheet '{}' is missing column '{}'",
                schema.name, spec.name
            )));
        }
    }

    let header_row = range.start().map(|(row, _)| row).unwrap_or(0);
    let mut table_rows = Vec::new();
    for (offset, row) in rows.enumerate() {
        if row.iter().all(is_blank) {
            continue;
        }
        // 1-based spreadsheet row number, as shown to users.
        let row_number = header_row + offset as u32 + 2;
        let cells = columns
            .iter()
            .zip(&positions)
            .map(|(column, &col_idx)| convert_cell(row.get(col_idx), column, schema, row_number))
            .collect::<Result<Vec<_>>>()?;
        table_rows.push(cells);
    }

    Ok(SheetTable {
        name: schema.name.to_string(),
        columns,
        rows: table_rows,
    })
}

fn convert_cell(
    cell: Option<&DataType>,
    column: &Column,
    schema: &SheetSchema,
    row_number: u32,
) -> Result<CellValue> {
    match column.kind {
        ColumnKind::Text => Ok(CellValue::Text(cell_to_string(cell))),
        ColumnKind::Real => {
            cell_to_number(cell)
                .map(CellValue::Number)
                .ok_or_else(|| MteError::InvalidCell {
                    sheet: schema.name.to_string(),
                    row: row_number,
                    column: column.name.clone(),
                    value: cell_to_string(cell),
                })
        }
    }
}

fn is_blank(cell: &DataType) -> bool {
    match cell {
        DataType::Empty => true,
        DataType::String(value) => value.is_empty(),
        _ => false,
    }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn cell_to_number(cell: Option<&DataType>) -> Option<f64> {
    let value = match cell {
        Some(DataType::Float(value)) => *value,
        Some(DataType::Int(value)) => *value as f64,
        Some(DataType::String(value)) => value.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}
