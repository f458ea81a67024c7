//! SQLite store holding the hydrated tables.
//!
//! Readers never share a connection: every call to [`Store::with_connection`]
//! opens a read-only handle, runs the closure and drops the handle when the
//! closure returns.

use std::path::{Path, PathBuf};

use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::{Connection, OpenFlags, params_from_iter};
use tracing::debug;

use crate::error::Result;
use crate::model::{CellValue, SheetTable};

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file is present.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Opens a read-only connection to the backing file.
    pub fn open(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    /// Runs `f` against a fresh connection that is closed once `f` returns.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.open()?;
        f(&conn)
    }

    /// Runs `f` on the blocking thread pool with a fresh connection.
    pub async fn read<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.with_connection(f)).await?
    }
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            CellValue::Text(value) => ToSqlOutput::from(value.as_str()),
            CellValue::Number(value) => ToSqlOutput::from(*value),
        })
    }
}

/// Replaces each table with the contents of the matching sheet, all inside a
/// single transaction.
pub fn write_tables(conn: &mut Connection, tables: &[SheetTable]) -> Result<()> {
    let tx = conn.transaction()?;
    for table in tables {
        write_table(&tx, table)?;
    }
    tx.commit()?;
    Ok(())
}

fn write_table(conn: &Connection, table: &SheetTable) -> Result<()> {
    let name = quote_identifier(&table.name);
    let column_defs = table
        .columns
        .iter()
        .map(|column| format!("{} {}", quote_identifier(&column.name), column.kind.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=table.columns.len())
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ");

    conn.execute(&format!("DROP TABLE IF EXISTS {name}"), [])?;
    conn.execute(&format!("CREATE TABLE {name} ({column_defs})"), [])?;

    let mut stmt = conn.prepare(&format!("INSERT INTO {name} VALUES ({placeholders})"))?;
    for row in &table.rows {
        stmt.execute(params_from_iter(row.iter()))?;
    }
    debug!(table = %table.name, rows = table.rows.len(), "table written");
    Ok(())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Counts the rows of a hydrated table.
pub fn count_rows(conn: &Connection, table: &str) -> Result<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewriting_a_table_replaces_previous_rows() {
        let mut conn = fixtures::seeded_connection();
        assert_eq!(count_rows(&conn, "variants").unwrap(), 5);

        let replacement = SheetTable {
            name: "variants".to_string(),
            columns: vec![crate::model::Column::new(
                "variant_name",
                crate::schema::ColumnKind::Text,
            )],
            rows: vec![vec![CellValue::text("Only")]],
        };
        write_tables(&mut conn, &[replacement]).unwrap();

        assert_eq!(count_rows(&conn, "variants").unwrap(), 1);
    }

    #[test]
    fn identifiers_with_quotes_are_escaped() {
        assert_eq!(quote_identifier("MTE"), "\"MTE\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
