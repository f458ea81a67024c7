//! Read-only queries over the module → model → variant hierarchy.
//!
//! Names are compared with `LOWER(TRIM(..))` on both sides; a name that
//! matches nothing yields an empty list.

use rusqlite::Connection;
use rusqlite::types::Value;
use tracing::{debug, instrument};

use crate::error::{MteError, Result};
use crate::model::VariantMte;

/// Lists every module name in storage order.
#[instrument(level = "debug", skip_all)]
pub fn list_modules(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT module_name FROM modules")?;
    let names = stmt
        .query_map([], |row| row.get::<_, Value>(0))?
        .map(|name| name.map(text_value))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    debug!(count = names.len(), "modules listed");
    Ok(names)
}

/// Lists the models belonging to `module_name`.
#[instrument(level = "debug", skip(conn))]
pub fn list_models(conn: &Connection, module_name: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT m.model_name
         FROM models m
         JOIN modules mo ON m.module_id = mo.module_id
         WHERE LOWER(TRIM(mo.module_name)) = LOWER(TRIM(?1))",
    )?;
    let names = stmt
        .query_map([module_name], |row| row.get::<_, Value>(0))?
        .map(|name| name.map(text_value))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    debug!(count = names.len(), "models listed");
    Ok(names)
}

/// Lists the variants, with their MTE values, belonging to `model_name`.
#[instrument(level = "debug", skip(conn))]
pub fn list_variants(conn: &Connection, model_name: &str) -> Result<Vec<VariantMte>> {
    let mut stmt = conn.prepare(
        "SELECT v.variant_name, v.MTE
         FROM variants v
         JOIN models m ON v.model_id = m.model_id
         WHERE LOWER(TRIM(m.model_name)) = LOWER(TRIM(?1))",
    )?;
    let rows = stmt
        .query_map([model_name], |row| {
            Ok((row.get::<_, Value>(0)?, row.get::<_, Value>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let variants = to_variants(rows)?;
    debug!(count = variants.len(), "variants listed");
    Ok(variants)
}

/// Converts raw `(variant_name, MTE)` rows. Stores not produced by this
/// crate may hold numeric names or MTE stored as text; both are accepted.
pub(crate) fn to_variants(rows: Vec<(Value, Value)>) -> Result<Vec<VariantMte>> {
    rows.into_iter()
        .map(|(name, mte)| Ok(VariantMte::new(text_value(name), mte_value(mte)?)))
        .collect()
}

/// Renders a stored name as text whatever its storage class.
pub(crate) fn text_value(value: Value) -> String {
    match value {
        Value::Text(text) => text,
        Value::Integer(value) => value.to_string(),
        Value::Real(value) => value.to_string(),
        Value::Null => String::new(),
        Value::Blob(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

fn mte_value(value: Value) -> Result<f64> {
    let invalid = |value: String| MteError::InvalidLiteral {
        column: "MTE".to_string(),
        value,
    };
    match value {
        Value::Real(value) => Ok(value),
        Value::Integer(value) => Ok(value as f64),
        Value::Text(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| invalid(text)),
        Value::Null => Err(invalid("NULL".to_string())),
        Value::Blob(_) => Err(invalid("<blob>".to_string())),
    }
}
