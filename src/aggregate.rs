use rusqlite::Connection;
use rusqlite::types::Value;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::lookup::to_variants;
use crate::model::Aggregation;

/// Number of decimal places kept in [`Aggregation::overall_mte`].
pub const TOTAL_DECIMALS: i32 = 3;

/// Resolves `names` against the variants table and sums their MTE values.
///
/// Matching ignores ASCII case and surrounding spaces. Names without a match
/// are dropped. Matched rows come back in storage order, each at most once.
/// An empty `names` slice yields [`Aggregation::empty`].
#[instrument(level = "debug", skip_all, fields(requested = names.len()))]
pub fn aggregate(conn: &Connection, names: &[String]) -> Result<Aggregation> {
    if names.is_empty() {
        return Ok(Aggregation::empty());
    }

    let names_json = serde_json::to_string(names)?;
    let mut stmt = conn.prepare(
        "SELECT v.variant_name, v.MTE
         FROM variants v
         WHERE LOWER(TRIM(v.variant_name)) IN (
             SELECT LOWER(TRIM(value)) FROM json_each(?1)
         )",
    )?;
    let rows = stmt
        .query_map([names_json], |row| {
            Ok((row.get::<_, Value>(0)?, row.get::<_, Value>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let variants = to_variants(rows)?;
    let total: f64 = variants.iter().map(|variant| variant.mte).sum();
    debug!(matched = variants.len(), total, "variants aggregated");

    Ok(Aggregation {
        overall_mte: round_total(total),
        variants,
        total,
    })
}

/// Rounds to [`TOTAL_DECIMALS`] places, half away from zero.
pub fn round_total(value: f64) -> f64 {
    let factor = 10f64.powi(TOTAL_DECIMALS);
    (value * factor).round() / factor
}
