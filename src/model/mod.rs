use serde::{Deserialize, Serialize};

use crate::schema::ColumnKind;

/// A single cell as it is written to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }
}

/// Column of a hydrated table. Columns that the schema does not declare are
/// carried as text.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A sheet read from the workbook, ready to be materialised as a table.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<CellValue>>,
}

/// A variant and its stored MTE value, in the wire shape used by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantMte {
    #[serde(rename = "variant_name")]
    pub name: String,
    #[serde(rename = "MTE")]
    pub mte: f64,
}

impl VariantMte {
    pub fn new(name: impl Into<String>, mte: f64) -> Self {
        Self {
            name: name.into(),
            mte,
        }
    }
}

/// Result of resolving a list of variant names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Sum of the matched MTE values, rounded to three decimal places.
    pub overall_mte: f64,
    /// Matched variants in storage order.
    pub variants: Vec<VariantMte>,
    /// Unrounded sum.
    #[serde(skip)]
    pub total: f64,
}

impl Aggregation {
    pub fn empty() -> Self {
        Self {
            overall_mte: 0.0,
            variants: Vec::new(),
            total: 0.0,
        }
    }
}
