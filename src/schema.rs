//! Declared layout of the source workbook and of the tables it hydrates.
//!
//! Each sheet must carry at least the columns listed here. Additional columns
//! are copied through as text.

/// Sheet (and table) holding the top level of the hierarchy.
pub const MODULES_SHEET: &str = "modules";
/// Sheet (and table) holding models, each pointing at a module.
pub const MODELS_SHEET: &str = "models";
/// Sheet (and table) holding variants and their MTE values.
pub const VARIANTS_SHEET: &str = "variants";

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Real,
}

impl ColumnKind {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Real => "REAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn text(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Text,
    }
}

const fn real(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Real,
    }
}

/// Required columns of one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetSchema {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl SheetSchema {
    /// Looks up a declared column by header, ignoring ASCII case.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }
}

pub const MODULES: SheetSchema = SheetSchema {
    name: MODULES_SHEET,
    columns: &[text("module_id"), text("module_name")],
};

pub const MODELS: SheetSchema = SheetSchema {
    name: MODELS_SHEET,
    columns: &[text("model_id"), text("module_id"), text("model_name")],
};

pub const VARIANTS: SheetSchema = SheetSchema {
    name: VARIANTS_SHEET,
    columns: &[text("model_id"), text("variant_name"), real("MTE")],
};

/// Every sheet the loader requires, in load order.
pub const SHEETS: [SheetSchema; 3] = [MODULES, MODELS, VARIANTS];
