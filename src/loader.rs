use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::{MteError, Result};
use crate::io::excel_read;
use crate::model::SheetTable;
use crate::schema::{MODELS_SHEET, MODULES_SHEET, VARIANTS_SHEET};
use crate::store::{self, Store};

/// What [`ensure_store`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The store file was already present and left untouched.
    Existing,
    /// The store was built from the workbook.
    Created(LoadSummary),
}

/// Row counts of a freshly hydrated store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub modules: u64,
    pub models: u64,
    pub variants: u64,
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadOutcome::Existing => write!(f, "using existing database"),
            LoadOutcome::Created(summary) => write!(
                f,
                "database created: {} modules, {} models, {} variants",
                summary.modules, summary.models, summary.variants
            ),
        }
    }
}

/// Builds the store from the configured workbook unless the store file
/// already exists.
///
/// The workbook is fully read and validated before the store is touched, and
/// the tables are written to a staging file that only replaces the target
/// path once every table has been committed.
#[instrument(
    level = "info",
    skip_all,
    fields(
        database = %config.database_path.display(),
        workbook = %config.workbook_path.display()
    )
)]
pub fn ensure_store(config: &Config) -> Result<LoadOutcome> {
    let store = Store::new(&config.database_path);
    if store.exists() {
        info!("using existing database");
        return Ok(LoadOutcome::Existing);
    }
    if !config.workbook_path.exists() {
        return Err(MteError::MissingInput(config.workbook_path.clone()));
    }

    info!("creating database from workbook");
    let tables = excel_read::read_tables(&config.workbook_path)?;

    let staging = staging_path(store.path());
    let summary = match build_database(&staging, &tables) {
        Ok(summary) => summary,
        Err(error) => {
            if staging.exists() {
                if let Err(cleanup) = fs::remove_file(&staging) {
                    warn!(error = %cleanup, path = %staging.display(), "failed to remove staging file");
                }
            }
            return Err(error);
        }
    };
    fs::rename(&staging, store.path())?;

    info!(
        modules = summary.modules,
        models = summary.models,
        variants = summary.variants,
        "database created"
    );
    Ok(LoadOutcome::Created(summary))
}

fn build_database(path: &Path, tables: &[SheetTable]) -> Result<LoadSummary> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if path.exists() {
        fs::remove_file(path)?;
    }
    let mut conn = Connection::open(path)?;
    store::write_tables(&mut conn, tables)?;
    let summary = LoadSummary {
        modules: store::count_rows(&conn, MODULES_SHEET)?,
        models: store::count_rows(&conn, MODELS_SHEET)?,
        variants: store::count_rows(&conn, VARIANTS_SHEET)?,
    };
    conn.close().map_err(|(_, error)| MteError::from(error))?;
    Ok(summary)
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".loading");
    PathBuf::from(name)
}
