//! Core library for the MTE lookup and aggregation service.
//!
//! A spreadsheet with `modules`, `models` and `variants` sheets is hydrated
//! once into a SQLite store ([`loader`]). The store then answers hierarchical
//! lookups ([`lookup`]) and sums the MTE values of submitted variants
//! ([`aggregate`]). Results are forwarded to Airtable on a best-effort basis
//! ([`sync`]) and everything is exposed as a JSON API ([`server`]).

pub mod aggregate;
pub mod config;
pub mod error;
pub mod io;
pub mod loader;
pub mod lookup;
pub mod model;
pub mod schema;
pub mod server;
pub mod store;
pub mod sync;

pub use config::{AirtableConfig, Config};
pub use error::{MteError, Result};
pub use loader::{LoadOutcome, LoadSummary, ensure_store};
pub use model::{Aggregation, VariantMte};
pub use store::Store;
pub use sync::{AirtableClient, SyncStatus};
