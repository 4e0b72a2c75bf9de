//! Convenience helpers shared across command handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use idcards::{Record, RecordBody, RecordStore};

use crate::cli::common::SelectionArgs;

/// Load a records file into a fresh store, dropping records that fail validation.
pub fn load_store(path: &Path) -> Result<RecordStore> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let bodies: Vec<RecordBody> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse records in {}", path.display()))?;
    let total = bodies.len();
    let mut accepted = Vec::with_capacity(total);
    for (idx, body) in bodies.into_iter().enumerate() {
        match body.validate() {
            Ok(()) => accepted.push(body),
            Err(err) => tracing::warn!(index = idx, %err, "record rejected"),
        }
    }
    let rejected = total - accepted.len();
    if rejected > 0 {
        eprintln!("Rejected {} of {} records in {}", rejected, total, path.display());
    }
    let mut store = RecordStore::new();
    store.insert_many(accepted);
    Ok(store)
}

/// Apply the category/year filter, treating `all` as every record.
pub fn select<'a>(store: &'a RecordStore, args: &SelectionArgs) -> Vec<&'a Record> {
    if !args.category.eq_ignore_ascii_case("all") {
        return store.by_category_and_year(&args.category, &args.year);
    }
    if args.year == idcards::store::ALL_YEARS {
        return store.all();
    }
    // only students carry a year
    store.by_category_and_year("student", &args.year)
}

/// Look a record up by roll number or faculty ID.
pub fn find<'a>(store: &'a RecordStore, key: &str) -> Result<&'a Record> {
    store
        .find_by_natural_key(key)
        .ok_or_else(|| anyhow!("no record with roll number or faculty ID '{}'", key))
}
