use crate::favorites::{Favorite, FavoritesStore};
use crate::lock::LockFile;
use crate::output::FavoritesResult;
use anyhow::{anyhow, Context, Result};
use std::path::Path;

pub fn favorites_list_operation(data_dir: &Path) -> Result<FavoritesResult> {
    let store = FavoritesStore::load(data_dir)?;
    Ok(FavoritesResult {
        favorites: store.list().to_vec(),
    })
}

pub fn favorites_get_operation(id_or_alias: &str, data_dir: &Path) -> Result<Favorite> {
    let store = FavoritesStore::load(data_dir)?;
    store
        .get(id_or_alias)
        .cloned()
        .ok_or_else(|| anyhow!("Invalid favorite ID or alias: {}", id_or_alias))
}

pub fn favorites_add_operation(
    command: Vec<String>,
    alias: Option<String>,
    data_dir: &Path,
) -> Result<Favorite> {
    let _lock = lock(data_dir)?;
    let mut store = FavoritesStore::load(data_dir)?;
    store.add(command, alias)
}

pub fn favorites_remove_operation(id_or_alias: &str, data_dir: &Path) -> Result<Favorite> {
    let _lock = lock(data_dir)?;
    let mut store = FavoritesStore::load(data_dir)?;
    store.remove(id_or_alias)
}

/// Set or clear the alias of favorite `id`
pub fn favorites_alias_operation(id: u64, alias: Option<String>, data_dir: &Path) -> Result<()> {
    let _lock = lock(data_dir)?;
    let mut store = FavoritesStore::load(data_dir)?;
    store.set_alias(id, alias)
}

fn lock(data_dir: &Path) -> Result<LockFile> {
    LockFile::acquire(data_dir).context("Failed to acquire lock for favorites operation")
}
