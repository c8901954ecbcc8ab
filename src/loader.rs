//! Loader boundary: reads one JSON document per record from the data
//! directory into an [`EntityStore`].
//!
//! Layout mirrors the published catalog: `<data_dir>/themes/*.json`,
//! `projects/`, `products/`, `variables/`. Thin I/O with no cross-record
//! logic; dangling references are the relationship resolver's concern,
//! duplicate identifiers are rejected here.

use std::{fs::read_to_string, path::Path};

use serde::de::DeserializeOwned;
use walkdir::WalkDir;

use crate::{
    entity::{EntityKind, EntityStore, Product, Project, Theme, Variable},
    error::CatenaError,
};

fn load_records<T, F>(
    data_dir: &Path,
    kind: EntityKind,
    mut insert: F,
) -> Result<(), CatenaError>
where
    T: DeserializeOwned,
    F: FnMut(T) -> Result<(), CatenaError>,
{
    let dir = data_dir.join(kind.directory());
    if !dir.is_dir() {
        tracing::warn!("no {} directory at {:?}, treating as empty", kind, dir);
        return Ok(());
    }
    for entry in WalkDir::new(&dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        tracing::debug!("loading {} record from {:?}", kind, path);
        let content = read_to_string(path)?;
        let record: T = serde_json::from_str(&content).map_err(|e| {
            CatenaError::Serialization(format!("{}: {e}", path.display()))
        })?;
        insert(record)?;
    }
    Ok(())
}

/// Load all four collections from `data_dir`. Missing collection
/// directories load as empty; duplicate identifiers abort.
pub fn load_store<P: AsRef<Path>>(data_dir: P) -> Result<EntityStore, CatenaError> {
    let data_dir = data_dir.as_ref();
    let mut store = EntityStore::default();
    load_records::<Theme, _>(data_dir, EntityKind::Theme, |t| store.insert_theme(t))?;
    load_records::<Project, _>(data_dir, EntityKind::Project, |p| store.insert_project(p))?;
    load_records::<Product, _>(data_dir, EntityKind::Product, |p| store.insert_product(p))?;
    load_records::<Variable, _>(data_dir, EntityKind::Variable, |v| store.insert_variable(v))?;
    tracing::debug!(
        "loaded {} themes, {} projects, {} products, {} variables from {:?}",
        store.themes.len(),
        store.projects.len(),
        store.products.len(),
        store.variables.len(),
        data_dir,
    );
    Ok(store)
}
