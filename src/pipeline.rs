//! Build orchestration: load → resolve relationships → assemble tree →
//! resolve hrefs → serialize.
//!
//! Single-threaded, synchronous; each stage consumes the immutable output
//! of the previous one. Referential integrity is settled before anything
//! touches the output directory, so a failed validation produces no
//! partial artifacts.

use std::path::Path;

use crate::{
    config::BuildConfig,
    entity::EntityStore,
    error::CatenaError,
    loader::load_store,
    metrics::build_metrics,
    paths::resolve_hrefs,
    relations::{resolve, AssociationIndex},
    tree::assemble,
    writer::{write_catalog, write_json, BasicIsoRenderer, IsoRenderer},
};

/// Counters reported after a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    pub nodes: usize,
    pub files_written: usize,
}

/// Load the data directory and check referential integrity without
/// producing any output.
pub fn validate<P: AsRef<Path>>(
    data_dir: P,
) -> Result<(EntityStore, AssociationIndex), CatenaError> {
    let store = load_store(data_dir)?;
    let index = resolve(&store).map_err(CatenaError::Integrity)?;
    Ok((store, index))
}

/// Run the full pipeline with the built-in ISO renderer.
pub fn build<P: AsRef<Path>, Q: AsRef<Path>>(
    data_dir: P,
    out_dir: Q,
    config: &BuildConfig,
) -> Result<BuildStats, CatenaError> {
    build_with_renderer(data_dir, out_dir, config, &BasicIsoRenderer)
}

/// Run the full pipeline with a caller-supplied ISO renderer.
pub fn build_with_renderer<P: AsRef<Path>, Q: AsRef<Path>>(
    data_dir: P,
    out_dir: Q,
    config: &BuildConfig,
    renderer: &dyn IsoRenderer,
) -> Result<BuildStats, CatenaError> {
    let out_dir = out_dir.as_ref();
    let (store, index) = validate(data_dir)?;

    let mut tree = assemble(&store, &index)?;
    resolve_hrefs(&mut tree, config)?;

    std::fs::create_dir_all(out_dir)?;
    let metrics = build_metrics(&store, &index);
    write_json(&out_dir.join("metrics.json"), &metrics, config.pretty_print)?;
    let files_written = write_catalog(&tree, &store, config, out_dir, renderer)? + 1;

    tracing::info!(
        "built catalog: {} nodes, {} files under {:?}",
        tree.len(),
        files_written,
        out_dir
    );
    Ok(BuildStats {
        nodes: tree.len(),
        files_written,
    })
}
