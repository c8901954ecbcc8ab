//! Catalog-level summary document, published as `metrics.json` beside the
//! root catalog and referenced from it via an `alternate` link.
//!
//! Counts only — no timestamps, so identical inputs produce a
//! byte-identical document.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::{entity::EntityStore, relations::AssociationIndex};

/// Per-collection counts plus a per-theme breakdown, all in ascending id
/// order.
pub fn build_metrics(store: &EntityStore, index: &AssociationIndex) -> Value {
    let themes: Vec<Value> = store
        .themes
        .values()
        .map(|theme| {
            let project_ids: Vec<&String> = index
                .project_themes
                .owners_of(&theme.id)
                .map(|owners| owners.iter().collect())
                .unwrap_or_default();
            let product_ids: BTreeSet<&String> = project_ids
                .iter()
                .filter_map(|project_id| index.product_projects.owners_of(project_id))
                .flatten()
                .collect();
            json!({
                "id": theme.id,
                "title": theme.title,
                "projects": project_ids,
                "products": product_ids,
            })
        })
        .collect();

    json!({
        "id": "catalog",
        "summary": {
            "themes": store.themes.len(),
            "projects": store.projects.len(),
            "products": store.products.len(),
            "variables": store.variables.len(),
        },
        "themes": themes,
    })
}
