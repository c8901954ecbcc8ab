//! Relationship resolver: derives bidirectional association indices
//! between the entity collections and checks referential integrity.
//!
//! Every dangling reference is accumulated into the error list rather than
//! aborting on the first, so a single run reports every problem. The index
//! is only handed out when the input is referentially closed.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    entity::{EntityKind, EntityStore},
    error::IntegrityError,
};

/// One many-to-many relation pair, indexed in both directions. Ordered
/// maps and sets keep iteration deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Association {
    /// Owner id → ordered set of referenced target ids.
    pub forward: BTreeMap<String, BTreeSet<String>>,
    /// Target id → ordered set of owner ids referencing it.
    pub reverse: BTreeMap<String, BTreeSet<String>>,
}

impl Association {
    fn record(&mut self, owner: &str, target: &str) {
        self.forward
            .entry(owner.to_string())
            .or_default()
            .insert(target.to_string());
        self.reverse
            .entry(target.to_string())
            .or_default()
            .insert(owner.to_string());
    }

    pub fn targets_of(&self, owner: &str) -> Option<&BTreeSet<String>> {
        self.forward.get(owner)
    }

    pub fn owners_of(&self, target: &str) -> Option<&BTreeSet<String>> {
        self.reverse.get(target)
    }
}

/// The three derived relation pairs of the catalog graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociationIndex {
    /// Project → Themes (and Theme → Projects in reverse).
    pub project_themes: Association,
    /// Product → Projects (and Project → Products in reverse).
    pub product_projects: Association,
    /// Product → Variables (and Variable → Products in reverse).
    pub product_variables: Association,
}

/// Build the association index over `store`, verifying that every
/// reference resolves in its target collection.
///
/// Pure function: no side effects beyond trace output. Returns the index
/// only when the accumulated error list is empty; callers must treat a
/// non-empty list as build-aborting.
pub fn resolve(store: &EntityStore) -> Result<AssociationIndex, Vec<IntegrityError>> {
    let mut index = AssociationIndex::default();
    let mut errors = Vec::new();

    for project in store.projects.values() {
        for theme_id in &project.themes {
            if store.themes.contains_key(theme_id) {
                index.project_themes.record(&project.id, theme_id);
            } else {
                errors.push(IntegrityError {
                    collection: EntityKind::Theme,
                    entity_id: project.id.clone(),
                    missing_id: theme_id.clone(),
                });
            }
        }
    }

    for product in store.products.values() {
        for project_id in &product.projects {
            if store.projects.contains_key(project_id) {
                index.product_projects.record(&product.id, project_id);
            } else {
                errors.push(IntegrityError {
                    collection: EntityKind::Project,
                    entity_id: product.id.clone(),
                    missing_id: project_id.clone(),
                });
            }
        }
        for variable_id in &product.variables {
            if store.variables.contains_key(variable_id) {
                index.product_variables.record(&product.id, variable_id);
            } else {
                errors.push(IntegrityError {
                    collection: EntityKind::Variable,
                    entity_id: product.id.clone(),
                    missing_id: variable_id.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        tracing::debug!(
            "resolved associations: {} project-theme, {} product-project, {} product-variable",
            index.project_themes.forward.len(),
            index.product_projects.forward.len(),
            index.product_variables.forward.len(),
        );
        Ok(index)
    } else {
        tracing::debug!("resolution found {} integrity error(s)", errors.len());
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Product, Project, Theme, Variable};
    use serde_json::Map;

    fn sample_store() -> EntityStore {
        let mut store = EntityStore::default();
        for id in ["land", "oceans"] {
            store
                .insert_theme(Theme {
                    id: id.to_string(),
                    title: id.to_string(),
                    attributes: Map::new(),
                })
                .unwrap();
        }
        store
            .insert_project(Project {
                id: "p1".to_string(),
                title: "Project One".to_string(),
                themes: ["land", "oceans"].iter().map(|s| s.to_string()).collect(),
                attributes: Map::new(),
            })
            .unwrap();
        store
            .insert_variable(Variable {
                id: "v1".to_string(),
                title: "Variable One".to_string(),
                attributes: Map::new(),
            })
            .unwrap();
        store
            .insert_product(Product {
                id: "prod1".to_string(),
                title: "Product One".to_string(),
                projects: ["p1"].iter().map(|s| s.to_string()).collect(),
                variables: ["v1"].iter().map(|s| s.to_string()).collect(),
                attributes: Map::new(),
            })
            .unwrap();
        store
    }

    #[test]
    fn forward_and_reverse_indices_agree() {
        let store = sample_store();
        let index = resolve(&store).unwrap();

        let themes = index.project_themes.targets_of("p1").unwrap();
        assert_eq!(
            themes.iter().collect::<Vec<_>>(),
            vec!["land", "oceans"],
            "targets are ordered by ascending id"
        );
        assert!(index
            .project_themes
            .owners_of("oceans")
            .unwrap()
            .contains("p1"));
        assert!(index
            .product_variables
            .owners_of("v1")
            .unwrap()
            .contains("prod1"));
    }

    #[test]
    fn every_dangling_reference_is_accumulated() {
        let mut store = sample_store();
        store
            .insert_project(Project {
                id: "p2".to_string(),
                title: "Project Two".to_string(),
                themes: ["atmosphere"].iter().map(|s| s.to_string()).collect(),
                attributes: Map::new(),
            })
            .unwrap();
        store
            .insert_product(Product {
                id: "prod2".to_string(),
                title: "Product Two".to_string(),
                projects: ["p-missing"].iter().map(|s| s.to_string()).collect(),
                variables: ["v-missing"].iter().map(|s| s.to_string()).collect(),
                attributes: Map::new(),
            })
            .unwrap();

        let errors = resolve(&store).unwrap_err();
        assert_eq!(errors.len(), 3, "all problems reported in one run");
        assert!(errors.iter().any(|e| e.entity_id == "p2"
            && e.collection == EntityKind::Theme
            && e.missing_id == "atmosphere"));
        assert!(errors
            .iter()
            .any(|e| e.entity_id == "prod2" && e.missing_id == "p-missing"));
        assert!(errors
            .iter()
            .any(|e| e.entity_id == "prod2" && e.missing_id == "v-missing"));
    }

    #[test]
    fn empty_store_resolves_cleanly() {
        let index = resolve(&EntityStore::default()).unwrap();
        assert!(index.project_themes.forward.is_empty());
    }
}
