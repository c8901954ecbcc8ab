//! Typed records for the four entity collections and the [`EntityStore`]
//! that holds them.
//!
//! Records arrive from the loader already type-coerced; the only
//! validation performed here is duplicate-identifier rejection. Free-form
//! attributes are captured verbatim in a flattened map and passed through
//! to the output documents untouched.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error::CatenaError, paths::slugify};

/// Discriminant for the four input collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Theme,
    Project,
    Product,
    Variable,
}

impl EntityKind {
    /// Directory name grouping records of this kind, both in the input
    /// data directory and in the published catalog layout.
    pub fn directory(&self) -> &'static str {
        match self {
            EntityKind::Theme => "themes",
            EntityKind::Project => "projects",
            EntityKind::Product => "products",
            EntityKind::Variable => "variables",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Theme => "theme",
            EntityKind::Project => "project",
            EntityKind::Product => "product",
            EntityKind::Variable => "variable",
        };
        write!(f, "{name}")
    }
}

/// A top-level grouping of the catalog. No outgoing references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// An initiative belonging to one or more themes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    /// Referenced theme ids. At least one; the smallest becomes the
    /// structural owner during assembly.
    pub themes: BTreeSet<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A concrete deliverable belonging to one or more projects, optionally
/// measuring a set of variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub projects: BTreeSet<String>,
    #[serde(default)]
    pub variables: BTreeSet<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A measured quantity. Incoming references only, from products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Validated, immutable record collections keyed by identifier.
///
/// `BTreeMap` keys give iteration-in-ascending-id-order for free, which
/// every downstream stage relies on for deterministic output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityStore {
    pub themes: BTreeMap<String, Theme>,
    pub projects: BTreeMap<String, Project>,
    pub products: BTreeMap<String, Product>,
    pub variables: BTreeMap<String, Variable>,
}

/// Every record id must survive slugging, or the record has no place in
/// the published layout.
fn usable_id(kind: EntityKind, id: &str) -> Result<(), CatenaError> {
    if slugify(id).is_empty() {
        return Err(CatenaError::Invalid(format!(
            "{kind} '{id}' yields no usable path segment"
        )));
    }
    Ok(())
}

impl EntityStore {
    /// Insert a record, rejecting duplicate or unusable identifiers and
    /// empty required reference sets. The loader is the primary guard;
    /// this re-check keeps the store trustworthy even when populated
    /// programmatically.
    pub fn insert_theme(&mut self, theme: Theme) -> Result<(), CatenaError> {
        usable_id(EntityKind::Theme, &theme.id)?;
        if self.themes.contains_key(&theme.id) {
            return Err(CatenaError::Duplicate(format!("theme '{}'", theme.id)));
        }
        self.themes.insert(theme.id.clone(), theme);
        Ok(())
    }

    pub fn insert_project(&mut self, project: Project) -> Result<(), CatenaError> {
        usable_id(EntityKind::Project, &project.id)?;
        if project.themes.is_empty() {
            return Err(CatenaError::Invalid(format!(
                "project '{}' references no themes",
                project.id
            )));
        }
        if self.projects.contains_key(&project.id) {
            return Err(CatenaError::Duplicate(format!("project '{}'", project.id)));
        }
        self.projects.insert(project.id.clone(), project);
        Ok(())
    }

    pub fn insert_product(&mut self, product: Product) -> Result<(), CatenaError> {
        usable_id(EntityKind::Product, &product.id)?;
        if product.projects.is_empty() {
            return Err(CatenaError::Invalid(format!(
                "product '{}' references no projects",
                product.id
            )));
        }
        if self.products.contains_key(&product.id) {
            return Err(CatenaError::Duplicate(format!("product '{}'", product.id)));
        }
        self.products.insert(product.id.clone(), product);
        Ok(())
    }

    pub fn insert_variable(&mut self, variable: Variable) -> Result<(), CatenaError> {
        usable_id(EntityKind::Variable, &variable.id)?;
        if self.variables.contains_key(&variable.id) {
            return Err(CatenaError::Duplicate(format!(
                "variable '{}'",
                variable.id
            )));
        }
        self.variables.insert(variable.id.clone(), variable);
        Ok(())
    }

    pub fn title(&self, kind: EntityKind, id: &str) -> Option<&str> {
        match kind {
            EntityKind::Theme => self.themes.get(id).map(|t| t.title.as_str()),
            EntityKind::Project => self.projects.get(id).map(|p| p.title.as_str()),
            EntityKind::Product => self.products.get(id).map(|p| p.title.as_str()),
            EntityKind::Variable => self.variables.get(id).map(|v| v.title.as_str()),
        }
    }

    pub fn attributes(&self, kind: EntityKind, id: &str) -> Option<&Map<String, Value>> {
        match kind {
            EntityKind::Theme => self.themes.get(id).map(|t| &t.attributes),
            EntityKind::Project => self.projects.get(id).map(|p| &p.attributes),
            EntityKind::Product => self.products.get(id).map(|p| &p.attributes),
            EntityKind::Variable => self.variables.get(id).map(|v| &v.attributes),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
            && self.projects.is_empty()
            && self.products.is_empty()
            && self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme(id: &str) -> Theme {
        Theme {
            id: id.to_string(),
            title: id.to_uppercase(),
            attributes: Map::new(),
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut store = EntityStore::default();
        store.insert_theme(theme("land")).unwrap();
        let err = store.insert_theme(theme("land")).unwrap_err();
        assert_eq!(err, CatenaError::Duplicate("theme 'land'".to_string()));
        assert_eq!(store.themes.len(), 1);
    }

    #[test]
    fn empty_reference_sets_are_bad_input() {
        let mut store = EntityStore::default();
        store.insert_theme(theme("land")).unwrap();
        let err = store
            .insert_project(Project {
                id: "p0".to_string(),
                title: "Project Zero".to_string(),
                themes: BTreeSet::new(),
                attributes: Map::new(),
            })
            .unwrap_err();
        assert_eq!(
            err,
            CatenaError::Invalid("project 'p0' references no themes".to_string())
        );

        let err = store
            .insert_product(Product {
                id: "prod0".to_string(),
                title: "Product Zero".to_string(),
                projects: BTreeSet::new(),
                variables: BTreeSet::new(),
                attributes: Map::new(),
            })
            .unwrap_err();
        assert_eq!(
            err,
            CatenaError::Invalid("product 'prod0' references no projects".to_string())
        );
    }

    #[test]
    fn ids_that_slug_to_nothing_are_bad_input() {
        let mut store = EntityStore::default();
        let err = store.insert_theme(theme("!!!")).unwrap_err();
        assert!(matches!(err, CatenaError::Invalid(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn attributes_pass_through_deserialization() {
        let record: Theme = serde_json::from_str(
            r#"{"id": "land", "title": "Land", "image": "land.png", "rank": 3}"#,
        )
        .unwrap();
        assert_eq!(record.attributes.get("image").unwrap(), "land.png");
        assert_eq!(record.attributes.get("rank").unwrap(), 3);
        assert!(!record.attributes.contains_key("id"));
    }
}
