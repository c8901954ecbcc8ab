//! Catalog tree assembler: turns the multi-parent association graph into a
//! single-parent node tree plus secondary cross-link edges.
//!
//! Entities with many-to-many membership (a project in several themes, a
//! product in several projects) still need exactly one filesystem location.
//! The tie-break is deterministic: the lexicographically smallest
//! referenced id owns the structural edge, every other membership becomes
//! a non-owning `related` link pair on both sides.

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

use crate::{
    entity::{EntityKind, EntityStore},
    error::CatenaError,
    relations::AssociationIndex,
};

/// Index of a node within its [`CatalogTree`] arena.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub usize);

/// Discriminant for derived catalog nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    ThemeCollection,
    ProjectCollection,
    ProductItem,
    VariableCollection,
    VariableItem,
}

impl NodeKind {
    /// The `type` discriminant emitted into the node's output document.
    pub fn document_type(&self) -> &'static str {
        match self {
            NodeKind::Root => "Catalog",
            NodeKind::ThemeCollection => "Theme",
            NodeKind::ProjectCollection => "Project",
            NodeKind::ProductItem => "Product",
            NodeKind::VariableCollection => "Variables",
            NodeKind::VariableItem => "Variable",
        }
    }

    /// Source collection this node kind was derived from, if any.
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            NodeKind::Root | NodeKind::VariableCollection => None,
            NodeKind::ThemeCollection => Some(EntityKind::Theme),
            NodeKind::ProjectCollection => Some(EntityKind::Project),
            NodeKind::ProductItem => Some(EntityKind::Product),
            NodeKind::VariableItem => Some(EntityKind::Variable),
        }
    }

    /// Whether a structural child of this kind is linked from its parent
    /// as an aggregating `child` or a leaf `item`.
    fn child_relation(&self) -> Relation {
        match self {
            NodeKind::ProductItem | NodeKind::VariableItem => Relation::Item,
            _ => Relation::Child,
        }
    }
}

/// Typed link relations, serialized in their hypertext spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relation {
    #[serde(rename = "self")]
    SelfRef,
    Root,
    Parent,
    Child,
    Item,
    Related,
    DerivedFrom,
    Alternate,
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rel = match self {
            Relation::SelfRef => "self",
            Relation::Root => "root",
            Relation::Parent => "parent",
            Relation::Child => "child",
            Relation::Item => "item",
            Relation::Related => "related",
            Relation::DerivedFrom => "derived-from",
            Relation::Alternate => "alternate",
        };
        write!(f, "{rel}")
    }
}

/// What a link points at before href resolution: another node of the same
/// tree, or a root-relative artifact path (metrics document, ISO
/// companion) that resolves by the same rules as a node path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LinkTarget {
    Node(NodeId),
    Artifact(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: Relation,
    pub target: LinkTarget,
    pub title: Option<String>,
    /// Concrete hyperlink, filled in by href resolution.
    pub href: Option<String>,
}

impl Link {
    pub fn to_node(rel: Relation, target: NodeId, title: Option<String>) -> Self {
        Link {
            rel,
            target: LinkTarget::Node(target),
            title,
            href: None,
        }
    }
}

/// A derived catalog node. Created during assembly; path and hrefs are
/// finalized during href resolution; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogNode {
    pub kind: NodeKind,
    /// Identifier borrowed from the source entity. Root and the variable
    /// aggregate have none.
    pub id: Option<String>,
    pub title: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub links: Vec<Link>,
    /// Output-root-relative path, assigned exactly once.
    pub path: Option<String>,
}

impl CatalogNode {
    fn new(kind: NodeKind, id: Option<String>, title: String) -> Self {
        CatalogNode {
            kind,
            id,
            title,
            parent: None,
            children: Vec::new(),
            links: Vec::new(),
            path: None,
        }
    }

    /// Display label used in diagnostics.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => format!("{:?}({id})", self.kind),
            None => format!("{:?}", self.kind),
        }
    }
}

/// Arena-backed single-parent tree with secondary link edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogTree {
    nodes: Vec<CatalogNode>,
    pub root: NodeId,
}

impl CatalogTree {
    fn push(&mut self, node: CatalogNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &CatalogNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut CatalogNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &CatalogNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Make `child` a structural child of `parent`, mirroring the edge as
    /// a link pair so href resolution rewrites one uniform list.
    ///
    /// A node may only ever be attached once. A second attachment is not
    /// bad input (references were validated upstream) but an engine
    /// defect, reported with both node labels.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), CatenaError> {
        if let Some(existing) = self.node(child).parent {
            return Err(CatenaError::Internal(format!(
                "{} already owned by {}, refusing second owner {}",
                self.node(child).label(),
                self.node(existing).label(),
                self.node(parent).label(),
            )));
        }
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);

        let child_rel = self.node(child).kind.child_relation();
        let child_title = Some(self.node(child).title.clone());
        let parent_title = Some(self.node(parent).title.clone());
        let root_title = Some(self.node(self.root).title.clone());
        let root = self.root;

        self.node_mut(parent)
            .links
            .push(Link::to_node(child_rel, child, child_title));
        let child_node = self.node_mut(child);
        child_node
            .links
            .push(Link::to_node(Relation::Parent, parent, parent_title));
        child_node
            .links
            .push(Link::to_node(Relation::Root, root, root_title));
        Ok(())
    }

    /// Add a symmetric non-structural `related` link pair between `a` and
    /// `b`.
    fn relate(&mut self, a: NodeId, b: NodeId) {
        let b_title = Some(self.node(b).title.clone());
        let a_title = Some(self.node(a).title.clone());
        self.node_mut(a)
            .links
            .push(Link::to_node(Relation::Related, b, b_title));
        self.node_mut(b)
            .links
            .push(Link::to_node(Relation::Related, a, a_title));
    }
}

/// Assemble the catalog tree from a validated store and its association
/// index.
///
/// References were checked by [`crate::relations::resolve`]; any lookup
/// failure here is therefore an internal fault rather than an input error.
pub fn assemble(
    store: &EntityStore,
    index: &AssociationIndex,
) -> Result<CatalogTree, CatenaError> {
    let mut tree = CatalogTree::default();
    let root = tree.push(CatalogNode::new(
        NodeKind::Root,
        None,
        "Catalog".to_string(),
    ));
    tree.root = root;
    // The root links to itself so every document, root included, carries
    // the same root/self pair.
    tree.node_mut(root).links.push(Link::to_node(
        Relation::Root,
        root,
        Some("Catalog".to_string()),
    ));

    let mut theme_nodes = BTreeMap::new();
    for theme in store.themes.values() {
        let node = tree.push(CatalogNode::new(
            NodeKind::ThemeCollection,
            Some(theme.id.clone()),
            theme.title.clone(),
        ));
        tree.attach(root, node)?;
        theme_nodes.insert(theme.id.clone(), node);
    }

    let variable_collection = tree.push(CatalogNode::new(
        NodeKind::VariableCollection,
        None,
        "Variables".to_string(),
    ));
    tree.attach(root, variable_collection)?;

    let mut variable_nodes = BTreeMap::new();
    for variable in store.variables.values() {
        let node = tree.push(CatalogNode::new(
            NodeKind::VariableItem,
            Some(variable.id.clone()),
            variable.title.clone(),
        ));
        tree.attach(variable_collection, node)?;
        variable_nodes.insert(variable.id.clone(), node);
    }

    let missing = |kind: &str, id: &str| {
        CatenaError::Internal(format!("validated {kind} '{id}' vanished during assembly"))
    };

    let mut project_nodes = BTreeMap::new();
    for project in store.projects.values() {
        let node = tree.push(CatalogNode::new(
            NodeKind::ProjectCollection,
            Some(project.id.clone()),
            project.title.clone(),
        ));
        // Smallest referenced theme id wins ownership; BTreeSet iteration
        // order makes `first` the canonical owner.
        let mut theme_ids = project.themes.iter();
        let canonical = theme_ids.next().ok_or_else(|| {
            CatenaError::Internal(format!("project '{}' has no theme references", project.id))
        })?;
        let owner = *theme_nodes
            .get(canonical)
            .ok_or_else(|| missing("theme", canonical))?;
        tree.attach(owner, node)?;
        for theme_id in theme_ids {
            let theme_node = *theme_nodes
                .get(theme_id)
                .ok_or_else(|| missing("theme", theme_id))?;
            tree.relate(theme_node, node);
        }
        project_nodes.insert(project.id.clone(), node);
    }

    for product in store.products.values() {
        let node = tree.push(CatalogNode::new(
            NodeKind::ProductItem,
            Some(product.id.clone()),
            product.title.clone(),
        ));
        let mut project_ids = product.projects.iter();
        let canonical = project_ids.next().ok_or_else(|| {
            CatenaError::Internal(format!("product '{}' has no project references", product.id))
        })?;
        let owner = *project_nodes
            .get(canonical)
            .ok_or_else(|| missing("project", canonical))?;
        tree.attach(owner, node)?;
        for project_id in project_ids {
            let project_node = *project_nodes
                .get(project_id)
                .ok_or_else(|| missing("project", project_id))?;
            tree.relate(project_node, node);
        }
        // Forward edges to measured variables; the reverse `related` link
        // accumulates on each variable in product order.
        if let Some(variable_ids) = index.product_variables.targets_of(&product.id) {
            for variable_id in variable_ids {
                let variable_node = *variable_nodes
                    .get(variable_id)
                    .ok_or_else(|| missing("variable", variable_id))?;
                let variable_title = Some(tree.node(variable_node).title.clone());
                let product_title = Some(tree.node(node).title.clone());
                tree.node_mut(node).links.push(Link::to_node(
                    Relation::DerivedFrom,
                    variable_node,
                    variable_title,
                ));
                tree.node_mut(variable_node).links.push(Link::to_node(
                    Relation::Related,
                    node,
                    product_title,
                ));
            }
        }
    }

    tracing::debug!("assembled catalog tree with {} nodes", tree.len());
    Ok(tree)
}
