//! Href resolver: assigns every catalog node a deterministic path and
//! rewrites each link into a concrete hyperlink.
//!
//! With a configured root href every link is absolute (`root + path`, via
//! the `url` crate). Without one, links are tree-relative, computed by
//! walking up from the source to the lowest common ancestor directory and
//! back down to the target.

use std::collections::BTreeMap;

use url::Url;

use crate::{
    config::BuildConfig,
    error::CatenaError,
    tree::{CatalogTree, Link, LinkTarget, NodeId, NodeKind, Relation},
};

/// Turn an identifier into a path segment: lowercased, whitespace runs
/// become `-`, any other non-alphanumeric character is dropped.
///
/// The rule is deterministic but not injective ("a b" and "a-b" collide),
/// so [`resolve_hrefs`] verifies global path uniqueness after assignment.
pub fn slugify(id: &str) -> String {
    id.trim()
        .to_lowercase()
        .replace(char::is_whitespace, "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect()
}

/// The published layout: items of one kind grouped under a shared
/// type-qualified directory, with aggregate documents named
/// `catalog.json`.
pub fn layout_path(kind: NodeKind, id: Option<&str>) -> Result<String, CatenaError> {
    let slug = id.map(slugify);
    let segment = |slug: Option<String>, kind: NodeKind| {
        slug.ok_or_else(|| {
            CatenaError::Internal(format!("{kind:?} node has no source identifier"))
        })
    };
    Ok(match kind {
        NodeKind::Root => "catalog.json".to_string(),
        NodeKind::ThemeCollection => format!("themes/{}.json", segment(slug, kind)?),
        NodeKind::ProjectCollection => format!("projects/{}.json", segment(slug, kind)?),
        NodeKind::ProductItem => format!("products/{}.json", segment(slug, kind)?),
        NodeKind::VariableCollection => "variables/catalog.json".to_string(),
        NodeKind::VariableItem => format!("variables/{}.json", segment(slug, kind)?),
    })
}

/// Compute the tree-relative path from the document at `from` to the
/// document at `to`, both expressed relative to the output root.
///
/// One `../` per directory level from the source up to the lowest common
/// ancestor, then the descending remainder. `from == to` yields
/// `./<filename>`; ancestor and descendant targets fall out of the same
/// walk.
pub fn relative_path(from: &str, to: &str) -> Result<String, CatenaError> {
    if from.is_empty() || to.is_empty() || from.starts_with('/') || to.starts_with('/') {
        return Err(CatenaError::Internal(format!(
            "cannot relate '{from}' and '{to}': both must be non-empty root-relative paths"
        )));
    }
    if from == to {
        let filename = to.rsplit('/').next().unwrap_or(to);
        return Ok(format!("./{filename}"));
    }

    let from_dirs: Vec<&str> = from.split('/').collect();
    let from_dirs = &from_dirs[..from_dirs.len() - 1];
    let to_parts: Vec<&str> = to.split('/').collect();
    let to_dirs = &to_parts[..to_parts.len() - 1];

    let common = from_dirs
        .iter()
        .zip(to_dirs.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut pieces: Vec<&str> = Vec::new();
    for _ in common..from_dirs.len() {
        pieces.push("..");
    }
    pieces.extend(&to_parts[common..]);
    Ok(pieces.join("/"))
}

fn parse_base(root_href: &str) -> Result<Url, CatenaError> {
    // A trailing slash makes Url::join treat the root as a directory.
    let base = if root_href.ends_with('/') {
        root_href.to_string()
    } else {
        format!("{root_href}/")
    };
    Ok(Url::parse(&base)?)
}

/// The companion ISO artifact path for nodes that carry one, sitting in
/// an `iso/` directory beside the node's own document.
pub fn iso_companion(node_kind: NodeKind, path: &str) -> Option<String> {
    match node_kind {
        NodeKind::ProjectCollection | NodeKind::ProductItem => {
            let (dir, filename) = path.rsplit_once('/')?;
            let stem = filename.strip_suffix(".json")?;
            Some(format!("{dir}/iso/{stem}.xml"))
        }
        _ => None,
    }
}

fn push_artifact_link(node_links: &mut Vec<Link>, artifact: String, title: &str) {
    // Keeps resolution idempotent when run twice over the same tree.
    let exists = node_links.iter().any(|l| {
        l.rel == Relation::Alternate
            && matches!(&l.target, LinkTarget::Artifact(path) if *path == artifact)
    });
    if !exists {
        node_links.push(Link {
            rel: Relation::Alternate,
            target: LinkTarget::Artifact(artifact),
            title: Some(title.to_string()),
            href: None,
        });
    }
}

/// Finalize every node's path and rewrite its link list into concrete
/// hrefs.
///
/// Idempotent: resolving an already-resolved tree with the same
/// configuration reproduces identical paths and hrefs; a re-assignment
/// that would change an existing path is an internal fault.
pub fn resolve_hrefs(tree: &mut CatalogTree, config: &BuildConfig) -> Result<(), CatenaError> {
    // Depth-first path assignment with a global uniqueness check.
    let mut claimed: BTreeMap<String, NodeId> = BTreeMap::new();
    let mut stack = vec![tree.root];
    let mut visited = 0usize;
    while let Some(node_id) = stack.pop() {
        visited += 1;
        let node = tree.node(node_id);
        let path = layout_path(node.kind, node.id.as_deref())?;
        if let Some(existing) = &node.path {
            if *existing != path {
                return Err(CatenaError::Internal(format!(
                    "path of {} changed across resolutions: '{existing}' vs '{path}'",
                    node.label()
                )));
            }
        }
        if let Some(holder) = claimed.get(&path) {
            return Err(CatenaError::Internal(format!(
                "path collision on '{path}' between {} and {}",
                tree.node(*holder).label(),
                tree.node(node_id).label(),
            )));
        }
        claimed.insert(path.clone(), node_id);
        for child in tree.node(node_id).children.iter().rev() {
            stack.push(*child);
        }
        tree.node_mut(node_id).path = Some(path);
    }
    if visited != tree.len() {
        return Err(CatenaError::Internal(format!(
            "{} node(s) unreachable from the root",
            tree.len() - visited
        )));
    }

    // Companion artifact references, added before link rewriting so they
    // resolve by the same rules as node links.
    if config.add_iso {
        for idx in 0..tree.len() {
            let node_id = NodeId(idx);
            let node = tree.node(node_id);
            let Some(path) = node.path.clone() else { continue };
            if let Some(artifact) = iso_companion(node.kind, &path) {
                push_artifact_link(&mut tree.node_mut(node_id).links, artifact, "ISO metadata");
            }
        }
    }
    push_artifact_link(
        &mut tree.node_mut(tree.root).links,
        "metrics.json".to_string(),
        "Metrics",
    );

    let base = config.root_href().map(parse_base).transpose()?;

    // Rewrite: a `self` link heads each list, the assembly ordering of the
    // rest is preserved (observable output contract).
    let paths: Vec<Option<String>> = tree.iter().map(|(_, n)| n.path.clone()).collect();
    for idx in 0..tree.len() {
        let node_id = NodeId(idx);
        let own_path = paths[idx]
            .clone()
            .ok_or_else(|| CatenaError::Internal(format!("node {idx} has no assigned path")))?;

        let mut resolved = Vec::with_capacity(tree.node(node_id).links.len() + 1);
        let self_href = match &base {
            Some(base) => base.join(&own_path)?.to_string(),
            None => relative_path(&own_path, &own_path)?,
        };
        resolved.push(Link {
            rel: Relation::SelfRef,
            target: LinkTarget::Node(node_id),
            title: Some(tree.node(node_id).title.clone()),
            href: Some(self_href),
        });
        for link in &tree.node(node_id).links {
            if link.rel == Relation::SelfRef {
                continue;
            }
            let target_path = match &link.target {
                LinkTarget::Node(target) => paths[target.0].clone().ok_or_else(|| {
                    CatenaError::Internal(format!(
                        "link target {} has no assigned path",
                        tree.node(*target).label()
                    ))
                })?,
                LinkTarget::Artifact(path) => path.clone(),
            };
            let href = match &base {
                Some(base) => base.join(&target_path)?.to_string(),
                None => relative_path(&own_path, &target_path)?,
            };
            resolved.push(Link {
                href: Some(href),
                ..link.clone()
            });
        }
        tree.node_mut(node_id).links = resolved;
    }

    tracing::debug!(
        "resolved hrefs for {} nodes ({})",
        tree.len(),
        match &base {
            Some(base) => format!("absolute under {base}"),
            None => "tree-relative".to_string(),
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_rule() {
        assert_eq!(slugify("Sea Ice Thickness"), "sea-ice-thickness");
        assert_eq!(slugify("  Land  "), "land");
        assert_eq!(slugify("CO2 (flux)"), "co2-flux");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
        // Case insensitive and deterministic
        assert_eq!(slugify("OCEANS"), slugify("oceans"));
    }

    #[test]
    fn relative_path_between_sibling_directories() {
        // One level up from products/ to the output root, then down into
        // variables/.
        assert_eq!(
            relative_path("products/prod1.json", "variables/v1.json").unwrap(),
            "../variables/v1.json"
        );
    }

    #[test]
    fn relative_path_degenerate_cases() {
        // source == target
        assert_eq!(
            relative_path("products/prod1.json", "products/prod1.json").unwrap(),
            "./prod1.json"
        );
        // target in an ancestor directory
        assert_eq!(
            relative_path("themes/land.json", "catalog.json").unwrap(),
            "../catalog.json"
        );
        // target in a descendant directory
        assert_eq!(
            relative_path("catalog.json", "themes/land.json").unwrap(),
            "themes/land.json"
        );
        // same directory
        assert_eq!(
            relative_path("variables/v1.json", "variables/v2.json").unwrap(),
            "v2.json"
        );
        // deeper nesting on the source side
        assert_eq!(
            relative_path("products/iso/prod1.xml", "variables/v1.json").unwrap(),
            "../../variables/v1.json"
        );
    }

    #[test]
    fn absolute_paths_are_a_fault() {
        let err = relative_path("/rooted/a.json", "b.json").unwrap_err();
        assert!(matches!(err, CatenaError::Internal(_)));
    }

    #[test]
    fn layout_groups_by_kind() {
        assert_eq!(layout_path(NodeKind::Root, None).unwrap(), "catalog.json");
        assert_eq!(
            layout_path(NodeKind::ThemeCollection, Some("Land")).unwrap(),
            "themes/land.json"
        );
        assert_eq!(
            layout_path(NodeKind::VariableCollection, None).unwrap(),
            "variables/catalog.json"
        );
        assert_eq!(
            layout_path(NodeKind::ProductItem, Some("Sea Ice Thickness")).unwrap(),
            "products/sea-ice-thickness.json"
        );
    }

    #[test]
    fn iso_artifact_paths_sit_beside_their_document() {
        assert_eq!(
            iso_companion(NodeKind::ProductItem, "products/prod1.json").unwrap(),
            "products/iso/prod1.xml"
        );
        assert_eq!(
            iso_companion(NodeKind::ProjectCollection, "projects/p1.json").unwrap(),
            "projects/iso/p1.xml"
        );
        assert!(iso_companion(NodeKind::ThemeCollection, "themes/land.json").is_none());
    }

    fn tree_of_themes(ids: &[&str]) -> CatalogTree {
        let mut store = crate::entity::EntityStore::default();
        for id in ids {
            store
                .insert_theme(crate::entity::Theme {
                    id: id.to_string(),
                    title: id.to_string(),
                    attributes: serde_json::Map::new(),
                })
                .unwrap();
        }
        let index = crate::relations::resolve(&store).unwrap();
        crate::tree::assemble(&store, &index).unwrap()
    }

    #[test]
    fn resolving_the_same_tree_twice_changes_nothing() {
        let mut tree = tree_of_themes(&["land", "oceans"]);
        let config = BuildConfig::default();
        resolve_hrefs(&mut tree, &config).unwrap();
        let first: Vec<(Option<String>, Vec<Link>)> = tree
            .iter()
            .map(|(_, n)| (n.path.clone(), n.links.clone()))
            .collect();

        resolve_hrefs(&mut tree, &config).unwrap();
        let second: Vec<(Option<String>, Vec<Link>)> = tree
            .iter()
            .map(|(_, n)| (n.path.clone(), n.links.clone()))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn colliding_slugs_are_a_fault() {
        // "a b" and "a-b" slug to the same path segment.
        let mut tree = tree_of_themes(&["a b", "a-b"]);
        let err = resolve_hrefs(&mut tree, &BuildConfig::default()).unwrap_err();
        match err {
            CatenaError::Internal(msg) => {
                assert!(msg.contains("path collision"), "{msg}");
                assert!(msg.contains("themes/a-b.json"), "{msg}");
            }
            other => panic!("expected an internal fault, got {other:?}"),
        }
    }

    #[test]
    fn base_join_handles_missing_trailing_slash() {
        let base = parse_base("https://example.com/catalog").unwrap();
        assert_eq!(
            base.join("themes/land.json").unwrap().to_string(),
            "https://example.com/catalog/themes/land.json"
        );
    }
}
