//! Serializer boundary: writes resolved catalog nodes to files.
//!
//! Consumes the tree read-only; every node arrives with its path and link
//! list finalized. I/O faults surface as-is and abort the build — a
//! partial output directory is an acceptable, clearly-incomplete artifact
//! for a batch re-run.

use std::{
    fmt::Write as FmtWrite,
    fs,
    path::Path,
};

use serde_json::{json, Map, Value};

use crate::{
    config::BuildConfig,
    entity::EntityStore,
    error::CatenaError,
    tree::{CatalogTree, NodeId, NodeKind},
};

/// Renderer for the companion ISO metadata projection of a node document.
/// Opaque to the core: implementations receive the finished document and
/// return the XML body to write beside it.
pub trait IsoRenderer {
    fn render(&self, document: &Value) -> Result<String, CatenaError>;
}

/// Minimal built-in renderer: identification and linkage fields only.
/// Stands in wherever a full ISO 19115 renderer is not plugged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicIsoRenderer;

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl IsoRenderer for BasicIsoRenderer {
    fn render(&self, document: &Value) -> Result<String, CatenaError> {
        let field = |key: &str| document.get(key).and_then(Value::as_str).unwrap_or("");
        let self_href = document
            .get("links")
            .and_then(Value::as_array)
            .and_then(|links| {
                links.iter().find(|l| {
                    l.get("rel").and_then(Value::as_str) == Some("self")
                })
            })
            .and_then(|l| l.get("href"))
            .and_then(Value::as_str)
            .unwrap_or("");

        let mut xml = String::new();
        writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(xml, "<MD_Metadata>")?;
        writeln!(
            xml,
            "  <fileIdentifier>{}</fileIdentifier>",
            xml_escape(field("id"))
        )?;
        writeln!(
            xml,
            "  <hierarchyLevelName>{}</hierarchyLevelName>",
            xml_escape(field("type"))
        )?;
        writeln!(xml, "  <title>{}</title>", xml_escape(field("title")))?;
        writeln!(
            xml,
            "  <onlineResource>{}</onlineResource>",
            xml_escape(self_href)
        )?;
        writeln!(xml, "</MD_Metadata>")?;
        Ok(xml)
    }
}

/// Assemble the output document for one node: the source entity's fields
/// verbatim, the type discriminant, and the finalized link list.
pub fn node_document(
    tree: &CatalogTree,
    node_id: NodeId,
    store: &EntityStore,
) -> Result<Value, CatenaError> {
    let node = tree.node(node_id);

    let mut doc: Map<String, Value> = match (node.kind.entity_kind(), &node.id) {
        (Some(kind), Some(id)) => {
            let entity = match kind {
                crate::entity::EntityKind::Theme => {
                    store.themes.get(id).map(serde_json::to_value)
                }
                crate::entity::EntityKind::Project => {
                    store.projects.get(id).map(serde_json::to_value)
                }
                crate::entity::EntityKind::Product => {
                    store.products.get(id).map(serde_json::to_value)
                }
                crate::entity::EntityKind::Variable => {
                    store.variables.get(id).map(serde_json::to_value)
                }
            };
            let value = entity.ok_or_else(|| {
                CatenaError::Internal(format!("{} has no backing record", node.label()))
            })??;
            match value {
                Value::Object(map) => map,
                _ => {
                    return Err(CatenaError::Internal(format!(
                        "{} serialized to a non-object",
                        node.label()
                    )))
                }
            }
        }
        _ => {
            let mut map = Map::new();
            let id = match node.kind {
                NodeKind::VariableCollection => "variables",
                _ => "catalog",
            };
            map.insert("id".to_string(), json!(id));
            map.insert("title".to_string(), json!(node.title));
            map
        }
    };

    doc.insert("type".to_string(), json!(node.kind.document_type()));
    let links: Vec<Value> = node
        .links
        .iter()
        .map(|link| {
            let href = link.href.clone().ok_or_else(|| {
                CatenaError::Internal(format!("unresolved link on {}", node.label()))
            })?;
            let mut entry = Map::new();
            entry.insert("rel".to_string(), json!(link.rel.to_string()));
            entry.insert("href".to_string(), json!(href));
            if let Some(title) = &link.title {
                entry.insert("title".to_string(), json!(title));
            }
            Ok(Value::Object(entry))
        })
        .collect::<Result<_, CatenaError>>()?;
    doc.insert("links".to_string(), Value::Array(links));
    Ok(Value::Object(doc))
}

/// Serialize `value` to `path`, pretty-printed or compact, with a trailing
/// newline either way.
pub fn write_json(path: &Path, value: &Value, pretty_print: bool) -> Result<(), CatenaError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut body = if pretty_print {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    body.push('\n');
    fs::write(path, body)?;
    Ok(())
}

/// Write every node document under `out_dir`, plus companion ISO
/// artifacts when configured. Single pass; nodes are never mutated here.
pub fn write_catalog(
    tree: &CatalogTree,
    store: &EntityStore,
    config: &BuildConfig,
    out_dir: &Path,
    renderer: &dyn IsoRenderer,
) -> Result<usize, CatenaError> {
    let mut written = 0;
    for (node_id, node) in tree.iter() {
        let path = node.path.as_deref().ok_or_else(|| {
            CatenaError::Internal(format!("{} reached the serializer unresolved", node.label()))
        })?;
        let document = node_document(tree, node_id, store)?;
        write_json(&out_dir.join(path), &document, config.pretty_print)?;
        written += 1;

        if config.add_iso {
            if let Some(artifact) = crate::paths::iso_companion(node.kind, path) {
                let xml = renderer.render(&document)?;
                let target = out_dir.join(&artifact);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(target, xml)?;
                written += 1;
            }
        }
    }
    tracing::debug!("wrote {written} files under {:?}", out_dir);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{paths::resolve_hrefs, relations::resolve, tree::assemble};
    use crate::entity::{Theme, Variable};
    use serde_json::Map as JsonMap;

    fn resolved_fixture() -> (CatalogTree, EntityStore) {
        let mut store = EntityStore::default();
        let mut attributes = JsonMap::new();
        attributes.insert("image".to_string(), json!("land.png"));
        store
            .insert_theme(Theme {
                id: "land".to_string(),
                title: "Land".to_string(),
                attributes,
            })
            .unwrap();
        store
            .insert_variable(Variable {
                id: "v1".to_string(),
                title: "Variable One".to_string(),
                attributes: JsonMap::new(),
            })
            .unwrap();
        let index = resolve(&store).unwrap();
        let mut tree = assemble(&store, &index).unwrap();
        resolve_hrefs(&mut tree, &BuildConfig::default()).unwrap();
        (tree, store)
    }

    #[test]
    fn documents_carry_attributes_type_and_links() {
        let (tree, store) = resolved_fixture();
        let (theme_id, _) = tree
            .iter()
            .find(|(_, n)| n.id.as_deref() == Some("land"))
            .unwrap();
        let doc = node_document(&tree, theme_id, &store).unwrap();

        assert_eq!(doc["type"], "Theme");
        assert_eq!(doc["id"], "land");
        assert_eq!(doc["image"], "land.png", "free attributes pass through");
        let links = doc["links"].as_array().unwrap();
        assert_eq!(links[0]["rel"], "self");
        assert_eq!(links[0]["href"], "./land.json");
        assert!(links
            .iter()
            .any(|l| l["rel"] == "parent" && l["href"] == "../catalog.json"));
    }

    #[test]
    fn basic_iso_renderer_escapes_and_identifies() {
        let doc = json!({
            "id": "p<1>",
            "type": "Project",
            "title": "A & B",
            "links": [{"rel": "self", "href": "projects/p1.json"}],
        });
        let xml = BasicIsoRenderer.render(&doc).unwrap();
        assert!(xml.contains("<fileIdentifier>p&lt;1&gt;</fileIdentifier>"));
        assert!(xml.contains("<title>A &amp; B</title>"));
        assert!(xml.contains("<onlineResource>projects/p1.json</onlineResource>"));
    }
}
