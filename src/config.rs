use serde::{Deserialize, Serialize};

/// Configuration consumed by href resolution and serialization.
///
/// An explicit value threaded through the pipeline calls — there is no
/// process-wide mutable state, which keeps resolution a pure function of
/// (tree, configuration).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Absolute URL prefix for every href. `None` (or empty) means
    /// "produce tree-relative hrefs".
    pub root_href: Option<String>,
    /// Serializer formatting only; has no effect on the graph.
    pub pretty_print: bool,
    /// Whether each project/product references and receives a companion
    /// ISO metadata artifact.
    pub add_iso: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            root_href: None,
            pretty_print: true,
            add_iso: true,
        }
    }
}

impl BuildConfig {
    /// The configured root href, normalized: empty strings collapse to
    /// `None`.
    pub fn root_href(&self) -> Option<&str> {
        self.root_href.as_deref().filter(|href| !href.is_empty())
    }
}
