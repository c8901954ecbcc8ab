//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::PathBuf;
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times — subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Create a small but fully cross-linked data directory:
///
/// - themes `land` and `oceans`
/// - project `p1` referencing both themes (`land` is the canonical owner)
/// - variables `v1` and `v2`
/// - product `prod1` under `p1`, measuring `v1` and `v2`
///
/// Returns the data directory path (e.g. `<temp_dir>/data/`).
#[allow(dead_code)]
pub fn create_test_data(temp_dir: &TempDir) -> PathBuf {
    let data_dir = temp_dir.path().join("data");
    for (dir, filename, body) in [
        (
            "themes",
            "land.json",
            r#"{"id": "land", "title": "Land", "image": "land.png"}"#,
        ),
        (
            "themes",
            "oceans.json",
            r#"{"id": "oceans", "title": "Oceans"}"#,
        ),
        (
            "projects",
            "p1.json",
            r#"{"id": "p1", "title": "Project One", "themes": ["land", "oceans"], "website": "https://example.com/p1"}"#,
        ),
        (
            "variables",
            "v1.json",
            r#"{"id": "v1", "title": "Variable One"}"#,
        ),
        (
            "variables",
            "v2.json",
            r#"{"id": "v2", "title": "Variable Two"}"#,
        ),
        (
            "products",
            "prod1.json",
            r#"{"id": "prod1", "title": "Product One", "projects": ["p1"], "variables": ["v1", "v2"]}"#,
        ),
    ] {
        let dir = data_dir.join(dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(filename), body).unwrap();
    }
    data_dir
}
