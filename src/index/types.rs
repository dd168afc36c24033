use serde::Deserialize;
use std::collections::BTreeMap;

/// Response body of `GET /pypi/{package}/json`.
///
/// Only the `releases` keys matter here; the per-release file lists are
/// left as raw JSON and never inspected.
#[derive(Debug, Deserialize)]
pub struct ProjectResponse {
    pub releases: BTreeMap<String, serde_json::Value>,
}

impl ProjectResponse {
    /// The release identifiers, in no particular order.
    pub fn release_versions(&self) -> Vec<String> {
        self.releases.keys().cloned().collect()
    }
}
