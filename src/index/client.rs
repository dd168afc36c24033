use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use super::types::ProjectResponse;

/// Default public package index.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryIndex: Send + Sync {
    /// Fetches the raw (unsorted) release identifiers for a package.
    async fn release_versions(&self, package: &str) -> Result<Vec<String>>;
}

/// PyPI JSON API client.
pub struct PyPi {
    pub client: Client,
    pub index_url: String,
}

impl PyPi {
    #[tracing::instrument(skip(client, index_url))]
    pub fn new(client: Client, index_url: Option<String>) -> Self {
        let index_url = index_url.unwrap_or_else(|| DEFAULT_INDEX_URL.to_string());
        Self { client, index_url }
    }
}

#[async_trait]
impl QueryIndex for PyPi {
    #[tracing::instrument(skip(self))]
    async fn release_versions(&self, package: &str) -> Result<Vec<String>> {
        let url = format!("{}/pypi/{}/json", self.index_url, package);

        debug!("Fetching project metadata from {}...", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request to the package index")?;

        let response = response
            .error_for_status()
            .with_context(|| format!("Index returned an error status for {}", package))?;

        let project = response
            .json::<ProjectResponse>()
            .await
            .context("Failed to parse JSON response from the package index")?;

        Ok(project.release_versions())
    }
}
