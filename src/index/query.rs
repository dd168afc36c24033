use log::warn;

use super::client::QueryIndex;
use crate::version;

/// Version lookups over a package index.
///
/// Errors from the index never escape this facade: a failed fetch is
/// logged and degrades to an empty result, so an interactive caller is
/// never interrupted by a flaky network.
pub struct VersionQuery<Q: QueryIndex> {
    index: Q,
}

impl<Q: QueryIndex> VersionQuery<Q> {
    pub fn new(index: Q) -> Self {
        Self { index }
    }

    /// All known release identifiers for a package, sorted ascending.
    /// Empty when the package is unknown or the index is unreachable.
    #[tracing::instrument(skip(self))]
    pub async fn list_versions(&self, package: &str) -> Vec<String> {
        match self.index.release_versions(package).await {
            Ok(versions) => version::sort_versions(versions),
            Err(e) => {
                warn!("Failed to fetch versions for {}: {:#}", package, e);
                Vec::new()
            }
        }
    }

    /// The latest stable (non-prerelease) version of a package.
    #[tracing::instrument(skip(self))]
    pub async fn latest_stable(&self, package: &str) -> Option<String> {
        let versions = self.list_versions(package).await;
        match version::latest_stable(&versions) {
            Some(v) => Some(v.to_string()),
            None => {
                warn!("No stable versions found for {}", package);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MockQueryIndex;

    fn owned(versions: &[&str]) -> Vec<String> {
        versions.iter().map(|v| v.to_string()).collect()
    }

    #[test_log::test(tokio::test)]
    async fn test_list_versions_sorted() {
        let mut index = MockQueryIndex::new();
        index
            .expect_release_versions()
            .returning(|_| Ok(owned(&["1.10", "1.2", "1.2rc1"])));

        let query = VersionQuery::new(index);
        let versions = query.list_versions("foo").await;
        assert_eq!(versions, owned(&["1.2rc1", "1.2", "1.10"]));
    }

    #[test_log::test(tokio::test)]
    async fn test_list_versions_degrades_to_empty_on_error() {
        let mut index = MockQueryIndex::new();
        index
            .expect_release_versions()
            .returning(|_| Err(anyhow::anyhow!("index unreachable")));

        let query = VersionQuery::new(index);
        assert!(query.list_versions("foo").await.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_latest_stable_filters_prereleases() {
        let mut index = MockQueryIndex::new();
        index
            .expect_release_versions()
            .returning(|_| Ok(owned(&["1.0", "1.1a1", "1.1"])));

        let query = VersionQuery::new(index);
        assert_eq!(query.latest_stable("foo").await.as_deref(), Some("1.1"));
    }

    #[test_log::test(tokio::test)]
    async fn test_latest_stable_none_without_stable_release() {
        let mut index = MockQueryIndex::new();
        index
            .expect_release_versions()
            .returning(|_| Ok(owned(&["1.0a1", "1.0rc2"])));

        let query = VersionQuery::new(index);
        assert_eq!(query.latest_stable("foo").await, None);
    }

    #[test_log::test(tokio::test)]
    async fn test_latest_stable_none_on_error() {
        let mut index = MockQueryIndex::new();
        index
            .expect_release_versions()
            .returning(|_| Err(anyhow::anyhow!("boom")));

        let query = VersionQuery::new(index);
        assert_eq!(query.latest_stable("foo").await, None);
    }
}
