//! Package resolution against the repository's web pages.
//!
//! Turns user input into a canonical package id (directly, or through the
//! search page) and scrapes the package page for the newest APK link.
//!
//! # Architecture
//!
//! - [`PackageResolver`] - Issues the search and detail page requests
//! - [`SearchResults`] / [`PackageInfo`] - Transient records passed to callers
//! - [`pick_package`] - Pure disambiguation policy over search results
//! - [`scrape`] - Regex extraction of package ids and APK links
//!
//! # Example
//!
//! ```no_run
//! use fdroid_downloader::config::ClientConfig;
//! use fdroid_downloader::download::HttpClient;
//! use fdroid_downloader::resolver::PackageResolver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let resolver = PackageResolver::new(HttpClient::new(&config)?, &config);
//! let info = resolver.get_latest_apk_info("mumla", true).await?;
//! println!("{} -> {}", info.package_name, info.download_url);
//! # Ok(())
//! # }
//! ```

mod error;
mod policy;
pub mod scrape;

pub use error::ResolveError;
pub use policy::{AMBIGUOUS_SAMPLE_SIZE, pick_package};

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::download::HttpClient;

/// The resolved package and the URL of its newest APK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    /// Canonical package identifier.
    pub package_name: String,
    /// Absolute download URL of the newest APK.
    pub download_url: String,
}

/// Package ids matched by a search, deduplicated and sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    query: String,
    packages: Vec<String>,
}

impl SearchResults {
    /// Builds results from raw (possibly repeated, unordered) ids.
    pub fn new<I, S>(query: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let packages: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        Self {
            query: query.into(),
            packages: packages.into_iter().collect(),
        }
    }

    /// The query that produced these results.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Sorted, unique package ids.
    #[must_use]
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Returns true when `package` is among the results.
    #[must_use]
    pub fn contains(&self, package: &str) -> bool {
        self.packages
            .binary_search_by(|candidate| candidate.as_str().cmp(package))
            .is_ok()
    }

    /// Returns true when nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Resolves identifiers and scrapes APK links from the repository.
#[derive(Debug, Clone)]
pub struct PackageResolver {
    http: HttpClient,
    base_url: String,
    metadata_timeout: Duration,
}

impl PackageResolver {
    /// Creates a resolver sharing `http` and reading the base URL and
    /// metadata timeout from `config`.
    #[must_use]
    pub fn new(http: HttpClient, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.normalized_base_url().to_string(),
            metadata_timeout: config.metadata_timeout,
        }
    }

    /// Repository base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the search listing for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidBaseUrl`] when the base URL does not parse.
    pub fn search_url(&self, query: &str) -> Result<String, ResolveError> {
        let mut url = Url::parse(&format!("{}/en/packages/", self.base_url)).map_err(|_| {
            ResolveError::InvalidBaseUrl {
                url: self.base_url.clone(),
            }
        })?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url.into())
    }

    /// URL of the detail page for `package_name`.
    #[must_use]
    pub fn package_url(&self, package_name: &str) -> String {
        format!("{}/en/packages/{package_name}/", self.base_url)
    }

    /// Runs a free-text search and collects the linked package ids.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Fetch`] when the search page cannot be loaded.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search_packages(&self, query: &str) -> Result<SearchResults, ResolveError> {
        let url = self.search_url(query)?;
        let html = self
            .http
            .get_text(&url, self.metadata_timeout)
            .await
            .map_err(ResolveError::fetch)?;
        let results = SearchResults::new(query, scrape::extract_package_ids(&html));
        debug!(candidates = results.packages().len(), "search complete");
        Ok(results)
    }

    /// Returns the canonical package id for `identifier`.
    ///
    /// Without `search` the identifier is returned unchanged and no request
    /// is made. With `search` the search page decides via [`pick_package`].
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NoSearchResults`], [`ResolveError::AmbiguousQuery`],
    /// or [`ResolveError::Fetch`].
    pub async fn resolve_package(
        &self,
        identifier: &str,
        search: bool,
    ) -> Result<String, ResolveError> {
        if !search {
            return Ok(identifier.to_string());
        }
        let results = self.search_packages(identifier).await?;
        let package = pick_package(identifier, &results)?;
        if package != identifier {
            info!(query = %identifier, package = %package, "search resolved to package");
        }
        Ok(package)
    }

    /// Resolves `package_or_query` and scrapes its newest APK URL.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ApkNotFound`] when the detail page links no
    /// APK for the package, plus any error from
    /// [`resolve_package`](Self::resolve_package) or the page fetch.
    #[instrument(skip(self), fields(input = %package_or_query, search))]
    pub async fn get_latest_apk_info(
        &self,
        package_or_query: &str,
        search: bool,
    ) -> Result<PackageInfo, ResolveError> {
        let package_name = self.resolve_package(package_or_query, search).await?;
        let html = self
            .http
            .get_text(&self.package_url(&package_name), self.metadata_timeout)
            .await
            .map_err(ResolveError::fetch)?;

        let download_url = scrape::extract_download_url(&html, &package_name, &self.base_url)
            .ok_or_else(|| ResolveError::apk_not_found(&package_name))?;
        debug!(package = %package_name, url = %download_url, "located APK download");

        Ok(PackageInfo {
            package_name,
            download_url,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn resolver(base_url: &str) -> PackageResolver {
        let config = ClientConfig::with_base_url(base_url);
        PackageResolver::new(HttpClient::new(&config).unwrap(), &config)
    }

    #[test]
    fn test_search_results_dedupes_and_sorts() {
        let results = SearchResults::new("q", ["b.b", "a.a", "b.b"]);
        assert_eq!(results.query(), "q");
        assert_eq!(results.packages(), ["a.a", "b.b"]);
        assert!(results.contains("a.a"));
        assert!(!results.contains("c.c"));
        assert!(!results.is_empty());
    }

    #[test]
    fn test_search_url_encodes_query() {
        let url = resolver("https://f-droid.org/").search_url("delta chat&more").unwrap();
        assert_eq!(url, "https://f-droid.org/en/packages/?q=delta+chat%26more");
    }

    #[test]
    fn test_search_url_rejects_invalid_base() {
        let result = resolver("not a base url").search_url("x");
        assert!(matches!(result, Err(ResolveError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn test_package_url() {
        assert_eq!(
            resolver("https://f-droid.org").package_url("se.lublin.mumla"),
            "https://f-droid.org/en/packages/se.lublin.mumla/"
        );
    }

    #[tokio::test]
    async fn test_resolve_without_search_is_identity_and_offline() {
        // Unroutable base URL: any request would fail, so success proves no I/O.
        let resolver = resolver("http://127.0.0.1:9");
        for id in ["org.fdroid.fdroid", "not even a package", ""] {
            assert_eq!(resolver.resolve_package(id, false).await.unwrap(), id);
        }
    }
}
