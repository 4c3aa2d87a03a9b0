//! Error types for package resolution and metadata scraping.
//!
//! Messages follow the What/Why/Fix pattern used across the project.

use thiserror::Error;

use crate::download::DownloadError;

/// Errors that can occur while turning user input into a download URL.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The search page listed no packages for the query.
    #[error("no packages found for query '{query}'\n  Suggestion: Try a broader query or an exact package id")]
    NoSearchResults {
        /// The free-text query that matched nothing.
        query: String,
    },

    /// The package page exists but links no APK for this package.
    #[error("unable to locate APK download for '{package}'\n  Suggestion: Check that the package id is correct and still published")]
    ApkNotFound {
        /// The resolved package identifier.
        package: String,
    },

    /// More than one package matched and none equals the query.
    #[error(
        "multiple packages matched query '{query}': {}{}\n  Suggestion: Please use an exact package name",
        .sample.join(", "),
        more_suffix(.sample, .total)
    )]
    AmbiguousQuery {
        /// The free-text query.
        query: String,
        /// Up to five sorted candidates.
        sample: Vec<String>,
        /// Total number of candidates found.
        total: usize,
    },

    /// The configured base URL cannot be used to build request URLs.
    #[error("invalid repository base URL '{url}'")]
    InvalidBaseUrl {
        /// The rejected base URL.
        url: String,
    },

    /// A search or package page request failed (status, network, or timeout).
    #[error("failed to fetch repository page: {source}")]
    Fetch {
        /// The underlying HTTP failure.
        #[source]
        source: DownloadError,
    },
}

fn more_suffix(sample: &[String], total: &usize) -> String {
    if *total > sample.len() {
        format!(" (and {} more)", total - sample.len())
    } else {
        String::new()
    }
}

impl ResolveError {
    /// Creates a `NoSearchResults` error.
    #[must_use]
    pub fn no_search_results(query: &str) -> Self {
        Self::NoSearchResults {
            query: query.to_string(),
        }
    }

    /// Creates an `ApkNotFound` error.
    #[must_use]
    pub fn apk_not_found(package: &str) -> Self {
        Self::ApkNotFound {
            package: package.to_string(),
        }
    }

    /// Creates an `AmbiguousQuery` error.
    #[must_use]
    pub fn ambiguous(query: &str, sample: Vec<String>, total: usize) -> Self {
        Self::AmbiguousQuery {
            query: query.to_string(),
            sample,
            total,
        }
    }

    /// Wraps a page fetch failure.
    #[must_use]
    pub fn fetch(source: DownloadError) -> Self {
        Self::Fetch { source }
    }

    /// Returns true for the not-found class (no search hits, no APK link).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSearchResults { .. } | Self::ApkNotFound { .. })
    }

    /// Returns the HTTP status of a failed page fetch, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch { source } => source.status(),
            _ => None,
        }
    }
}
