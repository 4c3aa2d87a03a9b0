//! Disambiguation policy for search results.

use super::{ResolveError, SearchResults};

/// Number of candidates surfaced in an ambiguous-query error.
pub const AMBIGUOUS_SAMPLE_SIZE: usize = 5;

/// Picks the package a query refers to.
///
/// An exact match wins over any number of other candidates; otherwise a
/// single candidate is accepted even when it does not resemble the query.
///
/// # Errors
///
/// Returns [`ResolveError::NoSearchResults`] when there are no candidates and
/// [`ResolveError::AmbiguousQuery`] when several remain.
pub fn pick_package(query: &str, results: &SearchResults) -> Result<String, ResolveError> {
    let packages = results.packages();
    if packages.is_empty() {
        return Err(ResolveError::no_search_results(query));
    }
    if results.contains(query) {
        return Ok(query.to_string());
    }
    if let [only] = packages {
        return Ok(only.clone());
    }
    let sample = packages
        .iter()
        .take(AMBIGUOUS_SAMPLE_SIZE)
        .cloned()
        .collect();
    Err(ResolveError::ambiguous(query, sample, packages.len()))
}
