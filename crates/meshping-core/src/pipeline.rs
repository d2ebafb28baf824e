//! Filter-and-sort pipeline
//!
//! Derives the view shown to the user from the canonical collection and the
//! search string. The function is pure: it never touches its input and always
//! returns a freshly allocated vector, so sorting cannot leak back into the
//! canonical collection.

use crate::address::rank_or_fallback;
use crate::target::Target;

/// Derive the filtered, address-ordered view
///
/// - Empty search keeps every target.
/// - Otherwise a target is kept when its lowercased name contains the
///   lowercased search, or when its literal address contains the lowercased
///   search.
/// - The result is sorted ascending by address rank; equal ranks keep their
///   input order.
pub fn derive(all: &[Target], search: &str) -> Vec<Target> {
    let mut view: Vec<Target> = if search.is_empty() {
        all.to_vec()
    } else {
        let needle = search.to_lowercase();
        all.iter()
            .filter(|target| matches(target, &needle))
            .cloned()
            .collect()
    };

    // sort_by_cached_key is stable and ranks each address once
    view.sort_by_cached_key(|target| rank_or_fallback(&target.addr));
    view
}

/// Whether a target passes the filter for an already-lowercased needle
fn matches(target: &Target, needle: &str) -> bool {
    target.name.to_lowercase().contains(needle) || target.addr.contains(needle)
}
