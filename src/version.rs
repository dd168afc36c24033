//! Version ordering for package release identifiers.
//!
//! PyPI release keys follow PEP 440; ordering and the stable/pre-release
//! split are delegated to `pep440_rs`. All functions here are pure and
//! stateless.

use pep440_rs::Version;
use std::cmp::Ordering;

/// Compare two release identifiers under the PEP 440 total order.
///
/// Identifiers that fail to parse sort before every parseable identifier,
/// tie-broken lexicographically, so a handful of legacy keys in an index
/// response cannot poison the ordering of the rest.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (a.parse::<Version>().ok(), b.parse::<Version>().ok()) {
        (Some(va), Some(vb)) => va.cmp(&vb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Sort release identifiers ascending.
pub fn sort_versions(mut versions: Vec<String>) -> Vec<String> {
    versions.sort_by(|a, b| compare_versions(a, b));
    versions
}

/// Whether an identifier names a stable release (no alpha/beta/rc/dev
/// segment). Identifiers that fail to parse are not considered stable.
pub fn is_stable(version: &str) -> bool {
    version
        .parse::<Version>()
        .map(|v| !v.any_prerelease())
        .unwrap_or(false)
}

/// The maximum stable identifier in `versions`, or `None` when every
/// release is a pre-release (or unparseable).
pub fn latest_stable(versions: &[String]) -> Option<&str> {
    versions
        .iter()
        .filter(|v| is_stable(v))
        .max_by(|a, b| compare_versions(a, b))
        .map(String::as_str)
}
