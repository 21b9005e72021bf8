//! Version parsing and comparison for dependency resolution.
//!
//! Versions here are strictly dotted sequences of non-negative integers
//! (no pre-release tags, no epoch numbers, no text suffixes). This is a
//! deliberately narrower grammar than distro package managers typically
//! accept; components outside it are rejected rather than best-effort
//! parsed.

use std::cmp::Ordering;

/// What: Parse a dotted version string into its numeric components.
///
/// Inputs:
/// - `version`: a string expected to look like `"1.2.3"`.
///
/// Output:
/// - `Some(components)` when every dot-separated segment parses as a
///   `u64`, and there is at least one segment.
/// - `None` for an empty string or any segment that is not a
///   non-negative integer.
///
/// # Example
///
/// ```
/// use alp::resolver::version::parse_version;
///
/// assert_eq!(parse_version("1.2.3"), Some(vec![1, 2, 3]));
/// assert_eq!(parse_version("1.2.3-alpha"), None);
/// assert_eq!(parse_version(""), None);
/// ```
#[must_use]
pub fn parse_version(version: &str) -> Option<Vec<u64>> {
    if version.is_empty() {
        return None;
    }
    version.split('.').map(|segment| segment.parse::<u64>().ok()).collect()
}

/// What: Compare two version strings as dotted non-negative integers.
///
/// Inputs:
/// - `a`, `b`: version strings.
///
/// Output:
/// - `Ordering` comparing `a` to `b`, component-wise, with the shorter
///   sequence zero-padded to the longer one's length.
///
/// Details:
/// - A version that fails to parse is treated as entirely absent
///   components (all zeros) for the purpose of this comparison, so
///   `compare_versions` never panics; callers that need to reject
///   malformed versions should call `parse_version` themselves first.
///
/// # Example
///
/// ```
/// use alp::resolver::version::compare_versions;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_versions("1.2.3", "1.2.4"), Ordering::Less);
/// assert_eq!(compare_versions("2.0", "1.9.9"), Ordering::Greater);
/// assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
/// ```
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = parse_version(a).unwrap_or_default();
    let b_parts = parse_version(b).unwrap_or_default();
    let len = a_parts.len().max(b_parts.len());

    for idx in 0..len {
        let a_seg = a_parts.get(idx).copied().unwrap_or(0);
        let b_seg = b_parts.get(idx).copied().unwrap_or(0);
        match a_seg.cmp(&b_seg) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }
    Ordering::Equal
}

/// What: Check whether a candidate version meets a minimum requirement.
///
/// Inputs:
/// - `version`: the candidate version.
/// - `minimum`: the lower bound, inclusive.
///
/// Output: `true` iff `compare_versions(version, minimum)` is not `Less`.
///
/// # Example
///
/// ```
/// use alp::resolver::version::version_meets_minimum;
///
/// assert!(version_meets_minimum("2.0.0", "1.5.0"));
/// assert!(version_meets_minimum("1.5.0", "1.5.0"));
/// assert!(!version_meets_minimum("1.4.9", "1.5.0"));
/// ```
#[must_use]
pub fn version_meets_minimum(version: &str, minimum: &str) -> bool {
    compare_versions(version, minimum) != Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_version_accepts_dotted_integers() {
        assert_eq!(parse_version("1.2.3"), Some(vec![1, 2, 3]));
        assert_eq!(parse_version("0"), Some(vec![0]));
        assert_eq!(parse_version("10.0.0"), Some(vec![10, 0, 0]));
    }

    #[test]
    fn parse_version_rejects_non_numeric_segments() {
        assert_eq!(parse_version("1.2.3-alpha"), None);
        assert_eq!(parse_version("1.x.3"), None);
        assert_eq!(parse_version(""), None);
    }

    #[test]
    fn compare_versions_pads_shorter_sequence_with_zeros() {
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.2", "1.2.1"), Ordering::Less);
    }

    #[test]
    fn compare_versions_is_component_wise_not_lexicographic() {
        assert_eq!(compare_versions("1.10.0", "1.9.9"), Ordering::Greater);
        assert_eq!(compare_versions("2.0.0", "1.9.9"), Ordering::Greater);
    }

    #[test]
    fn version_meets_minimum_is_inclusive() {
        assert!(version_meets_minimum("1.5.0", "1.5.0"));
        assert!(version_meets_minimum("1.5.1", "1.5.0"));
        assert!(!version_meets_minimum("1.4.9", "1.5.0"));
    }
}
