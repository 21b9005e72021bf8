//! Package metadata — the typed record carried inside every package archive
//! and row in the installation database.

use serde::{Deserialize, Serialize};

/// Full metadata describing one package: its identity, version, declared
/// relationships to other packages, and the payload binding checksum.
///
/// All fields are required on the wire except `description`, `conflicts`,
/// `provides`, `maintainer`, `homepage`, and `license`, which default to
/// empty at the parse boundary per the Design Notes ("drop optional-field
/// defaults at parse time").
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Unique identifier, non-empty, case-sensitive.
    pub name: String,
    /// Dotted numeric version, e.g. `"1.2.3"`.
    pub version: String,
    /// Free-text summary; may be empty.
    #[serde(default)]
    pub description: String,
    /// Target architecture tag, e.g. `"x86_64"`.
    pub architecture: String,
    /// Ordered dependency constraints: `name` or `name>=version`.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Package names that must not be installed alongside this one.
    #[serde(default)]
    pub conflicts: Vec<String>,
    /// Virtual names this package satisfies (advisory in this core).
    #[serde(default)]
    pub provides: Vec<String>,
    /// Maintainer attribution.
    #[serde(default)]
    pub maintainer: String,
    /// Upstream project URL.
    #[serde(default)]
    pub homepage: String,
    /// SPDX or free-text license identifier.
    #[serde(default)]
    pub license: String,
    /// Payload archive size in bytes.
    pub size: u64,
    /// Hex-encoded 64-character SHA-256 of the payload archive.
    pub checksum: String,
    /// Ordered, payload-relative file paths this package owns.
    #[serde(default)]
    pub files: Vec<String>,
}

impl PackageMetadata {
    /// What: Validate the structural invariants spec'd for a metadata record.
    ///
    /// Inputs:
    /// - `self`: the parsed metadata to validate.
    ///
    /// Output:
    /// - `Ok(())` if `name` is non-empty, `version` parses as a dotted
    ///   sequence of non-negative integers, and `checksum` is a 64-character
    ///   hex string.
    /// - `Err(AlpError::PackageFormatError)` describing the first violation.
    ///
    /// Details:
    /// - Called by `Package::load` right after parsing so malformed
    ///   metadata is rejected before any other component sees it.
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.is_empty() {
            return Err(crate::AlpError::PackageFormatError(
                "package name must not be empty".to_string(),
            ));
        }
        if crate::resolver::version::parse_version(&self.version).is_none() {
            return Err(crate::AlpError::PackageFormatError(format!(
                "invalid version string: {}",
                self.version
            )));
        }
        if self.checksum.len() != 64 || !self.checksum.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(crate::AlpError::PackageFormatError(format!(
                "checksum must be 64 hex characters, got {:?}",
                self.checksum
            )));
        }
        Ok(())
    }

    /// What: Parse a single dependency entry into `(name, min_version)`.
    ///
    /// Inputs:
    /// - `entry`: one element of `dependencies`, e.g. `"lib"`,
    ///   `"lib>=2.0.0"`, or `"lib=2.0.0"`.
    ///
    /// Output:
    /// - `(name, Some(min_version))` for `>=` and `=` constraints (both
    ///   treated as a lower bound).
    /// - `(name, None)` for an unconstrained entry.
    ///
    /// Details:
    /// - Only `>=` and `=` are recognized; any other operator is treated as
    ///   part of the name (this core defines no other operators).
    #[must_use]
    pub fn parse_dependency(entry: &str) -> (&str, Option<&str>) {
        if let Some(rest) = entry.split_once(">=") {
            (rest.0, Some(rest.1))
        } else if let Some(rest) = entry.split_once('=') {
            (rest.0, Some(rest.1))
        } else {
            (entry, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PackageMetadata {
        PackageMetadata {
            name: "hello-world".to_string(),
            version: "1.0.0".to_string(),
            architecture: "x86_64".to_string(),
            size: 128,
            checksum: "a".repeat(64),
            ..Default::default()
        }
    }

    #[test]
    fn validate_accepts_well_formed_metadata() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_name() {
        let mut meta = sample();
        meta.name.clear();
        assert!(meta.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_checksum_length() {
        let mut meta = sample();
        meta.checksum = "deadbeef".to_string();
        assert!(meta.validate().is_err());
    }

    #[test]
    fn parse_dependency_forms() {
        assert_eq!(PackageMetadata::parse_dependency("glibc"), ("glibc", None));
        assert_eq!(
            PackageMetadata::parse_dependency("lib>=2.0.0"),
            ("lib", Some("2.0.0"))
        );
        assert_eq!(
            PackageMetadata::parse_dependency("lib=2.0.0"),
            ("lib", Some("2.0.0"))
        );
    }

    #[test]
    fn defaults_are_empty_collections() {
        let meta = PackageMetadata {
            name: "minimal".to_string(),
            version: "1.0.0".to_string(),
            architecture: "x86_64".to_string(),
            size: 0,
            checksum: "0".repeat(64),
            ..Default::default()
        };
        assert!(meta.dependencies.is_empty());
        assert!(meta.conflicts.is_empty());
        assert!(meta.provides.is_empty());
        assert!(meta.files.is_empty());
    }
}
