//! Transport for fetching a repository's `index.json`.
//!
//! `file://` URLs are read directly off disk; `http(s)://` URLs go through
//! `reqwest::blocking` behind the `network` feature, consistent with the
//! single-threaded, synchronous suspension points this core allows.

use crate::Result;
use crate::error::AlpError;
use crate::types::RepositoryCatalog;

/// What: Fetch and parse `{url}/index.json`.
///
/// Inputs:
/// - `url`: repository base URL, without the trailing `/index.json`.
///
/// Output:
/// - `Ok(RepositoryCatalog)` on a successful fetch and parse.
/// - `Err(AlpError::Network)` for a `file://` URL whose `index.json` is
///   missing or unreadable, or an `http(s)://` fetch failure.
/// - `Err(AlpError::Json)` for a malformed document.
pub fn fetch_catalog(url: &str) -> Result<RepositoryCatalog> {
    if let Some(path) = url.strip_prefix("file://") {
        let index_path = format!("{}/index.json", path.trim_end_matches('/'));
        let bytes = std::fs::read(&index_path).map_err(|err| {
            AlpError::Network(format!("reading {index_path}: {err}"))
        })?;
        return Ok(serde_json::from_slice(&bytes)?);
    }

    fetch_remote(url)
}

#[cfg(feature = "network")]
fn fetch_remote(url: &str) -> Result<RepositoryCatalog> {
    let index_url = format!("{}/index.json", url.trim_end_matches('/'));
    let response = reqwest::blocking::get(&index_url)?;
    let response = response.error_for_status()?;
    Ok(response.json()?)
}

#[cfg(not(feature = "network"))]
fn fetch_remote(url: &str) -> Result<RepositoryCatalog> {
    Err(AlpError::Network(format!(
        "cannot fetch {url}: built without the `network` feature"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageMetadata;

    #[test]
    fn fetch_catalog_reads_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = RepositoryCatalog {
            name: "main".to_string(),
            description: String::new(),
            version: "1".to_string(),
            packages: vec![PackageMetadata {
                name: "app".to_string(),
                version: "1.0.0".to_string(),
                architecture: "x86_64".to_string(),
                size: 1,
                checksum: "a".repeat(64),
                ..Default::default()
            }],
        };
        std::fs::write(dir.path().join("index.json"), serde_json::to_vec(&catalog).unwrap())
            .unwrap();

        let url = format!("file://{}", dir.path().display());
        let fetched = fetch_catalog(&url).unwrap();
        assert_eq!(fetched.name, "main");
        assert_eq!(fetched.packages.len(), 1);
    }

    #[test]
    fn fetch_catalog_errors_on_missing_file_url() {
        let result = fetch_catalog("file:///definitely/not/a/real/path");
        assert!(result.is_err());
    }
}
