//! `.alp` package archive: create, load, checksum-verify, and extract.
//!
//! An archive is an outer gzip-compressed tar holding exactly two members:
//! `metadata.toml` (the parsed [`PackageMetadata`]) and `data.tar.gz` (the
//! payload, itself a gzip-compressed tar rooted at `{name}/`).

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::Result;
use crate::error::AlpError;
use crate::types::PackageMetadata;

const METADATA_MEMBER: &str = "metadata.toml";
const PAYLOAD_MEMBER: &str = "data.tar.gz";

/// A loaded or freshly built package archive: its on-disk path and parsed
/// metadata.
#[derive(Debug, Clone)]
pub struct Package {
    /// Path to the `.alp` archive on disk.
    pub path: PathBuf,
    /// Parsed, validated metadata carried inside the archive.
    pub metadata: PackageMetadata,
}

impl Package {
    /// What: Build a `.alp` archive from a source directory and metadata
    /// template.
    ///
    /// Inputs:
    /// - `name`, `version`: identity fields, override any value already set
    ///   on `metadata`.
    /// - `source_dir`: directory tree to pack as the payload, rooted at
    ///   `{name}/` inside the inner archive.
    /// - `output_path`: base path (no extension); the final archive lands
    ///   at `{output_path}.alp`.
    /// - `metadata`: template carrying the free-text and relationship
    ///   fields (`description`, `dependencies`, `conflicts`, ...);
    ///   `checksum`, `size`, and `files` are computed and overwritten here.
    ///
    /// Output:
    /// - `Ok(Package)` pointing at the written `.alp` file.
    /// - `Err(AlpError::Io)` if `source_dir` does not exist or is not a
    ///   directory, or on any I/O failure.
    /// - `Err(AlpError::PackageFormatError)` if the assembled metadata
    ///   fails validation.
    ///
    /// Details:
    /// - Directory traversal order is lexicographic (`WalkDir::sort_by_file_name`),
    ///   so `files` and the payload's member order are stable across runs.
    /// - Intermediate files (the inner tar.gz, the metadata document) are
    ///   deleted once packed into the outer archive, on both success and
    ///   failure paths.
    #[instrument(skip(metadata), fields(package = name))]
    pub fn create(
        name: &str,
        version: &str,
        source_dir: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        mut metadata: PackageMetadata,
    ) -> Result<Self> {
        let source_dir = source_dir.as_ref();
        if !source_dir.is_dir() {
            return Err(AlpError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("source directory not found: {}", source_dir.display()),
            )));
        }

        let output_base = output_path.as_ref().display().to_string();
        let payload_path = format!("{output_base}.tar.gz");
        let metadata_path = format!("{output_base}.toml");
        let final_path = format!("{output_base}.alp");

        let files = Self::pack_payload(name, source_dir, &payload_path)?;

        let payload_bytes = std::fs::read(&payload_path)?;
        let mut hasher = Sha256::new();
        hasher.update(&payload_bytes);
        let checksum = hex::encode(hasher.finalize());

        metadata.name = name.to_string();
        metadata.version = version.to_string();
        metadata.size = payload_bytes.len() as u64;
        metadata.checksum = checksum;
        metadata.files = files;
        metadata.validate()?;

        let result = Self::pack_outer(&metadata, &metadata_path, &payload_path, &final_path);

        let _ = std::fs::remove_file(&payload_path);
        let _ = std::fs::remove_file(&metadata_path);

        result?;
        debug!(path = %final_path, "package archive created");
        Ok(Self { path: PathBuf::from(final_path), metadata })
    }

    fn pack_payload(name: &str, source_dir: &Path, payload_path: &str) -> Result<Vec<String>> {
        let tar_gz = File::create(payload_path)?;
        let encoder = GzEncoder::new(tar_gz, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let mut files = Vec::new();
        let entries: Vec<_> = WalkDir::new(source_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.path() != source_dir)
            .collect();

        for entry in entries {
            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .unwrap_or_else(|_| entry.path());
            let archive_path = Path::new(name).join(relative);

            if entry.file_type().is_dir() {
                builder.append_dir(&archive_path, entry.path())?;
            } else if entry.file_type().is_file() {
                let mut source_file = File::open(entry.path())?;
                builder.append_file(&archive_path, &mut source_file)?;
                files.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }

        builder.into_inner()?.finish()?;
        Ok(files)
    }

    fn pack_outer(
        metadata: &PackageMetadata,
        metadata_path: &str,
        payload_path: &str,
        final_path: &str,
    ) -> Result<()> {
        let serialized = toml::to_string_pretty(metadata)?;
        std::fs::write(metadata_path, serialized)?;

        let outer = File::create(final_path)?;
        let encoder = GzEncoder::new(outer, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.append_path_with_name(metadata_path, METADATA_MEMBER)?;
        builder.append_path_with_name(payload_path, PAYLOAD_MEMBER)?;
        builder.into_inner()?.finish()?;
        Ok(())
    }

    /// What: Open an existing `.alp` archive and parse its metadata member.
    ///
    /// Inputs:
    /// - `path`: path to the `.alp` file.
    ///
    /// Output:
    /// - `Ok(Package)` with metadata parsed and structurally validated.
    /// - `Err(AlpError::PackageFormatError)` if either named member is
    ///   absent, or the metadata document fails to parse or validate.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let decoder = GzDecoder::new(file);
        let mut archive = tar::Archive::new(decoder);

        let mut metadata_doc: Option<String> = None;
        let mut has_payload = false;

        for entry in archive.entries()? {
            let mut entry = entry?;
            let entry_path = entry.path()?.into_owned();
            if entry_path == Path::new(METADATA_MEMBER) {
                let mut buf = String::new();
                entry.read_to_string(&mut buf)?;
                metadata_doc = Some(buf);
            } else if entry_path == Path::new(PAYLOAD_MEMBER) {
                has_payload = true;
            }
        }

        let metadata_doc = metadata_doc.ok_or_else(|| {
            AlpError::PackageFormatError(format!("archive is missing {METADATA_MEMBER}"))
        })?;
        if !has_payload {
            return Err(AlpError::PackageFormatError(format!(
                "archive is missing {PAYLOAD_MEMBER}"
            )));
        }

        let metadata: PackageMetadata = toml::from_str(&metadata_doc)?;
        metadata.validate()?;

        Ok(Self { path: path.to_path_buf(), metadata })
    }

    /// What: Verify that the payload member's SHA-256 matches the declared
    /// `checksum`.
    ///
    /// Inputs:
    /// - `self`: a loaded or freshly created package.
    ///
    /// Output: `Ok(true)` iff the digests match; comparison is
    /// constant-time so checksum verification does not leak timing
    /// information about where a mismatch occurs.
    pub fn verify_checksum(&self) -> Result<bool> {
        let actual = self.compute_checksum()?;
        Ok(constant_time_eq(actual.as_bytes(), self.metadata.checksum.as_bytes()))
    }

    /// What: Compute the SHA-256 of the archive's payload member.
    ///
    /// Inputs:
    /// - `self`: a loaded package.
    ///
    /// Output: `Ok(hex_digest)`, independent of what `metadata.checksum`
    /// declares — used by callers that need to report a mismatch's actual
    /// value.
    pub fn compute_checksum(&self) -> Result<String> {
        let payload = self.read_payload_bytes()?;
        let mut hasher = Sha256::new();
        hasher.update(&payload);
        Ok(hex::encode(hasher.finalize()))
    }

    fn read_payload_bytes(&self) -> Result<Vec<u8>> {
        let file = File::open(&self.path)?;
        let decoder = GzDecoder::new(file);
        let mut archive = tar::Archive::new(decoder);
        for entry in archive.entries()? {
            let mut entry = entry?;
            if entry.path()?.as_ref() == Path::new(PAYLOAD_MEMBER) {
                let mut buf = Vec::new();
                entry.read_to_end(&mut buf)?;
                return Ok(buf);
            }
        }
        Err(AlpError::PackageFormatError(format!("archive is missing {PAYLOAD_MEMBER}")))
    }

    /// What: Extract the payload into `dest`.
    ///
    /// Inputs:
    /// - `self`: a loaded package.
    /// - `dest`: destination directory, created if missing.
    ///
    /// Output:
    /// - `Ok(())` once every payload entry has been written under `dest`.
    /// - `Err(AlpError::PackageFormatError)` if any entry's path is
    ///   absolute, contains a `..` component, or is a symlink whose target
    ///   would escape `dest` — the whole archive is rejected before any
    ///   file is written, rather than silently sanitized entry by entry.
    #[instrument(skip(self, dest), fields(package = %self.metadata.name))]
    pub fn extract_data(&self, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        let payload = self.read_payload_bytes()?;

        {
            let decoder = GzDecoder::new(Cursor::new(&payload));
            let mut archive = tar::Archive::new(decoder);
            for entry in archive.entries()? {
                let entry = entry?;
                let entry_path = entry.path()?.into_owned();
                reject_unsafe_path(&entry_path)?;

                let entry_type = entry.header().entry_type();
                if entry_type.is_symlink() || entry_type.is_hard_link() {
                    if let Some(link_target) = entry.link_name()? {
                        reject_unsafe_path(&link_target)?;
                    }
                }
            }
        }

        std::fs::create_dir_all(dest)?;
        let decoder = GzDecoder::new(Cursor::new(&payload));
        let mut archive = tar::Archive::new(decoder);
        archive.unpack(dest)?;
        debug!(dest = %dest.display(), "payload extracted");
        Ok(())
    }
}

fn reject_unsafe_path(path: &Path) -> Result<()> {
    if path.is_absolute() {
        warn!(path = %path.display(), "rejecting archive with absolute entry path");
        return Err(AlpError::PackageFormatError(format!(
            "archive entry has an absolute path: {}",
            path.display()
        )));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        warn!(path = %path.display(), "rejecting archive with path traversal entry");
        return Err(AlpError::PackageFormatError(format!(
            "archive entry attempts path traversal: {}",
            path.display()
        )));
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
