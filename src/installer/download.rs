//! Package byte transport: `file://` copies and, behind the `network`
//! feature, streamed `http(s)://` downloads, both reporting progress
//! through the same callback shape the CLI's progress bars expect.

use std::path::Path;

use crate::Result;
use crate::error::AlpError;

/// What: Fetch the archive at `url` into `dest`, reporting progress.
///
/// Inputs:
/// - `url`: `file://` or `http(s)://` locator for a `.alp` archive.
/// - `dest`: destination path in the package cache.
/// - `progress`: called with `(bytes_so_far, total_bytes)`; `total_bytes`
///   is `0` when the transport cannot report a length in advance.
///
/// Output:
/// - `Ok(())` once `dest` holds the full archive.
/// - `Err(AlpError::Io)` if a `file://` source is missing.
/// - `Err(AlpError::PackageFormatError)` if a `file://` source does not
///   end in `.alp`.
/// - `Err(AlpError::Network)` for a transport failure, or if built without
///   the `network` feature and `url` is not `file://`.
///
/// Details:
/// - `file://` downloads are a plain copy (spec requires the source exist
///   and carry the package extension) so offline tests never touch the
///   network.
pub fn download(url: &str, dest: &Path, progress: &dyn Fn(u64, u64)) -> Result<()> {
    if let Some(raw_path) = url.strip_prefix("file://") {
        return download_local(Path::new(raw_path), dest, progress);
    }
    download_remote(url, dest, progress)
}

fn download_local(source: &Path, dest: &Path, progress: &dyn Fn(u64, u64)) -> Result<()> {
    if source.extension().and_then(|ext| ext.to_str()) != Some("alp") {
        return Err(AlpError::PackageFormatError(format!(
            "only .alp files can be fetched via file://, got {}",
            source.display()
        )));
    }
    if !source.exists() {
        return Err(AlpError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("source file not found: {}", source.display()),
        )));
    }
    std::fs::copy(source, dest)?;
    let size = std::fs::metadata(dest)?.len();
    progress(size, size);
    Ok(())
}

#[cfg(feature = "network")]
fn download_remote(url: &str, dest: &Path, progress: &dyn Fn(u64, u64)) -> Result<()> {
    use std::io::{Read, Write};

    let response = reqwest::blocking::get(url)?;
    let response = response.error_for_status()?;
    let total = response.content_length().unwrap_or(0);

    let mut reader = response;
    let mut file = std::fs::File::create(dest)?;
    let mut buf = [0u8; 8192];
    let mut downloaded = 0u64;
    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        file.write_all(&buf[..read])?;
        downloaded += read as u64;
        progress(downloaded, total);
    }
    Ok(())
}

#[cfg(not(feature = "network"))]
fn download_remote(url: &str, _dest: &Path, _progress: &dyn Fn(u64, u64)) -> Result<()> {
    Err(AlpError::Network(format!("cannot fetch {url}: built without the `network` feature")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_local_copies_file() {
        let src_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("app-1.0.0.alp");
        std::fs::write(&src, b"archive bytes").unwrap();

        let dest_dir = tempfile::tempdir().unwrap();
        let dest = dest_dir.path().join("app-1.0.0.alp");

        let mut last_progress = (0, 0);
        download(&format!("file://{}", src.display()), &dest, &|done, total| {
            last_progress = (done, total);
        })
        .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"archive bytes");
        assert_eq!(last_progress.0, last_progress.1);
    }

    #[test]
    fn download_local_rejects_non_alp_extension() {
        let src_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("app-1.0.0.tar.gz");
        std::fs::write(&src, b"bytes").unwrap();
        let dest = src_dir.path().join("out.alp");

        let result = download(&format!("file://{}", src.display()), &dest, &|_, _| {});
        assert!(result.is_err());
    }

    #[test]
    fn download_local_errors_on_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.alp");
        let result = download("file:///definitely/not/real/app-1.0.0.alp", &dest, &|_, _| {});
        assert!(result.is_err());
    }
}
