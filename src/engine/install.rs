//! Downloading and unpacking engine release archives.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::{debug, info};
use zip::ZipArchive;

use crate::http::{HttpClient, ProgressFn};

/// Downloads a release ZIP and unpacks it into `dest`.
///
/// The archive is staged in a temporary directory inside `dest` so the final
/// move stays on one filesystem. A single top-level directory inside the
/// archive is flattened away. Entries colliding with existing files are kept
/// or replaced per `overwrite`.
pub async fn download_and_extract(
    http: &HttpClient,
    url: &str,
    dest: &Path,
    overwrite: bool,
    progress: Option<&ProgressFn<'_>>,
) -> Result<()> {
    fs::create_dir_all(dest)
        .with_context(|| format!("failed to create '{}'", dest.display()))?;

    let staging = tempfile::Builder::new()
        .prefix(".godotkit-staging-")
        .tempdir_in(dest)
        .context("failed to create a staging directory")?;
    let archive_path = staging.path().join("download.zip");

    {
        let mut file = File::create(&archive_path)
            .with_context(|| format!("failed to create '{}'", archive_path.display()))?;
        let bytes = http
            .download_file(url, &mut file, progress)
            .await
            .with_context(|| format!("failed to download '{url}'"))?;
        debug!("Downloaded {} bytes to {:?}", bytes, archive_path);
    }

    extract_archive(&archive_path, &staging.path().join("extract"), dest, overwrite)?;
    info!("Installed archive contents into {:?}", dest);
    Ok(())
}

fn extract_archive(
    archive_path: &Path,
    extract_to: &Path,
    dest: &Path,
    overwrite: bool,
) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("failed to open '{}'", archive_path.display()))?;
    let mut archive =
        ZipArchive::new(file).context("the downloaded file is not a valid ZIP archive")?;
    if archive.is_empty() {
        bail!("the downloaded archive is empty");
    }

    fs::create_dir_all(extract_to)?;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("failed to read ZIP entry {i}"))?;

        let Some(entry_path) = entry.enclosed_name() else {
            debug!("Skipping entry with invalid path");
            continue;
        };
        let full_path = extract_to.join(entry_path);

        if entry.is_dir() {
            fs::create_dir_all(&full_path)?;
        } else {
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&full_path)
                .with_context(|| format!("failed to extract '{}'", full_path.display()))?;
            io::copy(&mut entry, &mut out)?;

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                if let Err(err) = fs::set_permissions(&full_path, fs::Permissions::from_mode(mode))
                {
                    debug!("Failed to set permissions on {:?}: {}", full_path, err);
                }
            }
        }
    }

    // A single top-level directory is flattened: its contents land in dest.
    let entries: Vec<PathBuf> = fs::read_dir(extract_to)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<_>>()?;
    let source_dir = match entries.as_slice() {
        [single] if single.is_dir() => single.clone(),
        _ => extract_to.to_path_buf(),
    };

    debug!("Moving contents from {:?} to {:?}", source_dir, dest);
    for item in fs::read_dir(&source_dir)? {
        let item = item?.path();
        let Some(name) = item.file_name() else {
            continue;
        };
        let target = dest.join(name);
        if target.exists() {
            if overwrite {
                if target.is_dir() {
                    fs::remove_dir_all(&target)?;
                } else {
                    fs::remove_file(&target)?;
                }
            } else {
                debug!("Keeping existing {:?}", target);
                continue;
            }
        }
        fs::rename(&item, &target)
            .with_context(|| format!("failed to install '{}'", target.display()))?;
    }

    Ok(())
}
