//! Size-gated, staged object fetch. Bytes stream into a `.partial` file
//! next to the final path; the rename after verification is the commit
//! point, so a readable file at the final path is always complete.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::SyncError;
use crate::s3::{RemoteObjectRef, S3ObjOps};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    SkippedExisting,
    Downloaded,
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

fn fetch_error(key: &str, reason: impl std::fmt::Display) -> SyncError {
    SyncError::Fetch {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// A local file whose size matches the remote is skipped unless
/// `overwrite` is set. A size mismatch forces a re-fetch regardless of
/// `overwrite`. The remote size is read fresh here rather than trusted
/// from the listing.
pub async fn fetch_object(
    store: &impl S3ObjOps,
    bucket: &str,
    object: &RemoteObjectRef,
    target: &Path,
    overwrite: bool,
) -> Result<FetchOutcome, SyncError> {
    let key = object.key.as_str();
    let remote_size = store
        .head_object(bucket, key)
        .await
        .map_err(|err| fetch_error(key, err))?;

    if target.exists() {
        let local_size = fs::metadata(target)
            .map_err(|err| fetch_error(key, err))?
            .len() as i64;
        if local_size == remote_size {
            if !overwrite {
                info!(path = %target.display(), size = local_size, "local copy is current, skipping");
                return Ok(FetchOutcome::SkippedExisting);
            }
            info!(path = %target.display(), "overwrite requested, replacing current copy");
        } else {
            warn!(
                path = %target.display(),
                local = local_size,
                remote = remote_size,
                "local size disagrees with remote, re-fetching"
            );
        }
        fs::remove_file(target).map_err(|err| fetch_error(key, err))?;
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|err| fetch_error(key, err))?;
    }

    info!(key, size = remote_size, "transferring");
    let staging = staging_path(target);
    if let Err(err) = stream_to(store, bucket, key, &staging).await {
        // Never leave a truncated staging file behind after an I/O error.
        let _ = fs::remove_file(&staging);
        return Err(fetch_error(key, err));
    }

    let written = fs::metadata(&staging)
        .map_err(|err| fetch_error(key, err))?
        .len() as i64;
    if written != remote_size {
        // Staged file stays in place so an operator can inspect it.
        warn!(
            key,
            staged = %staging.display(),
            written,
            remote = remote_size,
            "transfer completed with the wrong size"
        );
        return Err(SyncError::SizeMismatch {
            key: key.to_string(),
            expected: remote_size,
            actual: written,
        });
    }

    fs::rename(&staging, target).map_err(|err| fetch_error(key, err))?;
    info!(path = %target.display(), size = written, "mirrored");
    Ok(FetchOutcome::Downloaded)
}

async fn stream_to(
    store: &impl S3ObjOps,
    bucket: &str,
    key: &str,
    staging: &Path,
) -> anyhow::Result<()> {
    let mut body = store.get_object(bucket, key).await?;
    // File::create truncates a stale staging file from an interrupted run.
    let mut file = File::create(staging)?;
    while let Some(bytes) = body.try_next().await? {
        file.write_all(&bytes)?;
    }
    Ok(())
}
