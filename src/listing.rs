//! Partition listing and the filter chain that narrows it.

use crate::error::SyncError;
use crate::goes;
use crate::s3::{RemoteObjectRef, S3ObjOps};

// S3 pages arrive sorted already; sorting again keeps the contract
// explicit so "first match" stays chronological within the hour.
pub async fn list_partition(
    store: &impl S3ObjOps,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<RemoteObjectRef>, SyncError> {
    let mut objects = store
        .list_objects(bucket, prefix)
        .await
        .map_err(|err| SyncError::Listing {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            reason: err.to_string(),
        })?;
    objects.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(objects)
}

/// Filters applied in order: time token, band, exact filename, then the
/// first-only cut.
#[derive(Debug, Default)]
pub struct Selection<'a> {
    pub time_token: Option<String>,
    pub band: Option<&'a str>,
    pub file_name: Option<&'a str>,
    pub all_files: bool,
}

pub fn select_objects(
    objects: Vec<RemoteObjectRef>,
    selection: &Selection<'_>,
) -> Vec<RemoteObjectRef> {
    let mut candidates = objects;

    if let Some(token) = &selection.time_token {
        candidates.retain(|object| object.key.contains(token));
    }
    if let Some(band) = selection.band {
        let token = goes::band_token(band);
        candidates.retain(|object| object.key.contains(&token));
    }
    if let Some(name) = selection.file_name {
        candidates.retain(|object| object.file_name() == name);
    }
    if !selection.all_files {
        candidates.truncate(1);
    }
    candidates
}
