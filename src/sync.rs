//! One sync run: expand the window, list each partition, filter, fetch.
//! Partition and object failures are contained; only an unreachable store
//! aborts the run.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::SyncError;
use crate::fetch::{self, FetchOutcome};
use crate::goes;
use crate::layout;
use crate::listing::{self, Selection};
use crate::manifest::Manifest;
use crate::partition::{TimePartition, TimeWindow};
use crate::s3::S3ObjOps;

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub product: String,
    pub satellite: String,
    pub window: TimeWindow,
    pub band: Option<String>,
    /// Exact filename to fetch; narrows each partition to at most one object.
    pub file_name: Option<String>,
    pub all_files: bool,
    pub output_root: PathBuf,
    pub overwrite: bool,
}

#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub key: String,
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    /// Local paths verified this run, freshly transferred or size-matched.
    pub mirrored: Vec<PathBuf>,
    pub failures: Vec<FetchFailure>,
    pub partitions_scanned: usize,
    pub transferred: usize,
    pub skipped: usize,
}

impl SyncReport {
    /// Zero matches is a valid outcome, not an error.
    pub fn is_noop(&self) -> bool {
        self.mirrored.is_empty() && self.failures.is_empty()
    }
}

pub async fn sync(
    store: &impl S3ObjOps,
    request: &DownloadRequest,
) -> Result<SyncReport, SyncError> {
    store.preflight().await.map_err(|err| {
        warn!(%err, "store preflight failed");
        SyncError::NetworkUnavailable
    })?;

    let bucket = goes::bucket_name(&request.satellite);
    let partitions = request.window.expand();
    let mut report = SyncReport::default();

    for partition in &partitions {
        report.partitions_scanned += 1;
        sync_partition(store, request, &bucket, partition, &mut report).await;
    }

    if !report.is_noop() {
        if let Err(err) = update_manifest(request, &report) {
            warn!(%err, "manifest update failed");
        }
    }

    info!(
        mirrored = report.mirrored.len(),
        transferred = report.transferred,
        skipped = report.skipped,
        failed = report.failures.len(),
        partitions = report.partitions_scanned,
        "sync finished"
    );
    Ok(report)
}

async fn sync_partition(
    store: &impl S3ObjOps,
    request: &DownloadRequest,
    bucket: &str,
    partition: &TimePartition,
    report: &mut SyncReport,
) {
    let prefix = goes::key_prefix(&request.product, partition);
    info!(bucket, prefix = prefix.as_str(), "scanning partition");

    let objects = match listing::list_partition(store, bucket, &prefix).await {
        Ok(objects) => objects,
        Err(err) => {
            // An unlistable prefix is a zero-result partition, not a
            // failed run.
            warn!(%err, "listing failed, treating partition as empty");
            return;
        }
    };

    let minute_token = partition.minute_str().map(|minute| {
        goes::time_token(
            Some(&partition.year.to_string()),
            Some(&partition.day_str()),
            Some(&partition.hour_str()),
            Some(&minute),
        )
    });
    let selection = Selection {
        time_token: minute_token,
        band: request.band.as_deref(),
        file_name: request.file_name.as_deref(),
        all_files: request.all_files,
    };
    let selected = listing::select_objects(objects, &selection);
    if selected.is_empty() {
        info!(prefix = prefix.as_str(), "no objects matched");
        return;
    }

    let total = selected.len();
    let width = total.to_string().len().max(2);
    info!(
        count = total,
        bytes = selected.iter().map(|object| object.size_bytes).sum::<i64>(),
        "objects selected"
    );

    for (index, object) in selected.iter().enumerate() {
        let target = layout::local_path(
            &request.output_root,
            bucket,
            &request.product,
            partition,
            object.file_name(),
        );
        info!(
            progress = %format!("{:0width$}/{:0width$}", index + 1, total, width = width),
            key = object.key.as_str(),
            "syncing object"
        );
        match fetch::fetch_object(store, bucket, object, &target, request.overwrite).await {
            Ok(FetchOutcome::Downloaded) => {
                report.transferred += 1;
                report.mirrored.push(target);
            }
            Ok(FetchOutcome::SkippedExisting) => {
                report.skipped += 1;
                report.mirrored.push(target);
            }
            Err(err) => {
                error!(key = object.key.as_str(), %err, "object failed");
                report.failures.push(FetchFailure {
                    key: object.key.clone(),
                    path: target,
                    reason: err.to_string(),
                });
            }
        }
    }
}

fn update_manifest(request: &DownloadRequest, report: &SyncReport) -> anyhow::Result<()> {
    let root = &request.output_root;
    let mut manifest = Manifest::load_or_default(root);
    for path in &report.mirrored {
        let size = fs::metadata(path)?.len() as i64;
        manifest.record(&relative_key(root, path), size);
    }
    for failure in &report.failures {
        manifest.invalidate(&relative_key(root, &failure.path));
    }
    manifest.save(root)
}

fn relative_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_FILE;
    use crate::s3::mock::MockStore;
    use tempfile::tempdir;

    const KEY_1500_C02: &str =
        "ABI-L1b-RadF/2025/031/15/OR_ABI-L1b-RadF-M6C02_G19_s20250311500204.nc";
    const KEY_1500_C13: &str =
        "ABI-L1b-RadF/2025/031/15/OR_ABI-L1b-RadF-M6C13_G19_s20250311500204.nc";
    const KEY_1510_C13: &str =
        "ABI-L1b-RadF/2025/031/15/OR_ABI-L1b-RadF-M6C13_G19_s20250311510204.nc";

    fn request(output_root: PathBuf) -> DownloadRequest {
        DownloadRequest {
            product: "ABI-L1b-RadF".to_string(),
            satellite: "19".to_string(),
            window: TimeWindow::Single(TimePartition::new(2025, 31, 15)),
            band: None,
            file_name: None,
            all_files: true,
            output_root,
            overwrite: false,
        }
    }

    #[tokio::test]
    async fn test_zero_match_noop() {
        let store = MockStore::new();
        let dir = tempdir().unwrap();
        let output_root = dir.path().join("mirror");

        let report = sync(&store, &request(output_root.clone())).await.unwrap();

        assert!(report.is_noop());
        assert_eq!(report.partitions_scanned, 1);
        assert_eq!(output_root.exists(), false);
    }

    #[tokio::test]
    async fn test_preflight_failure_aborts_run() {
        let store = MockStore::new()
            .put(KEY_1500_C02, b"two")
            .failing_preflight();
        let dir = tempdir().unwrap();
        let output_root = dir.path().join("mirror");

        let err = sync(&store, &request(output_root.clone())).await.unwrap_err();

        assert!(matches!(err, SyncError::NetworkUnavailable));
        // The run must stop before any listing or transfer is attempted.
        assert_eq!(store.list_count(), 0);
        assert_eq!(store.get_count(), 0);
        assert_eq!(output_root.exists(), false);
    }

    #[tokio::test]
    async fn test_mirror_and_manifest() {
        let store = MockStore::new()
            .put(KEY_1500_C02, b"two")
            .put(KEY_1500_C13, b"thirteen");
        let dir = tempdir().unwrap();
        let report = sync(&store, &request(dir.path().to_path_buf()))
            .await
            .unwrap();

        assert_eq!(report.transferred, 2);
        assert_eq!(report.failures.len(), 0);
        assert!(report.mirrored.iter().all(|path| path.exists()));
        assert!(report
            .mirrored
            .iter()
            .all(|path| path.starts_with(dir.path().join("noaa-goes19/ABI-L1b-RadF/2025/031/15"))));

        let manifest = Manifest::load_or_default(dir.path());
        assert_eq!(manifest.len(), 2);
        assert_eq!(dir.path().join(MANIFEST_FILE).exists(), true);
    }

    #[tokio::test]
    async fn test_second_run_skips() {
        let store = MockStore::new()
            .put(KEY_1500_C02, b"two")
            .put(KEY_1500_C13, b"thirteen");
        let dir = tempdir().unwrap();
        let request = request(dir.path().to_path_buf());

        sync(&store, &request).await.unwrap();
        let second = sync(&store, &request).await.unwrap();

        assert_eq!(second.transferred, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(store.get_count(), 2);
    }

    #[tokio::test]
    async fn test_range_window_partitions() {
        let key_1600 = "ABI-L1b-RadF/2025/031/16/OR_ABI-L1b-RadF-M6C02_G19_s20250311600204.nc";
        let store = MockStore::new()
            .put(KEY_1500_C02, b"three pm")
            .put(key_1600, b"four pm");
        let dir = tempdir().unwrap();
        let mut request = request(dir.path().to_path_buf());
        request.window = TimeWindow::parse_range("2025-01-31_14:00", "2025-01-31_16:00").unwrap();

        let report = sync(&store, &request).await.unwrap();

        assert_eq!(report.partitions_scanned, 3);
        assert_eq!(report.transferred, 2);
    }

    #[tokio::test]
    async fn test_minute_filter() {
        let store = MockStore::new()
            .put(KEY_1500_C13, b"on the hour")
            .put(KEY_1510_C13, b"ten past");
        let dir = tempdir().unwrap();
        let mut request = request(dir.path().to_path_buf());
        request.window =
            TimeWindow::Single(TimePartition::new(2025, 31, 15).with_minute(10));

        let report = sync(&store, &request).await.unwrap();

        assert_eq!(report.transferred, 1);
        assert!(report.mirrored[0]
            .to_string_lossy()
            .contains("s20250311510204"));
    }

    #[tokio::test]
    async fn test_exact_filename() {
        let store = MockStore::new()
            .put(KEY_1500_C02, b"two")
            .put(KEY_1500_C13, b"thirteen");
        let dir = tempdir().unwrap();
        let mut request = request(dir.path().to_path_buf());
        request.all_files = false;
        request.file_name = Some("OR_ABI-L1b-RadF-M6C13_G19_s20250311500204.nc".to_string());

        let report = sync(&store, &request).await.unwrap();

        assert_eq!(report.transferred, 1);
        assert!(report.mirrored[0].to_string_lossy().contains("C13"));
    }

    #[tokio::test]
    async fn test_failure_isolation() {
        // The failing key sorts first, so the healthy one runs after it.
        let bad_key = "ABI-L1b-RadF/2025/031/15/OR_ABI-L1b-RadF-M6C01_G19_s20250311500204.nc";
        let store = MockStore::new()
            .put_with_reported_size(bad_key, b"short", 999)
            .put(KEY_1500_C13, b"thirteen");
        let dir = tempdir().unwrap();

        let report = sync(&store, &request(dir.path().to_path_buf()))
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].key, bad_key);
        assert_eq!(report.transferred, 1);

        let manifest = Manifest::load_or_default(dir.path());
        assert_eq!(manifest.len(), 1);
    }

    #[tokio::test]
    async fn test_listing_failure_contained() {
        let store = MockStore::new().failing_listing();
        let dir = tempdir().unwrap();
        let mut request = request(dir.path().to_path_buf());
        request.window = TimeWindow::parse_range("2025-01-31_15:00", "2025-01-31_16:00").unwrap();

        let report = sync(&store, &request).await.unwrap();

        assert!(report.is_noop());
        assert_eq!(report.partitions_scanned, 2);
    }
}
