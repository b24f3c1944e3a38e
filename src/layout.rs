use std::path::{Path, PathBuf};

use crate::partition::TimePartition;

/// `{root}/{bucket}/{product}/{year}/{day:03}/{hour:02}/{filename}`.
/// The crawler walks this same nesting; existing mirrors depend on it.
pub fn local_path(
    output_root: &Path,
    bucket: &str,
    product: &str,
    partition: &TimePartition,
    filename: &str,
) -> PathBuf {
    output_root
        .join(bucket)
        .join(product)
        .join(partition.year.to_string())
        .join(partition.day_str())
        .join(partition.hour_str())
        .join(filename)
}
