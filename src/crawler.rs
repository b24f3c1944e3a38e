//! Finds already-mirrored files by matching name tokens, without touching
//! the remote store.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::goes;

/// Collect mirrored `.nc` files for one satellite and product whose names
/// match the given time filter. `None` components are wildcards.
///
/// Files directly inside a directory named after the product are preferred;
/// some mirrors omit that layer, so an empty first pass falls back to the
/// whole satellite subtree. Results are sorted, which on well-formed names
/// is chronological order.
pub fn find_files(
    base_dir: &Path,
    satellite: &str,
    product: &str,
    year: Option<&str>,
    day: Option<&str>,
    hour: Option<&str>,
    minute: Option<&str>,
) -> io::Result<Vec<PathBuf>> {
    let satellite_root = base_dir.join(goes::bucket_name(satellite));

    let mut candidates = walk_nc_files(&satellite_root, Some(product))?;
    if candidates.is_empty() {
        candidates = walk_nc_files(&satellite_root, None)?;
    }

    let time_token = goes::time_token(year, day, hour, minute);
    let mut matched: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|path| {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("");
            name.contains(product) && name.contains(&time_token)
        })
        .collect();
    matched.sort();
    Ok(matched)
}

fn walk_nc_files(root: &Path, parent_name: Option<&str>) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !root.is_dir() {
        return Ok(files);
    }

    let mut stack = vec![root.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|ext| ext.to_str()) == Some("nc") {
                if let Some(required) = parent_name {
                    let parent = path
                        .parent()
                        .and_then(|dir| dir.file_name())
                        .and_then(|name| name.to_str());
                    if parent != Some(required) {
                        continue;
                    }
                }
                files.push(path);
            }
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    const FILE_1500: &str = "OR_ABI-L2-LSTF-M6_G19_s20250311500204_e20250311509512.nc";
    const FILE_1600: &str = "OR_ABI-L2-LSTF-M6_G19_s20250311600204_e20250311609512.nc";

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn standard_mirror() -> TempDir {
        let dir = tempdir().unwrap();
        let product_root = dir.path().join("noaa-goes19/ABI-L2-LSTF/2025/031");
        touch(&product_root.join("15").join(FILE_1500));
        touch(&product_root.join("16").join(FILE_1600));
        dir
    }

    #[test]
    fn test_wildcard_match() {
        let dir = standard_mirror();

        let files = find_files(
            dir.path(),
            "19",
            "ABI-L2-LSTF",
            None,
            None,
            None,
            None,
        )
        .unwrap();

        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_hour_filter() {
        let dir = standard_mirror();

        let all = find_files(dir.path(), "19", "ABI-L2-LSTF", Some("2025"), Some("031"), None, None)
            .unwrap();
        let three_pm = find_files(
            dir.path(),
            "19",
            "ABI-L2-LSTF",
            Some("2025"),
            Some("031"),
            Some("15"),
            None,
        )
        .unwrap();

        assert_eq!(all.len(), 2);
        assert!(all[0].to_string_lossy().contains("s2025031150"));
        assert_eq!(three_pm.len(), 1);
        assert!(three_pm[0].to_string_lossy().ends_with(FILE_1500));
    }

    #[test]
    fn test_minute_filter() {
        let dir = standard_mirror();

        let found = find_files(
            dir.path(),
            "19",
            "ABI-L2-LSTF",
            Some("2025"),
            Some("031"),
            Some("15"),
            Some("00"),
        )
        .unwrap();
        let missed = find_files(
            dir.path(),
            "19",
            "ABI-L2-LSTF",
            Some("2025"),
            Some("031"),
            Some("15"),
            Some("30"),
        )
        .unwrap();

        assert_eq!(found.len(), 1);
        assert!(missed.is_empty());
    }

    #[test]
    fn test_product_directory_pass() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("noaa-goes19/ABI-L2-LSTF").join(FILE_1500));
        touch(&dir.path().join("noaa-goes19/scratch").join(FILE_1600));

        let files = find_files(dir.path(), "19", "ABI-L2-LSTF", None, None, None, None).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].to_string_lossy().ends_with(FILE_1500));
    }

    #[test]
    fn test_subtree_fallback() {
        let dir = tempdir().unwrap();
        // Flat mirror without the hour layer: files sit under the day.
        touch(
            &dir.path()
                .join("noaa-goes19/ABI-L2-LSTF/2025/031")
                .join(FILE_1500),
        );

        let files = find_files(dir.path(), "19", "ABI-L2-LSTF", None, None, None, None).unwrap();

        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_product_name_filter() {
        let dir = standard_mirror();
        touch(
            &dir.path()
                .join("noaa-goes19/ABI-L2-LSTF/2025/031/15")
                .join("OR_ABI-L2-MCMIPF-M6_G19_s20250311500204.nc"),
        );

        let files = find_files(dir.path(), "19", "ABI-L2-LSTF", None, None, None, None).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files
            .iter()
            .all(|path| path.to_string_lossy().contains("LSTF")));
    }

    #[test]
    fn test_ignores_non_nc_and_other_satellites() {
        let dir = standard_mirror();
        touch(
            &dir.path()
                .join("noaa-goes19/ABI-L2-LSTF/2025/031/15/notes.txt"),
        );
        touch(
            &dir.path()
                .join("noaa-goes16/ABI-L2-LSTF/2025/031/15")
                .join(FILE_1500),
        );

        let files = find_files(dir.path(), "19", "ABI-L2-LSTF", None, None, None, None).unwrap();

        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_missing_satellite_dir() {
        let dir = tempdir().unwrap();

        let files = find_files(dir.path(), "18", "ABI-L2-LSTF", None, None, None, None).unwrap();

        assert!(files.is_empty());
    }
}
