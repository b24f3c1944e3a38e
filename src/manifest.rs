//! Cached record of what the mirror held after the last run. The
//! filesystem stays authoritative; a manifest that fails to parse is
//! simply rebuilt.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "mirror-manifest.json";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub size_bytes: i64,
    pub verified_at: DateTime<Utc>,
}

impl Manifest {
    pub fn load_or_default(output_root: &Path) -> Self {
        match fs::read_to_string(output_root.join(MANIFEST_FILE)) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn record(&mut self, relative_path: &str, size_bytes: i64) {
        self.entries.insert(
            relative_path.to_string(),
            ManifestEntry {
                size_bytes,
                verified_at: Utc::now(),
            },
        );
    }

    pub fn invalidate(&mut self, relative_path: &str) {
        self.entries.remove(relative_path);
    }

    pub fn get(&self, relative_path: &str) -> Option<&ManifestEntry> {
        self.entries.get(relative_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn save(self: &Self, output_root: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::create_dir_all(output_root)?;
        fs::write(output_root.join(MANIFEST_FILE), content)?;
        Ok(())
    }
}
