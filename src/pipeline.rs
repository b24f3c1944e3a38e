//! Boundary to downstream processing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;

use crate::goes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Png,
    Tiff,
    Both,
}

impl OutputFormat {
    pub fn as_str(self: &Self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Tiff => "tiff",
            Self::Both => "both",
        }
    }
}

pub trait Pipeline {
    /// Process one mirrored file into a per-file directory under
    /// `output_root`, mirroring its position under `input_root`. Returns
    /// the directory holding the derived artifacts.
    fn process(
        &self,
        input_file: &Path,
        input_root: &Path,
        output_root: &Path,
        format: OutputFormat,
        overwrite: bool,
    ) -> Result<PathBuf>;
}

/// Creates the per-file output directory and records a metadata document
/// describing the source. Radiometric decoding of the file contents
/// belongs to external processors.
pub struct MetadataWriter;

impl Pipeline for MetadataWriter {
    fn process(
        &self,
        input_file: &Path,
        input_root: &Path,
        output_root: &Path,
        format: OutputFormat,
        overwrite: bool,
    ) -> Result<PathBuf> {
        let stem = input_file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .context("input file has no usable name")?;

        // Mirror the input tree below the output root; files from outside
        // the input root land under external/.
        let input_parent = input_file.parent().unwrap_or(Path::new(""));
        let artifact_dir = match input_parent.strip_prefix(input_root) {
            Ok(relative) => output_root.join(relative).join(stem),
            Err(_) => output_root.join("external").join(stem),
        };
        fs::create_dir_all(&artifact_dir)?;

        let metadata_path = artifact_dir.join(format!("{stem}_metadata.json"));
        if metadata_path.exists() && !overwrite {
            return Ok(artifact_dir);
        }

        let file_name = input_file
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(stem);
        let size_bytes = fs::metadata(input_file)?.len();
        let tokens = goes::decode_tokens(file_name);

        let record = json!({
            "source": input_file.display().to_string(),
            "size_bytes": size_bytes,
            "satellite": tokens.as_ref().map(|tokens| tokens.satellite.clone()),
            "product": tokens.as_ref().map(|tokens| tokens.product.clone()),
            "start_time": tokens.as_ref().map(|tokens| tokens.start_time.clone()),
            "band": goes::band_of(file_name),
            "format": format.as_str(),
            "processed_at": Utc::now().to_rfc3339(),
        });
        fs::write(&metadata_path, serde_json::to_string_pretty(&record)?)?;
        Ok(artifact_dir)
    }
}
