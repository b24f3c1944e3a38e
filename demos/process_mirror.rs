use anyhow::Result;
use std::path::PathBuf;

extern crate goes_sync;
use goes_sync::crawler;
use goes_sync::pipeline::{MetadataWriter, OutputFormat, Pipeline};

fn main() -> Result<()> {
    let input_root = PathBuf::from("./outputs");
    let output_root = PathBuf::from("./outputs/processed");

    let files = crawler::find_files(
        &input_root,
        "19",
        "ABI-L2-MCMIPF",
        Some("2025"),
        None,
        None,
        None,
    )?;

    for file in &files {
        let artifact_dir =
            MetadataWriter.process(file, &input_root, &output_root, OutputFormat::Png, false)?;
        println!("{} -> {}", file.display(), artifact_dir.display());
    }

    Ok(())
}
