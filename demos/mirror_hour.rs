use anyhow::Result;
use std::path::PathBuf;

extern crate goes_sync;
use goes_sync::noaa::Noaa;
use goes_sync::partition::{TimePartition, TimeWindow};
use goes_sync::s3;
use goes_sync::sync::{sync, DownloadRequest};

#[tokio::main]
async fn main() -> Result<()> {
    let output_root = PathBuf::from("./outputs");

    let request = DownloadRequest {
        product: "ABI-L2-MCMIPF".to_string(),
        satellite: "19".to_string(),
        window: TimeWindow::Single(TimePartition::new(2025, 31, 15)),
        band: None,
        file_name: None,
        all_files: false,
        output_root,
        overwrite: false,
    };

    let store = Noaa::as_anon(s3::DEFAULT_REGION).await;
    let report = sync(&store, &request).await?;

    for path in &report.mirrored {
        println!("{}", path.display());
    }

    Ok(())
}
