use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("no route to the object store")]
    NetworkUnavailable,

    #[error("listing failed for s3://{bucket}/{prefix}: {reason}")]
    Listing {
        bucket: String,
        prefix: String,
        reason: String,
    },

    #[error("fetch failed for {key}: {reason}")]
    Fetch { key: String, reason: String },

    #[error("size mismatch after transfer of {key}: wrote {actual} bytes, remote reports {expected}")]
    SizeMismatch {
        key: String,
        expected: i64,
        actual: i64,
    },

    #[error("invalid time window: {0}")]
    Window(String),
}
