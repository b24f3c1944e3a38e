//! Client construction and the narrow slice of S3 the sync engine needs.
use anyhow::Result;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

pub const DEFAULT_REGION: &str = "us-east-1";

// The GOES buckets allow unauthenticated reads.
pub async fn anon_client(region: &str) -> Client {
    let region = Region::new(region.to_string());
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .no_credentials()
        .region(region)
        .load()
        .await;
    Client::new(&config)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObjectRef {
    pub key: String,
    /// Size from the listing; re-checked with a head request before any
    /// transfer because the archive rewrites objects in place.
    pub size_bytes: i64,
}

impl RemoteObjectRef {
    pub fn file_name(self: &Self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Store operations the engine depends on. The real implementation talks
/// to S3; tests substitute an in-memory store.
pub trait S3ObjOps {
    /// Cheap reachability check; a failure here aborts the whole run.
    async fn preflight(self: &Self) -> Result<()>;

    async fn list_objects(self: &Self, bucket: &str, prefix: &str)
        -> Result<Vec<RemoteObjectRef>>;

    async fn head_object(self: &Self, bucket: &str, key: &str) -> Result<i64>;

    async fn get_object(self: &Self, bucket: &str, key: &str) -> Result<ByteStream>;
}
