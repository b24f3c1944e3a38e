//! Read-only access to the public `noaa-goes*` buckets.

use std::time::Duration;

use anyhow::{anyhow, Result};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::s3::{self, RemoteObjectRef, S3ObjOps};

const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Noaa {
    client: Client,
    region: String,
}

impl Noaa {
    pub fn new(client: Client, region: &str) -> Self {
        Self {
            client,
            region: region.to_string(),
        }
    }

    /// The archive allows anonymous reads; no profile or credentials.
    pub async fn as_anon(region: &str) -> Self {
        let client = s3::anon_client(region).await;
        Self::new(client, region)
    }
}

impl S3ObjOps for Noaa {
    /// Any HTTP response from the regional endpoint proves a route to the
    /// store; only transport errors (DNS, timeout, refused) fail.
    async fn preflight(self: &Self) -> Result<()> {
        let url = format!("https://s3.{}.amazonaws.com/", self.region);
        let client = reqwest::Client::builder()
            .timeout(PREFLIGHT_TIMEOUT)
            .build()?;
        client.head(&url).send().await?;
        Ok(())
    }

    async fn list_objects(
        self: &Self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<RemoteObjectRef>> {
        let mut refs = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix);
            if let Some(token) = continuation.take() {
                request = request.continuation_token(token);
            }

            let page = request.send().await?;
            for object in page.contents() {
                let key = match object.key() {
                    Some(key) => key.to_string(),
                    None => continue,
                };
                refs.push(RemoteObjectRef {
                    key,
                    size_bytes: object.size().unwrap_or(0),
                });
            }

            match page.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        Ok(refs)
    }

    async fn head_object(self: &Self, bucket: &str, key: &str) -> Result<i64> {
        let head = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;
        head.content_length()
            .ok_or(anyhow!("Error reading size of remote object"))
    }

    async fn get_object(self: &Self, bucket: &str, key: &str) -> Result<ByteStream> {
        let object = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;
        Ok(object.body)
    }
}
