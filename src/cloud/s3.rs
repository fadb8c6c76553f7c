use crate::publish::ObjectStore;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use std::error::Error;
use std::time::Duration as StdDuration;
use tracing::debug;

/// S3 buckets; the bucket is chosen per call.
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), Box<dyn Error>> {
        let bytes = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| format!("upload to s3://{bucket}/{key} failed: {}", DisplayErrorContext(&e)))?;
        debug!(bucket, key, bytes, "Uploaded object");
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, Box<dyn Error>> {
        let out = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| format!("download of s3://{bucket}/{key} failed: {}", DisplayErrorContext(&e)))?;
        let data = out
            .body
            .collect()
            .await
            .map_err(|e| format!("reading s3://{bucket}/{key} failed: {e}"))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: StdDuration,
    ) -> Result<String, Box<dyn Error>> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| format!("invalid presign expiry {expires_in:?}: {e}"))?;
        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| format!("presigning s3://{bucket}/{key} failed: {}", DisplayErrorContext(&e)))?;
        Ok(request.uri().to_string())
    }
}
