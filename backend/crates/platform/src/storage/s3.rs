//! S3-compatible object store backend

use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

use super::{BlobStore, StorageError, StorageResult, validate_key};

/// Blobs as objects under `key_prefix` in one bucket.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    key_prefix: String,
    public_base_url: String,
}

impl S3BlobStore {
    /// `public_base_url` defaults to the virtual-hosted bucket endpoint.
    pub fn new(
        client: Client,
        bucket: impl Into<String>,
        key_prefix: impl Into<String>,
        public_base_url: Option<String>,
    ) -> Self {
        let bucket = bucket.into();
        let public_base_url = public_base_url
            .unwrap_or_else(|| format!("https://{bucket}.s3.amazonaws.com"))
            .trim_end_matches('/')
            .to_string();

        Self {
            client,
            bucket,
            key_prefix: key_prefix.into(),
            public_base_url,
        }
    }

    /// Build a client from the standard AWS environment
    /// (`AWS_REGION`, credentials chain, `AWS_ENDPOINT_URL`).
    pub async fn from_env(
        bucket: impl Into<String>,
        key_prefix: impl Into<String>,
        public_base_url: Option<String>,
    ) -> Self {
        let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&shared), bucket, key_prefix, public_base_url)
    }

    fn object_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

fn backend_error<E>(err: E) -> StorageError
where
    E: std::error::Error,
{
    StorageError::Backend(DisplayErrorContext(err).to_string())
}

impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: Bytes) -> StorageResult<()> {
        validate_key(key)?;
        let content_type = mime_guess::from_path(key).first_or_octet_stream();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .content_type(content_type.essence_str())
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(backend_error)?;

        tracing::debug!(key, bucket = %self.bucket, "Stored blob in object store");
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>> {
        validate_key(key)?;
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                return Ok(None);
            }
            Err(err) => return Err(backend_error(err)),
        };

        let data = output.body.collect().await.map_err(backend_error)?;
        Ok(Some(data.into_bytes()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(self.object_key(prefix))
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(backend_error)?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter_map(|key| key.strip_prefix(self.key_prefix.as_str()))
                    .map(str::to_string),
            );

            match page.next_continuation_token() {
                Some(token) if page.is_truncated() == Some(true) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, self.object_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_store(public_base_url: Option<String>) -> S3BlobStore {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("eu-central-1"))
            .build();
        S3BlobStore::new(
            Client::from_conf(config),
            "civic-reports",
            "post-files/",
            public_base_url,
        )
    }

    #[test]
    fn test_default_public_url() {
        let store = offline_store(None);
        assert_eq!(
            store.public_url("p1_0_a.jpg"),
            "https://civic-reports.s3.amazonaws.com/post-files/p1_0_a.jpg"
        );
    }

    #[test]
    fn test_custom_public_url() {
        let store = offline_store(Some("https://cdn.example.org/".to_string()));
        assert_eq!(
            store.public_url("p1_0_a.jpg"),
            "https://cdn.example.org/post-files/p1_0_a.jpg"
        );
    }

    #[tokio::test]
    async fn test_invalid_key_rejected_before_network() {
        let store = offline_store(None);
        let result = store.put("../x", Bytes::new()).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
