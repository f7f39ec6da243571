use crate::config::Config;
use crate::error::ObjectStorageError;
use crate::store::AttachmentStore;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use std::time::Duration;

/// S3-compatible attachment storage. Uploads never pass through the service:
/// callers get a pre-signed PUT URL and the bucket notifies us when the
/// object lands.
pub struct ObjectStorage {
    pub client: Client,
    bucket: String,
    service: String,
    endpoint: String,
    url_expiration: Duration,
}

impl ObjectStorage {
    pub async fn new(cfg: &Config) -> Result<Self, ObjectStorageError> {
        let region = cfg.storage.aws_region.clone();
        let endpoint_url = cfg.storage.aws_endpoint_url_s3.clone();
        let endpoint = endpoint_url.clone();
        let credentials = Credentials::new(
            &cfg.storage.aws_access_key_id,
            &cfg.storage.aws_secret_access_key,
            None,
            None,
            "config",
        );

        let config = aws_config::from_env()
            .region(aws_config::Region::new(region))
            .endpoint_url(endpoint_url)
            .credentials_provider(credentials)
            .load()
            .await;

        let client = Client::new(&config);

        Ok(Self {
            client,
            bucket: cfg.app.get_bucket().to_string(),
            service: cfg.storage.service.to_string(),
            endpoint,
            url_expiration: cfg.app.signed_url_expiration(),
        })
    }
}

#[async_trait]
impl AttachmentStore for ObjectStorage {
    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, ObjectStorageError> {
        let presigning = PresigningConfig::expires_in(self.url_expiration)
            .map_err(|e| ObjectStorageError::PresignConfig(Box::new(e)))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| ObjectStorageError::S3Error(Box::new(e)))?;

        tracing::info!("issued upload url for key: {}", key);
        Ok(request.uri().to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ObjectStorageError::S3Error(Box::new(e)))?;

        tracing::info!("deleted object: {}", key);
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        crate::get_s3_url(&self.service, &self.endpoint, &self.bucket, key)
    }
}
