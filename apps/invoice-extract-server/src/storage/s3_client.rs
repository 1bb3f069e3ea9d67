//! S3-compatible storage client
//!
//! Wraps the AWS SDK for bucket/key reads. Unlike presigned URL fetches these
//! carry no explicit timeout beyond the SDK defaults.

use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    Client,
};

use crate::config::StorageConfig;
use crate::error::StorageError;

/// S3-compatible storage client
#[derive(Clone)]
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Create a new S3 client from configuration
    ///
    /// Static credentials are used when both keys are configured, otherwise the
    /// default AWS provider chain (env, profile, instance role) applies.
    pub async fn new(config: &StorageConfig) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "invoice-extract-server",
            ));
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);

        if let Some(endpoint) = &config.endpoint {
            tracing::info!("Using custom S3 endpoint: {}", endpoint);
            // Required for MinIO and other S3-compatible services
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    /// Get an object's data
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if not_found {
                    StorageError::ObjectNotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    StorageError::SdkError(format!(
                        "Failed to get object {}/{}: {}",
                        bucket,
                        key,
                        DisplayErrorContext(&e)
                    ))
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::SdkError(format!("Failed to read object body: {}", e)))?
            .into_bytes()
            .to_vec();

        tracing::debug!("Fetched s3://{}/{} ({} bytes)", bucket, key, data.len());
        Ok(data)
    }
}
