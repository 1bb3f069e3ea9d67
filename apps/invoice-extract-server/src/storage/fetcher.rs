//! Document fetchers
//!
//! Defines the retrieval trait the resolver depends on and the production
//! implementation backed by reqwest (presigned URLs) and the S3 SDK.

use std::time::Duration;

use async_trait::async_trait;

use super::S3Client;
use crate::error::StorageError;

/// Bounded wait for presigned URL downloads
pub const URL_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Byte retrieval capability
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    /// Download the body behind a (presigned) URL
    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, StorageError>;

    /// Read an object by bucket and key
    ///
    /// Unlike [`ObjectFetcher::fetch_url`] this has no explicit bound; the wait
    /// is whatever the S3 SDK defaults allow.
    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;
}

/// Plain HTTP downloader for presigned URLs
#[derive(Clone)]
pub struct UrlFetcher {
    http: reqwest::Client,
}

impl UrlFetcher {
    pub fn new() -> Result<Self, StorageError> {
        Self::with_timeout(URL_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// GET the URL, treating any non-2xx status as a failure
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        // reqwest embeds the full URL in its errors; strip it with the signature
        let response = self.http.get(url).send().await.map_err(|e| e.without_url())?;

        if !response.status().is_success() {
            return Err(StorageError::Status {
                status: response.status().as_u16(),
                url: redact_query(url),
            });
        }

        let data = response.bytes().await.map_err(|e| e.without_url())?.to_vec();
        tracing::debug!("Fetched {} bytes from presigned URL", data.len());
        Ok(data)
    }
}

/// Production fetcher combining presigned URL and S3 access
#[derive(Clone)]
pub struct StorageFetcher {
    urls: UrlFetcher,
    s3: S3Client,
}

impl StorageFetcher {
    pub fn new(urls: UrlFetcher, s3: S3Client) -> Self {
        Self { urls, s3 }
    }
}

#[async_trait]
impl ObjectFetcher for StorageFetcher {
    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        self.urls.fetch(url).await
    }

    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.s3.get_object(bucket, key).await
    }
}

/// Drop the query string so presigned signatures never end up in messages
fn redact_query(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{}?<redacted>", base),
        None => url.to_string(),
    }
}

/// In-memory fetcher for tests
#[cfg(test)]
#[derive(Default)]
pub struct MockFetcher {
    pub urls: std::collections::HashMap<String, Vec<u8>>,
    pub objects: std::collections::HashMap<(String, String), Vec<u8>>,
    pub fail_with: Option<String>,
    pub calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockFetcher {
    pub fn with_url(mut self, url: &str, data: &[u8]) -> Self {
        self.urls.insert(url.to_string(), data.to_vec());
        self
    }

    pub fn with_object(mut self, bucket: &str, key: &str, data: &[u8]) -> Self {
        self.objects
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
        self
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ObjectFetcher for MockFetcher {
    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        self.calls.lock().unwrap().push(format!("url:{}", url));
        if let Some(message) = &self.fail_with {
            return Err(StorageError::SdkError(message.clone()));
        }
        self.urls.get(url).cloned().ok_or(StorageError::Status {
            status: 404,
            url: url.to_string(),
        })
    }

    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("s3:{}/{}", bucket, key));
        if let Some(message) = &self.fail_with {
            return Err(StorageError::SdkError(message.clone()));
        }
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}
