//! Request resolver
//!
//! Turns the locator fields of a [`ProcessingRequest`] into document bytes.
//! Locators are checked in a fixed order and the first one whose required
//! fields are all present wins, even if a later one is also populated:
//!
//! 1. `file_content` (inline base64)
//! 2. `s3_url` (presigned URL)
//! 3. `s3_bucket` + `s3_key`
//! 4. `file_id` + `s3_bucket`, mapped onto the upload key layout

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use thiserror::Error;

use super::request::{non_empty, ProcessingRequest};
use crate::error::StorageError;
use crate::storage::ObjectFetcher;

/// Key prefix the upload function writes documents under
pub const UPLOAD_KEY_PREFIX: &str = "invoices/uploads";

/// Filename assumed when the upload metadata omits it
pub const DEFAULT_UPLOAD_FILENAME: &str = "file.pdf";

/// Client-side input errors
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid base64 for file_content: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("{context}: {source}")]
    RetrievalFailed {
        context: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("Missing file input. Provide one of: file_content (base64), s3_url, s3_bucket+s3_key, or file_id+s3_bucket")]
    MissingInput,

    #[error("Failed to obtain file content")]
    EmptyContent,
}

/// Where the document bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator<'a> {
    Inline { content: &'a str },
    PresignedUrl { url: &'a str },
    Object { bucket: &'a str, key: &'a str },
    FileId { bucket: &'a str, key: String },
}

impl<'a> Locator<'a> {
    /// Pick the first locator whose required fields are present
    pub fn from_request(request: &'a ProcessingRequest) -> Option<Self> {
        if let Some(content) = non_empty(&request.file_content) {
            return Some(Locator::Inline { content });
        }

        if let Some(url) = non_empty(&request.s3_url) {
            return Some(Locator::PresignedUrl { url });
        }

        let bucket = non_empty(&request.s3_bucket)?;

        if let Some(key) = non_empty(&request.s3_key) {
            return Some(Locator::Object { bucket, key });
        }

        let file_id = non_empty(&request.file_id)?;
        Some(Locator::FileId {
            bucket,
            key: upload_key(
                non_empty(&request.upload_timestamp).unwrap_or(""),
                file_id,
                non_empty(&request.original_filename).unwrap_or(DEFAULT_UPLOAD_FILENAME),
            ),
        })
    }

    /// Short name used in logs
    pub fn method(&self) -> &'static str {
        match self {
            Locator::Inline { .. } => "base64",
            Locator::PresignedUrl { .. } => "presigned_url",
            Locator::Object { .. } => "bucket_key",
            Locator::FileId { .. } => "file_id",
        }
    }

    fn retrieval_failed(&self, source: StorageError) -> ResolveError {
        let context = match self {
            Locator::PresignedUrl { .. } => "Failed to download from S3 URL",
            Locator::FileId { .. } => "Failed to download file using file_id",
            _ => "Failed to download from S3",
        };
        ResolveError::RetrievalFailed { context, source }
    }
}

/// Storage key the upload function uses for a file id
pub fn upload_key(timestamp: &str, file_id: &str, filename: &str) -> String {
    format!("{}/{}_{}_{}", UPLOAD_KEY_PREFIX, timestamp, file_id, filename)
}

/// Standard alphabet, tolerating non-zero bits in the final symbol
const INLINE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decode inline content, ignoring the line breaks some encoders insert
fn decode_inline(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    INLINE_ENGINE.decode(compact)
}

/// Resolve the request into non-empty document bytes
pub async fn resolve(
    request: &ProcessingRequest,
    fetcher: &dyn ObjectFetcher,
) -> Result<Vec<u8>, ResolveError> {
    let locator = Locator::from_request(request).ok_or(ResolveError::MissingInput)?;

    let fetched = match &locator {
        Locator::Inline { content } => decode_inline(content)?,
        Locator::PresignedUrl { url } => fetcher
            .fetch_url(url)
            .await
            .map_err(|e| locator.retrieval_failed(e))?,
        Locator::Object { bucket, key } => fetcher
            .fetch_object(bucket, key)
            .await
            .map_err(|e| locator.retrieval_failed(e))?,
        Locator::FileId { bucket, key } => fetcher
            .fetch_object(bucket, key)
            .await
            .map_err(|e| locator.retrieval_failed(e))?,
    };

    if fetched.is_empty() {
        return Err(ResolveError::EmptyContent);
    }

    tracing::info!(
        method = locator.method(),
        bytes = fetched.len(),
        "Resolved document input"
    );
    Ok(fetched)
}
