//! Storage module for document retrieval
//!
//! Documents arrive either through presigned URLs (plain HTTPS) or as
//! bucket/key pairs read through the S3 API.

mod fetcher;
mod s3_client;

pub use fetcher::{ObjectFetcher, StorageFetcher, UrlFetcher, URL_FETCH_TIMEOUT};
pub use s3_client::S3Client;

#[cfg(test)]
pub use fetcher::MockFetcher;
