//! Extraction service
//!
//! Orchestrates resolver, remote generation and normalizer for one request.
//! Holds no per-request state; collaborators are injected.

use std::sync::Arc;

use super::normalizer::{normalize, Extraction};
use super::request::ProcessingRequest;
use super::resolver::resolve;
use crate::error::Result;
use crate::gemini::{GenerationClient, GenerationOptions};
use crate::storage::ObjectFetcher;

/// Document extraction pipeline
#[derive(Clone)]
pub struct ExtractionService {
    fetcher: Arc<dyn ObjectFetcher>,
    generator: Arc<dyn GenerationClient>,
}

impl ExtractionService {
    pub fn new(fetcher: Arc<dyn ObjectFetcher>, generator: Arc<dyn GenerationClient>) -> Self {
        Self { fetcher, generator }
    }

    /// Process one request end to end
    ///
    /// Input problems surface before any remote call is made. A JSON recovery
    /// failure is not an error: it comes back as [`Extraction::Diagnostic`].
    pub async fn process(&self, request: &ProcessingRequest) -> Result<Extraction> {
        let document = resolve(request, self.fetcher.as_ref()).await?;

        let options = GenerationOptions::from_request(request);
        let raw = self
            .generator
            .generate(&document, &request.api_key, &options)
            .await?;

        Ok(normalize(&raw, options.output_format))
    }
}
