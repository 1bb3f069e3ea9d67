//! Gemini client
//!
//! Defines the generation trait the pipeline depends on and the REST
//! implementation. One call is one attempt: no retries, no timeout beyond
//! what the remote side enforces. The HTTP client is built without a timeout,
//! so a slow generation is awaited for as long as it takes.

use std::path::PathBuf;

use async_trait::async_trait;

use super::staging::StagedDocument;
use super::types::{
    GenerateContentRequest, GenerateContentResponse, GenerationError, GenerationOptions,
    UploadFileResponse, UploadedFile, DOCUMENT_MIME_TYPE,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Remote generation capability
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Run one generation over `document` and return the raw response text
    async fn generate(
        &self,
        document: &[u8],
        api_key: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError>;
}

/// Gemini REST client
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    staging_dir: PathBuf,
}

impl GeminiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            staging_dir: std::env::temp_dir(),
        }
    }

    /// Stage documents somewhere other than the system temp dir
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Upload a staged document through the Files API
    async fn upload(
        &self,
        staged: &StagedDocument,
        api_key: &str,
    ) -> Result<UploadedFile, GenerationError> {
        let url = format!("{}/upload/v1beta/files", self.base_url);
        let body = staged.read().await?;

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .header("X-Goog-Upload-Protocol", "raw")
            .header(reqwest::header::CONTENT_TYPE, DOCUMENT_MIME_TYPE)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api { status, body });
        }

        let uploaded: UploadFileResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(format!("upload: {}", e)))?;

        tracing::debug!("Uploaded document as {}", uploaded.file.name);
        Ok(uploaded.file)
    }

    /// Call `generateContent` against an uploaded file
    async fn generate_content(
        &self,
        file: &UploadedFile,
        api_key: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        let url = format!(
            "{}/v1beta/{}:generateContent",
            self.base_url,
            options.model_resource()
        );
        let request = GenerateContentRequest::for_document(file, options);

        tracing::info!(
            model = %options.model,
            search = options.enable_search,
            format = ?options.output_format,
            "Running generation"
        );

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api { status, body });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        parsed.text().ok_or(GenerationError::EmptyResponse)
    }

    /// Best-effort removal of the uploaded copy; never fails the call
    async fn delete_file(&self, file: &UploadedFile, api_key: &str) {
        let url = format!("{}/v1beta/{}", self.base_url, file.name);
        match self
            .http
            .delete(&url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("Deleted uploaded file {}", file.name);
            }
            Ok(response) => {
                tracing::warn!(
                    "Failed to delete uploaded file {}: HTTP {}",
                    file.name,
                    response.status()
                );
            }
            Err(e) => tracing::warn!("Failed to delete uploaded file {}: {}", file.name, e),
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(
        &self,
        document: &[u8],
        api_key: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        // Dropped on every return below, removing the temp file
        let staged = StagedDocument::stage_in(&self.staging_dir, document).await?;

        let uploaded = self.upload(&staged, api_key).await.map_err(|e| {
            tracing::error!("Error during Gemini processing: {}", e);
            e
        })?;

        let result = self.generate_content(&uploaded, api_key, options).await;
        self.delete_file(&uploaded, api_key).await;

        if let Err(e) = &result {
            tracing::error!("Error during Gemini processing: {}", e);
        }
        result
    }
}

/// Canned generator for tests
#[cfg(test)]
pub struct MockGenerator {
    pub response: Result<String, String>,
    pub calls: std::sync::Mutex<Vec<(Vec<u8>, String, GenerationOptions)>>,
}

#[cfg(test)]
impl MockGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing(body: &str) -> Self {
        Self {
            response: Err(body.to_string()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(Vec<u8>, String, GenerationOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl GenerationClient for MockGenerator {
    async fn generate(
        &self,
        document: &[u8],
        api_key: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((document.to_vec(), api_key.to_string(), options.clone()));
        self.response.clone().map_err(|body| GenerationError::Api {
            status: 400,
            body,
        })
    }
}
