//! Gemini module
//!
//! Remote document extraction through the Gemini REST API.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use invoice_extract_server::gemini::{GeminiClient, GenerationClient, GenerationOptions};
//!
//! let client = GeminiClient::new("https://generativelanguage.googleapis.com");
//! let options = GenerationOptions::from_request(&request);
//! let text = client.generate(&pdf_bytes, &request.api_key, &options).await?;
//! ```

mod client;
mod staging;
mod types;

pub use client::{GeminiClient, GenerationClient};
pub use staging::StagedDocument;
pub use types::{
    GenerateContentRequest, GenerateContentResponse, GenerationError, GenerationOptions,
    UploadedFile, DEFAULT_PROMPT, DEFAULT_SYSTEM_INSTRUCTION, DOCUMENT_MIME_TYPE,
    MAX_OUTPUT_TOKENS,
};

#[cfg(test)]
pub use client::MockGenerator;
