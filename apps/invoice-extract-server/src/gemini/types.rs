//! Gemini types
//!
//! Generation options derived from a request, the REST wire format of the
//! Gemini API, and the error type for remote calls.

use serde::{Deserialize, Serialize};

use crate::extraction::{OutputFormat, ProcessingRequest};

/// User prompt used when the request carries none
pub const DEFAULT_PROMPT: &str =
    "Extract all data from this invoice and format it as a clean JSON object. Include all line items.";

/// System instruction used when the request carries none
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are an expert at extracting structured data from documents.";

/// Output length ceiling for every generation call
pub const MAX_OUTPUT_TOKENS: u32 = 60_000;

/// MIME type documents are staged and uploaded as
pub const DOCUMENT_MIME_TYPE: &str = "application/pdf";

/// Remote generation errors
///
/// Deliberately coarse: auth, quota and malformed-request failures all arrive
/// as [`GenerationError::Api`] with the remote message.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Gemini API error: failed to stage document: {0}")]
    Staging(#[from] std::io::Error),

    #[error("Gemini API error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Gemini API error: invalid response: {0}")]
    InvalidResponse(String),

    #[error("Gemini API error: response contained no text")]
    EmptyResponse,
}

/// Everything the invoker needs besides the document and the credential
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub prompt: String,
    pub system_instruction: String,
    pub temperature: f64,
    pub top_k: Option<i32>,
    pub top_p: Option<f64>,
    pub enable_search: bool,
    pub output_format: OutputFormat,
}

impl GenerationOptions {
    /// Apply prompt defaults; sampling values pass through unchecked
    pub fn from_request(request: &ProcessingRequest) -> Self {
        Self {
            model: request.model_name().to_string(),
            prompt: request
                .custom_prompt
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            system_instruction: request
                .custom_system_prompt
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string()),
            temperature: request.temperature(),
            top_k: request.top_k,
            top_p: request.top_p,
            enable_search: request.enable_search(),
            output_format: request.output_format(),
        }
    }

    /// `models/...` resource path for the configured model
    pub fn model_resource(&self) -> String {
        if self.model.starts_with("models/") || self.model.starts_with("tunedModels/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }
}

/// `generateContent` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

impl GenerateContentRequest {
    /// Build the request for an uploaded document
    pub fn for_document(file: &UploadedFile, options: &GenerationOptions) -> Self {
        let mut tools = Vec::new();
        if options.enable_search {
            tools.push(Tool {
                google_search: GoogleSearch {},
            });
        }

        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(&options.system_instruction)],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::text(&options.prompt),
                    Part::file(
                        file.mime_type.as_deref().unwrap_or(DOCUMENT_MIME_TYPE),
                        &file.uri,
                    ),
                ],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_k: options.top_k,
                top_p: options.top_p,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: options.output_format.response_mime_type(),
            },
            tools,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            file_data: None,
        }
    }

    fn file(mime_type: &str, uri: &str) -> Self {
        Self {
            text: None,
            file_data: Some(FileData {
                mime_type: mime_type.to_string(),
                file_uri: uri.to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    pub max_output_tokens: u32,
    pub response_mime_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
pub struct GoogleSearch {}

/// `generateContent` response body (only the fields we read)
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thought: bool,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, skipping thoughts
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let texts: Vec<&str> = parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

/// File handle returned by the upload endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Resource name, e.g. `files/abc123`
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadFileResponse {
    pub file: UploadedFile,
}
