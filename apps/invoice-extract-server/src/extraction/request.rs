//! Processing request types
//!
//! Wire shape of `POST /invoice_process`. Every optional field tolerates both
//! omission and an explicit `null`; defaults are applied through accessors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Model used when the caller does not name one
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";

/// Requested shape of the extraction result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured JSON, recovered from the model text
    #[default]
    Json,
    /// Raw model text, passed through untouched
    Text,
}

impl OutputFormat {
    /// `"json"` in any case selects JSON; every other value means plain text
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    /// MIME type requested from the generation endpoint
    pub fn response_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Text => "text/plain",
        }
    }
}

/// One-shot processing request
#[derive(Clone, Deserialize)]
pub struct ProcessingRequest {
    /// Generation API credential; never logged
    pub api_key: String,

    /// Base64 encoded document bytes
    #[serde(default)]
    pub file_content: Option<String>,
    /// Presigned retrieval URL
    #[serde(default)]
    pub s3_url: Option<String>,
    #[serde(default)]
    pub s3_bucket: Option<String>,
    #[serde(default)]
    pub s3_key: Option<String>,
    /// File id handed out by the upload function, paired with `s3_bucket`
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub upload_timestamp: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,

    #[serde(default)]
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub custom_system_prompt: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub top_k: Option<i32>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub enable_search: Option<bool>,
    #[serde(default)]
    pub output_format: Option<String>,
}

impl ProcessingRequest {
    pub fn model_name(&self) -> &str {
        non_empty(&self.model_name).unwrap_or(DEFAULT_MODEL)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(0.0)
    }

    pub fn enable_search(&self) -> bool {
        self.enable_search.unwrap_or(false)
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
            .as_deref()
            .map(OutputFormat::parse)
            .unwrap_or_default()
    }
}

/// Treat empty strings the same as missing values
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl fmt::Debug for ProcessingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingRequest")
            .field("api_key", &"<redacted>")
            .field(
                "file_content",
                &self.file_content.as_ref().map(|c| format!("<{} base64 chars>", c.len())),
            )
            .field("s3_url", &self.s3_url.as_ref().map(|_| "<presigned>"))
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_key", &self.s3_key)
            .field("file_id", &self.file_id)
            .field("upload_timestamp", &self.upload_timestamp)
            .field("original_filename", &self.original_filename)
            .field("custom_prompt", &self.custom_prompt)
            .field("custom_system_prompt", &self.custom_system_prompt)
            .field("model_name", &self.model_name)
            .field("temperature", &self.temperature)
            .field("top_k", &self.top_k)
            .field("top_p", &self.top_p)
            .field("enable_search", &self.enable_search)
            .field("output_format", &self.output_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_fields_missing() {
        let request: ProcessingRequest = serde_json::from_str(r#"{"api_key": "k"}"#).unwrap();

        assert_eq!(request.model_name(), DEFAULT_MODEL);
        assert_eq!(request.temperature(), 0.0);
        assert!(!request.enable_search());
        assert_eq!(request.output_format(), OutputFormat::Json);
        assert!(request.top_k.is_none());
        assert!(request.top_p.is_none());
    }

    #[test]
    fn test_defaults_apply_for_explicit_nulls() {
        let request: ProcessingRequest = serde_json::from_str(
            r#"{"api_key": "k", "model_name": null, "temperature": null, "output_format": null}"#,
        )
        .unwrap();

        assert_eq!(request.model_name(), DEFAULT_MODEL);
        assert_eq!(request.temperature(), 0.0);
        assert_eq!(request.output_format(), OutputFormat::Json);
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("markdown"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse(""), OutputFormat::Text);
    }

    #[test]
    fn test_response_mime_type() {
        assert_eq!(OutputFormat::Json.response_mime_type(), "application/json");
        assert_eq!(OutputFormat::Text.response_mime_type(), "text/plain");
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let result = serde_json::from_str::<ProcessingRequest>(r#"{"file_content": "AAAA"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let request: ProcessingRequest = serde_json::from_str(
            r#"{"api_key": "super-secret", "file_content": "JVBERi0=", "s3_url": "https://x/y?X-Amz-Signature=sig"}"#,
        )
        .unwrap();

        let rendered = format!("{:?}", request);
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("JVBERi0="));
        assert!(!rendered.contains("X-Amz-Signature"));
        assert!(rendered.contains("<8 base64 chars>"));
    }
}
