//! Configuration management for the invoice extraction server

use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub gemini: GeminiConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on request bodies; inline base64 PDFs are large
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...)
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// HITL review database; schema is only provisioned when set
    pub url: Option<String>,
}

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;
const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: DEFAULT_PORT,
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            },
            storage: StorageConfig {
                region: DEFAULT_REGION.to_string(),
                endpoint: None,
                access_key: None,
                secret_key: None,
            },
            gemini: GeminiConfig {
                base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            },
            database: DatabaseConfig { url: None },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(DEFAULT_PORT),
                max_body_bytes: env::var("MAX_BODY_BYTES")
                    .ok()
                    .and_then(|b| b.parse().ok())
                    .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            },
            storage: StorageConfig {
                region: env::var("S3_REGION")
                    .or_else(|_| env::var("AWS_REGION"))
                    .unwrap_or_else(|_| DEFAULT_REGION.to_string()),
                endpoint: non_empty_var("S3_ENDPOINT")?,
                access_key: non_empty_var("S3_ACCESS_KEY")?,
                secret_key: non_empty_var("S3_SECRET_KEY")?,
            },
            gemini: GeminiConfig {
                base_url: env::var("GEMINI_API_BASE")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            },
            database: DatabaseConfig {
                url: non_empty_var("DATABASE_URL")?,
            },
        })
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Read an optional variable, treating empty values as unset.
///
/// Fails only when the variable is present but not valid unicode.
fn non_empty_var(key: &str) -> Result<Option<String>, env::VarError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e),
    }
}
