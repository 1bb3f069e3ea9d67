//! Extraction pipeline
//!
//! Resolve the document bytes, run the remote generation, normalize the text.

mod normalizer;
mod request;
mod resolver;
mod service;

pub use normalizer::{
    normalize, recover_json, strip_fences, Extraction, ParseDiagnostic, PARSE_FAILURE,
    PARSING_ATTEMPTS,
};
pub use request::{OutputFormat, ProcessingRequest, DEFAULT_MODEL};
pub use resolver::{resolve, upload_key, Locator, ResolveError};
pub use service::ExtractionService;
