//! Invoice Extract Server
//!
//! HTTP service that resolves a PDF from one of several locators, asks Gemini
//! to extract its contents, and returns the model output as JSON.

pub mod config;
pub mod db;
pub mod error;
pub mod extraction;
pub mod gemini;
pub mod routes;
pub mod state;
pub mod storage;
