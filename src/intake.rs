//! Upload pre-validation.
//!
//! Runs before the parser ever sees an uploaded artifact, so "upload
//! rejected" stays distinguishable from "parse failed". The result is a
//! boolean-plus-message pair the presentation layer can show verbatim.

use regex::Regex;

use crate::config::IntakeConfig;
use crate::error::Result;

/// Outcome of validating one uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub passed: bool,
    pub message: String,
}

impl Validation {
    fn reject(message: String) -> Self {
        Self {
            passed: false,
            message,
        }
    }

    fn pass() -> Self {
        Self {
            passed: true,
            message: "All checks passed".to_string(),
        }
    }
}

/// Compiled intake checks.
pub struct FileValidator {
    allowed_types: Vec<String>,
    max_size: u64,
    filename: Regex,
}

impl FileValidator {
    pub fn new(config: &IntakeConfig) -> Result<Self> {
        Ok(Self {
            allowed_types: config.allowed_types.clone(),
            max_size: config.max_size,
            // Uploads must look like an auth log: auth.log, auth.log.1, ...
            filename: Regex::new(r"^auth.*log$")?,
        })
    }

    /// Check content type, filename shape, emptiness, and size bound, in
    /// that order. The first failed check decides the message.
    pub fn validate(&self, filename: &str, content_type: &str, size: u64) -> Validation {
        if !self.allowed_types.iter().any(|t| t == content_type) {
            return Validation::reject(format!("Content type failed: {}", content_type));
        }

        if !self.filename.is_match(filename) {
            return Validation::reject(format!("Filename failed: {}", filename));
        }

        if size == 0 {
            return Validation::reject(format!("File empty: {} bytes", size));
        }

        if size >= self.max_size {
            return Validation::reject(format!("File size too big: {} bytes", size));
        }

        Validation::pass()
    }
}
