// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Form submission admission checks.
//!
//! Implements the request-level checks that run before any email is built:
//! - Origin allow-list
//! - Payload presence
//! - Honeypot field detection

use crate::config::ValidationConfig;
use crate::submission::Submission;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Origin not allowed: {origin:?}")]
    OriginNotAllowed { origin: Option<String> },

    #[error("No form data submitted")]
    NoFormData,

    #[error("Honeypot field {field} was filled in")]
    SpamDetected { field: String },
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Request is valid
    Valid,
    /// Request is invalid
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }
}

/// Form submission validator.
pub struct SubmissionValidator {
    config: ValidationConfig,
    /// Allow-list in serialised origin form
    allowed: Vec<String>,
}

impl SubmissionValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        let allowed = config
            .allowed_origins
            .iter()
            .filter_map(|origin| {
                let normalized = normalize_origin(origin);
                if normalized.is_none() {
                    debug!(origin = %origin, "Ignoring unparsable allow-list entry");
                }
                normalized
            })
            .collect();

        Self { config, allowed }
    }

    /// Validate the `Origin` header against the allow-list.
    pub fn validate_origin(&self, origin: Option<&str>) -> ValidationResult {
        if !self.config.enforce_origin {
            return ValidationResult::Valid;
        }

        match origin.and_then(normalize_origin) {
            Some(normalized) if self.allowed.contains(&normalized) => {
                debug!(origin = %normalized, "Origin allowed");
                ValidationResult::Valid
            }
            _ => {
                debug!(origin = ?origin, "Origin not in allow-list");
                ValidationResult::Invalid(ValidationError::OriginNotAllowed {
                    origin: origin.map(str::to_string),
                })
            }
        }
    }

    /// Validate the decoded submission: it must carry data and leave the
    /// honeypot empty.
    pub fn validate_submission(&self, submission: &Submission) -> ValidationResult {
        if submission.is_empty() {
            debug!("Empty submission");
            return ValidationResult::Invalid(ValidationError::NoFormData);
        }

        if submission.field(&self.config.honeypot_field).is_some() {
            debug!(field = %self.config.honeypot_field, "Honeypot triggered");
            return ValidationResult::Invalid(ValidationError::SpamDetected {
                field: self.config.honeypot_field.clone(),
            });
        }

        ValidationResult::Valid
    }
}

/// Reduce an origin string to scheme, lower-cased host and non-default port.
///
/// Opaque origins (`null`, `file:` and friends) yield `None`.
fn normalize_origin(origin: &str) -> Option<String> {
    let url = Url::parse(origin.trim()).ok()?;
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
