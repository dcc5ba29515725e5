// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the form relay.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::validator::ValidationError;

/// Configuration could not be assembled from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// A template could not be loaded.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Building or sending one email failed.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid email address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Invalid header name: {0}")]
    Header(String),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("Mail transport error: {0}")]
    Transport(String),
}

/// The internal notification could not be delivered.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Mail(#[from] MailError),
}

/// Shared state could not be built at start-up.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("Failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Client-facing rejection of a submission.
///
/// The display text of each variant is exactly what the client sees.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Forbidden: Origin not allowed")]
    OriginNotAllowed,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Too many requests")]
    TooManyRequests { retry_after: Duration },

    #[error("No form data submitted")]
    NoFormData,

    #[error("Spam detected")]
    SpamDetected,

    #[error("Failed to send email")]
    SendFailed,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::OriginNotAllowed => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NoFormData | Self::SpamDetected => StatusCode::BAD_REQUEST,
            Self::SendFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::OriginNotAllowed { .. } => Self::OriginNotAllowed,
            ValidationError::NoFormData => Self::NoFormData,
            ValidationError::SpamDetected { .. } => Self::SpamDetected,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::MethodNotAllowed => (status, self.to_string()).into_response(),
            Self::TooManyRequests { retry_after } => {
                // Whole seconds, rounded up
                let secs = retry_after.as_millis().div_ceil(1000).max(1);
                (
                    status,
                    [(header::RETRY_AFTER, secs.to_string())],
                    Json(ErrorResponse {
                        error: self.to_string(),
                    }),
                )
                    .into_response()
            }
            _ => (
                status,
                Json(ErrorResponse {
                    error: self.to_string(),
                }),
            )
                .into_response(),
        }
    }
}
