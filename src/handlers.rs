// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the form relay service.
//!
//! The submit handler runs every request through a fixed sequence of checks:
//! origin, preflight, method, rate limit, payload, honeypot. The first failing
//! check produces the response. Once the origin is accepted, every response
//! carries the CORS headers, errors included.

use crate::config::Config;
use crate::dispatcher::{AutoReply, Dispatcher};
use crate::error::{ApiError, InitError};
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::mailer::Mailer;
use crate::metrics::{Metrics, Outcome};
use crate::submission::Submission;
use crate::validator::{SubmissionValidator, ValidationError, ValidationResult};
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Path of the submit endpoint.
pub const SUBMIT_PATH: &str = "/api/submit";

const ALLOWED_METHODS: &str = "POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";

/// Largest request body read for a submission. Anything larger is treated
/// as carrying no form data.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub validator: SubmissionValidator,
    pub dispatcher: Dispatcher,
    pub metrics: Metrics,
    pub config: Config,
}

impl AppState {
    /// Assemble the state from configuration and a mail transport.
    pub fn new(config: Config, mailer: Arc<dyn Mailer>) -> Result<Self, InitError> {
        let dispatcher = Dispatcher::new(
            mailer,
            &config.smtp.username,
            config.mail.clone(),
            config.templates.clone(),
        )?;

        Ok(Self {
            limiter: RateLimiter::new(config.rate_limit.clone()),
            validator: SubmissionValidator::new(config.validation.clone()),
            dispatcher,
            metrics: Metrics::new()?,
            config,
        })
    }
}

/// Success response body.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route(SUBMIT_PATH, any(submit));

    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(metrics));
    }

    router.with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "form-relay",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Accept one form submission.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let origin = headers.get(header::ORIGIN);
    let origin_str = origin.and_then(|v| v.to_str().ok());

    if let ValidationResult::Invalid(err) = state.validator.validate_origin(origin_str) {
        info!(origin = ?origin_str, %method, "Origin not allowed");
        state.metrics.record_submission(Outcome::Forbidden);
        return ApiError::from(err).into_response();
    }

    let allow_origin = origin
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    if method == Method::OPTIONS {
        debug!(origin = ?origin_str, "Preflight");
        state.metrics.record_submission(Outcome::Preflight);
        let response = (
            StatusCode::NO_CONTENT,
            [(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS)],
        )
            .into_response();
        return with_cors(response, allow_origin);
    }

    let client = client_key(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let origin_label = origin_str.unwrap_or("unknown");
    let response = process(&state, &method, &client, origin_label, &headers, body)
        .await
        .unwrap_or_else(IntoResponse::into_response);

    with_cors(response, allow_origin)
}

async fn process(
    state: &AppState,
    method: &Method,
    client: &str,
    origin: &str,
    headers: &HeaderMap,
    body: Body,
) -> Result<Response, ApiError> {
    let submission = admit(state, method, client, headers, body).await?;
    deliver(state, &submission, origin).await?;

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: "Email sent",
        }),
    )
        .into_response())
}

/// Method, rate limit, payload and honeypot checks.
async fn admit(
    state: &AppState,
    method: &Method,
    client: &str,
    headers: &HeaderMap,
    body: Body,
) -> Result<Submission, ApiError> {
    if method != Method::POST {
        debug!(%method, "Method not allowed");
        state.metrics.record_submission(Outcome::MethodNotAllowed);
        return Err(ApiError::MethodNotAllowed);
    }

    if let RateLimitResult::Limited { retry_after } = state.limiter.consume(client).await {
        info!(
            client,
            retry_after_secs = retry_after.as_secs(),
            "Request rate limited"
        );
        state.metrics.record_submission(Outcome::RateLimited);
        return Err(ApiError::TooManyRequests { retry_after });
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let submission = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => Submission::from_body(content_type, &bytes),
        Err(err) => {
            debug!(client, error = %err, "Unreadable or oversized body");
            Submission::default()
        }
    };

    if let ValidationResult::Invalid(err) = state.validator.validate_submission(&submission) {
        let outcome = match err {
            ValidationError::SpamDetected { .. } => Outcome::Spam,
            _ => Outcome::Empty,
        };
        info!(client, error = %err, "Submission rejected");
        state.metrics.record_submission(outcome);
        return Err(err.into());
    }

    Ok(submission)
}

/// Render and send the emails for an accepted submission.
async fn deliver(state: &AppState, submission: &Submission, origin: &str) -> Result<(), ApiError> {
    match state.dispatcher.dispatch(submission, origin, Utc::now()).await {
        Ok(auto_reply) => {
            state.metrics.record_email("internal", "sent");
            if auto_reply != AutoReply::Skipped {
                state.metrics.record_email("auto_reply", auto_reply.as_str());
            }
            state.metrics.record_submission(Outcome::Sent);
            Ok(())
        }
        Err(err) => {
            error!(error = %err, origin, "Email send error");
            state.metrics.record_email("internal", "failed");
            state.metrics.record_submission(Outcome::Failed);
            Err(ApiError::SendFailed)
        }
    }
}

/// Attach the CORS headers for an accepted origin.
fn with_cors(mut response: Response, allow_origin: HeaderValue) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    response
}

/// Rate limit key: first `X-Forwarded-For` hop, else the peer IP.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}
