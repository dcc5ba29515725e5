// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for driving the form relay router in-process.
//!
//! Requests go through `tower::ServiceExt::oneshot`; email is captured by a
//! recording mailer instead of an SMTP relay.

#![allow(dead_code)]

pub mod generators;
pub mod mailer;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use form_relay::{
    config::{Config, MailConfig, SmtpConfig, TemplateConfig},
    handlers::{router, AppState, SUBMIT_PATH},
};
use mailer::RecordingMailer;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

/// An allow-listed origin.
pub const ORIGIN: &str = "https://goault.com";

pub const RECIPIENT: &str = "team@example.com";
pub const SENDER: &str = "forms@example.com";
pub const REPLY_TO: &str = "hello@example.com";

/// Configuration pointing at the shipped templates.
pub fn test_config() -> Config {
    Config {
        smtp: SmtpConfig {
            host: "smtp.example.com".to_string(),
            username: SENDER.to_string(),
            password: "secret".to_string(),
            ..Default::default()
        },
        mail: MailConfig {
            to_email: RECIPIENT.to_string(),
            from_email: Some(REPLY_TO.to_string()),
            ..Default::default()
        },
        templates: TemplateConfig {
            dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("emails"),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A running app: router, its state and the mailer behind it.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        let state = Arc::new(AppState::new(config, mailer.clone()).expect("valid test config"));
        Self {
            router: router(state.clone()),
            state,
            mailer,
        }
    }

    /// Send one request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// POST a JSON body from `client` with the allow-listed origin.
    pub async fn post_json(&self, client: &str, body: &str) -> Response {
        self.send(submit_request(Method::POST, Some(ORIGIN), client, Some(body)))
            .await
    }
}

/// Build a request to the submit endpoint.
pub fn submit_request(
    method: Method,
    origin: Option<&str>,
    client: &str,
    json: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(SUBMIT_PATH)
        .header("x-forwarded-for", client);

    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }

    let body = match json {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    builder.body(body).expect("valid request")
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body")
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("JSON body")
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).expect("UTF-8 body")
}

/// Header value as a string, if present.
pub fn header_str<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}
