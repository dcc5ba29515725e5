// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Form Relay
//!
//! This crate accepts website form submissions and relays them by email,
//! guarded by the same ingress constraints as the rest of the bastion:
//!
//! - Origin allow-list (403 for anything else)
//! - CORS preflight handling
//! - Per-client rate limiting (5 submissions per 60s default)
//! - Honeypot spam detection
//! - Internal notification plus optional auto-reply, where only the
//!   internal notification may fail the request

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod metrics;
pub mod submission;
pub mod template;
pub mod validator;

pub use config::Config;
pub use dispatcher::{AutoReply, Dispatcher};
pub use handlers::{router, AppState};
pub use limiter::{RateLimitResult, RateLimiter};
pub use mailer::{EmailMessage, Mailer, SmtpMailer};
pub use submission::Submission;
pub use validator::{SubmissionValidator, ValidationResult};
