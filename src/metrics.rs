// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for submissions and outgoing email.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Final outcome of one submit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Forbidden,
    Preflight,
    MethodNotAllowed,
    RateLimited,
    Empty,
    Spam,
    Sent,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forbidden => "forbidden",
            Self::Preflight => "preflight",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::RateLimited => "rate_limited",
            Self::Empty => "empty",
            Self::Spam => "spam",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

/// Service metrics, in a registry of their own.
pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
    emails: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new(
                "form_relay_submissions_total",
                "Submit requests by final outcome",
            ),
            &["outcome"],
        )?;
        let emails = IntCounterVec::new(
            Opts::new("form_relay_emails_total", "Outgoing emails by kind and result"),
            &["kind", "result"],
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(emails.clone()))?;

        Ok(Self {
            registry,
            submissions,
            emails,
        })
    }

    pub fn record_submission(&self, outcome: Outcome) {
        self.submissions.with_label_values(&[outcome.as_str()]).inc();
    }

    /// `kind` is `internal` or `auto_reply`.
    pub fn record_email(&self, kind: &str, result: &str) {
        self.emails.with_label_values(&[kind, result]).inc();
    }

    pub fn submissions(&self, outcome: Outcome) -> u64 {
        self.submissions.with_label_values(&[outcome.as_str()]).get()
    }

    /// Text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}
