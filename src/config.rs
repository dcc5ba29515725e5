// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the form relay.
//!
//! The whole configuration is assembled once at start-up from the process
//! environment and shared by reference afterwards. Values that are not set
//! fall back to the defaults below.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the form relay service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Outbound SMTP transport
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Message composition
    #[serde(default)]
    pub mail: MailConfig,

    /// Template location
    #[serde(default)]
    pub templates: TemplateConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Admission checks
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// SMTP relay credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,

    /// Port (default: 587, STARTTLS when the relay offers it)
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Login name, also used as the sender address
    pub username: String,

    #[serde(skip_serializing)]
    pub password: String,
}

/// Addresses, display names and subjects for the two outgoing messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Internal recipient of every submission
    pub to_email: String,

    /// Reply-To address on the auto-reply
    #[serde(default)]
    pub from_email: Option<String>,

    #[serde(default = "default_internal_sender_name")]
    pub internal_sender_name: String,

    #[serde(default = "default_reply_sender_name")]
    pub reply_sender_name: String,

    /// Prefix of the internal subject; the submitter's name is appended
    #[serde(default = "default_internal_subject")]
    pub internal_subject: String,

    #[serde(default = "default_reply_subject")]
    pub reply_subject: String,

    /// Value of the `X-Form-Submission` header
    #[serde(default = "default_form_tag")]
    pub form_tag: String,

    /// Offset used for the human-readable timestamp (default: +60, West Africa Time)
    #[serde(default = "default_display_utc_offset_minutes")]
    pub display_utc_offset_minutes: i32,
}

/// Where the HTML templates live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default = "default_template_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_internal_template")]
    pub internal: String,

    #[serde(default = "default_welcome_template")]
    pub welcome: String,
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per client per window (default: 5)
    #[serde(default = "default_points")]
    pub points: u32,

    /// Window length in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

/// Admission check configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Origins allowed to submit forms
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Reject requests whose Origin is not allow-listed (default: true)
    #[serde(default = "default_true")]
    pub enforce_origin: bool,

    /// Hidden field that only bots fill in (default: _gotcha)
    #[serde(default = "default_honeypot_field")]
    pub honeypot_field: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_internal_sender_name() -> String {
    "Form Submission".to_string()
}

fn default_reply_sender_name() -> String {
    "AULT".to_string()
}

fn default_internal_subject() -> String {
    "New AULT Form Submission".to_string()
}

fn default_reply_subject() -> String {
    "Your Journey To More Begins Here".to_string()
}

fn default_form_tag() -> String {
    "EdgeForm".to_string()
}

fn default_display_utc_offset_minutes() -> i32 {
    60 // Africa/Lagos, no DST
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("emails")
}

fn default_internal_template() -> String {
    "internal.html".to_string()
}

fn default_welcome_template() -> String {
    "welcome.html".to_string()
}

fn default_points() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    60
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "https://nxtedgestudio.com".to_string(),
        "https://goault.com".to_string(),
        "https://edgeforms.nxtedgestudio.com".to_string(),
        "https://ault-v2.netlify.app".to_string(),
    ]
}

fn default_honeypot_field() -> String {
    "_gotcha".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            smtp: SmtpConfig::default(),
            mail: MailConfig::default(),
            templates: TemplateConfig::default(),
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            to_email: String::new(),
            from_email: None,
            internal_sender_name: default_internal_sender_name(),
            reply_sender_name: default_reply_sender_name(),
            internal_subject: default_internal_subject(),
            reply_subject: default_reply_subject(),
            form_tag: default_form_tag(),
            display_utc_offset_minutes: default_display_utc_offset_minutes(),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: default_template_dir(),
            internal: default_internal_template(),
            welcome: default_welcome_template(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            points: default_points(),
            window_secs: default_window_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            enforce_origin: default_true(),
            honeypot_field: default_honeypot_field(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let config = Config {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            smtp: SmtpConfig {
                host: required(&get, "SMTP_HOST")?,
                port: parsed(&get, "SMTP_PORT", defaults.smtp.port)?,
                username: required(&get, "SMTP_USER")?,
                password: required(&get, "SMTP_PASS")?,
            },
            mail: MailConfig {
                to_email: required(&get, "TO_EMAIL")?,
                from_email: get("FROM_EMAIL"),
                display_utc_offset_minutes: parsed(
                    &get,
                    "DISPLAY_UTC_OFFSET_MINUTES",
                    defaults.mail.display_utc_offset_minutes,
                )?,
                ..defaults.mail
            },
            templates: TemplateConfig {
                dir: get("TEMPLATE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.templates.dir),
                ..defaults.templates
            },
            rate_limit: RateLimitConfig {
                points: parsed(&get, "RATE_LIMIT_POINTS", defaults.rate_limit.points)?,
                window_secs: parsed(
                    &get,
                    "RATE_LIMIT_WINDOW_SECS",
                    defaults.rate_limit.window_secs,
                )?,
            },
            validation: ValidationConfig {
                allowed_origins: get("ALLOWED_ORIGINS")
                    .map(|v| split_list(&v))
                    .unwrap_or(defaults.validation.allowed_origins),
                enforce_origin: flag(&get, "ENFORCE_ORIGIN", defaults.validation.enforce_origin)?,
                ..defaults.validation
            },
            metrics: MetricsConfig {
                enabled: flag(&get, "METRICS_ENABLED", defaults.metrics.enabled)?,
                ..defaults.metrics
            },
        };

        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_WINDOW_SECS",
                value: "0".to_string(),
            });
        }
        if self.mail.display_utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::Invalid {
                key: "DISPLAY_UTC_OFFSET_MINUTES",
                value: self.mail.display_utc_offset_minutes.to_string(),
            });
        }
        Ok(())
    }
}

fn required<F>(get: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    get(key).ok_or(ConfigError::Missing(key))
}

fn parsed<F, T>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn flag<F>(get: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value }),
        },
        None => Ok(default),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
