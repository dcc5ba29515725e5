// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Decoded form submissions.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Field carrying the submitter's display name.
pub const FULL_NAME_FIELD: &str = "fullName";

/// Field carrying the submitter's email address.
pub const EMAIL_FIELD: &str = "email";

/// A form submission: arbitrary field names mapped to string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    fields: BTreeMap<String, String>,
}

impl Submission {
    /// Decode a request body.
    ///
    /// `application/x-www-form-urlencoded` bodies are decoded as form pairs,
    /// everything else as a JSON object. Bodies that fail to decode yield an
    /// empty submission.
    pub fn from_body(content_type: Option<&str>, body: &[u8]) -> Self {
        let media_type = content_type
            .map(|s| s.split(';').next().unwrap_or(s).trim().to_lowercase());

        match media_type.as_deref() {
            Some("application/x-www-form-urlencoded") => Self::from_form(body),
            _ => Self::from_json(body),
        }
    }

    /// Decode a JSON object body.
    pub fn from_json(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map
                .into_iter()
                .map(|(key, value)| (key, field_text(value)))
                .collect(),
            Ok(other) => {
                debug!(kind = json_kind(&other), "Submission body is not an object");
                Self::default()
            }
            Err(err) => {
                debug!(error = %err, "Submission body is not valid JSON");
                Self::default()
            }
        }
    }

    /// Decode a URL-encoded form body. Repeated keys keep the last value.
    pub fn from_form(body: &[u8]) -> Self {
        url::form_urlencoded::parse(body).into_owned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Raw value of a field, possibly empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Value of a field, treating an empty value as absent.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn full_name(&self) -> Option<&str> {
        self.field(FULL_NAME_FIELD)
    }

    pub fn email(&self) -> Option<&str> {
        self.field(EMAIL_FIELD)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

impl<K, V> FromIterator<(K, V)> for Submission
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Text of one JSON field value. `false`, `null` and zero count as empty.
fn field_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null | Value::Bool(false) => String::new(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
