// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Email templates with `{{field}}` placeholders.
//!
//! Substitution is literal: values are inserted verbatim (no HTML escaping)
//! and the output is never re-scanned, so a submitted value that looks like a
//! placeholder stays as typed.

use crate::config::TemplateConfig;
use crate::error::TemplateError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Values available to a template, keyed by placeholder name.
pub type TemplateData = BTreeMap<String, String>;

/// Stand-in for placeholders with no (or an empty) value.
pub const MISSING_VALUE: &str = "-";

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Replace every `{{key}}` in `template` with `data[key]`, or `-` when the
/// value is missing or empty.
pub fn render(template: &str, data: &TemplateData) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];

        match after.find(CLOSE).map(|end| (&after[..end], end)) {
            Some((key, end)) if is_placeholder_name(key) => {
                let value = data
                    .get(key)
                    .map(String::as_str)
                    .filter(|v| !v.is_empty())
                    .unwrap_or(MISSING_VALUE);
                out.push_str(value);
                rest = &after[end + CLOSE.len()..];
            }
            _ => {
                // Not a placeholder; emit one brace and rescan from the next
                out.push('{');
                rest = &rest[start + 1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['{', '}'])
}

/// Reads templates from a directory on every request.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(config: &TemplateConfig) -> Self {
        Self {
            dir: config.dir.clone(),
        }
    }

    /// Load `name` from the template directory.
    pub async fn load(&self, name: &str) -> Result<String, TemplateError> {
        let path = self.dir.join(name);
        debug!(path = %path.display(), "Loading template");

        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| TemplateError::Io {
                path: path.display().to_string(),
                source,
            })
    }

    /// Load `name` and render it with `data`.
    pub async fn render(&self, name: &str, data: &TemplateData) -> Result<String, TemplateError> {
        let template = self.load(name).await?;
        Ok(render(&template, data))
    }
}
