// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Notification dispatch for accepted submissions.
//!
//! Every accepted submission produces an internal notification, which must
//! succeed, and optionally an auto-reply to the submitter, whose failure is
//! logged and otherwise ignored. The two sends are separate steps with their
//! own results; [`Dispatcher::dispatch`] runs them in order and only attempts
//! the auto-reply once the internal notification went out.

use crate::config::{MailConfig, TemplateConfig};
use crate::error::{DispatchError, MailError};
use crate::mailer::{mailbox, EmailMessage, Mailer};
use crate::submission::Submission;
use crate::template::{TemplateData, TemplateStore};
use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, Utc};
use lettre::message::Mailbox;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Subject fallback when the submitter gave no name.
const UNKNOWN_NAME: &str = "Unknown";

/// Greeting fallback in the auto-reply.
const GREETING_FALLBACK: &str = "there";

/// Placeholder for the synthesized submission time.
const TIMESTAMP_FIELD: &str = "timestamp";

/// Medium date, short time: `19 Oct 2026, 14:05`.
const DISPLAY_FORMAT: &str = "%-d %b %Y, %H:%M";

/// What happened to the auto-reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoReply {
    Sent,
    /// The submission carried no email address
    Skipped,
    /// Sending failed; the submission still counts as delivered
    Failed,
}

impl AutoReply {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Builds and sends the emails for one submission.
pub struct Dispatcher {
    mailer: Arc<dyn Mailer>,
    templates: TemplateStore,
    template_config: TemplateConfig,
    config: MailConfig,
    internal_sender: Mailbox,
    reply_sender: Mailbox,
    recipient: Mailbox,
    reply_to: Option<Mailbox>,
    display_offset: FixedOffset,
}

impl Dispatcher {
    /// Create a dispatcher. `sender` is the address every message is sent
    /// from; the configured addresses are parsed once here.
    pub fn new(
        mailer: Arc<dyn Mailer>,
        sender: &str,
        config: MailConfig,
        template_config: TemplateConfig,
    ) -> Result<Self, MailError> {
        let internal_sender = mailbox(Some(config.internal_sender_name.as_str()), sender)?;
        let reply_sender = mailbox(Some(config.reply_sender_name.as_str()), sender)?;
        let recipient = mailbox(None, &config.to_email)?;
        let reply_to = config
            .from_email
            .as_deref()
            .map(|address| mailbox(Some(config.reply_sender_name.as_str()), address))
            .transpose()?;
        let display_offset = FixedOffset::east_opt(config.display_utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix());

        Ok(Self {
            mailer,
            templates: TemplateStore::new(&template_config),
            template_config,
            config,
            internal_sender,
            reply_sender,
            recipient,
            reply_to,
            display_offset,
        })
    }

    /// Send the internal notification and, if it went out, the auto-reply.
    ///
    /// Only a failed internal notification is an error.
    pub async fn dispatch(
        &self,
        submission: &Submission,
        origin: &str,
        now: DateTime<Utc>,
    ) -> Result<AutoReply, DispatchError> {
        self.notify_team(submission, origin, now).await?;

        match self.auto_reply(submission).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                warn!(error = %err, "Auto-reply send failed");
                Ok(AutoReply::Failed)
            }
        }
    }

    /// Send the internal notification to the configured recipient.
    pub async fn notify_team(
        &self,
        submission: &Submission,
        origin: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DispatchError> {
        let message = self.internal_message(submission, origin, now).await?;
        self.mailer.send(&message).await?;

        info!(
            to = %message.to.email,
            fields = submission.len(),
            "Internal notification sent"
        );
        Ok(())
    }

    /// Send the auto-reply if the submission carries an email address.
    pub async fn auto_reply(&self, submission: &Submission) -> Result<AutoReply, DispatchError> {
        let Some(address) = submission.email() else {
            debug!("No submitter address, skipping auto-reply");
            return Ok(AutoReply::Skipped);
        };

        let message = self.reply_message(submission, address).await?;
        self.mailer.send(&message).await?;

        info!(to = %message.to.email, "Auto-reply sent");
        Ok(AutoReply::Sent)
    }

    /// Build the internal notification.
    pub async fn internal_message(
        &self,
        submission: &Submission,
        origin: &str,
        now: DateTime<Utc>,
    ) -> Result<EmailMessage, DispatchError> {
        let mut data: TemplateData = submission.fields().clone();
        data.insert(TIMESTAMP_FIELD.to_string(), self.display_time(now));

        let html = self
            .templates
            .render(&self.template_config.internal, &data)
            .await?;

        Ok(EmailMessage {
            from: self.internal_sender.clone(),
            to: self.recipient.clone(),
            reply_to: None,
            subject: format!(
                "{} — {}",
                self.config.internal_subject,
                submission.full_name().unwrap_or(UNKNOWN_NAME)
            ),
            html,
            headers: vec![
                ("X-Form-Submission".to_string(), self.config.form_tag.clone()),
                ("X-Form-Origin".to_string(), origin.to_string()),
                (
                    "X-Form-Submitted-At".to_string(),
                    now.to_rfc3339_opts(SecondsFormat::Millis, true),
                ),
            ],
        })
    }

    /// Build the auto-reply to `address`.
    pub async fn reply_message(
        &self,
        submission: &Submission,
        address: &str,
    ) -> Result<EmailMessage, DispatchError> {
        let to = mailbox(submission.full_name(), address)?;

        let mut data = TemplateData::new();
        data.insert(
            crate::submission::FULL_NAME_FIELD.to_string(),
            submission
                .full_name()
                .unwrap_or(GREETING_FALLBACK)
                .to_string(),
        );

        let html = self
            .templates
            .render(&self.template_config.welcome, &data)
            .await?;

        Ok(EmailMessage {
            from: self.reply_sender.clone(),
            to,
            reply_to: self.reply_to.clone(),
            subject: self.config.reply_subject.clone(),
            html,
            headers: vec![("X-Auto-Reply".to_string(), "true".to_string())],
        })
    }

    /// Human-readable submission time in the configured offset.
    pub fn display_time(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.display_offset)
            .format(DISPLAY_FORMAT)
            .to_string()
    }
}
