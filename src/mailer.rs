// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound email.
//!
//! [`Mailer`] is the seam between the dispatcher and the wire; the
//! production implementation relays through an SMTP server with lettre.

use crate::config::SmtpConfig;
use crate::error::MailError;
use async_trait::async_trait;
use lettre::message::header::{ContentType, HeaderName, HeaderValue};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

/// One HTML email, independent of the transport.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub from: Mailbox,
    pub to: Mailbox,
    pub reply_to: Option<Mailbox>,
    pub subject: String,
    pub html: String,
    /// Extra headers, in order
    pub headers: Vec<(String, String)>,
}

impl EmailMessage {
    /// Value of a custom header, if set.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert into a lettre message.
    pub fn to_message(&self) -> Result<Message, MailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.subject.clone());

        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.clone());
        }

        for (name, value) in &self.headers {
            let header_name = HeaderName::new_from_ascii(name.clone())
                .map_err(|_| MailError::Header(name.clone()))?;
            builder = builder.raw_header(HeaderValue::new(header_name, value.clone()));
        }

        Ok(builder
            .header(ContentType::TEXT_HTML)
            .body(self.html.clone())?)
    }
}

/// Parse `address` into a mailbox with an optional display name.
pub fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox, MailError> {
    let email: Address = address.trim().parse().map_err(|source| MailError::Address {
        address: address.to_string(),
        source,
    })?;
    Ok(Mailbox::new(name.map(str::to_string), email))
}

/// Sends one email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// SMTP relay transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build the pooled transport. No connection is made until the first send.
    ///
    /// STARTTLS is used when the relay offers it.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let tls = TlsParameters::new(config.host.clone())
            .map_err(|err| MailError::Transport(err.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(Tls::Opportunistic(tls))
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let email = message.to_message()?;
        let response = self
            .transport
            .send(email)
            .await
            .map_err(|err| MailError::Transport(err.to_string()))?;

        debug!(
            to = %message.to.email,
            code = %response.code(),
            "SMTP relay accepted message"
        );
        Ok(())
    }
}
