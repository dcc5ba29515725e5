// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! In-memory mailer that records every send attempt.

use async_trait::async_trait;
use form_relay::{error::MailError, EmailMessage, Mailer};
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct RecordingMailer {
    /// Every message handed to the transport, failed ones included
    attempts: Mutex<Vec<EmailMessage>>,
    /// Recipients whose sends fail
    failing: Mutex<HashSet<String>>,
}

impl RecordingMailer {
    /// Make every send to `address` fail.
    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }

    pub fn attempts(&self) -> Vec<EmailMessage> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    /// Attempts addressed to `address`.
    pub fn sent_to(&self, address: &str) -> Vec<EmailMessage> {
        self.attempts()
            .into_iter()
            .filter(|m| m.to.email.to_string() == address)
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        self.attempts.lock().unwrap().push(message.clone());

        let to = message.to.email.to_string();
        if self.failing.lock().unwrap().contains(&to) {
            return Err(MailError::Transport(format!("550 mailbox unavailable: {to}")));
        }
        Ok(())
    }
}
