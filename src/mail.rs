//! Outbound mail used to answer contact-form messages.

use std::sync::Arc;

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport is not configured")]
    NotConfigured,

    #[error("invalid address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Synchronous send; callers move it onto the blocking pool.
pub trait Mailer: Send + Sync {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from = parse_mailbox(&config.from)?;
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        // 465 is implicit TLS; anything else upgrades with STARTTLS.
        let builder = if config.port == 465 {
            SmtpTransport::relay(&config.host)?
        } else {
            SmtpTransport::starttls_relay(&config.host)?
        };
        let transport = builder
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self { transport, from })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&mail.to)?)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())?;

        self.transport.send(&message)?;
        Ok(())
    }
}

/// Stand-in when SMTP is not configured: every send fails.
pub struct DisabledMailer;

impl Mailer for DisabledMailer {
    fn send(&self, _mail: &OutgoingMail) -> Result<(), MailError> {
        Err(MailError::NotConfigured)
    }
}

pub fn from_config(config: Option<&SmtpConfig>) -> Arc<dyn Mailer> {
    match config.map(SmtpMailer::new) {
        Some(Ok(mailer)) => {
            tracing::info!("SMTP mailer configured");
            Arc::new(mailer)
        }
        Some(Err(e)) => {
            tracing::error!("Failed to configure SMTP mailer: {}. Replies are disabled.", e);
            Arc::new(DisabledMailer)
        }
        None => {
            tracing::warn!("SMTP_HOST not set. Email replies are disabled.");
            Arc::new(DisabledMailer)
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail() -> OutgoingMail {
        OutgoingMail {
            to: "visitor@example.com".to_string(),
            subject: "Re: Hi".to_string(),
            body: "Thanks".to_string(),
        }
    }

    #[test]
    fn test_disabled_mailer_always_fails() {
        assert!(matches!(
            DisabledMailer.send(&mail()),
            Err(MailError::NotConfigured)
        ));
    }

    #[test]
    fn test_invalid_from_address_is_rejected() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "user".to_string(),
            password: "pass".to_string(),
            from: "not an address".to_string(),
        };
        assert!(matches!(
            SmtpMailer::new(&config),
            Err(MailError::Address { .. })
        ));
    }
}
