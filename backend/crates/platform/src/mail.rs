//! Outbound Mail
//!
//! [`Mailer`] is the port; [`SmtpMailer`] delivers through an SMTP relay
//! (lettre, Tokio transport) and [`LogMailer`] only records the message in
//! the log when no relay is configured.

use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

pub type MailResult<T> = Result<T, MailError>;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid mail address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Mail transport error: {0}")]
    Transport(String),
}

/// Plain-text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    async fn send(&self, mail: OutgoingMail) -> MailResult<()>;
}

// ============================================================================
// SMTP
// ============================================================================

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// TLS relay on the submission port of `host`.
    pub fn new(host: &str, credentials: Option<(String, String)>, from: &str) -> MailResult<Self> {
        let from: Mailbox = from
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress(e.to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| MailError::Transport(e.to_string()))?;
        if let Some((username, password)) = credentials {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> MailResult<()> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress(e.to_string()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::info!(to = %mail.to, "Mail delivered to SMTP relay");
        Ok(())
    }
}

// ============================================================================
// Log only
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> MailResult<()> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            "SMTP not configured, mail not sent"
        );
        Ok(())
    }
}

// ============================================================================
// Backend selection
// ============================================================================

#[derive(Clone)]
pub enum MailBackend {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl Mailer for MailBackend {
    async fn send(&self, mail: OutgoingMail) -> MailResult<()> {
        match self {
            MailBackend::Smtp(mailer) => Mailer::send(mailer, mail).await,
            MailBackend::Log(mailer) => Mailer::send(mailer, mail).await,
        }
    }
}

// ============================================================================
// Recording (tests)
// ============================================================================

#[cfg(any(test, feature = "testing"))]
pub use recording::RecordingMailer;

#[cfg(any(test, feature = "testing"))]
mod recording {
    use std::sync::Mutex;

    use super::{MailError, MailResult, Mailer, OutgoingMail};

    /// Keeps every message; optionally fails every send.
    #[derive(Debug, Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<OutgoingMail>>,
        fail: bool,
    }

    impl RecordingMailer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                sent: Mutex::default(),
                fail: true,
            }
        }

        pub fn sent(&self) -> Vec<OutgoingMail> {
            self.sent
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        }
    }

    impl Mailer for RecordingMailer {
        async fn send(&self, mail: OutgoingMail) -> MailResult<()> {
            if self.fail {
                return Err(MailError::Transport("injected failure".to_string()));
            }
            self.sent
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(mail);
            Ok(())
        }
    }
}
