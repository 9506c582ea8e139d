//! Delivery of contact-form messages

use crate::config::{EmailSettings, EmailTransportKind};
use crate::domain::ContactMessage;
use crate::providers::constants::http::content_types;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::path::Path;
use tracing::{info, warn};

pub const SUBJECT_PREFIX: &str = "[Contato]";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid e-mail address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("failed to send message: {0}")]
    Transport(String),

    #[error("failed to set up mail transport: {0}")]
    Setup(String),
}

impl MailError {
    /// Whether the sender's input caused the failure
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidAddress { .. } | Self::MissingField(_))
    }
}

enum MailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

/// Sends contact messages from the configured sender to the configured inbox
pub struct ContactMailer {
    transport: MailTransport,
    from: Mailbox,
    to: Mailbox,
}

impl ContactMailer {
    pub fn new(settings: &EmailSettings) -> Result<Self, MailError> {
        let transport = match settings.transport {
            EmailTransportKind::Smtp => {
                if !settings.smtp_tls {
                    warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let mut builder = if settings.smtp_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
                        .map_err(|e| MailError::Setup(format!("create SMTP transport: {e}")))?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.smtp_host)
                }
                .port(settings.smtp_port);

                if let (Some(username), Some(password)) =
                    (&settings.smtp_username, &settings.smtp_password)
                {
                    builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
                }

                MailTransport::Smtp(builder.build())
            }
            EmailTransportKind::File => {
                let directory = Path::new(&settings.file_path);
                std::fs::create_dir_all(directory).map_err(|e| {
                    MailError::Setup(format!("create directory {}: {e}", directory.display()))
                })?;
                MailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(directory))
            }
        };

        Ok(Self {
            transport,
            from: configured_mailbox(&settings.from_address)?,
            to: configured_mailbox(&settings.to_address)?,
        })
    }

    /// Validate a contact message and build the outgoing e-mail
    pub fn build_message(&self, contact: &ContactMessage) -> Result<Message, MailError> {
        let email = contact.email.trim();
        let reply_to = email
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress {
                address: email.to_string(),
                reason: e.to_string(),
            })?;
        let subject_reason = required(&contact.subject_reason, "subject-reason")?;
        let description = required(&contact.description, "description")?;

        let body = format!("E-mail: {email}\nMotivo: {subject_reason}\n\n{description}\n");
        let mut content = MultiPart::mixed().singlepart(SinglePart::plain(body));
        for file in &contact.attachments {
            let content_type = ContentType::parse(&file.mime_type)
                .or_else(|_| ContentType::parse(content_types::APPLICATION_OCTET_STREAM))
                .map_err(|e| MailError::Build(e.to_string()))?;
            content = content.singlepart(
                Attachment::new(file.name.clone()).body(file.bytes.to_vec(), content_type),
            );
        }

        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .reply_to(reply_to)
            .subject(format!("{SUBJECT_PREFIX} {subject_reason}"))
            .multipart(content)
            .map_err(|e| MailError::Build(e.to_string()))
    }

    pub async fn send_contact(&self, contact: &ContactMessage) -> Result<(), MailError> {
        let message = self.build_message(contact)?;

        match &self.transport {
            MailTransport::Smtp(smtp) => smtp
                .send(message)
                .await
                .map(|_| ())
                .map_err(|e| MailError::Transport(format!("SMTP: {e}")))?,
            MailTransport::File(file) => file
                .send(message)
                .await
                .map(|_| ())
                .map_err(|e| MailError::Transport(format!("file: {e}")))?,
        }

        info!(
            attachments = contact.attachments.len(),
            "Contact message sent"
        );
        Ok(())
    }
}

fn configured_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MailError::Setup(format!("parse address '{address}': {e}")))
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, MailError> {
    let value = value.trim();
    if value.is_empty() {
        Err(MailError::MissingField(field))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::domain::UploadedFile;
    use bytes::Bytes;
    use tempfile::TempDir;

    fn file_settings(dir: &TempDir) -> EmailSettings {
        let mut settings = Settings::from_defaults().unwrap().email;
        settings.transport = EmailTransportKind::File;
        settings.file_path = dir.path().to_string_lossy().into_owned();
        settings
    }

    fn contact() -> ContactMessage {
        ContactMessage {
            email: "cliente@example.com".to_string(),
            subject_reason: "Duvida".to_string(),
            description: "Nao consigo gerar o DANFE".to_string(),
            attachments: vec![UploadedFile::new(
                "print.png",
                "image/png",
                Bytes::from_static(b"\x89PNG"),
            )],
        }
    }

    fn written_emails(dir: &TempDir) -> Vec<String> {
        std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_file_transport_writes_message() {
        let dir = TempDir::new().unwrap();
        let mailer = ContactMailer::new(&file_settings(&dir)).unwrap();

        mailer.send_contact(&contact()).await.unwrap();

        let emails = written_emails(&dir);
        assert_eq!(emails.len(), 1);
        let email = &emails[0];
        assert!(email.contains("Subject: [Contato] Duvida"));
        assert!(email.contains("Reply-To: cliente@example.com"));
        assert!(email.contains("To: contato@danfe-proxy.local"));
        assert!(email.contains("filename=\"print.png\""));
        assert!(email.contains("Nao consigo gerar o DANFE"));
    }

    #[test]
    fn test_invalid_client_address_is_client_error() {
        let dir = TempDir::new().unwrap();
        let mailer = ContactMailer::new(&file_settings(&dir)).unwrap();
        let mut message = contact();
        message.email = "not-an-address".to_string();

        let error = mailer.build_message(&message).unwrap_err();
        assert!(matches!(error, MailError::InvalidAddress { .. }));
        assert!(error.is_client_error());
    }

    #[test]
    fn test_blank_description_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mailer = ContactMailer::new(&file_settings(&dir)).unwrap();
        let mut message = contact();
        message.description = "  ".to_string();

        let error = mailer.build_message(&message).unwrap_err();
        assert_eq!(error.to_string(), "description is required");
        assert!(error.is_client_error());
    }

    #[test]
    fn test_bad_configured_sender_is_setup_error() {
        let dir = TempDir::new().unwrap();
        let mut settings = file_settings(&dir);
        settings.from_address = "nobody".to_string();

        let error = ContactMailer::new(&settings).err().unwrap();
        assert!(matches!(error, MailError::Setup(_)));
        assert!(!error.is_client_error());
    }

    #[test]
    fn test_smtp_transport_can_be_built() {
        let mut settings = Settings::from_defaults().unwrap().email;
        settings.transport = EmailTransportKind::Smtp;
        settings.smtp_tls = false;
        settings.smtp_username = Some("user".to_string());
        settings.smtp_password = Some("pass".to_string());

        assert!(ContactMailer::new(&settings).is_ok());
    }
}
