///! Email notification over SMTP
use crate::config::{ConfigError, SmtpConfig};
use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;

/// Sends HTML reports, optionally with a CSV attachment.
///
/// In test mode the message is still fully built (so malformed
/// addresses or bodies surface immediately) but nothing is sent.
pub struct EmailNotifier {
    smtp: SmtpConfig,
    test_mode: bool,
}

impl EmailNotifier {
    pub fn new(smtp: SmtpConfig, test_mode: bool) -> Self {
        if test_mode {
            tracing::info!("TEST MODE: emails will not be sent");
        }
        Self { smtp, test_mode }
    }

    /// Check credentials and recipients before any SMTP traffic.
    /// Test mode needs neither.
    pub fn validate(&self, recipients: &[String]) -> Result<(), ConfigError> {
        if self.test_mode {
            return Ok(());
        }
        if self.smtp.sender.is_empty() || self.smtp.password.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        if recipients.is_empty() {
            return Err(ConfigError::NoRecipients);
        }
        Ok(())
    }

    pub async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        html: &str,
        attachment: Option<&Path>,
    ) -> Result<()> {
        self.validate(recipients)?;

        // A missing or unreadable attachment downgrades to a plain
        // report rather than blocking the notification.
        let attachment_data = match attachment {
            Some(path) => match tokio::fs::read(path).await {
                Ok(bytes) => {
                    let filename = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "schedule.csv".to_string());
                    tracing::info!("Attaching file: {:?}", path);
                    Some((filename, bytes))
                }
                Err(e) => {
                    tracing::warn!("Failed to attach file {:?}: {}", path, e);
                    None
                }
            },
            None => None,
        };

        if self.test_mode {
            tracing::info!("TEST MODE - email would be sent to: {:?}", recipients);
            tracing::info!("Subject: {}", subject);
            if self.smtp.sender.is_empty() {
                tracing::info!("No sender configured, skipping message validation");
                return Ok(());
            }
            self.build_message(recipients, subject, html, attachment_data)?;
            tracing::info!("Email created successfully (not sent in test mode)");
            return Ok(());
        }

        let message = self.build_message(recipients, subject, html, attachment_data)?;

        tracing::info!("Connecting to {}:{}", self.smtp.server, self.smtp.port);
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp.server)
            .context("Failed to configure SMTP transport")?
            .port(self.smtp.port)
            .credentials(Credentials::new(
                self.smtp.sender.clone(),
                self.smtp.password.clone(),
            ))
            .build();

        transport
            .send(message)
            .await
            .context("Failed to send email")?;

        tracing::info!("Email sent to {} recipient(s)", recipients.len());
        Ok(())
    }

    fn build_message(
        &self,
        recipients: &[String],
        subject: &str,
        html: &str,
        attachment_data: Option<(String, Vec<u8>)>,
    ) -> Result<Message> {
        let from: Mailbox = self
            .smtp
            .sender
            .parse()
            .context("Invalid sender address")?;

        let mut builder = Message::builder().from(from).subject(subject);
        for recipient in recipients {
            let to: Mailbox = recipient
                .parse()
                .with_context(|| format!("Invalid recipient address '{}'", recipient))?;
            builder = builder.to(to);
        }

        let html_part = SinglePart::html(html.to_string());

        let message = match attachment_data {
            Some((filename, bytes)) => {
                let csv_part = Attachment::new(filename).body(
                    bytes,
                    ContentType::parse("text/csv").context("Invalid attachment content type")?,
                );
                builder.multipart(
                    MultiPart::mixed()
                        .multipart(MultiPart::alternative().singlepart(html_part))
                        .singlepart(csv_part),
                )
            }
            None => builder.multipart(MultiPart::alternative().singlepart(html_part)),
        }
        .context("Failed to build email message")?;

        Ok(message)
    }
}
