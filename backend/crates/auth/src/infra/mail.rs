//! SMTP Mail Delivery
//!
//! Plain-text transactional mail over `lettre`. With no SMTP host the
//! service runs in log-only mode and never touches the network.

use std::sync::Arc;

use lettre::message::{Mailbox, Message, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::domain::gateway::EmailSender;
use crate::domain::value_object::{email::Email, verification_code::VerificationCode};
use crate::error::{AuthError, AuthResult};

const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP settings
#[derive(Debug, Clone)]
pub struct MailSettings {
    /// Empty host selects log-only mode
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: DEFAULT_SMTP_PORT,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "Surplus <no-reply@localhost.localdomain>".to_string(),
        }
    }
}

impl MailSettings {
    /// `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM`
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();
        Self {
            smtp_host: var("SMTP_HOST").unwrap_or_default(),
            smtp_port: var("SMTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.smtp_port),
            smtp_username: var("SMTP_USERNAME"),
            smtp_password: var("SMTP_PASSWORD"),
            smtp_from: var("SMTP_FROM").unwrap_or(defaults.smtp_from),
        }
    }
}

/// SMTP transport or log-only sink
#[derive(Clone)]
pub struct MailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl MailService {
    pub fn new(settings: &MailSettings) -> AuthResult<Self> {
        let from = settings
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AuthError::Configuration(format!("Invalid SMTP_FROM address: {e}")))?;

        let transport = if settings.smtp_host.trim().is_empty() {
            tracing::warn!("SMTP host not configured; mail will be logged, not sent");
            None
        } else {
            let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
                .map_err(|e| {
                    AuthError::Configuration(format!("Failed to configure SMTP transport: {e}"))
                })?
                .port(settings.smtp_port);

            let builder = match (&settings.smtp_username, &settings.smtp_password) {
                (Some(username), Some(password)) => {
                    builder.credentials(Credentials::new(username.clone(), password.clone()))
                }
                _ => builder,
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    async fn send_mail(&self, to: &Email, subject: &str, body: String) -> AuthResult<()> {
        let Some(transport) = &self.transport else {
            tracing::info!(
                to = %to.masked(),
                subject,
                "Mail delivery disabled; message suppressed"
            );
            return Ok(());
        };

        let recipient = to
            .as_str()
            .parse::<Mailbox>()
            .map_err(|e| AuthError::Mail(format!("Invalid recipient address: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AuthError::Mail(format!("Failed to build message: {e}")))?;

        transport
            .send(message)
            .await
            .map_err(|e| AuthError::Mail(format!("Failed to send: {e}")))?;

        tracing::info!(to = %to.masked(), subject, "Mail sent");

        Ok(())
    }
}

impl EmailSender for MailService {
    async fn send_magic_link(&self, to: &Email, link: &str) -> AuthResult<()> {
        let body = format!(
            "Use the link below to sign in. It expires in 30 minutes.\n\n{link}\n\n\
             If you did not request this, you can ignore this email."
        );
        self.send_mail(to, "Your sign-in link", body).await
    }

    async fn send_verification_code(&self, to: &Email, code: &VerificationCode) -> AuthResult<()> {
        let body = format!(
            "Your verification code is {}. It expires in 10 minutes.\n\n\
             If you did not request this, you can ignore this email.",
            code.as_str()
        );
        self.send_mail(to, "Verify your email", body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_host_is_log_only() {
        let service = MailService::new(&MailSettings::default()).unwrap();
        assert!(!service.is_enabled());
    }

    #[test]
    fn test_invalid_from_is_configuration_error() {
        let settings = MailSettings {
            smtp_from: "not an address".to_string(),
            ..MailSettings::default()
        };
        assert!(matches!(
            MailService::new(&settings),
            Err(AuthError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_log_only_send_succeeds() {
        let service = MailService::new(&MailSettings::default()).unwrap();
        let to = Email::new("someone@example.com").unwrap();
        service
            .send_verification_code(&to, &VerificationCode::from_stored("123456"))
            .await
            .unwrap();
    }
}
