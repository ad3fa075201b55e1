use crate::config::{required, var_or};
use crate::error::{AppError, AppResult};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    pub use_tls: bool,
    /// Log messages instead of talking to an SMTP server.
    pub development_mode: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@example.com".to_string(),
            from_name: "OA System".to_string(),
            use_tls: true,
            development_mode: true,
        }
    }
}

impl EmailConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let development_mode = var_or("EMAIL_DEVELOPMENT_MODE", true)?;
        if development_mode {
            return Ok(Self::default());
        }

        Ok(Self {
            smtp_host: required("SMTP_HOST")?,
            smtp_port: var_or("SMTP_PORT", 587)?,
            smtp_username: required("SMTP_USERNAME")?,
            smtp_password: required("SMTP_PASSWORD")?,
            from_email: required("FROM_EMAIL")?,
            from_name: var_or("FROM_NAME", "OA System".to_string())?,
            use_tls: var_or("SMTP_USE_TLS", true)?,
            development_mode: false,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone)]
pub struct Mailer {
    from: Mailbox,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl Mailer {
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email).parse()?;

        let transport = if config.development_mode {
            None
        } else {
            let builder = if config.use_tls {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            };
            Some(
                builder
                    .port(config.smtp_port)
                    .credentials(Credentials::new(
                        config.smtp_username.clone(),
                        config.smtp_password.clone(),
                    ))
                    .build(),
            )
        };

        Ok(Self { from, transport })
    }

    pub async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| AppError::Validation(format!("invalid e-mail address {}: {e}", mail.to)))?;

        let Some(transport) = &self.transport else {
            info!(to = %mail.to, subject = %mail.subject, body = %mail.body, "E-mail (development mode)");
            return Ok(());
        };

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| AppError::Internal(format!("failed to build e-mail: {e}")))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::Internal(format!("SMTP send failed: {e}")))?;

        info!(to = %mail.to, subject = %mail.subject, "E-mail sent");
        Ok(())
    }

    /// Sends on a background task. The caller never sees the outcome.
    pub fn dispatch(&self, mail: OutgoingMail) {
        let mailer = self.clone();
        actix_web::rt::spawn(async move {
            let to = mail.to.clone();
            if let Err(e) = mailer.send(mail).await {
                error!(error = %e, to = %to, "Failed to send e-mail");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn development_mode_only_logs() {
        let mailer = Mailer::new(&EmailConfig::default()).unwrap();
        let sent = mailer
            .send(OutgoingMail {
                to: "alice@example.com".to_string(),
                subject: "Activate".to_string(),
                body: "link".to_string(),
            })
            .await;
        assert!(sent.is_ok());
    }

    #[actix_web::test]
    async fn bad_recipient_is_rejected() {
        let mailer = Mailer::new(&EmailConfig::default()).unwrap();
        let sent = mailer
            .send(OutgoingMail {
                to: "not an address".to_string(),
                subject: "x".to_string(),
                body: "y".to_string(),
            })
            .await;
        assert!(matches!(sent, Err(AppError::Validation(_))));
    }
}
