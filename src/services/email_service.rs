use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use std::env;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Failed to build email message: {0}")]
    MessageBuild(String),
    #[error("Failed to send email: {0}")]
    SendFailed(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[async_trait]
pub trait EmailService: Send + Sync {
    /// Deliver the verification code for a pending signup.
    async fn send_otp_email(
        &self,
        to_email: &str,
        full_name: &str,
        code: &str,
        expiry_minutes: i64,
    ) -> Result<(), EmailError>;
}

/// Logs codes to the console instead of sending anything, so the signup flow
/// works in development without an SMTP server.
pub struct MockEmailService;

#[async_trait]
impl EmailService for MockEmailService {
    async fn send_otp_email(
        &self,
        to_email: &str,
        full_name: &str,
        code: &str,
        expiry_minutes: i64,
    ) -> Result<(), EmailError> {
        tracing::info!("📧 [MOCK EMAIL] Verification code to: {}", to_email);
        tracing::info!("   Recipient: {}", full_name);
        tracing::info!("   Subject: Verify Your SkillSwap Account");
        tracing::info!("   Code: {} (expires in {} minutes)", code, expiry_minutes);
        tracing::info!("   ---");
        Ok(())
    }
}

pub struct SmtpEmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
}

impl SmtpEmailService {
    pub fn new() -> Result<Self, EmailError> {
        let smtp_host = env::var("SMTP_HOST")
            .map_err(|_| EmailError::ConfigError("SMTP_HOST not set".to_string()))?;
        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|_| EmailError::ConfigError("Invalid SMTP_PORT".to_string()))?;
        let smtp_username = env::var("SMTP_USERNAME")
            .map_err(|_| EmailError::ConfigError("SMTP_USERNAME not set".to_string()))?;
        let smtp_password = env::var("SMTP_PASSWORD")
            .map_err(|_| EmailError::ConfigError("SMTP_PASSWORD not set".to_string()))?;
        let from_email = env::var("SMTP_FROM_EMAIL")
            .map_err(|_| EmailError::ConfigError("SMTP_FROM_EMAIL not set".to_string()))?;
        let from_name = env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "SkillSwap".to_string());

        let encryption = env::var("SMTP_ENCRYPTION").unwrap_or_else(|_| "starttls".to_string());

        let credentials = Credentials::new(smtp_username, smtp_password);

        let mailer = match encryption.to_lowercase().as_str() {
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp_host)
                .map_err(|e| EmailError::ConfigError(format!("SMTP relay error: {}", e)))?
                .port(smtp_port)
                .credentials(credentials)
                .build(),
            "starttls" => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp_host)
                .map_err(|e| EmailError::ConfigError(format!("SMTP starttls error: {}", e)))?
                .port(smtp_port)
                .credentials(credentials)
                .build(),
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp_host)
                .port(smtp_port)
                .credentials(credentials)
                .build(),
            _ => {
                return Err(EmailError::ConfigError(format!(
                    "Invalid SMTP_ENCRYPTION value: {}. Use 'tls', 'starttls', or 'none'",
                    encryption
                )))
            }
        };

        Ok(Self {
            mailer,
            from_email,
            from_name,
        })
    }
}

fn otp_email_body(full_name: &str, code: &str, expiry_minutes: i64) -> String {
    let greeting = if full_name.is_empty() {
        "Hello,".to_string()
    } else {
        format!("Hi {},", full_name)
    };

    format!(
        r#"{}

Thank you for signing up for SkillSwap!

Your email verification code is: {}

This code will expire in {} minutes.

If you didn't request this code, please ignore this email.

Best regards,
The SkillSwap Team
"#,
        greeting, code, expiry_minutes
    )
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_otp_email(
        &self,
        to_email: &str,
        full_name: &str,
        code: &str,
        expiry_minutes: i64,
    ) -> Result<(), EmailError> {
        let body = otp_email_body(full_name, code, expiry_minutes);

        let email = Message::builder()
            .from(
                format!("{} <{}>", self.from_name, self.from_email)
                    .parse()
                    .map_err(|e| {
                        EmailError::MessageBuild(format!("Invalid from address: {}", e))
                    })?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::MessageBuild(format!("Invalid to address: {}", e)))?)
            .subject("Verify Your SkillSwap Account")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::MessageBuild(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        Ok(())
    }
}

pub fn create_email_service() -> Box<dyn EmailService> {
    if env::var("SMTP_HOST").is_ok() {
        match SmtpEmailService::new() {
            Ok(service) => {
                tracing::info!("Using SMTP email service");
                Box::new(service)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize SMTP email service: {}. Falling back to mock service",
                    e
                );
                Box::new(MockEmailService)
            }
        }
    } else {
        tracing::info!(
            "SMTP not configured. Using mock email service (codes will be logged to console)"
        );
        Box::new(MockEmailService)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_service_always_succeeds() {
        let result = MockEmailService
            .send_otp_email("user@example.com", "Test User", "123456", 10)
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_body_carries_code_and_expiry() {
        let body = otp_email_body("Amina", "482913", 10);
        assert!(body.starts_with("Hi Amina,"));
        assert!(body.contains("Your email verification code is: 482913"));
        assert!(body.contains("This code will expire in 10 minutes."));
    }

    #[test]
    fn test_blank_name_generic_greeting() {
        let body = otp_email_body("", "482913", 10);
        assert!(body.starts_with("Hello,"));
    }
}
