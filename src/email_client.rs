/// Email delivery client.
///
/// Invoked fire-and-forget after email-token issuance: a delivery failure
/// is logged but never fails the request that triggered it.
use serde::Serialize;

use crate::configuration::EmailSettings;
use crate::error::AppError;
use crate::validators::is_valid_email;

#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    base_url: String,
    sender: SenderEmail,
    link_base_url: String,
}

/// A sender address that has passed validation at construction time.
#[derive(Clone)]
pub struct SenderEmail(String);

impl SenderEmail {
    pub fn parse(s: String) -> Result<Self, String> {
        let email = is_valid_email(&s).map_err(|e| e.to_string())?;
        Ok(Self(email))
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize)]
struct SendEmailRequest {
    from: String,
    to: String,
    subject: String,
    html: String,
}

impl EmailClient {
    pub fn new(settings: &EmailSettings, sender: SenderEmail) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: settings.base_url.clone(),
            sender,
            link_base_url: settings.link_base_url.clone(),
        }
    }

    pub async fn send_verification_email(
        &self,
        recipient: &str,
        token: &str,
    ) -> Result<(), AppError> {
        let link = format!(
            "{}/account/verify-email?token={}",
            self.link_base_url, token
        );
        self.send_email(
            recipient,
            "Verify your email address",
            &format!(
                "<p>Welcome! Please <a href=\"{}\">verify your email address</a>.</p>",
                link
            ),
        )
        .await
    }

    pub async fn send_password_reset_email(
        &self,
        recipient: &str,
        token: &str,
    ) -> Result<(), AppError> {
        let link = format!("{}/reset-password?token={}", self.link_base_url, token);
        self.send_email(
            recipient,
            "Reset your password",
            &format!(
                "<p>You requested a password reset. <a href=\"{}\">Choose a new password</a>.</p>",
                link
            ),
        )
        .await
    }

    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
    ) -> Result<(), AppError> {
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: self.sender.inner().to_string(),
            to: recipient.to_string(),
            subject: subject.to_string(),
            html: html_content.to_string(),
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Email(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::Email(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_email_parse_valid() {
        assert!(SenderEmail::parse("no-reply@example.com".to_string()).is_ok());
    }

    #[test]
    fn sender_email_parse_invalid() {
        assert!(SenderEmail::parse("invalid-email".to_string()).is_err());
    }
}
