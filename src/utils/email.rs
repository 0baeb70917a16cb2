use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, instrument};

use classpulse_config::EmailConfig;
use classpulse_core::AppError;

pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    #[instrument(skip(self))]
    pub async fn send_welcome_email(&self, to_email: &str, to_name: &str) -> Result<(), AppError> {
        let text_body = format!(
            "Hi {},\n\n\
             Your Classpulse account is ready. You can now sign in to share and review \
             classroom feedback.\n\n\
             The Classpulse Team",
            to_name
        );
        let html_body = self.layout(
            "Welcome to Classpulse",
            &format!(
                "<p>Hi {},</p><p>Your Classpulse account is ready. You can now sign in to \
                 share and review classroom feedback.</p>",
                to_name
            ),
        );

        self.send_email(to_email, "Welcome to Classpulse", &text_body, &html_body)
            .await
    }

    /// `reset_url` already contains the raw token.
    #[instrument(skip(self, reset_url))]
    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        to_name: &str,
        reset_url: &str,
    ) -> Result<(), AppError> {
        let text_body = format!(
            "Hi {},\n\n\
             You are receiving this email because you (or someone else) requested a \
             password reset. Make a PUT request to:\n\n{}\n\n\
             The link expires in 10 minutes. If you did not request this, ignore this email.",
            to_name, reset_url
        );
        let html_body = self.layout(
            "Password reset token",
            &format!(
                "<p>Hi {},</p><p>You are receiving this email because you (or someone else) \
                 requested a password reset. Make a PUT request to:</p>\
                 <p><a href=\"{url}\">{url}</a></p>\
                 <p>The link expires in 10 minutes. If you did not request this, ignore this \
                 email.</p>",
                to_name,
                url = reset_url
            ),
        );

        self.send_email(to_email, "Password reset token", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, html_body, text_body))]
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            info!(to = %to_email, subject = %subject, body = %text_body, "SMTP disabled; email not sent");
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        let mailer = if self.config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| {
                    AppError::internal_error(format!("Failed to create SMTP relay: {}", e))
                })?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        };

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal_error(format!("Task join error: {}", e)))?
            .map_err(|e| AppError::internal_error(format!("Failed to send email: {}", e)))?;

        Ok(())
    }

    fn layout(&self, title: &str, content: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>{title}</title></head>
<body style="margin: 0; padding: 20px; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <div style="max-width: 600px; margin: 0 auto; background-color: #ffffff; border-radius: 8px; overflow: hidden;">
        <div style="background-color: #0F766E; padding: 24px; text-align: center;">
            <h1 style="margin: 0; color: #ffffff; font-size: 24px;">Classpulse</h1>
        </div>
        <div style="padding: 24px; color: #333333; font-size: 15px; line-height: 1.6;">
            {content}
        </div>
        <div style="background-color: #f8f9fa; padding: 16px; text-align: center; color: #999999; font-size: 12px;">
            Sent by {from_name}
        </div>
    </div>
</body>
</html>"#,
            title = title,
            content = content,
            from_name = self.config.from_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_transport_does_not_fail() {
        let service = EmailService::new(EmailConfig::disabled());
        service
            .send_password_reset_email(
                "alice@example.com",
                "Alice",
                "http://localhost:8080/api/auth/resetpassword/abc",
            )
            .await
            .unwrap();
        service
            .send_welcome_email("alice@example.com", "Alice")
            .await
            .unwrap();
    }

    #[test]
    fn test_layout_embeds_content() {
        let service = EmailService::new(EmailConfig::disabled());
        let html = service.layout("Title", "<p>Body</p>");
        assert!(html.contains("<title>Title</title>"));
        assert!(html.contains("<p>Body</p>"));
    }
}
