//! Email service for account notifications
//!
//! Sends verification and password-reset links over SMTP. Delivery is
//! decoupled from the request cycle: callers use [`EmailService::dispatch`]
//! variants, which spawn the send and log failures without surfacing them.
//!
//! An empty SMTP host disables sending entirely; dispatches become logged
//! no-ops. This keeps tests and local development off the network.

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::config::EmailConfig;

/// Email service for sending account emails
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Whether outbound email is configured
    pub fn is_enabled(&self) -> bool {
        !self.config.smtp_host.is_empty()
    }

    /// Send an HTML email.
    pub async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> Result<()> {
        if !self.is_enabled() {
            tracing::debug!(to = to_email, subject, "Email disabled; skipping send");
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_address);

        let email = Message::builder()
            .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .to(to_email
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
                .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
                .credentials(creds)
                .port(self.config.smtp_port)
                .build();

        mailer
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }

    /// Send the account-verification email with the token link.
    pub async fn send_verification_email(&self, to_email: &str, token: &str) -> Result<()> {
        let link = format!(
            "{}/guest/verify?token={}&email={}",
            self.config.frontend_url,
            urlencoding::encode(token),
            urlencoding::encode(to_email)
        );
        let body = format!(
            "<p style='font-size: 16px; color: #333;'>Click the link below to verify your account:</p>\
             <p><a href='{}' target='_blank'>Verify your account</a></p>\
             <p>If you didn't create an account, you can ignore this email.</p>",
            link
        );

        self.send(to_email, "Verify Your Email", &body).await
    }

    /// Send the password-reset email with the token link.
    pub async fn send_password_reset_email(&self, to_email: &str, token: &str) -> Result<()> {
        let link = format!(
            "{}/guest/reset-password?token={}&email={}",
            self.config.frontend_url,
            urlencoding::encode(token),
            urlencoding::encode(to_email)
        );
        let body = format!(
            "<p style='font-size: 16px; color: #333;'>Click the link below to reset your password:</p>\
             <p><a href='{}' target='_blank'>Reset Password</a></p>\
             <p>If you didn't request a password reset, you can ignore this email.</p>",
            link
        );

        self.send(to_email, "Reset Your Password", &body).await
    }

    /// Fire-and-forget verification email; delivery failure is logged only.
    pub fn dispatch_verification_email(self: Arc<Self>, to_email: String, token: String) {
        tokio::spawn(async move {
            if let Err(e) = self.send_verification_email(&to_email, &token).await {
                tracing::warn!(to = %to_email, "Failed to send verification email: {}", e);
            }
        });
    }

    /// Fire-and-forget password-reset email; delivery failure is logged only.
    pub fn dispatch_password_reset_email(self: Arc<Self>, to_email: String, token: String) {
        tokio::spawn(async move {
            if let Err(e) = self.send_password_reset_email(&to_email, &token).await {
                tracing::warn!(to = %to_email, "Failed to send reset email: {}", e);
            }
        });
    }
}
