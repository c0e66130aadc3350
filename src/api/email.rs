//! Email delivery abstraction.
//!
//! Registration and resend flows build an [`EmailMessage`] and hand it to an
//! [`EmailSender`]. The sender decides how to deliver (SMTP, API, etc.) and
//! returns `Ok`/`Err`. The default sender for local dev is [`LogEmailSender`],
//! which logs the payload and returns `Ok(())`.

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub template: String,
    pub payload_json: String,
}

/// Email delivery abstraction.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            template = %message.template,
            payload = %message.payload_json,
            "email send stub"
        );
        Ok(())
    }
}

/// Build the verification email for a freshly issued token link.
pub(crate) fn verification_message(email: &str, verify_url: &str) -> Result<EmailMessage> {
    let payload = json!({
        "email": email,
        "verify_url": verify_url,
    });
    let payload_json =
        serde_json::to_string(&payload).context("failed to serialize email payload")?;
    Ok(EmailMessage {
        to_email: email.to_string(),
        template: "verify_email".to_string(),
        payload_json,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_sender_accepts_messages() {
        let message = verification_message(
            "alice@example.com",
            "https://almanac.dev/verify-email#token=abc",
        )
        .unwrap();
        assert_eq!(message.to_email, "alice@example.com");
        assert_eq!(message.template, "verify_email");
        assert!(message.payload_json.contains("verify-email#token=abc"));
        assert!(LogEmailSender.send(&message).is_ok());
    }
}
