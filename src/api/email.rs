//! Outbound notification dispatch.
//!
//! The reset flow hands messages to an `EmailSender` on a background task:
//! `forgot_password` never awaits delivery and never observes its outcome.
//! The default sender for local dev is `LogEmailSender`, which logs and
//! returns `Ok(())`.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body_html: String,
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
            subject = %message.subject,
            body = %message.body_html,
            "email send stub"
        );
        Ok(())
    }
}

/// Hand a message to the sender on a background task (fire-and-forget).
/// Delivery failures are logged and never reported to the caller.
pub fn dispatch(sender: Arc<dyn EmailSender>, message: EmailMessage) {
    tokio::spawn(async move {
        if let Err(err) = sender.send(&message) {
            error!(to_email = %message.to_email, "failed to send email: {err}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct CapturingSender(mpsc::UnboundedSender<EmailMessage>);

    impl EmailSender for CapturingSender {
        fn send(&self, message: &EmailMessage) -> Result<()> {
            let _ = self.0.send(message.clone());
            Ok(())
        }
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to_email: "a@example.com".to_string(),
            subject: "reset password".to_string(),
            body_html: "<a href=\"https://pordisto.dev\">reset password</a>".to_string(),
        }
    }

    #[test]
    fn log_sender_always_succeeds() {
        assert!(LogEmailSender.send(&message()).is_ok());
    }

    #[tokio::test]
    async fn dispatch_hands_message_to_sender() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch(Arc::new(CapturingSender(tx)), message());

        let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("dispatch timed out")
            .expect("sender dropped");
        assert_eq!(received.to_email, "a@example.com");
        assert_eq!(received.subject, "reset password");
    }
}
