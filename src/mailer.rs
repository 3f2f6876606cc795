use async_trait::async_trait;
use tracing::info;

/// Outgoing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> anyhow::Result<()>;
}

/// Writes every message to the log instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> anyhow::Result<()> {
        info!(
            to = %email.to,
            reply_to = email.reply_to.as_deref().unwrap_or("-"),
            subject = %email.subject,
            "email\n{}",
            email.body
        );
        Ok(())
    }
}

#[cfg(test)]
pub use recording::RecordingMailer;

#[cfg(test)]
mod recording {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Keeps sent messages so tests can read reset links and notifications.
    #[derive(Debug, Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<Email>>,
        failing: AtomicBool,
    }

    impl RecordingMailer {
        pub fn sent(&self) -> Vec<Email> {
            self.sent.lock().unwrap().clone()
        }

        /// Makes every later `send` fail without recording.
        pub fn fail_deliveries(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: Email) -> anyhow::Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                anyhow::bail!("smtp unavailable");
            }
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }
}
