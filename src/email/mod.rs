pub mod resend;
pub mod template;

use serde::Serialize;
use thiserror::Error;

pub use resend::ResendClient;
pub use template::reminder_email;

/// A single outgoing message in the shape transactional email APIs accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Send timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[async_trait::async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}
