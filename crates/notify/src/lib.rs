//! Failure notifications.
//!
//! The sync pipeline reports unrecoverable per-entry failures through the
//! [`Notifier`] trait. [`WebhookNotifier`] delivers them as text messages to
//! a group-chat bot webhook.

pub mod webhook;

use std::future::Future;
use std::pin::Pin;

pub use webhook::{MENTION_ALL, WebhookConfig, WebhookNotifier};

/// Errors that can occur while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("webhook refused message: {errmsg} (errcode {errcode})")]
    Refused { errcode: i64, errmsg: String },

    #[error("malformed webhook response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

/// Delivers a human-readable message to whoever watches the agent.
pub trait Notifier: Send + Sync {
    fn notify<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;
}
