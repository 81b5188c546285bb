//! Group-chat bot webhook notifier.
//!
//! Posts `{"msgtype":"text","text":{"content":..,"mentioned_list":[..]}}`.
//! The bot answers 200 with `{"errcode":0,"errmsg":"ok"}` on success; any
//! non-zero `errcode` is a refusal.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Notifier, NotifyError};

/// Mention that addresses every member of the chat.
pub const MENTION_ALL: &str = "@all";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for [`WebhookNotifier`].
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Full webhook URL, including any key query parameter.
    pub url: String,
    /// Chat user ids to mention in every message.
    ///
    /// Sent exactly as given: the bot matches on account ids, not display
    /// names, and no name-to-id lookup is done here.
    pub mentioned: Vec<String>,
    pub mention_all: bool,
    pub timeout: Duration,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mentioned: Vec::new(),
            mention_all: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn mentioned_list(&self) -> Vec<String> {
        let mut list = self.mentioned.clone();
        if self.mention_all && !list.iter().any(|m| m == MENTION_ALL) {
            list.push(MENTION_ALL.to_string());
        }
        list
    }
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    msgtype: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    content: &'a str,
    mentioned_list: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WebhookResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Sends notifications as chat bot text messages.
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
    mentioned: Vec<String>,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
            mentioned: config.mentioned_list(),
        })
    }

    async fn send(&self, content: &str) -> Result<(), NotifyError> {
        let body = TextMessage {
            msgtype: "text",
            text: TextBody {
                content,
                mentioned_list: self.mentioned.clone(),
            },
        };

        let resp = self.http.post(&self.url).json(&body).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).trim().to_string(),
            });
        }

        let parsed: WebhookResponse = serde_json::from_slice(&bytes)?;
        if parsed.errcode != 0 {
            return Err(NotifyError::Refused {
                errcode: parsed.errcode,
                errmsg: parsed.errmsg,
            });
        }

        debug!(bytes = content.len(), "notification delivered");
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn notify<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>> {
        Box::pin(self.send(message))
    }
}
