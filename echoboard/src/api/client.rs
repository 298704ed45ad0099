// HTTP client for the feedback backend.
//
// Two JSON endpoints (`GET` and `POST /api/feedback`) plus a `/ping` health
// probe. Non-2xx responses are turned into typed `ApiError`s whose display
// text is what the board shows inline. No retries and no timeouts: failures
// go straight back to the caller.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::ApiConfig;
use crate::feedback::FeedbackItem;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const FEEDBACK_PATH: &str = "/api/feedback";
const PING_PATH: &str = "/ping";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    /// The list request came back with a non-2xx status.
    #[error("Load failed ({status})")]
    Load { status: u16 },

    /// The create request came back with a non-2xx status. `message` is the
    /// response body when the server sent one, else a status-derived text.
    #[error("{message}")]
    Submit { status: u16, message: String },

    /// The health probe came back with a non-2xx status.
    #[error("Backend unavailable ({status})")]
    Unavailable { status: u16 },

    /// Connection failure or an undecodable response body.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// The HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Load { status }
            | ApiError::Submit { status, .. }
            | ApiError::Unavailable { status } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

// ---------------------------------------------------------------------------
// FeedbackApi
// ---------------------------------------------------------------------------

/// The backend operations the board controller depends on.
#[async_trait]
pub trait FeedbackApi: Send + Sync {
    /// Fetch every feedback item in server order.
    async fn list(&self) -> Result<Vec<FeedbackItem>, ApiError>;

    /// Create a feedback item and return it as echoed by the server.
    async fn create(&self, name: &str, message: &str) -> Result<FeedbackItem, ApiError>;

    /// Check that the backend is answering.
    async fn ping(&self) -> Result<(), ApiError>;
}

#[derive(Debug, Serialize)]
struct NewFeedback<'a> {
    name: &'a str,
    message: &'a str,
}

// ---------------------------------------------------------------------------
// HttpFeedbackClient
// ---------------------------------------------------------------------------

/// reqwest-backed implementation of [`FeedbackApi`].
#[derive(Debug, Clone)]
pub struct HttpFeedbackClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpFeedbackClient {
    /// Create a client for the given base URL. A trailing slash is stripped.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl FeedbackApi for HttpFeedbackClient {
    async fn list(&self) -> Result<Vec<FeedbackItem>, ApiError> {
        let url = self.url(FEEDBACK_PATH);
        debug!(%url, "GET feedback list");

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Load {
                status: status.as_u16(),
            });
        }

        let items: Vec<FeedbackItem> = response.json().await?;
        debug!(count = items.len(), "feedback list received");
        Ok(items)
    }

    async fn create(&self, name: &str, message: &str) -> Result<FeedbackItem, ApiError> {
        let url = self.url(FEEDBACK_PATH);
        let body = NewFeedback {
            name: name.trim(),
            message: message.trim(),
        };
        debug!(%url, name = body.name, "POST feedback");

        let response = self.http.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.trim().is_empty() {
                format!("Submit failed ({})", status.as_u16())
            } else {
                text
            };
            return Err(ApiError::Submit {
                status: status.as_u16(),
                message,
            });
        }

        let created: FeedbackItem = response.json().await?;
        debug!(id = created.id, "feedback created");
        Ok(created)
    }

    async fn ping(&self) -> Result<(), ApiError> {
        let response = self.http.get(self.url(PING_PATH)).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Unavailable {
                status: status.as_u16(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
