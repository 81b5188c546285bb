//! HTTP collector transport.
//!
//! Multipart POST per chunk using `reqwest`, with a per-request timeout and
//! optional Bearer token authentication.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use tracing::trace;

use crate::error::CollectorError;
use crate::transport::CollectorTransport;
use crate::types::ChunkRequest;
use crate::wire::{CHUNK_FIELD, CollectorResponse, META_FIELD};

/// Default upload endpoint path on the collector.
pub const DEFAULT_UPLOAD_PATH: &str = "/upload";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Scheme, host and port, e.g. `http://10.0.0.5:8080`.
    pub server_url: String,
    pub upload_path: String,
    pub timeout: Duration,
    /// Passed through as `Authorization: Bearer <token>` when set.
    pub bearer_token: Option<String>,
}

impl HttpTransportConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            bearer_token: None,
        }
    }

    /// Full upload URL.
    pub fn upload_url(&self) -> String {
        let base = self.server_url.trim_end_matches('/');
        let path = self.upload_path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

/// Collector transport over HTTP.
pub struct HttpTransport {
    http: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// Creates a transport for the given collector.
    pub fn new(config: &HttpTransportConfig) -> Result<Self, CollectorError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| CollectorError::InvalidConfig("bearer token".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            url: config.upload_url(),
        })
    }

    async fn post_chunk(&self, request: ChunkRequest) -> Result<CollectorResponse, CollectorError> {
        let meta_json = serde_json::to_string(&request.meta).map_err(CollectorError::Encode)?;
        let chunk_index = request.meta.chunk_index;

        let chunk = Part::bytes(request.data)
            .file_name(request.meta.file_name)
            .mime_str("application/octet-stream")?;
        let form = Form::new().text(META_FIELD, meta_json).part(CHUNK_FIELD, chunk);

        let resp = self.http.post(&self.url).multipart(form).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        trace!(chunk_index, status = status.as_u16(), bytes = body.len(), "collector response");

        if !status.is_success() {
            // A structured error body is an application-level rejection;
            // anything else is a transport failure.
            if let Ok(parsed) = serde_json::from_slice::<CollectorResponse>(&body)
                && parsed.has_error_details()
            {
                return Err(CollectorError::Rejected {
                    chunk_index,
                    code: parsed.code.or(Some(i64::from(status.as_u16()))),
                    message: parsed.msg.or(parsed.status).unwrap_or_default(),
                });
            }
            return Err(CollectorError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }

        serde_json::from_slice(&body).map_err(CollectorError::MalformedResponse)
    }
}

impl CollectorTransport for HttpTransport {
    fn send_chunk(
        &self,
        request: ChunkRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CollectorResponse, CollectorError>> + Send + '_>> {
        Box::pin(self.post_chunk(request))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
