//! HTTP seam shared by the upload and lookup transports
//!
//! The transports only need "POST this multipart body, give me status and
//! body back". Keeping that behind [`HttpTransport`] lets retry and
//! validation logic run against scripted responses in tests.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT: &str = concat!("FoodLens/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Bytes handed to the connection per progress tick
const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

/// Header carrying the per-call trace identifier
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Receives upload progress in `0.0..=1.0`
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// File part of a multipart body
#[derive(Clone)]
pub struct FilePart {
    pub field_name: String,
    pub file_name: String,
    pub mime_type: String,
    /// Shared so retries do not copy the image
    pub bytes: Arc<Vec<u8>>,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("field_name", &self.field_name)
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One multipart POST
#[derive(Debug, Clone)]
pub struct MultipartRequest {
    pub url: String,
    pub request_id: String,
    /// Text fields, in order
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

impl MultipartRequest {
    pub fn new(url: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_id: request_id.into(),
            fields: Vec::new(),
            file: None,
        }
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn file(mut self, file: FilePart) -> Self {
        self.file = Some(file);
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Success body, or the classified status error
    pub fn into_success_body(self) -> ClientResult<String> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(ClientError::from_status(self.status, self.body))
        }
    }
}

/// Sends multipart POST requests
///
/// Implementations must abort the underlying request when the returned
/// future is dropped; that is how timeouts and cancellation take effect.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_multipart(
        &self,
        request: MultipartRequest,
        progress: Option<ProgressCallback>,
    ) -> ClientResult<RawResponse>;
}

/// Fraction of bytes sent; a zero denominator reports 0
pub fn progress_fraction(sent: u64, expected: u64) -> f64 {
    if expected == 0 {
        0.0
    } else {
        (sent as f64 / expected as f64).min(1.0)
    }
}

/// reqwest-backed transport
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> ClientResult<Self> {
        // No overall timeout here: callers race each attempt against their own timer
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }

    fn streaming_body(bytes: Arc<Vec<u8>>, progress: Option<ProgressCallback>) -> reqwest::Body {
        let expected = bytes.len() as u64;
        let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();

        if let Some(callback) = &progress {
            callback(0.0);
        }

        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            if let Some(callback) = &progress {
                callback(progress_fraction(sent, expected));
            }
            Ok::<_, std::io::Error>(chunk)
        });

        reqwest::Body::wrap_stream(stream)
    }

    fn build_form(
        request: &MultipartRequest,
        progress: Option<ProgressCallback>,
    ) -> ClientResult<Form> {
        let mut form = Form::new();

        if let Some(file) = &request.file {
            let length = file.bytes.len() as u64;
            let body = Self::streaming_body(Arc::clone(&file.bytes), progress);
            let part = Part::stream_with_length(body, length)
                .file_name(file.file_name.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| ClientError::InvalidInput(format!("Invalid MIME type: {}", e)))?;
            form = form.part(file.field_name.clone(), part);
        }

        for (name, value) in &request.fields {
            form = form.text(name.clone(), value.clone());
        }

        Ok(form)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_multipart(
        &self,
        request: MultipartRequest,
        progress: Option<ProgressCallback>,
    ) -> ClientResult<RawResponse> {
        let form = Self::build_form(&request, progress)?;

        let response = self
            .http_client
            .post(&request.url)
            .header(REQUEST_ID_HEADER, &request.request_id)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        tracing::debug!(status, bytes = body.len(), "Received response");

        Ok(RawResponse { status, body })
    }
}
