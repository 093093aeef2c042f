//! Photo upload transport
//!
//! Sends one multipart body per attempt (image part `file` plus the
//! `allergy_info`, `iso_country_code` and `locale` text fields), retries
//! transient failures with exponential backoff and returns a validated,
//! normalized [`AnalysisResult`].

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{AnalysisResult, Locale};
use crate::services::http_transport::{FilePart, HttpTransport, MultipartRequest, ProgressCallback};
use crate::services::normalizer::normalize_analysis;
use crate::utils::{retry_with_backoff, RetryPolicy};
use crate::validators::validate_analysis;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

const IMAGE_FIELD: &str = "file";

/// Server analysis endpoints accepting a photo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisEndpoint {
    /// Dish photo
    Analyze,
    /// Ingredient label photo
    Label,
    /// Server decides between dish and label
    Smart,
}

impl AnalysisEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            AnalysisEndpoint::Analyze => "/analyze",
            AnalysisEndpoint::Label => "/analyze/label",
            AnalysisEndpoint::Smart => "/analyze/smart",
        }
    }
}

impl fmt::Display for AnalysisEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Encoded image ready for upload
#[derive(Clone)]
pub struct ImageUpload {
    pub bytes: Arc<Vec<u8>>,
    pub file_name: String,
    pub mime_type: String,
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            file_name: "upload.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
        }
    }

    /// Read an image file, deriving the MIME type from its extension
    pub async fn from_path(path: &Path) -> ClientResult<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(foodlens_common::Error::from)?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.jpg")
            .to_string();

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let mime_type = match extension.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "heic" => "image/heic",
            other => {
                return Err(ClientError::InvalidInput(format!(
                    "Unsupported image type: {}",
                    if other.is_empty() { "<none>" } else { other }
                )))
            }
        };

        Ok(Self {
            bytes: Arc::new(bytes),
            file_name,
            mime_type: mime_type.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Text fields sent alongside the image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFields {
    pub allergy_info: String,
    pub iso_country_code: String,
    pub locale: String,
}

impl UploadFields {
    fn apply(&self, request: MultipartRequest) -> MultipartRequest {
        request
            .text("allergy_info", self.allergy_info.clone())
            .text("iso_country_code", self.iso_country_code.clone())
            .text("locale", self.locale.clone())
    }
}

/// Multipart upload with retry, timeout racing and progress
pub struct UploadTransport {
    http: Arc<dyn HttpTransport>,
    server_url: String,
    policy: RetryPolicy,
    locale: Locale,
}

impl UploadTransport {
    pub fn new(http: Arc<dyn HttpTransport>, config: &ClientConfig) -> Self {
        Self {
            http,
            server_url: config.server_url.clone(),
            policy: config.upload.clone(),
            locale: config.locale(),
        }
    }

    /// Upload `image` to `endpoint` and return the normalized result
    pub async fn upload(
        &self,
        endpoint: AnalysisEndpoint,
        image: &ImageUpload,
        fields: &UploadFields,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<AnalysisResult> {
        self.upload_cancellable(endpoint, image, fields, on_progress, &CancellationToken::new())
            .await
    }

    /// [`Self::upload`], aborting at the next suspension point once `cancel` fires
    pub async fn upload_cancellable(
        &self,
        endpoint: AnalysisEndpoint,
        image: &ImageUpload,
        fields: &UploadFields,
        on_progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> ClientResult<AnalysisResult> {
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("upload", request_id = %request_id, endpoint = %endpoint);

        async move {
            tracing::info!(bytes = image.len(), "Uploading image for analysis");

            let request = fields.apply(
                MultipartRequest::new(
                    format!("{}{}", self.server_url, endpoint.path()),
                    request_id.clone(),
                )
                .file(FilePart {
                    field_name: IMAGE_FIELD.to_string(),
                    file_name: image.file_name.clone(),
                    mime_type: image.mime_type.clone(),
                    bytes: Arc::clone(&image.bytes),
                }),
            );

            let operation = format!("upload {}", endpoint);
            let body = retry_with_backoff(
                &operation,
                &self.policy,
                cancel,
                ClientError::is_retryable,
                |_attempt| {
                    let http = Arc::clone(&self.http);
                    let request = request.clone();
                    let progress = on_progress.clone();
                    async move {
                        http.post_multipart(request, progress)
                            .await?
                            .into_success_body()
                    }
                },
            )
            .await
            .map_err(|e| self.cold_start_hint(e, endpoint))?;

            let payload: Value =
                serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))?;
            let contract = validate_analysis(payload, endpoint.path())?;
            let result = normalize_analysis(contract, self.locale);

            tracing::info!(
                food_name = %result.food_name,
                safety_status = %result.safety_status,
                ingredients = result.ingredients.len(),
                "Analysis complete"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// A final timeout usually means the server is still waking from idle
    fn cold_start_hint(&self, err: ClientError, endpoint: AnalysisEndpoint) -> ClientError {
        match err {
            ClientError::Timeout(timeout) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Upload timed out, server may be cold starting"
                );
                ClientError::ColdStart {
                    endpoint: endpoint.path().to_string(),
                    timeout_secs: timeout.as_secs(),
                }
            }
            other => other,
        }
    }
}
