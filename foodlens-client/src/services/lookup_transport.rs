//! Barcode lookup transport
//!
//! Every call gets its own request id, sent as `X-Request-Id` and recorded on
//! a span that wraps all log output of the call. The cache is consulted
//! before any network I/O.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{BarcodeLookupOutcome, Locale};
use crate::services::http_transport::{HttpTransport, MultipartRequest};
use crate::services::normalizer::map_barcode_to_analyzed_data;
use crate::services::profile_source::{resolve_allergy_context, ProfileSource};
use crate::services::result_cache::{CacheKey, ResultCache};
use crate::utils::{retry_with_backoff, RetryPolicy};
use crate::validators::{validate_barcode_lookup, BARCODE_LOOKUP_ENDPOINT};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Characters of the barcode that may appear in logs
const VISIBLE_BARCODE_CHARS: usize = 4;

/// Anything that can resolve a confirmed barcode
#[async_trait]
pub trait BarcodeLookup: Send + Sync {
    async fn lookup(&self, barcode: &str) -> ClientResult<BarcodeLookupOutcome>;
}

/// Barcode for logs: only the last four characters survive
pub fn mask_barcode(barcode: &str) -> String {
    let chars: Vec<char> = barcode.chars().collect();
    if chars.len() <= VISIBLE_BARCODE_CHARS {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - VISIBLE_BARCODE_CHARS..].iter().collect();
    format!("***{}", tail)
}

/// Cached, retried, traced barcode lookup
pub struct LookupTransport {
    http: Arc<dyn HttpTransport>,
    cache: Arc<dyn ResultCache>,
    profile: Arc<dyn ProfileSource>,
    server_url: String,
    locale_tag: String,
    policy: RetryPolicy,
}

impl LookupTransport {
    pub fn new(
        http: Arc<dyn HttpTransport>,
        cache: Arc<dyn ResultCache>,
        profile: Arc<dyn ProfileSource>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            http,
            cache,
            profile,
            server_url: config.server_url.clone(),
            locale_tag: config.locale_tag.clone(),
            policy: config.lookup.clone(),
        }
    }

    fn locale(&self) -> Locale {
        Locale::from_tag(&self.locale_tag)
    }

    /// Look up `barcode`, aborting at the next suspension point once `cancel` fires
    pub async fn lookup_cancellable(
        &self,
        barcode: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<BarcodeLookupOutcome> {
        let barcode = barcode.trim();
        if barcode.is_empty() {
            return Err(ClientError::InvalidInput("Barcode is empty".to_string()));
        }

        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "barcode_lookup",
            request_id = %request_id,
            barcode = %mask_barcode(barcode)
        );

        self.lookup_inner(barcode, request_id, cancel)
            .instrument(span)
            .await
    }

    async fn lookup_inner(
        &self,
        barcode: &str,
        request_id: String,
        cancel: &CancellationToken,
    ) -> ClientResult<BarcodeLookupOutcome> {
        let allergy_context = resolve_allergy_context(self.profile.as_ref()).await;
        let key = CacheKey::new(barcode, &allergy_context);

        if let Some(cached) = self.cache.get(&key).await {
            info!("Barcode cache hit");
            return Ok(cached);
        }

        let request = MultipartRequest::new(
            format!("{}{}", self.server_url, BARCODE_LOOKUP_ENDPOINT),
            request_id,
        )
        .text("barcode", barcode)
        .text("allergy_info", allergy_context)
        .text("locale", self.locale_tag.clone());

        let body = retry_with_backoff(
            "barcode lookup",
            &self.policy,
            cancel,
            ClientError::is_retryable,
            |_attempt| {
                let http = Arc::clone(&self.http);
                let request = request.clone();
                async move { http.post_multipart(request, None).await?.into_success_body() }
            },
        )
        .await?;

        let payload: Value =
            serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))?;
        let contract = validate_barcode_lookup(payload)?;

        match (contract.found, contract.data) {
            (true, Some(data)) => {
                let mut product = map_barcode_to_analyzed_data(data, self.locale());
                product.is_barcode = true;

                info!(food_name = %product.food_name, "Barcode product found");
                let outcome = BarcodeLookupOutcome::found(product);
                self.cache.set(&key, &outcome).await;
                Ok(outcome)
            }
            (found, _) => {
                info!(
                    found,
                    server_message = contract.message.as_deref().unwrap_or_default(),
                    "Barcode product not found"
                );
                Ok(BarcodeLookupOutcome {
                    found,
                    data: None,
                    error: contract.error,
                })
            }
        }
    }

    /// Lookup that never fails: errors become `{found: false, error}`
    pub async fn lookup_or_not_found(
        &self,
        barcode: &str,
        cancel: &CancellationToken,
    ) -> BarcodeLookupOutcome {
        match self.lookup_cancellable(barcode, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, barcode = %mask_barcode(barcode), "Barcode lookup failed");
                BarcodeLookupOutcome::failed(e.user_message(self.locale()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_barcode_keeps_last_four() {
        assert_eq!(mask_barcode("8801234567890"), "***7890");
        assert_eq!(mask_barcode("12345"), "***2345");
        assert_eq!(mask_barcode("1234"), "****");
        assert_eq!(mask_barcode(""), "");
    }
}
