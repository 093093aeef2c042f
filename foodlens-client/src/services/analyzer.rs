//! FoodAnalyzer: entry point tying configuration, profile and transports together

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::models::{AnalysisResult, BarcodeLookupOutcome};
use crate::scan::{RegionOfInterest, ScanConfirmationGate, ScanSession};
use crate::services::http_transport::{HttpTransport, ProgressCallback, ReqwestTransport};
use crate::services::lookup_transport::{BarcodeLookup, LookupTransport};
use crate::services::profile_source::{resolve_allergy_context, ProfileSource};
use crate::services::result_cache::{InMemoryResultCache, ResultCache};
use crate::services::upload_transport::{
    AnalysisEndpoint, ImageUpload, UploadFields, UploadTransport,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Country code sent when the caller does not know where the user is
pub const DEFAULT_COUNTRY_CODE: &str = "US";

/// Cancellation shared by the calls currently running on one analyzer
///
/// Each call captures the current token when it starts. Cancelling fires that
/// token and installs a fresh one, so calls started afterwards run normally.
#[derive(Clone, Default)]
struct InFlightCalls {
    current: Arc<Mutex<CancellationToken>>,
}

impl InFlightCalls {
    fn token(&self) -> CancellationToken {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn cancel(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = CancellationToken::new();
    }
}

/// Lookup handed to scan sessions, cancelled together with the analyzer's calls
struct SessionLookup {
    transport: Arc<LookupTransport>,
    in_flight: InFlightCalls,
}

#[async_trait]
impl BarcodeLookup for SessionLookup {
    async fn lookup(&self, barcode: &str) -> ClientResult<BarcodeLookupOutcome> {
        let cancel = self.in_flight.token();
        self.transport.lookup_cancellable(barcode, &cancel).await
    }
}

/// High-level client for photo analysis and barcode lookup
pub struct FoodAnalyzer {
    config: ClientConfig,
    profile: Arc<dyn ProfileSource>,
    upload: UploadTransport,
    lookup: Arc<LookupTransport>,
    in_flight: InFlightCalls,
}

impl FoodAnalyzer {
    /// Build with the reqwest transport and an in-memory result cache
    pub fn new(config: ClientConfig, profile: Arc<dyn ProfileSource>) -> ClientResult<Self> {
        let http: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
        let cache: Arc<dyn ResultCache> = Arc::new(InMemoryResultCache::new());
        Ok(Self::with_parts(config, profile, http, cache))
    }

    pub fn with_parts(
        config: ClientConfig,
        profile: Arc<dyn ProfileSource>,
        http: Arc<dyn HttpTransport>,
        cache: Arc<dyn ResultCache>,
    ) -> Self {
        let upload = UploadTransport::new(Arc::clone(&http), &config);
        let lookup = Arc::new(LookupTransport::new(http, cache, Arc::clone(&profile), &config));

        Self {
            config,
            profile,
            upload,
            lookup,
            in_flight: InFlightCalls::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Abort every call running right now, scan session lookups included
    ///
    /// Calls started after this returns are unaffected.
    pub fn cancel_in_flight(&self) {
        info!("Cancelling in-flight requests");
        self.in_flight.cancel();
    }

    /// Analyze a dish photo
    pub async fn analyze_image(
        &self,
        image: &ImageUpload,
        iso_country_code: &str,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<AnalysisResult> {
        self.analyze(AnalysisEndpoint::Analyze, image, iso_country_code, on_progress)
            .await
    }

    /// Analyze an ingredient label photo
    pub async fn analyze_label(
        &self,
        image: &ImageUpload,
        iso_country_code: &str,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<AnalysisResult> {
        self.analyze(AnalysisEndpoint::Label, image, iso_country_code, on_progress)
            .await
    }

    /// Let the server decide whether the photo is a dish or a label
    pub async fn analyze_smart(
        &self,
        image: &ImageUpload,
        iso_country_code: &str,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<AnalysisResult> {
        self.analyze(AnalysisEndpoint::Smart, image, iso_country_code, on_progress)
            .await
    }

    pub async fn analyze(
        &self,
        endpoint: AnalysisEndpoint,
        image: &ImageUpload,
        iso_country_code: &str,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<AnalysisResult> {
        let cancel = self.in_flight.token();
        let country = iso_country_code.trim();
        let fields = UploadFields {
            allergy_info: resolve_allergy_context(self.profile.as_ref()).await,
            iso_country_code: if country.is_empty() {
                DEFAULT_COUNTRY_CODE.to_string()
            } else {
                country.to_ascii_uppercase()
            },
            locale: self.config.locale_tag.clone(),
        };

        self.upload
            .upload_cancellable(endpoint, image, &fields, on_progress, &cancel)
            .await
    }

    pub async fn lookup_barcode(&self, barcode: &str) -> ClientResult<BarcodeLookupOutcome> {
        let cancel = self.in_flight.token();
        self.lookup.lookup_cancellable(barcode, &cancel).await
    }

    /// Lookup with failures folded into a not-found outcome
    pub async fn lookup_barcode_or_not_found(&self, barcode: &str) -> BarcodeLookupOutcome {
        let cancel = self.in_flight.token();
        self.lookup.lookup_or_not_found(barcode, &cancel).await
    }

    /// Scan session for a camera preview of the given size
    pub fn scan_session(
        &self,
        viewport_width: f64,
        viewport_height: f64,
    ) -> ScanSession<dyn BarcodeLookup> {
        let roi = RegionOfInterest::centered(viewport_width, viewport_height, self.config.roi_side);
        let gate = ScanConfirmationGate::new(roi, self.config.required_matches)
            .with_locale(self.config.locale());
        let lookup: Arc<dyn BarcodeLookup> = Arc::new(SessionLookup {
            transport: Arc::clone(&self.lookup),
            in_flight: self.in_flight.clone(),
        });
        ScanSession::new(gate, lookup)
    }
}
