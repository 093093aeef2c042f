//! Source of the current user's allergy profile

use crate::error::ClientResult;
use crate::models::{AllergyProfile, NO_ALLERGY_CONTEXT};
use async_trait::async_trait;

/// Loads the user profile that shapes every analysis request
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// `Ok(None)` when the user never created a profile
    async fn load_profile(&self) -> ClientResult<Option<AllergyProfile>>;
}

/// Fixed profile, supplied on the command line or by tests
#[derive(Debug, Clone, Default)]
pub struct StaticProfileSource {
    profile: Option<AllergyProfile>,
}

impl StaticProfileSource {
    pub fn new(profile: AllergyProfile) -> Self {
        Self {
            profile: Some(profile),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileSource for StaticProfileSource {
    async fn load_profile(&self) -> ClientResult<Option<AllergyProfile>> {
        Ok(self.profile.clone())
    }
}

/// Allergy context string for the current profile
///
/// A profile that cannot be loaded degrades to `"None"` rather than blocking
/// the analysis.
pub async fn resolve_allergy_context(source: &dyn ProfileSource) -> String {
    match source.load_profile().await {
        Ok(Some(profile)) => profile.context_string(),
        Ok(None) => NO_ALLERGY_CONTEXT.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load allergy profile, continuing without it");
            NO_ALLERGY_CONTEXT.to_string()
        }
    }
}
