//! Data models for foodlens-client

pub mod analysis_result;
pub mod locale;
pub mod lookup;
pub mod profile;

pub use analysis_result::{
    AnalysisResult, BoundingBox, Ingredient, NutritionInfo, SafetyStatus, TranslationCard,
};
pub use locale::Locale;
pub use lookup::BarcodeLookupOutcome;
pub use profile::{AllergyProfile, NO_ALLERGY_CONTEXT};
