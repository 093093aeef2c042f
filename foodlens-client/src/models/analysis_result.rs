//! Canonical analysis result model
//!
//! Produced only by the normalizer; both photo analysis and barcode lookup end
//! up here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Overall food safety verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SafetyStatus {
    Safe,
    Caution,
    Danger,
}

impl SafetyStatus {
    /// Parse a wire literal; only the exact upper-case forms are accepted
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "SAFE" => Some(SafetyStatus::Safe),
            "CAUTION" => Some(SafetyStatus::Caution),
            "DANGER" => Some(SafetyStatus::Danger),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            SafetyStatus::Safe => "SAFE",
            SafetyStatus::Caution => "CAUTION",
            SafetyStatus::Danger => "DANGER",
        }
    }
}

impl fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Nutrition facts
///
/// Numeric fields are `None` when unknown, which is distinct from zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionInfo {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sodium: Option<f64>,
    pub sugar: Option<f64>,
    pub serving_size: Option<String>,
    pub data_source: Option<String>,
    pub description: Option<String>,
    pub fdc_id: Option<i64>,
}

/// Ingredient location in the photo, on the server's 0-1000 grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub y_min: f64,
    pub x_min: f64,
    pub y_max: f64,
    pub x_max: f64,
}

/// Single detected ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    pub name_en: Option<String>,
    pub name_ko: Option<String>,
    pub is_allergen: bool,
    /// Why the ingredient was flagged (barcode lookups only)
    pub risk_reason: Option<String>,
    pub confidence_score: Option<f64>,
    pub nutrition: Option<NutritionInfo>,
    pub bounding_box: Option<BoundingBox>,
}

impl Ingredient {
    /// Ingredient with only a name, not flagged as an allergen
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_en: None,
            name_ko: None,
            is_allergen: false,
            risk_reason: None,
            confidence_score: None,
            nutrition: None,
            bounding_box: None,
        }
    }
}

/// Card the traveler can show to restaurant staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationCard {
    pub language: String,
    pub text: Option<String>,
    /// Text to feed a text-to-speech engine
    pub audio_query: Option<String>,
}

/// Canonical, validated food-safety result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Never empty
    pub food_name: String,
    pub food_name_en: Option<String>,
    pub food_name_ko: Option<String>,
    pub safety_status: SafetyStatus,
    /// Clamped to 0..=100
    pub confidence: Option<f64>,
    pub ingredients: Vec<Ingredient>,
    pub nutrition: Option<NutritionInfo>,
    pub translation_card: Option<TranslationCard>,
    /// Always populated
    pub summary_text: String,
    pub used_model: Option<String>,
    /// Original server response
    pub raw_payload: Value,
    pub is_barcode: bool,
}

impl AnalysisResult {
    pub fn allergens(&self) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.iter().filter(|i| i.is_allergen)
    }
}
