//! Result normalizer
//!
//! Maps loosely-typed server JSON into [`AnalysisResult`]. Nothing in here
//! fails: every missing or wrong-typed field degrades to a default so one bad
//! field never throws away an otherwise usable response.

use crate::models::{
    AnalysisResult, BoundingBox, Ingredient, Locale, NutritionInfo, SafetyStatus,
    TranslationCard,
};
use crate::validators::AnalysisApiContract;
use serde_json::{Map, Value};

/// Placeholder name for photo analyses without a usable `foodName`
pub const DEFAULT_FOOD_NAME: &str = "Analyzed Food";

/// Placeholder name for barcode products without a usable `food_name`
pub const DEFAULT_PRODUCT_NAME: &str = "Unknown Product";

const DEFAULT_SERVING_SIZE: &str = "100g";
const DEFAULT_BARCODE_SOURCE: &str = "Barcode";
const UNKNOWN_INGREDIENT: &str = "Unknown";

/// Keys checked, in order, for a summary before the localized variants
const SUMMARY_KEYS: [&str; 4] = ["raw_result", "coachMessage", "coach_message", "summary"];

/// Keys the server has used for the translation card
const TRANSLATION_CARD_KEYS: [&str; 3] = ["translationCard", "translation_card", "ai_translation"];

fn analysis_default_summary(locale: Locale) -> &'static str {
    match locale {
        Locale::English => "Analysis complete. Review the ingredients below before eating.",
        Locale::Korean => "분석이 완료되었습니다. 섭취 전 아래 성분을 확인해주세요.",
    }
}

fn barcode_default_summary(locale: Locale) -> &'static str {
    match locale {
        Locale::English => "No registered allergens were detected. Enjoy your food.",
        Locale::Korean => "등록된 알러지 성분이 감지되지 않았습니다. 안심하고 드세요.",
    }
}

/// Clamp a confidence value to 0..=100; non-numbers become `None`
pub fn clamp_confidence(value: &Value) -> Option<f64> {
    value.as_f64().map(|c| c.clamp(0.0, 100.0))
}

fn text(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(object, key))
}

fn number(object: &Map<String, Value>, key: &str) -> Option<f64> {
    object.get(key).and_then(Value::as_f64)
}

/// Parse nutrition facts from an object; every numeric field independently
/// `None` when absent or non-numeric
pub fn parse_nutrition(object: &Map<String, Value>) -> NutritionInfo {
    NutritionInfo {
        calories: number(object, "calories"),
        protein: number(object, "protein"),
        carbs: number(object, "carbs"),
        fat: number(object, "fat"),
        fiber: number(object, "fiber"),
        sodium: number(object, "sodium"),
        sugar: number(object, "sugar"),
        serving_size: text(object, "servingSize"),
        data_source: text(object, "dataSource"),
        description: text(object, "description"),
        fdc_id: object.get("fdcId").and_then(Value::as_i64),
    }
}

fn nested_nutrition(object: &Map<String, Value>) -> Option<NutritionInfo> {
    object
        .get("nutrition")
        .and_then(Value::as_object)
        .map(parse_nutrition)
}

fn parse_bounding_box(object: &Map<String, Value>) -> Option<BoundingBox> {
    ["box_2d", "bbox"].iter().find_map(|key| {
        let values = object.get(*key)?.as_array()?;
        if values.len() != 4 {
            return None;
        }
        let coords: Option<Vec<f64>> = values.iter().map(Value::as_f64).collect();
        let coords = coords?;
        Some(BoundingBox {
            y_min: coords[0],
            x_min: coords[1],
            y_max: coords[2],
            x_max: coords[3],
        })
    })
}

/// Normalize one ingredient entry; plain strings are wrapped, objects keep
/// `isAllergen` and `riskReason`, anything else is dropped
fn parse_ingredient(value: &Value) -> Option<Ingredient> {
    match value {
        Value::String(name) => {
            let name = name.trim();
            if name.is_empty() {
                None
            } else {
                Some(Ingredient::named(name))
            }
        }
        Value::Object(object) => Some(Ingredient {
            name: first_text(object, &["name", "name_en", "name_ko"])
                .unwrap_or_else(|| UNKNOWN_INGREDIENT.to_string()),
            name_en: text(object, "name_en"),
            name_ko: text(object, "name_ko"),
            is_allergen: object
                .get("isAllergen")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            risk_reason: text(object, "riskReason"),
            confidence_score: number(object, "confidence_score"),
            nutrition: nested_nutrition(object),
            bounding_box: parse_bounding_box(object),
        }),
        _ => None,
    }
}

fn parse_ingredients(object: &Map<String, Value>) -> Vec<Ingredient> {
    object
        .get("ingredients")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_ingredient).collect())
        .unwrap_or_default()
}

/// Read the translation card from any of the keys the server has used
pub fn parse_translation_card(object: &Map<String, Value>) -> Option<TranslationCard> {
    let card = TRANSLATION_CARD_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_object))?;

    let language = first_text(card, &["language", "locale"]);
    let text = first_text(card, &["text", "message"]);
    if language.is_none() && text.is_none() {
        return None;
    }

    Some(TranslationCard {
        language: language.unwrap_or_else(|| "und".to_string()),
        text,
        audio_query: first_text(card, &["audio_query", "audioQuery"]),
    })
}

/// First non-blank summary candidate, then the translation card text, then
/// the locale default
fn resolve_summary(
    object: &Map<String, Value>,
    card: Option<&TranslationCard>,
    locale: Locale,
    default: &str,
) -> String {
    let localized = [
        format!("raw_result_{}", locale.field_suffix()),
        format!("raw_result_{}", locale.other().field_suffix()),
    ];

    first_text(object, &SUMMARY_KEYS)
        .or_else(|| localized.iter().find_map(|key| text(object, key)))
        .or_else(|| card.and_then(|c| c.text.clone()))
        .unwrap_or_else(|| default.to_string())
}

/// Map a photo-analysis payload
///
/// Safety defaults to `CAUTION`: an AI verdict that went missing is treated
/// as uncertain.
pub fn map_analyzed_data(payload: Value, locale: Locale) -> AnalysisResult {
    let empty = Map::new();
    let object = payload.as_object().unwrap_or(&empty);

    let translation_card = parse_translation_card(object);
    let summary_text = resolve_summary(
        object,
        translation_card.as_ref(),
        locale,
        analysis_default_summary(locale),
    );

    let result = AnalysisResult {
        food_name: text(object, "foodName").unwrap_or_else(|| DEFAULT_FOOD_NAME.to_string()),
        food_name_en: text(object, "foodName_en"),
        food_name_ko: text(object, "foodName_ko"),
        safety_status: object
            .get("safetyStatus")
            .and_then(Value::as_str)
            .and_then(SafetyStatus::from_wire)
            .unwrap_or(SafetyStatus::Caution),
        confidence: object.get("confidence").and_then(clamp_confidence),
        ingredients: parse_ingredients(object),
        nutrition: nested_nutrition(object),
        translation_card,
        summary_text,
        used_model: text(object, "used_model"),
        raw_payload: Value::Null,
        is_barcode: false,
    };

    AnalysisResult {
        raw_payload: payload,
        ..result
    }
}

/// Map a validated analysis contract into the canonical result
pub fn normalize_analysis(contract: AnalysisApiContract, locale: Locale) -> AnalysisResult {
    map_analyzed_data(contract.into_payload(), locale)
}

/// Map the `data` object of a barcode lookup
///
/// Safety defaults to `SAFE`: the product identity is deterministic and only
/// an explicit allergen match from the server escalates the risk.
pub fn map_barcode_to_analyzed_data(payload: Value, locale: Locale) -> AnalysisResult {
    let empty = Map::new();
    let object = payload.as_object().unwrap_or(&empty);

    let product_name = first_text(object, &["food_name", "foodName"]);

    let nutrition = NutritionInfo {
        serving_size: Some(
            text(object, "servingSize").unwrap_or_else(|| DEFAULT_SERVING_SIZE.to_string()),
        ),
        data_source: Some(
            text(object, "source").unwrap_or_else(|| DEFAULT_BARCODE_SOURCE.to_string()),
        ),
        description: product_name.clone(),
        fdc_id: None,
        ..parse_nutrition(object)
    };

    let translation_card = parse_translation_card(object);
    let summary_text = resolve_summary(
        object,
        translation_card.as_ref(),
        locale,
        barcode_default_summary(locale),
    );

    let result = AnalysisResult {
        food_name: product_name.unwrap_or_else(|| DEFAULT_PRODUCT_NAME.to_string()),
        food_name_en: first_text(object, &["food_name_en", "foodName_en"]),
        food_name_ko: first_text(object, &["food_name_ko", "foodName_ko"]),
        safety_status: object
            .get("safetyStatus")
            .and_then(Value::as_str)
            .and_then(SafetyStatus::from_wire)
            .unwrap_or(SafetyStatus::Safe),
        confidence: Some(100.0),
        ingredients: parse_ingredients(object),
        nutrition: Some(nutrition),
        translation_card,
        summary_text,
        used_model: None,
        raw_payload: Value::Null,
        is_barcode: false,
    };

    AnalysisResult {
        raw_payload: payload,
        ..result
    }
}
