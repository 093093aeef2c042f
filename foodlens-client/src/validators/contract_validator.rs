//! Boundary contract validation for analysis server responses
//!
//! Asserts the minimal shape each endpoint must return before anything else
//! looks at the payload. A violation is a hard fault for that call: it is
//! never retried and always names the endpoint and the offending field.
//! Everything beyond the minimal shape is left to the normalizer.

use crate::error::{ClientError, ClientResult};
use crate::models::SafetyStatus;
use serde_json::Value;

/// Path of the barcode lookup endpoint, used to tag contract errors
pub const BARCODE_LOOKUP_ENDPOINT: &str = "/lookup/barcode";

/// Analysis response that passed boundary validation
///
/// Holds the untouched payload; only the normalizer reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisApiContract {
    pub food_name: String,
    pub safety_status: SafetyStatus,
    /// Contents not checked at this layer
    pub ingredients: Vec<Value>,
    payload: Value,
}

impl AnalysisApiContract {
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }
}

/// Barcode lookup response that passed boundary validation
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeLookupContract {
    pub found: bool,
    /// Product data, unchecked until the normalizer maps it
    pub data: Option<Value>,
    pub error: Option<String>,
    pub message: Option<String>,
}

fn violation(endpoint: &str, field: &str) -> ClientError {
    ClientError::Contract {
        endpoint: endpoint.to_string(),
        detail: format!("missing/invalid \"{}\"", field),
    }
}

fn not_an_object(endpoint: &str) -> ClientError {
    ClientError::Contract {
        endpoint: endpoint.to_string(),
        detail: "response is not an object".to_string(),
    }
}

/// Validate an `/analyze*` response
///
/// Requires `foodName` (string), `safetyStatus` (one of the three literals)
/// and `ingredients` (array).
pub fn validate_analysis(payload: Value, endpoint: &str) -> ClientResult<AnalysisApiContract> {
    let object = payload.as_object().ok_or_else(|| not_an_object(endpoint))?;

    let food_name = object
        .get("foodName")
        .and_then(Value::as_str)
        .ok_or_else(|| violation(endpoint, "foodName"))?
        .to_string();

    let safety_status = object
        .get("safetyStatus")
        .and_then(Value::as_str)
        .and_then(SafetyStatus::from_wire)
        .ok_or_else(|| violation(endpoint, "safetyStatus"))?;

    let ingredients = object
        .get("ingredients")
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| violation(endpoint, "ingredients"))?;

    Ok(AnalysisApiContract {
        food_name,
        safety_status,
        ingredients,
        payload,
    })
}

/// Validate a `/lookup/barcode` response; only `found` is required
pub fn validate_barcode_lookup(payload: Value) -> ClientResult<BarcodeLookupContract> {
    let mut object = match payload {
        Value::Object(map) => map,
        _ => return Err(not_an_object(BARCODE_LOOKUP_ENDPOINT)),
    };

    let found = object
        .get("found")
        .and_then(Value::as_bool)
        .ok_or_else(|| violation(BARCODE_LOOKUP_ENDPOINT, "found"))?;

    let data = object.remove("data").filter(|v| !v.is_null());
    let error = object.get("error").and_then(Value::as_str).map(str::to_string);
    let message = object
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(BarcodeLookupContract {
        found,
        data,
        error,
        message,
    })
}
