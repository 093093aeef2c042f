//! User safety profile and the allergy context string derived from it

use serde::{Deserialize, Serialize};

/// Sent as `allergy_info` when the user has no allergens or restrictions
pub const NO_ALLERGY_CONTEXT: &str = "None";

/// Allergens and dietary restrictions of the current user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyProfile {
    pub allergies: Vec<String>,
    pub dietary_restrictions: Vec<String>,
}

impl AllergyProfile {
    pub fn new(allergies: Vec<String>, dietary_restrictions: Vec<String>) -> Self {
        Self {
            allergies,
            dietary_restrictions,
        }
    }

    /// Allergies followed by restrictions, comma-joined, or `"None"`
    pub fn context_string(&self) -> String {
        let items: Vec<&str> = self
            .allergies
            .iter()
            .chain(self.dietary_restrictions.iter())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        if items.is_empty() {
            NO_ALLERGY_CONTEXT.to_string()
        } else {
            items.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile_is_none() {
        assert_eq!(AllergyProfile::default().context_string(), "None");
        let blank = AllergyProfile::new(vec!["  ".into()], vec![]);
        assert_eq!(blank.context_string(), "None");
    }

    #[test]
    fn test_allergies_then_restrictions() {
        let profile = AllergyProfile::new(
            vec!["Peanut".into(), "Shellfish".into()],
            vec!["Vegan".into()],
        );
        assert_eq!(profile.context_string(), "Peanut, Shellfish, Vegan");
    }
}
