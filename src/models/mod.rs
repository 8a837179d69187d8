//! Selectable Gemini models.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::ChatError;

/// Gemini models offered by the chat front-ends.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
)]
pub enum GeminiModel {
    #[default]
    #[strum(serialize = "gemini-2.0-flash")]
    #[serde(rename = "gemini-2.0-flash")]
    Gemini20Flash,
    #[strum(serialize = "gemini-1.5-flash")]
    #[serde(rename = "gemini-1.5-flash")]
    Gemini15Flash,
}

impl GeminiModel {
    /// Get the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini20Flash => "gemini-2.0-flash",
            Self::Gemini15Flash => "gemini-1.5-flash",
        }
    }

    /// All models in display order.
    pub fn all() -> Vec<GeminiModel> {
        Self::iter().collect()
    }

    /// Parse a model id, mapping unknown ids to [`ChatError::ModelNotFound`].
    pub fn parse(id: &str) -> Result<Self, ChatError> {
        Self::from_str(id.trim()).map_err(|_| {
            let known: Vec<&str> = Self::iter().map(|m| m.as_str()).collect();
            ChatError::ModelNotFound(format!("'{id}' (expected one of: {})", known.join(", ")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_gemini_2_flash() {
        assert_eq!(GeminiModel::default(), GeminiModel::Gemini20Flash);
    }

    #[test]
    fn display_matches_api_id() {
        for model in GeminiModel::all() {
            assert_eq!(model.to_string(), model.as_str());
        }
    }

    #[test]
    fn parse_known_and_unknown() {
        assert_eq!(
            GeminiModel::parse("gemini-1.5-flash").unwrap(),
            GeminiModel::Gemini15Flash
        );
        let err = GeminiModel::parse("gpt-4o").unwrap_err();
        assert!(matches!(err, ChatError::ModelNotFound(msg) if msg.contains("gemini-2.0-flash")));
    }

    #[test]
    fn serde_uses_api_id() {
        let json = serde_json::to_string(&GeminiModel::Gemini15Flash).unwrap();
        assert_eq!(json, "\"gemini-1.5-flash\"");
    }
}
