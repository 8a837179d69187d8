//! Generation settings and related enums.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default sampling temperature for chat turns.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Settings controlling text generation.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct GenerationSettings {
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: Option<f64>,
    /// Nucleus sampling.
    pub top_p: Option<f64>,
    /// Top-k sampling.
    pub top_k: Option<u32>,
    /// Stop sequences.
    pub stop_sequences: Option<Vec<String>>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_tokens: None,
            temperature: Some(DEFAULT_TEMPERATURE),
            top_p: None,
            top_k: None,
            stop_sequences: None,
        }
    }
}

/// Why generation finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    /// Any other reason the model reports (`OTHER`, `LANGUAGE`, `SPII`, ...).
    Other,
}

impl FinishReason {
    /// Map a Gemini `finishReason` string.
    pub fn from_gemini(reason: &str) -> Option<Self> {
        match reason {
            "STOP" => Some(Self::Stop),
            "MAX_TOKENS" => Some(Self::Length),
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => {
                Some(Self::ContentFilter)
            }
            "FINISH_REASON_UNSPECIFIED" => None,
            _ => Some(Self::Other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_use_chat_temperature() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.temperature, Some(DEFAULT_TEMPERATURE));
        assert!(settings.max_tokens.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let settings = GenerationSettings::builder()
            .temperature(0.2)
            .max_tokens(256)
            .build();
        assert_eq!(settings.temperature, Some(0.2));
        assert_eq!(settings.max_tokens, Some(256));
        assert!(settings.top_p.is_none());
    }

    #[test]
    fn gemini_finish_reasons() {
        assert_eq!(FinishReason::from_gemini("STOP"), Some(FinishReason::Stop));
        assert_eq!(FinishReason::from_gemini("MAX_TOKENS"), Some(FinishReason::Length));
        assert_eq!(FinishReason::from_gemini("SAFETY"), Some(FinishReason::ContentFilter));
        assert_eq!(FinishReason::from_gemini("FINISH_REASON_UNSPECIFIED"), None);
        assert_eq!(FinishReason::from_gemini("OTHER"), Some(FinishReason::Other));
        assert_eq!(FinishReason::from_gemini("LANGUAGE"), Some(FinishReason::Other));
    }
}
