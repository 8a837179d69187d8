//! Token usage reported by the remote service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Token usage for a single generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Usage {
    /// Prompt tokens.
    pub input_tokens: u32,
    /// Completion tokens.
    pub output_tokens: u32,
    /// Total tokens as reported by the API.
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(input_tokens: u32, output_tokens: u32, total_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }

    /// Merge another usage into this one (accumulate).
    pub fn merge(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tokens: {} input, {} output, {} total",
            self.input_tokens, self.output_tokens, self.total_tokens
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_accumulates_all_counters() {
        let mut total = Usage::new(10, 20, 30);
        total.merge(&Usage::new(1, 2, 3));
        assert_eq!(total, Usage::new(11, 22, 33));
    }

    #[test]
    fn display_matches_caption_format() {
        assert_eq!(
            Usage::new(12, 34, 46).to_string(),
            "Tokens: 12 input, 34 output, 46 total"
        );
    }
}
