//! Two-way bark translator
//!
//! Owner messages get one of a few canned dog responses. The recent-bark list
//! starts with a handful of sample translations.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::error::CollarError;

pub const RESPONSES: [&str; 4] = [
    "Woof woof! (Time for a walk!)",
    "Bark bark woof! (I love you too!)",
    "Woof woof bark! (Let's play fetch!)",
    "Gentle woof (I understand, good human)",
];

pub const QUICK_COMMANDS: [&str; 4] = ["Sit", "Stay", "Come", "Good Boy"];

/// A translated bark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarkTranslation {
    pub time: String,
    pub translation: String,
    /// 0-100
    pub confidence: u8,
}

#[derive(Debug, Clone)]
pub struct Translator {
    rng: Mcg128Xsl64,
    last_response: Option<String>,
    recent_barks: Vec<BarkTranslation>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Translator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self {
            rng,
            last_response: None,
            recent_barks: sample_barks(),
        }
    }

    /// Answer an owner message. Blank messages are rejected.
    pub fn translate(&mut self, message: &str) -> Result<&str, CollarError> {
        if message.trim().is_empty() {
            return Err(CollarError::EmptyMessage);
        }
        let response = RESPONSES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(RESPONSES[0]);
        Ok(self.last_response.insert(response.to_string()).as_str())
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn recent_barks(&self) -> &[BarkTranslation] {
        &self.recent_barks
    }
}

fn sample_barks() -> Vec<BarkTranslation> {
    [
        ("2 min ago", "I want to go outside!", 92),
        ("5 min ago", "Someone is at the door", 88),
        ("12 min ago", "I am happy to see you!", 95),
    ]
    .into_iter()
    .map(|(time, translation, confidence)| BarkTranslation {
        time: time.to_string(),
        translation: translation.to_string(),
        confidence,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_message_rejected() {
        let mut translator = Translator::new(Some(1));
        assert!(matches!(
            translator.translate("   "),
            Err(CollarError::EmptyMessage)
        ));
        assert!(translator.last_response().is_none());
    }

    #[test]
    fn test_translate_records_response() {
        let mut translator = Translator::new(Some(1));
        let response = translator.translate("Sit").unwrap().to_string();

        assert!(RESPONSES.contains(&response.as_str()));
        assert_eq!(translator.last_response(), Some(response.as_str()));
    }

    #[test]
    fn test_recent_barks_seeded() {
        let translator = Translator::default();
        assert_eq!(translator.recent_barks().len(), 3);
        assert_eq!(translator.recent_barks()[0].confidence, 92);
    }
}
