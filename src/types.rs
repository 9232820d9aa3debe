//! Core types for the PawSense prediction flow
//!
//! This module defines the data structures that flow through each stage:
//! wire-level predictions from the service, resolved countdown entries, and the
//! presentation-ready board.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Presentation mode for countdowns of an hour or more
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownStyle {
    /// `in 2h 5m`, used by the chain-prediction list
    #[default]
    Compact,
    /// `in 2 hours 5 minutes`, used by the plain-prediction list
    Verbose,
}

impl CountdownStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountdownStyle::Compact => "compact",
            CountdownStyle::Verbose => "verbose",
        }
    }

    /// Map a C-side style code (0 = compact, 1 = verbose)
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(CountdownStyle::Compact),
            1 => Some(CountdownStyle::Verbose),
            _ => None,
        }
    }
}

/// Simple-shape prediction: a label plus an average time of day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedActivity {
    /// Activity label (not unique across a list)
    pub activity: String,
    /// Average historical start time, `HH:MM:SS`
    pub average_start_time: String,
}

/// Chain-shape prediction: an absolute start time with a cumulative offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainPrediction {
    #[serde(alias = "next_activity")]
    pub activity: String,
    /// Absolute start time; derived from the anchor when the service omits it
    #[serde(default)]
    pub predicted_start_time: Option<DateTime<FixedOffset>>,
    /// Plausibility of this step (0-1)
    pub probability: f64,
    /// Cumulative minutes from the anchor activity
    #[serde(alias = "time_to_next_minutes")]
    pub minutes_from_start: f64,
}

/// A prediction resolved against a reference instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPrediction {
    pub label: String,
    pub resolved_time: DateTime<FixedOffset>,
    pub minutes_until: i64,
    pub display_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_from_start: Option<i64>,
}

/// Where a board's entries came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardSource {
    /// Decoded from a prediction service response
    Live,
    /// Synthesized locally after a failed or malformed fetch
    Fallback { reason: String },
}

impl BoardSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, BoardSource::Fallback { .. })
    }
}

/// Sorted, formatted predictions from one refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionBoard {
    pub id: Uuid,
    pub generated_at: DateTime<FixedOffset>,
    pub source: BoardSource,
    pub style: CountdownStyle,
    pub entries: Vec<ResolvedPrediction>,
}

/// Request body sent to the prediction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub current_activity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u8>,
}

impl PredictionRequest {
    pub fn new(current_activity: impl Into<String>) -> Self {
        Self {
            current_activity: current_activity.into(),
            last_activity_time: None,
            max_depth: None,
        }
    }

    pub fn with_last_activity_time(mut self, at: DateTime<Utc>) -> Self {
        self.last_activity_time = Some(at);
        self
    }

    pub fn with_max_depth(mut self, depth: u8) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chain_prediction_accepts_service_aliases() {
        let json = r#"{"next_activity": "Walk", "time_to_next_minutes": 42.5, "probability": 0.7}"#;
        let pred: ChainPrediction = serde_json::from_str(json).unwrap();

        assert_eq!(pred.activity, "Walk");
        assert_eq!(pred.minutes_from_start, 42.5);
        assert!(pred.predicted_start_time.is_none());
    }

    #[test]
    fn test_request_omits_unset_fields() {
        let body = serde_json::to_value(PredictionRequest::new("Feeding")).unwrap();
        assert_eq!(body, serde_json::json!({"current_activity": "Feeding"}));
    }

    #[test]
    fn test_board_source_tagging() {
        let source = BoardSource::Fallback {
            reason: "timeout".to_string(),
        };
        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(value["kind"], "fallback");
        assert_eq!(value["reason"], "timeout");
        assert!(source.is_fallback());
        assert!(!BoardSource::Live.is_fallback());
    }

    #[test]
    fn test_style_codes() {
        assert_eq!(CountdownStyle::from_code(0), Some(CountdownStyle::Compact));
        assert_eq!(CountdownStyle::from_code(1), Some(CountdownStyle::Verbose));
        assert_eq!(CountdownStyle::from_code(7), None);
    }
}
