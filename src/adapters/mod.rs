//! Prediction response adapters
//!
//! The prediction service has answered in two shapes over its lifetime. This
//! module parses either one into a single tagged [`PredictionPayload`], decided
//! once at the fetch boundary:
//! - Simple: `{activity, average_start_time}` items, resolved by time of day
//! - Chain: `{activity, predicted_start_time, probability, minutes_from_start}`
//!   items, resolved from their absolute start

mod chain;
mod simple;

pub use chain::ChainAdapter;
pub use simple::SimpleAdapter;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::CollarError;
use crate::resolver::{resolve, resolve_chain};
use crate::types::{ChainPrediction, PredictedActivity, ResolvedPrediction};

/// Trait for response-shape adapters
pub trait PredictionAdapter {
    /// Parse a raw response body into a payload
    fn parse(&self, raw_json: &str) -> Result<PredictionPayload, CollarError>;
}

/// Decoded service response
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionPayload {
    Simple(Vec<PredictedActivity>),
    Chain(Vec<ChainPrediction>),
}

impl PredictionPayload {
    pub fn len(&self) -> usize {
        match self {
            PredictionPayload::Simple(items) => items.len(),
            PredictionPayload::Chain(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PredictionPayload::Simple(_) => "simple",
            PredictionPayload::Chain(_) => "chain",
        }
    }

    /// Resolve every item against `now`, in input order.
    ///
    /// Fails on the first simple item whose time of day does not parse, or the
    /// first chain step whose offset overflows the calendar.
    pub fn resolve_all<Tz: TimeZone>(
        &self,
        anchor: &DateTime<Utc>,
        now: &DateTime<Tz>,
    ) -> Result<Vec<ResolvedPrediction>, CollarError> {
        match self {
            PredictionPayload::Simple(items) => items.iter().map(|p| resolve(p, now)).collect(),
            PredictionPayload::Chain(items) => {
                items.iter().map(|p| resolve_chain(p, anchor, now)).collect()
            }
        }
    }
}

/// Detect the response shape and parse it
pub fn decode_payload(raw_json: &str) -> Result<PredictionPayload, CollarError> {
    let root = parse_root(raw_json)?;

    if root.get("predictionList").is_some() {
        return SimpleAdapter.parse_value(&root);
    }

    let list = prediction_list(&root, &["predictions"])?;
    let simple_shape = list
        .first()
        .map(|item| item.get("average_start_time").is_some())
        .unwrap_or(false);

    if simple_shape {
        SimpleAdapter.parse_value(&root)
    } else {
        ChainAdapter.parse_value(&root)
    }
}

/// Parse the body and surface service-reported errors
pub(crate) fn parse_root(raw_json: &str) -> Result<Value, CollarError> {
    let root: Value = serde_json::from_str(raw_json)
        .map_err(|e| CollarError::SchemaError(format!("invalid JSON: {}", e)))?;

    if !root.is_object() {
        return Err(CollarError::SchemaError(
            "response is not a JSON object".to_string(),
        ));
    }

    if let Some(err) = root.get("error") {
        let msg = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
        return Err(CollarError::SchemaError(format!("service error: {}", msg)));
    }

    Ok(root)
}

/// Find the first present list under `keys`; it must be an array
pub(crate) fn prediction_list<'a>(
    root: &'a Value,
    keys: &[&str],
) -> Result<&'a Vec<Value>, CollarError> {
    let (key, value) = keys
        .iter()
        .find_map(|key| root.get(*key).map(|v| (*key, v)))
        .ok_or_else(|| {
            CollarError::SchemaError(format!("missing prediction list ({})", keys.join(" or ")))
        })?;

    value
        .as_array()
        .ok_or_else(|| CollarError::SchemaError(format!("`{}` is not an array", key)))
}

pub(crate) fn require_label(label: &str, index: usize) -> Result<(), CollarError> {
    if label.trim().is_empty() {
        return Err(CollarError::SchemaError(format!(
            "item {} has an empty activity label",
            index
        )));
    }
    Ok(())
}
