//! Chain-shape adapter
//!
//! Parses `{predictions: [...]}` bodies where each step carries a probability
//! and a cumulative offset from the anchor activity. The `/predict_chain`
//! endpoint names these fields `next_activity` and `time_to_next_minutes`.

use serde_json::Value;

use crate::error::CollarError;
use crate::types::ChainPrediction;

use super::{parse_root, prediction_list, require_label, PredictionAdapter, PredictionPayload};

/// Chain payload adapter
pub struct ChainAdapter;

impl PredictionAdapter for ChainAdapter {
    fn parse(&self, raw_json: &str) -> Result<PredictionPayload, CollarError> {
        let root = parse_root(raw_json)?;
        self.parse_value(&root)
    }
}

impl ChainAdapter {
    pub(crate) fn parse_value(&self, root: &Value) -> Result<PredictionPayload, CollarError> {
        let list = prediction_list(root, &["predictions"])?;

        let mut items = Vec::with_capacity(list.len());
        for (index, raw) in list.iter().enumerate() {
            let item: ChainPrediction = serde_json::from_value(raw.clone())
                .map_err(|e| CollarError::SchemaError(format!("item {}: {}", index, e)))?;
            validate_step(&item, index)?;
            items.push(item);
        }

        Ok(PredictionPayload::Chain(items))
    }
}

fn validate_step(step: &ChainPrediction, index: usize) -> Result<(), CollarError> {
    require_label(&step.activity, index)?;

    if !step.probability.is_finite() || !(0.0..=1.0).contains(&step.probability) {
        return Err(CollarError::SchemaError(format!(
            "item {} has probability {} outside [0, 1]",
            index, step.probability
        )));
    }

    if !step.minutes_from_start.is_finite() || step.minutes_from_start < 0.0 {
        return Err(CollarError::SchemaError(format!(
            "item {} has invalid minutes_from_start {}",
            index, step.minutes_from_start
        )));
    }

    Ok(())
}
