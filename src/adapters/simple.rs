//! Simple-shape adapter
//!
//! Parses `{predictionList: [{activity, average_start_time}]}` bodies. Older
//! service revisions used `predictions` as the list key, which is accepted too.

use serde_json::Value;

use crate::error::CollarError;
use crate::types::PredictedActivity;

use super::{parse_root, prediction_list, require_label, PredictionAdapter, PredictionPayload};

/// Time-of-day payload adapter
pub struct SimpleAdapter;

impl PredictionAdapter for SimpleAdapter {
    fn parse(&self, raw_json: &str) -> Result<PredictionPayload, CollarError> {
        let root = parse_root(raw_json)?;
        self.parse_value(&root)
    }
}

impl SimpleAdapter {
    pub(crate) fn parse_value(&self, root: &Value) -> Result<PredictionPayload, CollarError> {
        let list = prediction_list(root, &["predictionList", "predictions"])?;

        let mut items = Vec::with_capacity(list.len());
        for (index, raw) in list.iter().enumerate() {
            let item: PredictedActivity = serde_json::from_value(raw.clone())
                .map_err(|e| CollarError::SchemaError(format!("item {}: {}", index, e)))?;
            require_label(&item.activity, index)?;
            items.push(item);
        }

        Ok(PredictionPayload::Simple(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_payload() {
        let payload = SimpleAdapter
            .parse(
                r#"{"predictionList": [
                    {"activity": "Walking", "average_start_time": "14:30:00"},
                    {"activity": "Walking", "average_start_time": "18:00:00"}
                ]}"#,
            )
            .unwrap();

        match payload {
            PredictionPayload::Simple(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[1].average_start_time, "18:00:00");
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_missing_time_is_schema_error() {
        let err = SimpleAdapter
            .parse(r#"{"predictionList": [{"activity": "Walking"}]}"#)
            .unwrap_err();
        assert!(matches!(err, CollarError::SchemaError(_)));
    }

    #[test]
    fn test_empty_label_is_schema_error() {
        let err = SimpleAdapter
            .parse(r#"{"predictionList": [{"activity": "  ", "average_start_time": "10:00:00"}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("empty activity label"));
    }

    #[test]
    fn test_time_strings_are_not_validated_here() {
        // Parsing of HH:MM:SS happens at resolution time
        let payload = SimpleAdapter
            .parse(r#"{"predictionList": [{"activity": "Nap", "average_start_time": "25:99:00"}]}"#)
            .unwrap();
        assert_eq!(payload.len(), 1);
    }
}
