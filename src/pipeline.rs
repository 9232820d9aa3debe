//! Pipeline orchestration
//!
//! This module provides the public API for turning prediction service
//! responses into presentation-ready boards.
//!
//! Pipeline stages:
//! 1. PredictionClient - Fetch the raw response
//! 2. decode_payload - Detect the response shape (simple or chain)
//! 3. resolve / resolve_chain - Place every prediction relative to now
//! 4. sort_by_urgency - Nearest first, stable
//! 5. format_countdown - Render in the selected style
//!
//! Any Parse, Network or Schema error in stages 1-3 is replaced by a locally
//! generated placeholder chain, so a refresh always yields a board.

use chrono::{DateTime, Offset, TimeZone, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::adapters::{decode_payload, PredictionPayload};
use crate::client::PredictionClient;
use crate::config::PawsenseConfig;
use crate::error::CollarError;
use crate::fallback::{FallbackGenerator, MAX_FALLBACK_STEPS};
use crate::types::{
    BoardSource, CountdownStyle, PredictionBoard, PredictionRequest, ResolvedPrediction,
};
use crate::urgency::sort_by_urgency;

/// Resolve a raw service response into sorted, formatted predictions.
///
/// This is the strict path: errors are returned rather than replaced.
///
/// # Example
/// ```ignore
/// let entries = resolve_predictions(
///     r#"{"predictionList": [{"activity": "Walking", "average_start_time": "14:30:00"}]}"#,
///     &chrono::Local::now(),
///     CountdownStyle::Compact,
/// )?;
/// ```
pub fn resolve_predictions<Tz: TimeZone>(
    raw_json: &str,
    now: &DateTime<Tz>,
    style: CountdownStyle,
) -> Result<Vec<ResolvedPrediction>, CollarError> {
    let payload = decode_payload(raw_json)?;
    let anchor = now.with_timezone(&Utc);
    resolve_payload(&payload, &anchor, now, style)
}

/// Resolve an already decoded payload, then sort and restyle it
pub fn resolve_payload<Tz: TimeZone>(
    payload: &PredictionPayload,
    anchor: &DateTime<Utc>,
    now: &DateTime<Tz>,
    style: CountdownStyle,
) -> Result<Vec<ResolvedPrediction>, CollarError> {
    let resolved = payload.resolve_all(anchor, now)?;
    let mut sorted = sort_by_urgency(&resolved).to_vec();
    for entry in &mut sorted {
        entry.restyle(style);
    }
    Ok(sorted)
}

/// Stateful pipeline owning the HTTP client and the placeholder generator.
pub struct PredictionPipeline {
    client: Option<PredictionClient>,
    fallback: FallbackGenerator,
    style: CountdownStyle,
}

impl PredictionPipeline {
    /// Create a pipeline from configuration
    pub fn new(config: &PawsenseConfig) -> Result<Self, CollarError> {
        Ok(Self {
            client: Some(PredictionClient::new(&config.service)?),
            fallback: FallbackGenerator::new(config.simulation.seed),
            style: config.prediction.style,
        })
    }

    /// Create a pipeline without a service; every refresh uses the placeholder chain
    pub fn offline(seed: Option<u64>, style: CountdownStyle) -> Self {
        Self {
            client: None,
            fallback: FallbackGenerator::new(seed),
            style,
        }
    }

    /// Create a pipeline from explicit parts
    pub fn with_parts(
        client: PredictionClient,
        fallback: FallbackGenerator,
        style: CountdownStyle,
    ) -> Self {
        Self {
            client: Some(client),
            fallback,
            style,
        }
    }

    pub fn style(&self) -> CountdownStyle {
        self.style
    }

    pub fn set_style(&mut self, style: CountdownStyle) {
        self.style = style;
    }

    /// Fetch, resolve and sort predictions. Never fails.
    ///
    /// A request without `last_activity_time` is sent with `now`, the same
    /// anchor the chain offsets are counted from.
    pub async fn refresh<Tz: TimeZone>(
        &mut self,
        request: &PredictionRequest,
        now: &DateTime<Tz>,
    ) -> PredictionBoard {
        let request = request
            .clone()
            .with_last_activity_time(anchor_for(request, now));

        let fetched = match &self.client {
            Some(client) => client.fetch(&request).await,
            None => Err(CollarError::NetworkError(
                "no prediction service configured".to_string(),
            )),
        };

        match fetched {
            Ok(body) => self.board_from_body(&body, &request, now),
            Err(e) => self.fallback_board(&request, now, &e),
        }
    }

    /// Build a board from a response body fetched elsewhere. Never fails.
    pub fn board_from_body<Tz: TimeZone>(
        &mut self,
        body: &str,
        request: &PredictionRequest,
        now: &DateTime<Tz>,
    ) -> PredictionBoard {
        let anchor = anchor_for(request, now);
        let result = decode_payload(body)
            .and_then(|payload| resolve_payload(&payload, &anchor, now, self.style));

        match result {
            Ok(entries) => {
                debug!(count = entries.len(), "resolved live predictions");
                make_board(BoardSource::Live, self.style, now, entries)
            }
            Err(e) => self.fallback_board(request, now, &e),
        }
    }

    /// Board built from a placeholder chain
    pub fn fallback_board<Tz: TimeZone>(
        &mut self,
        request: &PredictionRequest,
        now: &DateTime<Tz>,
        cause: &CollarError,
    ) -> PredictionBoard {
        warn!(error = %cause, "prediction fetch failed, using placeholder chain");

        let anchor = anchor_for(request, now);
        let depth = request.max_depth.unwrap_or(MAX_FALLBACK_STEPS);
        let chain = self
            .fallback
            .generate(&request.current_activity, anchor, depth);

        // Placeholder steps are valid by construction, so resolution cannot fail
        let entries = resolve_payload(&PredictionPayload::Chain(chain), &anchor, now, self.style)
            .unwrap_or_default();

        make_board(
            BoardSource::Fallback {
                reason: cause.to_string(),
            },
            self.style,
            now,
            entries,
        )
    }
}

fn anchor_for<Tz: TimeZone>(request: &PredictionRequest, now: &DateTime<Tz>) -> DateTime<Utc> {
    request
        .last_activity_time
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

fn make_board<Tz: TimeZone>(
    source: BoardSource,
    style: CountdownStyle,
    now: &DateTime<Tz>,
    entries: Vec<ResolvedPrediction>,
) -> PredictionBoard {
    PredictionBoard {
        id: Uuid::new_v4(),
        generated_at: now.with_timezone(&now.offset().fix()),
        source,
        style,
        entries,
    }
}
