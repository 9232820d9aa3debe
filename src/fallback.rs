//! Placeholder prediction chains
//!
//! When the prediction service fails or answers with something unusable, the
//! app still shows a plausible chain of upcoming activities. Steps are drawn
//! from a fixed vocabulary with bounded random durations, accumulated from the
//! last known activity time.

use chrono::{DateTime, Duration, Utc};
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

use crate::types::ChainPrediction;

/// Activities the placeholder chain draws from
pub const FALLBACK_ACTIVITIES: [&str; 9] = [
    "Sleep",
    "Breakfast",
    "Potty",
    "Walk",
    "Play",
    "Relax",
    "Lunch",
    "Dinner",
    "Medicine",
];

/// Longest chain ever synthesized
pub const MAX_FALLBACK_STEPS: u8 = 6;

const MIN_STEP_MINUTES: i64 = 15;
const MAX_STEP_MINUTES: i64 = 120;
const MIN_PROBABILITY: f64 = 0.4;

/// Seedable generator for placeholder chains
#[derive(Debug, Clone)]
pub struct FallbackGenerator {
    rng: Mcg128Xsl64,
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl FallbackGenerator {
    /// Create a generator; `None` seeds from OS entropy
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self { rng }
    }

    /// Synthesize a chain of `max_depth` steps (clamped to 1..=6) after `current_activity`.
    ///
    /// Never fails and never returns an empty chain.
    pub fn generate(
        &mut self,
        current_activity: &str,
        anchor: DateTime<Utc>,
        max_depth: u8,
    ) -> Vec<ChainPrediction> {
        let steps = max_depth.clamp(1, MAX_FALLBACK_STEPS) as usize;
        let mut chain = Vec::with_capacity(steps);
        let mut previous = current_activity.to_string();
        let mut offset_minutes = 0i64;

        for _ in 0..steps {
            let activity = self.next_activity(&previous);
            offset_minutes += self.rng.gen_range(MIN_STEP_MINUTES..=MAX_STEP_MINUTES);
            let probability = self.rng.gen_range(MIN_PROBABILITY..1.0);

            chain.push(ChainPrediction {
                activity: activity.to_string(),
                predicted_start_time: anchor
                    .checked_add_signed(Duration::minutes(offset_minutes))
                    .map(|at| at.fixed_offset()),
                probability,
                minutes_from_start: offset_minutes as f64,
            });
            previous = activity.to_string();
        }

        chain
    }

    fn next_activity(&mut self, previous: &str) -> &'static str {
        let candidates: Vec<&'static str> = FALLBACK_ACTIVITIES
            .iter()
            .copied()
            .filter(|a| !a.eq_ignore_ascii_case(previous))
            .collect();
        candidates
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(FALLBACK_ACTIVITIES[0])
    }
}
