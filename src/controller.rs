//! Presentation controller
//!
//! Single owner of all mutable screen state: selected tab, latest telemetry,
//! battery, translator, and the most recent prediction board. Screens never
//! see the controller itself, only the immutable [`CollarSnapshot`] it hands
//! out.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::error::CollarError;
use crate::telemetry::{TelemetryFrame, TelemetrySimulator};
use crate::translator::{BarkTranslation, Translator};
use crate::types::PredictionBoard;

pub const STEP_GOAL: u32 = 15_000;
pub const CALORIE_GOAL: u32 = 600;

/// App screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Dashboard,
    Health,
    Location,
    Behavior,
    Translator,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Dashboard,
        Tab::Health,
        Tab::Location,
        Tab::Behavior,
        Tab::Translator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Dashboard => "dashboard",
            Tab::Health => "health",
            Tab::Location => "location",
            Tab::Behavior => "behavior",
            Tab::Translator => "translator",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = CollarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .into_iter()
            .find(|tab| tab.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CollarError::ConfigError(format!("unknown tab: {}", s)))
    }
}

/// Emoji shown next to the current behavior
pub fn behavior_emoji(behavior: &str) -> &'static str {
    match behavior {
        "Sleeping" => "😴",
        "Playing" => "🎾",
        "Walking" => "🚶",
        "Running" => "🏃",
        "Eating" => "🍽️",
        _ => "🐕",
    }
}

/// Percentage of `goal` reached, clamped to 0-100
pub fn goal_progress(value: u32, goal: u32) -> f64 {
    if goal == 0 {
        return 0.0;
    }
    (value as f64 / goal as f64 * 100.0).clamp(0.0, 100.0)
}

/// Immutable view of everything the screens render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollarSnapshot {
    pub tab: Tab,
    pub connected: bool,
    pub battery_pct: f64,
    pub telemetry: TelemetryFrame,
    pub behavior_emoji: String,
    pub step_progress_pct: f64,
    pub calorie_progress_pct: f64,
    pub translator_output: Option<String>,
    pub recent_barks: Vec<BarkTranslation>,
    pub predictions: Option<PredictionBoard>,
}

pub struct CollarController {
    tab: Tab,
    connected: bool,
    simulator: TelemetrySimulator,
    frame: TelemetryFrame,
    translator: Translator,
    board: Option<PredictionBoard>,
}

impl Default for CollarController {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CollarController {
    /// Create a controller; a seed makes telemetry and translator output reproducible
    pub fn new(seed: Option<u64>) -> Self {
        let mut simulator = TelemetrySimulator::new(seed);
        let frame = simulator.next_frame();
        Self {
            tab: Tab::default(),
            connected: true,
            simulator,
            frame,
            translator: Translator::new(seed.map(|s| s.wrapping_add(1))),
            board: None,
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Periodic telemetry refresh
    pub fn tick(&mut self) {
        self.frame = self.simulator.next_frame();
        self.simulator.drain_battery();
    }

    /// Replace the prediction board; the last one applied wins
    pub fn apply_board(&mut self, board: PredictionBoard) {
        info!(
            board = %board.id,
            entries = board.entries.len(),
            fallback = board.source.is_fallback(),
            "prediction board applied"
        );
        self.board = Some(board);
    }

    pub fn translate(&mut self, message: &str) -> Result<String, CollarError> {
        self.translator.translate(message).map(str::to_string)
    }

    pub fn snapshot(&self) -> CollarSnapshot {
        CollarSnapshot {
            tab: self.tab,
            connected: self.connected,
            battery_pct: self.simulator.battery_pct(),
            telemetry: self.frame.clone(),
            behavior_emoji: behavior_emoji(&self.frame.behavior).to_string(),
            step_progress_pct: goal_progress(self.frame.steps, STEP_GOAL),
            calorie_progress_pct: goal_progress(self.frame.calories, CALORIE_GOAL),
            translator_output: self.translator.last_response().map(str::to_string),
            recent_barks: self.translator.recent_barks().to_vec(),
            predictions: self.board.clone(),
        }
    }
}
