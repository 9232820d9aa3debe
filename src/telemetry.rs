//! Mock collar telemetry
//!
//! Stands in for the collar's sensors until real hardware is wired up. Each
//! tick draws a fresh frame (vitals, daily activity, behavior, emotion,
//! location) and drains the simulated battery a little.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

pub const BEHAVIORS: [&str; 6] = ["Walking", "Running", "Sleeping", "Playing", "Eating", "Sitting"];

pub const EMOTIONS: [&str; 6] = ["Happy", "Excited", "Calm", "Anxious", "Playful", "Tired"];

/// Known places the collar reports
pub const LOCATIONS: [(&str, f64, f64); 3] = [
    ("Home", 40.7128, -74.0060),
    ("Dog Park", 40.7589, -73.9851),
    ("Vet Clinic", 40.7505, -73.9934),
];

const INITIAL_BATTERY: f64 = 85.0;
const MIN_BATTERY: f64 = 20.0;
const MAX_DRAIN_PER_TICK: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One simulated sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// 80-119 bpm
    pub heart_rate_bpm: u32,
    /// 101.0-103.0 °F, one decimal
    pub temperature_f: f64,
    /// 0-99 %
    pub activity_level: u8,
    pub steps: u32,
    pub calories: u32,
    pub behavior: String,
    pub emotion: String,
    pub location: Location,
}

impl Default for TelemetryFrame {
    fn default() -> Self {
        let (name, latitude, longitude) = LOCATIONS[0];
        Self {
            heart_rate_bpm: 90,
            temperature_f: 101.5,
            activity_level: 0,
            steps: 0,
            calories: 0,
            behavior: BEHAVIORS[0].to_string(),
            emotion: EMOTIONS[0].to_string(),
            location: Location {
                name: name.to_string(),
                latitude,
                longitude,
            },
        }
    }
}

/// Seedable telemetry source
#[derive(Debug, Clone)]
pub struct TelemetrySimulator {
    rng: Mcg128Xsl64,
    battery_pct: f64,
}

impl Default for TelemetrySimulator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TelemetrySimulator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self {
            rng,
            battery_pct: INITIAL_BATTERY,
        }
    }

    pub fn battery_pct(&self) -> f64 {
        self.battery_pct
    }

    /// Draw a new frame
    pub fn next_frame(&mut self) -> TelemetryFrame {
        let rng = &mut self.rng;
        let temperature: f64 = 101.0 + rng.gen_range(0.0..2.0);
        let (name, latitude, longitude) = LOCATIONS[rng.gen_range(0..LOCATIONS.len())];

        TelemetryFrame {
            heart_rate_bpm: rng.gen_range(80..120),
            temperature_f: (temperature * 10.0).round() / 10.0,
            activity_level: rng.gen_range(0..100),
            steps: rng.gen_range(8000..13000),
            calories: rng.gen_range(300..500),
            behavior: BEHAVIORS[rng.gen_range(0..BEHAVIORS.len())].to_string(),
            emotion: EMOTIONS[rng.gen_range(0..EMOTIONS.len())].to_string(),
            location: Location {
                name: name.to_string(),
                latitude,
                longitude,
            },
        }
    }

    /// Drain the battery by up to 2 %, never below 20 %
    pub fn drain_battery(&mut self) -> f64 {
        let drain = self.rng.gen_range(0.0..MAX_DRAIN_PER_TICK);
        self.battery_pct = (self.battery_pct - drain).max(MIN_BATTERY);
        self.battery_pct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frames_stay_in_range() {
        let mut sim = TelemetrySimulator::new(Some(11));
        for _ in 0..200 {
            let frame = sim.next_frame();
            assert!((80..120).contains(&frame.heart_rate_bpm));
            assert!((101.0..=103.0).contains(&frame.temperature_f));
            assert!(frame.activity_level < 100);
            assert!((8000..13000).contains(&frame.steps));
            assert!((300..500).contains(&frame.calories));
            assert!(BEHAVIORS.contains(&frame.behavior.as_str()));
            assert!(EMOTIONS.contains(&frame.emotion.as_str()));
            assert!(LOCATIONS.iter().any(|(name, _, _)| *name == frame.location.name));
        }
    }

    #[test]
    fn test_temperature_has_one_decimal() {
        let mut sim = TelemetrySimulator::new(Some(5));
        for _ in 0..50 {
            let t = sim.next_frame().temperature_f;
            assert!(((t * 10.0).round() - t * 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_battery_drains_to_floor() {
        let mut sim = TelemetrySimulator::new(Some(8));
        assert_eq!(sim.battery_pct(), 85.0);

        let mut last = sim.battery_pct();
        for _ in 0..500 {
            let now = sim.drain_battery();
            assert!(now <= last);
            assert!(now >= 20.0);
            last = now;
        }
        assert_eq!(last, 20.0);
    }

    #[test]
    fn test_seeded_frames_repeat() {
        let a = TelemetrySimulator::new(Some(21)).next_frame();
        let b = TelemetrySimulator::new(Some(21)).next_frame();
        assert_eq!(a, b);
    }
}
