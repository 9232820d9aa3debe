//! PawSense - On-device core for the smart dog collar companion app
//!
//! PawSense turns activity predictions from the remote prediction service into
//! sorted, human-readable countdowns through a small pipeline: fetch → shape
//! detection → time resolution → urgency ordering → countdown formatting.
//! Failed or malformed fetches are replaced by a locally generated placeholder
//! chain, so the screens always have something to show.
//!
//! ## Modules
//!
//! - **Prediction Pipeline**: fetch, decode, resolve and sort predictions
//! - **Presentation Controller**: screen state, mock telemetry and the bark translator

pub mod adapters;
pub mod client;
pub mod config;
pub mod controller;
pub mod countdown;
pub mod error;
pub mod fallback;
pub mod pipeline;
pub mod resolver;
pub mod telemetry;
pub mod translator;
pub mod types;
pub mod urgency;

#[cfg(feature = "cli")]
pub mod logging;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use adapters::{decode_payload, PredictionPayload};
pub use controller::{CollarController, CollarSnapshot, Tab};
pub use countdown::format_countdown;
pub use error::CollarError;
pub use pipeline::{resolve_predictions, PredictionPipeline};
pub use resolver::{resolve, resolve_chain, TimeOfDay};
pub use types::{
    CountdownStyle, PredictedActivity, PredictionBoard, PredictionRequest, ResolvedPrediction,
};
pub use urgency::{sort_by_urgency, UrgencyOrder};

/// PawSense version embedded in CLI and FFI output
pub const PAWSENSE_VERSION: &str = env!("CARGO_PKG_VERSION");
