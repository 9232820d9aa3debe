//! Time resolution
//!
//! Turns service predictions into absolute, countdown-ready entries relative to
//! a reference instant ("now"):
//! - Simple predictions carry a time of day and are placed on now's calendar
//!   date, rolling to the next date when that moment has already passed
//! - Chain predictions carry an absolute start and only need the countdown
//!   recomputed for live accuracy
//!
//! Minutes are rounded like JavaScript's `Math.round`: `floor(x + 0.5)`.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

use crate::countdown::format_countdown;
use crate::error::CollarError;
use crate::types::{ChainPrediction, CountdownStyle, PredictedActivity, ResolvedPrediction};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// A wall-clock time without a date, parsed from `HH:MM:SS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Parse a strict `HH:MM:SS` string. Out-of-range values are rejected, never clamped.
    pub fn parse(input: &str) -> Result<Self, CollarError> {
        let parts: Vec<&str> = input.split(':').collect();
        if parts.len() != 3 {
            return Err(CollarError::ParseError(format!(
                "expected HH:MM:SS, got {:?}",
                input
            )));
        }

        let mut fields = [0u32; 3];
        for (slot, part) in fields.iter_mut().zip(&parts) {
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(CollarError::ParseError(format!(
                    "expected HH:MM:SS, got {:?}",
                    input
                )));
            }
            *slot = part
                .parse()
                .map_err(|_| CollarError::ParseError(format!("bad component in {:?}", input)))?;
        }

        let [hour, minute, second] = fields;
        if hour > 23 || minute > 59 || second > 59 {
            return Err(CollarError::ParseError(format!(
                "{:?} is out of range",
                input
            )));
        }

        NaiveTime::from_hms_opt(hour, minute, second)
            .map(TimeOfDay)
            .ok_or_else(|| CollarError::ParseError(format!("{:?} is out of range", input)))
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl FromStr for TimeOfDay {
    type Err = CollarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeOfDay::parse(s)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

/// Resolve a simple prediction against `now`.
///
/// The candidate is today's date at the predicted time of day in now's time
/// zone. If it is strictly earlier than `now` it moves to the same time of day
/// on the next calendar date.
pub fn resolve<Tz: TimeZone>(
    prediction: &PredictedActivity,
    now: &DateTime<Tz>,
) -> Result<ResolvedPrediction, CollarError> {
    let time = TimeOfDay::parse(&prediction.average_start_time)?;
    let tz = now.timezone();
    let today = now.date_naive();

    let mut candidate = localize(&tz, today.and_time(time.as_naive()));
    if candidate < *now {
        let tomorrow = today
            .succ_opt()
            .ok_or_else(|| CollarError::ParseError("date out of range".to_string()))?;
        candidate = localize(&tz, tomorrow.and_time(time.as_naive()));
    }

    let minutes_until = minutes_until(&candidate, now);

    Ok(ResolvedPrediction {
        label: prediction.activity.clone(),
        resolved_time: candidate.with_timezone(&candidate.offset().fix()),
        minutes_until,
        display_text: format_countdown(minutes_until, CountdownStyle::default()),
        probability: None,
        minutes_from_start: None,
    })
}

/// Resolve a chain prediction against `now`.
///
/// `anchor` is the reference activity time used when the service sent only a
/// relative offset. An offset that lands outside the representable calendar
/// is a `SchemaError`.
pub fn resolve_chain<Tz: TimeZone>(
    prediction: &ChainPrediction,
    anchor: &DateTime<Utc>,
    now: &DateTime<Tz>,
) -> Result<ResolvedPrediction, CollarError> {
    let minutes_from_start = round_minutes(prediction.minutes_from_start);
    let start = match prediction.predicted_start_time {
        Some(at) => at.with_timezone(&Utc),
        None => {
            // `as` saturates, so huge offsets fail in checked_add_signed
            let millis = (prediction.minutes_from_start * 60_000.0).round() as i64;
            Duration::try_milliseconds(millis)
                .and_then(|offset| anchor.checked_add_signed(offset))
                .ok_or_else(|| {
                    CollarError::SchemaError(format!(
                        "{}: offset of {} minutes is out of range",
                        prediction.activity, prediction.minutes_from_start
                    ))
                })?
        }
    };

    let local = start.with_timezone(&now.timezone());
    let minutes_until = minutes_until(&local, now);

    Ok(ResolvedPrediction {
        label: prediction.activity.clone(),
        resolved_time: local.with_timezone(&local.offset().fix()),
        minutes_until,
        display_text: format_countdown(minutes_until, CountdownStyle::default()),
        probability: Some(prediction.probability),
        minutes_from_start: Some(minutes_from_start),
    })
}

impl ResolvedPrediction {
    /// Re-render the countdown text in another presentation mode
    pub fn restyle(&mut self, style: CountdownStyle) {
        self.display_text = format_countdown(self.minutes_until, style);
    }
}

/// Whole minutes from `now` until `target`, rounded half up
pub fn minutes_until<Tz: TimeZone>(target: &DateTime<Tz>, now: &DateTime<Tz>) -> i64 {
    let millis = (target.clone() - now.clone()).num_milliseconds();
    (millis + MILLIS_PER_MINUTE / 2).div_euclid(MILLIS_PER_MINUTE)
}

/// Round fractional minutes half up
pub fn round_minutes(minutes: f64) -> i64 {
    (minutes + 0.5).floor() as i64
}

/// Map a local wall-clock time onto the zone.
/// Ambiguous times take the earliest instant; times in a gap shift forward an hour.
fn localize<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}
