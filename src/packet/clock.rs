//! Document clocks: explicit from the feed, or derived from data.

use serde_json::Value as Json;

use crate::time::{IntervalSet, TimeInterval, TimeStamp};
use crate::util::{Error, Result};

/// Behavior when the clock reaches the end of its interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockRange {
    /// Keep ticking past either end.
    Unbounded,
    /// Stop at the ends.
    Clamped,
    /// Loop back to the start when the stop is reached.
    #[default]
    LoopStop,
}

/// How the clock advances relative to wall time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockStep {
    /// Fixed step per tick, regardless of wall time.
    TickDependent,
    /// Wall-clock elapsed time scaled by the multiplier.
    #[default]
    SystemClockMultiplier,
    /// Track the system clock exactly.
    SystemClock,
}

/// Playback parameters for a document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DocumentClock {
    pub interval: TimeInterval,
    pub current_time: TimeStamp,
    pub multiplier: f64,
    pub range: ClockRange,
    pub step: ClockStep,
}

impl DocumentClock {
    /// Decode a clock payload, filling unspecified fields with
    /// defaults: an unbounded interval, current time at its start,
    /// multiplier 1.
    pub fn decode(json: &Json) -> Result<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| Error::other("clock payload must be an object"))?;

        let interval = match obj.get("interval") {
            Some(Json::String(s)) => TimeInterval::from_iso8601(s)?,
            Some(_) => return Err(Error::other("clock interval must be a string")),
            None => TimeInterval::always(),
        };
        let current_time = match obj.get("currentTime") {
            Some(Json::String(s)) => TimeStamp::from_iso8601(s)?,
            Some(_) => return Err(Error::other("clock currentTime must be a string")),
            None => interval.start(),
        };
        let multiplier = match obj.get("multiplier") {
            Some(v) => v
                .as_f64()
                .ok_or_else(|| Error::other("clock multiplier must be a number"))?,
            None => 1.0,
        };
        let range = match obj.get("range") {
            Some(Json::String(s)) => match s.as_str() {
                "UNBOUNDED" => ClockRange::Unbounded,
                "CLAMPED" => ClockRange::Clamped,
                "LOOP_STOP" => ClockRange::LoopStop,
                other => return Err(Error::other(format!("unknown clock range '{other}'"))),
            },
            Some(_) => return Err(Error::other("clock range must be a string")),
            None => ClockRange::default(),
        };
        let step = match obj.get("step") {
            Some(Json::String(s)) => match s.as_str() {
                "TICK_DEPENDENT" => ClockStep::TickDependent,
                "SYSTEM_CLOCK_MULTIPLIER" => ClockStep::SystemClockMultiplier,
                "SYSTEM_CLOCK" => ClockStep::SystemClock,
                other => return Err(Error::other(format!("unknown clock step '{other}'"))),
            },
            Some(_) => return Err(Error::other("clock step must be a string")),
            None => ClockStep::default(),
        };

        Ok(Self {
            interval,
            current_time,
            multiplier,
            range,
            step,
        })
    }
}

/// Knobs for deriving a clock when the feed does not supply one.
///
/// The derived multiplier makes the whole data timespan play back in
/// roughly `target_playback_seconds` of wall time, clamped between the
/// two multiplier bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockPolicy {
    pub target_playback_seconds: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
}

impl Default for ClockPolicy {
    fn default() -> Self {
        Self {
            target_playback_seconds: 120.0,
            min_multiplier: 1.0,
            max_multiplier: 1e6,
        }
    }
}

impl ClockPolicy {
    /// Derive a clock from an availability union. Returns None when the
    /// union is empty or unbounded — there is no finite timespan to
    /// play back.
    pub fn derive(&self, availability: &IntervalSet) -> Option<DocumentClock> {
        let start = availability.start()?;
        let stop = availability.stop()?;
        if !start.is_finite() || !stop.is_finite() {
            return None;
        }

        let total_seconds = start.seconds_to(stop);
        let multiplier = (total_seconds / self.target_playback_seconds)
            .round()
            .clamp(self.min_multiplier, self.max_multiplier);

        Some(DocumentClock {
            interval: TimeInterval::closed(start, stop).ok()?,
            current_time: start,
            multiplier,
            range: ClockRange::LoopStop,
            step: ClockStep::SystemClockMultiplier,
        })
    }
}
