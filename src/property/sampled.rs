//! Sampled properties: timestamped series plus interpolation and
//! extrapolation policy.

use smallvec::SmallVec;

use crate::event::Event;
use crate::time::TimeStamp;
use crate::util::{Error, Result};

use super::{Components, Value, ValueKind};

/// How values between samples are computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterpolationAlgorithm {
    /// Straight line between the two bracketing samples.
    #[default]
    Linear,
    /// Polynomial through a window of `degree + 1` neighboring samples.
    Lagrange,
}

/// Interpolation algorithm plus window degree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterpolationOptions {
    pub algorithm: InterpolationAlgorithm,
    pub degree: usize,
}

impl Default for InterpolationOptions {
    fn default() -> Self {
        Self {
            algorithm: InterpolationAlgorithm::Linear,
            degree: 1,
        }
    }
}

/// What to do for times outside the sampled range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtrapolationKind {
    /// The value is undefined outside the samples.
    #[default]
    None,
    /// Hold the nearest end sample's value.
    Hold,
    /// Project the interpolation algorithm past the end.
    Extrapolate,
}

/// Extrapolation behavior for one direction.
///
/// `duration` bounds how many seconds past the end sample the policy
/// applies; `0.0` means unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExtrapolationPolicy {
    pub kind: ExtrapolationKind,
    pub duration: f64,
}

/// A property defined by discrete timestamped samples.
///
/// Samples are kept sorted by time with no duplicate timestamps; adding
/// a sample at an existing timestamp overwrites it.
#[derive(Clone, Debug)]
pub struct SampledProperty {
    kind: ValueKind,
    times: Vec<TimeStamp>,
    values: Vec<Value>,
    options: InterpolationOptions,
    backward: ExtrapolationPolicy,
    forward: ExtrapolationPolicy,
    definition_changed: Event,
}

impl SampledProperty {
    /// Create an empty series for an interpolable value kind.
    pub fn new(kind: ValueKind) -> Result<Self> {
        if !kind.is_interpolable() {
            return Err(Error::TypeMismatch {
                expected: "an interpolable value kind".to_string(),
                actual: kind.to_string(),
            });
        }
        Ok(Self {
            kind,
            times: Vec::new(),
            values: Vec::new(),
            options: InterpolationOptions::default(),
            backward: ExtrapolationPolicy::default(),
            forward: ExtrapolationPolicy::default(),
            definition_changed: Event::new(),
        })
    }

    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn first_time(&self) -> Option<TimeStamp> {
        self.times.first().copied()
    }

    pub fn last_time(&self) -> Option<TimeStamp> {
        self.times.last().copied()
    }

    #[inline]
    pub fn interpolation(&self) -> InterpolationOptions {
        self.options
    }

    pub fn set_interpolation(&mut self, options: InterpolationOptions) {
        if self.options != options {
            self.options = options;
            self.definition_changed.raise(&());
        }
    }

    pub fn set_extrapolation(&mut self, backward: ExtrapolationPolicy, forward: ExtrapolationPolicy) {
        if self.backward != backward || self.forward != forward {
            self.backward = backward;
            self.forward = forward;
            self.definition_changed.raise(&());
        }
    }

    #[inline]
    pub fn definition_changed(&self) -> &Event {
        &self.definition_changed
    }

    /// Insert one sample in sorted position, overwriting on an exact
    /// timestamp collision. Raises definition-changed unless the sample
    /// was already present with an equal value.
    pub fn add_sample(&mut self, time: TimeStamp, value: Value) -> Result<()> {
        if self.insert_sample(time, value)? {
            self.definition_changed.raise(&());
        }
        Ok(())
    }

    /// Insert a batch of samples, raising definition-changed at most once.
    pub fn add_samples(
        &mut self,
        samples: impl IntoIterator<Item = (TimeStamp, Value)>,
    ) -> Result<()> {
        let mut changed = false;
        for (time, value) in samples {
            changed |= self.insert_sample(time, value)?;
        }
        if changed {
            self.definition_changed.raise(&());
        }
        Ok(())
    }

    fn insert_sample(&mut self, time: TimeStamp, value: Value) -> Result<bool> {
        if value.kind() != self.kind {
            return Err(Error::TypeMismatch {
                expected: self.kind.to_string(),
                actual: value.kind().to_string(),
            });
        }
        let idx = self.times.partition_point(|t| *t < time);
        if self.times.get(idx) == Some(&time) {
            if self.values[idx] == value {
                return Ok(false);
            }
            self.values[idx] = value;
        } else {
            self.times.insert(idx, time);
            self.values.insert(idx, value);
        }
        Ok(true)
    }

    /// Evaluate the series at `time`.
    pub fn get_value(&self, time: TimeStamp) -> Option<Value> {
        if self.times.is_empty() {
            return None;
        }
        let first = self.times[0];
        let last = self.times[self.times.len() - 1];

        if time < first {
            return self.extrapolate(time, first.seconds_to(time).abs(), self.backward, false);
        }
        if time > last {
            return self.extrapolate(time, last.seconds_to(time).abs(), self.forward, true);
        }

        let idx = self.times.partition_point(|t| *t < time);
        if self.times[idx] == time {
            return Some(self.values[idx].clone());
        }

        // Strictly between idx - 1 and idx
        self.interpolate(time, idx - 1)
    }

    fn extrapolate(
        &self,
        time: TimeStamp,
        distance: f64,
        policy: ExtrapolationPolicy,
        forward: bool,
    ) -> Option<Value> {
        if policy.duration > 0.0 && distance > policy.duration {
            return None;
        }
        let held = if forward {
            self.values.last()
        } else {
            self.values.first()
        };
        match policy.kind {
            ExtrapolationKind::None => None,
            ExtrapolationKind::Hold => held.cloned(),
            ExtrapolationKind::Extrapolate => {
                // Quaternions and single samples can only hold
                if self.kind == ValueKind::Quat || self.times.len() < 2 {
                    return held.cloned();
                }
                let floor = if forward { self.times.len() - 2 } else { 0 };
                self.interpolate(time, floor)
            }
        }
    }

    /// Interpolate at `time` using the window around the segment
    /// starting at sample `floor`.
    fn interpolate(&self, time: TimeStamp, floor: usize) -> Option<Value> {
        let ceil = (floor + 1).min(self.times.len() - 1);

        // Two equal bracketing samples need no arithmetic at all
        if self.values[floor] == self.values[ceil] {
            return Some(self.values[floor].clone());
        }

        if self.kind == ValueKind::Quat {
            let (Value::Quat(a), Value::Quat(b)) = (&self.values[floor], &self.values[ceil])
            else {
                return None;
            };
            let t0 = self.times[floor];
            let t1 = self.times[ceil];
            let alpha = t0.seconds_to(time) / t0.seconds_to(t1);
            return Some(Value::Quat(a.slerp(*b, alpha.clamp(0.0, 1.0))));
        }

        let window = match self.options.algorithm {
            InterpolationAlgorithm::Linear => 2,
            InterpolationAlgorithm::Lagrange => (self.options.degree + 1).max(2),
        };
        let window = window.min(self.times.len());

        // Center the window on the bracketing segment, clamped to the
        // ends of the series.
        let mut start = floor.saturating_sub((window - 1) / 2);
        if start + window > self.times.len() {
            start = self.times.len() - window;
        }

        self.lagrange_window(time, start, window)
    }

    /// Evaluate the polynomial through `window` samples beginning at
    /// `start`. With a window of two this is exactly linear
    /// interpolation, which is also the fallback when fewer samples
    /// exist than the configured degree needs.
    fn lagrange_window(&self, time: TimeStamp, start: usize, window: usize) -> Option<Value> {
        let times = &self.times[start..start + window];
        let origin = times[0];
        // Offsets from the window origin keep the products small
        let xs: SmallVec<[f64; 8]> = times.iter().map(|t| origin.seconds_to(*t)).collect();
        let x = origin.seconds_to(time);

        let comps: SmallVec<[Components; 8]> = self.values[start..start + window]
            .iter()
            .map(|v| v.components())
            .collect::<Option<_>>()?;
        let n_comp = comps[0].len();

        let mut out = Components::new();
        for c in 0..n_comp {
            let mut sum = 0.0;
            for j in 0..window {
                let mut basis = 1.0;
                for k in 0..window {
                    if k != j {
                        basis *= (x - xs[k]) / (xs[j] - xs[k]);
                    }
                }
                sum += comps[j][c] * basis;
            }
            out.push(sum);
        }
        Value::from_components(self.kind, &out)
    }
}

impl PartialEq for SampledProperty {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.times == other.times
            && self.values == other.values
            && self.options == other.options
            && self.backward == other.backward
            && self.forward == other.forward
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::DQuat;

    fn ts(seconds: f64) -> TimeStamp {
        TimeStamp::from_seconds(seconds)
    }

    fn linear_series() -> SampledProperty {
        let mut p = SampledProperty::new(ValueKind::Number).unwrap();
        p.add_sample(ts(0.0), Value::Number(10.0)).unwrap();
        p.add_sample(ts(10.0), Value::Number(20.0)).unwrap();
        p
    }

    #[test]
    fn test_linear_roundtrip_and_midpoint() {
        let p = linear_series();
        assert_eq!(p.get_value(ts(0.0)), Some(Value::Number(10.0)));
        assert_eq!(p.get_value(ts(10.0)), Some(Value::Number(20.0)));
        assert_eq!(p.get_value(ts(5.0)), Some(Value::Number(15.0)));
    }

    #[test]
    fn test_out_of_order_insertion_sorts() {
        let mut p = SampledProperty::new(ValueKind::Number).unwrap();
        p.add_sample(ts(10.0), Value::Number(20.0)).unwrap();
        p.add_sample(ts(0.0), Value::Number(10.0)).unwrap();
        assert_eq!(p.get_value(ts(5.0)), Some(Value::Number(15.0)));
    }

    #[test]
    fn test_duplicate_timestamp_overwrites() {
        let mut p = linear_series();
        p.add_sample(ts(0.0), Value::Number(0.0)).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.get_value(ts(0.0)), Some(Value::Number(0.0)));
    }

    #[test]
    fn test_no_event_on_noop_overwrite() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let mut p = linear_series();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        p.definition_changed().subscribe(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });

        p.add_sample(ts(0.0), Value::Number(10.0)).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        p.add_sample(ts(0.0), Value::Number(11.0)).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_extrapolation_none() {
        let p = linear_series();
        assert_eq!(p.get_value(ts(-0.001)), None);
        assert_eq!(p.get_value(ts(10.001)), None);
    }

    #[test]
    fn test_extrapolation_hold() {
        let mut p = linear_series();
        p.set_extrapolation(
            ExtrapolationPolicy {
                kind: ExtrapolationKind::Hold,
                duration: 0.0,
            },
            ExtrapolationPolicy {
                kind: ExtrapolationKind::Hold,
                duration: 0.0,
            },
        );
        assert_eq!(p.get_value(ts(-100.0)), Some(Value::Number(10.0)));
        assert_eq!(p.get_value(ts(100.0)), Some(Value::Number(20.0)));
    }

    #[test]
    fn test_extrapolation_duration_bound() {
        let mut p = linear_series();
        p.set_extrapolation(
            ExtrapolationPolicy {
                kind: ExtrapolationKind::Hold,
                duration: 5.0,
            },
            ExtrapolationPolicy {
                kind: ExtrapolationKind::Extrapolate,
                duration: 5.0,
            },
        );
        assert_eq!(p.get_value(ts(-4.0)), Some(Value::Number(10.0)));
        assert_eq!(p.get_value(ts(-6.0)), None);
        // Linear projection continues the 1-per-second slope
        assert_eq!(p.get_value(ts(14.0)), Some(Value::Number(24.0)));
        assert_eq!(p.get_value(ts(16.0)), None);
    }

    #[test]
    fn test_lagrange_reproduces_quadratic() {
        let mut p = SampledProperty::new(ValueKind::Number).unwrap();
        p.set_interpolation(InterpolationOptions {
            algorithm: InterpolationAlgorithm::Lagrange,
            degree: 2,
        });
        // y = t^2 at t = 0, 1, 2
        for t in [0.0, 1.0, 2.0] {
            p.add_sample(ts(t), Value::Number(t * t)).unwrap();
        }
        let v = p.get_value(ts(1.5)).unwrap().as_number().unwrap();
        assert!((v - 2.25).abs() < 1e-9);
    }

    #[test]
    fn test_lagrange_falls_back_with_few_samples() {
        let mut p = SampledProperty::new(ValueKind::Number).unwrap();
        p.set_interpolation(InterpolationOptions {
            algorithm: InterpolationAlgorithm::Lagrange,
            degree: 5,
        });
        p.add_sample(ts(0.0), Value::Number(0.0)).unwrap();
        p.add_sample(ts(2.0), Value::Number(2.0)).unwrap();
        // Two samples: degenerates to linear
        assert_eq!(p.get_value(ts(1.0)), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_equal_consecutive_samples() {
        let mut p = SampledProperty::new(ValueKind::Number).unwrap();
        p.add_sample(ts(0.0), Value::Number(7.0)).unwrap();
        p.add_sample(ts(1e-12), Value::Number(7.0)).unwrap();
        let v = p.get_value(ts(5e-13)).unwrap().as_number().unwrap();
        assert_eq!(v, 7.0);
    }

    #[test]
    fn test_quaternion_slerp_preserves_norm() {
        let mut p = SampledProperty::new(ValueKind::Quat).unwrap();
        let a = DQuat::from_rotation_z(0.0);
        let b = DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2);
        p.add_sample(ts(0.0), Value::Quat(a)).unwrap();
        p.add_sample(ts(1.0), Value::Quat(b)).unwrap();

        let Some(Value::Quat(mid)) = p.get_value(ts(0.5)) else {
            panic!("expected quaternion");
        };
        assert!((mid.length() - 1.0).abs() < 1e-9);
        let expected = DQuat::from_rotation_z(std::f64::consts::FRAC_PI_4);
        assert!(mid.abs_diff_eq(expected, 1e-9));
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let mut p = SampledProperty::new(ValueKind::Number).unwrap();
        assert!(p.add_sample(ts(0.0), Value::Boolean(true)).is_err());
        assert!(SampledProperty::new(ValueKind::String).is_err());
    }
}
