//! Keyed scalar curve.
//!
//! Model:
//! - Keys are kept sorted by time; at most one key per time (within [`KEY_TIME_TOLERANCE`]).
//! - Segment [Ki -> K(i+1)] uses the interpolation mode of its left key.
//! - Before the first key the first value is held, after the last key the last value.
//! - An empty curve evaluates to `default_value`.

use serde::{Deserialize, Serialize};

use crate::error::RootMotionError;
use crate::interp::{hermite, lerp_f32, unwind_degrees};
use crate::Result;

/// Two keys closer than this are considered to share a time.
pub const KEY_TIME_TOLERANCE: f32 = 1e-4;

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum KeyInterp {
    /// Hold the left key value until the next key.
    Constant,
    #[default]
    Linear,
    /// Hermite segment driven by the key tangents.
    Cubic,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RichKey {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub interp: KeyInterp,
    /// Slope (value per second) arriving at this key.
    #[serde(default)]
    pub arrive_tangent: f32,
    /// Slope (value per second) leaving this key.
    #[serde(default)]
    pub leave_tangent: f32,
}

impl RichKey {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            interp: KeyInterp::Linear,
            arrive_tangent: 0.0,
            leave_tangent: 0.0,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RichCurve {
    #[serde(default)]
    keys: Vec<RichKey>,
    #[serde(default)]
    pub default_value: f32,
}

impl RichCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from keys in any order; later duplicates win.
    pub fn from_keys(keys: impl IntoIterator<Item = RichKey>) -> Self {
        let mut curve = Self::default();
        for key in keys {
            let index = curve.update_or_add_key(key.time, key.value);
            curve.keys[index] = RichKey {
                time: curve.keys[index].time,
                ..key
            };
        }
        curve
    }

    #[inline]
    pub fn keys(&self) -> &[RichKey] {
        &self.keys
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Drop all keys. `default_value` is kept.
    pub fn reset(&mut self) {
        self.keys.clear();
    }

    /// First and last key times.
    pub fn time_range(&self) -> Option<(f32, f32)> {
        match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }

    /// Index of the key sharing `time`, if any.
    pub fn find_key(&self, time: f32) -> Option<usize> {
        let at = self.keys.partition_point(|k| k.time < time - KEY_TIME_TOLERANCE);
        self.keys
            .get(at)
            .filter(|k| (k.time - time).abs() <= KEY_TIME_TOLERANCE)
            .map(|_| at)
    }

    /// Value of the last key strictly before `time`.
    pub fn value_before(&self, time: f32) -> Option<f32> {
        let at = self.keys.partition_point(|k| k.time < time - KEY_TIME_TOLERANCE);
        at.checked_sub(1).map(|i| self.keys[i].value)
    }

    /// Insert a linear key, or overwrite the value of the key already at `time`.
    /// Returns the key index.
    pub fn update_or_add_key(&mut self, time: f32, value: f32) -> usize {
        if let Some(index) = self.find_key(time) {
            self.keys[index].value = value;
            return index;
        }
        let at = self.keys.partition_point(|k| k.time < time);
        self.keys.insert(at, RichKey::new(time, value));
        at
    }

    /// Insert a new key; fails if one already sits at `time`.
    pub fn add_key(&mut self, key: RichKey) -> Result<usize> {
        if self.find_key(key.time).is_some() {
            return Err(RootMotionError::KeyTimeOccupied { time: key.time });
        }
        let at = self.keys.partition_point(|k| k.time < key.time);
        self.keys.insert(at, key);
        Ok(at)
    }

    pub fn delete_key(&mut self, index: usize) -> Result<RichKey> {
        self.check_index(index)?;
        Ok(self.keys.remove(index))
    }

    /// Retime a key, keeping the list sorted. Returns the new index.
    pub fn move_key(&mut self, index: usize, new_time: f32) -> Result<usize> {
        self.check_index(index)?;
        if let Some(other) = self.find_key(new_time) {
            if other != index {
                return Err(RootMotionError::KeyTimeOccupied { time: new_time });
            }
        }
        let mut key = self.keys.remove(index);
        key.time = new_time;
        let at = self.keys.partition_point(|k| k.time < new_time);
        self.keys.insert(at, key);
        Ok(at)
    }

    pub fn set_key_value(&mut self, index: usize, value: f32) -> Result<()> {
        self.check_index(index)?;
        self.keys[index].value = value;
        Ok(())
    }

    pub fn set_key_interp(&mut self, index: usize, interp: KeyInterp) -> Result<()> {
        self.check_index(index)?;
        self.keys[index].interp = interp;
        Ok(())
    }

    pub fn set_tangents(&mut self, index: usize, arrive: f32, leave: f32) -> Result<()> {
        self.check_index(index)?;
        let key = &mut self.keys[index];
        key.arrive_tangent = arrive;
        key.leave_tangent = leave;
        Ok(())
    }

    /// Smooth tangents from the neighbouring keys (flat at both ends).
    pub fn auto_set_tangents(&mut self) {
        let n = self.keys.len();
        for i in 0..n {
            let slope = if i == 0 || i + 1 == n {
                0.0
            } else {
                let prev = self.keys[i - 1];
                let next = self.keys[i + 1];
                let span = next.time - prev.time;
                if span > f32::EPSILON {
                    (next.value - prev.value) / span
                } else {
                    0.0
                }
            };
            self.keys[i].arrive_tangent = slope;
            self.keys[i].leave_tangent = slope;
        }
    }

    /// Treat values as degrees and move each key after `index` to the equivalent
    /// angle nearest its predecessor.
    pub(crate) fn unwind_after(&mut self, index: usize) {
        for i in index + 1..self.keys.len() {
            let previous = self.keys[i - 1].value;
            self.keys[i].value = unwind_degrees(previous, self.keys[i].value);
        }
    }

    /// Evaluate at `time`. Binary search over the keys, O(log n).
    pub fn evaluate(&self, time: f32) -> f32 {
        let n = self.keys.len();
        match n {
            0 => self.default_value,
            1 => self.keys[0].value,
            _ => {
                let first = &self.keys[0];
                let last = &self.keys[n - 1];
                if time.is_nan() || time <= first.time {
                    return first.value;
                }
                if time >= last.time {
                    return last.value;
                }
                // first.time < time < last.time, so 1 <= right <= n - 1.
                let right = self.keys.partition_point(|k| k.time <= time);
                let left = &self.keys[right - 1];
                let right = &self.keys[right];
                let span = right.time - left.time;
                if span <= f32::EPSILON {
                    return right.value;
                }
                let local = (time - left.time) / span;
                match left.interp {
                    KeyInterp::Constant => left.value,
                    KeyInterp::Linear => lerp_f32(left.value, right.value, local),
                    KeyInterp::Cubic => hermite(
                        left.value,
                        left.leave_tangent * span,
                        right.value,
                        right.arrive_tangent * span,
                        local,
                    ),
                }
            }
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.keys.len() {
            Ok(())
        } else {
            Err(RootMotionError::InvalidKey {
                index,
                len: self.keys.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> RichCurve {
        let mut c = RichCurve::new();
        c.update_or_add_key(0.0, 0.0);
        c.update_or_add_key(1.0, 10.0);
        c.update_or_add_key(2.0, 0.0);
        c
    }

    #[test]
    fn empty_curve_uses_default() {
        let mut c = RichCurve::new();
        assert_eq!(c.evaluate(3.0), 0.0);
        c.default_value = 7.0;
        assert_eq!(c.evaluate(3.0), 7.0);
    }

    #[test]
    fn holds_outside_key_range() {
        let c = ramp();
        assert_eq!(c.evaluate(-5.0), 0.0);
        assert_eq!(c.evaluate(50.0), 0.0);
        let mut single = RichCurve::new();
        single.update_or_add_key(1.0, 4.0);
        assert_eq!(single.evaluate(0.0), 4.0);
        assert_eq!(single.evaluate(9.0), 4.0);
    }

    #[test]
    fn linear_between_keys() {
        let c = ramp();
        assert!((c.evaluate(0.5) - 5.0).abs() < 1e-6);
        assert!((c.evaluate(1.5) - 5.0).abs() < 1e-6);
        assert_eq!(c.evaluate(1.0), 10.0);
    }

    #[test]
    fn update_or_add_replaces_in_place() {
        let mut c = ramp();
        let idx = c.update_or_add_key(1.0 + KEY_TIME_TOLERANCE * 0.5, 3.0);
        assert_eq!(idx, 1);
        assert_eq!(c.len(), 3);
        assert_eq!(c.evaluate(1.0), 3.0);
        // Out of order insertion stays sorted.
        c.update_or_add_key(0.5, 1.0);
        let times: Vec<f32> = c.keys().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0, 2.0]);
    }

    #[test]
    fn constant_and_cubic_segments() {
        let mut c = ramp();
        c.set_key_interp(0, KeyInterp::Constant).unwrap();
        assert_eq!(c.evaluate(0.9), 0.0);

        c.set_key_interp(0, KeyInterp::Cubic).unwrap();
        c.set_tangents(0, 10.0, 10.0).unwrap();
        c.set_tangents(1, 10.0, 10.0).unwrap();
        // Tangents equal to the chord slope reproduce the line.
        assert!((c.evaluate(0.25) - 2.5).abs() < 1e-5);
    }

    #[test]
    fn auto_tangents_are_flat_at_ends() {
        let mut c = RichCurve::new();
        c.update_or_add_key(0.0, 0.0);
        c.update_or_add_key(1.0, 1.0);
        c.update_or_add_key(2.0, 4.0);
        c.auto_set_tangents();
        assert_eq!(c.keys()[0].leave_tangent, 0.0);
        assert!((c.keys()[1].arrive_tangent - 2.0).abs() < 1e-6);
        assert_eq!(c.keys()[2].arrive_tangent, 0.0);
    }

    #[test]
    fn move_and_delete() {
        let mut c = ramp();
        let idx = c.move_key(0, 1.5).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(c.keys()[0].time, 1.0);
        assert!(matches!(
            c.move_key(0, 2.0),
            Err(RootMotionError::KeyTimeOccupied { .. })
        ));
        let removed = c.delete_key(2).unwrap();
        assert_eq!(removed.time, 2.0);
        assert!(matches!(
            c.delete_key(5),
            Err(RootMotionError::InvalidKey { index: 5, len: 2 })
        ));
        assert!(c.add_key(RichKey::new(1.0, 0.0)).is_err());
    }

    #[test]
    fn value_before_skips_same_time() {
        let c = ramp();
        assert_eq!(c.value_before(1.0), Some(0.0));
        assert_eq!(c.value_before(0.0), None);
        assert_eq!(c.value_before(5.0), Some(0.0));
    }

    #[test]
    fn nan_time_holds_the_first_key() {
        let mut c = RichCurve::new();
        c.update_or_add_key(0.0, 1.0);
        c.update_or_add_key(1.0, 3.0);
        assert_eq!(c.evaluate(f32::NAN), 1.0);
        assert_eq!(c.evaluate(f32::INFINITY), 3.0);
        assert_eq!(c.evaluate(f32::NEG_INFINITY), 1.0);
    }
}
