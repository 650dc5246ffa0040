//! Three independent scalar curves, one per axis.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::rich::RichCurve;
use super::Axis;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct VectorCurve {
    pub x: RichCurve,
    pub y: RichCurve,
    pub z: RichCurve,
}

impl VectorCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty curve whose axes evaluate to `value`.
    pub fn with_default(value: f32) -> Self {
        let mut curve = Self::default();
        for axis in Axis::ALL {
            curve.axis_mut(axis).default_value = value;
        }
        curve
    }

    pub fn axis(&self, axis: Axis) -> &RichCurve {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut RichCurve {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }

    /// True when any axis holds a key.
    pub fn has_keys(&self) -> bool {
        Axis::ALL.iter().any(|a| !self.axis(*a).is_empty())
    }

    /// Largest key count across the axes.
    pub fn key_count(&self) -> usize {
        Axis::ALL
            .iter()
            .map(|a| self.axis(*a).len())
            .max()
            .unwrap_or(0)
    }

    /// Union of the axis time ranges.
    pub fn time_range(&self) -> Option<(f32, f32)> {
        Axis::ALL
            .iter()
            .filter_map(|a| self.axis(*a).time_range())
            .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
    }

    pub fn reset(&mut self) {
        for axis in Axis::ALL {
            self.axis_mut(axis).reset();
        }
    }

    pub fn update_or_add_key(&mut self, time: f32, value: &Vector3<f32>) {
        self.x.update_or_add_key(time, value.x);
        self.y.update_or_add_key(time, value.y);
        self.z.update_or_add_key(time, value.z);
    }

    pub fn evaluate(&self, time: f32) -> Vector3<f32> {
        Vector3::new(
            self.x.evaluate(time),
            self.y.evaluate(time),
            self.z.evaluate(time),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_are_independent() {
        let mut c = VectorCurve::new();
        c.update_or_add_key(0.0, &Vector3::new(0.0, 1.0, 2.0));
        c.update_or_add_key(1.0, &Vector3::new(10.0, 1.0, 0.0));
        c.x.update_or_add_key(2.0, 20.0);
        assert_eq!(c.key_count(), 3);
        assert_eq!(c.time_range(), Some((0.0, 2.0)));
        let v = c.evaluate(0.5);
        assert!((v.x - 5.0).abs() < 1e-6);
        assert_eq!(v.y, 1.0);
        assert!((v.z - 1.0).abs() < 1e-6);
        // y/z hold their last key past 1.0.
        assert_eq!(c.evaluate(1.5).z, 0.0);
    }

    #[test]
    fn default_applies_only_when_empty() {
        let mut c = VectorCurve::with_default(1.0);
        assert!(!c.has_keys());
        assert_eq!(c.evaluate(3.0), Vector3::repeat(1.0));
        c.update_or_add_key(0.0, &Vector3::repeat(2.0));
        c.reset();
        assert_eq!(c.evaluate(3.0), Vector3::repeat(1.0));
    }
}
