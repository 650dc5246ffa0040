//! Time-indexed transform curve: translation, rotation (Euler degrees) and scale.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::rich::{RichCurve, KEY_TIME_TOLERANCE};
use super::vector::VectorCurve;
use super::{Axis, CurveChannel, CurveId};
use crate::interp::unwind_degrees;
use crate::transform::Transform;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransformCurve {
    #[serde(default)]
    pub translation: VectorCurve,
    #[serde(default)]
    pub rotation: VectorCurve,
    #[serde(default = "unit_scale_curve")]
    pub scale: VectorCurve,
}

fn unit_scale_curve() -> VectorCurve {
    VectorCurve::with_default(1.0)
}

impl Default for TransformCurve {
    fn default() -> Self {
        Self {
            translation: VectorCurve::new(),
            rotation: VectorCurve::new(),
            scale: unit_scale_curve(),
        }
    }
}

impl TransformCurve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self, channel: CurveChannel) -> &VectorCurve {
        match channel {
            CurveChannel::Translation => &self.translation,
            CurveChannel::Rotation => &self.rotation,
            CurveChannel::Scale => &self.scale,
        }
    }

    pub fn channel_mut(&mut self, channel: CurveChannel) -> &mut VectorCurve {
        match channel {
            CurveChannel::Translation => &mut self.translation,
            CurveChannel::Rotation => &mut self.rotation,
            CurveChannel::Scale => &mut self.scale,
        }
    }

    pub fn curve(&self, id: CurveId) -> &RichCurve {
        self.channel(id.channel).axis(id.axis)
    }

    pub fn curve_mut(&mut self, id: CurveId) -> &mut RichCurve {
        self.channel_mut(id.channel).axis_mut(id.axis)
    }

    /// The nine scalar curves with their ids, channel-major.
    pub fn curves(&self) -> impl Iterator<Item = (CurveId, &RichCurve)> + '_ {
        CurveId::all().map(move |id| (id, self.curve(id)))
    }

    pub fn is_empty(&self) -> bool {
        !CurveChannel::ALL.iter().any(|c| self.channel(*c).has_keys())
    }

    /// Largest key count over the nine curves.
    pub fn key_count(&self) -> usize {
        self.curves().map(|(_, c)| c.len()).max().unwrap_or(0)
    }

    pub fn time_range(&self) -> Option<(f32, f32)> {
        CurveChannel::ALL
            .iter()
            .filter_map(|c| self.channel(*c).time_range())
            .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
    }

    /// Sorted union of key times over all curves.
    pub fn key_times(&self) -> Vec<f32> {
        let mut times: Vec<f32> = self
            .curves()
            .flat_map(|(_, c)| c.keys().iter().map(|k| k.time))
            .collect();
        times.sort_by(f32::total_cmp);
        times.dedup_by(|a, b| (*a - *b).abs() <= KEY_TIME_TOLERANCE);
        times
    }

    /// Drop every key; defaults (unit scale) stay.
    pub fn reset(&mut self) {
        for channel in CurveChannel::ALL {
            self.channel_mut(channel).reset();
        }
    }

    /// Replace this curve's content with a copy of `other`.
    pub fn copy_from(&mut self, other: &TransformCurve) {
        self.clone_from(other);
    }

    /// Key `value` at `time` on all nine curves (insert or overwrite).
    ///
    /// Rotation is stored as Euler degrees, unwound against the preceding key so
    /// interpolation between neighbouring keys takes the short way round. Keys after
    /// the new one are unwound again against it.
    pub fn update_or_add_key(&mut self, value: &Transform, time: f32) {
        let euler = value.euler_degrees();
        self.translation.update_or_add_key(time, &value.translation);
        for axis in Axis::ALL {
            let curve = self.rotation.axis_mut(axis);
            let mut component = euler[axis_index(axis)];
            if let Some(prev) = curve.value_before(time) {
                component = unwind_degrees(prev, component);
            }
            let index = curve.update_or_add_key(time, component);
            curve.unwind_after(index);
        }
        self.scale.update_or_add_key(time, &value.scale);
    }

    /// Evaluate at `time`, blended from identity by `weight` (1.0 = full curve value).
    ///
    /// Holds the first/last key outside the keyed range; an empty curve is identity.
    pub fn evaluate(&self, time: f32, weight: f32) -> Transform {
        let euler: Vector3<f32> = self.rotation.evaluate(time);
        let full = Transform {
            translation: self.translation.evaluate(time),
            rotation: Transform::rotation_from_euler_degrees(&euler),
            scale: self.scale.evaluate(time),
        };
        full.blend_from_identity(weight)
    }
}

#[inline]
fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::X => 0,
        Axis::Y => 1,
        Axis::Z => 2,
    }
}
