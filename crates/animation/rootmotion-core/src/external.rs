//! External curve assets: standalone 3-axis curves for motion, rotation and scale.
//!
//! Loading and saving is a field copy between the assets and a [`TransformCurve`].

use log::warn;
use serde::{Deserialize, Serialize};

use crate::curve::{Axis, CurveChannel, TransformCurve, VectorCurve};
use crate::Result;

/// A named 3-axis scalar curve asset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveVectorAsset {
    pub name: String,
    #[serde(default)]
    pub curve: VectorCurve,
}

impl CurveVectorAsset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            curve: VectorCurve::new(),
        }
    }
}

/// Up to three assets, one per transform channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalCurveSet {
    pub motion: Option<CurveVectorAsset>,
    pub rotation: Option<CurveVectorAsset>,
    pub scale: Option<CurveVectorAsset>,
}

impl ExternalCurveSet {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn slot(&self, channel: CurveChannel) -> Option<&CurveVectorAsset> {
        match channel {
            CurveChannel::Translation => self.motion.as_ref(),
            CurveChannel::Rotation => self.rotation.as_ref(),
            CurveChannel::Scale => self.scale.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, channel: CurveChannel) -> Option<&mut CurveVectorAsset> {
        match channel {
            CurveChannel::Translation => self.motion.as_mut(),
            CurveChannel::Rotation => self.rotation.as_mut(),
            CurveChannel::Scale => self.scale.as_mut(),
        }
    }

    pub fn has_any_curve(&self) -> bool {
        CurveChannel::ALL.iter().any(|c| self.slot(*c).is_some())
    }

    /// True when one asset name fills more than one slot.
    pub fn has_repeated_curve(&self) -> bool {
        let names: Vec<&str> = CurveChannel::ALL
            .iter()
            .filter_map(|c| self.slot(*c).map(|a| a.name.as_str()))
            .collect();
        names
            .iter()
            .enumerate()
            .any(|(i, a)| names[i + 1..].contains(a))
    }

    /// Replace `curve` with the assets' content. Empty slots load as empty channels.
    pub fn load_into(&self, curve: &mut TransformCurve) {
        for channel in CurveChannel::ALL {
            let target = curve.channel_mut(channel);
            target.reset();
            if let Some(asset) = self.slot(channel) {
                for axis in Axis::ALL {
                    let default_value = target.axis(axis).default_value;
                    *target.axis_mut(axis) = asset.curve.axis(axis).clone();
                    // Keep unit scale for empty scale axes.
                    if target.axis(axis).is_empty() {
                        target.axis_mut(axis).default_value = default_value;
                    }
                }
            }
        }
    }

    /// True when every channel of `curve` that has keys has a slot to go to.
    pub fn covers(&self, curve: &TransformCurve) -> bool {
        CurveChannel::ALL
            .into_iter()
            .all(|channel| self.slot(channel).is_some() || !curve.channel(channel).has_keys())
    }

    /// Copy `curve` into every filled slot; empty slots are skipped.
    pub fn save_from(&mut self, curve: &TransformCurve) {
        if self.has_repeated_curve() {
            warn!("saving into a curve set that names the same asset twice, later channels win");
        }
        for channel in CurveChannel::ALL {
            if let Some(asset) = self.slot_mut(channel) {
                asset.curve = curve.channel(channel).clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;
    use nalgebra::Vector3;

    fn walked() -> TransformCurve {
        let mut curve = TransformCurve::new();
        curve.update_or_add_key(&Transform::identity(), 0.0);
        curve.update_or_add_key(
            &Transform::from_translation(Vector3::new(0.0, 4.0, 0.0)),
            2.0,
        );
        curve
    }

    #[test]
    fn save_then_load_copies_fields() {
        let mut set = ExternalCurveSet {
            motion: Some(CurveVectorAsset::new("walk_motion")),
            rotation: None,
            scale: Some(CurveVectorAsset::new("walk_scale")),
        };
        set.save_from(&walked());
        assert_eq!(set.motion.as_ref().unwrap().curve.y.len(), 2);

        let mut loaded = TransformCurve::new();
        loaded.update_or_add_key(&Transform::from_scale(Vector3::repeat(5.0)), 9.0);
        set.load_into(&mut loaded);
        assert!((loaded.evaluate(1.0, 1.0).translation.y - 2.0).abs() < 1e-5);
        assert!(!loaded.rotation.has_keys());
        assert_eq!(loaded.time_range(), Some((0.0, 2.0)));
    }

    #[test]
    fn empty_scale_asset_keeps_unit_default() {
        let set = ExternalCurveSet {
            scale: Some(CurveVectorAsset::new("blank")),
            ..Default::default()
        };
        let mut curve = TransformCurve::new();
        set.load_into(&mut curve);
        assert_eq!(curve.evaluate(0.0, 1.0).scale, Vector3::repeat(1.0));
    }

    #[test]
    fn repeated_and_any() {
        let mut set = ExternalCurveSet::default();
        assert!(!set.has_any_curve());
        set.motion = Some(CurveVectorAsset::new("a"));
        set.rotation = Some(CurveVectorAsset::new("b"));
        assert!(set.has_any_curve());
        assert!(!set.has_repeated_curve());
        set.scale = Some(CurveVectorAsset::new("a"));
        assert!(set.has_repeated_curve());
    }

    #[test]
    fn json_roundtrip() {
        let mut set = ExternalCurveSet {
            motion: Some(CurveVectorAsset::new("m")),
            ..Default::default()
        };
        set.save_from(&walked());
        let back = ExternalCurveSet::from_json(&set.to_json().unwrap()).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn coverage_follows_keyed_channels() {
        let mut curve = TransformCurve::new();
        curve.translation.update_or_add_key(0.0, &Vector3::new(1.0, 0.0, 0.0));
        let mut set = ExternalCurveSet {
            motion: Some(CurveVectorAsset::new("motion")),
            ..Default::default()
        };
        assert!(set.covers(&curve));

        curve.rotation.z.update_or_add_key(0.5, 45.0);
        assert!(!set.covers(&curve));
        set.rotation = Some(CurveVectorAsset::new("turn"));
        assert!(set.covers(&curve));
    }
}
