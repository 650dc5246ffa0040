//! Baking: sample an [`AnimationSource`] at a fixed rate into a [`TransformCurve`].
//!
//! Two modes:
//! - Root motion: per-interval root deltas from [`AnimationSource::extract_root_motion`],
//!   keyed at the end of each interval. Non-additive bakes accumulate as
//!   `acc = delta * acc` (delta applied first, then the accumulated transform).
//! - Bone pose: the pose of one bone at every sample time, `0..=play_length`. Additive
//!   bakes store `pose(t_i).relative_to(pose(t_(i-1)))`, starting from identity.
//!
//! The channel mask is applied to the stored value only; accumulation and the
//! previous-pose reference always use the unmasked transform.

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::channels::ExtractChannels;
use crate::curve::TransformCurve;
use crate::error::RootMotionError;
use crate::source::{AnimationSource, EvalOptions};
use crate::transform::Transform;
use crate::Result;

/// Default samples per second.
pub const DEFAULT_SAMPLE_RATE: u32 = 30;

/// Fraction of a sample below which a trailing partial step is dropped.
const SAMPLE_EPSILON: f32 = 1e-3;

/// Where baked values come from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractMode {
    /// Root motion when no bone is named or the bone is the skeleton root, bone pose otherwise.
    #[default]
    Auto,
    RootMotion,
    BonePose,
}

/// Immutable per-run bake settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeConfig {
    /// Samples per second.
    pub sample_rate: u32,
    /// Store per-interval deltas instead of absolute values.
    pub additive: bool,
    pub channels: ExtractChannels,
    /// Bone to sample; `None` means the skeleton root.
    pub bone: Option<String>,
    pub mode: ExtractMode,
    pub evaluation: EvalOptions,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            additive: false,
            channels: ExtractChannels::default(),
            bone: None,
            mode: ExtractMode::Auto,
            evaluation: EvalOptions::default(),
        }
    }
}

impl BakeConfig {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Default::default()
        }
    }

    pub fn with_additive(mut self, additive: bool) -> Self {
        self.additive = additive;
        self
    }

    pub fn with_channels(mut self, channels: ExtractChannels) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_bone(mut self, bone: impl Into<String>) -> Self {
        self.bone = Some(bone.into());
        self
    }

    pub fn with_mode(mut self, mode: ExtractMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_evaluation(mut self, evaluation: EvalOptions) -> Self {
        self.evaluation = evaluation;
        self
    }

    /// Seconds between two samples.
    #[inline]
    pub fn sample_interval(&self) -> f32 {
        1.0 / self.sample_rate as f32
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(RootMotionError::invalid_config(
                "sample rate must be positive",
            ));
        }
        if matches!(self.bone.as_deref(), Some(b) if b.trim().is_empty()) {
            return Err(RootMotionError::invalid_config("bone name is empty"));
        }
        Ok(())
    }

    /// Concrete mode for `source`: never returns [`ExtractMode::Auto`].
    pub fn resolve_mode<S: AnimationSource + ?Sized>(&self, source: &S) -> ExtractMode {
        match self.mode {
            ExtractMode::Auto => match self.bone.as_deref() {
                None => ExtractMode::RootMotion,
                Some(bone) if Some(bone) == source.root_bone_name() => ExtractMode::RootMotion,
                Some(_) => ExtractMode::BonePose,
            },
            mode => mode,
        }
    }
}

/// Number of whole sample intervals covering `length` seconds.
fn interval_count(length: f32, rate: u32) -> usize {
    if length.is_nan() || length <= 0.0 {
        return 0;
    }
    (length * rate as f32 - SAMPLE_EPSILON).ceil().max(0.0) as usize
}

#[inline]
fn sample_time(index: usize, rate: u32, length: f32) -> f32 {
    (index as f32 / rate as f32).min(length)
}

/// Bake `source` under `config` into a fresh curve.
///
/// Nothing is returned on failure, so a caller holding a previous curve keeps it.
pub fn bake<S: AnimationSource + ?Sized>(source: &S, config: &BakeConfig) -> Result<TransformCurve> {
    config.validate()?;
    if source.bone_names().is_empty() {
        warn!("bake '{}': skeleton has no bones", source.name());
        return Err(RootMotionError::missing("reference skeleton"));
    }

    let curve = match config.resolve_mode(source) {
        ExtractMode::BonePose => {
            let bone = match config.bone.as_deref() {
                Some(bone) => bone,
                None => source
                    .root_bone_name()
                    .ok_or_else(|| RootMotionError::missing("root bone"))?,
            };
            if source.resolve_bone_index(bone).is_none() {
                error!("bake '{}': bone '{}' not found", source.name(), bone);
                return Err(RootMotionError::BoneNotFound {
                    bone: bone.to_string(),
                    animation: source.name().to_string(),
                });
            }
            bake_bone_pose(source, bone, config)?
        }
        _ => {
            if !config.additive && !source.has_root_motion() {
                error!(
                    "bake '{}': no root motion to accumulate, enable root motion or bake additive",
                    source.name()
                );
                return Err(RootMotionError::NoRootMotion {
                    animation: source.name().to_string(),
                });
            }
            bake_root_motion(source, config)
        }
    };
    if curve.is_empty() {
        error!(
            "bake '{}': play length {} gives no samples at {} Hz",
            source.name(),
            source.play_length(),
            config.sample_rate
        );
        return Err(RootMotionError::EmptyCurve);
    }

    debug!(
        "baked '{}' at {} Hz: {} keys (additive: {})",
        source.name(),
        config.sample_rate,
        curve.key_count(),
        config.additive
    );
    Ok(curve)
}

fn bake_root_motion<S: AnimationSource + ?Sized>(source: &S, config: &BakeConfig) -> TransformCurve {
    let length = source.play_length();
    let rate = config.sample_rate;
    let interval = config.sample_interval();
    let mut curve = TransformCurve::new();
    let mut accumulated = Transform::identity();

    for i in 0..interval_count(length, rate) {
        let time = sample_time(i, rate, length);
        let delta = source.extract_root_motion(time, interval.min(length - time));
        let value = if config.additive {
            delta
        } else {
            accumulated = delta * accumulated;
            accumulated
        };
        curve.update_or_add_key(&config.channels.apply(&value), sample_time(i + 1, rate, length));
    }
    curve
}

fn bake_bone_pose<S: AnimationSource + ?Sized>(
    source: &S,
    bone: &str,
    config: &BakeConfig,
) -> Result<TransformCurve> {
    let length = source.play_length().max(0.0);
    let rate = config.sample_rate;
    let pose_at = |time: f32| {
        source
            .bone_pose(bone, time, &config.evaluation)
            .ok_or_else(|| RootMotionError::BoneNotFound {
                bone: bone.to_string(),
                animation: source.name().to_string(),
            })
    };

    let mut curve = TransformCurve::new();
    let mut previous = pose_at(0.0)?;
    for i in 0..=interval_count(length, rate) {
        let time = sample_time(i, rate, length);
        let current = pose_at(time)?;
        let value = if config.additive {
            current.relative_to(&previous)
        } else {
            current
        };
        curve.update_or_add_key(&config.channels.apply(&value), time);
        previous = current;
    }
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{UnitQuaternion, Vector3};
    use std::ops::Range;

    /// Root-only source with hand-written per-sample deltas at 10 Hz.
    struct Deltas {
        deltas: Vec<Transform>,
        root_motion: bool,
    }

    impl AnimationSource for Deltas {
        fn name(&self) -> &str {
            "deltas"
        }
        fn play_length(&self) -> f32 {
            self.deltas.len() as f32 / 10.0
        }
        fn has_root_motion(&self) -> bool {
            self.root_motion
        }
        fn extract_root_motion(&self, time: f32, _delta_time: f32) -> Transform {
            let i = (time * 10.0).round() as usize;
            self.deltas.get(i).copied().unwrap_or_default()
        }
        fn bone_pose(&self, bone: &str, _time: f32, _options: &EvalOptions) -> Option<Transform> {
            (bone == "root").then(Transform::identity)
        }
        fn native_frame_interval(&self) -> f32 {
            0.1
        }
        fn native_key_count(&self) -> usize {
            self.deltas.len() + 1
        }
        fn resolve_bone_index(&self, bone: &str) -> Option<usize> {
            (bone == "root").then_some(0)
        }
        fn root_bone_name(&self) -> Option<&str> {
            Some("root")
        }
        fn bone_names(&self) -> Vec<String> {
            vec!["root".into()]
        }
        fn set_bone_track_keys(
            &mut self,
            _bone: &str,
            _keys: Range<usize>,
            _translations: &[Vector3<f32>],
            _rotations: &[UnitQuaternion<f32>],
            _scales: &[Vector3<f32>],
        ) -> Result<()> {
            Ok(())
        }
    }

    fn step(x: f32, yaw_deg: f32) -> Transform {
        Transform::new(
            Vector3::new(x, 0.0, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, yaw_deg.to_radians()),
            Vector3::repeat(1.0),
        )
    }

    #[test]
    fn accumulation_applies_delta_before_accumulated() {
        let (d0, d1, d2) = (step(1.0, 90.0), step(2.0, 0.0), step(0.0, 45.0));
        let source = Deltas {
            deltas: vec![d0, d1, d2],
            root_motion: true,
        };
        let config = BakeConfig::new(10).with_channels(ExtractChannels::ALL);
        let curve = bake(&source, &config).unwrap();
        assert_eq!(curve.key_count(), 3);

        let expected = d2 * (d1 * d0);
        let baked = curve.evaluate(0.3, 1.0);
        assert!(baked.approx_eq(&expected, 1e-4));
        assert!(!baked.approx_eq(&(d0 * d1 * d2), 1e-3));
    }

    #[test]
    fn additive_root_motion_keys_raw_deltas_at_interval_end() {
        let source = Deltas {
            deltas: vec![step(1.0, 0.0), step(3.0, 0.0)],
            root_motion: false,
        };
        let curve = bake(&source, &BakeConfig::new(10).with_additive(true)).unwrap();
        let times: Vec<f32> = curve.translation.x.keys().iter().map(|k| k.time).collect();
        assert_eq!(times.len(), 2);
        assert!((times[0] - 0.1).abs() < 1e-6);
        assert!((times[1] - 0.2).abs() < 1e-6);
        assert_eq!(curve.translation.x.keys()[1].value, 3.0);
    }

    #[test]
    fn missing_root_motion_fails_when_accumulating() {
        let source = Deltas {
            deltas: vec![step(1.0, 0.0)],
            root_motion: false,
        };
        let err = bake(&source, &BakeConfig::default()).unwrap_err();
        assert!(matches!(err, RootMotionError::NoRootMotion { .. }));
    }

    #[test]
    fn mode_resolution() {
        let source = Deltas {
            deltas: vec![],
            root_motion: true,
        };
        let config = BakeConfig::default();
        assert_eq!(config.resolve_mode(&source), ExtractMode::RootMotion);
        assert_eq!(
            config.clone().with_bone("root").resolve_mode(&source),
            ExtractMode::RootMotion
        );
        assert_eq!(
            config.clone().with_bone("Hips").resolve_mode(&source),
            ExtractMode::BonePose
        );
        assert_eq!(
            config.with_mode(ExtractMode::BonePose).resolve_mode(&source),
            ExtractMode::BonePose
        );
    }

    #[test]
    fn unknown_bone_is_reported() {
        let source = Deltas {
            deltas: vec![step(1.0, 0.0)],
            root_motion: true,
        };
        let err = bake(&source, &BakeConfig::default().with_bone("Hips")).unwrap_err();
        assert_eq!(
            err,
            RootMotionError::BoneNotFound {
                bone: "Hips".into(),
                animation: "deltas".into()
            }
        );
    }

    #[test]
    fn config_validation() {
        assert!(BakeConfig::new(0).validate().is_err());
        assert!(BakeConfig::default().with_bone(" ").validate().is_err());
        assert!(BakeConfig::default().validate().is_ok());
    }

    #[test]
    fn interval_counting() {
        assert_eq!(interval_count(2.0, 30), 60);
        assert_eq!(interval_count(0.0, 30), 0);
        assert_eq!(interval_count(1.05, 10), 11);
        assert_eq!(interval_count(0.3, 10), 3);
    }

    #[test]
    fn zero_length_bake_is_an_error() {
        let source = Deltas {
            deltas: Vec::new(),
            root_motion: true,
        };
        assert_eq!(
            bake(&source, &BakeConfig::default()).unwrap_err(),
            RootMotionError::EmptyCurve
        );
        // A bone pose bake still keys the single frame at 0.
        let pose = bake(&source, &BakeConfig::default().with_mode(ExtractMode::BonePose)).unwrap();
        assert_eq!(pose.key_count(), 1);
    }
}
