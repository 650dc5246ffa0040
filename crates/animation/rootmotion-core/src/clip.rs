//! In-memory skeletal clip: a skeleton with sparse keyed bone tracks.
//!
//! JSON shape:
//! ```json
//! {
//!   "name": "walk",
//!   "frame_rate": 30.0,
//!   "num_keys": 61,
//!   "root_motion": true,
//!   "bones": [{ "name": "root", "parent": null, "ref_pose": { "translation": [0, 0, 0] } }],
//!   "tracks": { "root": [{ "frame": 0, "translation": [0, 0, 0] }] }
//! }
//! ```
//! Tracks are sparse: frames between keys are interpolated (lerp for translation and
//! scale, normalized lerp on the short arc for rotation) and frames outside the keyed
//! range hold the nearest key. A bone without a track stays at its reference pose.

use std::collections::BTreeMap;
use std::ops::Range;

use log::debug;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::RootMotionError;
use crate::source::{AnimationSource, EvalOptions, PoseSpace};
use crate::transform::{quat_to_xyzw, Transform};
use crate::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneDef {
    pub name: String,
    /// Index of the parent bone; parents precede their children.
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub ref_pose: Transform,
}

/// One local-space key on a bone track.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackKey {
    pub frame: usize,
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "identity_xyzw")]
    pub rotation: [f32; 4],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

fn identity_xyzw() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl TrackKey {
    pub fn new(frame: usize, value: &Transform) -> Self {
        Self {
            frame,
            translation: value.translation.into(),
            rotation: quat_to_xyzw(&value.rotation),
            scale: value.scale.into(),
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_arrays(self.translation, self.rotation, self.scale)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkeletalClip {
    pub name: String,
    /// Native keys per second.
    pub frame_rate: f32,
    /// Native key count; play length is `(num_keys - 1) / frame_rate`.
    pub num_keys: usize,
    /// Whether the root bone drives root motion.
    #[serde(default)]
    pub root_motion: bool,
    #[serde(default)]
    pub bones: Vec<BoneDef>,
    #[serde(default)]
    pub tracks: BTreeMap<String, Vec<TrackKey>>,
    #[serde(skip)]
    bracket_depth: usize,
    #[serde(skip)]
    revision: u64,
}

impl SkeletalClip {
    pub fn new(name: impl Into<String>, frame_rate: f32, num_keys: usize) -> Self {
        Self {
            name: name.into(),
            frame_rate,
            num_keys,
            root_motion: false,
            bones: Vec::new(),
            tracks: BTreeMap::new(),
            bracket_depth: 0,
            revision: 0,
        }
    }

    /// Parse and validate a clip from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut clip: SkeletalClip = serde_json::from_str(json)?;
        clip.validate()?;
        for keys in clip.tracks.values_mut() {
            keys.sort_by_key(|k| k.frame);
            keys.dedup_by_key(|k| k.frame);
        }
        Ok(clip)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(RootMotionError::invalid_config(format!(
                "clip '{}' frame_rate must be positive",
                self.name
            )));
        }
        if self.num_keys == 0 {
            return Err(RootMotionError::invalid_config(format!(
                "clip '{}' has no keys",
                self.name
            )));
        }
        for (index, bone) in self.bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                if parent >= index {
                    return Err(RootMotionError::invalid_config(format!(
                        "bone '{}' must come after its parent",
                        bone.name
                    )));
                }
            }
        }
        for (bone, keys) in &self.tracks {
            if self.resolve_bone_index(bone).is_none() {
                return Err(self.bone_not_found(bone));
            }
            if let Some(key) = keys.iter().find(|k| k.frame >= self.num_keys) {
                return Err(RootMotionError::invalid_config(format!(
                    "track '{bone}' keys frame {} past {} keys",
                    key.frame, self.num_keys
                )));
            }
        }
        Ok(())
    }

    /// Append a bone. The parent must already exist.
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        parent: Option<&str>,
        ref_pose: Transform,
    ) -> Result<usize> {
        let parent = match parent {
            Some(p) => Some(self.resolve_bone_index(p).ok_or_else(|| self.bone_not_found(p))?),
            None => None,
        };
        self.bones.push(BoneDef {
            name: name.into(),
            parent,
            ref_pose,
        });
        Ok(self.bones.len() - 1)
    }

    /// Insert or replace the local key of `bone` at `frame`.
    pub fn set_key(&mut self, bone: &str, frame: usize, value: &Transform) -> Result<()> {
        if self.resolve_bone_index(bone).is_none() {
            return Err(self.bone_not_found(bone));
        }
        if frame >= self.num_keys {
            return Err(RootMotionError::InvalidKey {
                index: frame,
                len: self.num_keys,
            });
        }
        let key = TrackKey::new(frame, value);
        let track = self.tracks.entry(bone.to_string()).or_default();
        match track.binary_search_by_key(&frame, |k| k.frame) {
            Ok(at) => track[at] = key,
            Err(at) => track.insert(at, key),
        }
        Ok(())
    }

    /// Number of currently open mutation brackets.
    pub fn bracket_depth(&self) -> usize {
        self.bracket_depth
    }

    /// Bumped on every successful track mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Local pose of bone `index` at a fractional native frame.
    fn local_pose(&self, index: usize, frame: f32) -> Transform {
        let bone = &self.bones[index];
        let Some(keys) = self.tracks.get(&bone.name).filter(|k| !k.is_empty()) else {
            return bone.ref_pose;
        };
        let right = keys.partition_point(|k| (k.frame as f32) <= frame);
        if right == 0 {
            return keys[0].transform();
        }
        if right == keys.len() {
            return keys[keys.len() - 1].transform();
        }
        let a = &keys[right - 1];
        let b = &keys[right];
        let alpha = (frame - a.frame as f32) / (b.frame - a.frame) as f32;
        blend_keys(&a.transform(), &b.transform(), alpha)
    }

    fn frame_at(&self, time: f32) -> f32 {
        let last = self.num_keys.saturating_sub(1) as f32;
        (time * self.frame_rate).clamp(0.0, last)
    }

    fn root_index(&self) -> Option<usize> {
        self.bones.iter().position(|b| b.parent.is_none())
    }

    fn bone_not_found(&self, bone: &str) -> RootMotionError {
        RootMotionError::BoneNotFound {
            bone: bone.to_string(),
            animation: self.name.clone(),
        }
    }
}

fn blend_keys(a: &Transform, b: &Transform, alpha: f32) -> Transform {
    let qa = a.rotation.into_inner();
    let mut qb = b.rotation.into_inner();
    if qa.dot(&qb) < 0.0 {
        qb = -qb;
    }
    Transform {
        translation: a.translation.lerp(&b.translation, alpha),
        rotation: UnitQuaternion::from_quaternion(qa.lerp(&qb, alpha)),
        scale: a.scale.lerp(&b.scale, alpha),
    }
}

impl AnimationSource for SkeletalClip {
    fn name(&self) -> &str {
        &self.name
    }

    fn play_length(&self) -> f32 {
        self.num_keys.saturating_sub(1) as f32 / self.frame_rate
    }

    fn has_root_motion(&self) -> bool {
        self.root_motion
    }

    fn extract_root_motion(&self, time: f32, delta_time: f32) -> Transform {
        let Some(root) = self.root_index().filter(|_| self.root_motion) else {
            return Transform::identity();
        };
        let from = self.local_pose(root, self.frame_at(time));
        let to = self.local_pose(root, self.frame_at(time + delta_time));
        to.relative_to(&from)
    }

    fn bone_pose(&self, bone: &str, time: f32, options: &EvalOptions) -> Option<Transform> {
        let index = self.resolve_bone_index(bone)?;
        let frame = self.frame_at(time);
        let pose_of = |i: usize| {
            if !options.include_root_motion && self.bones[i].parent.is_none() {
                self.local_pose(i, 0.0)
            } else {
                self.local_pose(i, frame)
            }
        };
        let mut pose = pose_of(index);
        if options.space == PoseSpace::World {
            let mut parent = self.bones[index].parent;
            while let Some(p) = parent {
                pose = pose * pose_of(p);
                parent = self.bones[p].parent;
            }
        }
        Some(pose)
    }

    fn native_frame_interval(&self) -> f32 {
        1.0 / self.frame_rate
    }

    fn native_key_count(&self) -> usize {
        self.num_keys
    }

    fn resolve_bone_index(&self, bone: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == bone)
    }

    fn root_bone_name(&self) -> Option<&str> {
        self.root_index().map(|i| self.bones[i].name.as_str())
    }

    fn bone_names(&self) -> Vec<String> {
        self.bones.iter().map(|b| b.name.clone()).collect()
    }

    fn begin_bracket(&mut self) {
        self.bracket_depth += 1;
    }

    fn end_bracket(&mut self) {
        self.bracket_depth = self.bracket_depth.saturating_sub(1);
    }

    fn set_bone_track_keys(
        &mut self,
        bone: &str,
        keys: Range<usize>,
        translations: &[Vector3<f32>],
        rotations: &[UnitQuaternion<f32>],
        scales: &[Vector3<f32>],
    ) -> Result<()> {
        if self.resolve_bone_index(bone).is_none() {
            return Err(self.bone_not_found(bone));
        }
        if keys.end > self.num_keys || keys.start > keys.end {
            return Err(RootMotionError::InvalidKey {
                index: keys.end,
                len: self.num_keys,
            });
        }
        let expected = keys.len();
        for actual in [translations.len(), rotations.len(), scales.len()] {
            if actual != expected {
                return Err(RootMotionError::TrackLengthMismatch { expected, actual });
            }
        }

        let track = self.tracks.entry(bone.to_string()).or_default();
        track.retain(|k| !keys.contains(&k.frame));
        track.extend(keys.clone().enumerate().map(|(i, frame)| TrackKey {
            frame,
            translation: translations[i].into(),
            rotation: quat_to_xyzw(&rotations[i]),
            scale: scales[i].into(),
        }));
        track.sort_by_key(|k| k.frame);
        self.revision += 1;
        debug!(
            "clip '{}': wrote {} keys on '{}' (revision {})",
            self.name, expected, bone, self.revision
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn chain() -> SkeletalClip {
        let mut clip = SkeletalClip::new("chain", 10.0, 11);
        clip.root_motion = true;
        clip.add_bone("root", None, Transform::identity()).unwrap();
        clip.add_bone(
            "child",
            Some("root"),
            Transform::from_translation(Vector3::new(0.0, 1.0, 0.0)),
        )
        .unwrap();
        clip.set_key("root", 0, &Transform::identity()).unwrap();
        clip.set_key(
            "root",
            10,
            &Transform::from_translation(Vector3::new(10.0, 0.0, 0.0)),
        )
        .unwrap();
        clip
    }

    #[test]
    fn play_length_from_key_count() {
        let clip = chain();
        assert_relative_eq!(clip.play_length(), 1.0);
        assert_relative_eq!(clip.native_frame_interval(), 0.1);
        assert_eq!(clip.root_bone_name(), Some("root"));
    }

    #[test]
    fn interpolates_between_sparse_keys() {
        let clip = chain();
        let pose = clip
            .bone_pose("root", 0.25, &EvalOptions::default())
            .unwrap();
        assert_relative_eq!(pose.translation.x, 2.5, epsilon = 1e-5);
        let past_end = clip.bone_pose("root", 5.0, &EvalOptions::default()).unwrap();
        assert_relative_eq!(past_end.translation.x, 10.0);
    }

    #[test]
    fn world_space_composes_parents() {
        let clip = chain();
        let world = clip.bone_pose("child", 0.5, &EvalOptions::default()).unwrap();
        assert_relative_eq!(world.translation, Vector3::new(5.0, 1.0, 0.0), epsilon = 1e-5);
        let local = clip
            .bone_pose(
                "child",
                0.5,
                &EvalOptions {
                    space: PoseSpace::Local,
                    ..EvalOptions::default()
                },
            )
            .unwrap();
        assert_relative_eq!(local.translation, Vector3::new(0.0, 1.0, 0.0));
        let locked = clip
            .bone_pose(
                "child",
                0.5,
                &EvalOptions {
                    include_root_motion: false,
                    ..EvalOptions::default()
                },
            )
            .unwrap();
        assert_relative_eq!(locked.translation, Vector3::new(0.0, 1.0, 0.0));
        assert!(clip.bone_pose("nope", 0.0, &EvalOptions::default()).is_none());
    }

    #[test]
    fn root_motion_delta_and_range() {
        let mut clip = chain();
        let d = clip.extract_root_motion(0.2, 0.3);
        assert_relative_eq!(d.translation.x, 3.0, epsilon = 1e-5);
        let r = clip.extract_root_motion_from_range(0.0, 1.0);
        assert_relative_eq!(r.translation.x, 10.0, epsilon = 1e-5);
        clip.root_motion = false;
        assert!(clip.extract_root_motion(0.0, 1.0).is_identity(1e-6));
    }

    #[test]
    fn track_write_validates_before_mutating() {
        let mut clip = chain();
        let before = clip.clone();
        let t = vec![Vector3::zeros(); 3];
        let r = vec![UnitQuaternion::identity(); 2];
        let s = vec![Vector3::repeat(1.0); 3];
        let err = clip.set_bone_track_keys("root", 0..3, &t, &r, &s).unwrap_err();
        assert_eq!(
            err,
            RootMotionError::TrackLengthMismatch {
                expected: 3,
                actual: 2
            }
        );
        let r3 = vec![UnitQuaternion::identity(); 3];
        assert!(matches!(
            clip.set_bone_track_keys("ghost", 0..3, &t, &r3, &s),
            Err(RootMotionError::BoneNotFound { .. })
        ));
        assert_eq!(clip, before);
        assert_eq!(clip.revision(), 0);
    }

    #[test]
    fn track_write_replaces_range() {
        let mut clip = chain();
        let t: Vec<_> = (0..11).map(|i| Vector3::new(0.0, 0.0, i as f32)).collect();
        let r = vec![UnitQuaternion::identity(); 11];
        let s = vec![Vector3::repeat(1.0); 11];
        clip.set_bone_track_keys("root", 0..11, &t, &r, &s).unwrap();
        assert_eq!(clip.tracks["root"].len(), 11);
        assert_eq!(clip.revision(), 1);
        let pose = clip.bone_pose("root", 0.7, &EvalOptions::default()).unwrap();
        assert_relative_eq!(pose.translation, Vector3::new(0.0, 0.0, 7.0), epsilon = 1e-5);
    }

    #[test]
    fn json_roundtrip_and_validation() {
        let clip = chain();
        let back = SkeletalClip::from_json(&clip.to_json().unwrap()).unwrap();
        assert_eq!(back, clip);

        let bad = serde_json::json!({
            "name": "bad", "frame_rate": 30.0, "num_keys": 2,
            "bones": [{ "name": "a", "parent": 1 }, { "name": "b" }]
        });
        assert!(matches!(
            SkeletalClip::from_json(&bad.to_string()),
            Err(RootMotionError::InvalidConfig { .. })
        ));
        assert!(matches!(
            SkeletalClip::from_json("{"),
            Err(RootMotionError::Serialization { .. })
        ));
    }
}
