//! Animation source contract consumed by the baker, the writer and the preview.
//!
//! Hosts implement [`AnimationSource`] over their own animation assets; the crate
//! ships [`crate::clip::SkeletalClip`] as an in-memory implementation.

use std::ops::Range;

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::transform::Transform;
use crate::Result;

/// Space a bone pose is reported in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoseSpace {
    /// Composed through the parent chain up to the skeleton root.
    #[default]
    World,
    /// Relative to the parent bone.
    Local,
}

/// Pose evaluation options passed to [`AnimationSource::bone_pose`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    pub space: PoseSpace,
    /// When false the root bone is held at its first-frame pose.
    pub include_root_motion: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            space: PoseSpace::World,
            include_root_motion: true,
        }
    }
}

pub trait AnimationSource {
    /// Display name used in log records and errors.
    fn name(&self) -> &str;

    /// Length in seconds.
    fn play_length(&self) -> f32;

    fn has_root_motion(&self) -> bool;

    /// Root displacement accumulated over `[time, time + delta_time)`.
    ///
    /// The result `d` satisfies `d * root(time) == root(time + delta_time)`.
    /// Identity when the source has no root motion.
    fn extract_root_motion(&self, time: f32, delta_time: f32) -> Transform;

    /// Root displacement between two absolute times.
    fn extract_root_motion_from_range(&self, start: f32, end: f32) -> Transform {
        self.extract_root_motion(start, end - start)
    }

    /// Pose of `bone` at `time`, or `None` when the bone does not resolve.
    fn bone_pose(&self, bone: &str, time: f32, options: &EvalOptions) -> Option<Transform>;

    /// Seconds between two native keys.
    fn native_frame_interval(&self) -> f32;

    fn native_key_count(&self) -> usize;

    fn resolve_bone_index(&self, bone: &str) -> Option<usize>;

    /// Designated root bone; `None` on an empty skeleton.
    fn root_bone_name(&self) -> Option<&str>;

    /// Bone names in skeleton order.
    fn bone_names(&self) -> Vec<String>;

    /// Open a grouped mutation. Nested brackets are allowed.
    fn begin_bracket(&mut self) {}

    fn end_bracket(&mut self) {}

    /// Overwrite the keys `keys` of `bone`'s track.
    ///
    /// All three arrays must hold exactly `keys.len()` entries. Implementations
    /// validate the whole batch before touching the track.
    fn set_bone_track_keys(
        &mut self,
        bone: &str,
        keys: Range<usize>,
        translations: &[Vector3<f32>],
        rotations: &[UnitQuaternion<f32>],
        scales: &[Vector3<f32>],
    ) -> Result<()>;
}
