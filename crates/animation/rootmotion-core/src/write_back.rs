//! Write an edited curve back into a bone track, resampled at the source's native rate.

use log::{error, info, warn};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::curve::TransformCurve;
use crate::error::RootMotionError;
use crate::source::AnimationSource;
use crate::Result;

/// Which bone receives the curve when none is named.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveBonePolicy {
    /// The skeleton's designated root bone.
    #[default]
    RootBone,
    /// Whatever bone comes first in skeleton order.
    FirstBone,
}

/// Curve values at native key times, ready for [`AnimationSource::set_bone_track_keys`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResampledTrack {
    pub times: Vec<f32>,
    pub translations: Vec<Vector3<f32>>,
    pub rotations: Vec<UnitQuaternion<f32>>,
    pub scales: Vec<Vector3<f32>>,
}

impl ResampledTrack {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Evaluate `curve` at `k * interval` for `k` in `0..count`, full weight.
pub fn resample(curve: &TransformCurve, count: usize, interval: f32) -> ResampledTrack {
    let mut track = ResampledTrack {
        times: Vec::with_capacity(count),
        translations: Vec::with_capacity(count),
        rotations: Vec::with_capacity(count),
        scales: Vec::with_capacity(count),
    };
    for k in 0..count {
        let time = k as f32 * interval;
        let value = curve.evaluate(time, 1.0);
        track.times.push(time);
        track.translations.push(value.translation);
        track.rotations.push(value.rotation);
        track.scales.push(value.scale);
    }
    track
}

/// Summary of a successful write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WriteReport {
    pub bone: String,
    pub key_count: usize,
    pub frame_interval: f32,
}

/// Resolve the bone a write targets: `bone` if given, else per `policy`.
pub fn target_bone<S: AnimationSource + ?Sized>(
    source: &S,
    bone: Option<&str>,
    policy: SaveBonePolicy,
) -> Result<String> {
    let name = match bone {
        Some(bone) => bone.to_string(),
        None => match policy {
            SaveBonePolicy::RootBone => source.root_bone_name().map(str::to_string),
            SaveBonePolicy::FirstBone => source.bone_names().into_iter().next(),
        }
        .ok_or_else(|| RootMotionError::missing("reference skeleton"))?,
    };
    if source.resolve_bone_index(&name).is_none() {
        error!("write-back '{}': bone '{}' not found", source.name(), name);
        return Err(RootMotionError::BoneNotFound {
            bone: name,
            animation: source.name().to_string(),
        });
    }
    Ok(name)
}

/// Skeleton and key-count checks shared by every write path. Returns the native key count.
pub(crate) fn check_target<S: AnimationSource + ?Sized>(source: &S) -> Result<usize> {
    if source.bone_names().is_empty() {
        warn!("write-back '{}': skeleton has no bones", source.name());
        return Err(RootMotionError::missing("reference skeleton"));
    }
    let count = source.native_key_count();
    if count <= 1 {
        error!(
            "write-back '{}': {} native keys, nothing to resample",
            source.name(),
            count
        );
        return Err(RootMotionError::NotEnoughKeys { count });
    }
    Ok(count)
}

/// Overwrite every native key of the target bone with `curve` resampled at the
/// source's frame interval.
///
/// All keys are submitted as one batch inside a begin/end bracket. On error the
/// track is left as it was.
pub fn write_back<S: AnimationSource + ?Sized>(
    curve: &TransformCurve,
    source: &mut S,
    bone: Option<&str>,
    policy: SaveBonePolicy,
) -> Result<WriteReport> {
    if curve.is_empty() {
        return Err(RootMotionError::EmptyCurve);
    }
    let count = check_target(&*source)?;
    let bone = target_bone(source, bone, policy)?;

    let interval = source.native_frame_interval();
    let track = resample(curve, count, interval);

    source.begin_bracket();
    let result = source.set_bone_track_keys(
        &bone,
        0..count,
        &track.translations,
        &track.rotations,
        &track.scales,
    );
    source.end_bracket();
    result?;

    info!(
        "wrote {} keys to '{}' on '{}'",
        count,
        bone,
        source.name()
    );
    Ok(WriteReport {
        bone,
        key_count: count,
        frame_interval: interval,
    })
}
