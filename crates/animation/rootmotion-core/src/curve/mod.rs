//! Curve data model: scalar rich curves grouped into vector and transform curves.
//!
//! A [`TransformCurve`] is nine independently keyed scalar curves, addressed by
//! [`CurveId`] (`Translation.X` .. `Scale.Z`) for editor integration.

pub mod rich;
pub mod transform_curve;
pub mod vector;

use serde::{Deserialize, Serialize};

pub use rich::{KeyInterp, RichCurve, RichKey, KEY_TIME_TOLERANCE};
pub use transform_curve::TransformCurve;
pub use vector::VectorCurve;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn suffix(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }

    /// Display colour (linear RGBA): red, green, blue.
    pub fn color(self) -> [f32; 4] {
        match self {
            Axis::X => [1.0, 0.0, 0.0, 1.0],
            Axis::Y => [0.0, 1.0, 0.0, 1.0],
            Axis::Z => [0.0, 0.0, 1.0, 1.0],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveChannel {
    Translation,
    /// Euler angles in degrees (x = roll, y = pitch, z = yaw).
    Rotation,
    Scale,
}

impl CurveChannel {
    pub const ALL: [CurveChannel; 3] = [
        CurveChannel::Translation,
        CurveChannel::Rotation,
        CurveChannel::Scale,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CurveChannel::Translation => "Translation",
            CurveChannel::Rotation => "Rotation",
            CurveChannel::Scale => "Scale",
        }
    }
}

/// One of the nine scalar curves of a [`TransformCurve`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurveId {
    pub channel: CurveChannel,
    pub axis: Axis,
}

impl CurveId {
    pub const fn new(channel: CurveChannel, axis: Axis) -> Self {
        Self { channel, axis }
    }

    /// All nine ids, channel-major.
    pub fn all() -> impl Iterator<Item = CurveId> {
        CurveChannel::ALL
            .into_iter()
            .flat_map(|c| Axis::ALL.into_iter().map(move |a| CurveId::new(c, a)))
    }

    /// Full display name, e.g. `Rotation.Z`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.channel.name(), self.axis.suffix())
    }

    pub fn color(&self) -> [f32; 4] {
        self.axis.color()
    }

    /// Parse a display name produced by [`CurveId::name`].
    pub fn parse(name: &str) -> Option<CurveId> {
        let (channel, axis) = name.split_once('.')?;
        let channel = CurveChannel::ALL.into_iter().find(|c| c.name() == channel)?;
        let axis = Axis::ALL.into_iter().find(|a| a.suffix() == axis)?;
        Some(CurveId::new(channel, axis))
    }
}
