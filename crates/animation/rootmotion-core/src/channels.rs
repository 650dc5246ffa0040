//! Channel mask selecting which parts of a transform survive extraction.

use std::ops::{BitOr, BitOrAssign};

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::transform::Transform;

/// Bit set over {Translation, Rotation, Scale}.
///
/// Serialized as the raw bitmask so configs stay compatible with host editors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct ExtractChannels(u32);

impl ExtractChannels {
    pub const NONE: Self = Self(0);
    pub const TRANSLATION: Self = Self(1 << 0);
    pub const ROTATION: Self = Self(1 << 1);
    pub const SCALE: Self = Self(1 << 2);
    pub const ALL: Self = Self(0b111);

    /// Unknown bits are dropped.
    #[inline]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Reset masked-out channels to their identity component.
    pub fn apply(self, value: &Transform) -> Transform {
        Transform {
            translation: if self.contains(Self::TRANSLATION) {
                value.translation
            } else {
                Vector3::zeros()
            },
            rotation: if self.contains(Self::ROTATION) {
                value.rotation
            } else {
                UnitQuaternion::identity()
            },
            scale: if self.contains(Self::SCALE) {
                value.scale
            } else {
                Vector3::repeat(1.0)
            },
        }
    }
}

impl Default for ExtractChannels {
    fn default() -> Self {
        Self::TRANSLATION
    }
}

impl From<u32> for ExtractChannels {
    fn from(bits: u32) -> Self {
        Self::from_bits_truncate(bits)
    }
}

impl From<ExtractChannels> for u32 {
    fn from(mask: ExtractChannels) -> Self {
        mask.0
    }
}

impl BitOr for ExtractChannels {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ExtractChannels {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
