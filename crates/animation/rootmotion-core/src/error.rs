//! Error types for baking, editing and write-back.

use serde::{Deserialize, Serialize};

/// Everything that can stop a bake, a curve edit or a write-back.
///
/// None of these leave partial state behind: the caller's previous curve and the
/// target track are untouched whenever one of them is returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RootMotionError {
    /// No animation, no skeleton, or an empty reference skeleton.
    #[error("Missing input: {what}")]
    MissingInput { what: String },

    /// A non-additive root motion bake was requested on a clip without root motion.
    #[error("Animation '{animation}' has no root motion")]
    NoRootMotion { animation: String },

    /// Bone name does not resolve on the source skeleton.
    #[error("Bone '{bone}' not found in '{animation}'")]
    BoneNotFound { bone: String, animation: String },

    /// Write-back needs at least two native keys.
    #[error("Animation has {count} native keys, at least 2 are required")]
    NotEnoughKeys { count: usize },

    /// Key arrays submitted to a track mutation disagree with the key range.
    #[error("Track key count mismatch: expected {expected}, got {actual}")]
    TrackLengthMismatch { expected: usize, actual: usize },

    /// Operation needs a populated curve.
    #[error("No curve data loaded")]
    EmptyCurve,

    /// Key index out of range on a scalar curve.
    #[error("Key index {index} out of range ({len} keys)")]
    InvalidKey { index: usize, len: usize },

    /// Another key already sits at this time.
    #[error("A key already exists at time {time}")]
    KeyTimeOccupied { time: f32 },

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The user declined a destructive action.
    #[error("Declined by user: {action}")]
    Declined { action: String },

    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl RootMotionError {
    pub(crate) fn missing(what: impl Into<String>) -> Self {
        Self::MissingInput { what: what.into() }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Missing-input errors are soft failures: the host logs a warning and moves on.
    #[inline]
    pub fn is_missing_input(&self) -> bool {
        matches!(self, Self::MissingInput { .. })
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingInput { .. } => "input",
            Self::NoRootMotion { .. }
            | Self::BoneNotFound { .. }
            | Self::NotEnoughKeys { .. }
            | Self::TrackLengthMismatch { .. } => "precondition",
            Self::EmptyCurve | Self::InvalidKey { .. } | Self::KeyTimeOccupied { .. } => "curve",
            Self::InvalidConfig { .. } => "config",
            Self::Declined { .. } => "confirmation",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for RootMotionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
