//! Root motion core (engine-agnostic)
//!
//! Bakes root motion or a bone's pose from an [`AnimationSource`] into an editable
//! [`TransformCurve`], evaluates that curve for preview, and writes it back into the
//! source's keyframe track at the native frame rate. Hosts plug in their animation
//! assets through [`AnimationSource`]; [`SkeletalClip`] is a JSON-backed implementation.
//!
//! Transforms compose child-in-parent: `a * b` applies `a` first, then `b`.

pub mod bake;
pub mod channels;
pub mod clip;
pub mod config;
pub mod curve;
pub mod error;
pub mod external;
pub mod interp;
pub mod preview;
pub mod session;
pub mod source;
pub mod transform;
pub mod write_back;

// Re-exports for hosts
pub use bake::{bake, BakeConfig, ExtractMode, DEFAULT_SAMPLE_RATE};
pub use channels::ExtractChannels;
pub use clip::{BoneDef, SkeletalClip, TrackKey};
pub use config::EditorConfig;
pub use curve::{
    Axis, CurveChannel, CurveId, KeyInterp, RichCurve, RichKey, TransformCurve, VectorCurve,
};
pub use error::RootMotionError;
pub use external::{CurveVectorAsset, ExternalCurveSet};
pub use preview::{root_motion_transform, trajectory, PlaybackDriver, ViewMode};
pub use session::{
    AlwaysConfirm, Confirm, ConfirmRequest, EditSession, NeverConfirm, SessionState,
};
pub use source::{AnimationSource, EvalOptions, PoseSpace};
pub use transform::Transform;
pub use write_back::{resample, write_back, ResampledTrack, SaveBonePolicy, WriteReport};

/// Crate-wide result type.
pub type Result<T> = core::result::Result<T, RootMotionError>;
