//! Editing session: the single owner of the live curve.
//!
//! ```text
//! Empty --load--> Loaded --edit--> Edited --write back / save--> Loaded
//!   ^                                  |
//!   +-------------- clear -------------+
//! ```
//! Loading over unsaved edits asks [`Confirm`] first; writing into an animation
//! always asks before overriding bone data. Declining or failing leaves the session
//! exactly as it was.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::bake::{bake, BakeConfig};
use crate::curve::TransformCurve;
use crate::error::RootMotionError;
use crate::external::ExternalCurveSet;
use crate::source::AnimationSource;
use crate::transform::Transform;
use crate::write_back::{check_target, target_bone, write_back, SaveBonePolicy, WriteReport};
use crate::Result;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Empty,
    Loaded,
    /// The curve holds changes not yet written or saved.
    Edited,
}

/// A destructive action waiting for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmRequest {
    /// Replacing a curve that has unsaved edits.
    DiscardEdits,
    /// Overwriting the keys of `bone` in `animation`.
    OverrideBoneData { animation: String, bone: String },
}

impl ConfirmRequest {
    fn action(&self) -> String {
        match self {
            ConfirmRequest::DiscardEdits => "discard unsaved edits".to_string(),
            ConfirmRequest::OverrideBoneData { animation, bone } => {
                format!("override '{bone}' in '{animation}'")
            }
        }
    }
}

pub trait Confirm {
    fn confirm(&mut self, request: &ConfirmRequest) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&ConfirmRequest) -> bool,
{
    fn confirm(&mut self, request: &ConfirmRequest) -> bool {
        self(request)
    }
}

/// Accepts every request.
#[derive(Copy, Clone, Debug, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _request: &ConfirmRequest) -> bool {
        true
    }
}

/// Declines every request.
#[derive(Copy, Clone, Debug, Default)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&mut self, _request: &ConfirmRequest) -> bool {
        false
    }
}

fn ask<C: Confirm + ?Sized>(confirm: &mut C, request: ConfirmRequest) -> Result<()> {
    if confirm.confirm(&request) {
        Ok(())
    } else {
        info!("declined: {}", request.action());
        Err(RootMotionError::Declined {
            action: request.action(),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct EditSession {
    curve: TransformCurve,
    state: SessionState,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session adopting a curve supplied by the caller.
    pub fn with_curve(curve: TransformCurve) -> Self {
        let state = if curve.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Loaded
        };
        Self { curve, state }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn has_unsaved_edits(&self) -> bool {
        self.state == SessionState::Edited
    }

    #[inline]
    pub fn curve(&self) -> &TransformCurve {
        &self.curve
    }

    pub fn into_curve(self) -> TransformCurve {
        self.curve
    }

    /// Evaluate the live curve.
    pub fn evaluate(&self, time: f32, weight: f32) -> Transform {
        self.curve.evaluate(time, weight)
    }

    /// Mutate the curve; the session becomes `Edited` unless it is still empty.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut TransformCurve) -> R) -> R {
        let out = f(&mut self.curve);
        if !(self.state == SessionState::Empty && self.curve.is_empty()) {
            self.state = SessionState::Edited;
        }
        out
    }

    pub fn clear(&mut self) {
        self.curve.reset();
        self.state = SessionState::Empty;
    }

    /// Bake `source` and make the result the live curve.
    ///
    /// The bake runs before the discard prompt, so a failing bake never asks and
    /// never touches the current curve.
    pub fn load_from_bake<S, C>(
        &mut self,
        source: Option<&S>,
        config: &BakeConfig,
        confirm: &mut C,
    ) -> Result<()>
    where
        S: AnimationSource + ?Sized,
        C: Confirm + ?Sized,
    {
        let Some(source) = source else {
            warn!("load: no animation selected");
            return Err(RootMotionError::missing("animation"));
        };
        let baked = bake(source, config)?;
        self.replace(baked, confirm)
    }

    /// Copy the external assets into the live curve.
    pub fn load_from_external<C: Confirm + ?Sized>(
        &mut self,
        set: &ExternalCurveSet,
        confirm: &mut C,
    ) -> Result<()> {
        check_curve_set(set)?;
        let mut loaded = TransformCurve::new();
        set.load_into(&mut loaded);
        self.replace(loaded, confirm)
    }

    /// Copy the live curve into the external assets.
    ///
    /// Edits count as saved only when every keyed channel has a slot in `set`.
    pub fn save_to_external(&mut self, set: &mut ExternalCurveSet) -> Result<()> {
        if self.state == SessionState::Empty {
            return Err(RootMotionError::EmptyCurve);
        }
        check_curve_set(set)?;
        set.save_from(&self.curve);
        if set.covers(&self.curve) {
            self.state = SessionState::Loaded;
        } else if self.has_unsaved_edits() {
            warn!("saved a partial curve set, channels without an asset keep their edits");
        }
        Ok(())
    }

    /// Write the live curve into `bone` (or the policy's default) of `source`.
    pub fn write_back<S, C>(
        &mut self,
        source: Option<&mut S>,
        bone: Option<&str>,
        policy: SaveBonePolicy,
        confirm: &mut C,
    ) -> Result<WriteReport>
    where
        S: AnimationSource + ?Sized,
        C: Confirm + ?Sized,
    {
        if self.state == SessionState::Empty {
            return Err(RootMotionError::EmptyCurve);
        }
        let Some(source) = source else {
            warn!("write-back: no animation selected");
            return Err(RootMotionError::missing("animation"));
        };
        check_target(&*source)?;
        let target = target_bone(&*source, bone, policy)?;
        ask(
            confirm,
            ConfirmRequest::OverrideBoneData {
                animation: source.name().to_string(),
                bone: target.clone(),
            },
        )?;
        let report = write_back(&self.curve, source, Some(&target), policy)?;
        self.state = SessionState::Loaded;
        Ok(report)
    }

    fn replace<C: Confirm + ?Sized>(
        &mut self,
        curve: TransformCurve,
        confirm: &mut C,
    ) -> Result<()> {
        if curve.is_empty() {
            warn!("load produced no keys, keeping the current curve");
            return Err(RootMotionError::EmptyCurve);
        }
        if self.has_unsaved_edits() {
            ask(confirm, ConfirmRequest::DiscardEdits)?;
        }
        self.curve = curve;
        self.state = SessionState::Loaded;
        Ok(())
    }
}

fn check_curve_set(set: &ExternalCurveSet) -> Result<()> {
    if !set.has_any_curve() {
        warn!("no curve asset selected");
        return Err(RootMotionError::missing("curve asset"));
    }
    if set.has_repeated_curve() {
        return Err(RootMotionError::invalid_config(
            "the same curve asset is assigned to more than one channel",
        ));
    }
    Ok(())
}
