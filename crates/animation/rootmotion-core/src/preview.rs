//! Preview playback: transport state plus the per-tick root motion query.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PREVIEW_STEP;
use crate::curve::TransformCurve;
use crate::source::AnimationSource;
use crate::transform::Transform;

/// Where the previewed root transform comes from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    /// Nothing is driven; always identity.
    #[default]
    None,
    /// The animation's own root motion accumulated from time zero.
    FromAnimationAsset,
    /// The edited curve.
    FromEditedCurve,
}

/// Root transform at `time` for `mode`.
///
/// Missing sources fall back to identity so the preview keeps ticking.
pub fn root_motion_transform<S: AnimationSource + ?Sized>(
    mode: ViewMode,
    time: f32,
    source: Option<&S>,
    curve: &TransformCurve,
) -> Transform {
    match mode {
        ViewMode::None => Transform::identity(),
        ViewMode::FromAnimationAsset => source
            .map(|s| s.extract_root_motion_from_range(0.0, time))
            .unwrap_or_default(),
        ViewMode::FromEditedCurve => curve.evaluate(time, 1.0),
    }
}

/// `samples` evenly spaced `(time, transform)` pairs over `[0, length]`.
pub fn trajectory<S: AnimationSource + ?Sized>(
    mode: ViewMode,
    samples: usize,
    length: f32,
    source: Option<&S>,
    curve: &TransformCurve,
) -> Vec<(f32, Transform)> {
    match samples {
        0 => Vec::new(),
        1 => vec![(0.0, root_motion_transform(mode, 0.0, source, curve))],
        n => {
            let span = length.max(0.0);
            (0..n)
                .map(|i| {
                    let time = span * i as f32 / (n - 1) as f32;
                    (time, root_motion_transform(mode, time, source, curve))
                })
                .collect()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaybackDriver {
    play_time: f32,
    /// Playback speed; negative plays backwards, zero is paused.
    multiplier: f32,
    step: f32,
    max_length: f32,
    pub view_mode: ViewMode,
}

impl Default for PlaybackDriver {
    fn default() -> Self {
        Self {
            play_time: 0.0,
            multiplier: 0.0,
            step: DEFAULT_PREVIEW_STEP,
            max_length: 0.0,
            view_mode: ViewMode::None,
        }
    }
}

impl PlaybackDriver {
    pub fn new(max_length: f32, step: f32) -> Self {
        Self {
            max_length: max_length.max(0.0),
            step,
            ..Default::default()
        }
    }

    pub fn play_time(&self) -> f32 {
        self.play_time
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn max_length(&self) -> f32 {
        self.max_length
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn is_playing(&self) -> bool {
        self.multiplier != 0.0
    }

    /// New preview length; the play time is re-clamped.
    pub fn set_max_length(&mut self, max_length: f32) {
        self.max_length = max_length.max(0.0);
        self.play_time = self.clamp(self.play_time);
    }

    /// Jump to `time`. Unless `keep_ticking`, playback pauses.
    pub fn set_play_time(&mut self, time: f32, keep_ticking: bool) {
        self.play_time = self.clamp(time);
        if !keep_ticking {
            self.multiplier = 0.0;
        }
    }

    /// Advance by `delta_time * multiplier`, clamped to `[0, max_length]`.
    pub fn tick(&mut self, delta_time: f32) {
        if self.multiplier != 0.0 {
            self.play_time = self.clamp(self.play_time + delta_time * self.multiplier);
        }
    }

    pub fn backward_end(&mut self) {
        self.set_play_time(0.0, false);
    }

    pub fn backward_step(&mut self) {
        self.set_play_time(self.play_time - self.step, false);
    }

    pub fn backward(&mut self) {
        self.multiplier = -1.0;
    }

    pub fn pause(&mut self) {
        self.multiplier = 0.0;
    }

    pub fn forward(&mut self) {
        self.multiplier = 1.0;
    }

    pub fn forward_step(&mut self) {
        self.set_play_time(self.play_time + self.step, false);
    }

    pub fn forward_end(&mut self) {
        self.set_play_time(self.max_length, false);
    }

    /// Root transform at the current play time under the active view mode.
    pub fn root_motion_transform<S: AnimationSource + ?Sized>(
        &self,
        source: Option<&S>,
        curve: &TransformCurve,
    ) -> Transform {
        root_motion_transform(self.view_mode, self.play_time, source, curve)
    }

    /// NaN keeps the current time.
    fn clamp(&self, time: f32) -> f32 {
        if time.is_nan() {
            return self.play_time;
        }
        time.clamp(0.0, self.max_length)
    }
}
