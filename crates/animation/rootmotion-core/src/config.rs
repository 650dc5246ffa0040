//! Editor configuration: every user-facing option of the load, save and preview panels.

use serde::{Deserialize, Serialize};

use crate::bake::{BakeConfig, ExtractMode, DEFAULT_SAMPLE_RATE};
use crate::channels::ExtractChannels;
use crate::error::RootMotionError;
use crate::source::EvalOptions;
use crate::write_back::SaveBonePolicy;
use crate::Result;

/// Default preview step, one frame at 30 Hz.
pub const DEFAULT_PREVIEW_STEP: f32 = 1.0 / 30.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub extract_mode: ExtractMode,
    /// Bone sampled in bone-pose mode; `None` means the skeleton root.
    pub custom_load_bone: Option<String>,
    pub extract_channels: ExtractChannels,
    pub sample_rate: u32,
    pub additive: bool,
    pub evaluation: EvalOptions,
    /// Bone written on save; `None` defers to `default_save_bone`.
    pub custom_save_bone: Option<String>,
    pub default_save_bone: SaveBonePolicy,
    /// Seconds moved by a single transport step.
    pub preview_step: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            extract_mode: ExtractMode::Auto,
            custom_load_bone: None,
            extract_channels: ExtractChannels::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            additive: false,
            evaluation: EvalOptions::default(),
            custom_save_bone: None,
            default_save_bone: SaveBonePolicy::default(),
            preview_step: DEFAULT_PREVIEW_STEP,
        }
    }
}

impl EditorConfig {
    /// Parse and validate; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(RootMotionError::invalid_config(
                "sample_rate must be positive",
            ));
        }
        if !(self.preview_step.is_finite() && self.preview_step > 0.0) {
            return Err(RootMotionError::invalid_config(
                "preview_step must be positive",
            ));
        }
        for (field, bone) in [
            ("custom_load_bone", &self.custom_load_bone),
            ("custom_save_bone", &self.custom_save_bone),
        ] {
            if matches!(bone.as_deref(), Some(b) if b.trim().is_empty()) {
                return Err(RootMotionError::invalid_config(format!(
                    "{field} is empty"
                )));
            }
        }
        Ok(())
    }

    /// The load options as an immutable bake configuration.
    pub fn bake_config(&self) -> BakeConfig {
        BakeConfig {
            sample_rate: self.sample_rate,
            additive: self.additive,
            channels: self.extract_channels,
            bone: self.custom_load_bone.clone(),
            mode: self.extract_mode,
            evaluation: self.evaluation,
        }
    }
}
