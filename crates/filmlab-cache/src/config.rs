//! Per-stage processing configurations.
//!
//! These are the value-semantic records whose digests key the cache.
//! They are immutable once constructed — a settings change in the
//! editor produces a new configuration value, which produces a new
//! digest, which the driver uses to detect staleness. Optional fields
//! use `Option` so "unset" never collides with a valid value.
//!
//! All types implement `Serialize`, the canonical-field-export
//! capability required by [`digest_config`](crate::digest_config).

use serde::{Deserialize, Serialize};

use crate::checkpoint::Checkpoint;

/// How the base decode interprets the source scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessMode {
    /// Color negative film (orange-mask removal, inversion).
    #[default]
    ColorNegative,
    /// Black-and-white negative film.
    MonochromeNegative,
    /// Positive/slide film — no inversion.
    Positive,
}

/// Configuration for the base decode stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BaseConfig {
    /// How to interpret the source scan.
    pub process_mode: ProcessMode,

    /// Whether to average multiple scan frames of the same negative
    /// before decoding, reducing scanner noise.
    pub average_frames: bool,

    /// Film-base color sampled from the rebate, as linear RGB.
    /// `None` means "estimate from the frame".
    pub base_color: Option<[f32; 3]>,
}

/// Per-channel clipping bounds for the exposure stage.
///
/// Values are fractions of the channel histogram to clip at each end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelClip {
    /// Fraction clipped at the shadow end.
    pub low: f32,
    /// Fraction clipped at the highlight end.
    pub high: f32,
}

/// Configuration for the exposure adjustment stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureConfig {
    /// Output floor: the darkest value the stage maps shadows onto.
    pub floor: f32,

    /// Output ceiling: the brightest value the stage maps highlights onto.
    pub ceiling: f32,

    /// Per-channel clip bounds in R, G, B order. `None` disables
    /// clipping for that channel.
    pub channel_clips: [Option<ChannelClip>; 3],

    /// Whether to auto-level from the frame histogram before applying
    /// floor/ceiling.
    pub auto_level: bool,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            floor: 0.0,
            ceiling: 1.0,
            channel_clips: [None; 3],
            auto_level: true,
        }
    }
}

/// A single spot-removal edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotEdit {
    /// Horizontal center in pixels.
    pub x: u32,
    /// Vertical center in pixels.
    pub y: u32,
    /// Radius in pixels.
    pub radius: u32,
}

/// Configuration for the retouch stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetouchConfig {
    /// Spot removals in application order.
    pub spots: Vec<SpotEdit>,

    /// Automatic dust detection strength, 0–100. `None` disables it.
    pub dust_strength: Option<u8>,
}

/// Reference illuminant for the color-lab conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Illuminant {
    /// Print-viewing standard.
    D50,
    /// Daylight standard.
    #[default]
    D65,
}

/// Configuration for the color-lab conversion stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabConfig {
    /// Reference white point.
    pub illuminant: Illuminant,

    /// Chroma multiplier applied after conversion.
    pub chroma: f32,

    /// Optional tone curve as `(input, output)` control points in
    /// curve order.
    pub tone_curve: Option<Vec<(f32, f32)>>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            illuminant: Illuminant::default(),
            chroma: 1.0,
            tone_curve: None,
        }
    }
}

/// A stage configuration tagged with the checkpoint it drives.
///
/// Closed set: every configuration kind the pipeline knows about is a
/// variant here, so matches over configuration kinds are exhaustive at
/// build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageConfig {
    /// Base decode configuration.
    Base(BaseConfig),
    /// Exposure adjustment configuration.
    Exposure(ExposureConfig),
    /// Retouch configuration.
    Retouch(RetouchConfig),
    /// Color-lab conversion configuration.
    Lab(LabConfig),
}

impl StageConfig {
    /// The checkpoint this configuration's results are stored under.
    #[must_use]
    pub const fn checkpoint(&self) -> Checkpoint {
        match self {
            Self::Base(_) => Checkpoint::Base,
            Self::Exposure(_) => Checkpoint::Exposure,
            Self::Retouch(_) => Checkpoint::Retouch,
            Self::Lab(_) => Checkpoint::Lab,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::digest::digest_config;

    use super::*;

    #[test]
    fn defaults_are_stable_fixtures() {
        let base = BaseConfig::default();
        assert_eq!(base.process_mode, ProcessMode::ColorNegative);
        assert!(!base.average_frames);
        assert!(base.base_color.is_none());

        let exposure = ExposureConfig::default();
        assert!((exposure.floor - 0.0).abs() < f32::EPSILON);
        assert!((exposure.ceiling - 1.0).abs() < f32::EPSILON);
        assert_eq!(exposure.channel_clips, [None; 3]);
        assert!(exposure.auto_level);
    }

    #[test]
    fn each_stage_config_maps_to_its_checkpoint() {
        assert_eq!(
            StageConfig::Base(BaseConfig::default()).checkpoint(),
            Checkpoint::Base,
        );
        assert_eq!(
            StageConfig::Exposure(ExposureConfig::default()).checkpoint(),
            Checkpoint::Exposure,
        );
        assert_eq!(
            StageConfig::Retouch(RetouchConfig::default()).checkpoint(),
            Checkpoint::Retouch,
        );
        assert_eq!(
            StageConfig::Lab(LabConfig::default()).checkpoint(),
            Checkpoint::Lab,
        );
    }

    #[test]
    fn stage_configs_with_equal_fields_hash_identically() {
        let a = StageConfig::Exposure(ExposureConfig {
            floor: 0.05,
            ceiling: 0.95,
            channel_clips: [
                Some(ChannelClip {
                    low: 0.01,
                    high: 0.01,
                }),
                None,
                None,
            ],
            auto_level: false,
        });
        let b = a.clone();
        assert_eq!(digest_config(&a).unwrap(), digest_config(&b).unwrap());
    }

    #[test]
    fn different_stage_kinds_with_default_fields_hash_differently() {
        let base = digest_config(&StageConfig::Base(BaseConfig::default())).unwrap();
        let retouch = digest_config(&StageConfig::Retouch(RetouchConfig::default())).unwrap();
        assert_ne!(base, retouch);
    }

    #[test]
    fn config_deserialized_from_json_hashes_like_the_constructed_value() {
        let constructed = LabConfig {
            illuminant: Illuminant::D50,
            chroma: 1.2,
            tone_curve: Some(vec![(0.0, 0.0), (0.5, 0.6), (1.0, 1.0)]),
        };
        // Field order in the JSON text deliberately differs from the
        // struct declaration order.
        let parsed: LabConfig = serde_json::from_str(
            r#"{
                "tone_curve": [[0.0, 0.0], [0.5, 0.6], [1.0, 1.0]],
                "chroma": 1.2,
                "illuminant": "D50"
            }"#,
        )
        .unwrap();
        assert_eq!(constructed, parsed);
        assert_eq!(
            digest_config(&constructed).unwrap(),
            digest_config(&parsed).unwrap(),
        );
    }

    #[test]
    fn spot_edit_order_is_significant() {
        let a = RetouchConfig {
            spots: vec![
                SpotEdit {
                    x: 1,
                    y: 2,
                    radius: 3,
                },
                SpotEdit {
                    x: 4,
                    y: 5,
                    radius: 6,
                },
            ],
            dust_strength: None,
        };
        let mut b = a.clone();
        b.spots.reverse();
        assert_ne!(digest_config(&a).unwrap(), digest_config(&b).unwrap());
    }
}
