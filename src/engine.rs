// ============================================================================
// REMOVAL ENGINE — parameter object, error taxonomy, linear pipeline
// ============================================================================
//
// One run: build mask → invert (optional) → cleanup rounds → feather
// (optional) → composite. Strictly linear and synchronous; a failing stage
// aborts the whole run with a single error and no partial output. The
// engine holds no state across runs — every invocation allocates its own
// mask and works on the caller's pixel buffer.

use std::fmt;
use std::str::FromStr;

use image::{GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::ops::{composite, mask, morphology};

// ----------------------------------------------------------------------------
// Strategy
// ----------------------------------------------------------------------------

/// How the raw removal mask is produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Flood classification seeded from the four corner pixels.
    #[default]
    Auto,
    /// Distance threshold against a fixed key color.
    Chroma,
    /// Externally painted overlay; its alpha channel is the mask.
    Manual,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Auto => "auto",
            Strategy::Chroma => "chroma",
            Strategy::Manual => "manual",
        }
    }

    pub fn all() -> &'static [Strategy] {
        &[Strategy::Auto, Strategy::Chroma, Strategy::Manual]
    }
}

impl FromStr for Strategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Strategy::Auto),
            "chroma" => Ok(Strategy::Chroma),
            "manual" => Ok(Strategy::Manual),
            other => Err(EngineError::UnsupportedStrategy(other.to_string())),
        }
    }
}

// ----------------------------------------------------------------------------
// Parameters
// ----------------------------------------------------------------------------

/// Full parameter object for one removal run. Serializable so presets can
/// round-trip through JSON files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemovalParams {
    pub strategy: Strategy,
    /// Color-distance threshold, 0–128.
    pub tolerance: f32,
    /// Chroma key color; ignored by the other strategies.
    pub key_color: Option<[u8; 3]>,
    /// Gaussian feather radius in pixels, 0–8. 0 disables feathering.
    pub feather: u32,
    /// Erode+dilate pairs applied after the build, 0–3.
    pub cleanup_rounds: u32,
    /// Flip removal and keep regions before compositing.
    pub invert: bool,
}

impl Default for RemovalParams {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            tolerance: 32.0,
            key_color: None,
            feather: 0,
            cleanup_rounds: 0,
            invert: false,
        }
    }
}

impl RemovalParams {
    pub const TOLERANCE_MAX: f32 = 128.0;
    pub const FEATHER_MAX: u32 = 8;
    pub const CLEANUP_MAX: u32 = 3;

    /// Clamp every field into its documented range.
    pub fn clamped(mut self) -> Self {
        self.tolerance = self.tolerance.clamp(0.0, Self::TOLERANCE_MAX);
        self.feather = self.feather.min(Self::FEATHER_MAX);
        self.cleanup_rounds = self.cleanup_rounds.min(Self::CLEANUP_MAX);
        self
    }
}

// ----------------------------------------------------------------------------
// Errors
// ----------------------------------------------------------------------------

/// Ways a run can abort before or during the pipeline. Decode and file
/// I/O failures stay at the boundary in `io.rs`.
#[derive(Debug)]
pub enum EngineError {
    /// Zero-sized source, or a manual overlay with mismatched dimensions.
    InvalidImage(String),
    /// Strategy name outside the closed auto/chroma/manual set.
    UnsupportedStrategy(String),
    /// Chroma strategy invoked without a key color.
    MissingKeyColor,
    /// Manual strategy invoked without an overlay buffer.
    MissingOverlay,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidImage(s) => write!(f, "invalid image: {}", s),
            EngineError::UnsupportedStrategy(s) => {
                write!(
                    f,
                    "unsupported strategy '{}' (expected auto, chroma or manual)",
                    s
                )
            }
            EngineError::MissingKeyColor => {
                write!(f, "chroma strategy requires a key color (--key-color)")
            }
            EngineError::MissingOverlay => {
                write!(f, "manual strategy requires an overlay image (--mask)")
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Pipeline
// ----------------------------------------------------------------------------

/// Build the raw mask for the configured strategy. The source buffer is
/// read-only here; only the compositor ever writes to it.
pub fn build_mask(
    pixels: &RgbaImage,
    overlay: Option<&RgbaImage>,
    params: &RemovalParams,
) -> Result<GrayImage, EngineError> {
    match params.strategy {
        Strategy::Auto => Ok(mask::flood_mask(pixels, params.tolerance)),
        Strategy::Chroma => {
            let key = params.key_color.ok_or(EngineError::MissingKeyColor)?;
            Ok(mask::chroma_mask(pixels, key, params.tolerance))
        }
        Strategy::Manual => {
            let overlay = overlay.ok_or(EngineError::MissingOverlay)?;
            if overlay.dimensions() != pixels.dimensions() {
                return Err(EngineError::InvalidImage(format!(
                    "overlay is {}x{} but the source is {}x{}",
                    overlay.width(),
                    overlay.height(),
                    pixels.width(),
                    pixels.height(),
                )));
            }
            Ok(mask::manual_mask(overlay))
        }
    }
}

/// Run the full pipeline in place on `pixels`.
///
/// Returns the final, refined mask (already composited) so callers can
/// export it for inspection. Parameters are clamped to their documented
/// ranges before use.
pub fn remove_background(
    pixels: &mut RgbaImage,
    overlay: Option<&RgbaImage>,
    params: &RemovalParams,
) -> Result<GrayImage, EngineError> {
    let (w, h) = pixels.dimensions();
    if w == 0 || h == 0 {
        return Err(EngineError::InvalidImage(format!(
            "source has degenerate dimensions {}x{}",
            w, h
        )));
    }

    let params = params.clone().clamped();
    let mut mask = build_mask(pixels, overlay, &params)?;

    if params.invert {
        morphology::invert(&mut mask);
    }
    morphology::open(&mut mask, params.cleanup_rounds);
    morphology::feather(&mut mask, params.feather);
    composite::apply_mask(pixels, &mask);

    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("AUTO".parse::<Strategy>().unwrap(), Strategy::Auto);
        assert_eq!("Chroma".parse::<Strategy>().unwrap(), Strategy::Chroma);
        assert_eq!("manual".parse::<Strategy>().unwrap(), Strategy::Manual);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = "blur".parse::<Strategy>().unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedStrategy(s) if s == "blur"));
    }

    #[test]
    fn zero_sized_source_aborts_before_building() {
        let mut img = RgbaImage::new(0, 0);
        let err = remove_background(&mut img, None, &RemovalParams::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidImage(_)));
    }

    #[test]
    fn chroma_without_key_color_is_an_error() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let params = RemovalParams {
            strategy: Strategy::Chroma,
            ..Default::default()
        };
        let err = remove_background(&mut img, None, &params).unwrap_err();
        assert!(matches!(err, EngineError::MissingKeyColor));
    }

    #[test]
    fn manual_without_overlay_is_an_error() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let params = RemovalParams {
            strategy: Strategy::Manual,
            ..Default::default()
        };
        let err = remove_background(&mut img, None, &params).unwrap_err();
        assert!(matches!(err, EngineError::MissingOverlay));
    }

    #[test]
    fn mismatched_overlay_is_rejected() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let overlay = RgbaImage::new(2, 2);
        let params = RemovalParams {
            strategy: Strategy::Manual,
            ..Default::default()
        };
        let err = remove_background(&mut img, Some(&overlay), &params).unwrap_err();
        assert!(matches!(err, EngineError::InvalidImage(_)));
    }

    #[test]
    fn params_clamp_to_documented_ranges() {
        let p = RemovalParams {
            tolerance: 500.0,
            feather: 99,
            cleanup_rounds: 12,
            ..Default::default()
        }
        .clamped();
        assert_eq!(p.tolerance, RemovalParams::TOLERANCE_MAX);
        assert_eq!(p.feather, RemovalParams::FEATHER_MAX);
        assert_eq!(p.cleanup_rounds, RemovalParams::CLEANUP_MAX);
    }

    #[test]
    fn preset_round_trips_through_json() {
        let params = RemovalParams {
            strategy: Strategy::Chroma,
            tolerance: 24.5,
            key_color: Some([0, 177, 64]),
            feather: 3,
            cleanup_rounds: 2,
            invert: true,
        };
        let json = serde_json::to_string(&params).unwrap();
        let back: RemovalParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn pipeline_returns_the_composited_mask() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let params = RemovalParams {
            tolerance: 10.0,
            ..Default::default()
        };
        let mask = remove_background(&mut img, None, &params).unwrap();
        assert!(mask.pixels().all(|p| p.0[0] == 255));
        assert!(img.pixels().all(|p| p.0[3] == 0));
    }
}
