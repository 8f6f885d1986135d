// ============================================================================
// IMAGE + PRESET I/O — decode inputs, encode cutouts, JSON preset files
// ============================================================================
//
// All file-system and codec work for the crate lives here; the engine in
// `engine.rs` only ever sees decoded RGBA buffers.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::codecs::tiff::TiffEncoder;
use image::{ColorType, GrayImage, ImageEncoder, RgbImage, RgbaImage};

use crate::engine::RemovalParams;

/// Output containers the CLI can write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Bmp,
    Tga,
    Tiff,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
            SaveFormat::Tiff => "tiff",
        }
    }

    /// Whether the container can carry the cutout's alpha channel.
    /// Formats without one get flattened over white at encode time.
    pub fn supports_alpha(&self) -> bool {
        !matches!(self, SaveFormat::Jpeg)
    }
}

/// Decode any supported raster file to RGBA8.
pub fn load_image(path: &Path) -> Result<RgbaImage, String> {
    let img = image::open(path)
        .map_err(|e| format!("could not decode '{}': {}", path.display(), e))?;
    Ok(img.into_rgba8())
}

/// Encode `img` to `path` in the requested format.
///
/// JPEG carries no alpha channel, so the cutout is flattened over white
/// first; `quality` applies to JPEG only.
pub fn encode_and_write(
    img: &RgbaImage,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|e| format!("could not create '{}': {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    let (w, h) = img.dimensions();

    let result = match format {
        SaveFormat::Png => {
            PngEncoder::new(&mut writer).write_image(img.as_raw(), w, h, ColorType::Rgba8)
        }
        SaveFormat::Jpeg => {
            let flat = flatten_over_white(img);
            JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100)).write_image(
                flat.as_raw(),
                w,
                h,
                ColorType::Rgb8,
            )
        }
        SaveFormat::Bmp => {
            BmpEncoder::new(&mut writer).write_image(img.as_raw(), w, h, ColorType::Rgba8)
        }
        SaveFormat::Tga => {
            TgaEncoder::new(&mut writer).write_image(img.as_raw(), w, h, ColorType::Rgba8)
        }
        SaveFormat::Tiff => {
            TiffEncoder::new(&mut writer).write_image(img.as_raw(), w, h, ColorType::Rgba8)
        }
    };

    result.map_err(|e| format!("could not encode '{}': {}", path.display(), e))
}

/// Write a refined mask as an 8-bit grayscale PNG (for inspection).
pub fn write_mask(mask: &GrayImage, path: &Path) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|e| format!("could not create '{}': {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    PngEncoder::new(&mut writer)
        .write_image(mask.as_raw(), mask.width(), mask.height(), ColorType::L8)
        .map_err(|e| format!("could not encode mask '{}': {}", path.display(), e))
}

/// Composite over an opaque white background, dropping the alpha channel.
fn flatten_over_white(img: &RgbaImage) -> RgbImage {
    let (w, h) = img.dimensions();
    let mut out = RgbImage::new(w, h);
    for (src, dst) in img.pixels().zip(out.pixels_mut()) {
        let a = src[3] as f32 / 255.0;
        for c in 0..3 {
            let v = src[c] as f32 * a + 255.0 * (1.0 - a);
            dst[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

// ----------------------------------------------------------------------------
// Presets
// ----------------------------------------------------------------------------

/// Load a full parameter object from a JSON preset file.
pub fn load_preset(path: &Path) -> Result<RemovalParams, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read preset '{}': {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("invalid preset '{}': {}", path.display(), e))
}

/// Write the given parameters as a pretty-printed JSON preset.
pub fn write_preset(params: &RemovalParams, path: &Path) -> Result<(), String> {
    let json = serde_json::to_string_pretty(params)
        .map_err(|e| format!("could not serialize preset: {}", e))?;
    std::fs::write(path, json)
        .map_err(|e| format!("could not write preset '{}': {}", path.display(), e))
}
