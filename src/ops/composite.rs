// ============================================================================
// ALPHA COMPOSITOR — write the removal mask into the image's alpha channel
// ============================================================================

use image::{GrayImage, RgbaImage};

/// Apply the final mask to the pixel buffer in place.
///
/// For every pixel: `alpha = 255 - mask`, so removal strength 255 becomes
/// fully transparent and 0 stays fully opaque. This is the only stage in
/// the pipeline that mutates the pixel buffer; any requested inversion has
/// already been applied to the mask upstream.
pub fn apply_mask(pixels: &mut RgbaImage, mask: &GrayImage) {
    debug_assert_eq!(pixels.dimensions(), mask.dimensions());
    let strength = mask.as_raw();
    for (px, &m) in pixels.as_mut().chunks_exact_mut(4).zip(strength.iter()) {
        px[3] = 255 - m;
    }
}
