// ============================================================================
// MORPHOLOGICAL REFINER — invert, erode/dilate cleanup, Gaussian feather
// ============================================================================
//
// All operations mutate the mask in place and keep every cell in [0, 255].
// Erode and dilate read from a snapshot of the mask so a pass never
// observes its own writes.

use image::GrayImage;
use rayon::prelude::*;

/// Cell-wise complement. Applying twice restores the original mask.
pub fn invert(mask: &mut GrayImage) {
    for v in mask.as_mut().iter_mut() {
        *v = 255 - *v;
    }
}

/// Binary erosion with a 3×3 cross kernel (center + 4 axis neighbors).
///
/// An interior cell survives (becomes 255) only when it and all four
/// neighbors are nonzero; otherwise it is cleared. The 1-pixel image
/// border is left untouched: the kernel has no full neighborhood there.
pub fn erode(mask: &mut GrayImage) {
    let (w, h) = mask.dimensions();
    if w < 3 || h < 3 {
        return;
    }
    let src = mask.as_raw().clone();
    let w = w as usize;
    let h = h as usize;
    let dst = mask.as_mut();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let keep = src[i] != 0
                && src[i - 1] != 0
                && src[i + 1] != 0
                && src[i - w] != 0
                && src[i + w] != 0;
            dst[i] = if keep { 255 } else { 0 };
        }
    }
}

/// Binary dilation — the dual of [`erode`]: an interior cell is set when
/// it or any of its four axis neighbors is nonzero. Same border policy.
pub fn dilate(mask: &mut GrayImage) {
    let (w, h) = mask.dimensions();
    if w < 3 || h < 3 {
        return;
    }
    let src = mask.as_raw().clone();
    let w = w as usize;
    let h = h as usize;
    let dst = mask.as_mut();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let set = src[i] != 0
                || src[i - 1] != 0
                || src[i + 1] != 0
                || src[i - w] != 0
                || src[i + w] != 0;
            dst[i] = if set { 255 } else { 0 };
        }
    }
}

/// Morphological opening, `rounds` times: erode then dilate. Clears
/// isolated speckles while preserving the principal shape.
pub fn open(mask: &mut GrayImage, rounds: u32) {
    for _ in 0..rounds {
        erode(mask);
        dilate(mask);
    }
}

/// Separable Gaussian feather: sigma = radius / 2, kernel half-width =
/// radius, clamped edge extension, horizontal then vertical pass
/// (parallel by row). Intermediate math is f32; cells are rounded to the
/// nearest integer on store. No-op below radius 1.
pub fn feather(mask: &mut GrayImage, radius: u32) {
    if radius < 1 {
        return;
    }
    let (w, h) = mask.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let w = w as usize;
    let h = h as usize;
    let r = radius as usize;
    let kernel = gaussian_kernel(radius);

    let src: Vec<f32> = mask.as_raw().iter().map(|&v| v as f32).collect();

    // --- Horizontal pass ---
    let mut buf_h = vec![0.0f32; w * h];
    buf_h.par_chunks_mut(w).enumerate().for_each(|(y, row_out)| {
        let row_in = &src[y * w..(y + 1) * w];
        for (x, out) in row_out.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + ki as isize - r as isize).clamp(0, w as isize - 1) as usize;
                acc += row_in[sx] * kv;
            }
            *out = acc;
        }
    });

    // --- Vertical pass ---
    mask.as_mut()
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row_out)| {
            for (x, out) in row_out.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for (ki, &kv) in kernel.iter().enumerate() {
                    let sy =
                        (y as isize + ki as isize - r as isize).clamp(0, h as isize - 1) as usize;
                    acc += buf_h[sy * w + x] * kv;
                }
                *out = acc.round().clamp(0.0, 255.0) as u8;
            }
        });
}

/// Normalized 1-D Gaussian of length 2·radius + 1 with sigma = radius / 2.
fn gaussian_kernel(radius: u32) -> Vec<f32> {
    let r = radius as usize;
    let sigma = radius as f32 / 2.0;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel = Vec::with_capacity(2 * r + 1);
    let mut sum = 0.0f32;
    for i in 0..(2 * r + 1) {
        let x = i as f32 - r as f32;
        let v = (-x * x / s2).exp();
        kernel.push(v);
        sum += v;
    }
    let inv = 1.0 / sum;
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}
