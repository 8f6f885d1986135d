// ============================================================================
// MASK BUILDERS — flood classification, chroma key, manual overlay
// ============================================================================
//
// Each builder produces a fresh removal mask (0 = keep, 255 = remove) and
// never mutates the source buffer. A zero-sized source yields a 0×0 mask;
// the engine rejects degenerate buffers before any builder runs.

use std::collections::VecDeque;

use image::{GrayImage, Luma, RgbaImage};
use rayon::prelude::*;

use super::color;

/// Mask value for a pixel that stays in the output.
pub const MASK_KEEP: u8 = 0;
/// Mask value for a pixel that gets removed.
pub const MASK_REMOVE: u8 = 255;

/// Build a mask by flooding outward from the four corner pixels.
///
/// The four corner colors form the seed set. A BFS over 4-connected
/// neighbors visits every reachable pixel exactly once (visited set bounds
/// the work at O(w·h)); expansion is unconditional, so on any non-empty
/// image the traversal covers the full grid. A visited pixel is marked
/// removable when its color is within `tolerance` of *any* seed — corners
/// of different colors contribute independent seeds rather than splitting
/// the fill.
pub fn flood_mask(pixels: &RgbaImage, tolerance: f32) -> GrayImage {
    let (w, h) = pixels.dimensions();
    let mut mask = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return mask;
    }

    let corners = [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)];
    let seeds: Vec<[u8; 3]> = corners
        .iter()
        .map(|&(x, y)| {
            let p = pixels.get_pixel(x, y);
            [p[0], p[1], p[2]]
        })
        .collect();
    let tol_sq = tolerance * tolerance;

    let mut visited = vec![false; (w as usize) * (h as usize)];
    let mut queue = VecDeque::with_capacity(1024);
    for &(x, y) in &corners {
        let idx = (y * w + x) as usize;
        if !visited[idx] {
            visited[idx] = true;
            queue.push_back((x, y));
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        let p = pixels.get_pixel(x, y);
        let rgb = [p[0], p[1], p[2]];
        if seeds.iter().any(|&s| color::distance_sq(rgb, s) <= tol_sq) {
            mask.put_pixel(x, y, Luma([MASK_REMOVE]));
        }

        let neighbors = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbors {
            if nx >= w || ny >= h {
                continue;
            }
            let idx = (ny * w + nx) as usize;
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            queue.push_back((nx, ny));
        }
    }

    mask
}

/// Per-pixel chroma key test against a fixed reference color.
///
/// No connectivity requirement — each pixel is classified independently
/// (parallel by row), removable when its distance to `key` is ≤ `tolerance`
/// (inclusive boundary).
pub fn chroma_mask(pixels: &RgbaImage, key: [u8; 3], tolerance: f32) -> GrayImage {
    let (w, h) = pixels.dimensions();
    let mut mask = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return mask;
    }

    let tol_sq = tolerance * tolerance;
    let src = pixels.as_raw();
    let stride = w as usize * 4;

    mask.as_mut()
        .par_chunks_mut(w as usize)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row_in = &src[y * stride..(y + 1) * stride];
            for (x, cell) in row_out.iter_mut().enumerate() {
                let pi = x * 4;
                let rgb = [row_in[pi], row_in[pi + 1], row_in[pi + 2]];
                if color::distance_sq(rgb, key) <= tol_sq {
                    *cell = MASK_REMOVE;
                }
            }
        });

    mask
}

/// Adapter from a painted overlay: removable wherever the overlay's alpha
/// channel is nonzero. Performs no computation beyond the format change.
/// The engine checks that overlay and source dimensions match before
/// calling.
pub fn manual_mask(overlay: &RgbaImage) -> GrayImage {
    let (w, h) = overlay.dimensions();
    let mut mask = GrayImage::new(w, h);
    let src = overlay.as_raw();
    for (i, cell) in mask.as_mut().iter_mut().enumerate() {
        if src[i * 4 + 3] != 0 {
            *cell = MASK_REMOVE;
        }
    }
    mask
}
