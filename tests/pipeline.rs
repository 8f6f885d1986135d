// End-to-end pipeline scenarios: whole runs through build → refine →
// composite on small synthetic images.

use cutout::engine::{EngineError, RemovalParams, Strategy, remove_background};
use image::{Rgba, RgbaImage};

fn params(strategy: Strategy) -> RemovalParams {
    RemovalParams {
        strategy,
        ..Default::default()
    }
}

#[test]
fn solid_white_image_is_fully_removed() {
    // 4×4 solid white, auto strategy, tolerance 10: every mask cell hits
    // 255 and every result pixel goes fully transparent.
    let mut img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
    let p = RemovalParams {
        tolerance: 10.0,
        ..params(Strategy::Auto)
    };

    let mask = remove_background(&mut img, None, &p).unwrap();

    assert!(mask.pixels().all(|c| c.0[0] == 255));
    assert!(img.pixels().all(|c| c.0[3] == 0));
}

#[test]
fn every_corner_seed_counts() {
    // 2×2 with one red corner and three green: at tolerance 0 each pixel
    // matches *some* corner seed exactly, so the whole image is removed.
    let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255]));
    img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    let p = RemovalParams {
        tolerance: 0.0,
        ..params(Strategy::Auto)
    };

    let mask = remove_background(&mut img, None, &p).unwrap();

    assert!(mask.pixels().all(|c| c.0[0] == 255));
    assert!(img.pixels().all(|c| c.0[3] == 0));
}

#[test]
fn chroma_zero_tolerance_splits_near_identical_pixels() {
    // (255,255,255) vs (254,254,254): distance ≈ 1.7, so only the exact
    // match is keyed out at tolerance 0.
    let mut img = RgbaImage::from_pixel(2, 1, Rgba([255, 255, 255, 255]));
    img.put_pixel(1, 0, Rgba([254, 254, 254, 255]));
    let p = RemovalParams {
        tolerance: 0.0,
        key_color: Some([255, 255, 255]),
        ..params(Strategy::Chroma)
    };

    let mask = remove_background(&mut img, None, &p).unwrap();

    assert_eq!(mask.get_pixel(0, 0).0[0], 255);
    assert_eq!(mask.get_pixel(1, 0).0[0], 0);
    assert_eq!(img.get_pixel(0, 0).0[3], 0);
    assert_eq!(img.get_pixel(1, 0).0[3], 255);
}

#[test]
fn cleanup_round_clears_an_isolated_speckle() {
    // Chroma-match a single interior pixel of a 5×5 image, then let one
    // erode+dilate round remove it: nothing ends up transparent.
    let mut img = RgbaImage::from_pixel(5, 5, Rgba([40, 40, 40, 255]));
    img.put_pixel(2, 2, Rgba([0, 177, 64, 255]));
    let p = RemovalParams {
        tolerance: 0.0,
        key_color: Some([0, 177, 64]),
        cleanup_rounds: 1,
        ..params(Strategy::Chroma)
    };

    let mask = remove_background(&mut img, None, &p).unwrap();

    assert!(mask.pixels().all(|c| c.0[0] == 0));
    assert!(img.pixels().all(|c| c.0[3] == 255));
}

#[test]
fn invert_flips_the_removal_region() {
    // Solid white with invert: the flood matches everything, the inversion
    // keeps everything.
    let mut img = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 255]));
    let p = RemovalParams {
        tolerance: 10.0,
        invert: true,
        ..params(Strategy::Auto)
    };

    remove_background(&mut img, None, &p).unwrap();

    assert!(img.pixels().all(|c| c.0[3] == 255));
}

#[test]
fn manual_overlay_drives_the_alpha_channel() {
    let mut img = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]));
    let mut overlay = RgbaImage::new(2, 2);
    overlay.put_pixel(0, 0, Rgba([0, 0, 0, 200]));

    let mask = remove_background(&mut img, Some(&overlay), &params(Strategy::Manual)).unwrap();

    assert_eq!(mask.get_pixel(0, 0).0[0], 255);
    assert_eq!(img.get_pixel(0, 0).0[3], 0);
    assert_eq!(img.get_pixel(1, 1).0[3], 255);
}

#[test]
fn feathered_edges_carry_intermediate_alpha() {
    // Left half chroma-matched, feather 2: the boundary column must end up
    // partially transparent, and everything stays in range.
    let mut img = RgbaImage::from_pixel(8, 4, Rgba([10, 10, 10, 255]));
    for y in 0..4 {
        for x in 0..4 {
            img.put_pixel(x, y, Rgba([0, 177, 64, 255]));
        }
    }
    let p = RemovalParams {
        tolerance: 0.0,
        key_color: Some([0, 177, 64]),
        feather: 2,
        ..params(Strategy::Chroma)
    };

    remove_background(&mut img, None, &p).unwrap();

    let edge_alpha = img.get_pixel(4, 2).0[3];
    assert!(
        edge_alpha > 0 && edge_alpha < 255,
        "edge alpha {} not feathered",
        edge_alpha
    );
}

#[test]
fn flood_runs_are_bit_identical() {
    let mut base = RgbaImage::from_pixel(16, 16, Rgba([230, 230, 230, 255]));
    for i in 0..16u32 {
        base.put_pixel(i, 8, Rgba([(i * 16) as u8, 90, 120, 255]));
    }
    let p = RemovalParams {
        tolerance: 48.0,
        ..params(Strategy::Auto)
    };

    let mut a = base.clone();
    let mut b = base.clone();
    let mask_a = remove_background(&mut a, None, &p).unwrap();
    let mask_b = remove_background(&mut b, None, &p).unwrap();

    assert_eq!(mask_a.as_raw(), mask_b.as_raw());
    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn degenerate_source_reports_invalid_image() {
    let mut img = RgbaImage::new(0, 0);
    let err = remove_background(&mut img, None, &params(Strategy::Auto)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidImage(_)));
}

#[test]
fn full_refinement_stack_composes() {
    // Chroma + invert + cleanup + feather in one run on a split image;
    // only the range invariant and the keep/remove orientation are
    // asserted, the rest is covered by the stage tests.
    let mut img = RgbaImage::from_pixel(10, 10, Rgba([200, 0, 0, 255]));
    for y in 0..10 {
        for x in 0..5 {
            img.put_pixel(x, y, Rgba([0, 177, 64, 255]));
        }
    }
    let p = RemovalParams {
        tolerance: 16.0,
        key_color: Some([0, 177, 64]),
        feather: 2,
        cleanup_rounds: 2,
        invert: true,
        ..params(Strategy::Chroma)
    };

    remove_background(&mut img, None, &p).unwrap();

    // Inverted: the green half is kept, the red half removed.
    assert_eq!(img.get_pixel(1, 5).0[3], 255);
    assert_eq!(img.get_pixel(8, 5).0[3], 0);
}
