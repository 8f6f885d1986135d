// ============================================================================
// cutout CLI — headless batch background removal
// ============================================================================
//
// Usage examples:
//   cutout --input photo.png --output cut.png
//   cutout -i photo.jpg -s chroma -k "#00b140" -t 40 --feather 2 -o out.png
//   cutout -i "shots/*.png" --output-dir cut/ --cleanup 1
//   cutout -i scan.png -s manual -m strokes.png --invert -o subject.png
//   cutout -i photo.png --preset studio.json -o out.png
//
// All processing runs synchronously on the current thread; rayon
// parallelizes individual pixel stages internally.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use image::RgbaImage;

use crate::engine::{self, RemovalParams, Strategy};
use crate::io::{self, SaveFormat};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// cutout headless background remover.
///
/// Strip image backgrounds with corner flood fill, chroma keying, or a
/// painted overlay mask — no GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "cutout",
    about = "cutout headless background remover",
    long_about = "Remove image backgrounds without opening a GUI.\n\n\
                  Strategies:\n  \
                  auto    — flood classification seeded from the four corner pixels\n  \
                  chroma  — distance threshold against a fixed key color\n  \
                  manual  — alpha channel of a painted overlay image\n\n\
                  Example:\n  \
                  cutout --input photo.png --output cut.png\n  \
                  cutout -i \"shots/*.jpg\" -s chroma -k \"#00b140\" --output-dir cut/"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Mask strategy: auto, chroma, or manual.
    #[arg(short, long, default_value = "auto")]
    pub strategy: String,

    /// Color-distance tolerance (0–128).
    #[arg(short, long, default_value_t = 32.0, value_name = "0-128")]
    pub tolerance: f32,

    /// Chroma key color as "#RRGGBB" (required for --strategy chroma).
    #[arg(short, long, value_name = "#RRGGBB")]
    pub key_color: Option<String>,

    /// Overlay image whose alpha channel is the manual mask
    /// (required for --strategy manual; must match the source dimensions).
    #[arg(short, long, value_name = "OVERLAY")]
    pub mask: Option<PathBuf>,

    /// Gaussian feather radius in pixels (0–8). 0 disables feathering.
    #[arg(long, default_value_t = 0, value_name = "0-8")]
    pub feather: u32,

    /// Erode+dilate cleanup rounds for speckle removal (0–3).
    #[arg(long, default_value_t = 0, value_name = "0-3")]
    pub cleanup: u32,

    /// Keep the matched region and remove everything else.
    #[arg(long)]
    pub invert: bool,

    /// JSON preset supplying the full parameter object.
    /// When given, the strategy/tolerance/key/feather/cleanup/invert flags
    /// above are ignored.
    #[arg(long, value_name = "PRESET.json")]
    pub preset: Option<PathBuf>,

    /// Write the effective parameters to a JSON preset before processing.
    #[arg(long, value_name = "PRESET.json")]
    pub write_preset: Option<PathBuf>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target
    /// format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, bmp, tga, tiff.
    /// When omitted, inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1–100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Also write each refined mask as "<output stem>_mask.png".
    #[arg(long)]
    pub save_mask: bool,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    // Resolve glob patterns / literal paths → concrete PathBufs
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    // Assemble the parameter object (preset file wins over flags)
    let params = match build_params(&args) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.write_preset {
        if let Err(e) = io::write_preset(&params, path) {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
        if args.verbose {
            println!("preset → {}", path.display());
        }
    }

    // Manual mode shares one overlay across the whole batch; per-file
    // dimension checks happen inside the engine.
    let overlay: Option<RgbaImage> = if params.strategy == Strategy::Manual {
        match &args.mask {
            Some(path) => match io::load_image(path) {
                Ok(img) => Some(img),
                Err(e) => {
                    eprintln!("error: {}", e);
                    return ExitCode::FAILURE;
                }
            },
            None => {
                eprintln!("error: --strategy manual requires --mask OVERLAY");
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    let save_format = parse_format(args.format.as_deref(), args.output.as_deref());
    if !save_format.supports_alpha() {
        crate::log_warn!(
            "output format '{}' has no alpha channel; cutouts will be flattened over white",
            save_format.extension()
        );
    }

    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "error: could not create output directory '{}': {}",
                dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            save_format,
        ) {
            Some(p) => p,
            None => {
                eprintln!(
                    "  error: cannot determine output path for '{}'.",
                    input_path.display()
                );
                any_failure = true;
                continue;
            }
        };

        match run_one(
            input_path,
            &output_path,
            overlay.as_ref(),
            &params,
            save_format,
            args.quality,
            args.save_mask,
        ) {
            Ok(()) => {
                crate::log_info!(
                    "{} → {} ({} strategy)",
                    input_path.display(),
                    output_path.display(),
                    params.strategy.label()
                );
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                crate::log_err!("{}: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    overlay: Option<&RgbaImage>,
    params: &RemovalParams,
    format: SaveFormat,
    quality: u8,
    save_mask: bool,
) -> Result<(), String> {
    // -- Step 1: Load ----------------------------------------------------
    let mut pixels = io::load_image(input)?;

    // -- Step 2: Run the mask pipeline -----------------------------------
    let mask = engine::remove_background(&mut pixels, overlay, params)
        .map_err(|e| e.to_string())?;

    // -- Step 3: Save ----------------------------------------------------
    if save_mask {
        let mask_path = sibling_mask_path(output);
        io::write_mask(&mask, &mask_path)?;
    }
    io::encode_and_write(&pixels, output, format, quality)
}

/// "<dir>/<stem>_mask.png" next to the output file.
fn sibling_mask_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cutout".to_string());
    let parent = output.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}_mask.png", stem))
}

// ============================================================================
// Helpers
// ============================================================================

/// Build the effective [`RemovalParams`] from a preset file or the
/// individual flags.
fn build_params(args: &CliArgs) -> Result<RemovalParams, String> {
    if let Some(path) = &args.preset {
        return Ok(io::load_preset(path)?.clamped());
    }

    let strategy: Strategy = args.strategy.parse().map_err(|e| format!("{}", e))?;
    let key_color = match &args.key_color {
        Some(s) => Some(parse_key_color(s)?),
        None => None,
    };

    Ok(RemovalParams {
        strategy,
        tolerance: args.tolerance,
        key_color,
        feather: args.feather,
        cleanup_rounds: args.cleanup,
        invert: args.invert,
    }
    .clamped())
}

/// Parse "#RRGGBB" (leading '#' optional) into an RGB triple.
fn parse_key_color(s: &str) -> Result<[u8; 3], String> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!(
            "invalid key color '{}': expected #RRGGBB hex notation",
            s
        ));
    }
    let channel = |range| u8::from_str_radix(&hex[range], 16).map_err(|e| e.to_string());
    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from
/// the output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    if let Some(f) = format_arg {
        return format_from_name(&f.to_lowercase());
    }

    if let Some(out) = output {
        let ext = out
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        return format_from_name(&ext);
    }

    SaveFormat::Png
}

fn format_from_name(name: &str) -> SaveFormat {
    match name {
        "jpeg" | "jpg" => SaveFormat::Jpeg,
        "bmp" => SaveFormat::Bmp,
        "tga" => SaveFormat::Tga,
        "tiff" | "tif" => SaveFormat::Tiff,
        _ => SaveFormat::Png,
    }
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_cutout` to the stem if it would collide with the input)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    // Avoid silent overwrite of the input
    if candidate == input {
        Some(parent.join(format!("{}_cutout.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}
