//! Headless background removal for raster images.
//!
//! The engine takes a decoded RGBA buffer and a strategy — flood
//! classification from the corner pixels, a chroma key against a fixed
//! color, or an externally painted overlay — and produces a per-pixel
//! removal mask. The mask is optionally inverted, cleaned up with
//! morphological opening, feathered with a separable Gaussian, and finally
//! written into the image's alpha channel.
//!
//! All pixel work is synchronous and allocation-per-run; the only I/O
//! lives in [`io`] and the CLI front end in [`cli`].

pub mod logger;

pub mod cli;
pub mod engine;
pub mod io;
pub mod ops;

pub use engine::{EngineError, RemovalParams, Strategy, remove_background};
