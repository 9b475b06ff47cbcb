//! Error types for the fontscale library.
//!
//! All failures here are local and synchronous; the tracing engine itself
//! never fails hard, it degrades (see `VectorGlyph::combine_edges`).

use thiserror::Error;

/// Malformed packed hex glyph input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("hex glyph has odd length ({0} digits)")]
    OddLength(usize),
    #[error("invalid hex digit {digit:?} at offset {offset}")]
    InvalidDigit { digit: char, offset: usize },
}

/// Pixel access outside the raster dimensions.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RasterError {
    #[error("pixel ({x}, {y}) outside {width}x{height} raster")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
}

/// Malformed geometry spec string.
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("malformed geometry spec {spec:?}, expected WxH or WxH+OX+OY")]
    Malformed { spec: String },
    #[error("bad number in geometry spec {spec:?}")]
    BadNumber {
        spec: String,
        #[source]
        source: std::num::ParseIntError,
    },
}
