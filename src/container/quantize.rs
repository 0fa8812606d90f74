//! Fixed-point quantization of geometry, matrices, colors and ratios.
//!
//! The scale factors are part of the container contract. Values are
//! truncated toward zero, never rounded.

use super::format::{COORD_SCALE, MATRIX_SCALE};
use crate::util::{Error, Result};

/// Scale and truncate to i32, rejecting values the encoding cannot hold.
fn scaled(value: f64, scale: f64, field: &'static str) -> Result<i32> {
    let v = (value * scale).trunc();
    if !v.is_finite() || v < i32::MIN as f64 || v > i32::MAX as f64 {
        return Err(Error::OutOfRange { field, value });
    }
    Ok(v as i32)
}

/// Coordinate in 1/20 units.
#[inline]
pub fn coord(value: f64, field: &'static str) -> Result<i32> {
    scaled(value, COORD_SCALE, field)
}

/// Matrix a, b, c or d in 1/16384 units.
#[inline]
pub fn matrix_linear(value: f64) -> Result<i32> {
    scaled(value, MATRIX_SCALE, "matrix")
}

/// Matrix tx or ty in 1/20 units.
#[inline]
pub fn matrix_translation(value: f64) -> Result<i32> {
    scaled(value, COORD_SCALE, "matrix translation")
}

/// Color multiplier to a byte: clamp to `[0, 1]`, times 255, truncate.
#[inline]
pub fn color_multiplier(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// Color offset to a signed byte: clamp to `[-255, 255]`, halve.
#[inline]
pub fn color_offset(value: i32) -> i8 {
    (value.clamp(-255, 255) / 2) as i8
}

/// Morph ratio to a byte: times 255, truncate, clamp to `[0, 255]`.
#[inline]
pub fn ratio(value: f64) -> u8 {
    ((value * 255.0) as i64).clamp(0, 255) as u8
}

/// Clip depth as a fixed-width i16.
pub fn clip_depth(value: i32) -> Result<i16> {
    i16::try_from(value).map_err(|_| Error::OutOfRange {
        field: "clip depth",
        value: value as f64,
    })
}

#[inline]
pub fn dequantize_coord(value: i32) -> f64 {
    value as f64 / COORD_SCALE
}

#[inline]
pub fn dequantize_matrix_linear(value: i32) -> f64 {
    value as f64 / MATRIX_SCALE
}

#[inline]
pub fn dequantize_color_multiplier(value: u8) -> f64 {
    value as f64 / 255.0
}

/// Offsets are stored halved; the stored value times two is the contract.
#[inline]
pub fn dequantize_color_offset(value: i8) -> i32 {
    value as i32 * 2
}

#[inline]
pub fn dequantize_ratio(value: u8) -> f64 {
    value as f64 / 255.0
}
