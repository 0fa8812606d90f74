//! Math type re-exports and animation-specific geometry.
//!
//! The affine matrix type is `glam::DAffine2`; rectangles and color
//! transforms are defined here.

pub use glam::{DAffine2, DMat2, DVec2};

use std::fmt;

/// Axis-aligned rectangle in scene units.
#[derive(Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rect({}, {}, {}x{})", self.x, self.y, self.width, self.height)
    }
}

/// Integer pixel rectangle inside an atlas.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl IRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }
}

impl fmt::Debug for IRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IRect({}, {}, {}x{})", self.x, self.y, self.width, self.height)
    }
}

/// Color transform: per-channel multipliers and integer offsets.
///
/// A channel is rendered as `c * m + a`. Multipliers are nominally in
/// `[0, 1]`, offsets in `[-255, 255]`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ColorTransform {
    pub m_r: f64,
    pub m_g: f64,
    pub m_b: f64,
    pub m_a: f64,
    pub a_r: i32,
    pub a_g: i32,
    pub a_b: i32,
    pub a_a: i32,
}

impl ColorTransform {
    /// Identity transform (multipliers 1, offsets 0).
    pub const NEUTRAL: Self = Self {
        m_r: 1.0,
        m_g: 1.0,
        m_b: 1.0,
        m_a: 1.0,
        a_r: 0,
        a_g: 0,
        a_b: 0,
        a_a: 0,
    };

    /// Neutral transform with the given alpha multiplier.
    pub fn alpha(m_a: f64) -> Self {
        Self { m_a, ..Self::NEUTRAL }
    }

    /// Multipliers in channel order R, G, B, A.
    #[inline]
    pub fn multipliers(&self) -> [f64; 4] {
        [self.m_r, self.m_g, self.m_b, self.m_a]
    }

    /// Offsets in channel order R, G, B, A.
    #[inline]
    pub fn offsets(&self) -> [i32; 4] {
        [self.a_r, self.a_g, self.a_b, self.a_a]
    }

    /// Build from multiplier and offset arrays (R, G, B, A).
    pub fn from_parts(m: [f64; 4], a: [i32; 4]) -> Self {
        Self {
            m_r: m[0],
            m_g: m[1],
            m_b: m[2],
            m_a: m[3],
            a_r: a[0],
            a_g: a[1],
            a_b: a[2],
            a_a: a[3],
        }
    }
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Affine coefficients in `[a, b, c, d, tx, ty]` order.
///
/// `a, b` is the x axis, `c, d` the y axis.
#[inline]
pub fn affine_components(m: &DAffine2) -> [f64; 6] {
    [
        m.matrix2.x_axis.x,
        m.matrix2.x_axis.y,
        m.matrix2.y_axis.x,
        m.matrix2.y_axis.y,
        m.translation.x,
        m.translation.y,
    ]
}

/// Inverse of [`affine_components`].
#[inline]
pub fn affine_from_components(c: [f64; 6]) -> DAffine2 {
    DAffine2::from_mat2_translation(
        DMat2::from_cols(DVec2::new(c[0], c[1]), DVec2::new(c[2], c[3])),
        DVec2::new(c[4], c[5]),
    )
}
