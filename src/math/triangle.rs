//! Index triangles and Heron-formula area helpers.

use glam::{Vec2, Vec3};

/// A triangle of indices into the combined guide-hair index space.
///
/// Indices below the guide-hair count resolve into the guide store;
/// the remainder (offset by that count) resolve into the LOD store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle {
    pub a: usize,
    pub b: usize,
    pub c: usize,
}

impl Triangle {
    pub fn new(a: usize, b: usize, c: usize) -> Self {
        Self { a, b, c }
    }
}

/// Heron's formula from three side lengths.
///
/// Returns 0 for degenerate inputs (the radicand is clamped at zero to
/// absorb floating-point noise from near-collinear points).
pub fn heron(a: f32, b: f32, c: f32) -> f32 {
    let s = (a + b + c) / 2.0;
    (s * (s - a) * (s - b) * (s - c)).max(0.0).sqrt()
}

/// Area of the 3D triangle spanned by three points.
pub fn area_3d(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    heron((b - c).length(), (a - c).length(), (b - a).length())
}

/// Area of the 2D triangle spanned by three points.
pub fn area_2d(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    heron((b - c).length(), (a - c).length(), (b - a).length())
}
