//! Mathematical utilities and data structures

pub mod rng;
pub mod triangle;

pub use rng::Rng;
pub use triangle::Triangle;

/// Tolerance used for degenerate-geometry guards and LOD comparisons.
pub const EPSILON: f32 = 0.001;

/// Normal of the plane through three points, computed as `(a - b) x (a - c)`.
///
/// Not normalized; degenerate inputs yield the zero vector.
pub fn plane_normal(a: glam::Vec3, b: glam::Vec3, c: glam::Vec3) -> glam::Vec3 {
    (a - b).cross(a - c)
}
