//! Guide hair records and barycentric interpolation.
//!
//! Three record kinds share the same polyline shape: pure guide furs grown
//! from base-mesh vertices, LOD guide furs inserted by densification, and
//! final fur strands. The latter two carry three [`GuideRef`]s into the
//! combined guide + LOD index space and are recomputed from their parents
//! rather than simulated.

use glam::{Vec2, Vec3};

use crate::math::{Rng, Triangle};

/// A growth polyline anchored to the base mesh: root-to-tip control points
/// plus the root UV on the surface.
///
/// A zero-height sample produces an empty polyline; such hairs are skipped
/// by every density pass downstream.
#[derive(Clone, Debug, Default)]
pub struct GuideFur {
    pub uv: Vec2,
    pub control_points: Vec<Vec3>,
}

impl GuideFur {
    /// Extrude `count` points from `origin` along `direction`, spaced
    /// `distance` apart. The first point is the anchored root.
    pub fn grow(uv: Vec2, count: usize, distance: f32, origin: Vec3, direction: Vec3) -> Self {
        let control_points = (0..count)
            .map(|i| origin + i as f32 * distance * direction)
            .collect();
        Self { uv, control_points }
    }

    pub fn point_count(&self) -> usize {
        self.control_points.len()
    }
}

/// Barycentric reference to a parent hair: offset index into the combined
/// guide + LOD index space plus an interpolation weight.
#[derive(Clone, Copy, Debug)]
pub struct GuideRef {
    pub index: usize,
    pub weight: f32,
}

/// A synthetic guide fur inserted by the LOD densification pass.
///
/// While `active`, it is simulated through the animation bridge like a pure
/// guide fur; otherwise it is a cheap follower recomputed from its parents.
#[derive(Clone, Debug)]
pub struct LodGuideFur {
    pub guide: GuideFur,
    pub refs: [GuideRef; 3],
    pub active: bool,
}

/// A final renderable strand. Always interpolated, never simulated.
#[derive(Clone, Debug)]
pub struct FurStrand {
    pub guide: GuideFur,
    pub refs: [GuideRef; 3],
}

/// Resolve an offset index into the two arenas.
pub fn resolve<'a>(index: usize, guides: &'a [GuideFur], lod: &'a [LodGuideFur]) -> &'a GuideFur {
    if index < guides.len() {
        &guides[index]
    } else {
        &lod[index - guides.len()].guide
    }
}

/// Draw barycentric reference weights for a triangle's three corners.
///
/// The draw is intentionally asymmetric: the second weight's range depends
/// on the first. This slightly biases placement away from uniform over the
/// simplex, and the bias is part of the expected visual layout.
pub fn barycentric_refs(triangle: Triangle, rng: &mut Rng) -> [GuideRef; 3] {
    let w_a = rng.next_f32();
    let w_b = rng.next_f32() * (1.0 - w_a);
    let w_c = 1.0 - w_a - w_b;
    [
        GuideRef { index: triangle.a, weight: w_a },
        GuideRef { index: triangle.b, weight: w_b },
        GuideRef { index: triangle.c, weight: w_c },
    ]
}

/// Shortest parent polyline length; interpolated children truncate to it.
pub fn min_point_count(refs: &[GuideRef; 3], guides: &[GuideFur], lod: &[LodGuideFur]) -> usize {
    refs.iter()
        .map(|r| resolve(r.index, guides, lod).point_count())
        .min()
        .unwrap_or(0)
}

/// Barycentric-weighted control points, index-wise across the parents.
pub fn interpolate_points(
    refs: &[GuideRef; 3],
    count: usize,
    guides: &[GuideFur],
    lod: &[LodGuideFur],
) -> Vec<Vec3> {
    (0..count)
        .map(|j| {
            refs.iter().fold(Vec3::ZERO, |acc, r| {
                acc + r.weight * resolve(r.index, guides, lod).control_points[j]
            })
        })
        .collect()
}

/// Barycentric-weighted root UV across the parents.
pub fn interpolate_uv(refs: &[GuideRef; 3], guides: &[GuideFur], lod: &[LodGuideFur]) -> Vec2 {
    refs.iter().fold(Vec2::ZERO, |acc, r| {
        acc + r.weight * resolve(r.index, guides, lod).uv
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn guides() -> Vec<GuideFur> {
        vec![
            GuideFur::grow(Vec2::new(0.0, 0.0), 3, 0.1, Vec3::ZERO, Vec3::Z),
            GuideFur::grow(Vec2::new(1.0, 0.0), 3, 0.1, Vec3::X, Vec3::Z),
            GuideFur::grow(Vec2::new(0.0, 1.0), 2, 0.1, Vec3::Y, Vec3::Z),
        ]
    }

    #[test]
    fn test_grow_spacing() {
        let fur = GuideFur::grow(Vec2::ZERO, 4, 0.25, Vec3::ZERO, Vec3::Z);
        assert_eq!(fur.point_count(), 4);
        assert_relative_eq!(fur.control_points[3].z, 0.75, epsilon = 1e-6);
        assert_eq!(fur.control_points[0], Vec3::ZERO);
    }

    #[test]
    fn test_grow_zero_count() {
        let fur = GuideFur::grow(Vec2::ZERO, 0, 0.25, Vec3::ZERO, Vec3::Z);
        assert_eq!(fur.point_count(), 0);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let mut rng = Rng::new(99);
        for _ in 0..1000 {
            let refs = barycentric_refs(Triangle::new(0, 1, 2), &mut rng);
            let sum: f32 = refs.iter().map(|r| r.weight).sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
            for r in &refs {
                assert!(r.weight >= 0.0 && r.weight <= 1.0);
            }
        }
    }

    #[test]
    fn test_min_point_count_truncates() {
        let guides = guides();
        let refs = [
            GuideRef { index: 0, weight: 0.4 },
            GuideRef { index: 1, weight: 0.4 },
            GuideRef { index: 2, weight: 0.2 },
        ];
        assert_eq!(min_point_count(&refs, &guides, &[]), 2);
    }

    #[test]
    fn test_interpolate_points_weighted_sum() {
        let guides = guides();
        let refs = [
            GuideRef { index: 0, weight: 0.5 },
            GuideRef { index: 1, weight: 0.5 },
            GuideRef { index: 2, weight: 0.0 },
        ];
        let pts = interpolate_points(&refs, 2, &guides, &[]);
        assert_relative_eq!(pts[0].x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(pts[1].z, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_resolve_offset_index() {
        let guides = guides();
        let lod = vec![LodGuideFur {
            guide: GuideFur::grow(Vec2::ZERO, 2, 0.1, Vec3::ONE, Vec3::Z),
            refs: [
                GuideRef { index: 0, weight: 1.0 },
                GuideRef { index: 1, weight: 0.0 },
                GuideRef { index: 2, weight: 0.0 },
            ],
            active: false,
        }];
        let hair = resolve(3, &guides, &lod);
        assert_eq!(hair.control_points[0], Vec3::ONE);
    }
}
