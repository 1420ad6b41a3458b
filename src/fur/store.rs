//! Strand arenas and the LOD densification engine.
//!
//! Guide furs and LOD guide furs live in two parallel arenas addressed by a
//! single offset index space; the triangle graph over that space grows as
//! densification subdivides it. Both amplification passes share one
//! per-triangle density-area metric sampled from the density texture.

use glam::Vec2;

use crate::fur::guide::{
    self, FurStrand, GuideFur, GuideRef, LodGuideFur,
};
use crate::fur::params::FurParams;
use crate::math::{self, Rng, Triangle, triangle};
use crate::texture::TextureRgba;

/// Owns the guide-fur arenas, the strand list, and the triangle graph.
#[derive(Debug, Default)]
pub struct StrandStore {
    pub guide_furs: Vec<GuideFur>,
    pub lod_furs: Vec<LodGuideFur>,
    pub strands: Vec<FurStrand>,
    pub triangles: Vec<Triangle>,
}

impl StrandStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Combined guide + LOD count; the boundary of the offset index space.
    pub fn total_guide_count(&self) -> usize {
        self.guide_furs.len() + self.lod_furs.len()
    }

    pub fn clear(&mut self) {
        self.guide_furs.clear();
        self.lod_furs.clear();
        self.strands.clear();
        self.triangles.clear();
    }

    fn resolve(&self, index: usize) -> &GuideFur {
        guide::resolve(index, &self.guide_furs, &self.lod_furs)
    }

    /// Density-area metric for one triangle of the graph.
    ///
    /// Returns `(area, density)` where area is the 3D triangle area spanned
    /// by the three root points and density is a byte-scale average sampled
    /// from the density texture. Triangles with an empty parent polyline or
    /// a degenerate UV footprint report `(0, 0)` and are skipped by both
    /// amplification passes.
    ///
    /// The density estimate walks barycentric lines along each of the three
    /// edges at that edge's Heron-height resolution, instead of integrating
    /// the full texel grid; this resists under-sampling on thin triangles
    /// at a fraction of the cost.
    pub fn triangle_area_density(&self, tri: Triangle, density_map: &TextureRgba) -> (f32, f32) {
        let ha = self.resolve(tri.a);
        let hb = self.resolve(tri.b);
        let hc = self.resolve(tri.c);

        if ha.point_count() == 0 || hb.point_count() == 0 || hc.point_count() == 0 {
            return (0.0, 0.0);
        }

        let area = triangle::area_3d(
            ha.control_points[0],
            hb.control_points[0],
            hc.control_points[0],
        );

        let dims = Vec2::new(density_map.width as f32, density_map.height as f32);
        let a = ha.uv * dims;
        let b = hb.uv * dims;
        let c = hc.uv * dims;

        let base_a = (b - c).length().max(math::EPSILON);
        let base_b = (a - c).length().max(math::EPSILON);
        let base_c = (b - a).length().max(math::EPSILON);

        let area2d = triangle::heron(base_a, base_b, base_c);
        if area2d < math::EPSILON {
            return (0.0, 0.0);
        }

        let h_a = (2.0 * area2d) / base_a;
        let h_b = (2.0 * area2d) / base_b;
        let h_c = (2.0 * area2d) / base_c;

        let mut density = 0.0f32;
        let mut count = 0u32;

        let mut sample = |w_a: f32, w_b: f32| {
            let w_c = 1.0 - w_a - w_b;
            let p = a * w_a + b * w_b + c * w_c;
            density += density_map.get(p.x as i32, p.y as i32, 0) as f32;
            count += 1;
        };

        let mut w_a = 0.0f32;
        while w_a <= 1.0 {
            let mut w_b = 0.0f32;
            while w_b <= 1.0 - w_a {
                sample(w_a, w_b);
                w_b += 1.0 / base_a;
            }
            w_a += 1.0 / h_a;
        }

        let mut w_b = 0.0f32;
        while w_b <= 1.0 {
            let mut w_a = 0.0f32;
            while w_a <= 1.0 - w_b {
                sample(w_a, w_b);
                w_a += 1.0 / base_b;
            }
            w_b += 1.0 / h_b;
        }

        let mut w_c = 0.0f32;
        while w_c <= 1.0 {
            let mut w_a = 0.0f32;
            while w_a <= 1.0 - w_c {
                sample(w_a, 1.0 - w_a - w_c);
                w_a += 1.0 / base_c;
            }
            w_c += 1.0 / h_c;
        }

        if count != 0 {
            density /= count as f32;
        }

        (area, density)
    }

    /// Guide LOD pass: insert one interpolated guide fur into every
    /// triangle whose density-area product clears the threshold, fanning
    /// the triangle into three children around the new hair.
    ///
    /// The sweep re-reads the live triangle count, so fan triangles
    /// appended mid-pass are themselves visited; `max_guide_furs` bounds
    /// the resulting amplification.
    pub fn densify_guides(&mut self, density_map: &TextureRgba, params: &FurParams, rng: &mut Rng) {
        let mut iter = 0;
        while iter < self.triangles.len() && iter < params.max_guide_furs {
            let tri = self.triangles[iter];
            iter += 1;

            let (area, density) = self.triangle_area_density(tri, density_map);
            if density * area * params.density_factor_guide_furs < 1.0 {
                continue;
            }

            let refs = guide::barycentric_refs(tri, rng);
            let index_d = self.total_guide_count();
            let fur = self.interpolated(refs);
            self.lod_furs.push(fur);

            self.triangles.push(Triangle::new(tri.a, index_d, tri.c));
            self.triangles.push(Triangle::new(tri.a, index_d, tri.b));
            self.triangles.push(Triangle::new(tri.b, index_d, tri.c));
        }
    }

    /// Strand pass: an increasing integer threshold ladder over the full
    /// triangle graph. Each rung emits at most one strand per qualifying
    /// triangle, so denser triangles accumulate proportionally more
    /// strands. Returns the number of rungs climbed.
    pub fn generate_strands(
        &mut self,
        density_map: &TextureRgba,
        params: &FurParams,
        rng: &mut Rng,
    ) -> usize {
        let mut den = 0;
        while den < params.max_strand_density {
            let mut change = false;
            for i in 0..self.triangles.len() {
                let tri = self.triangles[i];
                let (area, density) = self.triangle_area_density(tri, density_map);

                if (den as f32) < density * area * params.density_factor_fur_strands {
                    change = true;
                    let refs = guide::barycentric_refs(tri, rng);
                    let lod = self.interpolated(refs);
                    self.strands.push(FurStrand {
                        guide: lod.guide,
                        refs: lod.refs,
                    });
                }
            }
            den += 1;
            if !change {
                break;
            }
        }
        den
    }

    /// Build an interpolated hair from three parent references, truncated
    /// to the shortest parent.
    fn interpolated(&self, refs: [GuideRef; 3]) -> LodGuideFur {
        let count = guide::min_point_count(&refs, &self.guide_furs, &self.lod_furs);
        let control_points =
            guide::interpolate_points(&refs, count, &self.guide_furs, &self.lod_furs);
        let uv = guide::interpolate_uv(&refs, &self.guide_furs, &self.lod_furs);
        LodGuideFur {
            guide: GuideFur { uv, control_points },
            refs,
            active: false,
        }
    }

    /// Recompute every inactive LOD guide fur from its (already updated)
    /// parents. Parents always precede children in the arena, so a single
    /// forward pass sees up-to-date state.
    pub fn update_lod_followers(&mut self) {
        for i in 0..self.lod_furs.len() {
            if self.lod_furs[i].active {
                continue;
            }
            self.update_lod_fur(i);
        }
    }

    /// Recompute one LOD guide fur from its parents regardless of its
    /// activation state. If a regrown parent is now shorter, the child
    /// truncates to it.
    pub fn update_lod_fur(&mut self, i: usize) {
        let refs = self.lod_furs[i].refs;
        let count = self.lod_furs[i]
            .guide
            .point_count()
            .min(guide::min_point_count(&refs, &self.guide_furs, &self.lod_furs));
        let points = guide::interpolate_points(&refs, count, &self.guide_furs, &self.lod_furs);
        self.lod_furs[i].guide.control_points = points;
    }

    /// Recompute the first `count` strands from the current guide state.
    pub fn update_strands(&mut self, count: usize) {
        for i in 0..count.min(self.strands.len()) {
            let refs = self.strands[i].refs;
            let n = self.strands[i]
                .guide
                .point_count()
                .min(guide::min_point_count(&refs, &self.guide_furs, &self.lod_furs));
            let points = guide::interpolate_points(&refs, n, &self.guide_furs, &self.lod_furs);
            self.strands[i].guide.control_points = points;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::{Vec2, Vec3};

    fn uniform_map(value: u8) -> TextureRgba {
        let (w, h) = (16, 16);
        let mut data = Vec::with_capacity(4 * w * h);
        for _ in 0..w * h {
            data.extend_from_slice(&[value, 0, 0, 255]);
        }
        TextureRgba::from_raw(data, w, h).unwrap()
    }

    /// Two guide furs at unit-square corners plus one more, forming one
    /// triangle with a healthy UV footprint.
    fn seeded_store(point_count: usize) -> StrandStore {
        let mut store = StrandStore::new();
        store.guide_furs = vec![
            GuideFur::grow(Vec2::new(0.1, 0.1), point_count, 0.1, Vec3::ZERO, Vec3::Z),
            GuideFur::grow(Vec2::new(0.9, 0.1), point_count, 0.1, Vec3::X, Vec3::Z),
            GuideFur::grow(Vec2::new(0.1, 0.9), point_count, 0.1, Vec3::Y, Vec3::Z),
        ];
        store.triangles = vec![Triangle::new(0, 1, 2)];
        store
    }

    #[test]
    fn test_metric_zero_density_map() {
        let store = seeded_store(3);
        let map = uniform_map(0);
        let (area, density) = store.triangle_area_density(Triangle::new(0, 1, 2), &map);
        assert!(area > 0.0);
        assert_eq!(density, 0.0);
    }

    #[test]
    fn test_metric_uniform_density_map() {
        let store = seeded_store(3);
        let map = uniform_map(200);
        let (area, density) = store.triangle_area_density(Triangle::new(0, 1, 2), &map);
        assert_relative_eq!(area, 0.5, epsilon = 1e-4);
        // Interior samples read 200; some barycentric lines graze texels
        // outside the footprint and read 0.
        assert!(density > 100.0 && density <= 200.0);
    }

    #[test]
    fn test_metric_skips_empty_parent() {
        let mut store = seeded_store(3);
        store.guide_furs[1].control_points.clear();
        let map = uniform_map(255);
        let (area, density) = store.triangle_area_density(Triangle::new(0, 1, 2), &map);
        assert_eq!(area, 0.0);
        assert_eq!(density, 0.0);
    }

    #[test]
    fn test_metric_degenerate_uv() {
        let mut store = seeded_store(3);
        // Collapse the UV footprint; 3D area stays healthy.
        for fur in &mut store.guide_furs {
            fur.uv = Vec2::new(0.5, 0.5);
        }
        let map = uniform_map(255);
        let (area, density) = store.triangle_area_density(Triangle::new(0, 1, 2), &map);
        assert_eq!(area, 0.0);
        assert_eq!(density, 0.0);
    }

    #[test]
    fn test_densify_zero_density_inserts_nothing() {
        let mut store = seeded_store(3);
        let map = uniform_map(0);
        let params = FurParams::default();
        let mut rng = Rng::new(1);
        store.densify_guides(&map, &params, &mut rng);
        assert!(store.lod_furs.is_empty());
        assert_eq!(store.triangles.len(), 1);
    }

    #[test]
    fn test_densify_inserts_and_fans() {
        let mut store = seeded_store(3);
        let map = uniform_map(255);
        let params = FurParams {
            density_factor_guide_furs: 1.0,
            max_guide_furs: 1,
            ..FurParams::default()
        };
        let mut rng = Rng::new(1);
        store.densify_guides(&map, &params, &mut rng);
        assert_eq!(store.lod_furs.len(), 1);
        assert_eq!(store.triangles.len(), 4);
        // Fan triangles all reference the new offset index.
        let d = store.guide_furs.len();
        for tri in &store.triangles[1..] {
            assert!(tri.a == d || tri.b == d || tri.c == d);
        }
    }

    #[test]
    fn test_densify_honors_cap() {
        let mut store = seeded_store(3);
        let map = uniform_map(255);
        let params = FurParams {
            density_factor_guide_furs: 100.0,
            max_guide_furs: 10,
            ..FurParams::default()
        };
        let mut rng = Rng::new(1);
        store.densify_guides(&map, &params, &mut rng);
        assert!(store.lod_furs.len() <= 10);
    }

    #[test]
    fn test_densify_monotonic_in_factor() {
        let map = uniform_map(180);
        let mut counts = Vec::new();
        for factor in [0.0, 0.1, 4.0] {
            let mut store = seeded_store(3);
            let params = FurParams {
                density_factor_guide_furs: factor,
                max_guide_furs: 50,
                ..FurParams::default()
            };
            let mut rng = Rng::new(77);
            store.densify_guides(&map, &params, &mut rng);
            counts.push(store.lod_furs.len());
        }
        for pair in counts.windows(2) {
            assert!(pair[0] <= pair[1], "counts not monotonic: {:?}", counts);
        }
    }

    #[test]
    fn test_lod_invariants_after_densify() {
        let mut store = seeded_store(4);
        let map = uniform_map(255);
        let params = FurParams {
            density_factor_guide_furs: 4.0,
            max_guide_furs: 30,
            ..FurParams::default()
        };
        let mut rng = Rng::new(5);
        store.densify_guides(&map, &params, &mut rng);
        assert!(!store.lod_furs.is_empty());

        let total = store.total_guide_count();
        for fur in &store.lod_furs {
            let sum: f32 = fur.refs.iter().map(|r| r.weight).sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
            let min = guide::min_point_count(&fur.refs, &store.guide_furs, &store.lod_furs);
            assert_eq!(fur.guide.point_count(), min);
            for r in &fur.refs {
                assert!(r.index < total);
            }
        }
    }

    #[test]
    fn test_strand_ladder_zero_density() {
        let mut store = seeded_store(3);
        let map = uniform_map(0);
        let params = FurParams::default();
        let mut rng = Rng::new(1);
        let rungs = store.generate_strands(&map, &params, &mut rng);
        assert!(store.strands.is_empty());
        assert_eq!(rungs, 1);
    }

    #[test]
    fn test_strand_ladder_terminates_under_cap() {
        let mut store = seeded_store(3);
        let map = uniform_map(128);
        let params = FurParams {
            density_factor_guide_furs: 0.0,
            density_factor_fur_strands: 0.5,
            ..FurParams::default()
        };
        let mut rng = Rng::new(1);
        let rungs = store.generate_strands(&map, &params, &mut rng);
        assert!(!store.strands.is_empty());
        assert!(
            rungs < params.max_strand_density / 2,
            "ladder climbed {} rungs",
            rungs
        );
    }

    #[test]
    fn test_strand_ladder_proportionality() {
        // A triangle twice as dense should collect roughly twice the
        // strands; the ladder adds one per triangle per rung it clears.
        let map = uniform_map(100);
        let mut counts = Vec::new();
        for factor in [0.5, 1.0] {
            let mut store = seeded_store(3);
            let params = FurParams {
                density_factor_guide_furs: 0.0,
                density_factor_fur_strands: factor,
                ..FurParams::default()
            };
            let mut rng = Rng::new(3);
            store.generate_strands(&map, &params, &mut rng);
            counts.push(store.strands.len());
        }
        assert!(counts[1] >= 2 * counts[0] - 2);
    }

    #[test]
    fn test_followers_track_parents() {
        let mut store = seeded_store(3);
        let map = uniform_map(255);
        let params = FurParams {
            density_factor_guide_furs: 1.0,
            max_guide_furs: 1,
            ..FurParams::default()
        };
        let mut rng = Rng::new(1);
        store.densify_guides(&map, &params, &mut rng);

        // Move every parent and verify followers land on the new weighted sum.
        let shift = Vec3::new(0.0, 0.0, 5.0);
        for fur in &mut store.guide_furs {
            for p in &mut fur.control_points {
                *p += shift;
            }
        }
        store.update_lod_followers();

        let fur = &store.lod_furs[0];
        let expected =
            guide::interpolate_points(&fur.refs, fur.guide.point_count(), &store.guide_furs, &[]);
        for (got, want) in fur.guide.control_points.iter().zip(&expected) {
            assert_relative_eq!(got.z, want.z, epsilon = 1e-5);
        }
    }
}
