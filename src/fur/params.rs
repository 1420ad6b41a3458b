//! Generation parameters for the fur pipeline.

/// Scalars and flags controlling guide growth, densification, and strand
/// emission. Read once at generation time.
#[derive(Clone, Debug)]
pub struct FurParams {
    /// Seed for the deterministic generation stream.
    pub seed: u32,
    /// Scales the sampled height-map value into a hair length.
    pub height_factor: f32,
    /// Target spacing between consecutive control points.
    pub control_points_distance: f32,
    /// Root offset along the surface normal before growth starts.
    pub displace_distance: f32,
    /// Multiplier on the density-area metric for the guide LOD pass.
    pub density_factor_guide_furs: f32,
    /// Multiplier on the density-area metric for the strand ladder pass.
    pub density_factor_fur_strands: f32,
    /// Base ribbon width of a rendered strand.
    pub strand_width: f32,
    /// Magnitude of the per-point position jitter.
    pub position_deviation: f32,
    /// Extrude along the tangent instead of the normal.
    pub grow_tangent: bool,
    /// Space control points so total length matches the sampled height
    /// exactly; otherwise use `control_points_distance` verbatim.
    pub strict_heightmap: bool,
    /// Iteration cap for the self-amplifying guide LOD sweep.
    pub max_guide_furs: usize,
    /// Safety cap on the strand-emission threshold ladder.
    pub max_strand_density: usize,
}

impl Default for FurParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            height_factor: 0.5,
            control_points_distance: 0.05,
            displace_distance: 0.02,
            density_factor_guide_furs: 10.0,
            density_factor_fur_strands: 100.0,
            strand_width: 0.0015,
            position_deviation: 0.01,
            grow_tangent: false,
            strict_heightmap: true,
            max_guide_furs: 10_000,
            max_strand_density: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = FurParams::default();
        assert_eq!(params.height_factor, 0.5);
        assert_eq!(params.control_points_distance, 0.05);
        assert_eq!(params.max_strand_density, 100);
        assert!(!params.grow_tangent);
    }
}
