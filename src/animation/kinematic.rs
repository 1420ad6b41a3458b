//! Kinematic strand animation riding a deforming base mesh.
//!
//! No physics: each strand is anchored to its closest base-mesh vertex and
//! every control point's initial offset is recorded as spherical
//! coordinates in that vertex's tangent/binormal/normal frame. Each frame
//! the world positions are rebuilt from the vertex's current frame, so the
//! hair follows skinned deformation for free.

use std::collections::HashMap;

use glam::Vec3;

use crate::animation::StrandAnimationControl;
use crate::mesh::SurfaceBuffers;

#[derive(Clone, Copy, Debug)]
struct SphericalOffset {
    radius: f32,
    theta: f32,
    phi: f32,
}

#[derive(Clone, Debug)]
struct AnchoredStrand {
    vertex: usize,
    offsets: Vec<SphericalOffset>,
}

/// Strand animation that reconstructs control points from the current pose
/// of the base mesh. The host must call [`KinematicControl::update_pose`]
/// with the deformed mesh before each fur update.
#[derive(Debug, Default)]
pub struct KinematicControl {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec3>,
    binormals: Vec<Vec3>,
    strands: HashMap<usize, AnchoredStrand>,
}

impl KinematicControl {
    pub fn new(base: &SurfaceBuffers) -> Self {
        let mut control = Self::default();
        control.update_pose(base);
        control
    }

    /// Snapshot the current (possibly deformed) base-mesh pose.
    pub fn update_pose(&mut self, base: &SurfaceBuffers) {
        self.positions.clone_from(&base.positions);
        self.normals.clone_from(&base.normals);
        self.tangents.clone_from(&base.tangents);
        self.binormals.clone_from(&base.binormals);
    }

    pub fn strand_count(&self) -> usize {
        self.strands.len()
    }

    /// Normalized (tangent, binormal, normal) frame at a vertex.
    fn frame(&self, vertex: usize) -> (Vec3, Vec3, Vec3) {
        (
            self.tangents[vertex].normalize_or_zero(),
            self.binormals[vertex].normalize_or_zero(),
            self.normals[vertex].normalize_or_zero(),
        )
    }

    fn closest_vertex(&self, point: Vec3) -> usize {
        let mut best = 0;
        let mut best_dist = f32::MAX;
        for (i, p) in self.positions.iter().enumerate() {
            let d = p.distance_squared(point);
            if d < best_dist {
                best_dist = d;
                best = i;
            }
        }
        best
    }
}

impl StrandAnimationControl for KinematicControl {
    fn initialize_strand(&mut self, id: usize, control_points: &[Vec3]) {
        let root = control_points.first().copied().unwrap_or(Vec3::ZERO);
        let vertex = self.closest_vertex(root);
        let anchor = self.positions[vertex];
        let (t, b, n) = self.frame(vertex);

        let offsets = control_points
            .iter()
            .map(|p| {
                let d = *p - anchor;
                let local = Vec3::new(d.dot(t), d.dot(b), d.dot(n));
                let radius = local.length();
                if radius < 1e-8 {
                    SphericalOffset { radius: 0.0, theta: 0.0, phi: 0.0 }
                } else {
                    SphericalOffset {
                        radius,
                        theta: (local.z / radius).clamp(-1.0, 1.0).acos(),
                        phi: local.y.atan2(local.x),
                    }
                }
            })
            .collect();

        self.strands.insert(id, AnchoredStrand { vertex, offsets });
    }

    fn animate_strand(&mut self, id: usize, control_points: &mut [Vec3]) {
        let Some(strand) = self.strands.get(&id) else {
            return;
        };
        assert_eq!(
            control_points.len(),
            strand.offsets.len(),
            "strand {} control point count changed since initialization",
            id
        );

        let anchor = self.positions[strand.vertex];
        let (t, b, n) = self.frame(strand.vertex);

        for (p, off) in control_points.iter_mut().zip(&strand.offsets) {
            let sin_theta = off.theta.sin();
            let local = Vec3::new(
                off.radius * sin_theta * off.phi.cos(),
                off.radius * sin_theta * off.phi.sin(),
                off.radius * off.theta.cos(),
            );
            *p = anchor + local.x * t + local.y * b + local.z * n;
        }
    }

    fn remove_strand(&mut self, id: usize) {
        self.strands.remove(&id);
    }

    fn remove_all_strands(&mut self) {
        self.strands.clear();
    }
}
