//! Base-mesh input buffers and ribbon output geometry.
//!
//! [`SurfaceBuffers`] is a read-only snapshot of the animated base mesh the
//! fur grows on; [`FurGeometry`] is the render-buffer set the per-frame
//! update rewrites in place.

use glam::{Vec2, Vec3};

use crate::core::{Error, Result};
use crate::math::Triangle;

/// Snapshot of the base mesh the fur is anchored to.
///
/// All vertex buffers must have the same length and every triangle index
/// must resolve; [`SurfaceBuffers::validate`] enforces this as a fatal
/// precondition before generation.
#[derive(Clone, Debug, Default)]
pub struct SurfaceBuffers {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
    pub binormals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub triangles: Vec<Triangle>,
}

impl SurfaceBuffers {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Check the fatal generation preconditions.
    pub fn validate(&self) -> Result<()> {
        let n = self.positions.len();
        if n == 0 {
            return Err(Error::MissingBuffer("positions"));
        }
        if self.normals.len() != n {
            return Err(Error::MissingBuffer("normals"));
        }
        if self.tangents.len() != n {
            return Err(Error::MissingBuffer("tangents"));
        }
        if self.binormals.len() != n {
            return Err(Error::MissingBuffer("binormals"));
        }
        if self.texcoords.len() != n {
            return Err(Error::MissingBuffer("texcoords"));
        }
        for tri in &self.triangles {
            if tri.a >= n || tri.b >= n || tri.c >= n {
                return Err(Error::Geometry(format!(
                    "triangle ({}, {}, {}) exceeds vertex count {}",
                    tri.a, tri.b, tri.c, n
                )));
            }
        }
        Ok(())
    }
}

/// Output render-buffer set: two vertices per control point, forming
/// camera-facing ribbon quads along each strand.
///
/// The index buffer is built once at generation time; `index_end` marks the
/// live renderable range (in index elements) and shrinks with the strand
/// LOD. The binormal buffer carries the per-point color jitter written at
/// generation time and is read, not rewritten, during updates.
#[derive(Clone, Debug, Default)]
pub struct FurGeometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
    pub binormals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub indices: Vec<[u32; 3]>,
    pub index_end: usize,
}

impl FurGeometry {
    /// Allocate buffers for `total_points` control points across
    /// `strand_count` strands.
    pub fn with_capacity(total_points: usize, strand_count: usize) -> Self {
        let vertices = 2 * total_points;
        let triangles = 2 * (total_points - strand_count);
        Self {
            positions: vec![Vec3::ZERO; vertices],
            normals: vec![Vec3::ZERO; vertices],
            tangents: vec![Vec3::ZERO; vertices],
            binormals: vec![Vec3::ZERO; vertices],
            texcoords: vec![Vec2::ZERO; vertices],
            indices: Vec::with_capacity(triangles),
            index_end: 0,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.tangents.clear();
        self.binormals.clear();
        self.texcoords.clear();
        self.indices.clear();
        self.index_end = 0;
    }
}
