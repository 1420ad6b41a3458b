//! Fur mesh generation and per-frame update.
//!
//! [`FurMesh`] wires the pipeline together: it reads the density and height
//! maps back from their sources, grows one guide fur per base-mesh vertex,
//! runs the LOD densification and strand-emission passes, and rebuilds the
//! camera-facing ribbon geometry every frame from the animated guide state.

pub mod guide;
pub mod params;
pub mod store;

pub use params::FurParams;
pub use store::StrandStore;

use std::path::Path;

use glam::Vec3;

use crate::animation::StrandAnimationControl;
use crate::core::{Error, Result};
use crate::math::{self, Rng, plane_normal};
use crate::mesh::{FurGeometry, SurfaceBuffers};
use crate::texture::{TextureRgba, TextureSource};

/// A fur/hair mesh instance.
///
/// Owns the guide-fur arenas, the sampled texture copies, the jitter
/// tables, and the output geometry. All methods run synchronously on the
/// calling thread; there is exactly one mutation path per frame.
pub struct FurMesh {
    params: FurParams,
    density_source: Option<Box<dyn TextureSource>>,
    height_source: Option<Box<dyn TextureSource>>,
    density_map: TextureRgba,
    height_map: TextureRgba,
    store: StrandStore,
    rng: Rng,
    animation: Option<Box<dyn StrandAnimationControl>>,
    animation_enabled: bool,
    guide_lod: f32,
    strand_lod: f32,
    /// Number of strands currently updated and rendered.
    strand_lod_size: usize,
    strand_width_lod: f32,
    /// Per-control-point position jitter, regenerated with the geometry.
    position_shift: Vec<Vec3>,
    geometry: FurGeometry,
}

impl FurMesh {
    pub fn new(params: FurParams) -> Self {
        let rng = Rng::new(params.seed);
        let strand_width_lod = params.strand_width;
        Self {
            params,
            density_source: None,
            height_source: None,
            density_map: TextureRgba::new(),
            height_map: TextureRgba::new(),
            store: StrandStore::new(),
            rng,
            animation: None,
            animation_enabled: false,
            guide_lod: 0.0,
            strand_lod: 0.0,
            strand_lod_size: 0,
            strand_width_lod,
            position_shift: Vec::new(),
            geometry: FurGeometry::default(),
        }
    }

    pub fn set_density_source(&mut self, source: Box<dyn TextureSource>) {
        self.density_source = Some(source);
    }

    pub fn set_height_source(&mut self, source: Box<dyn TextureSource>) {
        self.height_source = Some(source);
    }

    pub fn set_animation_control(&mut self, control: Box<dyn StrandAnimationControl>) {
        self.animation = Some(control);
    }

    pub fn params(&self) -> &FurParams {
        &self.params
    }

    pub fn store(&self) -> &StrandStore {
        &self.store
    }

    pub fn geometry(&self) -> &FurGeometry {
        &self.geometry
    }

    pub fn guide_lod(&self) -> f32 {
        self.guide_lod
    }

    pub fn strand_lod(&self) -> f32 {
        self.strand_lod
    }

    pub fn rendered_strand_count(&self) -> usize {
        self.strand_lod_size
    }

    /// Run the full generation pipeline against a base-mesh snapshot.
    ///
    /// Fatal preconditions (invalid buffers, missing or unreadable maps)
    /// abort before any geometry is produced. A run that yields zero
    /// strands is not an error; the mesh simply renders nothing.
    pub fn generate_geometry(&mut self, base: &SurfaceBuffers) -> Result<()> {
        base.validate()?;
        self.read_maps()?;

        self.store.clear();
        self.geometry.clear();
        self.position_shift.clear();
        self.strand_lod_size = 0;

        self.seed_triangles(base);
        self.generate_guide_furs(base);
        self.store
            .densify_guides(&self.density_map, &self.params, &mut self.rng);
        let rungs = self
            .store
            .generate_strands(&self.density_map, &self.params, &mut self.rng);

        log::info!(
            "generated {} guide furs, {} LOD guide furs, {} strands ({} ladder rungs)",
            self.store.guide_furs.len(),
            self.store.lod_furs.len(),
            self.store.strands.len(),
            rungs
        );

        if self.store.strands.is_empty() {
            log::warn!("no fur strands generated; mesh will render nothing");
            return Ok(());
        }

        self.build_geometry();
        self.strand_lod_size = self.store.strands.len();
        Ok(())
    }

    /// Re-read the maps and regrow the guide furs in place, keeping the
    /// LOD/strand topology and re-interpolating it from the new guides.
    /// Used after an external edit of the density or height textures.
    pub fn regenerate_geometry(&mut self, base: &SurfaceBuffers) -> Result<()> {
        base.validate()?;
        self.read_maps()?;

        self.store.guide_furs.clear();
        self.generate_guide_furs(base);

        for i in 0..self.store.lod_furs.len() {
            self.store.update_lod_fur(i);
        }
        self.store.update_strands(self.store.strands.len());

        // Point counts may have changed with the new height map, so the
        // vertex layout and index buffer are rebuilt from scratch.
        if !self.store.strands.is_empty() {
            self.build_geometry();
        }

        // A running bridge still holds the pre-regeneration point counts;
        // re-register everything it is simulating before the next update.
        if self.animation_enabled {
            self.synchronize_guide_furs();
            self.synchronize_active_lod_furs();
        } else {
            self.start_animation_control();
        }
        Ok(())
    }

    /// Deactivate LOD guides, stop the animation bridge, and drop the
    /// guide furs so the next [`FurMesh::regenerate_geometry`] call starts
    /// from fresh growth.
    pub fn reset_mesh(&mut self) {
        if self.store.guide_furs.is_empty() {
            log::error!("geometry not generated; mesh not reset");
            return;
        }
        if !self.animation_enabled {
            return;
        }
        self.set_guide_lod(0.0);
        self.stop_animation_control();
        self.store.guide_furs.clear();
    }

    /// Begin bridge-driven animation, registering every guide fur once.
    pub fn start_animation_control(&mut self) {
        if self.store.guide_furs.is_empty() {
            log::error!("geometry not generated; animation not started");
            return;
        }
        if self.animation.is_none() {
            log::error!("no animation control set");
            return;
        }
        if !self.animation_enabled {
            self.animation_enabled = true;
            self.synchronize_guide_furs();
        }
    }

    pub fn stop_animation_control(&mut self) {
        let Some(bridge) = self.animation.as_mut() else {
            log::error!("no animation control set");
            return;
        };
        if self.animation_enabled {
            self.animation_enabled = false;
            bridge.remove_all_strands();
        }
    }

    /// Set the fraction of LOD guide furs that are directly simulated.
    ///
    /// Active LOD guides are re-registered with the bridge; the rest
    /// become interpolation followers. A value equal to the current one
    /// (within epsilon) is a no-op.
    pub fn set_guide_lod(&mut self, guide_lod: f32) {
        if (self.guide_lod - guide_lod).abs() < math::EPSILON {
            return;
        }
        self.guide_lod = guide_lod;

        if !self.animation_enabled {
            return;
        }
        let Some(bridge) = self.animation.as_mut() else {
            return;
        };

        let offset = self.store.guide_furs.len();
        for (i, fur) in self.store.lod_furs.iter_mut().enumerate() {
            fur.active = false;
            bridge.remove_strand(offset + i);
        }

        let mut active = 0;
        for (i, fur) in self.store.lod_furs.iter_mut().enumerate() {
            if self.rng.next_f32() < guide_lod {
                fur.active = true;
                bridge.initialize_strand(offset + i, &fur.guide.control_points);
                active += 1;
            }
        }
        log::info!("active LOD guide furs: {}", active);
    }

    /// Set the fraction of fur strands beyond the guide count that are
    /// updated and rendered; thins the coat while widening the surviving
    /// strands to compensate.
    pub fn set_strand_lod(&mut self, strand_lod: f32) {
        self.strand_lod = strand_lod;
        let total_guides = self.store.total_guide_count() as f32;
        let size = total_guides + strand_lod * (self.store.strands.len() as f32 - total_guides);
        self.strand_lod_size = (size.max(0.0) as usize).min(self.store.strands.len());
        self.strand_width_lod = self.params.strand_width / (strand_lod * 0.75 + 0.25);
    }

    pub fn set_lod(&mut self, lod: f32) {
        self.set_guide_lod(lod);
        self.set_strand_lod(lod);
    }

    /// Per-frame update: animate guides through the bridge, re-interpolate
    /// followers and strands, and rewrite the ribbon geometry facing
    /// `camera_origin`.
    pub fn update(&mut self, camera_origin: Vec3) {
        if self.animation_enabled {
            self.update_guide_furs();
        }

        let count = self.strand_lod_size;
        if count == 0 {
            return;
        }

        if self.animation_enabled {
            self.store.update_strands(count);
        }

        let width = self.strand_width_lod;
        let geo = &mut self.geometry;
        let mut cursor = 0usize;
        let mut triangle_count = 0usize;

        for strand in self.store.strands.iter().take(count) {
            let cp = &strand.guide.control_points;
            let cpc = cp.len();
            if cpc == 0 {
                continue;
            }
            triangle_count += 2 * cpc - 2;

            let mut tangent = Vec3::ZERO;
            let mut normal = Vec3::ZERO;
            let mut strip = Vec3::ZERO;

            for y in 0..cpc - 1 {
                let shift = self.position_shift[cursor];
                let first = cp[y] + shift;
                let second = cp[y + 1] + shift;

                let binormal = plane_normal(first, second, camera_origin).normalize_or_zero();
                let jitter = geo.binormals[2 * cursor];
                strip = width
                    * binormal
                    * (jitter.z + 1.0)
                    * (0.5 * (1.0 - jitter.y) + 0.75);

                geo.positions[2 * cursor] = first;
                geo.positions[2 * cursor + 1] = first + strip;

                tangent = (first - second).normalize_or_zero();
                normal = tangent.cross(binormal);

                geo.normals[2 * cursor] = normal;
                geo.normals[2 * cursor + 1] = normal;
                geo.tangents[2 * cursor] = tangent;
                geo.tangents[2 * cursor + 1] = tangent;
                cursor += 1;
            }

            // Tip vertex pair reuses the last segment's strip and frame.
            let shift = self.position_shift[cursor];
            let last = cp[cpc - 1] + shift;
            geo.positions[2 * cursor] = last;
            geo.positions[2 * cursor + 1] = last + strip;
            geo.normals[2 * cursor] = normal;
            geo.normals[2 * cursor + 1] = normal;
            geo.tangents[2 * cursor] = tangent;
            geo.tangents[2 * cursor + 1] = tangent;
            cursor += 1;
        }

        geo.index_end = 3 * triangle_count;
    }

    /// Paint sample markers into the owned map copies and write both as
    /// PNGs into `dir`: guide roots in the green channel of both maps, LOD
    /// guides in red, strands in blue. Diagnostic only.
    pub fn save_uv_images(&mut self, dir: &Path) -> Result<()> {
        let dw = self.density_map.width as f32;
        let dh = self.density_map.height as f32;
        let hw = self.height_map.width as f32;
        let hh = self.height_map.height as f32;

        for fur in &self.store.guide_furs {
            let uv = fur.uv;
            self.density_map
                .set((uv.x * dw) as i32, (uv.y * dh) as i32, 1, 255);
            self.height_map
                .set((uv.x * hw) as i32, (uv.y * hh) as i32, 1, 255);
        }
        for fur in &self.store.lod_furs {
            let uv = fur.guide.uv;
            self.density_map
                .set((uv.x * dw) as i32, (uv.y * dh) as i32, 0, 255);
        }
        for strand in &self.store.strands {
            let uv = strand.guide.uv;
            self.density_map
                .set((uv.x * dw) as i32, (uv.y * dh) as i32, 2, 255);
        }

        log::info!("pure guide furs: {}", self.store.guide_furs.len());
        log::info!("total guide furs: {}", self.store.total_guide_count());

        self.density_map.save_png(&dir.join("densitymap_debug.png"))?;
        self.height_map.save_png(&dir.join("heightmap_debug.png"))?;
        Ok(())
    }

    fn read_maps(&mut self) -> Result<()> {
        let density_source = self
            .density_source
            .as_deref()
            .ok_or_else(|| Error::Geometry("density map source not set".into()))?;
        self.density_map.read(density_source).map_err(|e| {
            log::error!("error reading density map: {}", e);
            e
        })?;

        let height_source = self
            .height_source
            .as_deref()
            .ok_or_else(|| Error::Geometry("height map source not set".into()))?;
        self.height_map.read(height_source).map_err(|e| {
            log::error!("error reading height map: {}", e);
            e
        })?;
        Ok(())
    }

    /// Seed the triangle graph from the base-mesh triangulation.
    fn seed_triangles(&mut self, base: &SurfaceBuffers) {
        self.store.triangles.extend_from_slice(&base.triangles);
    }

    /// Grow one guide fur per base-mesh vertex.
    fn generate_guide_furs(&mut self, base: &SurfaceBuffers) {
        let hw = self.height_map.width as i32;
        let hh = self.height_map.height as i32;

        for i in 0..base.vertex_count() {
            let normal = base.normals[i].normalize_or_zero();
            let tangent = base.tangents[i].normalize_or_zero();
            let uv = base.texcoords[i];
            let root = base.positions[i] + self.params.displace_distance * normal;

            // Clamp so a UV of exactly 1.0 still reads the edge texel.
            let tx = ((uv.x * hw as f32) as i32).min(hw - 1);
            let ty = ((uv.y * hh as f32) as i32).min(hh - 1);
            let height = self.height_map.get(tx, ty, 0) as f32 / 255.0;

            let length = height * self.params.height_factor;
            let mut count = (length / self.params.control_points_distance) as usize;
            if count == 0 && length > math::EPSILON {
                count = 1;
            }
            if count == 1 {
                count = 2;
            }

            let spacing = if count == 0 {
                0.0
            } else if self.params.strict_heightmap {
                length / count as f32
            } else {
                self.params.control_points_distance
            };

            let direction = if self.params.grow_tangent { tangent } else { normal };
            self.store
                .guide_furs
                .push(guide::GuideFur::grow(uv, count, spacing, root, direction));
        }
    }

    fn synchronize_guide_furs(&mut self) {
        let Some(bridge) = self.animation.as_mut() else {
            return;
        };
        for (i, fur) in self.store.guide_furs.iter().enumerate() {
            bridge.initialize_strand(i, &fur.control_points);
        }
    }

    fn synchronize_active_lod_furs(&mut self) {
        let Some(bridge) = self.animation.as_mut() else {
            return;
        };
        let offset = self.store.guide_furs.len();
        for (i, fur) in self.store.lod_furs.iter().enumerate() {
            if fur.active {
                bridge.initialize_strand(offset + i, &fur.guide.control_points);
            }
        }
    }

    fn update_guide_furs(&mut self) {
        let Some(bridge) = self.animation.as_mut() else {
            return;
        };

        for (i, fur) in self.store.guide_furs.iter_mut().enumerate() {
            bridge.animate_strand(i, &mut fur.control_points);
        }

        let offset = self.store.guide_furs.len();
        for i in 0..self.store.lod_furs.len() {
            if self.store.lod_furs[i].active {
                bridge.animate_strand(
                    offset + i,
                    &mut self.store.lod_furs[i].guide.control_points,
                );
            } else {
                self.store.update_lod_fur(i);
            }
        }
    }

    /// Build the static parts of the render buffers: vertex pairs, UVs,
    /// the index buffer, the color jitter (stored in the binormal buffer),
    /// and the position-deviation table.
    fn build_geometry(&mut self) {
        let strand_count = self.store.strands.len();
        let total_points: usize = self
            .store
            .strands
            .iter()
            .map(|s| s.guide.point_count())
            .sum();

        self.geometry = FurGeometry::with_capacity(total_points, strand_count);
        let geo = &mut self.geometry;
        let rng = &mut self.rng;

        let mut offset = 0usize;
        for strand in &self.store.strands {
            let cp = &strand.guide.control_points;
            let cpc = cp.len();

            for y in 0..cpc {
                let v = 2 * (offset + y);
                geo.positions[v] = cp[y];
                geo.positions[v + 1] = cp[y] + Vec3::new(-0.01, 0.0, 0.0);
                geo.texcoords[v] = strand.guide.uv;
                geo.texcoords[v + 1] = strand.guide.uv;
            }

            if cpc >= 2 {
                for y in 0..2 * (cpc - 1) {
                    let v = (2 * offset + y) as u32;
                    if y % 2 == 0 {
                        geo.indices.push([v, v + 1, v + 2]);
                    } else {
                        geo.indices.push([v, v + 2, v + 1]);
                    }
                }
            }

            // Color jitter: x/z random, y the normalized distance from the
            // root, consumed by the strip-width term during updates.
            let length = if cpc == 0 {
                0.0
            } else {
                (cp[cpc - 1] - cp[0]).length()
            };
            for y in 0..cpc {
                let along = (cp[y] - cp[0]).length();
                let ratio = if length < math::EPSILON { 0.0 } else { along / length };
                let jitter = Vec3::new(rng.next_f32(), ratio, rng.next_f32());
                geo.binormals[2 * (offset + y)] = jitter;
                geo.binormals[2 * (offset + y) + 1] = jitter;
            }

            offset += cpc;
        }

        geo.index_end = 3 * geo.indices.len();

        self.position_shift = (0..total_points)
            .map(|_| {
                Vec3::new(
                    rng.next_f32() * 2.0 - 1.0,
                    rng.next_f32() * 2.0 - 1.0,
                    rng.next_f32() * 2.0 - 1.0,
                ) * self.params.position_deviation
            })
            .collect();
    }
}
