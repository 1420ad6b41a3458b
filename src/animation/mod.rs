//! Strand animation bridge.
//!
//! The fur core never simulates hair itself; it hands guide-hair polylines
//! to a [`StrandAnimationControl`] and reads updated control points back
//! each frame. Two strategies ship with the crate: a kinematic one that
//! rides a deforming base mesh ([`kinematic::KinematicControl`]) and a
//! small Verlet rope simulation ([`rope::RopeControl`]).

pub mod kinematic;
pub mod rope;

pub use kinematic::KinematicControl;
pub use rope::RopeControl;

use glam::Vec3;

/// Per-strand simulation contract consumed by the fur core.
///
/// Strand ids live in the combined guide + LOD index space. Registration is
/// idempotent per id (re-registration replaces); removal of an unknown id
/// is a no-op. `animate_strand` must be called with the same point count
/// that was registered: a mismatch means generation and animation have
/// desynchronized and is a fatal contract violation (implementations
/// assert), not a recoverable error.
pub trait StrandAnimationControl {
    /// Register a guide hair with the simulator.
    fn initialize_strand(&mut self, id: usize, control_points: &[Vec3]);

    /// Overwrite the control points with the simulator's current state.
    fn animate_strand(&mut self, id: usize, control_points: &mut [Vec3]);

    /// Release simulator-side resources for one strand.
    fn remove_strand(&mut self, id: usize);

    /// Release all simulator-side resources.
    fn remove_all_strands(&mut self);
}
