//! Verlet rope strand animation.
//!
//! The physics-delegating side of the bridge, rendered in-crate: each
//! registered strand becomes a rope of particles integrated with Verlet
//! steps and relaxed with fixed-distance constraints, anchored at its root
//! control point. The host drives the simulation with
//! [`RopeControl::step`] before each fur update.

use std::collections::HashMap;

use glam::Vec3;

use crate::animation::StrandAnimationControl;

/// Tuning for the rope simulation.
#[derive(Clone, Copy, Debug)]
pub struct RopeParams {
    pub gravity: Vec3,
    /// Velocity retained per step, in [0, 1].
    pub damping: f32,
    /// Constraint relaxation iterations per step.
    pub iterations: usize,
}

impl Default for RopeParams {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            damping: 0.98,
            iterations: 10,
        }
    }
}

#[derive(Clone, Debug)]
struct Rope {
    points: Vec<Vec3>,
    prev: Vec<Vec3>,
    rest_lengths: Vec<f32>,
}

/// Rope-per-strand animation control.
#[derive(Debug, Default)]
pub struct RopeControl {
    params: RopeParams,
    ropes: HashMap<usize, Rope>,
}

impl RopeControl {
    pub fn new(params: RopeParams) -> Self {
        Self {
            params,
            ropes: HashMap::new(),
        }
    }

    pub fn strand_count(&self) -> usize {
        self.ropes.len()
    }

    /// Move the anchor of one rope (e.g. to follow a moving scalp).
    pub fn set_anchor(&mut self, id: usize, anchor: Vec3) {
        if let Some(rope) = self.ropes.get_mut(&id) {
            if let Some(root) = rope.points.first_mut() {
                *root = anchor;
            }
        }
    }

    /// Advance every rope by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        for rope in self.ropes.values_mut() {
            // Verlet integration; the root particle is pinned.
            for i in 1..rope.points.len() {
                let velocity = (rope.points[i] - rope.prev[i]) * self.params.damping;
                rope.prev[i] = rope.points[i];
                rope.points[i] += velocity + self.params.gravity * dt * dt;
            }

            // Distance-constraint relaxation.
            for _ in 0..self.params.iterations {
                for i in 1..rope.points.len() {
                    let rest = rope.rest_lengths[i - 1];
                    let delta = rope.points[i] - rope.points[i - 1];
                    let dist = delta.length();
                    if dist < 1e-8 {
                        continue;
                    }
                    let correction = delta * ((dist - rest) / dist);
                    if i == 1 {
                        rope.points[i] -= correction;
                    } else {
                        rope.points[i] -= correction * 0.5;
                        rope.points[i - 1] += correction * 0.5;
                    }
                }
            }
        }
    }
}

impl StrandAnimationControl for RopeControl {
    fn initialize_strand(&mut self, id: usize, control_points: &[Vec3]) {
        let points = control_points.to_vec();
        let rest_lengths = control_points
            .windows(2)
            .map(|w| (w[1] - w[0]).length())
            .collect();
        self.ropes.insert(
            id,
            Rope {
                prev: points.clone(),
                points,
                rest_lengths,
            },
        );
    }

    fn animate_strand(&mut self, id: usize, control_points: &mut [Vec3]) {
        let Some(rope) = self.ropes.get(&id) else {
            return;
        };
        assert_eq!(
            control_points.len(),
            rope.points.len(),
            "strand {} control point count changed since initialization",
            id
        );
        control_points.copy_from_slice(&rope.points);
    }

    fn remove_strand(&mut self, id: usize) {
        self.ropes.remove(&id);
    }

    fn remove_all_strands(&mut self) {
        self.ropes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn horizontal_strand() -> Vec<Vec3> {
        vec![
            Vec3::ZERO,
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_root_stays_pinned() {
        let mut control = RopeControl::new(RopeParams::default());
        control.initialize_strand(0, &horizontal_strand());
        for _ in 0..60 {
            control.step(1.0 / 60.0);
        }
        let mut points = vec![Vec3::ZERO; 3];
        control.animate_strand(0, &mut points);
        assert_relative_eq!(points[0].distance(Vec3::ZERO), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_gravity_pulls_tip_down() {
        let mut control = RopeControl::new(RopeParams::default());
        control.initialize_strand(0, &horizontal_strand());
        for _ in 0..120 {
            control.step(1.0 / 60.0);
        }
        let mut points = vec![Vec3::ZERO; 3];
        control.animate_strand(0, &mut points);
        assert!(points[2].y < -0.1, "tip did not sag: {:?}", points[2]);
    }

    #[test]
    fn test_segment_lengths_roughly_preserved() {
        let mut control = RopeControl::new(RopeParams::default());
        control.initialize_strand(0, &horizontal_strand());
        for _ in 0..120 {
            control.step(1.0 / 60.0);
        }
        let mut points = vec![Vec3::ZERO; 3];
        control.animate_strand(0, &mut points);
        for w in points.windows(2) {
            let len = (w[1] - w[0]).length();
            assert!((len - 0.5).abs() < 0.05, "segment length drifted: {}", len);
        }
    }

    #[test]
    fn test_animate_unknown_is_noop() {
        let mut control = RopeControl::new(RopeParams::default());
        let mut points = horizontal_strand();
        control.animate_strand(9, &mut points);
        assert_eq!(points[2], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "control point count changed")]
    fn test_count_mismatch_panics() {
        let mut control = RopeControl::new(RopeParams::default());
        control.initialize_strand(0, &horizontal_strand());
        let mut points = vec![Vec3::ZERO; 2];
        control.animate_strand(0, &mut points);
    }
}
