//! Furgen - density-driven fur and hair strand generation
//!
//! Grows guide hairs from a base mesh, densifies them with a texture-driven
//! LOD pass, emits renderable fur strands, and re-interpolates everything
//! per frame from a pluggable animation bridge.

pub mod core;
pub mod math;
pub mod texture;
pub mod mesh;
pub mod fur;
pub mod animation;
