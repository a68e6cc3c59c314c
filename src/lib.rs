//! Core modules for an interactive renderer that compares several
//! real-time shadow techniques on a small animated scene.
//!
//! The crate separates the CPU-side core (camera, input, scene layout,
//! the shadow-technique state machine, mesh producers) from the GPU
//! renderer so that the interesting logic stays testable without a
//! device.

pub mod camera;
pub mod input;
pub mod mesh;
pub mod render;
pub mod scene;
pub mod state;

pub use camera::ArcballCamera;
pub use input::{InputState, KeyCode, MouseButton, NamedKey};
pub use mesh::{MeshData, Vertex};
pub use render::{
    BlockError, BlockLayout, BlockValue, CubemapKind, FramePlan, ProgramError, Renderer,
};
pub use scene::{Material, SceneInstances};
pub use state::{RenderState, ShadowOptions, ShadowTechnique};
