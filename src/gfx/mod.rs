//! Graphics layer: cameras, geometry, picking, rendering, resources,
//! and the scene graph.

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

pub use rendering::RenderEngine;
pub use scene::{Object, ObjectLayer, Scene};
