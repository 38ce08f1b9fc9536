//! Scene graph for the room editor
//!
//! A [`Scene`] owns the camera, the flat object list, and the material
//! store. Objects are tagged with an [`ObjectLayer`] so the editor can
//! address the ground plane, imported walls, and placed furniture as
//! separate groups.

pub mod object;
pub mod scene;
pub mod vertex;

pub use object::{DrawObject, Mesh, Object, ObjectLayer, ObjectUniform};
pub use scene::Scene;
pub use vertex::Vertex3D;
