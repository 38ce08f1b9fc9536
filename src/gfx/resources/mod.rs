//! GPU resource management: materials, global uniforms, and textures.

pub mod global_bindings;
pub mod material;
pub mod texture_resource;

pub use global_bindings::{GlobalBindings, GlobalUBO, LightConfig};
pub use material::{Material, MaterialManager};
pub use texture_resource::TextureResource;
