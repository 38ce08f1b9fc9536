//! Hearth 3D Room Planner
//!
//! A room-planning tool built on wgpu and winit: load a furniture catalog,
//! drop pieces onto the floor, convert a floor-plan image into walls, and
//! walk the result in first person.

pub mod app;
pub mod catalog;
pub mod editor;
pub mod gfx;
pub mod recommend;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::HearthApp;
pub use catalog::{AssetCatalog, CatalogEntry};

/// Creates a Hearth application with the given furniture catalog entries.
///
/// A catalog entry that fails to load aborts the whole catalog; the app
/// still starts, with placement disabled for every type.
pub fn with_catalog(entries: Vec<CatalogEntry>) -> HearthApp {
    HearthApp::new(entries)
}
