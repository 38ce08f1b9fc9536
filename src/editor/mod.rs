//! Room editing logic: furniture placement, floor plan import, and
//! view mode switching.

pub mod floorplan;
pub mod placement;
pub mod view_mode;

pub use floorplan::{rasterize, WallCell};
pub use placement::{FurnitureInstance, PlacementController, Selection};
pub use view_mode::{ViewMode, ViewModeController};
