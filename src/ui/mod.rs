//! imgui-based user interface.

pub mod manager;
pub mod panel;

pub use manager::UiManager;
pub use panel::{DragPayload, PanelContext, UiActions};
