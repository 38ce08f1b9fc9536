//! Editor side panel: furniture palette, floor plan import, view mode
//! toggle, and the budget recommendation box.
//!
//! The panel never mutates the scene directly. Everything it wants
//! done is recorded in [`UiActions`] and applied by the application
//! after the frame, which keeps the UI closure free of scene borrows.

use imgui::Ui;

use crate::recommend::{RecommendDisplay, RecommendPanelState};

/// Deferred requests collected from one UI frame.
#[derive(Default)]
pub struct UiActions {
    pub toggle_view_mode: bool,
    pub clear_furniture: bool,
    pub pick_floor_plan: bool,
    pub clear_walls: bool,
}

/// Furniture key armed by dragging a palette or recommendation item.
/// The drop lands when the mouse is released over the viewport.
#[derive(Default)]
pub struct DragPayload(pub Option<String>);

impl DragPayload {
    pub fn arm(&mut self, key: &str) {
        if self.0.is_none() {
            log::debug!("dragging '{}'", key);
        }
        self.0 = Some(key.to_string());
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn is_armed(&self) -> bool {
        self.0.is_some()
    }
}

/// Read-only facts the panel displays.
pub struct PanelContext<'a> {
    pub catalog_keys: Vec<&'a str>,
    pub catalog_empty: bool,
    pub furniture_count: usize,
    pub wall_count: usize,
    pub is_first_person: bool,
    pub pending_capture: bool,
}

pub fn draw(
    ui: &Ui,
    ctx: &PanelContext,
    recommend: &mut RecommendPanelState,
    drag: &mut DragPayload,
    actions: &mut UiActions,
) {
    if ctx.is_first_person {
        draw_walk_overlay(ui, ctx.pending_capture);
        return;
    }

    ui.window("Room Planner")
        .size([320.0, 640.0], imgui::Condition::FirstUseEver)
        .position([10.0, 10.0], imgui::Condition::FirstUseEver)
        .build(|| {
            ui.text("View");
            ui.separator();
            if ui.button("Walk Through Room") {
                actions.toggle_view_mode = true;
            }

            ui.spacing();
            ui.text("Floor Plan");
            ui.separator();
            if ui.button("Import Floor Plan...") {
                actions.pick_floor_plan = true;
            }
            ui.same_line();
            if ui.button("Clear Walls") {
                actions.clear_walls = true;
            }
            ui.text(format!("{} wall cells", ctx.wall_count));

            ui.spacing();
            ui.text("Furniture");
            ui.separator();
            if ctx.catalog_empty {
                ui.text_disabled("No models loaded.");
                ui.text_disabled("Placement is unavailable.");
            } else {
                ui.text_wrapped("Drag an item into the room to place it.");
                for key in &ctx.catalog_keys {
                    draggable_item(ui, key, drag);
                }
            }

            ui.spacing();
            ui.text(format!("{} placed", ctx.furniture_count));
            if ui.button("Clear Furniture") {
                actions.clear_furniture = true;
            }

            ui.spacing();
            ui.text("Recommendations");
            ui.separator();
            ui.input_float("Budget", &mut recommend.budget_input)
                .display_format("%.0f")
                .build();
            if ui.button("Suggest Furniture") {
                recommend.submit();
            }
            if recommend.has_pending() {
                ui.same_line();
                ui.text_disabled("...");
            }

            match &recommend.display {
                RecommendDisplay::Empty => {}
                RecommendDisplay::Message(message) => {
                    ui.text_wrapped(message);
                }
                RecommendDisplay::Items(items) => {
                    let items: Vec<String> = items.clone();
                    for key in &items {
                        draggable_item(ui, key, drag);
                    }
                }
            }
        });
}

/// A selectable row that arms the drag payload while the mouse pulls
/// on it.
fn draggable_item(ui: &Ui, key: &str, drag: &mut DragPayload) {
    ui.selectable(key);
    if ui.is_item_active() && ui.is_mouse_dragging(imgui::MouseButton::Left) {
        drag.arm(key);
    }
}

fn draw_walk_overlay(ui: &Ui, pending_capture: bool) {
    ui.window("##walk_overlay")
        .position([10.0, 10.0], imgui::Condition::Always)
        .size([360.0, 90.0], imgui::Condition::Always)
        .no_decoration()
        .bg_alpha(0.35)
        .build(|| {
            if pending_capture {
                ui.text("Click to look around");
            }
            ui.text("WASD / arrows to move, Space to jump");
            ui.text("Esc to return to the editor");
        });
}
