use std::sync::Arc;
use std::time::Instant;

use cgmath::Vector3;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowAttributes},
};

use crate::catalog::{AssetCatalog, CatalogEntry};
use crate::editor::{floorplan, PlacementController, ViewModeController};
use crate::gfx::{
    camera::{CameraController, CameraManager, OrbitCamera},
    geometry::generate_plane,
    picking::screen_to_ray,
    ObjectLayer, RenderEngine, Scene,
};
use crate::recommend::{RecommendPanelState, DEFAULT_ENDPOINT};
use crate::ui::{panel, DragPayload, PanelContext, UiActions, UiManager};

const FLOOR_SIZE: f32 = 20.0;

/// Top-level application: owns the event loop and the editor state.
pub struct HearthApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    catalog: AssetCatalog,
    placement: PlacementController,
    view: ViewModeController,
    recommend: RecommendPanelState,
    drag: DragPayload,
    cursor_pos: (f32, f32),
    shift_held: bool,
    last_frame: Instant,
}

impl HearthApp {
    /// Creates the application with the given furniture catalog entries.
    ///
    /// A catalog entry that fails to load aborts the whole catalog; the
    /// app still starts, with placement disabled for every type.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let event_loop = EventLoop::new().expect("Failed to create event loop");

        let camera = OrbitCamera::new(14.14, 0.785, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.5);
        let controller = CameraController::new(0.005, 0.8);
        let camera_manager = CameraManager::new(camera, controller);

        let mut scene = Scene::new(camera_manager);
        scene.add_material_rgb("floor", 0.55, 0.55, 0.55, 0.0, 0.9);
        let floor = generate_plane(FLOOR_SIZE, FLOOR_SIZE);
        let ground = scene.add_object_from_geometry("ground", ObjectLayer::Ground, &[floor]);
        if let Some(object) = scene.find_object_mut(&ground) {
            object.set_material("floor");
            object.casts_shadow = false;
        }

        let catalog = match AssetCatalog::load(&entries) {
            Ok(catalog) => catalog,
            Err(err) => {
                log::error!("failed to load furniture catalog: {err}");
                AssetCatalog::empty()
            }
        };

        Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                ui_manager: None,
                scene,
                catalog,
                placement: PlacementController::new(),
                view: ViewModeController::new(1.5),
                recommend: RecommendPanelState::new(DEFAULT_ENDPOINT),
                drag: DragPayload::default(),
                cursor_pos: (0.0, 0.0),
                shift_held: false,
                last_frame: Instant::now(),
            },
        }
    }

    /// Runs the application, consuming self and starting the event loop.
    pub fn run(mut self) {
        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .expect("Failed to run event loop");
    }
}

impl AppState {
    fn cursor_ray(&self, engine: &RenderEngine) -> crate::gfx::picking::Ray {
        let (width, height) = engine.get_surface_size();
        screen_to_ray(
            self.cursor_pos,
            (width as f32, height as f32),
            &self.scene.camera_manager.camera,
        )
    }

    fn release_cursor(&self, window: &Window) {
        if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("failed to release cursor: {err}");
        }
        window.set_cursor_visible(true);
    }

    fn capture_cursor(&self, window: &Window) -> bool {
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                window.set_cursor_visible(false);
                true
            }
            Err(err) => {
                log::warn!("failed to capture cursor: {err}");
                false
            }
        }
    }

    fn orbit_window_event(&mut self, event_loop: &ActiveEventLoop, event: WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_pos = (position.x as f32, position.y as f32);
                if self.placement.is_dragging() {
                    let Some(engine) = self.render_engine.as_ref() else {
                        return;
                    };
                    let ray = self.cursor_ray(engine);
                    self.placement.drag_to(&mut self.scene, &ray);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                let Some(engine) = self.render_engine.as_ref() else {
                    return;
                };
                let ray = self.cursor_ray(engine);
                if self.placement.select_at(&self.scene, &ray) {
                    // A single gesture never both orbits and drags.
                    self.scene.camera_manager.controller.enabled = false;
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(key) = self.drag.take() {
                    let Some(engine) = self.render_engine.as_ref() else {
                        return;
                    };
                    let ray = self.cursor_ray(engine);
                    self.placement
                        .add_instance(&mut self.scene, &self.catalog, &key, &ray);
                }
                self.placement.release_selection();
                self.scene.camera_manager.controller.enabled = true;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if self.shift_held && self.placement.is_dragging() {
                    let scroll = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                    };
                    if scroll != 0.0 {
                        self.placement.scale_selected(&mut self.scene, scroll > 0.0);
                    }
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.shift_held = modifiers.state().shift_key();
            }
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if key_event.state != ElementState::Pressed {
                    return;
                }
                match &key_event.logical_key {
                    Key::Character(text) => match text.as_str() {
                        "r" => self.placement.rotate_selected(&mut self.scene, false),
                        "R" => self.placement.rotate_selected(&mut self.scene, true),
                        "+" | "=" => self.placement.scale_selected(&mut self.scene, true),
                        "-" | "_" => self.placement.scale_selected(&mut self.scene, false),
                        "0" => self
                            .placement
                            .reset_scale_selected(&mut self.scene, &self.catalog),
                        _ => (),
                    },
                    Key::Named(winit::keyboard::NamedKey::Escape) => {
                        event_loop.exit();
                    }
                    _ => (),
                }
            }
            _ => (),
        }
    }

    fn walk_window_event(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if self.view.pending_capture {
                    let Some(window) = self.window.clone() else {
                        return;
                    };
                    if self.capture_cursor(&window) {
                        self.view.capture_granted();
                    }
                }
            }
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                let pressed = key_event.state == ElementState::Pressed;
                let PhysicalKey::Code(code) = key_event.physical_key else {
                    return;
                };
                let keys = &mut self.view.walker.keys;
                match code {
                    KeyCode::KeyW | KeyCode::ArrowUp => keys.forward = pressed,
                    KeyCode::KeyS | KeyCode::ArrowDown => keys.backward = pressed,
                    KeyCode::KeyA | KeyCode::ArrowLeft => keys.left = pressed,
                    KeyCode::KeyD | KeyCode::ArrowRight => keys.right = pressed,
                    KeyCode::Space => {
                        if pressed {
                            self.view.walker.jump();
                        }
                    }
                    KeyCode::Escape => {
                        if pressed {
                            self.exit_walk_mode();
                        }
                    }
                    _ => (),
                }
            }
            _ => (),
        }
    }

    fn exit_walk_mode(&mut self) {
        if let Some(orbit) = self.view.exit_first_person() {
            self.scene.camera_manager.camera = orbit;
        }
        if let Some(window) = self.window.clone() {
            self.release_cursor(&window);
        }
    }

    fn apply_ui_actions(&mut self, actions: UiActions) {
        if actions.toggle_view_mode {
            if let Some(orbit) = self.view.toggle(&self.scene.camera_manager.camera) {
                self.scene.camera_manager.camera = orbit;
                if let Some(window) = self.window.clone() {
                    self.release_cursor(&window);
                }
            }
        }
        if actions.clear_furniture {
            self.placement.clear_all(&mut self.scene);
        }
        if actions.clear_walls {
            let removed = self.scene.remove_layer(ObjectLayer::Wall);
            log::info!("cleared {removed} wall segments");
        }
        if actions.pick_floor_plan {
            self.import_floor_plan();
        }
    }

    fn import_floor_plan(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp"])
            .pick_file()
        else {
            return;
        };
        match floorplan::load_image(&path) {
            Ok(plan) => {
                let cells = floorplan::rasterize(&plan);
                floorplan::apply_to_scene(&mut self.scene, &cells);
            }
            Err(err) => {
                log::error!("failed to load floor plan {}: {err}", path.display());
            }
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if self.view.is_first_person() {
            // Cap dt so a stalled frame cannot launch the walker.
            self.view.walker.update(dt.min(0.1));
        }

        self.scene.update();

        let Some(engine) = self.render_engine.as_mut() else {
            return;
        };
        let uniform = if self.view.is_first_person() {
            self.view.walker.uniform()
        } else {
            self.scene.camera_manager.camera.uniform
        };
        engine.update(uniform);

        self.scene.init_gpu_resources(
            engine.device(),
            engine.queue(),
            engine.object_bind_group_layout(),
        );
        self.scene.update_all_transforms(engine.queue());

        self.recommend.poll();

        let (Some(ui_manager), Some(window)) = (self.ui_manager.as_mut(), self.window.as_ref())
        else {
            return;
        };

        let wall_count = self
            .scene
            .objects
            .iter()
            .filter(|object| object.layer == ObjectLayer::Wall)
            .count();
        let ctx = PanelContext {
            catalog_keys: self.catalog.keys(),
            catalog_empty: self.catalog.is_empty(),
            furniture_count: self.placement.instances().len(),
            wall_count,
            is_first_person: self.view.is_first_person(),
            pending_capture: self.view.pending_capture,
        };

        let mut actions = UiActions::default();
        let recommend = &mut self.recommend;
        let drag = &mut self.drag;
        ui_manager.update_logic(window, |ui| {
            panel::draw(ui, &ctx, recommend, drag, &mut actions);
        });

        engine.render_frame_with_ui(&self.scene, |device, queue, encoder, color_attachment| {
            ui_manager.render_display_only(device, queue, encoder, color_attachment);
        });

        self.apply_ui_actions(actions);
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title("hearth room planner")
            .with_inner_size(winit::dpi::LogicalSize::new(1200, 800));
        if let Ok(window) = event_loop.create_window(attributes) {
            let window_handle = Arc::new(window);
            self.window = Some(window_handle.clone());

            let (width, height) = window_handle.inner_size().into();

            let window_clone = window_handle.clone();
            let renderer = pollster::block_on(async move {
                RenderEngine::new(window_clone, width, height).await
            });

            let ui_manager = UiManager::new(
                renderer.device(),
                renderer.queue(),
                renderer.surface_format(),
                &window_handle,
            );

            self.scene
                .camera_manager
                .camera
                .resize_projection(width, height);
            self.view
                .walker
                .resize_projection(width as f32 / height as f32);

            self.ui_manager = Some(ui_manager);
            self.render_engine = Some(renderer);
            self.last_frame = Instant::now();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // UI gets first refusal on input.
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) {
                // A release swallowed by the panel still ends the drag,
                // otherwise the payload would fire on the next click.
                if matches!(
                    event,
                    WindowEvent::MouseInput {
                        state: ElementState::Released,
                        button: MouseButton::Left,
                        ..
                    }
                ) {
                    self.drag.take();
                }
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if width == 0 || height == 0 {
                    return;
                }
                self.scene
                    .camera_manager
                    .camera
                    .resize_projection(width, height);
                self.view
                    .walker
                    .resize_projection(width as f32 / height as f32);
                if let Some(engine) = self.render_engine.as_mut() {
                    engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            other => {
                if self.view.is_first_person() {
                    self.walk_window_event(other);
                } else {
                    self.orbit_window_event(event_loop, other);
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        if self.view.is_first_person() {
            if self.view.pending_capture {
                return;
            }
            if let winit::event::DeviceEvent::MouseMotion { delta } = event {
                self.view.walker.look(delta.0, delta.1);
                window.request_redraw();
            }
            return;
        }

        if let Some(ui_manager) = self.ui_manager.as_ref() {
            let io = ui_manager.context.io();
            if io.want_capture_mouse || io.want_capture_keyboard {
                return;
            }
        }

        self.scene.camera_manager.process_event(&event, &window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
