//! Orbit versus first-person view switching
//!
//! Toggling into first person saves the orbit camera pose so leaving
//! walk mode restores exactly the view the user left. Pointer capture
//! is deferred: entering first person only arms capture, the actual
//! grab happens on the next click inside the window.

use crate::gfx::camera::first_person::MovementKeys;
use crate::gfx::camera::{FirstPersonCamera, OrbitCamera};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Orbit,
    FirstPerson,
}

pub struct ViewModeController {
    mode: ViewMode,
    saved_orbit: Option<OrbitCamera>,
    pub walker: FirstPersonCamera,
    /// True between entering first person and the click that grabs the
    /// pointer.
    pub pending_capture: bool,
}

impl ViewModeController {
    pub fn new(aspect: f32) -> Self {
        Self {
            mode: ViewMode::Orbit,
            saved_orbit: None,
            walker: FirstPersonCamera::new(aspect),
            pending_capture: false,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_first_person(&self) -> bool {
        self.mode == ViewMode::FirstPerson
    }

    /// Enters walk mode, stashing the orbit pose. No-op when already
    /// walking.
    pub fn enter_first_person(&mut self, orbit: &OrbitCamera) {
        if self.mode == ViewMode::FirstPerson {
            return;
        }
        self.saved_orbit = Some(*orbit);
        self.walker.respawn();
        self.mode = ViewMode::FirstPerson;
        self.pending_capture = true;
        log::info!("entering first person view");
    }

    /// Leaves walk mode and returns the orbit camera to restore, if a
    /// pose was saved.
    pub fn exit_first_person(&mut self) -> Option<OrbitCamera> {
        if self.mode == ViewMode::Orbit {
            return None;
        }
        self.mode = ViewMode::Orbit;
        self.pending_capture = false;
        // A key released after the mode switch would otherwise stick.
        self.walker.keys = MovementKeys::default();
        log::info!("returning to orbit view");
        self.saved_orbit.take()
    }

    pub fn toggle(&mut self, orbit: &OrbitCamera) -> Option<OrbitCamera> {
        match self.mode {
            ViewMode::Orbit => {
                self.enter_first_person(orbit);
                None
            }
            ViewMode::FirstPerson => self.exit_first_person(),
        }
    }

    /// Called when the click lands and the window grabs the pointer.
    pub fn capture_granted(&mut self) {
        self.pending_capture = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector3, Zero};

    fn orbit() -> OrbitCamera {
        OrbitCamera::new(14.14, 0.785, 0.0, Vector3::zero(), 1.5)
    }

    #[test]
    fn test_toggle_round_trip_restores_orbit_pose() {
        let mut controller = ViewModeController::new(1.5);
        let mut camera = orbit();
        camera.add_yaw(0.7);
        camera.set_distance(22.0);

        assert!(controller.toggle(&camera).is_none());
        assert!(controller.is_first_person());
        assert!(controller.pending_capture);

        let restored = controller.toggle(&camera).unwrap();
        assert_eq!(restored.yaw, camera.yaw);
        assert_eq!(restored.distance, camera.distance);
        assert_eq!(restored.pitch, camera.pitch);
        assert_eq!(controller.mode(), ViewMode::Orbit);
    }

    #[test]
    fn test_enter_twice_keeps_first_saved_pose() {
        let mut controller = ViewModeController::new(1.5);
        let camera = orbit();
        controller.enter_first_person(&camera);

        let mut moved = camera;
        moved.add_yaw(2.0);
        // Second enter while already walking must not clobber the save
        controller.enter_first_person(&moved);

        let restored = controller.exit_first_person().unwrap();
        assert_eq!(restored.yaw, camera.yaw);
    }

    #[test]
    fn test_exit_without_enter_is_none() {
        let mut controller = ViewModeController::new(1.5);
        assert!(controller.exit_first_person().is_none());
    }

    #[test]
    fn test_walker_respawns_on_entry() {
        let mut controller = ViewModeController::new(1.5);
        let camera = orbit();

        controller.enter_first_person(&camera);
        controller.walker.keys.forward = true;
        for _ in 0..30 {
            controller.walker.update(1.0 / 60.0);
        }
        controller.exit_first_person();

        controller.enter_first_person(&camera);
        assert!(controller.walker.position.x.abs() < f32::EPSILON);
        assert!(controller.walker.position.z.abs() < f32::EPSILON);
    }
}
