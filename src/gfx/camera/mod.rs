pub mod camera_controller;
pub mod camera_utils;
pub mod first_person;
pub mod orbit_camera;

// Re-export main types
pub use camera_controller::CameraController;
pub use camera_utils::{CameraManager, CameraUniform};
pub use first_person::FirstPersonCamera;
pub use orbit_camera::OrbitCamera;
