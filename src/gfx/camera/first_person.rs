use cgmath::{Matrix4, Point3, Rad, Vector3};

use super::camera_utils::{convert_matrix4_to_array, CameraUniform};
use super::orbit_camera::OPENGL_TO_WGPU_MATRIX;

const MOVE_SPEED: f32 = 10.0;
const JUMP_IMPULSE: f32 = 10.0;
const GRAVITY: f32 = 9.8 * 100.0;
const DAMPING: f32 = 10.0;
const LOOK_SENSITIVITY: f32 = 0.002;
const PITCH_LIMIT: f32 = 1.54;

/// Which movement keys are currently held, fed in from the event loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct MovementKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// Walk-through camera used while the editor is in first person mode.
///
/// Horizontal velocity decays each frame, vertical velocity integrates
/// gravity, and the eye is clamped to standing height which re-arms the
/// jump.
pub struct FirstPersonCamera {
    pub position: Point3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub eye_height: f32,
    pub keys: MovementKeys,
    velocity: Vector3<f32>,
    can_jump: bool,
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl FirstPersonCamera {
    pub fn new(aspect: f32) -> Self {
        let eye_height = 1.0;
        Self {
            position: Point3::new(0.0, eye_height, 0.0),
            yaw: 0.0,
            pitch: 0.0,
            eye_height,
            keys: MovementKeys::default(),
            velocity: Vector3::new(0.0, 0.0, 0.0),
            can_jump: true,
            aspect,
            fovy: Rad(std::f32::consts::FRAC_PI_2 * 0.8),
            znear: 0.1,
            zfar: 200.0,
        }
    }

    pub fn resize_projection(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Reset to the default standing spot at the room origin.
    pub fn respawn(&mut self) {
        self.position = Point3::new(0.0, self.eye_height, 0.0);
        self.velocity = Vector3::new(0.0, 0.0, 0.0);
        self.can_jump = true;
    }

    pub fn jump(&mut self) {
        if self.can_jump {
            self.velocity.y += JUMP_IMPULSE;
            self.can_jump = false;
        }
    }

    /// Mouse-look from raw motion deltas. Pitch is clamped short of
    /// straight up/down so the view matrix never degenerates.
    pub fn look(&mut self, dx: f64, dy: f64) {
        self.yaw -= dx as f32 * LOOK_SENSITIVITY;
        self.pitch -= dy as f32 * LOOK_SENSITIVITY;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn is_grounded(&self) -> bool {
        self.can_jump
    }

    pub fn update(&mut self, dt: f32) {
        self.velocity.x -= self.velocity.x * DAMPING * dt;
        self.velocity.z -= self.velocity.z * DAMPING * dt;

        // Velocity accumulates opposite to the intent and the position
        // step negates it again, so forward ends up along -Z at yaw 0.
        let mut dir: Vector3<f32> = Vector3::new(0.0, 0.0, 0.0);
        if self.keys.forward {
            dir.z += 1.0;
        }
        if self.keys.backward {
            dir.z -= 1.0;
        }
        if self.keys.right {
            dir.x += 1.0;
        }
        if self.keys.left {
            dir.x -= 1.0;
        }
        let len = (dir.x * dir.x + dir.z * dir.z).sqrt();
        if len > 0.0 {
            dir.x /= len;
            dir.z /= len;
            self.velocity.x -= dir.x * MOVE_SPEED * dt;
            self.velocity.z -= dir.z * MOVE_SPEED * dt;
        }

        let forward = Vector3::new(-self.yaw.sin(), 0.0, -self.yaw.cos());
        let right = Vector3::new(self.yaw.cos(), 0.0, -self.yaw.sin());

        self.position += right * (-self.velocity.x * dt);
        self.position += forward * (-self.velocity.z * dt);

        // Height integrates the pre-gravity velocity: a fresh jump
        // impulse must move the eye on the very frame it is applied.
        self.position.y += self.velocity.y * dt;
        self.velocity.y -= GRAVITY * dt;

        if self.position.y < self.eye_height {
            self.velocity.y = 0.0;
            self.position.y = self.eye_height;
            self.can_jump = true;
        }
    }

    fn view_matrix(&self) -> Matrix4<f32> {
        let cos_pitch = self.pitch.cos();
        let look = Vector3::new(
            -self.yaw.sin() * cos_pitch,
            self.pitch.sin(),
            -self.yaw.cos() * cos_pitch,
        );
        Matrix4::look_at_rh(
            self.position,
            self.position + look,
            Vector3::unit_y(),
        )
    }

    pub fn uniform(&self) -> CameraUniform {
        let proj = cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar);
        let view_proj = OPENGL_TO_WGPU_MATRIX * proj * self.view_matrix();
        CameraUniform {
            view_position: [self.position.x, self.position.y, self.position.z, 1.0],
            view_proj: convert_matrix4_to_array(view_proj),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_walker_stays_grounded() {
        let mut cam = FirstPersonCamera::new(1.5);
        for _ in 0..120 {
            cam.update(1.0 / 60.0);
        }
        assert!((cam.position.y - cam.eye_height).abs() < 1e-5);
        assert!(cam.is_grounded());
    }

    #[test]
    fn test_jump_only_while_grounded() {
        let mut cam = FirstPersonCamera::new(1.5);
        cam.jump();
        assert!(!cam.is_grounded());
        let airborne_y = {
            cam.update(0.016);
            cam.position.y
        };
        assert!(airborne_y > cam.eye_height);

        // A second jump mid-air must not add another impulse.
        let v_before = cam.velocity.y;
        cam.jump();
        assert!((cam.velocity.y - v_before).abs() < f32::EPSILON);
    }

    #[test]
    fn test_landing_rearms_jump() {
        let mut cam = FirstPersonCamera::new(1.5);
        cam.jump();
        // Gravity is strong enough to bring the walker down well within
        // a second of simulated time.
        for _ in 0..60 {
            cam.update(1.0 / 60.0);
        }
        assert!((cam.position.y - cam.eye_height).abs() < 1e-5);
        assert!(cam.is_grounded());
    }

    #[test]
    fn test_forward_key_moves_along_view_direction() {
        let mut cam = FirstPersonCamera::new(1.5);
        cam.keys.forward = true;
        for _ in 0..30 {
            cam.update(1.0 / 60.0);
        }
        // yaw = 0 looks down -Z, so forward motion decreases z.
        assert!(cam.position.z < -0.01);
        assert!(cam.position.x.abs() < 1e-4);
    }

    #[test]
    fn test_backward_key_moves_opposite_view_direction() {
        let mut cam = FirstPersonCamera::new(1.5);
        cam.keys.backward = true;
        for _ in 0..30 {
            cam.update(1.0 / 60.0);
        }
        assert!(cam.position.z > 0.01);
        assert!(cam.position.x.abs() < 1e-4);
    }

    #[test]
    fn test_walk_speed_settles_at_damped_limit() {
        let mut cam = FirstPersonCamera::new(1.5);
        cam.keys.forward = true;
        // Long enough for acceleration and damping to balance out.
        for _ in 0..240 {
            cam.update(1.0 / 60.0);
        }
        let z_before = cam.position.z;
        cam.update(1.0 / 60.0);
        let speed = (z_before - cam.position.z) * 60.0;
        let limit = MOVE_SPEED / DAMPING;
        assert!((speed - limit).abs() < 0.05, "settled speed {}", speed);
    }

    #[test]
    fn test_velocity_decays_after_release() {
        let mut cam = FirstPersonCamera::new(1.5);
        cam.keys.forward = true;
        for _ in 0..30 {
            cam.update(1.0 / 60.0);
        }
        cam.keys.forward = false;
        let z_at_release = cam.position.z;
        for _ in 0..120 {
            cam.update(1.0 / 60.0);
        }
        let drift = (cam.position.z - z_at_release).abs();
        // Damping kills horizontal speed quickly, so the coast distance
        // is small compared to the driven distance.
        assert!(drift < z_at_release.abs());
    }

    #[test]
    fn test_look_pitch_clamped() {
        let mut cam = FirstPersonCamera::new(1.5);
        cam.look(0.0, -10_000.0);
        assert!(cam.pitch <= PITCH_LIMIT);
        cam.look(0.0, 10_000.0);
        assert!(cam.pitch >= -PITCH_LIMIT);
    }

    #[test]
    fn test_respawn_resets_pose() {
        let mut cam = FirstPersonCamera::new(1.5);
        cam.keys.forward = true;
        cam.jump();
        for _ in 0..10 {
            cam.update(1.0 / 60.0);
        }
        cam.respawn();
        assert!((cam.position.x).abs() < f32::EPSILON);
        assert!((cam.position.y - cam.eye_height).abs() < f32::EPSILON);
        assert!((cam.position.z).abs() < f32::EPSILON);
        assert!(cam.is_grounded());
    }
}
