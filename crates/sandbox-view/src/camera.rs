//! First-person fly camera.

use nalgebra::{Isometry3, Matrix4, Point3, Vector3};
use sandbox_render::RenderDevice;
use sandbox_scene::CameraParams;

/// Pitch limit in degrees; keeps the view direction off the up axis.
pub const MAX_PITCH: f32 = 89.0;

/// Perspective camera driven by yaw/pitch angles.
///
/// Angles are in degrees. Yaw 0 looks down -Z, positive yaw turns right,
/// positive pitch looks up.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Point3<f32>,
    yaw: f32,
    pitch: f32,
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    sensitivity: f32,
}

impl Camera {
    /// Build a camera from scene parameters for a viewport aspect ratio.
    pub fn new(params: &CameraParams, aspect: f32) -> Self {
        let p = params.position;
        Self {
            position: Point3::new(p.x, p.y, p.z),
            yaw: params.yaw.rem_euclid(360.0),
            pitch: params.pitch.clamp(-MAX_PITCH, MAX_PITCH),
            fov: params.fov,
            aspect,
            near: params.near,
            far: params.far,
            sensitivity: 0.1,
        }
    }

    /// Set degrees of rotation per unit of pointer motion.
    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Eye position.
    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    /// Heading in degrees, in `0..360`.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Elevation in degrees, in `-89..=89`.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Vertical field of view in degrees.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Viewport width over height.
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Update the aspect ratio after a resize.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vector3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.to_radians().sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.to_radians().sin_cos();
        Vector3::new(sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    /// Unit vector to the right of the view direction, parallel to the ground.
    pub fn right(&self) -> Vector3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.to_radians().sin_cos();
        Vector3::new(cos_yaw, 0.0, sin_yaw)
    }

    /// Turn the camera by a pointer delta in screen units (y grows downwards).
    pub fn on_input_delta(&mut self, dx: f32, dy: f32) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.yaw = (self.yaw + dx * self.sensitivity).rem_euclid(360.0);
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Translate relative to the current orientation.
    pub fn move_local(&mut self, forward: f32, right: f32, up: f32) {
        self.position += self.forward() * forward + self.right() * right + Vector3::y() * up;
    }

    /// Perspective projection matrix.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov.to_radians(), self.near, self.far)
    }

    /// World-to-eye matrix.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let target = self.position + self.forward();
        Isometry3::look_at_rh(&self.position, &target, &Vector3::y()).to_homogeneous()
    }

    /// Hand the projection matrix to the device.
    pub fn apply_projection(&self, device: &mut dyn RenderDevice) {
        device.set_projection(&self.projection_matrix());
    }

    /// Hand the view matrix to the device.
    pub fn apply_view(&self, device: &mut dyn RenderDevice) {
        device.set_view(&self.view_matrix());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sandbox_scene::Vec3;

    fn camera() -> Camera {
        Camera::new(&CameraParams::default(), 4.0 / 3.0)
    }

    #[test]
    fn projection_uses_vertical_fov() {
        let params = CameraParams {
            fov: 90.0,
            ..CameraParams::default()
        };
        let cam = Camera::new(&params, 2.0);
        assert_relative_eq!(cam.fov(), 90.0);

        let proj = cam.projection_matrix();
        let focal = 1.0 / (cam.fov().to_radians() / 2.0).tan();
        assert_relative_eq!(proj[(1, 1)], focal, epsilon = 1e-6);
        assert_relative_eq!(proj[(0, 0)], focal / cam.aspect(), epsilon = 1e-6);
    }

    #[test]
    fn default_looks_down_negative_z() {
        let forward = camera().forward();
        assert_relative_eq!(forward, -Vector3::z(), epsilon = 1e-6);
        assert_relative_eq!(camera().right(), Vector3::x(), epsilon = 1e-6);
    }

    #[test]
    fn yaw_turns_right() {
        let mut cam = camera();
        cam.on_input_delta(900.0, 0.0);
        assert_relative_eq!(cam.yaw(), 90.0, epsilon = 1e-4);
        assert_relative_eq!(cam.forward(), Vector3::x(), epsilon = 1e-5);

        cam.on_input_delta(-1800.0, 0.0);
        assert_relative_eq!(cam.yaw(), 270.0, epsilon = 1e-4);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = camera();
        cam.on_input_delta(0.0, -10_000.0);
        assert_eq!(cam.pitch(), MAX_PITCH);
        cam.on_input_delta(0.0, 50_000.0);
        assert_eq!(cam.pitch(), -MAX_PITCH);

        let params = CameraParams {
            pitch: 120.0,
            ..CameraParams::default()
        };
        assert_eq!(Camera::new(&params, 1.0).pitch(), MAX_PITCH);
    }

    #[test]
    fn move_local_follows_heading() {
        let params = CameraParams {
            position: Vec3::new(0.0, 0.0, 0.0),
            yaw: 90.0,
            ..CameraParams::default()
        };
        let mut cam = Camera::new(&params, 1.0);
        cam.move_local(2.0, 1.0, 3.0);
        assert_relative_eq!(cam.position(), Point3::new(2.0, 3.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn view_matrix_maps_eye_to_origin() {
        let cam = camera();
        let eye = cam.view_matrix().transform_point(&cam.position());
        assert_relative_eq!(eye, Point3::origin(), epsilon = 1e-5);

        let ahead = cam.position() + cam.forward() * 5.0;
        let ahead = cam.view_matrix().transform_point(&ahead);
        assert_relative_eq!(ahead, Point3::new(0.0, 0.0, -5.0), epsilon = 1e-4);
    }

    #[test]
    fn invalid_aspect_is_ignored() {
        let mut cam = camera();
        cam.set_aspect(0.0);
        cam.set_aspect(f32::NAN);
        assert_relative_eq!(cam.aspect(), 4.0 / 3.0);
        cam.set_aspect(2.0);
        assert_eq!(cam.aspect(), 2.0);
        assert!(cam.projection_matrix().iter().all(|v| v.is_finite()));
    }
}
