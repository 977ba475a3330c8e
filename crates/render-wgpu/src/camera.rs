use glam::{Mat4, UVec2, Vec2, Vec3};
use pixelgrab_common::Ray;

/// First-person camera: yaw/pitch look, movement on the horizontal plane.
///
/// Lives outside the kernel; the interaction step only reads its position and
/// the facing ray it produces.
#[derive(Debug, Clone)]
pub struct FirstPersonCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for FirstPersonCamera {
    fn default() -> Self {
        Self::looking_at(Vec3::new(10.0, 2.0, 10.0), Vec3::ZERO)
    }
}

impl FirstPersonCamera {
    /// Camera at `position` facing `target`.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let dir = (target - position).try_normalize().unwrap_or(Vec3::NEG_Z);
        Self {
            position,
            yaw: dir.z.atan2(dir.x),
            pitch: dir.y.clamp(-1.0, 1.0).asin(),
            fov: 60.0_f32.to_radians(),
            aspect: 1000.0 / 600.0,
            near: 0.01,
            far: 1000.0,
            speed: 5.0,
            sensitivity: 0.003,
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    /// Forward projected onto the ground plane.
    pub fn heading(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    pub fn right(&self) -> Vec3 {
        self.heading().cross(Vec3::Y).normalize()
    }

    pub fn move_forward(&mut self, dt: f32) {
        self.position += self.heading() * self.speed * dt;
    }

    pub fn move_backward(&mut self, dt: f32) {
        self.position -= self.heading() * self.speed * dt;
    }

    pub fn move_left(&mut self, dt: f32) {
        self.position -= self.right() * self.speed * dt;
    }

    pub fn move_right(&mut self, dt: f32) {
        self.position += self.right() * self.speed * dt;
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self.pitch.clamp(
            -89.0_f32.to_radians(),
            89.0_f32.to_radians(),
        );
    }

    pub fn set_viewport(&mut self, size: UVec2) {
        self.aspect = size.x as f32 / size.y.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space ray from the camera through `pointer` (pixels, origin
    /// top-left) on a viewport of `size` pixels.
    pub fn pointer_ray(&self, pointer: Vec2, size: UVec2) -> Ray {
        let size = size.max(UVec2::ONE).as_vec2();
        let ndc = Vec2::new(
            pointer.x / size.x * 2.0 - 1.0,
            1.0 - pointer.y / size.y * 2.0,
        );
        let inv = self.view_projection().inverse();
        let unproject = |depth: f32| {
            let p = inv * ndc.extend(depth).extend(1.0);
            p.truncate() / p.w
        };
        let near = unproject(0.0);
        let far = unproject(1.0);
        Ray::new(self.position, far - near)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_faces_origin() {
        let cam = FirstPersonCamera::default();
        assert_eq!(cam.position, Vec3::new(10.0, 2.0, 10.0));
        let expected = (Vec3::ZERO - cam.position).normalize();
        assert!(cam.forward().abs_diff_eq(expected, 1e-5));
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn walking_stays_on_the_ground_plane() {
        let mut cam = FirstPersonCamera::default();
        let start = cam.position;
        cam.move_forward(1.0);
        cam.move_right(0.5);
        assert_ne!(cam.position, start);
        assert_eq!(cam.position.y, start.y);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = FirstPersonCamera::default();
        cam.rotate(0.0, -1.0e6);
        assert!(cam.pitch <= 89.0_f32.to_radians());
        cam.rotate(0.0, 1.0e6);
        assert!(cam.pitch >= -89.0_f32.to_radians());
    }

    #[test]
    fn center_pointer_ray_matches_forward() {
        let cam = FirstPersonCamera::default();
        let size = UVec2::new(1000, 600);
        let ray = cam.pointer_ray(Vec2::new(500.0, 300.0), size);
        assert_eq!(ray.origin, cam.position);
        assert!(ray.direction.abs_diff_eq(cam.forward(), 1e-4));
    }

    #[test]
    fn left_edge_pointer_leans_left() {
        let cam = FirstPersonCamera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let ray = cam.pointer_ray(Vec2::new(0.0, 300.0), UVec2::new(1000, 600));
        assert!(ray.direction.x < 0.0);
        assert!(ray.direction.z < 0.0);
    }
}
