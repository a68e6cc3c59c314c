use glam::{Mat4, Vec3};

/// Orbit camera parametrized by spherical coordinates around a look-at
/// point.
///
/// `theta` is the yaw angle, `phi` the pitch angle and `radius` the
/// distance from the look-at point. The cartesian position and the view
/// matrix are recomputed whenever any of the inputs change, so observers
/// never see stale derived state.
#[derive(Debug, Clone)]
pub struct ArcballCamera {
    theta: f32,
    phi: f32,
    radius: f32,
    look_at: Vec3,
    up: Vec3,
    position: Vec3,
    view: Mat4,
}

impl ArcballCamera {
    /// Distance bounds keep the camera outside the unit sphere and
    /// within sight of the scene.
    pub const MIN_ZOOM: f32 = 0.01;
    pub const MAX_ZOOM: f32 = 50.0;

    // Pitch stays strictly inside (0, pi) to prevent the view from
    // flipping over the poles.
    const PHI_MARGIN: f32 = 0.001;

    pub fn new(theta: f32, phi: f32, radius: f32, look_at: Vec3) -> Self {
        let mut camera = Self {
            theta,
            phi,
            radius,
            look_at,
            up: Vec3::Y,
            position: Vec3::ZERO,
            view: Mat4::IDENTITY,
        };
        camera.clamp_phi();
        camera.clamp_radius();
        camera.recompute();
        camera
    }

    /// Rotates the point of view by the given yaw/pitch deltas in
    /// radians. Pitch is clamped; yaw is consumed by periodic
    /// trigonometry and needs no wrapping.
    pub fn rotate(&mut self, d_theta: f32, d_phi: f32) {
        self.theta += d_theta;
        self.phi += d_phi;
        self.clamp_phi();
        self.recompute();
    }

    /// Moves the camera towards or away from the look-at point.
    pub fn zoom(&mut self, delta: f32) {
        self.radius += delta;
        self.clamp_radius();
        self.recompute();
    }

    pub fn set_look_at(&mut self, look_at: Vec3) {
        self.look_at = look_at;
        self.recompute();
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
        self.recompute();
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn phi(&self) -> f32 {
        self.phi
    }

    fn clamp_phi(&mut self) {
        self.phi = self
            .phi
            .clamp(Self::PHI_MARGIN, std::f32::consts::PI - Self::PHI_MARGIN);
    }

    fn clamp_radius(&mut self) {
        self.radius = self.radius.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
    }

    fn recompute(&mut self) {
        self.position = Vec3::new(
            self.radius * self.theta.sin() * self.phi.sin(),
            -self.radius * self.phi.cos(),
            -self.radius * self.theta.cos() * self.phi.sin(),
        ) + self.look_at;
        self.view = Mat4::look_at_rh(self.position, self.look_at, self.up);
    }
}

impl Default for ArcballCamera {
    fn default() -> Self {
        Self::new(0.0, std::f32::consts::PI * 0.75, 5.0, Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn phi_stays_inside_open_interval() {
        let mut camera = ArcballCamera::default();
        for _ in 0..100 {
            camera.rotate(0.3, 1.0);
        }
        assert!(camera.phi() < PI);
        for _ in 0..100 {
            camera.rotate(0.3, -1.0);
        }
        assert!(camera.phi() > 0.0);
    }

    #[test]
    fn radius_stays_inside_zoom_bounds() {
        let mut camera = ArcballCamera::default();
        for _ in 0..50 {
            camera.zoom(10.0);
        }
        assert_eq!(camera.radius(), ArcballCamera::MAX_ZOOM);
        for _ in 0..50 {
            camera.zoom(-10.0);
        }
        assert_eq!(camera.radius(), ArcballCamera::MIN_ZOOM);
    }

    #[test]
    fn zero_deltas_are_identity() {
        let mut camera = ArcballCamera::default();
        let position = camera.position();
        let view = camera.view_matrix();
        camera.rotate(0.0, 0.0);
        camera.zoom(0.0);
        assert_eq!(camera.position(), position);
        assert_eq!(camera.view_matrix(), view);
    }

    #[test]
    fn known_orientation_places_camera_on_negative_z() {
        let camera = ArcballCamera::new(0.0, PI / 2.0, 5.0, Vec3::ZERO);
        let position = camera.position();
        assert!((position.x - 0.0).abs() < 1e-5);
        assert!((position.y - 0.0).abs() < 1e-5);
        assert!((position.z + 5.0).abs() < 1e-5);
    }

    #[test]
    fn look_at_offset_shifts_position() {
        let camera = ArcballCamera::new(0.0, PI / 2.0, 5.0, Vec3::new(0.0, 2.5, 0.0));
        let position = camera.position();
        assert!((position.y - 2.5).abs() < 1e-5);
        assert!((position.z + 5.0).abs() < 1e-5);
    }
}
