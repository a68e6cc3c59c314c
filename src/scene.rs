use std::f32::consts::PI;

use glam::{Mat4, Vec3, Vec4};

/// Phong material pushed into the material uniform block before each
/// draw group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl Material {
    fn colored(color: Vec3, shininess: f32) -> Self {
        Self {
            ambient: color,
            diffuse: color,
            specular: Vec3::ONE,
            shininess,
        }
    }

    pub fn platform() -> Self {
        Self::colored(Vec3::new(0.2, 0.1, 0.7), 64.0)
    }

    pub fn teapot() -> Self {
        Self::colored(Vec3::new(0.4, 0.0, 0.6), 64.0)
    }

    pub fn sphere() -> Self {
        Self::colored(Vec3::new(1.0, 0.078, 0.576), 64.0)
    }

    pub fn outer_ring() -> Self {
        Self::colored(Vec3::new(0.0, 0.9804, 0.6039), 64.0)
    }

    pub fn light_marker() -> Self {
        Self::colored(Vec3::ONE, 128.0)
    }

    /// Planar shadow overlays reuse the shininess channel as an alpha
    /// value: translucent when blending is requested, opaque otherwise.
    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }
}

/// Position on a horizontal circle of the given radius at the given
/// height.
pub fn circle_pos(radius: f32, angle: f32, height: f32) -> Vec3 {
    Vec3::new(radius * angle.cos(), height, radius * angle.sin())
}

/// Projects geometry flat onto a plane as seen from a point light.
///
/// `plane` is in the form `(n, d)` with `n . x + d = 0`; the returned
/// matrix maps a world-space point to its shadow on the plane.
pub fn planar_shadow_matrix(light: Vec3, plane: Vec4) -> Mat4 {
    let light = light.extend(1.0);
    let dot = plane.dot(light);
    Mat4::from_cols(
        Vec4::new(
            dot - light.x * plane.x,
            -light.y * plane.x,
            -light.z * plane.x,
            -light.w * plane.x,
        ),
        Vec4::new(
            -light.x * plane.y,
            dot - light.y * plane.y,
            -light.z * plane.y,
            -light.w * plane.y,
        ),
        Vec4::new(
            -light.x * plane.z,
            -light.y * plane.z,
            dot - light.z * plane.z,
            -light.w * plane.z,
        ),
        Vec4::new(
            -light.x * plane.w,
            -light.y * plane.w,
            -light.z * plane.w,
            dot - light.w * plane.w,
        ),
    )
}

/// World transforms for every object instance in the scene, recomputed
/// each frame from the shared orbit angle.
#[derive(Debug, Clone)]
pub struct SceneInstances {
    pub platform: Mat4,
    pub teapots: [Mat4; 4],
    pub spheres: [Mat4; 4],
    pub outer_ring: [Mat4; 8],
}

impl SceneInstances {
    pub const ORBIT_RADIUS: f32 = 9.0;
    pub const OUTER_RADIUS: f32 = 20.0;

    pub fn at_angle(angle: f32) -> Self {
        let teapots = std::array::from_fn(|i| {
            let phase = angle + i as f32 * PI / 2.0;
            let height = if i % 2 == 0 { 0.5 } else { 1.5 };
            let translation =
                Mat4::from_translation(circle_pos(Self::ORBIT_RADIUS, phase, height));
            // Teapot patch data is authored z-up; stand it upright and
            // give each instance its own facing.
            translation
                * Mat4::from_rotation_x(-PI / 2.0)
                * Mat4::from_rotation_z((i as f32 + 1.0) * PI / 2.0)
        });

        let spheres = std::array::from_fn(|i| {
            let phase = angle + PI / 4.0 + i as f32 * PI / 2.0;
            Mat4::from_translation(circle_pos(Self::ORBIT_RADIUS, phase, 1.1))
        });

        let outer_ring = std::array::from_fn(|i| {
            let phase = i as f32 * PI / 4.0;
            Mat4::from_translation(circle_pos(Self::OUTER_RADIUS, phase, 1.6))
                * Mat4::from_scale(Vec3::splat(1.5))
        });

        Self {
            platform: Mat4::from_scale(Vec3::splat(100.0)),
            teapots,
            spheres,
            outer_ring,
        }
    }

    pub fn light_marker(light_position: Vec3) -> Mat4 {
        Mat4::from_translation(light_position) * Mat4::from_scale(Vec3::splat(0.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_positions_sit_on_the_circle() {
        let p = circle_pos(9.0, 1.3, 1.1);
        assert!(((p.x * p.x + p.z * p.z).sqrt() - 9.0).abs() < 1e-5);
        assert_eq!(p.y, 1.1);
    }

    #[test]
    fn instance_counts_are_fixed() {
        let instances = SceneInstances::at_angle(0.4);
        assert_eq!(instances.teapots.len(), 4);
        assert_eq!(instances.spheres.len(), 4);
        assert_eq!(instances.outer_ring.len(), 8);
    }

    #[test]
    fn outer_ring_ignores_the_orbit_angle() {
        let a = SceneInstances::at_angle(0.0);
        let b = SceneInstances::at_angle(1.0);
        assert_eq!(a.outer_ring, b.outer_ring);
        assert_ne!(a.spheres, b.spheres);
    }

    #[test]
    fn teapots_alternate_heights() {
        let instances = SceneInstances::at_angle(0.0);
        let heights: Vec<f32> = instances
            .teapots
            .iter()
            .map(|m| m.w_axis.y)
            .collect();
        assert!((heights[0] - 0.5).abs() < 1e-6);
        assert!((heights[1] - 1.5).abs() < 1e-6);
        assert!((heights[2] - 0.5).abs() < 1e-6);
        assert!((heights[3] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn planar_projection_flattens_onto_the_plane() {
        let light = Vec3::new(0.0, 5.0, 0.0);
        let shadow = planar_shadow_matrix(light, Vec4::new(0.0, 1.0, 0.0, 0.0));
        let point = Vec4::new(2.0, 1.5, -3.0, 1.0);
        let projected = shadow * point;
        let projected = projected / projected.w;
        assert!(projected.y.abs() < 1e-4);
    }

    #[test]
    fn planar_projection_keeps_plane_points_fixed() {
        let light = Vec3::new(1.0, 5.0, 2.0);
        let shadow = planar_shadow_matrix(light, Vec4::new(0.0, 1.0, 0.0, 0.0));
        let point = Vec4::new(4.0, 0.0, -7.0, 1.0);
        let projected = shadow * point;
        let projected = projected / projected.w;
        assert!((projected.x - 4.0).abs() < 1e-4);
        assert!(projected.y.abs() < 1e-4);
        assert!((projected.z + 7.0).abs() < 1e-4);
    }
}
