//! Icosphere construction by repeated subdivision of an icosahedron.
//!
//! Vertices are duplicated per face so the mesh stays flat-shaded
//! friendly; since the sphere is unit radius and centered at the
//! origin, every normal equals its position.

use glam::Vec3;

use super::{MeshData, Vertex};

/// Default smoothness used for the spheres in the scene.
pub const DEFAULT_SUBDIVISIONS: u32 = 5;

/// Builds a unit sphere by subdividing each icosahedron face
/// `subdivisions` times.
pub fn build(subdivisions: u32) -> MeshData {
    let corners = icosahedron_vertices();

    let mut triangles: Vec<[Vec3; 3]> = Vec::with_capacity(20);

    // Stitch the 20 faces: a fan from the top vertex, two rows of
    // triangles around the middle, and a fan to the bottom vertex.
    let v0 = corners[0];
    let v11 = corners[11];
    for i in 1..=5usize {
        let v1 = corners[i];
        let v2 = corners[if i < 5 { i + 1 } else { 1 }];
        let v3 = corners[i + 5];
        let v4 = corners[if i + 5 < 10 { i + 6 } else { 6 }];

        triangles.push([v0, v1, v2]);
        triangles.push([v1, v3, v2]);
        triangles.push([v2, v3, v4]);
        triangles.push([v3, v11, v4]);
    }

    for _ in 0..subdivisions {
        let mut next = Vec::with_capacity(triangles.len() * 4);
        for [v1, v2, v3] in triangles {
            let a = half_vertex(v1, v2);
            let b = half_vertex(v2, v3);
            let c = half_vertex(v1, v3);
            next.push([v1, a, c]);
            next.push([a, v2, b]);
            next.push([a, b, c]);
            next.push([c, b, v3]);
        }
        triangles = next;
    }

    let mut mesh = MeshData::default();
    for triangle in &triangles {
        for vertex in triangle {
            mesh.indices.push(mesh.vertices.len() as u32);
            mesh.vertices.push(Vertex {
                position: vertex.to_array(),
                normal: vertex.to_array(),
            });
        }
    }
    mesh
}

/// The 12 vertices of a unit icosahedron: one vertex at each pole and
/// two staggered rows of five.
fn icosahedron_vertices() -> [Vec3; 12] {
    let h_angle = 72f32.to_radians();
    let v_angle = 0.5f32.atan();

    let z = v_angle.sin();
    let xy = v_angle.cos();

    let mut vertices = [Vec3::ZERO; 12];
    vertices[0] = Vec3::new(0.0, 0.0, 1.0);
    vertices[11] = Vec3::new(0.0, 0.0, -1.0);

    let mut angle_top = -std::f32::consts::FRAC_PI_2 - h_angle / 2.0;
    let mut angle_bottom = -std::f32::consts::FRAC_PI_2;
    for i in 1..=5usize {
        vertices[i] = Vec3::new(xy * angle_top.cos(), xy * angle_top.sin(), z);
        vertices[i + 5] = Vec3::new(xy * angle_bottom.cos(), xy * angle_bottom.sin(), -z);
        angle_top += h_angle;
        angle_bottom += h_angle;
    }
    vertices
}

fn half_vertex(a: Vec3, b: Vec3) -> Vec3 {
    (a + b).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdivision_quadruples_the_triangle_count() {
        assert_eq!(build(0).indices.len(), 20 * 3);
        assert_eq!(build(1).indices.len(), 80 * 3);
        assert_eq!(build(2).indices.len(), 320 * 3);
    }

    #[test]
    fn every_vertex_sits_on_the_unit_sphere() {
        let mesh = build(2);
        for vertex in &mesh.vertices {
            let length = Vec3::from_array(vertex.position).length();
            assert!((length - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn normals_equal_positions() {
        let mesh = build(1);
        for vertex in &mesh.vertices {
            assert_eq!(vertex.position, vertex.normal);
        }
    }

    #[test]
    fn indices_reference_every_vertex_once() {
        let mesh = build(1);
        assert_eq!(mesh.indices.len(), mesh.vertices.len());
        for (i, index) in mesh.indices.iter().enumerate() {
            assert_eq!(*index as usize, i);
        }
    }
}
