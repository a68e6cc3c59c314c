//! CPU tessellation of the teapot's bicubic Bezier patches.
//!
//! Each 4x4 control-point patch is sampled on an (n + 1)^2 grid at the
//! requested tessellation level, with analytic normals from the surface
//! partial derivatives. The mesh is rebuilt whenever the level changes.

use glam::Vec3;

use super::teapot_data::{CONTROL_POINTS, NUM_PATCHES, PATCHES, PATCH_DIMENSION};
use super::{MeshData, Vertex};

/// Grid resolution bounds per patch. The upper bound keeps a runaway
/// tessellation level from exhausting memory; the displayed level is
/// not clamped, only the generated grid.
pub const MIN_LEVEL: u32 = 1;
pub const MAX_LEVEL: u32 = 64;

/// Tessellates all patches at the given level into one triangle mesh.
pub fn tessellate(level: f32) -> MeshData {
    let n = (level.max(0.0) as u32).clamp(MIN_LEVEL, MAX_LEVEL);
    let verts_per_side = (n + 1) as usize;

    let mut mesh = MeshData {
        vertices: Vec::with_capacity(NUM_PATCHES * verts_per_side * verts_per_side),
        indices: Vec::with_capacity(NUM_PATCHES * (n * n * 6) as usize),
    };

    for patch in 0..NUM_PATCHES {
        let control = patch_control_points(patch);
        let base = mesh.vertices.len() as u32;

        for row in 0..verts_per_side {
            let v = row as f32 / n as f32;
            for col in 0..verts_per_side {
                let u = col as f32 / n as f32;
                let (position, normal) = evaluate(&control, u, v);
                mesh.vertices.push(Vertex {
                    position: position.to_array(),
                    normal: normal.to_array(),
                });
            }
        }

        for row in 0..n {
            for col in 0..n {
                let i0 = base + row * (n + 1) + col;
                let i1 = i0 + 1;
                let i2 = i0 + (n + 1);
                let i3 = i2 + 1;
                mesh.indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
            }
        }
    }

    mesh
}

fn patch_control_points(patch: usize) -> [Vec3; PATCH_DIMENSION * PATCH_DIMENSION] {
    std::array::from_fn(|i| {
        // The patch table is one-based.
        let index = PATCHES[patch * PATCH_DIMENSION * PATCH_DIMENSION + i] as usize - 1;
        Vec3::from_array(CONTROL_POINTS[index])
    })
}

/// Evaluates the patch position and normal at (u, v).
fn evaluate(control: &[Vec3; 16], u: f32, v: f32) -> (Vec3, Vec3) {
    let bu = bernstein(u);
    let bv = bernstein(v);
    let du = bernstein_derivative(u);
    let dv = bernstein_derivative(v);

    let mut position = Vec3::ZERO;
    let mut tangent_u = Vec3::ZERO;
    let mut tangent_v = Vec3::ZERO;
    for row in 0..PATCH_DIMENSION {
        for col in 0..PATCH_DIMENSION {
            let p = control[row * PATCH_DIMENSION + col];
            position += p * (bv[row] * bu[col]);
            tangent_u += p * (bv[row] * du[col]);
            tangent_v += p * (dv[row] * bu[col]);
        }
    }

    let mut normal = tangent_u.cross(tangent_v);
    if normal.length_squared() < 1e-10 {
        // Degenerate corner (the lid apex collapses a patch edge);
        // sample the derivatives slightly inside the patch instead.
        let u2 = (u - 0.5) * 0.998 + 0.5;
        let v2 = (v - 0.5) * 0.998 + 0.5;
        let du2 = bernstein_derivative(u2);
        let dv2 = bernstein_derivative(v2);
        let bu2 = bernstein(u2);
        let bv2 = bernstein(v2);
        let mut tu = Vec3::ZERO;
        let mut tv = Vec3::ZERO;
        for row in 0..PATCH_DIMENSION {
            for col in 0..PATCH_DIMENSION {
                let p = control[row * PATCH_DIMENSION + col];
                tu += p * (bv2[row] * du2[col]);
                tv += p * (dv2[row] * bu2[col]);
            }
        }
        normal = tu.cross(tv);
    }

    (position, normal.normalize_or_zero())
}

fn bernstein(t: f32) -> [f32; 4] {
    let s = 1.0 - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

fn bernstein_derivative(t: f32) -> [f32; 4] {
    let s = 1.0 - t;
    [
        -3.0 * s * s,
        3.0 * s * s - 6.0 * t * s,
        6.0 * t * s - 3.0 * t * t,
        3.0 * t * t,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_and_index_counts_match_the_grid() {
        let mesh = tessellate(4.0);
        let per_patch_vertices = 5 * 5;
        let per_patch_indices = 4 * 4 * 6;
        assert_eq!(mesh.vertices.len(), NUM_PATCHES * per_patch_vertices);
        assert_eq!(mesh.indices.len(), NUM_PATCHES * per_patch_indices);
    }

    #[test]
    fn level_is_clamped_to_the_grid_bounds() {
        let floor = tessellate(0.0);
        assert_eq!(floor.vertices.len(), NUM_PATCHES * 4);
        let capped = tessellate(10_000.0);
        let max_side = (MAX_LEVEL + 1) as usize;
        assert_eq!(capped.vertices.len(), NUM_PATCHES * max_side * max_side);
    }

    #[test]
    fn patch_corners_interpolate_the_control_net() {
        let control = patch_control_points(0);
        let (p00, _) = evaluate(&control, 0.0, 0.0);
        let (p33, _) = evaluate(&control, 1.0, 1.0);
        assert!((p00 - control[0]).length() < 1e-5);
        assert!((p33 - control[15]).length() < 1e-5);
    }

    #[test]
    fn normals_are_unit_length_or_flagged_degenerate() {
        let mesh = tessellate(8.0);
        let mut unit = 0usize;
        for vertex in &mesh.vertices {
            let length = Vec3::from_array(vertex.normal).length();
            if (length - 1.0).abs() < 1e-3 {
                unit += 1;
            }
        }
        // The lid apex may stay degenerate; everything else normalizes.
        assert!(unit as f32 / mesh.vertices.len() as f32 > 0.99);
    }
}
