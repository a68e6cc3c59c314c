pub mod icosphere;
pub mod teapot;
pub mod teapot_data;

use bytemuck::{Pod, Zeroable};

/// Interleaved vertex layout shared by every mesh in the scene.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// CPU-side mesh ready for upload: interleaved vertices plus a triangle
/// index list.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// The ground everything casts shadows onto: a unit quad at y = 0 with
/// upward normals, scaled up by the scene transform.
pub fn platform() -> MeshData {
    let normal = [0.0, 1.0, 0.0];
    MeshData {
        vertices: vec![
            Vertex {
                position: [-1.0, 0.0, -1.0],
                normal,
            },
            Vertex {
                position: [1.0, 0.0, -1.0],
                normal,
            },
            Vertex {
                position: [-1.0, 0.0, 1.0],
                normal,
            },
            Vertex {
                position: [1.0, 0.0, 1.0],
                normal,
            },
        ],
        indices: vec![0, 2, 1, 1, 2, 3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_is_two_triangles_at_ground_level() {
        let mesh = platform();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.vertices.iter().all(|v| v.position[1] == 0.0));
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }
}
