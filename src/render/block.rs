//! Typed uniform-block layouts and the byte-level writer that stages
//! values for the GPU.
//!
//! Offsets follow the std140-compatible rules the shader language uses
//! for the uniform address space, computed once per block. Packing
//! validates the value list against the declared member order, so a
//! mismatch fails loudly instead of silently scrambling the buffer.

use glam::{Mat4, Vec3, Vec4};
use thiserror::Error;

/// Semantic type of a uniform-block member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Mat4,
    Vec4,
    Vec3,
    F32,
    I32,
}

impl MemberKind {
    fn align(self) -> usize {
        match self {
            Self::Mat4 | Self::Vec4 | Self::Vec3 => 16,
            Self::F32 | Self::I32 => 4,
        }
    }

    fn size(self) -> usize {
        match self {
            Self::Mat4 => 64,
            Self::Vec4 => 16,
            Self::Vec3 => 12,
            Self::F32 | Self::I32 => 4,
        }
    }
}

/// A value destined for one block member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockValue {
    Mat4(Mat4),
    Vec4(Vec4),
    Vec3(Vec3),
    F32(f32),
    I32(i32),
}

impl BlockValue {
    fn kind(&self) -> MemberKind {
        match self {
            Self::Mat4(_) => MemberKind::Mat4,
            Self::Vec4(_) => MemberKind::Vec4,
            Self::Vec3(_) => MemberKind::Vec3,
            Self::F32(_) => MemberKind::F32,
            Self::I32(_) => MemberKind::I32,
        }
    }

    fn write(&self, buffer: &mut [u8], offset: usize) {
        match self {
            Self::Mat4(m) => {
                let cols = m.to_cols_array();
                buffer[offset..offset + 64].copy_from_slice(bytemuck::cast_slice(&cols));
            }
            Self::Vec4(v) => {
                let parts = v.to_array();
                buffer[offset..offset + 16].copy_from_slice(bytemuck::cast_slice(&parts));
            }
            Self::Vec3(v) => {
                let parts = v.to_array();
                buffer[offset..offset + 12].copy_from_slice(bytemuck::cast_slice(&parts));
            }
            Self::F32(value) => {
                buffer[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
            }
            Self::I32(value) => {
                buffer[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("uniform block '{block}' has no member named '{name}'")]
    UnknownMember { block: &'static str, name: String },
    #[error("uniform block '{block}' expects {expected} values, got {actual}")]
    CountMismatch {
        block: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error(
        "uniform block '{block}' member '{name}' expects {expected:?}, got {actual:?}"
    )]
    KindMismatch {
        block: &'static str,
        name: &'static str,
        expected: MemberKind,
        actual: MemberKind,
    },
}

#[derive(Debug, Clone)]
struct Member {
    name: &'static str,
    kind: MemberKind,
    offset: usize,
}

/// Byte layout of one uniform block: total size plus the offset of each
/// member in declaration order. Computed once, immutable afterwards;
/// all writes to the block must supply values in the same order.
#[derive(Debug, Clone)]
pub struct BlockLayout {
    name: &'static str,
    size: usize,
    members: Vec<Member>,
}

impl BlockLayout {
    /// Lays the members out with std140-compatible alignment.
    pub fn std140(name: &'static str, members: &[(&'static str, MemberKind)]) -> Self {
        let mut offset = 0usize;
        let mut laid_out = Vec::with_capacity(members.len());
        for (member_name, kind) in members {
            offset = round_up(offset, kind.align());
            laid_out.push(Member {
                name: member_name,
                kind: *kind,
                offset,
            });
            offset += kind.size();
        }
        Self {
            name,
            size: round_up(offset, 16),
            members: laid_out,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn byte_size(&self) -> usize {
        self.size
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Byte offset of the named member.
    pub fn offset(&self, member: &str) -> Result<usize, BlockError> {
        self.members
            .iter()
            .find(|m| m.name == member)
            .map(|m| m.offset)
            .ok_or_else(|| BlockError::UnknownMember {
                block: self.name,
                name: member.to_string(),
            })
    }

    /// Stages the values into a buffer mirroring the GPU-side layout.
    /// The value list must match the declared members in count, order
    /// and kind.
    pub fn pack(&self, values: &[BlockValue]) -> Result<Vec<u8>, BlockError> {
        if values.len() != self.members.len() {
            return Err(BlockError::CountMismatch {
                block: self.name,
                expected: self.members.len(),
                actual: values.len(),
            });
        }

        let mut buffer = vec![0u8; self.size];
        for (member, value) in self.members.iter().zip(values) {
            if value.kind() != member.kind {
                return Err(BlockError::KindMismatch {
                    block: self.name,
                    name: member.name,
                    expected: member.kind,
                    actual: value.kind(),
                });
            }
            value.write(&mut buffer, member.offset);
        }
        Ok(buffer)
    }
}

fn round_up(value: usize, align: usize) -> usize {
    (value + align - 1) / align * align
}

/// Transform and per-frame scene parameters, one instance per draw.
pub fn scene_layout() -> BlockLayout {
    use MemberKind::*;
    BlockLayout::std140(
        "Scene",
        &[
            ("model", Mat4),
            ("view_projection", Mat4),
            ("model_view_projection", Mat4),
            ("viewport", Mat4),
            ("shadow_view_projection", Mat4),
            ("tess_level", F32),
            ("eye_pos", Vec3),
            ("wireframe", I32),
            ("control_points", I32),
        ],
    )
}

/// Point light parameters shared by a whole pass.
pub fn light_layout() -> BlockLayout {
    use MemberKind::*;
    BlockLayout::std140(
        "Light",
        &[
            ("position", Vec4),
            ("ambient", Vec3),
            ("diffuse", Vec3),
            ("specular", Vec3),
            ("atten_constant", F32),
            ("atten_linear", F32),
            ("atten_quadratic", F32),
            ("shadow_bias", F32),
            ("multisampling", I32),
            ("shadow_map_samples", F32),
        ],
    )
}

/// Surface material, one instance per draw group.
pub fn material_layout() -> BlockLayout {
    use MemberKind::*;
    BlockLayout::std140(
        "Material",
        &[
            ("ambient", Vec3),
            ("diffuse", Vec3),
            ("specular", Vec3),
            ("shininess", F32),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrices_land_at_consecutive_offsets() {
        let layout = BlockLayout::std140(
            "Test",
            &[
                ("a", MemberKind::Mat4),
                ("b", MemberKind::Mat4),
                ("c", MemberKind::Vec4),
            ],
        );
        assert_eq!(layout.offset("a").unwrap(), 0);
        assert_eq!(layout.offset("b").unwrap(), 64);
        assert_eq!(layout.offset("c").unwrap(), 128);
        assert_eq!(layout.byte_size(), 144);
    }

    #[test]
    fn packed_values_do_not_overlap() {
        let layout = BlockLayout::std140(
            "Test",
            &[
                ("a", MemberKind::Mat4),
                ("b", MemberKind::Mat4),
                ("c", MemberKind::Vec4),
            ],
        );
        let a = Mat4::from_cols_array(&[1.5; 16]);
        let b = Mat4::from_cols_array(&[-2.25; 16]);
        let c = Vec4::splat(9.0);
        let buffer = layout
            .pack(&[BlockValue::Mat4(a), BlockValue::Mat4(b), BlockValue::Vec4(c)])
            .unwrap();

        let a_bytes: &[f32] = bytemuck::cast_slice(&buffer[0..64]);
        let b_bytes: &[f32] = bytemuck::cast_slice(&buffer[64..128]);
        let c_bytes: &[f32] = bytemuck::cast_slice(&buffer[128..144]);
        assert!(a_bytes.iter().all(|v| *v == 1.5));
        assert!(b_bytes.iter().all(|v| *v == -2.25));
        assert!(c_bytes.iter().all(|v| *v == 9.0));
    }

    #[test]
    fn scalars_pack_into_vec3_padding() {
        let layout = BlockLayout::std140(
            "Test",
            &[("v", MemberKind::Vec3), ("s", MemberKind::F32)],
        );
        assert_eq!(layout.offset("v").unwrap(), 0);
        assert_eq!(layout.offset("s").unwrap(), 12);
        assert_eq!(layout.byte_size(), 16);
    }

    #[test]
    fn scalar_then_vec3_respects_vector_alignment() {
        let layout = BlockLayout::std140(
            "Test",
            &[("s", MemberKind::F32), ("v", MemberKind::Vec3)],
        );
        assert_eq!(layout.offset("s").unwrap(), 0);
        assert_eq!(layout.offset("v").unwrap(), 16);
    }

    #[test]
    fn unknown_member_is_an_error() {
        let layout = material_layout();
        assert!(matches!(
            layout.offset("glossiness"),
            Err(BlockError::UnknownMember { .. })
        ));
    }

    #[test]
    fn count_mismatch_is_an_error() {
        let layout = material_layout();
        let result = layout.pack(&[BlockValue::Vec3(Vec3::ONE)]);
        assert!(matches!(result, Err(BlockError::CountMismatch { .. })));
    }

    #[test]
    fn kind_mismatch_is_an_error() {
        let layout = BlockLayout::std140("Test", &[("a", MemberKind::F32)]);
        let result = layout.pack(&[BlockValue::I32(3)]);
        assert!(matches!(result, Err(BlockError::KindMismatch { .. })));
    }

    #[test]
    fn scene_layout_matches_the_shader_declaration() {
        let layout = scene_layout();
        assert_eq!(layout.offset("model").unwrap(), 0);
        assert_eq!(layout.offset("shadow_view_projection").unwrap(), 256);
        assert_eq!(layout.offset("tess_level").unwrap(), 320);
        assert_eq!(layout.offset("eye_pos").unwrap(), 336);
        assert_eq!(layout.offset("wireframe").unwrap(), 348);
        assert_eq!(layout.offset("control_points").unwrap(), 352);
        assert_eq!(layout.byte_size(), 368);
    }

    #[test]
    fn light_layout_matches_the_shader_declaration() {
        let layout = light_layout();
        assert_eq!(layout.offset("position").unwrap(), 0);
        assert_eq!(layout.offset("specular").unwrap(), 48);
        assert_eq!(layout.offset("atten_constant").unwrap(), 60);
        assert_eq!(layout.offset("shadow_map_samples").unwrap(), 80);
        assert_eq!(layout.byte_size(), 96);
    }

    #[test]
    fn material_layout_matches_the_shader_declaration() {
        let layout = material_layout();
        assert_eq!(layout.offset("shininess").unwrap(), 44);
        assert_eq!(layout.byte_size(), 48);
    }
}
