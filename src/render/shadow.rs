//! Off-screen cubemap targets for the omnidirectional shadow passes.
//!
//! Both shadow techniques share this shape: six square faces rendered
//! from the light's position, each through a 90-degree projection that
//! covers the scene's full depth range. The color kind stores encoded
//! light distance, the depth kind a hardware depth buffer.

use glam::{Mat4, Vec3};

pub const SHADOW_NEAR: f32 = 0.001;
pub const SHADOW_FAR: f32 = 1000.0;

/// Output format of the cubemap pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubemapKind {
    /// Color faces encoding normalized light-to-fragment distance.
    Color,
    /// Hardware depth faces.
    Depth,
}

impl CubemapKind {
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            Self::Color => wgpu::TextureFormat::Rgba8Unorm,
            Self::Depth => wgpu::TextureFormat::Depth32Float,
        }
    }
}

/// Cubemap texture with one render view per face and a cube view for
/// sampling, plus the sampler and bind group the main pass uses.
pub struct ShadowCubemap {
    kind: CubemapKind,
    resolution: u32,
    linear: bool,
    face_views: [wgpu::TextureView; 6],
    bind_group: wgpu::BindGroup,
}

impl ShadowCubemap {
    /// Allocates the texture at the requested resolution with the
    /// requested filtering. Depth cubemaps always sample nearest; a
    /// filtering sampler on a depth texture is rejected by the driver.
    pub fn allocate(
        device: &wgpu::Device,
        kind: CubemapKind,
        resolution: u32,
        linear: bool,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let label = match kind {
            CubemapKind::Color => "shadow-texture-cubemap",
            CubemapKind::Depth => "shadow-map-cubemap",
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: kind.format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let face_views = std::array::from_fn(|face| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(label),
                format: Some(kind.format()),
                dimension: Some(wgpu::TextureViewDimension::D2),
                usage: None,
                aspect: wgpu::TextureAspect::All,
                base_mip_level: 0,
                mip_level_count: Some(1),
                base_array_layer: face as u32,
                array_layer_count: Some(1),
            })
        });

        let cube_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            format: Some(kind.format()),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            usage: None,
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: Some(1),
            base_array_layer: 0,
            array_layer_count: Some(6),
        });

        let filter = if linear && kind == CubemapKind::Color {
            wgpu::FilterMode::Linear
        } else {
            wgpu::FilterMode::Nearest
        };
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&cube_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Self {
            kind,
            resolution,
            linear,
            face_views,
            bind_group,
        }
    }

    /// Whether the allocation still honors the current settings.
    pub fn matches(&self, resolution: u32, linear: bool) -> bool {
        self.resolution == resolution && self.linear == linear
    }

    pub fn kind(&self) -> CubemapKind {
        self.kind
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn face_view(&self, face: usize) -> &wgpu::TextureView {
        &self.face_views[face]
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// View-projection matrices for the six cube faces as seen from the
/// light. Face order matches cubemap layer order (+X, -X, +Y, -Y, +Z,
/// -Z); the up vectors follow cubemap addressing conventions.
pub fn face_view_projections(light: Vec3) -> [Mat4; 6] {
    let projection =
        Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, SHADOW_NEAR, SHADOW_FAR);

    const FACES: [([f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, -1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, -1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, -1.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, 0.0, 1.0], [0.0, -1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, -1.0, 0.0]),
    ];

    std::array::from_fn(|i| {
        let (direction, up) = FACES[i];
        let view = Mat4::look_at_rh(
            light,
            light + Vec3::from_array(direction),
            Vec3::from_array(up),
        );
        projection * view
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn face_matrices_center_their_own_direction() {
        let light = Vec3::new(0.0, 5.0, 0.0);
        let matrices = face_view_projections(light);
        let directions = [
            Vec3::X,
            -Vec3::X,
            Vec3::Y,
            -Vec3::Y,
            Vec3::Z,
            -Vec3::Z,
        ];
        for (matrix, direction) in matrices.iter().zip(directions) {
            let probe = light + direction * 10.0;
            let clip = *matrix * Vec4::new(probe.x, probe.y, probe.z, 1.0);
            let ndc = clip / clip.w;
            // A point straight down the face axis projects to the face
            // center, in front of the light.
            assert!(ndc.x.abs() < 1e-4, "direction {direction:?}");
            assert!(ndc.y.abs() < 1e-4, "direction {direction:?}");
            assert!(ndc.z > 0.0 && ndc.z <= 1.0, "direction {direction:?}");
        }
    }

    #[test]
    fn faces_share_one_projection_but_not_one_view() {
        let matrices = face_view_projections(Vec3::new(1.0, 2.0, 3.0));
        for i in 0..6 {
            for j in (i + 1)..6 {
                assert_ne!(matrices[i], matrices[j]);
            }
        }
    }

    #[test]
    fn kind_formats_are_distinct() {
        assert_eq!(CubemapKind::Color.format(), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(
            CubemapKind::Depth.format(),
            wgpu::TextureFormat::Depth32Float
        );
    }
}
