//! Pre-built render pipeline variants.
//!
//! The GPU API bakes depth/stencil/blend/cull state into pipelines, so
//! every state combination the techniques can request exists up front
//! and the frame loop only selects among them. Building the set is a
//! setup-time operation; any compile or link failure aborts startup
//! with the driver diagnostic attached.

use super::program::{build_pipeline, ProgramError, ShaderProgram};
use super::shaders;
use super::shadow::CubemapKind;
use crate::mesh::Vertex;

/// Depth/stencil format of the main pass; the stencil half backs the
/// planar confinement technique.
pub const SCENE_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Everything needed to construct the pipeline set.
pub struct PipelineParams<'a> {
    pub device: &'a wgpu::Device,
    pub surface_format: wgpu::TextureFormat,
    pub block_layout: &'a wgpu::BindGroupLayout,
    pub color_cube_layout: &'a wgpu::BindGroupLayout,
    pub depth_cube_layout: &'a wgpu::BindGroupLayout,
}

/// The full variant set. Two-element arrays are fill/line pairs
/// indexed by the wireframe toggle.
pub struct PipelineSet {
    pub lit: [wgpu::RenderPipeline; 2],
    pub lit_stencil_write: [wgpu::RenderPipeline; 2],
    pub shadow_texture: [wgpu::RenderPipeline; 2],
    pub shadow_map: [wgpu::RenderPipeline; 2],
    /// Planar overlay variants indexed by [ignore_depth][stencil_test].
    pub overlay: [[wgpu::RenderPipeline; 2]; 2],
    pub flat_light: wgpu::RenderPipeline,
    pub cast_color: wgpu::RenderPipeline,
    pub cast_depth_back: wgpu::RenderPipeline,
    pub cast_depth_front: wgpu::RenderPipeline,
}

impl PipelineSet {
    pub fn build(params: &PipelineParams<'_>) -> Result<Self, ProgramError> {
        let device = params.device;

        let lit_program =
            ShaderProgram::compile(device, "scene-lit", &shaders::source(shaders::SCENE_LIT))?;
        let texture_program = ShaderProgram::compile(
            device,
            "scene-shadow-texture",
            &shaders::source(shaders::SCENE_SHADOW_TEXTURE),
        )?;
        let map_program = ShaderProgram::compile(
            device,
            "scene-shadow-map",
            &shaders::source(shaders::SCENE_SHADOW_MAP),
        )?;
        let overlay_program = ShaderProgram::compile(
            device,
            "planar-overlay",
            &shaders::source(shaders::PLANAR_OVERLAY),
        )?;
        let flat_program =
            ShaderProgram::compile(device, "flat-light", &shaders::source(shaders::FLAT_LIGHT))?;
        let cast_color_program = ShaderProgram::compile(
            device,
            "shadow-cast-color",
            &shaders::source(shaders::SHADOW_CAST_COLOR),
        )?;
        let cast_depth_program = ShaderProgram::compile(
            device,
            "shadow-cast-depth",
            &shaders::source(shaders::SHADOW_CAST_DEPTH),
        )?;

        let blocks = params.block_layout;
        let base_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[blocks, blocks, blocks],
            immediate_size: 0,
        });
        let color_sampled_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-color-sampled-layout"),
            bind_group_layouts: &[blocks, blocks, blocks, params.color_cube_layout],
            immediate_size: 0,
        });
        let depth_sampled_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-depth-sampled-layout"),
            bind_group_layouts: &[blocks, blocks, blocks, params.depth_cube_layout],
            immediate_size: 0,
        });
        let cast_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow-cast-layout"),
            bind_group_layouts: &[blocks, blocks],
            immediate_size: 0,
        });

        let builder = Builder {
            device,
            surface_format: params.surface_format,
        };

        let scene_family = |label: &str,
                            program: &ShaderProgram,
                            layout: &wgpu::PipelineLayout,
                            stencil: Option<wgpu::StencilFaceState>|
         -> Result<[wgpu::RenderPipeline; 2], ProgramError> {
            Ok([
                builder.scene_pipeline(
                    label,
                    program,
                    layout,
                    wgpu::PolygonMode::Fill,
                    scene_depth_stencil(stencil),
                )?,
                builder.scene_pipeline(
                    label,
                    program,
                    layout,
                    wgpu::PolygonMode::Line,
                    scene_depth_stencil(stencil),
                )?,
            ])
        };

        let overlay_variant = |ignore_depth: bool,
                               stencil_test: bool|
         -> Result<wgpu::RenderPipeline, ProgramError> {
            let stencil = stencil_test.then(stencil_test_face);
            builder.scene_pipeline(
                "planar-overlay",
                &overlay_program,
                &base_layout,
                wgpu::PolygonMode::Fill,
                overlay_depth_stencil(ignore_depth, stencil),
            )
        };

        Ok(Self {
            lit: scene_family("lit", &lit_program, &base_layout, None)?,
            lit_stencil_write: scene_family(
                "lit-stencil-write",
                &lit_program,
                &base_layout,
                Some(stencil_write_face()),
            )?,
            shadow_texture: scene_family(
                "shadow-texture",
                &texture_program,
                &color_sampled_layout,
                None,
            )?,
            shadow_map: scene_family("shadow-map", &map_program, &depth_sampled_layout, None)?,
            overlay: [
                [overlay_variant(false, false)?, overlay_variant(false, true)?],
                [overlay_variant(true, false)?, overlay_variant(true, true)?],
            ],
            flat_light: builder.scene_pipeline(
                "flat-light",
                &flat_program,
                &base_layout,
                wgpu::PolygonMode::Fill,
                scene_depth_stencil(None),
            )?,
            cast_color: builder.cast_color_pipeline(&cast_color_program, &cast_layout)?,
            cast_depth_back: builder.cast_depth_pipeline(
                "shadow-cast-depth-back",
                &cast_depth_program,
                &cast_layout,
                wgpu::Face::Back,
            )?,
            cast_depth_front: builder.cast_depth_pipeline(
                "shadow-cast-depth-front",
                &cast_depth_program,
                &cast_layout,
                wgpu::Face::Front,
            )?,
        })
    }

    /// Overlay variant for the current planar options.
    pub fn overlay_variant(&self, ignore_depth: bool, stencil: bool) -> &wgpu::RenderPipeline {
        &self.overlay[usize::from(ignore_depth)][usize::from(stencil)]
    }

    /// Depth-cast variant for the cull-front option.
    pub fn cast_depth_variant(&self, cull_front: bool) -> &wgpu::RenderPipeline {
        if cull_front {
            &self.cast_depth_front
        } else {
            &self.cast_depth_back
        }
    }
}

struct Builder<'a> {
    device: &'a wgpu::Device,
    surface_format: wgpu::TextureFormat,
}

impl Builder<'_> {
    fn scene_pipeline(
        &self,
        label: &str,
        program: &ShaderProgram,
        layout: &wgpu::PipelineLayout,
        polygon_mode: wgpu::PolygonMode,
        depth_stencil: wgpu::DepthStencilState,
    ) -> Result<wgpu::RenderPipeline, ProgramError> {
        build_pipeline(
            self.device,
            label,
            &wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: program.module(),
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[vertex_layout()],
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode,
                    ..Default::default()
                },
                depth_stencil: Some(depth_stencil),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: program.module(),
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview_mask: None,
                cache: None,
            },
        )
    }

    fn cast_color_pipeline(
        &self,
        program: &ShaderProgram,
        layout: &wgpu::PipelineLayout,
    ) -> Result<wgpu::RenderPipeline, ProgramError> {
        build_pipeline(
            self.device,
            "shadow-cast-color",
            &wgpu::RenderPipelineDescriptor {
                label: Some("shadow-cast-color"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: program.module(),
                    entry_point: Some("vs_cast"),
                    compilation_options: Default::default(),
                    buffers: &[vertex_layout()],
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    ..Default::default()
                },
                // The face target carries no depth buffer.
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: program.module(),
                    entry_point: Some("fs_cast"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: CubemapKind::Color.format(),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview_mask: None,
                cache: None,
            },
        )
    }

    fn cast_depth_pipeline(
        &self,
        label: &str,
        program: &ShaderProgram,
        layout: &wgpu::PipelineLayout,
        cull: wgpu::Face,
    ) -> Result<wgpu::RenderPipeline, ProgramError> {
        build_pipeline(
            self.device,
            label,
            &wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: program.module(),
                    entry_point: Some("vs_cast"),
                    compilation_options: Default::default(),
                    buffers: &[vertex_layout()],
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(cull),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: CubemapKind::Depth.format(),
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                fragment: None,
                multiview_mask: None,
                cache: None,
            },
        )
    }
}

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: 0,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 12,
            shader_location: 1,
        },
    ];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

fn scene_depth_stencil(stencil: Option<wgpu::StencilFaceState>) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: SCENE_DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: stencil_state(stencil),
        bias: Default::default(),
    }
}

fn overlay_depth_stencil(
    ignore_depth: bool,
    stencil: Option<wgpu::StencilFaceState>,
) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: SCENE_DEPTH_FORMAT,
        depth_write_enabled: !ignore_depth,
        depth_compare: if ignore_depth {
            wgpu::CompareFunction::Always
        } else {
            wgpu::CompareFunction::Less
        },
        stencil: stencil_state(stencil),
        bias: Default::default(),
    }
}

fn stencil_state(face: Option<wgpu::StencilFaceState>) -> wgpu::StencilState {
    match face {
        Some(face) => wgpu::StencilState {
            front: face,
            back: face,
            read_mask: 0xff,
            write_mask: 0xff,
        },
        None => Default::default(),
    }
}

/// Platform pass while stencil confinement is on: every covered pixel
/// bumps the stencil value.
fn stencil_write_face() -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare: wgpu::CompareFunction::Always,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::IncrementClamp,
        pass_op: wgpu::StencilOperation::IncrementClamp,
    }
}

/// Overlay pass while stencil confinement is on: draw only where the
/// platform incremented exactly once, bumping again so overlapping
/// silhouettes cannot double-blend.
fn stencil_test_face() -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare: wgpu::CompareFunction::Equal,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::IncrementClamp,
        pass_op: wgpu::StencilOperation::IncrementClamp,
    }
}
