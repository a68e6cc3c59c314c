use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec3, Vec4};
use log::warn;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::camera::ArcballCamera;
use crate::mesh::{self, icosphere, teapot, MeshData};
use crate::scene::{planar_shadow_matrix, Material, SceneInstances};
use crate::state::{RenderState, ShadowTechnique};

use super::block::{self, BlockLayout, BlockValue};
use super::pipelines::{PipelineParams, PipelineSet, SCENE_DEPTH_FORMAT};
use super::shadow::{face_view_projections, CubemapKind, ShadowCubemap, SHADOW_FAR, SHADOW_NEAR};

/// Which optional passes the current state requires. Pure function of
/// the state, so pass selection stays testable without a device: with
/// the technique set to `None`, no shadow work exists in the plan at
/// all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    pub cubemap_pass: Option<CubemapKind>,
    pub planar_overlay: bool,
}

impl FramePlan {
    pub fn for_state(state: &RenderState) -> Self {
        let cubemap_pass = match state.technique {
            ShadowTechnique::Textures => Some(CubemapKind::Color),
            ShadowTechnique::Maps => Some(CubemapKind::Depth),
            _ => None,
        };
        Self {
            cubemap_pass,
            planar_overlay: state.technique == ShadowTechnique::Planar,
        }
    }
}

/// GPU renderer: owns the surface, the pipeline variants, the scene
/// meshes and the shadow cubemaps, and encodes the per-frame passes.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth: DepthBuffer,

    scene_layout: BlockLayout,
    light_layout: BlockLayout,
    material_layout: BlockLayout,
    block_bind_layout: wgpu::BindGroupLayout,
    color_cube_bind_layout: wgpu::BindGroupLayout,
    depth_cube_bind_layout: wgpu::BindGroupLayout,
    pipelines: PipelineSet,

    platform: MeshBuffers,
    sphere: MeshBuffers,
    teapot: MeshBuffers,
    teapot_level: f32,

    shadow_color: Option<ShadowCubemap>,
    shadow_depth: Option<ShadowCubemap>,
}

impl Renderer {
    /// Initializes the GPU renderer for the provided window.
    pub async fn new(window: Arc<Window>, initial_state: &RenderState) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        let device_descriptor = wgpu::DeviceDescriptor {
            label: Some("renderer-device"),
            // Line polygon mode backs the wireframe toggle.
            required_features: wgpu::Features::POLYGON_MODE_LINE,
            required_limits: wgpu::Limits::default(),
            experimental_features: Default::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
        };
        let (device, queue) = adapter
            .request_device(&device_descriptor)
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, config.width, config.height);

        let block_bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform-block-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let color_cube_bind_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("color-cubemap-layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::Cube,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });
        let depth_cube_bind_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("depth-cubemap-layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Depth,
                            view_dimension: wgpu::TextureViewDimension::Cube,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                        count: None,
                    },
                ],
            });

        let pipelines = PipelineSet::build(&PipelineParams {
            device: &device,
            surface_format,
            block_layout: &block_bind_layout,
            color_cube_layout: &color_cube_bind_layout,
            depth_cube_layout: &depth_cube_bind_layout,
        })
        .context("failed to build render pipelines")?;

        let platform = MeshBuffers::from_mesh(&device, &mesh::platform(), "platform");
        let sphere = MeshBuffers::from_mesh(
            &device,
            &icosphere::build(icosphere::DEFAULT_SUBDIVISIONS),
            "sphere",
        );
        let teapot_level = initial_state.tess_level;
        let teapot = MeshBuffers::from_mesh(&device, &teapot::tessellate(teapot_level), "teapot");

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth,
            scene_layout: block::scene_layout(),
            light_layout: block::light_layout(),
            material_layout: block::material_layout(),
            block_bind_layout,
            color_cube_bind_layout,
            depth_cube_bind_layout,
            pipelines,
            platform,
            sphere,
            teapot,
            teapot_level,
            shadow_color: None,
            shadow_depth: None,
        })
    }

    /// Returns the identifier of the window owned by the renderer.
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// Exposes the inner window for event handling.
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Resizes the swap chain to match the new dimensions.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
    }

    /// Encodes and submits the frame: the cubemap pass if the active
    /// technique needs one, then the main scene pass.
    pub fn render(
        &mut self,
        state: &RenderState,
        camera: &ArcballCamera,
    ) -> Result<(), wgpu::SurfaceError> {
        self.ensure_teapot(state.tess_level);
        let plan = FramePlan::for_state(state);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        let instances = SceneInstances::at_angle(state.angle_offset);

        if let Some(kind) = plan.cubemap_pass {
            self.prepare_cubemap(kind, state);
            self.encode_cubemap_pass(&mut encoder, kind, state, &instances);
        }
        self.encode_scene_pass(&mut encoder, &view, state, camera, &instances, plan);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Rebuilds the teapot mesh when the tessellation level changes.
    fn ensure_teapot(&mut self, level: f32) {
        if (level - self.teapot_level).abs() < f32::EPSILON {
            return;
        }
        self.teapot = MeshBuffers::from_mesh(&self.device, &teapot::tessellate(level), "teapot");
        self.teapot_level = level;
    }

    /// Reallocates the cubemap for `kind` when the resolution or filter
    /// settings no longer match the existing allocation.
    fn prepare_cubemap(&mut self, kind: CubemapKind, state: &RenderState) {
        let limit = self.device.limits().max_texture_dimension_2d;
        let resolution = state.shadow_resolution.min(limit);
        if resolution != state.shadow_resolution {
            warn!(
                "shadow resolution {} exceeds the device limit, clamping to {limit}",
                state.shadow_resolution
            );
        }
        let linear = state.options.linear_filter;

        let (slot, layout) = match kind {
            CubemapKind::Color => (&mut self.shadow_color, &self.color_cube_bind_layout),
            CubemapKind::Depth => (&mut self.shadow_depth, &self.depth_cube_bind_layout),
        };
        if slot
            .as_ref()
            .is_some_and(|cubemap| cubemap.matches(resolution, linear))
        {
            return;
        }
        *slot = Some(ShadowCubemap::allocate(
            &self.device,
            kind,
            resolution,
            linear,
            layout,
        ));
    }

    /// Six passes from the light's point of view, one per cubemap face.
    /// The color kind writes encoded distance, the depth kind only the
    /// depth buffer; both share the face transforms and the draw list.
    fn encode_cubemap_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        kind: CubemapKind,
        state: &RenderState,
        instances: &SceneInstances,
    ) {
        let cubemap = match kind {
            CubemapKind::Color => self.shadow_color.as_ref(),
            CubemapKind::Depth => self.shadow_depth.as_ref(),
        };
        let Some(cubemap) = cubemap else {
            warn!("cubemap pass requested before allocation");
            return;
        };

        let light_pos = state.light.position;
        let faces = face_view_projections(light_pos);

        let light_group = self.block_group("light-block", &self.light_block_bytes(state));
        let pipeline = match kind {
            CubemapKind::Color => &self.pipelines.cast_color,
            CubemapKind::Depth => self.pipelines.cast_depth_variant(state.options.cull_front),
        };

        let mut casters: Vec<(&MeshBuffers, Mat4)> = Vec::new();
        for model in instances.spheres {
            casters.push((&self.sphere, model));
        }
        if kind == CubemapKind::Depth && state.outer_ring {
            for model in instances.outer_ring {
                casters.push((&self.sphere, model));
            }
        }
        for model in instances.teapots {
            casters.push((&self.teapot, model));
        }

        for (face, face_vp) in faces.iter().enumerate() {
            let scene_groups: Vec<wgpu::BindGroup> = casters
                .iter()
                .map(|(_, model)| {
                    let bytes = self.cast_scene_bytes(*model, *face_vp, light_pos, state);
                    self.block_group("scene-block", &bytes)
                })
                .collect();

            let color_attachments = [Some(wgpu::RenderPassColorAttachment {
                view: cubemap.face_view(face),
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    // Empty space reads as the far plane.
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store: wgpu::StoreOp::Store,
                },
            })];

            let mut pass = match kind {
                CubemapKind::Color => encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("shadow-texture-face"),
                    color_attachments: &color_attachments,
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                }),
                CubemapKind::Depth => encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("shadow-map-face"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: cubemap.face_view(face),
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                }),
            };

            pass.set_pipeline(pipeline);
            pass.set_bind_group(1, &light_group, &[]);
            for ((mesh, _), scene_group) in casters.iter().zip(&scene_groups) {
                pass.set_bind_group(0, scene_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex.slice(..));
                pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
    }

    /// The on-screen pass: platform, optional planar overlays, teapots,
    /// spheres, optional outer ring, light marker, in that order.
    fn encode_scene_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        state: &RenderState,
        camera: &ArcballCamera,
        instances: &SceneInstances,
        plan: FramePlan,
    ) {
        let width = self.size.width.max(1) as f32;
        let height = self.size.height.max(1) as f32;
        let projection =
            Mat4::perspective_rh(45f32.to_radians(), width / height, SHADOW_NEAR, SHADOW_FAR);
        let view_projection = projection * camera.view_matrix();
        let viewport = viewport_matrix(width, height);
        let eye = camera.position();

        let light_group = self.block_group("light-block", &self.light_block_bytes(state));

        let wire = usize::from(state.wireframe);
        let color_cube = self.shadow_color.as_ref().map(ShadowCubemap::bind_group);
        let depth_cube = self.shadow_depth.as_ref().map(ShadowCubemap::bind_group);

        let scene_group = |model: Mat4| {
            let bytes =
                self.main_scene_bytes(model, view_projection, viewport, eye, state);
            self.block_group("scene-block", &bytes)
        };
        let material_group = |material: Material| {
            self.block_group("material-block", &self.material_bytes(material))
        };

        let mut draws: Vec<DrawCmd<'_>> = Vec::new();

        // Platform, shaded with whatever the technique samples.
        let (platform_pipeline, platform_cube) = match (state.technique, color_cube, depth_cube) {
            (ShadowTechnique::Textures, Some(cube), _) => {
                (&self.pipelines.shadow_texture[wire], Some(cube))
            }
            (ShadowTechnique::Maps, _, Some(cube)) => (&self.pipelines.shadow_map[wire], Some(cube)),
            _ => {
                if plan.planar_overlay && state.options.planar_stencil {
                    (&self.pipelines.lit_stencil_write[wire], None)
                } else {
                    (&self.pipelines.lit[wire], None)
                }
            }
        };
        draws.push(DrawCmd {
            pipeline: platform_pipeline,
            mesh: &self.platform,
            scene: scene_group(instances.platform),
            material: material_group(Material::platform()),
            cube: platform_cube,
            stencil_reference: 0,
        });

        // Flattened silhouettes confined to the platform.
        if plan.planar_overlay {
            let flatten =
                planar_shadow_matrix(state.light.position, Vec4::new(0.0, 1.0, 0.0, 0.0));
            let overlay_pipeline = self
                .pipelines
                .overlay_variant(state.options.planar_depth_test, state.options.planar_stencil);
            let alpha = if state.options.planar_blend { 0.5 } else { 1.0 };
            let overlay_material = Material::platform().with_shininess(alpha);

            let mut overlay_models: Vec<(&MeshBuffers, Mat4)> = Vec::new();
            for model in instances.teapots {
                overlay_models.push((&self.teapot, model));
            }
            for model in instances.spheres {
                overlay_models.push((&self.sphere, model));
            }
            if state.outer_ring {
                for model in instances.outer_ring {
                    overlay_models.push((&self.sphere, model));
                }
            }
            for (mesh, model) in overlay_models {
                draws.push(DrawCmd {
                    pipeline: overlay_pipeline,
                    mesh,
                    scene: scene_group(flatten * model),
                    material: material_group(overlay_material),
                    cube: None,
                    stencil_reference: 1,
                });
            }
        }

        // Teapots and spheres sample the depth cubemap under the maps
        // technique and render plainly otherwise.
        let (object_pipeline, object_cube) = match (state.technique, depth_cube) {
            (ShadowTechnique::Maps, Some(cube)) => (&self.pipelines.shadow_map[wire], Some(cube)),
            _ => (&self.pipelines.lit[wire], None),
        };
        for model in instances.teapots {
            draws.push(DrawCmd {
                pipeline: object_pipeline,
                mesh: &self.teapot,
                scene: scene_group(model),
                material: material_group(Material::teapot()),
                cube: object_cube,
                stencil_reference: 0,
            });
        }
        for model in instances.spheres {
            draws.push(DrawCmd {
                pipeline: object_pipeline,
                mesh: &self.sphere,
                scene: scene_group(model),
                material: material_group(Material::sphere()),
                cube: object_cube,
                stencil_reference: 0,
            });
        }

        if state.outer_ring {
            let (ring_pipeline, ring_cube) = match (state.technique, color_cube, depth_cube) {
                (ShadowTechnique::Textures, Some(cube), _) => {
                    (&self.pipelines.shadow_texture[wire], Some(cube))
                }
                (ShadowTechnique::Maps, _, Some(cube)) => {
                    (&self.pipelines.shadow_map[wire], Some(cube))
                }
                _ => (&self.pipelines.lit[wire], None),
            };
            for model in instances.outer_ring {
                draws.push(DrawCmd {
                    pipeline: ring_pipeline,
                    mesh: &self.sphere,
                    scene: scene_group(model),
                    material: material_group(Material::outer_ring()),
                    cube: ring_cube,
                    stencil_reference: 0,
                });
            }
        }

        // The light itself, drawn emissive.
        draws.push(DrawCmd {
            pipeline: &self.pipelines.flat_light,
            mesh: &self.sphere,
            scene: scene_group(SceneInstances::light_marker(state.light.position)),
            material: material_group(Material::light_marker()),
            cube: None,
            stencil_reference: 0,
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_bind_group(1, &light_group, &[]);
        for draw in &draws {
            pass.set_pipeline(draw.pipeline);
            pass.set_stencil_reference(draw.stencil_reference);
            pass.set_bind_group(0, &draw.scene, &[]);
            pass.set_bind_group(2, &draw.material, &[]);
            if let Some(cube) = draw.cube {
                pass.set_bind_group(3, cube, &[]);
            }
            pass.set_vertex_buffer(0, draw.mesh.vertex.slice(..));
            pass.set_index_buffer(draw.mesh.index.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..draw.mesh.index_count, 0, 0..1);
        }
    }

    /// Uploads a staged block and wraps it in a bind group, one per
    /// draw; the GPU queue keeps the buffer alive for the frame.
    fn block_group(&self, label: &str, bytes: &[u8]) -> wgpu::BindGroup {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytes,
                usage: wgpu::BufferUsages::UNIFORM,
            });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.block_bind_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    fn main_scene_bytes(
        &self,
        model: Mat4,
        view_projection: Mat4,
        viewport: Mat4,
        eye: Vec3,
        state: &RenderState,
    ) -> Vec<u8> {
        self.scene_layout
            .pack(&[
                BlockValue::Mat4(model),
                BlockValue::Mat4(view_projection),
                BlockValue::Mat4(view_projection * model),
                BlockValue::Mat4(viewport),
                BlockValue::Mat4(Mat4::IDENTITY),
                BlockValue::F32(state.tess_level),
                BlockValue::Vec3(eye),
                BlockValue::I32(state.wireframe.into()),
                BlockValue::I32(state.control_points.into()),
            ])
            .expect("scene block values match the declared layout")
    }

    fn cast_scene_bytes(
        &self,
        model: Mat4,
        shadow_view_projection: Mat4,
        light_pos: Vec3,
        state: &RenderState,
    ) -> Vec<u8> {
        self.scene_layout
            .pack(&[
                BlockValue::Mat4(model),
                BlockValue::Mat4(Mat4::IDENTITY),
                BlockValue::Mat4(Mat4::IDENTITY),
                BlockValue::Mat4(Mat4::IDENTITY),
                BlockValue::Mat4(shadow_view_projection),
                BlockValue::F32(state.tess_level),
                BlockValue::Vec3(light_pos),
                BlockValue::I32(state.wireframe.into()),
                BlockValue::I32(state.control_points.into()),
            ])
            .expect("scene block values match the declared layout")
    }

    fn light_block_bytes(&self, state: &RenderState) -> Vec<u8> {
        self.light_layout
            .pack(&[
                BlockValue::Vec4(state.light.position.extend(1.0)),
                BlockValue::Vec3(Vec3::ONE),
                BlockValue::Vec3(Vec3::ONE),
                BlockValue::Vec3(Vec3::ONE),
                BlockValue::F32(1.0),
                BlockValue::F32(0.027),
                BlockValue::F32(0.0028),
                BlockValue::F32(state.shadow_bias),
                BlockValue::I32(state.multisampling.into()),
                BlockValue::F32(state.shadow_map_samples),
            ])
            .expect("light block values match the declared layout")
    }

    fn material_bytes(&self, material: Material) -> Vec<u8> {
        self.material_layout
            .pack(&[
                BlockValue::Vec3(material.ambient),
                BlockValue::Vec3(material.diffuse),
                BlockValue::Vec3(material.specular),
                BlockValue::F32(material.shininess),
            ])
            .expect("material block values match the declared layout")
    }
}

struct DrawCmd<'a> {
    pipeline: &'a wgpu::RenderPipeline,
    mesh: &'a MeshBuffers,
    scene: wgpu::BindGroup,
    material: wgpu::BindGroup,
    cube: Option<&'a wgpu::BindGroup>,
    stencil_reference: u32,
}

/// Manual clip-to-window transform carried in the scene block so
/// shaders can reason in window space.
fn viewport_matrix(width: f32, height: f32) -> Mat4 {
    let w2 = width / 2.0;
    let h2 = height / 2.0;
    Mat4::from_cols(
        Vec4::new(w2, 0.0, 0.0, 0.0),
        Vec4::new(0.0, -h2, 0.0, 0.0),
        Vec4::new(0.0, 0.0, SHADOW_FAR - SHADOW_NEAR, 0.0),
        Vec4::new(w2, h2, SHADOW_NEAR, 1.0),
    )
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn from_mesh(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.index_count(),
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-stencil-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SCENE_DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;

    #[test]
    fn no_technique_means_no_shadow_work() {
        let state = RenderState::new();
        let plan = FramePlan::for_state(&state);
        assert_eq!(plan.cubemap_pass, None);
        assert!(!plan.planar_overlay);
    }

    #[test]
    fn techniques_map_to_their_passes() {
        let mut state = RenderState::new();
        state.apply_key(KeyCode::Digit(4));
        assert_eq!(
            FramePlan::for_state(&state).cubemap_pass,
            Some(CubemapKind::Color)
        );
        state.apply_key(KeyCode::Digit(6));
        assert_eq!(
            FramePlan::for_state(&state).cubemap_pass,
            Some(CubemapKind::Depth)
        );
        state.apply_key(KeyCode::Digit(1));
        let plan = FramePlan::for_state(&state);
        assert_eq!(plan.cubemap_pass, None);
        assert!(plan.planar_overlay);
    }

    #[test]
    fn viewport_matrix_maps_clip_corners_to_window_corners() {
        let matrix = viewport_matrix(1920.0, 1080.0);
        let upper_left = matrix * Vec4::new(-1.0, 1.0, 0.0, 1.0);
        assert_eq!(upper_left.x, 0.0);
        assert_eq!(upper_left.y, 0.0);
        let center = matrix * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(center.x, 960.0);
        assert_eq!(center.y, 540.0);
    }
}
