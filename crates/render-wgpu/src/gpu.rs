use crate::camera::FirstPersonCamera;
use crate::shaders;
use crate::target::{CANVAS_FORMAT, DEPTH_FORMAT, OffscreenTarget};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use pixelgrab_kernel::ObjectRegistry;
use pixelgrab_render::{AppearancePolicy, CanvasLayout, Color, Rect, TargetOrigin};
use wgpu::util::DeviceExt;

/// Wireframes are drawn this much larger than the filled cube so the two
/// don't z-fight.
const WIRE_INFLATE: f32 = 1.002;

/// Grid floor: lines from -5 to 5 at unit spacing.
const GRID_HALF_SLICES: i32 = 5;
const GRID_SPACING: f32 = 1.0;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    offset: [f32; 3],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GridVertex {
    position: [f32; 3],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct OverlayVertex {
    position: [f32; 2],
    color: [f32; 4],
}

/// Unit cube triangles, counter-clockwise front faces.
fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    let v = |x: f32, y: f32, z: f32| Vertex { position: [x, y, z] };
    #[rustfmt::skip]
    let vertices = vec![
        // +Z
        v(-p, -p,  p), v( p, -p,  p), v( p,  p,  p), v(-p,  p,  p),
        // -Z
        v( p, -p, -p), v(-p, -p, -p), v(-p,  p, -p), v( p,  p, -p),
        // +X
        v( p, -p,  p), v( p, -p, -p), v( p,  p, -p), v( p,  p,  p),
        // -X
        v(-p, -p, -p), v(-p, -p,  p), v(-p,  p,  p), v(-p,  p, -p),
        // +Y
        v(-p,  p,  p), v( p,  p,  p), v( p,  p, -p), v(-p,  p, -p),
        // -Y
        v(-p, -p, -p), v( p, -p, -p), v( p, -p,  p), v(-p, -p,  p),
    ];
    let indices = (0..6u16)
        .flat_map(|face| {
            let b = face * 4;
            [b, b + 1, b + 2, b + 2, b + 3, b]
        })
        .collect();
    (vertices, indices)
}

/// The 12 edges of a unit cube as a line list.
fn wire_mesh() -> Vec<Vertex> {
    let p = 0.5 * WIRE_INFLATE;
    let corner = |i: usize| Vertex {
        position: [
            if i & 1 == 0 { -p } else { p },
            if i & 2 == 0 { -p } else { p },
            if i & 4 == 0 { -p } else { p },
        ],
    };
    let mut verts = Vec::with_capacity(24);
    for a in 0..8usize {
        for axis in [1usize, 2, 4] {
            if a & axis == 0 {
                verts.push(corner(a));
                verts.push(corner(a | axis));
            }
        }
    }
    verts
}

/// Grid floor line vertices; the two center lines are darker.
fn grid_mesh(half_slices: i32, spacing: f32) -> Vec<GridVertex> {
    let mut verts = Vec::new();
    let extent = half_slices as f32 * spacing;

    for i in -half_slices..=half_slices {
        let offset = i as f32 * spacing;
        let color = if i == 0 {
            Color::GRID_AXIS.to_linear()
        } else {
            Color::GRID_LINE.to_linear()
        };
        // Lines along Z
        verts.push(GridVertex {
            position: [offset, 0.0, -extent],
            color,
        });
        verts.push(GridVertex {
            position: [offset, 0.0, extent],
            color,
        });
        // Lines along X
        verts.push(GridVertex {
            position: [-extent, 0.0, offset],
            color,
        });
        verts.push(GridVertex {
            position: [extent, 0.0, offset],
            color,
        });
    }
    verts
}

/// Two triangles covering the overscanned composite rectangle.
fn composite_quad(layout: &CanvasLayout) -> [QuadVertex; 6] {
    let (tl, br) = layout.composite_dest().to_ndc(layout.display_size());
    let (uv_tl, uv_br) = layout.source_uv(TargetOrigin::TopLeft);
    let q = |x: f32, y: f32, u: f32, v: f32| QuadVertex {
        position: [x, y],
        uv: [u, v],
    };
    [
        q(tl.x, tl.y, uv_tl.x, uv_tl.y),
        q(tl.x, br.y, uv_tl.x, uv_br.y),
        q(br.x, br.y, uv_br.x, uv_br.y),
        q(br.x, br.y, uv_br.x, uv_br.y),
        q(br.x, tl.y, uv_br.x, uv_tl.y),
        q(tl.x, tl.y, uv_tl.x, uv_tl.y),
    ]
}

fn overlay_rects(layout: &CanvasLayout, rects: &[Rect], color: Color) -> Vec<OverlayVertex> {
    let color = color.to_linear();
    rects
        .iter()
        .flat_map(|rect| {
            let (tl, br) = rect.to_ndc(layout.display_size());
            let o = |x: f32, y: f32| OverlayVertex {
                position: [x, y],
                color,
            };
            [
                o(tl.x, tl.y),
                o(tl.x, br.y),
                o(br.x, br.y),
                o(br.x, br.y),
                o(br.x, tl.y),
                o(tl.x, tl.y),
            ]
        })
        .collect()
}

fn clear_color(color: Color) -> wgpu::Color {
    let [r, g, b, a] = color.to_linear();
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    }
}

/// wgpu renderer for the pixelated scene.
///
/// Each frame draws grid and boxes into a low-resolution [`OffscreenTarget`],
/// stretches it over the display with nearest filtering, and draws the
/// crosshair on top at full resolution.
pub struct WgpuRenderer {
    layout: CanvasLayout,
    target: OffscreenTarget,
    cube_pipeline: wgpu::RenderPipeline,
    wire_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    composite_layout: wgpu::BindGroupLayout,
    composite_bind_group: wgpu::BindGroup,
    canvas_sampler: wgpu::Sampler,
    cube_vertex_buffer: wgpu::Buffer,
    cube_index_buffer: wgpu::Buffer,
    cube_index_count: u32,
    wire_vertex_buffer: wgpu::Buffer,
    wire_vertex_count: u32,
    grid_vertex_buffer: wgpu::Buffer,
    grid_vertex_count: u32,
    fill_instances: wgpu::Buffer,
    wire_instances: wgpu::Buffer,
    max_instances: u32,
    quad_buffer: wgpu::Buffer,
    overlay_buffer: wgpu::Buffer,
    overlay_vertex_count: u32,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        layout: CanvasLayout,
        max_instances: u32,
    ) -> Self {
        let max_instances = max_instances.max(1);

        // Uniform buffer
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("composite_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
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

        // Nearest filtering is what makes the canvas read as pixels.
        let canvas_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("canvas_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let target = OffscreenTarget::new(device, layout.canvas_size());
        let composite_bind_group =
            Self::create_composite_bind_group(device, &composite_layout, &target, &canvas_sampler);

        let cube_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cube_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::CUBE_SHADER.into()),
        });
        let grid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::GRID_SHADER.into()),
        });
        let composite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("composite_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::COMPOSITE_SHADER.into()),
        });
        let overlay_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("overlay_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::OVERLAY_SHADER.into()),
        });

        let cube_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3],
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<InstanceData>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![
                    1 => Float32x3,
                    2 => Float32x4,
                ],
            },
        ];

        let cube_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cube_pipeline"),
            layout: Some(&scene_layout),
            vertex: wgpu::VertexState {
                module: &cube_shader,
                entry_point: Some("vs_cube"),
                compilation_options: Default::default(),
                buffers: &cube_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &cube_shader,
                entry_point: Some("fs_cube"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: CANVAS_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let wire_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("wire_pipeline"),
            layout: Some(&scene_layout),
            vertex: wgpu::VertexState {
                module: &cube_shader,
                entry_point: Some("vs_cube"),
                compilation_options: Default::default(),
                buffers: &cube_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &cube_shader,
                entry_point: Some("fs_cube"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: CANVAS_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let grid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid_pipeline"),
            layout: Some(&scene_layout),
            vertex: wgpu::VertexState {
                module: &grid_shader,
                entry_point: Some("vs_grid"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GridVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &grid_shader,
                entry_point: Some("fs_grid"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: CANVAS_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let composite_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("composite_pipeline_layout"),
                bind_group_layouts: &[&composite_layout],
                push_constant_ranges: &[],
            });

        let composite_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("composite_pipeline"),
            layout: Some(&composite_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &composite_shader,
                entry_point: Some("vs_composite"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Float32x2,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &composite_shader,
                entry_point: Some("fs_composite"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let overlay_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("overlay_pipeline_layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });

        let overlay_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("overlay_pipeline"),
            layout: Some(&overlay_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &overlay_shader,
                entry_point: Some("vs_overlay"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<OverlayVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &overlay_shader,
                entry_point: Some("fs_overlay"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Meshes
        let (cube_verts, cube_indices) = cube_mesh();
        let cube_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_vertex_buffer"),
            contents: bytemuck::cast_slice(&cube_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_index_buffer"),
            contents: bytemuck::cast_slice(&cube_indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let cube_index_count = cube_indices.len() as u32;

        let wire_verts = wire_mesh();
        let wire_vertex_count = wire_verts.len() as u32;
        let wire_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("wire_vertex_buffer"),
            contents: bytemuck::cast_slice(&wire_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let grid_verts = grid_mesh(GRID_HALF_SLICES, GRID_SPACING);
        let grid_vertex_count = grid_verts.len() as u32;
        let grid_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_vertex_buffer"),
            contents: bytemuck::cast_slice(&grid_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Instance buffers (one slot per registry object)
        let instance_bytes = (max_instances as u64) * std::mem::size_of::<InstanceData>() as u64;
        let fill_instances = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fill_instance_buffer"),
            size: instance_bytes,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let wire_instances = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("wire_instance_buffer"),
            size: instance_bytes,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Screen-space geometry
        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("composite_quad_buffer"),
            contents: bytemuck::cast_slice(&composite_quad(&layout)),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let overlay_verts = overlay_rects(&layout, &layout.crosshair(), Color::CROSSHAIR);
        let overlay_vertex_count = overlay_verts.len() as u32;
        let overlay_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay_buffer"),
            contents: bytemuck::cast_slice(&overlay_verts),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            layout,
            target,
            cube_pipeline,
            wire_pipeline,
            grid_pipeline,
            composite_pipeline,
            overlay_pipeline,
            uniform_buffer,
            uniform_bind_group,
            composite_layout,
            composite_bind_group,
            canvas_sampler,
            cube_vertex_buffer,
            cube_index_buffer,
            cube_index_count,
            wire_vertex_buffer,
            wire_vertex_count,
            grid_vertex_buffer,
            grid_vertex_count,
            fill_instances,
            wire_instances,
            max_instances,
            quad_buffer,
            overlay_buffer,
            overlay_vertex_count,
            surface_format,
        }
    }

    /// Rebuild the offscreen target and screen-space geometry for a new display size.
    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, layout: CanvasLayout) {
        if layout == self.layout {
            return;
        }
        self.target = OffscreenTarget::new(device, layout.canvas_size());
        self.composite_bind_group = Self::create_composite_bind_group(
            device,
            &self.composite_layout,
            &self.target,
            &self.canvas_sampler,
        );
        queue.write_buffer(
            &self.quad_buffer,
            0,
            bytemuck::cast_slice(&composite_quad(&layout)),
        );
        let overlay = overlay_rects(&layout, &layout.crosshair(), Color::CROSSHAIR);
        queue.write_buffer(&self.overlay_buffer, 0, bytemuck::cast_slice(&overlay));
        self.layout = layout;
    }

    pub fn layout(&self) -> &CanvasLayout {
        &self.layout
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Render one frame: scene into the canvas, canvas onto `view`, crosshair on top.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &FirstPersonCamera,
        registry: &ObjectRegistry,
        appearance: &dyn AppearancePolicy,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: camera.view_projection().to_cols_array_2d(),
            }),
        );

        let mut fills: Vec<InstanceData> = Vec::with_capacity(registry.len());
        let mut wires: Vec<InstanceData> = Vec::with_capacity(registry.len());
        for (_, object) in registry.iter().take(self.max_instances as usize) {
            let style = appearance.appearance(object);
            let offset = object.position().to_array();
            fills.push(InstanceData {
                offset,
                color: style.fill.to_linear(),
            });
            wires.push(InstanceData {
                offset,
                color: style.wire.to_linear(),
            });
        }

        if !fills.is_empty() {
            queue.write_buffer(&self.fill_instances, 0, bytemuck::cast_slice(&fills));
            queue.write_buffer(&self.wire_instances, 0, bytemuck::cast_slice(&wires));
        }
        let instance_count = fills.len() as u32;

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("canvas_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.target.color_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(Color::BACKGROUND)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.target.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            pass.set_pipeline(&self.grid_pipeline);
            pass.set_vertex_buffer(0, self.grid_vertex_buffer.slice(..));
            pass.draw(0..self.grid_vertex_count, 0..1);

            if instance_count > 0 {
                pass.set_pipeline(&self.cube_pipeline);
                pass.set_vertex_buffer(0, self.cube_vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.fill_instances.slice(..));
                pass.set_index_buffer(self.cube_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..self.cube_index_count, 0, 0..instance_count);

                pass.set_pipeline(&self.wire_pipeline);
                pass.set_vertex_buffer(0, self.wire_vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.wire_instances.slice(..));
                pass.draw(0..self.wire_vertex_count, 0..instance_count);
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("composite_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(Color::BACKGROUND)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            pass.set_pipeline(&self.composite_pipeline);
            pass.set_bind_group(0, &self.composite_bind_group, &[]);
            pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
            pass.draw(0..6, 0..1);

            pass.set_pipeline(&self.overlay_pipeline);
            pass.set_vertex_buffer(0, self.overlay_buffer.slice(..));
            pass.draw(0..self.overlay_vertex_count, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_composite_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        target: &OffscreenTarget,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(target.color_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_mesh_has_six_faces() {
        let (verts, indices) = cube_mesh();
        assert_eq!(verts.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| (i as usize) < verts.len()));
    }

    #[test]
    fn wire_mesh_has_twelve_edges() {
        let verts = wire_mesh();
        assert_eq!(verts.len(), 24);
        for edge in verts.chunks(2) {
            let a = glam::Vec3::from(edge[0].position);
            let b = glam::Vec3::from(edge[1].position);
            // each edge runs along exactly one axis
            let d = (b - a).abs();
            assert_eq!(d.cmpgt(glam::Vec3::ZERO).bitmask().count_ones(), 1);
        }
    }

    #[test]
    fn grid_spans_ten_units() {
        let verts = grid_mesh(GRID_HALF_SLICES, GRID_SPACING);
        assert_eq!(verts.len(), 11 * 4);
        let max_x = verts
            .iter()
            .map(|v| v.position[0])
            .fold(f32::MIN, f32::max);
        assert_eq!(max_x, 5.0);
    }

    #[test]
    fn composite_quad_covers_overscanned_display() {
        let layout = CanvasLayout::new(1000, 600, 2).unwrap();
        let quad = composite_quad(&layout);
        let xs: Vec<f32> = quad.iter().map(|v| v.position[0]).collect();
        let min_x = xs.iter().copied().fold(f32::MAX, f32::min);
        let max_x = xs.iter().copied().fold(f32::MIN, f32::max);
        assert!(min_x < -1.0 && max_x > 1.0);
        assert_eq!(quad[0].uv, [0.0, 0.0]);
        assert_eq!(quad[2].uv, [1.0, 1.0]);
    }

    #[test]
    fn crosshair_becomes_two_quads() {
        let layout = CanvasLayout::new(1000, 600, 2).unwrap();
        let verts = overlay_rects(&layout, &layout.crosshair(), Color::CROSSHAIR);
        assert_eq!(verts.len(), 12);
        assert!(verts.iter().all(|v| v.color == [0.0, 0.0, 0.0, 1.0]));
    }
}
