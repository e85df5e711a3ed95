//! wgpu implementation of [`GpuBackend`].
//!
//! The immediate calls made by `Graphics` are recorded during the frame:
//! every `draw_triangles` snapshots the bound program, blend mode, texture,
//! viewport, uniform block and vertex streams. [`WgpuBackend::present`] then
//! encodes the recording into render passes (one per target switch) with
//! clears folded into load ops.

mod layout;

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::error::{EngineError, Result};
use crate::paint::{BlendMode, Color};

use super::backend::check_image_len;
use super::{AttributeRole, GpuBackend, ImageId, ProgramId, ShaderSource, TargetId, UniformValue};
use layout::{UNIFORM_ALIGN, UniformLayout, blend_state, round_up_u64, uniform_layout, write_uniform};

/// Format of every image and offscreen target.
const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct Program {
    name: String,
    module: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    uniform_bgl: wgpu::BindGroupLayout,
    uniforms: UniformLayout,
    /// Current uniform block contents.
    block: Vec<u8>,
    /// One single-attribute vertex buffer per declared attribute.
    vertex_attrs: Vec<[wgpu::VertexAttribute; 1]>,
    strides: Vec<u64>,
    has_sampler: bool,
}

struct Image {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
    size: (u32, u32),
}

struct Target {
    image: ImageId,
}

#[derive(Debug, Clone)]
struct Draw {
    program: ProgramId,
    blend: BlendMode,
    texture: Option<ImageId>,
    uniform_offset: u32,
    streams: Vec<Range<u64>>,
    vertex_count: u32,
    viewport: (u32, u32),
}

#[derive(Debug, Clone)]
struct Pass {
    target: Option<TargetId>,
    clear: Option<Color>,
    draws: Vec<Draw>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    program: ProgramId,
    blend: BlendMode,
    format: wgpu::TextureFormat,
}

/// GPU backend over a wgpu device.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    screen: (u32, u32),

    programs: Vec<Program>,
    images: Vec<Image>,
    targets: Vec<Target>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    texture_bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    // bound state
    program: Option<ProgramId>,
    blend: BlendMode,
    texture: Option<ImageId>,
    enabled: Vec<bool>,
    streams: Vec<Option<Range<u64>>>,
    viewport: (u32, u32),

    // frame recording
    vertex_bytes: Vec<u8>,
    uniform_bytes: Vec<u8>,
    passes: Vec<Pass>,
}

impl WgpuBackend {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        screen: (u32, u32),
    ) -> Self {
        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen texture bgl"),
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

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lumen nearest sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            device,
            queue,
            surface_format,
            screen,
            programs: Vec::new(),
            images: Vec::new(),
            targets: Vec::new(),
            pipelines: HashMap::new(),
            texture_bgl,
            sampler,
            program: None,
            blend: BlendMode::NORMAL,
            texture: None,
            enabled: Vec::new(),
            streams: Vec::new(),
            viewport: screen,
            vertex_bytes: Vec::new(),
            uniform_bytes: Vec::new(),
            passes: Vec::new(),
        }
    }

    pub fn set_surface_format(&mut self, format: wgpu::TextureFormat) {
        self.surface_format = format;
    }

    fn current_pass(&mut self) -> &mut Pass {
        if self.passes.is_empty() {
            self.passes.push(Pass { target: None, clear: None, draws: Vec::new() });
        }
        let last = self.passes.len() - 1;
        &mut self.passes[last]
    }

    fn target_size(&self, target: Option<TargetId>) -> (u32, u32) {
        target
            .and_then(|t| self.targets.get(t.index()))
            .and_then(|t| self.images.get(t.image.index()))
            .map_or(self.screen, |img| img.size)
    }

    fn pipeline(&self, key: PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&key)
    }

    fn build_pipeline(&self, key: PipelineKey) -> Option<wgpu::RenderPipeline> {
        let program = self.programs.get(key.program.index())?;
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = program
            .vertex_attrs
            .iter()
            .zip(&program.strides)
            .map(|(attrs, stride)| wgpu::VertexBufferLayout {
                array_stride: *stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        Some(self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(program.name.as_str()),
            layout: Some(&program.layout),
            vertex: wgpu::VertexState {
                module: &program.module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &program.module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.format,
                    blend: Some(blend_state(key.blend)),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        }))
    }

    fn format_of(&self, target: Option<TargetId>) -> wgpu::TextureFormat {
        if target.is_some() { IMAGE_FORMAT } else { self.surface_format }
    }

    fn alloc_image(&mut self, width: u32, height: u32, usage: wgpu::TextureUsages) -> ImageId {
        let size = wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen image"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: IMAGE_FORMAT,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lumen image bind group"),
            layout: &self.texture_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
            ],
        });
        let id = ImageId(self.images.len() as u32);
        self.images.push(Image { texture, view, bind_group, size: (size.width, size.height) });
        id
    }

    /// Encodes the frame's recorded passes into `encoder`. `screen` is the
    /// surface view that `bind_target(None)` refers to.
    pub fn present(&mut self, encoder: &mut wgpu::CommandEncoder, screen: &wgpu::TextureView) {
        // Pipelines first; the pass loop below only borrows.
        let keys: Vec<PipelineKey> = self
            .passes
            .iter()
            .flat_map(|pass| {
                let format = self.format_of(pass.target);
                pass.draws.iter().map(move |d| PipelineKey { program: d.program, blend: d.blend, format })
            })
            .collect();
        for key in keys {
            if !self.pipelines.contains_key(&key) {
                if let Some(pipeline) = self.build_pipeline(key) {
                    self.pipelines.insert(key, pipeline);
                }
            }
        }

        let vertex_buffer = (!self.vertex_bytes.is_empty()).then(|| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lumen frame vertices"),
                contents: &self.vertex_bytes,
                usage: wgpu::BufferUsages::VERTEX,
            })
        });
        let uniform_buffer = (!self.uniform_bytes.is_empty()).then(|| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lumen frame uniforms"),
                contents: &self.uniform_bytes,
                usage: wgpu::BufferUsages::UNIFORM,
            })
        });

        let uniform_groups: Vec<Option<wgpu::BindGroup>> = self
            .programs
            .iter()
            .map(|p| {
                let buffer = uniform_buffer.as_ref()?;
                Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("lumen uniform bind group"),
                    layout: &p.uniform_bgl,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer,
                            offset: 0,
                            size: NonZeroU64::new(p.uniforms.size as u64),
                        }),
                    }],
                }))
            })
            .collect();

        for pass in &self.passes {
            let view = match pass.target {
                None => screen,
                Some(t) => match self.targets.get(t.index()).and_then(|t| self.images.get(t.image.index())) {
                    Some(img) => &img.view,
                    None => continue,
                },
            };
            let load = match pass.clear {
                Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                    r: c.r() as f64,
                    g: c.g() as f64,
                    b: c.b() as f64,
                    a: c.a() as f64,
                }),
                None => wgpu::LoadOp::Load,
            };
            let (tw, th) = self.target_size(pass.target);
            let format = self.format_of(pass.target);

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lumen pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let (Some(vertices), Some(_)) = (vertex_buffer.as_ref(), uniform_buffer.as_ref()) else {
                continue;
            };
            for draw in &pass.draws {
                let key = PipelineKey { program: draw.program, blend: draw.blend, format };
                let Some(pipeline) = self.pipeline(key) else { continue };
                let Some(Some(uniforms)) = uniform_groups.get(draw.program.index()) else { continue };

                rpass.set_pipeline(pipeline);
                let vw = draw.viewport.0.clamp(1, tw.max(1)) as f32;
                let vh = draw.viewport.1.clamp(1, th.max(1)) as f32;
                rpass.set_viewport(0.0, 0.0, vw, vh, 0.0, 1.0);
                rpass.set_bind_group(0, uniforms, &[draw.uniform_offset]);
                if let Some(image) = draw.texture.and_then(|t| self.images.get(t.index())) {
                    rpass.set_bind_group(1, &image.bind_group, &[]);
                }
                for (slot, range) in draw.streams.iter().enumerate() {
                    rpass.set_vertex_buffer(slot as u32, vertices.slice(range.clone()));
                }
                rpass.draw(0..draw.vertex_count, 0..1);
            }
        }
    }
}

impl GpuBackend for WgpuBackend {
    fn compile_program(&mut self, source: &ShaderSource) -> Result<ProgramId> {
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.name.as_str()),
            source: wgpu::ShaderSource::Wgsl(source.combined_wgsl().into()),
        });
        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(EngineError::ShaderCompile { shader: source.name.clone(), message: err.to_string() });
        }

        let uniforms = uniform_layout(&source.uniforms);
        let has_sampler = uniforms.slots.len() != uniforms.slots.iter().flatten().count();

        let uniform_bgl = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(uniforms.size as u64),
                },
                count: None,
            }],
        });
        let groups: Vec<&wgpu::BindGroupLayout> = if has_sampler {
            vec![&uniform_bgl, &self.texture_bgl]
        } else {
            vec![&uniform_bgl]
        };
        let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen program layout"),
            bind_group_layouts: &groups,
            immediate_size: 0,
        });

        let vertex_attrs = source
            .attributes
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let format = match a.role {
                    AttributeRole::Position | AttributeRole::Texcoord => wgpu::VertexFormat::Float32x2,
                    AttributeRole::Color => wgpu::VertexFormat::Float32x4,
                };
                [wgpu::VertexAttribute { format, offset: 0, shader_location: i as u32 }]
            })
            .collect();
        let strides = source.attributes.iter().map(|a| a.role.components() as u64 * 4).collect();

        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(Program {
            name: source.name.clone(),
            module,
            layout,
            uniform_bgl,
            block: vec![0; uniforms.size as usize],
            uniforms,
            vertex_attrs,
            strides,
            has_sampler,
        });

        // Building the screen pipeline validates the stage interface.
        let key = PipelineKey { program: id, blend: BlendMode::NORMAL, format: self.surface_format };
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.build_pipeline(key);
        if let Some(err) = pollster::block_on(scope.pop()) {
            self.programs.pop();
            return Err(EngineError::ShaderLink { shader: source.name.clone(), message: err.to_string() });
        }
        if let Some(pipeline) = pipeline {
            self.pipelines.insert(key, pipeline);
        }
        log::debug!("compiled program `{}` as {id:?}", source.name);
        Ok(id)
    }

    fn use_program(&mut self, program: ProgramId) {
        self.program = Some(program);
    }

    fn enable_attribute(&mut self, location: u32) {
        let i = location as usize;
        if self.enabled.len() <= i {
            self.enabled.resize(i + 1, false);
        }
        self.enabled[i] = true;
    }

    fn disable_attribute(&mut self, location: u32) {
        if let Some(slot) = self.enabled.get_mut(location as usize) {
            *slot = false;
        }
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn set_uniform(&mut self, program: ProgramId, location: u32, value: &UniformValue) {
        let Some(p) = self.programs.get_mut(program.index()) else { return };
        if let Some(Some(offset)) = p.uniforms.slots.get(location as usize) {
            write_uniform(&mut p.block, *offset, value);
        }
    }

    fn bind_texture(&mut self, unit: u32, image: ImageId) {
        if unit == 0 {
            self.texture = Some(image);
        } else {
            log::warn!("texture unit {unit} is not supported; only unit 0 is bound");
        }
    }

    fn upload_attribute(&mut self, location: u32, data: &[f32], _components: u32) {
        let i = location as usize;
        if self.streams.len() <= i {
            self.streams.resize(i + 1, None);
        }
        let start = self.vertex_bytes.len() as u64;
        self.vertex_bytes.extend_from_slice(bytemuck::cast_slice(data));
        self.streams[i] = Some(start..self.vertex_bytes.len() as u64);
    }

    fn draw_triangles(&mut self, vertex_count: u32) {
        let Some(program) = self.program else {
            log::warn!("draw without a bound program ignored");
            return;
        };
        let Some(p) = self.programs.get(program.index()) else { return };

        let mut streams = Vec::with_capacity(p.vertex_attrs.len());
        for location in 0..p.vertex_attrs.len() {
            let enabled = self.enabled.get(location).copied().unwrap_or(false);
            match self.streams.get(location).cloned().flatten() {
                Some(range) if enabled => streams.push(range),
                _ => {
                    log::warn!("program `{}` draws without attribute {location}; skipped", p.name);
                    return;
                }
            }
        }
        let texture = if p.has_sampler { self.texture } else { None };
        if p.has_sampler && texture.is_none() {
            log::warn!("program `{}` draws without a bound texture; skipped", p.name);
            return;
        }

        let offset = round_up_u64(self.uniform_bytes.len() as u64, UNIFORM_ALIGN);
        self.uniform_bytes.resize(offset as usize, 0);
        self.uniform_bytes.extend_from_slice(&p.block);

        let draw = Draw {
            program,
            blend: self.blend,
            texture,
            uniform_offset: offset as u32,
            streams,
            vertex_count,
            viewport: self.viewport,
        };
        self.current_pass().draws.push(draw);
    }

    fn bind_target(&mut self, target: Option<TargetId>) {
        match self.passes.last_mut() {
            Some(pass) if pass.draws.is_empty() && pass.clear.is_none() => pass.target = target,
            _ => self.passes.push(Pass { target, clear: None, draws: Vec::new() }),
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn clear(&mut self, color: Color) {
        let pass = self.current_pass();
        if pass.draws.is_empty() {
            pass.clear = Some(color);
        } else {
            let target = pass.target;
            self.passes.push(Pass { target, clear: Some(color), draws: Vec::new() });
        }
    }

    fn create_image(&mut self, width: u32, height: u32, rgba: Option<&[u8]>) -> Result<ImageId> {
        check_image_len(width, height, rgba)?;
        let id = self.alloc_image(
            width,
            height,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        if let (Some(bytes), Some(image)) = (rgba, self.images.get(id.index())) {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &image.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                bytes,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            );
        }
        Ok(id)
    }

    fn create_target(&mut self, width: u32, height: u32) -> Result<(TargetId, ImageId)> {
        let image = self.alloc_image(
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let id = TargetId(self.targets.len() as u32);
        self.targets.push(Target { image });
        Ok((id, image))
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn resize_screen(&mut self, width: u32, height: u32) {
        self.screen = (width, height);
    }

    fn end_frame(&mut self) {
        self.vertex_bytes.clear();
        self.uniform_bytes.clear();
        self.passes.clear();
        self.streams.clear();
    }
}
