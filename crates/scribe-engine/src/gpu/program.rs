use std::collections::HashMap;
use std::num::NonZeroU64;

use thiserror::Error;

use super::{Texture, VertexLayout};
use crate::math::{Mat4, Vec4};

/// Shader program build and lookup errors.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("{label}: WGSL parse failed:\n{message}")]
    Compile { label: String, message: String },
    #[error("{label}: shader validation failed:\n{message}")]
    Validate { label: String, message: String },
    #[error("{label}: no uniform named `{name}`")]
    UnknownUniform { label: String, name: String },
}

/// Kind of a uniform block member, as reflected from WGSL.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformKind {
    F32,
    I32,
    Vec4,
    Mat4,
    /// Declared but not settable through the typed setters.
    Other,
}

/// Pre-resolved location of a uniform member inside the block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformSlot {
    pub offset: u32,
    pub kind: UniformKind,
}

/// A texture + sampler pair consumed by a program.
///
/// The sampler sits at `binding + 1`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureSlot {
    pub binding: u32,
}

/// Everything needed to build a [`Program`].
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub source: &'a str,
    pub vertex_layouts: &'a [&'a VertexLayout],
    pub targets: &'a [Option<wgpu::ColorTargetState>],
    pub depth_stencil: Option<wgpu::DepthStencilState>,
    pub textures: &'a [TextureSlot],
}

/// Reflected uniform block at `@group(0) @binding(0)`.
#[derive(Debug, Default)]
struct UniformBlock {
    size: u32,
    members: HashMap<String, UniformSlot>,
}

/// Validated render pipeline with its uniform block and texture bindings.
pub struct Program {
    label: String,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
    textures: Vec<TextureSlot>,

    uniforms: HashMap<String, UniformSlot>,
    uniform_data: Vec<u8>,
    uniform_buffer: Option<wgpu::Buffer>,
}

impl Program {
    /// Parses and validates `desc.source`, reflects its uniform block and
    /// builds the pipeline.
    pub fn new(device: &wgpu::Device, desc: &ProgramDesc<'_>) -> Result<Self, ShaderError> {
        let block = validate_and_reflect(desc.label, desc.source)?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.source.into()),
        });

        let uniform_buffer = (block.size > 0).then(|| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(desc.label),
                size: u64::from(block.size).next_multiple_of(16),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let mut entries = Vec::with_capacity(1 + desc.textures.len() * 2);
        if block.size > 0 {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(u64::from(block.size)),
                },
                count: None,
            });
        }
        for slot in desc.textures {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: slot.binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: slot.binding + 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(desc.label),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.label),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let buffers: Vec<wgpu::VertexBufferLayout<'_>> =
            desc.vertex_layouts.iter().map(|l| l.buffer_layout()).collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: desc.targets,
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

            depth_stencil: desc.depth_stencil.clone(),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!(
            "{}: program built ({} uniforms, {} texture slots)",
            desc.label,
            block.members.len(),
            desc.textures.len()
        );

        let mut program = Self {
            label: desc.label.to_owned(),
            pipeline,
            bind_group_layout,
            bind_group: None,
            textures: desc.textures.to_vec(),
            uniforms: block.members,
            uniform_data: vec![0; block.size as usize],
            uniform_buffer,
        };

        if program.textures.is_empty() {
            program.rebuild_bind_group(device, &[]);
        }
        Ok(program)
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Resolves a member of the uniform block by name.
    pub fn uniform(&self, name: &str) -> Result<UniformSlot, ShaderError> {
        self.uniforms.get(name).copied().ok_or_else(|| ShaderError::UnknownUniform {
            label: self.label.clone(),
            name: name.to_owned(),
        })
    }

    pub fn set_i32(&mut self, slot: UniformSlot, value: i32) {
        if self.check(slot, UniformKind::I32) {
            self.write(slot.offset, bytemuck::bytes_of(&value));
        }
    }

    pub fn set_f32(&mut self, slot: UniformSlot, value: f32) {
        if self.check(slot, UniformKind::F32) {
            self.write(slot.offset, bytemuck::bytes_of(&value));
        }
    }

    pub fn set_vec4(&mut self, slot: UniformSlot, value: Vec4) {
        if self.check(slot, UniformKind::Vec4) {
            self.write(slot.offset, bytemuck::cast_slice(&value.to_array()));
        }
    }

    /// Stores `value` in WGSL's column-major order.
    pub fn set_mat4(&mut self, slot: UniformSlot, value: &Mat4) {
        if self.check(slot, UniformKind::Mat4) {
            self.write(slot.offset, bytemuck::cast_slice(&value.to_column_major()));
        }
    }

    /// Pushes the CPU copy of the uniform block to the GPU.
    pub fn upload(&self, queue: &wgpu::Queue) {
        if let Some(buffer) = &self.uniform_buffer {
            queue.write_buffer(buffer, 0, &self.uniform_data);
        }
    }

    /// Binds `textures` to the declared texture slots, in declaration order.
    pub fn bind_textures(&mut self, device: &wgpu::Device, textures: &[&Texture]) {
        if textures.len() != self.textures.len() {
            log::warn!(
                "{}: expected {} textures, got {}; binding skipped",
                self.label,
                self.textures.len(),
                textures.len()
            );
            return;
        }
        self.rebuild_bind_group(device, textures);
    }

    /// Sets the pipeline and bind group on `pass`.
    ///
    /// Returns `false` when the texture slots were never bound.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) -> bool {
        let Some(bind_group) = &self.bind_group else {
            log::warn!("{}: textures not bound; draw skipped", self.label);
            return false;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        true
    }

    fn rebuild_bind_group(&mut self, device: &wgpu::Device, textures: &[&Texture]) {
        let mut entries = Vec::with_capacity(1 + textures.len() * 2);
        if let Some(buffer) = &self.uniform_buffer {
            entries.push(wgpu::BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() });
        }
        for (slot, texture) in self.textures.iter().zip(textures) {
            entries.push(wgpu::BindGroupEntry {
                binding: slot.binding,
                resource: wgpu::BindingResource::TextureView(texture.view()),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: slot.binding + 1,
                resource: wgpu::BindingResource::Sampler(texture.sampler()),
            });
        }

        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&self.label),
            layout: &self.bind_group_layout,
            entries: &entries,
        }));
    }

    fn check(&self, slot: UniformSlot, expected: UniformKind) -> bool {
        if slot.kind != expected {
            log::warn!("{}: uniform at {} is {:?}, not {:?}", self.label, slot.offset, slot.kind, expected);
            return false;
        }
        true
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) {
        let start = offset as usize;
        self.uniform_data[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

/// Parses and validates WGSL with naga and reflects the `@group(0) @binding(0)`
/// uniform struct. Failures are logged before being returned.
fn validate_and_reflect(label: &str, source: &str) -> Result<UniformBlock, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| {
        let message = e.emit_to_string(source);
        log::error!("{label}: shader compile error:\n{message}");
        ShaderError::Compile { label: label.to_owned(), message }
    })?;

    naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all())
        .validate(&module)
        .map_err(|e| {
            let message = e.emit_to_string(source);
            log::error!("{label}: shader validation error:\n{message}");
            ShaderError::Validate { label: label.to_owned(), message }
        })?;

    Ok(reflect_uniforms(&module))
}

fn reflect_uniforms(module: &naga::Module) -> UniformBlock {
    let block = module.global_variables.iter().find(|(_, var)| {
        var.space == naga::AddressSpace::Uniform
            && var.binding.as_ref().is_some_and(|b| b.group == 0 && b.binding == 0)
    });
    let Some((_, var)) = block else {
        return UniformBlock::default();
    };

    let naga::TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
        return UniformBlock::default();
    };

    let members = members
        .iter()
        .filter_map(|m| {
            let name = m.name.clone()?;
            let kind = uniform_kind(&module.types[m.ty].inner);
            Some((name, UniformSlot { offset: m.offset, kind }))
        })
        .collect();

    UniformBlock { size: *span, members }
}

fn uniform_kind(inner: &naga::TypeInner) -> UniformKind {
    use naga::{ScalarKind, TypeInner, VectorSize};
    match inner {
        TypeInner::Scalar(s) if s.kind == ScalarKind::Float && s.width == 4 => UniformKind::F32,
        TypeInner::Scalar(s) if s.kind == ScalarKind::Sint && s.width == 4 => UniformKind::I32,
        TypeInner::Vector { size: VectorSize::Quad, scalar } if scalar.kind == ScalarKind::Float => {
            UniformKind::Vec4
        }
        TypeInner::Matrix { columns: VectorSize::Quad, rows: VectorSize::Quad, .. } => UniformKind::Mat4,
        _ => UniformKind::Other,
    }
}
