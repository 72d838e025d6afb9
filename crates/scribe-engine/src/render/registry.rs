use thiserror::Error;

use crate::gpu::{
    AttribLayout, AttribType, Program, ProgramDesc, Semantic, ShaderError, TextureSlot, VertexLayout,
};
use crate::render::framebuffer::DEPTH_FORMAT;

/// Pipeline purposes known to the renderer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ProgramKind {
    Composite,
    Quad,
    Circle,
    Text,
}

impl ProgramKind {
    pub const COUNT: usize = 4;
    pub const ALL: [ProgramKind; Self::COUNT] =
        [ProgramKind::Composite, ProgramKind::Quad, ProgramKind::Circle, ProgramKind::Text];

    #[inline]
    const fn index(self) -> usize {
        match self {
            ProgramKind::Composite => 0,
            ProgramKind::Quad => 1,
            ProgramKind::Circle => 2,
            ProgramKind::Text => 3,
        }
    }

    /// Vertex record consumed by this kind's program.
    pub fn vertex_layout(self) -> VertexLayout {
        use AttribType::{Float32, Uint32};
        let position = AttribLayout::new(Semantic::Position, Float32, 3);
        let color = AttribLayout::new(Semantic::Color, Float32, 3);
        let id = AttribLayout::new(Semantic::Id, Uint32, 1);

        match self {
            ProgramKind::Composite => VertexLayout::new(&[
                AttribLayout::new(Semantic::Position, Float32, 2),
                AttribLayout::new(Semantic::TexCoord, Float32, 2),
            ]),
            ProgramKind::Quad => VertexLayout::new(&[position, color, id]),
            ProgramKind::Circle => {
                VertexLayout::new(&[position, color, AttribLayout::new(Semantic::Mask, Float32, 2), id])
            }
            ProgramKind::Text => {
                VertexLayout::new(&[position, color, AttribLayout::new(Semantic::TexCoord, Float32, 2), id])
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no program registered for {0:?}")]
    Missing(ProgramKind),
}

/// Fixed table of programs indexed by [`ProgramKind`].
///
/// Populated once at startup and then moved into the backend that draws with
/// it; nothing here is global.
pub struct ShaderRegistry<P> {
    slots: [Option<P>; ProgramKind::COUNT],
}

impl<P> Default for ShaderRegistry<P> {
    fn default() -> Self {
        Self { slots: [None, None, None, None] }
    }
}

impl<P> ShaderRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `program`, returning the one it replaces.
    pub fn set(&mut self, kind: ProgramKind, program: P) -> Option<P> {
        self.slots[kind.index()].replace(program)
    }

    #[inline]
    pub fn get(&self, kind: ProgramKind) -> Option<&P> {
        self.slots[kind.index()].as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, kind: ProgramKind) -> Option<&mut P> {
        self.slots[kind.index()].as_mut()
    }

    pub fn require(&self, kind: ProgramKind) -> Result<&P, RegistryError> {
        self.get(kind).ok_or(RegistryError::Missing(kind))
    }

    pub fn require_mut(&mut self, kind: ProgramKind) -> Result<&mut P, RegistryError> {
        self.get_mut(kind).ok_or(RegistryError::Missing(kind))
    }

    /// `Ok` when every kind has a program.
    pub fn check_complete(&self) -> Result<(), RegistryError> {
        for kind in ProgramKind::ALL {
            self.require(kind)?;
        }
        Ok(())
    }
}

/// Formats the bundled programs render into.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TargetFormats {
    /// Offscreen visible color attachment.
    pub color: wgpu::TextureFormat,
    /// Offscreen picking attachment.
    pub id: wgpu::TextureFormat,
    /// Presentation surface the composite pass writes to.
    pub surface: wgpu::TextureFormat,
}

const QUAD_WGSL: &str = concat!(include_str!("shaders/prelude.wgsl"), include_str!("shaders/quad.wgsl"));
const CIRCLE_WGSL: &str = concat!(include_str!("shaders/prelude.wgsl"), include_str!("shaders/circle.wgsl"));
const TEXT_WGSL: &str = concat!(include_str!("shaders/prelude.wgsl"), include_str!("shaders/text.wgsl"));
const COMPOSITE_WGSL: &str = include_str!("shaders/composite.wgsl");

/// Texture + sampler pair at bindings 1 and 2.
const SAMPLED: [TextureSlot; 1] = [TextureSlot { binding: 1 }];

impl ShaderRegistry<Program> {
    /// Builds the four bundled programs. Fails on the first one that does
    /// not compile.
    pub fn standard(device: &wgpu::Device, formats: TargetFormats) -> Result<Self, ShaderError> {
        let depth = Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            // A later draw at the same depth replaces earlier ones.
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let opaque = [
            Some(wgpu::ColorTargetState {
                format: formats.color,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            }),
            Some(wgpu::ColorTargetState {
                format: formats.id,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            }),
        ];
        let blended = [
            Some(wgpu::ColorTargetState {
                format: formats.color,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            }),
            opaque[1].clone(),
        ];

        let present = [Some(wgpu::ColorTargetState {
            format: formats.surface,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let mut registry = Self::new();
        for kind in ProgramKind::ALL {
            let layout = kind.vertex_layout();
            let layouts = [&layout];
            let desc = match kind {
                ProgramKind::Quad => ProgramDesc {
                    label: "scribe quad program",
                    source: QUAD_WGSL,
                    vertex_layouts: &layouts,
                    targets: &opaque,
                    depth_stencil: depth.clone(),
                    textures: &[],
                },
                ProgramKind::Circle => ProgramDesc {
                    label: "scribe circle program",
                    source: CIRCLE_WGSL,
                    vertex_layouts: &layouts,
                    targets: &opaque,
                    depth_stencil: depth.clone(),
                    textures: &[],
                },
                ProgramKind::Text => ProgramDesc {
                    label: "scribe text program",
                    source: TEXT_WGSL,
                    vertex_layouts: &layouts,
                    targets: &blended,
                    depth_stencil: depth.clone(),
                    textures: &SAMPLED,
                },
                ProgramKind::Composite => ProgramDesc {
                    label: "scribe composite program",
                    source: COMPOSITE_WGSL,
                    vertex_layouts: &layouts,
                    targets: &present,
                    depth_stencil: None,
                    textures: &SAMPLED,
                },
            };
            registry.set(kind, Program::new(device, &desc)?);
        }

        log::info!("shader registry ready ({} programs)", ProgramKind::COUNT);
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_indexed_by_kind() {
        let mut registry = ShaderRegistry::new();
        assert!(registry.set(ProgramKind::Quad, "quad").is_none());
        assert_eq!(registry.set(ProgramKind::Quad, "quad v2"), Some("quad"));
        registry.set(ProgramKind::Text, "text");

        assert_eq!(registry.get(ProgramKind::Quad), Some(&"quad v2"));
        assert_eq!(registry.get(ProgramKind::Text), Some(&"text"));
        assert!(registry.get(ProgramKind::Circle).is_none());
        assert!(matches!(
            registry.require(ProgramKind::Composite),
            Err(RegistryError::Missing(ProgramKind::Composite))
        ));
    }

    #[test]
    fn complete_only_when_every_kind_is_set() {
        let mut registry = ShaderRegistry::new();
        for kind in &ProgramKind::ALL[..3] {
            registry.set(*kind, ());
        }
        assert!(registry.check_complete().is_err());
        registry.set(ProgramKind::Text, ());
        assert!(registry.check_complete().is_ok());
    }

    #[test]
    fn kind_layouts_have_expected_strides() {
        assert_eq!(ProgramKind::Quad.vertex_layout().stride(), 28);
        assert_eq!(ProgramKind::Circle.vertex_layout().stride(), 36);
        assert_eq!(ProgramKind::Text.vertex_layout().stride(), 36);
        assert_eq!(ProgramKind::Composite.vertex_layout().stride(), 16);
        assert_eq!(ProgramKind::Text.vertex_layout().offset_of(Semantic::TexCoord), Some(24));
    }

    #[test]
    fn bundled_shaders_pass_validation() {
        for (label, src) in [
            ("quad", QUAD_WGSL),
            ("circle", CIRCLE_WGSL),
            ("text", TEXT_WGSL),
            ("composite", COMPOSITE_WGSL),
        ] {
            let module = naga::front::wgsl::parse_str(src)
                .unwrap_or_else(|e| panic!("{label}: {}", e.emit_to_string(src)));
            naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all())
                .validate(&module)
                .unwrap_or_else(|e| panic!("{label}: {}", e.emit_to_string(src)));
        }
    }
}
