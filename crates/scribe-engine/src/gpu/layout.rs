//! Vertex attribute layouts and the record writer derived from them.

/// Scalar type of a vertex attribute component.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttribType {
    Float32,
    Uint32,
}

impl AttribType {
    #[inline]
    pub const fn size(self) -> u64 {
        match self {
            AttribType::Float32 | AttribType::Uint32 => 4,
        }
    }
}

/// What a vertex field carries. Used as the key for [`RecordWriter`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Semantic {
    Position,
    Color,
    /// Texture coordinate (glyph atlas, composite quad).
    TexCoord,
    /// Corner coordinate in `{0,1}²` used to carve a disc out of a quad.
    Mask,
    /// Entity id written to the picking attachment.
    Id,
}

/// One declared vertex field.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttribLayout {
    pub semantic: Semantic,
    pub ty: AttribType,
    pub components: u32,
}

impl AttribLayout {
    #[inline]
    pub const fn new(semantic: Semantic, ty: AttribType, components: u32) -> Self {
        Self { semantic, ty, components }
    }

    #[inline]
    pub const fn size(&self) -> u64 {
        self.ty.size() * self.components as u64
    }
}

/// A declared field with its derived byte offset.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Field {
    pub attrib: AttribLayout,
    pub offset: u64,
}

/// Ordered vertex layout. Offsets and stride are computed once at construction.
///
/// Field `i` is bound to shader `@location(i)`.
#[derive(Debug, Clone)]
pub struct VertexLayout {
    fields: Vec<Field>,
    stride: u64,
    attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexLayout {
    pub fn new(attribs: &[AttribLayout]) -> Self {
        let mut offset = 0;
        let mut fields = Vec::with_capacity(attribs.len());
        let mut attributes = Vec::with_capacity(attribs.len());

        for (location, attrib) in attribs.iter().enumerate() {
            fields.push(Field { attrib: *attrib, offset });
            attributes.push(wgpu::VertexAttribute {
                format: vertex_format(attrib.ty, attrib.components),
                offset,
                shader_location: location as u32,
            });
            offset += attrib.size();
        }

        Self { fields, stride: offset, attributes }
    }

    /// Size of one vertex record in bytes.
    #[inline]
    pub fn stride(&self) -> u64 {
        self.stride
    }

    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, semantic: Semantic) -> Option<&Field> {
        self.fields.iter().find(|f| f.attrib.semantic == semantic)
    }

    pub fn offset_of(&self, semantic: Semantic) -> Option<u64> {
        self.field(semantic).map(|f| f.offset)
    }

    /// Binds every declared field to its pipeline input slot.
    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }

    /// Wraps one record-sized slice of `bytes` for writing.
    #[inline]
    pub fn writer<'a>(&'a self, record: &'a mut [u8]) -> RecordWriter<'a> {
        debug_assert_eq!(record.len() as u64, self.stride);
        RecordWriter { layout: self, record }
    }
}

fn vertex_format(ty: AttribType, components: u32) -> wgpu::VertexFormat {
    use wgpu::VertexFormat as F;
    match (ty, components) {
        (AttribType::Float32, 1) => F::Float32,
        (AttribType::Float32, 2) => F::Float32x2,
        (AttribType::Float32, 3) => F::Float32x3,
        (AttribType::Float32, _) => F::Float32x4,
        (AttribType::Uint32, 1) => F::Uint32,
        (AttribType::Uint32, 2) => F::Uint32x2,
        (AttribType::Uint32, 3) => F::Uint32x3,
        (AttribType::Uint32, _) => F::Uint32x4,
    }
}

/// Writes typed values into a single vertex record using the layout's offsets.
pub struct RecordWriter<'a> {
    layout: &'a VertexLayout,
    record: &'a mut [u8],
}

impl RecordWriter<'_> {
    /// Writes float components of `semantic`. Extra values are ignored.
    pub fn write_f32s(&mut self, semantic: Semantic, values: &[f32]) -> &mut Self {
        let Some(field) = self.layout.field(semantic) else {
            debug_assert!(false, "{semantic:?} is not part of this layout");
            return self;
        };
        debug_assert_eq!(field.attrib.ty, AttribType::Float32);

        let n = values.len().min(field.attrib.components as usize);
        let start = field.offset as usize;
        self.record[start..start + n * 4].copy_from_slice(bytemuck::cast_slice(&values[..n]));
        self
    }

    pub fn write_u32(&mut self, semantic: Semantic, value: u32) -> &mut Self {
        let Some(field) = self.layout.field(semantic) else {
            debug_assert!(false, "{semantic:?} is not part of this layout");
            return self;
        };
        debug_assert_eq!(field.attrib.ty, AttribType::Uint32);

        let start = field.offset as usize;
        self.record[start..start + 4].copy_from_slice(bytemuck::bytes_of(&value));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle_layout() -> VertexLayout {
        VertexLayout::new(&[
            AttribLayout::new(Semantic::Position, AttribType::Float32, 3),
            AttribLayout::new(Semantic::Color, AttribType::Float32, 3),
            AttribLayout::new(Semantic::Mask, AttribType::Float32, 2),
            AttribLayout::new(Semantic::Id, AttribType::Uint32, 1),
        ])
    }

    #[test]
    fn offsets_and_stride_follow_declaration_order() {
        let layout = circle_layout();
        assert_eq!(layout.offset_of(Semantic::Position), Some(0));
        assert_eq!(layout.offset_of(Semantic::Color), Some(12));
        assert_eq!(layout.offset_of(Semantic::Mask), Some(24));
        assert_eq!(layout.offset_of(Semantic::Id), Some(32));
        assert_eq!(layout.offset_of(Semantic::TexCoord), None);
        assert_eq!(layout.stride(), 36);
    }

    #[test]
    fn buffer_layout_assigns_locations_in_order() {
        let layout = circle_layout();
        let wl = layout.buffer_layout();
        assert_eq!(wl.array_stride, 36);
        assert_eq!(wl.attributes.len(), 4);
        assert_eq!(wl.attributes[3].shader_location, 3);
        assert_eq!(wl.attributes[3].format, wgpu::VertexFormat::Uint32);
        assert_eq!(wl.attributes[2].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn writer_places_values_at_field_offsets() {
        let layout = circle_layout();
        let mut record = vec![0u8; layout.stride() as usize];

        layout
            .writer(&mut record)
            .write_f32s(Semantic::Color, &[0.25, 0.5, 1.0])
            .write_u32(Semantic::Id, 0x0102_0304);

        let color: [f32; 3] = bytemuck::pod_read_unaligned(&record[12..24]);
        assert_eq!(color, [0.25, 0.5, 1.0]);
        assert_eq!(u32::from_ne_bytes([record[32], record[33], record[34], record[35]]), 0x0102_0304);
    }
}
