use crate::gpu::{RecordWriter, VertexLayout};

use super::quad::VERTICES_PER_QUAD;

/// CPU-side vertex records for one primitive kind.
///
/// Capacity is counted in primitives; each primitive is exactly six records.
/// `count <= capacity` always holds: a full buffer rejects pushes until the
/// owner flushes it.
pub struct StagingBuffer {
    layout: VertexLayout,
    capacity: usize,
    count: usize,
    bytes: Vec<u8>,
}

impl StagingBuffer {
    pub fn new(layout: VertexLayout, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let bytes = vec![0; capacity * VERTICES_PER_QUAD * layout.stride() as usize];
        Self { layout, capacity, count: 0, bytes }
    }

    #[inline]
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Primitives currently staged.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count >= self.capacity
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        (self.count * VERTICES_PER_QUAD) as u32
    }

    /// Staged records, tightly packed.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.count * self.primitive_size()]
    }

    /// Appends one primitive. `write` is called once per record, in order,
    /// with the record index `0..6`.
    ///
    /// Returns `false` (and writes nothing) when the buffer is full.
    pub fn push_quad(&mut self, mut write: impl FnMut(usize, &mut RecordWriter<'_>)) -> bool {
        if self.is_full() {
            return false;
        }

        let stride = self.layout.stride() as usize;
        let size = self.primitive_size();
        let start = self.count * size;
        let records = &mut self.bytes[start..start + size];

        for (i, record) in records.chunks_exact_mut(stride).enumerate() {
            let mut writer = self.layout.writer(record);
            write(i, &mut writer);
        }

        self.count += 1;
        true
    }

    /// Drops staged primitives; contents are overwritten by later pushes.
    #[inline]
    pub fn reset(&mut self) {
        self.count = 0;
    }

    #[inline]
    fn primitive_size(&self) -> usize {
        VERTICES_PER_QUAD * self.layout.stride() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::Semantic;
    use crate::render::ProgramKind;

    #[test]
    fn pushes_until_capacity_then_refuses() {
        let mut staging = StagingBuffer::new(ProgramKind::Quad.vertex_layout(), 2);

        assert!(staging.push_quad(|_, w| {
            w.write_u32(Semantic::Id, 7);
        }));
        assert!(staging.push_quad(|_, _| {}));
        assert!(staging.is_full());
        assert!(!staging.push_quad(|_, _| panic!("full buffer must not call the writer")));

        assert_eq!(staging.count(), 2);
        assert_eq!(staging.vertex_count(), 12);
        assert_eq!(staging.bytes().len(), 2 * 6 * 28);

        staging.reset();
        assert!(staging.is_empty());
        assert!(staging.bytes().is_empty());
    }

    #[test]
    fn writer_sees_each_record_in_order() {
        let mut staging = StagingBuffer::new(ProgramKind::Quad.vertex_layout(), 1);
        staging.push_quad(|i, w| {
            w.write_u32(Semantic::Id, i as u32 + 100);
        });

        let id_offset = 24;
        for i in 0..6 {
            let at = i * 28 + id_offset;
            let id: u32 = bytemuck::pod_read_unaligned(&staging.bytes()[at..at + 4]);
            assert_eq!(id, i as u32 + 100);
        }
    }
}
