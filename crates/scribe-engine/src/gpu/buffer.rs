use wgpu::util::DeviceExt;

use super::VertexLayout;

/// GPU vertex buffer tagged with the layout of its records.
pub struct VertexBuffer {
    label: &'static str,
    layout: VertexLayout,
    buffer: wgpu::Buffer,
    capacity: u64,
    len: u64,
}

impl VertexBuffer {
    /// Allocates room for `capacity` bytes; contents are uninitialized until
    /// the first [`set_data`](Self::set_data).
    pub fn new(device: &wgpu::Device, label: &'static str, layout: VertexLayout, capacity: u64) -> Self {
        let capacity = capacity.max(layout.stride()).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = Self::allocate(device, label, capacity);
        Self { label, layout, buffer, capacity, len: 0 }
    }

    /// Creates a buffer pre-filled with `bytes` (static geometry).
    pub fn with_data(device: &wgpu::Device, label: &'static str, layout: VertexLayout, bytes: &[u8]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytes,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let len = bytes.len() as u64;
        Self { label, layout, buffer, capacity: len, len }
    }

    #[inline]
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Number of whole records currently uploaded.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        (self.len / self.layout.stride().max(1)) as u32
    }

    /// Uploads `bytes` at offset 0, growing the allocation when needed.
    ///
    /// The write lands before the next queue submission; callers that reuse
    /// the buffer several times per frame must submit in between.
    pub fn set_data(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        let len = bytes.len() as u64;
        if len > self.capacity {
            let capacity = len.next_power_of_two().next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
            log::debug!("{}: growing vertex buffer {} -> {} bytes", self.label, self.capacity, capacity);
            self.buffer = Self::allocate(device, self.label, capacity);
            self.capacity = capacity;
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.len = len;
    }

    /// Binds the uploaded range to vertex slot `slot` of `pass`.
    ///
    /// Must be re-issued whenever a different buffer was bound to the slot.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, slot: u32) {
        if self.len == 0 {
            return;
        }
        pass.set_vertex_buffer(slot, self.buffer.slice(..self.len));
    }

    fn allocate(device: &wgpu::Device, label: &'static str, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}
