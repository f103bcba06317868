//! GPU buffer that grows when written data exceeds its capacity.

/// A GPU buffer that can grow dynamically.
///
/// Uses a 2x growth strategy when capacity is exceeded and never shrinks
/// (GPU buffers cannot be resized in place).
pub struct DynamicBuffer {
    buffer: wgpu::Buffer,
    capacity: usize, // bytes
    len: usize,      // bytes
    usage: wgpu::BufferUsages,
    label: String,
}

impl DynamicBuffer {
    /// Buffer with the given initial byte capacity.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        initial_capacity: usize,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let capacity = initial_capacity.max(64);
        Self {
            buffer: Self::allocate(device, label, capacity, usage),
            capacity,
            len: 0,
            usage,
            label: label.to_owned(),
        }
    }

    fn allocate(
        device: &wgpu::Device,
        label: &str,
        capacity: usize,
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity as u64,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Write data to the buffer, growing if necessary.
    ///
    /// Returns `true` if the buffer was reallocated.
    pub fn write<T: bytemuck::Pod>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[T],
    ) -> bool {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let needed = bytes.len();

        let reallocated = needed > self.capacity;
        if reallocated {
            self.capacity = grown_capacity(self.capacity, needed);
            self.buffer =
                Self::allocate(device, &self.label, self.capacity, self.usage);
            log::debug!("{} grown to {} bytes", self.label, self.capacity);
        }

        if needed > 0 {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.len = needed;
        reallocated
    }

    /// The underlying buffer.
    #[must_use]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Bytes written by the last [`write`](Self::write).
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the last write was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// 2x growth with a 1 KiB minimum step.
fn grown_capacity(current: usize, needed: usize) -> usize {
    (needed * 2).max(current + 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_doubles_needed_size() {
        assert_eq!(grown_capacity(64, 4000), 8000);
    }

    #[test]
    fn growth_has_minimum_step() {
        assert_eq!(grown_capacity(4096, 4100), 8200);
        assert_eq!(grown_capacity(64, 100), 1088);
    }
}
