use std::sync::Arc;

use vulkanalia::{Device, vk, vk::DeviceV1_0};

use crate::utils::error::ImagingError;

/// Host-visible buffer used to stage pixel data before it is copied into an image.
pub struct GPUMemory {
    pub buffer: vk::Buffer,
    pub memory: vk::DeviceMemory,
    pub size: vk::DeviceSize,
    pub device: Arc<Device>,
}

impl GPUMemory {
    pub fn new(
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        size: vk::DeviceSize,
        device: Arc<Device>,
    ) -> Self {
        Self {
            buffer,
            memory,
            size,
            device,
        }
    }

    /// Copy raw bytes into GPU memory.
    pub fn copy_into(&self, data: &[u8]) -> Result<(), ImagingError> {
        let data_size = data.len() as vk::DeviceSize;

        if data_size > self.size {
            return Err(ImagingError::SizeMismatch {
                expected: self.size as usize,
                actual: data.len(),
            });
        }

        unsafe {
            let data_ptr =
                self.device
                    .map_memory(self.memory, 0, data_size, vk::MemoryMapFlags::empty())?
                    as *mut u8;

            std::ptr::copy_nonoverlapping(data.as_ptr(), data_ptr, data.len());

            self.device.unmap_memory(self.memory);
        }

        Ok(())
    }
}

impl Drop for GPUMemory {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}
