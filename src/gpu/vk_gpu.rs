use std::{ffi::CString, ptr, sync::Arc};
use vulkanalia::{
    Device, Entry, Instance,
    loader::{LIBRARY, LibloadingLoader},
    vk::{self, DeviceV1_0, InstanceV1_0},
};

use crate::utils::error::ImagingError;

use super::gpu_memory::GPUMemory;

/// Which physical device to open and how to name the application to the driver.
#[derive(Clone, Debug)]
pub struct VulkanDeviceConfig {
    pub device_index: usize,
    pub application_name: String,
}

impl Default for VulkanDeviceConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            application_name: "texvis".to_string(),
        }
    }
}

/// A logical device with one graphics queue, used for transfers into sampled images.
pub struct Gpu {
    _entry: Arc<Entry>,
    instance: Instance,
    device: Arc<Device>,
    physical_device: vk::PhysicalDevice,
    queue: vk::Queue,
    queue_family_index: u32,
    command_pool: vk::CommandPool,
}

impl Gpu {
    pub fn new(config: &VulkanDeviceConfig) -> Result<Self, ImagingError> {
        unsafe {
            let loader = LibloadingLoader::new(LIBRARY)
                .map_err(|e| ImagingError::Vulkan(e.to_string()))?;
            let entry =
                Arc::new(Entry::new(loader).map_err(|e| ImagingError::Vulkan(e.to_string()))?);

            let instance = Self::create_instance(&entry, &config.application_name)?;

            let physical_devices = instance.enumerate_physical_devices()?;
            let Some(&physical_device) = physical_devices.get(config.device_index) else {
                instance.destroy_instance(None);
                return Err(ImagingError::Vulkan(format!(
                    "GPU index {} out of range ({} devices)",
                    config.device_index,
                    physical_devices.len()
                )));
            };

            let Some(queue_family_index) = instance
                .get_physical_device_queue_family_properties(physical_device)
                .iter()
                .position(|properties| properties.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|index| index as u32)
            else {
                instance.destroy_instance(None);
                return Err(ImagingError::Vulkan(
                    "No graphics queue family found".to_string(),
                ));
            };

            let queue_priorities = [1.0];

            let queue_info = vk::DeviceQueueCreateInfo {
                s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
                next: std::ptr::null(),
                flags: vk::DeviceQueueCreateFlags::empty(),
                queue_family_index,
                queue_count: 1,
                queue_priorities: queue_priorities.as_ptr(),
            };

            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo {
                s_type: vk::StructureType::DEVICE_CREATE_INFO,
                next: std::ptr::null(),
                flags: vk::DeviceCreateFlags::empty(),
                queue_create_info_count: 1,
                queue_create_infos: &queue_info,
                enabled_layer_count: 0,
                enabled_layer_names: std::ptr::null(),
                enabled_extension_count: 0,
                enabled_extension_names: ptr::null(),
                enabled_features: &device_features,
            };

            let device = match instance.create_device(physical_device, &device_create_info, None)
            {
                Ok(device) => device,
                Err(e) => {
                    instance.destroy_instance(None);
                    return Err(e.into());
                }
            };

            let queue = device.get_device_queue(queue_family_index, 0);

            let command_pool_info = vk::CommandPoolCreateInfo {
                s_type: vk::StructureType::COMMAND_POOL_CREATE_INFO,
                next: ptr::null(),
                flags: vk::CommandPoolCreateFlags::TRANSIENT,
                queue_family_index,
            };

            let command_pool = match device.create_command_pool(&command_pool_info, None) {
                Ok(pool) => pool,
                Err(e) => {
                    device.destroy_device(None);
                    instance.destroy_instance(None);
                    return Err(e.into());
                }
            };

            Ok(Self {
                _entry: entry,
                instance,
                device: Arc::new(device),
                physical_device,
                queue,
                queue_family_index,
                command_pool,
            })
        }
    }

    unsafe fn create_instance(entry: &Entry, name: &str) -> Result<Instance, ImagingError> {
        let aname = CString::new(name).map_err(|e| ImagingError::Vulkan(e.to_string()))?;
        let appinfo = vk::ApplicationInfo {
            s_type: vk::StructureType::APPLICATION_INFO,
            next: ptr::null(),
            application_name: aname.as_ptr(),
            application_version: vk::make_version(1, 0, 0),
            engine_name: aname.as_ptr(),
            engine_version: vk::make_version(1, 0, 0),
            api_version: vk::make_version(1, 0, 0),
        };

        let create_info = vk::InstanceCreateInfo {
            s_type: vk::StructureType::INSTANCE_CREATE_INFO,
            next: ptr::null(),
            flags: vk::InstanceCreateFlags::empty(),
            application_info: &appinfo,
            enabled_layer_count: 0,
            enabled_layer_names: ptr::null(),
            enabled_extension_count: 0,
            enabled_extension_names: ptr::null(),
        };

        Ok(unsafe { entry.create_instance(&create_info, None) }?)
    }

    /// Names of the physical devices with a graphics queue, indexed as `device_index` expects
    pub fn available_gpus() -> Result<Vec<(usize, String)>, ImagingError> {
        unsafe {
            let loader = LibloadingLoader::new(LIBRARY)
                .map_err(|e| ImagingError::Vulkan(e.to_string()))?;
            let entry = Entry::new(loader).map_err(|e| ImagingError::Vulkan(e.to_string()))?;
            let instance = Self::create_instance(&entry, "texvis")?;

            let physical_devices = match instance.enumerate_physical_devices() {
                Ok(devices) => devices,
                Err(e) => {
                    instance.destroy_instance(None);
                    return Err(e.into());
                }
            };

            let gpus = physical_devices
                .iter()
                .enumerate()
                .filter(|&(_, &device)| {
                    instance
                        .get_physical_device_queue_family_properties(device)
                        .iter()
                        .any(|p| p.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                })
                .map(|(idx, &device)| {
                    let properties = instance.get_physical_device_properties(device);
                    (idx, properties.device_name.to_string_lossy().into_owned())
                })
                .collect();

            instance.destroy_instance(None);
            Ok(gpus)
        }
    }

    pub fn find_memory_type(
        &self,
        type_filter: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> Result<u32, ImagingError> {
        unsafe {
            let mem_properties = self
                .instance
                .get_physical_device_memory_properties(self.physical_device);

            for i in 0..mem_properties.memory_type_count {
                if (type_filter & (1 << i)) != 0
                    && mem_properties.memory_types[i as usize]
                        .property_flags
                        .contains(properties)
                {
                    return Ok(i);
                }
            }
        }

        Err(ImagingError::Vulkan(format!(
            "Failed to find suitable memory type for {:?}",
            properties
        )))
    }

    /// Optimal tiling features of `format` on this device
    pub fn format_features(&self, format: vk::Format) -> vk::FormatFeatureFlags {
        unsafe {
            self.instance
                .get_physical_device_format_properties(self.physical_device, format)
                .optimal_tiling_features
        }
    }

    /// Whether `format` can back a sampled image with optimal tiling
    pub fn supports_sampled(&self, format: vk::Format) -> bool {
        self.format_features(format).contains(
            vk::FormatFeatureFlags::SAMPLED_IMAGE | vk::FormatFeatureFlags::TRANSFER_DST,
        )
    }

    pub fn create_staging_buffer(&self, data: &[u8]) -> Result<GPUMemory, ImagingError> {
        let size_in_bytes = data.len().max(1) as vk::DeviceSize;

        unsafe {
            let buffer_info = vk::BufferCreateInfo {
                s_type: vk::StructureType::BUFFER_CREATE_INFO,
                next: ptr::null(),
                flags: vk::BufferCreateFlags::empty(),
                size: size_in_bytes,
                usage: vk::BufferUsageFlags::TRANSFER_SRC,
                sharing_mode: vk::SharingMode::EXCLUSIVE,
                queue_family_index_count: 0,
                queue_family_indices: ptr::null(),
            };

            let buffer = self.device.create_buffer(&buffer_info, None)?;
            let mem_requirements = self.device.get_buffer_memory_requirements(buffer);

            let memory_type = match self.find_memory_type(
                mem_requirements.memory_type_bits,
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            ) {
                Ok(index) => index,
                Err(e) => {
                    self.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            let alloc_info = vk::MemoryAllocateInfo {
                s_type: vk::StructureType::MEMORY_ALLOCATE_INFO,
                next: ptr::null(),
                allocation_size: mem_requirements.size,
                memory_type_index: memory_type,
            };

            let memory = match self.device.allocate_memory(&alloc_info, None) {
                Ok(memory) => memory,
                Err(e) => {
                    self.device.destroy_buffer(buffer, None);
                    return Err(e.into());
                }
            };

            // owns buffer and memory from here on
            let staging = GPUMemory::new(buffer, memory, size_in_bytes, self.device.clone());
            self.device.bind_buffer_memory(buffer, memory, 0)?;
            staging.copy_into(data)?;
            Ok(staging)
        }
    }

    /// Record with `record` into a fresh one-time command buffer, submit, and wait for it
    pub fn run_commands<F>(&self, record: F) -> Result<(), ImagingError>
    where
        F: FnOnce(&Device, vk::CommandBuffer),
    {
        unsafe {
            let alloc_info = vk::CommandBufferAllocateInfo {
                s_type: vk::StructureType::COMMAND_BUFFER_ALLOCATE_INFO,
                next: ptr::null(),
                command_pool: self.command_pool,
                level: vk::CommandBufferLevel::PRIMARY,
                command_buffer_count: 1,
            };

            let command_buffer = self.device.allocate_command_buffers(&alloc_info)?[0];
            let result = self.record_and_submit(command_buffer, record);
            self.device
                .free_command_buffers(self.command_pool, &[command_buffer]);
            result
        }
    }

    unsafe fn record_and_submit<F>(
        &self,
        command_buffer: vk::CommandBuffer,
        record: F,
    ) -> Result<(), ImagingError>
    where
        F: FnOnce(&Device, vk::CommandBuffer),
    {
        unsafe {
            let begin_info = vk::CommandBufferBeginInfo {
                s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
                next: ptr::null(),
                flags: vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
                inheritance_info: ptr::null(),
            };

            self.device.begin_command_buffer(command_buffer, &begin_info)?;
            record(&self.device, command_buffer);
            self.device.end_command_buffer(command_buffer)?;

            self.submit_command_buffers_and_wait(&[command_buffer])
        }
    }

    pub fn submit_command_buffers_and_wait(
        &self,
        command_buffers: &[vk::CommandBuffer],
    ) -> Result<(), ImagingError> {
        if command_buffers.is_empty() {
            return Ok(());
        }

        unsafe {
            let fence_info = vk::FenceCreateInfo {
                s_type: vk::StructureType::FENCE_CREATE_INFO,
                next: std::ptr::null(),
                flags: vk::FenceCreateFlags::empty(),
            };

            let fence = self.device.create_fence(&fence_info, None)?;

            let submit_info = vk::SubmitInfo {
                s_type: vk::StructureType::SUBMIT_INFO,
                next: std::ptr::null(),
                wait_semaphore_count: 0,
                wait_semaphores: std::ptr::null(),
                wait_dst_stage_mask: std::ptr::null(),
                command_buffer_count: command_buffers.len() as u32,
                command_buffers: command_buffers.as_ptr(),
                signal_semaphore_count: 0,
                signal_semaphores: std::ptr::null(),
            };

            let result = self
                .device
                .queue_submit(self.queue, &[submit_info], fence)
                .and_then(|_| self.device.wait_for_fences(&[fence], true, u64::MAX));
            self.device.destroy_fence(fence, None);
            result?;

            Ok(())
        }
    }

    pub fn get_device(&self) -> &Device {
        &self.device
    }

    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }
}

impl Drop for Gpu {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
