use std::{collections::HashMap, ptr};

use vulkanalia::vk::{self, DeviceV1_0};

use crate::texture::{
    DeviceFormat, Filtering, PixelLayout, TextureDevice, TextureHandle, TextureParams,
    TextureTarget, Upload,
};
use crate::utils::error::ImagingError;

use super::vk_gpu::{Gpu, VulkanDeviceConfig};

const COLOR_RANGE: vk::ImageSubresourceRange = vk::ImageSubresourceRange {
    aspect_mask: vk::ImageAspectFlags::COLOR,
    base_mip_level: 0,
    level_count: 1,
    base_array_layer: 0,
    layer_count: 1,
};

struct VkImage {
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
    /// Format of the uploaded texels
    format: DeviceFormat,
    /// Format of the image itself, four components when RGB had to be widened
    storage: vk::Format,
    extent: [u32; 3],
}

struct VkTexture {
    target: TextureTarget,
    params: TextureParams,
    sampler: vk::Sampler,
    image: Option<VkImage>,
}

/// [`TextureDevice`] backed by sampled Vulkan images. Every upload goes through a
/// staging buffer and waits for the copy to finish.
pub struct VulkanDevice {
    gpu: Gpu,
    next_id: u64,
    textures: HashMap<TextureHandle, VkTexture>,
}

impl VulkanDevice {
    pub fn new(config: &VulkanDeviceConfig) -> Result<Self, ImagingError> {
        let gpu = Gpu::new(config)?;
        log::debug!(
            "opened Vulkan device {} (queue family {})",
            config.device_index,
            gpu.queue_family_index()
        );
        Ok(Self {
            gpu,
            next_id: 0,
            textures: HashMap::new(),
        })
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    /// Image view for binding the texture in a descriptor set
    pub fn image_view(&self, handle: TextureHandle) -> Option<vk::ImageView> {
        self.textures
            .get(&handle)
            .and_then(|t| t.image.as_ref())
            .map(|i| i.view)
    }

    pub fn sampler(&self, handle: TextureHandle) -> Option<vk::Sampler> {
        self.textures.get(&handle).map(|t| t.sampler)
    }

    /// Sampler for `params`. Once the storage format is known linear filtering
    /// falls back to nearest where the format cannot be linearly filtered.
    fn create_sampler(
        &self,
        params: &TextureParams,
        storage: Option<vk::Format>,
    ) -> Result<vk::Sampler, ImagingError> {
        let filtering = match storage {
            Some(format) => {
                let features = self.gpu.format_features(format);
                let filtering = sampler_filtering(params.filtering, features);
                if filtering != params.filtering {
                    log::warn!("{:?} cannot be linearly filtered, using nearest", format);
                }
                filtering
            }
            None => params.filtering,
        };
        let filter = filtering.to_vk();
        let address_mode = params.wrapping.to_vk();
        let info = vk::SamplerCreateInfo {
            mag_filter: filter,
            min_filter: filter,
            mipmap_mode: vk::SamplerMipmapMode::NEAREST,
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            border_color: vk::BorderColor::FLOAT_TRANSPARENT_BLACK,
            max_lod: 0.0,
            ..Default::default()
        };
        Ok(unsafe { self.gpu.get_device().create_sampler(&info, None) }?)
    }

    fn create_image(
        &self,
        target: TextureTarget,
        format: DeviceFormat,
        extent: [u32; 3],
    ) -> Result<VkImage, ImagingError> {
        let storage = storage_format(format, |f| self.gpu.supports_sampled(f))?;
        if storage != format.format {
            log::debug!("{:?} cannot be sampled, storing as {:?}", format.format, storage);
        }

        let device = self.gpu.get_device();
        unsafe {
            let image_info = vk::ImageCreateInfo {
                image_type: target.image_type(),
                format: storage,
                extent: vk::Extent3D {
                    width: extent[0],
                    height: extent[1],
                    depth: extent[2],
                },
                mip_levels: 1,
                array_layers: 1,
                samples: vk::SampleCountFlags::_1,
                tiling: vk::ImageTiling::OPTIMAL,
                usage: vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
                sharing_mode: vk::SharingMode::EXCLUSIVE,
                initial_layout: vk::ImageLayout::UNDEFINED,
                ..Default::default()
            };

            let image = device.create_image(&image_info, None)?;
            let mem_requirements = device.get_image_memory_requirements(image);

            let memory_type = match self.gpu.find_memory_type(
                mem_requirements.memory_type_bits,
                vk::MemoryPropertyFlags::DEVICE_LOCAL,
            ) {
                Ok(index) => index,
                Err(e) => {
                    device.destroy_image(image, None);
                    return Err(e);
                }
            };

            let alloc_info = vk::MemoryAllocateInfo {
                s_type: vk::StructureType::MEMORY_ALLOCATE_INFO,
                next: ptr::null(),
                allocation_size: mem_requirements.size,
                memory_type_index: memory_type,
            };

            let memory = match device.allocate_memory(&alloc_info, None) {
                Ok(memory) => memory,
                Err(e) => {
                    device.destroy_image(image, None);
                    return Err(e.into());
                }
            };

            let view_info = vk::ImageViewCreateInfo {
                image,
                view_type: target.view_type(),
                format: storage,
                components: format.layout.swizzle(),
                subresource_range: COLOR_RANGE,
                ..Default::default()
            };

            let view = match device
                .bind_image_memory(image, memory, 0)
                .and_then(|_| device.create_image_view(&view_info, None))
            {
                Ok(view) => view,
                Err(e) => {
                    device.destroy_image(image, None);
                    device.free_memory(memory, None);
                    return Err(e.into());
                }
            };

            Ok(VkImage {
                image,
                memory,
                view,
                format,
                storage,
                extent,
            })
        }
    }

    fn destroy_image(&self, image: VkImage) {
        let device = self.gpu.get_device();
        unsafe {
            device.destroy_image_view(image.view, None);
            device.destroy_image(image.image, None);
            device.free_memory(image.memory, None);
        }
    }

    fn replace_sampler(
        &mut self,
        handle: TextureHandle,
        params: &TextureParams,
        sampler: vk::Sampler,
    ) {
        match self.textures.get_mut(&handle) {
            Some(tex) => {
                tex.params = *params;
                let old = std::mem::replace(&mut tex.sampler, sampler);
                unsafe { self.gpu.get_device().destroy_sampler(old, None) };
            }
            None => unsafe { self.gpu.get_device().destroy_sampler(sampler, None) },
        }
    }

    /// [`Self::copy_to_image`] after widening RGB texels if `storage` needs it
    fn copy_stored(
        &self,
        image: vk::Image,
        storage: vk::Format,
        fresh: bool,
        upload: &Upload<'_>,
    ) -> Result<(), ImagingError> {
        if storage == upload.format.format {
            return self.copy_to_image(image, fresh, upload);
        }
        let (format, bytes) = widen_rgb(upload, storage);
        let widened = Upload {
            format,
            alignment: 4,
            bytes: &bytes[..],
            ..*upload
        };
        self.copy_to_image(image, fresh, &widened)
    }

    /// Copy `upload` into `image`, leaving it ready for shader reads.
    /// A fresh image has nothing worth keeping so its layout starts as UNDEFINED.
    fn copy_to_image(
        &self,
        image: vk::Image,
        fresh: bool,
        upload: &Upload<'_>,
    ) -> Result<(), ImagingError> {
        let staging = self.gpu.create_staging_buffer(&upload.bytes[..upload.required_len()])?;

        let texel = upload.format.texel_bytes();
        let region = vk::BufferImageCopy {
            buffer_offset: 0,
            buffer_row_length: (upload.row_pitch() / texel) as u32,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: vk::Offset3D {
                x: upload.origin[0] as i32,
                y: upload.origin[1] as i32,
                z: upload.origin[2] as i32,
            },
            image_extent: vk::Extent3D {
                width: upload.extent[0],
                height: upload.extent[1],
                depth: upload.extent[2],
            },
        };

        let (old_layout, src_access, src_stage) = if fresh {
            (
                vk::ImageLayout::UNDEFINED,
                vk::AccessFlags::empty(),
                vk::PipelineStageFlags::TOP_OF_PIPE,
            )
        } else {
            (
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::AccessFlags::SHADER_READ,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
            )
        };

        let to_transfer = vk::ImageMemoryBarrier {
            src_access_mask: src_access,
            dst_access_mask: vk::AccessFlags::TRANSFER_WRITE,
            old_layout,
            new_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            image,
            subresource_range: COLOR_RANGE,
            ..Default::default()
        };

        let to_shader = vk::ImageMemoryBarrier {
            src_access_mask: vk::AccessFlags::TRANSFER_WRITE,
            dst_access_mask: vk::AccessFlags::SHADER_READ,
            old_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            new_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            image,
            subresource_range: COLOR_RANGE,
            ..Default::default()
        };

        self.gpu.run_commands(|device, command_buffer| unsafe {
            device.cmd_pipeline_barrier(
                command_buffer,
                src_stage,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[] as &[vk::MemoryBarrier],
                &[] as &[vk::BufferMemoryBarrier],
                &[to_transfer],
            );
            device.cmd_copy_buffer_to_image(
                command_buffer,
                staging.buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );
            device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[] as &[vk::MemoryBarrier],
                &[] as &[vk::BufferMemoryBarrier],
                &[to_shader],
            );
        })
    }
}

/// Sampled format for texels of `format`: its own format when `supported`,
/// otherwise the four component one for RGB.
fn storage_format(
    format: DeviceFormat,
    supported: impl Fn(vk::Format) -> bool,
) -> Result<vk::Format, ImagingError> {
    if supported(format.format) {
        return Ok(format.format);
    }
    match format.with_alpha() {
        Some(wide) if supported(wide) => Ok(wide),
        _ => Err(ImagingError::UnsupportedFormat(format!(
            "{:?} cannot be sampled on this device",
            format.format
        ))),
    }
}

fn sampler_filtering(requested: Filtering, features: vk::FormatFeatureFlags) -> Filtering {
    match requested {
        Filtering::Linear
            if !features.contains(vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR) =>
        {
            Filtering::Nearest
        }
        f => f,
    }
}

/// Repack RGB rows as tightly packed four component texels. The extra
/// component is left zero since the view swizzles alpha to one.
fn widen_rgb(upload: &Upload<'_>, storage: vk::Format) -> (DeviceFormat, Vec<u8>) {
    let comp = upload.format.component.bytes();
    let texel = 3 * comp;
    let width = upload.extent[0] as usize;
    let pitch = upload.row_pitch();

    let mut bytes = Vec::with_capacity(upload.rows() * width * 4 * comp);
    for row in 0..upload.rows() {
        let start = row * pitch;
        for x in 0..width {
            let at = start + x * texel;
            bytes.extend_from_slice(&upload.bytes[at..at + texel]);
            bytes.resize(bytes.len() + comp, 0);
        }
    }

    let format = DeviceFormat {
        layout: PixelLayout::Rgba,
        component: upload.format.component,
        format: storage,
    };
    (format, bytes)
}

fn check_len(upload: &Upload<'_>) -> Result<(), ImagingError> {
    if upload.bytes.len() < upload.required_len() {
        return Err(ImagingError::SizeMismatch {
            expected: upload.required_len(),
            actual: upload.bytes.len(),
        });
    }
    Ok(())
}

impl TextureDevice for VulkanDevice {
    fn create_texture(
        &mut self,
        target: TextureTarget,
        params: &TextureParams,
    ) -> Result<TextureHandle, ImagingError> {
        let sampler = self.create_sampler(params, None)?;
        self.next_id += 1;
        let handle = TextureHandle(self.next_id);
        self.textures.insert(
            handle,
            VkTexture {
                target,
                params: *params,
                sampler,
                image: None,
            },
        );
        Ok(handle)
    }

    fn set_sampling(
        &mut self,
        handle: TextureHandle,
        params: &TextureParams,
    ) -> Result<(), ImagingError> {
        let storage = self
            .textures
            .get(&handle)
            .ok_or(ImagingError::UnknownTexture(handle.0))?
            .image
            .as_ref()
            .map(|i| i.storage);
        let sampler = self.create_sampler(params, storage)?;
        self.replace_sampler(handle, params, sampler);
        Ok(())
    }

    fn upload(&mut self, handle: TextureHandle, upload: &Upload<'_>) -> Result<(), ImagingError> {
        check_len(upload)?;
        let (target, params) = self
            .textures
            .get(&handle)
            .map(|t| (t.target, t.params))
            .ok_or(ImagingError::UnknownTexture(handle.0))?;

        if upload.extent.contains(&0) {
            // zero-sized images cannot be created; drop the old storage
            if let Some(old) = self.textures.get_mut(&handle).and_then(|t| t.image.take()) {
                self.destroy_image(old);
            }
            return Ok(());
        }

        let image = self.create_image(target, upload.format, upload.extent)?;
        let sampler = match self.create_sampler(&params, Some(image.storage)) {
            Ok(sampler) => sampler,
            Err(e) => {
                self.destroy_image(image);
                return Err(e);
            }
        };
        if let Err(e) = self.copy_stored(image.image, image.storage, true, upload) {
            unsafe { self.gpu.get_device().destroy_sampler(sampler, None) };
            self.destroy_image(image);
            return Err(e);
        }
        self.replace_sampler(handle, &params, sampler);

        let old = self
            .textures
            .get_mut(&handle)
            .and_then(|t| t.image.replace(image));
        if let Some(old) = old {
            self.destroy_image(old);
        }
        Ok(())
    }

    fn upload_region(
        &mut self,
        handle: TextureHandle,
        upload: &Upload<'_>,
    ) -> Result<(), ImagingError> {
        check_len(upload)?;
        let tex = self
            .textures
            .get(&handle)
            .ok_or(ImagingError::UnknownTexture(handle.0))?;
        let Some(current) = tex.image.as_ref() else {
            return Err(ImagingError::InvalidRegion(
                "texture storage has not been defined".to_string(),
            ));
        };

        if current.format.texel_bytes() != upload.format.texel_bytes() {
            return Err(ImagingError::IncompatibleTexel {
                expected: current.format.texel_bytes(),
                actual: upload.format.texel_bytes(),
            });
        }
        for axis in 0..3 {
            if upload.origin[axis] + upload.extent[axis] > current.extent[axis] {
                return Err(ImagingError::InvalidRegion(format!(
                    "region {:?}+{:?} outside texture {:?}",
                    upload.origin, upload.extent, current.extent
                )));
            }
        }

        let (image, storage) = (current.image, current.storage);
        self.copy_stored(image, storage, false, upload)
    }

    fn destroy_texture(&mut self, handle: TextureHandle) -> Result<(), ImagingError> {
        let tex = self
            .textures
            .remove(&handle)
            .ok_or(ImagingError::UnknownTexture(handle.0))?;
        unsafe {
            let device = self.gpu.get_device();
            device.device_wait_idle()?;
            device.destroy_sampler(tex.sampler, None);
        }
        if let Some(image) = tex.image {
            self.destroy_image(image);
        }
        Ok(())
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.gpu.get_device().device_wait_idle();
        }
        let textures: Vec<VkTexture> = self.textures.drain().map(|(_, t)| t).collect();
        for tex in textures {
            unsafe { self.gpu.get_device().destroy_sampler(tex.sampler, None) };
            if let Some(image) = tex.image {
                self.destroy_image(image);
            }
        }
    }
}
