use std::collections::HashMap;

use crate::utils::error::ImagingError;

use super::device::{TextureDevice, TextureHandle, Upload};
use super::format::{DeviceFormat, TextureTarget};
use super::params::TextureParams;

#[derive(Debug)]
struct HostTexture {
    target: TextureTarget,
    params: TextureParams,
    format: Option<DeviceFormat>,
    extent: [u32; 3],
    // tightly packed, x fastest
    bytes: Vec<u8>,
    uploads: usize,
}

/// In-memory texture device. Stores every texture as packed bytes so uploads
/// can be inspected without a GPU.
#[derive(Debug, Default)]
pub struct HostDevice {
    next_id: u64,
    textures: HashMap<TextureHandle, HostTexture>,
}

impl HostDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live textures
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn contains(&self, handle: TextureHandle) -> bool {
        self.textures.contains_key(&handle)
    }

    pub fn texture_bytes(&self, handle: TextureHandle) -> Option<&[u8]> {
        self.textures.get(&handle).map(|t| t.bytes.as_slice())
    }

    pub fn extent(&self, handle: TextureHandle) -> Option<[u32; 3]> {
        self.textures.get(&handle).map(|t| t.extent)
    }

    pub fn format(&self, handle: TextureHandle) -> Option<DeviceFormat> {
        self.textures.get(&handle).and_then(|t| t.format)
    }

    pub fn target(&self, handle: TextureHandle) -> Option<TextureTarget> {
        self.textures.get(&handle).map(|t| t.target)
    }

    pub fn params(&self, handle: TextureHandle) -> Option<TextureParams> {
        self.textures.get(&handle).map(|t| t.params)
    }

    /// Transfers received, full and regional
    pub fn upload_count(&self, handle: TextureHandle) -> usize {
        self.textures.get(&handle).map_or(0, |t| t.uploads)
    }

    fn texture_mut(&mut self, handle: TextureHandle) -> Result<&mut HostTexture, ImagingError> {
        self.textures
            .get_mut(&handle)
            .ok_or(ImagingError::UnknownTexture(handle.0))
    }
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

impl TextureDevice for HostDevice {
    fn create_texture(
        &mut self,
        target: TextureTarget,
        params: &TextureParams,
    ) -> Result<TextureHandle, ImagingError> {
        self.next_id += 1;
        let handle = TextureHandle(self.next_id);
        self.textures.insert(
            handle,
            HostTexture {
                target,
                params: *params,
                format: None,
                extent: [0; 3],
                bytes: Vec::new(),
                uploads: 0,
            },
        );
        Ok(handle)
    }

    fn set_sampling(
        &mut self,
        handle: TextureHandle,
        params: &TextureParams,
    ) -> Result<(), ImagingError> {
        self.texture_mut(handle)?.params = *params;
        Ok(())
    }

    fn upload(&mut self, handle: TextureHandle, upload: &Upload<'_>) -> Result<(), ImagingError> {
        check_len(upload)?;
        let tex = self.texture_mut(handle)?;

        let row_bytes = upload.row_bytes();
        let pitch = upload.row_pitch();
        let mut bytes = Vec::with_capacity(row_bytes * upload.rows());
        for row in 0..upload.rows() {
            let start = row * pitch;
            bytes.extend_from_slice(&upload.bytes[start..start + row_bytes]);
        }

        tex.format = Some(upload.format);
        tex.extent = upload.extent;
        tex.bytes = bytes;
        tex.uploads += 1;
        Ok(())
    }

    fn upload_region(
        &mut self,
        handle: TextureHandle,
        upload: &Upload<'_>,
    ) -> Result<(), ImagingError> {
        check_len(upload)?;
        let tex = self.texture_mut(handle)?;

        let Some(format) = tex.format else {
            return Err(ImagingError::InvalidRegion(
                "texture storage has not been defined".to_string(),
            ));
        };
        if format.texel_bytes() != upload.format.texel_bytes() {
            return Err(ImagingError::IncompatibleTexel {
                expected: format.texel_bytes(),
                actual: upload.format.texel_bytes(),
            });
        }
        for axis in 0..3 {
            if upload.origin[axis] + upload.extent[axis] > tex.extent[axis] {
                return Err(ImagingError::InvalidRegion(format!(
                    "region {:?}+{:?} outside texture {:?}",
                    upload.origin, upload.extent, tex.extent
                )));
            }
        }

        let texel = format.texel_bytes();
        let row_bytes = upload.row_bytes();
        let pitch = upload.row_pitch();
        let tex_row = tex.extent[0] as usize * texel;
        let tex_slice = tex_row * tex.extent[1] as usize;
        for z in 0..upload.extent[2] as usize {
            for y in 0..upload.extent[1] as usize {
                let src = (z * upload.extent[1] as usize + y) * pitch;
                let dst = (upload.origin[2] as usize + z) * tex_slice
                    + (upload.origin[1] as usize + y) * tex_row
                    + upload.origin[0] as usize * texel;
                tex.bytes[dst..dst + row_bytes]
                    .copy_from_slice(&upload.bytes[src..src + row_bytes]);
            }
        }
        tex.uploads += 1;
        Ok(())
    }

    fn destroy_texture(&mut self, handle: TextureHandle) -> Result<(), ImagingError> {
        self.textures
            .remove(&handle)
            .map(|_| ())
            .ok_or(ImagingError::UnknownTexture(handle.0))
    }
}
