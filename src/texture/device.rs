use crate::utils::error::ImagingError;

use super::format::{DeviceFormat, TextureTarget};
use super::params::TextureParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// One pixel transfer to a device texture.
///
/// Extents and origins are padded to three axes (1 and 0 respectively).
/// `bytes` holds `extent` texels, rows padded to `alignment` bytes.
#[derive(Clone, Copy, Debug)]
pub struct Upload<'b> {
    pub format: DeviceFormat,
    pub origin: [u32; 3],
    pub extent: [u32; 3],
    pub alignment: usize,
    pub bytes: &'b [u8],
}

impl Upload<'_> {
    pub fn row_bytes(&self) -> usize {
        self.extent[0] as usize * self.format.texel_bytes()
    }

    pub fn row_pitch(&self) -> usize {
        crate::utils::math::round_up(self.row_bytes(), self.alignment)
    }

    pub fn rows(&self) -> usize {
        self.extent[1] as usize * self.extent[2] as usize
    }

    /// Minimum length of `bytes`
    pub fn required_len(&self) -> usize {
        match self.rows() {
            0 => 0,
            rows => (rows - 1) * self.row_pitch() + self.row_bytes(),
        }
    }
}

/// Graphics device operations needed by [`crate::Texture`].
///
/// Calls are synchronous: when `upload` returns the data has reached the texture.
pub trait TextureDevice {
    fn create_texture(
        &mut self,
        target: TextureTarget,
        params: &TextureParams,
    ) -> Result<TextureHandle, ImagingError>;

    fn set_sampling(
        &mut self,
        handle: TextureHandle,
        params: &TextureParams,
    ) -> Result<(), ImagingError>;

    /// (Re)define the whole texture storage from `upload`, whose origin is zero
    fn upload(&mut self, handle: TextureHandle, upload: &Upload<'_>) -> Result<(), ImagingError>;

    /// Overwrite a region of storage previously defined by `upload`
    fn upload_region(
        &mut self,
        handle: TextureHandle,
        upload: &Upload<'_>,
    ) -> Result<(), ImagingError>;

    fn destroy_texture(&mut self, handle: TextureHandle) -> Result<(), ImagingError>;
}
