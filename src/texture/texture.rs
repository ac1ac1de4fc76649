use std::ops::{Deref, DerefMut};

use crate::raster::{Image, Texel};
use crate::utils::error::ImagingError;

use super::device::{TextureDevice, TextureHandle, Upload};
use super::format::{ComponentType, DeviceFormat, TextureTarget, unpack_alignment};
use super::params::{Filtering, TextureParams, Wrapping};

/// An [`Image`] paired with a device texture it can be uploaded to.
///
/// The device object is created with the texture and must be released with
/// [`Texture::destroy`] on the same device. A texture dropped any other way
/// cannot reach its device, so the device object stays allocated until the
/// device itself goes away; a warning is logged when that happens.
#[derive(Debug)]
pub struct Texture<'a, const N: usize, T: Texel> {
    image: Image<'a, N, T>,
    component: ComponentType,
    params: TextureParams,
    handle: Option<TextureHandle>,
}

impl<'a, const N: usize, T: Texel> Texture<'a, N, T> {
    /// Empty texture. Above three dimensions no device object is created and
    /// uploads do nothing. Release it with [`Texture::destroy`].
    pub fn new(
        device: &mut dyn TextureDevice,
        component: ComponentType,
    ) -> Result<Self, ImagingError> {
        Self::from_image(device, Image::default(), component)
    }

    pub fn from_image(
        device: &mut dyn TextureDevice,
        image: Image<'a, N, T>,
        component: ComponentType,
    ) -> Result<Self, ImagingError> {
        let params = TextureParams::default();
        let handle = match TextureTarget::for_dimension(N) {
            Some(target) => {
                let handle = device.create_texture(target, &params)?;
                log::debug!("created {:?} texture {:?}", target, handle);
                Some(handle)
            }
            None => None,
        };

        Ok(Self {
            image,
            component,
            params,
            handle,
        })
    }

    pub fn image(&self) -> &Image<'a, N, T> {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut Image<'a, N, T> {
        &mut self.image
    }

    /// Host image only. The device texture is left behind, see [`Texture::destroy`].
    pub fn into_image(mut self) -> Image<'a, N, T> {
        std::mem::take(&mut self.image)
    }

    pub fn handle(&self) -> Option<TextureHandle> {
        self.handle
    }

    pub fn component_type(&self) -> ComponentType {
        self.component
    }

    pub fn params(&self) -> TextureParams {
        self.params
    }

    /// Components per texel, from the texel size and the component type
    pub fn components(&self) -> usize {
        size_of::<T>() / self.component.bytes()
    }

    pub fn device_format(&self) -> Result<DeviceFormat, ImagingError> {
        DeviceFormat::derive(size_of::<T>(), self.component)
    }

    /// Upload the whole image, redefining the device texture's storage
    pub fn update(&self, device: &mut dyn TextureDevice) -> Result<(), ImagingError> {
        let Some(handle) = self.handle else {
            log::error!("cannot upload a {}-dimensional texture", N);
            return Ok(());
        };

        let format = self.device_format()?;
        let extent = padded_extent(self.image.size())?;
        let upload = Upload {
            format,
            origin: [0; 3],
            extent,
            alignment: unpack_alignment(extent[0] as usize * format.texel_bytes()),
            bytes: self.image.as_bytes(),
        };
        log::debug!(
            "uploading {:?} texels of {:?} to texture {:?}",
            extent,
            format.format,
            handle
        );
        device.upload(handle, &upload)
    }

    /// Upload the texels in `origin .. origin+size` into the same place on the device.
    /// The region is clamped to the image; an empty region uploads nothing.
    pub fn update_region(
        &self,
        device: &mut dyn TextureDevice,
        origin: [usize; N],
        size: [usize; N],
    ) -> Result<(), ImagingError> {
        let Some(handle) = self.handle else {
            log::error!("cannot upload a {}-dimensional texture", N);
            return Ok(());
        };

        let region = self.image.sub_image(origin, size);
        if region.is_empty() {
            return Ok(());
        }

        let format = self.device_format()?;
        let extent = padded_extent(region.size())?;
        let mut offset = [0u32; 3];
        for (dst, &o) in offset.iter_mut().zip(origin.iter()) {
            *dst = to_u32(o)?;
        }

        let upload = Upload {
            format,
            origin: offset,
            extent,
            alignment: unpack_alignment(extent[0] as usize * format.texel_bytes()),
            bytes: region.as_bytes(),
        };
        device.upload_region(handle, &upload)
    }

    pub fn set_filtering(
        &mut self,
        device: &mut dyn TextureDevice,
        filtering: Filtering,
    ) -> Result<(), ImagingError> {
        self.params.filtering = filtering;
        self.apply_params(device)
    }

    pub fn set_wrapping(
        &mut self,
        device: &mut dyn TextureDevice,
        wrapping: Wrapping,
    ) -> Result<(), ImagingError> {
        self.params.wrapping = wrapping;
        self.apply_params(device)
    }

    fn apply_params(&self, device: &mut dyn TextureDevice) -> Result<(), ImagingError> {
        match self.handle {
            Some(handle) => device.set_sampling(handle, &self.params),
            None => Ok(()),
        }
    }

    /// Release the device texture, keeping the host image
    pub fn destroy(
        mut self,
        device: &mut dyn TextureDevice,
    ) -> Result<Image<'a, N, T>, ImagingError> {
        if let Some(handle) = self.handle.take() {
            device.destroy_texture(handle)?;
        }
        Ok(std::mem::take(&mut self.image))
    }
}

impl<const N: usize, T: Texel> Drop for Texture<'_, N, T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::warn!("texture {:?} dropped without destroy, device object leaked", handle);
        }
    }
}

fn to_u32(v: usize) -> Result<u32, ImagingError> {
    u32::try_from(v).map_err(|_| ImagingError::InvalidRegion(format!("{} exceeds device limits", v)))
}

fn padded_extent<const N: usize>(size: [usize; N]) -> Result<[u32; 3], ImagingError> {
    let mut extent = [1u32; 3];
    for (dst, &s) in extent.iter_mut().zip(size.iter()) {
        *dst = to_u32(s)?;
    }
    Ok(extent)
}

impl<'a, const N: usize, T: Texel> Deref for Texture<'a, N, T> {
    type Target = Image<'a, N, T>;

    fn deref(&self) -> &Self::Target {
        &self.image
    }
}

impl<const N: usize, T: Texel> DerefMut for Texture<'_, N, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.image
    }
}

#[cfg(test)]
mod tests {
    use super::Texture;
    use crate::raster::{Image, ImageData};
    use crate::texture::format::{ComponentType, PixelLayout, TextureTarget};
    use crate::texture::host::HostDevice;
    use crate::texture::params::{Filtering, TextureParams, Wrapping};
    use crate::utils::error::ImagingError;

    fn rgb_image(w: usize, h: usize) -> Image<'static, 2, [u8; 3]> {
        let texels = (0..w * h)
            .map(|i| [i as u8, (i * 2) as u8, (i * 3) as u8])
            .collect();
        Image::from_data(ImageData::from_vec(texels, [w, h]).expect("sized"))
    }

    #[test]
    fn update_uploads_every_byte() {
        let mut dev = HostDevice::new();
        let tex = Texture::from_image(&mut dev, rgb_image(3, 2), ComponentType::U8)
            .expect("create");
        let h = tex.handle().expect("2d texture has a handle");

        tex.update(&mut dev).expect("update");

        assert_eq!(dev.target(h), Some(TextureTarget::Tex2D));
        assert_eq!(dev.extent(h), Some([3, 2, 1]));
        assert_eq!(dev.format(h).map(|f| f.layout), Some(PixelLayout::Rgb));
        assert_eq!(dev.texture_bytes(h), Some(tex.as_bytes()));
    }

    #[test]
    fn component_count_follows_component_type() {
        let mut dev = HostDevice::new();
        let tex: Texture<2, [u16; 2]> =
            Texture::new(&mut dev, ComponentType::U16).expect("create");
        assert_eq!(tex.components(), 2);

        let tex: Texture<2, f32> = Texture::new(&mut dev, ComponentType::F32).expect("create");
        assert_eq!(tex.components(), 1);
        assert_eq!(
            tex.device_format().expect("format").layout,
            PixelLayout::Luminance
        );

        let tex: Texture<2, [u8; 4]> = Texture::new(&mut dev, ComponentType::U8).expect("create");
        assert_eq!(tex.components(), 4);
    }

    #[test]
    fn region_update_lands_at_origin() {
        let mut dev = HostDevice::new();
        let mut tex =
            Texture::from_image(&mut dev, rgb_image(4, 4), ComponentType::U8).expect("create");
        tex.update(&mut dev).expect("update");

        for y in 1..3 {
            for x in 1..3 {
                *tex.texel2_mut(x, y) = [255, 255, 255];
            }
        }
        tex.update_region(&mut dev, [1, 1], [2, 2]).expect("region");

        let h = tex.handle().expect("handle");
        assert_eq!(dev.texture_bytes(h), Some(tex.as_bytes()));
        assert_eq!(dev.upload_count(h), 2);
    }

    #[test]
    fn region_is_clamped_to_image() {
        let mut dev = HostDevice::new();
        let mut tex: Texture<1, u8> = Texture::from_image(
            &mut dev,
            Image::from_data(ImageData::from_vec(vec![0u8; 8], [8]).expect("sized")),
            ComponentType::U8,
        )
        .expect("create");
        tex.update(&mut dev).expect("update");

        tex.fill(9);
        tex.update_region(&mut dev, [6], [10]).expect("clamped region");
        tex.update_region(&mut dev, [20], [2]).expect("empty region");

        let h = tex.handle().expect("handle");
        assert_eq!(dev.texture_bytes(h), Some(&[0, 0, 0, 0, 0, 0, 9, 9][..]));
        assert_eq!(dev.upload_count(h), 2);
    }

    #[test]
    fn four_dimensional_upload_is_a_logged_no_op() {
        let mut dev = HostDevice::new();
        let tex: Texture<4, u8> = Texture::from_image(
            &mut dev,
            Image::new([2, 2, 2, 2]),
            ComponentType::U8,
        )
        .expect("create");
        assert!(tex.handle().is_none());
        assert!(dev.is_empty());
        assert!(tex.update(&mut dev).is_ok());
        assert!(tex.update_region(&mut dev, [0; 4], [1; 4]).is_ok());
    }

    #[test]
    fn params_reach_device() {
        let mut dev = HostDevice::new();
        let mut tex: Texture<3, u8> = Texture::new(&mut dev, ComponentType::U8).expect("create");
        let h = tex.handle().expect("handle");
        assert_eq!(dev.params(h), Some(TextureParams::default()));

        tex.set_filtering(&mut dev, Filtering::Nearest).expect("filter");
        tex.set_wrapping(&mut dev, Wrapping::Repeat).expect("wrap");
        assert_eq!(
            dev.params(h),
            Some(TextureParams {
                filtering: Filtering::Nearest,
                wrapping: Wrapping::Repeat,
            })
        );
    }

    #[test]
    fn destroy_releases_device_texture() {
        let mut dev = HostDevice::new();
        let tex = Texture::from_image(&mut dev, rgb_image(2, 2), ComponentType::U8)
            .expect("create");
        let image = tex.destroy(&mut dev).expect("destroy");
        assert!(dev.is_empty());
        assert_eq!(image.size(), [2, 2]);
    }

    #[test]
    fn dropping_without_destroy_leaves_device_texture() {
        let mut dev = HostDevice::new();
        let tex = Texture::from_image(&mut dev, rgb_image(2, 2), ComponentType::U8)
            .expect("create");
        let h = tex.handle().expect("handle");
        let image = tex.into_image();
        assert_eq!(image.size(), [2, 2]);
        assert!(dev.contains(h));

        let tex: Texture<2, u8> = Texture::new(&mut dev, ComponentType::U8).expect("create");
        drop(tex);
        assert_eq!(dev.len(), 2);
    }

    #[test]
    fn region_update_3d_touches_only_the_region() {
        let mut dev = HostDevice::new();
        let mut tex: Texture<3, u8> =
            Texture::from_image(&mut dev, Image::new([3, 3, 3]), ComponentType::U8)
                .expect("create");
        tex.update(&mut dev).expect("update");

        for z in 1..3 {
            for y in 1..3 {
                for x in 1..3 {
                    tex[[x, y, z]] = 1;
                }
            }
        }
        tex.update_region(&mut dev, [1, 1, 1], [2, 2, 2]).expect("region");

        let h = tex.handle().expect("handle");
        let changed: Vec<usize> = dev
            .texture_bytes(h)
            .expect("bytes")
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b != 0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(changed, vec![13, 14, 16, 17, 22, 23, 25, 26]);
    }

    #[test]
    fn mismatched_component_type_fails_upload() {
        let mut dev = HostDevice::new();
        let tex = Texture::from_image(&mut dev, rgb_image(2, 2), ComponentType::F32)
            .expect("create");
        assert!(matches!(
            tex.update(&mut dev),
            Err(ImagingError::UnsupportedFormat(_))
        ));
    }
}
