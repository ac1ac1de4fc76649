use std::ops::{Deref, DerefMut};

use crate::utils::error::ImagingError;

use super::coord::Coords;
use super::data::ImageData;
use super::texel::Texel;

/// An [`ImageData`] with image-level operations: resampling, filtering,
/// geometric transforms and (in 2D) file I/O.
///
/// Every `*_to_new` operation returns a fresh owned image; the in-place
/// variant builds that image and swaps it in.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<'a, const N: usize, T: Texel> {
    data: ImageData<'a, N, T>,
}

impl<'a, const N: usize, T: Texel> Image<'a, N, T> {
    pub fn new(size: [usize; N]) -> Self {
        Self {
            data: ImageData::new(size),
        }
    }

    pub fn from_data(data: ImageData<'a, N, T>) -> Self {
        Self { data }
    }

    pub fn into_data(self) -> ImageData<'a, N, T> {
        self.data
    }

    pub fn data(&self) -> &ImageData<'a, N, T> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ImageData<'a, N, T> {
        &mut self.data
    }

    pub fn swap(&mut self, other: &mut Self) {
        self.data.swap(&mut other.data);
    }

    /// Replace the contents with an owned result, keeping `self`'s lifetime
    pub(crate) fn replace_with(&mut self, result: Image<'static, N, T>) {
        let mut data: ImageData<'a, N, T> = result.data;
        self.data.swap(&mut data);
    }

    pub fn sub_image(&self, origin: [usize; N], size: [usize; N]) -> Image<'static, N, T> {
        Image::from_data(self.data.sub_image(origin, size))
    }

    /// Keep only the region at `origin` (clamped like [`ImageData::sub_image`])
    pub fn crop(&mut self, origin: [usize; N], size: [usize; N]) {
        let cropped = self.sub_image(origin, size);
        self.replace_with(cropped);
    }

    pub fn swap_texels(&mut self, a: [usize; N], b: [usize; N]) {
        let tmp = *self.data.texel(a);
        *self.data.texel_mut(a) = *self.data.texel(b);
        *self.data.texel_mut(b) = tmp;
    }

    /// Mirror the image along `axis`, counted from 1 (1 = x, 2 = y, 3 = z)
    pub fn flip(&mut self, axis: usize) -> Result<(), ImagingError> {
        if axis == 0 || axis > N {
            return Err(ImagingError::InvalidAxis { axis, dim: N });
        }
        let ax = axis - 1;
        let size = self.data.size();

        let mut half = size;
        half[ax] = size[ax] / 2;
        for c in Coords::new(half) {
            let mut mirrored = c;
            mirrored[ax] = size[ax] - 1 - c[ax];
            self.swap_texels(c, mirrored);
        }
        Ok(())
    }

    /// Quarter turn of a 2D image. `axis` is 3 or -3 (the z axis, either direction).
    pub fn rotate90_to_new(&self, axis: i32) -> Result<Image<'static, N, T>, ImagingError> {
        if N != 2 || (axis != 3 && axis != -3) {
            return Err(ImagingError::UnsupportedRotation { axis, dim: N });
        }

        let size = self.data.size();
        let (w, h) = (size[0], size[1]);
        let mut new_size = size;
        new_size[0] = h;
        new_size[1] = w;

        let mut out = Image::<'static, N, T>::new(new_size);
        for dst in Coords::new(new_size) {
            let (i, j) = (dst[0], dst[1]);
            let mut src = dst;
            if axis == 3 {
                src[0] = j;
                src[1] = h - 1 - i;
            } else {
                src[0] = w - 1 - j;
                src[1] = i;
            }
            *out.data.texel_mut(dst) = *self.data.texel(src);
        }
        Ok(out)
    }

    pub fn rotate90(&mut self, axis: i32) -> Result<(), ImagingError> {
        let rotated = self.rotate90_to_new(axis)?;
        self.replace_with(rotated);
        Ok(())
    }
}

impl<const N: usize, T: Texel> Default for Image<'_, N, T> {
    fn default() -> Self {
        Self {
            data: ImageData::empty(),
        }
    }
}

impl<'a, const N: usize, T: Texel> Deref for Image<'a, N, T> {
    type Target = ImageData<'a, N, T>;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<const N: usize, T: Texel> DerefMut for Image<'_, N, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl<'a, const N: usize, T: Texel> From<ImageData<'a, N, T>> for Image<'a, N, T> {
    fn from(data: ImageData<'a, N, T>) -> Self {
        Self { data }
    }
}
