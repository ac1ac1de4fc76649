use std::ops::{Index, IndexMut};

use crate::utils::error::ImagingError;

use super::buffer::TexelBuffer;
use super::coord::{Coords, cumulative_strides, linear_offset, volume};
use super::texel::Texel;

/// Contiguous N-dimensional texel array.
///
/// Axis 0 varies fastest. Coordinates are a caller contract: they are only
/// checked by `debug_assert!`, release builds index the buffer directly.
#[derive(Debug)]
pub struct ImageData<'a, const N: usize, T> {
    size: [usize; N],
    strides: [usize; N],
    buffer: TexelBuffer<'a, T>,
}

impl<'a, const N: usize, T: Texel> ImageData<'a, N, T> {
    /// Allocate an owned, zero-initialised array
    pub fn new(size: [usize; N]) -> Self {
        let strides = cumulative_strides(&size);
        Self {
            size,
            strides,
            buffer: TexelBuffer::Owned(vec![T::default(); volume(&size)]),
        }
    }

    pub fn empty() -> Self {
        Self::new([0; N])
    }

    pub fn from_vec(data: Vec<T>, size: [usize; N]) -> Result<Self, ImagingError> {
        let expected = volume(&size);
        if data.len() != expected {
            return Err(ImagingError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            size,
            strides: cumulative_strides(&size),
            buffer: TexelBuffer::Owned(data),
        })
    }

    /// Wrap external memory without taking ownership.
    ///
    /// The slice may be longer than the extent; only the first `volume(size)`
    /// texels are addressed.
    pub fn from_slice(data: &'a mut [T], size: [usize; N]) -> Result<Self, ImagingError> {
        let expected = volume(&size);
        if data.len() < expected {
            return Err(ImagingError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            size,
            strides: cumulative_strides(&size),
            buffer: TexelBuffer::Borrowed(&mut data[..expected]),
        })
    }

    /// Re-create in place with a fresh owned buffer, dropping the old one
    pub fn create(&mut self, size: [usize; N]) {
        *self = Self::new(size);
    }

    /// Re-point at external memory, dropping any owned buffer
    pub fn create_borrowed(
        &mut self,
        data: &'a mut [T],
        size: [usize; N],
    ) -> Result<(), ImagingError> {
        *self = Self::from_slice(data, size)?;
        Ok(())
    }

    pub fn size(&self) -> [usize; N] {
        self.size
    }

    pub fn strides(&self) -> [usize; N] {
        self.strides
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_owned(&self) -> bool {
        self.buffer.is_owned()
    }

    #[inline]
    fn offset(&self, coord: &[usize; N]) -> usize {
        debug_assert!(
            coord.iter().zip(self.size.iter()).all(|(c, s)| c < s),
            "texel {:?} outside image of size {:?}",
            coord,
            self.size
        );
        linear_offset(coord, &self.strides)
    }

    #[inline]
    pub fn texel(&self, coord: [usize; N]) -> &T {
        &self.buffer[self.offset(&coord)]
    }

    #[inline]
    pub fn texel_mut(&mut self, coord: [usize; N]) -> &mut T {
        let off = self.offset(&coord);
        &mut self.buffer[off]
    }

    #[inline]
    pub fn texel1(&self, i: usize) -> &T {
        debug_assert!(N == 1, "texel1 on an image of dimension {}", N);
        &self.buffer[i]
    }

    #[inline]
    pub fn texel2(&self, i: usize, j: usize) -> &T {
        debug_assert!(N == 2, "texel2 on an image of dimension {}", N);
        &self.buffer[i + j * self.strides[0]]
    }

    #[inline]
    pub fn texel3(&self, i: usize, j: usize, k: usize) -> &T {
        debug_assert!(N == 3, "texel3 on an image of dimension {}", N);
        &self.buffer[i + j * self.strides[0] + k * self.strides[1]]
    }

    #[inline]
    pub fn texel2_mut(&mut self, i: usize, j: usize) -> &mut T {
        debug_assert!(N == 2, "texel2_mut on an image of dimension {}", N);
        let off = i + j * self.strides[0];
        &mut self.buffer[off]
    }

    #[inline]
    pub fn texel3_mut(&mut self, i: usize, j: usize, k: usize) -> &mut T {
        debug_assert!(N == 3, "texel3_mut on an image of dimension {}", N);
        let off = i + j * self.strides[0] + k * self.strides[1];
        &mut self.buffer[off]
    }

    /// Texel by linear index in storage order
    #[inline]
    pub fn at(&self, idx: usize) -> &T {
        &self.buffer[idx]
    }

    #[inline]
    pub fn at_mut(&mut self, idx: usize) -> &mut T {
        &mut self.buffer[idx]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buffer
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.buffer
    }

    /// Raw bytes of the whole buffer, as handed to a device upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buffer[..])
    }

    pub fn as_ptr(&self) -> *const T {
        self.buffer.as_ptr()
    }

    pub fn fill(&mut self, value: T) {
        self.buffer.fill(value);
    }

    pub fn coords(&self) -> Coords<N> {
        Coords::new(self.size)
    }

    /// Exchange size, strides, buffer and ownership with `other`. No texel is copied.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.size, &mut other.size);
        std::mem::swap(&mut self.strides, &mut other.strides);
        std::mem::swap(&mut self.buffer, &mut other.buffer);
    }

    /// Copy the region starting at `origin` into a new owned array.
    ///
    /// The requested size is clamped per axis so the region stays inside the image.
    pub fn sub_image(&self, origin: [usize; N], size: [usize; N]) -> ImageData<'static, N, T> {
        let mut clamped = [0; N];
        for i in 0..N {
            let avail = self.size[i].saturating_sub(origin[i]);
            clamped[i] = size[i].min(avail);
        }

        let mut out = ImageData::<'static, N, T>::new(clamped);
        if out.is_empty() {
            return out;
        }

        // copy whole rows along axis 0
        let row = clamped[0];
        let mut rows = clamped;
        rows[0] = 1;
        for c in Coords::new(rows) {
            let mut src = c;
            for i in 0..N {
                src[i] += origin[i];
            }
            let src_off = linear_offset(&src, &self.strides);
            let dst_off = linear_offset(&c, &out.strides);
            out.buffer[dst_off..dst_off + row].copy_from_slice(&self.buffer[src_off..src_off + row]);
        }
        out
    }

    /// Element-wise conversion into a new owned array of the same extent
    pub fn convert<U: Texel>(&self, mut f: impl FnMut(&T) -> U) -> ImageData<'static, N, U> {
        ImageData {
            size: self.size,
            strides: self.strides,
            buffer: TexelBuffer::Owned(self.buffer.iter().map(&mut f).collect()),
        }
    }

    /// Deep copy that owns its buffer, whatever `self` does
    pub fn to_owned_data(&self) -> ImageData<'static, N, T> {
        ImageData {
            size: self.size,
            strides: self.strides,
            buffer: self.buffer.to_owned_buffer(),
        }
    }
}

impl<const N: usize, T: Texel> Default for ImageData<'_, N, T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const N: usize, T: Texel> Clone for ImageData<'_, N, T> {
    fn clone(&self) -> Self {
        Self {
            size: self.size,
            strides: self.strides,
            buffer: TexelBuffer::Owned(self.buffer.to_vec()),
        }
    }
}

impl<const N: usize, T: Texel + PartialEq> PartialEq for ImageData<'_, N, T> {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.as_slice() == other.as_slice()
    }
}

impl<const N: usize, T: Texel> Index<[usize; N]> for ImageData<'_, N, T> {
    type Output = T;

    fn index(&self, coord: [usize; N]) -> &T {
        self.texel(coord)
    }
}

impl<const N: usize, T: Texel> IndexMut<[usize; N]> for ImageData<'_, N, T> {
    fn index_mut(&mut self, coord: [usize; N]) -> &mut T {
        self.texel_mut(coord)
    }
}
