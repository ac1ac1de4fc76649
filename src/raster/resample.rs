use crate::utils::math::rint;

use super::coord::Coords;
use super::image::Image;
use super::texel::{Accumulate, Texel};

/// Source index for every destination index along one axis.
///
/// Samples sit at pixel centres: position `inc/2 - 0.5 + k*inc`, rounded to nearest.
fn nearest_lut(src_len: usize, dst_len: usize) -> Vec<usize> {
    if dst_len == 0 || src_len == 0 {
        return Vec::new();
    }
    let inc = src_len as f64 / dst_len as f64;
    let mut p = inc / 2.0 - 0.5;
    let mut lut = Vec::with_capacity(dst_len);
    for _ in 0..dst_len {
        let idx = rint(p).max(0.0) as usize;
        lut.push(idx.min(src_len - 1));
        p += inc;
    }
    lut
}

impl<const N: usize, T: Texel> Image<'_, N, T> {
    /// Nearest-neighbour rescale to `new_size`
    pub fn scale_nearest_to_new(&self, new_size: [usize; N]) -> Image<'static, N, T> {
        let size = self.size();
        let luts: [Vec<usize>; N] = std::array::from_fn(|a| nearest_lut(size[a], new_size[a]));

        let mut out = Image::<'static, N, T>::new(new_size);
        if size.contains(&0) {
            return out;
        }
        for (idx, dst) in Coords::new(new_size).enumerate() {
            let src: [usize; N] = std::array::from_fn(|a| luts[a][dst[a]]);
            *out.at_mut(idx) = *self.texel(src);
        }
        out
    }

    pub fn scale_nearest(&mut self, new_size: [usize; N]) {
        let scaled = self.scale_nearest_to_new(new_size);
        self.replace_with(scaled);
    }
}

impl<const N: usize, T: Accumulate> Image<'_, N, T> {
    /// Halve every axis, each output texel being the mean of its 2^N source texels.
    ///
    /// Odd extents lose their last slice.
    pub fn subsample2_to_new(&self) -> Image<'static, N, T> {
        let size = self.size();
        let new_size: [usize; N] = std::array::from_fn(|a| size[a] / 2);
        let corners = 1usize << N;
        let norm = corners as f64;

        let mut out = Image::<'static, N, T>::new(new_size);
        for (idx, dst) in Coords::new(new_size).enumerate() {
            let mut sum = T::Wide::default();
            for m in 0..corners {
                let src: [usize; N] = std::array::from_fn(|a| 2 * dst[a] + ((m >> a) & 1));
                sum += self.texel(src).widen();
            }
            *out.at_mut(idx) = T::narrow(sum / norm);
        }
        out
    }

    pub fn subsample2(&mut self) {
        let halved = self.subsample2_to_new();
        self.replace_with(halved);
    }
}
