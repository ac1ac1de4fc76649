use std::ops::Deref;

use crate::utils::math::gaussian;

use super::coord::Coords;
use super::data::ImageData;
use super::image::Image;
use super::texel::Accumulate;

/// Convolution kernel: an N-dimensional array of f64 weights.
///
/// The kernel is centred on the texel being filtered; its radius along each
/// axis is `extent / 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter<const N: usize> {
    weights: ImageData<'static, N, f64>,
}

impl<const N: usize> Filter<N> {
    pub fn from_weights(weights: ImageData<'static, N, f64>) -> Self {
        Self { weights }
    }

    /// Box kernel of side `2 * radius + 1`, every weight `1 / side^N`
    pub fn average(radius: usize) -> Self {
        let side = 2 * radius + 1;
        let mut weights = ImageData::new([side; N]);
        weights.fill(1.0 / (side as f64).powi(N as i32));
        Self { weights }
    }

    /// Sampled Gaussian of side `2 * radius + 1`.
    ///
    /// Weights use the continuous density coefficient and are not renormalised,
    /// so they only approximately sum to 1 (less so for small radii).
    pub fn gaussian(radius: usize, sigma: f64) -> Self {
        let side = 2 * radius + 1;
        let mut weights = ImageData::new([side; N]);
        for c in Coords::new([side; N]) {
            let dist2: f64 = c
                .iter()
                .map(|&x| {
                    let d = x as f64 - radius as f64;
                    d * d
                })
                .sum();
            weights[c] = gaussian(dist2, sigma, N);
        }
        Self { weights }
    }

    pub fn weight_sum(&self) -> f64 {
        self.weights.as_slice().iter().sum()
    }

    /// Copy scaled so the weights sum to 1
    pub fn normalized(&self) -> Self {
        let sum = self.weight_sum();
        let mut weights = self.weights.clone();
        if sum != 0.0 {
            for w in weights.as_mut_slice() {
                *w /= sum;
            }
        }
        Self { weights }
    }

    pub fn radius(&self) -> [usize; N] {
        self.weights.size().map(|s| s / 2)
    }
}

impl<const N: usize> Deref for Filter<N> {
    type Target = ImageData<'static, N, f64>;

    fn deref(&self) -> &Self::Target {
        &self.weights
    }
}

impl<const N: usize, T: Accumulate> Image<'_, N, T> {
    /// Weighted sum of the kernel footprint centred on `at`.
    ///
    /// The footprint must lie inside the image.
    pub fn apply_filter_one_texel(&self, filter: &Filter<N>, at: [usize; N]) -> T {
        let radius = filter.radius();
        let mut acc = T::Wide::default();
        for k in filter.coords() {
            let src: [usize; N] = std::array::from_fn(|a| at[a] - radius[a] + k[a]);
            acc += self.texel(src).widen() * *filter.texel(k);
        }
        T::narrow(acc)
    }

    /// Convolve with `filter` into a new image of the same extent.
    ///
    /// Texels whose kernel footprint would leave the image are copied through
    /// unchanged rather than clamped or zero-padded.
    pub fn apply_filter(&self, filter: &Filter<N>) -> Image<'static, N, T> {
        let size = self.size();
        let ksize = filter.size();
        let radius = filter.radius();

        let mut out = Image::<'static, N, T>::new(size);
        for (idx, c) in self.coords().enumerate() {
            let interior =
                (0..N).all(|a| c[a] >= radius[a] && c[a] - radius[a] + ksize[a] <= size[a]);
            *out.at_mut(idx) = if interior {
                self.apply_filter_one_texel(filter, c)
            } else {
                *self.at(idx)
            };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::Filter;
    use crate::raster::data::ImageData;
    use crate::raster::image::Image;

    #[test]
    fn box_weights_sum_to_one() {
        let f1 = Filter::<1>::average(2);
        assert_eq!(f1.size(), [5]);
        assert!((f1.weight_sum() - 1.0).abs() < 1e-12);

        let f3 = Filter::<3>::average(1);
        assert_eq!(f3.size(), [3, 3, 3]);
        assert!(f3.as_slice().iter().all(|&w| (w - 1.0 / 27.0).abs() < 1e-15));
    }

    #[test]
    fn gaussian_is_symmetric_and_peaked() {
        let g = Filter::<2>::gaussian(2, 1.0);
        assert_eq!(g.size(), [5, 5]);
        assert_eq!(g.radius(), [2, 2]);
        let centre = *g.texel2(2, 2);
        assert!(g.as_slice().iter().all(|&w| w <= centre));
        assert!((g.texel2(0, 1) - g.texel2(4, 3)).abs() < 1e-15);
        // sampled and truncated: close to but not exactly 1
        let sum = g.weight_sum();
        assert!(sum < 1.0 && sum > 0.9);
        assert!((g.normalized().weight_sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn gaussian_in_one_and_three_dimensions() {
        let line = Filter::<1>::gaussian(1, 1.0);
        assert_eq!(line.size(), [3]);
        assert!((line[[1]] - 1.0 / (2.0 * std::f64::consts::PI).sqrt()).abs() < 1e-12);
        assert!((line[[0]] - line[[2]]).abs() < 1e-15);

        let cube = Filter::<3>::gaussian(1, 1.0);
        assert_eq!(cube.size(), [3, 3, 3]);
        let centre = cube[[1, 1, 1]];
        assert!((centre - 1.0 / (2.0 * std::f64::consts::PI).powf(1.5)).abs() < 1e-12);
        assert!(cube.as_slice().iter().all(|&w| w <= centre));
        // separable kernel: the 3D weights sum to the cube of the 1D sum
        assert!((cube.weight_sum() - line.weight_sum().powi(3)).abs() < 1e-12);
    }

    #[test]
    fn box_filter_on_constant_keeps_values() {
        let mut img = Image::<2, f32>::new([8, 6]);
        img.fill(3.25);
        let out = img.apply_filter(&Filter::average(1));
        assert_eq!(out.size(), [8, 6]);
        for &v in out.as_slice() {
            assert!((v - 3.25).abs() < 1e-5);
        }
    }

    #[test]
    fn border_is_passed_through() {
        let data: Vec<f32> = (0..25).map(|v| (v * v) as f32).collect();
        let img = Image::from_data(ImageData::from_vec(data, [5, 5]).expect("ok"));
        let out = img.apply_filter(&Filter::average(1));

        for c in img.coords() {
            let on_border = c[0] == 0 || c[1] == 0 || c[0] == 4 || c[1] == 4;
            if on_border {
                assert_eq!(out[c], img[c], "border texel {:?} must be copied", c);
            }
        }

        // interior texel (1, 1): mean of the 3x3 block at the corner
        let expected: f32 = [0, 1, 2, 5, 6, 7, 10, 11, 12]
            .iter()
            .map(|&v| (v * v) as f32)
            .sum::<f32>()
            / 9.0;
        assert!((out[[1, 1]] - expected).abs() < 1e-3);
    }

    #[test]
    fn kernel_larger_than_image_copies_everything() {
        let data: Vec<u8> = (0..9).collect();
        let img = Image::from_data(ImageData::from_vec(data, [3, 3]).expect("ok"));
        let out = img.apply_filter(&Filter::average(2));
        assert_eq!(out, img);
    }

    #[test]
    fn filters_1d_and_3d() {
        let line = Image::from_data(ImageData::from_vec(vec![0.0f64, 3.0, 6.0, 9.0], [4]).expect("ok"));
        let out = line.apply_filter(&Filter::average(1));
        assert_eq!(out[[0]], 0.0);
        assert!((out[[1]] - 3.0).abs() < 1e-12);
        assert!((out[[2]] - 6.0).abs() < 1e-12);
        assert_eq!(out[[3]], 9.0);

        let mut vol = Image::<3, f32>::new([3, 3, 3]);
        *vol.texel3_mut(1, 1, 1) = 27.0;
        let out = vol.apply_filter(&Filter::average(1));
        assert!((out[[1, 1, 1]] - 1.0).abs() < 1e-5);
        assert_eq!(out[[0, 0, 0]], 0.0);
    }
}
