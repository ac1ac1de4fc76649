use std::ops::{AddAssign, Div, Mul};

use bytemuck::Pod;

/// Anything that can live in an image buffer: plain old data with a zero default.
pub trait Texel: Pod + Default {}

impl<T: Pod + Default> Texel for T {}

/// Texels that can be averaged or convolved.
///
/// Sums are carried in `Wide` (f64 per component) and narrowed back with `as`
/// semantics, so integer storage truncates toward zero and saturates.
pub trait Accumulate: Texel {
    type Wide: Copy
        + Default
        + AddAssign
        + Mul<f64, Output = Self::Wide>
        + Div<f64, Output = Self::Wide>;

    fn widen(self) -> Self::Wide;
    fn narrow(wide: Self::Wide) -> Self;
}

macro_rules! impl_accumulate_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl Accumulate for $t {
                type Wide = f64;

                #[inline]
                fn widen(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn narrow(wide: f64) -> Self {
                    wide as $t
                }
            }
        )*
    };
}

impl_accumulate_scalar!(u8, i8, u16, i16, u32, i32, f32, f64);

/// Per-component accumulator for multi-channel texels such as `[u8; 3]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wide<const C: usize>(pub [f64; C]);

impl<const C: usize> Default for Wide<C> {
    fn default() -> Self {
        Wide([0.0; C])
    }
}

impl<const C: usize> AddAssign for Wide<C> {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a += b;
        }
    }
}

impl<const C: usize> Mul<f64> for Wide<C> {
    type Output = Self;

    fn mul(mut self, rhs: f64) -> Self {
        for a in self.0.iter_mut() {
            *a *= rhs;
        }
        self
    }
}

impl<const C: usize> Div<f64> for Wide<C> {
    type Output = Self;

    fn div(mut self, rhs: f64) -> Self {
        for a in self.0.iter_mut() {
            *a /= rhs;
        }
        self
    }
}

impl<T, const C: usize> Accumulate for [T; C]
where
    T: Accumulate<Wide = f64>,
    [T; C]: Texel,
{
    type Wide = Wide<C>;

    fn widen(self) -> Wide<C> {
        Wide(self.map(|c| c.widen()))
    }

    fn narrow(wide: Wide<C>) -> Self {
        std::array::from_fn(|c| T::narrow(wide.0[c]))
    }
}
