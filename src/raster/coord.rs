/// Per-axis cumulative strides: `strides[i]` is the element count spanned by axes `0..=i`.
///
/// Axis 0 varies fastest, so the last entry is the total element count.
pub fn cumulative_strides<const N: usize>(size: &[usize; N]) -> [usize; N] {
    let mut strides = [0; N];
    let mut sub = 1;
    for i in 0..N {
        sub *= size[i];
        strides[i] = sub;
    }
    strides
}

/// Linear offset of `coord` given cumulative strides
#[inline]
pub fn linear_offset<const N: usize>(coord: &[usize; N], strides: &[usize; N]) -> usize {
    let mut off = 0;
    for i in 0..N {
        off += if i == 0 {
            coord[0]
        } else {
            coord[i] * strides[i - 1]
        };
    }
    off
}

/// Element count of an extent
pub fn volume<const N: usize>(size: &[usize; N]) -> usize {
    size.iter().product()
}

/// Mixed-radix increment with axis 0 as the least significant digit.
/// Returns false once every coordinate has wrapped.
#[inline]
pub fn increment<const N: usize>(coord: &mut [usize; N], size: &[usize; N]) -> bool {
    for i in 0..N {
        coord[i] += 1;
        if coord[i] < size[i] {
            return true;
        }
        coord[i] = 0;
    }
    false
}

/// Iterates every coordinate of an extent in storage order.
#[derive(Clone, Debug)]
pub struct Coords<const N: usize> {
    size: [usize; N],
    next: Option<[usize; N]>,
}

impl<const N: usize> Coords<N> {
    pub fn new(size: [usize; N]) -> Self {
        let next = if N == 0 || size.contains(&0) {
            None
        } else {
            Some([0; N])
        };
        Self { size, next }
    }
}

impl<const N: usize> Iterator for Coords<N> {
    type Item = [usize; N];

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let mut advanced = current;
        self.next = if increment(&mut advanced, &self.size) {
            Some(advanced)
        } else {
            None
        };
        Some(current)
    }
}
