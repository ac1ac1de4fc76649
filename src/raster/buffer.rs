use std::ops::{Deref, DerefMut};

/// Backing memory of an image: either owned, or borrowed from someone else
/// (typically the decoder's own pixel buffer). Borrowed memory is never freed here.
#[derive(Debug)]
pub enum TexelBuffer<'a, T> {
    Owned(Vec<T>),
    Borrowed(&'a mut [T]),
}

impl<'a, T> TexelBuffer<'a, T> {
    pub fn is_owned(&self) -> bool {
        matches!(self, TexelBuffer::Owned(_))
    }
}

impl<T: Clone> TexelBuffer<'_, T> {
    /// Deep copy into an owned buffer
    pub fn to_owned_buffer(&self) -> TexelBuffer<'static, T> {
        TexelBuffer::Owned(self.deref().to_vec())
    }
}

impl<T> Default for TexelBuffer<'_, T> {
    fn default() -> Self {
        TexelBuffer::Owned(Vec::new())
    }
}

impl<T> Deref for TexelBuffer<'_, T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        match self {
            TexelBuffer::Owned(v) => v,
            TexelBuffer::Borrowed(s) => s,
        }
    }
}

impl<T> DerefMut for TexelBuffer<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            TexelBuffer::Owned(v) => v,
            TexelBuffer::Borrowed(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TexelBuffer;

    #[test]
    fn borrowed_writes_reach_the_source() {
        let mut backing = vec![0u8; 4];
        {
            let mut buf = TexelBuffer::Borrowed(&mut backing[..]);
            assert!(!buf.is_owned());
            buf[2] = 9;
        }
        assert_eq!(backing, vec![0, 0, 9, 0]);
    }

    #[test]
    fn deep_copy_is_owned() {
        let mut backing = vec![1u16, 2, 3];
        let buf = TexelBuffer::Borrowed(&mut backing[..]);
        let copy = buf.to_owned_buffer();
        assert!(copy.is_owned());
        assert_eq!(&*copy, &[1, 2, 3]);
    }
}
