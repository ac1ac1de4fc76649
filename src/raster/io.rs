use std::path::Path;

use image::{DynamicImage, ExtendedColorType};

use crate::utils::error::ImagingError;

use super::data::ImageData;
use super::image::Image;
use super::texel::Texel;

/// Decode a file and flip it so row 0 is the bottom row (lower-left origin).
fn decode_lower_left(path: &Path) -> Result<DynamicImage, ImagingError> {
    let decoded = image::open(path)?;
    Ok(decoded.flipv())
}

fn check_depth<T>(decoded: &DynamicImage, path: &Path) -> Result<(), ImagingError> {
    let bpp = decoded.color().bytes_per_pixel() as usize;
    let expected = std::mem::size_of::<T>();
    if bpp != expected {
        log::warn!(
            "{}: {} bytes per pixel does not match texel size {}",
            path.display(),
            bpp,
            expected
        );
        return Err(ImagingError::IncompatibleTexel {
            expected,
            actual: bpp,
        });
    }
    Ok(())
}

fn dims(decoded: &DynamicImage) -> [usize; 2] {
    [decoded.width() as usize, decoded.height() as usize]
}

impl<T: Texel> Image<'_, 2, T> {
    /// Decode `path` into a new owned image.
    ///
    /// The decoded pixel size must equal `size_of::<T>()`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Image<'static, 2, T>, ImagingError> {
        let path = path.as_ref();
        let decoded = decode_lower_left(path)?;
        check_depth::<T>(&decoded, path)?;

        let texels: Vec<T> = bytemuck::pod_collect_to_vec(decoded.as_bytes());
        let data = ImageData::from_vec(texels, dims(&decoded))?;
        Ok(Image::from_data(data))
    }

    /// Replace the contents with the decoded file. On error `self` is left as it was.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ImagingError> {
        let loaded = Image::<'static, 2, T>::from_file(path)?;
        self.replace_with(loaded);
        Ok(())
    }

    /// Decode pixels of type `S` (matching the file's pixel size) and convert each into a `T`.
    pub fn load_with<S: Texel>(
        &mut self,
        path: impl AsRef<Path>,
        mut convert: impl FnMut(&S) -> T,
    ) -> Result<(), ImagingError> {
        let path = path.as_ref();
        let decoded = decode_lower_left(path)?;
        check_depth::<S>(&decoded, path)?;

        let src: Vec<S> = bytemuck::pod_collect_to_vec(decoded.as_bytes());
        let texels = src.iter().map(&mut convert).collect();
        let data = ImageData::<'static, 2, T>::from_vec(texels, dims(&decoded))?;
        self.replace_with(Image::from_data(data));
        Ok(())
    }

    /// Encode to `path`, format chosen by extension.
    ///
    /// 1-byte texels are saved as 8-bit grey, 2-byte as 16-bit grey, 3 as RGB8, 4 as RGBA8.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ImagingError> {
        let color = match std::mem::size_of::<T>() {
            1 => ExtendedColorType::L8,
            2 => ExtendedColorType::L16,
            3 => ExtendedColorType::Rgb8,
            4 => ExtendedColorType::Rgba8,
            other => return Err(ImagingError::UnsupportedSaveFormat(other)),
        };

        // files are top-down
        let mut top_down = self.sub_image([0, 0], self.size());
        top_down.flip(2)?;

        let [w, h] = self.size();
        image::save_buffer(
            path.as_ref(),
            top_down.as_bytes(),
            w as u32,
            h as u32,
            color,
        )?;
        Ok(())
    }
}

/// A decoded image whose pixel memory stays with the decoder.
///
/// [`ExternalImage::texels`] hands out an [`ImageData`] that borrows that
/// memory instead of copying it; the view cannot outlive this value.
pub struct ExternalImage {
    decoded: DynamicImage,
}

impl ExternalImage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImagingError> {
        Ok(Self {
            decoded: decode_lower_left(path.as_ref())?,
        })
    }

    pub fn from_dynamic(decoded: DynamicImage) -> Self {
        Self { decoded }
    }

    pub fn width(&self) -> usize {
        self.decoded.width() as usize
    }

    pub fn height(&self) -> usize {
        self.decoded.height() as usize
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.decoded.color().bytes_per_pixel() as usize
    }

    fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        Some(match &mut self.decoded {
            DynamicImage::ImageLuma8(b) => &mut **b,
            DynamicImage::ImageLumaA8(b) => &mut **b,
            DynamicImage::ImageRgb8(b) => &mut **b,
            DynamicImage::ImageRgba8(b) => &mut **b,
            DynamicImage::ImageLuma16(b) => bytemuck::cast_slice_mut(&mut **b),
            DynamicImage::ImageLumaA16(b) => bytemuck::cast_slice_mut(&mut **b),
            DynamicImage::ImageRgb16(b) => bytemuck::cast_slice_mut(&mut **b),
            DynamicImage::ImageRgba16(b) => bytemuck::cast_slice_mut(&mut **b),
            DynamicImage::ImageRgb32F(b) => bytemuck::cast_slice_mut(&mut **b),
            DynamicImage::ImageRgba32F(b) => bytemuck::cast_slice_mut(&mut **b),
            _ => return None,
        })
    }

    /// Borrow the decoded pixels as a 2D texel array, without copying
    pub fn texels<T: Texel>(&mut self) -> Result<ImageData<'_, 2, T>, ImagingError> {
        let bpp = self.bytes_per_pixel();
        if bpp != std::mem::size_of::<T>() {
            return Err(ImagingError::IncompatibleTexel {
                expected: std::mem::size_of::<T>(),
                actual: bpp,
            });
        }
        let size = [self.width(), self.height()];
        let bytes = self
            .bytes_mut()
            .ok_or_else(|| ImagingError::Decode("unsupported decoded pixel layout".to_string()))?;
        let texels: &mut [T] = bytemuck::try_cast_slice_mut(bytes)
            .map_err(|e| ImagingError::Decode(format!("cannot view pixels as texels: {:?}", e)))?;
        ImageData::from_slice(texels, size)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::{GrayImage, RgbImage};

    use super::ExternalImage;
    use crate::raster::image::Image;
    use crate::utils::error::ImagingError;

    fn temp_png(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("texvis_{}_{}.png", name, std::process::id()))
    }

    #[test]
    fn load_puts_bottom_row_first() {
        let path = temp_png("origin");
        // top row 1 2, bottom row 3 4
        GrayImage::from_raw(2, 2, vec![1, 2, 3, 4])
            .expect("valid buffer")
            .save(&path)
            .expect("write png");

        let img = Image::<2, u8>::from_file(&path).expect("load");
        assert_eq!(img.size(), [2, 2]);
        assert_eq!(img.as_slice(), &[3, 4, 1, 2]);
        assert!(img.is_owned());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = temp_png("roundtrip");
        let data: Vec<[u8; 3]> = (0..12u8).map(|v| [v, v * 2, 255 - v]).collect();
        let img = Image::from_data(
            crate::raster::data::ImageData::from_vec(data, [4, 3]).expect("valid size"),
        );
        img.save(&path).expect("save");

        let mut back = Image::<2, [u8; 3]>::default();
        back.load(&path).expect("load");
        assert_eq!(back, img);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn sixteen_bit_round_trip() {
        let path = temp_png("sixteen");
        let data: Vec<u16> = vec![0, 1000, 40000, 65535];
        let img = Image::from_data(
            crate::raster::data::ImageData::from_vec(data, [2, 2]).expect("valid size"),
        );
        img.save(&path).expect("save");
        let back = Image::<2, u16>::from_file(&path).expect("load");
        assert_eq!(back, img);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn depth_mismatch_leaves_image_untouched() {
        let path = temp_png("mismatch");
        GrayImage::from_raw(2, 1, vec![5, 6])
            .expect("valid buffer")
            .save(&path)
            .expect("write png");

        let mut img = Image::<2, [u8; 3]>::new([1, 1]);
        img.fill([9, 9, 9]);
        let err = img.load(&path).expect_err("grey into rgb must fail");
        assert!(matches!(
            err,
            ImagingError::IncompatibleTexel {
                expected: 3,
                actual: 1
            }
        ));
        assert_eq!(img.size(), [1, 1]);
        assert_eq!(img.as_slice(), &[[9, 9, 9]]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut img = Image::<2, u8>::new([2, 2]);
        assert!(img.load(temp_png("does_not_exist")).is_err());
        assert_eq!(img.size(), [2, 2]);
    }

    #[test]
    fn load_with_converts_pixels() {
        let path = temp_png("convert");
        RgbImage::from_raw(2, 1, vec![10, 20, 30, 40, 50, 60])
            .expect("valid buffer")
            .save(&path)
            .expect("write png");

        let mut grey = Image::<2, f32>::default();
        grey.load_with(&path, |px: &[u8; 3]| {
            (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0
        })
        .expect("load");
        assert_eq!(grey.as_slice(), &[20.0, 50.0]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_with_rejects_source_of_wrong_depth() {
        let path = temp_png("convert_mismatch");
        GrayImage::from_raw(2, 1, vec![10, 20])
            .expect("valid buffer")
            .save(&path)
            .expect("write png");

        let mut grey = Image::<2, f32>::new([1, 1]);
        grey.fill(0.5);
        let mut calls = 0;
        let err = grey
            .load_with(&path, |px: &[u8; 3]| {
                calls += 1;
                px[0] as f32
            })
            .expect_err("grey file read as rgb must fail");
        assert!(matches!(
            err,
            ImagingError::IncompatibleTexel {
                expected: 3,
                actual: 1
            }
        ));
        assert_eq!(calls, 0);
        assert_eq!(grey.size(), [1, 1]);
        assert_eq!(grey.as_slice(), &[0.5]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn external_view_borrows_decoder_memory() {
        let path = temp_png("external");
        GrayImage::from_raw(3, 1, vec![7, 8, 9])
            .expect("valid buffer")
            .save(&path)
            .expect("write png");

        let mut ext = ExternalImage::open(&path).expect("decode");
        {
            let mut view = ext.texels::<u8>().expect("1-byte texels");
            assert!(!view.is_owned());
            assert_eq!(view.as_slice(), &[7, 8, 9]);
            *view.texel2_mut(1, 0) = 80;
        }
        let again = ext.texels::<u8>().expect("1-byte texels");
        assert_eq!(again.as_slice(), &[7, 80, 9]);
        assert!(ext.texels::<u16>().is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn save_rejects_wide_texels() {
        let img = Image::<2, [f32; 2]>::new([1, 1]);
        assert!(matches!(
            img.save(temp_png("wide")),
            Err(ImagingError::UnsupportedSaveFormat(8))
        ));
    }
}
