use crate::raster::Image;
use crate::texture::{ComponentType, Filtering, Texture, TextureDevice};
use crate::utils::error::ImagingError;

/// Side of the square cell each glyph is drawn into, in pixels
pub const GLYPH_CELL: usize = 32;
/// Horizontal advance between consecutive characters, in pixels
pub const GLYPH_ADVANCE: usize = 18;
pub const ATLAS_WIDTH: usize = 512;
pub const ATLAS_HEIGHT: usize = 256;
pub const GLYPHS_PER_ROW: usize = ATLAS_WIDTH / GLYPH_CELL;
pub const GLYPH_ROWS: usize = ATLAS_HEIGHT / GLYPH_CELL;

/// Produces a coverage bitmap for one character.
///
/// Bitmaps are at most [`GLYPH_CELL`] square with row 0 at the top; larger
/// bitmaps are clipped. `None` leaves the cell blank.
pub trait GlyphRasterizer {
    fn rasterize(&mut self, c: char) -> Option<Image<'static, 2, u8>>;
}

impl<F> GlyphRasterizer for F
where
    F: FnMut(char) -> Option<Image<'static, 2, u8>>,
{
    fn rasterize(&mut self, c: char) -> Option<Image<'static, 2, u8>> {
        self(c)
    }
}

/// Single-channel atlas holding ASCII 0..128, 16 cells per row.
///
/// The image has a lower-left origin: cell `i` starts at pixel
/// `((i % 16) * 32, (i / 16) * 32)` and glyphs are stored upright.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    image: Image<'static, 2, u8>,
}

impl GlyphAtlas {
    pub fn build<R: GlyphRasterizer + ?Sized>(rasterizer: &mut R) -> Self {
        let mut image = Image::new([ATLAS_WIDTH, ATLAS_HEIGHT]);

        for code in 0..(GLYPHS_PER_ROW * GLYPH_ROWS) as u32 {
            let Some(c) = char::from_u32(code) else {
                continue;
            };
            let Some(glyph) = rasterizer.rasterize(c) else {
                continue;
            };

            let [cx, cy] = Self::cell_origin(c);
            let [w, h] = glyph.size();
            for y in 0..h.min(GLYPH_CELL) {
                // top glyph row lands on the top row of the cell
                let ay = cy + GLYPH_CELL - 1 - y;
                for x in 0..w.min(GLYPH_CELL) {
                    *image.texel2_mut(cx + x, ay) = *glyph.texel2(x, y);
                }
            }
        }

        Self { image }
    }

    pub fn image(&self) -> &Image<'static, 2, u8> {
        &self.image
    }

    pub fn into_image(self) -> Image<'static, 2, u8> {
        self.image
    }

    /// Atlas slot of `c`; characters outside the atlas use `?`
    pub fn glyph_index(c: char) -> usize {
        let code = c as usize;
        if code < GLYPHS_PER_ROW * GLYPH_ROWS {
            code
        } else {
            '?' as usize
        }
    }

    /// Lower-left pixel of the cell holding `c`
    pub fn cell_origin(c: char) -> [usize; 2] {
        let index = Self::glyph_index(c);
        [
            (index % GLYPHS_PER_ROW) * GLYPH_CELL,
            (index / GLYPHS_PER_ROW) * GLYPH_CELL,
        ]
    }

    /// Texture coordinates `[u0, v0, u1, v1]` of the advance-wide part of the cell
    pub fn uv_rect(c: char) -> [f32; 4] {
        let [x, y] = Self::cell_origin(c);
        let u0 = x as f32 / ATLAS_WIDTH as f32;
        let v0 = y as f32 / ATLAS_HEIGHT as f32;
        [
            u0,
            v0,
            u0 + GLYPH_ADVANCE as f32 / ATLAS_WIDTH as f32,
            v0 + GLYPH_CELL as f32 / ATLAS_HEIGHT as f32,
        ]
    }

    /// Upload the atlas as a luminance texture with linear filtering
    pub fn into_texture(
        self,
        device: &mut dyn TextureDevice,
    ) -> Result<Texture<'static, 2, u8>, ImagingError> {
        let mut texture = Texture::from_image(device, self.image, ComponentType::U8)?;
        texture.set_filtering(device, Filtering::Linear)?;
        texture.update(device)?;
        Ok(texture)
    }
}

#[cfg(test)]
mod tests {
    use super::{ATLAS_HEIGHT, ATLAS_WIDTH, GLYPH_CELL, GlyphAtlas};
    use crate::raster::{Image, ImageData};
    use crate::texture::{HostDevice, PixelLayout};

    // 2x3 glyph whose top row is 200, other rows 100
    fn marker(c: char) -> Option<Image<'static, 2, u8>> {
        if c != 'A' {
            return None;
        }
        let data = vec![200, 200, 100, 100, 100, 100];
        Some(Image::from_data(ImageData::from_vec(data, [2, 3]).expect("sized")))
    }

    #[test]
    fn cells_follow_character_codes() {
        // 'A' = 65 => column 1, row 4
        assert_eq!(GlyphAtlas::cell_origin('A'), [32, 128]);
        assert_eq!(GlyphAtlas::cell_origin('\0'), [0, 0]);
        assert_eq!(GlyphAtlas::cell_origin('é'), GlyphAtlas::cell_origin('?'));
        assert_eq!(GlyphAtlas::glyph_index('\u{7f}'), 127);
    }

    #[test]
    fn glyph_is_blitted_upright_into_its_cell() {
        let atlas = GlyphAtlas::build(&mut marker);
        let image = atlas.image();
        assert_eq!(image.size(), [ATLAS_WIDTH, ATLAS_HEIGHT]);

        let top = 128 + GLYPH_CELL - 1;
        assert_eq!(*image.texel2(32, top), 200);
        assert_eq!(*image.texel2(33, top), 200);
        assert_eq!(*image.texel2(32, top - 1), 100);
        assert_eq!(*image.texel2(33, top - 2), 100);
        assert_eq!(*image.texel2(34, top), 0);

        let lit = image.as_slice().iter().filter(|&&v| v != 0).count();
        assert_eq!(lit, 6);
    }

    #[test]
    fn uv_rect_covers_the_advance() {
        let [u0, v0, u1, v1] = GlyphAtlas::uv_rect('A');
        assert_eq!(u0, 32.0 / 512.0);
        assert_eq!(v0, 0.5);
        assert_eq!(u1, 50.0 / 512.0);
        assert_eq!(v1, 0.625);
    }

    #[test]
    fn atlas_uploads_as_luminance() {
        let mut dev = HostDevice::new();
        let texture = GlyphAtlas::build(&mut marker)
            .into_texture(&mut dev)
            .expect("upload");
        let h = texture.handle().expect("handle");
        assert_eq!(dev.format(h).map(|f| f.layout), Some(PixelLayout::Luminance));
        assert_eq!(dev.texture_bytes(h).map(|b| b.len()), Some(ATLAS_WIDTH * ATLAS_HEIGHT));
    }
}
