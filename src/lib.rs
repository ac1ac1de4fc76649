//! texvis - N-dimensional images, convolution filters and Vulkan textures
//!
//! Images of any dimension share one strided storage type. Two-dimensional images
//! load and save through the `image` crate, and 1D to 3D images upload to a
//! [`TextureDevice`]. A small glyph atlas and string batcher covers 3D text labels.

mod gpu;

mod raster;

mod text3d;

mod texture;

mod utils;

pub use gpu::{Gpu, VulkanDevice, VulkanDeviceConfig};
pub use raster::{
    Accumulate, Coords, ExternalImage, Filter, Image, ImageData, Texel, TexelBuffer, Wide,
};
pub use text3d::{
    DrawCommand, GlyphAtlas, GlyphRasterizer, StringRange, Strings3D, Strings3DConfig,
};
pub use texture::{
    ComponentType, DeviceFormat, Filtering, HostDevice, PixelLayout, Texture, TextureDevice,
    TextureHandle, TextureParams, TextureTarget, Upload, Wrapping, unpack_alignment,
};
pub use utils::error::ImagingError;

pub mod glyph {
    pub use crate::text3d::{
        ATLAS_HEIGHT, ATLAS_WIDTH, GLYPH_ADVANCE, GLYPH_CELL, GLYPH_ROWS, GLYPHS_PER_ROW,
        VERTICES_PER_CHAR,
    };
}

pub use raster::coord;
pub use utils::math;
