mod atlas;
mod strings;

pub use atlas::{
    ATLAS_HEIGHT, ATLAS_WIDTH, GLYPH_ADVANCE, GLYPH_CELL, GLYPH_ROWS, GLYPHS_PER_ROW, GlyphAtlas,
    GlyphRasterizer,
};
pub use strings::{DrawCommand, StringRange, Strings3D, Strings3DConfig, VERTICES_PER_CHAR};
