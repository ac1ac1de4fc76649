use super::atlas::{GLYPH_ADVANCE, GLYPH_CELL, GlyphAtlas};

pub const VERTICES_PER_CHAR: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Strings3DConfig {
    /// Factor applied to glyph quads (in atlas pixels) when drawing
    pub scale: f32,
}

impl Default for Strings3DConfig {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

/// Vertices of one string inside the batch built by [`Strings3D::build_batch`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StringRange {
    pub first_vertex: u32,
    pub vertex_count: u32,
}

/// Everything a renderer needs to draw one string as a billboard
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    pub range: StringRange,
    pub translate: [f32; 3],
    pub color: [f32; 3],
    pub scale: f32,
}

/// Pool of strings laid out against a [`GlyphAtlas`].
///
/// Each character becomes two triangles of `[x, y, u, v]` vertices, starting
/// at x = 0 and advancing by [`GLYPH_ADVANCE`]. Strings are packed into one
/// vertex stream in insertion order.
#[derive(Clone, Debug)]
pub struct Strings3D {
    strings: Vec<String>,
    ranges: Vec<StringRange>,
    positioned: Vec<(usize, [f32; 3])>,
    char_count: usize,
    scale: f32,
}

impl Strings3D {
    pub fn new(config: Strings3DConfig) -> Self {
        Self {
            strings: Vec::new(),
            ranges: Vec::new(),
            positioned: Vec::new(),
            char_count: 0,
            scale: config.scale,
        }
    }

    /// Add a string to the pool, returning its id for [`Strings3D::draw`]
    pub fn add_string(&mut self, s: &str) -> usize {
        let chars = s.chars().count();
        self.ranges.push(StringRange {
            first_vertex: (self.char_count * VERTICES_PER_CHAR) as u32,
            vertex_count: (chars * VERTICES_PER_CHAR) as u32,
        });
        self.char_count += chars;
        self.strings.push(s.to_string());
        self.strings.len() - 1
    }

    /// Add a string drawn at `pos` by [`Strings3D::draw_commands`]
    pub fn add_string_at(&mut self, s: &str, pos: [f32; 3]) -> usize {
        let id = self.add_string(s);
        self.positioned.push((id, pos));
        id
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn string(&self, id: usize) -> Option<&str> {
        self.strings.get(id).map(String::as_str)
    }

    pub fn range(&self, id: usize) -> Option<StringRange> {
        self.ranges.get(id).copied()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    /// The vertex stream for every string, ready to upload in one go
    pub fn build_batch(&self) -> Vec<[f32; 4]> {
        let mut vertices = Vec::with_capacity(self.char_count * VERTICES_PER_CHAR);
        for s in &self.strings {
            push_string(&mut vertices, s);
        }
        vertices
    }

    pub fn draw(&self, id: usize, pos: [f32; 3], color: [f32; 3]) -> Option<DrawCommand> {
        self.range(id).map(|range| DrawCommand {
            range,
            translate: pos,
            color,
            scale: self.scale,
        })
    }

    /// Draw commands for every string added with a position
    pub fn draw_commands(&self, color: [f32; 3]) -> Vec<DrawCommand> {
        self.positioned
            .iter()
            .filter_map(|&(id, pos)| self.draw(id, pos, color))
            .collect()
    }
}

impl Default for Strings3D {
    fn default() -> Self {
        Self::new(Strings3DConfig::default())
    }
}

fn push_string(vertices: &mut Vec<[f32; 4]>, s: &str) {
    let height = GLYPH_CELL as f32;
    for (i, c) in s.chars().enumerate() {
        let x0 = (i * GLYPH_ADVANCE) as f32;
        let x1 = x0 + GLYPH_ADVANCE as f32;
        let [u0, v0, u1, v1] = GlyphAtlas::uv_rect(c);

        vertices.extend_from_slice(&[
            [x0, 0.0, u0, v0],
            [x1, 0.0, u1, v0],
            [x1, height, u1, v1],
            [x0, 0.0, u0, v0],
            [x1, height, u1, v1],
            [x0, height, u0, v1],
        ]);
    }
}
