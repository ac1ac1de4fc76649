use vulkanalia::vk;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Filtering {
    Nearest,
    Linear,
}

impl Filtering {
    pub fn to_vk(self) -> vk::Filter {
        match self {
            Filtering::Nearest => vk::Filter::NEAREST,
            Filtering::Linear => vk::Filter::LINEAR,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wrapping {
    ClampToEdge,
    ClampToBorder,
    Repeat,
    MirroredRepeat,
}

impl Wrapping {
    pub fn to_vk(self) -> vk::SamplerAddressMode {
        match self {
            Wrapping::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
            Wrapping::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
            Wrapping::Repeat => vk::SamplerAddressMode::REPEAT,
            Wrapping::MirroredRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
        }
    }
}

/// Sampling state of a device texture. Filtering applies to both
/// minification and magnification, wrapping to every axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureParams {
    pub filtering: Filtering,
    pub wrapping: Wrapping,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            filtering: Filtering::Linear,
            wrapping: Wrapping::ClampToEdge,
        }
    }
}
