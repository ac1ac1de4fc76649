use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Incompatible texel type: image has {actual} bytes per pixel, texel is {expected} bytes")]
    IncompatibleTexel { expected: usize, actual: usize },

    #[error("Size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Invalid axis {axis} for an image of dimension {dim}")]
    InvalidAxis { axis: usize, dim: usize },

    #[error("Rotation around axis {axis} not supported for an image of dimension {dim}")]
    UnsupportedRotation { axis: i32, dim: usize },

    #[error("Cannot save texels of {0} bytes")]
    UnsupportedSaveFormat(usize),

    #[error("Unsupported device format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Unknown texture handle {0}")]
    UnknownTexture(u64),

    #[error("Vulkan error: {0}")]
    Vulkan(String),
}

impl From<image::ImageError> for ImagingError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => ImagingError::Io(io),
            image::ImageError::Encoding(enc) => ImagingError::Encode(enc.to_string()),
            other => ImagingError::Decode(other.to_string()),
        }
    }
}

// Convert vk::Result (Vulkan return codes) into ImagingError
impl From<vulkanalia::vk::Result> for ImagingError {
    fn from(r: vulkanalia::vk::Result) -> Self {
        ImagingError::Vulkan(format!("vk::Result: {:?}", r))
    }
}

impl From<vulkanalia::vk::ErrorCode> for ImagingError {
    fn from(c: vulkanalia::vk::ErrorCode) -> Self {
        ImagingError::Vulkan(format!("vk::ErrorCode: {:?}", c))
    }
}
