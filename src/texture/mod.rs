mod device;
mod format;
mod host;
mod params;
mod texture;

pub use device::{TextureDevice, TextureHandle, Upload};
pub use format::{ComponentType, DeviceFormat, PixelLayout, TextureTarget, unpack_alignment};
pub use host::HostDevice;
pub use params::{Filtering, TextureParams, Wrapping};
pub use texture::Texture;
