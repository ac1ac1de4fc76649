mod buffer;
pub mod coord;
mod data;
mod filter;
mod image;
mod io;
mod resample;
mod texel;

pub use buffer::TexelBuffer;
pub use coord::Coords;
pub use data::ImageData;
pub use filter::Filter;
pub use self::image::Image;
pub use io::ExternalImage;
pub use texel::{Accumulate, Texel, Wide};
