use vulkanalia::vk;

use crate::utils::error::ImagingError;

/// Numeric type of one texel component
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
}

impl ComponentType {
    pub fn bytes(&self) -> usize {
        match self {
            ComponentType::U8 | ComponentType::I8 => 1,
            ComponentType::U16 | ComponentType::I16 => 2,
            ComponentType::U32 | ComponentType::I32 | ComponentType::F32 => 4,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ComponentType::F32)
    }
}

/// How components are presented to shaders
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Luminance,
    LuminanceAlpha,
    Rgb,
    Rgba,
}

impl PixelLayout {
    pub fn from_components(components: usize) -> Self {
        match components {
            1 => PixelLayout::Luminance,
            2 => PixelLayout::LuminanceAlpha,
            3 => PixelLayout::Rgb,
            _ => PixelLayout::Rgba,
        }
    }

    pub fn components(&self) -> usize {
        match self {
            PixelLayout::Luminance => 1,
            PixelLayout::LuminanceAlpha => 2,
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }

    /// Luminance formats are stored as R / RG and expanded to grey by swizzle
    pub fn swizzle(&self) -> vk::ComponentMapping {
        use vk::ComponentSwizzle as S;
        match self {
            PixelLayout::Luminance => vk::ComponentMapping {
                r: S::R,
                g: S::R,
                b: S::R,
                a: S::ONE,
            },
            PixelLayout::LuminanceAlpha => vk::ComponentMapping {
                r: S::R,
                g: S::R,
                b: S::R,
                a: S::G,
            },
            // RGB may be stored in a four component format
            PixelLayout::Rgb => vk::ComponentMapping {
                r: S::IDENTITY,
                g: S::IDENTITY,
                b: S::IDENTITY,
                a: S::ONE,
            },
            PixelLayout::Rgba => vk::ComponentMapping {
                r: S::IDENTITY,
                g: S::IDENTITY,
                b: S::IDENTITY,
                a: S::IDENTITY,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Tex1D,
    Tex2D,
    Tex3D,
}

impl TextureTarget {
    /// None above three dimensions: no device texture exists for those
    pub fn for_dimension(dim: usize) -> Option<Self> {
        match dim {
            1 => Some(TextureTarget::Tex1D),
            2 => Some(TextureTarget::Tex2D),
            3 => Some(TextureTarget::Tex3D),
            _ => None,
        }
    }

    pub fn image_type(&self) -> vk::ImageType {
        match self {
            TextureTarget::Tex1D => vk::ImageType::_1D,
            TextureTarget::Tex2D => vk::ImageType::_2D,
            TextureTarget::Tex3D => vk::ImageType::_3D,
        }
    }

    pub fn view_type(&self) -> vk::ImageViewType {
        match self {
            TextureTarget::Tex1D => vk::ImageViewType::_1D,
            TextureTarget::Tex2D => vk::ImageViewType::_2D,
            TextureTarget::Tex3D => vk::ImageViewType::_3D,
        }
    }
}

/// Row alignment for an upload: the largest of 4, 2, 1 dividing the row byte width
pub fn unpack_alignment(row_bytes: usize) -> usize {
    if row_bytes % 4 == 0 {
        4
    } else if row_bytes % 2 == 0 {
        2
    } else {
        1
    }
}

/// Device-side description of a texel, derived only from its byte size and component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceFormat {
    pub layout: PixelLayout,
    pub component: ComponentType,
    pub format: vk::Format,
}

impl DeviceFormat {
    pub fn derive(texel_bytes: usize, component: ComponentType) -> Result<Self, ImagingError> {
        let comp_bytes = component.bytes();
        let components = texel_bytes / comp_bytes;
        if components == 0 || components > 4 || texel_bytes % comp_bytes != 0 {
            return Err(ImagingError::UnsupportedFormat(format!(
                "{} byte texels of {:?} components",
                texel_bytes, component
            )));
        }

        let layout = PixelLayout::from_components(components);
        Ok(Self {
            layout,
            component,
            format: internal_format(layout, component),
        })
    }

    pub fn texel_bytes(&self) -> usize {
        self.layout.components() * self.component.bytes()
    }

    /// Four component format able to hold RGB texels when the three component
    /// one cannot be sampled. The RGB swizzle forces alpha to one.
    pub fn with_alpha(&self) -> Option<vk::Format> {
        (self.layout == PixelLayout::Rgb)
            .then(|| internal_format(PixelLayout::Rgba, self.component))
    }
}

/// Internal format. Buffer-to-image copies do no conversion, so the format must
/// match the component type; float data gets the full 32-bit float formats.
fn internal_format(layout: PixelLayout, component: ComponentType) -> vk::Format {
    use ComponentType as C;
    use vk::Format as F;
    let table: [vk::Format; 4] = match component {
        C::U8 => [F::R8_UNORM, F::R8G8_UNORM, F::R8G8B8_UNORM, F::R8G8B8A8_UNORM],
        C::I8 => [F::R8_SNORM, F::R8G8_SNORM, F::R8G8B8_SNORM, F::R8G8B8A8_SNORM],
        C::U16 => [
            F::R16_UNORM,
            F::R16G16_UNORM,
            F::R16G16B16_UNORM,
            F::R16G16B16A16_UNORM,
        ],
        C::I16 => [
            F::R16_SNORM,
            F::R16G16_SNORM,
            F::R16G16B16_SNORM,
            F::R16G16B16A16_SNORM,
        ],
        C::U32 => [
            F::R32_UINT,
            F::R32G32_UINT,
            F::R32G32B32_UINT,
            F::R32G32B32A32_UINT,
        ],
        C::I32 => [
            F::R32_SINT,
            F::R32G32_SINT,
            F::R32G32B32_SINT,
            F::R32G32B32A32_SINT,
        ],
        C::F32 => [
            F::R32_SFLOAT,
            F::R32G32_SFLOAT,
            F::R32G32B32_SFLOAT,
            F::R32G32B32A32_SFLOAT,
        ],
    };
    table[layout.components() - 1]
}

#[cfg(test)]
mod tests {
    use vulkanalia::vk;

    use super::{ComponentType, DeviceFormat, PixelLayout, TextureTarget, unpack_alignment};

    #[test]
    fn alignment_from_row_bytes() {
        assert_eq!(unpack_alignment(12), 4);
        assert_eq!(unpack_alignment(6), 2);
        assert_eq!(unpack_alignment(3), 1);
        assert_eq!(unpack_alignment(0), 4);
    }

    #[test]
    fn layout_from_component_count() {
        let cases = [
            (1, ComponentType::U8, PixelLayout::Luminance, vk::Format::R8_UNORM),
            (2, ComponentType::U8, PixelLayout::LuminanceAlpha, vk::Format::R8G8_UNORM),
            (3, ComponentType::U8, PixelLayout::Rgb, vk::Format::R8G8B8_UNORM),
            (4, ComponentType::U8, PixelLayout::Rgba, vk::Format::R8G8B8A8_UNORM),
            (2, ComponentType::U16, PixelLayout::Luminance, vk::Format::R16_UNORM),
            (8, ComponentType::U16, PixelLayout::Rgba, vk::Format::R16G16B16A16_UNORM),
            (4, ComponentType::F32, PixelLayout::Luminance, vk::Format::R32_SFLOAT),
            (12, ComponentType::F32, PixelLayout::Rgb, vk::Format::R32G32B32_SFLOAT),
            (16, ComponentType::F32, PixelLayout::Rgba, vk::Format::R32G32B32A32_SFLOAT),
            (8, ComponentType::I32, PixelLayout::LuminanceAlpha, vk::Format::R32G32_SINT),
        ];
        for (bytes, component, layout, format) in cases {
            let f = DeviceFormat::derive(bytes, component).expect("supported");
            assert_eq!(f.layout, layout, "{} bytes of {:?}", bytes, component);
            assert_eq!(f.format, format, "{} bytes of {:?}", bytes, component);
            assert_eq!(f.texel_bytes(), bytes);
        }
    }

    #[test]
    fn format_is_a_pure_function() {
        let a = DeviceFormat::derive(4, ComponentType::U8).expect("supported");
        let b = DeviceFormat::derive(4, ComponentType::U8).expect("supported");
        assert_eq!(a, b);
        assert_ne!(a, DeviceFormat::derive(4, ComponentType::F32).expect("supported"));
    }

    #[test]
    fn impossible_formats_rejected() {
        assert!(DeviceFormat::derive(2, ComponentType::F32).is_err());
        assert!(DeviceFormat::derive(6, ComponentType::U32).is_err());
        assert!(DeviceFormat::derive(5, ComponentType::U8).is_err());
    }

    #[test]
    fn luminance_swizzles_red_to_grey() {
        let m = PixelLayout::Luminance.swizzle();
        assert_eq!(m.g, vk::ComponentSwizzle::R);
        assert_eq!(m.a, vk::ComponentSwizzle::ONE);
        assert_eq!(PixelLayout::LuminanceAlpha.swizzle().a, vk::ComponentSwizzle::G);
    }

    #[test]
    fn rgb_widens_to_opaque_rgba() {
        let rgb = DeviceFormat::derive(3, ComponentType::U8).expect("supported");
        assert_eq!(rgb.with_alpha(), Some(vk::Format::R8G8B8A8_UNORM));
        assert_eq!(PixelLayout::Rgb.swizzle().a, vk::ComponentSwizzle::ONE);
        assert_eq!(PixelLayout::Rgba.swizzle().a, vk::ComponentSwizzle::IDENTITY);

        let rgb_f = DeviceFormat::derive(12, ComponentType::F32).expect("supported");
        assert_eq!(rgb_f.with_alpha(), Some(vk::Format::R32G32B32A32_SFLOAT));
        let rgba = DeviceFormat::derive(4, ComponentType::U8).expect("supported");
        assert_eq!(rgba.with_alpha(), None);
    }

    #[test]
    fn targets_stop_at_three_dimensions() {
        assert_eq!(TextureTarget::for_dimension(1), Some(TextureTarget::Tex1D));
        assert_eq!(TextureTarget::for_dimension(3), Some(TextureTarget::Tex3D));
        assert_eq!(TextureTarget::for_dimension(4), None);
    }
}
