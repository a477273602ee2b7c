//! Backend Type Mapping
//!
//! The engine-level pixel formats and sampler modes are descriptive; a GPU
//! backend realizes them through these conversions. Anything without an
//! exact device-side equivalent widens (24-bit RGB has no modern GPU layout
//! and maps to RGBA).

use crate::resources::{Compression, Filtering, PixelFormat, WrapMode};

/// Device texture format for a pixel format / compression pair.
#[must_use]
pub fn texture_format(format: PixelFormat, compression: Compression) -> wgpu::TextureFormat {
    match compression {
        Compression::Dxt1 => return wgpu::TextureFormat::Bc1RgbaUnorm,
        Compression::Dxt5 => return wgpu::TextureFormat::Bc3RgbaUnorm,
        Compression::Etc2 => return wgpu::TextureFormat::Etc2Rgb8Unorm,
        Compression::None => {}
    }
    match format {
        PixelFormat::R8 => wgpu::TextureFormat::R8Unorm,
        // Widened: no 24-bit device layout.
        PixelFormat::Rgb8 | PixelFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        PixelFormat::Rgb10A2 => wgpu::TextureFormat::Rgb10a2Unorm,
        PixelFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        PixelFormat::Depth => wgpu::TextureFormat::Depth32Float,
        PixelFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
    }
}

/// Device address mode for a wrap mode.
#[must_use]
pub fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::Clamp => wgpu::AddressMode::ClampToEdge,
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::Mirrored => wgpu::AddressMode::MirrorRepeat,
    }
}

/// Device filter mode for the minification/magnification filter.
#[must_use]
pub fn filter_mode(filtering: Filtering) -> wgpu::FilterMode {
    match filtering {
        Filtering::None => wgpu::FilterMode::Nearest,
        Filtering::Bilinear | Filtering::Trilinear => wgpu::FilterMode::Linear,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_overrides_pixel_format() {
        assert_eq!(
            texture_format(PixelFormat::Rgba8, Compression::Dxt5),
            wgpu::TextureFormat::Bc3RgbaUnorm
        );
        assert_eq!(
            texture_format(PixelFormat::Rgba8, Compression::None),
            wgpu::TextureFormat::Rgba8Unorm
        );
    }
}
