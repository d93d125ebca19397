//! Pixel formats.
//!
//! These are plain data tables: a client-side pixel layout is a [`PixelFormat`] (which channels)
//! together with a [`PixelType`] (how each channel is encoded), while the GPU-side storage of a
//! texture is a [`TextureFormat`]. Compressed data is described by a [`CompressedPixelFormat`],
//! which knows its block dimensions. Only a restricted subset of formats, [`ImageFormat`], can be
//! used with image load / store.

use std::error;
use std::fmt;

/// Channels of a client-side pixel.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PixelFormat {
  /// Red channel, normalized or floating-point.
  Red,
  /// Red and green channels.
  RG,
  /// Red, green and blue channels.
  RGB,
  /// Red, green, blue and alpha channels.
  RGBA,
  /// Blue, green, red and alpha channels (desktop only).
  BGRA,
  /// Integral red channel.
  RedInteger,
  /// Integral red and green channels.
  RGInteger,
  /// Integral red, green and blue channels.
  RGBInteger,
  /// Integral red, green, blue and alpha channels.
  RGBAInteger,
  /// Depth component.
  DepthComponent,
  /// Stencil index.
  StencilIndex,
  /// Depth and stencil, packed.
  DepthStencil,
}

impl PixelFormat {
  /// Number of channels.
  pub fn channels(self) -> usize {
    match self {
      PixelFormat::Red
      | PixelFormat::RedInteger
      | PixelFormat::DepthComponent
      | PixelFormat::StencilIndex => 1,
      PixelFormat::RG | PixelFormat::RGInteger | PixelFormat::DepthStencil => 2,
      PixelFormat::RGB | PixelFormat::RGBInteger => 3,
      PixelFormat::RGBA | PixelFormat::BGRA | PixelFormat::RGBAInteger => 4,
    }
  }
}

/// Encoding of the channels of a client-side pixel.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PixelType {
  /// 8-bit unsigned.
  UnsignedByte,
  /// 8-bit signed.
  Byte,
  /// 16-bit unsigned.
  UnsignedShort,
  /// 16-bit signed.
  Short,
  /// 32-bit unsigned.
  UnsignedInt,
  /// 32-bit signed.
  Int,
  /// 16-bit floating-point.
  Half,
  /// 32-bit floating-point.
  Float,
  /// Packed 24-bit depth and 8-bit stencil.
  UnsignedInt248,
  /// Packed 10-bit RGB and 2-bit alpha, reversed.
  UnsignedInt2101010Rev,
  /// Packed 11-bit red and green, 10-bit blue floats, reversed.
  UnsignedInt10F11F11FRev,
  /// 32-bit float depth followed by a 24-bit padding and 8-bit stencil.
  Float32UnsignedInt248Rev,
}

impl PixelType {
  /// Whether the type packs every channel into a single value.
  pub fn is_packed(self) -> bool {
    matches!(
      self,
      PixelType::UnsignedInt248
        | PixelType::UnsignedInt2101010Rev
        | PixelType::UnsignedInt10F11F11FRev
        | PixelType::Float32UnsignedInt248Rev
    )
  }

  fn channel_size(self) -> usize {
    match self {
      PixelType::UnsignedByte | PixelType::Byte => 1,
      PixelType::UnsignedShort | PixelType::Short | PixelType::Half => 2,
      PixelType::UnsignedInt | PixelType::Int | PixelType::Float => 4,
      PixelType::UnsignedInt248
      | PixelType::UnsignedInt2101010Rev
      | PixelType::UnsignedInt10F11F11FRev => 4,
      PixelType::Float32UnsignedInt248Rev => 8,
    }
  }
}

/// Size in bytes of a single pixel of the given format and type.
pub fn pixel_size(format: PixelFormat, ty: PixelType) -> usize {
  if ty.is_packed() {
    ty.channel_size()
  } else {
    format.channels() * ty.channel_size()
  }
}

/// Compressed pixel format.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompressedPixelFormat {
  /// S3TC DXT1 RGB.
  RGBS3tcDxt1,
  /// S3TC DXT1 RGBA.
  RGBAS3tcDxt1,
  /// S3TC DXT3 RGBA.
  RGBAS3tcDxt3,
  /// S3TC DXT5 RGBA.
  RGBAS3tcDxt5,
  /// RGTC1 red.
  RedRgtc1,
  /// RGTC2 red and green.
  RGRgtc2,
  /// BPTC normalized RGBA.
  RGBABptcUnorm,
  /// ETC2 RGB.
  RGB8Etc2,
  /// ETC2 RGBA with EAC alpha.
  RGBA8Etc2Eac,
  /// ASTC RGBA with 4×4 blocks.
  RGBAAstc4x4,
  /// ASTC RGBA with 8×8 blocks.
  RGBAAstc8x8,
}

impl CompressedPixelFormat {
  /// Dimensions of a single block, in pixels.
  pub fn block_size(self) -> [u32; 3] {
    match self {
      CompressedPixelFormat::RGBAAstc8x8 => [8, 8, 1],
      _ => [4, 4, 1],
    }
  }

  /// Size of a single block, in bytes.
  pub fn block_data_size(self) -> u32 {
    match self {
      CompressedPixelFormat::RGBS3tcDxt1
      | CompressedPixelFormat::RGBAS3tcDxt1
      | CompressedPixelFormat::RedRgtc1
      | CompressedPixelFormat::RGB8Etc2 => 8,
      _ => 16,
    }
  }
}

/// GPU-side storage format of a texture.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureFormat {
  /// 8-bit normalized red.
  R8,
  /// 8-bit normalized red and green.
  RG8,
  /// 8-bit normalized RGB.
  RGB8,
  /// 8-bit normalized RGBA.
  RGBA8,
  /// 8-bit signed normalized RGBA.
  RGBA8Snorm,
  /// sRGB, 8 bits per channel.
  SRGB8,
  /// sRGB with linear alpha, 8 bits per channel.
  SRGB8Alpha8,
  /// 8-bit unsigned integral red.
  R8UI,
  /// 8-bit unsigned integral RGBA.
  RGBA8UI,
  /// 16-bit unsigned integral RGBA.
  RGBA16UI,
  /// 16-bit floating-point red.
  R16F,
  /// 16-bit floating-point red and green.
  RG16F,
  /// 16-bit floating-point RGBA.
  RGBA16F,
  /// 32-bit floating-point red.
  R32F,
  /// 32-bit floating-point red and green.
  RG32F,
  /// 32-bit floating-point RGB.
  RGB32F,
  /// 32-bit floating-point RGBA.
  RGBA32F,
  /// 32-bit signed integral red.
  R32I,
  /// 32-bit unsigned integral red.
  R32UI,
  /// 32-bit signed integral RGBA.
  RGBA32I,
  /// 32-bit unsigned integral RGBA.
  RGBA32UI,
  /// 10-bit RGB with 2-bit alpha.
  RGB10A2,
  /// Packed 11/11/10-bit floating-point RGB.
  R11FG11FB10F,
  /// 16-bit depth.
  DepthComponent16,
  /// 24-bit depth.
  DepthComponent24,
  /// 32-bit floating-point depth.
  DepthComponent32F,
  /// 24-bit depth with 8-bit stencil.
  Depth24Stencil8,
  /// Compressed storage.
  Compressed(CompressedPixelFormat),
}

impl TextureFormat {
  /// Whether the storage is block-compressed.
  pub fn is_compressed(self) -> bool {
    matches!(self, TextureFormat::Compressed(_))
  }

  /// Size in bytes of a single texel when transferred with the matching client-side format.
  ///
  /// Compressed formats have no per-texel size and return `0`.
  pub fn pixel_size(self) -> usize {
    match self {
      TextureFormat::R8 | TextureFormat::R8UI => 1,
      TextureFormat::RG8 | TextureFormat::R16F | TextureFormat::DepthComponent16 => 2,
      TextureFormat::RGB8 | TextureFormat::SRGB8 => 3,
      TextureFormat::RGBA8
      | TextureFormat::RGBA8Snorm
      | TextureFormat::SRGB8Alpha8
      | TextureFormat::RGBA8UI
      | TextureFormat::RG16F
      | TextureFormat::R32F
      | TextureFormat::R32I
      | TextureFormat::R32UI
      | TextureFormat::RGB10A2
      | TextureFormat::R11FG11FB10F
      | TextureFormat::DepthComponent24
      | TextureFormat::DepthComponent32F
      | TextureFormat::Depth24Stencil8 => 4,
      TextureFormat::RGBA16UI | TextureFormat::RGBA16F | TextureFormat::RG32F => 8,
      TextureFormat::RGB32F => 12,
      TextureFormat::RGBA32F | TextureFormat::RGBA32I | TextureFormat::RGBA32UI => 16,
      TextureFormat::Compressed(_) => 0,
    }
  }

  /// Client-side format and type matching this storage format.
  ///
  /// Used to allocate levels with no data on drivers lacking immutable storage, where the
  /// transfer format must be compatible with the internal one.
  pub fn transfer_format(self) -> (PixelFormat, PixelType) {
    match self {
      TextureFormat::R8 => (PixelFormat::Red, PixelType::UnsignedByte),
      TextureFormat::RG8 => (PixelFormat::RG, PixelType::UnsignedByte),
      TextureFormat::RGB8 | TextureFormat::SRGB8 => (PixelFormat::RGB, PixelType::UnsignedByte),
      TextureFormat::RGBA8 | TextureFormat::SRGB8Alpha8 => {
        (PixelFormat::RGBA, PixelType::UnsignedByte)
      }
      TextureFormat::RGBA8Snorm => (PixelFormat::RGBA, PixelType::Byte),
      TextureFormat::R8UI => (PixelFormat::RedInteger, PixelType::UnsignedByte),
      TextureFormat::RGBA8UI => (PixelFormat::RGBAInteger, PixelType::UnsignedByte),
      TextureFormat::RGBA16UI => (PixelFormat::RGBAInteger, PixelType::UnsignedShort),
      TextureFormat::R16F => (PixelFormat::Red, PixelType::Half),
      TextureFormat::RG16F => (PixelFormat::RG, PixelType::Half),
      TextureFormat::RGBA16F => (PixelFormat::RGBA, PixelType::Half),
      TextureFormat::R32F => (PixelFormat::Red, PixelType::Float),
      TextureFormat::RG32F => (PixelFormat::RG, PixelType::Float),
      TextureFormat::RGB32F => (PixelFormat::RGB, PixelType::Float),
      TextureFormat::RGBA32F => (PixelFormat::RGBA, PixelType::Float),
      TextureFormat::R32I => (PixelFormat::RedInteger, PixelType::Int),
      TextureFormat::R32UI => (PixelFormat::RedInteger, PixelType::UnsignedInt),
      TextureFormat::RGBA32I => (PixelFormat::RGBAInteger, PixelType::Int),
      TextureFormat::RGBA32UI => (PixelFormat::RGBAInteger, PixelType::UnsignedInt),
      TextureFormat::RGB10A2 => (PixelFormat::RGBA, PixelType::UnsignedInt2101010Rev),
      TextureFormat::R11FG11FB10F => (PixelFormat::RGB, PixelType::UnsignedInt10F11F11FRev),
      TextureFormat::DepthComponent16 => (PixelFormat::DepthComponent, PixelType::UnsignedShort),
      TextureFormat::DepthComponent24 => (PixelFormat::DepthComponent, PixelType::UnsignedInt),
      TextureFormat::DepthComponent32F => (PixelFormat::DepthComponent, PixelType::Float),
      TextureFormat::Depth24Stencil8 => (PixelFormat::DepthStencil, PixelType::UnsignedInt248),
      TextureFormat::Compressed(_) => (PixelFormat::RGBA, PixelType::UnsignedByte),
    }
  }
}

impl From<CompressedPixelFormat> for TextureFormat {
  fn from(format: CompressedPixelFormat) -> Self {
    TextureFormat::Compressed(format)
  }
}

/// Access of a texture bound to an image unit.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ImageAccess {
  /// Image load only.
  ReadOnly,
  /// Image store only.
  WriteOnly,
  /// Image load and store.
  ReadWrite,
}

/// Formats usable for image load / store.
///
/// This is a hard driver restriction: not every [`TextureFormat`] can be bound to an image unit.
/// Converting from a [`TextureFormat`] outside of the subset fails with
/// [`UnsupportedImageFormat`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ImageFormat {
  /// 32-bit floating-point RGBA.
  RGBA32F,
  /// 16-bit floating-point RGBA.
  RGBA16F,
  /// 32-bit floating-point red and green.
  RG32F,
  /// 32-bit floating-point red.
  R32F,
  /// Packed 11/11/10-bit floating-point RGB.
  R11FG11FB10F,
  /// 32-bit unsigned integral RGBA.
  RGBA32UI,
  /// 8-bit unsigned integral RGBA.
  RGBA8UI,
  /// 32-bit unsigned integral red.
  R32UI,
  /// 32-bit signed integral RGBA.
  RGBA32I,
  /// 32-bit signed integral red.
  R32I,
  /// 8-bit normalized RGBA.
  RGBA8,
  /// 8-bit signed normalized RGBA.
  RGBA8Snorm,
  /// 8-bit normalized red and green.
  RG8,
  /// 8-bit normalized red.
  R8,
}

impl From<ImageFormat> for TextureFormat {
  fn from(format: ImageFormat) -> Self {
    match format {
      ImageFormat::RGBA32F => TextureFormat::RGBA32F,
      ImageFormat::RGBA16F => TextureFormat::RGBA16F,
      ImageFormat::RG32F => TextureFormat::RG32F,
      ImageFormat::R32F => TextureFormat::R32F,
      ImageFormat::R11FG11FB10F => TextureFormat::R11FG11FB10F,
      ImageFormat::RGBA32UI => TextureFormat::RGBA32UI,
      ImageFormat::RGBA8UI => TextureFormat::RGBA8UI,
      ImageFormat::R32UI => TextureFormat::R32UI,
      ImageFormat::RGBA32I => TextureFormat::RGBA32I,
      ImageFormat::R32I => TextureFormat::R32I,
      ImageFormat::RGBA8 => TextureFormat::RGBA8,
      ImageFormat::RGBA8Snorm => TextureFormat::RGBA8Snorm,
      ImageFormat::RG8 => TextureFormat::RG8,
      ImageFormat::R8 => TextureFormat::R8,
    }
  }
}

impl TryFrom<TextureFormat> for ImageFormat {
  type Error = UnsupportedImageFormat;

  fn try_from(format: TextureFormat) -> Result<Self, Self::Error> {
    let image_format = match format {
      TextureFormat::RGBA32F => ImageFormat::RGBA32F,
      TextureFormat::RGBA16F => ImageFormat::RGBA16F,
      TextureFormat::RG32F => ImageFormat::RG32F,
      TextureFormat::R32F => ImageFormat::R32F,
      TextureFormat::R11FG11FB10F => ImageFormat::R11FG11FB10F,
      TextureFormat::RGBA32UI => ImageFormat::RGBA32UI,
      TextureFormat::RGBA8UI => ImageFormat::RGBA8UI,
      TextureFormat::R32UI => ImageFormat::R32UI,
      TextureFormat::RGBA32I => ImageFormat::RGBA32I,
      TextureFormat::R32I => ImageFormat::R32I,
      TextureFormat::RGBA8 => ImageFormat::RGBA8,
      TextureFormat::RGBA8Snorm => ImageFormat::RGBA8Snorm,
      TextureFormat::RG8 => ImageFormat::RG8,
      TextureFormat::R8 => ImageFormat::R8,
      _ => return Err(UnsupportedImageFormat(format)),
    };

    Ok(image_format)
  }
}

/// A texture format that cannot be used for image load / store.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnsupportedImageFormat(pub TextureFormat);

impl fmt::Display for UnsupportedImageFormat {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    write!(f, "{:?} cannot be used for image load / store", self.0)
  }
}

impl error::Error for UnsupportedImageFormat {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pixel_sizes() {
    assert_eq!(pixel_size(PixelFormat::RGBA, PixelType::UnsignedByte), 4);
    assert_eq!(pixel_size(PixelFormat::RGB, PixelType::Float), 12);
    assert_eq!(pixel_size(PixelFormat::RG, PixelType::Half), 4);
    assert_eq!(pixel_size(PixelFormat::DepthStencil, PixelType::UnsignedInt248), 4);
    assert_eq!(
      pixel_size(PixelFormat::DepthStencil, PixelType::Float32UnsignedInt248Rev),
      8
    );
  }

  #[test]
  fn compressed_blocks() {
    assert_eq!(CompressedPixelFormat::RGBAS3tcDxt1.block_size(), [4, 4, 1]);
    assert_eq!(CompressedPixelFormat::RGBAS3tcDxt1.block_data_size(), 8);
    assert_eq!(CompressedPixelFormat::RGBAS3tcDxt5.block_data_size(), 16);
    assert_eq!(CompressedPixelFormat::RGBAAstc8x8.block_size(), [8, 8, 1]);
  }

  #[test]
  fn image_format_subset() {
    assert_eq!(
      ImageFormat::try_from(TextureFormat::RGBA8),
      Ok(ImageFormat::RGBA8)
    );
    assert_eq!(
      ImageFormat::try_from(TextureFormat::SRGB8Alpha8),
      Err(UnsupportedImageFormat(TextureFormat::SRGB8Alpha8))
    );
    assert_eq!(TextureFormat::from(ImageFormat::R32UI), TextureFormat::R32UI);
  }
}
