//! Mapping of glint enums to OpenGL ones.

use gl::types::*;
use glint::backend::texture::{CubeMapCoordinate, ImageTarget, TextureTarget};
use glint::mesh::{MeshIndexType, MeshPrimitive};
use glint::pixel::{
  CompressedPixelFormat, ImageAccess, ImageFormat, PixelFormat, PixelType, TextureFormat,
};
use glint::texture::{MagFilter, MinFilter, Wrap};

// S3TC and ASTC are extensions, absent from the core bindings
const COMPRESSED_RGB_S3TC_DXT1_EXT: GLenum = 0x83F0;
const COMPRESSED_RGBA_S3TC_DXT1_EXT: GLenum = 0x83F1;
const COMPRESSED_RGBA_S3TC_DXT3_EXT: GLenum = 0x83F2;
const COMPRESSED_RGBA_S3TC_DXT5_EXT: GLenum = 0x83F3;
const COMPRESSED_RGBA_ASTC_4X4_KHR: GLenum = 0x93B0;
const COMPRESSED_RGBA_ASTC_8X8_KHR: GLenum = 0x93B7;

pub(crate) fn opengl_target(target: TextureTarget) -> GLenum {
  match target {
    TextureTarget::Texture1D => gl::TEXTURE_1D,
    TextureTarget::Texture2D => gl::TEXTURE_2D,
    TextureTarget::Texture3D => gl::TEXTURE_3D,
    TextureTarget::Texture1DArray => gl::TEXTURE_1D_ARRAY,
    TextureTarget::Texture2DArray => gl::TEXTURE_2D_ARRAY,
    TextureTarget::CubeMap => gl::TEXTURE_CUBE_MAP,
    TextureTarget::CubeMapArray => gl::TEXTURE_CUBE_MAP_ARRAY,
    TextureTarget::Texture2DMultisample => gl::TEXTURE_2D_MULTISAMPLE,
    TextureTarget::Texture2DMultisampleArray => gl::TEXTURE_2D_MULTISAMPLE_ARRAY,
  }
}

pub(crate) fn opengl_image_target(target: ImageTarget) -> GLenum {
  match target {
    ImageTarget::Texture(target) => opengl_target(target),
    ImageTarget::CubeMapFace(face) => opengl_cube_map_face(face),
  }
}

fn opengl_cube_map_face(face: CubeMapCoordinate) -> GLenum {
  match face {
    CubeMapCoordinate::PositiveX => gl::TEXTURE_CUBE_MAP_POSITIVE_X,
    CubeMapCoordinate::NegativeX => gl::TEXTURE_CUBE_MAP_NEGATIVE_X,
    CubeMapCoordinate::PositiveY => gl::TEXTURE_CUBE_MAP_POSITIVE_Y,
    CubeMapCoordinate::NegativeY => gl::TEXTURE_CUBE_MAP_NEGATIVE_Y,
    CubeMapCoordinate::PositiveZ => gl::TEXTURE_CUBE_MAP_POSITIVE_Z,
    CubeMapCoordinate::NegativeZ => gl::TEXTURE_CUBE_MAP_NEGATIVE_Z,
  }
}

/// Number of size components the image functions of a target take.
pub(crate) fn image_dimensions(target: ImageTarget) -> usize {
  match target {
    ImageTarget::Texture(TextureTarget::Texture1D) => 1,
    ImageTarget::Texture(TextureTarget::Texture2D)
    | ImageTarget::Texture(TextureTarget::Texture1DArray)
    | ImageTarget::Texture(TextureTarget::Texture2DMultisample)
    | ImageTarget::CubeMapFace(_) => 2,
    ImageTarget::Texture(_) => 3,
  }
}

/// Number of size components the storage functions of a target take.
pub(crate) fn storage_dimensions(target: TextureTarget) -> usize {
  match target {
    TextureTarget::Texture1D => 1,
    TextureTarget::Texture2D
    | TextureTarget::Texture1DArray
    | TextureTarget::CubeMap
    | TextureTarget::Texture2DMultisample => 2,
    TextureTarget::Texture3D
    | TextureTarget::Texture2DArray
    | TextureTarget::CubeMapArray
    | TextureTarget::Texture2DMultisampleArray => 3,
  }
}

pub(crate) fn opengl_pixel_format(format: PixelFormat) -> GLenum {
  match format {
    PixelFormat::Red => gl::RED,
    PixelFormat::RG => gl::RG,
    PixelFormat::RGB => gl::RGB,
    PixelFormat::RGBA => gl::RGBA,
    PixelFormat::BGRA => gl::BGRA,
    PixelFormat::RedInteger => gl::RED_INTEGER,
    PixelFormat::RGInteger => gl::RG_INTEGER,
    PixelFormat::RGBInteger => gl::RGB_INTEGER,
    PixelFormat::RGBAInteger => gl::RGBA_INTEGER,
    PixelFormat::DepthComponent => gl::DEPTH_COMPONENT,
    PixelFormat::StencilIndex => gl::STENCIL_INDEX,
    PixelFormat::DepthStencil => gl::DEPTH_STENCIL,
  }
}

pub(crate) fn opengl_pixel_type(ty: PixelType) -> GLenum {
  match ty {
    PixelType::UnsignedByte => gl::UNSIGNED_BYTE,
    PixelType::Byte => gl::BYTE,
    PixelType::UnsignedShort => gl::UNSIGNED_SHORT,
    PixelType::Short => gl::SHORT,
    PixelType::UnsignedInt => gl::UNSIGNED_INT,
    PixelType::Int => gl::INT,
    PixelType::Half => gl::HALF_FLOAT,
    PixelType::Float => gl::FLOAT,
    PixelType::UnsignedInt248 => gl::UNSIGNED_INT_24_8,
    PixelType::UnsignedInt2101010Rev => gl::UNSIGNED_INT_2_10_10_10_REV,
    PixelType::UnsignedInt10F11F11FRev => gl::UNSIGNED_INT_10F_11F_11F_REV,
    PixelType::Float32UnsignedInt248Rev => gl::FLOAT_32_UNSIGNED_INT_24_8_REV,
  }
}

pub(crate) fn opengl_compressed_format(format: CompressedPixelFormat) -> GLenum {
  match format {
    CompressedPixelFormat::RGBS3tcDxt1 => COMPRESSED_RGB_S3TC_DXT1_EXT,
    CompressedPixelFormat::RGBAS3tcDxt1 => COMPRESSED_RGBA_S3TC_DXT1_EXT,
    CompressedPixelFormat::RGBAS3tcDxt3 => COMPRESSED_RGBA_S3TC_DXT3_EXT,
    CompressedPixelFormat::RGBAS3tcDxt5 => COMPRESSED_RGBA_S3TC_DXT5_EXT,
    CompressedPixelFormat::RedRgtc1 => gl::COMPRESSED_RED_RGTC1,
    CompressedPixelFormat::RGRgtc2 => gl::COMPRESSED_RG_RGTC2,
    CompressedPixelFormat::RGBABptcUnorm => gl::COMPRESSED_RGBA_BPTC_UNORM,
    CompressedPixelFormat::RGB8Etc2 => gl::COMPRESSED_RGB8_ETC2,
    CompressedPixelFormat::RGBA8Etc2Eac => gl::COMPRESSED_RGBA8_ETC2_EAC,
    CompressedPixelFormat::RGBAAstc4x4 => COMPRESSED_RGBA_ASTC_4X4_KHR,
    CompressedPixelFormat::RGBAAstc8x8 => COMPRESSED_RGBA_ASTC_8X8_KHR,
  }
}

pub(crate) fn opengl_texture_format(format: TextureFormat) -> GLenum {
  match format {
    TextureFormat::R8 => gl::R8,
    TextureFormat::RG8 => gl::RG8,
    TextureFormat::RGB8 => gl::RGB8,
    TextureFormat::RGBA8 => gl::RGBA8,
    TextureFormat::RGBA8Snorm => gl::RGBA8_SNORM,
    TextureFormat::SRGB8 => gl::SRGB8,
    TextureFormat::SRGB8Alpha8 => gl::SRGB8_ALPHA8,
    TextureFormat::R8UI => gl::R8UI,
    TextureFormat::RGBA8UI => gl::RGBA8UI,
    TextureFormat::RGBA16UI => gl::RGBA16UI,
    TextureFormat::R16F => gl::R16F,
    TextureFormat::RG16F => gl::RG16F,
    TextureFormat::RGBA16F => gl::RGBA16F,
    TextureFormat::R32F => gl::R32F,
    TextureFormat::RG32F => gl::RG32F,
    TextureFormat::RGB32F => gl::RGB32F,
    TextureFormat::RGBA32F => gl::RGBA32F,
    TextureFormat::R32I => gl::R32I,
    TextureFormat::R32UI => gl::R32UI,
    TextureFormat::RGBA32I => gl::RGBA32I,
    TextureFormat::RGBA32UI => gl::RGBA32UI,
    TextureFormat::RGB10A2 => gl::RGB10_A2,
    TextureFormat::R11FG11FB10F => gl::R11F_G11F_B10F,
    TextureFormat::DepthComponent16 => gl::DEPTH_COMPONENT16,
    TextureFormat::DepthComponent24 => gl::DEPTH_COMPONENT24,
    TextureFormat::DepthComponent32F => gl::DEPTH_COMPONENT32F,
    TextureFormat::Depth24Stencil8 => gl::DEPTH24_STENCIL8,
    TextureFormat::Compressed(format) => opengl_compressed_format(format),
  }
}

/// Reverse of [`opengl_texture_format`], for internal format queries.
pub(crate) fn texture_format_from_opengl(format: GLenum) -> Option<TextureFormat> {
  let format = match format {
    gl::R8 => TextureFormat::R8,
    gl::RG8 => TextureFormat::RG8,
    gl::RGB8 => TextureFormat::RGB8,
    gl::RGBA8 => TextureFormat::RGBA8,
    gl::RGBA8_SNORM => TextureFormat::RGBA8Snorm,
    gl::SRGB8 => TextureFormat::SRGB8,
    gl::SRGB8_ALPHA8 => TextureFormat::SRGB8Alpha8,
    gl::R8UI => TextureFormat::R8UI,
    gl::RGBA8UI => TextureFormat::RGBA8UI,
    gl::RGBA16UI => TextureFormat::RGBA16UI,
    gl::R16F => TextureFormat::R16F,
    gl::RG16F => TextureFormat::RG16F,
    gl::RGBA16F => TextureFormat::RGBA16F,
    gl::R32F => TextureFormat::R32F,
    gl::RG32F => TextureFormat::RG32F,
    gl::RGB32F => TextureFormat::RGB32F,
    gl::RGBA32F => TextureFormat::RGBA32F,
    gl::R32I => TextureFormat::R32I,
    gl::R32UI => TextureFormat::R32UI,
    gl::RGBA32I => TextureFormat::RGBA32I,
    gl::RGBA32UI => TextureFormat::RGBA32UI,
    gl::RGB10_A2 => TextureFormat::RGB10A2,
    gl::R11F_G11F_B10F => TextureFormat::R11FG11FB10F,
    gl::DEPTH_COMPONENT16 => TextureFormat::DepthComponent16,
    gl::DEPTH_COMPONENT24 => TextureFormat::DepthComponent24,
    gl::DEPTH_COMPONENT32F => TextureFormat::DepthComponent32F,
    gl::DEPTH24_STENCIL8 => TextureFormat::Depth24Stencil8,
    COMPRESSED_RGB_S3TC_DXT1_EXT => CompressedPixelFormat::RGBS3tcDxt1.into(),
    COMPRESSED_RGBA_S3TC_DXT1_EXT => CompressedPixelFormat::RGBAS3tcDxt1.into(),
    COMPRESSED_RGBA_S3TC_DXT3_EXT => CompressedPixelFormat::RGBAS3tcDxt3.into(),
    COMPRESSED_RGBA_S3TC_DXT5_EXT => CompressedPixelFormat::RGBAS3tcDxt5.into(),
    gl::COMPRESSED_RED_RGTC1 => CompressedPixelFormat::RedRgtc1.into(),
    gl::COMPRESSED_RG_RGTC2 => CompressedPixelFormat::RGRgtc2.into(),
    gl::COMPRESSED_RGBA_BPTC_UNORM => CompressedPixelFormat::RGBABptcUnorm.into(),
    gl::COMPRESSED_RGB8_ETC2 => CompressedPixelFormat::RGB8Etc2.into(),
    gl::COMPRESSED_RGBA8_ETC2_EAC => CompressedPixelFormat::RGBA8Etc2Eac.into(),
    COMPRESSED_RGBA_ASTC_4X4_KHR => CompressedPixelFormat::RGBAAstc4x4.into(),
    COMPRESSED_RGBA_ASTC_8X8_KHR => CompressedPixelFormat::RGBAAstc8x8.into(),
    _ => return None,
  };

  Some(format)
}

pub(crate) fn opengl_image_format(format: ImageFormat) -> GLenum {
  opengl_texture_format(format.into())
}

pub(crate) fn opengl_image_access(access: ImageAccess) -> GLenum {
  match access {
    ImageAccess::ReadOnly => gl::READ_ONLY,
    ImageAccess::WriteOnly => gl::WRITE_ONLY,
    ImageAccess::ReadWrite => gl::READ_WRITE,
  }
}

pub(crate) fn opengl_wrap(wrap: Wrap) -> GLenum {
  match wrap {
    Wrap::ClampToEdge => gl::CLAMP_TO_EDGE,
    Wrap::ClampToBorder => gl::CLAMP_TO_BORDER,
    Wrap::Repeat => gl::REPEAT,
    Wrap::MirroredRepeat => gl::MIRRORED_REPEAT,
  }
}

pub(crate) fn opengl_min_filter(filter: MinFilter) -> GLenum {
  match filter {
    MinFilter::Nearest => gl::NEAREST,
    MinFilter::Linear => gl::LINEAR,
    MinFilter::NearestMipmapNearest => gl::NEAREST_MIPMAP_NEAREST,
    MinFilter::NearestMipmapLinear => gl::NEAREST_MIPMAP_LINEAR,
    MinFilter::LinearMipmapNearest => gl::LINEAR_MIPMAP_NEAREST,
    MinFilter::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
  }
}

pub(crate) fn opengl_mag_filter(filter: MagFilter) -> GLenum {
  match filter {
    MagFilter::Nearest => gl::NEAREST,
    MagFilter::Linear => gl::LINEAR,
  }
}

pub(crate) fn opengl_primitive(primitive: MeshPrimitive) -> GLenum {
  match primitive {
    MeshPrimitive::Points => gl::POINTS,
    MeshPrimitive::Lines => gl::LINES,
    MeshPrimitive::LineStrip => gl::LINE_STRIP,
    MeshPrimitive::LineLoop => gl::LINE_LOOP,
    MeshPrimitive::Triangles => gl::TRIANGLES,
    MeshPrimitive::TriangleStrip => gl::TRIANGLE_STRIP,
    MeshPrimitive::TriangleFan => gl::TRIANGLE_FAN,
    MeshPrimitive::LinesAdjacency => gl::LINES_ADJACENCY,
    MeshPrimitive::LineStripAdjacency => gl::LINE_STRIP_ADJACENCY,
    MeshPrimitive::TrianglesAdjacency => gl::TRIANGLES_ADJACENCY,
    MeshPrimitive::TriangleStripAdjacency => gl::TRIANGLE_STRIP_ADJACENCY,
    MeshPrimitive::Patches => gl::PATCHES,
  }
}

pub(crate) fn opengl_index_type(ty: MeshIndexType) -> GLenum {
  match ty {
    MeshIndexType::UnsignedByte => gl::UNSIGNED_BYTE,
    MeshIndexType::UnsignedShort => gl::UNSIGNED_SHORT,
    MeshIndexType::UnsignedInt => gl::UNSIGNED_INT,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const TEXTURE_FORMATS: [TextureFormat; 29] = [
    TextureFormat::R8,
    TextureFormat::RG8,
    TextureFormat::RGB8,
    TextureFormat::RGBA8,
    TextureFormat::RGBA8Snorm,
    TextureFormat::SRGB8,
    TextureFormat::SRGB8Alpha8,
    TextureFormat::R8UI,
    TextureFormat::RGBA8UI,
    TextureFormat::RGBA16UI,
    TextureFormat::R16F,
    TextureFormat::RG16F,
    TextureFormat::RGBA16F,
    TextureFormat::R32F,
    TextureFormat::RG32F,
    TextureFormat::RGB32F,
    TextureFormat::RGBA32F,
    TextureFormat::R32I,
    TextureFormat::R32UI,
    TextureFormat::RGBA32I,
    TextureFormat::RGBA32UI,
    TextureFormat::RGB10A2,
    TextureFormat::R11FG11FB10F,
    TextureFormat::DepthComponent16,
    TextureFormat::DepthComponent24,
    TextureFormat::DepthComponent32F,
    TextureFormat::Depth24Stencil8,
    TextureFormat::Compressed(CompressedPixelFormat::RGBAS3tcDxt5),
    TextureFormat::Compressed(CompressedPixelFormat::RGBAAstc8x8),
  ];

  #[test]
  fn texture_formats_round_trip() {
    for format in TEXTURE_FORMATS {
      assert_eq!(
        texture_format_from_opengl(opengl_texture_format(format)),
        Some(format)
      );
    }

    assert_eq!(texture_format_from_opengl(gl::RGBA), None);
  }

  #[test]
  fn cube_map_faces_are_consecutive() {
    for face in CubeMapCoordinate::ALL {
      assert_eq!(
        opengl_image_target(ImageTarget::CubeMapFace(face)),
        gl::TEXTURE_CUBE_MAP_POSITIVE_X + face.index()
      );
    }
  }

  #[test]
  fn dimensions() {
    assert_eq!(image_dimensions(TextureTarget::Texture1DArray.into()), 2);
    assert_eq!(image_dimensions(TextureTarget::CubeMap.into()), 3);
    assert_eq!(storage_dimensions(TextureTarget::CubeMap), 2);
    assert_eq!(storage_dimensions(TextureTarget::CubeMapArray), 3);
  }
}
