//! Texture backend interface.
//!
//! Except for creation, views, batched binds and invalidation, which address objects by id, every
//! method operates on the texture bound to the given target of the active texture unit. The state
//! cache takes care of binding before calling them.
//!
//! Transfers exist in two flavours: client memory, which requires no pixel buffer to be bound to
//! the matching target, and `*_buffer` ones, which use the bound pixel buffer.

use crate::image::{CompressedPixelStorage, PixelStorage};
use crate::pixel::{
  CompressedPixelFormat, ImageAccess, ImageFormat, PixelFormat, PixelType, TextureFormat,
};
use crate::texture::{MagFilter, MinFilter, Wrap};

/// Texture target.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureTarget {
  Texture1D,
  Texture2D,
  Texture3D,
  Texture1DArray,
  Texture2DArray,
  CubeMap,
  CubeMapArray,
  Texture2DMultisample,
  Texture2DMultisampleArray,
}

impl TextureTarget {
  /// Whether the target has layers, which image units can bind all at once.
  pub fn is_layered(self) -> bool {
    matches!(
      self,
      TextureTarget::Texture3D
        | TextureTarget::Texture1DArray
        | TextureTarget::Texture2DArray
        | TextureTarget::CubeMap
        | TextureTarget::CubeMapArray
        | TextureTarget::Texture2DMultisampleArray
    )
  }
}

/// Cube map face.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CubeMapCoordinate {
  PositiveX,
  NegativeX,
  PositiveY,
  NegativeY,
  PositiveZ,
  NegativeZ,
}

impl CubeMapCoordinate {
  /// Faces in layer order.
  pub const ALL: [CubeMapCoordinate; 6] = [
    CubeMapCoordinate::PositiveX,
    CubeMapCoordinate::NegativeX,
    CubeMapCoordinate::PositiveY,
    CubeMapCoordinate::NegativeY,
    CubeMapCoordinate::PositiveZ,
    CubeMapCoordinate::NegativeZ,
  ];

  /// Layer index of the face.
  pub fn index(self) -> u32 {
    match self {
      CubeMapCoordinate::PositiveX => 0,
      CubeMapCoordinate::NegativeX => 1,
      CubeMapCoordinate::PositiveY => 2,
      CubeMapCoordinate::NegativeY => 3,
      CubeMapCoordinate::PositiveZ => 4,
      CubeMapCoordinate::NegativeZ => 5,
    }
  }
}

/// Target of image transfers: a whole texture target, or a single cube map face.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ImageTarget {
  Texture(TextureTarget),
  CubeMapFace(CubeMapCoordinate),
}

impl ImageTarget {
  /// Texture target the image target belongs to.
  pub fn texture_target(self) -> TextureTarget {
    match self {
      ImageTarget::Texture(target) => target,
      ImageTarget::CubeMapFace(_) => TextureTarget::CubeMap,
    }
  }
}

impl From<TextureTarget> for ImageTarget {
  fn from(target: TextureTarget) -> Self {
    ImageTarget::Texture(target)
  }
}

/// Texture coordinate a wrapping mode applies to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum WrapCoordinate {
  S,
  T,
  R,
}

/// Texture parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextureParameter {
  BaseLevel(u32),
  MaxLevel(u32),
  MinFilter(MinFilter),
  MagFilter(MagFilter),
  Wrap(WrapCoordinate, Wrap),
}

/// Per-level parameter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LevelParameter {
  Width,
  Height,
  Depth,
  /// Size of the compressed data of the level, in bytes.
  CompressedImageSize,
}

/// Direction of a pixel transfer, selecting which storage parameters apply.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StorageDirection {
  /// Downloads (queries).
  Pack,
  /// Uploads.
  Unpack,
}

/// Texture driver entry points.
pub unsafe trait TextureBackend {
  /// Generate a texture name. The object only exists once first bound.
  unsafe fn gen_texture(&mut self) -> u32;

  /// Create a texture object for the given target, direct state access style.
  unsafe fn create_texture(&mut self, target: TextureTarget) -> u32;

  unsafe fn delete_texture(&mut self, id: u32);

  /// Select the active texture unit.
  unsafe fn active_texture(&mut self, unit: u32);

  /// Bind a texture to the target of the active unit. `0` unbinds.
  unsafe fn bind_texture(&mut self, target: TextureTarget, id: u32);

  /// Bind textures to consecutive units in one call. `0` unbinds.
  unsafe fn bind_textures(&mut self, first_unit: u32, ids: &[u32]);

  /// Bind a texture level to an image unit. `0` unbinds.
  #[allow(clippy::too_many_arguments)]
  unsafe fn bind_image_texture(
    &mut self,
    unit: u32,
    id: u32,
    level: u32,
    layered: bool,
    layer: u32,
    access: ImageAccess,
    format: ImageFormat,
  );

  /// Bind the level 0 of textures, all layers, read-write, in their own format, to consecutive
  /// image units in one call. `0` unbinds.
  unsafe fn bind_image_textures(&mut self, first_unit: u32, ids: &[u32]);

  unsafe fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter);

  /// Allocate immutable storage.
  unsafe fn tex_storage(
    &mut self,
    target: TextureTarget,
    levels: u32,
    format: TextureFormat,
    size: [u32; 3],
  );

  /// Allocate immutable multisample storage.
  unsafe fn tex_storage_multisample(
    &mut self,
    target: TextureTarget,
    samples: u32,
    format: TextureFormat,
    size: [u32; 3],
    fixed_sample_locations: bool,
  );

  /// Allocate (and fill, if `data` is given) a level.
  #[allow(clippy::too_many_arguments)]
  unsafe fn tex_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    internal_format: TextureFormat,
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    data: Option<&[u8]>,
  );

  /// Allocate and fill a level with data read from the buffer bound to
  /// [`BufferTarget::PixelUnpack`](crate::backend::buffer::BufferTarget::PixelUnpack), starting at
  /// `buffer_offset`.
  #[allow(clippy::too_many_arguments)]
  unsafe fn tex_image_from_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    internal_format: TextureFormat,
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    buffer_offset: usize,
  );

  /// Update a region of a level.
  #[allow(clippy::too_many_arguments)]
  unsafe fn tex_sub_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    data: &[u8],
  );

  /// Update a region of a level with data read from the bound pixel unpack buffer.
  #[allow(clippy::too_many_arguments)]
  unsafe fn tex_sub_image_from_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    buffer_offset: usize,
  );

  /// Allocate and fill a level with compressed data.
  unsafe fn compressed_tex_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    format: CompressedPixelFormat,
    size: [u32; 3],
    data: &[u8],
  );

  /// Allocate and fill a level with `data_size` bytes of compressed data read from the bound
  /// pixel unpack buffer.
  unsafe fn compressed_tex_image_from_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    format: CompressedPixelFormat,
    size: [u32; 3],
    data_size: usize,
    buffer_offset: usize,
  );

  /// Update a region of a level with compressed data.
  unsafe fn compressed_tex_sub_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: CompressedPixelFormat,
    data: &[u8],
  );

  /// Update a region of a level with `data_size` bytes of compressed data read from the bound
  /// pixel unpack buffer.
  #[allow(clippy::too_many_arguments)]
  unsafe fn compressed_tex_sub_image_from_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: CompressedPixelFormat,
    data_size: usize,
    buffer_offset: usize,
  );

  /// Read a whole level.
  unsafe fn get_tex_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    format: PixelFormat,
    ty: PixelType,
    data: &mut [u8],
  );

  /// Read a whole level into the buffer bound to
  /// [`BufferTarget::PixelPack`](crate::backend::buffer::BufferTarget::PixelPack), starting at
  /// `buffer_offset`.
  unsafe fn get_tex_image_into_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    format: PixelFormat,
    ty: PixelType,
    buffer_offset: usize,
  );

  /// Read a whole compressed level.
  unsafe fn get_compressed_tex_image(&mut self, target: ImageTarget, level: u32, data: &mut [u8]);

  /// Read a whole compressed level into the bound pixel pack buffer.
  unsafe fn get_compressed_tex_image_into_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    buffer_offset: usize,
  );

  /// Query a level parameter. Levels that don’t exist report `0`.
  unsafe fn get_tex_level_parameter(
    &mut self,
    target: ImageTarget,
    level: u32,
    parameter: LevelParameter,
  ) -> i32;

  /// Query the internal format of a level, `None` if the level doesn’t exist or the format is
  /// unknown to glint.
  unsafe fn get_tex_level_format(&mut self, target: ImageTarget, level: u32)
    -> Option<TextureFormat>;

  unsafe fn generate_mipmap(&mut self, target: TextureTarget);

  unsafe fn invalidate_tex_image(&mut self, id: u32, level: u32);

  unsafe fn invalidate_tex_sub_image(
    &mut self,
    id: u32,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
  );

  /// Turn the unused name `id` into a view on the storage of `source`.
  #[allow(clippy::too_many_arguments)]
  unsafe fn texture_view(
    &mut self,
    id: u32,
    target: TextureTarget,
    source: u32,
    format: TextureFormat,
    min_level: u32,
    levels: u32,
    min_layer: u32,
    layers: u32,
  );

  unsafe fn set_pixel_storage(&mut self, direction: StorageDirection, storage: &PixelStorage);

  unsafe fn set_compressed_pixel_storage(
    &mut self,
    direction: StorageDirection,
    storage: &CompressedPixelStorage,
  );
}
