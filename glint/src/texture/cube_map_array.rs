//! Cube map array textures.

use crate::backend::buffer::BufferUsage;
use crate::backend::texture::{CubeMapCoordinate, ImageTarget, TextureParameter, TextureTarget};
use crate::backend::Backend;
use crate::buffer::{BufferImage, CompressedBufferImage};
use crate::context::Context;
use crate::image::{
  extent, from_extent, CompressedImage, CompressedImageView, Image, ImageView,
  MutableCompressedImageView, MutableImageView,
};
use crate::object::ObjectFlags;
use crate::pixel::{ImageAccess, ImageFormat, TextureFormat};
use crate::texture::{
  compressed_block_data_size, compressed_block_size, impl_texture_common, impl_texture_object,
  AbstractTexture, MagFilter, MinFilter, Wrap,
};

const TARGET: ImageTarget = ImageTarget::Texture(TextureTarget::CubeMapArray);

/// Array of cube maps.
///
/// Sizes are `[width, height, layer-faces]`: faces are stored as consecutive layers, six per cube
/// map, so the depth is always a multiple of six and the slice `l * 6 + f` is face `f` of cube map
/// `l` (see [`CubeMapTextureArray::layer_face`]). Three-dimensional images must be ordered the
/// same way.
pub struct CubeMapTextureArray<B>
where
  B: Backend,
{
  raw: AbstractTexture<B>,
}

impl<B> CubeMapTextureArray<B>
where
  B: Backend,
{
  pub fn new(ctx: &Context<B>) -> Self {
    CubeMapTextureArray {
      raw: AbstractTexture::new(ctx, TextureTarget::CubeMapArray),
    }
  }

  /// Wrap an existing cube map array.
  pub fn wrap(ctx: &Context<B>, id: u32, flags: ObjectFlags) -> Self {
    CubeMapTextureArray {
      raw: AbstractTexture::wrap(ctx, TextureTarget::CubeMapArray, id, flags),
    }
  }

  /// Create a view on a range of levels and layer-faces of `source`.
  ///
  /// `min_layer` and `layers` count layer-faces and must be multiples of six.
  pub fn view(
    ctx: &Context<B>,
    source: &Self,
    format: TextureFormat,
    min_level: u32,
    levels: u32,
    min_layer: u32,
    layers: u32,
  ) -> Self {
    debug_assert!(
      min_layer % 6 == 0 && layers % 6 == 0,
      "CubeMapTextureArray::view(): layer range {}..{} doesn’t cover whole cube maps",
      min_layer,
      min_layer + layers
    );

    CubeMapTextureArray {
      raw: AbstractTexture::view(
        ctx,
        TextureTarget::CubeMapArray,
        &source.raw,
        format,
        min_level,
        levels,
        min_layer,
        layers,
      ),
    }
  }

  /// Slice index of a face of a cube map.
  pub fn layer_face(layer: u32, face: CubeMapCoordinate) -> u32 {
    layer * 6 + face.index()
  }

  /// Block size of a compressed format, all zeros for uncompressed formats.
  pub fn compressed_block_size(format: TextureFormat) -> [u32; 2] {
    from_extent(compressed_block_size(format))
  }

  /// Block data size of a compressed format, `0` for uncompressed formats.
  pub fn compressed_block_data_size(format: TextureFormat) -> u32 {
    compressed_block_data_size(format)
  }

  impl_texture_common!();

  /// Bind a single layer-face of a level to an image unit.
  pub fn bind_image(
    &self,
    unit: u32,
    level: u32,
    layer: u32,
    access: ImageAccess,
    format: ImageFormat,
  ) {
    self
      .raw
      .bind_image_internal(unit, level, false, layer, access, format);
  }

  /// Bind every layer-face of a level to an image unit.
  pub fn bind_image_layered(&self, unit: u32, level: u32, access: ImageAccess, format: ImageFormat) {
    self
      .raw
      .bind_image_internal(unit, level, true, 0, access, format);
  }

  pub fn set_base_level(&mut self, level: u32) -> &mut Self {
    self.raw.set_parameter(TextureParameter::BaseLevel(level));
    self
  }

  pub fn set_max_level(&mut self, level: u32) -> &mut Self {
    self.raw.set_parameter(TextureParameter::MaxLevel(level));
    self
  }

  pub fn set_minification_filter(&mut self, filter: MinFilter) -> &mut Self {
    self.raw.set_parameter(TextureParameter::MinFilter(filter));
    self
  }

  pub fn set_magnification_filter(&mut self, filter: MagFilter) -> &mut Self {
    self.raw.set_parameter(TextureParameter::MagFilter(filter));
    self
  }

  pub fn set_wrapping(&mut self, wrapping: [Wrap; 3]) -> &mut Self {
    self.raw.set_wrapping(&wrapping);
    self
  }

  /// Allocate immutable storage; `size[2]` counts layer-faces.
  pub fn set_storage(&mut self, levels: u32, format: TextureFormat, size: [u32; 3]) -> &mut Self {
    debug_assert!(
      size[2] % 6 == 0,
      "CubeMapTextureArray::set_storage(): expected a multiple of six layer-faces but got {}",
      size[2]
    );

    self.raw.set_storage_internal(levels, format, size, 2);
    self
  }

  /// Size of a level, all zeros if the level doesn’t exist.
  pub fn image_size(&self, level: u32) -> [u32; 3] {
    self.raw.image_size_internal(TARGET, level)
  }

  /// Allocate a level and upload the view’s data, if any.
  pub fn set_image(
    &mut self,
    level: u32,
    internal_format: TextureFormat,
    image: ImageView<3>,
  ) -> &mut Self {
    debug_assert!(
      image.size()[2] % 6 == 0,
      "CubeMapTextureArray::set_image(): expected a multiple of six layer-faces but got {}",
      image.size()[2]
    );

    self
      .raw
      .set_image_internal(TARGET, level, internal_format, image);
    self
  }

  /// Upload data into a region of a level; the z offset is a layer-face index.
  pub fn set_sub_image(&mut self, level: u32, offset: [u32; 3], image: ImageView<3>) -> &mut Self {
    self
      .raw
      .set_sub_image_internal(TARGET, level, offset, image);
    self
  }

  pub fn set_compressed_image(&mut self, level: u32, image: CompressedImageView<3>) -> &mut Self {
    self
      .raw
      .set_compressed_image_internal(TARGET, level, image);
    self
  }

  pub fn set_compressed_sub_image(
    &mut self,
    level: u32,
    offset: [u32; 3],
    image: CompressedImageView<3>,
  ) -> &mut Self {
    self
      .raw
      .set_compressed_sub_image_internal(TARGET, level, offset, image);
    self
  }

  /// Read a level into a new image, taking format and storage from `image`.
  pub fn image(&self, level: u32, image: Image<3>) -> Image<3> {
    self.raw.image_internal(TARGET, level, image)
  }

  /// Read a level into caller-provided memory.
  pub fn image_into(&self, level: u32, image: &mut MutableImageView<3>) {
    self.raw.image_into_internal(TARGET, level, image)
  }

  pub fn compressed_image(&self, level: u32, image: CompressedImage<3>) -> CompressedImage<3> {
    self.raw.compressed_image_internal(TARGET, level, image)
  }

  pub fn compressed_image_into(&self, level: u32, image: &mut MutableCompressedImageView<3>) {
    self.raw.compressed_image_into_internal(TARGET, level, image)
  }

  pub fn set_buffer_image(
    &mut self,
    level: u32,
    internal_format: TextureFormat,
    image: &BufferImage<B, 3>,
  ) -> &mut Self {
    debug_assert!(
      image.size()[2] % 6 == 0,
      "CubeMapTextureArray::set_image(): expected a multiple of six layer-faces but got {}",
      image.size()[2]
    );

    self
      .raw
      .set_buffer_image_internal(TARGET, level, internal_format, image);
    self
  }

  pub fn set_buffer_sub_image(
    &mut self,
    level: u32,
    offset: [u32; 3],
    image: &BufferImage<B, 3>,
  ) -> &mut Self {
    self
      .raw
      .set_buffer_sub_image_internal(TARGET, level, offset, image);
    self
  }

  pub fn set_compressed_buffer_image(
    &mut self,
    level: u32,
    image: &CompressedBufferImage<B, 3>,
  ) -> &mut Self {
    self
      .raw
      .set_compressed_buffer_image_internal(TARGET, level, image);
    self
  }

  pub fn set_compressed_buffer_sub_image(
    &mut self,
    level: u32,
    offset: [u32; 3],
    image: &CompressedBufferImage<B, 3>,
  ) -> &mut Self {
    self
      .raw
      .set_compressed_buffer_sub_image_internal(TARGET, level, offset, image);
    self
  }

  pub fn buffer_image(&self, level: u32, image: &mut BufferImage<B, 3>, usage: BufferUsage) {
    self.raw.buffer_image_internal(TARGET, level, image, usage)
  }

  pub fn compressed_buffer_image(
    &self,
    level: u32,
    image: &mut CompressedBufferImage<B, 3>,
    usage: BufferUsage,
  ) {
    self
      .raw
      .compressed_buffer_image_internal(TARGET, level, image, usage)
  }

  pub fn generate_mipmap(&mut self) -> &mut Self {
    self.raw.generate_mipmap();
    self
  }

  pub fn invalidate_image(&mut self, level: u32) {
    self.raw.invalidate_image(level);
  }

  pub fn invalidate_sub_image(&mut self, level: u32, offset: [u32; 3], size: [u32; 3]) {
    self
      .raw
      .invalidate_sub_image_internal(level, offset, extent(size));
  }
}

impl_texture_object!(CubeMapTextureArray<B>, B);
