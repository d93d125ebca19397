//! One-, two- and three-dimensional textures and their array versions.

use std::marker::PhantomData;

use crate::backend::buffer::BufferUsage;
use crate::backend::texture::{ImageTarget, TextureParameter, TextureTarget};
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

/// Reify a texture dimension into its target.
///
/// `N` is the number of dimensions of sizes and offsets, layers included.
pub trait Dimensionable<const N: usize> {
  /// Texture target.
  const TARGET: TextureTarget;

  /// Number of dimensions halved by each mip level; array layers are not.
  const MIPMAPPED_DIMENSIONS: usize;

  /// Whether the last dimension enumerates layers.
  const ARRAY: bool;
}

/// 1D dimension.
#[derive(Clone, Copy, Debug)]
pub struct Dim1;

impl Dimensionable<1> for Dim1 {
  const TARGET: TextureTarget = TextureTarget::Texture1D;
  const MIPMAPPED_DIMENSIONS: usize = 1;
  const ARRAY: bool = false;
}

/// 2D dimension.
#[derive(Clone, Copy, Debug)]
pub struct Dim2;

impl Dimensionable<2> for Dim2 {
  const TARGET: TextureTarget = TextureTarget::Texture2D;
  const MIPMAPPED_DIMENSIONS: usize = 2;
  const ARRAY: bool = false;
}

/// 3D dimension.
#[derive(Clone, Copy, Debug)]
pub struct Dim3;

impl Dimensionable<3> for Dim3 {
  const TARGET: TextureTarget = TextureTarget::Texture3D;
  const MIPMAPPED_DIMENSIONS: usize = 3;
  const ARRAY: bool = false;
}

/// Array of 1D layers.
#[derive(Clone, Copy, Debug)]
pub struct Dim1Array;

impl Dimensionable<2> for Dim1Array {
  const TARGET: TextureTarget = TextureTarget::Texture1DArray;
  const MIPMAPPED_DIMENSIONS: usize = 1;
  const ARRAY: bool = true;
}

/// Array of 2D layers.
#[derive(Clone, Copy, Debug)]
pub struct Dim2Array;

impl Dimensionable<3> for Dim2Array {
  const TARGET: TextureTarget = TextureTarget::Texture2DArray;
  const MIPMAPPED_DIMENSIONS: usize = 2;
  const ARRAY: bool = true;
}

/// Texture of dimension `D`.
pub struct Texture<B, D, const N: usize>
where
  B: Backend,
{
  raw: AbstractTexture<B>,
  _d: PhantomData<D>,
}

/// 1D texture.
pub type Texture1D<B> = Texture<B, Dim1, 1>;
/// 2D texture.
pub type Texture2D<B> = Texture<B, Dim2, 2>;
/// 3D texture.
pub type Texture3D<B> = Texture<B, Dim3, 3>;
/// Array of 1D textures; sizes are `[width, layers]`.
pub type Texture1DArray<B> = Texture<B, Dim1Array, 2>;
/// Array of 2D textures; sizes are `[width, height, layers]`.
pub type Texture2DArray<B> = Texture<B, Dim2Array, 3>;

impl<B, D, const N: usize> Texture<B, D, N>
where
  B: Backend,
  D: Dimensionable<N>,
{
  /// Create a texture.
  ///
  /// Without direct state access, the object is only created when first bound.
  pub fn new(ctx: &Context<B>) -> Self {
    Texture {
      raw: AbstractTexture::new(ctx, D::TARGET),
      _d: PhantomData,
    }
  }

  /// Wrap an existing texture.
  ///
  /// Unless `flags` contains [`ObjectFlags::DELETE_ON_DESTRUCTION`], the texture is not deleted
  /// on drop.
  pub fn wrap(ctx: &Context<B>, id: u32, flags: ObjectFlags) -> Self {
    Texture {
      raw: AbstractTexture::wrap(ctx, D::TARGET, id, flags),
      _d: PhantomData,
    }
  }

  /// Create a view on `levels` levels of `source`, starting at `min_level`.
  ///
  /// The source must have immutable storage. The view must not outlive it.
  pub fn view(
    ctx: &Context<B>,
    source: &Self,
    format: TextureFormat,
    min_level: u32,
    levels: u32,
  ) -> Self {
    let layers = if D::ARRAY {
      source.image_size(min_level)[N - 1]
    } else {
      1
    };

    Self::view_layers(ctx, source, format, min_level, levels, 0, layers)
  }

  /// Create a view on a range of levels and layers of `source`.
  pub fn view_layers(
    ctx: &Context<B>,
    source: &Self,
    format: TextureFormat,
    min_level: u32,
    levels: u32,
    min_layer: u32,
    layers: u32,
  ) -> Self {
    Texture {
      raw: AbstractTexture::view(
        ctx,
        D::TARGET,
        &source.raw,
        format,
        min_level,
        levels,
        min_layer,
        layers,
      ),
      _d: PhantomData,
    }
  }

  /// Block size of a compressed format, all zeros for uncompressed formats.
  pub fn compressed_block_size(format: TextureFormat) -> [u32; N] {
    from_extent(compressed_block_size(format))
  }

  /// Block data size of a compressed format, `0` for uncompressed formats.
  pub fn compressed_block_data_size(format: TextureFormat) -> u32 {
    compressed_block_data_size(format)
  }

  impl_texture_common!();

  /// Bind a level to an image unit.
  ///
  /// For 3D textures and arrays, every layer is bound; see [`Texture::bind_image_layer`].
  pub fn bind_image(&self, unit: u32, level: u32, access: ImageAccess, format: ImageFormat) {
    let layered = D::TARGET.is_layered();
    self
      .raw
      .bind_image_internal(unit, level, layered, 0, access, format);
  }

  /// Bind a single layer of a level to an image unit.
  pub fn bind_image_layer(
    &self,
    unit: u32,
    level: u32,
    layer: u32,
    access: ImageAccess,
    format: ImageFormat,
  ) {
    debug_assert!(
      D::TARGET.is_layered(),
      "Texture::bind_image_layer(): {:?} has no layers",
      D::TARGET
    );

    self
      .raw
      .bind_image_internal(unit, level, false, layer, access, format);
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

  /// Set the wrapping of every mipmapped coordinate.
  pub fn set_wrapping(&mut self, wrapping: [Wrap; N]) -> &mut Self {
    self
      .raw
      .set_wrapping(&wrapping[..D::MIPMAPPED_DIMENSIONS]);
    self
  }

  /// Allocate immutable storage for `levels` levels.
  pub fn set_storage(&mut self, levels: u32, format: TextureFormat, size: [u32; N]) -> &mut Self {
    self
      .raw
      .set_storage_internal(levels, format, extent(size), D::MIPMAPPED_DIMENSIONS);
    self
  }

  /// Size of a level, all zeros if the level doesn’t exist.
  pub fn image_size(&self, level: u32) -> [u32; N] {
    from_extent(self.raw.image_size_internal(ImageTarget::Texture(D::TARGET), level))
  }

  /// Allocate a level and upload the view’s data, if any.
  pub fn set_image(
    &mut self,
    level: u32,
    internal_format: TextureFormat,
    image: ImageView<N>,
  ) -> &mut Self {
    self
      .raw
      .set_image_internal(ImageTarget::Texture(D::TARGET), level, internal_format, image);
    self
  }

  /// Upload data into a region of a level.
  pub fn set_sub_image(&mut self, level: u32, offset: [u32; N], image: ImageView<N>) -> &mut Self {
    self.raw.set_sub_image_internal(
      ImageTarget::Texture(D::TARGET),
      level,
      offset_extent(offset),
      image,
    );
    self
  }

  /// Allocate a level and upload compressed data.
  pub fn set_compressed_image(&mut self, level: u32, image: CompressedImageView<N>) -> &mut Self {
    self
      .raw
      .set_compressed_image_internal(ImageTarget::Texture(D::TARGET), level, image);
    self
  }

  /// Upload compressed data into a region of a level.
  pub fn set_compressed_sub_image(
    &mut self,
    level: u32,
    offset: [u32; N],
    image: CompressedImageView<N>,
  ) -> &mut Self {
    self.raw.set_compressed_sub_image_internal(
      ImageTarget::Texture(D::TARGET),
      level,
      offset_extent(offset),
      image,
    );
    self
  }

  /// Read a level into a new image, taking format and storage from `image`.
  pub fn image(&self, level: u32, image: Image<N>) -> Image<N> {
    self
      .raw
      .image_internal(ImageTarget::Texture(D::TARGET), level, image)
  }

  /// Read a level into caller-provided memory.
  ///
  /// The view must have the size of the level.
  pub fn image_into(&self, level: u32, image: &mut MutableImageView<N>) {
    self
      .raw
      .image_into_internal(ImageTarget::Texture(D::TARGET), level, image)
  }

  /// Read a compressed level into a new image, taking storage from `image`.
  pub fn compressed_image(&self, level: u32, image: CompressedImage<N>) -> CompressedImage<N> {
    self
      .raw
      .compressed_image_internal(ImageTarget::Texture(D::TARGET), level, image)
  }

  /// Read a compressed level into caller-provided memory.
  ///
  /// The view must have the size and format of the level.
  pub fn compressed_image_into(&self, level: u32, image: &mut MutableCompressedImageView<N>) {
    self
      .raw
      .compressed_image_into_internal(ImageTarget::Texture(D::TARGET), level, image)
  }

  /// Allocate a level and upload the content of a buffer image.
  pub fn set_buffer_image(
    &mut self,
    level: u32,
    internal_format: TextureFormat,
    image: &BufferImage<B, N>,
  ) -> &mut Self {
    self
      .raw
      .set_buffer_image_internal(ImageTarget::Texture(D::TARGET), level, internal_format, image);
    self
  }

  /// Upload the content of a buffer image into a region of a level.
  pub fn set_buffer_sub_image(
    &mut self,
    level: u32,
    offset: [u32; N],
    image: &BufferImage<B, N>,
  ) -> &mut Self {
    self.raw.set_buffer_sub_image_internal(
      ImageTarget::Texture(D::TARGET),
      level,
      offset_extent(offset),
      image,
    );
    self
  }

  pub fn set_compressed_buffer_image(
    &mut self,
    level: u32,
    image: &CompressedBufferImage<B, N>,
  ) -> &mut Self {
    self
      .raw
      .set_compressed_buffer_image_internal(ImageTarget::Texture(D::TARGET), level, image);
    self
  }

  pub fn set_compressed_buffer_sub_image(
    &mut self,
    level: u32,
    offset: [u32; N],
    image: &CompressedBufferImage<B, N>,
  ) -> &mut Self {
    self.raw.set_compressed_buffer_sub_image_internal(
      ImageTarget::Texture(D::TARGET),
      level,
      offset_extent(offset),
      image,
    );
    self
  }

  /// Read a level into a buffer image, taking format and storage from `image`.
  ///
  /// The buffer is reallocated with `usage` only if it’s too small.
  pub fn buffer_image(&self, level: u32, image: &mut BufferImage<B, N>, usage: BufferUsage) {
    self
      .raw
      .buffer_image_internal(ImageTarget::Texture(D::TARGET), level, image, usage)
  }

  pub fn compressed_buffer_image(
    &self,
    level: u32,
    image: &mut CompressedBufferImage<B, N>,
    usage: BufferUsage,
  ) {
    self
      .raw
      .compressed_buffer_image_internal(ImageTarget::Texture(D::TARGET), level, image, usage)
  }

  pub fn generate_mipmap(&mut self) -> &mut Self {
    self.raw.generate_mipmap();
    self
  }

  pub fn invalidate_image(&mut self, level: u32) {
    self.raw.invalidate_image(level);
  }

  pub fn invalidate_sub_image(&mut self, level: u32, offset: [u32; N], size: [u32; N]) {
    self
      .raw
      .invalidate_sub_image_internal(level, offset_extent(offset), extent(size));
  }
}

impl_texture_object!(Texture<B, D, N>, B, D, const N: usize);

/// Extend an offset to three dimensions, filling missing ones with `0`.
pub(crate) fn offset_extent<const N: usize>(offset: [u32; N]) -> [u32; 3] {
  let mut extent = [0; 3];
  extent[..N].copy_from_slice(&offset);
  extent
}
