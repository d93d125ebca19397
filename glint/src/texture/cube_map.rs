//! Cube map textures.

use crate::backend::buffer::BufferUsage;
use crate::backend::texture::{CubeMapCoordinate, ImageTarget, TextureParameter, TextureTarget};
use crate::backend::Backend;
use crate::buffer::{BufferImage, CompressedBufferImage};
use crate::context::Context;
use crate::image::{
  extent, from_extent, CompressedImage, CompressedImageView, Image, ImageFlags, ImageView,
  MutableCompressedImageView, MutableImageView,
};
use crate::object::ObjectFlags;
use crate::pixel::{ImageAccess, ImageFormat, TextureFormat};
use crate::texture::dimensional::offset_extent;
use crate::texture::{
  compressed_block_data_size, compressed_block_size, impl_texture_common, impl_texture_object,
  AbstractTexture, MagFilter, MinFilter, Wrap,
};

/// Cube map texture.
///
/// Faces are square images addressed by [`CubeMapCoordinate`]. The whole cube map can also be
/// transferred as a three-dimensional image whose slices are the faces, in
/// `+X, -X, +Y, -Y, +Z, -Z` order.
pub struct CubeMapTexture<B>
where
  B: Backend,
{
  raw: AbstractTexture<B>,
}

impl<B> CubeMapTexture<B>
where
  B: Backend,
{
  pub fn new(ctx: &Context<B>) -> Self {
    CubeMapTexture {
      raw: AbstractTexture::new(ctx, TextureTarget::CubeMap),
    }
  }

  /// Wrap an existing cube map.
  pub fn wrap(ctx: &Context<B>, id: u32, flags: ObjectFlags) -> Self {
    CubeMapTexture {
      raw: AbstractTexture::wrap(ctx, TextureTarget::CubeMap, id, flags),
    }
  }

  /// Create a view on a range of levels of `source`.
  ///
  /// The source must have immutable storage. The view must not outlive it.
  pub fn view(
    ctx: &Context<B>,
    source: &Self,
    format: TextureFormat,
    min_level: u32,
    levels: u32,
  ) -> Self {
    CubeMapTexture {
      raw: AbstractTexture::view(
        ctx,
        TextureTarget::CubeMap,
        &source.raw,
        format,
        min_level,
        levels,
        0,
        6,
      ),
    }
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

  /// Bind a single face of a level to an image unit.
  pub fn bind_image(
    &self,
    unit: u32,
    level: u32,
    face: CubeMapCoordinate,
    access: ImageAccess,
    format: ImageFormat,
  ) {
    self
      .raw
      .bind_image_internal(unit, level, false, face.index(), access, format);
  }

  /// Bind every face of a level to an image unit.
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

  /// Allocate immutable storage for every face.
  pub fn set_storage(&mut self, levels: u32, format: TextureFormat, size: [u32; 2]) -> &mut Self {
    self
      .raw
      .set_storage_internal(levels, format, extent(size), 2);
    self
  }

  /// Size of a face at a level, all zeros if the level doesn’t exist.
  pub fn image_size(&self, level: u32) -> [u32; 2] {
    from_extent(self.raw.image_size_internal(face_target(CubeMapCoordinate::PositiveX), level))
  }

  /// Allocate a face level and upload the view’s data, if any.
  pub fn set_image(
    &mut self,
    face: CubeMapCoordinate,
    level: u32,
    internal_format: TextureFormat,
    image: ImageView<2>,
  ) -> &mut Self {
    self
      .raw
      .set_image_internal(face_target(face), level, internal_format, image);
    self
  }

  /// Upload data into a region of a face level.
  pub fn set_sub_image(
    &mut self,
    face: CubeMapCoordinate,
    level: u32,
    offset: [u32; 2],
    image: ImageView<2>,
  ) -> &mut Self {
    self
      .raw
      .set_sub_image_internal(face_target(face), level, offset_extent(offset), image);
    self
  }

  /// Upload data into several faces at once.
  ///
  /// The z offset is the first face and each slice of the image goes to the next face.
  pub fn set_sub_image_3d(&mut self, level: u32, offset: [u32; 3], image: ImageView<3>) -> &mut Self {
    debug_assert!(
      offset[2] + image.size()[2] <= 6,
      "CubeMapTexture::set_sub_image_3d(): faces {}..{} out of range",
      offset[2],
      offset[2] + image.size()[2]
    );

    for z in 0..image.size()[2] {
      let Some(&face) = CubeMapCoordinate::ALL.get((offset[2] + z) as usize) else {
        break;
      };

      self.raw.set_sub_image_internal(
        face_target(face),
        level,
        [offset[0], offset[1], 0],
        image.slice(z),
      );
    }

    self
  }

  pub fn set_compressed_image(
    &mut self,
    face: CubeMapCoordinate,
    level: u32,
    image: CompressedImageView<2>,
  ) -> &mut Self {
    self
      .raw
      .set_compressed_image_internal(face_target(face), level, image);
    self
  }

  pub fn set_compressed_sub_image(
    &mut self,
    face: CubeMapCoordinate,
    level: u32,
    offset: [u32; 2],
    image: CompressedImageView<2>,
  ) -> &mut Self {
    self.raw.set_compressed_sub_image_internal(
      face_target(face),
      level,
      offset_extent(offset),
      image,
    );
    self
  }

  /// Read a face level into a new image, taking format and storage from `image`.
  pub fn image(&self, face: CubeMapCoordinate, level: u32, image: Image<2>) -> Image<2> {
    self.raw.image_internal(face_target(face), level, image)
  }

  /// Read a face level into caller-provided memory.
  pub fn image_into(&self, face: CubeMapCoordinate, level: u32, image: &mut MutableImageView<2>) {
    self.raw.image_into_internal(face_target(face), level, image)
  }

  /// Read every face of a level into a new image of six slices, flagged
  /// [`ImageFlags::CUBE_MAP`].
  pub fn image_3d(&self, level: u32, mut image: Image<3>) -> Image<3> {
    let [width, height] = self.image_size(level);
    image.allocate([width, height, 6]);

    {
      let mut view = image.as_mut_view();
      self.read_faces(level, &mut view);
    }

    image.with_flags(ImageFlags::CUBE_MAP)
  }

  /// Read every face of a level into caller-provided memory.
  ///
  /// The view must be six slices deep.
  pub fn image_3d_into(&self, level: u32, image: &mut MutableImageView<3>) {
    let [width, height] = self.image_size(level);

    debug_assert!(
      image.size() == [width, height, 6],
      "CubeMapTexture::image_3d(): expected image view size {:?} but got {:?}",
      [width, height, 6],
      image.size()
    );
    debug_assert!(
      !image.is_null(),
      "CubeMapTexture::image_3d(): image view has no data"
    );

    self.read_faces(level, image);
  }

  fn read_faces(&self, level: u32, image: &mut MutableImageView<3>) {
    for (z, &face) in (0..).zip(&CubeMapCoordinate::ALL) {
      let mut slice = image.slice_mut(z);
      self
        .raw
        .image_into_internal(face_target(face), level, &mut slice);
    }
  }

  pub fn compressed_image(
    &self,
    face: CubeMapCoordinate,
    level: u32,
    image: CompressedImage<2>,
  ) -> CompressedImage<2> {
    self
      .raw
      .compressed_image_internal(face_target(face), level, image)
  }

  pub fn compressed_image_into(
    &self,
    face: CubeMapCoordinate,
    level: u32,
    image: &mut MutableCompressedImageView<2>,
  ) {
    self
      .raw
      .compressed_image_into_internal(face_target(face), level, image)
  }

  /// Allocate a face level and upload the content of a buffer image.
  pub fn set_buffer_image(
    &mut self,
    face: CubeMapCoordinate,
    level: u32,
    internal_format: TextureFormat,
    image: &BufferImage<B, 2>,
  ) -> &mut Self {
    self
      .raw
      .set_buffer_image_internal(face_target(face), level, internal_format, image);
    self
  }

  pub fn set_buffer_sub_image(
    &mut self,
    face: CubeMapCoordinate,
    level: u32,
    offset: [u32; 2],
    image: &BufferImage<B, 2>,
  ) -> &mut Self {
    self
      .raw
      .set_buffer_sub_image_internal(face_target(face), level, offset_extent(offset), image);
    self
  }

  pub fn set_compressed_buffer_image(
    &mut self,
    face: CubeMapCoordinate,
    level: u32,
    image: &CompressedBufferImage<B, 2>,
  ) -> &mut Self {
    self
      .raw
      .set_compressed_buffer_image_internal(face_target(face), level, image);
    self
  }

  pub fn set_compressed_buffer_sub_image(
    &mut self,
    face: CubeMapCoordinate,
    level: u32,
    offset: [u32; 2],
    image: &CompressedBufferImage<B, 2>,
  ) -> &mut Self {
    self.raw.set_compressed_buffer_sub_image_internal(
      face_target(face),
      level,
      offset_extent(offset),
      image,
    );
    self
  }

  /// Read a face level into a buffer image, reallocating its buffer with `usage` if too small.
  pub fn buffer_image(
    &self,
    face: CubeMapCoordinate,
    level: u32,
    image: &mut BufferImage<B, 2>,
    usage: BufferUsage,
  ) {
    self
      .raw
      .buffer_image_internal(face_target(face), level, image, usage)
  }

  pub fn compressed_buffer_image(
    &self,
    face: CubeMapCoordinate,
    level: u32,
    image: &mut CompressedBufferImage<B, 2>,
    usage: BufferUsage,
  ) {
    self
      .raw
      .compressed_buffer_image_internal(face_target(face), level, image, usage)
  }

  pub fn generate_mipmap(&mut self) -> &mut Self {
    self.raw.generate_mipmap();
    self
  }

  pub fn invalidate_image(&mut self, level: u32) {
    self.raw.invalidate_image(level);
  }

  /// Invalidate a region; the z offset and size address faces.
  pub fn invalidate_sub_image(&mut self, level: u32, offset: [u32; 3], size: [u32; 3]) {
    self.raw.invalidate_sub_image_internal(level, offset, size);
  }
}

impl_texture_object!(CubeMapTexture<B>, B);

fn face_target(face: CubeMapCoordinate) -> ImageTarget {
  ImageTarget::CubeMapFace(face)
}
