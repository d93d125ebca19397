//! Multisample textures.

use std::marker::PhantomData;

use crate::backend::texture::{ImageTarget, TextureTarget};
use crate::backend::Backend;
use crate::context::Context;
use crate::image::{extent, from_extent};
use crate::object::ObjectFlags;
use crate::pixel::{ImageAccess, ImageFormat, TextureFormat};
use crate::texture::dimensional::{offset_extent, Dim2, Dim2Array};
use crate::texture::{impl_texture_common, impl_texture_object, AbstractTexture};

/// Reify a multisample texture dimension into its target.
pub trait MultisampleDimensionable<const N: usize> {
  const TARGET: TextureTarget;
}

impl MultisampleDimensionable<2> for Dim2 {
  const TARGET: TextureTarget = TextureTarget::Texture2DMultisample;
}

impl MultisampleDimensionable<3> for Dim2Array {
  const TARGET: TextureTarget = TextureTarget::Texture2DMultisampleArray;
}

/// Multisample texture.
///
/// Multisample textures have a single level of several samples per texel: no mipmaps, no
/// filtering, no uploads. Their content is written by rendering or image stores.
pub struct MultisampleTexture<B, D, const N: usize>
where
  B: Backend,
{
  raw: AbstractTexture<B>,
  _d: PhantomData<D>,
}

/// 2D multisample texture.
pub type MultisampleTexture2D<B> = MultisampleTexture<B, Dim2, 2>;
/// Array of 2D multisample textures; sizes are `[width, height, layers]`.
pub type MultisampleTexture2DArray<B> = MultisampleTexture<B, Dim2Array, 3>;

impl<B, D, const N: usize> MultisampleTexture<B, D, N>
where
  B: Backend,
  D: MultisampleDimensionable<N>,
{
  pub fn new(ctx: &Context<B>) -> Self {
    MultisampleTexture {
      raw: AbstractTexture::new(ctx, D::TARGET),
      _d: PhantomData,
    }
  }

  /// Wrap an existing multisample texture.
  pub fn wrap(ctx: &Context<B>, id: u32, flags: ObjectFlags) -> Self {
    MultisampleTexture {
      raw: AbstractTexture::wrap(ctx, D::TARGET, id, flags),
      _d: PhantomData,
    }
  }

  /// Create a view on `source`, optionally restricted to a range of layers.
  ///
  /// The source must have immutable storage. The view must not outlive it.
  pub fn view(ctx: &Context<B>, source: &Self, format: TextureFormat, layers: Option<(u32, u32)>) -> Self {
    let (min_layer, layers) = layers.unwrap_or_else(|| (0, source.layers()));

    MultisampleTexture {
      raw: AbstractTexture::view(ctx, D::TARGET, &source.raw, format, 0, 1, min_layer, layers),
      _d: PhantomData,
    }
  }

  fn layers(&self) -> u32 {
    if D::TARGET.is_layered() {
      self.image_size()[N - 1]
    } else {
      1
    }
  }

  impl_texture_common!();

  /// Bind the texture to an image unit; for arrays, every layer is bound.
  pub fn bind_image(&self, unit: u32, access: ImageAccess, format: ImageFormat) {
    let layered = D::TARGET.is_layered();
    self
      .raw
      .bind_image_internal(unit, 0, layered, 0, access, format);
  }

  /// Bind a single layer of an array to an image unit.
  pub fn bind_image_layer(&self, unit: u32, layer: u32, access: ImageAccess, format: ImageFormat) {
    debug_assert!(
      D::TARGET.is_layered(),
      "MultisampleTexture::bind_image_layer(): {:?} has no layers",
      D::TARGET
    );

    self
      .raw
      .bind_image_internal(unit, 0, false, layer, access, format);
  }

  /// Allocate immutable storage with `samples` samples per texel.
  pub fn set_storage(
    &mut self,
    samples: u32,
    format: TextureFormat,
    size: [u32; N],
    fixed_sample_locations: bool,
  ) -> &mut Self {
    self
      .raw
      .set_storage_multisample_internal(samples, format, extent(size), fixed_sample_locations);
    self
  }

  /// Size of the texture, all zeros if no storage was allocated.
  pub fn image_size(&self) -> [u32; N] {
    from_extent(self.raw.image_size_internal(ImageTarget::Texture(D::TARGET), 0))
  }

  pub fn invalidate_image(&mut self) {
    self.raw.invalidate_image(0);
  }

  pub fn invalidate_sub_image(&mut self, offset: [u32; N], size: [u32; N]) {
    self
      .raw
      .invalidate_sub_image_internal(0, offset_extent(offset), extent(size));
  }
}

impl_texture_object!(MultisampleTexture<B, D, N>, B, D, const N: usize);
