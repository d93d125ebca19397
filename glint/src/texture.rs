//! Textures.
//!
//! Every texture kind shares the same machinery, [`AbstractTexture`]: lazy creation, binding to
//! texture and image units through the state cache, storage allocation, uploads and queries with
//! explicit pixel storage, debug labels and deletion. The concrete kinds add their own addressing
//! on top of it:
//!
//! - [`Texture`], generic over its dimension: [`Texture1D`], [`Texture2D`], [`Texture3D`],
//!   [`Texture1DArray`] and [`Texture2DArray`].
//! - [`CubeMapTexture`], addressed by face, or as a whole with a three-dimensional image of six
//!   slices.
//! - [`CubeMapTextureArray`], in which faces are consecutive layers: layer `l`, face `f` is the
//!   slice `l * 6 + f`.
//! - [`MultisampleTexture2D`] and [`MultisampleTexture2DArray`], which have samples instead of
//!   mipmaps.
//!
//! # Editing and the internal unit
//!
//! The driver edits the texture bound to the active unit. Edits (uploads, storage, parameters,
//! queries) activate a unit the texture is already bound to, or else bind it on the last texture
//! unit, so that bindings made for drawing on lower units stay untouched.
//!
//! # Programmer errors
//!
//! Uploads are not validated: out-of-bounds regions and incompatible formats are reported by the
//! driver. Queries into caller-provided views are: a view with the wrong size, no data or (for
//! compressed data) the wrong format fails a debug assertion.

mod cube_map;
mod cube_map_array;
mod dimensional;
mod multisample;

pub use self::cube_map::CubeMapTexture;
pub use self::cube_map_array::CubeMapTextureArray;
pub use self::dimensional::{
  Dim1, Dim1Array, Dim2, Dim2Array, Dim3, Dimensionable, Texture, Texture1D, Texture1DArray,
  Texture2D, Texture2DArray, Texture3D,
};
pub use self::multisample::{
  MultisampleDimensionable, MultisampleTexture, MultisampleTexture2D, MultisampleTexture2DArray,
};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, error, warn};

use crate::backend::buffer::{BufferTarget, BufferUsage};
use crate::backend::texture::{
  CubeMapCoordinate, ImageTarget, LevelParameter, StorageDirection, TextureParameter,
  TextureTarget, WrapCoordinate,
};
use crate::backend::Backend;
use crate::buffer::{BufferImage, CompressedBufferImage};
use crate::context::{Context, Extension};
use crate::image::{
  extent, from_extent, CompressedImage, CompressedImageView, CompressedPixelStorage, Image,
  ImageView, MutableCompressedImageView, MutableImageView,
};
use crate::object::{GraphicsObject, ObjectFlags, ObjectHandle, ObjectKind};
use crate::pixel::{CompressedPixelFormat, ImageAccess, ImageFormat, TextureFormat};
use crate::state::{GLState, ImageBinding};

/// How to wrap texture coordinates while sampling textures.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Wrap {
  /// If textures coordinates lay outside of *[0;1]*, they will be clamped to either *0* or *1* for
  /// every components.
  ClampToEdge,
  /// Coordinates outside of *[0;1]* sample the border color.
  ClampToBorder,
  /// Textures coordinates are repeated if they lay outside of *[0;1]*.
  Repeat,
  /// Same as `Repeat` but it will alternatively repeat between *[0;1]* and *[1;0]*.
  MirroredRepeat,
}

/// Minification filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MinFilter {
  /// Nearest interpolation.
  Nearest,
  /// Linear interpolation between surrounding pixels.
  Linear,
  /// Select the nearest mipmap, then interpolate with a nearest filter.
  NearestMipmapNearest,
  /// Interpolate linearly between the two nearest mipmaps, each sampled with a nearest filter.
  NearestMipmapLinear,
  /// Select the nearest mipmap, then interpolate linearly.
  LinearMipmapNearest,
  /// Interpolate linearly between the two nearest mipmaps, each sampled linearly.
  LinearMipmapLinear,
}

/// Magnification filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MagFilter {
  /// Nearest interpolation.
  Nearest,
  /// Linear interpolation between surrounding pixels.
  Linear,
}

/// Block size of a compressed format, `[0; 3]` for uncompressed formats.
pub fn compressed_block_size(format: TextureFormat) -> [u32; 3] {
  match format {
    TextureFormat::Compressed(format) => format.block_size(),
    _ => [0; 3],
  }
}

/// Block data size of a compressed format, in bytes, `0` for uncompressed formats.
pub fn compressed_block_data_size(format: TextureFormat) -> u32 {
  match format {
    TextureFormat::Compressed(format) => format.block_data_size(),
    _ => 0,
  }
}

/// Size of a mip level: the first `dimensions` dimensions are halved per level.
pub(crate) fn level_size(size: [u32; 3], level: u32, dimensions: usize) -> [u32; 3] {
  let mut level_size = size;

  for d in level_size.iter_mut().take(dimensions) {
    *d = d.checked_shr(level).unwrap_or(0).max(1);
  }

  level_size
}

/// Functionality shared by every texture kind.
pub struct AbstractTexture<B>
where
  B: Backend,
{
  state: Rc<RefCell<GLState<B>>>,
  handle: ObjectHandle,
  target: TextureTarget,
  // storage format of level 0, if known
  format: Cell<Option<TextureFormat>>,
  immutable: bool,
}

impl<B> AbstractTexture<B>
where
  B: Backend,
{
  pub(crate) fn new(ctx: &Context<B>, target: TextureTarget) -> Self {
    let state = ctx.shared_state();

    let handle = {
      let mut st = state.borrow_mut();

      if st.capabilities().is_supported(Extension::ArbDirectStateAccess) {
        let id = unsafe { st.backend_mut().create_texture(target) };
        ObjectHandle::new(id, ObjectFlags::CREATED | ObjectFlags::DELETE_ON_DESTRUCTION)
      } else {
        let id = unsafe { st.backend_mut().gen_texture() };
        ObjectHandle::new(id, ObjectFlags::DELETE_ON_DESTRUCTION)
      }
    };

    AbstractTexture {
      state,
      handle,
      target,
      format: Cell::new(None),
      immutable: false,
    }
  }

  pub(crate) fn wrap(ctx: &Context<B>, target: TextureTarget, id: u32, flags: ObjectFlags) -> Self {
    AbstractTexture {
      state: ctx.shared_state(),
      handle: ObjectHandle::new(id, flags),
      target,
      format: Cell::new(None),
      immutable: false,
    }
  }

  /// Create a view on the storage of `source`.
  #[allow(clippy::too_many_arguments)]
  pub(crate) fn view(
    ctx: &Context<B>,
    target: TextureTarget,
    source: &AbstractTexture<B>,
    format: TextureFormat,
    min_level: u32,
    levels: u32,
    min_layer: u32,
    layers: u32,
  ) -> Self {
    debug_assert!(
      source.immutable,
      "Texture::view(): source texture {} doesn’t have immutable storage",
      source.id()
    );

    source.create_if_not_already();

    let state = ctx.shared_state();
    let id = {
      let mut st = state.borrow_mut();

      unsafe {
        let id = st.backend_mut().gen_texture();
        st.backend_mut().texture_view(
          id,
          target,
          source.id(),
          format,
          min_level,
          levels,
          min_layer,
          layers,
        );
        id
      }
    };

    AbstractTexture {
      state,
      handle: ObjectHandle::new(id, ObjectFlags::CREATED | ObjectFlags::DELETE_ON_DESTRUCTION),
      target,
      format: Cell::new(Some(format)),
      immutable: true,
    }
  }

  /// Texture target.
  pub fn target(&self) -> TextureTarget {
    self.target
  }

  /// Whether the storage is immutable.
  pub fn is_immutable(&self) -> bool {
    self.immutable
  }

  /// Make sure the object exists on the driver side.
  ///
  /// On drivers without direct state access, generated names only become objects when first
  /// bound; this binds the texture if it never was.
  pub fn create_if_not_already(&self) {
    if self.handle.is_created() {
      return;
    }

    self.bind_internal();
  }

  /// Bind the texture to a texture unit.
  ///
  /// Nothing is issued if the texture is already bound there.
  pub fn bind(&self, unit: u32) {
    let mut state = self.state.borrow_mut();

    unsafe {
      state.bind_texture_if_needed(unit, self.target, self.handle.id());
    }

    self.handle.mark_created();
  }

  /// Unbind whatever texture is bound to a texture unit.
  pub fn unbind(ctx: &Context<B>, unit: u32) {
    let state = ctx.shared_state();
    let mut state = state.borrow_mut();

    unsafe {
      state.unbind_texture(unit);
    }
  }

  /// Unbind textures from a range of consecutive texture units.
  pub fn unbind_range(ctx: &Context<B>, first_unit: u32, count: u32) {
    let state = ctx.shared_state();
    let mut state = state.borrow_mut();

    if state.capabilities().is_supported(Extension::ArbMultiBind) {
      unsafe {
        state.bind_textures(first_unit, &vec![None; count as usize]);
      }
    } else {
      for unit in first_unit..first_unit + count {
        unsafe {
          state.unbind_texture(unit);
        }
      }
    }
  }

  /// Bind textures to consecutive texture units; `None` entries unbind their unit.
  ///
  /// With `GL_ARB_multi_bind` this is a single driver call (none if nothing changes), otherwise
  /// every unit is bound in turn. Both end up with the same bindings.
  pub fn bind_many(ctx: &Context<B>, first_unit: u32, textures: &[Option<&AbstractTexture<B>>]) {
    let multi_bind = ctx.is_supported(Extension::ArbMultiBind);

    if multi_bind {
      let bindings = textures
        .iter()
        .map(|texture| {
          texture.map(|texture| {
            texture.create_if_not_already();
            (texture.target, texture.id())
          })
        })
        .collect::<Vec<_>>();

      let state = ctx.shared_state();
      let mut state = state.borrow_mut();
      unsafe {
        state.bind_textures(first_unit, &bindings);
      }
    } else {
      for (unit, texture) in (first_unit..).zip(textures) {
        match texture {
          Some(texture) => texture.bind(unit),
          None => Self::unbind(ctx, unit),
        }
      }
    }
  }

  /// Bind a level to an image unit.
  #[allow(clippy::too_many_arguments)]
  pub(crate) fn bind_image_internal(
    &self,
    unit: u32,
    level: u32,
    layered: bool,
    layer: u32,
    access: ImageAccess,
    format: ImageFormat,
  ) {
    self.create_if_not_already();

    let binding = ImageBinding {
      texture: self.handle.id(),
      level,
      layered,
      layer,
      access,
      format,
    };

    let mut state = self.state.borrow_mut();
    unsafe {
      state.bind_image(unit, binding);
    }
  }

  /// Unbind whatever is bound to an image unit.
  pub fn unbind_image(ctx: &Context<B>, unit: u32) {
    let state = ctx.shared_state();
    let mut state = state.borrow_mut();

    unsafe {
      state.bind_image(unit, ImageBinding::NONE);
    }
  }

  /// Unbind a range of consecutive image units.
  pub fn unbind_images(ctx: &Context<B>, first_unit: u32, count: u32) {
    let state = ctx.shared_state();
    let mut state = state.borrow_mut();

    if state.capabilities().is_supported(Extension::ArbMultiBind) {
      unsafe {
        state.bind_images(first_unit, &vec![None; count as usize]);
      }
    } else {
      for unit in first_unit..first_unit + count {
        unsafe {
          state.bind_image(unit, ImageBinding::NONE);
        }
      }
    }
  }

  /// Bind level 0 of textures, with all their layers, read-write, to consecutive image units;
  /// `None` entries unbind their unit.
  ///
  /// Textures are bound in their own storage format, which must be one of the [`ImageFormat`]s;
  /// textures with another format are reported and left unbound.
  pub fn bind_images(ctx: &Context<B>, first_unit: u32, textures: &[Option<&AbstractTexture<B>>]) {
    let bindings = (first_unit..)
      .zip(textures)
      .map(|(unit, texture)| {
        let texture = (*texture)?;
        texture.create_if_not_already();

        match texture.image_format() {
          Some(format) => Some(ImageBinding {
            texture: texture.id(),
            level: 0,
            layered: true,
            layer: 0,
            access: ImageAccess::ReadWrite,
            format,
          }),

          None => {
            error!(
              "texture {} cannot be bound to image unit {}: its format cannot be used for image load / store",
              texture.id(),
              unit
            );
            None
          }
        }
      })
      .collect::<Vec<_>>();

    let state = ctx.shared_state();
    let mut state = state.borrow_mut();

    if state.capabilities().is_supported(Extension::ArbMultiBind) {
      unsafe {
        state.bind_images(first_unit, &bindings);
      }
    } else {
      for (unit, binding) in (first_unit..).zip(bindings) {
        unsafe {
          state.bind_image(unit, binding.unwrap_or(ImageBinding::NONE));
        }
      }
    }
  }

  /// Storage format of level 0 as an image format, if it is one.
  fn image_format(&self) -> Option<ImageFormat> {
    let format = match self.format.get() {
      Some(format) => Some(format),
      None => {
        let format = self.level_format(self.level_target(), 0);
        self.format.set(format);
        format
      }
    };

    format.and_then(|format| ImageFormat::try_from(format).ok())
  }

  /// Debug label.
  ///
  /// Always empty if debug labels are unsupported.
  pub fn label(&self) -> String {
    if !self.is_supported(Extension::KhrDebug) {
      return String::new();
    }

    self.create_if_not_already();

    let mut state = self.state.borrow_mut();
    unsafe {
      state
        .backend_mut()
        .get_object_label(ObjectKind::Texture, self.handle.id())
    }
  }

  /// Set the debug label.
  ///
  /// Ignored if debug labels are unsupported.
  pub fn set_label(&mut self, label: &str) -> &mut Self {
    if !self.is_supported(Extension::KhrDebug) {
      debug!("ignoring label of texture {}: debug labels are unsupported", self.id());
      return self;
    }

    self.create_if_not_already();

    let mut state = self.state.borrow_mut();
    unsafe {
      state
        .backend_mut()
        .object_label(ObjectKind::Texture, self.handle.id(), label);
    }
    drop(state);

    self
  }

  fn is_supported(&self, extension: Extension) -> bool {
    self.state.borrow().capabilities().is_supported(extension)
  }

  /// Target of level queries: cube maps answer per face.
  fn level_target(&self) -> ImageTarget {
    match self.target {
      TextureTarget::CubeMap => ImageTarget::CubeMapFace(CubeMapCoordinate::PositiveX),
      target => ImageTarget::Texture(target),
    }
  }

  // Bind to the internal unit and run a backend command.
  fn with_bound<F, R>(&self, f: F) -> R
  where
    F: FnOnce(&mut GLState<B>) -> R,
  {
    let mut state = self.state.borrow_mut();

    unsafe {
      state.bind_texture_internal(self.target, self.handle.id());
    }
    self.handle.mark_created();

    f(&mut state)
  }

  fn bind_internal(&self) {
    self.with_bound(|_| ());
  }

  pub(crate) fn set_parameter(&mut self, parameter: TextureParameter) {
    let target = self.target;
    self.with_bound(|state| unsafe { state.backend_mut().tex_parameter(target, parameter) });
  }

  pub(crate) fn set_wrapping(&mut self, wrapping: &[Wrap]) {
    let coordinates = [WrapCoordinate::S, WrapCoordinate::T, WrapCoordinate::R];

    for (&coordinate, &wrap) in coordinates.iter().zip(wrapping) {
      self.set_parameter(TextureParameter::Wrap(coordinate, wrap));
    }
  }

  /// Allocate immutable storage.
  ///
  /// Without `GL_ARB_texture_storage`, every level is allocated in turn with no data; the result
  /// is mutable driver-side but glint treats it the same.
  pub(crate) fn set_storage_internal(
    &mut self,
    levels: u32,
    format: TextureFormat,
    size: [u32; 3],
    mipmapped_dimensions: usize,
  ) {
    let target = self.target;
    let storage = self.is_supported(Extension::ArbTextureStorage);

    self.with_bound(|state| {
      if storage {
        unsafe { state.backend_mut().tex_storage(target, levels, format, size) };
        return;
      }

      unsafe { state.bind_buffer(BufferTarget::PixelUnpack, 0) };

      let (pixel_format, ty) = format.transfer_format();
      let image_targets = match target {
        TextureTarget::CubeMap => CubeMapCoordinate::ALL
          .iter()
          .map(|&face| ImageTarget::CubeMapFace(face))
          .collect(),
        target => vec![ImageTarget::Texture(target)],
      };

      for level in 0..levels {
        let size = level_size(size, level, mipmapped_dimensions);

        for &image_target in &image_targets {
          unsafe {
            state
              .backend_mut()
              .tex_image(image_target, level, format, size, pixel_format, ty, None);
          }
        }
      }
    });

    self.format.set(Some(format));
    self.immutable = true;
  }

  pub(crate) fn set_storage_multisample_internal(
    &mut self,
    samples: u32,
    format: TextureFormat,
    size: [u32; 3],
    fixed_sample_locations: bool,
  ) {
    let target = self.target;

    self.with_bound(|state| unsafe {
      state
        .backend_mut()
        .tex_storage_multisample(target, samples, format, size, fixed_sample_locations)
    });

    self.format.set(Some(format));
    self.immutable = true;
  }

  /// Size of a level; all zeros if the level doesn’t exist.
  pub(crate) fn image_size_internal(&self, target: ImageTarget, level: u32) -> [u32; 3] {
    self.with_bound(|state| {
      let backend = state.backend_mut();
      let query = |backend: &mut B, parameter| unsafe {
        backend
          .get_tex_level_parameter(target, level, parameter)
          .max(0) as u32
      };

      [
        query(backend, LevelParameter::Width),
        query(backend, LevelParameter::Height),
        query(backend, LevelParameter::Depth),
      ]
    })
  }

  fn level_format(&self, target: ImageTarget, level: u32) -> Option<TextureFormat> {
    self.with_bound(|state| unsafe { state.backend_mut().get_tex_level_format(target, level) })
  }

  pub(crate) fn set_image_internal<const N: usize>(
    &mut self,
    target: ImageTarget,
    level: u32,
    internal_format: TextureFormat,
    image: ImageView<N>,
  ) {
    self.with_bound(|state| unsafe {
      state.bind_buffer(BufferTarget::PixelUnpack, 0);
      state.apply_pixel_storage(StorageDirection::Unpack, &image.storage());
      state.backend_mut().tex_image(
        target,
        level,
        internal_format,
        extent(image.size()),
        image.format(),
        image.ty(),
        image.data(),
      );
    });

    if level == 0 {
      self.format.set(Some(internal_format));
    }
  }

  pub(crate) fn set_sub_image_internal<const N: usize>(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    image: ImageView<N>,
  ) {
    debug_assert!(
      !image.is_null(),
      "Texture::set_sub_image(): image view has no data"
    );

    let Some(data) = image.data() else {
      return;
    };

    self.with_bound(|state| unsafe {
      state.bind_buffer(BufferTarget::PixelUnpack, 0);
      state.apply_pixel_storage(StorageDirection::Unpack, &image.storage());
      state.backend_mut().tex_sub_image(
        target,
        level,
        offset,
        extent(image.size()),
        image.format(),
        image.ty(),
        data,
      );
    });
  }

  pub(crate) fn set_compressed_image_internal<const N: usize>(
    &mut self,
    target: ImageTarget,
    level: u32,
    image: CompressedImageView<N>,
  ) {
    self.with_bound(|state| unsafe {
      state.bind_buffer(BufferTarget::PixelUnpack, 0);
      state.apply_compressed_pixel_storage(StorageDirection::Unpack, &image.storage());
      state.backend_mut().compressed_tex_image(
        target,
        level,
        image.format(),
        extent(image.size()),
        image.data().unwrap_or(&[]),
      );
    });

    if level == 0 {
      self.format.set(Some(TextureFormat::Compressed(image.format())));
    }
  }

  pub(crate) fn set_compressed_sub_image_internal<const N: usize>(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    image: CompressedImageView<N>,
  ) {
    debug_assert!(
      !image.is_null(),
      "Texture::set_compressed_sub_image(): image view has no data"
    );

    let Some(data) = image.data() else {
      return;
    };

    self.with_bound(|state| unsafe {
      state.bind_buffer(BufferTarget::PixelUnpack, 0);
      state.apply_compressed_pixel_storage(StorageDirection::Unpack, &image.storage());
      state.backend_mut().compressed_tex_sub_image(
        target,
        level,
        offset,
        extent(image.size()),
        image.format(),
        data,
      );
    });
  }

  /// Read a level into a freshly allocated image, reusing the placeholder’s storage and format.
  pub(crate) fn image_internal<const N: usize>(
    &self,
    target: ImageTarget,
    level: u32,
    mut image: Image<N>,
  ) -> Image<N> {
    let size = from_extent(self.image_size_internal(target, level));
    image.allocate(size);

    let mut view = image.as_mut_view();
    self.read_image(target, level, &mut view);

    image
  }

  /// Read a level into caller-provided memory.
  pub(crate) fn image_into_internal<const N: usize>(
    &self,
    target: ImageTarget,
    level: u32,
    image: &mut MutableImageView<N>,
  ) {
    let size = from_extent::<N>(self.image_size_internal(target, level));

    debug_assert!(
      image.size() == size,
      "Texture::image(): expected image view size {:?} but got {:?}",
      size,
      image.size()
    );
    debug_assert!(
      !image.is_null(),
      "Texture::image(): image view has no data"
    );

    self.read_image(target, level, image);
  }

  fn read_image<const N: usize>(
    &self,
    target: ImageTarget,
    level: u32,
    image: &mut MutableImageView<N>,
  ) {
    let storage = image.storage();
    let (format, ty) = (image.format(), image.ty());

    let Some(data) = image.data_mut() else {
      return;
    };

    self.with_bound(|state| unsafe {
      state.bind_buffer(BufferTarget::PixelPack, 0);
      state.apply_pixel_storage(StorageDirection::Pack, &storage);
      state
        .backend_mut()
        .get_tex_image(target, level, format, ty, data);
    });
  }

  /// Read a compressed level into a freshly allocated image.
  pub(crate) fn compressed_image_internal<const N: usize>(
    &self,
    target: ImageTarget,
    level: u32,
    mut image: CompressedImage<N>,
  ) -> CompressedImage<N> {
    let size = self.image_size_internal(target, level);

    let format = match self.level_format(target, level) {
      Some(TextureFormat::Compressed(format)) => format,
      format => {
        debug_assert!(
          false,
          "Texture::compressed_image(): level {} has no compressed format ({:?})",
          level,
          format
        );
        return image;
      }
    };

    let storage = image.storage();
    let len = self.compressed_data_size(target, level, &storage, format, size);

    image.allocate(format, from_extent(size), len);
    self.read_compressed_image(target, level, &storage, image.data_mut());

    image
  }

  /// Read a compressed level into caller-provided memory.
  pub(crate) fn compressed_image_into_internal<const N: usize>(
    &self,
    target: ImageTarget,
    level: u32,
    image: &mut MutableCompressedImageView<N>,
  ) {
    let size = from_extent::<N>(self.image_size_internal(target, level));
    let format = self.level_format(target, level);

    debug_assert!(
      image.size() == size,
      "Texture::compressed_image(): expected image view size {:?} but got {:?}",
      size,
      image.size()
    );
    debug_assert!(
      !image.is_null(),
      "Texture::compressed_image(): image view has no data"
    );
    debug_assert!(
      format == Some(TextureFormat::Compressed(image.format())),
      "Texture::compressed_image(): expected image view format {:?} but got {:?}",
      format,
      image.format()
    );

    let storage = image.storage();
    if let Some(data) = image.data_mut() {
      self.read_compressed_image(target, level, &storage, data);
    }
  }

  fn read_compressed_image(
    &self,
    target: ImageTarget,
    level: u32,
    storage: &CompressedPixelStorage,
    data: &mut [u8],
  ) {
    self.with_bound(|state| unsafe {
      state.bind_buffer(BufferTarget::PixelPack, 0);
      state.apply_compressed_pixel_storage(StorageDirection::Pack, storage);
      state
        .backend_mut()
        .get_compressed_tex_image(target, level, data);
    });
  }

  pub(crate) fn set_buffer_image_internal<const N: usize>(
    &mut self,
    target: ImageTarget,
    level: u32,
    internal_format: TextureFormat,
    image: &BufferImage<B, N>,
  ) {
    let buffer = image.buffer().id();

    self.with_bound(|state| unsafe {
      state.bind_buffer(BufferTarget::PixelUnpack, buffer);
      state.apply_pixel_storage(StorageDirection::Unpack, &image.storage());
      state.backend_mut().tex_image_from_buffer(
        target,
        level,
        internal_format,
        extent(image.size()),
        image.format(),
        image.ty(),
        0,
      );
    });

    if level == 0 {
      self.format.set(Some(internal_format));
    }
  }

  pub(crate) fn set_buffer_sub_image_internal<const N: usize>(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    image: &BufferImage<B, N>,
  ) {
    let buffer = image.buffer().id();

    self.with_bound(|state| unsafe {
      state.bind_buffer(BufferTarget::PixelUnpack, buffer);
      state.apply_pixel_storage(StorageDirection::Unpack, &image.storage());
      state.backend_mut().tex_sub_image_from_buffer(
        target,
        level,
        offset,
        extent(image.size()),
        image.format(),
        image.ty(),
        0,
      );
    });
  }

  pub(crate) fn set_compressed_buffer_image_internal<const N: usize>(
    &mut self,
    target: ImageTarget,
    level: u32,
    image: &CompressedBufferImage<B, N>,
  ) {
    debug_assert!(
      image.format().is_some(),
      "Texture::set_compressed_image(): buffer image has no format"
    );

    let Some(format) = image.format() else {
      return;
    };
    let buffer = image.buffer().id();

    self.with_bound(|state| unsafe {
      state.bind_buffer(BufferTarget::PixelUnpack, buffer);
      state.apply_compressed_pixel_storage(StorageDirection::Unpack, &image.storage());
      state.backend_mut().compressed_tex_image_from_buffer(
        target,
        level,
        format,
        extent(image.size()),
        image.data_size(),
        0,
      );
    });

    if level == 0 {
      self.format.set(Some(TextureFormat::Compressed(format)));
    }
  }

  pub(crate) fn set_compressed_buffer_sub_image_internal<const N: usize>(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    image: &CompressedBufferImage<B, N>,
  ) {
    debug_assert!(
      image.format().is_some(),
      "Texture::set_compressed_sub_image(): buffer image has no format"
    );

    let Some(format) = image.format() else {
      return;
    };
    let buffer = image.buffer().id();

    self.with_bound(|state| unsafe {
      state.bind_buffer(BufferTarget::PixelUnpack, buffer);
      state.apply_compressed_pixel_storage(StorageDirection::Unpack, &image.storage());
      state.backend_mut().compressed_tex_sub_image_from_buffer(
        target,
        level,
        offset,
        extent(image.size()),
        format,
        image.data_size(),
        0,
      );
    });
  }

  /// Read a level into a buffer image, growing its buffer if needed.
  pub(crate) fn buffer_image_internal<const N: usize>(
    &self,
    target: ImageTarget,
    level: u32,
    image: &mut BufferImage<B, N>,
    usage: BufferUsage,
  ) {
    let size = from_extent(self.image_size_internal(target, level));
    image.prepare_query(size, usage);

    let storage = image.storage();
    let (format, ty) = (image.format(), image.ty());
    let buffer = image.buffer().id();

    self.with_bound(|state| unsafe {
      state.bind_buffer(BufferTarget::PixelPack, buffer);
      state.apply_pixel_storage(StorageDirection::Pack, &storage);
      state
        .backend_mut()
        .get_tex_image_into_buffer(target, level, format, ty, 0);
    });
  }

  /// Read a compressed level into a buffer image, growing its buffer if needed.
  pub(crate) fn compressed_buffer_image_internal<const N: usize>(
    &self,
    target: ImageTarget,
    level: u32,
    image: &mut CompressedBufferImage<B, N>,
    usage: BufferUsage,
  ) {
    let size = self.image_size_internal(target, level);

    let format = match self.level_format(target, level) {
      Some(TextureFormat::Compressed(format)) => format,
      format => {
        debug_assert!(
          false,
          "Texture::compressed_image(): level {} has no compressed format ({:?})",
          level,
          format
        );
        return;
      }
    };

    let storage = image.storage();
    let len = self.compressed_data_size(target, level, &storage, format, size);
    image.prepare_query(format, from_extent(size), len, usage);
    let buffer = image.buffer().id();

    self.with_bound(|state| unsafe {
      state.bind_buffer(BufferTarget::PixelPack, buffer);
      state.apply_compressed_pixel_storage(StorageDirection::Pack, &storage);
      state
        .backend_mut()
        .get_compressed_tex_image_into_buffer(target, level, 0);
    });
  }

  /// Size of the compressed data of a level laid out according to `storage`.
  fn compressed_data_size(
    &self,
    target: ImageTarget,
    level: u32,
    storage: &CompressedPixelStorage,
    format: CompressedPixelFormat,
    size: [u32; 3],
  ) -> usize {
    if storage.is_default() {
      self.with_bound(|state| unsafe {
        state
          .backend_mut()
          .get_tex_level_parameter(target, level, LevelParameter::CompressedImageSize)
          .max(0) as usize
      })
    } else {
      storage.data_properties(format, size).len
    }
  }

  /// Generate the mipmap chain from level 0.
  pub fn generate_mipmap(&mut self) {
    let target = self.target;
    self.with_bound(|state| unsafe { state.backend_mut().generate_mipmap(target) });
  }

  /// Hint that the content of a level isn’t needed anymore.
  ///
  /// No-op without `GL_ARB_invalidate_subdata`.
  pub fn invalidate_image(&mut self, level: u32) {
    if !self.is_supported(Extension::ArbInvalidateSubdata) {
      return;
    }

    self.create_if_not_already();

    let mut state = self.state.borrow_mut();
    unsafe {
      state
        .backend_mut()
        .invalidate_tex_image(self.handle.id(), level);
    }
  }

  /// Hint that the content of a region of a level isn’t needed anymore.
  pub(crate) fn invalidate_sub_image_internal(
    &mut self,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
  ) {
    if !self.is_supported(Extension::ArbInvalidateSubdata) {
      return;
    }

    self.create_if_not_already();

    let mut state = self.state.borrow_mut();
    unsafe {
      state
        .backend_mut()
        .invalidate_tex_sub_image(self.handle.id(), level, offset, size);
    }
  }
}

impl<B> GraphicsObject for AbstractTexture<B>
where
  B: Backend,
{
  fn id(&self) -> u32 {
    self.handle.id()
  }

  fn flags(&self) -> ObjectFlags {
    self.handle.flags()
  }

  fn release(&mut self) -> u32 {
    self.handle.release()
  }
}

impl<B> Drop for AbstractTexture<B>
where
  B: Backend,
{
  fn drop(&mut self) {
    if !self.handle.must_delete() {
      return;
    }

    let id = self.handle.id();

    match self.state.try_borrow_mut() {
      Ok(mut state) => {
        state.forget_texture(id);
        unsafe { state.backend_mut().delete_texture(id) };
      }

      Err(_) => warn!("leaking texture {}: the graphics state is in use", id),
    }
  }
}

/// Methods every texture kind forwards to its [`AbstractTexture`].
macro_rules! impl_texture_common {
  () => {
    /// Driver id of the texture.
    pub fn id(&self) -> u32 {
      $crate::object::GraphicsObject::id(&self.raw)
    }

    /// Access the shared texture machinery, e.g. for [`AbstractTexture::bind_many`].
    pub fn as_abstract(&self) -> &$crate::texture::AbstractTexture<B> {
      &self.raw
    }

    /// Bind the texture to a texture unit.
    pub fn bind(&self, unit: u32) {
      self.raw.bind(unit)
    }

    /// Debug label, empty if debug labels are unsupported.
    pub fn label(&self) -> String {
      self.raw.label()
    }

    /// Set the debug label.
    pub fn set_label(&mut self, label: &str) -> &mut Self {
      self.raw.set_label(label);
      self
    }
  };
}

/// [`GraphicsObject`] through the inner [`AbstractTexture`].
macro_rules! impl_texture_object {
  ($ty:ty, $($generics:tt)*) => {
    impl<$($generics)*> $crate::object::GraphicsObject for $ty
    where
      B: $crate::backend::Backend,
    {
      fn id(&self) -> u32 {
        $crate::object::GraphicsObject::id(&self.raw)
      }

      fn flags(&self) -> $crate::object::ObjectFlags {
        $crate::object::GraphicsObject::flags(&self.raw)
      }

      fn release(&mut self) -> u32 {
        $crate::object::GraphicsObject::release(&mut self.raw)
      }
    }
  };
}

pub(crate) use impl_texture_common;
pub(crate) use impl_texture_object;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pixel::CompressedPixelFormat;

  #[test]
  fn level_sizes() {
    assert_eq!(level_size([32, 32, 1], 2, 2), [8, 8, 1]);
    assert_eq!(level_size([32, 16, 6], 5, 2), [1, 1, 6]);
    assert_eq!(level_size([8, 4, 2], 1, 3), [4, 2, 1]);
    assert_eq!(level_size([8, 1, 1], 40, 1), [1, 1, 1]);
  }

  #[test]
  fn block_sizes() {
    assert_eq!(compressed_block_size(TextureFormat::RGBA8), [0; 3]);
    assert_eq!(compressed_block_data_size(TextureFormat::RGBA8), 0);
    assert_eq!(
      compressed_block_size(TextureFormat::Compressed(CompressedPixelFormat::RGBAS3tcDxt5)),
      [4, 4, 1]
    );
  }
}
