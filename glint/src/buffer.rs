//! Pixel buffers.
//!
//! A [`Buffer`] is driver-side memory. glint uses it to move pixels without going through client
//! memory: [`BufferImage`] and [`CompressedBufferImage`] pair a buffer with the format, size and
//! storage parameters describing its content, and textures upload from them or query into them.
//!
//! A query into a buffer image resizes the image and reallocates its buffer only if the buffer is
//! too small for the result.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use crate::backend::buffer::{BufferTarget, BufferUsage};
use crate::backend::Backend;
use crate::context::{Context, Extension};
use crate::image::{
  extent, CompressedPixelStorage, DataProperties, ImageError, ImageFlags, PixelStorage,
};
use crate::object::{GraphicsObject, ObjectFlags, ObjectHandle, ObjectKind};
use crate::pixel::{pixel_size, CompressedPixelFormat, PixelFormat, PixelType};
use crate::state::GLState;

/// Driver-side memory.
pub struct Buffer<B>
where
  B: Backend,
{
  state: Rc<RefCell<GLState<B>>>,
  handle: ObjectHandle,
  size: usize,
}

impl<B> Buffer<B>
where
  B: Backend,
{
  /// Generate an empty buffer. The object is created on first use.
  pub fn new(ctx: &Context<B>) -> Self {
    let state = ctx.shared_state();
    let id = unsafe { state.borrow_mut().backend_mut().gen_buffer() };

    Buffer {
      state,
      handle: ObjectHandle::new(id, ObjectFlags::DELETE_ON_DESTRUCTION),
      size: 0,
    }
  }

  /// Wrap an existing buffer.
  ///
  /// glint doesn’t know the size of a wrapped buffer: it reports `0` until the next allocation.
  pub fn wrap(ctx: &Context<B>, id: u32, flags: ObjectFlags) -> Self {
    Buffer {
      state: ctx.shared_state(),
      handle: ObjectHandle::new(id, flags),
      size: 0,
    }
  }

  /// Size of the buffer, in bytes.
  pub fn size(&self) -> usize {
    self.size
  }

  /// Replace the content of the buffer.
  pub fn set_data(&mut self, data: &[u8], usage: BufferUsage) -> &mut Self {
    self.reallocate(data.len(), Some(data), usage);
    self
  }

  /// Reallocate the buffer with `len` bytes of undefined content.
  pub fn allocate(&mut self, len: usize, usage: BufferUsage) -> &mut Self {
    self.reallocate(len, None, usage);
    self
  }

  fn reallocate(&mut self, len: usize, data: Option<&[u8]>, usage: BufferUsage) {
    self.with_bound(BufferTarget::PixelUnpack, |state| unsafe {
      state
        .backend_mut()
        .buffer_data(BufferTarget::PixelUnpack, len, data, usage);
    });

    self.size = len;
  }

  /// Read the whole content of the buffer.
  pub fn data(&self) -> Vec<u8> {
    let mut data = vec![0; self.size];

    if !data.is_empty() {
      self.with_bound(BufferTarget::PixelPack, |state| unsafe {
        state
          .backend_mut()
          .get_buffer_sub_data(BufferTarget::PixelPack, 0, &mut data);
      });
    }

    data
  }

  /// Debug label, empty if debug labels are unsupported.
  pub fn label(&self) -> String {
    if !self.is_supported(Extension::KhrDebug) {
      return String::new();
    }

    self.create_if_not_already();

    let mut state = self.state.borrow_mut();
    unsafe {
      state
        .backend_mut()
        .get_object_label(ObjectKind::Buffer, self.handle.id())
    }
  }

  /// Set the debug label. Ignored if debug labels are unsupported.
  pub fn set_label(&mut self, label: &str) -> &mut Self {
    if !self.is_supported(Extension::KhrDebug) {
      debug!(
        "ignoring label of buffer {}: debug labels are unsupported",
        self.handle.id()
      );
      return self;
    }

    self.create_if_not_already();

    let mut state = self.state.borrow_mut();
    unsafe {
      state
        .backend_mut()
        .object_label(ObjectKind::Buffer, self.handle.id(), label);
    }
    drop(state);

    self
  }

  fn is_supported(&self, extension: Extension) -> bool {
    self.state.borrow().capabilities().is_supported(extension)
  }

  fn create_if_not_already(&self) {
    if !self.handle.is_created() {
      self.with_bound(BufferTarget::PixelUnpack, |_| ());
    }
  }

  fn with_bound<F, R>(&self, target: BufferTarget, f: F) -> R
  where
    F: FnOnce(&mut GLState<B>) -> R,
  {
    let mut state = self.state.borrow_mut();

    unsafe {
      state.bind_buffer(target, self.handle.id());
    }
    self.handle.mark_created();

    f(&mut state)
  }
}

impl<B> GraphicsObject for Buffer<B>
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

impl<B> Drop for Buffer<B>
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
        state.forget_buffer(id);
        unsafe { state.backend_mut().delete_buffer(id) };
      }

      Err(_) => warn!("leaking buffer {}: the graphics state is in use", id),
    }
  }
}

/// Uncompressed image stored in a [`Buffer`].
pub struct BufferImage<B, const N: usize>
where
  B: Backend,
{
  storage: PixelStorage,
  format: PixelFormat,
  ty: PixelType,
  size: [u32; N],
  buffer: Buffer<B>,
  data_size: usize,
  flags: ImageFlags,
}

impl<B, const N: usize> BufferImage<B, N>
where
  B: Backend,
{
  /// Upload tightly packed data into a new buffer.
  pub fn new(
    ctx: &Context<B>,
    format: PixelFormat,
    ty: PixelType,
    size: [u32; N],
    data: &[u8],
    usage: BufferUsage,
  ) -> Result<Self, ImageError> {
    Self::with_storage(ctx, PixelStorage::default(), format, ty, size, data, usage)
  }

  /// Upload data laid out according to `storage` into a new buffer.
  pub fn with_storage(
    ctx: &Context<B>,
    storage: PixelStorage,
    format: PixelFormat,
    ty: PixelType,
    size: [u32; N],
    data: &[u8],
    usage: BufferUsage,
  ) -> Result<Self, ImageError> {
    let mut image = Self::empty_with_storage(ctx, storage, format, ty);
    image.set_data(storage, format, ty, size, data, usage)?;
    Ok(image)
  }

  /// Empty placeholder, to be filled by a texture query.
  pub fn empty(ctx: &Context<B>, format: PixelFormat, ty: PixelType) -> Self {
    Self::empty_with_storage(ctx, PixelStorage::default(), format, ty)
  }

  /// Empty placeholder with custom storage, to be filled by a texture query.
  pub fn empty_with_storage(
    ctx: &Context<B>,
    storage: PixelStorage,
    format: PixelFormat,
    ty: PixelType,
  ) -> Self {
    BufferImage {
      storage,
      format,
      ty,
      size: [0; N],
      buffer: Buffer::new(ctx),
      data_size: 0,
      flags: ImageFlags::empty(),
    }
  }

  /// Replace the content, reallocating the buffer.
  pub fn set_data(
    &mut self,
    storage: PixelStorage,
    format: PixelFormat,
    ty: PixelType,
    size: [u32; N],
    data: &[u8],
    usage: BufferUsage,
  ) -> Result<(), ImageError> {
    let expected = storage
      .data_properties(pixel_size(format, ty), extent(size))
      .len;
    ImageError::check(expected, data.len())?;

    self.buffer.set_data(data, usage);
    self.storage = storage;
    self.format = format;
    self.ty = ty;
    self.size = size;
    self.data_size = data.len();

    Ok(())
  }

  /// Set the image flags.
  pub fn with_flags(mut self, flags: ImageFlags) -> Self {
    self.flags = flags;
    self
  }

  pub fn storage(&self) -> PixelStorage {
    self.storage
  }

  pub fn format(&self) -> PixelFormat {
    self.format
  }

  pub fn ty(&self) -> PixelType {
    self.ty
  }

  pub fn size(&self) -> [u32; N] {
    self.size
  }

  pub fn flags(&self) -> ImageFlags {
    self.flags
  }

  /// Size of the image data in the buffer, in bytes.
  pub fn data_size(&self) -> usize {
    self.data_size
  }

  /// Size of a single pixel, in bytes.
  pub fn pixel_size(&self) -> usize {
    pixel_size(self.format, self.ty)
  }

  /// Layout of the data in the buffer.
  pub fn data_properties(&self) -> DataProperties {
    self
      .storage
      .data_properties(self.pixel_size(), extent(self.size))
  }

  pub fn buffer(&self) -> &Buffer<B> {
    &self.buffer
  }

  pub fn buffer_mut(&mut self) -> &mut Buffer<B> {
    &mut self.buffer
  }

  /// Take the buffer out.
  pub fn into_buffer(self) -> Buffer<B> {
    self.buffer
  }

  /// Make room for a query result of the given size.
  pub(crate) fn prepare_query(&mut self, size: [u32; N], usage: BufferUsage) {
    let len = self
      .storage
      .data_properties(self.pixel_size(), extent(size))
      .len;

    if self.buffer.size() < len {
      self.buffer.allocate(len, usage);
    }

    self.size = size;
    self.data_size = len;
  }
}

/// Compressed image stored in a [`Buffer`].
pub struct CompressedBufferImage<B, const N: usize>
where
  B: Backend,
{
  storage: CompressedPixelStorage,
  format: Option<CompressedPixelFormat>,
  size: [u32; N],
  buffer: Buffer<B>,
  data_size: usize,
  flags: ImageFlags,
}

impl<B, const N: usize> CompressedBufferImage<B, N>
where
  B: Backend,
{
  /// Upload tightly packed data into a new buffer.
  pub fn new(
    ctx: &Context<B>,
    format: CompressedPixelFormat,
    size: [u32; N],
    data: &[u8],
    usage: BufferUsage,
  ) -> Result<Self, ImageError> {
    Self::with_storage(ctx, CompressedPixelStorage::default(), format, size, data, usage)
  }

  /// Upload data laid out according to `storage` into a new buffer.
  pub fn with_storage(
    ctx: &Context<B>,
    storage: CompressedPixelStorage,
    format: CompressedPixelFormat,
    size: [u32; N],
    data: &[u8],
    usage: BufferUsage,
  ) -> Result<Self, ImageError> {
    let mut image = Self::empty_with_storage(ctx, storage);
    image.set_data(storage, format, size, data, usage)?;
    Ok(image)
  }

  /// Empty placeholder, to be filled by a texture query.
  pub fn empty(ctx: &Context<B>) -> Self {
    Self::empty_with_storage(ctx, CompressedPixelStorage::default())
  }

  /// Empty placeholder with custom storage, to be filled by a texture query.
  pub fn empty_with_storage(ctx: &Context<B>, storage: CompressedPixelStorage) -> Self {
    CompressedBufferImage {
      storage,
      format: None,
      size: [0; N],
      buffer: Buffer::new(ctx),
      data_size: 0,
      flags: ImageFlags::empty(),
    }
  }

  /// Replace the content, reallocating the buffer.
  pub fn set_data(
    &mut self,
    storage: CompressedPixelStorage,
    format: CompressedPixelFormat,
    size: [u32; N],
    data: &[u8],
    usage: BufferUsage,
  ) -> Result<(), ImageError> {
    let expected = storage.data_properties(format, extent(size)).len;
    ImageError::check(expected, data.len())?;

    self.buffer.set_data(data, usage);
    self.storage = storage;
    self.format = Some(format);
    self.size = size;
    self.data_size = data.len();

    Ok(())
  }

  /// Set the image flags.
  pub fn with_flags(mut self, flags: ImageFlags) -> Self {
    self.flags = flags;
    self
  }

  pub fn storage(&self) -> CompressedPixelStorage {
    self.storage
  }

  /// Format of the data, `None` for an unfilled placeholder.
  pub fn format(&self) -> Option<CompressedPixelFormat> {
    self.format
  }

  pub fn size(&self) -> [u32; N] {
    self.size
  }

  pub fn flags(&self) -> ImageFlags {
    self.flags
  }

  /// Size of the image data in the buffer, in bytes.
  pub fn data_size(&self) -> usize {
    self.data_size
  }

  pub fn buffer(&self) -> &Buffer<B> {
    &self.buffer
  }

  pub fn buffer_mut(&mut self) -> &mut Buffer<B> {
    &mut self.buffer
  }

  /// Take the buffer out.
  pub fn into_buffer(self) -> Buffer<B> {
    self.buffer
  }

  pub(crate) fn prepare_query(
    &mut self,
    format: CompressedPixelFormat,
    size: [u32; N],
    len: usize,
    usage: BufferUsage,
  ) {
    if self.buffer.size() < len {
      self.buffer.allocate(len, usage);
    }

    self.format = Some(format);
    self.size = size;
    self.data_size = len;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::headless::{Headless, HeadlessConfig};

  fn context() -> Context<Headless> {
    Context::new(Headless::new(HeadlessConfig::default())).unwrap()
  }

  #[test]
  fn buffer_data_round_trip() {
    let ctx = context();
    let mut buffer = Buffer::new(&ctx);

    assert!(!buffer.flags().contains(ObjectFlags::CREATED));
    buffer.set_data(&[1, 2, 3], BufferUsage::StaticDraw);

    assert!(buffer.flags().contains(ObjectFlags::CREATED));
    assert_eq!(buffer.size(), 3);
    assert_eq!(buffer.data(), [1, 2, 3]);
  }

  #[test]
  fn dropping_a_bound_buffer_clears_the_cache() {
    let ctx = context();
    let mut buffer = Buffer::new(&ctx);
    buffer.allocate(4, BufferUsage::StreamRead);

    let id = buffer.id();
    assert_eq!(ctx.state().bound_buffer(BufferTarget::PixelUnpack), Some(id));

    drop(buffer);
    assert_eq!(ctx.state().bound_buffer(BufferTarget::PixelUnpack), Some(0));
    assert!(ctx.backend().buffer_contents(id).is_none());
  }

  #[test]
  fn buffer_image_rejects_short_data() {
    let ctx = context();
    let result = BufferImage::new(
      &ctx,
      PixelFormat::RGB,
      PixelType::UnsignedByte,
      [3, 2],
      &[0; 20],
      BufferUsage::StaticDraw,
    );

    assert_eq!(
      result.err(),
      Some(ImageError::DataTooSmall {
        expected: 24,
        actual: 20
      })
    );
  }

  #[test]
  fn query_reuses_large_enough_buffers() {
    let ctx = context();
    let mut image = BufferImage::<_, 2>::empty(&ctx, PixelFormat::RGBA, PixelType::UnsignedByte);

    image.prepare_query([4, 4], BufferUsage::StaticRead);
    assert_eq!(image.buffer().size(), 64);

    image.prepare_query([2, 2], BufferUsage::StaticRead);
    assert_eq!(image.data_size(), 16);
    assert_eq!(image.buffer().size(), 64);
    assert_eq!(ctx.backend().call_count("buffer_data"), 1);
  }
}
