//! Buffer backend interface.
//!
//! glint only uses buffers as pixel buffers: the source of uploads and the destination of
//! queries of [`BufferImage`](crate::buffer::BufferImage)s. Every method but creation and
//! deletion operates on the buffer bound to the given target.

/// Buffer binding target.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferTarget {
  /// Destination of pixel downloads.
  PixelPack,
  /// Source of pixel uploads.
  PixelUnpack,
}

/// Buffer usage hint.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferUsage {
  /// Set once by the application, used many times.
  StaticDraw,
  /// Set once by a query, read many times by the application.
  StaticRead,
  /// Set many times by the application.
  DynamicDraw,
  /// Set many times by queries.
  DynamicRead,
  /// Set once by the application, used a few times.
  StreamDraw,
  /// Set once by a query, read a few times by the application.
  StreamRead,
}

/// Buffer driver entry points.
pub unsafe trait BufferBackend {
  /// Generate a buffer name. The object only exists once first bound.
  unsafe fn gen_buffer(&mut self) -> u32;

  unsafe fn delete_buffer(&mut self, id: u32);

  /// Bind a buffer to a target. `0` unbinds.
  unsafe fn bind_buffer(&mut self, target: BufferTarget, id: u32);

  /// Reallocate the bound buffer with `len` bytes, copying `data` into it if given.
  ///
  /// `data`, if given, is `len` bytes long.
  unsafe fn buffer_data(
    &mut self,
    target: BufferTarget,
    len: usize,
    data: Option<&[u8]>,
    usage: BufferUsage,
  );

  /// Read a range of the bound buffer.
  unsafe fn get_buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &mut [u8]);
}
