//! Images.
//!
//! An image is a flat byte buffer plus everything needed to interpret it: a pixel format (or
//! compressed pixel format), a size in one, two or three dimensions and the storage parameters
//! (alignment, row length, skips) describing how rows and slices are laid out in the buffer.
//!
//! Three flavours exist for both uncompressed and compressed data:
//!
//! - [`Image`] / [`CompressedImage`] own their data. Texture queries return them.
//! - [`ImageView`] / [`CompressedImageView`] borrow data, typically for uploads. A view without
//!   data is allowed and means “allocate, don’t upload”.
//! - [`MutableImageView`] / [`MutableCompressedImageView`] borrow mutably, so that a query can
//!   write into caller-owned memory without reallocating.
//!
//! Constructors holding data check that the buffer is large enough for the size and storage;
//! nothing checks that it isn’t larger.

use std::error;
use std::fmt;

use crate::pixel::{pixel_size, CompressedPixelFormat, PixelFormat, PixelType};

bitflags::bitflags! {
  /// Semantic shape of an image’s dimensions.
  ///
  /// These flags don’t change the byte layout; they tell what the last dimension means.
  #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
  pub struct ImageFlags: u8 {
    /// The last dimension enumerates cube map faces, in `+X, -X, +Y, -Y, +Z, -Z` order.
    const CUBE_MAP = 1 << 0;
    /// The last dimension enumerates array layers.
    const ARRAY = 1 << 1;
  }
}

/// Layout of a buffer with respect to an image size.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DataProperties {
  /// Offset of the first pixel, in bytes.
  pub offset: usize,
  /// Distance between two consecutive rows, in bytes.
  pub row_stride: usize,
  /// Distance between two consecutive slices (z), in bytes.
  pub slice_stride: usize,
  /// Minimum length of a buffer holding the image.
  pub len: usize,
}

/// Storage parameters of uncompressed pixel data.
///
/// A zero `row_length` or `image_height` means “same as the image size”.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PixelStorage {
  /// Row alignment, in bytes. One of `1`, `2`, `4` or `8`.
  pub alignment: u32,
  /// Length of a row, in pixels.
  pub row_length: u32,
  /// Height of a slice, in rows.
  pub image_height: u32,
  /// Pixels, rows and slices to skip before the image begins.
  pub skip: [u32; 3],
}

impl Default for PixelStorage {
  fn default() -> Self {
    PixelStorage {
      alignment: 4,
      row_length: 0,
      image_height: 0,
      skip: [0; 3],
    }
  }
}

impl PixelStorage {
  /// Compute the layout of an image of the given pixel size and extent.
  pub fn data_properties(&self, pixel_size: usize, size: [u32; 3]) -> DataProperties {
    debug_assert!(
      matches!(self.alignment, 1 | 2 | 4 | 8),
      "PixelStorage: expected alignment to be 1, 2, 4 or 8 but got {}",
      self.alignment
    );

    let row_length = if self.row_length > 0 {
      self.row_length
    } else {
      size[0]
    } as usize;
    let image_height = if self.image_height > 0 {
      self.image_height
    } else {
      size[1]
    } as usize;

    let alignment = self.alignment.max(1) as usize;
    let row_stride = (row_length * pixel_size).div_ceil(alignment) * alignment;
    let slice_stride = row_stride * image_height;
    let offset = self.skip[0] as usize * pixel_size
      + self.skip[1] as usize * row_stride
      + self.skip[2] as usize * slice_stride;

    let len = if is_empty(size) {
      0
    } else {
      offset + slice_stride * size[2] as usize
    };

    DataProperties {
      offset,
      row_stride,
      slice_stride,
      len,
    }
  }
}

/// Storage parameters of compressed pixel data.
///
/// Block properties left at zero fall back to the ones of the compressed format.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct CompressedPixelStorage {
  /// Length of a row, in pixels.
  pub row_length: u32,
  /// Height of a slice, in rows.
  pub image_height: u32,
  /// Pixels, rows and slices to skip before the image begins. Multiples of the block size.
  pub skip: [u32; 3],
  /// Size of a block, in pixels.
  pub block_size: [u32; 3],
  /// Size of a block, in bytes.
  pub block_data_size: u32,
}

impl CompressedPixelStorage {
  /// Whether any parameter differs from the tightly packed default.
  pub fn is_default(&self) -> bool {
    *self == CompressedPixelStorage::default()
  }

  /// Compute the layout of an image of the given format and extent.
  pub fn data_properties(&self, format: CompressedPixelFormat, size: [u32; 3]) -> DataProperties {
    let format_block_size = format.block_size();
    let block_size: [u32; 3] = std::array::from_fn(|i| {
      if self.block_size[i] == 0 {
        format_block_size[i]
      } else {
        self.block_size[i]
      }
    });
    let block_data_size = if self.block_data_size == 0 {
      format.block_data_size()
    } else {
      self.block_data_size
    } as usize;

    let row_length = if self.row_length > 0 {
      self.row_length
    } else {
      size[0]
    };
    let image_height = if self.image_height > 0 {
      self.image_height
    } else {
      size[1]
    };

    let row_stride = row_length.div_ceil(block_size[0]) as usize * block_data_size;
    let slice_stride = image_height.div_ceil(block_size[1]) as usize * row_stride;
    let offset = (self.skip[0] / block_size[0]) as usize * block_data_size
      + (self.skip[1] / block_size[1]) as usize * row_stride
      + (self.skip[2] / block_size[2]) as usize * slice_stride;

    let len = if is_empty(size) {
      0
    } else {
      offset + slice_stride * size[2].div_ceil(block_size[2]) as usize
    };

    DataProperties {
      offset,
      row_stride,
      slice_stride,
      len,
    }
  }
}

/// Errors that might happen when wrapping data into an image.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ImageError {
  /// The buffer is too small for the size and storage.
  DataTooSmall {
    /// Expected minimum length, in bytes.
    expected: usize,
    /// Actual length, in bytes.
    actual: usize,
  },
}

impl ImageError {
  pub(crate) fn check(expected: usize, actual: usize) -> Result<(), Self> {
    if actual < expected {
      Err(ImageError::DataTooSmall { expected, actual })
    } else {
      Ok(())
    }
  }
}

impl fmt::Display for ImageError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ImageError::DataTooSmall { expected, actual } => write!(
        f,
        "image data too small: expected at least {} bytes but got {}",
        expected, actual
      ),
    }
  }
}

impl error::Error for ImageError {}

/// Extend a size to three dimensions, filling missing ones with `1`.
pub(crate) fn extent<const N: usize>(size: [u32; N]) -> [u32; 3] {
  let mut extent = [1; 3];
  extent[..N].copy_from_slice(&size);
  extent
}

/// Keep the first `N` dimensions of an extent.
pub(crate) fn from_extent<const N: usize>(extent: [u32; 3]) -> [u32; N] {
  let mut size = [0; N];
  size.copy_from_slice(&extent[..N]);
  size
}

fn is_empty(size: [u32; 3]) -> bool {
  size.iter().any(|&d| d == 0)
}

/// Image owning its pixel data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Image<const N: usize> {
  storage: PixelStorage,
  format: PixelFormat,
  ty: PixelType,
  size: [u32; N],
  data: Vec<u8>,
  flags: ImageFlags,
}

impl<const N: usize> Image<N> {
  /// Empty placeholder, to be filled by a texture query.
  pub fn new(format: PixelFormat, ty: PixelType) -> Self {
    Self::with_storage(PixelStorage::default(), format, ty)
  }

  /// Empty placeholder with custom storage, to be filled by a texture query.
  pub fn with_storage(storage: PixelStorage, format: PixelFormat, ty: PixelType) -> Self {
    Image {
      storage,
      format,
      ty,
      size: [0; N],
      data: Vec::new(),
      flags: ImageFlags::empty(),
    }
  }

  /// Wrap existing data.
  pub fn from_data(
    storage: PixelStorage,
    format: PixelFormat,
    ty: PixelType,
    size: [u32; N],
    data: Vec<u8>,
  ) -> Result<Self, ImageError> {
    let expected = storage
      .data_properties(pixel_size(format, ty), extent(size))
      .len;
    ImageError::check(expected, data.len())?;

    Ok(Image {
      storage,
      format,
      ty,
      size,
      data,
      flags: ImageFlags::empty(),
    })
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

  pub fn data(&self) -> &[u8] {
    &self.data
  }

  pub fn into_data(self) -> Vec<u8> {
    self.data
  }

  /// Size of a single pixel, in bytes.
  pub fn pixel_size(&self) -> usize {
    pixel_size(self.format, self.ty)
  }

  /// Layout of the data.
  pub fn data_properties(&self) -> DataProperties {
    self
      .storage
      .data_properties(self.pixel_size(), extent(self.size))
  }

  /// Borrow as an upload view.
  pub fn as_view(&self) -> ImageView<'_, N> {
    ImageView {
      storage: self.storage,
      format: self.format,
      ty: self.ty,
      size: self.size,
      data: Some(&self.data),
      flags: self.flags,
    }
  }

  /// Resize the image, reallocating zeroed data of the required length.
  pub(crate) fn allocate(&mut self, size: [u32; N]) {
    self.size = size;
    let len = self.data_properties().len;
    self.data = vec![0; len];
  }

  pub(crate) fn as_mut_view(&mut self) -> MutableImageView<'_, N> {
    MutableImageView {
      storage: self.storage,
      format: self.format,
      ty: self.ty,
      size: self.size,
      data: Some(&mut self.data),
      flags: self.flags,
    }
  }
}

/// Immutable view on pixel data.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a, const N: usize> {
  storage: PixelStorage,
  format: PixelFormat,
  ty: PixelType,
  size: [u32; N],
  data: Option<&'a [u8]>,
  flags: ImageFlags,
}

impl<'a, const N: usize> ImageView<'a, N> {
  /// View on tightly packed data with default storage.
  pub fn new(
    format: PixelFormat,
    ty: PixelType,
    size: [u32; N],
    data: &'a [u8],
  ) -> Result<Self, ImageError> {
    Self::with_storage(PixelStorage::default(), format, ty, size, data)
  }

  /// View on data laid out according to `storage`.
  pub fn with_storage(
    storage: PixelStorage,
    format: PixelFormat,
    ty: PixelType,
    size: [u32; N],
    data: &'a [u8],
  ) -> Result<Self, ImageError> {
    let expected = storage
      .data_properties(pixel_size(format, ty), extent(size))
      .len;
    ImageError::check(expected, data.len())?;

    Ok(ImageView {
      storage,
      format,
      ty,
      size,
      data: Some(data),
      flags: ImageFlags::empty(),
    })
  }

  /// View without data.
  ///
  /// Uploading it allocates the level without initializing it.
  pub fn empty(format: PixelFormat, ty: PixelType, size: [u32; N]) -> Self {
    ImageView {
      storage: PixelStorage::default(),
      format,
      ty,
      size,
      data: None,
      flags: ImageFlags::empty(),
    }
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

  pub fn data(&self) -> Option<&'a [u8]> {
    self.data
  }

  /// Whether the view has no data.
  pub fn is_null(&self) -> bool {
    self.data.is_none()
  }

  /// Layout of the data.
  pub fn data_properties(&self) -> DataProperties {
    self
      .storage
      .data_properties(pixel_size(self.format, self.ty), extent(self.size))
  }
}

impl<'a> ImageView<'a, 3> {
  /// Two-dimensional view on a single slice.
  ///
  /// Skipped slices are folded into the start of the data.
  pub(crate) fn slice(&self, z: u32) -> ImageView<'a, 2> {
    let start = self.data_properties().slice_stride * (self.storage.skip[2] + z) as usize;

    ImageView {
      storage: PixelStorage {
        skip: [self.storage.skip[0], self.storage.skip[1], 0],
        ..self.storage
      },
      format: self.format,
      ty: self.ty,
      size: [self.size[0], self.size[1]],
      data: self.data.map(|data| &data[start.min(data.len())..]),
      flags: ImageFlags::empty(),
    }
  }
}

/// Mutable view on pixel data.
#[derive(Debug)]
pub struct MutableImageView<'a, const N: usize> {
  storage: PixelStorage,
  format: PixelFormat,
  ty: PixelType,
  size: [u32; N],
  data: Option<&'a mut [u8]>,
  flags: ImageFlags,
}

impl<'a, const N: usize> MutableImageView<'a, N> {
  /// View on tightly packed data with default storage.
  pub fn new(
    format: PixelFormat,
    ty: PixelType,
    size: [u32; N],
    data: &'a mut [u8],
  ) -> Result<Self, ImageError> {
    Self::with_storage(PixelStorage::default(), format, ty, size, data)
  }

  /// View on data laid out according to `storage`.
  pub fn with_storage(
    storage: PixelStorage,
    format: PixelFormat,
    ty: PixelType,
    size: [u32; N],
    data: &'a mut [u8],
  ) -> Result<Self, ImageError> {
    let expected = storage
      .data_properties(pixel_size(format, ty), extent(size))
      .len;
    ImageError::check(expected, data.len())?;

    Ok(MutableImageView {
      storage,
      format,
      ty,
      size,
      data: Some(data),
      flags: ImageFlags::empty(),
    })
  }

  /// View without data.
  pub fn empty(format: PixelFormat, ty: PixelType, size: [u32; N]) -> Self {
    MutableImageView {
      storage: PixelStorage::default(),
      format,
      ty,
      size,
      data: None,
      flags: ImageFlags::empty(),
    }
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

  pub fn data(&self) -> Option<&[u8]> {
    self.data.as_deref()
  }

  pub fn data_mut(&mut self) -> Option<&mut [u8]> {
    self.data.as_deref_mut()
  }

  /// Whether the view has no data.
  pub fn is_null(&self) -> bool {
    self.data.is_none()
  }

  /// Layout of the data.
  pub fn data_properties(&self) -> DataProperties {
    self
      .storage
      .data_properties(pixel_size(self.format, self.ty), extent(self.size))
  }
}

impl<'a> MutableImageView<'a, 3> {
  /// Two-dimensional mutable view on a single slice.
  pub(crate) fn slice_mut(&mut self, z: u32) -> MutableImageView<'_, 2> {
    let start = self.data_properties().slice_stride * (self.storage.skip[2] + z) as usize;

    MutableImageView {
      storage: PixelStorage {
        skip: [self.storage.skip[0], self.storage.skip[1], 0],
        ..self.storage
      },
      format: self.format,
      ty: self.ty,
      size: [self.size[0], self.size[1]],
      data: self.data.as_deref_mut().map(|data| {
        let start = start.min(data.len());
        &mut data[start..]
      }),
      flags: ImageFlags::empty(),
    }
  }
}

/// Image owning compressed data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompressedImage<const N: usize> {
  storage: CompressedPixelStorage,
  format: Option<CompressedPixelFormat>,
  size: [u32; N],
  data: Vec<u8>,
  flags: ImageFlags,
}

impl<const N: usize> Default for CompressedImage<N> {
  fn default() -> Self {
    Self::new()
  }
}

impl<const N: usize> CompressedImage<N> {
  /// Empty placeholder, to be filled by a texture query.
  pub fn new() -> Self {
    Self::with_storage(CompressedPixelStorage::default())
  }

  /// Empty placeholder with custom storage, to be filled by a texture query.
  pub fn with_storage(storage: CompressedPixelStorage) -> Self {
    CompressedImage {
      storage,
      format: None,
      size: [0; N],
      data: Vec::new(),
      flags: ImageFlags::empty(),
    }
  }

  /// Wrap existing data.
  pub fn from_data(
    storage: CompressedPixelStorage,
    format: CompressedPixelFormat,
    size: [u32; N],
    data: Vec<u8>,
  ) -> Result<Self, ImageError> {
    let expected = storage.data_properties(format, extent(size)).len;
    ImageError::check(expected, data.len())?;

    Ok(CompressedImage {
      storage,
      format: Some(format),
      size,
      data,
      flags: ImageFlags::empty(),
    })
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

  pub fn data(&self) -> &[u8] {
    &self.data
  }

  pub fn into_data(self) -> Vec<u8> {
    self.data
  }

  /// Borrow as an upload view.
  ///
  /// Returns `None` for an unfilled placeholder.
  pub fn as_view(&self) -> Option<CompressedImageView<'_, N>> {
    let format = self.format?;

    Some(CompressedImageView {
      storage: self.storage,
      format,
      size: self.size,
      data: Some(&self.data),
      flags: self.flags,
    })
  }

  pub(crate) fn allocate(&mut self, format: CompressedPixelFormat, size: [u32; N], len: usize) {
    self.format = Some(format);
    self.size = size;
    self.data = vec![0; len];
  }

  pub(crate) fn data_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }
}

/// Immutable view on compressed data.
#[derive(Clone, Copy, Debug)]
pub struct CompressedImageView<'a, const N: usize> {
  storage: CompressedPixelStorage,
  format: CompressedPixelFormat,
  size: [u32; N],
  data: Option<&'a [u8]>,
  flags: ImageFlags,
}

impl<'a, const N: usize> CompressedImageView<'a, N> {
  /// View on tightly packed data.
  pub fn new(
    format: CompressedPixelFormat,
    size: [u32; N],
    data: &'a [u8],
  ) -> Result<Self, ImageError> {
    Self::with_storage(CompressedPixelStorage::default(), format, size, data)
  }

  /// View on data laid out according to `storage`.
  pub fn with_storage(
    storage: CompressedPixelStorage,
    format: CompressedPixelFormat,
    size: [u32; N],
    data: &'a [u8],
  ) -> Result<Self, ImageError> {
    let expected = storage.data_properties(format, extent(size)).len;
    ImageError::check(expected, data.len())?;

    Ok(CompressedImageView {
      storage,
      format,
      size,
      data: Some(data),
      flags: ImageFlags::empty(),
    })
  }

  /// Set the image flags.
  pub fn with_flags(mut self, flags: ImageFlags) -> Self {
    self.flags = flags;
    self
  }

  pub fn storage(&self) -> CompressedPixelStorage {
    self.storage
  }

  pub fn format(&self) -> CompressedPixelFormat {
    self.format
  }

  pub fn size(&self) -> [u32; N] {
    self.size
  }

  pub fn flags(&self) -> ImageFlags {
    self.flags
  }

  pub fn data(&self) -> Option<&'a [u8]> {
    self.data
  }

  pub fn is_null(&self) -> bool {
    self.data.is_none()
  }

  /// Layout of the data.
  pub fn data_properties(&self) -> DataProperties {
    self.storage.data_properties(self.format, extent(self.size))
  }
}

/// Mutable view on compressed data.
#[derive(Debug)]
pub struct MutableCompressedImageView<'a, const N: usize> {
  storage: CompressedPixelStorage,
  format: CompressedPixelFormat,
  size: [u32; N],
  data: Option<&'a mut [u8]>,
  flags: ImageFlags,
}

impl<'a, const N: usize> MutableCompressedImageView<'a, N> {
  /// View on tightly packed data.
  pub fn new(
    format: CompressedPixelFormat,
    size: [u32; N],
    data: &'a mut [u8],
  ) -> Result<Self, ImageError> {
    Self::with_storage(CompressedPixelStorage::default(), format, size, data)
  }

  /// View on data laid out according to `storage`.
  pub fn with_storage(
    storage: CompressedPixelStorage,
    format: CompressedPixelFormat,
    size: [u32; N],
    data: &'a mut [u8],
  ) -> Result<Self, ImageError> {
    let expected = storage.data_properties(format, extent(size)).len;
    ImageError::check(expected, data.len())?;

    Ok(MutableCompressedImageView {
      storage,
      format,
      size,
      data: Some(data),
      flags: ImageFlags::empty(),
    })
  }

  /// View without data.
  pub fn empty(format: CompressedPixelFormat, size: [u32; N]) -> Self {
    MutableCompressedImageView {
      storage: CompressedPixelStorage::default(),
      format,
      size,
      data: None,
      flags: ImageFlags::empty(),
    }
  }

  pub fn storage(&self) -> CompressedPixelStorage {
    self.storage
  }

  pub fn format(&self) -> CompressedPixelFormat {
    self.format
  }

  pub fn size(&self) -> [u32; N] {
    self.size
  }

  pub fn flags(&self) -> ImageFlags {
    self.flags
  }

  pub fn data(&self) -> Option<&[u8]> {
    self.data.as_deref()
  }

  pub fn data_mut(&mut self) -> Option<&mut [u8]> {
    self.data.as_deref_mut()
  }

  pub fn is_null(&self) -> bool {
    self.data.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_storage_pads_rows() {
    let props = PixelStorage::default().data_properties(3, [3, 2, 1]);

    assert_eq!(props.offset, 0);
    assert_eq!(props.row_stride, 12);
    assert_eq!(props.len, 24);
  }

  #[test]
  fn skips_and_row_length() {
    let storage = PixelStorage {
      alignment: 1,
      row_length: 8,
      image_height: 0,
      skip: [2, 1, 0],
    };
    let props = storage.data_properties(4, [4, 4, 1]);

    assert_eq!(props.row_stride, 32);
    assert_eq!(props.offset, 2 * 4 + 32);
    assert_eq!(props.len, props.offset + 32 * 4);
  }

  #[test]
  fn empty_size_needs_no_data() {
    assert_eq!(PixelStorage::default().data_properties(4, [0, 16, 1]).len, 0);
  }

  #[test]
  fn compressed_rounds_up_to_blocks() {
    let props = CompressedPixelStorage::default()
      .data_properties(CompressedPixelFormat::RGBAS3tcDxt1, [6, 5, 1]);

    assert_eq!(props.row_stride, 2 * 8);
    assert_eq!(props.len, 2 * 2 * 8);
  }

  #[test]
  fn zero_block_components_fall_back_to_the_format() {
    let storage = CompressedPixelStorage {
      skip: [0, 0, 1],
      block_size: [4, 4, 0],
      block_data_size: 8,
      ..CompressedPixelStorage::default()
    };
    let props = storage.data_properties(CompressedPixelFormat::RGBAS3tcDxt1, [8, 4, 2]);

    assert_eq!(props.row_stride, 2 * 8);
    assert_eq!(props.slice_stride, 2 * 8);
    assert_eq!(props.offset, 2 * 8);
    assert_eq!(props.len, 2 * 8 + 2 * 2 * 8);
  }

  #[test]
  fn view_rejects_short_data() {
    let data = [0; 15];
    let err = ImageView::new(PixelFormat::RGBA, PixelType::UnsignedByte, [2, 2], &data).unwrap_err();

    assert_eq!(
      err,
      ImageError::DataTooSmall {
        expected: 16,
        actual: 15
      }
    );
  }

  #[test]
  fn extents() {
    assert_eq!(extent([4, 2]), [4, 2, 1]);
    assert_eq!(from_extent::<2>([4, 2, 1]), [4, 2]);
  }
}
