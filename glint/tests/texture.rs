mod common;

use glint::backend::buffer::{BufferTarget, BufferUsage};
use glint::backend::headless::{Headless, HeadlessConfig};
use glint::backend::texture::{CubeMapCoordinate, TextureTarget};
use glint::buffer::{BufferImage, CompressedBufferImage};
use glint::context::{Configuration, Extension};
use glint::image::{
  CompressedImageView, CompressedPixelStorage, Image, ImageFlags, ImageView, PixelStorage,
};
use glint::object::{GraphicsObject, ObjectFlags};
use glint::pixel::{
  CompressedPixelFormat, ImageAccess, ImageFormat, PixelFormat, PixelType, TextureFormat,
};
use glint::texture::{
  AbstractTexture, CubeMapTexture, CubeMapTextureArray, MultisampleTexture2D,
  MultisampleTexture2DArray, Texture1D, Texture1DArray, Texture2D, Texture2DArray, Texture3D,
};

use common::{assert_no_driver_errors, calls, context, context_with};

fn rgba8(size: [u32; 2], data: &[u8]) -> ImageView<'_, 2> {
  ImageView::new(PixelFormat::RGBA, PixelType::UnsignedByte, size, data).unwrap()
}

fn rgb8(size: [u32; 2], data: &[u8]) -> ImageView<'_, 2> {
  ImageView::new(PixelFormat::RGB, PixelType::UnsignedByte, size, data).unwrap()
}

#[test]
fn binding_twice_is_a_cache_hit() {
  let ctx = context();
  let texture = Texture2D::new(&ctx);

  texture.bind(3);
  texture.bind(3);

  assert_eq!(calls(&ctx, "bind_texture"), 1);
  assert_eq!(
    ctx.backend().bound_texture(3, TextureTarget::Texture2D),
    texture.id()
  );

  // the same texture on another unit is another slot
  texture.bind(4);
  assert_eq!(calls(&ctx, "bind_texture"), 2);

  ctx.reset_state();
  texture.bind(3);
  assert_eq!(calls(&ctx, "bind_texture"), 3);

  assert_no_driver_errors(&ctx);
}

#[test]
fn dropping_a_bound_texture_clears_the_cache() {
  let ctx = context();

  let first = Texture2D::new(&ctx);
  first.bind(0);
  drop(first);
  assert_eq!(ctx.state().bound_texture(0), Some(0));

  // drivers recycle ids, so the next texture may well get the same one
  let second = Texture2D::new(&ctx);
  second.bind(0);

  assert_eq!(calls(&ctx, "bind_texture"), 2);
  assert_eq!(ctx.state().bound_texture(0), Some(second.id()));
  assert_no_driver_errors(&ctx);
}

/// Bind three textures of different targets around a hole and report the resulting bindings.
fn bind_many_bindings(configuration: Configuration) -> (Vec<u32>, usize, usize) {
  let ctx = context_with(HeadlessConfig::default(), configuration);

  let a = Texture2D::new(&ctx);
  let b = Texture3D::new(&ctx);
  let c = CubeMapTexture::new(&ctx);

  let textures = [
    Some(a.as_abstract()),
    None,
    Some(b.as_abstract()),
    Some(c.as_abstract()),
  ];
  AbstractTexture::bind_many(&ctx, 2, &textures);
  AbstractTexture::bind_many(&ctx, 2, &textures);

  let backend = ctx.backend();
  let bindings = vec![
    backend.bound_texture(2, TextureTarget::Texture2D),
    backend.bound_texture(3, TextureTarget::Texture2D),
    backend.bound_texture(4, TextureTarget::Texture3D),
    backend.bound_texture(5, TextureTarget::CubeMap),
  ];
  let counts = (
    backend.call_count("bind_textures"),
    backend.call_count("bind_texture"),
  );
  drop(backend);

  assert_no_driver_errors(&ctx);
  (bindings, counts.0, counts.1)
}

#[test]
fn multi_bind_and_fallback_agree() {
  let (multi, multi_calls, single_calls) = bind_many_bindings(Configuration::new());
  assert_eq!(multi, [1, 0, 2, 3]);
  // the second bind changes nothing
  assert_eq!(multi_calls, 1);
  assert_eq!(single_calls, 0);

  let (fallback, multi_calls, _) =
    bind_many_bindings(Configuration::new().disable_extension(Extension::ArbMultiBind));
  assert_eq!(fallback, multi);
  assert_eq!(multi_calls, 0);
}

#[test]
fn unbind_range_clears_units() {
  let ctx = context();
  let a = Texture2D::new(&ctx);
  let b = Texture2D::new(&ctx);

  a.bind(0);
  b.bind(1);
  AbstractTexture::unbind_range(&ctx, 0, 2);

  assert_eq!(ctx.backend().bound_texture(0, TextureTarget::Texture2D), 0);
  assert_eq!(ctx.backend().bound_texture(1, TextureTarget::Texture2D), 0);
  assert_eq!(ctx.state().bound_texture(1), Some(0));
  assert_no_driver_errors(&ctx);
}

#[test]
fn upload_with_skip_and_row_length() {
  let ctx = context();
  let mut texture = Texture2D::new(&ctx);
  texture.set_storage(1, TextureFormat::RGBA8, [3, 2]);

  // rows of four pixels, the first one skipped
  let storage = PixelStorage {
    alignment: 1,
    row_length: 4,
    skip: [1, 0, 0],
    ..PixelStorage::default()
  };
  let data = (0..36).collect::<Vec<u8>>();
  let view = ImageView::with_storage(
    storage,
    PixelFormat::RGBA,
    PixelType::UnsignedByte,
    [3, 2],
    &data,
  )
  .unwrap();
  texture.set_sub_image(0, [0, 0], view);

  let image = texture.image(0, Image::new(PixelFormat::RGBA, PixelType::UnsignedByte));
  assert_eq!(image.size(), [3, 2]);

  let expected = [&data[4..16], &data[20..32]].concat();
  assert_eq!(image.data(), &expected[..]);
  assert_no_driver_errors(&ctx);
}

#[test]
fn download_with_skip() {
  let ctx = context();
  let mut texture = Texture2D::new(&ctx);
  texture.set_storage(1, TextureFormat::RGBA8, [3, 2]);

  let data = (100..124).collect::<Vec<u8>>();
  texture.set_sub_image(0, [0, 0], rgba8([3, 2], &data));

  let storage = PixelStorage {
    alignment: 1,
    skip: [1, 1, 0],
    ..PixelStorage::default()
  };
  let image = texture.image(
    0,
    Image::with_storage(storage, PixelFormat::RGBA, PixelType::UnsignedByte),
  );

  // one row plus one pixel skipped
  assert_eq!(image.data().len(), 16 + 2 * 12);
  assert!(image.data()[..16].iter().all(|&byte| byte == 0));
  assert_eq!(&image.data()[16..28], &data[..12]);
  assert_eq!(&image.data()[28..40], &data[12..]);
  assert_no_driver_errors(&ctx);
}

#[test]
fn editing_while_another_texture_is_bound() {
  let ctx = context();

  let mut first = Texture2D::new(&ctx);
  first.set_storage(1, TextureFormat::RGBA8, [1, 1]);
  first.set_sub_image(0, [0, 0], rgba8([1, 1], &[1; 4]));

  // the second texture ends up on the last unit, the first one on the active unit
  let mut second = Texture2D::new(&ctx);
  second.set_storage(1, TextureFormat::RGBA8, [1, 1]);
  first.bind(0);
  second.set_sub_image(0, [0, 0], rgba8([1, 1], &[9; 4]));

  let format = || Image::new(PixelFormat::RGBA, PixelType::UnsignedByte);
  assert_eq!(first.image(0, format()).data(), &[1; 4]);
  assert_eq!(second.image(0, format()).data(), &[9; 4]);
  assert_eq!(ctx.state().bound_texture(0), Some(first.id()));
  assert_no_driver_errors(&ctx);
}

#[test]
fn buffer_image_transfers() {
  let ctx = context();
  let data = (0..16).collect::<Vec<u8>>();

  let source = BufferImage::new(
    &ctx,
    PixelFormat::RGBA,
    PixelType::UnsignedByte,
    [2, 2],
    &data,
    BufferUsage::StaticDraw,
  )
  .unwrap();

  let mut texture = Texture2D::new(&ctx);
  texture.set_buffer_image(0, TextureFormat::RGBA8, &source);
  assert_eq!(texture.image_size(0), [2, 2]);

  let mut result = BufferImage::empty(&ctx, PixelFormat::RGBA, PixelType::UnsignedByte);
  texture.buffer_image(0, &mut result, BufferUsage::StaticRead);
  assert_eq!(result.size(), [2, 2]);
  assert_eq!(result.data_size(), 16);
  assert_eq!(result.buffer().data(), data);

  // a client upload right after must not read from the still bound buffer
  texture.set_sub_image(0, [1, 1], rgba8([1, 1], &[7; 4]));
  assert_eq!(ctx.backend().bound_buffer(BufferTarget::PixelUnpack), 0);

  let image = texture.image(0, Image::new(PixelFormat::RGBA, PixelType::UnsignedByte));
  assert_eq!(&image.data()[12..], &[7; 4]);

  // a second query fits in the buffer already there
  texture.buffer_image(0, &mut result, BufferUsage::StaticRead);
  assert_eq!(calls(&ctx, "buffer_data"), 2);
  assert_eq!(&result.buffer().data()[12..], &[7; 4]);

  assert_no_driver_errors(&ctx);
}

#[test]
fn compressed_buffer_image_transfers() {
  let ctx = context();
  let dxt1 = CompressedPixelFormat::RGBS3tcDxt1;
  let blocks = (0..8).collect::<Vec<u8>>();

  let source =
    CompressedBufferImage::new(&ctx, dxt1, [4, 4], &blocks, BufferUsage::StaticDraw).unwrap();

  let mut texture = Texture2D::new(&ctx);
  texture.set_compressed_buffer_image(0, &source);
  assert_eq!(texture.image_size(0), [4, 4]);

  let mut result = CompressedBufferImage::empty(&ctx);
  texture.compressed_buffer_image(0, &mut result, BufferUsage::StaticRead);
  assert_eq!(result.format(), Some(dxt1));
  assert_eq!(result.size(), [4, 4]);
  assert_eq!(result.buffer().data(), blocks);

  assert_no_driver_errors(&ctx);
}

#[test]
fn compressed_transfers_share_storage_registers() {
  let ctx = context();

  let mut rgb = Texture2D::new(&ctx);
  rgb.set_storage(1, TextureFormat::RGB8, [3, 2]);

  // rows of nine bytes padded to twelve
  let data = (0..24).collect::<Vec<u8>>();
  rgb.set_sub_image(0, [0, 0], rgb8([3, 2], &data));

  let dxt5 = CompressedPixelFormat::RGBAS3tcDxt5;
  let mut compressed = Texture2D::new(&ctx);
  compressed.set_storage(1, TextureFormat::Compressed(dxt5), [4, 4]);

  let blocks = [5; 64];
  let storage = CompressedPixelStorage {
    row_length: 16,
    ..CompressedPixelStorage::default()
  };
  let view = CompressedImageView::with_storage(storage, dxt5, [4, 4], &blocks).unwrap();
  compressed.set_compressed_sub_image(0, [0, 0], view);

  let data = (100..124).collect::<Vec<u8>>();
  rgb.set_sub_image(0, [0, 0], rgb8([3, 2], &data));

  let image = rgb.image(0, Image::new(PixelFormat::RGB, PixelType::UnsignedByte));
  assert_eq!(&image.data()[..9], &data[..9]);
  assert_eq!(&image.data()[12..21], &data[12..21]);

  assert_eq!(calls(&ctx, "set_compressed_pixel_storage"), 1);
  assert_eq!(calls(&ctx, "set_pixel_storage"), 1);
  assert_no_driver_errors(&ctx);
}

#[test]
fn storage_change_is_applied_once() {
  let ctx = context();
  let mut texture = Texture2D::new(&ctx);
  texture.set_storage(1, TextureFormat::RGBA8, [4, 4]);

  let storage = PixelStorage {
    alignment: 1,
    row_length: 8,
    ..PixelStorage::default()
  };
  let data = vec![7; 4 * 8 * 4];

  for y in 0..2 {
    let view = ImageView::with_storage(
      storage,
      PixelFormat::RGBA,
      PixelType::UnsignedByte,
      [4, 2],
      &data[..8 * 4 * 2],
    )
    .unwrap();
    texture.set_sub_image(0, [0, y * 2], view);
  }

  assert_eq!(calls(&ctx, "tex_sub_image"), 2);
  assert_eq!(calls(&ctx, "set_pixel_storage"), 1);
  assert_no_driver_errors(&ctx);
}

#[test]
fn missing_levels_have_zero_size() {
  let ctx = context();

  assert_eq!(Texture1D::new(&ctx).image_size(0), [0]);
  assert_eq!(Texture2D::new(&ctx).image_size(0), [0, 0]);
  assert_eq!(Texture3D::new(&ctx).image_size(0), [0, 0, 0]);
  assert_eq!(Texture1DArray::new(&ctx).image_size(0), [0, 0]);
  assert_eq!(Texture2DArray::new(&ctx).image_size(0), [0, 0, 0]);
  assert_eq!(CubeMapTexture::new(&ctx).image_size(0), [0, 0]);
  assert_eq!(CubeMapTextureArray::new(&ctx).image_size(0), [0, 0, 0]);
  assert_eq!(MultisampleTexture2D::new(&ctx).image_size(), [0, 0]);
  assert_eq!(MultisampleTexture2DArray::new(&ctx).image_size(), [0, 0, 0]);

  let mut texture = Texture2D::new(&ctx);
  texture.set_storage(2, TextureFormat::R8, [4, 4]);
  assert_eq!(texture.image_size(1), [2, 2]);
  assert_eq!(texture.image_size(2), [0, 0]);

  assert_no_driver_errors(&ctx);
}

#[test]
fn storage_without_texture_storage_extension() {
  let ctx = context_with(HeadlessConfig::gl33(), Configuration::new());

  let mut texture = CubeMapTexture::new(&ctx);
  texture.set_storage(3, TextureFormat::RGBA8, [8, 8]);

  assert_eq!(calls(&ctx, "tex_storage"), 0);
  // three levels of six faces
  assert_eq!(calls(&ctx, "tex_image"), 18);
  assert_eq!(texture.image_size(2), [2, 2]);
  assert_no_driver_errors(&ctx);
}

#[test]
fn lazy_creation_without_direct_state_access() {
  let ctx = context_with(
    HeadlessConfig::default(),
    Configuration::new().disable_extension(Extension::ArbDirectStateAccess),
  );

  let texture = Texture2D::new(&ctx);
  assert_eq!(calls(&ctx, "gen_texture"), 1);
  assert!(!texture.flags().contains(ObjectFlags::CREATED));

  texture.as_abstract().create_if_not_already();
  assert!(texture.flags().contains(ObjectFlags::CREATED));
  assert_eq!(calls(&ctx, "bind_texture"), 1);

  // already created
  texture.as_abstract().create_if_not_already();
  assert_eq!(calls(&ctx, "bind_texture"), 1);

  let texture = Texture2D::new(&ctx);
  texture.bind(0);
  assert!(texture.flags().contains(ObjectFlags::CREATED));

  assert_no_driver_errors(&ctx);
}

#[test]
fn view_on_a_level_range() {
  let ctx = context();
  let mut source = Texture2D::new(&ctx);
  source.set_storage(5, TextureFormat::RGBA8, [32, 32]);

  let view = Texture2D::view(&ctx, &source, TextureFormat::RGBA8, 2, 2);

  assert_eq!(view.image_size(0), [8, 8]);
  assert_eq!(view.image_size(1), [4, 4]);
  assert_eq!(view.image_size(2), [0, 0]);
  assert!(view.as_abstract().is_immutable());
  assert_no_driver_errors(&ctx);
}

#[test]
fn view_shares_the_source_data() {
  let ctx = context();
  let mut source = Texture2DArray::new(&ctx);
  source.set_storage(1, TextureFormat::RGBA8, [2, 2, 4]);

  let layer = [9; 16];
  source.set_sub_image(
    0,
    [0, 0, 2],
    ImageView::new(PixelFormat::RGBA, PixelType::UnsignedByte, [2, 2, 1], &layer).unwrap(),
  );

  let view = Texture2DArray::view_layers(&ctx, &source, TextureFormat::RGBA8, 0, 1, 2, 1);
  let image = view.image(0, Image::new(PixelFormat::RGBA, PixelType::UnsignedByte));

  assert_eq!(image.size(), [2, 2, 1]);
  assert_eq!(image.data(), &layer[..]);
  assert_no_driver_errors(&ctx);
}

#[test]
fn labels() {
  let ctx = context();
  let mut texture = Texture2D::new(&ctx);

  assert_eq!(texture.label(), "");
  texture.set_label("albedo");
  assert_eq!(texture.label(), "albedo");
  assert_no_driver_errors(&ctx);
}

#[test]
fn labels_are_empty_on_webgl() {
  let ctx = context_with(HeadlessConfig::webgl2(), Configuration::new());
  let mut texture = Texture2D::new(&ctx);

  texture.set_label("albedo");

  assert_eq!(texture.label(), "");
  assert_eq!(calls(&ctx, "object_label"), 0);
  assert_eq!(calls(&ctx, "get_object_label"), 0);
  assert_no_driver_errors(&ctx);
}

#[test]
fn uncompressed_formats_have_no_blocks() {
  assert_eq!(
    Texture2D::<Headless>::compressed_block_size(TextureFormat::RGBA8),
    [0, 0]
  );
  assert_eq!(
    CubeMapTexture::<Headless>::compressed_block_data_size(TextureFormat::R32F),
    0
  );

  let dxt5 = TextureFormat::Compressed(CompressedPixelFormat::RGBAS3tcDxt5);
  assert_eq!(Texture3D::<Headless>::compressed_block_size(dxt5), [4, 4, 1]);
  assert_eq!(
    Texture2DArray::<Headless>::compressed_block_data_size(dxt5),
    16
  );
}

#[test]
fn cube_map_array_layer_faces() {
  let slice = CubeMapTextureArray::<Headless>::layer_face(1, CubeMapCoordinate::NegativeY);
  assert_eq!(slice, 9);

  let ctx = context();
  let mut texture = CubeMapTextureArray::new(&ctx);
  texture.set_storage(1, TextureFormat::RGBA8, [2, 2, 12]);

  let face = [0xab; 16];
  texture.set_sub_image(
    0,
    [0, 0, slice],
    ImageView::new(PixelFormat::RGBA, PixelType::UnsignedByte, [2, 2, 1], &face).unwrap(),
  );

  let image = texture.image(0, Image::new(PixelFormat::RGBA, PixelType::UnsignedByte));
  assert_eq!(image.size(), [2, 2, 12]);

  for (index, slice) in image.data().chunks(16).enumerate() {
    let expected = if index == 9 { 0xab } else { 0 };
    assert!(slice.iter().all(|&byte| byte == expected), "slice {}", index);
  }

  assert_no_driver_errors(&ctx);
}

#[test]
fn cube_map_as_a_whole() {
  let ctx = context();
  let mut texture = CubeMapTexture::new(&ctx);
  texture.set_storage(1, TextureFormat::RGBA8, [1, 1]);

  texture.set_sub_image(CubeMapCoordinate::NegativeZ, 0, [0, 0], rgba8([1, 1], &[1, 2, 3, 4]));

  let image = texture.image_3d(0, Image::new(PixelFormat::RGBA, PixelType::UnsignedByte));
  assert_eq!(image.size(), [1, 1, 6]);
  assert!(image.flags().contains(ImageFlags::CUBE_MAP));
  assert_eq!(&image.data()[20..24], &[1, 2, 3, 4]);
  assert!(image.data()[..20].iter().all(|&byte| byte == 0));

  let face = texture.image(
    CubeMapCoordinate::NegativeZ,
    0,
    Image::new(PixelFormat::RGBA, PixelType::UnsignedByte),
  );
  assert_eq!(face.data(), &[1, 2, 3, 4]);

  assert_no_driver_errors(&ctx);
}

#[test]
fn image_units() {
  let ctx = context();
  let mut texture = Texture2D::new(&ctx);
  texture.set_storage(1, TextureFormat::RGBA32F, [4, 4]);

  texture.bind_image(2, 0, ImageAccess::WriteOnly, ImageFormat::RGBA32F);
  texture.bind_image(2, 0, ImageAccess::WriteOnly, ImageFormat::RGBA32F);
  assert_eq!(calls(&ctx, "bind_image_texture"), 1);

  let binding = ctx.backend().bound_image(2);
  assert_eq!(binding.texture, texture.id());
  assert_eq!(binding.access, ImageAccess::WriteOnly);

  AbstractTexture::bind_images(&ctx, 0, &[Some(texture.as_abstract()), None]);
  let binding = ctx.backend().bound_image(0);
  assert_eq!(binding.texture, texture.id());
  assert!(binding.layered);
  assert_eq!(binding.access, ImageAccess::ReadWrite);
  assert_eq!(binding.format, ImageFormat::RGBA32F);

  AbstractTexture::unbind_images(&ctx, 0, 3);
  assert_eq!(ctx.backend().bound_image(2).texture, 0);

  assert_no_driver_errors(&ctx);
}

#[test]
fn release_hands_the_id_over() {
  let ctx = context();
  let mut texture = Texture2D::new(&ctx);
  let id = texture.id();

  assert_eq!(texture.release(), id);
  assert_eq!(texture.release(), 0);
  assert_eq!(texture.id(), 0);
  drop(texture);

  assert!(ctx.backend().texture_exists(id));
  assert_eq!(calls(&ctx, "delete_texture"), 0);

  // adopt it back
  let texture = Texture2D::wrap(&ctx, id, ObjectFlags::DELETE_ON_DESTRUCTION);
  let moved = texture;
  drop(moved);

  assert!(!ctx.backend().texture_exists(id));
  assert_eq!(calls(&ctx, "delete_texture"), 1);
  assert_no_driver_errors(&ctx);
}

#[test]
fn wrapped_textures_are_kept() {
  let ctx = context();
  let mut texture = Texture2D::new(&ctx);
  let id = texture.release();

  drop(Texture2D::wrap(&ctx, id, ObjectFlags::CREATED));

  assert!(ctx.backend().texture_exists(id));
  assert_no_driver_errors(&ctx);
}
