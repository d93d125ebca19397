use gl::types::*;
use glint::backend::texture::{
  ImageTarget, LevelParameter, StorageDirection, TextureBackend, TextureParameter, TextureTarget,
  WrapCoordinate,
};
use glint::image::{CompressedPixelStorage, PixelStorage};
use glint::pixel::{
  CompressedPixelFormat, ImageAccess, ImageFormat, PixelFormat, PixelType, TextureFormat,
};
use std::ffi::c_void;
use std::ptr;

use crate::opengl::pixel::{
  image_dimensions, opengl_compressed_format, opengl_image_access, opengl_image_format,
  opengl_image_target, opengl_mag_filter, opengl_min_filter, opengl_pixel_format,
  opengl_pixel_type, opengl_target, opengl_texture_format, opengl_wrap, storage_dimensions,
  texture_format_from_opengl,
};
use crate::opengl::GL;

fn gl_bool(value: bool) -> GLboolean {
  if value {
    gl::TRUE
  } else {
    gl::FALSE
  }
}

unsafe fn set_pixel_storage(direction: StorageDirection, storage: &PixelStorage) {
  let names = match direction {
    StorageDirection::Pack => [
      gl::PACK_ALIGNMENT,
      gl::PACK_ROW_LENGTH,
      gl::PACK_IMAGE_HEIGHT,
      gl::PACK_SKIP_PIXELS,
      gl::PACK_SKIP_ROWS,
      gl::PACK_SKIP_IMAGES,
    ],
    StorageDirection::Unpack => [
      gl::UNPACK_ALIGNMENT,
      gl::UNPACK_ROW_LENGTH,
      gl::UNPACK_IMAGE_HEIGHT,
      gl::UNPACK_SKIP_PIXELS,
      gl::UNPACK_SKIP_ROWS,
      gl::UNPACK_SKIP_IMAGES,
    ],
  };

  let values = [
    storage.alignment,
    storage.row_length,
    storage.image_height,
    storage.skip[0],
    storage.skip[1],
    storage.skip[2],
  ];

  for (name, value) in names.into_iter().zip(values) {
    gl::PixelStorei(name, value as GLint);
  }
}

unsafe fn set_compressed_pixel_storage(
  direction: StorageDirection,
  storage: &CompressedPixelStorage,
) {
  // row length, image height and skips are shared with uncompressed storage
  set_pixel_storage(
    direction,
    &PixelStorage {
      alignment: 1,
      row_length: storage.row_length,
      image_height: storage.image_height,
      skip: storage.skip,
    },
  );

  let names = match direction {
    StorageDirection::Pack => [
      gl::PACK_COMPRESSED_BLOCK_WIDTH,
      gl::PACK_COMPRESSED_BLOCK_HEIGHT,
      gl::PACK_COMPRESSED_BLOCK_DEPTH,
      gl::PACK_COMPRESSED_BLOCK_SIZE,
    ],
    StorageDirection::Unpack => [
      gl::UNPACK_COMPRESSED_BLOCK_WIDTH,
      gl::UNPACK_COMPRESSED_BLOCK_HEIGHT,
      gl::UNPACK_COMPRESSED_BLOCK_DEPTH,
      gl::UNPACK_COMPRESSED_BLOCK_SIZE,
    ],
  };

  let values = [
    storage.block_size[0],
    storage.block_size[1],
    storage.block_size[2],
    storage.block_data_size,
  ];

  for (name, value) in names.into_iter().zip(values) {
    gl::PixelStorei(name, value as GLint);
  }
}

// With a pixel unpack buffer bound, `data` is an offset into it.
unsafe fn tex_image(
  target: ImageTarget,
  level: u32,
  internal_format: TextureFormat,
  size: [u32; 3],
  format: PixelFormat,
  ty: PixelType,
  data: *const c_void,
) {
  let gl_target = opengl_image_target(target);
  let level = level as GLint;
  let internal = opengl_texture_format(internal_format) as GLint;
  let [w, h, d] = size.map(|s| s as GLsizei);
  let format = opengl_pixel_format(format);
  let ty = opengl_pixel_type(ty);

  match image_dimensions(target) {
    1 => gl::TexImage1D(gl_target, level, internal, w, 0, format, ty, data),
    2 => gl::TexImage2D(gl_target, level, internal, w, h, 0, format, ty, data),
    _ => gl::TexImage3D(gl_target, level, internal, w, h, d, 0, format, ty, data),
  }
}

unsafe fn tex_sub_image(
  target: ImageTarget,
  level: u32,
  offset: [u32; 3],
  size: [u32; 3],
  format: PixelFormat,
  ty: PixelType,
  data: *const c_void,
) {
  let gl_target = opengl_image_target(target);
  let level = level as GLint;
  let [x, y, z] = offset.map(|o| o as GLint);
  let [w, h, d] = size.map(|s| s as GLsizei);
  let format = opengl_pixel_format(format);
  let ty = opengl_pixel_type(ty);

  match image_dimensions(target) {
    1 => gl::TexSubImage1D(gl_target, level, x, w, format, ty, data),
    2 => gl::TexSubImage2D(gl_target, level, x, y, w, h, format, ty, data),
    _ => gl::TexSubImage3D(gl_target, level, x, y, z, w, h, d, format, ty, data),
  }
}

unsafe fn compressed_tex_image(
  target: ImageTarget,
  level: u32,
  format: CompressedPixelFormat,
  size: [u32; 3],
  len: usize,
  data: *const c_void,
) {
  let gl_target = opengl_image_target(target);
  let level = level as GLint;
  let format = opengl_compressed_format(format);
  let [w, h, d] = size.map(|s| s as GLsizei);
  let len = len as GLsizei;

  match image_dimensions(target) {
    1 => gl::CompressedTexImage1D(gl_target, level, format, w, 0, len, data),
    2 => gl::CompressedTexImage2D(gl_target, level, format, w, h, 0, len, data),
    _ => gl::CompressedTexImage3D(gl_target, level, format, w, h, d, 0, len, data),
  }
}

unsafe fn compressed_tex_sub_image(
  target: ImageTarget,
  level: u32,
  offset: [u32; 3],
  size: [u32; 3],
  format: CompressedPixelFormat,
  len: usize,
  data: *const c_void,
) {
  let gl_target = opengl_image_target(target);
  let level = level as GLint;
  let [x, y, z] = offset.map(|o| o as GLint);
  let [w, h, d] = size.map(|s| s as GLsizei);
  let format = opengl_compressed_format(format);
  let len = len as GLsizei;

  match image_dimensions(target) {
    1 => gl::CompressedTexSubImage1D(gl_target, level, x, w, format, len, data),
    2 => gl::CompressedTexSubImage2D(gl_target, level, x, y, w, h, format, len, data),
    _ => gl::CompressedTexSubImage3D(gl_target, level, x, y, z, w, h, d, format, len, data),
  }
}

unsafe impl TextureBackend for GL {
  unsafe fn gen_texture(&mut self) -> u32 {
    let mut id = 0;
    gl::GenTextures(1, &mut id);
    id
  }

  unsafe fn create_texture(&mut self, target: TextureTarget) -> u32 {
    let mut id = 0;
    gl::CreateTextures(opengl_target(target), 1, &mut id);
    id
  }

  unsafe fn delete_texture(&mut self, id: u32) {
    gl::DeleteTextures(1, &id);
  }

  unsafe fn active_texture(&mut self, unit: u32) {
    gl::ActiveTexture(gl::TEXTURE0 + unit);
  }

  unsafe fn bind_texture(&mut self, target: TextureTarget, id: u32) {
    gl::BindTexture(opengl_target(target), id);
  }

  unsafe fn bind_textures(&mut self, first_unit: u32, ids: &[u32]) {
    gl::BindTextures(first_unit, ids.len() as GLsizei, ids.as_ptr());
  }

  unsafe fn bind_image_texture(
    &mut self,
    unit: u32,
    id: u32,
    level: u32,
    layered: bool,
    layer: u32,
    access: ImageAccess,
    format: ImageFormat,
  ) {
    gl::BindImageTexture(
      unit,
      id,
      level as GLint,
      gl_bool(layered),
      layer as GLint,
      opengl_image_access(access),
      opengl_image_format(format),
    );
  }

  unsafe fn bind_image_textures(&mut self, first_unit: u32, ids: &[u32]) {
    gl::BindImageTextures(first_unit, ids.len() as GLsizei, ids.as_ptr());
  }

  unsafe fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter) {
    let (name, value) = match parameter {
      TextureParameter::BaseLevel(level) => (gl::TEXTURE_BASE_LEVEL, level as GLint),
      TextureParameter::MaxLevel(level) => (gl::TEXTURE_MAX_LEVEL, level as GLint),
      TextureParameter::MinFilter(filter) => {
        (gl::TEXTURE_MIN_FILTER, opengl_min_filter(filter) as GLint)
      }
      TextureParameter::MagFilter(filter) => {
        (gl::TEXTURE_MAG_FILTER, opengl_mag_filter(filter) as GLint)
      }
      TextureParameter::Wrap(coordinate, wrap) => {
        let name = match coordinate {
          WrapCoordinate::S => gl::TEXTURE_WRAP_S,
          WrapCoordinate::T => gl::TEXTURE_WRAP_T,
          WrapCoordinate::R => gl::TEXTURE_WRAP_R,
        };

        (name, opengl_wrap(wrap) as GLint)
      }
    };

    gl::TexParameteri(opengl_target(target), name, value);
  }

  unsafe fn tex_storage(
    &mut self,
    target: TextureTarget,
    levels: u32,
    format: TextureFormat,
    size: [u32; 3],
  ) {
    let gl_target = opengl_target(target);
    let levels = levels as GLsizei;
    let format = opengl_texture_format(format);
    let [w, h, d] = size.map(|s| s as GLsizei);

    match storage_dimensions(target) {
      1 => gl::TexStorage1D(gl_target, levels, format, w),
      2 => gl::TexStorage2D(gl_target, levels, format, w, h),
      _ => gl::TexStorage3D(gl_target, levels, format, w, h, d),
    }
  }

  unsafe fn tex_storage_multisample(
    &mut self,
    target: TextureTarget,
    samples: u32,
    format: TextureFormat,
    size: [u32; 3],
    fixed_sample_locations: bool,
  ) {
    let gl_target = opengl_target(target);
    let format = opengl_texture_format(format);
    let [w, h, d] = size.map(|s| s as GLsizei);
    let fixed = gl_bool(fixed_sample_locations);

    if target == TextureTarget::Texture2DMultisampleArray {
      gl::TexStorage3DMultisample(gl_target, samples as GLsizei, format, w, h, d, fixed);
    } else {
      gl::TexStorage2DMultisample(gl_target, samples as GLsizei, format, w, h, fixed);
    }
  }

  unsafe fn tex_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    internal_format: TextureFormat,
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    data: Option<&[u8]>,
  ) {
    let data = data.map_or(ptr::null(), |data| data.as_ptr() as *const c_void);
    tex_image(target, level, internal_format, size, format, ty, data);
  }

  unsafe fn tex_image_from_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    internal_format: TextureFormat,
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    buffer_offset: usize,
  ) {
    let offset = buffer_offset as *const c_void;
    tex_image(target, level, internal_format, size, format, ty, offset);
  }

  unsafe fn tex_sub_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    data: &[u8],
  ) {
    let data = data.as_ptr() as *const c_void;
    tex_sub_image(target, level, offset, size, format, ty, data);
  }

  unsafe fn tex_sub_image_from_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    buffer_offset: usize,
  ) {
    let data = buffer_offset as *const c_void;
    tex_sub_image(target, level, offset, size, format, ty, data);
  }

  unsafe fn compressed_tex_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    format: CompressedPixelFormat,
    size: [u32; 3],
    data: &[u8],
  ) {
    let ptr = data.as_ptr() as *const c_void;
    compressed_tex_image(target, level, format, size, data.len(), ptr);
  }

  unsafe fn compressed_tex_image_from_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    format: CompressedPixelFormat,
    size: [u32; 3],
    data_size: usize,
    buffer_offset: usize,
  ) {
    let offset = buffer_offset as *const c_void;
    compressed_tex_image(target, level, format, size, data_size, offset);
  }

  unsafe fn compressed_tex_sub_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: CompressedPixelFormat,
    data: &[u8],
  ) {
    let ptr = data.as_ptr() as *const c_void;
    compressed_tex_sub_image(target, level, offset, size, format, data.len(), ptr);
  }

  unsafe fn compressed_tex_sub_image_from_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: CompressedPixelFormat,
    data_size: usize,
    buffer_offset: usize,
  ) {
    let ptr = buffer_offset as *const c_void;
    compressed_tex_sub_image(target, level, offset, size, format, data_size, ptr);
  }

  unsafe fn get_tex_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    format: PixelFormat,
    ty: PixelType,
    data: &mut [u8],
  ) {
    gl::GetTexImage(
      opengl_image_target(target),
      level as GLint,
      opengl_pixel_format(format),
      opengl_pixel_type(ty),
      data.as_mut_ptr() as *mut c_void,
    );
  }

  unsafe fn get_tex_image_into_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    format: PixelFormat,
    ty: PixelType,
    buffer_offset: usize,
  ) {
    gl::GetTexImage(
      opengl_image_target(target),
      level as GLint,
      opengl_pixel_format(format),
      opengl_pixel_type(ty),
      buffer_offset as *mut c_void,
    );
  }

  unsafe fn get_compressed_tex_image(&mut self, target: ImageTarget, level: u32, data: &mut [u8]) {
    gl::GetCompressedTexImage(
      opengl_image_target(target),
      level as GLint,
      data.as_mut_ptr() as *mut c_void,
    );
  }

  unsafe fn get_compressed_tex_image_into_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    buffer_offset: usize,
  ) {
    gl::GetCompressedTexImage(
      opengl_image_target(target),
      level as GLint,
      buffer_offset as *mut c_void,
    );
  }

  unsafe fn get_tex_level_parameter(
    &mut self,
    target: ImageTarget,
    level: u32,
    parameter: LevelParameter,
  ) -> i32 {
    let name = match parameter {
      LevelParameter::Width => gl::TEXTURE_WIDTH,
      LevelParameter::Height => gl::TEXTURE_HEIGHT,
      LevelParameter::Depth => gl::TEXTURE_DEPTH,
      LevelParameter::CompressedImageSize => gl::TEXTURE_COMPRESSED_IMAGE_SIZE,
    };

    let mut value = 0;
    gl::GetTexLevelParameteriv(opengl_image_target(target), level as GLint, name, &mut value);
    value
  }

  unsafe fn get_tex_level_format(
    &mut self,
    target: ImageTarget,
    level: u32,
  ) -> Option<TextureFormat> {
    // missing levels report a default internal format, but no width
    if self.get_tex_level_parameter(target, level, LevelParameter::Width) == 0 {
      return None;
    }

    let mut format = 0;
    gl::GetTexLevelParameteriv(
      opengl_image_target(target),
      level as GLint,
      gl::TEXTURE_INTERNAL_FORMAT,
      &mut format,
    );

    texture_format_from_opengl(format as GLenum)
  }

  unsafe fn generate_mipmap(&mut self, target: TextureTarget) {
    gl::GenerateMipmap(opengl_target(target));
  }

  unsafe fn invalidate_tex_image(&mut self, id: u32, level: u32) {
    gl::InvalidateTexImage(id, level as GLint);
  }

  unsafe fn invalidate_tex_sub_image(
    &mut self,
    id: u32,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
  ) {
    let [x, y, z] = offset.map(|o| o as GLint);
    let [w, h, d] = size.map(|s| s as GLsizei);

    gl::InvalidateTexSubImage(id, level as GLint, x, y, z, w, h, d);
  }

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
  ) {
    gl::TextureView(
      id,
      opengl_target(target),
      source,
      opengl_texture_format(format),
      min_level,
      levels,
      min_layer,
      layers,
    );
  }

  unsafe fn set_pixel_storage(&mut self, direction: StorageDirection, storage: &PixelStorage) {
    set_pixel_storage(direction, storage);
  }

  unsafe fn set_compressed_pixel_storage(
    &mut self,
    direction: StorageDirection,
    storage: &CompressedPixelStorage,
  ) {
    set_compressed_pixel_storage(direction, storage);
  }
}
