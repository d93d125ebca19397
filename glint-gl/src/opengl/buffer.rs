use gl::types::*;
use glint::backend::buffer::{BufferBackend, BufferTarget, BufferUsage};
use std::ffi::c_void;
use std::ptr;

use crate::opengl::GL;

fn opengl_buffer_target(target: BufferTarget) -> GLenum {
  match target {
    BufferTarget::PixelPack => gl::PIXEL_PACK_BUFFER,
    BufferTarget::PixelUnpack => gl::PIXEL_UNPACK_BUFFER,
  }
}

fn opengl_buffer_usage(usage: BufferUsage) -> GLenum {
  match usage {
    BufferUsage::StaticDraw => gl::STATIC_DRAW,
    BufferUsage::StaticRead => gl::STATIC_READ,
    BufferUsage::DynamicDraw => gl::DYNAMIC_DRAW,
    BufferUsage::DynamicRead => gl::DYNAMIC_READ,
    BufferUsage::StreamDraw => gl::STREAM_DRAW,
    BufferUsage::StreamRead => gl::STREAM_READ,
  }
}

unsafe impl BufferBackend for GL {
  unsafe fn gen_buffer(&mut self) -> u32 {
    let mut handle: GLuint = 0;
    gl::GenBuffers(1, &mut handle);
    handle
  }

  unsafe fn delete_buffer(&mut self, id: u32) {
    gl::DeleteBuffers(1, &id);
  }

  unsafe fn bind_buffer(&mut self, target: BufferTarget, id: u32) {
    gl::BindBuffer(opengl_buffer_target(target), id);
  }

  unsafe fn buffer_data(
    &mut self,
    target: BufferTarget,
    len: usize,
    data: Option<&[u8]>,
    usage: BufferUsage,
  ) {
    let data = data.map_or(ptr::null(), |data| data.as_ptr() as *const c_void);

    gl::BufferData(
      opengl_buffer_target(target),
      len as GLsizeiptr,
      data,
      opengl_buffer_usage(usage),
    );
  }

  unsafe fn get_buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &mut [u8]) {
    gl::GetBufferSubData(
      opengl_buffer_target(target),
      offset as GLintptr,
      data.len() as GLsizeiptr,
      data.as_mut_ptr() as *mut c_void,
    );
  }
}
