use gl::types::*;
use glint::backend::mesh::MeshBackend;
use glint::mesh::{MeshIndexType, MeshPrimitive};
use std::ffi::c_void;

use crate::opengl::pixel::{opengl_index_type, opengl_primitive};
use crate::opengl::GL;

unsafe impl MeshBackend for GL {
  unsafe fn bind_vertex_array(&mut self, id: u32) {
    gl::BindVertexArray(id);
  }

  unsafe fn draw_arrays(
    &mut self,
    primitive: MeshPrimitive,
    first: u32,
    count: u32,
    instances: u32,
    base_instance: u32,
  ) {
    let mode = opengl_primitive(primitive);
    let first = first as GLint;
    let count = count as GLsizei;

    // pick the oldest entry point able to express the call
    if base_instance != 0 {
      gl::DrawArraysInstancedBaseInstance(
        mode,
        first,
        count,
        instances as GLsizei,
        base_instance,
      );
    } else if instances != 1 {
      gl::DrawArraysInstanced(mode, first, count, instances as GLsizei);
    } else {
      gl::DrawArrays(mode, first, count);
    }
  }

  unsafe fn draw_elements(
    &mut self,
    primitive: MeshPrimitive,
    count: u32,
    index_type: MeshIndexType,
    offset: usize,
    base_vertex: i32,
    instances: u32,
    base_instance: u32,
  ) {
    let mode = opengl_primitive(primitive);
    let count = count as GLsizei;
    let ty = opengl_index_type(index_type);
    let indices = offset as *const c_void;

    if base_instance != 0 {
      gl::DrawElementsInstancedBaseVertexBaseInstance(
        mode,
        count,
        ty,
        indices,
        instances as GLsizei,
        base_vertex,
        base_instance,
      );
    } else if instances != 1 {
      gl::DrawElementsInstancedBaseVertex(
        mode,
        count,
        ty,
        indices,
        instances as GLsizei,
        base_vertex,
      );
    } else if base_vertex != 0 {
      gl::DrawElementsBaseVertex(mode, count, ty, indices, base_vertex);
    } else {
      gl::DrawElements(mode, count, ty, indices);
    }
  }

  unsafe fn gen_transform_feedback(&mut self) -> u32 {
    let mut id = 0;
    gl::GenTransformFeedbacks(1, &mut id);
    id
  }

  unsafe fn delete_transform_feedback(&mut self, id: u32) {
    gl::DeleteTransformFeedbacks(1, &id);
  }

  unsafe fn draw_transform_feedback(
    &mut self,
    primitive: MeshPrimitive,
    id: u32,
    stream: u32,
    instances: u32,
  ) {
    let mode = opengl_primitive(primitive);

    if stream == 0 && instances == 1 {
      gl::DrawTransformFeedback(mode, id);
    } else {
      gl::DrawTransformFeedbackStreamInstanced(mode, id, stream, instances as GLsizei);
    }
  }

  unsafe fn dispatch_compute(&mut self, groups: [u32; 3]) {
    gl::DispatchCompute(groups[0], groups[1], groups[2]);
  }
}
