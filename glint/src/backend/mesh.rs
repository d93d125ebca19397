//! Draw and dispatch backend interface.

use crate::mesh::{MeshIndexType, MeshPrimitive};

/// Draw driver entry points.
pub unsafe trait MeshBackend {
  unsafe fn bind_vertex_array(&mut self, id: u32);

  /// Draw vertices in order.
  unsafe fn draw_arrays(
    &mut self,
    primitive: MeshPrimitive,
    first: u32,
    count: u32,
    instances: u32,
    base_instance: u32,
  );

  /// Draw vertices through the element buffer of the bound vertex array.
  #[allow(clippy::too_many_arguments)]
  unsafe fn draw_elements(
    &mut self,
    primitive: MeshPrimitive,
    count: u32,
    index_type: MeshIndexType,
    offset: usize,
    base_vertex: i32,
    instances: u32,
    base_instance: u32,
  );

  unsafe fn gen_transform_feedback(&mut self) -> u32;

  unsafe fn delete_transform_feedback(&mut self, id: u32);

  /// Draw as many vertices as recorded by a transform feedback object.
  unsafe fn draw_transform_feedback(
    &mut self,
    primitive: MeshPrimitive,
    id: u32,
    stream: u32,
    instances: u32,
  );

  unsafe fn dispatch_compute(&mut self, groups: [u32; 3]);
}
