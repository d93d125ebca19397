//! Draw arguments.
//!
//! A [`Mesh`] describes *what* to draw: which vertex array, how vertices are connected, how many
//! of them and how many instances. It doesn’t own the vertex array or its buffers, which are set
//! up elsewhere; it’s passed to [`Program::draw`](crate::shader::Program::draw).
//!
//! A [`TransformFeedback`] object records how many vertices a transform feedback pass captured,
//! so that they can be drawn without reading the count back.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use crate::backend::Backend;
use crate::context::{Context, Extension};
use crate::object::{GraphicsObject, ObjectFlags, ObjectHandle, ObjectKind};
use crate::state::GLState;

/// How vertices are connected.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MeshPrimitive {
  /// Unconnected points.
  Points,
  /// Every pair of vertices is a line.
  Lines,
  /// Each vertex extends the line with a new segment.
  LineStrip,
  /// Line strip closed by a segment from the last vertex to the first one.
  LineLoop,
  /// Every three vertices are a triangle.
  Triangles,
  /// Each vertex makes a triangle with the two previous ones.
  TriangleStrip,
  /// Each vertex makes a triangle with the previous one and the first one.
  TriangleFan,
  /// Lines with adjacency, for geometry shaders.
  LinesAdjacency,
  /// Line strip with adjacency, for geometry shaders.
  LineStripAdjacency,
  /// Triangles with adjacency, for geometry shaders.
  TrianglesAdjacency,
  /// Triangle strip with adjacency, for geometry shaders.
  TriangleStripAdjacency,
  /// Patches for tessellation shaders.
  Patches,
}

/// Type of the indices in an element buffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MeshIndexType {
  UnsignedByte,
  UnsignedShort,
  UnsignedInt,
}

impl MeshIndexType {
  /// Size of an index, in bytes.
  pub fn size(self) -> usize {
    match self {
      MeshIndexType::UnsignedByte => 1,
      MeshIndexType::UnsignedShort => 2,
      MeshIndexType::UnsignedInt => 4,
    }
  }
}

/// Indices of an indexed mesh, read from the element buffer of its vertex array.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MeshIndex {
  pub ty: MeshIndexType,
  /// Offset of the first index in the element buffer, in bytes.
  pub offset: usize,
}

/// Draw arguments.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Mesh {
  vertex_array: u32,
  primitive: MeshPrimitive,
  count: Option<u32>,
  base_vertex: i32,
  instances: u32,
  base_instance: u32,
  index: Option<MeshIndex>,
}

impl Mesh {
  /// Mesh drawing triangles from a vertex array, one instance.
  ///
  /// The vertex count must be set before drawing.
  pub fn new(vertex_array: u32) -> Self {
    Mesh {
      vertex_array,
      primitive: MeshPrimitive::Triangles,
      count: None,
      base_vertex: 0,
      instances: 1,
      base_instance: 0,
      index: None,
    }
  }

  pub fn set_primitive(mut self, primitive: MeshPrimitive) -> Self {
    self.primitive = primitive;
    self
  }

  /// Number of vertices, or of indices for indexed meshes.
  pub fn set_count(mut self, count: u32) -> Self {
    self.count = Some(count);
    self
  }

  /// First vertex, or value added to every index for indexed meshes.
  pub fn set_base_vertex(mut self, base_vertex: i32) -> Self {
    self.base_vertex = base_vertex;
    self
  }

  pub fn set_instances(mut self, instances: u32) -> Self {
    self.instances = instances;
    self
  }

  pub fn set_base_instance(mut self, base_instance: u32) -> Self {
    self.base_instance = base_instance;
    self
  }

  /// Draw through the element buffer of the vertex array.
  pub fn set_index(mut self, ty: MeshIndexType, offset: usize) -> Self {
    self.index = Some(MeshIndex { ty, offset });
    self
  }

  pub fn vertex_array(&self) -> u32 {
    self.vertex_array
  }

  pub fn primitive(&self) -> MeshPrimitive {
    self.primitive
  }

  /// Vertex count, if it was set.
  pub fn count(&self) -> Option<u32> {
    self.count
  }

  pub fn base_vertex(&self) -> i32 {
    self.base_vertex
  }

  pub fn instances(&self) -> u32 {
    self.instances
  }

  pub fn base_instance(&self) -> u32 {
    self.base_instance
  }

  pub fn index(&self) -> Option<MeshIndex> {
    self.index
  }
}

/// Transform feedback object.
pub struct TransformFeedback<B>
where
  B: Backend,
{
  state: Rc<RefCell<GLState<B>>>,
  handle: ObjectHandle,
}

impl<B> TransformFeedback<B>
where
  B: Backend,
{
  pub fn new(ctx: &Context<B>) -> Self {
    let state = ctx.shared_state();
    let id = unsafe { state.borrow_mut().backend_mut().gen_transform_feedback() };

    TransformFeedback {
      state,
      handle: ObjectHandle::new(id, ObjectFlags::CREATED | ObjectFlags::DELETE_ON_DESTRUCTION),
    }
  }

  /// Wrap an existing transform feedback object.
  pub fn wrap(ctx: &Context<B>, id: u32, flags: ObjectFlags) -> Self {
    TransformFeedback {
      state: ctx.shared_state(),
      handle: ObjectHandle::new(id, flags),
    }
  }

  /// Debug label, empty if debug labels are unsupported.
  pub fn label(&self) -> String {
    let mut state = self.state.borrow_mut();

    if !state.capabilities().is_supported(Extension::KhrDebug) {
      return String::new();
    }

    unsafe {
      state
        .backend_mut()
        .get_object_label(ObjectKind::TransformFeedback, self.handle.id())
    }
  }

  /// Set the debug label. Ignored if debug labels are unsupported.
  pub fn set_label(&mut self, label: &str) -> &mut Self {
    {
      let mut state = self.state.borrow_mut();

      if state.capabilities().is_supported(Extension::KhrDebug) {
        unsafe {
          state
            .backend_mut()
            .object_label(ObjectKind::TransformFeedback, self.handle.id(), label);
        }
      } else {
        debug!(
          "ignoring label of transform feedback {}: debug labels are unsupported",
          self.handle.id()
        );
      }
    }

    self
  }
}

impl<B> GraphicsObject for TransformFeedback<B>
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

impl<B> Drop for TransformFeedback<B>
where
  B: Backend,
{
  fn drop(&mut self) {
    if !self.handle.must_delete() {
      return;
    }

    let id = self.handle.id();

    match self.state.try_borrow_mut() {
      Ok(mut state) => unsafe { state.backend_mut().delete_transform_feedback(id) },
      Err(_) => warn!("leaking transform feedback {}: the graphics state is in use", id),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mesh_builder() {
    let mesh = Mesh::new(3)
      .set_primitive(MeshPrimitive::TriangleStrip)
      .set_count(4)
      .set_instances(2)
      .set_index(MeshIndexType::UnsignedShort, 16);

    assert_eq!(mesh.vertex_array(), 3);
    assert_eq!(mesh.count(), Some(4));
    assert_eq!(mesh.instances(), 2);
    assert_eq!(
      mesh.index(),
      Some(MeshIndex {
        ty: MeshIndexType::UnsignedShort,
        offset: 16
      })
    );
    assert_eq!(Mesh::new(0).count(), None);
  }

  #[test]
  fn index_sizes() {
    assert_eq!(MeshIndexType::UnsignedByte.size(), 1);
    assert_eq!(MeshIndexType::UnsignedInt.size(), 4);
  }
}
