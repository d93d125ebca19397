//! GPU object identity and lifetime.
//!
//! Every driver-side resource (texture, buffer, shader, program, transform feedback) is represented
//! by a numeric id plus a small set of [`ObjectFlags`]. The id `0` is never a valid object: it means
//! either “not generated yet” or “released / moved out”.
//!
//! Objects are created in two steps on drivers lacking direct state access: a *name* is generated
//! first, and the object itself only exists once it has been bound to a target for the first time.
//! Operations that need a live object (debug labels, batched binds) ask for creation first, which
//! is idempotent.
//!
//! Objects created by glint are deleted when their handle is dropped. Objects wrapped from an
//! externally created id only get deleted if [`ObjectFlags::DELETE_ON_DESTRUCTION`] was passed to
//! the `wrap` constructor. [`GraphicsObject::release`] hands the raw id back to the caller and
//! turns the handle’s drop into a no-op.

use std::cell::Cell;

bitflags::bitflags! {
  /// Lifetime flags of a GPU object.
  #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
  pub struct ObjectFlags: u8 {
    /// The object is known to exist on the driver side (not only its name).
    const CREATED = 1 << 0;
    /// Delete the object when its handle is dropped.
    const DELETE_ON_DESTRUCTION = 1 << 1;
  }
}

/// Kind of a GPU object, used to address debug labels.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ObjectKind {
  /// Texture object.
  Texture,
  /// Shader object.
  Shader,
  /// Program object.
  Program,
  /// Transform feedback object.
  TransformFeedback,
  /// Buffer object.
  Buffer,
}

/// Common interface of every GPU object handle.
pub trait GraphicsObject {
  /// Driver id of the object, or `0` if it was released.
  fn id(&self) -> u32;

  /// Current lifetime flags.
  fn flags(&self) -> ObjectFlags;

  /// Release the underlying object.
  ///
  /// Returns the id and clears it locally, so that dropping the handle afterwards doesn’t delete
  /// anything: the caller now owns the raw id. Calling it a second time returns `0`.
  fn release(&mut self) -> u32;
}

/// Id and flags of a GPU object.
///
/// Flags live in a [`Cell`] because observing that an object got created (first bind) is not a
/// logical mutation of the handle; it happens behind `&self` methods such as `bind`.
#[derive(Debug)]
pub(crate) struct ObjectHandle {
  id: u32,
  flags: Cell<ObjectFlags>,
}

impl ObjectHandle {
  pub(crate) fn new(id: u32, flags: ObjectFlags) -> Self {
    ObjectHandle {
      id,
      flags: Cell::new(flags),
    }
  }

  pub(crate) fn id(&self) -> u32 {
    self.id
  }

  pub(crate) fn flags(&self) -> ObjectFlags {
    self.flags.get()
  }

  pub(crate) fn is_created(&self) -> bool {
    self.flags.get().contains(ObjectFlags::CREATED)
  }

  pub(crate) fn mark_created(&self) {
    self.flags.set(self.flags.get() | ObjectFlags::CREATED);
  }

  /// Whether dropping the handle must issue a delete call.
  pub(crate) fn must_delete(&self) -> bool {
    self.id != 0 && self.flags.get().contains(ObjectFlags::DELETE_ON_DESTRUCTION)
  }

  pub(crate) fn release(&mut self) -> u32 {
    let id = std::mem::take(&mut self.id);
    self
      .flags
      .set(self.flags.get() - ObjectFlags::DELETE_ON_DESTRUCTION);
    id
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn release_twice() {
    let mut handle = ObjectHandle::new(7, ObjectFlags::DELETE_ON_DESTRUCTION);

    assert!(handle.must_delete());
    assert_eq!(handle.release(), 7);
    assert_eq!(handle.release(), 0);
    assert!(!handle.must_delete());
  }

  #[test]
  fn wrapped_without_ownership() {
    let handle = ObjectHandle::new(3, ObjectFlags::CREATED);

    assert!(handle.is_created());
    assert!(!handle.must_delete());
  }

  #[test]
  fn mark_created_is_sticky() {
    let handle = ObjectHandle::new(1, ObjectFlags::DELETE_ON_DESTRUCTION);

    assert!(!handle.is_created());
    handle.mark_created();
    handle.mark_created();
    assert_eq!(
      handle.flags(),
      ObjectFlags::CREATED | ObjectFlags::DELETE_ON_DESTRUCTION
    );
  }
}
