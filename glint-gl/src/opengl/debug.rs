//! Debug labels.

use gl::types::*;
use glint::object::ObjectKind;
use std::ptr;

fn opengl_identifier(kind: ObjectKind) -> GLenum {
  match kind {
    ObjectKind::Texture => gl::TEXTURE,
    ObjectKind::Shader => gl::SHADER,
    ObjectKind::Program => gl::PROGRAM,
    ObjectKind::TransformFeedback => gl::TRANSFORM_FEEDBACK,
    ObjectKind::Buffer => gl::BUFFER,
  }
}

pub(crate) unsafe fn object_label(kind: ObjectKind, id: u32, label: &str) {
  // explicit length, so the label needs no terminating NUL
  gl::ObjectLabel(
    opengl_identifier(kind),
    id,
    label.len() as GLsizei,
    label.as_ptr() as *const GLchar,
  );
}

pub(crate) unsafe fn get_object_label(kind: ObjectKind, id: u32) -> String {
  let identifier = opengl_identifier(kind);
  let mut len: GLsizei = 0;

  gl::GetObjectLabel(identifier, id, 0, &mut len, ptr::null_mut());

  if len <= 0 {
    return String::new();
  }

  let mut label = vec![0u8; len as usize + 1];
  gl::GetObjectLabel(
    identifier,
    id,
    label.len() as GLsizei,
    &mut len,
    label.as_mut_ptr() as *mut GLchar,
  );
  label.truncate(len.max(0) as usize);

  String::from_utf8_lossy(&label).into_owned()
}
