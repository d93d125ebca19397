//! Shader programs.
//!
//! A [`Program`] links shader stages together. Like stages, it can be linked in a blocking way
//! with [`Program::link`] or in two steps with [`Program::submit_link`], [`Program::is_link_finished`]
//! and [`Program::check_link`].
//!
//! Once linked successfully, a program can set uniforms, draw [`Mesh`]es and dispatch compute
//! work. Drawing with a program that isn’t successfully linked is a programmer error.

use std::cell::RefCell;
use std::error;
use std::fmt;
use std::rc::Rc;

use log::{debug, error, warn};

use crate::backend::program::{ProgramParameter, INVALID_INDEX};
use crate::backend::Backend;
use crate::context::{Context, Extension};
use crate::mesh::{Mesh, TransformFeedback};
use crate::object::{GraphicsObject, ObjectFlags, ObjectHandle, ObjectKind};
use crate::shader::uniform::Uniformable;
use crate::shader::{clean_log, Shader, StageError};
use crate::state::GLState;

/// How transform feedback outputs are written to buffers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TransformFeedbackBufferMode {
  /// Every output goes to the same buffer, interleaved.
  Interleaved,
  /// Each output goes to its own buffer.
  Separate,
}

/// Errors that a [`Program`] can generate.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProgramError {
  /// A shader stage failed to compile. It takes precedence over the link failure it causes.
  StageError(StageError),
  /// Program link failed. The log is never empty and ends with a newline.
  LinkFailed(String),
  /// The driver couldn’t create the program object.
  CreationFailed,
}

impl fmt::Display for ProgramError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ProgramError::StageError(ref e) => fmt::Display::fmt(e, f),

      ProgramError::LinkFailed(ref log) => {
        write!(f, "linking failed with the following message:\n{}", log)
      }

      ProgramError::CreationFailed => f.write_str("unable to create shader program"),
    }
  }
}

impl error::Error for ProgramError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      ProgramError::StageError(e) => Some(e),
      _ => None,
    }
  }
}

impl From<StageError> for ProgramError {
  fn from(e: StageError) -> Self {
    ProgramError::StageError(e)
  }
}

#[derive(Clone, Debug)]
enum LinkState {
  Unlinked,
  Submitted,
  Finished(Result<(), ProgramError>),
}

/// A shader program.
pub struct Program<B>
where
  B: Backend,
{
  state: Rc<RefCell<GLState<B>>>,
  handle: ObjectHandle,
  // shaders to attach on the next link
  pending_shaders: Vec<u32>,
  link: RefCell<LinkState>,
}

impl<B> Program<B>
where
  B: Backend,
{
  pub fn new(ctx: &Context<B>) -> Result<Self, ProgramError> {
    let state = ctx.shared_state();
    let id = unsafe { state.borrow_mut().backend_mut().create_program() };

    if id == 0 {
      return Err(ProgramError::CreationFailed);
    }

    Ok(Program {
      state,
      handle: ObjectHandle::new(id, ObjectFlags::CREATED | ObjectFlags::DELETE_ON_DESTRUCTION),
      pending_shaders: Vec::new(),
      link: RefCell::new(LinkState::Unlinked),
    })
  }

  /// Record shaders to attach when linking.
  ///
  /// Their compilation doesn’t need to be finished, or even submitted, yet.
  pub fn attach_shaders(&mut self, shaders: &[&Shader<B>]) -> &mut Self {
    self
      .pending_shaders
      .extend(shaders.iter().map(|shader| shader.id()));
    self
  }

  /// Bind a vertex attribute to a location. Takes effect at the next link.
  pub fn bind_attribute_location(&mut self, index: u32, name: &str) -> &mut Self {
    let mut state = self.state.borrow_mut();
    unsafe {
      state
        .backend_mut()
        .bind_attrib_location(self.handle.id(), index, name)
    };
    drop(state);

    self
  }

  /// Bind a fragment output to a color attachment. Takes effect at the next link.
  pub fn bind_fragment_data_location(&mut self, color: u32, name: &str) -> &mut Self {
    let mut state = self.state.borrow_mut();
    unsafe {
      state
        .backend_mut()
        .bind_frag_data_location(self.handle.id(), color, name)
    };
    drop(state);

    self
  }

  /// Bind a fragment output to an input of a dual-source blending equation.
  pub fn bind_fragment_data_location_indexed(
    &mut self,
    color: u32,
    index: u32,
    name: &str,
  ) -> &mut Self {
    let mut state = self.state.borrow_mut();
    unsafe {
      state
        .backend_mut()
        .bind_frag_data_location_indexed(self.handle.id(), color, index, name)
    };
    drop(state);

    self
  }

  /// Select the outputs captured by transform feedback. Takes effect at the next link.
  pub fn set_transform_feedback_outputs(
    &mut self,
    names: &[&str],
    mode: TransformFeedbackBufferMode,
  ) -> &mut Self {
    let mut state = self.state.borrow_mut();
    unsafe {
      state
        .backend_mut()
        .transform_feedback_varyings(self.handle.id(), names, mode)
    };
    drop(state);

    self
  }

  /// Link and wait for the result.
  pub fn link(&mut self, shaders: &[&Shader<B>]) -> Result<(), ProgramError> {
    self.submit_link();
    self.check_link(shaders)
  }

  /// Attach the recorded shaders and start linking without waiting.
  ///
  /// Compilation results aren’t looked at here; see [`Program::check_link`]. Linking again
  /// discards the previous result.
  pub fn submit_link(&mut self) {
    let id = self.handle.id();

    {
      let mut state = self.state.borrow_mut();

      for shader in self.pending_shaders.drain(..) {
        unsafe { state.backend_mut().attach_shader(id, shader) };
      }

      unsafe { state.backend_mut().link_program(id) };
    }

    *self.link.borrow_mut() = LinkState::Submitted;
  }

  /// Whether the submitted link finished. Never blocks.
  ///
  /// Without `GL_KHR_parallel_shader_compile`, a submitted link is always reported as finished.
  pub fn is_link_finished(&self) -> bool {
    match *self.link.borrow() {
      LinkState::Unlinked => false,
      LinkState::Finished(_) => true,
      LinkState::Submitted => {
        let mut state = self.state.borrow_mut();

        if !state
          .capabilities()
          .is_supported(Extension::KhrParallelShaderCompile)
        {
          return true;
        }

        unsafe {
          state
            .backend_mut()
            .get_program_parameter(self.handle.id(), ProgramParameter::CompletionStatus)
            != 0
        }
      }
    }
  }

  /// Wait for the link to finish and report its result.
  ///
  /// `shaders` are the stages that were linked. If one of them failed to compile, the first such
  /// failure is reported instead of the link failure it caused.
  pub fn check_link(&self, shaders: &[&Shader<B>]) -> Result<(), ProgramError> {
    let submitted = match *self.link.borrow() {
      LinkState::Finished(ref result) => return result.clone(),
      LinkState::Submitted => true,
      LinkState::Unlinked => false,
    };

    debug_assert!(submitted, "Program::check_link(): link wasn’t submitted");

    let result = match shaders.iter().find_map(|shader| shader.check_compile().err()) {
      Some(e) => Err(ProgramError::StageError(e)),
      None => self.link_status(),
    };

    *self.link.borrow_mut() = LinkState::Finished(result.clone());
    result
  }

  fn link_status(&self) -> Result<(), ProgramError> {
    let (success, log) = {
      let mut state = self.state.borrow_mut();
      let backend = state.backend_mut();
      let id = self.handle.id();

      unsafe {
        let success = backend.get_program_parameter(id, ProgramParameter::LinkStatus) != 0;
        let log = if backend.get_program_parameter(id, ProgramParameter::InfoLogLength) > 1 {
          clean_log(backend.get_program_info_log(id))
        } else {
          String::new()
        };

        (success, log)
      }
    };

    if success {
      if !log.is_empty() {
        warn!("linking succeeded with the following message:\n{}", log);
      }

      return Ok(());
    }

    let log = if log.is_empty() {
      "(no message)\n".to_owned()
    } else {
      log
    };
    let e = ProgramError::LinkFailed(log);
    error!("{}", e);

    Err(e)
  }

  /// Whether the last link finished and succeeded.
  pub fn is_linked(&self) -> bool {
    matches!(*self.link.borrow(), LinkState::Finished(Ok(())))
  }

  /// Validate the program against the current state.
  ///
  /// The message is whatever the driver reported, even on success.
  pub fn validate(&mut self) -> (bool, String) {
    let mut state = self.state.borrow_mut();
    let backend = state.backend_mut();
    let id = self.handle.id();

    unsafe {
      backend.validate_program(id);

      let success = backend.get_program_parameter(id, ProgramParameter::ValidateStatus) != 0;
      let log = if backend.get_program_parameter(id, ProgramParameter::InfoLogLength) > 1 {
        clean_log(backend.get_program_info_log(id))
      } else {
        String::new()
      };

      (success, log)
    }
  }

  /// Location of a uniform, negative if the uniform isn’t active.
  ///
  /// Locations aren’t cached: store them after linking.
  pub fn uniform_location(&self, name: &str) -> i32 {
    let location = {
      let mut state = self.state.borrow_mut();
      unsafe {
        state
          .backend_mut()
          .get_uniform_location(self.handle.id(), name)
      }
    };

    if location < 0 {
      warn!("location of uniform '{}' cannot be retrieved", name);
    }

    location
  }

  /// Index of a uniform block, if it’s active.
  pub fn uniform_block_index(&self, name: &str) -> Option<u32> {
    let index = {
      let mut state = self.state.borrow_mut();
      unsafe {
        state
          .backend_mut()
          .get_uniform_block_index(self.handle.id(), name)
      }
    };

    if index == INVALID_INDEX {
      warn!("index of uniform block '{}' cannot be retrieved", name);
      return None;
    }

    Some(index)
  }

  /// Set a uniform.
  ///
  /// The value must match the declared type of the uniform; mismatches are reported by the driver.
  pub fn set_uniform<T>(&mut self, location: i32, value: &T) -> &mut Self
  where
    T: Uniformable + ?Sized,
  {
    let mut state = self.state.borrow_mut();

    unsafe {
      state.use_program(self.handle.id());
      state.backend_mut().set_uniform(location, value.uniform_value());
    }
    drop(state);

    self
  }

  /// Bind a uniform block to a uniform buffer binding point.
  pub fn set_uniform_block_binding(&mut self, block: u32, binding: u32) -> &mut Self {
    let mut state = self.state.borrow_mut();
    unsafe {
      state
        .backend_mut()
        .uniform_block_binding(self.handle.id(), block, binding)
    };
    drop(state);

    self
  }

  /// Draw a mesh.
  ///
  /// Nothing happens, not even a state change, if the mesh has no vertices or no instances.
  pub fn draw(&self, mesh: &Mesh) {
    debug_assert!(
      self.is_linked(),
      "Program::draw(): program {} isn’t successfully linked",
      self.handle.id()
    );

    let Some(count) = mesh.count() else {
      debug_assert!(false, "Program::draw(): Mesh::set_count() was never called");
      return;
    };

    if count == 0 || mesh.instances() == 0 {
      return;
    }

    let mut state = self.state.borrow_mut();

    unsafe {
      state.use_program(self.handle.id());
      state.bind_vertex_array(mesh.vertex_array());

      match mesh.index() {
        Some(index) => state.backend_mut().draw_elements(
          mesh.primitive(),
          count,
          index.ty,
          index.offset,
          mesh.base_vertex(),
          mesh.instances(),
          mesh.base_instance(),
        ),

        None => {
          debug_assert!(
            mesh.base_vertex() >= 0,
            "Program::draw(): negative base vertex {} without indices",
            mesh.base_vertex()
          );

          state.backend_mut().draw_arrays(
            mesh.primitive(),
            mesh.base_vertex().max(0) as u32,
            count,
            mesh.instances(),
            mesh.base_instance(),
          )
        }
      }
    }
  }

  /// Draw as many vertices of a mesh as a transform feedback object captured on a stream.
  pub fn draw_transform_feedback(&self, mesh: &Mesh, xfb: &TransformFeedback<B>, stream: u32) {
    debug_assert!(
      self.is_linked(),
      "Program::draw_transform_feedback(): program {} isn’t successfully linked",
      self.handle.id()
    );

    if mesh.instances() == 0 {
      return;
    }

    let mut state = self.state.borrow_mut();

    unsafe {
      state.use_program(self.handle.id());
      state.bind_vertex_array(mesh.vertex_array());
      state
        .backend_mut()
        .draw_transform_feedback(mesh.primitive(), xfb.id(), stream, mesh.instances());
    }
  }

  /// Dispatch compute work groups.
  pub fn dispatch_compute(&self, groups: [u32; 3]) {
    debug_assert!(
      self.is_linked(),
      "Program::dispatch_compute(): program {} isn’t successfully linked",
      self.handle.id()
    );

    let mut state = self.state.borrow_mut();

    unsafe {
      state.use_program(self.handle.id());
      state.backend_mut().dispatch_compute(groups);
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
        .get_object_label(ObjectKind::Program, self.handle.id())
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
            .object_label(ObjectKind::Program, self.handle.id(), label);
        }
      } else {
        debug!("ignoring label of program {}: debug labels are unsupported", self.handle.id());
      }
    }

    self
  }
}

impl<B> GraphicsObject for Program<B>
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

impl<B> Drop for Program<B>
where
  B: Backend,
{
  fn drop(&mut self) {
    if !self.handle.must_delete() {
      return;
    }

    let id = self.handle.id();

    match self.state.try_borrow_mut() {
      Ok(mut state) => {
        state.forget_program(id);
        unsafe { state.backend_mut().delete_program(id) };
      }

      Err(_) => warn!("leaking program {}: the graphics state is in use", id),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::shader::StageType;

  #[test]
  fn stage_error_hides_link_marker() {
    let e = ProgramError::from(StageError::CompilationFailed(
      StageType::FragmentShader,
      "0(1): syntax error\n".to_owned(),
    ));
    let message = e.to_string();

    assert!(message.starts_with("compilation of fragment shader failed"));
    assert!(!message.contains("linking failed"));
  }

  #[test]
  fn link_failure_message() {
    let e = ProgramError::LinkFailed("missing main\n".to_owned());
    assert_eq!(
      e.to_string(),
      "linking failed with the following message:\nmissing main\n"
    );
  }
}
