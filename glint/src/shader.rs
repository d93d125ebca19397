//! Shader stages and programs.
//!
//! A [`Shader`] is a single stage: sources are accumulated with [`Shader::add_source`], then
//! compiled. Compilation can be blocking ([`Shader::compile`]) or split in two
//! ([`Shader::submit_compile`], then [`Shader::is_compile_finished`] polls and
//! [`Shader::check_compile`] reports), so that the driver can compile in the background while the
//! application does something else. Both ways report the same result.
//!
//! Stages are linked together into a [`Program`], with the same blocking / split choice.

pub mod program;
pub mod uniform;

pub use self::program::{Program, ProgramError, TransformFeedbackBufferMode};
pub use self::uniform::Uniformable;

use std::cell::RefCell;
use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;

use log::{debug, error, warn};

use crate::backend::shader::ShaderParameter;
use crate::backend::Backend;
use crate::context::{Context, Extension, Version};
use crate::object::{GraphicsObject, ObjectFlags, ObjectHandle, ObjectKind};
use crate::state::GLState;

/// A shader stage type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StageType {
  /// Vertex shader.
  VertexShader,
  /// Tessellation control shader.
  TessellationControlShader,
  /// Tessellation evaluation shader.
  TessellationEvaluationShader,
  /// Geometry shader.
  GeometryShader,
  /// Fragment shader.
  FragmentShader,
  /// Compute shader.
  ComputeShader,
}

impl fmt::Display for StageType {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      StageType::VertexShader => f.write_str("vertex shader"),
      StageType::TessellationControlShader => f.write_str("tessellation control shader"),
      StageType::TessellationEvaluationShader => f.write_str("tessellation evaluation shader"),
      StageType::GeometryShader => f.write_str("geometry shader"),
      StageType::FragmentShader => f.write_str("fragment shader"),
      StageType::ComputeShader => f.write_str("compute shader"),
    }
  }
}

/// Errors that shader stages can emit.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StageError {
  /// Occurs when a shader fails to compile. The log is never empty and ends with a newline.
  CompilationFailed(StageType, String),
  /// Occurs when you try to create a shader which type is not supported on the current hardware.
  UnsupportedType(StageType),
  /// The driver couldn’t create the shader object.
  CreationFailed(StageType),
}

impl fmt::Display for StageError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      StageError::CompilationFailed(ref ty, ref log) => write!(
        f,
        "compilation of {} failed with the following message:\n{}",
        ty, log
      ),

      StageError::UnsupportedType(ty) => write!(f, "unsupported {}", ty),

      StageError::CreationFailed(ty) => write!(f, "unable to create {}", ty),
    }
  }
}

impl error::Error for StageError {}

#[derive(Clone, Debug)]
enum CompileState {
  Uncompiled,
  Submitted,
  Finished(Result<(), StageError>),
}

/// A shader stage.
pub struct Shader<B>
where
  B: Backend,
{
  state: Rc<RefCell<GLState<B>>>,
  handle: ObjectHandle,
  ty: StageType,
  // source 0 is the version directive (possibly empty), then `#line` markers and sources alternate
  sources: Vec<String>,
  compile: RefCell<CompileState>,
}

impl<B> Shader<B>
where
  B: Backend,
{
  /// Create a shader stage targetting a GLSL version.
  ///
  /// The version directive is prepended to the sources; with [`Version::None`], sources are passed
  /// as-is and must carry their own.
  pub fn new(ctx: &Context<B>, version: Version, ty: StageType) -> Result<Self, StageError> {
    if !Self::is_type_supported(ctx, ty) {
      return Err(StageError::UnsupportedType(ty));
    }

    let state = ctx.shared_state();
    let id = unsafe { state.borrow_mut().backend_mut().create_shader(ty) };

    if id == 0 {
      return Err(StageError::CreationFailed(ty));
    }

    let sources = version
      .glsl_preamble()
      .map(|preamble| vec![preamble.to_owned()])
      .unwrap_or_default();

    Ok(Shader {
      state,
      handle: ObjectHandle::new(id, ObjectFlags::CREATED | ObjectFlags::DELETE_ON_DESTRUCTION),
      ty,
      sources,
      compile: RefCell::new(CompileState::Uncompiled),
    })
  }

  /// Whether a stage type can be used with a context.
  pub fn is_type_supported(ctx: &Context<B>, ty: StageType) -> bool {
    let caps = ctx.capabilities();
    let version = caps.version();

    match ty {
      StageType::VertexShader | StageType::FragmentShader => true,

      StageType::GeometryShader => {
        version.is_at_least(Version::GL320) || version.is_at_least(Version::GLES320)
      }

      StageType::TessellationControlShader | StageType::TessellationEvaluationShader => {
        version.is_at_least(Version::GL400) || version.is_at_least(Version::GLES320)
      }

      StageType::ComputeShader => caps.is_supported(Extension::ArbComputeShader),
    }
  }

  pub fn ty(&self) -> StageType {
    self.ty
  }

  /// Every source the driver will see, version directive and `#line` markers included.
  pub fn sources(&self) -> &[String] {
    &self.sources
  }

  /// Add a source.
  ///
  /// Sources are numbered in the order they’re added, starting at `1` (`0` without a version
  /// directive), so that driver messages name the source they come from. Empty sources are
  /// ignored.
  pub fn add_source(&mut self, source: impl Into<String>) -> &mut Self {
    debug_assert!(
      matches!(*self.compile.borrow(), CompileState::Uncompiled),
      "Shader::add_source(): compilation was already submitted"
    );

    let source = source.into();

    if source.is_empty() {
      return self;
    }

    // the version directive must come first, so the first source has no marker of its own
    if self.sources.is_empty() {
      self.sources.push(String::new());
    } else {
      self
        .sources
        .push(format!("#line 1 {}\n", (self.sources.len() + 1) / 2));
    }

    self.sources.push(source);
    self
  }

  /// Add the content of a file as a source.
  pub fn add_file(&mut self, path: impl AsRef<Path>) -> io::Result<&mut Self> {
    let source = fs::read_to_string(path)?;
    Ok(self.add_source(source))
  }

  /// Compile and wait for the result.
  pub fn compile(&mut self) -> Result<(), StageError> {
    self.submit_compile();
    self.check_compile()
  }

  /// Compile several shaders, letting the driver work on all of them before checking any.
  ///
  /// Every shader is checked, so every failure is logged. The first failure is returned.
  pub fn compile_all(shaders: &mut [&mut Shader<B>]) -> Result<(), StageError> {
    for shader in shaders.iter_mut() {
      shader.submit_compile();
    }

    shaders
      .iter()
      .map(|shader| shader.check_compile())
      .fold(Ok(()), |result, check| result.and(check))
  }

  /// Upload the sources and start the compilation without waiting for it.
  pub fn submit_compile(&mut self) {
    debug_assert!(
      self.sources.len() > 1,
      "Shader::submit_compile(): no sources added"
    );

    let sources = self.sources.iter().map(String::as_str).collect::<Vec<_>>();

    {
      let mut state = self.state.borrow_mut();
      unsafe {
        state.backend_mut().shader_source(self.handle.id(), &sources);
        state.backend_mut().compile_shader(self.handle.id());
      }
    }

    *self.compile.borrow_mut() = CompileState::Submitted;
  }

  /// Whether the submitted compilation finished. Never blocks.
  ///
  /// Without `GL_KHR_parallel_shader_compile`, a submitted compilation is always reported as
  /// finished; [`Shader::check_compile`] then waits for it.
  pub fn is_compile_finished(&self) -> bool {
    match *self.compile.borrow() {
      CompileState::Uncompiled => false,
      CompileState::Finished(_) => true,
      CompileState::Submitted => {
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
            .get_shader_parameter(self.handle.id(), ShaderParameter::CompletionStatus)
            != 0
        }
      }
    }
  }

  /// Wait for the compilation to finish and report its result.
  ///
  /// The driver message is logged the first time the result is known: as an error on failure, as
  /// a warning if a successful compilation still produced one.
  pub fn check_compile(&self) -> Result<(), StageError> {
    let submitted = match *self.compile.borrow() {
      CompileState::Finished(ref result) => return result.clone(),
      CompileState::Submitted => true,
      CompileState::Uncompiled => false,
    };

    debug_assert!(
      submitted,
      "Shader::check_compile(): compilation wasn’t submitted"
    );

    let (success, log) = {
      let mut state = self.state.borrow_mut();
      let backend = state.backend_mut();
      let id = self.handle.id();

      unsafe {
        let success = backend.get_shader_parameter(id, ShaderParameter::CompileStatus) != 0;
        let log = if backend.get_shader_parameter(id, ShaderParameter::InfoLogLength) > 1 {
          clean_log(backend.get_shader_info_log(id))
        } else {
          String::new()
        };

        (success, log)
      }
    };

    let result = if success {
      if !log.is_empty() {
        warn!(
          "compilation of {} succeeded with the following message:\n{}",
          self.ty, log
        );
      }

      Ok(())
    } else {
      let log = if log.is_empty() {
        "(no message)\n".to_owned()
      } else {
        log
      };
      let e = StageError::CompilationFailed(self.ty, log);
      error!("{}", e);
      Err(e)
    };

    *self.compile.borrow_mut() = CompileState::Finished(result.clone());
    result
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
        .get_object_label(ObjectKind::Shader, self.handle.id())
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
            .object_label(ObjectKind::Shader, self.handle.id(), label);
        }
      } else {
        debug!("ignoring label of shader {}: debug labels are unsupported", self.handle.id());
      }
    }

    self
  }
}

impl<B> GraphicsObject for Shader<B>
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

impl<B> Drop for Shader<B>
where
  B: Backend,
{
  fn drop(&mut self) {
    if !self.handle.must_delete() {
      return;
    }

    let id = self.handle.id();

    match self.state.try_borrow_mut() {
      Ok(mut state) => unsafe { state.backend_mut().delete_shader(id) },
      Err(_) => warn!("leaking shader {}: the graphics state is in use", id),
    }
  }
}

/// Turn a raw driver log into a message.
///
/// Drivers hand logs back NUL-terminated inside a larger buffer, and some of them can’t keep
/// quiet when there’s nothing to say. The result is either empty or ends with a newline.
pub(crate) fn clean_log(mut raw: Vec<u8>) -> String {
  if let Some(nul) = raw.iter().position(|&b| b == 0) {
    raw.truncate(nul);
  }

  let mut log = String::from_utf8_lossy(&raw).into_owned();

  if log.trim().is_empty() {
    return String::new();
  }

  if !log.ends_with('\n') {
    log.push('\n');
  }

  log
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clean_logs() {
    assert_eq!(clean_log(b"error: oops\n\0garbage".to_vec()), "error: oops\n");
    assert_eq!(clean_log(b"error: oops".to_vec()), "error: oops\n");
    assert_eq!(clean_log(b" \n\t\0more".to_vec()), "");
    assert_eq!(clean_log(Vec::new()), "");
  }

  #[test]
  fn stage_error_message() {
    let e = StageError::CompilationFailed(StageType::FragmentShader, "0(3): oops\n".to_owned());

    assert_eq!(
      e.to_string(),
      "compilation of fragment shader failed with the following message:\n0(3): oops\n"
    );
    assert_eq!(
      StageError::UnsupportedType(StageType::ComputeShader).to_string(),
      "unsupported compute shader"
    );
  }
}
