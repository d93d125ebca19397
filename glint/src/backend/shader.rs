//! Shader backend interface.

use crate::shader::StageType;

/// Shader parameter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ShaderParameter {
  /// Whether the last compilation succeeded. Blocks until it finished.
  CompileStatus,
  /// Length of the info log.
  InfoLogLength,
  /// Whether the last compilation finished. Never blocks.
  CompletionStatus,
}

/// Shader driver entry points.
pub unsafe trait ShaderBackend {
  /// Create a shader object; `0` on failure.
  unsafe fn create_shader(&mut self, ty: StageType) -> u32;

  unsafe fn delete_shader(&mut self, id: u32);

  /// Replace the sources of a shader; they’re concatenated in order.
  unsafe fn shader_source(&mut self, id: u32, sources: &[&str]);

  /// Submit the compilation. Might return before the compilation finished.
  unsafe fn compile_shader(&mut self, id: u32);

  unsafe fn get_shader_parameter(&mut self, id: u32, parameter: ShaderParameter) -> i32;

  /// Raw info log, as the driver wrote it.
  unsafe fn get_shader_info_log(&mut self, id: u32) -> Vec<u8>;
}
