use gl::types::*;
use glint::backend::program::{ProgramBackend, ProgramParameter, UniformValue};
use glint::backend::shader::{ShaderBackend, ShaderParameter};
use glint::shader::program::TransformFeedbackBufferMode;
use glint::shader::StageType;
use log::warn;
use std::ffi::CString;
use std::ptr;

use crate::opengl::GL;

// GL_KHR_parallel_shader_compile
const COMPLETION_STATUS_KHR: GLenum = 0x91B1;

fn opengl_shader_type(t: StageType) -> GLenum {
  match t {
    StageType::TessellationControlShader => gl::TESS_CONTROL_SHADER,
    StageType::TessellationEvaluationShader => gl::TESS_EVALUATION_SHADER,
    StageType::VertexShader => gl::VERTEX_SHADER,
    StageType::GeometryShader => gl::GEOMETRY_SHADER,
    StageType::FragmentShader => gl::FRAGMENT_SHADER,
    StageType::ComputeShader => gl::COMPUTE_SHADER,
  }
}

/// C string of a name, or `None` (with a warning) if it contains a NUL byte.
fn c_name(name: &str) -> Option<CString> {
  match CString::new(name) {
    Ok(name) => Some(name),
    Err(_) => {
      warn!("'{}' contains a NUL byte and cannot be passed to the driver", name);
      None
    }
  }
}

unsafe impl ShaderBackend for GL {
  unsafe fn create_shader(&mut self, ty: StageType) -> u32 {
    gl::CreateShader(opengl_shader_type(ty))
  }

  unsafe fn delete_shader(&mut self, id: u32) {
    gl::DeleteShader(id);
  }

  unsafe fn shader_source(&mut self, id: u32, sources: &[&str]) {
    let pointers: Vec<*const GLchar> = sources.iter().map(|s| s.as_ptr() as _).collect();
    let lengths: Vec<GLint> = sources.iter().map(|s| s.len() as GLint).collect();

    gl::ShaderSource(
      id,
      sources.len() as GLsizei,
      pointers.as_ptr(),
      lengths.as_ptr(),
    );
  }

  unsafe fn compile_shader(&mut self, id: u32) {
    gl::CompileShader(id);
  }

  unsafe fn get_shader_parameter(&mut self, id: u32, parameter: ShaderParameter) -> i32 {
    let name = match parameter {
      ShaderParameter::CompileStatus => gl::COMPILE_STATUS,
      ShaderParameter::InfoLogLength => gl::INFO_LOG_LENGTH,
      ShaderParameter::CompletionStatus => COMPLETION_STATUS_KHR,
    };

    let mut value = 0;
    gl::GetShaderiv(id, name, &mut value);
    value
  }

  unsafe fn get_shader_info_log(&mut self, id: u32) -> Vec<u8> {
    let mut log_len: GLint = 0;
    gl::GetShaderiv(id, gl::INFO_LOG_LENGTH, &mut log_len);

    let mut log = vec![0u8; log_len.max(0) as usize];

    if log_len > 0 {
      gl::GetShaderInfoLog(id, log_len, ptr::null_mut(), log.as_mut_ptr() as *mut GLchar);
    }

    log
  }
}

unsafe impl ProgramBackend for GL {
  unsafe fn create_program(&mut self) -> u32 {
    gl::CreateProgram()
  }

  unsafe fn delete_program(&mut self, id: u32) {
    gl::DeleteProgram(id);
  }

  unsafe fn attach_shader(&mut self, program: u32, shader: u32) {
    gl::AttachShader(program, shader);
  }

  unsafe fn bind_attrib_location(&mut self, program: u32, index: u32, name: &str) {
    if let Some(name) = c_name(name) {
      gl::BindAttribLocation(program, index, name.as_ptr() as *const GLchar);
    }
  }

  unsafe fn bind_frag_data_location(&mut self, program: u32, color: u32, name: &str) {
    if let Some(name) = c_name(name) {
      gl::BindFragDataLocation(program, color, name.as_ptr() as *const GLchar);
    }
  }

  unsafe fn bind_frag_data_location_indexed(
    &mut self,
    program: u32,
    color: u32,
    index: u32,
    name: &str,
  ) {
    if let Some(name) = c_name(name) {
      gl::BindFragDataLocationIndexed(program, color, index, name.as_ptr() as *const GLchar);
    }
  }

  unsafe fn transform_feedback_varyings(
    &mut self,
    program: u32,
    names: &[&str],
    mode: TransformFeedbackBufferMode,
  ) {
    let Some(names) = names.iter().map(|name| c_name(name)).collect::<Option<Vec<_>>>() else {
      return;
    };
    let pointers: Vec<*const GLchar> = names.iter().map(|name| name.as_ptr()).collect();

    let mode = match mode {
      TransformFeedbackBufferMode::Interleaved => gl::INTERLEAVED_ATTRIBS,
      TransformFeedbackBufferMode::Separate => gl::SEPARATE_ATTRIBS,
    };

    gl::TransformFeedbackVaryings(program, pointers.len() as GLsizei, pointers.as_ptr(), mode);
  }

  unsafe fn link_program(&mut self, program: u32) {
    gl::LinkProgram(program);
  }

  unsafe fn validate_program(&mut self, program: u32) {
    gl::ValidateProgram(program);
  }

  unsafe fn get_program_parameter(&mut self, program: u32, parameter: ProgramParameter) -> i32 {
    let name = match parameter {
      ProgramParameter::LinkStatus => gl::LINK_STATUS,
      ProgramParameter::ValidateStatus => gl::VALIDATE_STATUS,
      ProgramParameter::InfoLogLength => gl::INFO_LOG_LENGTH,
      ProgramParameter::CompletionStatus => COMPLETION_STATUS_KHR,
    };

    let mut value = 0;
    gl::GetProgramiv(program, name, &mut value);
    value
  }

  unsafe fn get_program_info_log(&mut self, program: u32) -> Vec<u8> {
    let mut log_len: GLint = 0;
    gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut log_len);

    let mut log = vec![0u8; log_len.max(0) as usize];

    if log_len > 0 {
      gl::GetProgramInfoLog(program, log_len, ptr::null_mut(), log.as_mut_ptr() as *mut GLchar);
    }

    log
  }

  unsafe fn use_program(&mut self, program: u32) {
    gl::UseProgram(program);
  }

  unsafe fn get_uniform_location(&mut self, program: u32, name: &str) -> i32 {
    match c_name(name) {
      Some(name) => gl::GetUniformLocation(program, name.as_ptr() as *const GLchar),
      None => -1,
    }
  }

  unsafe fn get_uniform_block_index(&mut self, program: u32, name: &str) -> u32 {
    match c_name(name) {
      Some(name) => gl::GetUniformBlockIndex(program, name.as_ptr() as *const GLchar),
      None => gl::INVALID_INDEX,
    }
  }

  unsafe fn uniform_block_binding(&mut self, program: u32, index: u32, binding: u32) {
    gl::UniformBlockBinding(program, index, binding);
  }

  unsafe fn set_uniform(&mut self, location: i32, value: UniformValue) {
    let count = value.count() as GLsizei;

    match value {
      UniformValue::Float { components, values } => {
        let f: unsafe fn(GLint, GLsizei, *const GLfloat) = match components {
          1 => gl::Uniform1fv,
          2 => gl::Uniform2fv,
          3 => gl::Uniform3fv,
          _ => gl::Uniform4fv,
        };
        f(location, count, values.as_ptr());
      }

      UniformValue::Int { components, values } => {
        let f: unsafe fn(GLint, GLsizei, *const GLint) = match components {
          1 => gl::Uniform1iv,
          2 => gl::Uniform2iv,
          3 => gl::Uniform3iv,
          _ => gl::Uniform4iv,
        };
        f(location, count, values.as_ptr());
      }

      UniformValue::UInt { components, values } => {
        let f: unsafe fn(GLint, GLsizei, *const GLuint) = match components {
          1 => gl::Uniform1uiv,
          2 => gl::Uniform2uiv,
          3 => gl::Uniform3uiv,
          _ => gl::Uniform4uiv,
        };
        f(location, count, values.as_ptr());
      }

      UniformValue::Double { components, values } => {
        let f: unsafe fn(GLint, GLsizei, *const GLdouble) = match components {
          1 => gl::Uniform1dv,
          2 => gl::Uniform2dv,
          3 => gl::Uniform3dv,
          _ => gl::Uniform4dv,
        };
        f(location, count, values.as_ptr());
      }

      // GL names matrices columns × rows, like glint
      UniformValue::FloatMatrix {
        columns,
        rows,
        values,
      } => {
        let f: unsafe fn(GLint, GLsizei, GLboolean, *const GLfloat) = match (columns, rows) {
          (2, 2) => gl::UniformMatrix2fv,
          (2, 3) => gl::UniformMatrix2x3fv,
          (2, 4) => gl::UniformMatrix2x4fv,
          (3, 2) => gl::UniformMatrix3x2fv,
          (3, 3) => gl::UniformMatrix3fv,
          (3, 4) => gl::UniformMatrix3x4fv,
          (4, 2) => gl::UniformMatrix4x2fv,
          (4, 3) => gl::UniformMatrix4x3fv,
          _ => gl::UniformMatrix4fv,
        };
        f(location, count, gl::FALSE, values.as_ptr());
      }

      UniformValue::DoubleMatrix {
        columns,
        rows,
        values,
      } => {
        let f: unsafe fn(GLint, GLsizei, GLboolean, *const GLdouble) = match (columns, rows) {
          (2, 2) => gl::UniformMatrix2dv,
          (2, 3) => gl::UniformMatrix2x3dv,
          (2, 4) => gl::UniformMatrix2x4dv,
          (3, 2) => gl::UniformMatrix3x2dv,
          (3, 3) => gl::UniformMatrix3dv,
          (3, 4) => gl::UniformMatrix3x4dv,
          (4, 2) => gl::UniformMatrix4x2dv,
          (4, 3) => gl::UniformMatrix4x3dv,
          _ => gl::UniformMatrix4dv,
        };
        f(location, count, gl::FALSE, values.as_ptr());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_with_nul_are_rejected() {
    assert!(c_name("position").is_some());
    assert!(c_name("posi\0tion").is_none());
  }

  #[test]
  fn shader_types() {
    assert_eq!(opengl_shader_type(StageType::ComputeShader), gl::COMPUTE_SHADER);
    assert_eq!(
      opengl_shader_type(StageType::TessellationControlShader),
      gl::TESS_CONTROL_SHADER
    );
  }
}
