//! Shader program backend interface.

use crate::shader::program::TransformFeedbackBufferMode;

/// Value of a missing uniform block index.
pub const INVALID_INDEX: u32 = u32::MAX;

/// Program parameter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProgramParameter {
  /// Whether the last link succeeded. Blocks until it finished.
  LinkStatus,
  /// Whether the last validation succeeded.
  ValidateStatus,
  /// Length of the info log.
  InfoLogLength,
  /// Whether the last link finished. Never blocks.
  CompletionStatus,
}

/// Uniform data, as a flat slice of one or several values.
///
/// The number of values set is the length of the slice divided by the number of components (or
/// `columns * rows` for matrices). Matrices are column-major.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue<'a> {
  Float { components: u8, values: &'a [f32] },
  Int { components: u8, values: &'a [i32] },
  UInt { components: u8, values: &'a [u32] },
  Double { components: u8, values: &'a [f64] },
  FloatMatrix { columns: u8, rows: u8, values: &'a [f32] },
  DoubleMatrix { columns: u8, rows: u8, values: &'a [f64] },
}

impl<'a> UniformValue<'a> {
  /// Number of elements (array size) the value covers.
  pub fn count(&self) -> usize {
    match *self {
      UniformValue::Float { components, values } => values.len() / components as usize,
      UniformValue::Int { components, values } => values.len() / components as usize,
      UniformValue::UInt { components, values } => values.len() / components as usize,
      UniformValue::Double { components, values } => values.len() / components as usize,
      UniformValue::FloatMatrix {
        columns,
        rows,
        values,
      } => values.len() / (columns as usize * rows as usize),
      UniformValue::DoubleMatrix {
        columns,
        rows,
        values,
      } => values.len() / (columns as usize * rows as usize),
    }
  }
}

/// Program driver entry points.
pub unsafe trait ProgramBackend {
  /// Create a program object; `0` on failure.
  unsafe fn create_program(&mut self) -> u32;

  unsafe fn delete_program(&mut self, id: u32);

  unsafe fn attach_shader(&mut self, program: u32, shader: u32);

  unsafe fn bind_attrib_location(&mut self, program: u32, index: u32, name: &str);

  unsafe fn bind_frag_data_location(&mut self, program: u32, color: u32, name: &str);

  unsafe fn bind_frag_data_location_indexed(
    &mut self,
    program: u32,
    color: u32,
    index: u32,
    name: &str,
  );

  unsafe fn transform_feedback_varyings(
    &mut self,
    program: u32,
    names: &[&str],
    mode: TransformFeedbackBufferMode,
  );

  /// Submit the link. Might return before the link finished.
  unsafe fn link_program(&mut self, program: u32);

  unsafe fn validate_program(&mut self, program: u32);

  unsafe fn get_program_parameter(&mut self, program: u32, parameter: ProgramParameter) -> i32;

  /// Raw info log, as the driver wrote it.
  unsafe fn get_program_info_log(&mut self, program: u32) -> Vec<u8>;

  /// Make a program current. `0` uses no program.
  unsafe fn use_program(&mut self, program: u32);

  /// Location of a uniform, negative if not found.
  unsafe fn get_uniform_location(&mut self, program: u32, name: &str) -> i32;

  /// Index of a uniform block, [`INVALID_INDEX`] if not found.
  unsafe fn get_uniform_block_index(&mut self, program: u32, name: &str) -> u32;

  unsafe fn uniform_block_binding(&mut self, program: u32, index: u32, binding: u32);

  /// Set a uniform of the current program.
  unsafe fn set_uniform(&mut self, location: i32, value: UniformValue);
}
