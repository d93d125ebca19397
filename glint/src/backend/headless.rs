//! In-memory backend.
//!
//! [`Headless`] emulates a driver without any GPU: texture levels and buffers live in byte vectors,
//! shaders are checked by a tiny preprocessor, programs reflect their uniforms from the shader
//! sources, and draws are recorded instead of rasterized. It follows the OpenGL rules glint relies
//! on (bind points, pixel storage shared by compressed and uncompressed transfers, pixel buffers
//! turning pointers into offsets, immutable storage, views) closely enough to test the state cache
//! and every object on top of it deterministically.
//!
//! Driver errors don’t panic: they’re recorded and can be inspected with
//! [`Headless::take_errors`].
//!
//! # Shader checking
//!
//! Compilation fails when brackets are unbalanced or when a line starts with `#error`. A line
//! starting with `#warning` compiles but leaves a message in the info log. `#line` directives are
//! honoured when reporting line numbers. Linking fails when a stage lacks a `main` function or when
//! a transform feedback varying isn’t mentioned by a vertex processing stage.
//!
//! A uniform declared with `uniform <type> <name>;` is active only if its name is used at least
//! once besides its declaration, mimicking the dead-code elimination of real compilers.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::backend::buffer::{BufferBackend, BufferTarget, BufferUsage};
use crate::backend::mesh::MeshBackend;
use crate::backend::program::{ProgramBackend, ProgramParameter, UniformValue, INVALID_INDEX};
use crate::backend::shader::{ShaderBackend, ShaderParameter};
use crate::backend::texture::{
  ImageTarget, LevelParameter, StorageDirection, TextureBackend, TextureParameter, TextureTarget,
};
use crate::backend::{Backend, ContextInfo};
use crate::context::{Api, Extension, Version};
use crate::image::{CompressedPixelStorage, DataProperties, PixelStorage};
use crate::mesh::{MeshIndexType, MeshPrimitive};
use crate::object::ObjectKind;
use crate::pixel::{
  pixel_size, CompressedPixelFormat, ImageAccess, ImageFormat, PixelFormat, PixelType,
  TextureFormat,
};
use crate::shader::program::TransformFeedbackBufferMode;
use crate::shader::StageType;
use crate::state::ImageBinding;
use crate::texture::level_size;

/// Bytes appended after the terminating NUL of info logs, when enabled.
const LOG_GARBAGE: &[u8] = b"\x7f\x13garbage";

/// What the emulated driver reports and how it behaves.
#[derive(Clone, Debug)]
pub struct HeadlessConfig {
  pub api: Api,
  pub version: Version,
  /// Advertised extension names.
  pub extensions: Vec<String>,
  pub max_texture_units: u32,
  pub max_image_units: u32,
  /// Number of completion queries answering “not finished” after a compile or link.
  pub compile_latency: u32,
  /// Whether info logs carry garbage after their terminating NUL, as some drivers do.
  pub log_garbage: bool,
}

impl Default for HeadlessConfig {
  /// OpenGL 4.6 with parallel shader compilation.
  fn default() -> Self {
    HeadlessConfig {
      api: Api::OpenGL,
      version: Version::GL460,
      extensions: vec![Extension::KhrParallelShaderCompile.name().to_owned()],
      max_texture_units: 16,
      max_image_units: 8,
      compile_latency: 2,
      log_garbage: true,
    }
  }
}

impl HeadlessConfig {
  /// WebGL 2: no debug labels, no image units, no direct state access.
  pub fn webgl2() -> Self {
    HeadlessConfig {
      api: Api::WebGL,
      version: Version::GLES300,
      extensions: Vec::new(),
      max_texture_units: 16,
      max_image_units: 0,
      compile_latency: 0,
      log_garbage: false,
    }
  }

  /// OpenGL 3.3 without extensions, which forces every fallback path.
  pub fn gl33() -> Self {
    HeadlessConfig {
      api: Api::OpenGL,
      version: Version::GL330,
      extensions: Vec::new(),
      max_texture_units: 16,
      max_image_units: 0,
      compile_latency: 0,
      log_garbage: false,
    }
  }
}

/// Uniform data recorded by [`Headless`].
#[derive(Clone, Debug, PartialEq)]
pub enum UniformData {
  Float { components: u8, values: Vec<f32> },
  Int { components: u8, values: Vec<i32> },
  UInt { components: u8, values: Vec<u32> },
  Double { components: u8, values: Vec<f64> },
  FloatMatrix { columns: u8, rows: u8, values: Vec<f32> },
  DoubleMatrix { columns: u8, rows: u8, values: Vec<f64> },
}

impl<'a> From<UniformValue<'a>> for UniformData {
  fn from(value: UniformValue<'a>) -> Self {
    match value {
      UniformValue::Float { components, values } => UniformData::Float {
        components,
        values: values.to_vec(),
      },
      UniformValue::Int { components, values } => UniformData::Int {
        components,
        values: values.to_vec(),
      },
      UniformValue::UInt { components, values } => UniformData::UInt {
        components,
        values: values.to_vec(),
      },
      UniformValue::Double { components, values } => UniformData::Double {
        components,
        values: values.to_vec(),
      },
      UniformValue::FloatMatrix {
        columns,
        rows,
        values,
      } => UniformData::FloatMatrix {
        columns,
        rows,
        values: values.to_vec(),
      },
      UniformValue::DoubleMatrix {
        columns,
        rows,
        values,
      } => UniformData::DoubleMatrix {
        columns,
        rows,
        values: values.to_vec(),
      },
    }
  }
}

/// A draw or dispatch issued to [`Headless`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DrawCall {
  Arrays {
    program: u32,
    vertex_array: u32,
    primitive: MeshPrimitive,
    first: u32,
    count: u32,
    instances: u32,
    base_instance: u32,
  },
  Elements {
    program: u32,
    vertex_array: u32,
    primitive: MeshPrimitive,
    count: u32,
    index_type: MeshIndexType,
    offset: usize,
    base_vertex: i32,
    instances: u32,
    base_instance: u32,
  },
  TransformFeedback {
    program: u32,
    vertex_array: u32,
    primitive: MeshPrimitive,
    transform_feedback: u32,
    stream: u32,
    instances: u32,
  },
  Compute {
    program: u32,
    groups: [u32; 3],
  },
}

/// A single image of a texture level.
#[derive(Clone, Debug)]
struct Level {
  size: [u32; 3],
  format: TextureFormat,
  data: Vec<u8>,
}

impl Level {
  fn new(size: [u32; 3], format: TextureFormat) -> Self {
    let (units, unit_size) = unit_layout(format, size);
    let len = units.iter().map(|&d| d as usize).product::<usize>() * unit_size;

    Level {
      size,
      format,
      data: vec![0; len],
    }
  }
}

/// Levels of a texture, keyed by cube map face (`0` for other targets) and level.
///
/// Shared between a texture and its views.
#[derive(Debug, Default)]
struct Storage {
  levels: HashMap<(u32, u32), Level>,
}

#[derive(Clone, Copy, Debug)]
struct ViewRange {
  format: TextureFormat,
  min_level: u32,
  levels: u32,
  min_layer: u32,
  layers: u32,
}

#[derive(Debug)]
struct TextureObject {
  target: Option<TextureTarget>,
  storage: Rc<RefCell<Storage>>,
  immutable: bool,
  samples: u32,
  view: Option<ViewRange>,
  parameters: Vec<TextureParameter>,
}

impl TextureObject {
  fn new(target: Option<TextureTarget>) -> Self {
    TextureObject {
      target,
      storage: Rc::default(),
      immutable: false,
      samples: 0,
      view: None,
      parameters: Vec::new(),
    }
  }
}

/// Where a level of the currently bound texture lives.
struct LevelLocation {
  storage: Rc<RefCell<Storage>>,
  /// `None` if the level is outside of a view.
  key: Option<(u32, u32)>,
  /// Layer axis, first layer and layer count of a view.
  layers: Option<(usize, u32, u32)>,
  view_format: Option<TextureFormat>,
  immutable: bool,
}

impl LevelLocation {
  fn size(&self, level: &Level) -> [u32; 3] {
    let mut size = level.size;

    if let Some((axis, first, count)) = self.layers {
      size[axis] = count.min(size[axis].saturating_sub(first));
    }

    size
  }

  fn offset(&self, mut offset: [u32; 3]) -> [u32; 3] {
    if let Some((axis, first, _)) = self.layers {
      offset[axis] += first;
    }

    offset
  }
}

#[derive(Debug)]
struct ShaderObject {
  ty: StageType,
  source: String,
  status: Option<bool>,
  log: String,
  pending_polls: u32,
}

#[derive(Debug, Default)]
struct ProgramObject {
  attached: Vec<u32>,
  status: Option<bool>,
  validated: bool,
  log: String,
  pending_polls: u32,
  compute: bool,
  uniforms: Vec<String>,
  blocks: Vec<String>,
  block_bindings: HashMap<u32, u32>,
  attribute_locations: HashMap<String, u32>,
  fragment_locations: HashMap<String, (u32, u32)>,
  varyings: Vec<String>,
  varying_mode: Option<TransformFeedbackBufferMode>,
}

/// In-memory driver.
#[derive(Debug)]
pub struct Headless {
  config: HeadlessConfig,
  next_id: u32,
  calls: HashMap<&'static str, usize>,
  errors: Vec<String>,
  labels: HashMap<(ObjectKind, u32), String>,
  // textures
  textures: HashMap<u32, TextureObject>,
  active_unit: u32,
  units: Vec<HashMap<TextureTarget, u32>>,
  image_units: Vec<ImageBinding>,
  pack: PixelStorage,
  unpack: PixelStorage,
  compressed_pack: CompressedPixelStorage,
  compressed_unpack: CompressedPixelStorage,
  // pixel buffers
  buffers: HashMap<u32, Vec<u8>>,
  pixel_pack_buffer: u32,
  pixel_unpack_buffer: u32,
  // shaders and programs
  shaders: HashMap<u32, ShaderObject>,
  programs: HashMap<u32, ProgramObject>,
  current_program: u32,
  uniform_values: HashMap<(u32, i32), UniformData>,
  // drawing
  vertex_array: u32,
  transform_feedbacks: HashSet<u32>,
  draws: Vec<DrawCall>,
}

impl Headless {
  pub fn new(config: HeadlessConfig) -> Self {
    let units = (0..config.max_texture_units).map(|_| HashMap::new()).collect();
    let image_units = vec![ImageBinding::NONE; config.max_image_units as usize];

    Headless {
      config,
      next_id: 1,
      calls: HashMap::new(),
      errors: Vec::new(),
      labels: HashMap::new(),
      textures: HashMap::new(),
      active_unit: 0,
      units,
      image_units,
      pack: PixelStorage::default(),
      unpack: PixelStorage::default(),
      compressed_pack: CompressedPixelStorage::default(),
      compressed_unpack: CompressedPixelStorage::default(),
      buffers: HashMap::new(),
      pixel_pack_buffer: 0,
      pixel_unpack_buffer: 0,
      shaders: HashMap::new(),
      programs: HashMap::new(),
      current_program: 0,
      uniform_values: HashMap::new(),
      vertex_array: 0,
      transform_feedbacks: HashSet::new(),
      draws: Vec::new(),
    }
  }

  pub fn config(&self) -> &HeadlessConfig {
    &self.config
  }

  /// Number of times a backend method was called, by method name.
  pub fn call_count(&self, method: &str) -> usize {
    self.calls.get(method).copied().unwrap_or(0)
  }

  /// Forget every recorded call.
  pub fn reset_call_counts(&mut self) {
    self.calls.clear();
  }

  /// Drain the recorded driver errors.
  pub fn take_errors(&mut self) -> Vec<String> {
    std::mem::take(&mut self.errors)
  }

  /// Texture bound to a target of a unit, `0` if none.
  pub fn bound_texture(&self, unit: u32, target: TextureTarget) -> u32 {
    self
      .units
      .get(unit as usize)
      .and_then(|targets| targets.get(&target))
      .copied()
      .unwrap_or(0)
  }

  /// Binding of an image unit.
  pub fn bound_image(&self, unit: u32) -> ImageBinding {
    self
      .image_units
      .get(unit as usize)
      .copied()
      .unwrap_or(ImageBinding::NONE)
  }

  pub fn active_texture_unit(&self) -> u32 {
    self.active_unit
  }

  /// Whether a texture object exists.
  pub fn texture_exists(&self, id: u32) -> bool {
    self.textures.contains_key(&id)
  }

  /// Parameters set on a texture, in order.
  pub fn texture_parameters(&self, id: u32) -> &[TextureParameter] {
    self
      .textures
      .get(&id)
      .map_or(&[][..], |texture| &texture.parameters)
  }

  /// Sample count of a multisample texture.
  pub fn texture_samples(&self, id: u32) -> u32 {
    self.textures.get(&id).map_or(0, |texture| texture.samples)
  }

  /// Buffer bound to a target, `0` if none.
  pub fn bound_buffer(&self, target: BufferTarget) -> u32 {
    match target {
      BufferTarget::PixelPack => self.pixel_pack_buffer,
      BufferTarget::PixelUnpack => self.pixel_unpack_buffer,
    }
  }

  /// Content of a buffer, `None` if it doesn’t exist.
  pub fn buffer_contents(&self, id: u32) -> Option<&[u8]> {
    self.buffers.get(&id).map(Vec::as_slice)
  }

  pub fn shader_exists(&self, id: u32) -> bool {
    self.shaders.contains_key(&id)
  }

  pub fn program_exists(&self, id: u32) -> bool {
    self.programs.contains_key(&id)
  }

  pub fn current_program(&self) -> u32 {
    self.current_program
  }

  /// Shaders attached to a program.
  pub fn attached_shaders(&self, program: u32) -> &[u32] {
    self
      .programs
      .get(&program)
      .map_or(&[][..], |program| &program.attached)
  }

  /// Location bound to a vertex attribute before linking.
  pub fn attribute_location(&self, program: u32, name: &str) -> Option<u32> {
    self
      .programs
      .get(&program)?
      .attribute_locations
      .get(name)
      .copied()
  }

  /// Color attachment and index bound to a fragment output before linking.
  pub fn fragment_data_location(&self, program: u32, name: &str) -> Option<(u32, u32)> {
    self
      .programs
      .get(&program)?
      .fragment_locations
      .get(name)
      .copied()
  }

  /// Transform feedback varyings and their buffer mode.
  pub fn transform_feedback_varyings(
    &self,
    program: u32,
  ) -> Option<(&[String], TransformFeedbackBufferMode)> {
    let program = self.programs.get(&program)?;
    program
      .varying_mode
      .map(|mode| (program.varyings.as_slice(), mode))
  }

  /// Binding point of a uniform block.
  pub fn uniform_block_binding_of(&self, program: u32, index: u32) -> Option<u32> {
    self
      .programs
      .get(&program)?
      .block_bindings
      .get(&index)
      .copied()
  }

  /// Last value uploaded to a uniform.
  pub fn uniform(&self, program: u32, location: i32) -> Option<&UniformData> {
    self.uniform_values.get(&(program, location))
  }

  /// Every draw and dispatch, in order.
  pub fn draws(&self) -> &[DrawCall] {
    &self.draws
  }

  fn record(&mut self, method: &'static str) {
    *self.calls.entry(method).or_insert(0) += 1;
  }

  fn error(&mut self, method: &str, message: impl AsRef<str>) {
    self
      .errors
      .push(format!("{}: {}", method, message.as_ref()));
  }

  fn gen_id(&mut self) -> u32 {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  fn unpack_properties(
    &self,
    format: PixelFormat,
    ty: PixelType,
    size: [u32; 3],
  ) -> DataProperties {
    self.unpack.data_properties(pixel_size(format, ty), size)
  }

  /// Texture bound to a target of the active unit.
  fn bound_object(&mut self, method: &str, target: TextureTarget) -> Option<u32> {
    let id = self.bound_texture(self.active_unit, target);

    if id == 0 {
      self.error(method, format!("no texture bound to {:?}", target));
      None
    } else {
      Some(id)
    }
  }

  fn locate(&mut self, method: &str, target: ImageTarget, level: u32) -> Option<LevelLocation> {
    let id = self.bound_object(method, target.texture_target())?;
    let texture = self.textures.get(&id)?;

    let face = match target {
      ImageTarget::CubeMapFace(face) => face.index(),
      ImageTarget::Texture(_) => 0,
    };

    let location = match texture.view {
      Some(view) => {
        let face = if matches!(target, ImageTarget::CubeMapFace(_)) {
          face + view.min_layer
        } else {
          face
        };

        LevelLocation {
          storage: texture.storage.clone(),
          key: (level < view.levels).then_some((face, view.min_level + level)),
          layers: layer_axis(target.texture_target())
            .map(|axis| (axis, view.min_layer, view.layers)),
          view_format: Some(view.format),
          immutable: true,
        }
      }

      None => LevelLocation {
        storage: texture.storage.clone(),
        key: Some((face, level)),
        layers: None,
        view_format: None,
        immutable: texture.immutable,
      },
    };

    Some(location)
  }

  /// Run a closure on an existing level of the bound texture.
  fn with_level<R>(
    &mut self,
    method: &str,
    target: ImageTarget,
    level: u32,
    f: impl FnOnce(&LevelLocation, &mut Level) -> Result<R, String>,
  ) -> Option<R> {
    let location = self.locate(method, target, level)?;
    let mut storage = location.storage.borrow_mut();

    let result = match location.key.and_then(|key| storage.levels.get_mut(&key)) {
      Some(image) => f(&location, image),
      None => Err(format!("level {} of {:?} doesn’t exist", level, target)),
    };
    drop(storage);

    match result {
      Ok(r) => Some(r),
      Err(e) => {
        self.error(method, e);
        None
      }
    }
  }

  /// Whether a client memory transfer can happen: with a pixel buffer bound, the driver would read
  /// the data pointer as an offset into the buffer.
  fn check_client_transfer(&mut self, method: &str, target: BufferTarget) -> bool {
    if self.bound_buffer(target) == 0 {
      return true;
    }

    self.error(method, format!("client memory transfer with a buffer bound to {:?}", target));
    false
  }

  /// Content of the buffer bound to a pixel target, from an offset to its end.
  fn pixel_buffer_contents(
    &mut self,
    method: &str,
    target: BufferTarget,
    offset: usize,
  ) -> Option<Vec<u8>> {
    let id = self.bound_buffer(target);

    let result = match self.buffers.get(&id) {
      Some(data) if offset <= data.len() => Ok(data[offset..].to_vec()),
      Some(data) => Err(format!(
        "offset {} is past the end of a {} bytes buffer",
        offset,
        data.len()
      )),
      None => Err(format!("no buffer bound to {:?}", target)),
    };

    match result {
      Ok(data) => Some(data),
      Err(e) => {
        self.error(method, e);
        None
      }
    }
  }

  /// A range of the buffer bound to the pixel unpack target.
  fn pixel_buffer_range(&mut self, method: &str, offset: usize, len: usize) -> Option<Vec<u8>> {
    let mut data = self.pixel_buffer_contents(method, BufferTarget::PixelUnpack, offset)?;

    if data.len() < len {
      let message = format!("{} bytes requested but only {} are available", len, data.len());
      self.error(method, message);
      return None;
    }

    data.truncate(len);
    Some(data)
  }

  fn write_pixel_buffer(&mut self, target: BufferTarget, offset: usize, data: &[u8]) {
    let id = self.bound_buffer(target);

    if let Some(buffer) = self.buffers.get_mut(&id) {
      buffer[offset..offset + data.len()].copy_from_slice(data);
    }
  }

  #[allow(clippy::too_many_arguments)]
  fn allocate_level(
    &mut self,
    method: &str,
    target: ImageTarget,
    level: u32,
    internal_format: TextureFormat,
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    data: Option<&[u8]>,
  ) {
    let Some(location) = self.locate(method, target, level) else {
      return;
    };

    if location.immutable {
      self.error(method, "the texture has immutable storage");
      return;
    }

    let mut image = Level::new(size, internal_format);

    if let Some(data) = data {
      let properties = self.unpack_properties(format, ty, size);
      let result = check_transfer_format(&image, format, ty)
        .and_then(|_| write_region(&mut image, [0; 3], size, properties, data));

      if let Err(e) = result {
        self.error(method, e);
        return;
      }
    }

    if let Some(key) = location.key {
      location.storage.borrow_mut().levels.insert(key, image);
    }
  }

  #[allow(clippy::too_many_arguments)]
  fn update_level(
    &mut self,
    method: &str,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    data: &[u8],
  ) {
    let properties = self.unpack_properties(format, ty, size);

    self.with_level(method, target, level, |location, image| {
      check_transfer_format(image, format, ty)?;
      write_region(image, location.offset(offset), size, properties, data)
    });
  }

  fn allocate_compressed_level(
    &mut self,
    method: &str,
    target: ImageTarget,
    level: u32,
    format: CompressedPixelFormat,
    size: [u32; 3],
    data: &[u8],
  ) {
    let Some(location) = self.locate(method, target, level) else {
      return;
    };

    if location.immutable {
      self.error(method, "the texture has immutable storage");
      return;
    }

    let mut image = Level::new(size, TextureFormat::Compressed(format));
    let properties = self.compressed_unpack.data_properties(format, size);

    if let Err(e) = write_region(&mut image, [0; 3], size, properties, data) {
      self.error(method, e);
      return;
    }

    if let Some(key) = location.key {
      location.storage.borrow_mut().levels.insert(key, image);
    }
  }

  #[allow(clippy::too_many_arguments)]
  fn update_compressed_level(
    &mut self,
    method: &str,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: CompressedPixelFormat,
    data: &[u8],
  ) {
    let properties = self.compressed_unpack.data_properties(format, size);

    self.with_level(method, target, level, |location, image| {
      if compressed_format(image)? != format {
        return Err(format!("{:?} doesn’t match {:?}", format, image.format));
      }

      write_region(image, location.offset(offset), size, properties, data)
    });
  }

  /// Read a whole level. Returns whether it succeeded.
  fn read_level(
    &mut self,
    method: &str,
    target: ImageTarget,
    level: u32,
    format: PixelFormat,
    ty: PixelType,
    data: &mut [u8],
  ) -> bool {
    let pack = self.pack;

    self
      .with_level(method, target, level, |location, image| {
        check_transfer_format(image, format, ty)?;

        let size = location.size(image);
        let properties = pack.data_properties(pixel_size(format, ty), size);
        read_region(image, location.offset([0; 3]), size, properties, data)
      })
      .is_some()
  }

  /// Read a whole compressed level. Returns whether it succeeded.
  fn read_compressed_level(
    &mut self,
    method: &str,
    target: ImageTarget,
    level: u32,
    data: &mut [u8],
  ) -> bool {
    let pack = self.compressed_pack;

    self
      .with_level(method, target, level, |location, image| {
        let format = compressed_format(image)?;
        let size = location.size(image);
        let properties = pack.data_properties(format, size);
        read_region(image, location.offset([0; 3]), size, properties, data)
      })
      .is_some()
  }

  /// Format of the base level of a texture, as seen through its view.
  fn texture_format(&self, id: u32) -> Option<TextureFormat> {
    let texture = self.textures.get(&id)?;

    if let Some(view) = texture.view {
      return Some(view.format);
    }

    let storage = texture.storage.borrow();
    storage.levels.get(&(0, 0)).map(|level| level.format)
  }

  fn shader_result(&self, source: &str) -> (bool, String) {
    match check_source(source) {
      Ok(warnings) => (true, warnings),
      Err(error) => (false, error),
    }
  }

  fn info_log(&self, log: &str) -> Vec<u8> {
    if log.is_empty() {
      return Vec::new();
    }

    let mut bytes = log.as_bytes().to_vec();
    bytes.push(0);

    if self.config.log_garbage {
      bytes.extend_from_slice(LOG_GARBAGE);
    }

    bytes
  }

  /// Link the attached shaders, returning active uniforms and uniform blocks.
  fn link(&self, program: &ProgramObject) -> Result<(Vec<String>, Vec<String>, bool), String> {
    if program.attached.is_empty() {
      return Err("error: no shaders attached\n".to_owned());
    }

    let mut stages: Vec<(StageType, &str)> = Vec::new();

    for id in &program.attached {
      let shader = self
        .shaders
        .get(id)
        .ok_or_else(|| format!("error: shader {} doesn’t exist\n", id))?;

      if shader.status != Some(true) {
        return Err(format!("error: {} {} isn’t compiled\n", shader.ty, id));
      }

      stages.push((shader.ty, &shader.source));
    }

    let compute = stages
      .iter()
      .any(|(ty, _)| *ty == StageType::ComputeShader);

    if compute
      && stages
        .iter()
        .any(|(ty, _)| *ty != StageType::ComputeShader)
    {
      return Err("error: compute shaders can’t be linked with other stages\n".to_owned());
    }

    for (ty, _) in &stages {
      let has_main = stages
        .iter()
        .filter(|(other, _)| other == ty)
        .any(|(_, source)| occurrences(source, "main") > 0);

      if !has_main {
        return Err(format!("error: {} has no main function\n", ty));
      }
    }

    let vertex_processing: String = stages
      .iter()
      .filter(|(ty, _)| *ty != StageType::FragmentShader)
      .map(|(_, source)| *source)
      .collect();

    for varying in &program.varyings {
      if occurrences(&vertex_processing, varying) == 0 {
        return Err(format!(
          "error: transform feedback varying '{}' isn’t an output\n",
          varying
        ));
      }
    }

    let all: String = stages.iter().map(|(_, source)| *source).collect();
    let mut uniforms = Vec::new();
    let mut blocks = Vec::new();

    for (_, source) in &stages {
      let (declared, declared_blocks) = declarations(source);

      for name in declared {
        if occurrences(&all, &name) >= 2 && !uniforms.contains(&name) {
          uniforms.push(name);
        }
      }

      for name in declared_blocks {
        if !blocks.contains(&name) {
          blocks.push(name);
        }
      }
    }

    Ok((uniforms, blocks, compute))
  }

  /// Program in use, if it’s linked.
  fn current_linked_program(&mut self, method: &str) -> Option<u32> {
    let program = self.current_program;

    if program == 0 {
      self.error(method, "no program in use");
      return None;
    }

    match self.programs.get(&program) {
      Some(p) if p.status == Some(true) => Some(program),
      _ => {
        self.error(method, format!("program {} isn’t linked", program));
        None
      }
    }
  }
}

/// Axis holding the layers of an array target.
fn layer_axis(target: TextureTarget) -> Option<usize> {
  match target {
    TextureTarget::Texture1DArray => Some(1),
    TextureTarget::Texture2DArray
    | TextureTarget::CubeMapArray
    | TextureTarget::Texture2DMultisampleArray => Some(2),
    _ => None,
  }
}

/// Number of dimensions shrinking with mip levels.
fn mip_dimensions(target: TextureTarget) -> usize {
  match target {
    TextureTarget::Texture1D | TextureTarget::Texture1DArray => 1,
    TextureTarget::Texture2D
    | TextureTarget::Texture2DArray
    | TextureTarget::CubeMap
    | TextureTarget::CubeMapArray => 2,
    TextureTarget::Texture3D => 3,
    TextureTarget::Texture2DMultisample | TextureTarget::Texture2DMultisampleArray => 0,
  }
}

/// Dimensions in addressable units (texels or blocks) and size of a unit, in bytes.
fn unit_layout(format: TextureFormat, size: [u32; 3]) -> ([u32; 3], usize) {
  match format {
    TextureFormat::Compressed(format) => {
      let block = format.block_size();
      let units = [
        size[0].div_ceil(block[0]),
        size[1].div_ceil(block[1]),
        size[2].div_ceil(block[2]),
      ];

      (units, format.block_data_size() as usize)
    }

    _ => (size, format.pixel_size()),
  }
}

/// Client and level byte offsets of every row of a region, and the length of a row.
fn row_spans(
  level: &Level,
  offset: [u32; 3],
  size: [u32; 3],
  properties: DataProperties,
  client_len: usize,
) -> Result<(Vec<(usize, usize)>, usize), String> {
  let (dims, unit_size) = unit_layout(level.format, level.size);
  let (offset, size) = match level.format {
    TextureFormat::Compressed(format) => {
      let block = format.block_size();
      let (units, _) = unit_layout(level.format, size);
      ([offset[0] / block[0], offset[1] / block[1], offset[2] / block[2]], units)
    }
    _ => (offset, size),
  };

  if (0..3).any(|i| offset[i] + size[i] > dims[i]) {
    return Err(format!(
      "region {:?} + {:?} is outside of a level of {:?}",
      offset, size, dims
    ));
  }

  let row = size[0] as usize * unit_size;
  let mut spans = Vec::with_capacity((size[1] * size[2]) as usize);

  for z in 0..size[2] as usize {
    for y in 0..size[1] as usize {
      let client = properties.offset + z * properties.slice_stride + y * properties.row_stride;

      if client + row > client_len {
        return Err(format!(
          "client data is too small: {} bytes, expected at least {}",
          client_len,
          client + row
        ));
      }

      let texel = (((offset[2] as usize + z) * dims[1] as usize + offset[1] as usize + y)
        * dims[0] as usize
        + offset[0] as usize)
        * unit_size;
      spans.push((client, texel));
    }
  }

  Ok((spans, row))
}

fn write_region(
  level: &mut Level,
  offset: [u32; 3],
  size: [u32; 3],
  properties: DataProperties,
  data: &[u8],
) -> Result<(), String> {
  let (spans, row) = row_spans(level, offset, size, properties, data.len())?;

  for (client, texel) in spans {
    level.data[texel..texel + row].copy_from_slice(&data[client..client + row]);
  }

  Ok(())
}

fn read_region(
  level: &Level,
  offset: [u32; 3],
  size: [u32; 3],
  properties: DataProperties,
  data: &mut [u8],
) -> Result<(), String> {
  let (spans, row) = row_spans(level, offset, size, properties, data.len())?;

  for (client, texel) in spans {
    data[client..client + row].copy_from_slice(&level.data[texel..texel + row]);
  }

  Ok(())
}

fn check_transfer_format(level: &Level, format: PixelFormat, ty: PixelType) -> Result<(), String> {
  if level.format.is_compressed() || pixel_size(format, ty) != level.format.pixel_size() {
    Err(format!(
      "{:?} / {:?} is incompatible with {:?}",
      format, ty, level.format
    ))
  } else {
    Ok(())
  }
}

fn compressed_format(level: &Level) -> Result<CompressedPixelFormat, String> {
  match level.format {
    TextureFormat::Compressed(format) => Ok(format),
    format => Err(format!("{:?} isn’t compressed", format)),
  }
}

/// Number of whole-word occurrences of an identifier.
fn occurrences(source: &str, word: &str) -> usize {
  source
    .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
    .filter(|w| *w == word)
    .count()
}

/// Names of the uniforms and uniform blocks declared by a source.
fn declarations(source: &str) -> (Vec<String>, Vec<String>) {
  let mut uniforms = Vec::new();
  let mut blocks = Vec::new();

  for line in source.lines() {
    let mut line = line.trim();

    if let Some(rest) = line.strip_prefix("layout") {
      if let Some(end) = rest.find(')') {
        line = rest[end + 1..].trim_start();
      }
    }

    let Some(declaration) = line.strip_prefix("uniform ") else {
      continue;
    };

    if let Some(brace) = declaration.find('{') {
      if let Some(name) = declaration[..brace].split_whitespace().last() {
        blocks.push(name.to_owned());
      }
    } else if let Some(name) = declaration
      .split(';')
      .next()
      .and_then(|d| d.split_whitespace().last())
    {
      let name = name.split('[').next().unwrap_or(name);
      uniforms.push(name.to_owned());
    }
  }

  (uniforms, blocks)
}

/// Check a shader source, returning its warnings or its first error.
fn check_source(source: &str) -> Result<String, String> {
  let mut warnings = String::new();
  let mut open = Vec::new();
  let mut string = 0;
  let mut line = 1;

  for text in source.lines() {
    let directive = text.trim_start();

    if let Some(rest) = directive.strip_prefix("#line") {
      let mut numbers = rest.split_whitespace().map(str::parse::<u32>);

      if let Some(Ok(n)) = numbers.next() {
        if let Some(Ok(s)) = numbers.next() {
          string = s;
        }

        line = n;
        continue;
      }
    }

    if let Some(message) = directive.strip_prefix("#error") {
      return Err(format!("{}:{}: error: {}\n", string, line, message.trim()));
    }

    if let Some(message) = directive.strip_prefix("#warning") {
      warnings.push_str(&format!("{}:{}: warning: {}\n", string, line, message.trim()));
    }

    for c in text.chars() {
      match c {
        '(' | '[' | '{' => open.push((c, string, line)),
        ')' | ']' | '}' => {
          let expected = match open.pop() {
            Some(('(', _, _)) => ')',
            Some(('[', _, _)) => ']',
            Some(_) => '}',
            None => {
              return Err(format!("{}:{}: error: unexpected '{}'\n", string, line, c));
            }
          };

          if c != expected {
            return Err(format!(
              "{}:{}: error: expected '{}' but got '{}'\n",
              string, line, expected, c
            ));
          }
        }
        _ => (),
      }
    }

    line += 1;
  }

  match open.pop() {
    Some((c, string, line)) => Err(format!("{}:{}: error: unterminated '{}'\n", string, line, c)),
    None => Ok(warnings),
  }
}

unsafe impl Backend for Headless {
  unsafe fn context_info(&mut self) -> ContextInfo {
    self.record("context_info");

    let version_string = match self.config.api {
      Api::WebGL => format!("WebGL 2.0 ({} headless)", self.config.version),
      _ => format!("{} headless", self.config.version),
    };

    ContextInfo {
      api: self.config.api,
      version: self.config.version,
      version_string,
      vendor: "glint".to_owned(),
      renderer: "headless".to_owned(),
      extensions: self.config.extensions.clone(),
      max_texture_units: self.config.max_texture_units,
      max_image_units: self.config.max_image_units,
    }
  }

  unsafe fn object_label(&mut self, kind: ObjectKind, id: u32, label: &str) {
    self.record("object_label");
    self.labels.insert((kind, id), label.to_owned());
  }

  unsafe fn get_object_label(&mut self, kind: ObjectKind, id: u32) -> String {
    self.record("get_object_label");
    self.labels.get(&(kind, id)).cloned().unwrap_or_default()
  }
}

unsafe impl BufferBackend for Headless {
  unsafe fn gen_buffer(&mut self) -> u32 {
    self.record("gen_buffer");

    let id = self.gen_id();
    self.buffers.insert(id, Vec::new());
    id
  }

  unsafe fn delete_buffer(&mut self, id: u32) {
    self.record("delete_buffer");

    self.buffers.remove(&id);

    for bound in [&mut self.pixel_pack_buffer, &mut self.pixel_unpack_buffer] {
      if *bound == id {
        *bound = 0;
      }
    }
  }

  unsafe fn bind_buffer(&mut self, target: BufferTarget, id: u32) {
    self.record("bind_buffer");

    if id != 0 && !self.buffers.contains_key(&id) {
      self.error("bind_buffer", format!("buffer {} doesn’t exist", id));
      return;
    }

    match target {
      BufferTarget::PixelPack => self.pixel_pack_buffer = id,
      BufferTarget::PixelUnpack => self.pixel_unpack_buffer = id,
    }
  }

  unsafe fn buffer_data(
    &mut self,
    target: BufferTarget,
    len: usize,
    data: Option<&[u8]>,
    _: BufferUsage,
  ) {
    self.record("buffer_data");

    let id = self.bound_buffer(target);
    let contents = match data {
      Some(data) if data.len() != len => {
        let message = format!("{} bytes given for a {} bytes buffer", data.len(), len);
        self.error("buffer_data", message);
        return;
      }
      Some(data) => data.to_vec(),
      None => vec![0; len],
    };

    match self.buffers.get_mut(&id) {
      Some(buffer) => *buffer = contents,
      None => self.error("buffer_data", format!("no buffer bound to {:?}", target)),
    }
  }

  unsafe fn get_buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &mut [u8]) {
    self.record("get_buffer_sub_data");

    let id = self.bound_buffer(target);
    let result = match self.buffers.get(&id) {
      Some(buffer) => buffer
        .get(offset..offset + data.len())
        .map(|range| data.copy_from_slice(range))
        .ok_or_else(|| format!("range is out of the {} bytes of buffer {}", buffer.len(), id)),
      None => Err(format!("no buffer bound to {:?}", target)),
    };

    if let Err(e) = result {
      self.error("get_buffer_sub_data", e);
    }
  }
}

unsafe impl TextureBackend for Headless {
  unsafe fn gen_texture(&mut self) -> u32 {
    self.record("gen_texture");

    let id = self.gen_id();
    self.textures.insert(id, TextureObject::new(None));
    id
  }

  unsafe fn create_texture(&mut self, target: TextureTarget) -> u32 {
    self.record("create_texture");

    let id = self.gen_id();
    self.textures.insert(id, TextureObject::new(Some(target)));
    id
  }

  unsafe fn delete_texture(&mut self, id: u32) {
    self.record("delete_texture");

    if self.textures.remove(&id).is_none() {
      self.error("delete_texture", format!("texture {} doesn’t exist", id));
      return;
    }

    for targets in &mut self.units {
      targets.retain(|_, bound| *bound != id);
    }

    for binding in &mut self.image_units {
      if binding.texture == id {
        *binding = ImageBinding::NONE;
      }
    }
  }

  unsafe fn active_texture(&mut self, unit: u32) {
    self.record("active_texture");

    if unit >= self.config.max_texture_units {
      self.error("active_texture", format!("unit {} is out of range", unit));
    } else {
      self.active_unit = unit;
    }
  }

  unsafe fn bind_texture(&mut self, target: TextureTarget, id: u32) {
    self.record("bind_texture");

    let unit = self.active_unit as usize;

    if id == 0 {
      self.units[unit].remove(&target);
      return;
    }

    match self.textures.get_mut(&id) {
      Some(texture) => match texture.target {
        Some(t) if t != target => {
          let message = format!("texture {} is a {:?}, not a {:?}", id, t, target);
          self.error("bind_texture", message);
        }

        _ => {
          texture.target = Some(target);
          self.units[unit].insert(target, id);
        }
      },

      None => self.error("bind_texture", format!("texture {} doesn’t exist", id)),
    }
  }

  unsafe fn bind_textures(&mut self, first_unit: u32, ids: &[u32]) {
    self.record("bind_textures");

    for (unit, &id) in (first_unit..).zip(ids) {
      if unit >= self.config.max_texture_units {
        self.error("bind_textures", format!("unit {} is out of range", unit));
        return;
      }

      if id == 0 {
        self.units[unit as usize].clear();
        continue;
      }

      match self.textures.get(&id).and_then(|texture| texture.target) {
        Some(target) => {
          self.units[unit as usize].insert(target, id);
        }
        None => self.error("bind_textures", format!("texture {} has no target", id)),
      }
    }
  }

  unsafe fn bind_image_texture(
    &mut self,
    unit: u32,
    id: u32,
    level: u32,
    layered: bool,
    layer: u32,
    access: ImageAccess,
    format: ImageFormat,
  ) {
    self.record("bind_image_texture");

    if unit >= self.config.max_image_units {
      self.error("bind_image_texture", format!("image unit {} is out of range", unit));
      return;
    }

    if id != 0 && !self.textures.contains_key(&id) {
      self.error("bind_image_texture", format!("texture {} doesn’t exist", id));
      return;
    }

    self.image_units[unit as usize] = if id == 0 {
      ImageBinding::NONE
    } else {
      ImageBinding {
        texture: id,
        level,
        layered,
        layer,
        access,
        format,
      }
    };
  }

  unsafe fn bind_image_textures(&mut self, first_unit: u32, ids: &[u32]) {
    self.record("bind_image_textures");

    for (unit, &id) in (first_unit..).zip(ids) {
      if unit >= self.config.max_image_units {
        self.error("bind_image_textures", format!("image unit {} is out of range", unit));
        return;
      }

      let binding = if id == 0 {
        ImageBinding::NONE
      } else {
        let format = self
          .texture_format(id)
          .and_then(|format| ImageFormat::try_from(format).ok());

        match format {
          Some(format) => ImageBinding {
            texture: id,
            level: 0,
            layered: true,
            layer: 0,
            access: ImageAccess::ReadWrite,
            format,
          },

          None => {
            let message = format!("texture {} has no format usable for image load / store", id);
            self.error("bind_image_textures", message);
            continue;
          }
        }
      };

      self.image_units[unit as usize] = binding;
    }
  }

  unsafe fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter) {
    self.record("tex_parameter");

    if let Some(id) = self.bound_object("tex_parameter", target) {
      if let Some(texture) = self.textures.get_mut(&id) {
        texture.parameters.push(parameter);
      }
    }
  }

  unsafe fn tex_storage(
    &mut self,
    target: TextureTarget,
    levels: u32,
    format: TextureFormat,
    size: [u32; 3],
  ) {
    self.record("tex_storage");

    let Some(id) = self.bound_object("tex_storage", target) else {
      return;
    };

    if mip_dimensions(target) == 0 {
      self.error("tex_storage", format!("{:?} needs multisample storage", target));
      return;
    }

    if levels == 0 {
      self.error("tex_storage", "at least one level is required");
      return;
    }

    let faces = if target == TextureTarget::CubeMap { 6 } else { 1 };
    let mut storage = Storage::default();

    for level in 0..levels {
      let level_size = level_size(size, level, mip_dimensions(target));

      for face in 0..faces {
        storage
          .levels
          .insert((face, level), Level::new(level_size, format));
      }
    }

    match self.textures.get_mut(&id) {
      Some(texture) if !texture.immutable => {
        texture.storage = Rc::new(RefCell::new(storage));
        texture.immutable = true;
      }
      _ => self.error("tex_storage", format!("texture {} is immutable", id)),
    }
  }

  unsafe fn tex_storage_multisample(
    &mut self,
    target: TextureTarget,
    samples: u32,
    format: TextureFormat,
    size: [u32; 3],
    _fixed_sample_locations: bool,
  ) {
    self.record("tex_storage_multisample");

    let Some(id) = self.bound_object("tex_storage_multisample", target) else {
      return;
    };

    if mip_dimensions(target) != 0 || format.is_compressed() || samples == 0 {
      let message = format!("invalid multisample storage: {:?}, {:?}", target, format);
      self.error("tex_storage_multisample", message);
      return;
    }

    let mut storage = Storage::default();
    storage.levels.insert((0, 0), Level::new(size, format));

    match self.textures.get_mut(&id) {
      Some(texture) if !texture.immutable => {
        texture.storage = Rc::new(RefCell::new(storage));
        texture.immutable = true;
        texture.samples = samples;
      }
      _ => self.error("tex_storage_multisample", format!("texture {} is immutable", id)),
    }
  }

  unsafe fn tex_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    internal_format: TextureFormat,
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    data: Option<&[u8]>,
  ) {
    self.record("tex_image");

    if self.check_client_transfer("tex_image", BufferTarget::PixelUnpack) {
      self.allocate_level("tex_image", target, level, internal_format, size, format, ty, data);
    }
  }

  unsafe fn tex_image_from_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    internal_format: TextureFormat,
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    buffer_offset: usize,
  ) {
    const METHOD: &str = "tex_image_from_buffer";
    self.record(METHOD);

    let data = self.pixel_buffer_contents(METHOD, BufferTarget::PixelUnpack, buffer_offset);
    if let Some(data) = data {
      self.allocate_level(METHOD, target, level, internal_format, size, format, ty, Some(&data));
    }
  }

  unsafe fn tex_sub_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    data: &[u8],
  ) {
    self.record("tex_sub_image");

    if self.check_client_transfer("tex_sub_image", BufferTarget::PixelUnpack) {
      self.update_level("tex_sub_image", target, level, offset, size, format, ty, data);
    }
  }

  unsafe fn tex_sub_image_from_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: PixelFormat,
    ty: PixelType,
    buffer_offset: usize,
  ) {
    const METHOD: &str = "tex_sub_image_from_buffer";
    self.record(METHOD);

    let data = self.pixel_buffer_contents(METHOD, BufferTarget::PixelUnpack, buffer_offset);
    if let Some(data) = data {
      self.update_level(METHOD, target, level, offset, size, format, ty, &data);
    }
  }

  unsafe fn compressed_tex_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    format: CompressedPixelFormat,
    size: [u32; 3],
    data: &[u8],
  ) {
    self.record("compressed_tex_image");

    if self.check_client_transfer("compressed_tex_image", BufferTarget::PixelUnpack) {
      self.allocate_compressed_level("compressed_tex_image", target, level, format, size, data);
    }
  }

  unsafe fn compressed_tex_image_from_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    format: CompressedPixelFormat,
    size: [u32; 3],
    data_size: usize,
    buffer_offset: usize,
  ) {
    const METHOD: &str = "compressed_tex_image_from_buffer";
    self.record(METHOD);

    if let Some(data) = self.pixel_buffer_range(METHOD, buffer_offset, data_size) {
      self.allocate_compressed_level(METHOD, target, level, format, size, &data);
    }
  }

  unsafe fn compressed_tex_sub_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: CompressedPixelFormat,
    data: &[u8],
  ) {
    self.record("compressed_tex_sub_image");

    if self.check_client_transfer("compressed_tex_sub_image", BufferTarget::PixelUnpack) {
      self.update_compressed_level(
        "compressed_tex_sub_image",
        target,
        level,
        offset,
        size,
        format,
        data,
      );
    }
  }

  unsafe fn compressed_tex_sub_image_from_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    offset: [u32; 3],
    size: [u32; 3],
    format: CompressedPixelFormat,
    data_size: usize,
    buffer_offset: usize,
  ) {
    const METHOD: &str = "compressed_tex_sub_image_from_buffer";
    self.record(METHOD);

    if let Some(data) = self.pixel_buffer_range(METHOD, buffer_offset, data_size) {
      self.update_compressed_level(METHOD, target, level, offset, size, format, &data);
    }
  }

  unsafe fn get_tex_image(
    &mut self,
    target: ImageTarget,
    level: u32,
    format: PixelFormat,
    ty: PixelType,
    data: &mut [u8],
  ) {
    self.record("get_tex_image");

    if self.check_client_transfer("get_tex_image", BufferTarget::PixelPack) {
      self.read_level("get_tex_image", target, level, format, ty, data);
    }
  }

  unsafe fn get_tex_image_into_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    format: PixelFormat,
    ty: PixelType,
    buffer_offset: usize,
  ) {
    const METHOD: &str = "get_tex_image_into_buffer";
    self.record(METHOD);

    let data = self.pixel_buffer_contents(METHOD, BufferTarget::PixelPack, buffer_offset);
    let Some(mut data) = data else {
      return;
    };

    if self.read_level(METHOD, target, level, format, ty, &mut data) {
      self.write_pixel_buffer(BufferTarget::PixelPack, buffer_offset, &data);
    }
  }

  unsafe fn get_compressed_tex_image(&mut self, target: ImageTarget, level: u32, data: &mut [u8]) {
    self.record("get_compressed_tex_image");

    if self.check_client_transfer("get_compressed_tex_image", BufferTarget::PixelPack) {
      self.read_compressed_level("get_compressed_tex_image", target, level, data);
    }
  }

  unsafe fn get_compressed_tex_image_into_buffer(
    &mut self,
    target: ImageTarget,
    level: u32,
    buffer_offset: usize,
  ) {
    const METHOD: &str = "get_compressed_tex_image_into_buffer";
    self.record(METHOD);

    let data = self.pixel_buffer_contents(METHOD, BufferTarget::PixelPack, buffer_offset);
    let Some(mut data) = data else {
      return;
    };

    if self.read_compressed_level(METHOD, target, level, &mut data) {
      self.write_pixel_buffer(BufferTarget::PixelPack, buffer_offset, &data);
    }
  }

  unsafe fn get_tex_level_parameter(
    &mut self,
    target: ImageTarget,
    level: u32,
    parameter: LevelParameter,
  ) -> i32 {
    self.record("get_tex_level_parameter");

    let Some(location) = self.locate("get_tex_level_parameter", target, level) else {
      return 0;
    };

    let storage = location.storage.borrow();
    let Some(image) = location.key.and_then(|key| storage.levels.get(&key)) else {
      return 0;
    };

    let size = location.size(image);

    match parameter {
      LevelParameter::Width => size[0] as i32,
      LevelParameter::Height => size[1] as i32,
      LevelParameter::Depth => size[2] as i32,
      LevelParameter::CompressedImageSize if image.format.is_compressed() => {
        let (units, unit_size) = unit_layout(image.format, size);
        (units.iter().map(|&d| d as usize).product::<usize>() * unit_size) as i32
      }
      LevelParameter::CompressedImageSize => 0,
    }
  }

  unsafe fn get_tex_level_format(
    &mut self,
    target: ImageTarget,
    level: u32,
  ) -> Option<TextureFormat> {
    self.record("get_tex_level_format");

    let location = self.locate("get_tex_level_format", target, level)?;
    let storage = location.storage.borrow();
    let image = location.key.and_then(|key| storage.levels.get(&key))?;

    Some(location.view_format.unwrap_or(image.format))
  }

  unsafe fn generate_mipmap(&mut self, target: TextureTarget) {
    self.record("generate_mipmap");

    let Some(id) = self.bound_object("generate_mipmap", target) else {
      return;
    };

    let Some(texture) = self.textures.get(&id) else {
      return;
    };

    if texture.immutable {
      return;
    }

    let dimensions = mip_dimensions(target);
    let faces = if target == TextureTarget::CubeMap { 6 } else { 1 };
    let mut storage = texture.storage.borrow_mut();
    let mut error = None;

    for face in 0..faces {
      let Some(base) = storage.levels.get(&(face, 0)).map(|l| (l.size, l.format)) else {
        error = Some(format!("face {} has no base level", face));
        break;
      };

      if base.1.is_compressed() {
        error = Some("can’t generate mipmaps of compressed levels".to_owned());
        break;
      }

      let largest = base.0.iter().take(dimensions).copied().max().unwrap_or(1).max(1);
      let levels = u32::BITS - largest.leading_zeros();

      for level in 1..levels {
        storage
          .levels
          .entry((face, level))
          .or_insert_with(|| Level::new(level_size(base.0, level, dimensions), base.1));
      }
    }

    drop(storage);

    if let Some(e) = error {
      self.error("generate_mipmap", e);
    }
  }

  unsafe fn invalidate_tex_image(&mut self, id: u32, _level: u32) {
    self.record("invalidate_tex_image");

    if !self.textures.contains_key(&id) {
      self.error("invalidate_tex_image", format!("texture {} doesn’t exist", id));
    }
  }

  unsafe fn invalidate_tex_sub_image(
    &mut self,
    id: u32,
    _level: u32,
    _offset: [u32; 3],
    _size: [u32; 3],
  ) {
    self.record("invalidate_tex_sub_image");

    if !self.textures.contains_key(&id) {
      self.error("invalidate_tex_sub_image", format!("texture {} doesn’t exist", id));
    }
  }

  unsafe fn texture_view(
    &mut self,
    id: u32,
    target: TextureTarget,
    source: u32,
    format: TextureFormat,
    min_level: u32,
    levels: u32,
    min_layer: u32,
    layers: u32,
  ) {
    self.record("texture_view");

    match self.textures.get(&id) {
      Some(texture) if texture.target.is_none() => (),
      _ => {
        let message = format!("texture {} isn’t a fresh name", id);
        self.error("texture_view", message);
        return;
      }
    }

    let (storage, range) = match self.textures.get(&source) {
      Some(texture) if texture.immutable => {
        let range = match texture.view {
          Some(view) => ViewRange {
            format,
            min_level: view.min_level + min_level,
            levels,
            min_layer: view.min_layer + min_layer,
            layers,
          },
          None => ViewRange {
            format,
            min_level,
            levels,
            min_layer,
            layers,
          },
        };

        (texture.storage.clone(), range)
      }

      _ => {
        let message = format!("texture {} has no immutable storage", source);
        self.error("texture_view", message);
        return;
      }
    };

    if let Some(source_format) = self.texture_format(source) {
      let compatible = match (source_format, format) {
        (TextureFormat::Compressed(a), TextureFormat::Compressed(b)) => {
          a.block_data_size() == b.block_data_size()
        }
        (a, b) => !a.is_compressed() && !b.is_compressed() && a.pixel_size() == b.pixel_size(),
      };

      if !compatible {
        let message = format!("{:?} isn’t compatible with {:?}", format, source_format);
        self.error("texture_view", message);
        return;
      }
    }

    if let Some(texture) = self.textures.get_mut(&id) {
      texture.target = Some(target);
      texture.storage = storage;
      texture.immutable = true;
      texture.view = Some(range);
    }
  }

  unsafe fn set_pixel_storage(&mut self, direction: StorageDirection, storage: &PixelStorage) {
    self.record("set_pixel_storage");

    let (uncompressed, compressed) = match direction {
      StorageDirection::Pack => (&mut self.pack, &mut self.compressed_pack),
      StorageDirection::Unpack => (&mut self.unpack, &mut self.compressed_unpack),
    };

    *uncompressed = *storage;

    // one set of registers backs both kinds of transfers
    compressed.row_length = storage.row_length;
    compressed.image_height = storage.image_height;
    compressed.skip = storage.skip;
  }

  unsafe fn set_compressed_pixel_storage(
    &mut self,
    direction: StorageDirection,
    storage: &CompressedPixelStorage,
  ) {
    self.record("set_compressed_pixel_storage");

    let (uncompressed, compressed) = match direction {
      StorageDirection::Pack => (&mut self.pack, &mut self.compressed_pack),
      StorageDirection::Unpack => (&mut self.unpack, &mut self.compressed_unpack),
    };

    *compressed = *storage;
    *uncompressed = PixelStorage {
      alignment: 1,
      row_length: storage.row_length,
      image_height: storage.image_height,
      skip: storage.skip,
    };
  }
}

unsafe impl ShaderBackend for Headless {
  unsafe fn create_shader(&mut self, ty: StageType) -> u32 {
    self.record("create_shader");

    let id = self.gen_id();
    self.shaders.insert(
      id,
      ShaderObject {
        ty,
        source: String::new(),
        status: None,
        log: String::new(),
        pending_polls: 0,
      },
    );
    id
  }

  unsafe fn delete_shader(&mut self, id: u32) {
    self.record("delete_shader");

    if self.shaders.remove(&id).is_none() {
      self.error("delete_shader", format!("shader {} doesn’t exist", id));
    }
  }

  unsafe fn shader_source(&mut self, id: u32, sources: &[&str]) {
    self.record("shader_source");

    match self.shaders.get_mut(&id) {
      Some(shader) => shader.source = sources.concat(),
      None => self.error("shader_source", format!("shader {} doesn’t exist", id)),
    }
  }

  unsafe fn compile_shader(&mut self, id: u32) {
    self.record("compile_shader");

    let latency = self.config.compile_latency;
    let result = self.shaders.get(&id).map(|shader| self.shader_result(&shader.source));

    match (self.shaders.get_mut(&id), result) {
      (Some(shader), Some((status, log))) => {
        shader.status = Some(status);
        shader.log = log;
        shader.pending_polls = latency;
      }
      _ => self.error("compile_shader", format!("shader {} doesn’t exist", id)),
    }
  }

  unsafe fn get_shader_parameter(&mut self, id: u32, parameter: ShaderParameter) -> i32 {
    self.record("get_shader_parameter");

    let Some(shader) = self.shaders.get_mut(&id) else {
      self.error("get_shader_parameter", format!("shader {} doesn’t exist", id));
      return 0;
    };

    match parameter {
      ShaderParameter::CompileStatus => {
        shader.pending_polls = 0;
        (shader.status == Some(true)) as i32
      }

      ShaderParameter::InfoLogLength if shader.log.is_empty() => 0,
      ShaderParameter::InfoLogLength => shader.log.len() as i32 + 1,

      ShaderParameter::CompletionStatus if shader.pending_polls > 0 => {
        shader.pending_polls -= 1;
        0
      }
      ShaderParameter::CompletionStatus => 1,
    }
  }

  unsafe fn get_shader_info_log(&mut self, id: u32) -> Vec<u8> {
    self.record("get_shader_info_log");

    match self.shaders.get(&id) {
      Some(shader) => self.info_log(&shader.log),
      None => {
        self.error("get_shader_info_log", format!("shader {} doesn’t exist", id));
        Vec::new()
      }
    }
  }
}

unsafe impl ProgramBackend for Headless {
  unsafe fn create_program(&mut self) -> u32 {
    self.record("create_program");

    let id = self.gen_id();
    self.programs.insert(id, ProgramObject::default());
    id
  }

  unsafe fn delete_program(&mut self, id: u32) {
    self.record("delete_program");

    if self.programs.remove(&id).is_none() {
      self.error("delete_program", format!("program {} doesn’t exist", id));
      return;
    }

    if self.current_program == id {
      self.current_program = 0;
    }

    self.uniform_values.retain(|&(program, _), _| program != id);
  }

  unsafe fn attach_shader(&mut self, program: u32, shader: u32) {
    self.record("attach_shader");

    if !self.shaders.contains_key(&shader) {
      self.error("attach_shader", format!("shader {} doesn’t exist", shader));
      return;
    }

    match self.programs.get_mut(&program) {
      Some(p) if p.attached.contains(&shader) => {
        self.error("attach_shader", format!("shader {} is already attached", shader));
      }
      Some(p) => p.attached.push(shader),
      None => self.error("attach_shader", format!("program {} doesn’t exist", program)),
    }
  }

  unsafe fn bind_attrib_location(&mut self, program: u32, index: u32, name: &str) {
    self.record("bind_attrib_location");

    match self.programs.get_mut(&program) {
      Some(p) => {
        p.attribute_locations.insert(name.to_owned(), index);
      }
      None => self.error("bind_attrib_location", format!("program {} doesn’t exist", program)),
    }
  }

  unsafe fn bind_frag_data_location(&mut self, program: u32, color: u32, name: &str) {
    self.record("bind_frag_data_location");

    match self.programs.get_mut(&program) {
      Some(p) => {
        p.fragment_locations.insert(name.to_owned(), (color, 0));
      }
      None => {
        let message = format!("program {} doesn’t exist", program);
        self.error("bind_frag_data_location", message);
      }
    }
  }

  unsafe fn bind_frag_data_location_indexed(
    &mut self,
    program: u32,
    color: u32,
    index: u32,
    name: &str,
  ) {
    self.record("bind_frag_data_location_indexed");

    match self.programs.get_mut(&program) {
      Some(p) => {
        p.fragment_locations.insert(name.to_owned(), (color, index));
      }
      None => {
        let message = format!("program {} doesn’t exist", program);
        self.error("bind_frag_data_location_indexed", message);
      }
    }
  }

  unsafe fn transform_feedback_varyings(
    &mut self,
    program: u32,
    names: &[&str],
    mode: TransformFeedbackBufferMode,
  ) {
    self.record("transform_feedback_varyings");

    match self.programs.get_mut(&program) {
      Some(p) => {
        p.varyings = names.iter().map(|&name| name.to_owned()).collect();
        p.varying_mode = Some(mode);
      }
      None => {
        let message = format!("program {} doesn’t exist", program);
        self.error("transform_feedback_varyings", message);
      }
    }
  }

  unsafe fn link_program(&mut self, program: u32) {
    self.record("link_program");

    let Some(result) = self.programs.get(&program).map(|p| self.link(p)) else {
      self.error("link_program", format!("program {} doesn’t exist", program));
      return;
    };

    let latency = self.config.compile_latency;

    if let Some(p) = self.programs.get_mut(&program) {
      p.pending_polls = latency;
      p.validated = false;

      match result {
        Ok((uniforms, blocks, compute)) => {
          p.status = Some(true);
          p.log = String::new();
          p.uniforms = uniforms;
          p.blocks = blocks;
          p.compute = compute;
        }

        Err(log) => {
          p.status = Some(false);
          p.log = log;
          p.uniforms.clear();
          p.blocks.clear();
          p.compute = false;
        }
      }
    }

    self.uniform_values.retain(|&(id, _), _| id != program);
  }

  unsafe fn validate_program(&mut self, program: u32) {
    self.record("validate_program");

    match self.programs.get_mut(&program) {
      Some(p) if p.status == Some(true) => {
        p.validated = true;
        p.log = String::new();
      }
      Some(p) => {
        p.validated = false;
        p.log = "error: the program isn’t linked\n".to_owned();
      }
      None => self.error("validate_program", format!("program {} doesn’t exist", program)),
    }
  }

  unsafe fn get_program_parameter(&mut self, program: u32, parameter: ProgramParameter) -> i32 {
    self.record("get_program_parameter");

    let Some(p) = self.programs.get_mut(&program) else {
      self.error("get_program_parameter", format!("program {} doesn’t exist", program));
      return 0;
    };

    match parameter {
      ProgramParameter::LinkStatus => {
        p.pending_polls = 0;
        (p.status == Some(true)) as i32
      }

      ProgramParameter::ValidateStatus => p.validated as i32,

      ProgramParameter::InfoLogLength if p.log.is_empty() => 0,
      ProgramParameter::InfoLogLength => p.log.len() as i32 + 1,

      ProgramParameter::CompletionStatus if p.pending_polls > 0 => {
        p.pending_polls -= 1;
        0
      }
      ProgramParameter::CompletionStatus => 1,
    }
  }

  unsafe fn get_program_info_log(&mut self, program: u32) -> Vec<u8> {
    self.record("get_program_info_log");

    match self.programs.get(&program) {
      Some(p) => self.info_log(&p.log),
      None => {
        self.error("get_program_info_log", format!("program {} doesn’t exist", program));
        Vec::new()
      }
    }
  }

  unsafe fn use_program(&mut self, program: u32) {
    self.record("use_program");

    if program == 0 {
      self.current_program = 0;
      return;
    }

    match self.programs.get(&program) {
      Some(p) if p.status == Some(true) => self.current_program = program,
      Some(_) => self.error("use_program", format!("program {} isn’t linked", program)),
      None => self.error("use_program", format!("program {} doesn’t exist", program)),
    }
  }

  unsafe fn get_uniform_location(&mut self, program: u32, name: &str) -> i32 {
    self.record("get_uniform_location");

    let name = name.strip_suffix("[0]").unwrap_or(name);

    match self.programs.get(&program) {
      Some(p) if p.status == Some(true) => p
        .uniforms
        .iter()
        .position(|uniform| uniform == name)
        .map_or(-1, |location| location as i32),

      _ => {
        let message = format!("program {} isn’t linked", program);
        self.error("get_uniform_location", message);
        -1
      }
    }
  }

  unsafe fn get_uniform_block_index(&mut self, program: u32, name: &str) -> u32 {
    self.record("get_uniform_block_index");

    match self.programs.get(&program) {
      Some(p) if p.status == Some(true) => p
        .blocks
        .iter()
        .position(|block| block == name)
        .map_or(INVALID_INDEX, |index| index as u32),

      _ => {
        let message = format!("program {} isn’t linked", program);
        self.error("get_uniform_block_index", message);
        INVALID_INDEX
      }
    }
  }

  unsafe fn uniform_block_binding(&mut self, program: u32, index: u32, binding: u32) {
    self.record("uniform_block_binding");

    match self.programs.get_mut(&program) {
      Some(p) if (index as usize) < p.blocks.len() => {
        p.block_bindings.insert(index, binding);
      }
      _ => {
        let message = format!("program {} has no uniform block {}", program, index);
        self.error("uniform_block_binding", message);
      }
    }
  }

  unsafe fn set_uniform(&mut self, location: i32, value: UniformValue) {
    self.record("set_uniform");

    let Some(program) = self.current_linked_program("set_uniform") else {
      return;
    };

    if location == -1 {
      return;
    }

    let active = self.programs.get(&program).map_or(0, |p| p.uniforms.len());

    if location < 0 || location as usize >= active {
      self.error("set_uniform", format!("location {} is invalid", location));
      return;
    }

    self.uniform_values.insert((program, location), value.into());
  }
}

unsafe impl MeshBackend for Headless {
  unsafe fn bind_vertex_array(&mut self, id: u32) {
    self.record("bind_vertex_array");
    self.vertex_array = id;
  }

  unsafe fn draw_arrays(
    &mut self,
    primitive: MeshPrimitive,
    first: u32,
    count: u32,
    instances: u32,
    base_instance: u32,
  ) {
    self.record("draw_arrays");

    if let Some(program) = self.current_linked_program("draw_arrays") {
      self.draws.push(DrawCall::Arrays {
        program,
        vertex_array: self.vertex_array,
        primitive,
        first,
        count,
        instances,
        base_instance,
      });
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
    self.record("draw_elements");

    if let Some(program) = self.current_linked_program("draw_elements") {
      self.draws.push(DrawCall::Elements {
        program,
        vertex_array: self.vertex_array,
        primitive,
        count,
        index_type,
        offset,
        base_vertex,
        instances,
        base_instance,
      });
    }
  }

  unsafe fn gen_transform_feedback(&mut self) -> u32 {
    self.record("gen_transform_feedback");

    let id = self.gen_id();
    self.transform_feedbacks.insert(id);
    id
  }

  unsafe fn delete_transform_feedback(&mut self, id: u32) {
    self.record("delete_transform_feedback");

    if !self.transform_feedbacks.remove(&id) {
      let message = format!("transform feedback {} doesn’t exist", id);
      self.error("delete_transform_feedback", message);
    }
  }

  unsafe fn draw_transform_feedback(
    &mut self,
    primitive: MeshPrimitive,
    id: u32,
    stream: u32,
    instances: u32,
  ) {
    self.record("draw_transform_feedback");

    if !self.transform_feedbacks.contains(&id) {
      let message = format!("transform feedback {} doesn’t exist", id);
      self.error("draw_transform_feedback", message);
      return;
    }

    if let Some(program) = self.current_linked_program("draw_transform_feedback") {
      self.draws.push(DrawCall::TransformFeedback {
        program,
        vertex_array: self.vertex_array,
        primitive,
        transform_feedback: id,
        stream,
        instances,
      });
    }
  }

  unsafe fn dispatch_compute(&mut self, groups: [u32; 3]) {
    self.record("dispatch_compute");

    let Some(program) = self.current_linked_program("dispatch_compute") else {
      return;
    };

    if self.programs.get(&program).map_or(false, |p| p.compute) {
      self.draws.push(DrawCall::Compute { program, groups });
    } else {
      let message = format!("program {} has no compute shader", program);
      self.error("dispatch_compute", message);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn texture(backend: &mut Headless, target: TextureTarget) -> u32 {
    unsafe {
      let id = backend.gen_texture();
      backend.bind_texture(target, id);
      id
    }
  }

  #[test]
  fn sub_image_honours_unpack_storage() {
    let mut backend = Headless::new(HeadlessConfig::default());
    let target = ImageTarget::Texture(TextureTarget::Texture2D);
    texture(&mut backend, TextureTarget::Texture2D);

    // 3×2 R8 buffer, of which the last two columns are uploaded
    let data = [1, 2, 3, 4, 5, 6];
    let storage = PixelStorage {
      alignment: 1,
      row_length: 3,
      skip: [1, 0, 0],
      ..PixelStorage::default()
    };

    unsafe {
      backend.tex_image(
        target,
        0,
        TextureFormat::R8,
        [2, 2, 1],
        PixelFormat::Red,
        PixelType::UnsignedByte,
        None,
      );
      backend.set_pixel_storage(StorageDirection::Unpack, &storage);
      backend.tex_sub_image(
        target,
        0,
        [0; 3],
        [2, 2, 1],
        PixelFormat::Red,
        PixelType::UnsignedByte,
        &data,
      );

      let mut out = [0; 4];
      backend.set_pixel_storage(
        StorageDirection::Pack,
        &PixelStorage {
          alignment: 1,
          ..PixelStorage::default()
        },
      );
      backend.get_tex_image(target, 0, PixelFormat::Red, PixelType::UnsignedByte, &mut out);

      assert_eq!(out, [2, 3, 5, 6]);
    }

    assert!(backend.take_errors().is_empty());
  }

  #[test]
  fn incompatible_transfer_format_is_an_error() {
    let mut backend = Headless::new(HeadlessConfig::default());
    let target = ImageTarget::Texture(TextureTarget::Texture2D);
    texture(&mut backend, TextureTarget::Texture2D);

    unsafe {
      backend.tex_image(
        target,
        0,
        TextureFormat::RGBA8,
        [1, 1, 1],
        PixelFormat::RGB,
        PixelType::Float,
        Some(&[0; 12]),
      );
    }

    assert_eq!(backend.take_errors().len(), 1);
  }

  #[test]
  fn generate_mipmap_creates_levels() {
    let mut backend = Headless::new(HeadlessConfig::default());
    let target = ImageTarget::Texture(TextureTarget::Texture2D);
    texture(&mut backend, TextureTarget::Texture2D);

    unsafe {
      backend.tex_image(
        target,
        0,
        TextureFormat::RGBA8,
        [8, 4, 1],
        PixelFormat::RGBA,
        PixelType::UnsignedByte,
        None,
      );
      backend.generate_mipmap(TextureTarget::Texture2D);

      let width =
        |b: &mut Headless, level| b.get_tex_level_parameter(target, level, LevelParameter::Width);
      assert_eq!(width(&mut backend, 1), 4);
      assert_eq!(width(&mut backend, 3), 1);
      assert_eq!(width(&mut backend, 4), 0);
      assert_eq!(
        backend.get_tex_level_parameter(target, 2, LevelParameter::Height),
        1
      );
    }
  }

  #[test]
  fn views_share_storage() {
    let mut backend = Headless::new(HeadlessConfig::default());
    let target = ImageTarget::Texture(TextureTarget::Texture2D);
    let source = texture(&mut backend, TextureTarget::Texture2D);

    unsafe {
      backend.tex_storage(TextureTarget::Texture2D, 3, TextureFormat::R8, [4, 4, 1]);

      let view = backend.gen_texture();
      backend.texture_view(view, TextureTarget::Texture2D, source, TextureFormat::R8, 1, 2, 0, 1);

      // write level 1 of the source, read level 0 of the view
      backend.set_pixel_storage(
        StorageDirection::Unpack,
        &PixelStorage {
          alignment: 1,
          ..PixelStorage::default()
        },
      );
      backend.tex_sub_image(
        target,
        1,
        [0; 3],
        [2, 2, 1],
        PixelFormat::Red,
        PixelType::UnsignedByte,
        &[1, 2, 3, 4],
      );

      backend.bind_texture(TextureTarget::Texture2D, view);
      assert_eq!(backend.get_tex_level_parameter(target, 0, LevelParameter::Width), 2);
      assert_eq!(backend.get_tex_level_parameter(target, 2, LevelParameter::Width), 0);

      let mut out = [0; 4];
      backend.set_pixel_storage(
        StorageDirection::Pack,
        &PixelStorage {
          alignment: 1,
          ..PixelStorage::default()
        },
      );
      backend.get_tex_image(target, 0, PixelFormat::Red, PixelType::UnsignedByte, &mut out);
      assert_eq!(out, [1, 2, 3, 4]);

      // immutable storage can’t be respecified
      backend.tex_image(
        target,
        0,
        TextureFormat::R8,
        [1, 1, 1],
        PixelFormat::Red,
        PixelType::UnsignedByte,
        None,
      );
    }

    assert_eq!(backend.take_errors().len(), 1);
  }

  #[test]
  fn compressed_sizes() {
    let mut backend = Headless::new(HeadlessConfig::default());
    let target = ImageTarget::Texture(TextureTarget::Texture2D);
    texture(&mut backend, TextureTarget::Texture2D);

    unsafe {
      backend.compressed_tex_image(
        target,
        0,
        CompressedPixelFormat::RGBAS3tcDxt5,
        [8, 6, 1],
        &[7; 64],
      );

      assert_eq!(
        backend.get_tex_level_parameter(target, 0, LevelParameter::CompressedImageSize),
        64
      );

      let mut out = [0; 64];
      backend.get_compressed_tex_image(target, 0, &mut out);
      assert_eq!(out, [7; 64]);
    }

    assert!(backend.take_errors().is_empty());
  }

  #[test]
  fn multi_bind_uses_texture_targets() {
    let mut backend = Headless::new(HeadlessConfig::default());

    unsafe {
      let a = backend.create_texture(TextureTarget::Texture2D);
      let b = backend.create_texture(TextureTarget::CubeMap);

      backend.bind_textures(2, &[a, b]);
      assert_eq!(backend.bound_texture(2, TextureTarget::Texture2D), a);
      assert_eq!(backend.bound_texture(3, TextureTarget::CubeMap), b);

      backend.bind_textures(3, &[0]);
      assert_eq!(backend.bound_texture(3, TextureTarget::CubeMap), 0);
    }
  }

  #[test]
  fn compilation_completes_after_polls() {
    let mut backend = Headless::new(HeadlessConfig::default());

    unsafe {
      let shader = backend.create_shader(StageType::VertexShader);
      backend.shader_source(shader, &["void main() {}\n"]);
      backend.compile_shader(shader);

      assert_eq!(backend.get_shader_parameter(shader, ShaderParameter::CompletionStatus), 0);
      assert_eq!(backend.get_shader_parameter(shader, ShaderParameter::CompletionStatus), 0);
      assert_eq!(backend.get_shader_parameter(shader, ShaderParameter::CompletionStatus), 1);
      assert_eq!(backend.get_shader_parameter(shader, ShaderParameter::CompileStatus), 1);
    }
  }

  #[test]
  fn compile_errors_and_warnings() {
    assert_eq!(check_source("void main() {}\n"), Ok(String::new()));
    assert_eq!(
      check_source("#line 1 2\nvoid main() {\n"),
      Err("2:1: error: unterminated '{'\n".to_owned())
    );
    assert_eq!(
      check_source("void main() {\n#error nope\n}\n"),
      Err("0:2: error: nope\n".to_owned())
    );
    assert_eq!(
      check_source("#warning careful\nvoid main() {}\n"),
      Ok("0:1: warning: careful\n".to_owned())
    );
  }

  #[test]
  fn info_log_has_garbage_after_nul() {
    let mut backend = Headless::new(HeadlessConfig::default());

    unsafe {
      let shader = backend.create_shader(StageType::FragmentShader);
      backend.shader_source(shader, &["void main() {\n"]);
      backend.compile_shader(shader);

      let length = backend.get_shader_parameter(shader, ShaderParameter::InfoLogLength) as usize;
      let log = backend.get_shader_info_log(shader);

      assert_eq!(log[length - 1], 0);
      assert!(log.len() > length);
    }
  }

  #[test]
  fn unused_uniforms_are_inactive() {
    let source = "uniform float used;\nuniform vec2 unused;\nlayout(std140) uniform Lights {\n  vec4 color;\n};\nvoid main() { gl_Position = vec4(used); }\n";

    assert_eq!(
      declarations(source),
      (
        vec!["used".to_owned(), "unused".to_owned()],
        vec!["Lights".to_owned()]
      )
    );

    let mut backend = Headless::new(HeadlessConfig::default());

    unsafe {
      let shader = backend.create_shader(StageType::VertexShader);
      backend.shader_source(shader, &[source]);
      backend.compile_shader(shader);

      let program = backend.create_program();
      backend.attach_shader(program, shader);
      backend.link_program(program);

      assert_eq!(backend.get_program_parameter(program, ProgramParameter::LinkStatus), 1);
      assert_eq!(backend.get_uniform_location(program, "used"), 0);
      assert_eq!(backend.get_uniform_location(program, "unused"), -1);
      assert_eq!(backend.get_uniform_block_index(program, "Lights"), 0);
      assert_eq!(backend.get_uniform_block_index(program, "Shadows"), INVALID_INDEX);
    }
  }

  #[test]
  fn link_requires_main() {
    let mut backend = Headless::new(HeadlessConfig::default());

    unsafe {
      let shader = backend.create_shader(StageType::FragmentShader);
      backend.shader_source(shader, &["out vec4 color;\n"]);
      backend.compile_shader(shader);

      let program = backend.create_program();
      backend.attach_shader(program, shader);
      backend.link_program(program);

      assert_eq!(backend.get_program_parameter(program, ProgramParameter::LinkStatus), 0);

      let log = backend.get_program_info_log(program);
      assert!(log.starts_with(b"error: fragment shader has no main function\n\0"));
    }
  }
}
