//! Graphics context.
//!
//! A [`Context`] is the entry point of glint: it takes ownership of a [`Backend`] (an OpenGL
//! driver, or the headless one), queries its [`Capabilities`] once and shares a [`GLState`] cache
//! with every object created from it.
//!
//! # On context and threads
//!
//! A context and the objects created from it are `!Send` and `!Sync`: OpenGL contexts are bound to
//! the thread they were made current on and so is everything here. You can have several contexts,
//! each one tracking its own state; objects must only ever be used with the context they were
//! created from.
//!
//! # Capabilities and configuration
//!
//! Some operations have several implementations, picked according to the extensions the driver
//! supports (batched binds, direct state access, immutable storage, …). Every implementation
//! leads to the same observable state. Extensions can be disabled with a [`Configuration`], either
//! built explicitly or read from the `GLINT_DISABLE_EXTENSIONS` environment variable, to force
//! the fallback paths.

use std::cell::{Ref, RefCell, RefMut};
use std::env;
use std::error;
use std::fmt;
use std::rc::Rc;

use log::{debug, info};

use crate::backend::{Backend, ContextInfo};
use crate::state::GLState;

/// Environment variable listing extensions to disable.
pub const DISABLE_EXTENSIONS_ENV: &str = "GLINT_DISABLE_EXTENSIONS";

/// Graphics API family.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Api {
  /// Desktop OpenGL.
  OpenGL,
  /// OpenGL ES.
  OpenGLES,
  /// WebGL, which versions map onto OpenGL ES ones.
  WebGL,
}

/// API version.
///
/// The version also selects the GLSL preamble prepended to shader sources.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Version {
  /// No version: sources are passed verbatim.
  None,
  /// OpenGL 2.1.
  GL210,
  /// OpenGL 3.0.
  GL300,
  /// OpenGL 3.1.
  GL310,
  /// OpenGL 3.2.
  GL320,
  /// OpenGL 3.3.
  GL330,
  /// OpenGL 4.0.
  GL400,
  /// OpenGL 4.1.
  GL410,
  /// OpenGL 4.2.
  GL420,
  /// OpenGL 4.3.
  GL430,
  /// OpenGL 4.4.
  GL440,
  /// OpenGL 4.5.
  GL450,
  /// OpenGL 4.6.
  GL460,
  /// OpenGL ES 2.0 (WebGL 1).
  GLES200,
  /// OpenGL ES 3.0 (WebGL 2).
  GLES300,
  /// OpenGL ES 3.1.
  GLES310,
  /// OpenGL ES 3.2.
  GLES320,
}

impl Version {
  /// Major and minor version numbers; `(0, 0)` for [`Version::None`].
  pub fn number(self) -> (u32, u32) {
    match self {
      Version::None => (0, 0),
      Version::GL210 => (2, 1),
      Version::GL300 => (3, 0),
      Version::GL310 => (3, 1),
      Version::GL320 => (3, 2),
      Version::GL330 => (3, 3),
      Version::GL400 => (4, 0),
      Version::GL410 => (4, 1),
      Version::GL420 => (4, 2),
      Version::GL430 => (4, 3),
      Version::GL440 => (4, 4),
      Version::GL450 => (4, 5),
      Version::GL460 => (4, 6),
      Version::GLES200 => (2, 0),
      Version::GLES300 => (3, 0),
      Version::GLES310 => (3, 1),
      Version::GLES320 => (3, 2),
    }
  }

  /// Whether this is an OpenGL ES version.
  pub fn is_es(self) -> bool {
    matches!(
      self,
      Version::GLES200 | Version::GLES300 | Version::GLES310 | Version::GLES320
    )
  }

  /// Whether `self` is at least `other`.
  ///
  /// Versions of different families never compare.
  pub fn is_at_least(self, other: Version) -> bool {
    self != Version::None
      && other != Version::None
      && self.is_es() == other.is_es()
      && self.number() >= other.number()
  }

  /// Find the version matching a major / minor pair.
  pub fn from_number(es: bool, major: u32, minor: u32) -> Option<Self> {
    let version = match (es, major, minor) {
      (false, 2, 1) => Version::GL210,
      (false, 3, 0) => Version::GL300,
      (false, 3, 1) => Version::GL310,
      (false, 3, 2) => Version::GL320,
      (false, 3, 3) => Version::GL330,
      (false, 4, 0) => Version::GL400,
      (false, 4, 1) => Version::GL410,
      (false, 4, 2) => Version::GL420,
      (false, 4, 3) => Version::GL430,
      (false, 4, 4) => Version::GL440,
      (false, 4, 5) => Version::GL450,
      (false, 4, 6) => Version::GL460,
      (true, 2, 0) => Version::GLES200,
      (true, 3, 0) => Version::GLES300,
      (true, 3, 1) => Version::GLES310,
      (true, 3, 2) => Version::GLES320,
      _ => return None,
    };

    Some(version)
  }

  /// GLSL `#version` directive for this version, if any.
  pub fn glsl_preamble(self) -> Option<&'static str> {
    let preamble = match self {
      Version::None => return None,
      Version::GL210 => "#version 120\n",
      Version::GL300 => "#version 130\n",
      Version::GL310 => "#version 140\n",
      Version::GL320 => "#version 150\n",
      Version::GL330 => "#version 330\n",
      Version::GL400 => "#version 400\n",
      Version::GL410 => "#version 410\n",
      Version::GL420 => "#version 420\n",
      Version::GL430 => "#version 430\n",
      Version::GL440 => "#version 440\n",
      Version::GL450 => "#version 450\n",
      Version::GL460 => "#version 460\n",
      Version::GLES200 => "#version 100\n",
      Version::GLES300 => "#version 300 es\n",
      Version::GLES310 => "#version 310 es\n",
      Version::GLES320 => "#version 320 es\n",
    };

    Some(preamble)
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    let (major, minor) = self.number();

    match *self {
      Version::None => f.write_str("none"),
      v if v.is_es() => write!(f, "OpenGL ES {}.{}", major, minor),
      _ => write!(f, "OpenGL {}.{}", major, minor),
    }
  }
}

/// Extensions glint knows about and selects implementations upon.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Extension {
  ArbMultiBind,
  ArbDirectStateAccess,
  ArbTextureStorage,
  ArbTextureStorageMultisample,
  ArbTextureView,
  ArbInvalidateSubdata,
  ArbShaderImageLoadStore,
  ArbComputeShader,
  ArbTextureCubeMapArray,
  ArbGpuShaderFp64,
  KhrDebug,
  KhrParallelShaderCompile,
}

impl Extension {
  /// Every known extension.
  pub const ALL: [Extension; 12] = [
    Extension::ArbMultiBind,
    Extension::ArbDirectStateAccess,
    Extension::ArbTextureStorage,
    Extension::ArbTextureStorageMultisample,
    Extension::ArbTextureView,
    Extension::ArbInvalidateSubdata,
    Extension::ArbShaderImageLoadStore,
    Extension::ArbComputeShader,
    Extension::ArbTextureCubeMapArray,
    Extension::ArbGpuShaderFp64,
    Extension::KhrDebug,
    Extension::KhrParallelShaderCompile,
  ];

  /// Driver name of the extension.
  pub fn name(self) -> &'static str {
    match self {
      Extension::ArbMultiBind => "GL_ARB_multi_bind",
      Extension::ArbDirectStateAccess => "GL_ARB_direct_state_access",
      Extension::ArbTextureStorage => "GL_ARB_texture_storage",
      Extension::ArbTextureStorageMultisample => "GL_ARB_texture_storage_multisample",
      Extension::ArbTextureView => "GL_ARB_texture_view",
      Extension::ArbInvalidateSubdata => "GL_ARB_invalidate_subdata",
      Extension::ArbShaderImageLoadStore => "GL_ARB_shader_image_load_store",
      Extension::ArbComputeShader => "GL_ARB_compute_shader",
      Extension::ArbTextureCubeMapArray => "GL_ARB_texture_cube_map_array",
      Extension::ArbGpuShaderFp64 => "GL_ARB_gpu_shader_fp64",
      Extension::KhrDebug => "GL_KHR_debug",
      Extension::KhrParallelShaderCompile => "GL_KHR_parallel_shader_compile",
    }
  }

  /// Look an extension up by its driver name.
  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL.iter().copied().find(|ext| ext.name() == name)
  }

  /// Version in which the extension became core, per API family.
  fn core_version(self, api: Api) -> Option<Version> {
    match api {
      Api::OpenGL => match self {
        Extension::ArbMultiBind => Some(Version::GL440),
        Extension::ArbDirectStateAccess => Some(Version::GL450),
        Extension::ArbTextureStorage => Some(Version::GL420),
        Extension::ArbTextureStorageMultisample => Some(Version::GL430),
        Extension::ArbTextureView => Some(Version::GL430),
        Extension::ArbInvalidateSubdata => Some(Version::GL430),
        Extension::ArbShaderImageLoadStore => Some(Version::GL420),
        Extension::ArbComputeShader => Some(Version::GL430),
        Extension::ArbTextureCubeMapArray => Some(Version::GL400),
        Extension::ArbGpuShaderFp64 => Some(Version::GL400),
        Extension::KhrDebug => Some(Version::GL430),
        Extension::KhrParallelShaderCompile => None,
      },

      Api::OpenGLES => match self {
        Extension::ArbTextureStorage => Some(Version::GLES300),
        Extension::ArbInvalidateSubdata => Some(Version::GLES300),
        Extension::ArbTextureStorageMultisample => Some(Version::GLES310),
        Extension::ArbShaderImageLoadStore => Some(Version::GLES310),
        Extension::ArbComputeShader => Some(Version::GLES310),
        Extension::ArbTextureCubeMapArray => Some(Version::GLES320),
        Extension::KhrDebug => Some(Version::GLES320),
        _ => None,
      },

      Api::WebGL => match self {
        Extension::ArbTextureStorage => Some(Version::GLES300),
        _ => None,
      },
    }
  }
}

impl fmt::Display for Extension {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    f.write_str(self.name())
  }
}

/// Context configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Configuration {
  disabled_extensions: Vec<Extension>,
}

impl Configuration {
  /// Default configuration: nothing disabled.
  pub fn new() -> Self {
    Self::default()
  }

  /// Read the configuration from the environment.
  ///
  /// Missing variables yield the default configuration.
  pub fn from_env() -> Result<Self, ConfigurationError> {
    match env::var(DISABLE_EXTENSIONS_ENV) {
      Ok(value) => Self::parse_disabled_extensions(&value),
      Err(env::VarError::NotPresent) => Ok(Self::default()),
      Err(env::VarError::NotUnicode(_)) => Err(ConfigurationError::NotUnicode(
        DISABLE_EXTENSIONS_ENV.to_owned(),
      )),
    }
  }

  /// Parse a list of extension names separated by whitespace or commas.
  pub fn parse_disabled_extensions(list: &str) -> Result<Self, ConfigurationError> {
    let disabled_extensions = list
      .split(|c: char| c.is_whitespace() || c == ',')
      .filter(|name| !name.is_empty())
      .map(|name| {
        Extension::from_name(name).ok_or_else(|| ConfigurationError::UnknownExtension(name.to_owned()))
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Configuration {
      disabled_extensions,
    })
  }

  /// Disable an extension.
  pub fn disable_extension(mut self, extension: Extension) -> Self {
    if !self.disabled_extensions.contains(&extension) {
      self.disabled_extensions.push(extension);
    }

    self
  }

  pub fn disabled_extensions(&self) -> &[Extension] {
    &self.disabled_extensions
  }
}

/// Errors that can happen while reading a [`Configuration`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigurationError {
  /// An extension name isn’t known.
  UnknownExtension(String),
  /// An environment variable isn’t valid unicode.
  NotUnicode(String),
}

impl fmt::Display for ConfigurationError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ConfigurationError::UnknownExtension(ref name) => write!(f, "unknown extension {}", name),
      ConfigurationError::NotUnicode(ref var) => write!(f, "{} is not valid unicode", var),
    }
  }
}

impl error::Error for ConfigurationError {}

/// What the driver can do.
#[derive(Clone, Debug)]
pub struct Capabilities {
  api: Api,
  version: Version,
  vendor: String,
  renderer: String,
  extensions: Vec<Extension>,
  disabled_extensions: Vec<Extension>,
  max_texture_units: u32,
  max_image_units: u32,
}

impl Capabilities {
  pub(crate) fn new(info: ContextInfo, configuration: &Configuration) -> Self {
    let extensions = info
      .extensions
      .iter()
      .filter_map(|name| Extension::from_name(name))
      .collect();

    Capabilities {
      api: info.api,
      version: info.version,
      vendor: info.vendor,
      renderer: info.renderer,
      extensions,
      disabled_extensions: configuration.disabled_extensions.clone(),
      max_texture_units: info.max_texture_units,
      max_image_units: info.max_image_units,
    }
  }

  pub fn api(&self) -> Api {
    self.api
  }

  pub fn version(&self) -> Version {
    self.version
  }

  pub fn vendor(&self) -> &str {
    &self.vendor
  }

  pub fn renderer(&self) -> &str {
    &self.renderer
  }

  /// Number of combined texture units.
  pub fn max_texture_units(&self) -> u32 {
    self.max_texture_units
  }

  /// Number of image units; `0` if image load / store is unsupported.
  pub fn max_image_units(&self) -> u32 {
    self.max_image_units
  }

  /// Whether an extension can be used.
  ///
  /// An extension is supported when it’s not disabled and either advertised by the driver or
  /// part of the core of the context version.
  pub fn is_supported(&self, extension: Extension) -> bool {
    if self.disabled_extensions.contains(&extension) {
      return false;
    }

    self.extensions.contains(&extension)
      || extension
        .core_version(self.api)
        .map_or(false, |core| self.version.is_at_least(core))
  }

  /// Whether a version is supported by the context.
  pub fn is_version_supported(&self, version: Version) -> bool {
    version == Version::None || self.version.is_at_least(version)
  }
}

/// Errors that can happen while creating a [`Context`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContextError {
  /// The driver reported a version glint can’t work with.
  UnsupportedVersion(String),
  /// The configuration is invalid.
  Configuration(ConfigurationError),
}

impl fmt::Display for ContextError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ContextError::UnsupportedVersion(ref version) => {
        write!(f, "unsupported context version: {}", version)
      }
      ContextError::Configuration(ref e) => write!(f, "invalid configuration: {}", e),
    }
  }
}

impl error::Error for ContextError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      ContextError::Configuration(e) => Some(e),
      _ => None,
    }
  }
}

impl From<ConfigurationError> for ContextError {
  fn from(e: ConfigurationError) -> Self {
    ContextError::Configuration(e)
  }
}

/// A graphics context.
///
/// Cloning a context is cheap and yields a handle on the same state.
pub struct Context<B> {
  state: Rc<RefCell<GLState<B>>>,
}

impl<B> Clone for Context<B> {
  fn clone(&self) -> Self {
    Context {
      state: self.state.clone(),
    }
  }
}

impl<B> Context<B>
where
  B: Backend,
{
  /// Create a context, configured from the environment.
  ///
  /// The backend’s underlying context must be current on the calling thread.
  pub fn new(backend: B) -> Result<Self, ContextError> {
    Self::with_configuration(backend, Configuration::from_env()?)
  }

  /// Create a context with an explicit configuration.
  pub fn with_configuration(
    mut backend: B,
    configuration: Configuration,
  ) -> Result<Self, ContextError> {
    let info = unsafe { backend.context_info() };

    if info.version == Version::None {
      return Err(ContextError::UnsupportedVersion(info.version_string));
    }

    for extension in configuration.disabled_extensions() {
      debug!("disabling {}", extension);
    }

    let capabilities = Capabilities::new(info, &configuration);

    info!(
      "created context: {} on {} ({})",
      capabilities.version(),
      capabilities.renderer(),
      capabilities.vendor()
    );

    Ok(Context {
      state: Rc::new(RefCell::new(GLState::new(backend, capabilities))),
    })
  }

  /// Capabilities queried at creation.
  pub fn capabilities(&self) -> Ref<'_, Capabilities> {
    Ref::map(self.state.borrow(), |state| state.capabilities())
  }

  /// Shortcut for [`Capabilities::is_supported`].
  pub fn is_supported(&self, extension: Extension) -> bool {
    self.state.borrow().capabilities().is_supported(extension)
  }

  /// Forget every cached binding.
  ///
  /// Call this after running foreign code on the same driver context: glint then re-issues every
  /// binding instead of trusting its cache.
  pub fn reset_state(&self) {
    self.state.borrow_mut().reset();
  }

  /// Access the state cache.
  pub fn state(&self) -> Ref<'_, GLState<B>> {
    self.state.borrow()
  }

  /// Access the backend.
  pub fn backend(&self) -> Ref<'_, B> {
    Ref::map(self.state.borrow(), |state| state.backend())
  }

  /// Access the backend mutably.
  ///
  /// Changing driver state through it desynchronizes the cache; call [`Context::reset_state`]
  /// afterwards.
  pub fn backend_mut(&self) -> RefMut<'_, B> {
    RefMut::map(self.state.borrow_mut(), |state| state.backend_mut())
  }

  pub(crate) fn shared_state(&self) -> Rc<RefCell<GLState<B>>> {
    self.state.clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn capabilities(api: Api, version: Version, extensions: &[&str]) -> Capabilities {
    let info = ContextInfo {
      api,
      version,
      version_string: String::new(),
      vendor: String::new(),
      renderer: String::new(),
      extensions: extensions.iter().map(|&e| e.to_owned()).collect(),
      max_texture_units: 16,
      max_image_units: 8,
    };

    Capabilities::new(info, &Configuration::default())
  }

  #[test]
  fn version_comparison() {
    assert!(Version::GL450.is_at_least(Version::GL330));
    assert!(!Version::GL330.is_at_least(Version::GL450));
    assert!(!Version::GLES320.is_at_least(Version::GL210));
    assert!(!Version::None.is_at_least(Version::None));
  }

  #[test]
  fn core_extensions() {
    let caps = capabilities(Api::OpenGL, Version::GL450, &[]);
    assert!(caps.is_supported(Extension::ArbMultiBind));
    assert!(!caps.is_supported(Extension::KhrParallelShaderCompile));

    let caps = capabilities(Api::OpenGL, Version::GL330, &["GL_KHR_debug"]);
    assert!(!caps.is_supported(Extension::ArbMultiBind));
    assert!(caps.is_supported(Extension::KhrDebug));

    let caps = capabilities(Api::WebGL, Version::GLES300, &[]);
    assert!(caps.is_supported(Extension::ArbTextureStorage));
    assert!(!caps.is_supported(Extension::KhrDebug));
  }

  #[test]
  fn disabled_extensions() {
    let configuration =
      Configuration::parse_disabled_extensions("GL_ARB_multi_bind, GL_KHR_debug").unwrap();
    assert_eq!(
      configuration.disabled_extensions(),
      &[Extension::ArbMultiBind, Extension::KhrDebug]
    );

    let info = ContextInfo {
      api: Api::OpenGL,
      version: Version::GL460,
      version_string: String::new(),
      vendor: String::new(),
      renderer: String::new(),
      extensions: Vec::new(),
      max_texture_units: 16,
      max_image_units: 8,
    };
    let caps = Capabilities::new(info, &configuration);

    assert!(!caps.is_supported(Extension::ArbMultiBind));
    assert!(caps.is_supported(Extension::ArbDirectStateAccess));
  }

  #[test]
  fn unknown_disabled_extension() {
    assert_eq!(
      Configuration::parse_disabled_extensions("GL_ARB_nope"),
      Err(ConfigurationError::UnknownExtension("GL_ARB_nope".to_owned()))
    );
  }

  #[test]
  fn preambles() {
    assert_eq!(Version::GL330.glsl_preamble(), Some("#version 330\n"));
    assert_eq!(Version::GLES300.glsl_preamble(), Some("#version 300 es\n"));
    assert_eq!(Version::None.glsl_preamble(), None);
  }
}
