//! OpenGL backend.
//!
//! This module implements every glint backend trait for [`GL`].

mod buffer;
mod debug;
mod mesh;
mod pixel;
mod shader;
mod texture;

use gl::types::*;
use glint::backend::{Backend, ContextInfo};
use glint::context::{Api, Version};
use glint::object::ObjectKind;
use std::cell::RefCell;
use std::error;
use std::ffi::{c_void, CStr};
use std::fmt;
use std::marker::PhantomData;
use std::os::raw::c_char;

// TLS synchronization barrier for `GL`: a single backend per thread.
thread_local!(static TLS_ACQUIRE_GL: RefCell<Option<()>> = RefCell::new(Some(())));

/// Errors that can happen while acquiring the backend.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GLError {
  /// A backend already exists on the current thread.
  UnavailableGLState,
  /// The function pointers were not loaded.
  NotLoaded,
}

impl fmt::Display for GLError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      GLError::UnavailableGLState => f.write_str("unavailable graphics state"),
      GLError::NotLoaded => f.write_str("OpenGL function pointers are not loaded"),
    }
  }
}

impl error::Error for GLError {}

/// The OpenGL backend.
///
/// Only one can exist per thread at a time, and the OpenGL context it talks to must be current
/// on that thread for as long as it lives.
#[derive(Debug)]
pub struct GL {
  _a: PhantomData<*const ()>, // !Send and !Sync
}

impl GL {
  /// Load the function pointers through `loader`, then acquire the backend.
  ///
  /// `loader` is typically the `get_proc_address` function of the windowing crate.
  pub fn load_with<F>(loader: F) -> Result<Self, GLError>
  where
    F: FnMut(&'static str) -> *const c_void,
  {
    gl::load_with(loader);
    Self::new()
  }

  /// Acquire the backend, the function pointers being already loaded.
  pub fn new() -> Result<Self, GLError> {
    if !gl::GetString::is_loaded() {
      return Err(GLError::NotLoaded);
    }

    TLS_ACQUIRE_GL.with(|rc| {
      let mut inner = rc.borrow_mut();

      match inner.take() {
        Some(_) => Ok(GL { _a: PhantomData }),
        None => Err(GLError::UnavailableGLState),
      }
    })
  }
}

impl Drop for GL {
  fn drop(&mut self) {
    TLS_ACQUIRE_GL.with(|rc| *rc.borrow_mut() = Some(()));
  }
}

unsafe fn get_string(name: GLenum) -> String {
  let ptr = gl::GetString(name);

  if ptr.is_null() {
    String::new()
  } else {
    CStr::from_ptr(ptr as *const c_char)
      .to_string_lossy()
      .into_owned()
  }
}

unsafe fn get_integer(name: GLenum) -> GLint {
  let mut value = 0;
  gl::GetIntegerv(name, &mut value);
  value
}

unsafe fn get_extensions(version: Version) -> Vec<String> {
  if version.is_at_least(Version::GL300) || version.is_at_least(Version::GLES300) {
    let count = get_integer(gl::NUM_EXTENSIONS).max(0) as GLuint;

    (0..count)
      .filter_map(|i| {
        let ptr = gl::GetStringi(gl::EXTENSIONS, i);

        if ptr.is_null() {
          None
        } else {
          Some(
            CStr::from_ptr(ptr as *const c_char)
              .to_string_lossy()
              .into_owned(),
          )
        }
      })
      .collect()
  } else {
    get_string(gl::EXTENSIONS)
      .split_whitespace()
      .map(str::to_owned)
      .collect()
  }
}

/// Parse a driver version string into an API family and a version.
///
/// Recognized forms are `4.6.0 <vendor>`, `OpenGL ES 3.2 <vendor>` and `WebGL 2.0 (<details>)`.
/// WebGL versions map onto the OpenGL ES version they derive from. Unrecognized versions yield
/// [`Version::None`].
pub fn parse_version(version: &str) -> (Api, Version) {
  let (api, rest) = if let Some(rest) = version.strip_prefix("WebGL ") {
    (Api::WebGL, rest)
  } else if let Some(rest) = version.strip_prefix("OpenGL ES ") {
    (Api::OpenGLES, rest)
  } else {
    (Api::OpenGL, version)
  };

  let number = rest.split_whitespace().next().unwrap_or("");
  let mut parts = number.split('.').map(str::parse::<u32>);

  let parsed = match (parts.next(), parts.next()) {
    (Some(Ok(major)), Some(Ok(minor))) => match api {
      Api::WebGL if minor == 0 => Version::from_number(true, major + 1, 0),
      Api::WebGL => None,
      Api::OpenGLES => Version::from_number(true, major, minor),
      Api::OpenGL => Version::from_number(false, major, minor),
    },
    _ => None,
  };

  (api, parsed.unwrap_or(Version::None))
}

fn supports_image_units(version: Version, extensions: &[String]) -> bool {
  version.is_at_least(Version::GL420)
    || version.is_at_least(Version::GLES310)
    || extensions
      .iter()
      .any(|ext| ext == "GL_ARB_shader_image_load_store")
}

unsafe impl Backend for GL {
  unsafe fn context_info(&mut self) -> ContextInfo {
    let version_string = get_string(gl::VERSION);
    let (api, version) = parse_version(&version_string);
    let extensions = get_extensions(version);

    let max_image_units = if supports_image_units(version, &extensions) {
      get_integer(gl::MAX_IMAGE_UNITS).max(0) as u32
    } else {
      0
    };

    ContextInfo {
      api,
      version,
      version_string,
      vendor: get_string(gl::VENDOR),
      renderer: get_string(gl::RENDERER),
      extensions,
      max_texture_units: get_integer(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS).max(1) as u32,
      max_image_units,
    }
  }

  unsafe fn object_label(&mut self, kind: ObjectKind, id: u32, label: &str) {
    debug::object_label(kind, id, label);
  }

  unsafe fn get_object_label(&mut self, kind: ObjectKind, id: u32) -> String {
    debug::get_object_label(kind, id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn desktop_versions() {
    assert_eq!(
      parse_version("4.6.0 NVIDIA 535.54.03"),
      (Api::OpenGL, Version::GL460)
    );
    assert_eq!(
      parse_version("3.3 (Core Profile) Mesa 23.1.4"),
      (Api::OpenGL, Version::GL330)
    );
    assert_eq!(parse_version("2.1"), (Api::OpenGL, Version::GL210));
  }

  #[test]
  fn es_and_webgl_versions() {
    assert_eq!(
      parse_version("OpenGL ES 3.2 Mesa 23.1.4"),
      (Api::OpenGLES, Version::GLES320)
    );
    assert_eq!(
      parse_version("WebGL 2.0 (OpenGL ES 3.0 Chromium)"),
      (Api::WebGL, Version::GLES300)
    );
    assert_eq!(parse_version("WebGL 1.0"), (Api::WebGL, Version::GLES200));
  }

  #[test]
  fn unknown_versions() {
    assert_eq!(parse_version("OpenGL ES-CM 1.1"), (Api::OpenGL, Version::None));
    assert_eq!(parse_version("1.5.0"), (Api::OpenGL, Version::None));
    assert_eq!(parse_version(""), (Api::OpenGL, Version::None));
  }

  #[test]
  fn image_units_need_load_store() {
    assert!(supports_image_units(Version::GL430, &[]));
    assert!(!supports_image_units(Version::GL330, &[]));
    assert!(supports_image_units(
      Version::GL330,
      &["GL_ARB_shader_image_load_store".to_owned()]
    ));
    assert!(!supports_image_units(Version::GLES300, &[]));
  }
}
