//! Backend interfaces.
//!
//! glint never calls a driver directly: every entry point it needs is a method of one of the
//! traits in this module, taking plain object ids and glint enums. A backend implements all of
//! them and is handed to [`Context`](crate::context::Context), which then shares it, wrapped in
//! the state cache, with every object.
//!
//! The traits are `unsafe` to implement and their methods `unsafe` to call: implementations talk
//! to a driver which trusts its arguments, and callers must uphold the usual OpenGL contracts
//! (current context, valid ids, data large enough for the bound pixel storage).
//!
//! Two backends exist: the OpenGL one, in the `glint-gl` crate, and [`headless::Headless`], an
//! in-memory driver used for testing.

pub mod buffer;
pub mod headless;
pub mod mesh;
pub mod program;
pub mod shader;
pub mod texture;

use crate::context::{Api, Version};
use crate::object::ObjectKind;

pub use self::buffer::BufferBackend;
pub use self::mesh::MeshBackend;
pub use self::program::ProgramBackend;
pub use self::shader::ShaderBackend;
pub use self::texture::TextureBackend;

/// Information a backend reports about its context.
#[derive(Clone, Debug)]
pub struct ContextInfo {
  /// API family.
  pub api: Api,
  /// Parsed version, [`Version::None`] if unrecognized.
  pub version: Version,
  /// Raw version string, for diagnostics.
  pub version_string: String,
  /// Driver vendor.
  pub vendor: String,
  /// Driver renderer.
  pub renderer: String,
  /// Advertised extension names.
  pub extensions: Vec<String>,
  /// Number of combined texture units.
  pub max_texture_units: u32,
  /// Number of image units.
  pub max_image_units: u32,
}

/// A complete backend.
pub unsafe trait Backend:
  BufferBackend + TextureBackend + ShaderBackend + ProgramBackend + MeshBackend
{
  /// Query the context information.
  unsafe fn context_info(&mut self) -> ContextInfo;

  /// Attach a debug label to an object.
  unsafe fn object_label(&mut self, kind: ObjectKind, id: u32, label: &str);

  /// Read the debug label of an object.
  unsafe fn get_object_label(&mut self, kind: ObjectKind, id: u32) -> String;
}
