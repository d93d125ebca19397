//! Graphics state.
//!
//! [`GLState`] sits between objects and the backend and remembers what is currently bound where:
//! texture units, image units, the current program, the current vertex array, pixel buffers and the
//! pixel storage parameters of both transfer directions. Binding something that is already bound is
//! then a pure comparison with no driver call.
//!
//! The cache is only authoritative as long as every change goes through it. Foreign code calling
//! the driver directly desynchronizes it; [`Context::reset_state`](crate::context::Context::reset_state)
//! forgets everything so that the next binds are issued unconditionally.
//!
//! One object can be bound on several units at once; each unit slot caches the id on its own and
//! nothing is invalidated across slots.

use crate::backend::buffer::BufferTarget;
use crate::backend::texture::{StorageDirection, TextureTarget};
use crate::backend::Backend;
use crate::context::Capabilities;
use crate::image::{CompressedPixelStorage, PixelStorage};
use crate::pixel::{ImageAccess, ImageFormat};

/// Cached value.
///
/// A cached value is used to prevent issuing costly driver commands if we know the target value
/// is already set to what the command tries to set. An empty cache (after an invalidation) is
/// different from every value, which forces the next command to go through.
#[derive(Debug)]
struct Cached<T>(Option<T>)
where
  T: PartialEq;

impl<T> Cached<T>
where
  T: PartialEq,
{
  fn new(initial: T) -> Self {
    Cached(Some(initial))
  }

  /// Explicitly invalidate a value.
  fn invalidate(&mut self) {
    self.0 = None;
  }

  fn set(&mut self, value: T) {
    self.0 = Some(value);
  }

  fn get(&self) -> Option<&T> {
    self.0.as_ref()
  }

  /// Check if the cached value is invalid regarding a value.
  fn is_invalid(&self, new_val: &T) -> bool {
    match &self.0 {
      Some(ref t) => t != new_val,
      _ => true,
    }
  }
}

/// What an image unit is bound to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ImageBinding {
  /// Texture id, `0` if nothing is bound.
  pub texture: u32,
  pub level: u32,
  /// Whether every layer is bound, in which case `layer` is ignored.
  pub layered: bool,
  pub layer: u32,
  pub access: ImageAccess,
  pub format: ImageFormat,
}

impl ImageBinding {
  /// Binding of an unused image unit.
  pub const NONE: ImageBinding = ImageBinding {
    texture: 0,
    level: 0,
    layered: false,
    layer: 0,
    access: ImageAccess::ReadOnly,
    format: ImageFormat::R8,
  };
}

/// The graphics state.
///
/// This type represents the current state of a given graphics context. It acts as a forward-gate
/// to the backend but adds a small cache layer over it to prevent from issuing the same call (with
/// the same parameters) twice.
#[derive(Debug)]
pub struct GLState<B> {
  backend: B,
  capabilities: Capabilities,

  // texture units; `None` means unknown
  current_texture_unit: Cached<u32>,
  bound_textures: Vec<Option<(TextureTarget, u32)>>,

  // image units; `None` means unknown
  bound_images: Vec<Option<ImageBinding>>,

  current_program: Cached<u32>,
  bound_vertex_array: Cached<u32>,

  pixel_pack_buffer: Cached<u32>,
  pixel_unpack_buffer: Cached<u32>,

  // pixel storage; compressed transfers share the registers of uncompressed ones
  pack_storage: Cached<PixelStorage>,
  unpack_storage: Cached<PixelStorage>,
  compressed_pack_storage: Cached<CompressedPixelStorage>,
  compressed_unpack_storage: Cached<CompressedPixelStorage>,
}

impl<B> GLState<B> {
  /// Access the backend.
  pub fn backend(&self) -> &B {
    &self.backend
  }

  /// Access the backend mutably.
  ///
  /// Changing bindings through it desynchronizes the cache.
  pub fn backend_mut(&mut self) -> &mut B {
    &mut self.backend
  }

  pub fn capabilities(&self) -> &Capabilities {
    &self.capabilities
  }

  /// Number of texture units tracked.
  pub fn texture_unit_count(&self) -> u32 {
    self.bound_textures.len() as u32
  }

  /// Number of image units tracked.
  pub fn image_unit_count(&self) -> u32 {
    self.bound_images.len() as u32
  }

  /// Texture id bound to a texture unit, `None` if unknown.
  pub fn bound_texture(&self, unit: u32) -> Option<u32> {
    self
      .bound_textures
      .get(unit as usize)
      .copied()
      .flatten()
      .map(|(_, id)| id)
  }

  /// Record a binding issued outside of the cache.
  ///
  /// Whoever binds a texture directly through the backend must call this afterwards so that the
  /// cache stays correct.
  pub fn set_bound_texture(&mut self, unit: u32, target: TextureTarget, id: u32) {
    let unit = unit as usize;

    if unit >= self.bound_textures.len() {
      self.bound_textures.resize(unit + 1, None);
    }

    self.bound_textures[unit] = Some((target, id));
  }

  /// Image unit binding, `None` if unknown.
  pub fn bound_image(&self, unit: u32) -> Option<ImageBinding> {
    self.bound_images.get(unit as usize).copied().flatten()
  }

  /// Current program, `None` if unknown.
  pub fn current_program(&self) -> Option<u32> {
    self.current_program.get().copied()
  }

  /// Buffer bound to a pixel target, `None` if unknown.
  pub fn bound_buffer(&self, target: BufferTarget) -> Option<u32> {
    match target {
      BufferTarget::PixelPack => self.pixel_pack_buffer.get().copied(),
      BufferTarget::PixelUnpack => self.pixel_unpack_buffer.get().copied(),
    }
  }

  /// Forget the active texture unit.
  pub fn invalidate_texture_unit(&mut self) {
    self.current_texture_unit.invalidate();
  }

  /// Forget every texture unit binding.
  pub fn invalidate_bound_textures(&mut self) {
    self.bound_textures.iter_mut().for_each(|slot| *slot = None);
  }

  /// Forget every image unit binding.
  pub fn invalidate_bound_images(&mut self) {
    self.bound_images.iter_mut().for_each(|slot| *slot = None);
  }

  pub fn invalidate_shader_program(&mut self) {
    self.current_program.invalidate();
  }

  pub fn invalidate_vertex_array(&mut self) {
    self.bound_vertex_array.invalidate();
  }

  /// Forget the pixel buffer bindings.
  pub fn invalidate_bound_buffers(&mut self) {
    self.pixel_pack_buffer.invalidate();
    self.pixel_unpack_buffer.invalidate();
  }

  /// Forget the pixel storage parameters of both directions.
  pub fn invalidate_pixel_storage(&mut self) {
    self.pack_storage.invalidate();
    self.unpack_storage.invalidate();
    self.compressed_pack_storage.invalidate();
    self.compressed_unpack_storage.invalidate();
  }

  /// Forget everything.
  pub fn reset(&mut self) {
    self.invalidate_texture_unit();
    self.invalidate_bound_textures();
    self.invalidate_bound_images();
    self.invalidate_shader_program();
    self.invalidate_vertex_array();
    self.invalidate_bound_buffers();
    self.invalidate_pixel_storage();
  }

  /// Clear the slots of a texture about to be deleted.
  ///
  /// Deleting a texture unbinds it everywhere, so its slots are known to be empty afterwards.
  pub(crate) fn forget_texture(&mut self, id: u32) {
    for slot in &mut self.bound_textures {
      if let Some((target, bound)) = *slot {
        if bound == id {
          *slot = Some((target, 0));
        }
      }
    }

    for slot in &mut self.bound_images {
      if slot.map_or(false, |binding| binding.texture == id) {
        *slot = Some(ImageBinding::NONE);
      }
    }
  }

  /// Clear the bindings of a buffer about to be deleted.
  pub(crate) fn forget_buffer(&mut self, id: u32) {
    for cached in [&mut self.pixel_pack_buffer, &mut self.pixel_unpack_buffer] {
      if cached.get() == Some(&id) {
        cached.set(0);
      }
    }
  }

  /// Clear the current program slot if it holds a program about to be deleted.
  pub(crate) fn forget_program(&mut self, id: u32) {
    if self.current_program.get() == Some(&id) {
      self.current_program.invalidate();
    }
  }
}

impl<B> GLState<B>
where
  B: Backend,
{
  pub(crate) fn new(backend: B, capabilities: Capabilities) -> Self {
    let texture_units = capabilities.max_texture_units() as usize;
    let bound_textures = vec![Some((TextureTarget::Texture2D, 0)); texture_units];
    let bound_images = vec![Some(ImageBinding::NONE); capabilities.max_image_units() as usize];

    GLState {
      backend,
      capabilities,
      current_texture_unit: Cached::new(0),
      bound_textures,
      bound_images,
      current_program: Cached::new(0),
      bound_vertex_array: Cached::new(0),
      pixel_pack_buffer: Cached::new(0),
      pixel_unpack_buffer: Cached::new(0),
      pack_storage: Cached::new(PixelStorage::default()),
      unpack_storage: Cached::new(PixelStorage::default()),
      compressed_pack_storage: Cached::new(CompressedPixelStorage::default()),
      compressed_unpack_storage: Cached::new(CompressedPixelStorage::default()),
    }
  }

  /// Make a texture unit active.
  pub(crate) unsafe fn set_texture_unit(&mut self, unit: u32) {
    if self.current_texture_unit.is_invalid(&unit) {
      self.backend.active_texture(unit);
      self.current_texture_unit.set(unit);
    }
  }

  /// Bind a texture to a unit, unless it’s already bound there.
  ///
  /// Returns whether a driver call was issued.
  pub unsafe fn bind_texture_if_needed(
    &mut self,
    unit: u32,
    target: TextureTarget,
    id: u32,
  ) -> bool {
    if self.bound_texture(unit) == Some(id) {
      return false;
    }

    self.set_texture_unit(unit);
    self.backend.bind_texture(target, id);
    self.set_bound_texture(unit, target, id);

    true
  }

  /// Bind a texture in order to edit it.
  ///
  /// Edits go to whatever is bound on the active unit, so this always leaves a unit holding the
  /// texture active. If the texture is already bound somewhere, that unit gets activated.
  /// Otherwise, it gets bound on the last unit, which user code is unlikely to use, so that user
  /// bindings on lower units are left untouched.
  pub(crate) unsafe fn bind_texture_internal(&mut self, target: TextureTarget, id: u32) {
    if let Some(&unit) = self.current_texture_unit.get() {
      if self.bound_texture(unit) == Some(id) {
        return;
      }
    }

    let internal_unit = self.texture_unit_count().saturating_sub(1);
    let unit = (0..self.texture_unit_count())
      .rev()
      .find(|&unit| self.bound_texture(unit) == Some(id))
      .unwrap_or(internal_unit);

    self.set_texture_unit(unit);
    self.bind_texture_if_needed(unit, target, id);
  }

  /// Unbind whatever texture is bound to a unit.
  pub(crate) unsafe fn unbind_texture(&mut self, unit: u32) {
    let target = match self.bound_textures.get(unit as usize).copied().flatten() {
      Some((_, 0)) => return,
      Some((target, _)) => target,
      // we don’t know which target is bound; texture 2D is the most likely
      None => TextureTarget::Texture2D,
    };

    self.set_texture_unit(unit);
    self.backend.bind_texture(target, 0);
    self.set_bound_texture(unit, target, 0);
  }

  /// Bind textures to consecutive units in a single driver call.
  ///
  /// `None` entries unbind their unit. No call is issued if every unit already has the right
  /// texture.
  pub(crate) unsafe fn bind_textures(
    &mut self,
    first_unit: u32,
    textures: &[Option<(TextureTarget, u32)>],
  ) {
    let mut different = false;
    let mut ids = Vec::with_capacity(textures.len());

    for (unit, texture) in (first_unit..).zip(textures) {
      let (target, id) = match *texture {
        Some(binding) => binding,
        None => {
          let target = self
            .bound_textures
            .get(unit as usize)
            .copied()
            .flatten()
            .map_or(TextureTarget::Texture2D, |(target, _)| target);
          (target, 0)
        }
      };

      if self.bound_texture(unit) != Some(id) {
        different = true;
        self.set_bound_texture(unit, target, id);
      }

      ids.push(id);
    }

    if different {
      self.backend.bind_textures(first_unit, &ids);
    }
  }

  /// Bind a texture level to an image unit, unless the exact same binding is there already.
  pub(crate) unsafe fn bind_image(&mut self, unit: u32, binding: ImageBinding) {
    if self.bound_image(unit) == Some(binding) {
      return;
    }

    self.backend.bind_image_texture(
      unit,
      binding.texture,
      binding.level,
      binding.layered,
      binding.layer,
      binding.access,
      binding.format,
    );
    self.set_bound_image(unit, Some(binding));
  }

  /// Bind textures to consecutive image units in a single driver call.
  ///
  /// The driver binds level 0, all layers, read-write, in the textures’ own format; `bindings`
  /// must describe exactly that so that the cache matches.
  pub(crate) unsafe fn bind_images(&mut self, first_unit: u32, bindings: &[Option<ImageBinding>]) {
    let mut different = false;
    let mut ids = Vec::with_capacity(bindings.len());

    for (unit, binding) in (first_unit..).zip(bindings) {
      let binding = binding.unwrap_or(ImageBinding::NONE);

      if self.bound_image(unit) != Some(binding) {
        different = true;
        self.set_bound_image(unit, Some(binding));
      }

      ids.push(binding.texture);
    }

    if different {
      self.backend.bind_image_textures(first_unit, &ids);
    }
  }

  fn set_bound_image(&mut self, unit: u32, binding: Option<ImageBinding>) {
    let unit = unit as usize;

    if unit >= self.bound_images.len() {
      self.bound_images.resize(unit + 1, None);
    }

    self.bound_images[unit] = binding;
  }

  /// Make a program current.
  pub(crate) unsafe fn use_program(&mut self, id: u32) {
    if self.current_program.is_invalid(&id) {
      self.backend.use_program(id);
      self.current_program.set(id);
    }
  }

  pub(crate) unsafe fn bind_vertex_array(&mut self, id: u32) {
    if self.bound_vertex_array.is_invalid(&id) {
      self.backend.bind_vertex_array(id);
      self.bound_vertex_array.set(id);
    }
  }

  /// Bind a buffer to a pixel target, unless it’s already bound there.
  ///
  /// Client memory transfers need `0` bound to the target of their direction.
  pub(crate) unsafe fn bind_buffer(&mut self, target: BufferTarget, id: u32) {
    let cached = match target {
      BufferTarget::PixelPack => &mut self.pixel_pack_buffer,
      BufferTarget::PixelUnpack => &mut self.pixel_unpack_buffer,
    };

    if cached.is_invalid(&id) {
      self.backend.bind_buffer(target, id);
      cached.set(id);
    }
  }

  /// Apply pixel storage parameters for a transfer.
  pub(crate) unsafe fn apply_pixel_storage(
    &mut self,
    direction: StorageDirection,
    storage: &PixelStorage,
  ) {
    let cached = match direction {
      StorageDirection::Pack => &mut self.pack_storage,
      StorageDirection::Unpack => &mut self.unpack_storage,
    };

    if cached.is_invalid(storage) {
      self.backend.set_pixel_storage(direction, storage);
      cached.set(*storage);

      // row length, image height and skips are shared with compressed storage
      match direction {
        StorageDirection::Pack => self.compressed_pack_storage.invalidate(),
        StorageDirection::Unpack => self.compressed_unpack_storage.invalidate(),
      }
    }
  }

  /// Apply compressed pixel storage parameters for a transfer.
  pub(crate) unsafe fn apply_compressed_pixel_storage(
    &mut self,
    direction: StorageDirection,
    storage: &CompressedPixelStorage,
  ) {
    let cached = match direction {
      StorageDirection::Pack => &mut self.compressed_pack_storage,
      StorageDirection::Unpack => &mut self.compressed_unpack_storage,
    };

    if cached.is_invalid(storage) {
      self.backend.set_compressed_pixel_storage(direction, storage);
      cached.set(*storage);

      // the shared registers now hold compressed values, and alignment is forced to 1
      match direction {
        StorageDirection::Pack => self.pack_storage.invalidate(),
        StorageDirection::Unpack => self.unpack_storage.invalidate(),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::headless::{Headless, HeadlessConfig};
  use crate::backend::BufferBackend;
  use crate::context::Configuration;

  fn state() -> GLState<Headless> {
    let mut backend = Headless::new(HeadlessConfig::default());
    let info = unsafe { backend.context_info() };
    let capabilities = Capabilities::new(info, &Configuration::default());

    GLState::new(backend, capabilities)
  }

  #[test]
  fn cached_value() {
    let mut cached = Cached::new(3);

    assert!(!cached.is_invalid(&3));
    assert!(cached.is_invalid(&4));

    cached.invalidate();
    assert!(cached.is_invalid(&3));

    cached.set(4);
    assert!(!cached.is_invalid(&4));
  }

  #[test]
  fn bind_if_needed_skips_cache_hits() {
    let mut state = state();

    unsafe {
      assert!(state.bind_texture_if_needed(2, TextureTarget::Texture2D, 7));
      assert!(!state.bind_texture_if_needed(2, TextureTarget::Texture2D, 7));
    }

    assert_eq!(state.backend().call_count("bind_texture"), 1);
    assert_eq!(state.bound_texture(2), Some(7));
  }

  #[test]
  fn same_texture_on_many_units() {
    let mut state = state();

    unsafe {
      state.bind_texture_if_needed(0, TextureTarget::Texture2D, 7);
      state.bind_texture_if_needed(1, TextureTarget::Texture2D, 7);
      state.unbind_texture(0);
    }

    assert_eq!(state.bound_texture(0), Some(0));
    assert_eq!(state.bound_texture(1), Some(7));
  }

  #[test]
  fn internal_binding_uses_last_unit() {
    let mut state = state();
    let last = state.texture_unit_count() - 1;

    unsafe {
      state.bind_texture_internal(TextureTarget::Texture2D, 5);
    }
    assert_eq!(state.bound_texture(last), Some(5));
    assert_eq!(state.bound_texture(0), Some(0));

    // already bound on the active unit
    unsafe {
      state.bind_texture_internal(TextureTarget::Texture2D, 5);
    }
    assert_eq!(state.backend().call_count("bind_texture"), 1);
  }

  #[test]
  fn internal_binding_activates_the_unit_holding_the_texture() {
    let mut state = state();
    let last = state.texture_unit_count() - 1;

    unsafe {
      state.bind_texture_internal(TextureTarget::Texture2D, 5);
      state.bind_texture_if_needed(0, TextureTarget::Texture2D, 6);
      state.bind_texture_internal(TextureTarget::Texture2D, 5);
    }

    assert_eq!(state.backend().active_texture_unit(), last);
    assert_eq!(state.bound_texture(0), Some(6));
    assert_eq!(state.backend().call_count("bind_texture"), 2);

    // bound by the user on a lower unit
    unsafe {
      state.bind_texture_internal(TextureTarget::Texture2D, 6);
    }

    assert_eq!(state.backend().active_texture_unit(), 0);
    assert_eq!(state.bound_texture(last), Some(5));
    assert_eq!(state.backend().call_count("bind_texture"), 2);
  }

  #[test]
  fn reset_forces_rebind() {
    let mut state = state();

    unsafe {
      state.bind_texture_if_needed(0, TextureTarget::Texture2D, 7);
      state.use_program(3);
    }

    state.reset();
    assert_eq!(state.bound_texture(0), None);
    assert_eq!(state.current_program(), None);

    unsafe {
      assert!(state.bind_texture_if_needed(0, TextureTarget::Texture2D, 7));
      state.use_program(3);
    }

    assert_eq!(state.backend().call_count("bind_texture"), 2);
    assert_eq!(state.backend().call_count("use_program"), 2);
  }

  #[test]
  fn forget_texture_clears_every_slot() {
    let mut state = state();
    let binding = ImageBinding {
      texture: 7,
      level: 0,
      layered: false,
      layer: 0,
      access: ImageAccess::ReadWrite,
      format: ImageFormat::RGBA8,
    };

    unsafe {
      state.bind_texture_if_needed(0, TextureTarget::Texture2D, 7);
      state.bind_texture_if_needed(3, TextureTarget::Texture2D, 7);
      state.bind_image(1, binding);
    }

    state.forget_texture(7);

    assert_eq!(state.bound_texture(0), Some(0));
    assert_eq!(state.bound_texture(3), Some(0));
    assert_eq!(state.bound_image(1), Some(ImageBinding::NONE));
  }

  #[test]
  fn pixel_storage_applied_once() {
    let mut state = state();
    let storage = PixelStorage {
      alignment: 1,
      ..PixelStorage::default()
    };

    unsafe {
      state.apply_pixel_storage(StorageDirection::Unpack, &PixelStorage::default());
      state.apply_pixel_storage(StorageDirection::Unpack, &storage);
      state.apply_pixel_storage(StorageDirection::Unpack, &storage);
      state.apply_pixel_storage(StorageDirection::Pack, &storage);
    }

    assert_eq!(state.backend().call_count("set_pixel_storage"), 2);
  }

  #[test]
  fn compressed_storage_invalidates_shared_registers() {
    let mut state = state();
    let compressed = CompressedPixelStorage {
      row_length: 16,
      ..CompressedPixelStorage::default()
    };

    unsafe {
      state.apply_pixel_storage(StorageDirection::Unpack, &PixelStorage::default());
      state.apply_compressed_pixel_storage(StorageDirection::Unpack, &compressed);
      state.apply_pixel_storage(StorageDirection::Unpack, &PixelStorage::default());
      state.apply_compressed_pixel_storage(StorageDirection::Unpack, &compressed);
    }

    assert_eq!(state.backend().call_count("set_pixel_storage"), 1);
    assert_eq!(state.backend().call_count("set_compressed_pixel_storage"), 2);
  }

  #[test]
  fn pixel_buffers_are_cached_per_target() {
    let mut state = state();

    unsafe {
      state.bind_buffer(BufferTarget::PixelUnpack, 0);
      state.bind_buffer(BufferTarget::PixelPack, 0);
    }
    assert_eq!(state.backend().call_count("bind_buffer"), 0);

    let id = unsafe { state.backend_mut().gen_buffer() };

    unsafe {
      state.bind_buffer(BufferTarget::PixelUnpack, id);
      state.bind_buffer(BufferTarget::PixelUnpack, id);
    }
    assert_eq!(state.backend().call_count("bind_buffer"), 1);
    assert_eq!(state.bound_buffer(BufferTarget::PixelPack), Some(0));

    state.forget_buffer(id);
    assert_eq!(state.bound_buffer(BufferTarget::PixelUnpack), Some(0));
  }
}
