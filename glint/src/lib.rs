//! # State-tracked OpenGL objects
//!
//! glint wraps OpenGL textures, shaders and shader programs in owning handles and routes every
//! binding through a per-context cache, so that redundant driver calls are skipped. It picks, at
//! runtime, the best implementation the driver offers for each operation (batched binds, direct
//! state access, immutable storage, …) and falls back to the classic entry points otherwise.
//!
//! # What’s included?
//!
//! - **Contexts**: a [`Context`](context::Context) owns a backend and the state cache every object
//!   shares. It knows the driver version, its extensions and its limits, and can be configured to
//!   ignore extensions.
//! - **Objects**: every GPU object implements [`GraphicsObject`](object::GraphicsObject); it can
//!   wrap ids created elsewhere, release them, and carry debug labels.
//! - **Textures**: one, two and three-dimensional textures, arrays, cube maps, cube map arrays and
//!   multisample textures, with uploads and reads through pixel storage aware image views, or
//!   through [pixel buffers](buffer) without touching client memory.
//! - **Shaders**: shader stages and programs, compiled and linked either synchronously or
//!   asynchronously when the driver supports parallel compilation.
//! - **Drawing**: meshes and compute dispatches are issued through a linked program.
//!
//! # Backends
//!
//! glint talks to the driver through the traits of the [`backend`] module. The `glint-gl` crate
//! implements them over OpenGL; [`backend::headless::Headless`] implements them in memory, which
//! is what tests run on.
//!
//! # Threading
//!
//! Objects and contexts are neither [`Send`] nor [`Sync`]: a driver context is current on a single
//! thread, and so is everything created from it.

pub mod backend;
pub mod buffer;
pub mod context;
pub mod image;
pub mod mesh;
pub mod object;
pub mod pixel;
pub mod shader;
pub mod state;
pub mod texture;
