//! OpenGL backend.
//!
//! This crate implements the [glint](https://crates.io/crates/glint) backend traits over the
//! function pointers of the [gl](https://crates.io/crates/gl) crate. The backend type is
//! [`GL`]: load the function pointers with [`GL::load_with`], then hand it to a glint context.
//!
//! The same backend drives desktop OpenGL and OpenGL ES: the API family and version are parsed
//! from the driver version string, and glint selects implementations from them at runtime.

pub mod opengl;

pub use opengl::{GLError, GL};
