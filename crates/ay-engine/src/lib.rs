//! Ay engine crate.
//!
//! Safe bindings over the `ay` native library: window creation, a rendering
//! context (clear, viewport, shaders, uniforms) and immediate-mode UI
//! declarations. Native objects are reached through typed handles, value types
//! are marshaled into the exact layouts the native side reads, and UI draw
//! closures are bridged through call-scoped trampolines.

pub mod callback;
pub mod context;
pub mod coords;
pub mod error;
pub mod handle;
pub mod input;
pub mod logging;
pub mod marshal;
pub mod native;
pub mod paint;
pub mod time;
pub mod window;

pub use context::{Context, Uniform, UiWindow, WindowFlags};
pub use error::{Error, Result};
pub use marshal::RetainedColor;
pub use native::{HeadlessNative, LibraryConfig, NativeApi};
pub use window::Window;
