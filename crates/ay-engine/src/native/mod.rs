//! Native boundary.
//!
//! [`NativeApi`] mirrors the C entry points of the `ay` library one-to-one:
//! raw handles, C strings and packed float buffers. Two implementations exist:
//! - [`DylibNative`] forwards to the shared library loaded at runtime
//! - [`HeadlessNative`] is an in-process implementation without a display,
//!   used by tests and display-less runs
//!
//! Nothing above this module touches raw pointers except through the
//! marshaling and callback helpers.

mod dylib;
mod headless;
mod library;

use std::ffi::{CStr, c_char, c_void};

pub use dylib::DylibNative;
pub use headless::{HeadlessNative, NativeCall, UniformValue};
pub use library::LibraryConfig;

/// Opaque native object reference. Null means "no object".
pub type RawHandle = *mut c_void;

/// UI draw callback invoked synchronously by `contextUiCreateWindow`.
///
/// The native signature is `void (*)(void)`: no user data crosses the
/// boundary.
pub type UiDrawFn = unsafe extern "C" fn();

/// Status returned by fallible native entry points.
pub type Status = i32;

pub const STATUS_OK: Status = 0;
pub const STATUS_NOT_FOUND: Status = 1;
pub const STATUS_BUILD_FAILED: Status = 2;
pub const STATUS_IO: Status = 3;
pub const STATUS_NO_PROGRAM: Status = 4;

/// The native surface, grouped by resource.
///
/// # Safety
///
/// Every `unsafe` method requires handles previously returned by the same
/// implementation and not yet disposed, NUL-terminated strings, and float
/// buffers of the arity named by the entry point. Buffers passed as
/// `*const f32` are only read during the call; the color editor buffer may
/// be written during the call.
pub trait NativeApi {
    // ── window ────────────────────────────────────────────────────────────

    /// Returns null when the windowing backend cannot initialize.
    fn window_new(&self, width: i32, height: i32) -> RawHandle;
    unsafe fn window_dispose(&self, window: RawHandle);
    unsafe fn window_is_open(&self, window: RawHandle) -> bool;
    unsafe fn window_get_context(&self, window: RawHandle) -> RawHandle;
    unsafe fn window_get_size(&self, window: RawHandle, width: *mut i32, height: *mut i32);
    unsafe fn window_key_pressed(&self, window: RawHandle, key: i32) -> bool;
    unsafe fn window_key_released(&self, window: RawHandle, key: i32) -> bool;
    unsafe fn window_get_mouse_position(&self, window: RawHandle, x: *mut f32, y: *mut f32);
    unsafe fn window_close(&self, window: RawHandle);

    // ── context ───────────────────────────────────────────────────────────

    unsafe fn context_get_version(&self, context: RawHandle) -> *const c_char;
    unsafe fn context_get_vendor(&self, context: RawHandle) -> *const c_char;
    unsafe fn context_clear(&self, context: RawHandle, color: *const f32);
    unsafe fn context_viewport(&self, context: RawHandle, x: i32, y: i32, w: i32, h: i32);

    // ── ui ────────────────────────────────────────────────────────────────

    unsafe fn context_ui_begin(&self, context: RawHandle);
    unsafe fn context_ui_end(&self, context: RawHandle);
    #[allow(clippy::too_many_arguments)]
    unsafe fn context_ui_create_window(
        &self,
        context: RawHandle,
        name: *const c_char,
        draw: UiDrawFn,
        flags: i32,
        pos_x: f32,
        pos_y: f32,
        size_x: f32,
        size_y: f32,
    );
    unsafe fn context_ui_create_text(&self, context: RawHandle, color: *const f32, text: *const c_char);
    unsafe fn context_ui_create_color_editor(&self, context: RawHandle, color: *mut f32, label: *const c_char);

    // ── shaders ───────────────────────────────────────────────────────────

    unsafe fn context_shader_from_memory(
        &self,
        context: RawHandle,
        name: *const c_char,
        vertex: *const c_char,
        fragment: *const c_char,
    ) -> Status;
    unsafe fn context_shader_from_file(
        &self,
        context: RawHandle,
        name: *const c_char,
        vertex_path: *const c_char,
        fragment_path: *const c_char,
    ) -> Status;
    unsafe fn context_shader_dispose(&self, context: RawHandle, name: *const c_char) -> Status;
    unsafe fn context_shader_use(&self, context: RawHandle, name: *const c_char) -> Status;
    unsafe fn context_shader_uniform_1i(&self, context: RawHandle, name: *const c_char, value: i32) -> Status;
    unsafe fn context_shader_uniform_1f(&self, context: RawHandle, name: *const c_char, value: f32) -> Status;
    unsafe fn context_shader_uniform_3f(&self, context: RawHandle, name: *const c_char, value: *const f32) -> Status;
    unsafe fn context_shader_uniform_4f(&self, context: RawHandle, name: *const c_char, value: *const f32) -> Status;
    unsafe fn context_shader_uniform_matrix(&self, context: RawHandle, name: *const c_char, value: *const f32) -> Status;

    /// Message for the most recent failed call, or null when none is
    /// available.
    fn last_error(&self) -> *const c_char;
}

/// Copies a native C string. Returns `None` for null.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string valid for the
/// duration of this call.
pub(crate) unsafe fn copy_c_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Reads the native error message, falling back to a generic text.
pub(crate) fn last_error_message(native: &dyn NativeApi) -> String {
    unsafe { copy_c_str(native.last_error()) }.unwrap_or_else(|| "unknown native error".to_string())
}
