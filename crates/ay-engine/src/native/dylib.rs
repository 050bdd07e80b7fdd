use std::ffi::{c_char, c_void};
use std::mem;
use std::path::Path;

use libloading::{Library, Symbol};

use super::{LibraryConfig, NativeApi, RawHandle, Status, UiDrawFn};
use crate::error::{Error, Result};

type Ctx = RawHandle;
type Str = *const c_char;

/// Entry points resolved once at load time.
struct Symbols {
    window_new: unsafe extern "C" fn(i32, i32) -> RawHandle,
    window_dispose: unsafe extern "C" fn(RawHandle),
    window_is_open: unsafe extern "C" fn(RawHandle) -> bool,
    window_get_context: unsafe extern "C" fn(RawHandle) -> RawHandle,
    window_get_size: unsafe extern "C" fn(RawHandle, *mut i32, *mut i32),
    window_key_pressed: unsafe extern "C" fn(RawHandle, i32) -> bool,
    window_key_released: unsafe extern "C" fn(RawHandle, i32) -> bool,
    window_get_mouse_position: unsafe extern "C" fn(RawHandle, *mut f32, *mut f32),
    window_close: unsafe extern "C" fn(RawHandle),

    context_get_version: unsafe extern "C" fn(Ctx) -> Str,
    context_get_vendor: unsafe extern "C" fn(Ctx) -> Str,
    context_clear: unsafe extern "C" fn(Ctx, *const f32),
    context_viewport: unsafe extern "C" fn(Ctx, i32, i32, i32, i32),
    context_ui_begin: unsafe extern "C" fn(Ctx),
    context_ui_end: unsafe extern "C" fn(Ctx),
    context_ui_create_window: unsafe extern "C" fn(Ctx, Str, UiDrawFn, i32, f32, f32, f32, f32),
    context_ui_create_text: unsafe extern "C" fn(Ctx, *const f32, Str),
    context_ui_create_color_editor: unsafe extern "C" fn(Ctx, *mut f32, Str),

    context_shader_from_memory: unsafe extern "C" fn(Ctx, Str, Str, Str) -> Status,
    context_shader_from_file: unsafe extern "C" fn(Ctx, Str, Str, Str) -> Status,
    context_shader_dispose: unsafe extern "C" fn(Ctx, Str) -> Status,
    context_shader_use: unsafe extern "C" fn(Ctx, Str) -> Status,
    context_shader_uniform_1i: unsafe extern "C" fn(Ctx, Str, i32) -> Status,
    context_shader_uniform_1f: unsafe extern "C" fn(Ctx, Str, f32) -> Status,
    context_shader_uniform_3f: unsafe extern "C" fn(Ctx, Str, *const f32) -> Status,
    context_shader_uniform_4f: unsafe extern "C" fn(Ctx, Str, *const f32) -> Status,
    context_shader_uniform_matrix: unsafe extern "C" fn(Ctx, Str, *const f32) -> Status,

    /// Optional: libraries built without error reporting do not export it.
    last_error: Option<unsafe extern "C" fn() -> Str>,
}

/// Table of exported symbols.
trait Exports {
    /// Address of the exported symbol `name`.
    fn address(&self, name: &'static str) -> Result<*mut c_void>;
}

impl Exports for Library {
    fn address(&self, name: &'static str) -> Result<*mut c_void> {
        let mut bytes = Vec::with_capacity(name.len() + 1);
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0);

        let sym: Symbol<*mut c_void> = unsafe { self.get(&bytes) }.map_err(|source| Error::MissingSymbol {
            symbol: name,
            source: Some(source),
        })?;
        let address = *sym;
        if address.is_null() {
            return Err(Error::MissingSymbol { symbol: name, source: None });
        }
        Ok(address)
    }
}

/// Copies a function pointer out of `exports`.
///
/// # Safety
///
/// `T` must be a function pointer type matching the exported symbol's real
/// signature.
unsafe fn symbol<T: Copy>(exports: &impl Exports, name: &'static str) -> Result<T> {
    let address = exports.address(name)?;
    debug_assert_eq!(mem::size_of::<T>(), mem::size_of::<*mut c_void>());
    Ok(unsafe { mem::transmute_copy::<*mut c_void, T>(&address) })
}

impl Symbols {
    unsafe fn load(exports: &impl Exports) -> Result<Self> {
        let last_error = match unsafe { symbol(exports, "ayLastError") } {
            Ok(f) => Some(f),
            Err(e) => {
                log::debug!("{e}; native error messages unavailable");
                None
            }
        };

        unsafe {
            Ok(Self {
                window_new: symbol(exports, "windowNew")?,
                window_dispose: symbol(exports, "windowDispose")?,
                window_is_open: symbol(exports, "windowIsOpen")?,
                window_get_context: symbol(exports, "windowGetContext")?,
                window_get_size: symbol(exports, "windowGetSize")?,
                window_key_pressed: symbol(exports, "windowKeyPressed")?,
                window_key_released: symbol(exports, "windowKeyReleased")?,
                window_get_mouse_position: symbol(exports, "windowGetMousePosition")?,
                window_close: symbol(exports, "windowClose")?,

                context_get_version: symbol(exports, "contextGetVersion")?,
                context_get_vendor: symbol(exports, "contextGetVendor")?,
                context_clear: symbol(exports, "contextClear")?,
                context_viewport: symbol(exports, "contextViewport")?,
                context_ui_begin: symbol(exports, "contextUiBegin")?,
                context_ui_end: symbol(exports, "contextUiEnd")?,
                context_ui_create_window: symbol(exports, "contextUiCreateWindow")?,
                context_ui_create_text: symbol(exports, "contextUiCreateText")?,
                context_ui_create_color_editor: symbol(exports, "contextUiCreateColorEditor")?,

                context_shader_from_memory: symbol(exports, "contextShaderFromMemory")?,
                context_shader_from_file: symbol(exports, "contextShaderFromFile")?,
                context_shader_dispose: symbol(exports, "contextShaderDispose")?,
                context_shader_use: symbol(exports, "contextShaderUse")?,
                context_shader_uniform_1i: symbol(exports, "contextShaderUniform1i")?,
                context_shader_uniform_1f: symbol(exports, "contextShaderUniform1f")?,
                context_shader_uniform_3f: symbol(exports, "contextShaderUniform3f")?,
                context_shader_uniform_4f: symbol(exports, "contextShaderUniform4f")?,
                context_shader_uniform_matrix: symbol(exports, "contextShaderUniformMatrix")?,

                last_error,
            })
        }
    }
}

/// Forwards every call to the `ay` shared library.
///
/// The function pointers in `symbols` are only valid while `_library` is
/// loaded; both live and die together.
pub struct DylibNative {
    symbols: Symbols,
    // `None` only for entry points linked into this binary (tests).
    _library: Option<Library>,
}

impl DylibNative {
    /// Loads the library found through `config`.
    pub fn load(config: &LibraryConfig) -> Result<Self> {
        Self::open(config.resolve())
    }

    /// Loads the library at `path` and resolves every entry point.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading native library from {path:?}");

        // Loading runs the library's initializers.
        let library = unsafe { Library::new(path) }.map_err(|source| Error::LibraryLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let symbols = unsafe { Symbols::load(&library) }?;

        log::info!("loaded native library {path:?}");
        Ok(Self { symbols, _library: Some(library) })
    }
}

impl std::fmt::Debug for DylibNative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DylibNative").finish_non_exhaustive()
    }
}

impl NativeApi for DylibNative {
    fn window_new(&self, width: i32, height: i32) -> RawHandle {
        // Creation failure is reported as null rather than UB.
        unsafe { (self.symbols.window_new)(width, height) }
    }

    unsafe fn window_dispose(&self, window: RawHandle) {
        unsafe { (self.symbols.window_dispose)(window) }
    }

    unsafe fn window_is_open(&self, window: RawHandle) -> bool {
        unsafe { (self.symbols.window_is_open)(window) }
    }

    unsafe fn window_get_context(&self, window: RawHandle) -> RawHandle {
        unsafe { (self.symbols.window_get_context)(window) }
    }

    unsafe fn window_get_size(&self, window: RawHandle, width: *mut i32, height: *mut i32) {
        unsafe { (self.symbols.window_get_size)(window, width, height) }
    }

    unsafe fn window_key_pressed(&self, window: RawHandle, key: i32) -> bool {
        unsafe { (self.symbols.window_key_pressed)(window, key) }
    }

    unsafe fn window_key_released(&self, window: RawHandle, key: i32) -> bool {
        unsafe { (self.symbols.window_key_released)(window, key) }
    }

    unsafe fn window_get_mouse_position(&self, window: RawHandle, x: *mut f32, y: *mut f32) {
        unsafe { (self.symbols.window_get_mouse_position)(window, x, y) }
    }

    unsafe fn window_close(&self, window: RawHandle) {
        unsafe { (self.symbols.window_close)(window) }
    }

    unsafe fn context_get_version(&self, context: RawHandle) -> *const c_char {
        unsafe { (self.symbols.context_get_version)(context) }
    }

    unsafe fn context_get_vendor(&self, context: RawHandle) -> *const c_char {
        unsafe { (self.symbols.context_get_vendor)(context) }
    }

    unsafe fn context_clear(&self, context: RawHandle, color: *const f32) {
        unsafe { (self.symbols.context_clear)(context, color) }
    }

    unsafe fn context_viewport(&self, context: RawHandle, x: i32, y: i32, w: i32, h: i32) {
        unsafe { (self.symbols.context_viewport)(context, x, y, w, h) }
    }

    unsafe fn context_ui_begin(&self, context: RawHandle) {
        unsafe { (self.symbols.context_ui_begin)(context) }
    }

    unsafe fn context_ui_end(&self, context: RawHandle) {
        unsafe { (self.symbols.context_ui_end)(context) }
    }

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
    ) {
        unsafe {
            (self.symbols.context_ui_create_window)(context, name, draw, flags, pos_x, pos_y, size_x, size_y)
        }
    }

    unsafe fn context_ui_create_text(&self, context: RawHandle, color: *const f32, text: *const c_char) {
        unsafe { (self.symbols.context_ui_create_text)(context, color, text) }
    }

    unsafe fn context_ui_create_color_editor(&self, context: RawHandle, color: *mut f32, label: *const c_char) {
        unsafe { (self.symbols.context_ui_create_color_editor)(context, color, label) }
    }

    unsafe fn context_shader_from_memory(
        &self,
        context: RawHandle,
        name: *const c_char,
        vertex: *const c_char,
        fragment: *const c_char,
    ) -> Status {
        unsafe { (self.symbols.context_shader_from_memory)(context, name, vertex, fragment) }
    }

    unsafe fn context_shader_from_file(
        &self,
        context: RawHandle,
        name: *const c_char,
        vertex_path: *const c_char,
        fragment_path: *const c_char,
    ) -> Status {
        unsafe { (self.symbols.context_shader_from_file)(context, name, vertex_path, fragment_path) }
    }

    unsafe fn context_shader_dispose(&self, context: RawHandle, name: *const c_char) -> Status {
        unsafe { (self.symbols.context_shader_dispose)(context, name) }
    }

    unsafe fn context_shader_use(&self, context: RawHandle, name: *const c_char) -> Status {
        unsafe { (self.symbols.context_shader_use)(context, name) }
    }

    unsafe fn context_shader_uniform_1i(&self, context: RawHandle, name: *const c_char, value: i32) -> Status {
        unsafe { (self.symbols.context_shader_uniform_1i)(context, name, value) }
    }

    unsafe fn context_shader_uniform_1f(&self, context: RawHandle, name: *const c_char, value: f32) -> Status {
        unsafe { (self.symbols.context_shader_uniform_1f)(context, name, value) }
    }

    unsafe fn context_shader_uniform_3f(&self, context: RawHandle, name: *const c_char, value: *const f32) -> Status {
        unsafe { (self.symbols.context_shader_uniform_3f)(context, name, value) }
    }

    unsafe fn context_shader_uniform_4f(&self, context: RawHandle, name: *const c_char, value: *const f32) -> Status {
        unsafe { (self.symbols.context_shader_uniform_4f)(context, name, value) }
    }

    unsafe fn context_shader_uniform_matrix(&self, context: RawHandle, name: *const c_char, value: *const f32) -> Status {
        unsafe { (self.symbols.context_shader_uniform_matrix)(context, name, value) }
    }

    fn last_error(&self) -> *const c_char {
        match self.symbols.last_error {
            Some(last_error) => unsafe { last_error() },
            None => std::ptr::null(),
        }
    }
}

#[cfg(test)]
impl DylibNative {
    /// Resolves entry points from `exports` without loading a library.
    unsafe fn from_exports(exports: &impl Exports) -> Result<Self> {
        let symbols = unsafe { Symbols::load(exports) }?;
        Ok(Self { symbols, _library: None })
    }
}
