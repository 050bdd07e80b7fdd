//! Rendering context façade.
//!
//! A [`Context`] is owned by its [`Window`](crate::Window) and shares its
//! lifetime: it is created with the window and tombstoned when the window is
//! disposed. Per frame the caller is expected to run
//! `clear → viewport → ui_begin → {ui declarations}* → ui_end`; the order is
//! not validated here, calls are forwarded as issued.
//!
//! Shaders are addressed by name within one context. The native side owns the
//! name → program table; this type only mirrors which name is active.

mod flags;
mod uniform;

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

pub use flags::{UiWindow, WindowFlags};
pub use uniform::Uniform;

use crate::callback::with_draw_callback;
use crate::error::{Error, Result};
use crate::handle::ContextHandle;
use crate::marshal::{RetainedColor, c_string, with_transient};
use crate::native::{
    NativeApi, RawHandle, STATUS_BUILD_FAILED, STATUS_NOT_FOUND, STATUS_OK, Status, copy_c_str,
    last_error_message,
};
use crate::paint::Color;

const NULL_STRING: &str = "native call returned a null string";

/// Retained color buffers handed to native color editors.
///
/// A buffer stays pinned for the frame it was declared in and the following
/// one, and until the window is disposed.
#[derive(Debug, Default)]
struct Pins {
    current: Vec<RetainedColor>,
    previous: Vec<RetainedColor>,
}

impl Pins {
    fn pin(&mut self, color: &RetainedColor) {
        if !self.current.iter().any(|c| c.ptr_eq(color)) {
            self.current.push(color.clone());
        }
    }

    fn rotate(&mut self) {
        self.previous = std::mem::take(&mut self.current);
    }

    fn len(&self) -> usize {
        self.current.len() + self.previous.len()
    }
}

/// Rendering context of a window.
pub struct Context {
    native: Rc<dyn NativeApi>,
    handle: ContextHandle,
    active_shader: RefCell<Option<String>>,
    pins: RefCell<Pins>,
}

impl Context {
    pub(crate) fn new(native: Rc<dyn NativeApi>, handle: ContextHandle) -> Self {
        Self {
            native,
            handle,
            active_shader: RefCell::new(None),
            pins: RefCell::new(Pins::default()),
        }
    }

    /// Tombstones the handle. Retained buffers stay pinned until
    /// [`release_pins`](Self::release_pins), after the native side is gone.
    pub(crate) fn dispose(&self) {
        self.handle.take();
        self.active_shader.borrow_mut().take();
    }

    pub(crate) fn release_pins(&self) {
        let mut pins = self.pins.borrow_mut();
        pins.current.clear();
        pins.previous.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_disposed()
    }

    fn raw(&self) -> Result<RawHandle> {
        self.handle.get()
    }

    fn native_error(&self, call: &'static str, status: Status) -> Error {
        let message = last_error_message(&*self.native);
        log::error!("{call} failed with status {status}: {message}");
        Error::Native { call, status, message }
    }

    // ── info ──────────────────────────────────────────────────────────────

    // A null string sets no native error; `last_error` may be stale here.
    fn null_string(call: &'static str) -> Error {
        log::error!("{call} returned a null string");
        Error::Native {
            call,
            status: -1,
            message: NULL_STRING.to_string(),
        }
    }

    /// Graphics API version string reported by the driver.
    pub fn version(&self) -> Result<String> {
        let raw = self.raw()?;
        unsafe { copy_c_str(self.native.context_get_version(raw)) }
            .ok_or_else(|| Self::null_string("contextGetVersion"))
    }

    /// Graphics driver vendor string.
    pub fn vendor(&self) -> Result<String> {
        let raw = self.raw()?;
        unsafe { copy_c_str(self.native.context_get_vendor(raw)) }
            .ok_or_else(|| Self::null_string("contextGetVendor"))
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Clears color and depth buffers.
    pub fn clear(&self, color: Color) -> Result<()> {
        let raw = self.raw()?;
        log::trace!("clear {color:?}");
        with_transient(&color, |ptr| unsafe { self.native.context_clear(raw, ptr) });
        Ok(())
    }

    pub fn viewport(&self, x: i32, y: i32, width: i32, height: i32) -> Result<()> {
        let raw = self.raw()?;
        log::trace!("viewport ({x}, {y}, {width}, {height})");
        unsafe { self.native.context_viewport(raw, x, y, width, height) };
        Ok(())
    }

    // ── ui ────────────────────────────────────────────────────────────────

    /// Starts a UI frame.
    pub fn ui_begin(&self) -> Result<()> {
        let raw = self.raw()?;
        self.pins.borrow_mut().rotate();
        unsafe { self.native.context_ui_begin(raw) };
        Ok(())
    }

    /// Ends the UI frame and renders it.
    pub fn ui_end(&self) -> Result<()> {
        let raw = self.raw()?;
        unsafe { self.native.context_ui_end(raw) };
        Ok(())
    }

    /// Declares a UI window for this frame.
    ///
    /// `draw` runs once, synchronously, inside this call and may declare
    /// widgets (`ui_create_text`, `ui_create_color_editor`, nested windows).
    /// The first error it returns is propagated after the native call
    /// completes.
    pub fn ui_create_window<F>(&self, name: &str, window: impl Into<UiWindow>, mut draw: F) -> Result<()>
    where
        F: FnMut() -> Result<()>,
    {
        let raw = self.raw()?;
        let window = window.into();
        let c_name = c_string(name)?;
        log::trace!("ui window `{name}` {window:?}");

        with_draw_callback(&mut draw, |trampoline| unsafe {
            self.native.context_ui_create_window(
                raw,
                c_name.as_ptr(),
                trampoline,
                window.flags.bits(),
                window.position.x,
                window.position.y,
                window.size.x,
                window.size.y,
            )
        })
    }

    /// Declares a colored text widget.
    pub fn ui_create_text(&self, text: &str, color: Color) -> Result<()> {
        let raw = self.raw()?;
        let c_text = c_string(text)?;
        with_transient(&color, |ptr| unsafe {
            self.native.context_ui_create_text(raw, ptr, c_text.as_ptr())
        });
        Ok(())
    }

    /// Declares a color editor bound to shared memory.
    ///
    /// The native editor may write into `color` during this call or later in
    /// the frame; read the result with [`RetainedColor::get`].
    pub fn ui_create_color_editor(&self, label: &str, color: &RetainedColor) -> Result<()> {
        let raw = self.raw()?;
        let c_label = c_string(label)?;
        self.pins.borrow_mut().pin(color);
        unsafe {
            self.native
                .context_ui_create_color_editor(raw, color.as_mut_ptr(), c_label.as_ptr())
        };
        Ok(())
    }

    /// Declares a color editor and returns the edited value.
    ///
    /// The buffer only lives for this call: use it with native editors that
    /// write synchronously. Otherwise use
    /// [`ui_create_color_editor`](Self::ui_create_color_editor).
    pub fn ui_edit_color(&self, label: &str, color: Color) -> Result<Color> {
        let raw = self.raw()?;
        let c_label = c_string(label)?;
        let mut buffer = color.to_array();
        unsafe {
            self.native
                .context_ui_create_color_editor(raw, buffer.as_mut_ptr(), c_label.as_ptr())
        };
        Ok(Color::from_array(buffer))
    }

    /// Number of retained color buffers currently pinned.
    pub fn pinned_colors(&self) -> usize {
        self.pins.borrow().len()
    }

    // ── shaders ───────────────────────────────────────────────────────────

    fn check_shader(&self, call: &'static str, name: &str, status: Status) -> Result<()> {
        match status {
            STATUS_OK => Ok(()),
            STATUS_NOT_FOUND => {
                log::warn!("{call}: shader `{name}` not found");
                Err(Error::ShaderNotFound(name.to_string()))
            }
            STATUS_BUILD_FAILED => Err(Error::ShaderBuild {
                name: name.to_string(),
                message: last_error_message(&*self.native),
            }),
            other => Err(self.native_error(call, other)),
        }
    }

    /// Builds a shader program from inline sources under `name`.
    ///
    /// Reusing a name is resolved by the native side.
    pub fn shader_from_source(&self, name: &str, vertex: &str, fragment: &str) -> Result<()> {
        let raw = self.raw()?;
        let (c_name, c_vertex, c_fragment) = (c_string(name)?, c_string(vertex)?, c_string(fragment)?);
        let status = unsafe {
            self.native.context_shader_from_memory(
                raw,
                c_name.as_ptr(),
                c_vertex.as_ptr(),
                c_fragment.as_ptr(),
            )
        };
        self.check_shader("contextShaderFromMemory", name, status)?;
        log::info!("shader `{name}` built from source");
        Ok(())
    }

    /// Builds a shader program from source files read by the native side.
    pub fn shader_from_file(&self, name: &str, vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) -> Result<()> {
        let raw = self.raw()?;
        let path_arg = |path: &Path| {
            path.to_str()
                .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))
                .and_then(c_string)
        };
        let (vertex, fragment) = (vertex.as_ref(), fragment.as_ref());
        let (c_name, c_vertex, c_fragment) = (c_string(name)?, path_arg(vertex)?, path_arg(fragment)?);

        let status = unsafe {
            self.native.context_shader_from_file(
                raw,
                c_name.as_ptr(),
                c_vertex.as_ptr(),
                c_fragment.as_ptr(),
            )
        };
        self.check_shader("contextShaderFromFile", name, status)?;
        log::info!("shader `{name}` built from {vertex:?} and {fragment:?}");
        Ok(())
    }

    /// Deletes the program registered under `name`.
    pub fn shader_dispose(&self, name: &str) -> Result<()> {
        let raw = self.raw()?;
        let c_name = c_string(name)?;
        let status = unsafe { self.native.context_shader_dispose(raw, c_name.as_ptr()) };
        self.check_shader("contextShaderDispose", name, status)?;

        let mut active = self.active_shader.borrow_mut();
        if active.as_deref() == Some(name) {
            *active = None;
        }
        Ok(())
    }

    /// Selects the program for subsequent uniform uploads and draws.
    ///
    /// An unknown name reports `ShaderNotFound` and leaves the active program
    /// unchanged.
    pub fn shader_use(&self, name: &str) -> Result<()> {
        let raw = self.raw()?;
        let c_name = c_string(name)?;
        let status = unsafe { self.native.context_shader_use(raw, c_name.as_ptr()) };
        self.check_shader("contextShaderUse", name, status)?;
        *self.active_shader.borrow_mut() = Some(name.to_string());
        Ok(())
    }

    /// Name of the program selected by the last successful `shader_use`.
    pub fn active_shader(&self) -> Option<String> {
        self.active_shader.borrow().clone()
    }

    /// Uploads a uniform to the active program.
    ///
    /// The entry point is chosen by the value's kind (`i32`, `f32`, `Vec3`,
    /// `Vec4`, `Mat4`).
    pub fn shader_uniform<U: Uniform>(&self, name: &str, value: U) -> Result<()> {
        let raw = self.raw()?;
        let c_name = c_string(name)?;
        log::trace!("{} `{name}`", U::ENTRY_POINT);
        let status = unsafe { value.upload(&*self.native, raw, c_name.as_ptr()) };
        match status {
            STATUS_OK => Ok(()),
            other => Err(self.native_error(U::ENTRY_POINT, other)),
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("handle", &self.handle)
            .field("active_shader", &self.active_shader.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Mat4, Vec2, Vec3, Vec4};
    use crate::native::{HeadlessNative, NativeCall, UniformValue};
    use crate::window::Window;

    fn headless() -> (Rc<HeadlessNative>, Window) {
        let native = Rc::new(HeadlessNative::new());
        let window = Window::new(native.clone(), 1280, 900).unwrap();
        native.take_calls();
        (native, window)
    }

    const VS: &str = "void main() { gl_Position = vec4(0.0); }";
    const FS: &str = "void main() {}";

    // ── frame scenario ────────────────────────────────────────────────────

    #[test]
    fn info_window_frame() {
        let (native, window) = headless();
        let ctx = window.context();

        ctx.clear(Color::BLACK).unwrap();
        ctx.viewport(0, 0, 1280, 900).unwrap();
        ctx.ui_begin().unwrap();
        ctx.ui_create_window("info", WindowFlags::empty(), || {
            ctx.ui_create_text("FPS: 60.00", Color::WHITE)
        })
        .unwrap();
        ctx.ui_end().unwrap();

        assert_eq!(
            native.calls(),
            vec![
                NativeCall::Clear { color: [0.0, 0.0, 0.0, 1.0] },
                NativeCall::Viewport { x: 0, y: 0, w: 1280, h: 900 },
                NativeCall::UiBegin,
                NativeCall::UiWindow {
                    name: "info".into(),
                    flags: 0,
                    position: [0.0, 0.0],
                    size: [0.0, 0.0],
                },
                NativeCall::UiText { text: "FPS: 60.00".into(), color: [1.0, 1.0, 1.0, 1.0] },
                NativeCall::UiEnd,
            ]
        );
    }

    #[test]
    fn ui_window_forwards_flags_position_and_size() {
        let (native, window) = headless();
        let ctx = window.context();
        let placement = UiWindow::default()
            .with_flags(WindowFlags::NO_DECORATION | WindowFlags::ALWAYS_AUTO_RESIZE)
            .at(Vec2::new(10.0, 20.0))
            .sized(Vec2::new(300.0, 200.0));

        ctx.ui_begin().unwrap();
        ctx.ui_create_window("stats", placement, || Ok(())).unwrap();
        ctx.ui_end().unwrap();

        let calls = native.calls();
        assert!(calls.contains(&NativeCall::UiWindow {
            name: "stats".into(),
            flags: 1 | 2 | 8 | 32 | 64,
            position: [10.0, 20.0],
            size: [300.0, 200.0],
        }));
    }

    #[test]
    fn nested_windows_are_reentrant() {
        let (native, window) = headless();
        let ctx = window.context();

        ctx.ui_begin().unwrap();
        ctx.ui_create_window("outer", UiWindow::default(), || {
            ctx.ui_create_text("a", Color::RED)?;
            ctx.ui_create_window("inner", UiWindow::default(), || ctx.ui_create_text("b", Color::GREEN))?;
            ctx.ui_create_text("c", Color::BLUE)
        })
        .unwrap();
        ctx.ui_end().unwrap();

        let texts: Vec<String> = native
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                NativeCall::UiText { text, .. } => Some(text),
                NativeCall::UiWindow { name, .. } => Some(format!("[{name}]")),
                _ => None,
            })
            .collect();
        assert_eq!(texts, ["[outer]", "a", "[inner]", "b", "c"]);
    }

    #[test]
    fn draw_error_is_propagated() {
        let (_native, window) = headless();
        let ctx = window.context();
        ctx.ui_begin().unwrap();
        let err = ctx
            .ui_create_window("bad", UiWindow::default(), || ctx.ui_create_text("nul\0byte", Color::WHITE))
            .unwrap_err();
        assert!(matches!(err, Error::InteriorNul(_)));
        ctx.ui_end().unwrap();
    }

    // ── color editors ─────────────────────────────────────────────────────

    #[test]
    fn retained_color_sees_editor_writes() {
        let (native, window) = headless();
        let ctx = window.context();
        let color = RetainedColor::new(Color::BLACK);

        native.queue_color_edit("clear color", Color::new(0.2, 0.4, 0.6, 1.0));
        ctx.ui_begin().unwrap();
        ctx.ui_create_window("settings", UiWindow::default(), || {
            ctx.ui_create_color_editor("clear color", &color)
        })
        .unwrap();
        ctx.ui_end().unwrap();

        assert_eq!(color.get(), Color::new(0.2, 0.4, 0.6, 1.0));
        assert!(native.calls().contains(&NativeCall::UiColorEditor {
            label: "clear color".into(),
            color: [0.0, 0.0, 0.0, 1.0],
        }));
    }

    #[test]
    fn retained_colors_stay_pinned_for_two_frames() {
        let (_native, window) = headless();
        let ctx = window.context();
        let color = RetainedColor::new(Color::WHITE);

        ctx.ui_begin().unwrap();
        ctx.ui_create_color_editor("tint", &color).unwrap();
        ctx.ui_create_color_editor("tint", &color).unwrap();
        ctx.ui_end().unwrap();
        assert_eq!(ctx.pinned_colors(), 1);

        ctx.ui_begin().unwrap();
        ctx.ui_end().unwrap();
        assert_eq!(ctx.pinned_colors(), 1);

        ctx.ui_begin().unwrap();
        ctx.ui_end().unwrap();
        assert_eq!(ctx.pinned_colors(), 0);
    }

    #[test]
    fn edit_color_returns_the_new_value() {
        let (native, window) = headless();
        let ctx = window.context();
        native.queue_color_edit("tint", Color::RED);
        assert_eq!(ctx.ui_edit_color("tint", Color::BLUE).unwrap(), Color::RED);
        assert_eq!(ctx.ui_edit_color("tint", Color::BLUE).unwrap(), Color::BLUE);
    }

    // ── shaders ───────────────────────────────────────────────────────────

    #[test]
    fn use_of_missing_shader_keeps_active_program() {
        let (native, window) = headless();
        let ctx = window.context();
        ctx.shader_from_source("basic", VS, FS).unwrap();
        ctx.shader_use("basic").unwrap();

        let err = ctx.shader_use("missing").unwrap_err();
        assert!(matches!(err, Error::ShaderNotFound(ref n) if n == "missing"));
        assert_eq!(ctx.active_shader().as_deref(), Some("basic"));
        assert_eq!(native.active_shader().as_deref(), Some("basic"));
    }

    #[test]
    fn use_of_missing_shader_on_empty_context() {
        let (_native, window) = headless();
        let ctx = window.context();
        assert!(matches!(ctx.shader_use("missing"), Err(Error::ShaderNotFound(_))));
        assert_eq!(ctx.active_shader(), None);
    }

    #[test]
    fn dispose_removes_one_entry() {
        let (native, window) = headless();
        let ctx = window.context();
        ctx.shader_from_source("a", VS, FS).unwrap();
        ctx.shader_from_source("b", VS, FS).unwrap();
        ctx.shader_use("a").unwrap();

        ctx.shader_dispose("a").unwrap();
        assert_eq!(native.shader_names(), ["b"]);
        assert_eq!(ctx.active_shader(), None);
        assert!(matches!(ctx.shader_use("a"), Err(Error::ShaderNotFound(_))));
        assert!(matches!(ctx.shader_dispose("a"), Err(Error::ShaderNotFound(_))));
    }

    #[test]
    fn build_failure_carries_native_message() {
        let (_native, window) = headless();
        let ctx = window.context();
        match ctx.shader_from_source("broken", "", FS) {
            Err(Error::ShaderBuild { name, message }) => {
                assert_eq!(name, "broken");
                assert!(message.contains("vertex"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn shader_from_file_reads_both_stages() {
        let (native, window) = headless();
        let ctx = window.context();
        let dir = std::env::temp_dir().join(format!("ay-engine-shaders-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let (vs, fs) = (dir.join("basic.vert"), dir.join("basic.frag"));
        std::fs::write(&vs, VS).unwrap();
        std::fs::write(&fs, FS).unwrap();

        ctx.shader_from_file("basic", &vs, &fs).unwrap();
        assert_eq!(native.shader_names(), ["basic"]);
        assert_eq!(native.shader_sources("basic"), Some((VS.to_string(), FS.to_string())));

        let missing = dir.join("missing.frag");
        let err = ctx.shader_from_file("other", &vs, &missing).unwrap_err();
        assert!(matches!(err, Error::Native { call: "contextShaderFromFile", .. }), "{err}");

        std::fs::remove_dir_all(&dir).ok();
    }

    // ── uniforms ──────────────────────────────────────────────────────────

    fn uniforms(native: &HeadlessNative) -> Vec<(String, UniformValue)> {
        native
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                NativeCall::Uniform { name, value, .. } => Some((name, value)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn uniform_kind_selects_entry_point() {
        let (native, window) = headless();
        let ctx = window.context();
        ctx.shader_from_source("basic", VS, FS).unwrap();
        ctx.shader_use("basic").unwrap();

        ctx.shader_uniform("count", 3).unwrap();
        ctx.shader_uniform("time", 0.5f32).unwrap();
        ctx.shader_uniform("light", Vec3::new(1.0, 2.0, 3.0)).unwrap();
        ctx.shader_uniform("tint", Vec4::new(0.1, 0.2, 0.3, 0.4)).unwrap();

        assert_eq!(
            uniforms(&native),
            vec![
                ("count".to_string(), UniformValue::Int(3)),
                ("time".to_string(), UniformValue::Float(0.5)),
                ("light".to_string(), UniformValue::Vec3([1.0, 2.0, 3.0])),
                ("tint".to_string(), UniformValue::Vec4([0.1, 0.2, 0.3, 0.4])),
            ]
        );
    }

    #[test]
    fn matrix_upload_preserves_column_major_order() {
        let (native, window) = headless();
        let ctx = window.context();
        ctx.shader_from_source("basic", VS, FS).unwrap();
        ctx.shader_use("basic").unwrap();

        let mvp = Mat4::perspective_rh(1.2, 16.0 / 9.0, 0.1, 100.0)
            * Mat4::translation(Vec3::new(1.0, -2.0, -5.0));
        ctx.shader_uniform("mvp", mvp).unwrap();

        let uploads: [(String, UniformValue); 1] = uniforms(&native).try_into().unwrap();
        let [(name, UniformValue::Mat4(read_back))] = uploads else {
            panic!("expected one matrix upload");
        };
        assert_eq!(name, "mvp");
        assert_eq!(read_back, mvp.to_cols_array());
        assert_eq!(Mat4::from_cols_array(&read_back), mvp);
    }

    #[test]
    fn uniform_without_program_is_a_native_error() {
        let (_native, window) = headless();
        let ctx = window.context();
        let err = ctx.shader_uniform("time", 1.0f32).unwrap_err();
        assert!(matches!(err, Error::Native { call: "contextShaderUniform1f", .. }), "{err}");
    }

    // ── info ──────────────────────────────────────────────────────────────

    #[test]
    fn version_and_vendor_are_copied() {
        let (_native, window) = headless();
        assert!(window.context().version().unwrap().contains("OpenGL"));
        assert_eq!(window.context().vendor().unwrap(), "ay");
    }

    #[test]
    fn null_driver_strings_do_not_report_stale_errors() {
        let (native, window) = headless();
        let ctx = window.context();
        // Leaves a "shader not found" message behind on the native side.
        assert!(ctx.shader_use("missing").is_err());
        native.hide_driver_info();

        for (result, expected) in [
            (ctx.version(), "contextGetVersion"),
            (ctx.vendor(), "contextGetVendor"),
        ] {
            match result {
                Err(Error::Native { call, status, message }) => {
                    assert_eq!(call, expected);
                    assert_eq!(status, -1);
                    assert_eq!(message, NULL_STRING);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }
}
