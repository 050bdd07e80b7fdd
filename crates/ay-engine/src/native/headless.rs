use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::ffi::{CString, c_char};

use super::{
    NativeApi, RawHandle, STATUS_BUILD_FAILED, STATUS_IO, STATUS_NO_PROGRAM, STATUS_NOT_FOUND,
    STATUS_OK, Status, UiDrawFn, copy_c_str,
};
use crate::paint::Color;

const VERSION: &str = "OpenGL ES 3.2 (ay headless)";
const VENDOR: &str = "ay";

/// Uniform payload as read back from the marshaled buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

/// One recorded native call, with every pointer argument already read back.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    WindowNew { width: i32, height: i32 },
    WindowDispose,
    WindowClose,
    Clear { color: [f32; 4] },
    Viewport { x: i32, y: i32, w: i32, h: i32 },
    UiBegin,
    UiEnd,
    UiWindow { name: String, flags: i32, position: [f32; 2], size: [f32; 2] },
    UiText { text: String, color: [f32; 4] },
    UiColorEditor { label: String, color: [f32; 4] },
    ShaderFromMemory { name: String },
    ShaderFromFile { name: String, vertex: String, fragment: String },
    ShaderDispose { name: String },
    ShaderUse { name: String },
    Uniform { shader: String, name: String, value: UniformValue },
}

#[derive(Debug)]
struct WindowState {
    context: usize,
    width: i32,
    height: i32,
    open: bool,
    polls: u32,
}

#[derive(Debug, Default)]
struct ContextState {
    shaders: HashMap<String, Program>,
    active: Option<String>,
    in_ui_frame: bool,
}

#[derive(Debug, Clone)]
struct Program {
    vertex: String,
    fragment: String,
}

#[derive(Debug, Default)]
struct State {
    next_id: usize,
    windows: HashMap<usize, WindowState>,
    contexts: HashMap<usize, ContextState>,
    calls: Vec<NativeCall>,

    fail_next_window: bool,
    close_after: Option<u32>,
    keys_down: HashSet<i32>,
    mouse: (f32, f32),
    color_edits: HashMap<String, [f32; 4]>,
}

impl State {
    fn alloc_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process implementation of the native surface.
///
/// Behaves like the real library where the binding can observe it: handles
/// are opaque non-null values, shaders are keyed by name per context, draw
/// callbacks run synchronously inside `context_ui_create_window`, and
/// color editors write into the caller's buffer. Nothing is rendered.
///
/// Every call is recorded as a [`NativeCall`] for inspection.
#[derive(Debug)]
pub struct HeadlessNative {
    state: RefCell<State>,
    version: CString,
    vendor: CString,
    hide_driver_info: Cell<bool>,
    last_error: RefCell<Option<CString>>,
}

impl Default for HeadlessNative {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessNative {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State::default()),
            version: CString::new(VERSION).unwrap_or_default(),
            vendor: CString::new(VENDOR).unwrap_or_default(),
            hide_driver_info: Cell::new(false),
            last_error: RefCell::new(None),
        }
    }

    // ── scripting ─────────────────────────────────────────────────────────

    /// Makes the next `window_new` fail as if the backend could not initialize.
    pub fn fail_next_window(&self) {
        self.state.borrow_mut().fail_next_window = true;
    }

    /// Windows report open for `polls` calls to `window_is_open`, then closed.
    pub fn close_after(&self, polls: u32) {
        self.state.borrow_mut().close_after = Some(polls);
    }

    pub fn set_key_down(&self, key: i32, down: bool) {
        let mut state = self.state.borrow_mut();
        if down {
            state.keys_down.insert(key);
        } else {
            state.keys_down.remove(&key);
        }
    }

    pub fn set_mouse_position(&self, x: f32, y: f32) {
        self.state.borrow_mut().mouse = (x, y);
    }

    /// The next color editor labelled `label` writes `color` into its buffer,
    /// as if the user had picked it.
    pub fn queue_color_edit(&self, label: &str, color: Color) {
        self.state
            .borrow_mut()
            .color_edits
            .insert(label.to_string(), color.to_array());
    }

    /// `context_get_version` and `context_get_vendor` return null from now on.
    pub fn hide_driver_info(&self) {
        self.hide_driver_info.set(true);
    }

    // ── inspection ────────────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<NativeCall> {
        self.state.borrow().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<NativeCall> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    /// Number of windows created and not yet disposed.
    pub fn live_windows(&self) -> usize {
        self.state.borrow().windows.len()
    }

    /// Number of contexts still alive.
    pub fn live_contexts(&self) -> usize {
        self.state.borrow().contexts.len()
    }

    /// Shader names of the oldest live context, sorted.
    pub fn shader_names(&self) -> Vec<String> {
        let state = self.state.borrow();
        let mut names: Vec<String> = Self::first_context(&state)
            .map(|ctx| ctx.shaders.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Vertex and fragment sources of `name` in the oldest live context.
    pub fn shader_sources(&self, name: &str) -> Option<(String, String)> {
        let state = self.state.borrow();
        Self::first_context(&state)
            .and_then(|ctx| ctx.shaders.get(name))
            .map(|program| (program.vertex.clone(), program.fragment.clone()))
    }

    /// Active shader of the oldest live context.
    pub fn active_shader(&self) -> Option<String> {
        let state = self.state.borrow();
        Self::first_context(&state).and_then(|ctx| ctx.active.clone())
    }

    fn first_context(state: &State) -> Option<&ContextState> {
        state
            .contexts
            .keys()
            .min()
            .and_then(|id| state.contexts.get(id))
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn fail(&self, status: Status, message: impl Into<String>) -> Status {
        let message = message.into();
        log::debug!("headless native error {status}: {message}");
        *self.last_error.borrow_mut() = CString::new(message).ok();
        status
    }

    fn record(&self, call: NativeCall) {
        log::trace!("native call {call:?}");
        self.state.borrow_mut().calls.push(call);
    }

    fn with_context<R>(&self, context: RawHandle, f: impl FnOnce(&mut ContextState) -> R) -> Option<R> {
        let mut state = self.state.borrow_mut();
        match state.contexts.get_mut(&(context as usize)) {
            Some(ctx) => Some(f(ctx)),
            None => {
                log::warn!("headless native: unknown context handle {context:p}");
                None
            }
        }
    }

    fn build_program(&self, context: RawHandle, name: String, vertex: String, fragment: String) -> Status {
        if vertex.trim().is_empty() {
            return self.fail(STATUS_BUILD_FAILED, format!("shader `{name}`: vertex stage is empty"));
        }
        if fragment.trim().is_empty() {
            return self.fail(STATUS_BUILD_FAILED, format!("shader `{name}`: fragment stage is empty"));
        }

        // Same name replaces the previous program.
        self.with_context(context, |ctx| {
            ctx.shaders.insert(name, Program { vertex, fragment });
        })
        .map_or(STATUS_NOT_FOUND, |_| STATUS_OK)
    }

    fn upload(&self, context: RawHandle, name: *const c_char, value: UniformValue) -> Status {
        let name = unsafe { copy_c_str(name) }.unwrap_or_default();
        let active = self.with_context(context, |ctx| ctx.active.clone()).flatten();

        match active {
            Some(shader) => {
                self.record(NativeCall::Uniform { shader, name, value });
                STATUS_OK
            }
            None => self.fail(STATUS_NO_PROGRAM, format!("uniform `{name}`: no shader program bound")),
        }
    }
}

/// Reads `N` floats from a native buffer.
///
/// # Safety
///
/// `ptr` must point to at least `N` readable `f32`.
unsafe fn read_floats<const N: usize>(ptr: *const f32) -> [f32; N] {
    let mut out = [0.0f32; N];
    out.copy_from_slice(unsafe { std::slice::from_raw_parts(ptr, N) });
    out
}

impl NativeApi for HeadlessNative {
    fn window_new(&self, width: i32, height: i32) -> RawHandle {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::WindowNew { width, height });

        if std::mem::take(&mut state.fail_next_window) {
            drop(state);
            self.fail(STATUS_IO, "cannot initialize windowing backend");
            return std::ptr::null_mut();
        }

        let window = state.alloc_id();
        let context = state.alloc_id();
        state.contexts.insert(context, ContextState::default());
        state.windows.insert(window, WindowState { context, width, height, open: true, polls: 0 });
        window as RawHandle
    }

    unsafe fn window_dispose(&self, window: RawHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::WindowDispose);
        match state.windows.remove(&(window as usize)) {
            Some(w) => {
                state.contexts.remove(&w.context);
            }
            None => log::warn!("headless native: dispose of unknown window {window:p}"),
        }
    }

    unsafe fn window_is_open(&self, window: RawHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let close_after = state.close_after;
        let Some(w) = state.windows.get_mut(&(window as usize)) else {
            return false;
        };

        w.polls += 1;
        if close_after.is_some_and(|limit| w.polls > limit) {
            w.open = false;
        }
        w.open
    }

    unsafe fn window_get_context(&self, window: RawHandle) -> RawHandle {
        self.state
            .borrow()
            .windows
            .get(&(window as usize))
            .map_or(std::ptr::null_mut(), |w| w.context as RawHandle)
    }

    unsafe fn window_get_size(&self, window: RawHandle, width: *mut i32, height: *mut i32) {
        let state = self.state.borrow();
        let (w, h) = state
            .windows
            .get(&(window as usize))
            .map_or((0, 0), |w| (w.width, w.height));
        unsafe {
            width.write(w);
            height.write(h);
        }
    }

    unsafe fn window_key_pressed(&self, _window: RawHandle, key: i32) -> bool {
        self.state.borrow().keys_down.contains(&key)
    }

    unsafe fn window_key_released(&self, _window: RawHandle, key: i32) -> bool {
        !self.state.borrow().keys_down.contains(&key)
    }

    unsafe fn window_get_mouse_position(&self, _window: RawHandle, x: *mut f32, y: *mut f32) {
        let (mx, my) = self.state.borrow().mouse;
        unsafe {
            x.write(mx);
            y.write(my);
        }
    }

    unsafe fn window_close(&self, window: RawHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::WindowClose);
        // Closing twice is harmless.
        if let Some(w) = state.windows.get_mut(&(window as usize)) {
            w.open = false;
        }
    }

    unsafe fn context_get_version(&self, _context: RawHandle) -> *const c_char {
        if self.hide_driver_info.get() {
            return std::ptr::null();
        }
        self.version.as_ptr()
    }

    unsafe fn context_get_vendor(&self, _context: RawHandle) -> *const c_char {
        if self.hide_driver_info.get() {
            return std::ptr::null();
        }
        self.vendor.as_ptr()
    }

    unsafe fn context_clear(&self, _context: RawHandle, color: *const f32) {
        let color = unsafe { read_floats::<4>(color) };
        self.record(NativeCall::Clear { color });
    }

    unsafe fn context_viewport(&self, _context: RawHandle, x: i32, y: i32, w: i32, h: i32) {
        self.record(NativeCall::Viewport { x, y, w, h });
    }

    unsafe fn context_ui_begin(&self, context: RawHandle) {
        self.with_context(context, |ctx| ctx.in_ui_frame = true);
        self.record(NativeCall::UiBegin);
    }

    unsafe fn context_ui_end(&self, context: RawHandle) {
        self.with_context(context, |ctx| ctx.in_ui_frame = false);
        self.record(NativeCall::UiEnd);
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
        let name = unsafe { copy_c_str(name) }.unwrap_or_default();
        if self.with_context(context, |ctx| ctx.in_ui_frame) == Some(false) {
            log::warn!("headless native: ui window `{name}` declared outside a UI frame");
        }
        self.record(NativeCall::UiWindow {
            name,
            flags,
            position: [pos_x, pos_y],
            size: [size_x, size_y],
        });

        // No borrow is held here: the callback re-enters this object.
        unsafe { draw() };
    }

    unsafe fn context_ui_create_text(&self, _context: RawHandle, color: *const f32, text: *const c_char) {
        let color = unsafe { read_floats::<4>(color) };
        let text = unsafe { copy_c_str(text) }.unwrap_or_default();
        self.record(NativeCall::UiText { text, color });
    }

    unsafe fn context_ui_create_color_editor(&self, _context: RawHandle, color: *mut f32, label: *const c_char) {
        let label = unsafe { copy_c_str(label) }.unwrap_or_default();
        let current = unsafe { read_floats::<4>(color) };
        self.record(NativeCall::UiColorEditor { label: label.clone(), color: current });

        let edit = self.state.borrow_mut().color_edits.remove(&label);
        if let Some(edit) = edit {
            unsafe { std::slice::from_raw_parts_mut(color, 4) }.copy_from_slice(&edit);
        }
    }

    unsafe fn context_shader_from_memory(
        &self,
        context: RawHandle,
        name: *const c_char,
        vertex: *const c_char,
        fragment: *const c_char,
    ) -> Status {
        let (name, vertex, fragment) = unsafe {
            (
                copy_c_str(name).unwrap_or_default(),
                copy_c_str(vertex).unwrap_or_default(),
                copy_c_str(fragment).unwrap_or_default(),
            )
        };
        self.record(NativeCall::ShaderFromMemory { name: name.clone() });
        self.build_program(context, name, vertex, fragment)
    }

    unsafe fn context_shader_from_file(
        &self,
        context: RawHandle,
        name: *const c_char,
        vertex_path: *const c_char,
        fragment_path: *const c_char,
    ) -> Status {
        let (name, vertex_path, fragment_path) = unsafe {
            (
                copy_c_str(name).unwrap_or_default(),
                copy_c_str(vertex_path).unwrap_or_default(),
                copy_c_str(fragment_path).unwrap_or_default(),
            )
        };
        self.record(NativeCall::ShaderFromFile {
            name: name.clone(),
            vertex: vertex_path.clone(),
            fragment: fragment_path.clone(),
        });

        let read = |path: &str| {
            std::fs::read_to_string(path).map_err(|e| format!("cannot read `{path}`: {e}"))
        };
        match (read(&vertex_path), read(&fragment_path)) {
            (Ok(vertex), Ok(fragment)) => self.build_program(context, name, vertex, fragment),
            (Err(message), _) | (_, Err(message)) => self.fail(STATUS_IO, message),
        }
    }

    unsafe fn context_shader_dispose(&self, context: RawHandle, name: *const c_char) -> Status {
        let name = unsafe { copy_c_str(name) }.unwrap_or_default();
        self.record(NativeCall::ShaderDispose { name: name.clone() });

        let removed = self.with_context(context, |ctx| {
            let removed = ctx.shaders.remove(&name).is_some();
            if removed && ctx.active.as_deref() == Some(name.as_str()) {
                ctx.active = None;
            }
            removed
        });
        match removed {
            Some(true) => STATUS_OK,
            _ => self.fail(STATUS_NOT_FOUND, format!("shader `{name}` not found")),
        }
    }

    unsafe fn context_shader_use(&self, context: RawHandle, name: *const c_char) -> Status {
        let name = unsafe { copy_c_str(name) }.unwrap_or_default();
        self.record(NativeCall::ShaderUse { name: name.clone() });

        let selected = self.with_context(context, |ctx| {
            if ctx.shaders.contains_key(&name) {
                ctx.active = Some(name.clone());
                true
            } else {
                false
            }
        });
        match selected {
            Some(true) => STATUS_OK,
            _ => self.fail(STATUS_NOT_FOUND, format!("shader `{name}` not found")),
        }
    }

    unsafe fn context_shader_uniform_1i(&self, context: RawHandle, name: *const c_char, value: i32) -> Status {
        self.upload(context, name, UniformValue::Int(value))
    }

    unsafe fn context_shader_uniform_1f(&self, context: RawHandle, name: *const c_char, value: f32) -> Status {
        self.upload(context, name, UniformValue::Float(value))
    }

    unsafe fn context_shader_uniform_3f(&self, context: RawHandle, name: *const c_char, value: *const f32) -> Status {
        let value = unsafe { read_floats::<3>(value) };
        self.upload(context, name, UniformValue::Vec3(value))
    }

    unsafe fn context_shader_uniform_4f(&self, context: RawHandle, name: *const c_char, value: *const f32) -> Status {
        let value = unsafe { read_floats::<4>(value) };
        self.upload(context, name, UniformValue::Vec4(value))
    }

    unsafe fn context_shader_uniform_matrix(&self, context: RawHandle, name: *const c_char, value: *const f32) -> Status {
        let value = unsafe { read_floats::<16>(value) };
        self.upload(context, name, UniformValue::Mat4(value))
    }

    fn last_error(&self) -> *const c_char {
        self.last_error
            .borrow()
            .as_ref()
            .map_or(std::ptr::null(), |msg| msg.as_ptr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_owns_one_context() {
        let native = HeadlessNative::new();
        let window = native.window_new(640, 480);
        assert!(!window.is_null());

        let context = unsafe { native.window_get_context(window) };
        assert!(!context.is_null());
        assert_ne!(window, context);
        assert_eq!(native.live_contexts(), 1);

        unsafe { native.window_dispose(window) };
        assert_eq!(native.live_windows(), 0);
        assert_eq!(native.live_contexts(), 0);
    }

    #[test]
    fn failed_window_returns_null_with_message() {
        let native = HeadlessNative::new();
        native.fail_next_window();
        assert!(native.window_new(10, 10).is_null());
        assert!(!native.last_error().is_null());
        // Only the next creation fails.
        assert!(!native.window_new(10, 10).is_null());
    }

    #[test]
    fn close_after_counts_polls() {
        let native = HeadlessNative::new();
        native.close_after(2);
        let window = native.window_new(10, 10);
        unsafe {
            assert!(native.window_is_open(window));
            assert!(native.window_is_open(window));
            assert!(!native.window_is_open(window));
        }
    }

    #[test]
    fn size_is_written_through_out_params() {
        let native = HeadlessNative::new();
        let window = native.window_new(1280, 900);
        let (mut w, mut h) = (0, 0);
        unsafe { native.window_get_size(window, &mut w, &mut h) };
        assert_eq!((w, h), (1280, 900));
    }
}
