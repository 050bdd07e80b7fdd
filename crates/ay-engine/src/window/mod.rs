//! Native window and its rendering context.
//!
//! A [`Window`] exclusively owns one [`Context`]. Disposing the window ends
//! the context too; both handles are tombstoned and later calls report
//! [`Error::Disposed`].

use std::rc::Rc;

use crate::context::Context;
use crate::coords::Vec2;
use crate::error::{Error, Result};
use crate::handle::{ContextHandle, WindowHandle};
use crate::input::Key;
use crate::native::{DylibNative, LibraryConfig, NativeApi, RawHandle, last_error_message};

/// Native window.
///
/// Thread-affine: create, use and dispose it on one thread.
pub struct Window {
    native: Rc<dyn NativeApi>,
    handle: WindowHandle,
    context: Context,
}

impl Window {
    /// Creates a window through `native` and binds its context.
    pub fn new(native: Rc<dyn NativeApi>, width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidSize { width, height });
        }

        let Some(handle) = WindowHandle::from_raw(native.window_new(width, height)) else {
            log::error!(
                "window creation failed ({width}x{height}): {}",
                last_error_message(&*native)
            );
            return Err(Error::WindowCreation { width, height });
        };

        let raw_window = handle.get()?;
        let Some(context) = ContextHandle::from_raw(unsafe { native.window_get_context(raw_window) }) else {
            log::error!("window has no rendering context: {}", last_error_message(&*native));
            if let Some(raw) = handle.take() {
                unsafe { native.window_dispose(raw) };
            }
            return Err(Error::ContextUnavailable);
        };

        let context = Context::new(native.clone(), context);
        log::info!(
            "window created ({width}x{height}), graphics {} / {}",
            context.version().unwrap_or_default(),
            context.vendor().unwrap_or_default(),
        );

        Ok(Self { native, handle, context })
    }

    /// Loads the native library described by `config` and opens a window.
    pub fn open(config: &LibraryConfig, width: i32, height: i32) -> Result<Self> {
        let native = DylibNative::load(config)?;
        Self::new(Rc::new(native), width, height)
    }

    fn raw(&self) -> Result<RawHandle> {
        self.handle.get()
    }

    /// The window's rendering context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Whether the window is still open. Also pumps native events.
    ///
    /// A disposed window reports `false`.
    pub fn is_open(&self) -> bool {
        match self.raw() {
            Ok(raw) => unsafe { self.native.window_is_open(raw) },
            Err(_) => false,
        }
    }

    /// Framebuffer size in pixels.
    pub fn size(&self) -> Result<(i32, i32)> {
        let raw = self.raw()?;
        let (mut width, mut height) = (0, 0);
        unsafe { self.native.window_get_size(raw, &mut width, &mut height) };
        Ok((width, height))
    }

    pub fn is_key_pressed(&self, key: Key) -> Result<bool> {
        let raw = self.raw()?;
        Ok(unsafe { self.native.window_key_pressed(raw, key.code()) })
    }

    pub fn is_key_released(&self, key: Key) -> Result<bool> {
        let raw = self.raw()?;
        Ok(unsafe { self.native.window_key_released(raw, key.code()) })
    }

    /// Cursor position in window coordinates.
    pub fn mouse_position(&self) -> Result<Vec2> {
        let raw = self.raw()?;
        let (mut x, mut y) = (0.0, 0.0);
        unsafe { self.native.window_get_mouse_position(raw, &mut x, &mut y) };
        Ok(Vec2::new(x, y))
    }

    /// Requests the window to close; `is_open` reports `false` afterwards.
    pub fn close(&self) -> Result<()> {
        let raw = self.raw()?;
        unsafe { self.native.window_close(raw) };
        Ok(())
    }

    /// Releases the native window and its context.
    ///
    /// A second call reports `Disposed`.
    pub fn dispose(&mut self) -> Result<()> {
        self.context.dispose();
        let raw = self.handle.take().ok_or(Error::Disposed("window"))?;
        unsafe { self.native.window_dispose(raw) };
        self.context.release_pins();
        log::info!("window disposed");
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_disposed()
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if !self.is_disposed() {
            if let Err(e) = self.dispose() {
                log::warn!("failed to dispose window: {e}");
            }
        }
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("handle", &self.handle)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
