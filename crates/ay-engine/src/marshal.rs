//! Value marshaling across the native boundary.
//!
//! Two kinds of buffers cross the boundary:
//! - transient uploads: the native side only reads during the call. The value
//!   is copied into a call-scoped buffer that is dropped when the call returns
//!   ([`with_transient`]).
//! - retained buffers: the native side may keep the pointer and write into it
//!   across calls (UI color editors). The memory is owned by a
//!   [`RetainedColor`] whose address never changes, and reads always go back
//!   to that memory.
//!
//! Passing a transient buffer where a retained one is required is a
//! use-after-free on the native side; the two paths are separate types.

use std::cell::UnsafeCell;
use std::ffi::CString;
use std::fmt;
use std::rc::Rc;

use bytemuck::Pod;

use crate::coords::{Mat4, Vec2, Vec3, Vec4};
use crate::error::Result;
use crate::paint::Color;

/// Value with a fixed packed-`f32` layout understood by the native side.
pub trait Marshal: Pod {
    /// Number of `f32` lanes the native side reads.
    const LANES: usize;
}

impl Marshal for Vec2 {
    const LANES: usize = 2;
}

impl Marshal for Vec3 {
    const LANES: usize = 3;
}

impl Marshal for Vec4 {
    const LANES: usize = 4;
}

impl Marshal for Color {
    const LANES: usize = 4;
}

impl Marshal for Mat4 {
    const LANES: usize = 16;
}

/// The value viewed as its packed lanes, in native order.
#[inline]
pub fn lanes<T: Marshal>(value: &T) -> &[f32] {
    let lanes: &[f32] = bytemuck::cast_slice(std::slice::from_ref(value));
    debug_assert_eq!(lanes.len(), T::LANES);
    lanes
}

/// Runs `call` with a pointer to a call-scoped copy of `value`.
///
/// The pointer is valid only until `call` returns; the buffer is freed
/// immediately afterwards.
#[inline]
pub fn with_transient<T: Marshal, R>(value: &T, call: impl FnOnce(*const f32) -> R) -> R {
    let buffer: T = *value;
    call(lanes(&buffer).as_ptr())
}

/// Converts a string argument to a NUL-terminated buffer for one call.
pub fn c_string(s: &str) -> Result<CString> {
    Ok(CString::new(s)?)
}

#[repr(transparent)]
struct ColorCell(UnsafeCell<[f32; 4]>);

/// Color storage shared with native code.
///
/// Cloning shares the same memory. The buffer lives at a fixed heap address
/// for as long as any clone exists, so a native UI editor holding its pointer
/// can keep writing into it; [`get`](Self::get) re-reads that memory on every
/// call instead of caching.
#[derive(Clone)]
pub struct RetainedColor {
    cell: Rc<ColorCell>,
}

impl RetainedColor {
    pub fn new(color: Color) -> Self {
        Self {
            cell: Rc::new(ColorCell(UnsafeCell::new(color.to_array()))),
        }
    }

    /// Current value, as last written by either side.
    pub fn get(&self) -> Color {
        // Volatile: native code writes this memory behind the compiler's back.
        Color::from_array(unsafe { std::ptr::read_volatile(self.cell.0.get()) })
    }

    pub fn set(&self, color: Color) {
        unsafe { std::ptr::write_volatile(self.cell.0.get(), color.to_array()) }
    }

    /// Pointer handed to the native side. Stable for the buffer's lifetime.
    pub(crate) fn as_mut_ptr(&self) -> *mut f32 {
        self.cell.0.get().cast::<f32>()
    }

    /// Whether two values share the same buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl Default for RetainedColor {
    fn default() -> Self {
        Self::new(Color::default())
    }
}

impl From<Color> for RetainedColor {
    fn from(color: Color) -> Self {
        Self::new(color)
    }
}

impl fmt::Debug for RetainedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RetainedColor").field(&self.get()).finish()
    }
}
