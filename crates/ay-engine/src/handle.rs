//! Typed handles to native objects.
//!
//! A [`Handle`] wraps the opaque pointer returned by the native library and
//! never hands it to application code. Disposing the owner tombstones the
//! handle; every later access reports [`Error::Disposed`] instead of passing
//! a dangling pointer across the boundary.

use std::cell::Cell;
use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::error::{Error, Result};
use crate::native::RawHandle;

/// Kind marker for a handle.
pub trait HandleKind {
    const NAME: &'static str;
}

#[derive(Debug)]
pub enum WindowKind {}

impl HandleKind for WindowKind {
    const NAME: &'static str = "window";
}

#[derive(Debug)]
pub enum ContextKind {}

impl HandleKind for ContextKind {
    const NAME: &'static str = "context";
}

/// Native window handle.
pub type WindowHandle = Handle<WindowKind>;

/// Native rendering context handle.
pub type ContextHandle = Handle<ContextKind>;

/// Opaque, thread-affine reference to a native object.
///
/// States: live (`Some`) or tombstoned (`None`). The transition is one-way.
pub struct Handle<K: HandleKind> {
    raw: Cell<Option<NonNull<c_void>>>,
    // Native handles are bound to the creating thread: !Send + !Sync.
    _kind: PhantomData<(K, *const ())>,
}

impl<K: HandleKind> Handle<K> {
    /// Wraps a pointer returned by the native side; `None` for null.
    pub(crate) fn from_raw(raw: RawHandle) -> Option<Self> {
        NonNull::new(raw).map(|ptr| Self {
            raw: Cell::new(Some(ptr)),
            _kind: PhantomData,
        })
    }

    /// Raw pointer for a native call, or `Disposed` after tombstoning.
    pub(crate) fn get(&self) -> Result<RawHandle> {
        self.raw
            .get()
            .map(NonNull::as_ptr)
            .ok_or(Error::Disposed(K::NAME))
    }

    /// Tombstones the handle, returning the pointer exactly once.
    pub(crate) fn take(&self) -> Option<RawHandle> {
        self.raw.take().map(NonNull::as_ptr)
    }

    pub fn is_disposed(&self) -> bool {
        self.raw.get().is_none()
    }
}

impl<K: HandleKind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.raw.get() {
            Some(ptr) => write!(f, "{}({:p})", K::NAME, ptr),
            None => write!(f, "{}(disposed)", K::NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake(addr: usize) -> RawHandle {
        addr as RawHandle
    }

    #[test]
    fn null_is_rejected() {
        assert!(WindowHandle::from_raw(std::ptr::null_mut()).is_none());
    }

    #[test]
    fn take_tombstones_once() {
        let h = ContextHandle::from_raw(fake(0x10)).unwrap();
        assert_eq!(h.get().unwrap(), fake(0x10));
        assert_eq!(h.take(), Some(fake(0x10)));
        assert_eq!(h.take(), None);
        assert!(h.is_disposed());
    }

    #[test]
    fn disposed_handle_reports_its_kind() {
        let h = WindowHandle::from_raw(fake(0x20)).unwrap();
        h.take();
        match h.get() {
            Err(Error::Disposed(kind)) => assert_eq!(kind, "window"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(format!("{h:?}"), "window(disposed)");
    }
}
