//! Bridge for UI draw closures invoked by native code.
//!
//! The native UI layer takes a bare `void (*)(void)` draw callback with no
//! user data and runs it synchronously, on the calling thread, before the
//! registering call returns. The closure therefore lives in a stack frame
//! owned by [`with_draw_callback`]; that frame is pushed on a thread-local
//! stack for the duration of the native call, and a single trampoline runs
//! whichever frame is on top. Nested registrations (a window declared inside
//! another window's closure) push their own frame above the outer one. No
//! callback outlives its call; each frame re-registers fresh closures.
//!
//! Unwinding must not cross an `extern "C"` frame. Panics inside the closure
//! are caught by the trampoline and resumed once the native call returns;
//! errors returned by the closure are propagated the same way.

use std::any::Any;
use std::cell::RefCell;
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{Error, Result};
use crate::native::UiDrawFn;

type DrawClosure<'a> = dyn FnMut() -> Result<()> + 'a;

struct CallbackFrame<'a> {
    draw: &'a mut DrawClosure<'a>,
    error: Option<Error>,
    panic: Option<Box<dyn Any + Send + 'static>>,
}

thread_local! {
    // Type-erased `*mut CallbackFrame`, innermost registration last.
    static FRAMES: RefCell<Vec<*mut c_void>> = const { RefCell::new(Vec::new()) };
}

/// Pops the frame pushed by [`with_draw_callback`], also on unwind.
struct FrameGuard;

impl Drop for FrameGuard {
    fn drop(&mut self) {
        let _ = FRAMES.try_with(|frames| frames.borrow_mut().pop());
    }
}

unsafe extern "C" fn trampoline() {
    // The borrow is released before the closure runs: it may register
    // nested callbacks.
    let top = FRAMES
        .try_with(|frames| frames.borrow().last().copied())
        .ok()
        .flatten();
    let Some(top) = top else {
        log::error!("UI draw callback invoked outside its registering call");
        return;
    };
    let frame = unsafe { &mut *top.cast::<CallbackFrame<'_>>() };

    // After a failure the native side may still call again; skip the closure
    // so only the first failure is reported.
    if frame.error.is_some() || frame.panic.is_some() {
        return;
    }

    match panic::catch_unwind(AssertUnwindSafe(|| (frame.draw)())) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => frame.error = Some(err),
        Err(payload) => frame.panic = Some(payload),
    }
}

/// Exposes `draw` to native code for the duration of `call`.
///
/// `call` receives the trampoline and must pass it to the native entry point.
/// Once it returns, the first error produced by `draw` is returned, or its
/// panic is resumed.
pub fn with_draw_callback<F, R>(draw: &mut F, call: impl FnOnce(UiDrawFn) -> R) -> Result<R>
where
    F: FnMut() -> Result<()>,
{
    let draw: &mut DrawClosure<'_> = draw;
    let mut frame = CallbackFrame { draw, error: None, panic: None };

    let out = {
        let ptr = (&mut frame as *mut CallbackFrame<'_>).cast::<c_void>();
        FRAMES.with(|frames| frames.borrow_mut().push(ptr));
        let _guard = FrameGuard;
        call(trampoline)
    };

    if let Some(payload) = frame.panic.take() {
        panic::resume_unwind(payload);
    }
    match frame.error.take() {
        Some(err) => Err(err),
        None => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stands in for a native entry point that runs the callback `times` times.
    fn native_invoke(draw: UiDrawFn, times: usize) -> usize {
        for _ in 0..times {
            unsafe { draw() };
        }
        times
    }

    fn depth() -> usize {
        FRAMES.with(|frames| frames.borrow().len())
    }

    #[test]
    fn closure_runs_inside_the_call() {
        let mut hits = 0;
        let mut draw = || {
            hits += 1;
            Ok(())
        };
        let out = with_draw_callback(&mut draw, |f| native_invoke(f, 1)).unwrap();
        assert_eq!(out, 1);
        assert_eq!(hits, 1);
        assert_eq!(depth(), 0);
    }

    #[test]
    fn closure_not_invoked_is_fine() {
        let mut hits = 0;
        let mut draw = || {
            hits += 1;
            Ok(())
        };
        with_draw_callback(&mut draw, |f| native_invoke(f, 0)).unwrap();
        assert_eq!(hits, 0);
    }

    #[test]
    fn nested_registrations_run_their_own_closure() {
        let mut order = Vec::new();
        let mut outer = || {
            order.push("outer");
            let mut inner = || {
                assert_eq!(depth(), 2);
                Ok(())
            };
            with_draw_callback(&mut inner, |f| native_invoke(f, 1))?;
            assert_eq!(depth(), 1);
            Ok(())
        };
        with_draw_callback(&mut outer, |f| native_invoke(f, 1)).unwrap();
        order.push("done");
        assert_eq!(order, ["outer", "done"]);
        assert_eq!(depth(), 0);
    }

    #[test]
    fn first_error_is_propagated_after_the_call() {
        let mut hits = 0;
        let mut draw = || {
            hits += 1;
            Err(Error::ShaderNotFound("missing".into()))
        };
        let result = with_draw_callback(&mut draw, |f| native_invoke(f, 3));
        assert!(matches!(result, Err(Error::ShaderNotFound(name)) if name == "missing"));
        assert_eq!(hits, 1);
        assert_eq!(depth(), 0);
    }

    #[test]
    fn panic_is_resumed_after_the_call() {
        let mut returned = false;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut draw = || -> Result<()> { panic!("boom") };
            with_draw_callback(&mut draw, |f| native_invoke(f, 1)).ok();
            returned = true;
        }));
        assert!(result.is_err());
        assert!(!returned);
        assert_eq!(depth(), 0);
    }

    #[test]
    fn stray_invocation_is_ignored() {
        unsafe { trampoline() };
        assert_eq!(depth(), 0);
    }
}
