use std::ffi::c_char;

use crate::coords::{Mat4, Vec3, Vec4};
use crate::marshal::with_transient;
use crate::native::{NativeApi, RawHandle, Status};

mod sealed {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
    impl Sealed for crate::coords::Vec3 {}
    impl Sealed for crate::coords::Vec4 {}
    impl Sealed for crate::coords::Mat4 {}
}

/// Value kinds accepted by [`Context::shader_uniform`](super::Context::shader_uniform).
///
/// Each kind selects its own native entry point. Arity mismatches against the
/// shader's declared uniform are detected (if at all) by the native side.
pub trait Uniform: sealed::Sealed {
    /// Native entry point used for this kind.
    const ENTRY_POINT: &'static str;

    /// # Safety
    ///
    /// `context` must be a live context of `native`; `name` a C string.
    #[doc(hidden)]
    unsafe fn upload(&self, native: &dyn NativeApi, context: RawHandle, name: *const c_char) -> Status;
}

impl Uniform for i32 {
    const ENTRY_POINT: &'static str = "contextShaderUniform1i";

    unsafe fn upload(&self, native: &dyn NativeApi, context: RawHandle, name: *const c_char) -> Status {
        unsafe { native.context_shader_uniform_1i(context, name, *self) }
    }
}

impl Uniform for f32 {
    const ENTRY_POINT: &'static str = "contextShaderUniform1f";

    unsafe fn upload(&self, native: &dyn NativeApi, context: RawHandle, name: *const c_char) -> Status {
        unsafe { native.context_shader_uniform_1f(context, name, *self) }
    }
}

impl Uniform for Vec3 {
    const ENTRY_POINT: &'static str = "contextShaderUniform3f";

    unsafe fn upload(&self, native: &dyn NativeApi, context: RawHandle, name: *const c_char) -> Status {
        with_transient(self, |ptr| unsafe { native.context_shader_uniform_3f(context, name, ptr) })
    }
}

impl Uniform for Vec4 {
    const ENTRY_POINT: &'static str = "contextShaderUniform4f";

    unsafe fn upload(&self, native: &dyn NativeApi, context: RawHandle, name: *const c_char) -> Status {
        with_transient(self, |ptr| unsafe { native.context_shader_uniform_4f(context, name, ptr) })
    }
}

impl Uniform for Mat4 {
    const ENTRY_POINT: &'static str = "contextShaderUniformMatrix";

    // Column-major, untransposed.
    unsafe fn upload(&self, native: &dyn NativeApi, context: RawHandle, name: *const c_char) -> Status {
        with_transient(self, |ptr| unsafe { native.context_shader_uniform_matrix(context, name, ptr) })
    }
}
