//! Vector and matrix value types shared by the context and UI layers.
//!
//! All types are `#[repr(C)]` + `Pod`: their in-memory layout is the layout
//! the native side reads, so marshaling is a copy, never a conversion.

mod mat4;
mod vec2;
mod vec3;
mod vec4;

pub use mat4::Mat4;
pub use vec2::Vec2;
pub use vec3::Vec3;
pub use vec4::Vec4;
