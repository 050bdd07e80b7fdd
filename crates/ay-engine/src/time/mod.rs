//! Frame timing for the caller's render loop.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
