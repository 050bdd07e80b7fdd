//! Color model shared between the context and UI layers.

pub mod color;

pub use color::Color;
