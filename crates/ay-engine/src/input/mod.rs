//! Input subsystem.
//!
//! The native layer exposes raw polling only (key state, mouse position).
//! This module names the keys; queries live on [`Window`](crate::Window).

mod key;

pub use key::Key;
