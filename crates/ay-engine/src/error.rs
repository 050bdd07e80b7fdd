use std::ffi::NulError;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the binding layer.
///
/// Native failures are propagated as-is; nothing here is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// The native library could not be opened.
    #[error("failed to load native library {path:?}: {source}")]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// The native library is missing a required entry point.
    #[error("native library does not export `{symbol}`")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: Option<libloading::Error>,
    },

    /// Window dimensions must be strictly positive.
    #[error("invalid window size {width}x{height}")]
    InvalidSize { width: i32, height: i32 },

    /// The windowing backend could not create a window.
    #[error("native window creation failed ({width}x{height})")]
    WindowCreation { width: i32, height: i32 },

    /// The window was created but exposes no rendering context.
    #[error("native window has no rendering context")]
    ContextUnavailable,

    /// No shader with this name exists in the context.
    #[error("shader `{0}` not found")]
    ShaderNotFound(String),

    /// The native side rejected the shader sources.
    #[error("shader `{name}` failed to build: {message}")]
    ShaderBuild { name: String, message: String },

    /// A handle was used after its owner was disposed.
    #[error("{0} used after dispose")]
    Disposed(&'static str),

    /// A string argument cannot be passed as a C string.
    #[error("string argument contains an interior NUL byte")]
    InteriorNul(#[from] NulError),

    /// Shader file paths are forwarded as UTF-8 C strings.
    #[error("path {0:?} is not valid UTF-8")]
    InvalidPath(PathBuf),

    /// Opaque native failure.
    #[error("native call `{call}` failed with status {status}: {message}")]
    Native {
        call: &'static str,
        status: i32,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
