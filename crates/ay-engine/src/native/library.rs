use std::path::{Path, PathBuf};

/// Environment variable holding an explicit library path.
pub const LIBRARY_ENV: &str = "AY_LIBRARY";

/// Environment variable holding an extra directory to search.
pub const LIBRARY_DIR_ENV: &str = "AY_LIBRARY_DIR";

/// Where to find the native `ay` shared library.
///
/// Resolution order:
/// 1. `path`, when set
/// 2. the platform file name inside each of `search_dirs`, first existing wins
/// 3. the bare platform file name, left to the system loader
#[derive(Debug, Clone, Default)]
pub struct LibraryConfig {
    pub path: Option<PathBuf>,
    pub search_dirs: Vec<PathBuf>,
}

impl LibraryConfig {
    /// Platform file name of the native library.
    pub fn file_name() -> String {
        format!("{}ay{}", std::env::consts::DLL_PREFIX, std::env::consts::DLL_SUFFIX)
    }

    /// Reads `AY_LIBRARY` and `AY_LIBRARY_DIR`.
    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os(LIBRARY_ENV).map(PathBuf::from),
            search_dirs: std::env::var_os(LIBRARY_DIR_ENV)
                .map(|dir| vec![PathBuf::from(dir)])
                .unwrap_or_default(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Resolves the path handed to the loader.
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }

        let name = Self::file_name();
        self.search_dirs
            .iter()
            .map(|dir| dir.join(&name))
            .find(|candidate| Path::exists(candidate))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let cfg = LibraryConfig::default()
            .with_search_dir(std::env::temp_dir())
            .with_path("/opt/ay/custom.so");
        assert_eq!(cfg.resolve(), PathBuf::from("/opt/ay/custom.so"));
    }

    #[test]
    fn falls_back_to_bare_file_name() {
        let cfg = LibraryConfig::default().with_search_dir("/definitely/not/here");
        assert_eq!(cfg.resolve(), PathBuf::from(LibraryConfig::file_name()));
    }

    #[test]
    fn file_name_is_platform_specific() {
        let name = LibraryConfig::file_name();
        assert!(name.contains("ay"));
        assert!(name.ends_with(std::env::consts::DLL_SUFFIX));
    }
}
