//! Model cache discovery
//!
//! Picks the directory fastembed downloads model artifacts into.

use std::ffi::OsString;
use std::path::PathBuf;

/// Find the model cache directory with priority:
/// 1. EMBEDSEARCH_MODELS_PATH environment variable
/// 2. FASTEMBED_CACHE_PATH environment variable (fastembed's own)
/// 3. User home directory (~/.embedsearch/models)
/// 4. `.fastembed_cache` in the working directory
///
/// The directory does not have to exist yet; fastembed creates it on the
/// first download.
pub fn find_model_cache_dir() -> PathBuf {
    resolve_cache_dir(
        std::env::var_os("EMBEDSEARCH_MODELS_PATH"),
        std::env::var_os("FASTEMBED_CACHE_PATH"),
        std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")),
    )
}

fn resolve_cache_dir(
    models_path: Option<OsString>,
    fastembed_path: Option<OsString>,
    home: Option<OsString>,
) -> PathBuf {
    if let Some(path) = models_path.filter(|p| !p.is_empty()) {
        let path = PathBuf::from(path);
        log::info!("Using EMBEDSEARCH_MODELS_PATH: {}", path.display());
        return path;
    }

    if let Some(path) = fastembed_path.filter(|p| !p.is_empty()) {
        let path = PathBuf::from(path);
        log::info!("Using FASTEMBED_CACHE_PATH: {}", path.display());
        return path;
    }

    if let Some(home) = home {
        return PathBuf::from(home).join(".embedsearch").join("models");
    }

    log::warn!("No home directory found, caching models in .fastembed_cache");
    PathBuf::from(".fastembed_cache")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_models_path_wins() {
        let dir = resolve_cache_dir(
            Some("/opt/models".into()),
            Some("/tmp/fastembed".into()),
            Some("/home/u".into()),
        );
        assert_eq!(dir, PathBuf::from("/opt/models"));
    }

    #[test]
    fn test_fastembed_path_before_home() {
        let dir = resolve_cache_dir(None, Some("/tmp/fastembed".into()), Some("/home/u".into()));
        assert_eq!(dir, PathBuf::from("/tmp/fastembed"));
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let dir = resolve_cache_dir(Some("".into()), Some("".into()), Some("/home/u".into()));
        assert_eq!(dir, PathBuf::from("/home/u/.embedsearch/models"));
    }

    #[test]
    fn test_fallback_without_home() {
        assert_eq!(
            resolve_cache_dir(None, None, None),
            PathBuf::from(".fastembed_cache")
        );
    }
}
