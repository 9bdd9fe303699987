//! Configuration
//!
//! petmed is configured from the environment only. `PETMED_DATABASE_PATH`
//! overrides the database file; `RUST_LOG` controls logging.

use std::path::{Path, PathBuf};

/// Environment variable holding the database file path
pub const DATABASE_PATH_ENV: &str = "PETMED_DATABASE_PATH";

/// Default tracing directive, added on top of `RUST_LOG`
pub const DEFAULT_LOG_DIRECTIVE: &str = "petmed=info";

/// Get the database path from environment or use default
pub fn database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));
            default_database_path(&exe_dir)
        })
}

/// `<project root>/data/petmed.db`, where a `target/{debug,release}`
/// executable directory is walked back up to the project root
pub fn default_database_path(exe_dir: &Path) -> PathBuf {
    let mut path = exe_dir.to_path_buf();

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(root) = path.parent().and_then(Path::parent) {
            path = root.to_path_buf();
        }
    }

    path.push("data");
    path.push("petmed.db");
    path
}
