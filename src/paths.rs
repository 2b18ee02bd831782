/// Path resolution for installed and development runs.
///
/// An installed binary keeps its config and exports in the platform's user
/// directories; during development (`cargo run`) everything stays under the
/// working directory.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "ar_measure";

/// Environment variable that forces the installed layout.
const INSTALLED_ENV: &str = "AR_MEASURE_INSTALLED";

/// Returns `true` when running as an installed application rather than from
/// a source checkout.
pub fn is_installed() -> bool {
    std::env::var_os(INSTALLED_ENV).is_some()
}

/// Base directory; the working directory in development.
pub fn base_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Assets directory (`assets/`), where Bevy's AssetPlugin looks.
pub fn assets_dir() -> PathBuf {
    base_dir().join("assets")
}

/// Configuration directory.
///
/// - **Installed**: `<platform config dir>/ar_measure/`
/// - **Dev**: current working directory
pub fn config_dir() -> PathBuf {
    if is_installed() {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR)
    } else {
        base_dir()
    }
}

/// Data directory for exported measurements.
///
/// - **Linux**: `~/.local/share/ar_measure/data/`
/// - **macOS**: `~/Library/Application Support/ar_measure/data/`
/// - **Windows**: `%APPDATA%\ar_measure\data\`
///
/// In development this is `<cwd>/tmp/`.
pub fn data_dir() -> PathBuf {
    if is_installed() {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(APP_DIR)
            .join("data")
    } else {
        base_dir().join("tmp")
    }
}

/// Ensure a directory exists, creating it and all parents if necessary.
/// Returns the path unchanged for chaining.
pub fn ensure_dir(path: &Path) -> &Path {
    let _ = std::fs::create_dir_all(path);
    path
}
