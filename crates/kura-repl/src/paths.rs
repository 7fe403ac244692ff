//! XDG Base Directory paths for kura.
//!
//! | Purpose | XDG Variable | Default | kura Path |
//! |---------|--------------|---------|-----------|
//! | Store | `$XDG_DATA_HOME` | `~/.local/share` | `$XDG_DATA_HOME/kura/store/` |
//! | History | `$XDG_DATA_HOME` | `~/.local/share` | `$XDG_DATA_HOME/kura/history.txt` |
//! | Config | `$XDG_CONFIG_HOME` | `~/.config` | `$XDG_CONFIG_HOME/kura/config.toml` |

use std::path::PathBuf;

use directories::BaseDirs;

/// Get the data directory.
///
/// Uses `$XDG_DATA_HOME/kura` or falls back to `~/.local/share/kura`.
pub fn data_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".local").join("share"))
        .join("kura")
}

/// Get the config directory.
///
/// Uses `$XDG_CONFIG_HOME/kura` or falls back to `~/.config/kura`.
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".config"))
        .join("kura")
}

/// Default root of the directory-backed store.
pub fn store_dir() -> PathBuf {
    data_dir().join("store")
}

/// Line-editor history file.
pub fn history_path() -> PathBuf {
    data_dir().join("history.txt")
}

/// Default config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
