//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Public ledger server used when no URL is configured anywhere
pub const DEFAULT_SERVER_URL: &str = "wss://s1.ripple.com";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "XRPLOG_ROOT_FOLDER";

/// Environment variable overriding the server URL
pub const SERVER_URL_ENV: &str = "XRPLOG_SERVER_URL";

/// Resolve the root folder holding the log database, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. `XRPLOG_ROOT_FOLDER` environment variable
/// 3. `root_folder` key in the TOML config file
/// 4. OS-dependent default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        return PathBuf::from(path);
    }

    if let Some(path) = config_file_value("root_folder") {
        return PathBuf::from(path);
    }

    default_root_folder()
}

/// Resolve the WebSocket server URL with the same four-tier priority as
/// [`resolve_root_folder`]. Fails when the resolved value is not a
/// `ws://` or `wss://` URL.
pub fn resolve_server_url(cli_arg: Option<&str>) -> Result<String> {
    let url = cli_arg
        .map(String::from)
        .or_else(|| std::env::var(SERVER_URL_ENV).ok())
        .or_else(|| config_file_value("server_url"))
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

    if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(url)
    } else {
        Err(Error::Config(format!(
            "Server URL must use ws:// or wss:// scheme: {url}"
        )))
    }
}

/// Path of the log database inside the root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join("xrplog.db")
}

/// Read a string value from the TOML config file, if one exists
fn config_file_value(key: &str) -> Option<String> {
    let path = find_config_file()?;
    let content = std::fs::read_to_string(path).ok()?;
    let config = toml::from_str::<toml::Value>(&content).ok()?;

    config.get(key).and_then(|v| v.as_str()).map(String::from)
}

/// Locate the config file: `<config dir>/xrplog/config.toml` first, then
/// `/etc/xrplog/config.toml` on unix
fn find_config_file() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join("xrplog").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system = PathBuf::from("/etc/xrplog/config.toml");
        if system.exists() {
            return Some(system);
        }
    }

    None
}

fn default_root_folder() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("xrplog"))
        .unwrap_or_else(|| PathBuf::from("."))
}
