//! Tests for configuration resolution priority

use serial_test::serial;
use std::path::{Path, PathBuf};

use xrplog_common::config::{
    database_path, resolve_root_folder, resolve_server_url, DEFAULT_SERVER_URL, ROOT_FOLDER_ENV,
    SERVER_URL_ENV,
};

// Environment variables are process-global, so these tests run serially.

#[test]
#[serial]
fn cli_argument_wins_over_environment() {
    std::env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");

    let resolved = resolve_root_folder(Some("/tmp/from-cli"));
    assert_eq!(resolved, PathBuf::from("/tmp/from-cli"));

    std::env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn environment_wins_when_no_cli_argument() {
    std::env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");

    let resolved = resolve_root_folder(None);
    assert_eq!(resolved, PathBuf::from("/tmp/from-env"));

    std::env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn server_url_falls_back_to_default() {
    std::env::remove_var(SERVER_URL_ENV);

    let url = resolve_server_url(None).unwrap();
    assert_eq!(url, DEFAULT_SERVER_URL);
}

#[test]
#[serial]
fn server_url_rejects_non_websocket_scheme() {
    assert!(resolve_server_url(Some("https://example.com")).is_err());
    assert!(resolve_server_url(Some("wss://example.com")).is_ok());
    assert!(resolve_server_url(Some("ws://localhost:6006")).is_ok());
}

#[test]
fn database_path_is_inside_root_folder() {
    let path = database_path(Path::new("/tmp/xrplog-root"));
    assert_eq!(path, PathBuf::from("/tmp/xrplog-root/xrplog.db"));
}
