//! Test utilities for handler tests.

use crate::config::{Config, StorageConfig};
use axum_test::TestServer;
use std::path::Path;

pub fn create_test_config(root: &Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        enable_otel_export: false,
        storage: StorageConfig {
            root: root.to_path_buf(),
            ..Default::default()
        },
    }
}

/// Build the full router over a scratch storage root
pub fn create_test_app(root: &Path) -> TestServer {
    crate::Application::new(create_test_config(root))
        .expect("Failed to create application")
        .into_test_server()
}
