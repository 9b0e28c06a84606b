//! Gateway configuration file tests

use crate::common::probe;
use modgate::gateway::{resolve_config_path, ConfigError, Gateway, GatewayConfig, GatewayError};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_load_config_file() {
    let file = write_config(
        r#"
        [broker]
        capacity = 64

        [[modules]]
        name = "probe"
        module = "instrumented"
        [modules.args]
        probe = "config-file"
        "#,
    );

    let path = resolve_config_path(Some(file.path().to_path_buf()))
        .unwrap()
        .unwrap();
    let config = GatewayConfig::load(&path).await.unwrap();
    assert_eq!(config.broker.capacity, 64);
    assert_eq!(config.modules[0].module, "instrumented");

    let probe = probe("config-file");
    let mut gateway = Gateway::from_config(&config).await.unwrap();
    assert_eq!(gateway.broker().capacity(), 64);
    assert_eq!(probe.created(), 1);
    gateway.shutdown().await;
    assert_eq!(probe.destroyed(), 1);
}

#[tokio::test]
async fn test_invalid_file_reports_path() {
    let file = write_config("[[modules]]\nname = ");
    let err = GatewayConfig::load(file.path()).await.unwrap_err();
    match err {
        ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
        other => panic!("Expected Parse error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(matches!(
        GatewayConfig::load(&missing).await,
        Err(ConfigError::Io { .. })
    ));
    assert!(resolve_config_path(Some(missing)).is_err());
}

#[tokio::test]
async fn test_failed_module_unwinds_earlier_ones() {
    let file = write_config(
        r#"
        [[modules]]
        name = "first"
        module = "instrumented"
        [modules.args]
        probe = "config-unwind"

        [[modules]]
        name = "second"
        module = "instrumented"
        [modules.args]
        probe = "config-unwind-second"
        fail_create = true
        "#,
    );
    let config = GatewayConfig::load(file.path()).await.unwrap();
    let probe = probe("config-unwind");

    let err = Gateway::from_config(&config).await.unwrap_err();
    assert!(matches!(err, GatewayError::CreateFailed { .. }));
    assert_eq!(probe.created(), 1);
    assert_eq!(probe.destroyed(), 1);
}
