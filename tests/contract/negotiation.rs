//! GetApi negotiation tests

use crate::common::{probe, probe_config, v1_only_get_api};
use modgate::gateway::{Gateway, GatewayError, GatewayEventType};
use modgate::module::{
    find_static_module, ModuleApi, ModuleApiTable, ModuleApiV1, ModuleApiVersion,
    NegotiationError,
};

#[test]
fn test_every_known_version_negotiates() {
    for &version in ModuleApiVersion::KNOWN {
        let table = v1_only_get_api(version).expect("table for known version");
        assert!(table.version() <= version);
        let v1 = table.as_v1().unwrap();
        assert!(v1.create.is_some());
        assert!(v1.destroy.is_some());
        assert!(v1.receive.is_some());
    }
}

#[test]
fn test_forward_versions_fail() {
    for raw in [2, 3, 100, u32::MAX] {
        assert!(v1_only_get_api(ModuleApiVersion::new(raw)).is_none(), "v{}", raw);
    }
}

#[test]
fn test_get_api_is_idempotent() {
    let first = v1_only_get_api(ModuleApiVersion::V1).unwrap();
    let second = v1_only_get_api(ModuleApiVersion::V1).unwrap();
    assert!(std::ptr::eq(first, second));
    assert_eq!(first.version(), second.version());
}

#[test]
fn test_v1_table_shape() {
    let table = v1_only_get_api(ModuleApiVersion::V1).unwrap();
    assert!(matches!(table, ModuleApiTable::V1(ModuleApiV1 { start: None, .. })));

    let api = ModuleApi::negotiate(v1_only_get_api, ModuleApiVersion::V1).unwrap();
    assert_eq!(api.version(), ModuleApiVersion::V1);
    assert!(!api.has_start());
}

#[test]
fn test_exported_module_has_start() {
    let entry = find_static_module("instrumented").unwrap();
    let api = ModuleApi::negotiate(entry.get_api, ModuleApiVersion::CURRENT).unwrap();
    assert!(api.has_start());

    let raw = ModuleApi::negotiate_raw(entry.get_api_raw, ModuleApiVersion::CURRENT).unwrap();
    assert_eq!(raw.version(), api.version());
    assert!(matches!(
        ModuleApi::negotiate_raw(entry.get_api_raw, ModuleApiVersion::new(2)),
        Err(NegotiationError::NoTable { .. })
    ));
}

#[tokio::test]
async fn test_v2_request_never_creates() {
    let probe = probe("negotiation-v2");
    let mut gateway = Gateway::new(10).with_requested_version(ModuleApiVersion::new(2));
    let mut events = gateway.subscribe_events();

    let result = gateway.add_module(
        "future",
        "instrumented",
        v1_only_get_api,
        Some(&probe_config("negotiation-v2")),
    );

    match result {
        Err(GatewayError::Negotiation { module, source }) => {
            assert_eq!(module, "future");
            assert_eq!(
                source,
                NegotiationError::NoTable {
                    requested: ModuleApiVersion::new(2)
                }
            );
        }
        other => panic!("Expected Negotiation error, got {:?}", other),
    }
    assert_eq!(probe.created(), 0);
    assert!(gateway.module_state("future").is_none());
    assert!(gateway.broker().attached_modules().unwrap().is_empty());
    assert_eq!(
        events.recv().await.unwrap().event_type,
        GatewayEventType::NegotiationFailed
    );
}
