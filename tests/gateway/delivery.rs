//! Message fan-out through the gateway

use crate::common::{probe, probe_config, probe_config_with, wait_for};
use modgate::gateway::{Gateway, GatewayError, ModuleState};
use modgate::message::Message;
use std::time::Duration;

#[tokio::test]
async fn test_every_module_receives_host_messages() {
    let first = probe("delivery-fanout-a");
    let second = probe("delivery-fanout-b");
    let mut gateway = Gateway::new(100);
    gateway
        .add_static_module("a", "instrumented", Some(&probe_config("delivery-fanout-a")))
        .unwrap();
    gateway
        .add_static_module("b", "instrumented", Some(&probe_config("delivery-fanout-b")))
        .unwrap();
    gateway.start().unwrap();

    let publisher = gateway.publisher();
    publisher.publish(Message::new("one")).unwrap();
    publisher.publish(Message::new("two")).unwrap();

    wait_for(|| first.received() == 2 && second.received() == 2).await;
    assert_eq!(first.messages(), vec!["one", "two"]);
    assert_eq!(second.messages(), vec!["one", "two"]);
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_module_does_not_receive_its_own_messages() {
    let talker = probe("delivery-own-talker");
    let listener = probe("delivery-own-listener");
    let mut gateway = Gateway::new(100);
    gateway
        .add_static_module(
            "talker",
            "instrumented",
            Some(&probe_config_with(
                "delivery-own-talker",
                "publish_on_start = \"ping\"",
            )),
        )
        .unwrap();
    gateway
        .add_static_module(
            "listener",
            "instrumented",
            Some(&probe_config("delivery-own-listener")),
        )
        .unwrap();
    gateway.start().unwrap();

    wait_for(|| listener.received() == 1).await;
    assert_eq!(listener.messages(), vec!["ping"]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(talker.received(), 0);
    assert_eq!(talker.started(), 1);
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_module_added_after_start_is_started() {
    let late = probe("delivery-late");
    let mut gateway = Gateway::new(100);
    gateway.start().unwrap();
    gateway
        .add_static_module("late", "instrumented", Some(&probe_config("delivery-late")))
        .unwrap();

    assert_eq!(late.started(), 1);
    assert_eq!(gateway.module_state("late"), Some(ModuleState::Started));
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_failed_create_is_not_wired() {
    let healthy = probe("delivery-healthy");
    let mut gateway = Gateway::new(100);
    gateway
        .add_static_module("healthy", "instrumented", Some(&probe_config("delivery-healthy")))
        .unwrap();

    let result = gateway.add_static_module(
        "broken",
        "instrumented",
        Some(&probe_config_with("delivery-broken", "fail_create = true")),
    );
    assert!(matches!(result, Err(GatewayError::CreateFailed { .. })));
    assert_eq!(gateway.module_names(), vec!["healthy"]);
    assert_eq!(
        gateway.broker().attached_modules().unwrap(),
        vec!["healthy".to_string()]
    );

    gateway.publisher().publish(Message::new("after")).unwrap();
    wait_for(|| healthy.received() == 1).await;
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_unknown_and_duplicate_modules_are_rejected() {
    let mut gateway = Gateway::new(100);
    assert!(matches!(
        gateway.add_static_module("x", "no_such_module", None),
        Err(GatewayError::UnknownModule { .. })
    ));

    gateway
        .add_static_module("dup", "instrumented", Some(&probe_config("delivery-dup")))
        .unwrap();
    assert!(matches!(
        gateway.add_static_module("dup", "instrumented", Some(&probe_config("delivery-dup"))),
        Err(GatewayError::DuplicateInstance { .. })
    ));
    assert_eq!(probe("delivery-dup").created(), 1);
    gateway.shutdown().await;
}
