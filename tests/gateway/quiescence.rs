//! Destroy never overlaps Receive

use crate::common::{probe, probe_config, probe_config_with, wait_for};
use modgate::gateway::{Gateway, GatewayError, GatewayEventType};
use modgate::message::Message;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_remove_waits_for_running_receive() {
    let probe = probe("quiescence-remove");
    let mut gateway = Gateway::new(100);
    gateway
        .add_static_module(
            "slow",
            "instrumented",
            Some(&probe_config_with("quiescence-remove", "receive_delay_ms = 50")),
        )
        .unwrap();

    let publisher = gateway.publisher();
    for i in 0..5 {
        publisher.publish(Message::new(i.to_string())).unwrap();
    }
    wait_for(|| probe.active.load(std::sync::atomic::Ordering::SeqCst) == 1).await;

    gateway.remove_module("slow").await.unwrap();
    assert_eq!(probe.destroyed(), 1);
    assert!(!probe.destroy_overlapped_receive.load(std::sync::atomic::Ordering::SeqCst));
    assert!(!probe.receive_after_destroy.load(std::sync::atomic::Ordering::SeqCst));
    assert!(gateway.module_state("slow").is_none());

    // The removed module is gone from the broker
    assert!(gateway.broker().attached_modules().unwrap().is_empty());
    let before = probe.received();
    publisher.publish(Message::new("late")).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(probe.received(), before);
}

#[tokio::test]
async fn test_remove_unknown_instance() {
    let mut gateway = Gateway::new(10);
    assert!(matches!(
        gateway.remove_module("ghost").await,
        Err(GatewayError::InstanceNotFound { .. })
    ));
}

#[tokio::test]
async fn test_shutdown_destroys_in_reverse_order() {
    let mut gateway = Gateway::new(100);
    let mut events = gateway.subscribe_events();
    for name in ["first", "second", "third"] {
        gateway
            .add_static_module(
                name,
                "instrumented",
                Some(&probe_config(&format!("quiescence-order-{}", name))),
            )
            .unwrap();
    }
    gateway.start().unwrap();
    gateway.shutdown().await;

    let mut destroyed = Vec::new();
    while let Ok(event) = events.try_recv() {
        if event.event_type == GatewayEventType::ModuleDestroyed {
            destroyed.push(event.instance);
        }
    }
    assert_eq!(destroyed, vec!["third", "second", "first"]);
    assert_eq!(gateway.module_count(), 0);

    // A shut down gateway accepts no new modules
    assert!(matches!(
        gateway.add_static_module("late", "instrumented", Some(&probe_config("quiescence-late"))),
        Err(GatewayError::ShutDown)
    ));
    assert!(matches!(gateway.start(), Err(GatewayError::ShutDown)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_under_load_is_quiescent() {
    let probes: Vec<_> = (0..3)
        .map(|i| probe(&format!("quiescence-load-{}", i)))
        .collect();
    let mut gateway = Gateway::new(1000);
    for i in 0..3 {
        gateway
            .add_static_module(
                &format!("m{}", i),
                "instrumented",
                Some(&probe_config_with(
                    &format!("quiescence-load-{}", i),
                    "receive_delay_ms = 2",
                )),
            )
            .unwrap();
    }
    let publisher = gateway.publisher();
    for i in 0..50 {
        publisher.publish(Message::new(i.to_string())).unwrap();
    }
    // Every module must be mid-delivery when teardown starts
    for probe in &probes {
        wait_for(|| {
            probe.active.load(std::sync::atomic::Ordering::SeqCst) == 1 || probe.received() > 0
        })
        .await;
    }
    gateway.shutdown().await;

    for probe in &probes {
        assert_eq!(probe.destroyed(), 1);
        assert!(!probe.destroy_overlapped_receive.load(std::sync::atomic::Ordering::SeqCst));
        assert!(!probe.receive_after_destroy.load(std::sync::atomic::Ordering::SeqCst));
        assert!(probe.max_active.load(std::sync::atomic::Ordering::SeqCst) <= 1);
        assert!(probe.received() >= 1);
    }
}

#[tokio::test]
async fn test_dropped_gateway_still_destroys_modules() {
    let probe = probe("quiescence-drop");
    let mut gateway = Gateway::new(10);
    gateway
        .add_static_module("dropped", "instrumented", Some(&probe_config("quiescence-drop")))
        .unwrap();
    drop(gateway);

    wait_for(|| probe.destroyed() == 1).await;
    assert_eq!(probe.created(), 1);
}
