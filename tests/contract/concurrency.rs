//! Receive concurrency tests

use crate::common::{probe, probe_config_with, v1_only_get_api, wait_for};
use modgate::broker::Broker;
use modgate::gateway::{Gateway, ModuleInstance};
use modgate::message::Message;
use modgate::module::{ModuleApi, ModuleApiVersion};
use std::sync::{Arc, Barrier};
use std::thread;

const WORKERS: usize = 8;

#[test]
fn test_concurrent_receive_is_never_reentrant() {
    let probe = probe("concurrency-threads");
    let api = ModuleApi::negotiate(v1_only_get_api, ModuleApiVersion::V1).unwrap();
    let broker = Broker::create(10);
    let (handle, _sub) = broker.attach("threads").unwrap();
    let instance = Arc::new(
        ModuleInstance::create(
            "threads",
            "instrumented",
            api,
            handle,
            Some(&probe_config_with(
                "concurrency-threads",
                "receive_delay_ms = 5",
            )),
        )
        .unwrap(),
    );

    let barrier = Arc::new(Barrier::new(WORKERS));
    let workers: Vec<_> = (0..WORKERS)
        .map(|i| {
            let instance = Arc::clone(&instance);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                instance
                    .receive(&Message::new(format!("worker-{}", i)))
                    .unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(probe.received(), WORKERS);
    assert_eq!(probe.max_active.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(!probe.spans_overlap());
    instance.destroy().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_gateway_delivery_is_serialized_per_instance() {
    let probe = probe("concurrency-gateway");
    let mut gateway = Gateway::new(1000);
    gateway
        .add_module(
            "serial",
            "instrumented",
            v1_only_get_api,
            Some(&probe_config_with(
                "concurrency-gateway",
                "receive_delay_ms = 2",
            )),
        )
        .unwrap();

    let publishers: Vec<_> = (0..4)
        .map(|p| {
            let publisher = gateway.publisher();
            thread::spawn(move || {
                for i in 0..10 {
                    publisher
                        .publish(Message::new(format!("{}-{}", p, i)))
                        .unwrap();
                }
            })
        })
        .collect();
    for publisher in publishers {
        publisher.join().unwrap();
    }

    wait_for(|| probe.received() == 40).await;
    assert_eq!(probe.max_active.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(!probe.spans_overlap());
    gateway.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_per_publisher_order_is_preserved() {
    let probe = probe("concurrency-order");
    let mut gateway = Gateway::new(1000);
    gateway
        .add_module(
            "ordered",
            "instrumented",
            v1_only_get_api,
            Some(&probe_config_with("concurrency-order", "")),
        )
        .unwrap();

    let publisher = gateway.publisher();
    for i in 0..25 {
        publisher.publish(Message::new(i.to_string())).unwrap();
    }
    wait_for(|| probe.received() == 25).await;

    let expected: Vec<String> = (0..25).map(|i| i.to_string()).collect();
    assert_eq!(probe.messages(), expected);
    gateway.shutdown().await;
}
