//! Module Message Broker
//!
//! The broker is the only channel between modules. The host attaches each
//! module when it is created; the module gets a [`BrokerHandle`] to publish
//! with, and the host keeps the matching [`Subscription`] to drive the
//! module's Receive entry point.
//!
//! # Overview
//!
//! - **Fan-out**: every message reaches every attached module except its publisher
//! - **Sequence Ordering**: one log with monotonic sequence numbers, so each
//!   subscriber observes messages in publication order
//! - **Independent Positions**: a slow module never holds up a fast one
//! - **Zero-copy Sharing**: messages are `Arc`-backed and cloned per reader
//! - **Detach**: after detach a module's handle refuses to publish and its
//!   subscription drains to `None`
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Module A   │     │   Module B   │     │     Host     │
//! └──────┬───────┘     └──────┬───────┘     └──────┬───────┘
//!        │ publish            │ publish            │ publish
//!        ▼                    ▼                    ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                         Broker                          │
//! │  ┌─────────────────────────────────────────────────┐   │
//! │  │                   MessageLog                    │   │
//! │  │  ┌───┬───┬───┬───┬───┬───┬───┬───┬───┬───┐   │   │
//! │  │  │ 1 │ 2 │ 3 │ 4 │ 5 │ 6 │ 7 │ 8 │ 9 │...│   │   │
//! │  │  └───┴───┴───┴───┴───┴───┴───┴───┴───┴───┘   │   │
//! │  │     ▲       ▲           ▲                      │   │
//! │  └─────┼───────┼───────────┼──────────────────────┘   │
//! └────────┼───────┼───────────┼────────────────────────────┘
//!          │ recv  │ recv      │ recv
//! ┌────────┴──┐ ┌──┴───────┐ ┌─┴────────┐
//! │ Sub(A)    │ │ Sub(B)   │ │ Sub(C)   │ (skip own publications)
//! └───────────┘ └──────────┘ └──────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use modgate::broker::Broker;
//! use modgate::message::Message;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let broker = Broker::create(1000);
//! let (handle, _own) = broker.attach("producer")?;
//! let (_, inbox) = broker.attach("consumer")?;
//!
//! handle.publish(Message::new("hello"))?;
//!
//! while let Some(message) = inbox.recv().await? {
//!     println!("Received: {:?}", message.content_str());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod handle;
mod internal;
mod manager;
mod subscription;

pub use error::{BrokerError, BrokerResult};
pub use handle::BrokerHandle;
pub use internal::LogStats;
pub use manager::{Broker, DEFAULT_CAPACITY};
pub use subscription::Subscription;
