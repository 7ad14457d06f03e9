//! # Shared Bus - Notification Bus for Marketplace Events
//!
//! Every committed state change in the marketplace is announced here so that
//! indexers and user-facing layers can follow the lifecycle without polling.
//!
//! ```text
//! ┌──────────────────┐   publish() after commit   ┌──────────────┐
//! │  Marketplace     │ ─────────────────────────→ │  Event Bus   │ ──→ subscribe()
//! └──────────────────┘                            └──────────────┘
//! ```
//!
//! Events are only published after the originating operation committed, so a
//! subscriber never observes a notification for a rolled-back operation.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, MarketEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
