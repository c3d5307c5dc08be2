//! Catalog event bus and notification fan-out.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope.
//! - [`BusNotifier`]: the engine's notification sink, publishing one event
//!   per edit lifecycle step.
//! - [`NotificationFanout`]: background subscriber that turns edit events
//!   into per-user notification rows.

pub mod bus;
pub mod fanout;
pub mod notifier;

pub use bus::{EventBus, PlatformEvent};
pub use fanout::NotificationFanout;
pub use notifier::{BusNotifier, EditEventPayload};
