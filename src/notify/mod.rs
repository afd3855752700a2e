//! Configuration change notification.
//!
//! Subscribers are told about every successful publish; with the
//! `file-watch` feature a [`ConfigWatcher`] turns file changes into reloads.

pub mod subscriber;
#[cfg(feature = "file-watch")]
pub mod watcher;

pub use subscriber::{SubscriberRegistry, SubscriptionHandle};
#[cfg(feature = "file-watch")]
pub use watcher::ConfigWatcher;
