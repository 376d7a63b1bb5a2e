//! Notification bridge: delivers offers, reminders, and payout notices.
//!
//! The dispatch path only publishes [`DispatchEvent`]s; a background
//! listener task forwards them to a [`NotificationBridge`]
//! implementation. Delivery is fire-and-forget — a failed or slow
//! notification never propagates back into the dispatch path.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::domain::{DispatchEvent, EventBus};

/// Outbound message delivery contract.
///
/// Implementations wrap SMS/email providers; the gateway ships a
/// tracing-backed default for environments without one.
#[async_trait]
pub trait NotificationBridge: Send + Sync + std::fmt::Debug {
    /// Delivers a notification for the given event. Must not panic;
    /// failures are the implementation's to swallow and log.
    async fn notify(&self, event: &DispatchEvent);
}

/// Default bridge that logs every event instead of sending anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl NotificationBridge for LogNotifier {
    async fn notify(&self, event: &DispatchEvent) {
        tracing::info!(
            event_type = event.event_type_str(),
            job_id = %event.job_id(),
            pro_id = %event.pro_id(),
            "notification"
        );
    }
}

/// Spawns the listener task that forwards bus events to the bridge.
///
/// Lagged receivers skip dropped events and keep going; the task exits
/// when the bus is closed.
pub fn spawn_listener(bus: &EventBus, bridge: Arc<dyn NotificationBridge>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => bridge.notify(&event).await,
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "notification listener lagged; events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
