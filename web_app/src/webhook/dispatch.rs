//! Routing of verified, de-duplicated events to their side-effect handler.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::models::event::WebhookEvent;

/// Side effect executed for one event type.
///
/// A handler may return a JSON body that replaces the default
/// `{"received": true}` acknowledgement.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &WebhookEvent) -> anyhow::Result<Option<serde_json::Value>>;
}

pub type ImplEventHandler = Box<dyn EventHandler>;

/// Routing table from event type to handler.
#[derive(Default)]
pub struct Dispatcher {
    routes: HashMap<String, ImplEventHandler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, event_type: &str, handler: ImplEventHandler) -> Self {
        self.routes.insert(event_type.to_string(), handler);
        self
    }

    #[cfg(test)]
    pub fn handles(&self, event_type: &str) -> bool {
        self.routes.contains_key(event_type)
    }

    /// Runs the handler registered for the event type.
    ///
    /// Unknown types are not an error: they are logged and acknowledged.
    pub async fn dispatch(
        &self,
        event: &WebhookEvent,
    ) -> anyhow::Result<Option<serde_json::Value>> {
        match self.routes.get(&event.event_type) {
            Some(handler) => handler.handle(event).await,
            None => {
                logfire::info!(
                    "Unhandled {provider} event: {event_type}",
                    provider = event.provider.clone(),
                    event_type = event.event_type.clone()
                );
                Ok(None)
            }
        }
    }
}

/// Handler that only records the event in the logs.
pub struct LogEvent;

#[async_trait]
impl EventHandler for LogEvent {
    async fn handle(&self, event: &WebhookEvent) -> anyhow::Result<Option<serde_json::Value>> {
        logfire::info!(
            "Received {provider} event {event_type} ({event_id})",
            provider = event.provider.clone(),
            event_type = event.event_type.clone(),
            event_id = event.id.clone()
        );
        Ok(None)
    }
}
