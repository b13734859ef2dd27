//! Intake pipeline shared by every provider:
//! verify signature -> parse -> test-and-set the event id -> dispatch.
//!
//! The event id is recorded before the handler runs. A handler that fails
//! leaves the id recorded, so the event is not processed again on redelivery;
//! the failure is logged with enough detail to replay it by hand.

use ntex::util::Bytes;
use serde::Deserialize;

use super::{
    errors::WebhookError,
    provider::{EventSource, WebhookProvider},
    schemas,
};
use crate::{clock::Clock, metric, models::event::WebhookEvent, repo};

/// Request data the pipeline needs, already pulled out of the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct InboundDelivery {
    pub signature: Option<String>,
    /// Only read for providers with [`EventSource::GithubHeaders`]
    pub event_id: Option<String>,
    pub event_type: Option<String>,
    pub body: Bytes,
}

#[derive(Debug, PartialEq)]
pub enum DeliveryOutcome {
    /// First sighting; the handler ran (successfully or not)
    Processed { reply: Option<serde_json::Value> },
    /// Seen within the retention window; nothing ran
    Duplicate,
}

fn extract_identity(
    provider: &WebhookProvider,
    delivery: &InboundDelivery,
    payload: &serde_json::Value,
) -> Result<(String, String), WebhookError> {
    let (event_id, event_type) = match provider.event_source {
        EventSource::Body => {
            let envelope = schemas::EventEnvelope::deserialize(payload)
                .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
            (envelope.id, envelope.event_type)
        }
        EventSource::GithubHeaders => (delivery.event_id.clone(), delivery.event_type.clone()),
    };

    let event_id = event_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| WebhookError::MalformedPayload("missing event id".into()))?;
    let event_type = event_type
        .filter(|event_type| !event_type.is_empty())
        .ok_or_else(|| WebhookError::MalformedPayload("missing event type".into()))?;

    Ok((event_id, event_type))
}

pub async fn process_delivery(
    provider: &WebhookProvider,
    event_store: &repo::ImplEventStore,
    clock: &dyn Clock,
    delivery: InboundDelivery,
) -> Result<DeliveryOutcome, WebhookError> {
    let secret = provider
        .secret
        .as_deref()
        .filter(|secret| !secret.is_empty())
        .ok_or_else(|| WebhookError::Configuration(provider.name.clone()))?;

    let signature = delivery
        .signature
        .as_deref()
        .ok_or_else(|| WebhookError::MissingSignature(provider.signature_header.clone()))?;

    let now = clock.now();
    if !provider
        .scheme
        .verify(signature, &delivery.body, secret, now)
    {
        metric::incr_webhook_statds(&provider.name, "rejected");
        return Err(WebhookError::InvalidSignature);
    }

    let payload: serde_json::Value = serde_json::from_slice(&delivery.body)
        .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
    let (event_id, event_type) = extract_identity(provider, &delivery, &payload)?;

    let event = WebhookEvent {
        provider: provider.name.clone(),
        id: event_id,
        event_type,
        raw_body: delivery.body,
        payload,
        received_at: now,
    };

    let was_new = event_store
        .test_and_set(&event.dedup_key(), provider.retention)
        .await
        .map_err(|e| WebhookError::Internal(e.to_string()))?;

    if !was_new {
        logfire::info!(
            "Duplicate {provider} event {event_id} ({event_type}) acknowledged",
            provider = event.provider.clone(),
            event_id = event.id.clone(),
            event_type = event.event_type.clone()
        );
        metric::incr_webhook_statds(&provider.name, "duplicate");
        return Ok(DeliveryOutcome::Duplicate);
    }

    match provider.dispatcher.dispatch(&event).await {
        Ok(reply) => {
            metric::incr_webhook_statds(&provider.name, "processed");
            Ok(DeliveryOutcome::Processed { reply })
        }
        Err(e) => {
            logfire::error!(
                "Handler failed for {provider} event {event_id} ({event_type}) received at {received_at}, already marked processed and needs manual replay: {error}",
                provider = event.provider.clone(),
                event_id = event.id.clone(),
                event_type = event.event_type.clone(),
                received_at = event.received_at.to_rfc3339(),
                error = e.to_string()
            );
            metric::incr_webhook_statds(&provider.name, "handler_error");
            Ok(DeliveryOutcome::Processed { reply: None })
        }
    }
}
