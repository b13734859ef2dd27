//! Payment events, sent by Stripe and by senders of the generic hub webhook.

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    dispatch::{Dispatcher, EventHandler},
    provider::{EventSource, WebhookProvider},
    schemas,
    security::SignatureScheme,
};
use crate::{config::AppConfig, consts, metric, models::event::WebhookEvent};

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";

/// `None` when the event carries no `data.object`; a malformed object is an error.
fn parse_stripe_object(event: &WebhookEvent) -> anyhow::Result<Option<schemas::StripeObject>> {
    let stripe_event = schemas::StripeEvent::deserialize(&event.payload).map_err(|e| {
        anyhow::anyhow!("{} event {} has an invalid data.object: {e}", event.event_type, event.id)
    })?;

    Ok(stripe_event.into_object())
}

fn object_id(object: Option<schemas::StripeObject>) -> String {
    object
        .map(|object| object.id)
        .unwrap_or_else(|| "unknown".to_string())
}

pub struct CheckoutSessionCompleted;

#[async_trait]
impl EventHandler for CheckoutSessionCompleted {
    async fn handle(&self, event: &WebhookEvent) -> anyhow::Result<Option<serde_json::Value>> {
        let session = parse_stripe_object(event)?;
        if session.is_none() {
            logfire::warn!(
                "Checkout event {event_id} has no data.object",
                event_id = event.id.clone()
            );
        }

        logfire::info!(
            "Checkout session {session_id} completed (event {event_id})",
            session_id = object_id(session),
            event_id = event.id.clone()
        );
        metric::incr_payment_status_statds("checkout_completed");

        Ok(None)
    }
}

pub struct PaymentIntentSucceeded;

#[async_trait]
impl EventHandler for PaymentIntentSucceeded {
    async fn handle(&self, event: &WebhookEvent) -> anyhow::Result<Option<serde_json::Value>> {
        let payment_intent = parse_stripe_object(event)?;
        if payment_intent.is_none() {
            logfire::warn!(
                "Payment intent event {event_id} has no data.object",
                event_id = event.id.clone()
            );
        }

        logfire::info!(
            "Payment intent {payment_intent_id} succeeded (event {event_id})",
            payment_intent_id = object_id(payment_intent),
            event_id = event.id.clone()
        );
        metric::incr_payment_status_statds("payment_succeeded");

        Ok(None)
    }
}

fn payment_dispatcher() -> Dispatcher {
    Dispatcher::new()
        .route(
            CHECKOUT_SESSION_COMPLETED,
            Box::new(CheckoutSessionCompleted),
        )
        .route(PAYMENT_INTENT_SUCCEEDED, Box::new(PaymentIntentSucceeded))
}

pub fn stripe_provider(app_config: &AppConfig) -> WebhookProvider {
    WebhookProvider {
        name: consts::STRIPE_PROVIDER.to_string(),
        signature_header: consts::STRIPE_SIGNATURE_HEADER.to_string(),
        secret: app_config.stripe_webhook_secret.clone(),
        scheme: SignatureScheme::Stripe {
            tolerance: app_config.stripe_signature_tolerance(),
        },
        event_source: EventSource::Body,
        retention: app_config.dedup_retention(),
        dispatcher: payment_dispatcher(),
    }
}

pub fn hub_provider(app_config: &AppConfig) -> WebhookProvider {
    WebhookProvider {
        name: consts::HUB_PROVIDER.to_string(),
        signature_header: consts::HUB_SIGNATURE_HEADER.to_string(),
        secret: app_config.hub_webhook_secret.clone(),
        scheme: SignatureScheme::HubSha256,
        event_source: EventSource::Body,
        retention: app_config.dedup_retention(),
        dispatcher: payment_dispatcher(),
    }
}
