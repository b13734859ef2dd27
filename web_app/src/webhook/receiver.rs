//! Webhook endpoint handlers
//!
//! The body is taken as raw bytes: signatures are computed over the exact
//! bytes on the wire, so it must not be parsed before verification.

use ntex::{http::header::HeaderMap, util::Bytes, web};
use tracing::Instrument;

use super::{
    AppState,
    delivery::{self, DeliveryOutcome, InboundDelivery},
    errors::WebhookError,
    provider::WebhookProvider,
};
use crate::consts;

/// Header value as text; a value that is not valid UTF-8 counts as missing.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn find_provider<'a>(
    state: &'a AppState,
    provider: &str,
) -> Result<&'a WebhookProvider, WebhookError> {
    state
        .providers
        .get(provider)
        .ok_or_else(|| WebhookError::UnknownProvider(provider.to_string()))
}

/// Liveness endpoint (GET)
///
/// # Returns
/// - 200 with a plain text message for known providers
/// - 404 for unknown providers
#[web::get("/{provider}")]
pub async fn status(
    path: web::types::Path<String>,
    state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    let provider = find_provider(&state, &path)?;

    Ok(web::HttpResponse::Ok()
        .content_type("text/plain")
        .body(format!("{} webhook endpoint active", provider.name)))
}

/// Webhook receiver endpoint (POST)
///
/// # Returns
/// - 200 `{"received": true}` once the event is processed, or the body returned by its handler
/// - 200 `{"received": true, "duplicate": true}` for an event already processed
/// - 400 when the signature header is missing or the payload is malformed
/// - 401 when the signature does not match
/// - 404 for unknown providers
/// - 500 when the provider secret is not configured or the event store fails
#[web::post("/{provider}")]
pub async fn receive(
    req: web::HttpRequest,
    path: web::types::Path<String>,
    body: Bytes,
    state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    let provider = find_provider(&state, &path)?;

    let inbound = InboundDelivery {
        signature: header_value(req.headers(), &provider.signature_header),
        event_id: header_value(req.headers(), consts::GITHUB_DELIVERY_HEADER),
        event_type: header_value(req.headers(), consts::GITHUB_EVENT_HEADER),
        body,
    };

    let outcome = delivery::process_delivery(
        provider,
        &state.event_store,
        state.clock.as_ref(),
        inbound,
    )
    .instrument(logfire::span!(
        "webhook_delivery {provider}",
        provider = provider.name.clone()
    ))
    .await?;

    let response = match outcome {
        DeliveryOutcome::Processed { reply: Some(reply) } => reply,
        DeliveryOutcome::Processed { reply: None } => serde_json::json!({ "received": true }),
        DeliveryOutcome::Duplicate => serde_json::json!({ "received": true, "duplicate": true }),
    };

    Ok(web::HttpResponse::Ok().json(&response))
}
