//! Per-provider configuration of the webhook intake.
//!
//! Every provider goes through the same pipeline; what changes between them is
//! the signature scheme, where the event id and type are read from, and the
//! routing table.

use chrono::TimeDelta;

use super::{dispatch::Dispatcher, security::SignatureScheme};

/// Where the event id and type of a delivery come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    /// Top-level `id` and `type` fields of the JSON body
    Body,
    /// `X-GitHub-Delivery` and `X-GitHub-Event` headers
    GithubHeaders,
}

pub struct WebhookProvider {
    pub name: String,
    /// Header carrying the signature, lower case
    pub signature_header: String,
    /// `None` when the secret is not configured; every delivery then fails with a 500
    pub secret: Option<String>,
    pub scheme: SignatureScheme,
    pub event_source: EventSource,
    /// How long a processed event id is remembered
    pub retention: TimeDelta,
    pub dispatcher: Dispatcher,
}

impl WebhookProvider {
    pub fn has_secret(&self) -> bool {
        self.secret.as_deref().is_some_and(|secret| !secret.is_empty())
    }
}
