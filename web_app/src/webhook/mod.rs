//! Webhook intake for external integrations
//!
//! Every provider is served by `POST /webhook/{provider}` and goes through the
//! same pipeline (see [`delivery`]): the signature is verified against the raw
//! body, the event id is test-and-set in the event store, and only then the
//! handler registered for the event type runs.
//!
//! ## Modules
//!
//! - [`security`] - Signature schemes and constant-time verification
//! - [`delivery`] - Verify, de-duplicate and dispatch one delivery
//! - [`dispatch`] - Event type to handler routing
//! - [`stripe`] - Payment events (Stripe and the generic hub sender)
//! - [`github`] - GitHub App events
//! - [`receiver`] - HTTP endpoints

pub mod delivery;
pub mod dispatch;
pub mod errors;
pub mod github;
pub mod provider;
pub mod receiver;
pub mod routes;
pub mod schemas;
pub mod security;
pub mod stripe;

use std::{collections::HashMap, sync::Arc};

use crate::{clock::Clock, config::AppConfig, repo, services};
use provider::WebhookProvider;

/// State shared by the webhook endpoints of one worker.
pub struct AppState {
    pub providers: HashMap<String, WebhookProvider>,
    pub event_store: repo::ImplEventStore,
    pub clock: Arc<dyn Clock>,
}

/// Builds every supported provider keyed by the path segment it is served on.
pub fn build_providers(
    app_config: &AppConfig,
    github: Option<services::ImplGithubService>,
) -> HashMap<String, WebhookProvider> {
    [
        stripe::stripe_provider(app_config),
        stripe::hub_provider(app_config),
        github::github_provider(app_config, github),
    ]
    .into_iter()
    .map(|provider| (provider.name.clone(), provider))
    .collect()
}
