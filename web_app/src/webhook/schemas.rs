//! # Webhook Schemas
//!
//! Subsets of the JSON payloads sent by the supported providers. Only the
//! fields the handlers read are modelled; everything else is ignored.

use serde::Deserialize;

/// Identity fields carried in the body by Stripe-like senders
#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}

/// Stripe event, reduced to the id of the object it is about
///
/// Senders of the hub webhook may post only the envelope, so `data` is optional.
#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub data: Option<StripeEventData>,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: Option<StripeObject>,
}

impl StripeEvent {
    pub fn into_object(self) -> Option<StripeObject> {
        self.data.and_then(|data| data.object)
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeObject {
    /// `cs_...` for checkout sessions, `pi_...` for payment intents
    pub id: String,
    /// Present on checkout sessions and payment intents
    pub status: Option<String>,
}

/// Body of the GitHub `ping` event sent when a webhook is created
#[derive(Debug, Deserialize)]
pub struct GithubPing {
    pub zen: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GithubRepository {
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct GithubPush {
    pub repository: Option<GithubRepository>,
}

#[derive(Debug, Deserialize)]
pub struct GithubPullRequest {
    pub action: String,
    pub number: u64,
    pub repository: GithubRepository,
}

#[derive(Debug, Deserialize)]
pub struct GithubIssue {
    pub number: u64,
}

#[derive(Debug, Deserialize)]
pub struct GithubIssues {
    pub action: String,
    pub issue: Option<GithubIssue>,
}
