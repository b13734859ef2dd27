use chrono::TimeDelta;

pub const STRIPE_PROVIDER: &str = "stripe";
pub const GITHUB_PROVIDER: &str = "github";
pub const HUB_PROVIDER: &str = "hub";

pub const HUB_SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const HUB_SIGNATURE_PREFIX: &str = "sha256=";
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";
pub const GITHUB_EVENT_HEADER: &str = "x-github-event";
pub const GITHUB_DELIVERY_HEADER: &str = "x-github-delivery";

pub const DEFAULT_DEDUP_RETENTION: TimeDelta = TimeDelta::hours(24);
pub const DEFAULT_STRIPE_TOLERANCE: TimeDelta = TimeDelta::seconds(300);

pub const GITHUB_API_BASE_URL: &str = "https://api.github.com";
pub const GITHUB_API_ACCEPT: &str = "application/vnd.github+json";
pub const HTTP_USER_AGENT: &str = "yoni-webhooks";
/// Outbound calls run inside the webhook request and must finish before the sender gives up
pub const HTTP_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
