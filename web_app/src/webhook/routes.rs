use ntex::web;

/// Configures the webhook routes.
///
/// These are public endpoints: authentication is the signature carried by
/// each delivery.
///
/// # Routes
/// - `GET /webhook/{provider}` - Liveness check for the provider endpoint
/// - `POST /webhook/{provider}` - Webhook receiver
pub fn webhooks(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhook").service((super::receiver::status, super::receiver::receive)),
    );
}
