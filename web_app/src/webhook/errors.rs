use derive_more::{Display, Error};
use ntex::{http, web};
use serde_json::json;

/// Reasons a webhook delivery is refused.
///
/// Duplicates and handler failures are not errors: both are acknowledged with
/// a 200 so the sender stops retrying.
#[derive(Debug, Display, Error)]
pub enum WebhookError {
    #[display("unknown webhook provider: {_0}")]
    UnknownProvider(#[error(not(source))] String),
    #[display("webhook secret is not configured for {_0}")]
    Configuration(#[error(not(source))] String),
    #[display("missing {_0} header")]
    MissingSignature(#[error(not(source))] String),
    #[display("invalid signature")]
    InvalidSignature,
    #[display("malformed payload: {_0}")]
    MalformedPayload(#[error(not(source))] String),
    #[display("internal error: {_0}")]
    Internal(#[error(not(source))] String),
}

impl web::error::WebResponseError for WebhookError {
    fn error_response(&self, _: &web::HttpRequest) -> web::HttpResponse {
        match self {
            WebhookError::Configuration(_) | WebhookError::Internal(_) => {
                logfire::error!("Webhook rejected: {error}", error = self.to_string());
            }
            _ => logfire::warn!("Webhook rejected: {error}", error = self.to_string()),
        }

        let message = match self {
            // do not leak storage details to the sender
            WebhookError::Internal(_) => "internal error".to_string(),
            _ => self.to_string(),
        };

        web::HttpResponse::build(self.status_code()).json(&json!({ "error": message }))
    }

    fn status_code(&self) -> http::StatusCode {
        match *self {
            WebhookError::UnknownProvider(_) => http::StatusCode::NOT_FOUND,
            WebhookError::Configuration(_) | WebhookError::Internal(_) => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
            WebhookError::MissingSignature(_) | WebhookError::MalformedPayload(_) => {
                http::StatusCode::BAD_REQUEST
            }
            WebhookError::InvalidSignature => http::StatusCode::UNAUTHORIZED,
        }
    }
}
