//! GitHub App events.
//!
//! GitHub sends the event id and type as headers and signs the body with the
//! `sha256=` scheme. The `ping` event is answered with a `pong` body so the
//! delivery log in the GitHub UI shows that the app is reachable.

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    dispatch::{Dispatcher, EventHandler, LogEvent},
    provider::{EventSource, WebhookProvider},
    schemas,
    security::SignatureScheme,
};
use crate::{config::AppConfig, consts, models::event::WebhookEvent, services};

pub struct Ping;

#[async_trait]
impl EventHandler for Ping {
    async fn handle(&self, event: &WebhookEvent) -> anyhow::Result<Option<serde_json::Value>> {
        let ping = schemas::GithubPing::deserialize(&event.payload)?;

        Ok(Some(serde_json::json!({
            "message": "pong",
            "zen": ping.zen,
        })))
    }
}

pub struct Push;

#[async_trait]
impl EventHandler for Push {
    async fn handle(&self, event: &WebhookEvent) -> anyhow::Result<Option<serde_json::Value>> {
        let push = schemas::GithubPush::deserialize(&event.payload)?;
        let repository = push
            .repository
            .map(|repository| repository.full_name)
            .unwrap_or_else(|| "unknown".to_string());

        logfire::info!(
            "Push received for {repository} (delivery {delivery_id})",
            repository = repository,
            delivery_id = event.id.clone()
        );

        Ok(None)
    }
}

pub struct Issues;

#[async_trait]
impl EventHandler for Issues {
    async fn handle(&self, event: &WebhookEvent) -> anyhow::Result<Option<serde_json::Value>> {
        let issues = schemas::GithubIssues::deserialize(&event.payload)?;
        let number = issues
            .issue
            .map(|issue| issue.number.to_string())
            .unwrap_or_else(|| "?".to_string());

        logfire::info!(
            "Issue #{number} {action}",
            number = number,
            action = issues.action
        );

        Ok(None)
    }
}

pub struct PullRequest {
    /// `None` when no installation token is configured
    pub github: Option<services::ImplGithubService>,
    pub bot_alias: String,
}

impl PullRequest {
    pub fn greeting(&self) -> String {
        format!(
            "👋 {} here. Pull request received and under review.",
            self.bot_alias
        )
    }
}

#[async_trait]
impl EventHandler for PullRequest {
    async fn handle(&self, event: &WebhookEvent) -> anyhow::Result<Option<serde_json::Value>> {
        let pull_request = schemas::GithubPullRequest::deserialize(&event.payload)?;

        logfire::info!(
            "Pull request #{number} {action} on {repository}",
            number = pull_request.number.to_string(),
            action = pull_request.action.clone(),
            repository = pull_request.repository.full_name.clone()
        );

        if pull_request.action != "opened" {
            return Ok(None);
        }

        let Some(github) = &self.github else {
            logfire::debug!("No installation token configured, skipping pull request greeting");
            return Ok(None);
        };

        github
            .comment_on_issue(
                &pull_request.repository.full_name,
                pull_request.number,
                &self.greeting(),
            )
            .await?;

        Ok(None)
    }
}

pub fn github_provider(
    app_config: &AppConfig,
    github: Option<services::ImplGithubService>,
) -> WebhookProvider {
    let dispatcher = Dispatcher::new()
        .route("ping", Box::new(Ping))
        .route("push", Box::new(Push))
        .route("issues", Box::new(Issues))
        .route("installation", Box::new(LogEvent))
        .route(
            "pull_request",
            Box::new(PullRequest {
                github,
                bot_alias: app_config.github_bot_alias.clone(),
            }),
        );

    WebhookProvider {
        name: consts::GITHUB_PROVIDER.to_string(),
        signature_header: consts::HUB_SIGNATURE_HEADER.to_string(),
        secret: app_config.github_webhook_secret.clone(),
        scheme: SignatureScheme::HubSha256,
        event_source: EventSource::GithubHeaders,
        retention: app_config.dedup_retention(),
        dispatcher,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockGithubService;
    use chrono::Utc;
    use ntex::util::Bytes;
    use std::sync::Arc;

    fn test_event(event_type: &str, payload: serde_json::Value) -> WebhookEvent {
        WebhookEvent {
            provider: "github".into(),
            id: "72d3162e-cc78-11e3-81ab-4c9367dc0958".into(),
            event_type: event_type.into(),
            raw_body: Bytes::from(payload.to_string()),
            payload,
            received_at: Utc::now(),
        }
    }

    fn pull_request_event(action: &str) -> WebhookEvent {
        test_event(
            "pull_request",
            serde_json::json!({
                "action": action,
                "number": 42,
                "repository": {"full_name": "yoni/app"}
            }),
        )
    }

    #[ntex::test]
    async fn test_ping_replies_pong() {
        let event = test_event(
            "ping",
            serde_json::json!({"zen": "Keep it logically awesome.", "hook_id": 1}),
        );

        let reply = Ping.handle(&event).await.unwrap();

        assert_eq!(
            reply,
            Some(serde_json::json!({"message": "pong", "zen": "Keep it logically awesome."}))
        );
    }

    #[ntex::test]
    async fn test_opened_pull_request_is_greeted() {
        let mut github = MockGithubService::new();
        github
            .expect_comment_on_issue()
            .withf(|repo, number, body| {
                repo.to_string() == "yoni/app" && *number == 42 && body.starts_with("👋 YONI here.")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let handler = PullRequest {
            github: Some(Arc::new(github)),
            bot_alias: "YONI".into(),
        };

        let reply = handler.handle(&pull_request_event("opened")).await.unwrap();

        assert!(reply.is_none());
    }

    #[ntex::test]
    async fn test_other_pull_request_actions_are_only_logged() {
        let mut github = MockGithubService::new();
        github.expect_comment_on_issue().times(0);
        let handler = PullRequest {
            github: Some(Arc::new(github)),
            bot_alias: "YONI".into(),
        };

        for action in ["closed", "synchronize", "edited"] {
            assert!(
                handler
                    .handle(&pull_request_event(action))
                    .await
                    .unwrap()
                    .is_none()
            );
        }
    }

    #[ntex::test]
    async fn test_pull_request_without_token_skips_comment() {
        let handler = PullRequest {
            github: None,
            bot_alias: "YONI".into(),
        };

        assert!(
            handler
                .handle(&pull_request_event("opened"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[ntex::test]
    async fn test_comment_failure_surfaces_as_handler_error() {
        let mut github = MockGithubService::new();
        github
            .expect_comment_on_issue()
            .times(1)
            .returning(|_, _, _| Err(anyhow::anyhow!("GitHub API error (403)")));
        let handler = PullRequest {
            github: Some(Arc::new(github)),
            bot_alias: "YONI".into(),
        };

        assert!(handler.handle(&pull_request_event("opened")).await.is_err());
    }

    #[ntex::test]
    async fn test_push_without_repository_is_logged() {
        let event = test_event("push", serde_json::json!({"ref": "refs/heads/main"}));

        assert!(Push.handle(&event).await.unwrap().is_none());
    }

    #[test]
    fn test_github_provider_from_config() {
        use envconfig::Envconfig;

        let app_config = AppConfig::init_from_hashmap(&std::collections::HashMap::from([(
            "GITHUB_WEBHOOK_SECRET".to_string(),
            "whsec_test".to_string(),
        )]))
        .unwrap();

        let provider = github_provider(&app_config, None);

        assert!(provider.has_secret());
        assert_eq!(provider.event_source, EventSource::GithubHeaders);
        for event_type in ["ping", "push", "issues", "pull_request", "installation"] {
            assert!(provider.dispatcher.handles(event_type), "{event_type}");
        }
    }
}
