// Leboncoin repost executor
//
// Drives the repost/renew flow over an HTTP session with a cookie store:
// log in with the configured credentials when the session has expired,
// fetch the listing page, locate the repost control among the labels
// Leboncoin uses for it, and invoke it. The page-scraping here is
// heuristic by nature and isolated in this adapter; the scheduling core
// only consumes the `ActionExecutor` contract.

use crate::config::LeboncoinConfig;
use crate::errors::ExecutorError;
use crate::executor::ActionExecutor;
use crate::models::Outcome;
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Known labels for the repost control, in preference order
const ACTION_LABELS: &str = "renouveler|reposter|remonter|relancer|remise\\s+en\\s+avant";

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // An anchor/button/form target whose visible text carries one of
        // the known labels, allowing nested markup between them.
        let pattern = format!(
            r#"(?is)(?:href|action|formaction)="([^"]+)"[^>]*>\s*(?:<[^>]*>\s*)*(?:{ACTION_LABELS})"#
        );
        Regex::new(&pattern).expect("valid regex")
    })
}

/// Find the target of the repost control in a listing page
fn find_repost_action(html: &str) -> Option<String> {
    action_regex()
        .captures(html)
        .map(|caps| caps[1].to_string())
}

pub struct LeboncoinExecutor {
    client: Client,
    config: LeboncoinConfig,
}

impl LeboncoinExecutor {
    pub fn new(config: LeboncoinConfig) -> Result<Self, ExecutorError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    /// The whole repost flow; any error here becomes a failed outcome at
    /// the `execute` boundary.
    #[instrument(skip(self))]
    async fn repost(&self, target: &str) -> Result<String, ExecutorError> {
        let (email, password) = match (&self.config.email, &self.config.password) {
            (Some(email), Some(password)) => (email.clone(), password.clone()),
            _ => return Err(ExecutorError::MissingCredentials),
        };

        self.ensure_logged_in(&email, &password).await?;

        let page = self
            .client
            .get(target)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ExecutorError::HttpRequestFailed(e.to_string()))?
            .text()
            .await?;

        let action = find_repost_action(&page).ok_or(ExecutorError::RepostControlNotFound)?;
        let action_url = Url::parse(target)
            .and_then(|base| base.join(&action))
            .map_err(|e| ExecutorError::HttpRequestFailed(e.to_string()))?;

        debug!(action = %action_url, "Repost control located");
        self.invoke_action(action_url).await?;

        Ok("Clicked repost flow".to_string())
    }

    /// Reuse the session when it is still valid, otherwise log in again
    #[instrument(skip(self, email, password))]
    async fn ensure_logged_in(&self, email: &str, password: &str) -> Result<(), ExecutorError> {
        let account_url = format!("{}/compte/part", self.config.base_url);
        let response = self.client.get(&account_url).send().await?;

        let logged_in = response.status().is_success()
            && !response.url().path().to_ascii_lowercase().contains("login");
        if logged_in {
            debug!("Session still valid, skipping login");
            return Ok(());
        }

        let login_url = format!("{}/compte/part/Login", self.config.base_url);
        let response = self
            .client
            .post(&login_url)
            .form(&[("email", email), ("password", password)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExecutorError::LoginFailed(format!(
                "login returned status {}",
                response.status()
            )));
        }

        debug!("Logged in");
        Ok(())
    }

    /// Trigger the control: POST first, fall back to GET for plain links
    async fn invoke_action(&self, action_url: Url) -> Result<(), ExecutorError> {
        let response = self.client.post(action_url.clone()).send().await?;
        if response.status().is_success() {
            return Ok(());
        }

        let response = self.client.get(action_url).send().await?;
        if response.status().is_success() {
            return Ok(());
        }

        Err(ExecutorError::HttpRequestFailed(format!(
            "repost action returned status {}",
            response.status()
        )))
    }
}

#[async_trait]
impl ActionExecutor for LeboncoinExecutor {
    async fn execute(&self, target: &str) -> Outcome {
        match self.repost(target).await {
            Ok(detail) => Outcome::success(detail),
            Err(e) => {
                warn!(target, error = %e, "Repost attempt failed");
                Outcome::failure(e.to_string())
            }
        }
    }
}
