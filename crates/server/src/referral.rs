use async_trait::async_trait;
use tracing::info;

use intake_core::config::ReferralConfig;
use intake_core::store::{CompletionEvent, NotifyError, ReferralNotifier};

/// Posts the completion payload to the attribution service. The shared
/// secret, when configured, rides along as a header the receiver can check.
#[derive(Clone, Debug)]
pub struct HttpReferralNotifier {
    client: reqwest::Client,
    endpoint: String,
    webhook_secret: Option<String>,
}

pub const SIGNATURE_HEADER: &str = "x-intake-signature";

impl HttpReferralNotifier {
    pub fn new(callback_base_url: &str, webhook_secret: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: completion_endpoint(callback_base_url),
            webhook_secret,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn completion_endpoint(callback_base_url: &str) -> String {
    format!("{}/onboarding/completions", callback_base_url.trim_end_matches('/'))
}

#[async_trait]
impl ReferralNotifier for HttpReferralNotifier {
    async fn completed(&self, event: &CompletionEvent) -> Result<(), NotifyError> {
        let mut request = self.client.post(&self.endpoint).json(event);
        if let Some(secret) = &self.webhook_secret {
            request = request.header(SIGNATURE_HEADER, secret);
        }

        let response =
            request.send().await.map_err(|error| NotifyError::Delivery(error.to_string()))?;
        if !response.status().is_success() {
            return Err(NotifyError::Delivery(format!(
                "callback returned status {}",
                response.status()
            )));
        }

        info!(
            campaign_id = %event.campaign_id.0,
            user_id = %event.user_id.0,
            referral_id = event.referral_id.as_deref().unwrap_or("none"),
            "completion delivered to referral service"
        );
        Ok(())
    }
}

/// Runtime choice between the HTTP callback and a no-op, driven by config.
#[derive(Clone, Debug)]
pub enum CompletionNotifier {
    Noop,
    Http(HttpReferralNotifier),
}

impl CompletionNotifier {
    pub fn from_config(referral: &ReferralConfig) -> Self {
        match (&referral.enabled, &referral.callback_base_url) {
            (true, Some(callback_base_url)) => Self::Http(HttpReferralNotifier::new(
                callback_base_url,
                referral.webhook_secret.clone(),
            )),
            _ => Self::Noop,
        }
    }
}

#[async_trait]
impl ReferralNotifier for CompletionNotifier {
    async fn completed(&self, event: &CompletionEvent) -> Result<(), NotifyError> {
        match self {
            Self::Noop => Ok(()),
            Self::Http(notifier) => notifier.completed(event).await,
        }
    }
}
