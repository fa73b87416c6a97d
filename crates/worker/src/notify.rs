use async_trait::async_trait;
use chowline_core::config::NotifyConfig;
use chowline_core::DeliveryError;
use secrecy::{ExposeSecret, SecretString};

/// Out-of-band notification channel (SMS-style). One synchronous send per
/// recommendation; a failure is fatal for the pass and nothing retries here.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str, contact_handle: &str) -> Result<(), DeliveryError>;
}

pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<SecretString>,
}

impl HttpNotifier {
    pub fn from_config(config: &NotifyConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, message: &str, contact_handle: &str) -> Result<(), DeliveryError> {
        let body = serde_json::json!({
            "to": contact_handle,
            "message": message,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        request
            .send()
            .await
            .map_err(|error| DeliveryError::Send {
                handle: contact_handle.to_string(),
                reason: error.to_string(),
            })?
            .error_for_status()
            .map_err(|error| DeliveryError::Send {
                handle: contact_handle.to_string(),
                reason: error.to_string(),
            })?;

        Ok(())
    }
}
