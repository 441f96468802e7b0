use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::{ClientError, ClientResult, HistoryClient};
use crate::domain::*;

/// REST client for the identity service's history and task endpoints:
/// `{base_url}/{identity_path}/{customer_id}/history` and `.../tasks`.
pub struct HttpHistoryClient {
    client: Client,
    base_url: String,
    identity_path: String,
}

impl HttpHistoryClient {
    pub fn new(base_url: &str, identity_path: &str, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("identity-timeline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::ConfigError(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            identity_path: identity_path.trim_matches('/').to_string(),
        })
    }

    fn url(&self, customer_id: &str, resource: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url, self.identity_path, customer_id, resource
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> ClientResult<T> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout
            } else {
                ClientError::ConnectionError(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(url));
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::ParseError(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl HistoryClient for HttpHistoryClient {
    async fn fetch_identity_history(&self, customer_id: &str) -> ClientResult<IdentityHistory> {
        self.get_json(self.url(customer_id, "history")).await
    }

    async fn fetch_identity_tasks(&self, customer_id: &str) -> ClientResult<Vec<IdentityTask>> {
        self.get_json(self.url(customer_id, "tasks")).await
    }
}
