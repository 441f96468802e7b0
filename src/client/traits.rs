use async_trait::async_trait;
use thiserror::Error;

use crate::domain::*;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("connection error: {0}")]
    ConnectionError(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("request failed with status {status}: {url}")]
    Status { status: u16, url: String },
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("config error: {0}")]
    ConfigError(String),
    #[error("timeout")]
    Timeout,
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Upstream source of a customer's raw history records.
#[async_trait]
pub trait HistoryClient: Send + Sync {
    async fn fetch_identity_history(&self, customer_id: &str) -> ClientResult<IdentityHistory>;

    async fn fetch_identity_tasks(&self, customer_id: &str) -> ClientResult<Vec<IdentityTask>>;
}
