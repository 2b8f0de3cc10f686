// Third-party OAuth broker seam.
//
// The core only ever needs to know whether a user has a connected
// integration and how to exercise it; the actual OAuth dance and vendor
// APIs (CRM, calendar, inbox) live behind this trait and are out of scope
// here. `NoOpOAuthBroker` stands in for any real vendor so callers compile
// and can be tested without one.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OAuthBrokerError {
    #[error("no connection for user {0}")]
    NotConnected(String),
    #[error("oauth broker error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
pub struct AuthUrl {
    pub url: String,
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub user_id: String,
    pub provider: String,
    pub external_account_id: String,
}

#[async_trait]
pub trait OAuthBroker: Send + Sync {
    /// Build the provider authorization URL a user is redirected to.
    async fn generate_auth_url(
        &self,
        user_id: &str,
        provider: &str,
    ) -> Result<AuthUrl, OAuthBrokerError>;

    /// Exchange the provider's callback code for a stored connection.
    async fn exchange_code_for_connection(
        &self,
        user_id: &str,
        provider: &str,
        code: &str,
    ) -> Result<Connection, OAuthBrokerError>;

    /// Execute a named action against a connected provider (send email,
    /// create calendar event, update CRM record) with an opaque payload.
    async fn execute_action(
        &self,
        user_id: &str,
        provider: &str,
        action: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, OAuthBrokerError>;
}

/// A broker with no connected providers. Every call reports
/// `NotConnected`, matching real behavior for a user who hasn't linked
/// anything yet.
pub struct NoOpOAuthBroker;

#[async_trait]
impl OAuthBroker for NoOpOAuthBroker {
    async fn generate_auth_url(
        &self,
        _user_id: &str,
        _provider: &str,
    ) -> Result<AuthUrl, OAuthBrokerError> {
        Err(OAuthBrokerError::Other(
            "no OAuth broker configured in this deployment".to_string(),
        ))
    }

    async fn exchange_code_for_connection(
        &self,
        user_id: &str,
        _provider: &str,
        _code: &str,
    ) -> Result<Connection, OAuthBrokerError> {
        Err(OAuthBrokerError::NotConnected(user_id.to_string()))
    }

    async fn execute_action(
        &self,
        user_id: &str,
        _provider: &str,
        _action: &str,
        _payload: serde_json::Value,
    ) -> Result<serde_json::Value, OAuthBrokerError> {
        Err(OAuthBrokerError::NotConnected(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_op_broker_reports_not_connected() {
        let broker = NoOpOAuthBroker;
        let err = broker
            .execute_action("user-1", "salesforce", "update_contact", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthBrokerError::NotConnected(_)));
    }
}
