// Postgres storage layer with sqlx

pub mod encryption;
pub mod integrations;
pub mod models;
pub mod repositories;
pub mod usage_store;

pub use encryption::{
    generate_encryption_key, EncryptedColumn, EncryptedPayload, EncryptionService,
    ENCRYPTED_COLUMNS,
};
pub use integrations::{AuthUrl, Connection, NoOpOAuthBroker, OAuthBroker, OAuthBrokerError};
pub use models::*;
pub use repositories::*;
pub use usage_store::DbUsageStore;
