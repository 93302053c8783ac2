//! Shared building blocks for the monday.com column auto-format integration.
//!
//! This crate holds everything the HTTP server composes: the environment
//! configuration, the persisted account/rule store, webhook signature
//! verification, and the monday.com API client used for the OAuth code
//! exchange and the GraphQL column round trip.

pub mod config;
pub mod error;
pub mod model;
pub mod monday;
pub mod signature;
pub mod store;

pub use config::AppConfig;
pub use error::{ApiError, StoreError};
pub use model::{Account, AutomationRule, RuleType};
pub use monday::{MondayClient, PlatformApi};
pub use signature::{sign, verify_signature};
pub use store::{IntegrationStore, MemoryStore, SqliteStore};
