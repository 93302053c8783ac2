//! Shared fixtures for handler tests: a canned configuration, an in-memory
//! store, and a fake platform API that records its calls.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use maf_core::{ApiError, AppConfig, IntegrationStore, MemoryStore, PlatformApi, StoreError, sign};

use crate::AppState;

pub const SIGNING_SECRET: &str = "signing-secret";
pub const TEST_ACCOUNT_ID: i64 = 7001;

pub struct FakePlatform {
    /// Current column value returned by fetches; mutations update it.
    pub column: Mutex<Option<String>>,
    pub exchanges: Mutex<u32>,
    pub fetches: Mutex<u32>,
    /// (board_id, item_id, column_id, value) per mutation issued.
    pub mutations: Mutex<Vec<(i64, i64, String, String)>>,
    pub fail_exchange: bool,
    pub fail_fetch: bool,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            column: Mutex::new(None),
            exchanges: Mutex::new(0),
            fetches: Mutex::new(0),
            mutations: Mutex::new(Vec::new()),
            fail_exchange: false,
            fail_fetch: false,
        }
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn exchange_code(&self, code: &str) -> Result<String, ApiError> {
        *self.exchanges.lock().unwrap() += 1;
        if self.fail_exchange {
            return Err(ApiError::Graphql("token exchange refused".into()));
        }
        Ok(format!("token-for-{code}"))
    }

    async fn current_account_id(&self, _token: &str) -> Result<i64, ApiError> {
        Ok(TEST_ACCOUNT_ID)
    }

    async fn column_text(
        &self,
        _token: &str,
        _item_id: i64,
        _column_id: &str,
    ) -> Result<Option<String>, ApiError> {
        if self.fail_fetch {
            return Err(ApiError::Graphql("query refused".into()));
        }
        *self.fetches.lock().unwrap() += 1;
        Ok(self.column.lock().unwrap().clone())
    }

    async fn set_column_text(
        &self,
        _token: &str,
        board_id: i64,
        item_id: i64,
        column_id: &str,
        value: &str,
    ) -> Result<(), ApiError> {
        self.mutations.lock().unwrap().push((
            board_id,
            item_id,
            column_id.to_string(),
            value.to_string(),
        ));
        *self.column.lock().unwrap() = Some(value.to_string());
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        client_id: "CID".into(),
        client_secret: "SECRET".into(),
        signing_secret: SIGNING_SECRET.into(),
        redirect_uri: "http://localhost:8080/auth/callback".into(),
        success_url: "/success.html".into(),
        auth_base: "https://auth.example.test".into(),
        api_base: "https://api.example.test/v2".into(),
    }
}

pub fn test_state(api: FakePlatform) -> (AppState, Arc<MemoryStore>, Arc<FakePlatform>) {
    let store = Arc::new(MemoryStore::default());
    let api = Arc::new(api);
    let state = AppState {
        config: Arc::new(test_config()),
        store: store.clone(),
        api: api.clone(),
    };
    (state, store, api)
}

/// Store that fails every operation, for the retry-on-500 paths.
struct FailingStore;

#[async_trait]
impl IntegrationStore for FailingStore {
    async fn upsert_account(&self, _account: &maf_core::Account) -> Result<(), StoreError> {
        Err(StoreError::Internal(anyhow::anyhow!("store down")))
    }

    async fn account(&self, _account_id: i64) -> Result<Option<maf_core::Account>, StoreError> {
        Err(StoreError::Internal(anyhow::anyhow!("store down")))
    }

    async fn insert_rule(&self, _rule: &maf_core::AutomationRule) -> Result<(), StoreError> {
        Err(StoreError::Internal(anyhow::anyhow!("store down")))
    }

    async fn delete_rule(&self, _webhook_id: &str) -> Result<(), StoreError> {
        Err(StoreError::Internal(anyhow::anyhow!("store down")))
    }

    async fn rule(
        &self,
        _webhook_id: &str,
    ) -> Result<Option<maf_core::AutomationRule>, StoreError> {
        Err(StoreError::Internal(anyhow::anyhow!("store down")))
    }
}

pub fn failing_store_state() -> AppState {
    AppState {
        config: Arc::new(test_config()),
        store: Arc::new(FailingStore),
        api: Arc::new(FakePlatform::default()),
    }
}

pub fn signed_request(secret: &str, body: &serde_json::Value) -> Request<Body> {
    let bytes = serde_json::to_vec(body).unwrap();
    Request::builder()
        .method("POST")
        .uri("/webhooks/events")
        .header("authorization", sign(secret, &bytes))
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .unwrap()
}

pub fn unsigned_request(body: &serde_json::Value) -> Request<Body> {
    let bytes = serde_json::to_vec(body).unwrap();
    Request::builder()
        .method("POST")
        .uri("/webhooks/events")
        .header("authorization", "deadbeef")
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .unwrap()
}
