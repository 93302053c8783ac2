//! Persisted accounts and automation rules.
//!
//! One row per account, one row per registered webhook. Both stores are
//! keyed writes on distinct keys, so row-level atomicity from the backend is
//! all the concurrency control required.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{Account, AutomationRule};

mod sqlite;

pub use sqlite::SqliteStore;

#[async_trait]
pub trait IntegrationStore: Send + Sync {
    /// Insert or overwrite the account row, keyed by `account_id`.
    async fn upsert_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn account(&self, account_id: i64) -> Result<Option<Account>, StoreError>;

    /// Insert or replace the rule, keyed by `webhook_id`. The platform
    /// retries non-200 subscribe deliveries, so replays must not conflict.
    async fn insert_rule(&self, rule: &AutomationRule) -> Result<(), StoreError>;

    /// Delete by `webhook_id`; deleting an absent rule is not an error.
    async fn delete_rule(&self, webhook_id: &str) -> Result<(), StoreError>;

    async fn rule(&self, webhook_id: &str) -> Result<Option<AutomationRule>, StoreError>;
}

/// HashMap-backed store for tests and local development.
#[derive(Default)]
pub struct MemoryStore {
    accounts: Mutex<HashMap<i64, Account>>,
    rules: Mutex<HashMap<String, AutomationRule>>,
}

#[async_trait]
impl IntegrationStore for MemoryStore {
    async fn upsert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.account_id, account.clone());
        Ok(())
    }

    async fn account(&self, account_id: i64) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.lock().unwrap().get(&account_id).cloned())
    }

    async fn insert_rule(&self, rule: &AutomationRule) -> Result<(), StoreError> {
        self.rules
            .lock()
            .unwrap()
            .insert(rule.webhook_id.clone(), rule.clone());
        Ok(())
    }

    async fn delete_rule(&self, webhook_id: &str) -> Result<(), StoreError> {
        self.rules.lock().unwrap().remove(webhook_id);
        Ok(())
    }

    async fn rule(&self, webhook_id: &str) -> Result<Option<AutomationRule>, StoreError> {
        Ok(self.rules.lock().unwrap().get(webhook_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RuleType;

    fn rule(webhook_id: &str, account_id: i64) -> AutomationRule {
        AutomationRule {
            webhook_id: webhook_id.into(),
            board_id: 7,
            account_id,
            rule_type: RuleType::ToUppercase,
        }
    }

    #[tokio::test]
    async fn memory_store_upsert_overwrites_token() {
        let store = MemoryStore::default();
        store
            .upsert_account(&Account {
                account_id: 1,
                access_token: "old".into(),
            })
            .await
            .unwrap();
        store
            .upsert_account(&Account {
                account_id: 1,
                access_token: "new".into(),
            })
            .await
            .unwrap();
        let account = store.account(1).await.unwrap().unwrap();
        assert_eq!(account.access_token, "new");
    }

    #[tokio::test]
    async fn memory_store_rule_round_trip() {
        let store = MemoryStore::default();
        store.insert_rule(&rule("wh-1", 1)).await.unwrap();
        assert!(store.rule("wh-1").await.unwrap().is_some());
        store.delete_rule("wh-1").await.unwrap();
        assert!(store.rule("wh-1").await.unwrap().is_none());
        // deleting again is a no-op
        store.delete_rule("wh-1").await.unwrap();
    }
}
