use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use tokio::task::spawn_blocking;

use super::IntegrationStore;
use crate::error::StoreError;
use crate::model::{Account, AutomationRule, RuleType};

const CREATE_TABLES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    account_id INTEGER PRIMARY KEY,
    access_token TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS automation_rules (
    webhook_id TEXT PRIMARY KEY,
    board_id INTEGER NOT NULL,
    account_id INTEGER NOT NULL,
    rule_type TEXT NOT NULL
);
"#;

/// Sqlite-backed [`IntegrationStore`]. The connection lives behind a std
/// mutex and every statement runs on the blocking pool.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(CREATE_TABLES_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CREATE_TABLES_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<F, T>(&self, func: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        spawn_blocking(move || {
            let guard = conn.lock().unwrap();
            func(&guard)
        })
        .await?
    }
}

#[async_trait]
impl IntegrationStore for SqliteStore {
    async fn upsert_account(&self, account: &Account) -> Result<(), StoreError> {
        let account = account.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO accounts (account_id, access_token)
                 VALUES (?1, ?2)
                 ON CONFLICT(account_id) DO UPDATE SET access_token=excluded.access_token",
                params![account.account_id, account.access_token],
            )?;
            Ok(())
        })
        .await
    }

    async fn account(&self, account_id: i64) -> Result<Option<Account>, StoreError> {
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT account_id, access_token FROM accounts WHERE account_id = ?1",
                    params![account_id],
                    |row| {
                        Ok(Account {
                            account_id: row.get(0)?,
                            access_token: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
        .await
    }

    async fn insert_rule(&self, rule: &AutomationRule) -> Result<(), StoreError> {
        let rule = rule.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO automation_rules (webhook_id, board_id, account_id, rule_type)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(webhook_id) DO UPDATE SET board_id=excluded.board_id,
                 account_id=excluded.account_id,
                 rule_type=excluded.rule_type",
                params![
                    rule.webhook_id,
                    rule.board_id,
                    rule.account_id,
                    rule.rule_type.as_code()
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_rule(&self, webhook_id: &str) -> Result<(), StoreError> {
        let webhook_id = webhook_id.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM automation_rules WHERE webhook_id = ?1",
                params![webhook_id],
            )?;
            Ok(())
        })
        .await
    }

    async fn rule(&self, webhook_id: &str) -> Result<Option<AutomationRule>, StoreError> {
        let webhook_id = webhook_id.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT webhook_id, board_id, account_id, rule_type
                     FROM automation_rules WHERE webhook_id = ?1",
                    params![webhook_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;
            match row {
                Some((webhook_id, board_id, account_id, code)) => {
                    let rule_type = RuleType::from_code(&code).ok_or_else(|| {
                        StoreError::Malformed {
                            entity: "automation_rule",
                            detail: format!("unknown rule_type {code:?}"),
                        }
                    })?;
                    Ok(Some(AutomationRule {
                        webhook_id,
                        board_id,
                        account_id,
                        rule_type,
                    }))
                }
                None => Ok(None),
            }
        })
        .await
    }
}
