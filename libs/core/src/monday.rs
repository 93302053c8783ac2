//! monday.com API access: the OAuth code exchange and the GraphQL calls the
//! automation pipeline makes. [`PlatformApi`] is the seam the handlers are
//! written (and tested) against; [`MondayClient`] is the reqwest-backed
//! implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::AppConfig;
use crate::error::ApiError;

const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);

const COLUMN_TEXT_QUERY: &str = "query($itemId: [ID!], $columnId: [String!]) { items (ids: $itemId) { column_values (ids: $columnId) { text } } }";
const CHANGE_COLUMN_MUTATION: &str = "mutation($boardId: ID!, $itemId: ID!, $columnId: String!, $value: String!) { change_simple_column_value (board_id: $boardId, item_id: $itemId, column_id: $columnId, value: $value) { id } }";
const ACCOUNT_ID_QUERY: &str = "query { me { account { id } } }";

#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Exchange a one-time OAuth code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String, ApiError>;

    /// Account id of the identity the token authenticates.
    async fn current_account_id(&self, token: &str) -> Result<i64, ApiError>;

    /// Current text value of a column on an item, `None` when the item or
    /// value is absent.
    async fn column_text(
        &self,
        token: &str,
        item_id: i64,
        column_id: &str,
    ) -> Result<Option<String>, ApiError>;

    async fn set_column_text(
        &self,
        token: &str,
        board_id: i64,
        item_id: i64,
        column_id: &str,
        value: &str,
    ) -> Result<(), ApiError>;
}

pub struct MondayClient {
    http: reqwest::Client,
    auth_base: String,
    api_base: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl MondayClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(OUTBOUND_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            auth_base: config.auth_base.trim_end_matches('/').to_string(),
            api_base: config.api_base.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        })
    }

    async fn graphql(
        &self,
        token: &str,
        query: &str,
        variables: Value,
    ) -> Result<Value, ApiError> {
        let response = self
            .http
            .post(&self.api_base)
            .header(reqwest::header::AUTHORIZATION, token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        let body: Value = response.json().await?;
        if let Some(errors) = body.get("errors").and_then(Value::as_array)
            && let Some(first) = errors.first()
        {
            return Err(ApiError::Graphql(first.to_string()));
        }
        Ok(body)
    }
}

#[async_trait]
impl PlatformApi for MondayClient {
    async fn exchange_code(&self, code: &str) -> Result<String, ApiError> {
        let url = format!("{}/oauth2/token", self.auth_base);
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        let response = self.http.post(&url).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        let body: TokenResponse = response.json().await?;
        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::MissingField("access_token"))
    }

    async fn current_account_id(&self, token: &str) -> Result<i64, ApiError> {
        let body = self
            .graphql(token, ACCOUNT_ID_QUERY, Value::Null)
            .await?;
        parse_account_id(&body)
    }

    async fn column_text(
        &self,
        token: &str,
        item_id: i64,
        column_id: &str,
    ) -> Result<Option<String>, ApiError> {
        let variables = json!({
            "itemId": [item_id.to_string()],
            "columnId": [column_id],
        });
        let body = self.graphql(token, COLUMN_TEXT_QUERY, variables).await?;
        Ok(parse_column_text(&body))
    }

    async fn set_column_text(
        &self,
        token: &str,
        board_id: i64,
        item_id: i64,
        column_id: &str,
        value: &str,
    ) -> Result<(), ApiError> {
        let variables = json!({
            "boardId": board_id.to_string(),
            "itemId": item_id.to_string(),
            "columnId": column_id,
            "value": value,
        });
        let body = self
            .graphql(token, CHANGE_COLUMN_MUTATION, variables)
            .await?;
        body.pointer("/data/change_simple_column_value/id")
            .filter(|id| !id.is_null())
            .map(|_| ())
            .ok_or(ApiError::MissingField("change_simple_column_value.id"))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// The API historically returned account ids as numbers and more recently as
/// strings; accept both.
fn parse_account_id(body: &Value) -> Result<i64, ApiError> {
    let id = body
        .pointer("/data/me/account/id")
        .ok_or(ApiError::MissingField("me.account.id"))?;
    match id {
        Value::Number(n) => n.as_i64().ok_or(ApiError::MissingField("me.account.id")),
        Value::String(s) => s
            .parse()
            .map_err(|_| ApiError::MissingField("me.account.id")),
        _ => Err(ApiError::MissingField("me.account.id")),
    }
}

fn parse_column_text(body: &Value) -> Option<String> {
    body.pointer("/data/items/0/column_values/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
}
