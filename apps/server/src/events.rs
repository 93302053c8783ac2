//! Webhook receiver for the automation lifecycle.
//!
//! Every request is authenticated by an HMAC over the exact raw body before
//! anything else looks at the payload; the registration challenge is only
//! echoed once that check passes. Recognized events always answer 200 so the
//! platform does not retry idempotent failures; the one exception is a store
//! failure on subscribe/unsubscribe, where a retry is the only way the
//! registration heals.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use maf_core::{AutomationRule, RuleType, verify_signature};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;

#[derive(Deserialize)]
struct WebhookBody {
    #[serde(default)]
    challenge: Option<String>,
    #[serde(default)]
    event: Option<WebhookEvent>,
}

#[derive(Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscribePayload {
    #[serde(deserialize_with = "id_string")]
    webhook_id: String,
    board_id: i64,
    account_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnsubscribePayload {
    #[serde(deserialize_with = "id_string")]
    webhook_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutePayload {
    inbound_field_values: InboundFieldValues,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboundFieldValues {
    #[serde(deserialize_with = "id_string")]
    webhook_id: String,
    board_id: i64,
    item_id: i64,
    column_id: String,
}

/// Webhook ids arrive as JSON numbers or strings depending on the event;
/// normalize to the decimal string the store keys on.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected id, got {other}"
        ))),
    }
}

pub async fn handle_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if !verify_signature(&state.config.signing_secret, &body, signature) {
        tracing::warn!("webhook signature mismatch");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid signature" })),
        )
            .into_response();
    }

    let parsed: WebhookBody = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(error = %err, "unparseable webhook body, ignoring");
            return ok_empty();
        }
    };

    if let Some(challenge) = parsed.challenge {
        return (StatusCode::OK, Json(json!({ "challenge": challenge }))).into_response();
    }

    let Some(event) = parsed.event else {
        return ok_empty();
    };

    match event.kind.as_str() {
        "subscribe" => subscribe(&state, event.payload).await,
        "unsubscribe" => unsubscribe(&state, event.payload).await,
        "execute_action" => {
            execute_action(&state, event.payload).await;
            ok_empty()
        }
        other => {
            tracing::debug!(kind = other, "ignoring unknown webhook event");
            ok_empty()
        }
    }
}

fn ok_empty() -> Response {
    (StatusCode::OK, Json(json!({}))).into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal server error" })),
    )
        .into_response()
}

async fn subscribe(state: &AppState, payload: Value) -> Response {
    let payload: SubscribePayload = match serde_json::from_value(payload) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!(error = %err, "malformed subscribe payload");
            return internal_error();
        }
    };
    let rule = AutomationRule {
        webhook_id: payload.webhook_id,
        board_id: payload.board_id,
        account_id: payload.account_id,
        rule_type: RuleType::ToUppercase,
    };
    tracing::info!(
        webhook_id = %rule.webhook_id,
        account_id = rule.account_id,
        "registering automation rule"
    );
    if let Err(err) = state.store.insert_rule(&rule).await {
        tracing::error!(error = %err, "failed to persist automation rule");
        return internal_error();
    }
    (
        StatusCode::OK,
        Json(json!({ "webhookId": rule.webhook_id })),
    )
        .into_response()
}

async fn unsubscribe(state: &AppState, payload: Value) -> Response {
    let payload: UnsubscribePayload = match serde_json::from_value(payload) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(error = %err, "malformed unsubscribe payload, ignoring");
            return ok_empty();
        }
    };
    tracing::info!(webhook_id = %payload.webhook_id, "removing automation rule");
    if let Err(err) = state.store.delete_rule(&payload.webhook_id).await {
        tracing::error!(error = %err, "failed to delete automation rule");
        return internal_error();
    }
    ok_empty()
}

/// The execute pipeline never fails the webhook response: errors are logged
/// and the event is dropped.
async fn execute_action(state: &AppState, payload: Value) {
    let payload: ExecutePayload = match serde_json::from_value(payload) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(error = %err, "malformed execute payload, dropping");
            return;
        }
    };
    let fields = payload.inbound_field_values;
    if let Err(err) = run_transform(state, &fields).await {
        tracing::error!(
            webhook_id = %fields.webhook_id,
            item_id = fields.item_id,
            error = %err,
            "transform pipeline failed"
        );
    }
}

async fn run_transform(state: &AppState, fields: &InboundFieldValues) -> anyhow::Result<()> {
    let Some(rule) = state.store.rule(&fields.webhook_id).await? else {
        tracing::warn!(webhook_id = %fields.webhook_id, "no rule for execute event, dropping");
        return Ok(());
    };
    let Some(account) = state.store.account(rule.account_id).await? else {
        tracing::warn!(account_id = rule.account_id, "rule references unknown account, dropping");
        return Ok(());
    };

    let Some(current) = state
        .api
        .column_text(&account.access_token, fields.item_id, &fields.column_id)
        .await?
    else {
        // nothing to format
        return Ok(());
    };

    let formatted = rule.rule_type.apply(&current);
    if formatted == current {
        tracing::debug!(item_id = fields.item_id, "column already formatted");
        return Ok(());
    }

    state
        .api
        .set_column_text(
            &account.access_token,
            fields.board_id,
            fields.item_id,
            &fields.column_id,
            &formatted,
        )
        .await?;
    tracing::info!(
        item_id = fields.item_id,
        column_id = %fields.column_id,
        "column value formatted"
    );
    Ok(())
}
