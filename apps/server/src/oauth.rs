//! Installation flow: the authorize redirect and the OAuth callback.
//!
//! The callback is deliberately synchronous end to end: the browser is only
//! redirected to the success page after the account row is persisted, so a
//! failed installation surfaces as an error instead of a silent no-op.

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use maf_core::Account;
use serde::Deserialize;
use serde_json::json;

use crate::AppState;

#[derive(Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
}

pub async fn install(State(state): State<AppState>) -> Response {
    if state.config.client_id.is_empty() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "client id is not configured" })),
        )
            .into_response();
    }
    let authorize = format!(
        "{}/oauth2/authorize?client_id={}",
        state.config.auth_base.trim_end_matches('/'),
        urlencoding::encode(&state.config.client_id)
    );
    (StatusCode::FOUND, [(header::LOCATION, authorize)]).into_response()
}

pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(code) = query.code.filter(|code| !code.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "missing code").into_response();
    };

    match handle_callback(&state, &code).await {
        Ok(account_id) => {
            tracing::info!(account_id, "installation stored");
            (
                StatusCode::FOUND,
                [(header::LOCATION, state.config.success_url.clone())],
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "oauth callback failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "installation failed").into_response()
        }
    }
}

async fn handle_callback(state: &AppState, code: &str) -> anyhow::Result<i64> {
    let access_token = state.api.exchange_code(code).await?;
    let account_id = state.api.current_account_id(&access_token).await?;
    state
        .store
        .upsert_account(&Account {
            account_id,
            access_token,
        })
        .await?;
    Ok(account_id)
}
