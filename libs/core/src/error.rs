use thiserror::Error;

/// Failures from the persisted account/rule store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("malformed {entity} row: {detail}")]
    Malformed {
        entity: &'static str,
        detail: String,
    },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Internal(err.into())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(err.into())
    }
}

/// Failures from the platform's token or GraphQL endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("graphql error: {0}")]
    Graphql(String),
    #[error("malformed response: missing {0}")]
    MissingField(&'static str),
}
