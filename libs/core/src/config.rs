use anyhow::{Context, Result};

const DEFAULT_AUTH_BASE: &str = "https://auth.monday.com";
const DEFAULT_API_BASE: &str = "https://api.monday.com/v2";

/// Process configuration, resolved once at startup and passed explicitly
/// into handlers. Missing credentials abort the process instead of being
/// discovered mid-request.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// OAuth client id (public).
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Shared secret the platform signs webhook bodies with.
    pub signing_secret: String,
    /// Redirect URI registered with the platform for the code exchange.
    pub redirect_uri: String,
    /// Where the browser lands after a successful installation.
    pub success_url: String,
    /// Base URL for the authorize/token endpoints.
    pub auth_base: String,
    /// GraphQL endpoint.
    pub api_base: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let client_id =
            std::env::var("MONDAY_CLIENT_ID").context("MONDAY_CLIENT_ID must be set")?;
        let client_secret =
            std::env::var("MONDAY_CLIENT_SECRET").context("MONDAY_CLIENT_SECRET must be set")?;
        let signing_secret =
            std::env::var("MONDAY_SIGNING_SECRET").context("MONDAY_SIGNING_SECRET must be set")?;
        let redirect_uri = std::env::var("MONDAY_REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost:8080/auth/callback".into());
        let success_url =
            std::env::var("SUCCESS_URL").unwrap_or_else(|_| "/success.html".into());
        let auth_base =
            std::env::var("MONDAY_AUTH_BASE").unwrap_or_else(|_| DEFAULT_AUTH_BASE.into());
        let api_base =
            std::env::var("MONDAY_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into());

        Ok(Self {
            client_id,
            client_secret,
            signing_secret,
            redirect_uri,
            success_url,
            auth_base,
            api_base,
        })
    }
}
