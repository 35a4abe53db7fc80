//! HTTP authentication endpoints
//!
//! The login/logout exchange is plain request/response against the chat
//! service's auth API, separate from the persistent connection. Login
//! trades a display name for a token and a confirmed identity; logout is
//! a best-effort notification whose response is ignored.

use serde::Deserialize;
use tokio::time::{timeout, Duration};

use banter_protocol::UserIdentity;
use banter_utils::{BanterError, Result};

/// The original design gave these requests no deadline; without one a
/// stalled login would wedge the session in Connecting forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Token plus confirmed identity, held for the lifetime of one session
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub user: UserIdentity,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(rename = "userId")]
    user_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the auth endpoints
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Exchange a display name for a credential.
    ///
    /// The name is trimmed before it is sent; a whitespace-only name is
    /// rejected without touching the network. Non-2xx responses surface
    /// the server's `message` field, with a generic fallback when the
    /// body is not parseable.
    pub async fn login(&self, name: &str) -> Result<Credential> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BanterError::auth_rejected("display name is empty"));
        }

        let url = format!("{}/api/auth/login", self.base_url);

        let response = timeout(
            REQUEST_TIMEOUT,
            self.http
                .post(&url)
                .json(&serde_json::json!({ "name": name }))
                .send(),
        )
        .await
        .map_err(|_| BanterError::transport("login request timed out"))?
        .map_err(|e| BanterError::transport(format!("login request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.message,
                Err(_) => format!("login failed ({})", status),
            };
            return Err(BanterError::AuthRejected(message));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| BanterError::protocol(format!("malformed login response: {}", e)))?;

        Ok(Credential {
            token: body.token,
            user: UserIdentity::new(body.user_id, body.name),
        })
    }

    /// Notify the server of logout. Best effort: the caller only logs a
    /// failure, it never blocks local teardown.
    pub async fn logout(&self, token: &str) -> Result<()> {
        let url = format!("{}/api/auth/logout", self.base_url);

        timeout(
            REQUEST_TIMEOUT,
            self.http
                .post(&url)
                .json(&serde_json::json!({ "token": token }))
                .send(),
        )
        .await
        .map_err(|_| BanterError::transport("logout request timed out"))?
        .map_err(|e| BanterError::transport(format!("logout request failed: {}", e)))?;

        Ok(())
    }
}
