// iControl REST authentication
//
// Token-based login against /mgmt/shared/authn/login. The device answers
// with an opaque token that must be replayed as `X-F5-Auth-Token` on every
// subsequent request. Basic auth remains available for old TMOS releases
// that predate the token service.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Which authentication strategy a session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMethod {
    /// Token login via `/mgmt/shared/authn/login` (TMOS 11.6+).
    #[default]
    Token,
    /// HTTP basic auth on every request (pre-token devices).
    Basic,
}

/// Credentials for authenticating with a BIG-IP or BIG-IQ device.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    /// Login provider name for token auth. `"tmos"` for local accounts;
    /// remote-auth deployments use the provider configured on the device.
    pub login_provider: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            login_provider: "tmos".into(),
        }
    }

    pub fn with_login_provider(mut self, provider: impl Into<String>) -> Self {
        self.login_provider = provider.into();
        self
    }
}

// ── Login response shape ─────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<TokenEnvelope>,
}

#[derive(Deserialize)]
struct TokenEnvelope {
    token: String,
}

/// Perform the token login handshake and return the auth token.
///
/// `POST {base}/mgmt/shared/authn/login` with username, password, and
/// login provider. Any non-2xx response maps to [`Error::Authentication`];
/// a 2xx response without a token is [`Error::MissingToken`].
pub(crate) async fn request_token(
    http: &reqwest::Client,
    base_url: &Url,
    credentials: &Credentials,
) -> Result<String, Error> {
    let url = base_url.join("/mgmt/shared/authn/login")?;
    debug!("logging in at {url}");

    let body = json!({
        "username": credentials.username,
        "password": credentials.password.expose_secret(),
        "loginProviderName": credentials.login_provider,
    });

    let resp = http
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(Error::Transport)?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Authentication {
            message: format!("login failed (HTTP {status}): {body}"),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;
    let login: LoginResponse =
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.clone(),
        })?;

    let token = login.token.ok_or(Error::MissingToken)?.token;
    debug!("login successful");
    Ok(token)
}
