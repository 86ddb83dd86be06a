// iControl REST session
//
// Wraps `reqwest::Client` with device URL construction, token injection,
// and HTTP status mapping. One request per verb, no retries, no caching --
// resource semantics live entirely in `icontrol-core`, which drives this
// session with fully-formed URIs.

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::auth::{AuthMethod, Credentials, request_token};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Connection settings for a single device.
///
/// `base_url` is the device root, e.g. `https://bigip.example.net` or
/// `https://10.0.0.5:8443`. Management traffic always rides the root;
/// there is no path prefix to configure.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub base_url: String,
    pub credentials: Credentials,
    pub auth: AuthMethod,
    pub transport: TransportConfig,
}

impl ConnectionConfig {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            auth: AuthMethod::default(),
            transport: TransportConfig::default(),
        }
    }

    pub fn auth(mut self, auth: AuthMethod) -> Self {
        self.auth = auth;
        self
    }

    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    fn parsed_base_url(&self) -> Result<Url, Error> {
        Ok(Url::parse(&self.base_url)?)
    }
}

// ── Auth state ───────────────────────────────────────────────────────

/// How each request is authenticated once the session is established.
#[derive(Debug, Clone)]
enum AuthState {
    /// Token already injected as a default header on the client.
    Token,
    /// Basic auth applied per request.
    Basic(Credentials),
    /// No authentication (test sessions built from a raw client).
    None,
}

// ── Session ──────────────────────────────────────────────────────────

/// Authenticated HTTP session against one iControl REST device.
///
/// All verbs take absolute URLs (the resource core derives them) and
/// return parsed JSON. Non-2xx responses map to [`Error::Http`] carrying
/// the status and the device's error payload, so callers can branch on
/// status without losing the original body.
#[derive(Debug, Clone)]
pub struct Session {
    http: reqwest::Client,
    base_url: Url,
    auth: AuthState,
    tmos_version: Option<String>,
}

/// Error payload shape for iControl REST failures:
/// `{ "code": 404, "message": "...", "errorStack": [] }`
#[derive(Deserialize)]
struct DeviceError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct VersionNamedProps {
    #[serde(rename = "Version")]
    version: Option<VersionCell>,
}

#[derive(Deserialize)]
struct VersionCell {
    description: String,
}

impl Session {
    /// Connect and authenticate against a device.
    ///
    /// For [`AuthMethod::Token`] this performs the
    /// `/mgmt/shared/authn/login` handshake and rebuilds the client with
    /// the `X-F5-Auth-Token` default header. For [`AuthMethod::Basic`]
    /// credentials are replayed on every request instead.
    pub async fn open(config: ConnectionConfig) -> Result<Self, Error> {
        let base_url = config.parsed_base_url()?;

        match config.auth {
            AuthMethod::Token => {
                let bootstrap = config.transport.build_client()?;
                let token = request_token(&bootstrap, &base_url, &config.credentials).await?;

                let mut headers = reqwest::header::HeaderMap::new();
                let mut value = reqwest::header::HeaderValue::from_str(&token).map_err(|e| {
                    Error::Authentication {
                        message: format!("token is not a valid header value: {e}"),
                    }
                })?;
                value.set_sensitive(true);
                headers.insert("X-F5-Auth-Token", value);

                let http = config.transport.build_client_with_headers(headers)?;
                Ok(Self {
                    http,
                    base_url,
                    auth: AuthState::Token,
                    tmos_version: None,
                })
            }
            AuthMethod::Basic => {
                let http = config.transport.build_client()?;
                Ok(Self {
                    http,
                    base_url,
                    auth: AuthState::Basic(config.credentials),
                    tmos_version: None,
                })
            }
        }
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth).
    ///
    /// Used by tests to point a session at a mock server.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            auth: AuthState::None,
            tmos_version: None,
        })
    }

    /// The device base URL (scheme + host + port).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The active TMOS version, if discovered or set.
    pub fn tmos_version(&self) -> Option<&str> {
        self.tmos_version.as_deref()
    }

    /// Pin the TMOS version without asking the device.
    pub fn with_tmos_version(mut self, version: impl Into<String>) -> Self {
        self.tmos_version = Some(version.into());
        self
    }

    /// Ask the device for its active software version and record it.
    ///
    /// `GET /mgmt/tm/sys/version` -- the version string is replayed as the
    /// `ver=` query parameter on subsequent GETs so the device answers
    /// with a stable schema across firmware upgrades.
    pub async fn fetch_tmos_version(&mut self) -> Result<&str, Error> {
        let url = self.base_url.join("/mgmt/tm/sys/version")?;
        let body = self.get(url, &[]).await?;
        let version = extract_version(&body).ok_or_else(|| Error::Deserialization {
            message: "no version entry in sys/version response".into(),
            body: body.to_string(),
        })?;
        debug!(version, "discovered TMOS version");
        self.tmos_version = Some(version);
        Ok(self
            .tmos_version
            .as_deref()
            .unwrap_or_default())
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    /// Send a GET and parse the JSON response.
    ///
    /// Appends `ver=<TMOS version>` when the version is known and the
    /// caller did not supply one.
    pub async fn get(&self, url: Url, query: &[(String, String)]) -> Result<Value, Error> {
        debug!("GET {url}");

        let mut req = self.request(Method::GET, url).query(query);
        if let Some(ver) = &self.tmos_version {
            if !query.iter().any(|(k, _)| k == "ver") {
                req = req.query(&[("ver", ver.as_str())]);
            }
        }

        let resp = req.send().await.map_err(Error::Transport)?;
        self.handle_response(resp).await
    }

    /// Send a POST with a JSON body and parse the JSON response.
    pub async fn post(&self, url: Url, body: &Value) -> Result<Value, Error> {
        debug!("POST {url}");
        let resp = self
            .request(Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        self.handle_response(resp).await
    }

    /// Send a PUT with a JSON body and parse the JSON response.
    pub async fn put(&self, url: Url, body: &Value) -> Result<Value, Error> {
        debug!("PUT {url}");
        let resp = self
            .request(Method::PUT, url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        self.handle_response(resp).await
    }

    /// Send a PATCH with a JSON body and parse the JSON response.
    pub async fn patch(&self, url: Url, body: &Value) -> Result<Value, Error> {
        debug!("PATCH {url}");
        let resp = self
            .request(Method::PATCH, url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        self.handle_response(resp).await
    }

    /// Send a DELETE. Any 2xx counts as success; the body is discarded.
    pub async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {url}");
        let resp = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        Err(self.status_error(status, resp).await)
    }

    // ── Request plumbing ─────────────────────────────────────────────

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let req = self.http.request(method, url);
        match &self.auth {
            AuthState::Basic(creds) => {
                use secrecy::ExposeSecret;
                req.basic_auth(&creds.username, Some(creds.password.expose_secret()))
            }
            AuthState::Token | AuthState::None => req,
        }
    }

    /// Map the response to parsed JSON, or to an error carrying the
    /// status and device payload.
    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(self.status_error(status, resp).await);
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    async fn status_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let body = resp.text().await.unwrap_or_default();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Authentication {
                message: "token expired or invalid credentials".into(),
            };
        }

        let message = serde_json::from_str::<DeviceError>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| status.to_string());

        Error::Http {
            status: status.as_u16(),
            message,
            body,
        }
    }
}

/// Pull the active version string out of a `sys/version` response.
///
/// The payload nests per-slot entries under `entries.*.nestedStats.entries`
/// with a `Version.description` cell; the first slot wins.
fn extract_version(body: &Value) -> Option<String> {
    let entries = body.get("entries")?.as_object()?;
    for slot in entries.values() {
        let props = slot.get("nestedStats")?.get("entries")?;
        if let Ok(named) = serde_json::from_value::<VersionNamedProps>(props.clone()) {
            if let Some(cell) = named.version {
                return Some(cell.description);
            }
        }
    }
    None
}
