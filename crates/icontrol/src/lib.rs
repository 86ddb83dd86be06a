// icontrol: Object-model SDK for BIG-IP/BIG-IQ iControl REST.
//
// The device exposes its configuration as a URI tree under /mgmt/tm/;
// this crate declares that tree as static descriptor tables and hands
// out node handles wired to an authenticated session. All verb
// semantics live in `icontrol-core`; everything here is endpoint data.

pub mod tm;

use url::Url;

use icontrol_core::{NodeDescriptor, PathElement};

// ── Primary re-exports ──────────────────────────────────────────────
pub use icontrol_api::{
    AuthMethod, ConnectionConfig, Credentials, Session, TlsMode, TransportConfig,
};
pub use icontrol_core::{
    AttributeBag, ChildReference, Collection, CollectionItem, Error, Node, OrganizingCollection,
    Params, Resource, Stats, Verbs,
};

static MGMT: NodeDescriptor = NodeDescriptor::organizing("mgmt", "mgmt", &[&tm::TM]);

/// Convenience: turn a `json!` object literal into verb parameters.
///
/// Non-object values yield an empty parameter set, which the verbs then
/// reject through their own required-parameter validation.
pub fn params(value: serde_json::Value) -> Params {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Params::new(),
    }
}

/// Root of the device's management tree (`/mgmt/`).
///
/// ```no_run
/// # async fn example() -> Result<(), icontrol::Error> {
/// use icontrol::{ConnectionConfig, Credentials, ManagementRoot, params};
/// use secrecy::SecretString;
/// use serde_json::json;
///
/// let password: SecretString = "admin".to_string().into();
/// let config = ConnectionConfig::new(
///     "https://bigip.example.net",
///     Credentials::new("admin", password),
/// );
/// let mgmt = ManagementRoot::connect(config).await?;
///
/// let mut pool = mgmt.tm()?.ltm()?.pool()?.resource()?;
/// pool.load(params(json!({ "name": "web", "partition": "Common" })))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ManagementRoot {
    root: PathElement,
}

impl ManagementRoot {
    /// Wrap an already-authenticated session.
    pub fn new(session: Session) -> Result<Self, Error> {
        let base = session.base_url().clone();
        Ok(Self {
            root: PathElement::attach(session, &base, &MGMT)?,
        })
    }

    /// Open a session (token login) and discover the TMOS version, then
    /// wrap it. The version is replayed as the `ver=` query argument on
    /// reads so the device answers with a stable schema.
    pub async fn connect(config: ConnectionConfig) -> Result<Self, Error> {
        let mut session = Session::open(config).await.map_err(Error::Api)?;
        session.fetch_tmos_version().await.map_err(Error::Api)?;
        Self::new(session)
    }

    pub fn session(&self) -> &Session {
        self.root.session()
    }

    pub fn uri(&self) -> &Url {
        self.root.uri()
    }

    /// The `tm` organizing collection (`/mgmt/tm/`).
    pub fn tm(&self) -> Result<tm::Tm, Error> {
        tm::Tm::attach(self.root.session().clone(), self.root.uri())
    }

    /// Dynamic child lookup through the descriptor registry.
    pub fn child(&mut self, name: &str) -> Result<Node, Error> {
        self.root.child(name)
    }
}
