// System configuration endpoints (`/mgmt/tm/sys/`).
//
// DNS and NTP are unnamed singletons: always present on the device,
// loadable and writable but never created or deleted. Creating one is
// an `UnsupportedOperation`, not a 4xx from the device.

use url::Url;

use icontrol_api::Session;
use icontrol_core::{
    ChildReference, Error, Node, NodeDescriptor, OrganizingCollection, Resource, Verbs,
};

pub static DNS: NodeDescriptor =
    NodeDescriptor::resource("tm.sys.dns", "dns", "tm:sys:dns:dnsstate")
        .unnamed()
        .with_verbs(Verbs::UNNAMED);

pub static NTP: NodeDescriptor =
    NodeDescriptor::resource("tm.sys.ntp", "ntp", "tm:sys:ntp:ntpstate")
        .unnamed()
        .with_verbs(Verbs::UNNAMED);

/// Software version report. Strictly read-only; the stats-shaped
/// payload nests per-slot entries under `entries`.
pub static VERSION: NodeDescriptor =
    NodeDescriptor::resource("tm.sys.version", "version", "tm:sys:version:versionstats")
        .unnamed()
        .with_verbs(Verbs::LOAD_ONLY);

// ── Module root ──────────────────────────────────────────────────────

pub static SYS: NodeDescriptor =
    NodeDescriptor::organizing("tm.sys", "sys", &[&DNS, &NTP, &VERSION]);

/// Typed handle for `/mgmt/tm/sys/`.
pub struct Sys {
    inner: OrganizingCollection,
}

impl Sys {
    pub(crate) fn attach(session: Session, container: &Url) -> Result<Self, Error> {
        Ok(Self {
            inner: OrganizingCollection::attach(session, container, &SYS)?,
        })
    }

    pub fn uri(&self) -> &Url {
        self.inner.uri()
    }

    pub async fn list_refs(&self) -> Result<Vec<ChildReference>, Error> {
        self.inner.list_refs().await
    }

    pub fn child(&mut self, name: &str) -> Result<Node, Error> {
        self.inner.child(name)
    }

    /// `/mgmt/tm/sys/dns/` -- unnamed singleton.
    pub fn dns(&self) -> Resource {
        Resource::attach(self.inner.session().clone(), self.inner.uri(), &DNS)
    }

    /// `/mgmt/tm/sys/ntp/` -- unnamed singleton.
    pub fn ntp(&self) -> Resource {
        Resource::attach(self.inner.session().clone(), self.inner.uri(), &NTP)
    }

    /// `/mgmt/tm/sys/version/` -- read-only.
    pub fn version(&self) -> Resource {
        Resource::attach(self.inner.session().clone(), self.inner.uri(), &VERSION)
    }
}
