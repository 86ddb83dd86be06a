// Network configuration endpoints (`/mgmt/tm/net/`).
//
// VLANs, self-IPs, and routes -- the slice of the net module the SDK
// models. Self-IPs are the one endpoint here with a multi-key creation
// contract (name + address + vlan).

use url::Url;

use icontrol_api::Session;
use icontrol_core::{
    ChildReference, Collection, Error, Node, NodeDescriptor, OrganizingCollection,
};

// ── VLANs ────────────────────────────────────────────────────────────

pub static VLAN: NodeDescriptor =
    NodeDescriptor::resource("tm.net.vlan", "vlan", "tm:net:vlan:vlanstate")
        .with_required_create(&["name"])
        .with_read_only(&["interfacesReference"])
        .with_stats();

pub static VLANS: NodeDescriptor = NodeDescriptor::collection(
    "tm.net.vlans",
    "vlan",
    "tm:net:vlan:vlancollectionstate",
    &[("tm:net:vlan:vlanstate", &VLAN)],
);

// ── Self-IPs ─────────────────────────────────────────────────────────

pub static SELF_IP: NodeDescriptor =
    NodeDescriptor::resource("tm.net.self", "self", "tm:net:self:selfstate")
        .with_required_create(&["name", "address", "vlan"]);

pub static SELF_IPS: NodeDescriptor = NodeDescriptor::collection(
    "tm.net.selfs",
    "self",
    "tm:net:self:selfcollectionstate",
    &[("tm:net:self:selfstate", &SELF_IP)],
);

// ── Routes ───────────────────────────────────────────────────────────

pub static ROUTE: NodeDescriptor =
    NodeDescriptor::resource("tm.net.route", "route", "tm:net:route:routestate")
        .with_required_create(&["name", "network"]);

pub static ROUTES: NodeDescriptor = NodeDescriptor::collection(
    "tm.net.routes",
    "route",
    "tm:net:route:routecollectionstate",
    &[("tm:net:route:routestate", &ROUTE)],
);

// ── Module root ──────────────────────────────────────────────────────

pub static NET: NodeDescriptor =
    NodeDescriptor::organizing("tm.net", "net", &[&VLANS, &SELF_IPS, &ROUTES]);

/// Typed handle for `/mgmt/tm/net/`.
pub struct Net {
    inner: OrganizingCollection,
}

impl Net {
    pub(crate) fn attach(session: Session, container: &Url) -> Result<Self, Error> {
        Ok(Self {
            inner: OrganizingCollection::attach(session, container, &NET)?,
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

    /// `/mgmt/tm/net/vlan/`
    pub fn vlan(&self) -> Result<Collection, Error> {
        Collection::attach(self.inner.session().clone(), self.inner.uri(), &VLANS)
    }

    /// `/mgmt/tm/net/self/`
    pub fn self_ip(&self) -> Result<Collection, Error> {
        Collection::attach(self.inner.session().clone(), self.inner.uri(), &SELF_IPS)
    }

    /// `/mgmt/tm/net/route/`
    pub fn route(&self) -> Result<Collection, Error> {
        Collection::attach(self.inner.session().clone(), self.inner.uri(), &ROUTES)
    }
}
