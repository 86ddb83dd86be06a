// Local Traffic Manager endpoints (`/mgmt/tm/ltm/`).
//
// Pools (with their members sub-collection), nodes, virtual servers,
// and the monitor family. Kind tags follow the device's
// `tm:ltm:<endpoint>:<endpoint>state` convention; collections carry
// the matching `...collectionstate` tag.

use url::Url;

use icontrol_api::Session;
use icontrol_core::{
    ChildReference, Collection, Error, Node, NodeDescriptor, OrganizingCollection,
};

// ── Pools ────────────────────────────────────────────────────────────

/// Pool member, addressed under a bound pool's `members` sub-collection.
pub static MEMBER: NodeDescriptor = NodeDescriptor::resource(
    "tm.ltm.pool.member",
    "members",
    "tm:ltm:pool:members:membersstate",
)
.with_required_create(&["name", "partition"])
.with_boolean_pairs(&[("enabled", "disabled")])
.with_stats();

pub static MEMBERS: NodeDescriptor = NodeDescriptor::collection(
    "tm.ltm.pool.members",
    "members",
    "tm:ltm:pool:members:memberscollectionstate",
    &[("tm:ltm:pool:members:membersstate", &MEMBER)],
);

pub static POOL: NodeDescriptor =
    NodeDescriptor::resource("tm.ltm.pool", "pool", "tm:ltm:pool:poolstate")
        .with_required_create(&["name"])
        .with_read_only(&["membersReference"])
        .with_children(&[&MEMBERS])
        .with_stats();

pub static POOLS: NodeDescriptor = NodeDescriptor::collection(
    "tm.ltm.pools",
    "pool",
    "tm:ltm:pool:poolcollectionstate",
    &[("tm:ltm:pool:poolstate", &POOL)],
);

// ── Nodes ────────────────────────────────────────────────────────────

/// LTM node. `modify` accepts only forced-state values; `update`
/// performs no such check (deliberately preserved device-SDK
/// asymmetry).
pub static NODE: NodeDescriptor =
    NodeDescriptor::resource("tm.ltm.node", "node", "tm:ltm:node:nodestate")
        .with_required_create(&["name", "address"])
        .with_modify_state_values(&["user-up", "user-down"])
        .with_stats();

pub static NODES: NodeDescriptor = NodeDescriptor::collection(
    "tm.ltm.nodes",
    "node",
    "tm:ltm:node:nodecollectionstate",
    &[("tm:ltm:node:nodestate", &NODE)],
);

// ── Virtual servers ──────────────────────────────────────────────────

pub static VIRTUAL: NodeDescriptor =
    NodeDescriptor::resource("tm.ltm.virtual", "virtual", "tm:ltm:virtual:virtualstate")
        .with_required_create(&["name"])
        .with_boolean_pairs(&[("enabled", "disabled")])
        .with_read_only(&["policiesReference", "profilesReference"])
        .with_stats();

pub static VIRTUALS: NodeDescriptor = NodeDescriptor::collection(
    "tm.ltm.virtuals",
    "virtual",
    "tm:ltm:virtual:virtualcollectionstate",
    &[("tm:ltm:virtual:virtualstate", &VIRTUAL)],
);

// ── Monitors ─────────────────────────────────────────────────────────
//
// One collection per monitor type under the `monitor` organizing
// collection. The family is much larger on a real device; these four
// carry the whole pattern.

pub static MONITOR_HTTP: NodeDescriptor = NodeDescriptor::resource(
    "tm.ltm.monitor.http",
    "http",
    "tm:ltm:monitor:http:httpstate",
)
.with_required_create(&["name"]);

pub static MONITOR_HTTPS: NodeDescriptor = NodeDescriptor::resource(
    "tm.ltm.monitor.https",
    "https",
    "tm:ltm:monitor:https:httpsstate",
)
.with_required_create(&["name"]);

pub static MONITOR_TCP: NodeDescriptor =
    NodeDescriptor::resource("tm.ltm.monitor.tcp", "tcp", "tm:ltm:monitor:tcp:tcpstate")
        .with_required_create(&["name"]);

pub static MONITOR_GATEWAY_ICMP: NodeDescriptor = NodeDescriptor::resource(
    "tm.ltm.monitor.gateway-icmp",
    "gateway-icmp",
    "tm:ltm:monitor:gateway-icmp:gateway-icmpstate",
)
.with_required_create(&["name"]);

pub static MONITORS_HTTP: NodeDescriptor = NodeDescriptor::collection(
    "tm.ltm.monitors.http",
    "http",
    "tm:ltm:monitor:http:httpcollectionstate",
    &[("tm:ltm:monitor:http:httpstate", &MONITOR_HTTP)],
);

pub static MONITORS_HTTPS: NodeDescriptor = NodeDescriptor::collection(
    "tm.ltm.monitors.https",
    "https",
    "tm:ltm:monitor:https:httpscollectionstate",
    &[("tm:ltm:monitor:https:httpsstate", &MONITOR_HTTPS)],
);

pub static MONITORS_TCP: NodeDescriptor = NodeDescriptor::collection(
    "tm.ltm.monitors.tcp",
    "tcp",
    "tm:ltm:monitor:tcp:tcpcollectionstate",
    &[("tm:ltm:monitor:tcp:tcpstate", &MONITOR_TCP)],
);

pub static MONITORS_GATEWAY_ICMP: NodeDescriptor = NodeDescriptor::collection(
    "tm.ltm.monitors.gateway-icmp",
    "gateway-icmp",
    "tm:ltm:monitor:gateway-icmp:gateway-icmpcollectionstate",
    &[(
        "tm:ltm:monitor:gateway-icmp:gateway-icmpstate",
        &MONITOR_GATEWAY_ICMP,
    )],
);

pub static MONITOR: NodeDescriptor = NodeDescriptor::organizing(
    "tm.ltm.monitor",
    "monitor",
    &[
        &MONITORS_HTTP,
        &MONITORS_HTTPS,
        &MONITORS_TCP,
        &MONITORS_GATEWAY_ICMP,
    ],
);

// ── Module root ──────────────────────────────────────────────────────

pub static LTM: NodeDescriptor = NodeDescriptor::organizing(
    "tm.ltm",
    "ltm",
    &[&POOLS, &NODES, &VIRTUALS, &MONITOR],
);

/// Typed handle for `/mgmt/tm/ltm/`.
pub struct Ltm {
    inner: OrganizingCollection,
}

impl Ltm {
    pub(crate) fn attach(session: Session, container: &Url) -> Result<Self, Error> {
        Ok(Self {
            inner: OrganizingCollection::attach(session, container, &LTM)?,
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

    /// `/mgmt/tm/ltm/pool/`
    pub fn pool(&self) -> Result<Collection, Error> {
        Collection::attach(self.inner.session().clone(), self.inner.uri(), &POOLS)
    }

    /// `/mgmt/tm/ltm/node/`
    pub fn node(&self) -> Result<Collection, Error> {
        Collection::attach(self.inner.session().clone(), self.inner.uri(), &NODES)
    }

    /// `/mgmt/tm/ltm/virtual/`
    pub fn virtual_(&self) -> Result<Collection, Error> {
        Collection::attach(self.inner.session().clone(), self.inner.uri(), &VIRTUALS)
    }

    /// `/mgmt/tm/ltm/monitor/`
    pub fn monitor(&self) -> Result<Monitor, Error> {
        Monitor::attach(self.inner.session().clone(), self.inner.uri())
    }
}

/// Typed handle for the monitor family (`/mgmt/tm/ltm/monitor/`).
pub struct Monitor {
    inner: OrganizingCollection,
}

impl Monitor {
    pub(crate) fn attach(session: Session, container: &Url) -> Result<Self, Error> {
        Ok(Self {
            inner: OrganizingCollection::attach(session, container, &MONITOR)?,
        })
    }

    pub fn uri(&self) -> &Url {
        self.inner.uri()
    }

    pub async fn list_refs(&self) -> Result<Vec<ChildReference>, Error> {
        self.inner.list_refs().await
    }

    pub fn http(&self) -> Result<Collection, Error> {
        Collection::attach(self.inner.session().clone(), self.inner.uri(), &MONITORS_HTTP)
    }

    pub fn https(&self) -> Result<Collection, Error> {
        Collection::attach(
            self.inner.session().clone(),
            self.inner.uri(),
            &MONITORS_HTTPS,
        )
    }

    pub fn tcp(&self) -> Result<Collection, Error> {
        Collection::attach(self.inner.session().clone(), self.inner.uri(), &MONITORS_TCP)
    }

    pub fn gateway_icmp(&self) -> Result<Collection, Error> {
        Collection::attach(
            self.inner.session().clone(),
            self.inner.uri(),
            &MONITORS_GATEWAY_ICMP,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{LTM, MEMBER, MONITOR, NODE, POOL, POOLS};
    use icontrol_core::NodeType;

    #[test]
    fn pool_tree_is_wired() {
        assert_eq!(POOLS.primary_member().map(|d| d.type_id), Some("tm.ltm.pool"));
        assert_eq!(
            POOL.child("members").map(|d| d.node_type),
            Some(NodeType::Collection)
        );
        assert_eq!(
            POOL.child("members").and_then(|d| d.primary_member()).map(|d| d.segment),
            Some(MEMBER.segment)
        );
    }

    #[test]
    fn module_children_resolve_by_device_segment() {
        assert!(LTM.child("pool").is_some());
        assert!(LTM.child("virtual").is_some());
        assert!(LTM.child("monitor").is_some());
        assert!(MONITOR.child("gateway-icmp").is_some());
        assert!(LTM.child("pools").is_none());
    }

    #[test]
    fn node_modify_state_allow_list_is_declared() {
        assert_eq!(NODE.modify_state_values, Some(["user-up", "user-down"].as_slice()));
    }
}
