// Traffic Management (`/mgmt/tm/`) endpoint tree.
//
// One module per device subsystem, each declaring its descriptor
// statics plus a thin typed accessor struct. Descriptors are the single
// source of truth for segments, kind tags, and parameter constraints.

pub mod ltm;
pub mod net;
pub mod sys;

use url::Url;

use icontrol_api::Session;
use icontrol_core::{ChildReference, Error, Node, NodeDescriptor, OrganizingCollection};

/// `/mgmt/tm/` -- the module-level organizing collection.
pub static TM: NodeDescriptor =
    NodeDescriptor::organizing("tm", "tm", &[&ltm::LTM, &net::NET, &sys::SYS]);

/// Typed handle for `/mgmt/tm/`.
pub struct Tm {
    inner: OrganizingCollection,
}

impl Tm {
    pub(crate) fn attach(session: Session, container: &Url) -> Result<Self, Error> {
        Ok(Self {
            inner: OrganizingCollection::attach(session, container, &TM)?,
        })
    }

    pub fn uri(&self) -> &Url {
        self.inner.uri()
    }

    /// The device's module listing (`ltm`, `net`, `sys`, ...).
    pub async fn list_refs(&self) -> Result<Vec<ChildReference>, Error> {
        self.inner.list_refs().await
    }

    /// Dynamic child lookup through the descriptor registry.
    pub fn child(&mut self, name: &str) -> Result<Node, Error> {
        self.inner.child(name)
    }

    /// Local Traffic Manager (`/mgmt/tm/ltm/`).
    pub fn ltm(&self) -> Result<ltm::Ltm, Error> {
        ltm::Ltm::attach(self.inner.session().clone(), self.inner.uri())
    }

    /// Network configuration (`/mgmt/tm/net/`).
    pub fn net(&self) -> Result<net::Net, Error> {
        net::Net::attach(self.inner.session().clone(), self.inner.uri())
    }

    /// System configuration (`/mgmt/tm/sys/`).
    pub fn sys(&self) -> Result<sys::Sys, Error> {
        sys::Sys::attach(self.inner.session().clone(), self.inner.uri())
    }
}
