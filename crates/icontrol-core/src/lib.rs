// icontrol-core: Generic resource-binding core for iControl REST.
//
// Maps the device's URI tree onto client-side nodes. Endpoint crates
// declare static `NodeDescriptor` tables; this crate supplies the
// machinery: URI derivation, lazy child dispatch, the CRUD verb state
// machine, kind-tag reconciliation, and the error taxonomy.

pub mod attrs;
pub mod collection;
pub mod descriptor;
pub mod error;
pub mod node;
pub mod resource;
pub mod uri;

// ── Primary re-exports ──────────────────────────────────────────────
pub use attrs::{AttributeBag, Params};
pub use collection::{Collection, CollectionItem};
pub use descriptor::{NodeDescriptor, NodeType, Verbs};
pub use error::Error;
pub use node::{ChildReference, Node, OrganizingCollection, PathElement};
pub use resource::{Resource, Stats};
