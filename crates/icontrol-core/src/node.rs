// ── Path elements & organizing collections ──
//
// The non-CRUD half of the URI tree. A `PathElement` is any addressable
// segment; children materialize lazily through the descriptor's child
// registry and are cached per parent instance, so repeated traversal
// skips the lookup. An `OrganizingCollection` adds the read-only listing
// of child references that the device exposes at module roots.

use std::collections::HashMap;

use serde_json::Value;
use url::Url;

use icontrol_api::Session;

use crate::collection::Collection;
use crate::descriptor::{NodeDescriptor, NodeType};
use crate::error::Error;
use crate::resource::Resource;
use crate::uri;

/// Any node a child lookup can produce.
#[derive(Debug, Clone)]
pub enum Node {
    Organizing(OrganizingCollection),
    Collection(Collection),
    Resource(Resource),
}

impl Node {
    pub fn descriptor(&self) -> &'static NodeDescriptor {
        match self {
            Self::Organizing(n) => n.descriptor(),
            Self::Collection(n) => n.descriptor(),
            Self::Resource(n) => n.descriptor(),
        }
    }

    pub fn into_organizing(self) -> Option<OrganizingCollection> {
        match self {
            Self::Organizing(n) => Some(n),
            _ => None,
        }
    }

    pub fn into_collection(self) -> Option<Collection> {
        match self {
            Self::Collection(n) => Some(n),
            _ => None,
        }
    }

    pub fn into_resource(self) -> Option<Resource> {
        match self {
            Self::Resource(n) => Some(n),
            _ => None,
        }
    }
}

/// Build the right node shape for a descriptor, bound under `container`.
pub(crate) fn build_node(
    session: &Session,
    container: &Url,
    descriptor: &'static NodeDescriptor,
) -> Result<Node, Error> {
    Ok(match descriptor.node_type {
        NodeType::Organizing => Node::Organizing(OrganizingCollection::attach(
            session.clone(),
            container,
            descriptor,
        )?),
        NodeType::Collection => {
            Node::Collection(Collection::attach(session.clone(), container, descriptor)?)
        }
        NodeType::Resource => {
            Node::Resource(Resource::attach(session.clone(), container, descriptor))
        }
    })
}

// ── PathElement ──────────────────────────────────────────────────────

/// One URI segment without CRUD of its own. Derives its URI from its
/// container and dispatches child lookups through the descriptor's
/// registry.
#[derive(Debug, Clone)]
pub struct PathElement {
    session: Session,
    descriptor: &'static NodeDescriptor,
    uri: Url,
    children: HashMap<String, Node>,
}

impl PathElement {
    /// Bind under a container URI: `container + segment + '/'`.
    pub fn attach(
        session: Session,
        container: &Url,
        descriptor: &'static NodeDescriptor,
    ) -> Result<Self, Error> {
        let uri = uri::join_segment(container, descriptor.segment)?;
        Ok(Self {
            session,
            descriptor,
            uri,
            children: HashMap::new(),
        })
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn descriptor(&self) -> &'static NodeDescriptor {
        self.descriptor
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Look up a child by segment name.
    ///
    /// First access instantiates the child bound under this element and
    /// caches it; later accesses return the cached handle. An
    /// unregistered name is `UnknownChild`.
    pub fn child(&mut self, name: &str) -> Result<Node, Error> {
        if let Some(node) = self.children.get(name) {
            return Ok(node.clone());
        }
        let descriptor = self
            .descriptor
            .child(name)
            .ok_or_else(|| Error::UnknownChild {
                name: name.to_owned(),
                type_id: self.descriptor.type_id,
            })?;
        let node = build_node(&self.session, &self.uri, descriptor)?;
        self.children.insert(name.to_owned(), node.clone());
        Ok(node)
    }
}

// ── OrganizingCollection ─────────────────────────────────────────────

/// A reference in an organizing collection's item list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChildReference {
    pub link: String,
}

/// Non-leaf node aggregating references to its children. Exposes only
/// the read-only listing; all mutation happens on the children.
#[derive(Debug, Clone)]
pub struct OrganizingCollection {
    elem: PathElement,
}

impl OrganizingCollection {
    pub fn attach(
        session: Session,
        container: &Url,
        descriptor: &'static NodeDescriptor,
    ) -> Result<Self, Error> {
        Ok(Self {
            elem: PathElement::attach(session, container, descriptor)?,
        })
    }

    pub fn uri(&self) -> &Url {
        self.elem.uri()
    }

    pub fn descriptor(&self) -> &'static NodeDescriptor {
        self.elem.descriptor()
    }

    pub fn session(&self) -> &Session {
        self.elem.session()
    }

    pub fn child(&mut self, name: &str) -> Result<Node, Error> {
        self.elem.child(name)
    }

    /// Fetch the reference listing: one GET, `items` entries carrying
    /// `reference.link`. Entries without a reference are skipped.
    pub async fn list_refs(&self) -> Result<Vec<ChildReference>, Error> {
        let body = self
            .elem
            .session()
            .get(self.elem.uri().clone(), &[])
            .await?;

        let Some(items) = body.get("items").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        Ok(items
            .iter()
            .filter_map(|item| {
                item.get("reference")
                    .and_then(|r| r.get("link"))
                    .and_then(Value::as_str)
                    .map(|link| ChildReference {
                        link: link.to_owned(),
                    })
            })
            .collect())
    }
}
