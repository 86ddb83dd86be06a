// ── Collections ──
//
// A collection node fetches the device's item list and turns each entry
// into a typed, already-bound resource, dispatching on the entry's kind
// tag through the descriptor's member registry. The device never gets
// the benefit of the doubt: an unregistered kind is a hard failure, and
// only entries with no kind at all pass through as raw references.

use serde_json::{Map, Value};
use url::Url;

use icontrol_api::Session;

use crate::descriptor::NodeDescriptor;
use crate::error::Error;
use crate::resource::Resource;
use crate::uri;

/// One entry of a fetched collection.
#[derive(Debug, Clone)]
pub enum CollectionItem {
    /// A typed member, absorbed and URI-bound.
    Resource(Resource),
    /// An entry with no kind tag, passed through unmodified.
    Reference(Map<String, Value>),
}

/// A node whose GET yields a typed item list.
#[derive(Debug, Clone)]
pub struct Collection {
    session: Session,
    descriptor: &'static NodeDescriptor,
    uri: Url,
}

impl Collection {
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

    /// A fresh, unbound instance of the collection's primary member
    /// type, ready for `create`/`load`/`exists`.
    pub fn resource(&self) -> Result<Resource, Error> {
        let member = self
            .descriptor
            .primary_member()
            .ok_or(Error::UnsupportedOperation {
                operation: "resource",
                type_id: self.descriptor.type_id,
            })?;
        Ok(Resource::attach(self.session.clone(), &self.uri, member))
    }

    /// Fetch and dispatch the item list.
    ///
    /// Each entry with a registered kind becomes a bound [`Resource`];
    /// an entry with an unregistered kind fails the whole call with
    /// `UnregisteredKind`; an entry with no kind passes through raw.
    pub async fn get_collection(&self) -> Result<Vec<CollectionItem>, Error> {
        let body = self.session.get(self.uri.clone(), &[]).await?;

        if let (Some(expected), Some(actual)) = (
            self.descriptor.kind,
            body.get("kind").and_then(Value::as_str),
        ) {
            if actual != expected {
                return Err(Error::KindMismatch {
                    expected: expected.to_owned(),
                    actual: actual.to_owned(),
                });
            }
        }

        let Some(items) = body.get("items") else {
            return Ok(Vec::new());
        };
        let items = items.as_array().ok_or_else(|| Error::MalformedResponse {
            message: "'items' is not an array".into(),
        })?;

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let obj = item.as_object().ok_or_else(|| Error::MalformedResponse {
                message: "collection item is not an object".into(),
            })?;

            match obj.get("kind").and_then(Value::as_str) {
                Some(kind) => {
                    let member = self.descriptor.member_for_kind(kind).ok_or_else(|| {
                        Error::UnregisteredKind {
                            kind: kind.to_owned(),
                        }
                    })?;
                    let mut resource =
                        Resource::attach(self.session.clone(), &self.uri, member);
                    resource.absorb_and_bind(item.clone())?;
                    out.push(CollectionItem::Resource(resource));
                }
                None => out.push(CollectionItem::Reference(obj.clone())),
            }
        }
        Ok(out)
    }
}
