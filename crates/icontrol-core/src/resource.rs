// ── Resources & the CRUD verb state machine ──
//
// The only node type that mutates device state. An instance moves
// Unbound -> Bound -> Deleted, never backwards: the working URI is
// fixed exactly once, when a create or load absorbs the device's
// selfLink. Every verb validates its parameters before the first byte
// goes on the wire, and every absorbed response is checked against the
// descriptor's kind tag.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;
use url::Url;

use icontrol_api::Session;

use crate::attrs::{
    AttributeBag, Params, check_exclusive, check_required, merge_params, reduce_boolean_pairs,
    strip_read_only, strip_references,
};
use crate::descriptor::NodeDescriptor;
use crate::error::Error;
use crate::node::{self, Node};
use crate::uri;

/// URI lifecycle of one instance.
#[derive(Debug, Clone)]
enum BindState {
    Unbound,
    Bound {
        uri: Url,
        query: Vec<(String, String)>,
        fragment: Option<String>,
    },
    Deleted,
}

impl BindState {
    fn name(&self) -> &'static str {
        match self {
            Self::Unbound => "unbound",
            Self::Bound { .. } => "bound",
            Self::Deleted => "deleted",
        }
    }
}

/// A CRUD-capable leaf of the URI tree.
///
/// Fresh instances come from [`Collection::resource`] or a parent's
/// child lookup and are unbound: they know their container URI and
/// nothing else. `create` or `load` binds them; thereafter the
/// attribute bag mirrors the device's last-returned state.
///
/// [`Collection::resource`]: crate::collection::Collection::resource
#[derive(Debug, Clone)]
pub struct Resource {
    session: Session,
    descriptor: &'static NodeDescriptor,
    container_uri: Url,
    state: BindState,
    attrs: AttributeBag,
    children: HashMap<String, Node>,
}

impl Resource {
    pub fn attach(
        session: Session,
        container: &Url,
        descriptor: &'static NodeDescriptor,
    ) -> Self {
        Self {
            session,
            descriptor,
            container_uri: container.clone(),
            state: BindState::Unbound,
            attrs: AttributeBag::default(),
            children: HashMap::new(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn descriptor(&self) -> &'static NodeDescriptor {
        self.descriptor
    }

    /// The mirrored device state. Empty until bound.
    pub fn attrs(&self) -> &AttributeBag {
        &self.attrs
    }

    pub fn name(&self) -> Option<&str> {
        self.attrs.name()
    }

    pub fn kind(&self) -> Option<&str> {
        self.attrs.kind()
    }

    /// The working URI, fixed at activation. `None` until bound.
    pub fn uri(&self) -> Option<&Url> {
        match &self.state {
            BindState::Bound { uri, .. } => Some(uri),
            _ => None,
        }
    }

    /// Query arguments split off the selfLink at activation.
    pub fn uri_query(&self) -> &[(String, String)] {
        match &self.state {
            BindState::Bound { query, .. } => query,
            _ => &[],
        }
    }

    /// Fragment split off the selfLink at activation, if any.
    pub fn uri_fragment(&self) -> Option<&str> {
        match &self.state {
            BindState::Bound { fragment, .. } => fragment.as_deref(),
            _ => None,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.state, BindState::Bound { .. })
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.state, BindState::Deleted)
    }

    // ── create ───────────────────────────────────────────────────────

    /// POST this instance into existence under its container.
    ///
    /// Valid only while unbound. Parameter validation (required keys,
    /// exclusive sets, boolean reduction) runs before any network call.
    /// On success the response is absorbed, its kind verified, and the
    /// instance binds to the rewritten selfLink.
    pub async fn create(&mut self, params: Params) -> Result<(), Error> {
        self.ensure_verb(self.descriptor.verbs.create, "create")?;
        self.ensure_unbound("create")?;

        check_required(&params, self.descriptor.required_create)?;
        check_exclusive(&params, self.descriptor.exclusive_attrs)?;

        let mut body = params;
        reduce_boolean_pairs(&mut body, self.descriptor.boolean_pairs)?;

        debug!(type_id = self.descriptor.type_id, "create");
        let response = self
            .session
            .post(self.container_uri.clone(), &Value::Object(body))
            .await?;
        self.absorb_and_bind(response)
    }

    // ── load ─────────────────────────────────────────────────────────

    /// GET an existing instance and bind to it.
    ///
    /// Named resources address `container + ~partition~name`; unnamed
    /// singletons live at `container + segment`. Parameters beyond
    /// name/partition travel as query arguments.
    pub async fn load(&mut self, params: Params) -> Result<(), Error> {
        self.ensure_verb(self.descriptor.verbs.load, "load")?;
        self.ensure_unbound("load")?;

        check_required(&params, self.descriptor.required_load)?;

        let url = self.target_url(&params)?;
        let query = self.query_pairs(&params);

        debug!(type_id = self.descriptor.type_id, "load");
        let response = self.session.get(url, &query).await?;
        self.absorb_and_bind(response)
    }

    // ── exists ───────────────────────────────────────────────────────

    /// Probe the computed target URI. 404 is `false`, any 2xx is
    /// `true`, and every other failure is re-raised unchanged.
    pub async fn exists(&self, params: Params) -> Result<bool, Error> {
        check_required(&params, self.descriptor.required_load)?;

        let url = self.target_url(&params)?;
        let query = self.query_pairs(&params);

        match self.session.get(url, &query).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    // ── refresh ──────────────────────────────────────────────────────

    /// Re-fetch the bound URI and mirror the response. The URI itself
    /// never changes.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        let (url, query) = {
            let (url, query) = self.bound("refresh")?;
            (url.clone(), query.to_vec())
        };

        let response = self.session.get(url, &query).await?;
        self.attrs.absorb(response)?;
        self.verify_kind()
    }

    // ── update ───────────────────────────────────────────────────────

    /// PUT the full mirrored state, merged with `params`.
    ///
    /// Checks the device's generation counter first -- an `update`
    /// against state another writer has since changed fails with
    /// `GenerationMismatch` rather than clobbering it.
    pub async fn update(&mut self, params: Params) -> Result<(), Error> {
        self.update_with_force(params, false).await
    }

    /// [`update`](Self::update) with an explicit generation-check
    /// override. `force = true` skips the check.
    pub async fn update_with_force(&mut self, params: Params, force: bool) -> Result<(), Error> {
        self.ensure_verb(self.descriptor.verbs.update, "update")?;
        let url = self.bound("update").map(|(url, _)| url.clone())?;
        check_exclusive(&params, self.descriptor.exclusive_attrs)?;

        if !force {
            self.check_generation().await?;
        }

        let mut body = merge_params(self.attrs.as_map(), params);
        strip_read_only(&mut body, self.descriptor.read_only);
        strip_references(&mut body);
        reduce_boolean_pairs(&mut body, self.descriptor.boolean_pairs)?;

        debug!(type_id = self.descriptor.type_id, "update");
        let response = self.session.put(url, &Value::Object(body)).await?;
        self.attrs.absorb(response)?;
        self.verify_kind()
    }

    // ── modify ───────────────────────────────────────────────────────

    /// PATCH only the supplied parameters.
    ///
    /// Same generation check as `update`. Where the descriptor declares
    /// a `state` allow-list, values outside it are rejected here --
    /// `update` deliberately performs no such check.
    pub async fn modify(&mut self, params: Params) -> Result<(), Error> {
        self.modify_with_force(params, false).await
    }

    /// [`modify`](Self::modify) with an explicit generation-check
    /// override.
    pub async fn modify_with_force(&mut self, params: Params, force: bool) -> Result<(), Error> {
        self.ensure_verb(self.descriptor.verbs.modify, "modify")?;
        let url = self.bound("modify").map(|(url, _)| url.clone())?;
        check_exclusive(&params, self.descriptor.exclusive_attrs)?;

        if let Some(allowed) = self.descriptor.modify_state_values {
            if let Some(state) = params.get("state").and_then(Value::as_str) {
                if !allowed.contains(&state) {
                    return Err(Error::InvalidParameterValue {
                        param: "state".into(),
                        message: format!("'{state}' is not one of {allowed:?}"),
                    });
                }
            }
        }

        if !force {
            self.check_generation().await?;
        }

        let mut body = params;
        strip_read_only(&mut body, self.descriptor.read_only);
        reduce_boolean_pairs(&mut body, self.descriptor.boolean_pairs)?;

        debug!(type_id = self.descriptor.type_id, "modify");
        let response = self.session.patch(url, &Value::Object(body)).await?;
        self.attrs.absorb(response)?;
        self.verify_kind()
    }

    // ── delete ───────────────────────────────────────────────────────

    /// DELETE the bound instance.
    ///
    /// Unlike `update`, the generation check defaults to *skipped*
    /// (`force = true`) -- use [`delete_with_force`](Self::delete_with_force)
    /// with `force = false` to opt in. On success every attribute is
    /// dropped in favor of the deleted sentinel.
    pub async fn delete(&mut self) -> Result<(), Error> {
        self.delete_with_force(true).await
    }

    /// [`delete`](Self::delete) with an explicit generation-check
    /// override. `force = false` enables the check.
    pub async fn delete_with_force(&mut self, force: bool) -> Result<(), Error> {
        self.ensure_verb(self.descriptor.verbs.delete, "delete")?;
        let url = self.bound("delete").map(|(url, _)| url.clone())?;

        if !force {
            self.check_generation().await?;
        }

        debug!(type_id = self.descriptor.type_id, "delete");
        self.session.delete(url).await?;

        self.attrs.mark_deleted();
        self.state = BindState::Deleted;
        Ok(())
    }

    // ── stats ────────────────────────────────────────────────────────

    /// Fetch the read-only stats view at `uri + stats/`.
    ///
    /// Only stats-capable descriptors expose this, and only once bound.
    pub async fn load_stats(&self) -> Result<Stats, Error> {
        if !self.descriptor.stats {
            return Err(Error::UnsupportedOperation {
                operation: "stats",
                type_id: self.descriptor.type_id,
            });
        }
        let (url, query) = self.bound("stats")?;
        let stats_url = uri::join_segment(url, "stats")?;
        let body = self.session.get(stats_url, query).await?;
        Stats::from_response(body)
    }

    // ── children ─────────────────────────────────────────────────────

    /// Look up a sub-node (e.g. a members sub-collection) by segment.
    ///
    /// Requires a bound URI to hang the child under; cached like
    /// [`PathElement::child`](crate::node::PathElement::child).
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
        let uri = {
            let (url, _) = self.bound("child")?;
            url.clone()
        };
        let node = node::build_node(&self.session, &uri, descriptor)?;
        self.children.insert(name.to_owned(), node.clone());
        Ok(node)
    }

    // ── Binding plumbing ─────────────────────────────────────────────

    /// Absorb a full device representation, verify its kind, and fix
    /// the working URI from its selfLink. Used by create/load and by
    /// collection dispatch.
    pub(crate) fn absorb_and_bind(&mut self, response: Value) -> Result<(), Error> {
        self.attrs.absorb(response)?;
        self.verify_kind()?;
        self.activate()
    }

    fn verify_kind(&self) -> Result<(), Error> {
        let Some(expected) = self.descriptor.kind else {
            return Ok(());
        };
        let actual = self.attrs.kind().unwrap_or_default();
        if actual == expected {
            Ok(())
        } else {
            Err(Error::KindMismatch {
                expected: expected.to_owned(),
                actual: actual.to_owned(),
            })
        }
    }

    /// Fix the working URI from the absorbed selfLink. Exactly-once:
    /// a second activation on the same instance is always an error.
    fn activate(&mut self) -> Result<(), Error> {
        if let BindState::Bound { uri, .. } = &self.state {
            return Err(Error::UriReassignment {
                uri: uri.to_string(),
            });
        }
        let link = self
            .attrs
            .self_link()
            .ok_or_else(|| Error::MalformedResponse {
                message: "device representation carried no selfLink".into(),
            })?;
        let activated = uri::activate_self_link(link, self.session.base_url())?;
        debug!(uri = %activated.uri, "resource bound");
        self.state = BindState::Bound {
            uri: activated.uri,
            query: activated.query,
            fragment: activated.fragment,
        };
        Ok(())
    }

    /// Compare the device's current generation against the mirrored
    /// one. Objects the device does not version skip the check.
    async fn check_generation(&self) -> Result<(), Error> {
        let (url, query) = self.bound("generation check")?;
        let current = self.session.get(url.clone(), query).await?;
        let remote = current.get("generation").and_then(Value::as_i64);
        match (self.attrs.generation(), remote) {
            (Some(local), Some(remote)) if local != remote => {
                Err(Error::GenerationMismatch { local, remote })
            }
            _ => Ok(()),
        }
    }

    // ── Target computation & guards ──────────────────────────────────

    /// The URI a load/exists addresses, derived from the container and
    /// the name/partition parameters (or the bare segment for unnamed
    /// singletons).
    fn target_url(&self, params: &Params) -> Result<Url, Error> {
        if !self.descriptor.named {
            return uri::join_segment(&self.container_uri, self.descriptor.segment);
        }
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MissingParameter {
                missing: vec!["name".into()],
            })?;
        let partition = params.get("partition").and_then(Value::as_str);
        let element = uri::element_path(name, partition);
        self.container_uri
            .join(&element)
            .map_err(icontrol_api::Error::from)
            .map_err(Error::from)
    }

    /// Parameters that travel as query arguments: everything except the
    /// name/partition pair consumed by the URI.
    fn query_pairs(&self, params: &Params) -> Vec<(String, String)> {
        params
            .iter()
            .filter(|(k, _)| {
                !(self.descriptor.named && (k.as_str() == "name" || k.as_str() == "partition"))
            })
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()
    }

    fn ensure_verb(&self, allowed: bool, operation: &'static str) -> Result<(), Error> {
        if allowed {
            Ok(())
        } else {
            Err(Error::UnsupportedOperation {
                operation,
                type_id: self.descriptor.type_id,
            })
        }
    }

    fn ensure_unbound(&self, operation: &'static str) -> Result<(), Error> {
        match &self.state {
            BindState::Unbound => Ok(()),
            BindState::Bound { uri, .. } => Err(Error::UriReassignment {
                uri: uri.to_string(),
            }),
            BindState::Deleted => Err(Error::InvalidState {
                operation,
                state: "deleted",
            }),
        }
    }

    fn bound(&self, operation: &'static str) -> Result<(&Url, &[(String, String)]), Error> {
        match &self.state {
            BindState::Bound { uri, query, .. } => Ok((uri, query.as_slice())),
            other => Err(Error::InvalidState {
                operation,
                state: other.name(),
            }),
        }
    }
}

// ── Stats view ───────────────────────────────────────────────────────

/// Read-only statistics snapshot for a stats-capable resource.
///
/// The device nests counters under `entries`; this view keeps the raw
/// shape and offers accessors only for the envelope fields.
#[derive(Debug, Clone)]
pub struct Stats {
    attrs: AttributeBag,
}

impl Stats {
    fn from_response(body: Value) -> Result<Self, Error> {
        let mut attrs = AttributeBag::default();
        attrs.absorb(body)?;
        Ok(Self { attrs })
    }

    pub fn kind(&self) -> Option<&str> {
        self.attrs.kind()
    }

    pub fn entries(&self) -> Option<&Value> {
        self.attrs.get("entries")
    }

    pub fn as_map(&self) -> &serde_json::Map<String, Value> {
        self.attrs.as_map()
    }
}
