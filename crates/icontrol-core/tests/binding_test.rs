#![allow(clippy::unwrap_used)]
// Integration tests for the resource-binding core using wiremock.
//
// A small test descriptor tree ("gadgets" under /mgmt/tm/test/) stands
// in for real device endpoints so the verb state machine, kind
// dispatch, and URI activation can be driven end to end.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use icontrol_api::Session;
use icontrol_core::{
    Collection, CollectionItem, Error, NodeDescriptor, OrganizingCollection, Params, Resource,
    Verbs,
};

// ── Test descriptor tree ────────────────────────────────────────────

static PART: NodeDescriptor =
    NodeDescriptor::resource("test.gadget.part", "part", "test:gadget:part:partstate");

static PARTS: NodeDescriptor = NodeDescriptor::collection(
    "test.gadget.parts",
    "part",
    "test:gadget:part:partcollectionstate",
    &[("test:gadget:part:partstate", &PART)],
);

static GADGET: NodeDescriptor =
    NodeDescriptor::resource("test.gadget", "gadget", "test:gadget:gadgetstate")
        .with_required_create(&["name"])
        .with_boolean_pairs(&[("enabled", "disabled")])
        .with_exclusive_attrs(&[&["vlansEnabled", "vlansDisabled"]])
        .with_read_only(&["fullPath"])
        .with_stats()
        .with_children(&[&PARTS]);

static GADGETS: NodeDescriptor = NodeDescriptor::collection(
    "test.gadgets",
    "gadget",
    "test:gadget:gadgetcollectionstate",
    &[("test:gadget:gadgetstate", &GADGET)],
);

static REPORT: NodeDescriptor =
    NodeDescriptor::resource("test.report", "report", "test:report:reportstate")
        .with_verbs(Verbs::LOAD_ONLY);

static REPORTS: NodeDescriptor = NodeDescriptor::collection(
    "test.reports",
    "report",
    "test:report:reportcollectionstate",
    &[("test:report:reportstate", &REPORT)],
);

static MACHINE: NodeDescriptor =
    NodeDescriptor::resource("test.machine", "machine", "test:machine:machinestate")
        .with_modify_state_values(&["user-up", "user-down"]);

static MACHINES: NodeDescriptor = NodeDescriptor::collection(
    "test.machines",
    "machine",
    "test:machine:machinecollectionstate",
    &[("test:machine:machinestate", &MACHINE)],
);

static MODULE: NodeDescriptor =
    NodeDescriptor::organizing("test.module", "module", &[&GADGETS, &MACHINES]);

// ── Helpers ─────────────────────────────────────────────────────────

fn obj(v: Value) -> Params {
    v.as_object().cloned().unwrap()
}

async fn setup() -> (MockServer, Session) {
    let server = MockServer::start().await;
    let session = Session::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, session)
}

fn tm_base(session: &Session) -> Url {
    session.base_url().join("/mgmt/tm/test/").unwrap()
}

fn gadgets(session: &Session) -> Collection {
    Collection::attach(session.clone(), &tm_base(session), &GADGETS).unwrap()
}

fn gadget_body() -> Value {
    json!({
        "kind": "test:gadget:gadgetstate",
        "name": "g1",
        "partition": "Common",
        "fullPath": "/Common/g1",
        "generation": 1,
        "selfLink": "https://localhost/mgmt/tm/test/gadget/~Common~g1?ver=17.1.0",
        "enabled": true,
        "partsReference": {
            "link": "https://localhost/mgmt/tm/test/gadget/~Common~g1/part?ver=17.1.0",
            "isSubcollection": true
        }
    })
}

/// Load `g1` against a mounted GET mock, returning the bound instance.
async fn bound_gadget(server: &MockServer, session: &Session) -> Resource {
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/gadget/~Common~g1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gadget_body()))
        .mount(server)
        .await;

    let mut gadget = gadgets(session).resource().unwrap();
    gadget
        .load(obj(json!({ "name": "g1", "partition": "Common" })))
        .await
        .unwrap();
    gadget
}

/// Matches request bodies that do NOT contain any of the given keys.
struct BodyLacksKeys(&'static [&'static str]);

impl wiremock::Match for BodyLacksKeys {
    fn matches(&self, request: &wiremock::Request) -> bool {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return false;
        };
        self.0.iter().all(|k| body.get(*k).is_none())
    }
}

// ── create ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_binds_and_mirrors_device_state() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/tm/test/gadget/"))
        .and(body_partial_json(json!({ "name": "g1", "partition": "Common" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gadget_body()))
        .mount(&server)
        .await;

    let mut gadget = gadgets(&session).resource().unwrap();
    gadget
        .create(obj(json!({ "name": "g1", "partition": "Common" })))
        .await
        .unwrap();

    assert_eq!(gadget.name(), Some("g1"));
    assert_eq!(gadget.kind(), Some("test:gadget:gadgetstate"));

    // selfLink's placeholder host is rewritten onto the real target,
    // with a trailing slash; the ver argument is split off.
    let uri = gadget.uri().unwrap();
    let base = session.base_url();
    assert_eq!(uri.host_str(), base.host_str());
    assert_eq!(uri.port(), base.port());
    assert_eq!(uri.path(), "/mgmt/tm/test/gadget/~Common~g1/");
    assert_eq!(
        gadget.uri_query(),
        &[("ver".to_owned(), "17.1.0".to_owned())]
    );
}

#[tokio::test]
async fn test_create_missing_parameter_is_raised_before_any_request() {
    let (server, session) = setup().await;

    let mut gadget = gadgets(&session).resource().unwrap();
    let err = gadget
        .create(obj(json!({ "partition": "Common" })))
        .await
        .unwrap_err();

    match err {
        Error::MissingParameter { missing } => assert_eq!(missing, vec!["name"]),
        other => panic!("expected MissingParameter, got: {other:?}"),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_kind_mismatch() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "test:other:otherstate",
            "name": "g1",
            "selfLink": "https://localhost/mgmt/tm/test/gadget/~Common~g1",
        })))
        .mount(&server)
        .await;

    let mut gadget = gadgets(&session).resource().unwrap();
    let err = gadget
        .create(obj(json!({ "name": "g1" })))
        .await
        .unwrap_err();

    match err {
        Error::KindMismatch { expected, actual } => {
            assert_eq!(expected, "test:gadget:gadgetstate");
            assert_eq!(actual, "test:other:otherstate");
        }
        other => panic!("expected KindMismatch, got: {other:?}"),
    }
    // The failed instance never bound.
    assert!(gadget.uri().is_none());
}

#[tokio::test]
async fn test_create_exclusive_attributes_rejected() {
    let (server, session) = setup().await;

    let mut gadget = gadgets(&session).resource().unwrap();
    let err = gadget
        .create(obj(json!({
            "name": "g1",
            "vlansEnabled": true,
            "vlansDisabled": true,
        })))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ExclusiveAttributes { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── URI activation is exactly-once ──────────────────────────────────

#[tokio::test]
async fn test_second_bind_attempt_is_uri_reassignment() {
    let (server, session) = setup().await;
    let mut gadget = bound_gadget(&server, &session).await;

    // load after load
    let err = gadget
        .load(obj(json!({ "name": "g1", "partition": "Common" })))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UriReassignment { .. }));

    // create after load, regardless of arguments
    let err = gadget
        .create(obj(json!({ "name": "other" })))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UriReassignment { .. }));
}

// ── exists ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_exists_tristate() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/gadget/~Common~here"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "here" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/gadget/~Common~gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404, "message": "not found"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/gadget/~Common~broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gadget = gadgets(&session).resource().unwrap();

    let found = gadget
        .exists(obj(json!({ "name": "here", "partition": "Common" })))
        .await
        .unwrap();
    assert!(found);

    let found = gadget
        .exists(obj(json!({ "name": "gone", "partition": "Common" })))
        .await
        .unwrap();
    assert!(!found);

    // Anything that is neither 2xx nor 404 re-raises unchanged.
    let err = gadget
        .exists(obj(json!({ "name": "broken", "partition": "Common" })))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

// ── refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_is_idempotent_without_device_change() {
    let (server, session) = setup().await;
    let mut gadget = bound_gadget(&server, &session).await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/gadget/~Common~g1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gadget_body()))
        .mount(&server)
        .await;

    gadget.refresh().await.unwrap();
    let first = gadget.attrs().as_map().clone();
    gadget.refresh().await.unwrap();
    let second = gadget.attrs().as_map().clone();

    assert_eq!(first, second);
    assert_eq!(gadget.uri().unwrap().path(), "/mgmt/tm/test/gadget/~Common~g1/");
}

#[tokio::test]
async fn test_refresh_requires_a_bound_instance() {
    let (_server, session) = setup().await;
    let mut gadget = gadgets(&session).resource().unwrap();

    let err = gadget.refresh().await.unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidState { state: "unbound", .. }
    ));
}

// ── update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_strips_read_only_and_references() {
    let (server, session) = setup().await;
    let mut gadget = bound_gadget(&server, &session).await;

    // Generation check (GET) answers with the mirrored generation.
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/gadget/~Common~g1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gadget_body()))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/mgmt/tm/test/gadget/~Common~g1/"))
        .and(body_partial_json(json!({ "name": "g1", "description": "updated" })))
        .and(BodyLacksKeys(&[
            "fullPath",
            "selfLink",
            "generation",
            "partsReference",
        ]))
        .respond_with(ResponseTemplate::new(200).set_body_json(gadget_body()))
        .mount(&server)
        .await;

    gadget
        .update(obj(json!({ "description": "updated" })))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_boolean_pair_reduction_on_the_wire() {
    let (server, session) = setup().await;
    let mut gadget = bound_gadget(&server, &session).await;

    Mock::given(method("PUT"))
        .and(path("/mgmt/tm/test/gadget/~Common~g1/"))
        .and(body_partial_json(json!({ "disabled": true })))
        .and(BodyLacksKeys(&["enabled"]))
        .respond_with(ResponseTemplate::new(200).set_body_json(gadget_body()))
        .mount(&server)
        .await;

    // force=true: no generation GET, so the PUT mock is the only traffic.
    gadget
        .update_with_force(obj(json!({ "enabled": false })), true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_same_value_boolean_pair_is_rejected_before_transmission() {
    let (server, session) = setup().await;
    let mut gadget = bound_gadget(&server, &session).await;
    let before = server.received_requests().await.unwrap().len();

    let err = gadget
        .update_with_force(obj(json!({ "enabled": true, "disabled": true })), true)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::BooleansSameValue { .. }));
    assert_eq!(server.received_requests().await.unwrap().len(), before);
}

#[tokio::test]
async fn test_update_generation_mismatch() {
    let (server, session) = setup().await;
    let mut gadget = bound_gadget(&server, &session).await;

    // Another writer bumped the generation on the device.
    let mut stale = gadget_body();
    stale["generation"] = json!(7);
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/gadget/~Common~g1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stale))
        .mount(&server)
        .await;

    let err = gadget
        .update(obj(json!({ "description": "late write" })))
        .await
        .unwrap_err();

    match err {
        Error::GenerationMismatch { local, remote } => {
            assert_eq!(local, 1);
            assert_eq!(remote, 7);
        }
        other => panic!("expected GenerationMismatch, got: {other:?}"),
    }
}

// ── modify ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_modify_patches_only_supplied_params() {
    let (server, session) = setup().await;
    let mut gadget = bound_gadget(&server, &session).await;

    Mock::given(method("PATCH"))
        .and(path("/mgmt/tm/test/gadget/~Common~g1/"))
        .and(body_partial_json(json!({ "description": "patched" })))
        .and(BodyLacksKeys(&["name", "partition", "enabled"]))
        .respond_with(ResponseTemplate::new(200).set_body_json(gadget_body()))
        .mount(&server)
        .await;

    gadget
        .modify_with_force(obj(json!({ "description": "patched" })), true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_modify_state_allow_list_is_enforced_where_update_is_not() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/machine/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "test:machine:machinestate",
            "name": "m1",
            "generation": 1,
            "selfLink": "https://localhost/mgmt/tm/test/machine/m1?ver=17.1.0",
            "state": "user-up",
        })))
        .mount(&server)
        .await;

    let machines = Collection::attach(session.clone(), &tm_base(&session), &MACHINES).unwrap();
    let mut machine = machines.resource().unwrap();
    machine.load(obj(json!({ "name": "m1" }))).await.unwrap();
    let before = server.received_requests().await.unwrap().len();

    let err = machine
        .modify_with_force(obj(json!({ "state": "unchecked" })), true)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameterValue { .. }));
    assert_eq!(server.received_requests().await.unwrap().len(), before);

    // The same value sails through update untouched.
    Mock::given(method("PUT"))
        .and(path("/mgmt/tm/test/machine/m1/"))
        .and(body_partial_json(json!({ "state": "unchecked" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "test:machine:machinestate",
            "name": "m1",
            "generation": 2,
            "selfLink": "https://localhost/mgmt/tm/test/machine/m1?ver=17.1.0",
            "state": "unchecked",
        })))
        .mount(&server)
        .await;

    machine
        .update_with_force(obj(json!({ "state": "unchecked" })), true)
        .await
        .unwrap();
}

// ── delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_leaves_only_the_sentinel() {
    let (server, session) = setup().await;
    let mut gadget = bound_gadget(&server, &session).await;

    Mock::given(method("DELETE"))
        .and(path("/mgmt/tm/test/gadget/~Common~g1/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    // Default delete skips the generation check: the DELETE is the only
    // request after binding.
    gadget.delete().await.unwrap();

    assert!(gadget.is_deleted());
    assert!(gadget.attrs().is_deleted());
    assert_eq!(gadget.attrs().as_map().len(), 1);
    assert!(gadget.name().is_none());

    let err = gadget.refresh().await.unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidState { state: "deleted", .. }
    ));
}

#[tokio::test]
async fn test_delete_with_generation_check_opted_in() {
    let (server, session) = setup().await;
    let mut gadget = bound_gadget(&server, &session).await;

    let mut moved = gadget_body();
    moved["generation"] = json!(9);
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/gadget/~Common~g1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(moved))
        .mount(&server)
        .await;

    let err = gadget.delete_with_force(false).await.unwrap_err();
    assert!(matches!(err, Error::GenerationMismatch { .. }));
    assert!(!gadget.is_deleted());
}

// ── Unsupported verbs ───────────────────────────────────────────────

#[tokio::test]
async fn test_read_only_endpoint_rejects_mutation() {
    let (server, session) = setup().await;

    let reports = Collection::attach(session.clone(), &tm_base(&session), &REPORTS).unwrap();
    let mut report = reports.resource().unwrap();

    let err = report
        .create(obj(json!({ "name": "r1" })))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperation { operation: "create", .. }));

    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── Collection dispatch ─────────────────────────────────────────────

#[tokio::test]
async fn test_collection_dispatch_typed_and_passthrough() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/gadget/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "test:gadget:gadgetcollectionstate",
            "items": [
                gadget_body(),
                { "reference": { "link": "https://localhost/mgmt/tm/test/gadget/~Common~opaque" } },
            ]
        })))
        .mount(&server)
        .await;

    let items = gadgets(&session).get_collection().await.unwrap();
    assert_eq!(items.len(), 2);

    match &items[0] {
        CollectionItem::Resource(r) => {
            assert_eq!(r.name(), Some("g1"));
            assert!(r.is_bound());
            assert_eq!(r.uri().unwrap().path(), "/mgmt/tm/test/gadget/~Common~g1/");
        }
        other => panic!("expected typed member, got: {other:?}"),
    }
    match &items[1] {
        CollectionItem::Reference(raw) => assert!(raw.contains_key("reference")),
        other => panic!("expected raw reference, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_collection_unregistered_kind_is_fatal() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/gadget/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "test:gadget:gadgetcollectionstate",
            "items": [
                { "kind": "test:mystery:mysterystate", "name": "??" },
            ]
        })))
        .mount(&server)
        .await;

    let err = gadgets(&session).get_collection().await.unwrap_err();
    match err {
        Error::UnregisteredKind { kind } => assert_eq!(kind, "test:mystery:mysterystate"),
        other => panic!("expected UnregisteredKind, got: {other:?}"),
    }
}

// ── Organizing collections & child dispatch ─────────────────────────

#[tokio::test]
async fn test_organizing_collection_lists_references() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/module/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "reference": { "link": "https://localhost/mgmt/tm/test/module/gadget?ver=17.1.0" } },
                { "reference": { "link": "https://localhost/mgmt/tm/test/module/machine?ver=17.1.0" } },
            ]
        })))
        .mount(&server)
        .await;

    let module =
        OrganizingCollection::attach(session.clone(), &tm_base(&session), &MODULE).unwrap();
    let refs = module.list_refs().await.unwrap();

    assert_eq!(refs.len(), 2);
    assert!(refs[0].link.ends_with("module/gadget?ver=17.1.0"));
}

#[tokio::test]
async fn test_child_dispatch_is_registered_names_only() {
    let (_server, session) = setup().await;

    let mut module =
        OrganizingCollection::attach(session.clone(), &tm_base(&session), &MODULE).unwrap();

    let gadgets = module.child("gadget").unwrap().into_collection().unwrap();
    assert_eq!(gadgets.uri().path(), "/mgmt/tm/test/module/gadget/");

    // Second lookup answers from the cache with the same binding.
    let again = module.child("gadget").unwrap().into_collection().unwrap();
    assert_eq!(again.uri(), gadgets.uri());

    let err = module.child("widget").unwrap_err();
    match err {
        Error::UnknownChild { name, .. } => assert_eq!(name, "widget"),
        other => panic!("expected UnknownChild, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_sub_collection_hangs_off_the_bound_uri() {
    let (server, session) = setup().await;
    let mut gadget = bound_gadget(&server, &session).await;

    let parts = gadget.child("part").unwrap().into_collection().unwrap();
    assert_eq!(
        parts.uri().path(),
        "/mgmt/tm/test/gadget/~Common~g1/part/"
    );

    Mock::given(method("POST"))
        .and(path("/mgmt/tm/test/gadget/~Common~g1/part/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "test:gadget:part:partstate",
            "name": "p1",
            "selfLink": "https://localhost/mgmt/tm/test/gadget/~Common~g1/part/p1?ver=17.1.0",
        })))
        .mount(&server)
        .await;

    let mut part = parts.resource().unwrap();
    part.create(obj(json!({ "name": "p1" }))).await.unwrap();
    assert_eq!(
        part.uri().unwrap().path(),
        "/mgmt/tm/test/gadget/~Common~g1/part/p1/"
    );
}

#[tokio::test]
async fn test_sub_collection_requires_bound_parent() {
    let (_server, session) = setup().await;
    let mut gadget = gadgets(&session).resource().unwrap();

    let err = gadget.child("part").unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidState { state: "unbound", .. }
    ));
}

// ── Stats ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_stats_view_for_capable_resources() {
    let (server, session) = setup().await;
    let gadget = bound_gadget(&server, &session).await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/gadget/~Common~g1/stats/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "test:gadget:gadgetstats",
            "entries": {
                "https://localhost/mgmt/tm/test/gadget/~Common~g1/stats": {
                    "nestedStats": { "entries": { "curConns": { "value": 12 } } }
                }
            }
        })))
        .mount(&server)
        .await;

    let stats = gadget.load_stats().await.unwrap();
    assert_eq!(stats.kind(), Some("test:gadget:gadgetstats"));
    assert!(stats.entries().is_some());
}

#[tokio::test]
async fn test_stats_rejected_for_incapable_resources() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/test/machine/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "test:machine:machinestate",
            "name": "m1",
            "selfLink": "https://localhost/mgmt/tm/test/machine/m1",
        })))
        .mount(&server)
        .await;

    let machines = Collection::attach(session.clone(), &tm_base(&session), &MACHINES).unwrap();
    let mut machine = machines.resource().unwrap();
    machine.load(obj(json!({ "name": "m1" }))).await.unwrap();

    let err = machine.load_stats().await.unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedOperation { operation: "stats", .. }
    ));
}

// ── Protocol hygiene ────────────────────────────────────────────────

#[tokio::test]
async fn test_incompatible_response_key_is_rejected() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "test:gadget:gadgetstate",
            "name": "g1",
            "bad-key": 1,
            "selfLink": "https://localhost/mgmt/tm/test/gadget/~Common~g1",
        })))
        .mount(&server)
        .await;

    let mut gadget = gadgets(&session).resource().unwrap();
    let err = gadget
        .create(obj(json!({ "name": "g1" })))
        .await
        .unwrap_err();

    match err {
        Error::IncompatibleKey { key, .. } => assert_eq!(key, "bad-key"),
        other => panic!("expected IncompatibleKey, got: {other:?}"),
    }
}
