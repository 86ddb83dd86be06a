// ── Declarative node descriptors ──
//
// One static table per endpoint replaces the original convention of
// deriving URIs and dispatch from type names. Everything the generic
// core needs to drive an endpoint lives here: the URI segment, the
// expected kind tag, parameter constraints, the child registry, and
// the member-kind registry for collections.

/// What shape of node a descriptor produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Non-leaf node aggregating references; no CRUD of its own.
    Organizing,
    /// Fetches an item list and dispatches typed members by kind tag.
    Collection,
    /// Leaf supporting the CRUD verb state machine.
    Resource,
}

/// Per-endpoint verb allow-flags.
///
/// A verb invoked against a descriptor that does not allow it fails with
/// `UnsupportedOperation` before any network call.
#[derive(Debug, Clone, Copy)]
pub struct Verbs {
    pub create: bool,
    pub load: bool,
    pub update: bool,
    pub modify: bool,
    pub delete: bool,
}

impl Verbs {
    /// Full CRUD: the common case for named configuration resources.
    pub const ALL: Self = Self {
        create: true,
        load: true,
        update: true,
        modify: true,
        delete: true,
    };

    /// Read-only endpoints (statistics, version info).
    pub const LOAD_ONLY: Self = Self {
        create: false,
        load: true,
        update: false,
        modify: false,
        delete: false,
    };

    /// Unnamed singletons (sys/dns, sys/ntp): always present on the
    /// device, so they can be read and written but never created or
    /// deleted.
    pub const UNNAMED: Self = Self {
        create: false,
        load: true,
        update: true,
        modify: true,
        delete: false,
    };
}

/// Static description of one node in the URI tree.
///
/// Endpoint crates declare these as `static` items and wire the tree
/// through `children` / `members`; the core never derives anything from
/// type names.
#[derive(Debug)]
pub struct NodeDescriptor {
    /// Stable dotted identifier, e.g. `"tm.ltm.pool"`. Used in error
    /// messages and logs, never on the wire.
    pub type_id: &'static str,

    /// URI path segment, exactly as the device spells it
    /// (e.g. `"pool"`, `"gateway-icmp"`).
    pub segment: &'static str,

    pub node_type: NodeType,

    /// Expected kind tag in device responses. `None` disables the check
    /// (some endpoints, like stats views, are verified elsewhere).
    pub kind: Option<&'static str>,

    /// Keys that must be present in `create` parameters.
    pub required_create: &'static [&'static str],

    /// Keys that must be present in `load`/`exists` parameters.
    pub required_load: &'static [&'static str],

    /// Keys silently stripped from PUT/PATCH bodies, on top of the
    /// always-stripped `selfLink` and `generation`.
    pub read_only: &'static [&'static str],

    /// Sets of mutually-exclusive parameter names. Supplying two or
    /// more from one set is an error; supplying one or none is fine.
    pub exclusive_attrs: &'static [&'static [&'static str]],

    /// Boolean reduction pairs, positive key first (e.g.
    /// `("enabled", "disabled")`). The device must never receive a
    /// semantically-contradictory pair.
    pub boolean_pairs: &'static [(&'static str, &'static str)],

    /// Child nodes reachable from this one, by segment.
    pub children: &'static [&'static NodeDescriptor],

    /// Collection member registry: kind tag -> member descriptor. The
    /// first entry is the collection's primary member type.
    pub members: &'static [(&'static str, &'static NodeDescriptor)],

    pub verbs: Verbs,

    /// Whether a bound instance exposes a `stats` view.
    pub stats: bool,

    /// Whether instances are addressed as `~partition~name` under the
    /// container URI. Unnamed singletons live at the segment itself.
    pub named: bool,

    /// Allow-listed values for the `state` parameter of `modify`.
    /// `update` deliberately performs no such check (matching observed
    /// device-SDK behavior for ltm nodes).
    pub modify_state_values: Option<&'static [&'static str]>,
}

impl NodeDescriptor {
    /// A named CRUD resource with the given kind tag.
    pub const fn resource(
        type_id: &'static str,
        segment: &'static str,
        kind: &'static str,
    ) -> Self {
        Self {
            type_id,
            segment,
            node_type: NodeType::Resource,
            kind: Some(kind),
            required_create: &["name"],
            required_load: &["name"],
            read_only: &[],
            exclusive_attrs: &[],
            boolean_pairs: &[],
            children: &[],
            members: &[],
            verbs: Verbs::ALL,
            stats: false,
            named: true,
            modify_state_values: None,
        }
    }

    /// A collection whose members dispatch through `members`.
    pub const fn collection(
        type_id: &'static str,
        segment: &'static str,
        kind: &'static str,
        members: &'static [(&'static str, &'static NodeDescriptor)],
    ) -> Self {
        Self {
            type_id,
            segment,
            node_type: NodeType::Collection,
            kind: Some(kind),
            required_create: &[],
            required_load: &[],
            read_only: &[],
            exclusive_attrs: &[],
            boolean_pairs: &[],
            children: &[],
            members,
            verbs: Verbs::LOAD_ONLY,
            stats: false,
            named: false,
            modify_state_values: None,
        }
    }

    /// An organizing collection aggregating the given children.
    pub const fn organizing(
        type_id: &'static str,
        segment: &'static str,
        children: &'static [&'static NodeDescriptor],
    ) -> Self {
        Self {
            type_id,
            segment,
            node_type: NodeType::Organizing,
            kind: None,
            required_create: &[],
            required_load: &[],
            read_only: &[],
            exclusive_attrs: &[],
            boolean_pairs: &[],
            children,
            members: &[],
            verbs: Verbs::LOAD_ONLY,
            stats: false,
            named: false,
            modify_state_values: None,
        }
    }

    // ── Const builder adjustments ────────────────────────────────────

    pub const fn with_required_create(mut self, keys: &'static [&'static str]) -> Self {
        self.required_create = keys;
        self
    }

    pub const fn with_required_load(mut self, keys: &'static [&'static str]) -> Self {
        self.required_load = keys;
        self
    }

    pub const fn with_read_only(mut self, keys: &'static [&'static str]) -> Self {
        self.read_only = keys;
        self
    }

    pub const fn with_exclusive_attrs(
        mut self,
        sets: &'static [&'static [&'static str]],
    ) -> Self {
        self.exclusive_attrs = sets;
        self
    }

    pub const fn with_boolean_pairs(
        mut self,
        pairs: &'static [(&'static str, &'static str)],
    ) -> Self {
        self.boolean_pairs = pairs;
        self
    }

    pub const fn with_children(mut self, children: &'static [&'static NodeDescriptor]) -> Self {
        self.children = children;
        self
    }

    pub const fn with_verbs(mut self, verbs: Verbs) -> Self {
        self.verbs = verbs;
        self
    }

    pub const fn with_stats(mut self) -> Self {
        self.stats = true;
        self
    }

    pub const fn unnamed(mut self) -> Self {
        self.named = false;
        self.required_create = &[];
        self.required_load = &[];
        self
    }

    pub const fn with_modify_state_values(
        mut self,
        values: &'static [&'static str],
    ) -> Self {
        self.modify_state_values = Some(values);
        self
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Find a child descriptor by URI segment.
    pub fn child(&self, name: &str) -> Option<&'static NodeDescriptor> {
        self.children.iter().copied().find(|d| d.segment == name)
    }

    /// Find a member descriptor by kind tag.
    pub fn member_for_kind(&self, kind: &str) -> Option<&'static NodeDescriptor> {
        self.members
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, d)| *d)
    }

    /// The collection's primary member type, if any.
    pub fn primary_member(&self) -> Option<&'static NodeDescriptor> {
        self.members.first().map(|(_, d)| *d)
    }
}
