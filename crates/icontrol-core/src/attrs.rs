// ── Attribute bag ──
//
// A bound resource mirrors whatever JSON the device last returned for
// it. The schema is dynamic, so attributes live in an ordered map with
// named accessors only for the fields the binding logic itself reads
// (name, kind, selfLink, generation). Everything else stays free-form.
//
// Server keys must be identifier-safe: the device owns the namespace,
// and a key the client could never surface as an attribute is a
// protocol violation, not something to quietly carry.

use serde_json::{Map, Value};

use crate::error::Error;

/// Caller-supplied parameters for a verb, keyed by wire name.
pub type Params = Map<String, Value>;

/// Client-side sentinel marking a deleted instance. Uses the
/// double-underscore prefix precisely because absorbed server JSON can
/// never contain such a key.
const DELETED_SENTINEL: &str = "__deleted";

/// Rust keywords that can never become generated attribute accessors.
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
];

/// Ordered attribute map mirroring the device's last-known state for
/// one resource instance.
#[derive(Debug, Clone, Default)]
pub struct AttributeBag {
    map: Map<String, Value>,
}

impl AttributeBag {
    /// Replace the bag with a server response object.
    ///
    /// Every key is validated before the map is swapped in; a single bad
    /// key rejects the whole response.
    pub fn absorb(&mut self, value: Value) -> Result<(), Error> {
        let Value::Object(obj) = value else {
            return Err(Error::MalformedResponse {
                message: "expected a JSON object".into(),
            });
        };
        for key in obj.keys() {
            validate_key(key)?;
        }
        self.map = obj;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    // ── Named accessors for protocol fields ──────────────────────────

    pub fn name(&self) -> Option<&str> {
        self.map.get("name").and_then(Value::as_str)
    }

    pub fn partition(&self) -> Option<&str> {
        self.map.get("partition").and_then(Value::as_str)
    }

    pub fn kind(&self) -> Option<&str> {
        self.map.get("kind").and_then(Value::as_str)
    }

    pub fn self_link(&self) -> Option<&str> {
        self.map.get("selfLink").and_then(Value::as_str)
    }

    pub fn generation(&self) -> Option<i64> {
        self.map.get("generation").and_then(Value::as_i64)
    }

    // ── Deletion sentinel ────────────────────────────────────────────

    /// Drop every attribute and set the deleted marker.
    pub(crate) fn mark_deleted(&mut self) {
        self.map.clear();
        self.map.insert(DELETED_SENTINEL.into(), Value::Bool(true));
    }

    pub fn is_deleted(&self) -> bool {
        self.map
            .get(DELETED_SENTINEL)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

// ── Key validation ───────────────────────────────────────────────────

/// Reject keys that cannot be represented as attributes: non-identifier
/// characters, language keywords, and double-underscore names (the
/// client's own control namespace).
pub fn validate_key(key: &str) -> Result<(), Error> {
    let mut chars = key.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::IncompatibleKey {
            key: key.into(),
            reason: "not an identifier".into(),
        });
    }
    if key.starts_with("__") {
        return Err(Error::IncompatibleKey {
            key: key.into(),
            reason: "double-underscore names are reserved".into(),
        });
    }
    if KEYWORDS.contains(&key) {
        return Err(Error::IncompatibleKey {
            key: key.into(),
            reason: "language keyword".into(),
        });
    }
    Ok(())
}

// ── Parameter checks (pre-network) ───────────────────────────────────

/// Verify every required key is present, naming the full deficit.
pub fn check_required(params: &Params, required: &[&str]) -> Result<(), Error> {
    let missing: Vec<String> = required
        .iter()
        .filter(|k| !params.contains_key(**k))
        .map(|k| (*k).to_owned())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingParameter { missing })
    }
}

/// Verify at most one key of each mutually-exclusive set is present.
pub fn check_exclusive(params: &Params, sets: &[&[&str]]) -> Result<(), Error> {
    for set in sets {
        let present: Vec<String> = set
            .iter()
            .filter(|k| params.contains_key(**k))
            .map(|k| (*k).to_owned())
            .collect();
        if present.len() > 1 {
            return Err(Error::ExclusiveAttributes { attrs: present });
        }
    }
    Ok(())
}

// ── Body shaping (pre-transmission) ──────────────────────────────────

/// Normalize boolean reduction pairs so the device receives exactly one
/// key of each pair, set to `true`.
///
/// `enabled=false` becomes `disabled=true` (and vice versa); both keys
/// carrying the same truth value is contradictory and always an error.
pub fn reduce_boolean_pairs(
    body: &mut Params,
    pairs: &[(&str, &str)],
) -> Result<(), Error> {
    for (pos, neg) in pairs {
        let pos_val = body.get(*pos).and_then(Value::as_bool);
        let neg_val = body.get(*neg).and_then(Value::as_bool);

        let positive = match (pos_val, neg_val) {
            (Some(p), Some(n)) if p == n => {
                return Err(Error::BooleansSameValue {
                    pair: ((*pos).to_owned(), (*neg).to_owned()),
                });
            }
            (Some(p), _) => p,
            (None, Some(n)) => !n,
            (None, None) => continue,
        };

        let keep = if positive { *pos } else { *neg };
        body.remove(*pos);
        body.remove(*neg);
        body.insert(keep.into(), Value::Bool(true));
    }
    Ok(())
}

/// Remove read-only keys from an outgoing body. `selfLink` and
/// `generation` are always device-owned; the descriptor adds more.
pub fn strip_read_only(body: &mut Params, read_only: &[&str]) {
    body.remove("selfLink");
    body.remove("generation");
    for key in read_only {
        body.remove(*key);
    }
}

/// Remove nested reference sub-objects (sub-collection pointers like
/// `membersReference`) -- they describe traversal, not configuration,
/// and the device rejects them in write bodies.
pub fn strip_references(body: &mut Params) {
    body.retain(|_, v| {
        !v.as_object()
            .is_some_and(|o| o.contains_key("link") || o.contains_key("isSubcollection"))
    });
}

/// Merge verb parameters over the mirrored state, parameters winning.
pub fn merge_params(base: &Map<String, Value>, params: Params) -> Params {
    let mut merged = base.clone();
    for (k, v) in params {
        merged.insert(k, v);
    }
    merged
}
