//! Declared models and attribute schemas
//!
//! A [`Model`] is the operator-declared desired state for one managed
//! instance: a mapping from attribute name to tri-state [`Value`]. A
//! [`Schema`] classifies each attribute as required, optional or computed.
//! Computed attributes are only ever written from remote state; the `id`
//! attribute, once set, is stable across reads and serves as the import key.

use crate::diag::Diagnostic;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute name reserved for the remote identifier.
pub const ID_ATTR: &str = "id";

/// Classification of a declared attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrKind {
    /// Must be supplied by the operator.
    Required,
    /// May be absent; absent values are omitted from remote requests.
    Optional,
    /// Only ever set by the reconciler from remote state.
    Computed,
}

/// One attribute of an entity schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr {
    pub name: &'static str,
    pub kind: AttrKind,
}

impl Attr {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            kind: AttrKind::Required,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            kind: AttrKind::Optional,
        }
    }

    pub const fn computed(name: &'static str) -> Self {
        Self {
            name,
            kind: AttrKind::Computed,
        }
    }
}

/// Attribute schema of one entity kind.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub attrs: &'static [Attr],
    /// Lookup kinds only answer Read; create/update/delete/import are
    /// rejected for them.
    pub read_only: bool,
}

impl Schema {
    pub const fn new(attrs: &'static [Attr]) -> Self {
        Self {
            attrs,
            read_only: false,
        }
    }

    pub const fn lookup(attrs: &'static [Attr]) -> Self {
        Self {
            attrs,
            read_only: true,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// A kind is importable when it carries a computed, stable identifier
    /// and is not a read-only lookup.
    pub fn importable(&self) -> bool {
        !self.read_only
            && self
                .attr(ID_ATTR)
                .is_some_and(|a| a.kind == AttrKind::Computed)
    }
}

/// Declared state of one managed instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    attrs: BTreeMap<String, Value>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a model with only the remote identifier; a subsequent Read
    /// fills in the rest. This is the import entry point.
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut model = Self::new();
        model.set(ID_ATTR, Value::string(id));
        model
    }

    /// Missing attributes read as `Unknown`.
    pub fn get(&self, name: &str) -> &Value {
        self.attrs.get(name).unwrap_or(&Value::Unknown)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn id(&self) -> Option<&str> {
        self.get(ID_ATTR).as_str()
    }

    /// Concrete string value of a required attribute, or an attribute
    /// diagnostic naming the gap.
    pub fn require_str(&self, name: &str) -> Result<&str, Diagnostic> {
        self.get(name).as_str().ok_or_else(|| {
            Diagnostic::attribute_error(
                name,
                "Missing required attribute",
                format!("attribute {name:?} must be set to a concrete value"),
            )
        })
    }

    /// Concrete string value of an optional attribute; unknown/null read
    /// as absent.
    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.get(name).as_str()
    }

    /// Known string elements of a list attribute. Unknown/null containers
    /// and elements read as absent.
    pub fn str_list(&self, name: &str) -> Vec<String> {
        match self.get(name).as_list() {
            Some(items) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Known string entries of a map attribute.
    pub fn str_map(&self, name: &str) -> BTreeMap<String, String> {
        match self.get(name).as_map() {
            Some(entries) => entries
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect(),
            None => BTreeMap::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attrs.iter()
    }

    /// Carry computed values forward from a refreshed model wherever this
    /// model still holds `Unknown`. Keeps the identifier stable across
    /// plans that have not resolved it yet.
    pub fn inherit_computed(&mut self, schema: &Schema, remote: &Model) {
        for attr in schema.attrs {
            if attr.kind != AttrKind::Computed {
                continue;
            }
            if self.get(attr.name).is_unknown() {
                let inherited = remote.get(attr.name);
                if inherited.is_known() {
                    self.set(attr.name, inherited.clone());
                }
            }
        }
    }

    /// True when any operator-facing (non-computed) attribute declared here
    /// differs from the refreshed remote model. Unknown declared values do
    /// not count as drift.
    pub fn drifts_from(&self, schema: &Schema, remote: &Model) -> bool {
        schema.attrs.iter().any(|attr| {
            if attr.kind == AttrKind::Computed {
                return false;
            }
            let want = self.get(attr.name);
            if want.is_unknown() {
                return false;
            }
            want != remote.get(attr.name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTRS: &[Attr] = &[
        Attr::required("name"),
        Attr::optional("description"),
        Attr::computed("fingerprint"),
        Attr::computed(ID_ATTR),
    ];
    const SCHEMA: Schema = Schema::new(ATTRS);

    #[test]
    fn missing_attributes_read_unknown() {
        let model = Model::new();
        assert!(model.get("name").is_unknown());
        assert!(model.id().is_none());
        assert!(model.require_str("name").is_err());
    }

    #[test]
    fn import_seeds_only_the_identifier() {
        let model = Model::with_id("b5c8d0f2");
        assert_eq!(model.id(), Some("b5c8d0f2"));
        assert!(model.get("name").is_unknown());
    }

    #[test]
    fn computed_inheritance_is_stable_on_unknown() {
        let mut tracked = Model::new();
        tracked.set("name", "ci-key");
        let mut remote = Model::new();
        remote.set(ID_ATTR, "1234");
        remote.set("fingerprint", "ab:cd");

        tracked.inherit_computed(&SCHEMA, &remote);
        assert_eq!(tracked.id(), Some("1234"));
        assert_eq!(tracked.opt_str("fingerprint"), Some("ab:cd"));

        // A value that is already resolved is never overwritten.
        remote.set(ID_ATTR, "9999");
        tracked.inherit_computed(&SCHEMA, &remote);
        assert_eq!(tracked.id(), Some("1234"));
    }

    #[test]
    fn drift_ignores_computed_and_unknown() {
        let mut desired = Model::new();
        desired.set("name", "web-1");
        let mut remote = Model::new();
        remote.set("name", "web-1");
        remote.set(ID_ATTR, "1234");
        assert!(!desired.drifts_from(&SCHEMA, &remote));

        desired.set("description", "edge node");
        assert!(desired.drifts_from(&SCHEMA, &remote));
    }

    #[test]
    fn collection_helpers_skip_unresolved_elements() {
        let mut model = Model::new();
        model.set(
            "ssh_key_ids",
            Value::List(vec![Value::string("a"), Value::Unknown, Value::Null]),
        );
        assert_eq!(model.str_list("ssh_key_ids"), vec!["a".to_string()]);
        assert!(model.str_map("tags").is_empty());
    }

    #[test]
    fn persisted_state_survives_a_json_round_trip() {
        let mut model = Model::with_id("1234");
        model.set("name", "web-1");
        model.set("tags", Value::string_map([("env", "prod")]));
        model.set("description", Value::Null);
        model.set("fingerprint", Value::Unknown);

        let json = serde_json::to_string(&model).unwrap();
        let restored: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, model);
        assert!(restored.get("fingerprint").is_unknown());
        assert!(restored.get("description").is_null());
    }
}
