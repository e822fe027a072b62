//! Description of the API surface a [`ReferenceTracker`](super::ReferenceTracker)
//! looks for.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One node of a property-path tree.
///
/// Children are ordinary property names; the `read`, `call` and `construct`
/// markers live in their own fields so they never collide with them.
///
/// ```json
/// { "children": { "fs": { "children": { "readFileSync": { "call": "sync io" } } } } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceMap<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construct: Option<T>,
    /// The module is a real ES module, so imports are not routed through
    /// its CommonJS `default` export.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub esm: bool,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, TraceMap<T>>,
}

impl<T> Default for TraceMap<T> {
    fn default() -> Self {
        Self {
            read: None,
            call: None,
            construct: None,
            esm: false,
            children: IndexMap::new(),
        }
    }
}

impl<T> TraceMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(mut self, info: T) -> Self {
        self.read = Some(info);
        self
    }

    pub fn call(mut self, info: T) -> Self {
        self.call = Some(info);
        self
    }

    pub fn construct(mut self, info: T) -> Self {
        self.construct = Some(info);
        self
    }

    pub fn esm(mut self) -> Self {
        self.esm = true;
        self
    }

    pub fn child(mut self, name: impl Into<String>, node: TraceMap<T>) -> Self {
        self.children.insert(name.into(), node);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TraceMap<T>> {
        self.children.get(name)
    }
}

/// A trace map as seen through an import declaration.
///
/// Imports of a module that is not marked `esm` go through its `default`
/// export; legacy interop also exposes the module's own members.
#[derive(Debug)]
pub(super) enum TraceNode<'m, T> {
    Map(&'m TraceMap<T>),
    Interop { module: &'m TraceMap<T>, legacy: bool },
}

impl<T> Clone for TraceNode<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TraceNode<'_, T> {}

impl<'m, T> TraceNode<'m, T> {
    pub(super) fn child(self, name: &str) -> Option<TraceNode<'m, T>> {
        match self {
            TraceNode::Map(map) => map.get(name).map(TraceNode::Map),
            TraceNode::Interop { module, legacy } => {
                let own = if legacy { module.get(name) } else { None };
                match (own, name) {
                    (Some(own), _) => Some(TraceNode::Map(own)),
                    (None, "default") => Some(TraceNode::Map(module)),
                    (None, _) => None,
                }
            }
        }
    }

    fn markers(self) -> Option<&'m TraceMap<T>> {
        match self {
            TraceNode::Map(map) => Some(map),
            TraceNode::Interop { module, legacy: true } => Some(module),
            TraceNode::Interop { legacy: false, .. } => None,
        }
    }

    pub(super) fn read(self) -> Option<&'m T> {
        self.markers().and_then(|m| m.read.as_ref())
    }

    pub(super) fn call(self) -> Option<&'m T> {
        self.markers().and_then(|m| m.call.as_ref())
    }

    pub(super) fn construct(self) -> Option<&'m T> {
        self.markers().and_then(|m| m.construct.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_nested_markers_from_json() {
        let json = r#"{
            "children": {
                "lib": {
                    "read": "read lib",
                    "children": { "run": { "call": "run lib" } }
                }
            }
        }"#;
        let map: TraceMap<String> = serde_json::from_str(json).unwrap();

        let lib = map.get("lib").unwrap();
        assert_eq!(lib.read.as_deref(), Some("read lib"));
        assert_eq!(lib.get("run").unwrap().call.as_deref(), Some("run lib"));
        assert!(!lib.esm);
    }

    #[test]
    fn deserializes_from_toml() {
        let source = r#"
            [children.mod]
            esm = true

            [children.mod.children.default]
            construct = 1
        "#;
        let map: TraceMap<i32> = toml::from_str(source).unwrap();

        let module = map.get("mod").unwrap();
        assert!(module.esm);
        assert_eq!(module.get("default").unwrap().construct, Some(1));
    }

    #[test]
    fn marker_names_are_ordinary_children_too() {
        let map = TraceMap::new().child("call", TraceMap::new().read(true));

        assert_eq!(map.call, None);
        assert_eq!(map.get("call").unwrap().read, Some(true));
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({ "children": { "call": { "read": true } } }));
    }

    #[test]
    fn interop_routes_through_default() {
        let module = TraceMap::new()
            .call("module call")
            .child("named", TraceMap::new().read("named read"));

        let strict = TraceNode::Interop {
            module: &module,
            legacy: false,
        };
        assert!(std::ptr::eq(
            match strict.child("default") {
                Some(TraceNode::Map(map)) => map,
                _ => panic!("expected default"),
            },
            &module
        ));
        assert!(strict.child("named").is_none());
        assert_eq!(strict.call(), None);

        let legacy = TraceNode::Interop {
            module: &module,
            legacy: true,
        };
        assert_eq!(legacy.child("named").and_then(TraceNode::read), Some(&"named read"));
        assert_eq!(legacy.call(), Some(&"module call"));
    }
}
