//! Point-in-time snapshots of the daemon's object graph.

use std::collections::{BTreeMap, BTreeSet};

use crate::matcher::PathMatcher;
use crate::value::Value;

/// Property name to value.
pub type PropertyMap = BTreeMap<String, Value>;

/// Interface name to its properties.
pub type InterfaceMap = BTreeMap<String, PropertyMap>;

/// Immutable snapshot: object path to interfaces to properties.
///
/// Taken from a single bulk enumeration, so it is internally consistent even
/// while the daemon keeps mutating the live graph. Paths are kept sorted for
/// stable output only; nothing should read creation order into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectGraph {
    objects: BTreeMap<String, InterfaceMap>,
}

impl ObjectGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_objects(objects: BTreeMap<String, InterfaceMap>) -> Self {
        Self { objects }
    }

    /// Adds or replaces one interface on one object.
    pub fn insert(&mut self, path: impl Into<String>, interface: impl Into<String>, properties: PropertyMap) {
        self.objects
            .entry(path.into())
            .or_default()
            .insert(interface.into(), properties);
    }

    /// Removes an object, returning its interfaces.
    pub fn remove(&mut self, path: &str) -> Option<InterfaceMap> {
        self.objects.remove(path)
    }

    /// Removes one interface. The object goes away with its last interface.
    pub fn remove_interface(&mut self, path: &str, interface: &str) -> Option<PropertyMap> {
        let ifaces = self.objects.get_mut(path)?;
        let removed = ifaces.remove(interface);
        if ifaces.is_empty() {
            self.objects.remove(path);
        }
        removed
    }

    /// Sets a single property. Returns false if the interface is absent.
    pub fn set_property(&mut self, path: &str, interface: &str, property: &str, value: Value) -> bool {
        match self.objects.get_mut(path).and_then(|i| i.get_mut(interface)) {
            Some(props) => {
                props.insert(property.to_string(), value);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains_key(path)
    }

    #[must_use]
    pub fn interfaces(&self, path: &str) -> Option<&InterfaceMap> {
        self.objects.get(path)
    }

    #[must_use]
    pub fn has_interface(&self, path: &str, interface: &str) -> bool {
        self.objects
            .get(path)
            .is_some_and(|i| i.contains_key(interface))
    }

    #[must_use]
    pub fn property(&self, path: &str, interface: &str, property: &str) -> Option<&Value> {
        self.objects.get(path)?.get(interface)?.get(property)
    }

    /// All paths selected by `matcher`.
    #[must_use]
    pub fn matching(&self, matcher: &PathMatcher) -> BTreeSet<String> {
        self.paths()
            .filter(|p| matcher.matches(p))
            .map(str::to_string)
            .collect()
    }

    /// All paths carrying `interface`.
    #[must_use]
    pub fn with_interface(&self, interface: &str) -> BTreeSet<String> {
        self.objects
            .iter()
            .filter(|(_, ifaces)| ifaces.contains_key(interface))
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// Paths whose `interface.property` loosely equals `value`.
    #[must_use]
    pub fn referencing(&self, interface: &str, property: &str, value: &Value) -> BTreeSet<String> {
        self.objects
            .iter()
            .filter(|(_, ifaces)| {
                ifaces
                    .get(interface)
                    .and_then(|props| props.get(property))
                    .is_some_and(|v| v.loosely_eq(value))
            })
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// Differences from `self` (older) to `newer`.
    #[must_use]
    pub fn diff(&self, newer: &ObjectGraph) -> GraphDiff {
        let mut diff = GraphDiff::default();

        for (path, ifaces) in &self.objects {
            match newer.objects.get(path) {
                None => {
                    diff.removed.insert(path.clone());
                }
                Some(new_ifaces) => {
                    for (iface, props) in ifaces {
                        match new_ifaces.get(iface) {
                            None => {
                                diff.interfaces_removed.insert((path.clone(), iface.clone()));
                            }
                            Some(new_props) => {
                                let keys: BTreeSet<&String> = props.keys().chain(new_props.keys()).collect();
                                for key in keys {
                                    let changed = match (props.get(key), new_props.get(key)) {
                                        (Some(a), Some(b)) => a != b,
                                        _ => true,
                                    };
                                    if changed {
                                        diff.properties_changed.insert((
                                            path.clone(),
                                            iface.clone(),
                                            key.clone(),
                                        ));
                                    }
                                }
                            }
                        }
                    }
                    for iface in new_ifaces.keys() {
                        if !ifaces.contains_key(iface) {
                            diff.interfaces_added.insert((path.clone(), iface.clone()));
                        }
                    }
                }
            }
        }

        for path in newer.objects.keys() {
            if !self.objects.contains_key(path) {
                diff.added.insert(path.clone());
            }
        }

        diff
    }
}

/// Changes between two snapshots.
///
/// Interfaces of added or removed objects are not repeated in the
/// interface sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphDiff {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub interfaces_added: BTreeSet<(String, String)>,
    pub interfaces_removed: BTreeSet<(String, String)>,
    pub properties_changed: BTreeSet<(String, String, String)>,
}

impl GraphDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.interfaces_added.is_empty()
            && self.interfaces_removed.is_empty()
            && self.properties_changed.is_empty()
    }
}
