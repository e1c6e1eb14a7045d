//! In-process [`ObjectBus`] for hermetic tests.
//!
//! The graph is mutated by method handlers and by mutations scheduled to land
//! after a delay. Scheduled mutations are applied lazily, on the next access
//! at or after their due time, so there is no background task and paused
//! tokio time drives them deterministically.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::trace;

use crate::bus::ObjectBus;
use crate::error::{BusError, Result};
use crate::graph::{ObjectGraph, PropertyMap};
use crate::value::Value;

type Mutation = Box<dyn FnOnce(&mut MemoryState) + Send>;

/// Handler for one `(interface, method)` pair, invoked for any object path.
pub type MethodHandler = Arc<dyn Fn(&mut MemoryState, &MethodCall) -> Result<Vec<Value>> + Send + Sync>;

/// A recorded method invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub path: String,
    pub interface: String,
    pub method: String,
    pub args: Vec<Value>,
}

impl MethodCall {
    /// Argument at `index`, or a remote "invalid arguments" failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is missing.
    pub fn arg(&self, index: usize) -> Result<&Value> {
        self.args.get(index).ok_or_else(|| {
            BusError::remote(
                "org.freedesktop.DBus.Error.InvalidArgs",
                format!("{} expects at least {} arguments", self.method, index + 1),
            )
        })
    }

    /// Option dictionary at `index`; missing or non-dictionary yields an empty map.
    #[must_use]
    pub fn options(&self, index: usize) -> std::collections::BTreeMap<String, Value> {
        self.args
            .get(index)
            .and_then(Value::as_dict)
            .cloned()
            .unwrap_or_default()
    }
}

struct Pending {
    due: Instant,
    seq: u64,
    mutation: Mutation,
}

/// Mutable state behind a [`MemoryBus`].
pub struct MemoryState {
    graph: ObjectGraph,
    pending: Vec<Pending>,
    next_seq: u64,
}

impl MemoryState {
    fn new() -> Self {
        Self {
            graph: ObjectGraph::new(),
            pending: Vec::new(),
            next_seq: 0,
        }
    }

    #[must_use]
    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut ObjectGraph {
        &mut self.graph
    }

    /// Adds or replaces an interface on an object.
    pub fn export(&mut self, path: &str, interface: &str, properties: PropertyMap) {
        self.graph.insert(path, interface, properties);
    }

    /// Removes an object with all its interfaces.
    pub fn unexport(&mut self, path: &str) {
        self.graph.remove(path);
    }

    /// Sets a property on an exported interface.
    pub fn set(&mut self, path: &str, interface: &str, property: &str, value: impl Into<Value>) {
        self.graph.set_property(path, interface, property, value.into());
    }

    /// Schedules a mutation to land `delay` from now.
    pub fn schedule<F>(&mut self, delay: Duration, mutation: F)
    where
        F: FnOnce(&mut MemoryState) + Send + 'static,
    {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            due: Instant::now() + delay,
            seq,
            mutation: Box::new(mutation),
        });
    }

    /// Number of mutations not yet applied.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn apply_due(&mut self) {
        let now = Instant::now();
        loop {
            let next = self
                .pending
                .iter()
                .enumerate()
                .filter(|(_, p)| p.due <= now)
                .min_by_key(|(_, p)| (p.due, p.seq))
                .map(|(i, _)| i);
            let Some(index) = next else { break };
            let pending = self.pending.swap_remove(index);
            (pending.mutation)(self);
        }
    }
}

/// In-memory object graph implementing [`ObjectBus`].
#[derive(Clone)]
pub struct MemoryBus {
    service: String,
    object_root: String,
    state: Arc<Mutex<MemoryState>>,
    handlers: Arc<RwLock<HashMap<(String, String), MethodHandler>>>,
    calls: Arc<Mutex<Vec<MethodCall>>>,
}

impl MemoryBus {
    pub fn new(service: impl Into<String>, object_root: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            object_root: object_root.into(),
            state: Arc::new(Mutex::new(MemoryState::new())),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Registers the handler for `interface.method`, replacing any previous one.
    pub fn handle<F>(&self, interface: &str, method: &str, handler: F)
    where
        F: Fn(&mut MemoryState, &MethodCall) -> Result<Vec<Value>> + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((interface.to_string(), method.to_string()), Arc::new(handler));
    }

    /// Runs `f` against the state after applying due mutations.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.apply_due();
        f(&mut state)
    }

    /// Every method call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<MethodCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Method calls to `method`, in order.
    #[must_use]
    pub fn calls_to(&self, method: &str) -> Vec<MethodCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }
}

#[async_trait]
impl ObjectBus for MemoryBus {
    fn service(&self) -> &str {
        &self.service
    }

    fn object_root(&self) -> &str {
        &self.object_root
    }

    async fn managed_objects(&self) -> Result<ObjectGraph> {
        Ok(self.with_state(|s| s.graph.clone()))
    }

    async fn get_property(&self, path: &str, interface: &str, property: &str) -> Result<Value> {
        self.with_state(|s| {
            let ifaces = s
                .graph
                .interfaces(path)
                .ok_or_else(|| BusError::NoSuchObject(path.to_string()))?;
            let props = ifaces.get(interface).ok_or_else(|| BusError::NoSuchInterface {
                path: path.to_string(),
                interface: interface.to_string(),
            })?;
            props
                .get(property)
                .cloned()
                .ok_or_else(|| BusError::NoSuchProperty {
                    path: path.to_string(),
                    interface: interface.to_string(),
                    property: property.to_string(),
                })
        })
    }

    async fn call(
        &self,
        path: &str,
        interface: &str,
        method: &str,
        args: &[Value],
        _timeout: Duration,
    ) -> Result<Vec<Value>> {
        let call = MethodCall {
            path: path.to_string(),
            interface: interface.to_string(),
            method: method.to_string(),
            args: args.to_vec(),
        };
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.clone());

        let handler = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(interface.to_string(), method.to_string()))
            .cloned();

        self.with_state(|s| {
            if !s.graph.contains(path) {
                return Err(BusError::NoSuchObject(path.to_string()));
            }
            if !s.graph.has_interface(path, interface) {
                return Err(BusError::NoSuchInterface {
                    path: path.to_string(),
                    interface: interface.to_string(),
                });
            }
            let handler = handler.ok_or_else(|| {
                BusError::remote(
                    "org.freedesktop.DBus.Error.UnknownMethod",
                    format!("No such method '{method}' on interface '{interface}'"),
                )
            })?;
            trace!(path, interface, method, "dispatching in-memory call");
            handler(s, &call)
        })
    }

    async fn introspect(&self, path: &str) -> Result<String> {
        self.with_state(|s| {
            let ifaces = s
                .graph
                .interfaces(path)
                .ok_or_else(|| BusError::NoSuchObject(path.to_string()))?;
            let mut xml = String::from("<node>\n");
            for iface in ifaces.keys() {
                xml.push_str(&format!("  <interface name=\"{iface}\">\n  </interface>\n"));
            }
            xml.push_str("</node>\n");
            Ok(xml)
        })
    }
}
