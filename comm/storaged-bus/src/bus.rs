//! The connected handle to the daemon's object graph.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::graph::ObjectGraph;
use crate::value::Value;

/// Shared bus trait object.
pub type DynObjectBus = Arc<dyn ObjectBus>;

/// Access to the daemon's remote objects.
///
/// Every call is synchronous from the caller's point of view: it returns once
/// the daemon replied or the transport gave up. Nothing here waits for the
/// graph to converge; that is the observer's job.
#[async_trait]
pub trait ObjectBus: Send + Sync {
    /// Well-known name of the daemon on the bus.
    fn service(&self) -> &str;

    /// Root path of the daemon's object tree.
    fn object_root(&self) -> &str;

    /// One bulk enumeration of every managed object (`GetManagedObjects`).
    async fn managed_objects(&self) -> Result<ObjectGraph>;

    /// Reads a single property.
    async fn get_property(&self, path: &str, interface: &str, property: &str) -> Result<Value>;

    /// Invokes a method and returns its out arguments.
    async fn call(
        &self,
        path: &str,
        interface: &str,
        method: &str,
        args: &[Value],
        timeout: Duration,
    ) -> Result<Vec<Value>>;

    /// Introspection XML of an object.
    async fn introspect(&self, path: &str) -> Result<String>;
}
