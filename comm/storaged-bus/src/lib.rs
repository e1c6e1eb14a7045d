//! Client side of the storage daemon's object graph.
//!
//! The daemon publishes its state as path-addressed objects, each carrying a
//! set of interfaces with typed properties. This crate models that graph and
//! the transport used to reach it:
//!
//! - [`Value`] - a typed property or argument value with its bus signature
//! - [`ObjectGraph`] - a point-in-time snapshot of every object the daemon manages
//! - [`PathMatcher`] - exact, prefix or regular-expression selection of object paths
//! - [`ObjectBus`] - the connected handle everything else consumes
//! - [`BusctlBus`] - `ObjectBus` over the system or session bus via `busctl`
//! - [`MemoryBus`] - an in-process graph with scriptable methods and delayed mutations

pub mod bus;
pub mod busctl;
pub mod codec;
pub mod error;
pub mod graph;
pub mod matcher;
pub mod memory;
pub mod value;

pub use bus::{DynObjectBus, ObjectBus};
pub use busctl::{BusKind, BusctlBus};
pub use error::{BusError, Result};
pub use graph::{GraphDiff, InterfaceMap, ObjectGraph, PropertyMap};
pub use matcher::PathMatcher;
pub use memory::{MemoryBus, MemoryState, MethodCall};
pub use value::Value;
