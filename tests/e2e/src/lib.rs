//! End-to-end test framework for the storage daemon.
//!
//! The daemon publishes its state as an object graph on a message bus and
//! converges to the effect of a method call some time after the call
//! returns. This crate gives tests a way to drive it and to wait for that
//! convergence explicitly:
//!
//! 1. **Properties** - [`RemotePropertyProxy`] reads, [`ValueAssertion`] checks with retry
//! 2. **Objects** - [`ObjectGraphObserver`] snapshots and waits for paths and interfaces
//! 3. **Device stacks** - [`DeviceStackModel`] builds disk / VG / LV / LUKS / filesystem layers
//! 4. **Teardown** - [`plan_cascade`] predicts and verifies what a tear-down removes
//! 5. **Environment** - [`TestHarness`], [`VdevPool`] and ground-truth [`tools`]
//!
//! Suites under `tests/` run hermetically against [`sim::SimulatedDaemon`];
//! the `#[ignore]`d live suites need root, virtual disks and a running daemon.

pub mod observer;

pub use assertions::{RetryConfig, ValueAssertion, with_retry};
pub use client::DaemonClient;
pub use config::{BusChoice, TestConfig};
pub use config_store::{ConfigRecord, ConfigStore};
pub use error::{HarnessError, Observed, Result};
pub use fabrics::{ConnectOptions, FormatOptions, IscsiInitiator, NvmeManager};
pub use fixtures::VdevPool;
pub use handle::{HandleId, HandleTable};
pub use harness::{CleanupStack, TestHarness};
pub use observer::{ObjectGraphObserver, ObjectGraphSnapshot};
pub use property::RemotePropertyProxy;
pub use stack::{DeviceStackModel, EncryptionSpec, LayerKind, VdoParams, VolumeKind};
pub use teardown::{PlanStatus, TeardownPlan, TriggerMode, plan_cascade};

/// Installs the test log subscriber once. `RUST_LOG` overrides the default
/// `storaged_e2e=info,storaged_bus=info` filter.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("storaged_e2e=info,storaged_bus=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
