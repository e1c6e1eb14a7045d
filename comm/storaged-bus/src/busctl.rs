//! [`ObjectBus`] over a real message bus, driven through `busctl`.
//!
//! Each operation spawns one `busctl` process with JSON output. This keeps the
//! harness free of a native bus binding while still speaking to the real
//! daemon, and every reply is a self-describing typed document.

use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use storaged_constants::bus::{DEFAULT_OBJECT_ROOT, DEFAULT_SERVICE, OBJECT_MANAGER};

use crate::bus::ObjectBus;
use crate::codec::{decode_managed_objects, decode_property, decode_reply, encode_args};
use crate::error::{BusError, Result};
use crate::graph::ObjectGraph;
use crate::value::Value;

/// Timeout used for reads (property gets, enumeration, introspection).
const READ_TIMEOUT: Duration = Duration::from_secs(25);

/// Extra time granted to the `busctl` process beyond the call timeout.
const PROCESS_GRACE: Duration = Duration::from_secs(5);

/// Which bus to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusKind {
    #[default]
    System,
    Session,
}

impl BusKind {
    const fn flag(self) -> &'static str {
        match self {
            Self::System => "--system",
            Self::Session => "--user",
        }
    }
}

/// `busctl`-backed connection to the daemon.
#[derive(Debug, Clone)]
pub struct BusctlBus {
    busctl: PathBuf,
    bus: BusKind,
    service: String,
    object_root: String,
}

impl BusctlBus {
    /// Creates a connection to `service` rooted at `object_root`.
    pub fn new(bus: BusKind, service: impl Into<String>, object_root: impl Into<String>) -> Self {
        Self {
            busctl: PathBuf::from("busctl"),
            bus,
            service: service.into(),
            object_root: object_root.into(),
        }
    }

    /// Overrides the `busctl` executable.
    #[must_use]
    pub fn with_busctl(mut self, path: impl Into<PathBuf>) -> Self {
        self.busctl = path.into();
        self
    }

    async fn run(&self, args: &[String], timeout: Duration, what: &str) -> Result<String> {
        let mut cmd = Command::new(&self.busctl);
        cmd.arg(self.bus.flag())
            .arg("--json=short")
            .arg(format!("--timeout={}", timeout.as_secs().max(1)))
            .args(args)
            .kill_on_drop(true);

        trace!(busctl = ?args, "spawning busctl");
        let output = tokio::time::timeout(timeout + PROCESS_GRACE, cmd.output())
            .await
            .map_err(|_| BusError::Timeout {
                method: what.to_string(),
                timeout,
            })?
            .map_err(|e| BusError::Transport(format!("failed to run busctl: {e}")))?;

        check_output(output, what, timeout)
    }
}

fn check_output(output: Output, what: &str, timeout: Duration) -> Result<String> {
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(classify_failure(&stderr, what, timeout))
}

/// Maps a `busctl` failure message onto a [`BusError`].
fn classify_failure(stderr: &str, what: &str, timeout: Duration) -> BusError {
    let message = stderr
        .strip_prefix("Call failed: ")
        .unwrap_or(stderr)
        .to_string();

    if message.contains("Connection timed out") || message.contains("Timeout was reached") {
        BusError::Timeout {
            method: what.to_string(),
            timeout,
        }
    } else if message.contains("Unknown object") || message.contains("Object does not exist at path") {
        BusError::NoSuchObject(message)
    } else if message.contains("Unknown interface") || message.contains("No such interface") {
        BusError::NoSuchInterface {
            path: String::new(),
            interface: message,
        }
    } else if message.contains("Unknown property") {
        BusError::NoSuchProperty {
            path: String::new(),
            interface: String::new(),
            property: message,
        }
    } else if message.contains("Failed to connect to bus") || message.contains("was not provided by any") {
        BusError::Transport(message)
    } else {
        BusError::remote_message(message)
    }
}

#[async_trait]
impl ObjectBus for BusctlBus {
    fn service(&self) -> &str {
        &self.service
    }

    fn object_root(&self) -> &str {
        &self.object_root
    }

    async fn managed_objects(&self) -> Result<ObjectGraph> {
        let args = [
            "call".to_string(),
            self.service.clone(),
            self.object_root.clone(),
            OBJECT_MANAGER.to_string(),
            "GetManagedObjects".to_string(),
        ];
        let out = self.run(&args, READ_TIMEOUT, "GetManagedObjects").await?;
        let graph = decode_managed_objects(&out)?;
        debug!(objects = graph.len(), "enumerated managed objects");
        Ok(graph)
    }

    async fn get_property(&self, path: &str, interface: &str, property: &str) -> Result<Value> {
        let args = [
            "get-property".to_string(),
            self.service.clone(),
            path.to_string(),
            interface.to_string(),
            property.to_string(),
        ];
        let what = format!("{interface}.{property}");
        match self.run(&args, READ_TIMEOUT, &what).await {
            Ok(out) => decode_property(&out),
            Err(BusError::NoSuchObject(_)) => Err(BusError::NoSuchObject(path.to_string())),
            Err(BusError::NoSuchInterface { .. }) => Err(BusError::NoSuchInterface {
                path: path.to_string(),
                interface: interface.to_string(),
            }),
            Err(BusError::NoSuchProperty { .. }) => Err(BusError::NoSuchProperty {
                path: path.to_string(),
                interface: interface.to_string(),
                property: property.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn call(
        &self,
        path: &str,
        interface: &str,
        method: &str,
        args: &[Value],
        timeout: Duration,
    ) -> Result<Vec<Value>> {
        let (sig, tokens) = encode_args(args);
        let mut argv = vec![
            "call".to_string(),
            self.service.clone(),
            path.to_string(),
            interface.to_string(),
            method.to_string(),
        ];
        if !sig.is_empty() {
            argv.push(sig);
            argv.extend(tokens);
        }
        let what = format!("{interface}.{method}");
        debug!(path, method = %what, "calling method");
        let out = self.run(&argv, timeout, &what).await?;
        decode_reply(&out)
    }

    async fn introspect(&self, path: &str) -> Result<String> {
        let args = [
            "introspect".to_string(),
            "--xml-interface".to_string(),
            self.service.clone(),
            path.to_string(),
        ];
        self.run(&args, READ_TIMEOUT, "Introspect").await
    }
}

impl Default for BusctlBus {
    fn default() -> Self {
        Self::new(BusKind::System, DEFAULT_SERVICE, DEFAULT_OBJECT_ROOT)
    }
}
