//! Waiting for the object graph to converge.
//!
//! Every wait takes fresh snapshots until the expected presence or absence
//! holds. Matches come back as sets: enumeration order says nothing about
//! creation order, so callers pick among matches by content.

use std::collections::BTreeSet;
use std::time::Duration;

use storaged_bus::{DynObjectBus, ObjectGraph, PathMatcher};
use tokio::time::Instant;
use tracing::debug;

use crate::error::{HarnessError, Result};

/// A point-in-time capture of the whole graph.
pub type ObjectGraphSnapshot = ObjectGraph;

/// Polls bulk snapshots of the daemon's graph.
#[derive(Clone)]
pub struct ObjectGraphObserver {
    bus: DynObjectBus,
    poll_interval: Duration,
}

impl ObjectGraphObserver {
    pub fn new(bus: DynObjectBus, poll_interval: Duration) -> Self {
        Self { bus, poll_interval }
    }

    /// One bulk enumeration.
    ///
    /// # Errors
    ///
    /// Returns a bus error if the enumeration fails.
    pub async fn snapshot(&self) -> Result<ObjectGraphSnapshot> {
        self.bus.managed_objects().await.map_err(HarnessError::Bus)
    }

    /// Polls until `check` returns `Some`, or fails after `timeout`.
    ///
    /// `describe` renders the last snapshot for the timeout report.
    async fn converge<T>(
        &self,
        subject: String,
        expected: &'static str,
        timeout: Duration,
        mut check: impl FnMut(&ObjectGraph) -> Option<T>,
        describe: impl Fn(&ObjectGraph) -> String,
    ) -> Result<T> {
        let start = Instant::now();
        loop {
            let snapshot = self.snapshot().await?;
            if let Some(found) = check(&snapshot) {
                debug!(
                    subject = %subject,
                    expected,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "graph converged"
                );
                return Ok(found);
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(HarnessError::GraphConvergenceTimeout {
                    subject,
                    expected,
                    last: describe(&snapshot),
                    elapsed,
                    timeout,
                });
            }
            tokio::time::sleep(self.poll_interval.min(timeout - elapsed)).await;
        }
    }

    /// Waits until some path matches (`present`) or none does (`!present`).
    ///
    /// Returns every path matching at convergence when waiting for presence,
    /// and every path that matched at some point during the wait when
    /// waiting for absence.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::GraphConvergenceTimeout`] with the matches seen
    /// last if the deadline passes.
    pub async fn wait_for_path(
        &self,
        matcher: &PathMatcher,
        present: bool,
        timeout: Duration,
    ) -> Result<BTreeSet<String>> {
        let mut seen = BTreeSet::new();
        self.converge(
            format!("path {matcher}"),
            if present { "present" } else { "absent" },
            timeout,
            |graph| {
                let matches = graph.matching(matcher);
                if present {
                    (!matches.is_empty()).then_some(matches)
                } else if matches.is_empty() {
                    Some(std::mem::take(&mut seen))
                } else {
                    seen.extend(matches);
                    None
                }
            },
            |graph| format!("{:?}", graph.matching(matcher)),
        )
        .await
    }

    /// Waits for an exact path to appear or disappear.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::GraphConvergenceTimeout`] if the object is not
    /// in the wanted state by `timeout`, or a bus error if a snapshot fails.
    pub async fn wait_for_object(&self, path: &str, present: bool, timeout: Duration) -> Result<()> {
        self.wait_for_path(&PathMatcher::exact(path), present, timeout)
            .await
            .map(drop)
    }

    /// Waits for paths matching `matcher` that were not in `before`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::GraphConvergenceTimeout`] if nothing new appears.
    pub async fn wait_for_new_paths(
        &self,
        before: &ObjectGraphSnapshot,
        matcher: &PathMatcher,
        timeout: Duration,
    ) -> Result<BTreeSet<String>> {
        let fresh = |graph: &ObjectGraph| -> BTreeSet<String> {
            graph
                .matching(matcher)
                .into_iter()
                .filter(|p| !before.contains(p))
                .collect()
        };
        self.converge(
            format!("new path {matcher}"),
            "present",
            timeout,
            |graph| {
                let new = fresh(graph);
                (!new.is_empty()).then_some(new)
            },
            |graph| format!("{:?}", graph.matching(matcher)),
        )
        .await
    }

    /// Waits for an interface on a known path to appear or disappear.
    ///
    /// A missing object counts as a missing interface.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::GraphConvergenceTimeout`] listing the object's
    /// interfaces at the last snapshot.
    pub async fn wait_for_interface(
        &self,
        path: &str,
        interface: &str,
        present: bool,
        timeout: Duration,
    ) -> Result<()> {
        self.converge(
            format!("interface {interface} on {path}"),
            if present { "present" } else { "absent" },
            timeout,
            |graph| (graph.has_interface(path, interface) == present).then_some(()),
            |graph| match graph.interfaces(path) {
                Some(ifaces) => format!("{:?}", ifaces.keys().collect::<Vec<_>>()),
                None => "no such object".to_string(),
            },
        )
        .await
    }

    /// Waits until an arbitrary condition over the snapshot holds.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::GraphConvergenceTimeout`] with the object count
    /// of the last snapshot if the condition never holds.
    pub async fn wait_until<F>(&self, description: &str, timeout: Duration, condition: F) -> Result<ObjectGraph>
    where
        F: Fn(&ObjectGraph) -> bool,
    {
        self.converge(
            description.to_string(),
            "satisfied",
            timeout,
            |graph| condition(graph).then(|| graph.clone()),
            |graph| format!("{} objects", graph.len()),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use storaged_bus::{MemoryBus, PropertyMap};

    const SESSION: &str = "org.freedesktop.UDisks2.ISCSI.Session";
    const ENCRYPTED: &str = "org.freedesktop.UDisks2.Encrypted";

    fn setup() -> (MemoryBus, ObjectGraphObserver) {
        let bus = MemoryBus::new("org.freedesktop.UDisks2", "/org/freedesktop/UDisks2");
        let observer = ObjectGraphObserver::new(Arc::new(bus.clone()), Duration::from_millis(100));
        (bus, observer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_pattern_returns_all_matches() {
        let (bus, observer) = setup();
        bus.with_state(|s| {
            s.schedule(Duration::from_millis(300), |s| {
                s.export("/org/freedesktop/UDisks2/iscsi/session3", SESSION, PropertyMap::new());
                s.export("/org/freedesktop/UDisks2/iscsi/session1", SESSION, PropertyMap::new());
            });
        });

        let matcher = PathMatcher::pattern(r".*/iscsi/session[0-9]+$").expect("regex");
        let found = observer
            .wait_for_path(&matcher, true, Duration::from_secs(2))
            .await
            .expect("sessions should appear");
        assert_eq!(found.len(), 2);
        assert!(found.contains("/org/freedesktop/UDisks2/iscsi/session1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_absence() {
        let (bus, observer) = setup();
        let path = "/org/freedesktop/UDisks2/block_devices/dm_2d1";
        bus.with_state(|s| {
            s.export(path, "org.freedesktop.UDisks2.Block", PropertyMap::new());
            s.schedule(Duration::from_millis(500), move |s| s.unexport(path));
        });

        let gone = observer
            .wait_for_path(&PathMatcher::exact(path), false, Duration::from_secs(2))
            .await
            .expect("object should vanish");
        assert_eq!(gone, BTreeSet::from([path.to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_last_matches() {
        let (bus, observer) = setup();
        let path = "/org/freedesktop/UDisks2/lvm/vg0";
        bus.with_state(|s| s.export(path, "org.freedesktop.UDisks2.VolumeGroup", PropertyMap::new()));

        let err = observer
            .wait_for_object(path, false, Duration::from_secs(1))
            .await
            .unwrap_err();
        match &err {
            HarnessError::GraphConvergenceTimeout { expected, last, elapsed, .. } => {
                assert_eq!(*expected, "absent");
                assert!(last.contains(path));
                assert!(*elapsed >= Duration::from_secs(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_interface() {
        let (bus, observer) = setup();
        let path = "/org/freedesktop/UDisks2/block_devices/dm_2d0";
        bus.with_state(|s| {
            s.export(path, "org.freedesktop.UDisks2.Block", PropertyMap::new());
            s.schedule(Duration::from_millis(400), move |s| {
                s.export(path, ENCRYPTED, PropertyMap::new());
            });
        });
        observer
            .wait_for_interface(path, ENCRYPTED, true, Duration::from_secs(2))
            .await
            .expect("interface should appear");

        bus.with_state(|s| {
            s.schedule(Duration::from_millis(400), move |s| {
                s.graph_mut().remove_interface(path, ENCRYPTED);
            });
        });
        observer
            .wait_for_interface(path, ENCRYPTED, false, Duration::from_secs(2))
            .await
            .expect("interface should vanish");
        assert!(observer.snapshot().await.expect("snapshot").contains(path));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_new_paths_ignores_existing() {
        let (bus, observer) = setup();
        bus.with_state(|s| s.export("/org/freedesktop/UDisks2/iscsi/session0", SESSION, PropertyMap::new()));
        let before = observer.snapshot().await.expect("snapshot");
        bus.with_state(|s| {
            s.schedule(Duration::from_millis(200), |s| {
                s.export("/org/freedesktop/UDisks2/iscsi/session7", SESSION, PropertyMap::new());
            });
        });
        let matcher = PathMatcher::pattern(r".*/iscsi/session[0-9]+$").expect("regex");
        let new = observer
            .wait_for_new_paths(&before, &matcher, Duration::from_secs(1))
            .await
            .expect("new session");
        assert_eq!(new, BTreeSet::from(["/org/freedesktop/UDisks2/iscsi/session7".to_string()]));
    }
}
