//! Coarse application-readiness inference from live tree probes.
//!
//! Status is never cached: every call re-probes the tree through the bridge.
//! The probe order is a deliberate design choice: readiness is checked before
//! busyness so a transient race where both a residual busy marker and a new
//! ready marker exist resolves in favor of progress.

use crate::bridge::ScriptBridge;
use crate::element::ElementRef;
use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Coarse state of a target application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Process not running.
    Inactive,
    /// Busy generating; no input accepted. Covers launching.
    Running,
    /// Idle and accepting input.
    Ready,
    /// Process alive but the expected control surface is unreadable.
    Error,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Inactive => "inactive",
            Status::Running => "running",
            Status::Ready => "ready",
            Status::Error => "error",
        };
        f.write_str(s)
    }
}

/// One observable sign of a state, tolerant of layout variants: candidates
/// are tried in priority order and the first that resolves wins.
#[derive(Debug, Clone)]
pub enum Marker {
    /// The marker holds if any candidate reference resolves in the tree.
    Exists(Vec<ElementRef>),
    /// The marker holds if any button under any candidate collection carries
    /// one of the expected descriptive texts.
    LabelAmong {
        buttons: Vec<ElementRef>,
        labels: Vec<&'static str>,
    },
}

/// Declarative description of how to read one application's status.
#[derive(Debug, Clone)]
pub struct StatusSpec {
    pub ready_markers: Vec<Marker>,
    pub busy_markers: Vec<Marker>,
}

/// Derives a [`Status`] by issuing a bounded sequence of bridge probes.
pub struct StatusDetector;

impl StatusDetector {
    /// Evaluate fresh, short-circuiting in priority order:
    /// not running, ready marker, busy marker, error.
    pub async fn detect(
        bridge: &ScriptBridge,
        spec: &StatusSpec,
    ) -> Result<Status, AutomationError> {
        if !bridge.process_running().await? {
            return Ok(Status::Inactive);
        }

        if Self::any_marker(bridge, &spec.ready_markers).await {
            return Ok(Status::Ready);
        }

        if Self::any_marker(bridge, &spec.busy_markers).await {
            return Ok(Status::Running);
        }

        debug!(process = bridge.process_name(), "no status marker resolved");
        Ok(Status::Error)
    }

    async fn any_marker(bridge: &ScriptBridge, markers: &[Marker]) -> bool {
        for marker in markers {
            if Self::probe(bridge, marker).await {
                return true;
            }
        }
        false
    }

    /// A failed probe never aborts detection; an unreadable candidate reads
    /// as absent and the next candidate is tried.
    async fn probe(bridge: &ScriptBridge, marker: &Marker) -> bool {
        match marker {
            Marker::Exists(candidates) => {
                for candidate in candidates {
                    match bridge.exists(candidate).await {
                        Ok(true) => return true,
                        Ok(false) => {}
                        Err(e) => {
                            warn!(error = %e, "status probe failed; trying next candidate");
                        }
                    }
                }
                false
            }
            Marker::LabelAmong { buttons, labels } => {
                for candidate in buttons {
                    match bridge.query_all("help of current", candidate, "true").await {
                        Ok(helps) => {
                            if helps.iter().any(|h| labels.contains(&h.as_str())) {
                                return true;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "label probe failed; trying next candidate");
                        }
                    }
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ScriptRunner;
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Runner that resolves `exists` by matching the rendered reference
    /// against a fixture tree given as a list of present paths.
    struct TreeFixture {
        running: bool,
        present: Vec<String>,
    }

    #[async_trait]
    impl ScriptRunner for TreeFixture {
        async fn run_script(&self, source: &str) -> Result<String, AutomationError> {
            if source.contains("exists application process") {
                return Ok(self.running.to_string());
            }
            if let Some(rest) = source.split("return exists ").nth(1) {
                let reference = rest.lines().next().unwrap_or_default();
                return Ok(self.present.iter().any(|p| p == reference).to_string());
            }
            Err(AutomationError::BridgeFailure {
                intent: "fixture".to_string(),
                message: "unexpected script".to_string(),
            })
        }
    }

    fn spec(ready: &ElementRef, busy: &ElementRef) -> StatusSpec {
        StatusSpec {
            ready_markers: vec![Marker::Exists(vec![ready.clone()])],
            busy_markers: vec![Marker::Exists(vec![busy.clone()])],
        }
    }

    #[tokio::test]
    async fn not_running_is_inactive() {
        let ready = ElementRef::anchored("button 1");
        let busy = ElementRef::anchored("button 2");
        let runner = Arc::new(TreeFixture {
            running: false,
            present: vec!["button 1".to_string()],
        });
        let bridge = ScriptBridge::new("Claude", runner);
        let status = StatusDetector::detect(&bridge, &spec(&ready, &busy))
            .await
            .unwrap();
        assert_eq!(status, Status::Inactive);
    }

    #[tokio::test]
    async fn ready_wins_over_busy_when_both_present() {
        let ready = ElementRef::anchored("button 1");
        let busy = ElementRef::anchored("button 2");
        let runner = Arc::new(TreeFixture {
            running: true,
            present: vec!["button 1".to_string(), "button 2".to_string()],
        });
        let bridge = ScriptBridge::new("Claude", runner);
        let status = StatusDetector::detect(&bridge, &spec(&ready, &busy))
            .await
            .unwrap();
        assert_eq!(status, Status::Ready);
    }

    #[tokio::test]
    async fn busy_marker_alone_is_running() {
        let ready = ElementRef::anchored("button 1");
        let busy = ElementRef::anchored("button 2");
        let runner = Arc::new(TreeFixture {
            running: true,
            present: vec!["button 2".to_string()],
        });
        let bridge = ScriptBridge::new("Claude", runner);
        let status = StatusDetector::detect(&bridge, &spec(&ready, &busy))
            .await
            .unwrap();
        assert_eq!(status, Status::Running);
    }

    #[tokio::test]
    async fn no_marker_is_error() {
        let ready = ElementRef::anchored("button 1");
        let busy = ElementRef::anchored("button 2");
        let runner = Arc::new(TreeFixture {
            running: true,
            present: vec![],
        });
        let bridge = ScriptBridge::new("Claude", runner);
        let status = StatusDetector::detect(&bridge, &spec(&ready, &busy))
            .await
            .unwrap();
        assert_eq!(status, Status::Error);
    }

    #[tokio::test]
    async fn variant_fallback_resolves_second_candidate() {
        // Fixture tree matches variant B but not variant A.
        let variant_a = ElementRef::anchored("button 1 of group 1");
        let variant_b = ElementRef::anchored("button 1 of group 2");
        let runner = Arc::new(TreeFixture {
            running: true,
            present: vec!["button 1 of group 2".to_string()],
        });
        let bridge = ScriptBridge::new("Claude", runner);
        let spec = StatusSpec {
            ready_markers: vec![Marker::Exists(vec![variant_a, variant_b])],
            busy_markers: vec![],
        };
        let status = StatusDetector::detect(&bridge, &spec).await.unwrap();
        assert_eq!(status, Status::Ready);
    }
}
