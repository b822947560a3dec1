//! Stage results and the final job manifest.
//!
//! Stages return a tagged collection of successes and failures instead
//! of aborting on the first error, so the manifest can report partial
//! completion explicitly and the caller decides whether it suffices.

use mascotly_core::failure::FailureKind;
use serde::{Deserialize, Serialize};

use crate::request::Phase;

/// One failed unit of stage work.
#[derive(Debug, Clone)]
pub struct StageFailure {
    /// What failed, e.g. `variation-2` or `waving`.
    pub label: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Aggregated outcome of one stage.
#[derive(Debug, Clone)]
pub struct StageOutcome<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<StageFailure>,
}

impl<T> Default for StageOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// One successfully produced asset in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub label: String,
    pub delivery_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

/// One failed asset in the manifest, with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub label: String,
    pub kind: String,
    pub message: String,
}

/// Final listing of which requested assets actually succeeded.
///
/// Stored on the completed job row and returned verbatim on idempotent
/// replays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultManifest {
    pub phase: Phase,
    pub succeeded: Vec<AssetRecord>,
    pub failed: Vec<FailureRecord>,
    /// States dropped by the tier filter before any provider call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_states: Vec<String>,
}

impl ResultManifest {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            succeeded: Vec::new(),
            failed: Vec::new(),
            skipped_states: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, failure: &StageFailure) {
        self.failed.push(FailureRecord {
            label: failure.label.clone(),
            kind: failure.kind.as_str().to_string(),
            message: failure.message.clone(),
        });
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_round_trips_through_json() {
        let mut manifest = ResultManifest::new(Phase::Video);
        manifest.succeeded.push(AssetRecord {
            label: "idle".into(),
            delivery_url: "https://cdn.example/idle.mp4".into(),
            seed: None,
        });
        manifest.skipped_states.push("confused".into());
        manifest.record_failure(&StageFailure {
            label: "waving".into(),
            kind: FailureKind::Transient,
            message: "retries exhausted".into(),
        });

        let value = manifest.to_value();
        let restored = ResultManifest::from_value(&value).unwrap();
        assert_eq!(restored, manifest);
        assert_eq!(restored.failed[0].kind, "transient");
    }
}
