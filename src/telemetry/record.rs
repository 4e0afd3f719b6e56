use std::sync::Arc;

use serde::Serialize;

use super::{BackwardSnapshot, ForwardSnapshot, Snapshot, WeightsSnapshot};

/// What a `Record` reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordKind {
    /// A single batch, `batch` is its position within the epoch.
    Batch { batch: usize },

    /// The end of an epoch over `batches` batches. The record's loss is the epoch's average
    /// loss, but its snapshots are the very same ones of the epoch's last batch rather than an
    /// aggregate over the epoch. Whether an aggregate was ever intended is unclear, consumers
    /// should only rely on the loss of these records.
    EpochSummary { batches: usize },
}

/// A telemetry record delivered to an `Observer`.
///
/// Serializes as a single JSON object with the `forward_data`, `backward_data` and
/// `weights_biases_data` sections.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// Zero based epoch index.
    pub epoch: usize,
    #[serde(flatten)]
    pub kind: RecordKind,
    #[serde(rename = "forward_data")]
    pub forward: Arc<ForwardSnapshot>,
    #[serde(rename = "backward_data")]
    pub backward: Arc<BackwardSnapshot>,
    #[serde(rename = "weights_biases_data")]
    pub weights: Arc<WeightsSnapshot>,
    pub loss: f32,
}

impl Record {
    pub fn new(epoch: usize, kind: RecordKind, snapshot: &Snapshot, loss: f32) -> Self {
        Self {
            epoch,
            kind,
            forward: Arc::clone(&snapshot.forward),
            backward: Arc::clone(&snapshot.backward),
            weights: Arc::clone(&snapshot.weights),
            loss,
        }
    }

    pub fn is_epoch_summary(&self) -> bool {
        matches!(self.kind, RecordKind::EpochSummary { .. })
    }
}
