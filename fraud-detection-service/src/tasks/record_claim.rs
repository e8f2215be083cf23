use async_trait::async_trait;
use claim_flow::{Context, FlowError, Result, Task, TaskResult};
use tracing::{error, info};

use crate::models::{ClaimFeatures, ClaimRecord, Label};
use crate::records::RecordStore;
use crate::tasks::session_keys;

/// Appends the labelled claim to the record store and ends the flow with
/// the label as the response.
pub struct RecordClaimTask {
    store: RecordStore,
}

impl RecordClaimTask {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Task for RecordClaimTask {
    async fn run(&self, context: Context) -> Result<TaskResult> {
        let features: ClaimFeatures = context.require(session_keys::CLAIM_FEATURES).await?;
        let label: Label = context.require(session_keys::PREDICTION).await?;

        self.store
            .append(ClaimRecord::labelled(features, label))
            .await
            .map_err(|e| {
                error!(task_id = %self.id(), error = %e, "failed to record claim");
                FlowError::task_failed(self.id(), e)
            })?;

        info!(task_id = %self.id(), %label, "claim recorded");
        Ok(TaskResult::finish(label.as_str()))
    }
}
