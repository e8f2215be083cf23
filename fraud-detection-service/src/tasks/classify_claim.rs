use async_trait::async_trait;
use claim_flow::{Context, Result, Task, TaskResult};
use tracing::info;

use crate::classifier::Classifier;
use crate::models::ClaimFeatures;
use crate::tasks::session_keys;

/// Runs the fraud model over the parsed features.
pub struct ClassifyClaimTask {
    classifier: Classifier,
}

impl ClassifyClaimTask {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Task for ClassifyClaimTask {
    async fn run(&self, context: Context) -> Result<TaskResult> {
        let features: ClaimFeatures = context.require(session_keys::CLAIM_FEATURES).await?;

        let label = self.classifier.predict(&features);
        info!(task_id = %self.id(), %label, "claim classified");

        context.set(session_keys::PREDICTION, label).await?;
        Ok(TaskResult::proceed())
    }
}
