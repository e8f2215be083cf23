use async_trait::async_trait;
use claim_flow::{Context, NextAction, Result, Task, TaskResult};
use tracing::{info, warn};

use crate::models::ClaimForm;
use crate::tasks::session_keys;

/// Validates the submitted form and stores the parsed features.
///
/// A rejected form ends the flow early with the validation error left in the
/// context for the caller.
pub struct ParseClaimTask;

#[async_trait]
impl Task for ParseClaimTask {
    async fn run(&self, context: Context) -> Result<TaskResult> {
        let form: ClaimForm = context.require(session_keys::CLAIM_FORM).await?;

        match form.parse() {
            Ok(features) => {
                info!(task_id = %self.id(), age = features.age, "claim form parsed");
                context.set(session_keys::CLAIM_FEATURES, features).await?;
                Ok(TaskResult::proceed())
            }
            Err(error) => {
                warn!(task_id = %self.id(), field = %error.field(), %error, "claim form rejected");
                context.set(session_keys::VALIDATION_ERROR, &error).await?;
                Ok(TaskResult::new(None, NextAction::End))
            }
        }
    }
}
