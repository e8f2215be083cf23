use thiserror::Error;

/// Errors raised while building or executing a task graph.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("graph `{0}` has no start task")]
    MissingStartTask(String),

    #[error("task `{task_id}` failed: {reason}")]
    TaskExecutionFailed { task_id: String, reason: String },

    #[error("context error: {0}")]
    ContextError(String),

    #[error("graph `{graph_id}` exceeded {limit} steps")]
    StepLimitExceeded { graph_id: String, limit: usize },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FlowError {
    pub fn task_failed(task_id: impl Into<String>, reason: impl ToString) -> Self {
        Self::TaskExecutionFailed {
            task_id: task_id.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
