pub mod context;
pub mod error;
pub mod graph;
pub mod runner;
pub mod task;

// Re-export commonly used types
pub use context::Context;
pub use error::{FlowError, Result};
pub use graph::{ExecutionResult, Graph, GraphBuilder};
pub use runner::FlowRunner;
pub use task::{NextAction, Task, TaskResult};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct AppendTask {
        id: String,
        suffix: &'static str,
        next: NextAction,
    }

    impl AppendTask {
        fn new(id: &str, suffix: &'static str, next: NextAction) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                suffix,
                next,
            })
        }
    }

    #[async_trait]
    impl Task for AppendTask {
        fn id(&self) -> &str {
            &self.id
        }

        async fn run(&self, context: Context) -> Result<TaskResult> {
            let mut text: String = context.get("text").await.unwrap_or_default();
            text.push_str(self.suffix);
            context.set("text", &text).await?;
            let response = matches!(self.next, NextAction::End).then(|| text.clone());
            Ok(TaskResult::new(response, self.next.clone()))
        }
    }

    struct FailingTask;

    #[async_trait]
    impl Task for FailingTask {
        async fn run(&self, _context: Context) -> Result<TaskResult> {
            Err(FlowError::task_failed(self.id(), "boom"))
        }
    }

    #[tokio::test]
    async fn linear_graph_runs_every_task_in_order() {
        let graph = GraphBuilder::new("linear")
            .add_task(AppendTask::new("a", "a", NextAction::Continue))
            .add_task(AppendTask::new("b", "b", NextAction::Continue))
            .add_task(AppendTask::new("c", "c", NextAction::End))
            .add_edge("a", "b")
            .add_edge("b", "c")
            .build();

        let context = Context::new();
        let result = graph.execute(context.clone()).await.unwrap();

        assert_eq!(result.trail, vec!["a", "b", "c"]);
        assert_eq!(result.last_task_id, "c");
        assert_eq!(result.response.as_deref(), Some("abc"));
        assert_eq!(context.get::<String>("text").await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn end_stops_before_outgoing_edge() {
        let graph = GraphBuilder::new("early_end")
            .add_task(AppendTask::new("a", "a", NextAction::End))
            .add_task(AppendTask::new("b", "b", NextAction::End))
            .add_edge("a", "b")
            .build();

        let result = graph.execute(Context::new()).await.unwrap();
        assert_eq!(result.trail, vec!["a"]);
        assert_eq!(result.response.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn conditional_edge_picks_branch_from_context() {
        let build = || {
            GraphBuilder::new("branching")
                .add_task(AppendTask::new("start", "s", NextAction::Continue))
                .add_task(AppendTask::new("yes", "Y", NextAction::End))
                .add_task(AppendTask::new("no", "N", NextAction::End))
                .add_conditional_edge(
                    "start",
                    |ctx| ctx.get_sync::<bool>("flag").unwrap_or(false),
                    "yes",
                    "no",
                )
                .build()
        };

        let context = Context::new();
        context.set("flag", true).await.unwrap();
        let result = build().execute(context).await.unwrap();
        assert_eq!(result.response.as_deref(), Some("sY"));

        let result = build().execute(Context::new()).await.unwrap();
        assert_eq!(result.response.as_deref(), Some("sN"));
    }

    #[tokio::test]
    async fn goto_unknown_task_is_an_error() {
        let graph = GraphBuilder::new("goto")
            .add_task(AppendTask::new(
                "a",
                "a",
                NextAction::GoTo("missing".to_string()),
            ))
            .build();

        let err = graph.execute(Context::new()).await.unwrap_err();
        assert!(matches!(err, FlowError::TaskNotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn cycles_hit_the_step_limit() {
        let graph = GraphBuilder::new("loop")
            .add_task(AppendTask::new("a", "a", NextAction::Continue))
            .add_edge("a", "a")
            .step_limit(5)
            .build();

        let err = graph.execute(Context::new()).await.unwrap_err();
        assert!(matches!(err, FlowError::StepLimitExceeded { limit: 5, .. }));
    }

    #[tokio::test]
    async fn task_errors_propagate() {
        let graph = GraphBuilder::new("failing")
            .add_task(Arc::new(FailingTask))
            .build();

        let err = graph.execute(Context::new()).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn empty_graph_has_no_start_task() {
        let graph = Graph::new("empty");
        let err = graph.execute(Context::new()).await.unwrap_err();
        assert!(matches!(err, FlowError::MissingStartTask(_)));
    }

    #[tokio::test]
    async fn runner_hands_back_the_shared_context() {
        let graph = GraphBuilder::new("runner")
            .add_task(AppendTask::new("a", "x", NextAction::End))
            .build();
        let runner = FlowRunner::new(Arc::new(graph));

        let context = Context::new();
        context.set("text", "seed-").await.unwrap();
        let (result, context) = runner.run(context).await.unwrap();

        assert_eq!(result.response.as_deref(), Some("seed-x"));
        assert_eq!(context.require::<String>("text").await.unwrap(), "seed-x");
    }

    #[tokio::test]
    async fn require_reports_missing_and_mistyped_keys() {
        let context = Context::new();
        context.set("number", 7).await.unwrap();

        assert_eq!(context.require::<u32>("number").await.unwrap(), 7);
        assert!(matches!(
            context.require::<u32>("absent").await,
            Err(FlowError::ContextError(_))
        ));
        assert!(matches!(
            context.require::<String>("number").await,
            Err(FlowError::ContextError(_))
        ));
    }
}
