//! FlowRunner – a shareable handle that runs one graph to completion per call.
//!
//! Services build the graph once at startup, wrap it in a `FlowRunner`, and keep
//! the runner in their router state. Each request seeds a fresh [`Context`] with
//! its input and calls [`FlowRunner::run`]; the context is returned alongside the
//! result so the caller can read whatever the tasks left behind.

use std::sync::Arc;
use tracing::{Instrument, info_span};

use crate::{
    context::Context,
    error::Result,
    graph::{ExecutionResult, Graph},
};

#[derive(Clone)]
pub struct FlowRunner {
    graph: Arc<Graph>,
}

impl FlowRunner {
    pub fn new(graph: Arc<Graph>) -> Self {
        Self { graph }
    }

    /// Execute the graph from its start task with the given context.
    pub async fn run(&self, context: Context) -> Result<(ExecutionResult, Context)> {
        let span = info_span!("flow", graph_id = %self.graph.id);
        let result = self.graph.execute(context.clone()).instrument(span).await?;
        Ok((result, context))
    }
}
