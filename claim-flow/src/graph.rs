use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    context::Context,
    error::{FlowError, Result},
    task::{NextAction, Task, TaskResult},
};

/// Upper bound on task invocations per execution; guards against cycles.
pub const DEFAULT_STEP_LIMIT: usize = 64;

/// Type alias for edge condition functions
pub type EdgeCondition = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Outgoing edge of a task.
#[derive(Clone)]
enum Edge {
    Direct(String),
    Branch {
        condition: EdgeCondition,
        yes: String,
        no: String,
    },
}

/// A graph of tasks that can be executed
pub struct Graph {
    pub id: String,
    tasks: HashMap<String, Arc<dyn Task>>,
    edges: HashMap<String, Edge>,
    start_task_id: Option<String>,
    step_limit: usize,
}

impl Graph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: HashMap::new(),
            edges: HashMap::new(),
            start_task_id: None,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    /// Run the graph from its start task until a task ends the flow or
    /// there is no outgoing edge left to follow.
    pub async fn execute(&self, context: Context) -> Result<ExecutionResult> {
        let start = self
            .start_task_id
            .clone()
            .ok_or_else(|| FlowError::MissingStartTask(self.id.clone()))?;
        self.execute_from(&start, context).await
    }

    /// Run the graph starting from a specific task.
    pub async fn execute_from(&self, task_id: &str, context: Context) -> Result<ExecutionResult> {
        let mut current = task_id.to_string();
        let mut trail = Vec::new();

        loop {
            if trail.len() >= self.step_limit {
                return Err(FlowError::StepLimitExceeded {
                    graph_id: self.id.clone(),
                    limit: self.step_limit,
                });
            }

            let result = self.execute_single_task(&current, context.clone()).await?;
            trail.push(result.task_id.clone());

            let next = match &result.next_action {
                NextAction::End => None,
                NextAction::Continue => self.find_next_task(&current, &context),
                NextAction::GoTo(target) => {
                    if !self.tasks.contains_key(target) {
                        return Err(FlowError::TaskNotFound(target.clone()));
                    }
                    Some(target.clone())
                }
            };

            match next {
                Some(next_task_id) => {
                    debug!(graph_id = %self.id, from = %current, to = %next_task_id, "following edge");
                    current = next_task_id;
                }
                None => {
                    info!(graph_id = %self.id, steps = trail.len(), "graph execution finished");
                    return Ok(ExecutionResult {
                        response: result.response,
                        last_task_id: result.task_id,
                        trail,
                    });
                }
            }
        }
    }

    async fn execute_single_task(&self, task_id: &str, context: Context) -> Result<TaskResult> {
        let task = self
            .tasks
            .get(task_id)
            .ok_or_else(|| FlowError::TaskNotFound(task_id.to_string()))?;

        let mut result = task.run(context).await?;
        result.task_id = task_id.to_string();
        Ok(result)
    }

    /// Find the next task based on the outgoing edge of `current_task_id`
    pub fn find_next_task(&self, current_task_id: &str, context: &Context) -> Option<String> {
        match self.edges.get(current_task_id)? {
            Edge::Direct(to) => Some(to.clone()),
            Edge::Branch { condition, yes, no } => {
                if condition(context) {
                    Some(yes.clone())
                } else {
                    Some(no.clone())
                }
            }
        }
    }

    pub fn start_task_id(&self) -> Option<&str> {
        self.start_task_id.as_deref()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

/// Builder for creating graphs
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            graph: Graph::new(id),
        }
    }

    /// Add a task; the first task added becomes the start task.
    pub fn add_task(mut self, task: Arc<dyn Task>) -> Self {
        let task_id = task.id().to_string();
        if self.graph.tasks.is_empty() {
            self.graph.start_task_id = Some(task_id.clone());
        }
        self.graph.tasks.insert(task_id, task);
        self
    }

    /// Add an unconditional edge. A later edge from the same task replaces
    /// the earlier one.
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.graph.edges.insert(from.into(), Edge::Direct(to.into()));
        self
    }

    /// Add a two-way branch: `yes` when `condition` holds, `no` otherwise.
    pub fn add_conditional_edge<F>(
        mut self,
        from: impl Into<String>,
        condition: F,
        yes: impl Into<String>,
        no: impl Into<String>,
    ) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.graph.edges.insert(
            from.into(),
            Edge::Branch {
                condition: Arc::new(condition),
                yes: yes.into(),
                no: no.into(),
            },
        );
        self
    }

    pub fn step_limit(mut self, limit: usize) -> Self {
        self.graph.step_limit = limit;
        self
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}

/// Outcome of a completed graph execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Response of the last task that ran
    pub response: Option<String>,
    pub last_task_id: String,
    /// Ids of the tasks that ran, in order
    pub trail: Vec<String>,
}
