use claim_flow::{Context, FlowError, FlowRunner, Graph, GraphBuilder, Task};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::classifier::Classifier;
use crate::models::{ClaimForm, Label, ValidationError};
use crate::records::RecordStore;
use crate::tasks::{ClassifyClaimTask, ParseClaimTask, RecordClaimTask, session_keys};

pub const PREDICTION_GRAPH_ID: &str = "claim_prediction";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("prediction flow failed: {0}")]
    Flow(#[from] FlowError),
}

/// parse → classify → record
pub fn build_prediction_graph(classifier: Classifier, store: RecordStore) -> Graph {
    let parse_task = Arc::new(ParseClaimTask);
    let parse_id = parse_task.id().to_string();

    let classify_task = Arc::new(ClassifyClaimTask::new(classifier));
    let classify_id = classify_task.id().to_string();

    let record_task = Arc::new(RecordClaimTask::new(store));
    let record_id = record_task.id().to_string();

    GraphBuilder::new(PREDICTION_GRAPH_ID)
        .add_task(parse_task)
        .add_task(classify_task)
        .add_task(record_task)
        .add_edge(&parse_id, &classify_id)
        .add_edge(&classify_id, &record_id)
        .build()
}

/// Entry point for claim submissions.
#[derive(Clone)]
pub struct PredictionPipeline {
    runner: FlowRunner,
}

impl PredictionPipeline {
    pub fn new(classifier: Classifier, store: RecordStore) -> Self {
        let graph = Arc::new(build_prediction_graph(classifier, store));
        Self {
            runner: FlowRunner::new(graph),
        }
    }

    /// Validate, classify and persist one claim, returning its label.
    pub async fn submit(&self, form: ClaimForm) -> Result<Label, SubmitError> {
        let context = Context::new();
        context.set(session_keys::CLAIM_FORM, form).await?;

        let (result, context) = self.runner.run(context).await?;

        if let Some(error) = context
            .get::<ValidationError>(session_keys::VALIDATION_ERROR)
            .await
        {
            return Err(error.into());
        }

        let label: Label = context.require(session_keys::PREDICTION).await?;
        info!(%label, steps = result.trail.len(), "claim submission complete");
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::fixed_classifier;
    use tempfile::TempDir;

    async fn pipeline(raw: i64) -> (PredictionPipeline, RecordStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path().join("insurance.csv"))
            .await
            .unwrap();
        (
            PredictionPipeline::new(fixed_classifier(raw), store.clone()),
            store,
            dir,
        )
    }

    fn form(age: &str, months: &str, premium: &str, claim: &str) -> ClaimForm {
        ClaimForm {
            age: age.into(),
            months: months.into(),
            premium: premium.into(),
            claim: claim.into(),
        }
    }

    #[tokio::test]
    async fn fraud_submission_is_returned_and_recorded() {
        let (pipeline, store, _dir) = pipeline(1).await;

        let label = pipeline
            .submit(form("35", "12", "1200.50", "5000.0"))
            .await
            .unwrap();
        assert_eq!(label, Label::Fraud);

        let rows = store.read_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        let last = rows.last().unwrap();
        assert_eq!(last.ml_prediction, Some(Label::Fraud));
        assert_eq!(last.age, 35);
        assert_eq!(last.months_as_customer, 12);
        assert_eq!(last.policy_annual_premium, 1200.5);
        assert_eq!(last.total_claim_amount, 5000.0);
    }

    #[tokio::test]
    async fn each_submission_appends_exactly_one_matching_row() {
        let (pipeline, store, _dir) = pipeline(0).await;

        for i in 1..=3 {
            let label = pipeline
                .submit(form(&i.to_string(), "1", "10", "10"))
                .await
                .unwrap();
            let rows = store.read_all().await.unwrap();
            assert_eq!(rows.len(), i);
            assert_eq!(rows[i - 1].ml_prediction, Some(label));
        }
    }

    #[tokio::test]
    async fn invalid_form_is_rejected_without_recording() {
        let (pipeline, store, _dir) = pipeline(1).await;

        let err = pipeline
            .submit(form("35", "twelve", "1200.50", "5000.0"))
            .await
            .unwrap_err();

        match err {
            SubmitError::Validation(e) => assert_eq!(e.field(), "months"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_submissions_are_serialised() {
        let (pipeline, store, _dir) = pipeline(1).await;

        let (a, b) = tokio::join!(
            pipeline.submit(form("30", "1", "100", "100")),
            pipeline.submit(form("40", "2", "200", "200")),
        );
        a.unwrap();
        b.unwrap();

        let mut ages: Vec<u32> = store
            .read_all()
            .await
            .unwrap()
            .iter()
            .map(|r| r.age)
            .collect();
        ages.sort_unstable();
        assert_eq!(ages, vec![30, 40]);
    }

    #[test]
    fn graph_wires_three_tasks() {
        let dir = TempDir::new().unwrap();
        let store = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(RecordStore::open(dir.path().join("insurance.csv")))
            .unwrap();
        let graph = build_prediction_graph(fixed_classifier(0), store);

        assert_eq!(graph.task_count(), 3);
        assert_eq!(
            graph.start_task_id(),
            Some(std::any::type_name::<ParseClaimTask>())
        );
    }
}
