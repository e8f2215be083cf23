use std::fmt::Write as _;
use thiserror::Error;
use tracing::info;

use crate::charts::{ChartError, ChartPaths, ChartRenderer};
use crate::models::{ClaimRecord, Label};
use crate::pages::escape_html;
use crate::records::{HEADER, RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Chart(#[from] ChartError),
}

/// Number of records per predicted label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelCounts {
    pub fraud: usize,
    pub genuine: usize,
    /// Rows without a prediction; only present in files seeded elsewhere.
    pub unlabelled: usize,
}

impl LabelCounts {
    pub fn from_records(records: &[ClaimRecord]) -> Self {
        records
            .iter()
            .fold(Self::default(), |mut counts, record| {
                match record.ml_prediction {
                    Some(Label::Fraud) => counts.fraud += 1,
                    Some(Label::Genuine) => counts.genuine += 1,
                    None => counts.unlabelled += 1,
                }
                counts
            })
    }

    pub fn labelled(&self) -> usize {
        self.fraud + self.genuine
    }

    pub fn total(&self) -> usize {
        self.labelled() + self.unlabelled
    }
}

#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub counts: LabelCounts,
    pub total_count: usize,
    pub table_html: String,
    pub charts: ChartPaths,
}

#[derive(Debug, Clone)]
pub enum Report {
    /// The store holds no records yet.
    Empty,
    Summary(ReportSummary),
}

/// Builds the admin report from the record store.
#[derive(Clone, Debug)]
pub struct ReportBuilder {
    store: RecordStore,
    charts: ChartRenderer,
}

impl ReportBuilder {
    pub fn new(store: RecordStore, charts: ChartRenderer) -> Self {
        Self { store, charts }
    }

    pub fn charts(&self) -> &ChartRenderer {
        &self.charts
    }

    pub async fn build(&self) -> Result<Report, ReportError> {
        let records = self.store.read_all().await?;
        if records.is_empty() {
            info!("report requested on empty store");
            return Ok(Report::Empty);
        }

        let counts = LabelCounts::from_records(&records);
        let charts = self.charts.render(&counts).await?;
        let table_html = render_table(&records);

        info!(
            fraud = counts.fraud,
            genuine = counts.genuine,
            total = records.len(),
            "report built"
        );
        Ok(Report::Summary(ReportSummary {
            counts,
            total_count: records.len(),
            table_html,
            charts,
        }))
    }
}

/// The whole store as one HTML table.
pub fn render_table(records: &[ClaimRecord]) -> String {
    let mut html = String::from(r#"<table class="table table-striped"><thead><tr>"#);
    for column in HEADER {
        let _ = write!(html, "<th>{column}</th>");
    }
    html.push_str("</tr></thead><tbody>");

    for record in records {
        let label = record.ml_prediction.map(|l| l.as_str()).unwrap_or("");
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{:?}</td><td>{:?}</td><td>{}</td></tr>",
            record.age,
            record.months_as_customer,
            record.policy_annual_premium,
            record.total_claim_amount,
            escape_html(label)
        );
    }

    html.push_str("</tbody></table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClaimFeatures;
    use tempfile::TempDir;

    fn record(label: Option<Label>) -> ClaimRecord {
        ClaimRecord {
            age: 35,
            months_as_customer: 12,
            policy_annual_premium: 1200.5,
            total_claim_amount: 5000.0,
            ml_prediction: label,
        }
    }

    async fn builder() -> (ReportBuilder, RecordStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path().join("insurance.csv"))
            .await
            .unwrap();
        let charts = ChartRenderer::new(dir.path().join("static"));
        (ReportBuilder::new(store.clone(), charts), store, dir)
    }

    #[test]
    fn missing_categories_count_as_zero() {
        let counts = LabelCounts::from_records(&[record(Some(Label::Genuine))]);
        assert_eq!(counts.fraud, 0);
        assert_eq!(counts.genuine, 1);
        assert_eq!(counts.total(), 1);
    }

    #[test]
    fn table_lists_every_row_under_the_store_header() {
        let html = render_table(&[record(Some(Label::Fraud)), record(None)]);
        assert!(html.starts_with(r#"<table class="table table-striped">"#));
        assert!(html.contains("<th>ML_Prediction</th>"));
        assert!(html.contains("<td>1200.5</td><td>5000.0</td><td>Fraud</td>"));
        assert!(html.contains("<td>5000.0</td><td></td></tr>"));
        assert_eq!(html.matches("<tr>").count(), 3);
    }

    #[tokio::test]
    async fn empty_store_renders_no_charts() {
        let (builder, _store, _dir) = builder().await;

        let report = builder.build().await.unwrap();

        assert!(matches!(report, Report::Empty));
        assert_eq!(builder.charts().render_count(), 0);
        assert!(!builder.charts().paths().bar.exists());
    }

    #[tokio::test]
    async fn counts_add_up_to_the_total() {
        let (builder, store, _dir) = builder().await;
        let features = ClaimFeatures {
            age: 40,
            months_as_customer: 2,
            policy_annual_premium: 10.0,
            total_claim_amount: 20.0,
        };
        for label in [Label::Fraud, Label::Genuine, Label::Genuine, Label::Fraud, Label::Genuine] {
            store.append(ClaimRecord::labelled(features, label)).await.unwrap();
        }

        let Report::Summary(summary) = builder.build().await.unwrap() else {
            panic!("expected a summary");
        };

        assert_eq!(summary.counts.fraud, 2);
        assert_eq!(summary.counts.genuine, 3);
        assert_eq!(summary.total_count, 5);
        assert_eq!(summary.counts.fraud + summary.counts.genuine, summary.total_count);
        assert!(summary.charts.bar.exists());
        assert!(summary.charts.pie.exists());
        assert_eq!(summary.table_html.matches("<tr>").count(), 6);
    }

    #[tokio::test]
    async fn unchanged_store_reuses_rendered_charts() {
        let (builder, store, _dir) = builder().await;
        store.append(record(Some(Label::Fraud))).await.unwrap();

        builder.build().await.unwrap();
        builder.build().await.unwrap();
        assert_eq!(builder.charts().render_count(), 1);

        store.append(record(Some(Label::Genuine))).await.unwrap();
        builder.build().await.unwrap();
        assert_eq!(builder.charts().render_count(), 2);
    }
}
