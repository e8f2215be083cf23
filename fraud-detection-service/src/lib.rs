pub mod auth;
pub mod charts;
pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod pages;
pub mod records;
pub mod report;
pub mod service;
pub mod tasks;
pub mod telemetry;
pub mod workflow;

pub use config::ServiceConfig;
pub use models::{ClaimFeatures, ClaimForm, ClaimRecord, Label, ValidationError};
pub use service::{AppState, build_router};
pub use workflow::{PredictionPipeline, build_prediction_graph};
