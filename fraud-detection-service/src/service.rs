use anyhow::Context as _;
use axum::{
    Form, Router,
    extract::State,
    middleware::from_fn,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::{
    auth::{InMemorySessionStorage, Role, RoleGate, Session, SessionStorage},
    charts::ChartRenderer,
    classifier::Classifier,
    config::ServiceConfig,
    error::AppError,
    models::ClaimForm,
    pages,
    records::RecordStore,
    report::{Report, ReportBuilder},
    telemetry::correlation_id_middleware,
    workflow::PredictionPipeline,
};

pub const SESSION_COOKIE: &str = "fraud_session";

#[derive(Clone)]
pub struct AppState {
    pub gate: RoleGate,
    pub pipeline: PredictionPipeline,
    pub reports: ReportBuilder,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        gate: RoleGate,
        classifier: Classifier,
        store: RecordStore,
        static_dir: PathBuf,
    ) -> Self {
        let charts = ChartRenderer::new(static_dir.clone());
        Self {
            gate,
            pipeline: PredictionPipeline::new(classifier, store.clone()),
            reports: ReportBuilder::new(store, charts),
            static_dir,
        }
    }

    /// Open the record store, load the model and prepare the static
    /// directory. Any failure here is fatal for the process.
    pub async fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        let store = RecordStore::open(&config.data_path)
            .await
            .with_context(|| format!("opening record store {}", config.data_path.display()))?;

        let classifier = Classifier::load(&config.model_path)
            .with_context(|| format!("loading fraud model {}", config.model_path.display()))?;

        tokio::fs::create_dir_all(&config.static_dir)
            .await
            .with_context(|| format!("creating static dir {}", config.static_dir.display()))?;

        let sessions: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        let gate = RoleGate::new(config.admin_password.clone(), config.session_ttl, sessions);

        Ok(Self::new(gate, classifier, store, config.static_dir.clone()))
    }
}

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(login_page))
        .route("/login", post(login))
        .route("/user", get(user_dashboard))
        .route("/predict", post(predict))
        .route("/admin", get(admin_dashboard))
        .route("/health", get(health_check))
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(correlation_id_middleware))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn login_page() -> Html<String> {
    Html(pages::login_page())
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    role: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let outcome = state
        .gate
        .authenticate(form.role.as_deref(), form.password.as_deref())
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, outcome.session.id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Redirect::to(outcome.redirect_to)))
}

async fn current_session(state: &AppState, jar: &CookieJar) -> Option<Session> {
    let id = jar.get(SESSION_COOKIE)?.value().to_string();
    state.gate.session(&id).await
}

async fn user_dashboard(State(state): State<AppState>, jar: CookieJar) -> Response {
    if current_session(&state, &jar).await.is_none() {
        return Redirect::to("/").into_response();
    }
    Html(pages::user_dashboard(None, None)).into_response()
}

async fn predict(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ClaimForm>,
) -> Result<Response, AppError> {
    let Some(session) = current_session(&state, &jar).await else {
        return Ok(Redirect::to("/").into_response());
    };

    let label = state.pipeline.submit(form).await?;
    info!(session_id = %session.id, %label, "prediction served");

    Ok(Html(pages::user_dashboard(Some(label), None)).into_response())
}

async fn admin_dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let is_admin = current_session(&state, &jar)
        .await
        .is_some_and(|session| session.role == Role::Admin);
    if !is_admin {
        return Ok(Redirect::to("/").into_response());
    }

    match state.reports.build().await? {
        Report::Empty => Ok(pages::EMPTY_STORE_MESSAGE.into_response()),
        Report::Summary(summary) => Ok(Html(pages::admin_dashboard(&summary)).into_response()),
    }
}
