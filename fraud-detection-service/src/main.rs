use fraud_detection_service::{AppState, ServiceConfig, build_router, telemetry::init_tracing};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env()?;
    init_tracing(config.log_format);

    if config.default_admin_password {
        warn!("ADMIN_PASSWORD not set, using the built-in admin password");
    }

    let state = AppState::from_config(&config).await?;
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    let addr = listener.local_addr()?;

    info!("Fraud detection service running on http://{}", addr);
    info!(
        data_path = %config.data_path.display(),
        model_path = %config.model_path.display(),
        static_dir = %config.static_dir.display(),
        "Serving login at /, user dashboard at /user, admin dashboard at /admin"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
