use crate::cli::ServeArgs;
use crate::infra::{override_dispatch, AppState, ConfiguredMailer};
use crate::routes::with_notification_routes;
use attendance_notify::config::AppConfig;
use attendance_notify::error::AppError;
use attendance_notify::notifications::NotificationService;
use attendance_notify::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    config.dispatch = override_dispatch(config.dispatch, args.batch_size, args.batch_delay_ms);

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let mailer = ConfiguredMailer::from_config(&config.mail)?;
    let transport = mailer.label();
    let notification_service = Arc::new(NotificationService::new(
        Arc::new(mailer),
        config.mail.from_address.clone(),
        config.dispatch,
    ));

    let app = with_notification_routes(notification_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        transport,
        batch_size = config.dispatch.batch_size,
        batch_delay = ?config.dispatch.inter_batch_delay,
        "attendance notification service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
