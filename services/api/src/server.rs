use crate::cli::ServeArgs;
use crate::infra::{load_staff, AppState, LeaveService, LogNotifier};
use crate::routes::with_leave_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use pto_scheduler::config::AppConfig;
use pto_scheduler::error::AppError;
use pto_scheduler::telemetry;
use pto_scheduler::workflows::leave::{
    InMemoryRequestLedger, InMemoryRosterLock, InMemoryStaffDirectory, LeaveRequestService,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    args.apply_to(&mut config);

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let scheduling = &config.scheduling;
    let staff = load_staff(scheduling.staff_roster_csv.as_deref())?;
    if staff.is_empty() {
        warn!("staff directory is empty; set PTO_STAFF_CSV to seed it");
    }

    let leave_service: Arc<LeaveService> = Arc::new(LeaveRequestService::new(
        Arc::new(InMemoryStaffDirectory::new(staff)),
        Arc::new(InMemoryRequestLedger::new(scheduling.duplicate_policy)),
        Arc::new(InMemoryRosterLock::default()),
        Arc::new(LogNotifier::new(scheduling.notification_sender.clone())),
        scheduling.capacity_policy(),
        scheduling.slot_lock_timeout,
    ));

    let app = with_leave_routes(leave_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        lock_timeout_ms = config.scheduling.slot_lock_timeout.as_millis() as u64,
        "leave request scheduler ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
