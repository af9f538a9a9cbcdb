use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::approval::ApprovalError;
use super::capacity::CapacityError;
use super::directory::StaffDirectory;
use super::domain::{LeaveRequest, RequestId, ShiftCode, StaffId};
use super::ranking::WaitlistStanding;
use super::repository::{LedgerError, Notifier, RequestLedger, RosterLock};
use super::scheduler::{SchedulingError, SubmissionReceipt};
use super::service::{LeaveRequestService, LeaveServiceError};

/// Router builder exposing HTTP endpoints for submission, approval, and lookups.
pub fn leave_router<D, L, R, N>(service: Arc<LeaveRequestService<D, L, R, N>>) -> Router
where
    D: StaffDirectory + 'static,
    L: RequestLedger + 'static,
    R: RosterLock + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/api/v1/leave/requests", post(submit_handler::<D, L, R, N>))
        .route(
            "/api/v1/leave/requests/:request_id",
            get(status_handler::<D, L, R, N>),
        )
        .route("/api/v1/leave/approvals", post(approve_handler::<D, L, R, N>))
        .route("/api/v1/leave/waitlist", get(waitlist_handler::<D, L, R, N>))
        .with_state(service)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmitLeaveRequest {
    pub staff_id: StaffId,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApproveLeaveRequest {
    pub request_id: RequestId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaitlistQuery {
    pub date: NaiveDate,
    pub shift: ShiftCode,
}

/// Sanitized submission result returned to the requester.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionView {
    pub request_id: RequestId,
    pub staff_id: StaffId,
    pub date: NaiveDate,
    pub shift: ShiftCode,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<u32>,
    pub remaining_balance: u32,
    pub message: String,
}

impl From<&SubmissionReceipt> for SubmissionView {
    fn from(receipt: &SubmissionReceipt) -> Self {
        Self {
            request_id: receipt.request_id,
            staff_id: receipt.staff_id,
            date: receipt.slot.date,
            shift: receipt.slot.shift,
            outcome: receipt.decision.status().label(),
            waitlist_position: receipt.decision.waitlist_position(),
            remaining_balance: receipt.remaining_balance,
            message: receipt.message(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveRequestView {
    pub request_id: RequestId,
    pub staff_id: StaffId,
    pub date: NaiveDate,
    pub shift: ShiftCode,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<u32>,
}

impl From<&LeaveRequest> for LeaveRequestView {
    fn from(request: &LeaveRequest) -> Self {
        Self {
            request_id: request.id,
            staff_id: request.staff_id,
            date: request.date,
            shift: request.shift,
            status: request.status.label(),
            waitlist_position: request.waitlist_position,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WaitlistView {
    pub date: NaiveDate,
    pub shift: ShiftCode,
    pub entries: Vec<WaitlistStanding>,
}

pub(crate) async fn submit_handler<D, L, R, N>(
    State(service): State<Arc<LeaveRequestService<D, L, R, N>>>,
    axum::Json(payload): axum::Json<SubmitLeaveRequest>,
) -> Response
where
    D: StaffDirectory + 'static,
    L: RequestLedger + 'static,
    R: RosterLock + 'static,
    N: Notifier + 'static,
{
    let result = run_blocking(move || service.submit(payload.staff_id, payload.date)).await;
    match result {
        Ok(receipt) => (
            StatusCode::CREATED,
            axum::Json(SubmissionView::from(&receipt)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<D, L, R, N>(
    State(service): State<Arc<LeaveRequestService<D, L, R, N>>>,
    Path(request_id): Path<u64>,
) -> Response
where
    D: StaffDirectory + 'static,
    L: RequestLedger + 'static,
    R: RosterLock + 'static,
    N: Notifier + 'static,
{
    match service.get(RequestId(request_id)) {
        Ok(request) => (StatusCode::OK, axum::Json(LeaveRequestView::from(&request))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approve_handler<D, L, R, N>(
    State(service): State<Arc<LeaveRequestService<D, L, R, N>>>,
    axum::Json(payload): axum::Json<ApproveLeaveRequest>,
) -> Response
where
    D: StaffDirectory + 'static,
    L: RequestLedger + 'static,
    R: RosterLock + 'static,
    N: Notifier + 'static,
{
    let request_id = payload.request_id;
    match run_blocking(move || service.approve(request_id)).await {
        Ok(receipt) => {
            let payload = json!({
                "request_id": request_id,
                "approved": true,
                "notified": receipt.notified,
                "message": receipt.message(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => {
            let status = status_for(&err);
            let payload = json!({
                "request_id": request_id,
                "approved": false,
                "message": err.to_string(),
            });
            (status, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn waitlist_handler<D, L, R, N>(
    State(service): State<Arc<LeaveRequestService<D, L, R, N>>>,
    Query(query): Query<WaitlistQuery>,
) -> Response
where
    D: StaffDirectory + 'static,
    L: RequestLedger + 'static,
    R: RosterLock + 'static,
    N: Notifier + 'static,
{
    match service.waitlist(query.date, query.shift) {
        Ok(entries) => {
            let view = WaitlistView {
                date: query.date,
                shift: query.shift,
                entries,
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Slot locks wait synchronously, so the core runs off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, LeaveServiceError>
where
    F: FnOnce() -> Result<T, LeaveServiceError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(join_err) => Err(LeaveServiceError::Ledger(LedgerError::Unavailable(
            join_err.to_string(),
        ))),
    }
}

pub(crate) fn status_for(err: &LeaveServiceError) -> StatusCode {
    match err {
        LeaveServiceError::RequestNotFound(_)
        | LeaveServiceError::Scheduling(SchedulingError::StaffNotFound(_))
        | LeaveServiceError::Approval(ApprovalError::RequestNotFound(_)) => StatusCode::NOT_FOUND,
        LeaveServiceError::Scheduling(SchedulingError::Ledger(
            LedgerError::DuplicateSubmission { .. },
        ))
        | LeaveServiceError::Approval(ApprovalError::InvalidTransition { .. }) => {
            StatusCode::CONFLICT
        }
        LeaveServiceError::Scheduling(SchedulingError::Busy(_))
        | LeaveServiceError::Approval(ApprovalError::Busy(_)) => StatusCode::SERVICE_UNAVAILABLE,
        LeaveServiceError::Capacity(CapacityError::UnknownShift(_)) => StatusCode::BAD_REQUEST,
        LeaveServiceError::Scheduling(_)
        | LeaveServiceError::Approval(_)
        | LeaveServiceError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: LeaveServiceError) -> Response {
    let status = status_for(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, "leave request operation failed");
    }
    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
