use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use pto_scheduler::error::AppError;
use pto_scheduler::workflows::leave::{
    InMemoryRequestLedger, InMemoryRosterLock, InMemoryStaffDirectory, LeaveRequestService,
    Notification, Notifier, NotifyError, StaffMember,
};
use pto_scheduler::workflows::roster::StaffRosterImporter;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type LeaveService = LeaveRequestService<
    InMemoryStaffDirectory,
    InMemoryRequestLedger,
    InMemoryRosterLock,
    LogNotifier,
>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Writes approval notices to the log; deployments without a mail relay read them there.
#[derive(Debug, Clone)]
pub(crate) struct LogNotifier {
    from: String,
}

impl LogNotifier {
    pub(crate) fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

impl Notifier for LogNotifier {
    fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        if notification.to.trim().is_empty() {
            return Err(NotifyError::Transport("recipient address is empty".to_string()));
        }
        info!(
            from = %self.from,
            to = %notification.to,
            subject = %notification.subject,
            body = %notification.body,
            "approval notice"
        );
        Ok(())
    }
}

pub(crate) fn load_staff(path: Option<&Path>) -> Result<Vec<StaffMember>, AppError> {
    match path {
        Some(path) => {
            let members = StaffRosterImporter::from_path(path)?;
            info!(path = %path.display(), staff = members.len(), "staff roster loaded");
            Ok(members)
        }
        None => Ok(Vec::new()),
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_notifier_rejects_blank_recipients() {
        let notifier = LogNotifier::new("admin@nj.doc.gov");
        let notice = |to: &str| Notification {
            to: to.to_string(),
            subject: "PTO Approved".to_string(),
            body: "Hello".to_string(),
        };

        assert!(notifier.send(notice("dana@example.org")).is_ok());
        assert!(matches!(
            notifier.send(notice("  ")),
            Err(NotifyError::Transport(_))
        ));
    }

    #[test]
    fn parse_date_reports_bad_input() {
        assert_eq!(
            parse_date(" 2025-12-24 ").expect("valid date"),
            NaiveDate::from_ymd_opt(2025, 12, 24).expect("valid date")
        );
        assert!(parse_date("12/24/2025").is_err());
    }
}
