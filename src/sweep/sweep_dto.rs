use serde::Serialize;
use utoipa::ToSchema;

use super::sweep_service::SweepReport;

#[derive(Debug, Serialize, ToSchema)]
pub struct SweepResponse {
    pub message: String,
    pub checked: usize,
    pub sent: usize,
    pub failed: usize,
}

impl From<SweepReport> for SweepResponse {
    fn from(report: SweepReport) -> Self {
        Self {
            message: format!(
                "Checked {} reminder(s), sent {} email(s)",
                report.checked, report.sent
            ),
            checked: report.checked,
            sent: report.sent,
            failed: report.failed,
        }
    }
}
