use std::sync::Arc;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::report::{GenerateReportRequest, Report};
use crate::services::app_data::AppDataService;

/// Report listing, generation and download. Fetches flow through the shared
/// cache so the dashboard sees updates without refetching.
pub struct ReportService {
    api: Arc<ApiClient>,
    data: Arc<AppDataService>,
}

impl ReportService {
    pub fn new(api: Arc<ApiClient>, data: Arc<AppDataService>) -> Self {
        ReportService { api, data }
    }

    pub async fn list(&self) -> Result<Vec<Report>, ApiError> {
        let reports: Vec<Report> = self.api.get_json("/reports").await?;
        self.data.set_reports(reports.clone());
        Ok(reports)
    }

    /// Submits an idea for generation. The new report lands at the top of
    /// the cached list; token accounting happens server-side, so the balance
    /// is refetched afterwards.
    pub async fn generate(&self, idea: &str) -> Result<Report, ApiError> {
        let request = GenerateReportRequest {
            idea: idea.to_string(),
        };
        let report: Report = self.api.post_json("/reports/generate", &request).await?;
        self.data.add_report(report.clone());
        self.data.refresh_balance().await;
        Ok(report)
    }

    pub async fn download_pdf(&self, report_id: &str) -> Result<Vec<u8>, ApiError> {
        self.api
            .get_bytes(&format!("/reports/{}/download", report_id))
            .await
    }
}
