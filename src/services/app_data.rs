use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::report::Report;
use crate::models::tokens::{TokenBalance, TokenPackage};

/// Cross-page cache for token packages, the token balance and the report
/// list. Reads are served from memory; refetches are imperative and last
/// write wins.
pub struct AppDataService {
    api: Arc<ApiClient>,
    packages: RwLock<Vec<TokenPackage>>,
    balance: RwLock<Option<TokenBalance>>,
    reports: RwLock<Vec<Report>>,
}

impl AppDataService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        AppDataService {
            api,
            packages: RwLock::new(Vec::new()),
            balance: RwLock::new(None),
            reports: RwLock::new(Vec::new()),
        }
    }

    pub fn packages(&self) -> Vec<TokenPackage> {
        self.packages.read().unwrap().clone()
    }

    pub fn balance(&self) -> Option<TokenBalance> {
        *self.balance.read().unwrap()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.read().unwrap().clone()
    }

    /// Fetches the purchasable packages and appends the client-only
    /// enterprise "contact us" entry.
    pub async fn refresh_packages(&self) -> Result<Vec<TokenPackage>, ApiError> {
        let mut fetched: Vec<TokenPackage> = self.api.get_json("/tokens/packages").await?;
        fetched.push(TokenPackage::enterprise_contact());
        *self.packages.write().unwrap() = fetched.clone();
        Ok(fetched)
    }

    /// A failed balance fetch means "no balance yet" (users with no purchase
    /// history), not a hard error, so this never toasts and never fails.
    pub async fn refresh_balance(&self) -> Option<TokenBalance> {
        let balance = match self.api.get_json_quiet::<TokenBalance>("/tokens/balance").await {
            Ok(balance) => Some(balance),
            Err(err) => {
                debug!(error = %err, "balance unavailable, treating as empty");
                None
            }
        };
        *self.balance.write().unwrap() = balance;
        balance
    }

    pub fn set_reports(&self, reports: Vec<Report>) {
        *self.reports.write().unwrap() = reports;
    }

    /// Newest first, matching the dashboard ordering.
    pub fn add_report(&self, report: Report) {
        self.reports.write().unwrap().insert(0, report);
    }

    /// Replaces the entry with the same id; unknown ids are ignored.
    pub fn update_report(&self, report: Report) {
        let mut reports = self.reports.write().unwrap();
        if let Some(existing) = reports.iter_mut().find(|r| r.id == report.id) {
            *existing = report;
        }
    }
}
