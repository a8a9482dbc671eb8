use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiError;

/// The admin surface sits behind HTTP Basic auth, separate from the bearer
/// session; credentials are supplied per call and never stored.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminUserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
    pub reports_generated: i64,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminTransaction {
    pub id: String,
    pub user_id: i64,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_reports: i64,
    pub total_transactions: i64,
    pub tokens_sold: i64,
}

pub struct AdminService {
    api: Arc<ApiClient>,
}

impl AdminService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        AdminService { api }
    }

    pub async fn users(&self, creds: &BasicCredentials) -> Result<Vec<AdminUserRow>, ApiError> {
        self.api
            .get_json_basic("/admin/users", &creds.username, &creds.password)
            .await
    }

    pub async fn transactions(
        &self,
        creds: &BasicCredentials,
    ) -> Result<Vec<AdminTransaction>, ApiError> {
        self.api
            .get_json_basic("/admin/transactions", &creds.username, &creds.password)
            .await
    }

    pub async fn stats(&self, creds: &BasicCredentials) -> Result<AdminStats, ApiError> {
        self.api
            .get_json_basic("/admin/stats", &creds.username, &creds.password)
            .await
    }
}
