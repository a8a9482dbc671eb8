use std::sync::Arc;

use crate::checkout::CheckoutFlow;
use crate::client::ApiClient;
use crate::config::Config;
use crate::models::tokens::TokenPackage;
use crate::notify::{Notifier, TracingNotifier};
use crate::services::admin::AdminService;
use crate::services::app_data::AppDataService;
use crate::services::payment::PaymentProvider;
use crate::services::reports::ReportService;
use crate::services::session::SessionService;
use crate::token_store::TokenStore;

/// All service singletons, constructed once at application start and passed
/// down explicitly. The payment provider is injected so the embedded widget
/// can be swapped for a fake in tests.
#[derive(Clone)]
pub struct AppServices {
    pub config: Arc<Config>,
    pub tokens: Arc<TokenStore>,
    pub api: Arc<ApiClient>,
    pub notifier: Arc<dyn Notifier>,
    pub session: Arc<SessionService>,
    pub data: Arc<AppDataService>,
    pub reports: Arc<ReportService>,
    pub admin: Arc<AdminService>,
    pub payments: Arc<dyn PaymentProvider>,
}

impl AppServices {
    pub fn new(config: Config, payments: Arc<dyn PaymentProvider>) -> Self {
        Self::with_notifier(config, payments, Arc::new(TracingNotifier))
    }

    pub fn with_notifier(
        config: Config,
        payments: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let config = Arc::new(config);
        let tokens = Arc::new(TokenStore::new());
        let api = Arc::new(ApiClient::new(
            config.api_base_url.clone(),
            tokens.clone(),
            notifier.clone(),
        ));
        let session = Arc::new(SessionService::new(api.clone()));
        let data = Arc::new(AppDataService::new(api.clone()));
        let reports = Arc::new(ReportService::new(api.clone(), data.clone()));
        let admin = Arc::new(AdminService::new(api.clone()));
        AppServices {
            config,
            tokens,
            api,
            notifier,
            session,
            data,
            reports,
            admin,
            payments,
        }
    }

    /// Opens a checkout flow for one package, wired to the shared services.
    pub fn checkout(&self, package: TokenPackage) -> CheckoutFlow {
        CheckoutFlow::new(
            self.api.clone(),
            self.data.clone(),
            self.session.clone(),
            self.payments.clone(),
            self.notifier.clone(),
            self.config.razorpay_key_id.clone(),
            self.config.sales_email.clone(),
            package,
        )
    }
}
