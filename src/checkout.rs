use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::tokens::{PurchaseOrder, TokenPackage};
use crate::notify::Notifier;
use crate::services::app_data::AppDataService;
use crate::services::payment::{PaymentError, PaymentOutcome, PaymentProvider, RazorpayOptions};
use crate::services::session::SessionService;

pub const GST_RATE: f64 = 0.18;

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("a purchase is already in progress")]
    AlreadyProcessing,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Review,
    Processing,
}

/// How one confirm attempt ended. Every non-`Completed` outcome leaves the
/// flow back in `Review` so the user can retry or close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Completed,
    /// The widget collected payment but the backend rejected verification.
    /// Funds may have moved on the provider side; reconciliation is the
    /// backend's job.
    VerificationFailed,
    /// The widget's own failure callback fired; the backend was never told.
    WidgetFailed(String),
    Dismissed,
    /// Enterprise is quote-only: the caller opens this mailto link and no
    /// order is ever created.
    ContactSales(String),
}

/// Derived price display for the review step. No I/O; the authoritative
/// amount still comes from the backend-created order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub gst_amount: f64,
    pub total_price: f64,
}

impl PriceBreakdown {
    pub fn for_price(base_price: f64) -> Self {
        let gst_amount = round2(base_price * GST_RATE);
        PriceBreakdown {
            base_price,
            gst_amount,
            total_price: round2(base_price + gst_amount),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn sales_mailto(sales_email: &str, package: &TokenPackage) -> String {
    let subject = format!("Enterprise enquiry - {}", package.name);
    format!(
        "mailto:{}?subject={}",
        sales_email,
        urlencoding::encode(&subject)
    )
}

/// Sequences the three-party purchase handshake: order creation against the
/// backend, payment collection through the widget, then signature
/// verification and a balance refetch.
pub struct CheckoutFlow {
    api: Arc<ApiClient>,
    data: Arc<AppDataService>,
    session: Arc<SessionService>,
    provider: Arc<dyn PaymentProvider>,
    notifier: Arc<dyn Notifier>,
    razorpay_key_id: String,
    sales_email: String,
    package: TokenPackage,
    breakdown: PriceBreakdown,
    state: CheckoutState,
}

impl CheckoutFlow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api: Arc<ApiClient>,
        data: Arc<AppDataService>,
        session: Arc<SessionService>,
        provider: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn Notifier>,
        razorpay_key_id: String,
        sales_email: String,
        package: TokenPackage,
    ) -> Self {
        let breakdown = PriceBreakdown::for_price(package.price_usd);
        CheckoutFlow {
            api,
            data,
            session,
            provider,
            notifier,
            razorpay_key_id,
            sales_email,
            package,
            breakdown,
            state: CheckoutState::Review,
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn breakdown(&self) -> PriceBreakdown {
        self.breakdown
    }

    pub fn package(&self) -> &TokenPackage {
        &self.package
    }

    /// The close button is disabled while processing so the widget cannot be
    /// orphaned mid-handshake.
    pub fn can_close(&self) -> bool {
        self.state == CheckoutState::Review
    }

    pub async fn confirm(&mut self) -> Result<CheckoutOutcome, CheckoutError> {
        if !self.package.is_purchasable() {
            return Ok(CheckoutOutcome::ContactSales(sales_mailto(
                &self.sales_email,
                &self.package,
            )));
        }
        if self.state == CheckoutState::Processing {
            return Err(CheckoutError::AlreadyProcessing);
        }

        self.state = CheckoutState::Processing;
        let result = self.run_purchase().await;
        self.state = CheckoutState::Review;
        result
    }

    async fn run_purchase(&self) -> Result<CheckoutOutcome, CheckoutError> {
        let order: PurchaseOrder = self
            .api
            .post_json(
                "/tokens/purchase/create-order",
                &json!({ "package_id": self.package.id }),
            )
            .await?;
        info!(order_id = %order.order_id, package = %self.package.id, "purchase order created");

        let user = self.session.current_user();
        let options =
            RazorpayOptions::for_order(&self.razorpay_key_id, &order, &self.package, user.as_ref());

        match self.provider.collect_payment(&options).await? {
            PaymentOutcome::Completed(result) => {
                // The three fields go to the backend verbatim; their content
                // is never inspected here.
                let verification: Result<serde_json::Value, ApiError> = self
                    .api
                    .post_json("/tokens/purchase/verify-payment", &result)
                    .await;
                match verification {
                    Ok(_) => {
                        self.data.refresh_balance().await;
                        self.notifier
                            .success("Payment successful. Tokens have been added to your account.");
                        Ok(CheckoutOutcome::Completed)
                    }
                    Err(err) => {
                        // No retry and no client-side reconciliation; the
                        // toast for the error status already fired.
                        warn!(order_id = %order.order_id, error = %err, "payment verification failed");
                        Ok(CheckoutOutcome::VerificationFailed)
                    }
                }
            }
            PaymentOutcome::Failed(reason) => {
                self.notifier.error("Payment failed. You have not been charged.");
                Ok(CheckoutOutcome::WidgetFailed(reason))
            }
            PaymentOutcome::Dismissed => Ok(CheckoutOutcome::Dismissed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::{
        sales_mailto, CheckoutFlow, CheckoutOutcome, CheckoutState, PriceBreakdown, GST_RATE,
    };
    use crate::client::ApiClient;
    use crate::models::tokens::{PackageType, TokenPackage};
    use crate::notify::MockNotifier;
    use crate::services::app_data::AppDataService;
    use crate::services::payment::{MockPaymentProvider, PaymentProvider};
    use crate::services::session::SessionService;
    use crate::token_store::TokenStore;

    fn starter_package() -> TokenPackage {
        TokenPackage {
            id: "starter".into(),
            name: "Starter".into(),
            package_type: PackageType::Starter,
            tokens: 100,
            price_usd: 30.0,
            description: "Entry tier".into(),
        }
    }

    struct Harness {
        flow: CheckoutFlow,
        provider: Arc<MockPaymentProvider>,
        notifier: Arc<MockNotifier>,
        data: Arc<AppDataService>,
    }

    fn harness(
        server: &MockServer,
        provider: MockPaymentProvider,
        package: TokenPackage,
    ) -> Harness {
        let tokens = Arc::new(TokenStore::new());
        tokens.store_session("acc", "ref");
        let notifier = Arc::new(MockNotifier::new());
        let api = Arc::new(ApiClient::new(
            server.base_url(),
            tokens,
            notifier.clone(),
        ));
        let data = Arc::new(AppDataService::new(api.clone()));
        let session = Arc::new(SessionService::new(api.clone()));
        let provider = Arc::new(provider);
        let flow = CheckoutFlow::new(
            api,
            data.clone(),
            session,
            provider.clone() as Arc<dyn PaymentProvider>,
            notifier.clone(),
            "rzp_test_key".into(),
            "sales@reportgen.io".into(),
            package,
        );
        Harness {
            flow,
            provider,
            notifier,
            data,
        }
    }

    #[test]
    fn price_breakdown_applies_18_percent_gst() {
        let breakdown = PriceBreakdown::for_price(30.0);
        assert_eq!(breakdown.gst_amount, 5.40);
        assert_eq!(breakdown.total_price, 35.40);

        let odd = PriceBreakdown::for_price(99.99);
        assert_eq!(odd.gst_amount, 18.0);
        assert_eq!(odd.total_price, 117.99);

        let zero = PriceBreakdown::for_price(0.0);
        assert_eq!(zero.gst_amount, 0.0);
        assert_eq!(zero.total_price, 0.0);

        assert!((GST_RATE - 0.18).abs() < f64::EPSILON);
    }

    #[test]
    fn new_flow_starts_in_review_and_can_close() {
        let server = MockServer::start();
        let h = harness(&server, MockPaymentProvider::new(), starter_package());
        assert_eq!(h.flow.state(), CheckoutState::Review);
        assert!(h.flow.can_close());
        assert_eq!(h.flow.breakdown().total_price, 35.40);
    }

    #[tokio::test]
    async fn close_is_unavailable_while_processing() {
        let server = MockServer::start_async().await;
        let mut h = harness(&server, MockPaymentProvider::new(), starter_package());

        h.flow.state = CheckoutState::Processing;
        assert!(!h.flow.can_close());

        let err = h.flow.confirm().await.unwrap_err();
        assert!(matches!(err, super::CheckoutError::AlreadyProcessing));
    }

    #[tokio::test]
    async fn successful_purchase_verifies_and_refreshes_balance() {
        let server = MockServer::start_async().await;
        let create_order = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/tokens/purchase/create-order")
                    .json_body(json!({ "package_id": "starter" }));
                then.status(200).json_body(json!({
                    "order_id": "order_123",
                    "amount": 3540,
                    "currency": "USD"
                }));
            })
            .await;
        let verify = server
            .mock_async(|when, then| {
                when.method(POST).path("/tokens/purchase/verify-payment");
                then.status(200).json_body(json!({ "status": "verified" }));
            })
            .await;
        let balance = server
            .mock_async(|when, then| {
                when.method(GET).path("/tokens/balance");
                then.status(200).json_body(json!({ "available_tokens": 100 }));
            })
            .await;

        let mut h = harness(&server, MockPaymentProvider::new(), starter_package());
        let outcome = h.flow.confirm().await.unwrap();

        assert_eq!(outcome, CheckoutOutcome::Completed);
        assert_eq!(h.flow.state(), CheckoutState::Review);
        assert!(h.flow.can_close());
        create_order.assert_hits_async(1).await;
        verify.assert_hits_async(1).await;
        balance.assert_hits_async(1).await;
        assert_eq!(h.data.balance().unwrap().available_tokens, 100);
        assert_eq!(h.provider.open_count(), 1);
        // widget got the backend's order, not a recomputed one
        let opened = h.provider.opened_with.lock().unwrap();
        assert_eq!(opened[0].order_id, "order_123");
        assert_eq!(opened[0].amount, 3540);
        drop(opened);
        assert!(h.notifier.last_success().unwrap().contains("Tokens"));
    }

    #[tokio::test]
    async fn verification_fields_are_forwarded_verbatim() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/tokens/purchase/create-order");
                then.status(200).json_body(json!({
                    "order_id": "order_xyz",
                    "amount": 100,
                    "currency": "USD"
                }));
            })
            .await;
        let verify = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/tokens/purchase/verify-payment")
                    .json_body_partial(r#"{ "razorpay_order_id": "order_xyz" }"#);
                then.status(200).json_body(json!({ "status": "verified" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tokens/balance");
                then.status(200).json_body(json!({ "available_tokens": 1 }));
            })
            .await;

        let mut h = harness(&server, MockPaymentProvider::new(), starter_package());
        h.flow.confirm().await.unwrap();
        verify.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn failed_verification_reverts_without_balance_refetch() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/tokens/purchase/create-order");
                then.status(200).json_body(json!({
                    "order_id": "order_123",
                    "amount": 3540,
                    "currency": "USD"
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/tokens/purchase/verify-payment");
                then.status(400)
                    .json_body(json!({ "detail": "Signature mismatch" }));
            })
            .await;
        let balance = server
            .mock_async(|when, then| {
                when.method(GET).path("/tokens/balance");
                then.status(200).json_body(json!({ "available_tokens": 100 }));
            })
            .await;

        let mut h = harness(&server, MockPaymentProvider::new(), starter_package());
        let outcome = h.flow.confirm().await.unwrap();

        assert_eq!(outcome, CheckoutOutcome::VerificationFailed);
        assert_eq!(h.flow.state(), CheckoutState::Review);
        balance.assert_hits_async(0).await;
        assert_eq!(h.notifier.last_error().as_deref(), Some("Signature mismatch"));
    }

    #[tokio::test]
    async fn widget_dismissal_reverts_without_backend_contact() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/tokens/purchase/create-order");
                then.status(200).json_body(json!({
                    "order_id": "order_123",
                    "amount": 3540,
                    "currency": "USD"
                }));
            })
            .await;
        let verify = server
            .mock_async(|when, then| {
                when.method(POST).path("/tokens/purchase/verify-payment");
                then.status(200).json_body(json!({ "status": "verified" }));
            })
            .await;

        let mut h = harness(&server, MockPaymentProvider::dismissing(), starter_package());
        let outcome = h.flow.confirm().await.unwrap();

        assert_eq!(outcome, CheckoutOutcome::Dismissed);
        assert_eq!(h.flow.state(), CheckoutState::Review);
        verify.assert_hits_async(0).await;
        // dismissal is silent; abandoned order expiry is the backend's concern
        assert_eq!(h.notifier.error_count(), 0);
    }

    #[tokio::test]
    async fn widget_failure_toasts_and_reverts() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/tokens/purchase/create-order");
                then.status(200).json_body(json!({
                    "order_id": "order_123",
                    "amount": 3540,
                    "currency": "USD"
                }));
            })
            .await;

        let mut h = harness(
            &server,
            MockPaymentProvider::failing("card declined"),
            starter_package(),
        );
        let outcome = h.flow.confirm().await.unwrap();

        assert_eq!(outcome, CheckoutOutcome::WidgetFailed("card declined".into()));
        assert_eq!(h.flow.state(), CheckoutState::Review);
        assert_eq!(h.notifier.error_count(), 1);
    }

    #[tokio::test]
    async fn order_creation_failure_returns_to_review() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/tokens/purchase/create-order");
                then.status(503).json_body(json!({ "detail": "Try again later" }));
            })
            .await;

        let mut h = harness(&server, MockPaymentProvider::new(), starter_package());
        let err = h.flow.confirm().await.unwrap_err();

        assert!(matches!(err, super::CheckoutError::Api(_)));
        assert_eq!(h.flow.state(), CheckoutState::Review);
        assert_eq!(h.provider.open_count(), 0);
    }

    #[tokio::test]
    async fn enterprise_selection_never_creates_an_order() {
        let server = MockServer::start_async().await;
        let create_order = server
            .mock_async(|when, then| {
                when.method(POST).path("/tokens/purchase/create-order");
                then.status(200).json_body(json!({
                    "order_id": "order_123",
                    "amount": 0,
                    "currency": "USD"
                }));
            })
            .await;

        let enterprise = TokenPackage::enterprise_contact();
        let mut h = harness(&server, MockPaymentProvider::new(), enterprise.clone());
        let outcome = h.flow.confirm().await.unwrap();

        match outcome {
            CheckoutOutcome::ContactSales(link) => {
                assert!(link.starts_with("mailto:sales@reportgen.io?subject="));
                assert!(link.contains("Enterprise%20enquiry"));
            }
            other => panic!("expected contact-sales outcome, got {:?}", other),
        }
        assert_eq!(h.flow.state(), CheckoutState::Review);
        create_order.assert_hits_async(0).await;
        assert_eq!(h.provider.open_count(), 0);

        let link = sales_mailto("sales@reportgen.io", &enterprise);
        assert_eq!(link, "mailto:sales@reportgen.io?subject=Enterprise%20enquiry%20-%20Enterprise");
    }
}
