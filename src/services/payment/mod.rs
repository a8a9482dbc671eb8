use async_trait::async_trait;

use crate::models::tokens::PaymentResult;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment widget error: {0}")]
    Widget(String),
}

/// Terminal states of one widget invocation. `Failed` is the widget's own
/// failure callback; `Dismissed` is the user closing it. Both leave the
/// backend untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Completed(PaymentResult),
    Dismissed,
    Failed(String),
}

/// Boundary to the embedded checkout widget. The widget itself is a black
/// box owned by the host application; implementations receive the fully
/// configured options and hand back the signed result untouched.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn collect_payment(
        &self,
        options: &RazorpayOptions,
    ) -> Result<PaymentOutcome, PaymentError>;
}

mod mock;
mod razorpay;

#[allow(unused_imports)]
pub use mock::{MockBehavior, MockPaymentProvider};
pub use razorpay::{CustomerPrefill, RazorpayOptions};
