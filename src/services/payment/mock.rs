use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use super::{PaymentError, PaymentOutcome, PaymentProvider, RazorpayOptions};
use crate::models::tokens::PaymentResult;

#[derive(Debug, Clone)]
pub enum MockBehavior {
    Succeed,
    Dismiss,
    Fail(String),
    Error(String),
}

/// Stand-in for the embedded widget: captures the options it was opened
/// with and plays back a scripted outcome.
pub struct MockPaymentProvider {
    pub behavior: Mutex<MockBehavior>,
    pub opened_with: Mutex<Vec<RazorpayOptions>>,
}

impl Default for MockPaymentProvider {
    fn default() -> Self {
        MockPaymentProvider {
            behavior: Mutex::new(MockBehavior::Succeed),
            opened_with: Mutex::new(Vec::new()),
        }
    }
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dismissing() -> Self {
        let mock = Self::default();
        *mock.behavior.lock().unwrap() = MockBehavior::Dismiss;
        mock
    }

    pub fn failing(reason: &str) -> Self {
        let mock = Self::default();
        *mock.behavior.lock().unwrap() = MockBehavior::Fail(reason.to_string());
        mock
    }

    pub fn erroring(reason: &str) -> Self {
        let mock = Self::default();
        *mock.behavior.lock().unwrap() = MockBehavior::Error(reason.to_string());
        mock
    }

    pub fn open_count(&self) -> usize {
        self.opened_with.lock().unwrap().len()
    }
}

fn make_id(prefix: &str) -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("{}_{}", prefix, ts)
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn collect_payment(
        &self,
        options: &RazorpayOptions,
    ) -> Result<PaymentOutcome, PaymentError> {
        self.opened_with.lock().unwrap().push(options.clone());

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            MockBehavior::Succeed => Ok(PaymentOutcome::Completed(PaymentResult {
                razorpay_payment_id: make_id("pay_test"),
                razorpay_order_id: options.order_id.clone(),
                razorpay_signature: make_id("sig_test"),
            })),
            MockBehavior::Dismiss => Ok(PaymentOutcome::Dismissed),
            MockBehavior::Fail(reason) => Ok(PaymentOutcome::Failed(reason)),
            MockBehavior::Error(reason) => Err(PaymentError::Widget(reason)),
        }
    }
}
