use serde::{Deserialize, Serialize};

use crate::models::tokens::{PurchaseOrder, TokenPackage};
use crate::models::user::User;

pub const PRODUCT_NAME: &str = "ReportGen";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerPrefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

impl CustomerPrefill {
    pub fn from_user(user: &User) -> Self {
        CustomerPrefill {
            name: user.name.clone(),
            email: user.email.clone(),
            contact: user.phone.clone().unwrap_or_default(),
        }
    }
}

/// The exact configuration object the Razorpay checkout widget is opened
/// with. The order id and amount come verbatim from the backend-created
/// order; the widget enforces them, the client never recomputes money.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RazorpayOptions {
    pub key: String,
    pub amount: i64,
    pub currency: String,
    pub order_id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefill: Option<CustomerPrefill>,
}

impl RazorpayOptions {
    pub fn for_order(
        key_id: &str,
        order: &PurchaseOrder,
        package: &TokenPackage,
        user: Option<&User>,
    ) -> Self {
        RazorpayOptions {
            key: key_id.to_string(),
            amount: order.amount,
            currency: order.currency.clone(),
            order_id: order.order_id.clone(),
            name: PRODUCT_NAME.to_string(),
            description: format!("{} package - {} tokens", package.name, package.tokens),
            prefill: user.map(CustomerPrefill::from_user),
        }
    }

    /// Serialized form handed to the embedded widget by the host.
    pub fn to_widget_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
