use core::fmt;

use serde::{Deserialize, Serialize};

pub const ENTERPRISE_PACKAGE_ID: &str = "enterprise";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Starter,
    Pro,
    Max,
    Enterprise,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Starter => "starter",
            PackageType::Pro => "pro",
            PackageType::Max => "max",
            PackageType::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TokenPackage {
    pub id: String,
    pub name: String,
    pub package_type: PackageType,
    pub tokens: i64,
    pub price_usd: f64,
    pub description: String,
}

impl TokenPackage {
    /// The enterprise tier exists only on the client: it is appended to the
    /// fetched package list as a "contact us" entry and never goes through
    /// the payment flow.
    pub fn enterprise_contact() -> Self {
        TokenPackage {
            id: ENTERPRISE_PACKAGE_ID.to_string(),
            name: "Enterprise".to_string(),
            package_type: PackageType::Enterprise,
            tokens: 0,
            price_usd: 0.0,
            description: "Custom volume and invoicing. Contact sales.".to_string(),
        }
    }

    pub fn is_purchasable(&self) -> bool {
        self.package_type != PackageType::Enterprise
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalance {
    pub available_tokens: i64,
}

/// Ephemeral order handle produced by the backend and consumed immediately
/// by the payment widget. `amount` is in minor currency units.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
}

/// Opaque fields from the widget's success callback, forwarded verbatim to
/// the verification endpoint. The client never inspects them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PaymentResult {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
}

#[cfg(test)]
mod tests {
    use super::{PackageType, TokenPackage};

    #[test]
    fn enterprise_entry_is_not_purchasable() {
        let enterprise = TokenPackage::enterprise_contact();
        assert_eq!(enterprise.package_type, PackageType::Enterprise);
        assert!(!enterprise.is_purchasable());
    }

    #[test]
    fn package_type_serializes_lowercase() {
        let json = serde_json::to_string(&PackageType::Starter).unwrap();
        assert_eq!(json, "\"starter\"");
        let back: PackageType = serde_json::from_str("\"max\"").unwrap();
        assert_eq!(back, PackageType::Max);
    }
}
