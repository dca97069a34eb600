use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment status: {0}")]
pub struct UnknownStatus(pub String);

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 5] = [
        PaymentStatus::Pending,
        PaymentStatus::Processing,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A recorded payment attempt against an order, as exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i32,
    pub order_id: i32,
    pub user_id: i32,
    pub amount: f64,
    pub currency: String,
    pub payment_method: String,
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePayment {
    pub order_id: i32,
    pub user_id: i32,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub payment_method: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Partial update of a payment. Fields left out of the request body stay
/// `Patch::Missing` and are not touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayment {
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub status: Patch<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub transaction_id: Patch<String>,
}

/// A JSON field that can be absent, explicitly `null`, or carry a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Missing,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Missing
    }
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    pub fn value(self) -> Option<T> {
        match self {
            Patch::Value(v) => Some(v),
            Patch::Missing | Patch::Null => None,
        }
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Value(value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Value(value) => serializer.serialize_some(value),
            Patch::Missing | Patch::Null => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_serializes_as_upper_case_name() {
        let value = serde_json::to_value(PaymentStatus::Refunded).unwrap();
        assert_eq!(value, json!("REFUNDED"));
        for status in PaymentStatus::ALL {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!(
            "pending".parse::<PaymentStatus>(),
            Err(UnknownStatus("pending".to_string()))
        );
        assert!(serde_json::from_value::<PaymentStatus>(json!("SETTLED")).is_err());
    }

    #[test]
    fn create_payment_defaults_currency() {
        let request: CreatePayment = serde_json::from_value(json!({
            "order_id": 1,
            "user_id": 2,
            "amount": 49.99,
            "payment_method": "credit_card"
        }))
        .unwrap();
        assert_eq!(request.currency, "USD");
    }

    #[test]
    fn create_payment_requires_payment_method() {
        let result = serde_json::from_value::<CreatePayment>(json!({
            "order_id": 1,
            "user_id": 2,
            "amount": 49.99
        }));
        assert!(result.is_err());
    }

    #[test]
    fn update_distinguishes_missing_from_null() {
        let update: UpdatePayment =
            serde_json::from_value(json!({ "transaction_id": null })).unwrap();
        assert_eq!(update.status, Patch::Missing);
        assert_eq!(update.transaction_id, Patch::Null);

        let update: UpdatePayment =
            serde_json::from_value(json!({ "status": "COMPLETED" })).unwrap();
        assert_eq!(update.status, Patch::Value(PaymentStatus::Completed));
        assert!(update.transaction_id.is_missing());
    }

    #[test]
    fn update_skips_missing_fields_when_serialized() {
        let update = UpdatePayment {
            status: PaymentStatus::Failed.into(),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "status": "FAILED" }));
    }
}
