use chrono::{DateTime, Utc};
use diesel::prelude::*;
use shared::{CreatePayment, Payment, PaymentStatus, UnknownStatus};
use uuid::Uuid;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentRow {
    pub id: i32,
    pub order_id: i32,
    pub user_id: i32,
    pub amount: f64,
    pub currency: String,
    pub payment_method: String,
    pub status: String,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::payments)]
pub struct NewPayment {
    pub order_id: i32,
    pub user_id: i32,
    pub amount: f64,
    pub currency: String,
    pub payment_method: String,
    pub status: String,
    pub transaction_id: String,
}

/// Column updates for a partial payment update. `None` fields are left out
/// of the generated `SET` clause.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::payments)]
pub struct PaymentChanges {
    pub status: Option<String>,
    pub transaction_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<CreatePayment> for NewPayment {
    fn from(request: CreatePayment) -> Self {
        Self {
            order_id: request.order_id,
            user_id: request.user_id,
            amount: request.amount,
            currency: request.currency,
            payment_method: request.payment_method,
            status: PaymentStatus::Pending.as_str().to_string(),
            transaction_id: Uuid::new_v4().to_string(),
        }
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = UnknownStatus;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            user_id: row.user_id,
            amount: row.amount,
            currency: row.currency,
            payment_method: row.payment_method,
            status: row.status.parse()?,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
