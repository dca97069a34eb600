use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection, RunQueryDsl};
use shared::{CreatePayment, Payment};
use tracing::debug;

use super::{PaymentStore, PaymentUpdate, StoreError};
use crate::models::{NewPayment, PaymentChanges, PaymentRow};
use crate::schema::payments;

pub type DbPool = Pool<AsyncPgConnection>;

#[derive(Clone)]
pub struct PgPaymentStore {
    pool: DbPool,
}

impl PgPaymentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn into_payments(rows: Vec<PaymentRow>) -> Result<Vec<Payment>, StoreError> {
    rows.into_iter()
        .map(|row| Payment::try_from(row).map_err(StoreError::from))
        .collect()
}

fn unique_violation(err: DieselError, transaction_id: &str) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::DuplicateTransactionId(transaction_id.to_string())
        }
        other => other.into(),
    }
}

#[async_trait]
impl PaymentStore for PgPaymentStore {
    async fn list(&self) -> Result<Vec<Payment>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = payments::table
            .order(payments::id.asc())
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await?;
        into_payments(rows)
    }

    async fn get(&self, id: i32) -> Result<Option<Payment>, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = payments::table
            .find(id)
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row.map(Payment::try_from).transpose()?)
    }

    async fn create(&self, request: CreatePayment) -> Result<Payment, StoreError> {
        let new_payment = NewPayment::from(request);
        let mut conn = self.pool.get().await?;

        let row = diesel::insert_into(payments::table)
            .values(&new_payment)
            .returning(PaymentRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| unique_violation(e, &new_payment.transaction_id))?;

        debug!("Inserted payment row {}", row.id);
        Ok(Payment::try_from(row)?)
    }

    async fn update(&self, id: i32, update: PaymentUpdate) -> Result<Option<Payment>, StoreError> {
        let changes = PaymentChanges {
            status: update.status.map(|status| status.as_str().to_string()),
            transaction_id: update.transaction_id,
            updated_at: Utc::now(),
        };
        let mut conn = self.pool.get().await?;

        let row = diesel::update(payments::table.find(id))
            .set(&changes)
            .returning(PaymentRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|e| unique_violation(e, changes.transaction_id.as_deref().unwrap_or_default()))?;

        Ok(row.map(Payment::try_from).transpose()?)
    }

    async fn list_by_order(&self, order_id: i32) -> Result<Vec<Payment>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = payments::table
            .filter(payments::order_id.eq(order_id))
            .order(payments::id.asc())
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await?;
        into_payments(rows)
    }

    async fn list_by_user(&self, user_id: i32) -> Result<Vec<Payment>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = payments::table
            .filter(payments::user_id.eq(user_id))
            .order(payments::id.asc())
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await?;
        into_payments(rows)
    }
}
