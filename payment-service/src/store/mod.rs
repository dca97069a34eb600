mod memory;
mod postgres;

pub use memory::InMemoryPaymentStore;
pub use postgres::{DbPool, PgPaymentStore};

use async_trait::async_trait;
use diesel_async::pooled_connection::PoolError;
use shared::{CreatePayment, Payment, PaymentStatus, UnknownStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection pool error: {0}")]
    Pool(#[from] bb8::RunError<PoolError>),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("transaction_id {0} is already in use")]
    DuplicateTransactionId(String),
    #[error("payment id sequence exhausted")]
    IdsExhausted,
    #[error("stored payment is invalid: {0}")]
    InvalidRow(#[from] UnknownStatus),
}

/// Field changes for [`PaymentStore::update`]. `None` leaves the
/// stored value as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentUpdate {
    pub status: Option<PaymentStatus>,
    pub transaction_id: Option<String>,
}

/// Persistence for payment records. Absence is reported as `Ok(None)`, never
/// as an error.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Payment>, StoreError>;

    async fn get(&self, id: i32) -> Result<Option<Payment>, StoreError>;

    /// Inserts a new payment in `PENDING` state with a freshly generated
    /// transaction id.
    async fn create(&self, request: CreatePayment) -> Result<Payment, StoreError>;

    /// Applies the supplied fields and stamps `updated_at`. Returns `None`
    /// without touching anything when no payment has this id.
    async fn update(&self, id: i32, update: PaymentUpdate) -> Result<Option<Payment>, StoreError>;

    async fn list_by_order(&self, order_id: i32) -> Result<Vec<Payment>, StoreError>;

    async fn list_by_user(&self, user_id: i32) -> Result<Vec<Payment>, StoreError>;
}
