use async_trait::async_trait;
use chrono::Utc;
use shared::{CreatePayment, Payment, PaymentStatus};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PaymentStore, PaymentUpdate, StoreError};

/// Payment store kept in process memory, keyed by id.
///
/// Mirrors the table's constraints: ids are assigned sequentially starting
/// at 1 and transaction ids are unique across all records.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    last_id: i32,
    payments: BTreeMap<i32, Payment>,
}

impl Inner {
    fn transaction_id_taken(&self, transaction_id: &str, except: Option<i32>) -> bool {
        self.payments
            .values()
            .any(|p| p.transaction_id == transaction_id && Some(p.id) != except)
    }

    fn matching(&self, pred: impl Fn(&Payment) -> bool) -> Vec<Payment> {
        self.payments.values().filter(|p| pred(p)).cloned().collect()
    }
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn list(&self) -> Result<Vec<Payment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.payments.values().cloned().collect())
    }

    async fn get(&self, id: i32) -> Result<Option<Payment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.payments.get(&id).cloned())
    }

    async fn create(&self, request: CreatePayment) -> Result<Payment, StoreError> {
        let mut inner = self.inner.write().await;

        let transaction_id = Uuid::new_v4().to_string();
        if inner.transaction_id_taken(&transaction_id, None) {
            return Err(StoreError::DuplicateTransactionId(transaction_id));
        }

        let id = inner.last_id.checked_add(1).ok_or(StoreError::IdsExhausted)?;
        inner.last_id = id;
        let payment = Payment {
            id,
            order_id: request.order_id,
            user_id: request.user_id,
            amount: request.amount,
            currency: request.currency,
            payment_method: request.payment_method,
            status: PaymentStatus::Pending,
            transaction_id,
            created_at: Utc::now(),
            updated_at: None,
        };
        inner.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn update(&self, id: i32, update: PaymentUpdate) -> Result<Option<Payment>, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.payments.contains_key(&id) {
            return Ok(None);
        }

        if let Some(transaction_id) = &update.transaction_id {
            if inner.transaction_id_taken(transaction_id, Some(id)) {
                return Err(StoreError::DuplicateTransactionId(transaction_id.clone()));
            }
        }

        let Some(payment) = inner.payments.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(status) = update.status {
            payment.status = status;
        }
        if let Some(transaction_id) = update.transaction_id {
            payment.transaction_id = transaction_id;
        }
        payment.updated_at = Some(Utc::now());
        Ok(Some(payment.clone()))
    }

    async fn list_by_order(&self, order_id: i32) -> Result<Vec<Payment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.matching(|p| p.order_id == order_id))
    }

    async fn list_by_user(&self, user_id: i32) -> Result<Vec<Payment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.matching(|p| p.user_id == user_id))
    }
}
