use async_trait::async_trait;
use common_auth::AccountRole;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MarketStore, StoreResult, WatchQuery};
use crate::model::{
    Brand, DeleteResult, InsertResult, Order, Payment, PaymentStatus, UpdateResult, User, Watch,
    WatchStatus,
};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    brands: Vec<Brand>,
    watches: Vec<Watch>,
    orders: Vec<Order>,
    payments: Vec<Payment>,
}

/// Process-local store used for development and tests. Collections keep
/// insertion order, so "first user with this email" is well defined.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_brand(&self, brand: Brand) {
        self.inner.write().await.brands.push(brand);
    }

    pub async fn payments(&self) -> Vec<Payment> {
        self.inner.read().await.payments.clone()
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.inner.read().await.orders.clone()
    }
}

/// Expects `watches` in reverse insertion order so that the stable sort
/// breaks `posted_at` ties newest-inserted first.
fn newest_first(mut watches: Vec<Watch>, limit: Option<usize>) -> Vec<Watch> {
    watches.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
    if let Some(limit) = limit {
        watches.truncate(limit);
    }
    watches
}

#[async_trait]
impl MarketStore for InMemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<InsertResult> {
        let id = user.id;
        self.inner.write().await.users.push(user);
        Ok(InsertResult::new(id))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let guard = self.inner.read().await;
        Ok(guard.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users_by_role(&self, role: AccountRole) -> StoreResult<Vec<User>> {
        let guard = self.inner.read().await;
        Ok(guard.users.iter().filter(|u| u.role == role).cloned().collect())
    }

    async fn list_brands(&self, featured_only: bool) -> StoreResult<Vec<Brand>> {
        let guard = self.inner.read().await;
        Ok(guard
            .brands
            .iter()
            .filter(|b| !featured_only || b.featured)
            .cloned()
            .collect())
    }

    async fn insert_watch(&self, watch: Watch) -> StoreResult<InsertResult> {
        let id = watch.id;
        self.inner.write().await.watches.push(watch);
        Ok(InsertResult::new(id))
    }

    async fn find_watch(&self, id: Uuid) -> StoreResult<Option<Watch>> {
        let guard = self.inner.read().await;
        Ok(guard.watches.iter().find(|w| w.id == id).cloned())
    }

    async fn list_watches(&self, query: &WatchQuery) -> StoreResult<Vec<Watch>> {
        let guard = self.inner.read().await;
        let matched = guard
            .watches
            .iter()
            .rev()
            .filter(|w| query.matches(w))
            .cloned()
            .collect();
        Ok(newest_first(matched, query.limit))
    }

    async fn mark_watch_sold(&self, id: Uuid) -> StoreResult<UpdateResult> {
        let mut guard = self.inner.write().await;
        Ok(match guard.watches.iter_mut().find(|w| w.id == id) {
            Some(watch) if watch.status == WatchStatus::Sold => UpdateResult::new(1, 0),
            Some(watch) => {
                watch.status = WatchStatus::Sold;
                UpdateResult::new(1, 1)
            }
            None => UpdateResult::new(0, 0),
        })
    }

    async fn report_watch(&self, id: Uuid) -> StoreResult<UpdateResult> {
        let mut guard = self.inner.write().await;
        Ok(match guard.watches.iter_mut().find(|w| w.id == id) {
            Some(watch) => {
                let modified = u64::from(!watch.is_reported);
                watch.is_reported = true;
                UpdateResult::new(1, modified)
            }
            None => UpdateResult::new(0, 0),
        })
    }

    async fn advertise_watch(&self, id: Uuid, seller_email: &str) -> StoreResult<UpdateResult> {
        let mut guard = self.inner.write().await;
        Ok(
            match guard
                .watches
                .iter_mut()
                .find(|w| w.id == id && w.seller_email == seller_email)
            {
                Some(watch) => {
                    let modified = u64::from(!watch.is_advertised);
                    watch.is_advertised = true;
                    UpdateResult::new(1, modified)
                }
                None => UpdateResult::new(0, 0),
            },
        )
    }

    async fn delete_watch(&self, id: Uuid, seller_email: &str) -> StoreResult<DeleteResult> {
        let mut guard = self.inner.write().await;
        let before = guard.watches.len();
        guard
            .watches
            .retain(|w| !(w.id == id && w.seller_email == seller_email));
        Ok(DeleteResult::new((before - guard.watches.len()) as u64))
    }

    async fn insert_order(&self, order: Order) -> StoreResult<InsertResult> {
        let id = order.id;
        self.inner.write().await.orders.push(order);
        Ok(InsertResult::new(id))
    }

    async fn find_order(&self, id: Uuid, buyer_email: &str) -> StoreResult<Option<Order>> {
        let guard = self.inner.read().await;
        Ok(guard
            .orders
            .iter()
            .find(|o| o.id == id && o.buyer_email == buyer_email)
            .cloned())
    }

    async fn list_orders_by_buyer(&self, buyer_email: &str) -> StoreResult<Vec<Order>> {
        let guard = self.inner.read().await;
        Ok(guard
            .orders
            .iter()
            .filter(|o| o.buyer_email == buyer_email)
            .cloned()
            .collect())
    }

    async fn mark_order_paid(
        &self,
        id: Uuid,
        buyer_email: &str,
        transaction_id: &str,
    ) -> StoreResult<UpdateResult> {
        let mut guard = self.inner.write().await;
        Ok(
            match guard.orders.iter_mut().find(|o| {
                o.id == id
                    && o.buyer_email == buyer_email
                    && o.payment_status == PaymentStatus::Unpaid
            }) {
                Some(order) => {
                    order.payment_status = PaymentStatus::Paid;
                    order.transaction_id = Some(transaction_id.to_string());
                    UpdateResult::new(1, 1)
                }
                None => UpdateResult::new(0, 0),
            },
        )
    }

    async fn delete_unpaid_order(&self, id: Uuid, buyer_email: &str) -> StoreResult<DeleteResult> {
        let mut guard = self.inner.write().await;
        let before = guard.orders.len();
        guard.orders.retain(|o| {
            !(o.id == id
                && o.buyer_email == buyer_email
                && o.payment_status == PaymentStatus::Unpaid)
        });
        Ok(DeleteResult::new((before - guard.orders.len()) as u64))
    }

    async fn insert_payment(&self, payment: Payment) -> StoreResult<InsertResult> {
        let id = payment.id;
        self.inner.write().await.payments.push(payment);
        Ok(InsertResult::new(id))
    }
}
