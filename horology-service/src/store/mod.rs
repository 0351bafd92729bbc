//! Store port. Every handler performs one call against this trait; the
//! adapters decide how the documents are persisted.

use async_trait::async_trait;
use common_auth::AccountRole;
use common_http_errors::ApiError;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{
    Brand, DeleteResult, InsertResult, Order, Payment, UpdateResult, User, Watch, WatchStatus,
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("stored {collection} document has invalid {field} '{value}'")]
    Corrupt {
        collection: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        ApiError::upstream("store", value)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filter for watch listings. Unset fields do not constrain the query.
/// Results are ordered newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchQuery {
    pub brand: Option<String>,
    pub seller_email: Option<String>,
    pub status: Option<WatchStatus>,
    pub advertised: Option<bool>,
    pub reported: Option<bool>,
    pub limit: Option<usize>,
}

impl WatchQuery {
    pub fn available() -> Self {
        Self {
            status: Some(WatchStatus::Unsold),
            ..Self::default()
        }
    }

    pub fn matches(&self, watch: &Watch) -> bool {
        self.brand.as_deref().map_or(true, |b| watch.brand == b)
            && self
                .seller_email
                .as_deref()
                .map_or(true, |s| watch.seller_email == s)
            && self.status.map_or(true, |s| watch.status == s)
            && self.advertised.map_or(true, |a| watch.is_advertised == a)
            && self.reported.map_or(true, |r| watch.is_reported == r)
    }
}

#[async_trait]
pub trait MarketStore: Send + Sync {
    // users
    async fn insert_user(&self, user: User) -> StoreResult<InsertResult>;
    /// First user registered with `email`. Emails are not unique.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users_by_role(&self, role: AccountRole) -> StoreResult<Vec<User>>;

    // brands
    async fn list_brands(&self, featured_only: bool) -> StoreResult<Vec<Brand>>;

    // watches
    async fn insert_watch(&self, watch: Watch) -> StoreResult<InsertResult>;
    async fn find_watch(&self, id: Uuid) -> StoreResult<Option<Watch>>;
    async fn list_watches(&self, query: &WatchQuery) -> StoreResult<Vec<Watch>>;
    async fn mark_watch_sold(&self, id: Uuid) -> StoreResult<UpdateResult>;
    async fn report_watch(&self, id: Uuid) -> StoreResult<UpdateResult>;
    /// Sets `isAdvertised`; only the owning seller's listing matches.
    async fn advertise_watch(&self, id: Uuid, seller_email: &str) -> StoreResult<UpdateResult>;
    async fn delete_watch(&self, id: Uuid, seller_email: &str) -> StoreResult<DeleteResult>;

    // orders
    async fn insert_order(&self, order: Order) -> StoreResult<InsertResult>;
    async fn find_order(&self, id: Uuid, buyer_email: &str) -> StoreResult<Option<Order>>;
    async fn list_orders_by_buyer(&self, buyer_email: &str) -> StoreResult<Vec<Order>>;
    /// Conditional unpaid → paid transition. Matches nothing when the order
    /// is missing, owned by someone else, or already paid.
    async fn mark_order_paid(
        &self,
        id: Uuid,
        buyer_email: &str,
        transaction_id: &str,
    ) -> StoreResult<UpdateResult>;
    /// Deletes the buyer's order while it is still unpaid.
    async fn delete_unpaid_order(&self, id: Uuid, buyer_email: &str) -> StoreResult<DeleteResult>;

    // payments
    async fn insert_payment(&self, payment: Payment) -> StoreResult<InsertResult>;
}
