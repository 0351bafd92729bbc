use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use common_auth::AccountRole;
use common_money::NormalizedMoney;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{MarketStore, StoreError, StoreResult, WatchQuery};
use crate::model::{
    Brand, DeleteResult, InsertResult, Order, Payment, PaymentStatus, UpdateResult, User, Watch,
    WatchStatus,
};

const WATCH_COLUMNS: &str = "id, name, brand, seller_email, seller_name, price, image, description, location, status, is_advertised, is_reported, posted_at";
const ORDER_COLUMNS: &str = "id, watch_id, watch_name, price, buyer_email, buyer_name, phone, meeting_location, payment_status, transaction_id, ordered_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: Option<String>,
    email: String,
    role: String,
    is_admin: bool,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<AccountRole>().map_err(|_| StoreError::Corrupt {
            collection: "users",
            field: "role",
            value: row.role.clone(),
        })?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            is_admin: row.is_admin,
        })
    }
}

#[derive(FromRow)]
struct BrandRow {
    id: Uuid,
    name: String,
    image: Option<String>,
    featured: bool,
}

impl From<BrandRow> for Brand {
    fn from(row: BrandRow) -> Self {
        Brand {
            id: row.id,
            name: row.name,
            image: row.image,
            featured: row.featured,
        }
    }
}

#[derive(FromRow)]
struct WatchRow {
    id: Uuid,
    name: Option<String>,
    brand: String,
    seller_email: String,
    seller_name: Option<String>,
    price: Option<BigDecimal>,
    image: Option<String>,
    description: Option<String>,
    location: Option<String>,
    status: String,
    is_advertised: bool,
    is_reported: bool,
    posted_at: DateTime<Utc>,
}

impl TryFrom<WatchRow> for Watch {
    type Error = StoreError;

    fn try_from(row: WatchRow) -> Result<Self, Self::Error> {
        let status = WatchStatus::parse(&row.status).ok_or_else(|| StoreError::Corrupt {
            collection: "watches",
            field: "status",
            value: row.status.clone(),
        })?;
        Ok(Watch {
            id: row.id,
            name: row.name,
            brand: row.brand,
            seller_email: row.seller_email,
            seller_name: row.seller_name,
            price: row.price.map(NormalizedMoney::new),
            image: row.image,
            description: row.description,
            location: row.location,
            status,
            is_advertised: row.is_advertised,
            is_reported: row.is_reported,
            posted_at: row.posted_at,
        })
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: Uuid,
    watch_id: Uuid,
    watch_name: Option<String>,
    price: Option<BigDecimal>,
    buyer_email: String,
    buyer_name: Option<String>,
    phone: Option<String>,
    meeting_location: Option<String>,
    payment_status: String,
    transaction_id: Option<String>,
    ordered_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment_status =
            PaymentStatus::parse(&row.payment_status).ok_or_else(|| StoreError::Corrupt {
                collection: "orders",
                field: "payment_status",
                value: row.payment_status.clone(),
            })?;
        Ok(Order {
            id: row.id,
            watch_id: row.watch_id,
            watch_name: row.watch_name,
            price: row.price.map(NormalizedMoney::new),
            buyer_email: row.buyer_email,
            buyer_name: row.buyer_name,
            phone: row.phone,
            meeting_location: row.meeting_location,
            payment_status,
            transaction_id: row.transaction_id,
            ordered_at: row.ordered_at,
        })
    }
}

#[derive(FromRow)]
struct Counts {
    matched: i64,
    modified: i64,
}

impl From<Counts> for UpdateResult {
    fn from(c: Counts) -> Self {
        UpdateResult::new(c.matched.max(0) as u64, c.modified.max(0) as u64)
    }
}

fn price_of(price: &Option<NormalizedMoney>) -> Option<BigDecimal> {
    price.as_ref().map(|p| p.inner().clone())
}

fn watch_filter(query: &WatchQuery) -> QueryBuilder<'_, Postgres> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {WATCH_COLUMNS} FROM watches WHERE TRUE"));
    if let Some(brand) = &query.brand {
        builder.push(" AND brand = ");
        builder.push_bind(brand);
    }
    if let Some(seller) = &query.seller_email {
        builder.push(" AND seller_email = ");
        builder.push_bind(seller);
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ");
        builder.push_bind(status.as_str());
    }
    if let Some(advertised) = query.advertised {
        builder.push(" AND is_advertised = ");
        builder.push_bind(advertised);
    }
    if let Some(reported) = query.reported {
        builder.push(" AND is_reported = ");
        builder.push_bind(reported);
    }
    builder.push(" ORDER BY posted_at DESC, seq DESC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit as i64);
    }
    builder
}

#[async_trait]
impl MarketStore for PgStore {
    async fn insert_user(&self, user: User) -> StoreResult<InsertResult> {
        sqlx::query(
            r#"INSERT INTO users (id, name, email, role, is_admin)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.is_admin)
        .execute(&self.pool)
        .await?;
        Ok(InsertResult::new(user.id))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT id, name, email, role, is_admin FROM users
               WHERE email = $1 ORDER BY seq LIMIT 1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn list_users_by_role(&self, role: AccountRole) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"SELECT id, name, email, role, is_admin FROM users
               WHERE role = $1 ORDER BY seq"#,
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn list_brands(&self, featured_only: bool) -> StoreResult<Vec<Brand>> {
        let rows = sqlx::query_as::<_, BrandRow>(
            r#"SELECT id, name, image, featured FROM brands
               WHERE featured OR NOT $1 ORDER BY seq"#,
        )
        .bind(featured_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Brand::from).collect())
    }

    async fn insert_watch(&self, watch: Watch) -> StoreResult<InsertResult> {
        sqlx::query(
            r#"INSERT INTO watches (id, name, brand, seller_email, seller_name, price, image, description, location, status, is_advertised, is_reported, posted_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(watch.id)
        .bind(&watch.name)
        .bind(&watch.brand)
        .bind(&watch.seller_email)
        .bind(&watch.seller_name)
        .bind(price_of(&watch.price))
        .bind(&watch.image)
        .bind(&watch.description)
        .bind(&watch.location)
        .bind(watch.status.as_str())
        .bind(watch.is_advertised)
        .bind(watch.is_reported)
        .bind(watch.posted_at)
        .execute(&self.pool)
        .await?;
        Ok(InsertResult::new(watch.id))
    }

    async fn find_watch(&self, id: Uuid) -> StoreResult<Option<Watch>> {
        let row = sqlx::query_as::<_, WatchRow>(&format!(
            "SELECT {WATCH_COLUMNS} FROM watches WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Watch::try_from).transpose()
    }

    async fn list_watches(&self, query: &WatchQuery) -> StoreResult<Vec<Watch>> {
        let mut builder = watch_filter(query);
        let rows = builder
            .build_query_as::<WatchRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Watch::try_from).collect()
    }

    async fn mark_watch_sold(&self, id: Uuid) -> StoreResult<UpdateResult> {
        let counts = sqlx::query_as::<_, Counts>(
            r#"WITH target AS (SELECT id FROM watches WHERE id = $1),
                    changed AS (
                        UPDATE watches SET status = 'sold'
                        WHERE id IN (SELECT id FROM target) AND status <> 'sold'
                        RETURNING id)
               SELECT (SELECT COUNT(*) FROM target) AS matched,
                      (SELECT COUNT(*) FROM changed) AS modified"#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts.into())
    }

    async fn report_watch(&self, id: Uuid) -> StoreResult<UpdateResult> {
        let counts = sqlx::query_as::<_, Counts>(
            r#"WITH target AS (SELECT id FROM watches WHERE id = $1),
                    changed AS (
                        UPDATE watches SET is_reported = TRUE
                        WHERE id IN (SELECT id FROM target) AND NOT is_reported
                        RETURNING id)
               SELECT (SELECT COUNT(*) FROM target) AS matched,
                      (SELECT COUNT(*) FROM changed) AS modified"#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts.into())
    }

    async fn advertise_watch(&self, id: Uuid, seller_email: &str) -> StoreResult<UpdateResult> {
        let counts = sqlx::query_as::<_, Counts>(
            r#"WITH target AS (SELECT id FROM watches WHERE id = $1 AND seller_email = $2),
                    changed AS (
                        UPDATE watches SET is_advertised = TRUE
                        WHERE id IN (SELECT id FROM target) AND NOT is_advertised
                        RETURNING id)
               SELECT (SELECT COUNT(*) FROM target) AS matched,
                      (SELECT COUNT(*) FROM changed) AS modified"#,
        )
        .bind(id)
        .bind(seller_email)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts.into())
    }

    async fn delete_watch(&self, id: Uuid, seller_email: &str) -> StoreResult<DeleteResult> {
        let done = sqlx::query("DELETE FROM watches WHERE id = $1 AND seller_email = $2")
            .bind(id)
            .bind(seller_email)
            .execute(&self.pool)
            .await?;
        Ok(DeleteResult::new(done.rows_affected()))
    }

    async fn insert_order(&self, order: Order) -> StoreResult<InsertResult> {
        sqlx::query(
            r#"INSERT INTO orders (id, watch_id, watch_name, price, buyer_email, buyer_name, phone, meeting_location, payment_status, transaction_id, ordered_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
        )
        .bind(order.id)
        .bind(order.watch_id)
        .bind(&order.watch_name)
        .bind(price_of(&order.price))
        .bind(&order.buyer_email)
        .bind(&order.buyer_name)
        .bind(&order.phone)
        .bind(&order.meeting_location)
        .bind(order.payment_status.as_str())
        .bind(&order.transaction_id)
        .bind(order.ordered_at)
        .execute(&self.pool)
        .await?;
        Ok(InsertResult::new(order.id))
    }

    async fn find_order(&self, id: Uuid, buyer_email: &str) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND buyer_email = $2"
        ))
        .bind(id)
        .bind(buyer_email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn list_orders_by_buyer(&self, buyer_email: &str) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE buyer_email = $1 ORDER BY seq"
        ))
        .bind(buyer_email)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn mark_order_paid(
        &self,
        id: Uuid,
        buyer_email: &str,
        transaction_id: &str,
    ) -> StoreResult<UpdateResult> {
        let done = sqlx::query(
            r#"UPDATE orders SET payment_status = 'paid', transaction_id = $3
               WHERE id = $1 AND buyer_email = $2 AND payment_status = 'unpaid'"#,
        )
        .bind(id)
        .bind(buyer_email)
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;
        let n = done.rows_affected();
        Ok(UpdateResult::new(n, n))
    }

    async fn delete_unpaid_order(&self, id: Uuid, buyer_email: &str) -> StoreResult<DeleteResult> {
        let done = sqlx::query(
            r#"DELETE FROM orders
               WHERE id = $1 AND buyer_email = $2 AND payment_status = 'unpaid'"#,
        )
        .bind(id)
        .bind(buyer_email)
        .execute(&self.pool)
        .await?;
        Ok(DeleteResult::new(done.rows_affected()))
    }

    async fn insert_payment(&self, payment: Payment) -> StoreResult<InsertResult> {
        sqlx::query(
            r#"INSERT INTO payments (id, order_id, transaction_id, price, email, paid_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(payment.id)
        .bind(payment.order_id)
        .bind(&payment.transaction_id)
        .bind(price_of(&payment.price))
        .bind(&payment.email)
        .bind(payment.paid_at)
        .execute(&self.pool)
        .await?;
        Ok(InsertResult::new(payment.id))
    }
}
