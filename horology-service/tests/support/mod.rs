#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use common_auth::{AccountRole, JwtConfig, TokenSigner};
use horology_service::metrics::ServiceMetrics;
use horology_service::model::{
    Brand, DeleteResult, InsertResult, Order, Payment, UpdateResult, User, Watch,
};
use horology_service::payments::StubGateway;
use horology_service::store::{InMemoryStore, MarketStore, StoreError, StoreResult, WatchQuery};
use horology_service::{build_router, AppState, ServiceConfig};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "horology-integration-secret";

/// In-memory store that counts every call and can be switched into a
/// failing mode.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryStore,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl CountingStore {
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    pub fn fail_from_now(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn touch(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketStore for CountingStore {
    async fn insert_user(&self, user: User) -> StoreResult<InsertResult> {
        self.touch()?;
        self.inner.insert_user(user).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.touch()?;
        self.inner.find_user_by_email(email).await
    }

    async fn list_users_by_role(&self, role: AccountRole) -> StoreResult<Vec<User>> {
        self.touch()?;
        self.inner.list_users_by_role(role).await
    }

    async fn list_brands(&self, featured_only: bool) -> StoreResult<Vec<Brand>> {
        self.touch()?;
        self.inner.list_brands(featured_only).await
    }

    async fn insert_watch(&self, watch: Watch) -> StoreResult<InsertResult> {
        self.touch()?;
        self.inner.insert_watch(watch).await
    }

    async fn find_watch(&self, id: Uuid) -> StoreResult<Option<Watch>> {
        self.touch()?;
        self.inner.find_watch(id).await
    }

    async fn list_watches(&self, query: &WatchQuery) -> StoreResult<Vec<Watch>> {
        self.touch()?;
        self.inner.list_watches(query).await
    }

    async fn mark_watch_sold(&self, id: Uuid) -> StoreResult<UpdateResult> {
        self.touch()?;
        self.inner.mark_watch_sold(id).await
    }

    async fn report_watch(&self, id: Uuid) -> StoreResult<UpdateResult> {
        self.touch()?;
        self.inner.report_watch(id).await
    }

    async fn advertise_watch(&self, id: Uuid, seller_email: &str) -> StoreResult<UpdateResult> {
        self.touch()?;
        self.inner.advertise_watch(id, seller_email).await
    }

    async fn delete_watch(&self, id: Uuid, seller_email: &str) -> StoreResult<DeleteResult> {
        self.touch()?;
        self.inner.delete_watch(id, seller_email).await
    }

    async fn insert_order(&self, order: Order) -> StoreResult<InsertResult> {
        self.touch()?;
        self.inner.insert_order(order).await
    }

    async fn find_order(&self, id: Uuid, buyer_email: &str) -> StoreResult<Option<Order>> {
        self.touch()?;
        self.inner.find_order(id, buyer_email).await
    }

    async fn list_orders_by_buyer(&self, buyer_email: &str) -> StoreResult<Vec<Order>> {
        self.touch()?;
        self.inner.list_orders_by_buyer(buyer_email).await
    }

    async fn mark_order_paid(
        &self,
        id: Uuid,
        buyer_email: &str,
        transaction_id: &str,
    ) -> StoreResult<UpdateResult> {
        self.touch()?;
        self.inner.mark_order_paid(id, buyer_email, transaction_id).await
    }

    async fn delete_unpaid_order(&self, id: Uuid, buyer_email: &str) -> StoreResult<DeleteResult> {
        self.touch()?;
        self.inner.delete_unpaid_order(id, buyer_email).await
    }

    async fn insert_payment(&self, payment: Payment) -> StoreResult<InsertResult> {
        self.touch()?;
        self.inner.insert_payment(payment).await
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<CountingStore>,
    pub metrics: Arc<ServiceMetrics>,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        let store = Arc::new(CountingStore::default());
        let metrics = Arc::new(ServiceMetrics::new()?);
        let state = AppState::new(
            ServiceConfig::new(SECRET),
            store.clone(),
            Arc::new(StubGateway::new()),
            metrics.clone(),
        );
        Ok(Self {
            router: build_router(state),
            store,
            metrics,
        })
    }

    pub async fn seed_user(&self, email: &str, role: AccountRole, is_admin: bool) -> Result<()> {
        self.store
            .inner()
            .insert_user(User {
                id: Uuid::new_v4(),
                name: None,
                email: email.to_string(),
                role,
                is_admin,
            })
            .await?;
        Ok(())
    }

    pub async fn seed_brand(&self, name: &str, featured: bool) {
        self.store
            .inner()
            .insert_brand(Brand {
                id: Uuid::new_v4(),
                name: name.to_string(),
                image: None,
                featured,
            })
            .await;
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("router call")?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await?.to_bytes();
        Ok(TestResponse {
            status,
            headers,
            body,
        })
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.send(Method::GET, uri, token, None).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body).context("response body is not json")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn error_code(&self) -> Option<&str> {
        self.headers.get("X-Error-Code").and_then(|v| v.to_str().ok())
    }
}

pub fn token_for(email: &str) -> Result<String> {
    Ok(TokenSigner::new(JwtConfig::new(SECRET))
        .sign(email)?
        .access_token)
}
