use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use common_auth::{require_identity, JwtVerifier, TokenSigner};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::catalog_handlers::{advertised_all, advertised_top, featured_brands, list_brands, root};
use crate::config::ServiceConfig;
use crate::guards::{require_admin, require_seller};
use crate::metrics::{http_error_metrics, metrics_endpoint, ServiceMetrics};
use crate::order_handlers::{buy_watch, delete_my_order, get_order, list_my_orders, pay_my_order};
use crate::payment_handlers::{create_payment_intent, record_payment};
use crate::payments::PaymentGateway;
use crate::store::MarketStore;
use crate::tokens::TokenIssuer;
use crate::user_handlers::{
    is_admin, is_buyer, is_seller, issue_jwt, list_buyers, list_sellers, register_user,
};
use crate::watch_handlers::{
    advertise_watch, create_watch, delete_watch, list_available, list_by_brand, list_reported,
    list_seller_watches, mark_sold, report_watch, single_watch,
};

/// Application context built once in `main` and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketStore>,
    pub jwt_verifier: Arc<JwtVerifier>,
    pub token_issuer: Arc<TokenIssuer>,
    pub payments: Arc<dyn PaymentGateway>,
    pub metrics: Arc<ServiceMetrics>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn MarketStore>,
        payments: Arc<dyn PaymentGateway>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        let jwt_verifier = Arc::new(JwtVerifier::new(config.jwt.clone()));
        let token_issuer = Arc::new(TokenIssuer::new(TokenSigner::new(config.jwt.clone())));
        Self {
            store,
            jwt_verifier,
            token_issuer,
            payments,
            metrics,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for Arc<JwtVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_verifier.clone()
    }
}

impl FromRef<AppState> for Arc<ServiceMetrics> {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

fn cors_layer(config: &ServiceConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            config
                .cors_allowed_origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION])
}

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(root))
        .route("/healthz", get(|| async { "ok" }))
        .route("/metrics", get(metrics_endpoint))
        .route("/brands", get(list_brands))
        .route("/featured-brand", get(featured_brands))
        .route("/advertised-items-3", get(advertised_top))
        .route("/advertise-all", get(advertised_all))
        .route("/jwt", get(issue_jwt))
        .route("/users", post(register_user))
        .route("/users/admin/:email", get(is_admin))
        .route("/users/seller/:email", get(is_seller))
        .route("/users/buyer/:email", get(is_buyer));

    let identity = Router::new()
        .route("/watches/brand/:brand", get(list_by_brand))
        .route(
            "/watches/single-brand/:id",
            get(single_watch).put(report_watch),
        )
        .route("/watches/all", get(list_available))
        .route("/my-orders", get(list_my_orders))
        .route("/my-orders/:id", put(pay_my_order).delete(delete_my_order))
        .route("/orders/:id", get(get_order))
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/payments", post(record_payment))
        .route("/watch/buy", post(buy_watch))
        .route("/watch/:id", put(mark_sold));

    let seller = Router::new()
        .route("/watches", get(list_seller_watches).post(create_watch))
        .route("/watches/:id", put(advertise_watch).delete(delete_watch))
        .route_layer(from_fn_with_state(state.clone(), require_seller));

    let admin = Router::new()
        .route("/sellers-all", get(list_sellers))
        .route("/buyers-all", get(list_buyers))
        .route("/reported-items", get(list_reported))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    // Layers added later run first, so the identity gate wraps the role gates.
    let gated = identity
        .merge(seller)
        .merge(admin)
        .route_layer(from_fn_with_state(
            state.jwt_verifier.clone(),
            require_identity,
        ));

    public
        .merge(gated)
        .layer(from_fn_with_state(state.metrics.clone(), http_error_metrics))
        .layer(cors_layer(&state.config))
        .with_state(state)
}
