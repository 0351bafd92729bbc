mod support;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use common_auth::AccountRole;
use serde_json::{json, Value};
use support::{token_for, TestApp};
use uuid::Uuid;

struct Buyer {
    app: TestApp,
    token: String,
}

async fn buyer(email: &str) -> Result<Buyer> {
    let app = TestApp::new()?;
    app.seed_user(email, AccountRole::Buyer, false).await?;
    let token = token_for(email)?;
    Ok(Buyer { app, token })
}

async fn place_order(b: &Buyer, body: Value) -> Result<String> {
    let resp = b
        .app
        .send(Method::POST, "/watch/buy", Some(&b.token), Some(body))
        .await?;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text());
    Ok(resp.json()?["insertedId"]
        .as_str()
        .unwrap_or_default()
        .to_string())
}

#[tokio::test]
async fn buyer_places_and_lists_own_orders() -> Result<()> {
    let b = buyer("b@x.com").await?;
    let watch_id = Uuid::new_v4();
    let order_id = place_order(
        &b,
        json!({ "watchId": watch_id, "watchName": "Nautilus", "price": "120000.50", "phone": "555" }),
    )
    .await?;

    let orders = b
        .app
        .get("/my-orders?email=b@x.com", Some(&b.token))
        .await?
        .json()?;
    assert_eq!(orders.as_array().map(Vec::len), Some(1));
    assert_eq!(orders[0]["_id"], order_id.as_str());
    assert_eq!(orders[0]["buyerEmail"], "b@x.com");
    assert_eq!(orders[0]["paymentStatus"], "unpaid");

    let resp = b
        .app
        .get("/my-orders?email=someone@x.com", Some(&b.token))
        .await?;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.error_code(), Some("forbidden_owner"));
    Ok(())
}

#[tokio::test]
async fn my_orders_without_email_is_forbidden() -> Result<()> {
    let b = buyer("b@x.com").await?;
    place_order(&b, json!({ "watchId": Uuid::new_v4() })).await?;

    for uri in ["/my-orders", "/my-orders?email="] {
        let resp = b.app.get(uri, Some(&b.token)).await?;
        assert_eq!(resp.status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(resp.error_code(), Some("forbidden_owner"));
        assert_eq!(resp.json()?, json!({ "message": "forbidden access" }));
    }
    Ok(())
}

#[tokio::test]
async fn orders_are_invisible_to_other_buyers() -> Result<()> {
    let b = buyer("b@x.com").await?;
    let order_id = place_order(&b, json!({ "watchId": Uuid::new_v4() })).await?;
    let intruder = token_for("c@x.com")?;

    let own = b
        .app
        .get(&format!("/orders/{order_id}"), Some(&b.token))
        .await?
        .json()?;
    assert_eq!(own["_id"], order_id.as_str());

    let other = b
        .app
        .get(&format!("/orders/{order_id}"), Some(&intruder))
        .await?
        .json()?;
    assert_eq!(other, Value::Null);

    let deleted = b
        .app
        .send(Method::DELETE, &format!("/my-orders/{order_id}"), Some(&intruder), None)
        .await?
        .json()?;
    assert_eq!(deleted["deletedCount"], 0);
    Ok(())
}

#[tokio::test]
async fn buying_on_behalf_of_someone_else_is_forbidden() -> Result<()> {
    let b = buyer("b@x.com").await?;
    let resp = b
        .app
        .send(
            Method::POST,
            "/watch/buy",
            Some(&b.token),
            Some(json!({ "watchId": Uuid::new_v4(), "buyerEmail": "victim@x.com" })),
        )
        .await?;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert!(b.app.store.inner().orders().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn payment_intent_returns_client_secret() -> Result<()> {
    let b = buyer("b@x.com").await?;
    let resp = b
        .app
        .send(
            Method::POST,
            "/create-payment-intent",
            Some(&b.token),
            Some(json!({ "price": 149.99 })),
        )
        .await?;
    assert_eq!(resp.status, StatusCode::OK);
    let secret = resp.json()?["clientSecret"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    assert!(secret.starts_with("pi_stub_"));

    for bad in [json!({ "price": 0 }), json!({ "price": -5 })] {
        let resp = b
            .app
            .send(Method::POST, "/create-payment-intent", Some(&b.token), Some(bad))
            .await?;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.error_code(), Some("invalid_price"));
    }
    Ok(())
}

#[tokio::test]
async fn payment_marks_order_paid_exactly_once() -> Result<()> {
    let b = buyer("b@x.com").await?;
    let order_id = place_order(&b, json!({ "watchId": Uuid::new_v4(), "price": 500 })).await?;
    let body = json!({ "orderId": order_id, "transactionId": "pi_123", "price": 500, "email": "b@x.com" });

    let first = b
        .app
        .send(Method::POST, "/payments", Some(&b.token), Some(body.clone()))
        .await?;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.json()?["acknowledged"], true);

    let second = b
        .app
        .send(Method::POST, "/payments", Some(&b.token), Some(body))
        .await?;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.error_code(), Some("order_not_payable"));

    let payments = b.app.store.inner().payments().await;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].transaction_id, "pi_123");

    let order = b
        .app
        .get(&format!("/orders/{order_id}"), Some(&b.token))
        .await?
        .json()?;
    assert_eq!(order["paymentStatus"], "paid");
    assert_eq!(order["transactionId"], "pi_123");

    let delete = b
        .app
        .send(Method::DELETE, &format!("/my-orders/{order_id}"), Some(&b.token), None)
        .await?
        .json()?;
    assert_eq!(delete["deletedCount"], 0);
    Ok(())
}

#[tokio::test]
async fn payment_for_someone_elses_order_records_nothing() -> Result<()> {
    let b = buyer("b@x.com").await?;
    let order_id = place_order(&b, json!({ "watchId": Uuid::new_v4() })).await?;
    let intruder = token_for("c@x.com")?;

    let resp = b
        .app
        .send(
            Method::POST,
            "/payments",
            Some(&intruder),
            Some(json!({ "orderId": order_id, "transactionId": "pi_x" })),
        )
        .await?;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = b
        .app
        .send(
            Method::POST,
            "/payments",
            Some(&intruder),
            Some(json!({ "orderId": order_id, "transactionId": "pi_x", "email": "b@x.com" })),
        )
        .await?;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert!(b.app.store.inner().payments().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn order_can_be_paid_through_my_orders() -> Result<()> {
    let b = buyer("b@x.com").await?;
    let order_id = place_order(&b, json!({ "watchId": Uuid::new_v4() })).await?;
    let uri = format!("/my-orders/{order_id}");

    let resp = b
        .app
        .send(Method::PUT, &uri, Some(&b.token), Some(json!({ "transactionId": "" })))
        .await?;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let paid = b
        .app
        .send(Method::PUT, &uri, Some(&b.token), Some(json!({ "transactionId": "pi_9" })))
        .await?
        .json()?;
    assert_eq!(paid, json!({ "acknowledged": true, "matchedCount": 1, "modifiedCount": 1 }));

    let again = b
        .app
        .send(Method::PUT, &uri, Some(&b.token), Some(json!({ "transactionId": "pi_10" })))
        .await?
        .json()?;
    assert_eq!(again["matchedCount"], 0);
    Ok(())
}

#[tokio::test]
async fn unpaid_order_can_be_cancelled() -> Result<()> {
    let b = buyer("b@x.com").await?;
    let order_id = place_order(&b, json!({ "watchId": Uuid::new_v4() })).await?;
    let resp = b
        .app
        .send(Method::DELETE, &format!("/my-orders/{order_id}"), Some(&b.token), None)
        .await?
        .json()?;
    assert_eq!(resp, json!({ "acknowledged": true, "deletedCount": 1 }));
    assert!(b.app.store.inner().orders().await.is_empty());
    Ok(())
}
