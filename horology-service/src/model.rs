//! Marketplace documents. Field names follow the JSON the web client sends
//! and reads (camelCase, `_id`).

use chrono::{DateTime, Utc};
use common_auth::{AccountRole, Grants};
use common_money::NormalizedMoney;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub role: AccountRole,
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    pub fn grants(&self) -> Grants {
        Grants {
            role: self.role,
            is_admin: self.is_admin,
        }
    }
}

/// Registration payload. `isAdmin` is deliberately absent: the admin flag is
/// never self-assigned.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchStatus {
    #[default]
    Unsold,
    Sold,
}

impl WatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::Unsold => "unsold",
            WatchStatus::Sold => "sold",
        }
    }

    pub fn parse(s: &str) -> Option<WatchStatus> {
        match s {
            "unsold" => Some(WatchStatus::Unsold),
            "sold" => Some(WatchStatus::Sold),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watch {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub brand: String,
    pub seller_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<NormalizedMoney>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: WatchStatus,
    pub is_advertised: bool,
    pub is_reported: bool,
    pub posted_at: DateTime<Utc>,
}

/// Listing payload from a seller. Status and flags are not accepted: a new
/// listing is always unsold, unadvertised and unreported.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWatch {
    #[serde(default)]
    pub name: Option<String>,
    pub brand: String,
    #[serde(default)]
    pub seller_email: Option<String>,
    #[serde(default)]
    pub seller_name: Option<String>,
    #[serde(default)]
    pub price: Option<NormalizedMoney>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl NewWatch {
    pub fn into_watch(self, seller_email: String, now: DateTime<Utc>) -> Watch {
        Watch {
            id: Uuid::new_v4(),
            name: self.name,
            brand: self.brand.trim().to_string(),
            seller_email,
            seller_name: self.seller_name,
            price: self.price,
            image: self.image,
            description: self.description,
            location: self.location,
            status: WatchStatus::Unsold,
            is_advertised: false,
            is_reported: false,
            posted_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub watch_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<NormalizedMoney>,
    pub buyer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_location: Option<String>,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub ordered_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub watch_id: Uuid,
    #[serde(default)]
    pub watch_name: Option<String>,
    #[serde(default)]
    pub price: Option<NormalizedMoney>,
    #[serde(default)]
    pub buyer_email: Option<String>,
    #[serde(default)]
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub meeting_location: Option<String>,
}

impl NewOrder {
    pub fn into_order(self, buyer_email: String, now: DateTime<Utc>) -> Order {
        Order {
            id: Uuid::new_v4(),
            watch_id: self.watch_id,
            watch_name: self.watch_name,
            price: self.price,
            buyer_email,
            buyer_name: self.buyer_name,
            phone: self.phone,
            meeting_location: self.meeting_location,
            payment_status: PaymentStatus::Unpaid,
            transaction_id: None,
            ordered_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub order_id: Uuid,
    pub transaction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<NormalizedMoney>,
    pub email: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub order_id: Uuid,
    pub transaction_id: String,
    #[serde(default)]
    pub price: Option<NormalizedMoney>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Acknowledgement of a single-document insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: Uuid,
}

impl InsertResult {
    pub fn new(inserted_id: Uuid) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

/// Acknowledgement of an update. `matched_count` counts documents selected
/// by the filter; `modified_count` only those whose fields actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_defaults_role_and_admin_flag() {
        let user: User = serde_json::from_value(json!({
            "_id": Uuid::nil(),
            "email": "a@x.com"
        }))
        .unwrap();
        assert_eq!(user.role, AccountRole::Unset);
        assert!(!user.is_admin);
    }

    #[test]
    fn watch_serializes_camel_case() {
        let watch = NewWatch {
            name: Some("Submariner".into()),
            brand: " Rolex ".into(),
            seller_email: None,
            seller_name: None,
            price: Some("9500".parse().unwrap()),
            image: None,
            description: None,
            location: None,
        }
        .into_watch("a@x.com".into(), Utc::now());

        let v = serde_json::to_value(&watch).unwrap();
        assert_eq!(v["brand"], "Rolex");
        assert_eq!(v["sellerEmail"], "a@x.com");
        assert_eq!(v["status"], "unsold");
        assert_eq!(v["isAdvertised"], false);
        assert_eq!(v["isReported"], false);
        assert!(v.get("_id").is_some());
        assert!(v.get("image").is_none());
    }

    #[test]
    fn new_orders_start_unpaid() {
        let order = NewOrder {
            watch_id: Uuid::new_v4(),
            watch_name: None,
            price: None,
            buyer_email: Some("ignored@x.com".into()),
            buyer_name: None,
            phone: None,
            meeting_location: None,
        }
        .into_order("buyer@x.com".into(), Utc::now());
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.buyer_email, "buyer@x.com");
        assert!(order.transaction_id.is_none());
    }

    #[test]
    fn write_results_mirror_document_store_acknowledgements() {
        let v = serde_json::to_value(UpdateResult::new(1, 0)).unwrap();
        assert_eq!(v, json!({ "acknowledged": true, "matchedCount": 1, "modifiedCount": 0 }));
        let v = serde_json::to_value(DeleteResult::new(1)).unwrap();
        assert_eq!(v, json!({ "acknowledged": true, "deletedCount": 1 }));
    }
}
