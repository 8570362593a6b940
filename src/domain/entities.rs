//! Domain records mirrored from persistent storage.
//!
//! Every record carries [`AuditFields`] flattened into its serialized form, so
//! the cached JSON and the stored JSON document have the same shape.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::OrderStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFields {
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub user_deleted: Option<Uuid>,
    #[serde(default)]
    pub deleted_at: Option<OffsetDateTime>,
}

impl AuditFields {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            is_deleted: false,
            user_deleted: None,
            deleted_at: None,
        }
    }

    pub fn touch(&mut self, now: OffsetDateTime) {
        self.updated_at = now;
    }

    pub fn mark_deleted(&mut self, actor: Uuid, now: OffsetDateTime) {
        self.is_deleted = true;
        self.user_deleted = Some(actor);
        self.deleted_at = Some(now);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    #[serde(flatten)]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub position: i32,
    #[serde(flatten)]
    pub audit: AuditFields,
}

/// A menu item together with the child lists it is served with.
///
/// `images`, `comments` and `specifications` are not stored on the item row;
/// the storage adapter fills them from separate queries on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    /// Price in minor currency units.
    pub price: i64,
    pub is_available: bool,
    #[serde(default)]
    pub images: Vec<ImageRecord>,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    #[serde(default)]
    pub specifications: Vec<SpecificationRecord>,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl ItemRecord {
    /// Child lists assembled from their own tables at read time.
    pub const EMBEDDED: &'static [&'static str] = &["images", "comments", "specifications"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub number: i32,
    pub seats: i32,
    pub label: Option<String>,
    #[serde(flatten)]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub table_id: Option<Uuid>,
    pub item_ids: Vec<Uuid>,
    pub status: OrderStatus,
    /// Total in minor currency units.
    pub total: i64,
    pub note: Option<String>,
    #[serde(flatten)]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub item_id: Uuid,
    pub url: String,
    pub position: i32,
    #[serde(flatten)]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub item_id: Uuid,
    pub author_id: Option<Uuid>,
    pub body: String,
    /// 1..=5 when present.
    pub rating: Option<i16>,
    #[serde(flatten)]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub item_id: Uuid,
    pub name: String,
    pub value: String,
    #[serde(flatten)]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    #[serde(flatten)]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: Uuid,
    pub sender_id: Option<Uuid>,
    pub subject: String,
    pub body: String,
    #[serde(flatten)]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub organization_id: Option<Uuid>,
    #[serde(flatten)]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub audit: AuditFields,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_fields_flatten_into_record_json() {
        let now = OffsetDateTime::now_utc();
        let record = RuleRecord {
            id: Uuid::new_v4(),
            name: "no-smoking".to_string(),
            description: None,
            enabled: true,
            audit: AuditFields::new(now),
        };

        let value = serde_json::to_value(&record).expect("serialize rule");
        assert_eq!(value["is_deleted"], serde_json::Value::Bool(false));
        assert!(value.get("audit").is_none());

        let back: RuleRecord = serde_json::from_value(value).expect("deserialize rule");
        assert_eq!(back, record);
    }

    #[test]
    fn mark_deleted_sets_every_audit_column() {
        let now = OffsetDateTime::now_utc();
        let actor = Uuid::new_v4();
        let mut audit = AuditFields::new(now);

        audit.mark_deleted(actor, now);

        assert!(audit.is_deleted);
        assert_eq!(audit.user_deleted, Some(actor));
        assert_eq!(audit.deleted_at, Some(now));
    }

    #[test]
    fn item_children_default_to_empty() {
        let now = OffsetDateTime::now_utc();
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "organization_id": Uuid::new_v4(),
            "category_id": null,
            "name": "Pho",
            "description": null,
            "price": 1250,
            "is_available": true,
            "created_at": now,
            "updated_at": now,
        });

        let item: ItemRecord = serde_json::from_value(json).expect("deserialize item");
        assert!(item.images.is_empty());
        assert!(item.comments.is_empty());
        assert!(item.specifications.is_empty());
    }
}
