//! Create and update payloads accepted by the orchestrators.
//!
//! Update payloads are patches: every field except `id` is optional and a
//! patch with no field set is rejected before any storage or cache call.

use uuid::Uuid;

use crate::domain::error::{
    DomainError, ensure_non_empty, ensure_non_empty_opt, ensure_non_negative,
};
use crate::domain::types::OrderStatus;

pub trait CreateInput: Send + Sync + 'static {
    fn validate(&self) -> Result<(), DomainError>;
}

pub trait UpdateInput: Send + Sync + 'static {
    fn id(&self) -> Uuid;

    /// True when the patch would not change anything.
    fn is_empty(&self) -> bool;

    fn validate(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Organization
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateOrganizationInput {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOrganizationInput {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
}

impl CreateInput for CreateOrganizationInput {
    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty(&self.name, "name")
    }
}

impl UpdateInput for UpdateOrganizationInput {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.address.is_none()
    }

    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty_opt(self.name.as_deref(), "name")
    }
}

// ----------------------------------------------------------------------------
// Category
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub position: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub position: Option<i32>,
}

impl CreateInput for CreateCategoryInput {
    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty(&self.name, "name")
    }
}

impl UpdateInput for UpdateCategoryInput {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.position.is_none()
    }

    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty_opt(self.name.as_deref(), "name")
    }
}

// ----------------------------------------------------------------------------
// Item
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateItemInput {
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub is_available: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateItemInput {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub is_available: Option<bool>,
}

impl CreateInput for CreateItemInput {
    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty(&self.name, "name")?;
        ensure_non_negative(self.price, "price")
    }
}

impl UpdateInput for UpdateItemInput {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.is_available.is_none()
    }

    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty_opt(self.name.as_deref(), "name")?;
        match self.price {
            Some(price) => ensure_non_negative(price, "price"),
            None => Ok(()),
        }
    }
}

// ----------------------------------------------------------------------------
// Table
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateTableInput {
    pub number: i32,
    pub seats: i32,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTableInput {
    pub id: Uuid,
    pub number: Option<i32>,
    pub seats: Option<i32>,
    pub label: Option<String>,
}

impl CreateInput for CreateTableInput {
    fn validate(&self) -> Result<(), DomainError> {
        if self.seats <= 0 {
            return Err(DomainError::validation("seats", "must be positive"));
        }
        Ok(())
    }
}

impl UpdateInput for UpdateTableInput {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_empty(&self) -> bool {
        self.number.is_none() && self.seats.is_none() && self.label.is_none()
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.seats.is_some_and(|seats| seats <= 0) {
            return Err(DomainError::validation("seats", "must be positive"));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Order
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub table_id: Option<Uuid>,
    pub item_ids: Vec<Uuid>,
    pub total: i64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOrderInput {
    pub id: Uuid,
    pub status: Option<OrderStatus>,
    pub item_ids: Option<Vec<Uuid>>,
    pub total: Option<i64>,
    pub note: Option<String>,
}

impl CreateInput for CreateOrderInput {
    fn validate(&self) -> Result<(), DomainError> {
        if self.item_ids.is_empty() {
            return Err(DomainError::validation("item_ids", "must not be empty"));
        }
        ensure_non_negative(self.total, "total")
    }
}

impl UpdateInput for UpdateOrderInput {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.item_ids.is_none()
            && self.total.is_none()
            && self.note.is_none()
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.item_ids.as_ref().is_some_and(Vec::is_empty) {
            return Err(DomainError::validation("item_ids", "must not be empty"));
        }
        match self.total {
            Some(total) => ensure_non_negative(total, "total"),
            None => Ok(()),
        }
    }
}

// ----------------------------------------------------------------------------
// Image
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateImageInput {
    pub item_id: Uuid,
    pub url: String,
    pub position: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateImageInput {
    pub id: Uuid,
    pub url: Option<String>,
    pub position: Option<i32>,
}

impl CreateInput for CreateImageInput {
    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty(&self.url, "url")
    }
}

impl UpdateInput for UpdateImageInput {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_empty(&self) -> bool {
        self.url.is_none() && self.position.is_none()
    }

    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty_opt(self.url.as_deref(), "url")
    }
}

// ----------------------------------------------------------------------------
// Comment
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateCommentInput {
    pub item_id: Uuid,
    pub author_id: Option<Uuid>,
    pub body: String,
    pub rating: Option<i16>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCommentInput {
    pub id: Uuid,
    pub body: Option<String>,
    pub rating: Option<i16>,
}

fn ensure_rating(rating: Option<i16>) -> Result<(), DomainError> {
    match rating {
        Some(value) if !(1..=5).contains(&value) => {
            Err(DomainError::validation("rating", "must be between 1 and 5"))
        }
        _ => Ok(()),
    }
}

impl CreateInput for CreateCommentInput {
    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty(&self.body, "body")?;
        ensure_rating(self.rating)
    }
}

impl UpdateInput for UpdateCommentInput {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_empty(&self) -> bool {
        self.body.is_none() && self.rating.is_none()
    }

    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty_opt(self.body.as_deref(), "body")?;
        ensure_rating(self.rating)
    }
}

// ----------------------------------------------------------------------------
// Specification
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateSpecificationInput {
    pub item_id: Uuid,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSpecificationInput {
    pub id: Uuid,
    pub name: Option<String>,
    pub value: Option<String>,
}

impl CreateInput for CreateSpecificationInput {
    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty(&self.name, "name")
    }
}

impl UpdateInput for UpdateSpecificationInput {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_empty(&self) -> bool {
        self.name.is_none() && self.value.is_none()
    }

    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty_opt(self.name.as_deref(), "name")
    }
}

// ----------------------------------------------------------------------------
// Rule
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateRuleInput {
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRuleInput {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
}

impl CreateInput for CreateRuleInput {
    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty(&self.name, "name")
    }
}

impl UpdateInput for UpdateRuleInput {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.enabled.is_none()
    }

    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty_opt(self.name.as_deref(), "name")
    }
}

// ----------------------------------------------------------------------------
// Message
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateMessageInput {
    pub sender_id: Option<Uuid>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateMessageInput {
    pub id: Uuid,
    pub subject: Option<String>,
    pub body: Option<String>,
}

impl CreateInput for CreateMessageInput {
    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty(&self.subject, "subject")?;
        ensure_non_empty(&self.body, "body")
    }
}

impl UpdateInput for UpdateMessageInput {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_empty(&self) -> bool {
        self.subject.is_none() && self.body.is_none()
    }

    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty_opt(self.subject.as_deref(), "subject")?;
        ensure_non_empty_opt(self.body.as_deref(), "body")
    }
}

// ----------------------------------------------------------------------------
// User
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<String>,
}

fn ensure_email(email: &str) -> Result<(), DomainError> {
    ensure_non_empty(email, "email")?;
    if !email.contains('@') {
        return Err(DomainError::validation("email", "must contain `@`"));
    }
    Ok(())
}

impl CreateInput for CreateUserInput {
    fn validate(&self) -> Result<(), DomainError> {
        ensure_email(&self.email)?;
        ensure_non_empty(&self.display_name, "display_name")?;
        ensure_non_empty(&self.role, "role")
    }
}

impl UpdateInput for UpdateUserInput {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_empty(&self) -> bool {
        self.email.is_none() && self.display_name.is_none() && self.role.is_none()
    }

    fn validate(&self) -> Result<(), DomainError> {
        if let Some(email) = self.email.as_deref() {
            ensure_email(email)?;
        }
        ensure_non_empty_opt(self.display_name.as_deref(), "display_name")?;
        ensure_non_empty_opt(self.role.as_deref(), "role")
    }
}

// ----------------------------------------------------------------------------
// Role
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateRoleInput {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRoleInput {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CreateInput for CreateRoleInput {
    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty(&self.name, "name")
    }
}

impl UpdateInput for UpdateRoleInput {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    fn validate(&self) -> Result<(), DomainError> {
        ensure_non_empty_opt(self.name.as_deref(), "name")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_patches_are_empty() {
        assert!(UpdateCategoryInput::default().is_empty());
        assert!(UpdateItemInput::default().is_empty());
        assert!(UpdateOrderInput::default().is_empty());
        assert!(UpdateUserInput::default().is_empty());
    }

    #[test]
    fn single_field_patch_is_not_empty() {
        let patch = UpdateItemInput {
            is_available: Some(false),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn rating_outside_range_is_rejected() {
        let input = CreateCommentInput {
            item_id: Uuid::new_v4(),
            author_id: None,
            body: "great".to_string(),
            rating: Some(6),
        };
        assert!(matches!(
            input.validate(),
            Err(DomainError::Validation {
                field: "rating",
                ..
            })
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        let input = CreateCategoryInput {
            name: "   ".to_string(),
            description: None,
            position: 0,
        };
        assert!(input.validate().is_err());
    }
}
