//! Binds each domain record to its kind, its inputs and the handful of
//! accessors the generic storage and cache code needs.

use serde::Serialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::inputs::*;
use crate::domain::entities::*;
use crate::domain::error::DomainError;
use crate::domain::types::{EntityKind, OrderStatus};

pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    type Create: CreateInput;
    type Update: UpdateInput;

    fn id(&self) -> Uuid;

    /// Owning organization for organization-scoped kinds, `None` otherwise.
    fn owner(&self) -> Option<Uuid>;

    fn audit(&self) -> &AuditFields;

    fn audit_mut(&mut self) -> &mut AuditFields;

    /// Materialize a fresh record from a create payload.
    fn build(
        id: Uuid,
        organization_id: Option<Uuid>,
        input: Self::Create,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError>;

    /// Apply a patch in place. Does not touch audit fields.
    fn apply(&mut self, patch: Self::Update);

    /// Text matched by `ListParams::search` and used for name ordering.
    fn search_text(&self) -> String;

    /// Id of the `kind` record this one is embedded in, if any.
    fn parent(&self, _kind: EntityKind) -> Option<Uuid> {
        None
    }

    /// A decoded value with a nil id is indistinguishable from "not found".
    fn is_blank(&self) -> bool {
        self.id().is_nil()
    }
}

fn require_organization(
    kind: EntityKind,
    organization_id: Option<Uuid>,
) -> Result<Uuid, DomainError> {
    organization_id.ok_or(DomainError::MissingOrganization {
        entity: kind.as_str(),
    })
}

macro_rules! audit_accessors {
    () => {
        fn audit(&self) -> &AuditFields {
            &self.audit
        }

        fn audit_mut(&mut self) -> &mut AuditFields {
            &mut self.audit
        }
    };
}

impl Entity for OrganizationRecord {
    const KIND: EntityKind = EntityKind::Organization;
    type Create = CreateOrganizationInput;
    type Update = UpdateOrganizationInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        None
    }

    audit_accessors!();

    fn build(
        id: Uuid,
        _organization_id: Option<Uuid>,
        input: Self::Create,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            description: input.description,
            address: input.address,
            audit: AuditFields::new(now),
        })
    }

    fn apply(&mut self, patch: Self::Update) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(address) = patch.address {
            self.address = Some(address);
        }
    }

    fn search_text(&self) -> String {
        self.name.clone()
    }
}

impl Entity for CategoryRecord {
    const KIND: EntityKind = EntityKind::Category;
    type Create = CreateCategoryInput;
    type Update = UpdateCategoryInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }

    audit_accessors!();

    fn build(
        id: Uuid,
        organization_id: Option<Uuid>,
        input: Self::Create,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            organization_id: require_organization(Self::KIND, organization_id)?,
            name: input.name.trim().to_string(),
            description: input.description,
            position: input.position,
            audit: AuditFields::new(now),
        })
    }

    fn apply(&mut self, patch: Self::Update) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
    }

    fn search_text(&self) -> String {
        self.name.clone()
    }
}

impl Entity for ItemRecord {
    const KIND: EntityKind = EntityKind::Item;
    type Create = CreateItemInput;
    type Update = UpdateItemInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }

    audit_accessors!();

    fn build(
        id: Uuid,
        organization_id: Option<Uuid>,
        input: Self::Create,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            organization_id: require_organization(Self::KIND, organization_id)?,
            category_id: input.category_id,
            name: input.name.trim().to_string(),
            description: input.description,
            price: input.price,
            is_available: input.is_available,
            images: Vec::new(),
            comments: Vec::new(),
            specifications: Vec::new(),
            audit: AuditFields::new(now),
        })
    }

    fn apply(&mut self, patch: Self::Update) {
        if let Some(category_id) = patch.category_id {
            self.category_id = Some(category_id);
        }
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(is_available) = patch.is_available {
            self.is_available = is_available;
        }
    }

    fn search_text(&self) -> String {
        self.name.clone()
    }
}

impl Entity for TableRecord {
    const KIND: EntityKind = EntityKind::Table;
    type Create = CreateTableInput;
    type Update = UpdateTableInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }

    audit_accessors!();

    fn build(
        id: Uuid,
        organization_id: Option<Uuid>,
        input: Self::Create,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            organization_id: require_organization(Self::KIND, organization_id)?,
            number: input.number,
            seats: input.seats,
            label: input.label,
            audit: AuditFields::new(now),
        })
    }

    fn apply(&mut self, patch: Self::Update) {
        if let Some(number) = patch.number {
            self.number = number;
        }
        if let Some(seats) = patch.seats {
            self.seats = seats;
        }
        if let Some(label) = patch.label {
            self.label = Some(label);
        }
    }

    fn search_text(&self) -> String {
        match &self.label {
            Some(label) => format!("{} {label}", self.number),
            None => self.number.to_string(),
        }
    }
}

impl Entity for OrderRecord {
    const KIND: EntityKind = EntityKind::Order;
    type Create = CreateOrderInput;
    type Update = UpdateOrderInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }

    audit_accessors!();

    fn build(
        id: Uuid,
        organization_id: Option<Uuid>,
        input: Self::Create,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            organization_id: require_organization(Self::KIND, organization_id)?,
            table_id: input.table_id,
            item_ids: input.item_ids,
            status: OrderStatus::Pending,
            total: input.total,
            note: input.note,
            audit: AuditFields::new(now),
        })
    }

    fn apply(&mut self, patch: Self::Update) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(item_ids) = patch.item_ids {
            self.item_ids = item_ids;
        }
        if let Some(total) = patch.total {
            self.total = total;
        }
        if let Some(note) = patch.note {
            self.note = Some(note);
        }
    }

    fn search_text(&self) -> String {
        self.note.clone().unwrap_or_default()
    }
}

impl Entity for ImageRecord {
    const KIND: EntityKind = EntityKind::Image;
    type Create = CreateImageInput;
    type Update = UpdateImageInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }

    audit_accessors!();

    fn build(
        id: Uuid,
        organization_id: Option<Uuid>,
        input: Self::Create,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            organization_id: require_organization(Self::KIND, organization_id)?,
            item_id: input.item_id,
            url: input.url.trim().to_string(),
            position: input.position,
            audit: AuditFields::new(now),
        })
    }

    fn apply(&mut self, patch: Self::Update) {
        if let Some(url) = patch.url {
            self.url = url.trim().to_string();
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
    }

    fn search_text(&self) -> String {
        self.url.clone()
    }

    fn parent(&self, kind: EntityKind) -> Option<Uuid> {
        (kind == EntityKind::Item).then_some(self.item_id)
    }
}

impl Entity for CommentRecord {
    const KIND: EntityKind = EntityKind::Comment;
    type Create = CreateCommentInput;
    type Update = UpdateCommentInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }

    audit_accessors!();

    fn build(
        id: Uuid,
        organization_id: Option<Uuid>,
        input: Self::Create,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            organization_id: require_organization(Self::KIND, organization_id)?,
            item_id: input.item_id,
            author_id: input.author_id,
            body: input.body,
            rating: input.rating,
            audit: AuditFields::new(now),
        })
    }

    fn apply(&mut self, patch: Self::Update) {
        if let Some(body) = patch.body {
            self.body = body;
        }
        if let Some(rating) = patch.rating {
            self.rating = Some(rating);
        }
    }

    fn search_text(&self) -> String {
        self.body.clone()
    }

    fn parent(&self, kind: EntityKind) -> Option<Uuid> {
        (kind == EntityKind::Item).then_some(self.item_id)
    }
}

impl Entity for SpecificationRecord {
    const KIND: EntityKind = EntityKind::Specification;
    type Create = CreateSpecificationInput;
    type Update = UpdateSpecificationInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }

    audit_accessors!();

    fn build(
        id: Uuid,
        organization_id: Option<Uuid>,
        input: Self::Create,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            organization_id: require_organization(Self::KIND, organization_id)?,
            item_id: input.item_id,
            name: input.name.trim().to_string(),
            value: input.value,
            audit: AuditFields::new(now),
        })
    }

    fn apply(&mut self, patch: Self::Update) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(value) = patch.value {
            self.value = value;
        }
    }

    fn search_text(&self) -> String {
        self.name.clone()
    }

    fn parent(&self, kind: EntityKind) -> Option<Uuid> {
        (kind == EntityKind::Item).then_some(self.item_id)
    }
}

impl Entity for RuleRecord {
    const KIND: EntityKind = EntityKind::Rule;
    type Create = CreateRuleInput;
    type Update = UpdateRuleInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        None
    }

    audit_accessors!();

    fn build(
        id: Uuid,
        _organization_id: Option<Uuid>,
        input: Self::Create,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            description: input.description,
            enabled: input.enabled,
            audit: AuditFields::new(now),
        })
    }

    fn apply(&mut self, patch: Self::Update) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
    }

    fn search_text(&self) -> String {
        self.name.clone()
    }
}

impl Entity for MessageRecord {
    const KIND: EntityKind = EntityKind::Message;
    type Create = CreateMessageInput;
    type Update = UpdateMessageInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        None
    }

    audit_accessors!();

    fn build(
        id: Uuid,
        _organization_id: Option<Uuid>,
        input: Self::Create,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            sender_id: input.sender_id,
            subject: input.subject.trim().to_string(),
            body: input.body,
            audit: AuditFields::new(now),
        })
    }

    fn apply(&mut self, patch: Self::Update) {
        if let Some(subject) = patch.subject {
            self.subject = subject.trim().to_string();
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
    }

    fn search_text(&self) -> String {
        self.subject.clone()
    }
}

impl Entity for UserRecord {
    const KIND: EntityKind = EntityKind::User;
    type Create = CreateUserInput;
    type Update = UpdateUserInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        None
    }

    audit_accessors!();

    fn build(
        id: Uuid,
        _organization_id: Option<Uuid>,
        input: Self::Create,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            email: input.email.trim().to_ascii_lowercase(),
            display_name: input.display_name.trim().to_string(),
            role: input.role.trim().to_string(),
            organization_id: input.organization_id,
            audit: AuditFields::new(now),
        })
    }

    fn apply(&mut self, patch: Self::Update) {
        if let Some(email) = patch.email {
            self.email = email.trim().to_ascii_lowercase();
        }
        if let Some(display_name) = patch.display_name {
            self.display_name = display_name.trim().to_string();
        }
        if let Some(role) = patch.role {
            self.role = role.trim().to_string();
        }
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.display_name, self.email)
    }
}

impl Entity for RoleRecord {
    const KIND: EntityKind = EntityKind::Role;
    type Create = CreateRoleInput;
    type Update = UpdateRoleInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        None
    }

    audit_accessors!();

    fn build(
        id: Uuid,
        _organization_id: Option<Uuid>,
        input: Self::Create,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            description: input.description,
            audit: AuditFields::new(now),
        })
    }

    fn apply(&mut self, patch: Self::Update) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
    }

    fn search_text(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organization_scoped_build_requires_organization() {
        let input = CreateCategoryInput {
            name: "Starters".to_string(),
            description: None,
            position: 1,
        };
        let result = CategoryRecord::build(Uuid::new_v4(), None, input, OffsetDateTime::now_utc());
        assert!(matches!(
            result,
            Err(DomainError::MissingOrganization {
                entity: "category"
            })
        ));
    }

    #[test]
    fn children_report_their_item() {
        let item_id = Uuid::new_v4();
        let comment = CommentRecord::build(
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            CreateCommentInput {
                item_id,
                author_id: None,
                body: "crispy".to_string(),
                rating: Some(5),
            },
            OffsetDateTime::now_utc(),
        )
        .expect("valid comment");

        assert_eq!(comment.parent(EntityKind::Item), Some(item_id));
        assert_eq!(comment.parent(EntityKind::Category), None);
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut item = ItemRecord::build(
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            CreateItemInput {
                category_id: None,
                name: "Banh mi".to_string(),
                description: Some("pork".to_string()),
                price: 900,
                is_available: true,
            },
            OffsetDateTime::now_utc(),
        )
        .expect("valid item");

        item.apply(UpdateItemInput {
            id: item.id,
            price: Some(950),
            ..Default::default()
        });

        assert_eq!(item.price, 950);
        assert_eq!(item.name, "Banh mi");
        assert_eq!(item.description.as_deref(), Some("pork"));
    }
}
