//! Request-scoped caller identity.

use uuid::Uuid;

use crate::application::error::AppError;
use crate::domain::error::DomainError;
use crate::domain::types::{EntityKind, Scope};

/// Identity attached to a request by the delivery layer after authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub role: String,
    pub organization_id: Option<Uuid>,
}

impl RequestContext {
    pub fn new(user_id: Uuid, role: impl Into<String>, organization_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            role: role.into(),
            organization_id,
        }
    }

    /// Scope for operations on `kind`.
    ///
    /// Organization-scoped kinds require the request to carry an organization.
    pub fn scope_for(&self, kind: EntityKind) -> Result<Scope, AppError> {
        if !kind.is_organization_scoped() {
            return Ok(Scope::Global);
        }
        self.organization_id
            .map(Scope::Organization)
            .ok_or_else(|| {
                DomainError::MissingOrganization {
                    entity: kind.as_str(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_kinds_use_request_organization() {
        let org = Uuid::new_v4();
        let ctx = RequestContext::new(Uuid::new_v4(), "manager", Some(org));

        assert_eq!(
            ctx.scope_for(EntityKind::Item).expect("scope"),
            Scope::Organization(org)
        );
        assert_eq!(ctx.scope_for(EntityKind::Rule).expect("scope"), Scope::Global);
    }

    #[test]
    fn scoped_kind_without_organization_is_rejected() {
        let ctx = RequestContext::new(Uuid::new_v4(), "admin", None);

        let err = ctx.scope_for(EntityKind::Order).expect_err("missing org");
        assert!(err.is_validation());
        assert_eq!(ctx.scope_for(EntityKind::User).expect("scope"), Scope::Global);
    }
}
