use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed for `{field}`: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("update for `{entity}` carries no changes")]
    EmptyUpdate { entity: &'static str },
    #[error("`{entity}` requires an organization scope")]
    MissingOrganization { entity: &'static str },
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Reject blank strings after trimming.
pub fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Same as [`ensure_non_empty`] for optional patch fields; `None` passes.
pub fn ensure_non_empty_opt(value: Option<&str>, field: &'static str) -> Result<(), DomainError> {
    match value {
        Some(value) => ensure_non_empty(value, field),
        None => Ok(()),
    }
}

pub fn ensure_non_negative(value: i64, field: &'static str) -> Result<(), DomainError> {
    if value < 0 {
        return Err(DomainError::validation(field, "must not be negative"));
    }
    Ok(())
}
