use platform_authz::ResourceKind;
use sea_orm::DbErr;
use thiserror::Error;

use crate::enrich::ApiEvent;

#[derive(Debug, Error)]
pub enum GroupEditError {
    #[error("storage query failed: {0}")]
    Storage(#[from] DbErr),
    #[error("user {0} not found")]
    UserNotFound(i32),
    #[error("resource {0} not found")]
    ResourceNotFound(i32),
    #[error("{0} is not a stored resource type")]
    NotAResourceType(ResourceKind),
    #[error("{event:?} does not carry a {expected} payload")]
    PayloadMismatch {
        event: ApiEvent,
        expected: &'static str,
    },
    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
}

pub type GroupEditResult<T> = Result<T, GroupEditError>;
