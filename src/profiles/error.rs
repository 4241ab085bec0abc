use thiserror::Error;

use super::ServiceId;
use crate::constants::notices;

/// Recoverable failures of registry and controller operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Service {0} not found")]
    NotFound(ServiceId),
    #[error("{} (limit {limit})", notices::LIMIT_REACHED)]
    LimitReached { limit: usize },
    #[error("No services loaded")]
    NotLoaded,
}

pub type ProfileResult<T> = std::result::Result<T, ProfileError>;
