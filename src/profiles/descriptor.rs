//! Service kinds and the fields each kind carries
//!
//! The persisted `type` field is `"<kind>.<id>"`, e.g. `rtmp_common.3`.
//! The numeric suffix duplicates the payload `id` and is kept for file
//! compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ServiceId;
use crate::constants::{keys, service};

/// Capability set of a streaming service kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceDescriptor {
    /// Catalog-backed service (service name picked from a list, server from its list)
    #[default]
    Common,
    /// Free-form server URL with optional credentials
    Custom,
}

impl ServiceDescriptor {
    /// Kind identifier used by the host to instantiate a service
    pub fn kind_id(&self) -> &'static str {
        match self {
            Self::Common => service::COMMON_KIND,
            Self::Custom => service::CUSTOM_KIND,
        }
    }

    /// Fields always written for this kind
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Common => &[keys::SERVICE, keys::SERVER, keys::KEY],
            Self::Custom => &[keys::SERVER, keys::USE_AUTH, keys::KEY],
        }
    }

    /// Fields written only under some conditions
    pub fn optional_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Common => &[keys::BWTEST],
            Self::Custom => &[keys::USERNAME, keys::PASSWORD, keys::BWTEST],
        }
    }

    pub fn supports_auth(&self) -> bool {
        matches!(self, Self::Custom)
    }

    /// `"<kind>.<id>"` value for the persisted `type` field
    pub fn type_string(&self, id: ServiceId) -> String {
        format!("{}{}{}", self.kind_id(), service::TYPE_SEPARATOR, id)
    }

    /// Parse a persisted `type` field
    ///
    /// Accepts the bare kind (`rtmp_custom`) as well as the suffixed form.
    /// Unknown kinds yield `None`.
    pub fn parse_type(value: &str) -> Option<(Self, Option<ServiceId>)> {
        let (kind, suffix) = match value.split_once(service::TYPE_SEPARATOR) {
            Some((kind, suffix)) => (kind, Some(suffix)),
            None => (value, None),
        };

        let descriptor = match kind {
            service::COMMON_KIND => Self::Common,
            service::CUSTOM_KIND => Self::Custom,
            _ => return None,
        };

        let id = match suffix {
            Some(s) => Some(s.parse::<ServiceId>().ok()?),
            None => None,
        };

        Some((descriptor, id))
    }
}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common => write!(f, "common"),
            Self::Custom => write!(f, "custom"),
        }
    }
}
