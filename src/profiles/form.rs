//! Editable form state for the profile currently on display
//!
//! A profile is materialized into a [`ServiceForm`] when selected and rebuilt
//! into a fresh payload when committed. Fields not modelled here are not
//! carried over, except `hotkey-data`, which the controller copies from the
//! stored payload.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ServiceId;
use super::descriptor::ServiceDescriptor;
use super::payload::SettingPayload;
use crate::constants::keys;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceForm {
    pub descriptor: ServiceDescriptor,
    pub name: String,
    /// Catalog service name (common services only)
    pub service: String,
    pub server: String,
    pub key: String,
    pub use_auth: bool,
    pub username: String,
    pub password: String,
    pub bwtest: bool,
}

impl ServiceForm {
    /// Populate a form from a stored payload
    pub fn from_payload(payload: &SettingPayload) -> Self {
        let descriptor = match ServiceDescriptor::parse_type(payload.service_type()) {
            Some((descriptor, _)) => descriptor,
            None => {
                warn!(
                    service_type = %payload.service_type(),
                    "Unknown service type, treating as common service"
                );
                ServiceDescriptor::Common
            }
        };

        let text = |key: &str| payload.get_str(key).unwrap_or_default().to_string();

        Self {
            descriptor,
            name: payload.name().to_string(),
            service: text(keys::SERVICE),
            server: text(keys::SERVER),
            key: text(keys::KEY),
            use_auth: payload.get_bool(keys::USE_AUTH).unwrap_or(false),
            username: text(keys::USERNAME),
            password: text(keys::PASSWORD),
            bwtest: payload.get_bool(keys::BWTEST).unwrap_or(false),
        }
    }

    /// Rebuild a full payload for profile `id` from the form
    ///
    /// The result carries `type` and `name` first, then the kind-specific
    /// fields. `id` and `hotkey-data` are stamped by the caller.
    pub fn to_payload(&self, id: ServiceId) -> SettingPayload {
        let mut settings = SettingPayload::new();
        settings.set(keys::TYPE, self.descriptor.type_string(id));
        settings.set(keys::NAME, self.name.as_str());

        match self.descriptor {
            ServiceDescriptor::Common => {
                settings.set(keys::SERVICE, self.service.as_str());
                settings.set(keys::SERVER, self.server.as_str());
            }
            ServiceDescriptor::Custom => {
                settings.set(keys::SERVER, self.server.as_str());
                settings.set(keys::USE_AUTH, self.use_auth);
                if self.use_auth {
                    settings.set(keys::USERNAME, self.username.as_str());
                    settings.set(keys::PASSWORD, self.password.as_str());
                }
            }
        }

        settings.set(keys::BWTEST, self.bwtest);
        settings.set(keys::KEY, self.key.as_str());
        settings
    }

    /// Minimal settings for a throwaway connection-test instance
    pub fn test_settings(&self) -> SettingPayload {
        let mut settings = SettingPayload::new();
        if self.descriptor == ServiceDescriptor::Common {
            settings.set(keys::SERVICE, self.service.as_str());
        }
        settings.set(keys::SERVER, self.server.as_str());
        settings.set(keys::KEY, self.key.as_str());
        settings
    }
}
