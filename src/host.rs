//! Types exchanged with the host that owns persistence

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::profiles::ServiceId;
use crate::profiles::payload::SettingPayload;

/// A host-side service object: what the host instantiates and persists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// `"<kind>.<id>"` for saved services, bare kind for test instances
    #[serde(rename = "type")]
    pub service_type: String,
    pub name: String,
    #[serde(default)]
    pub settings: SettingPayload,
    /// Hotkey bindings kept by the host next to the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey_data: Option<SettingPayload>,
}

/// Everything the host hands over on load and receives back on save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostState {
    pub services: Vec<ServiceInstance>,
    pub selected_id: Option<ServiceId>,
    /// Reuse pool of released ids
    pub available_ids: Vec<ServiceId>,
}

/// Persistence seam between the controller and whatever stores services
pub trait ServiceStore {
    fn load(&self) -> Result<HostState>;
    fn save(&mut self, state: &HostState) -> Result<()>;
    /// Maximum number of saved services
    fn service_limit(&self) -> usize;
}
