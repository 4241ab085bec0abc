//! Orchestrates the registry against the host's persisted service list
//!
//! The controller owns the profile currently on display and its in-progress
//! form. Every public operation runs under one lock, so a commit of the
//! current form and the switch to another profile happen as a single step.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::ServiceId;
use super::allocator::IdAllocator;
use super::descriptor::ServiceDescriptor;
use super::error::{ProfileError, ProfileResult};
use super::form::ServiceForm;
use super::payload::{SettingPayload, SettingValue};
use super::registry::ProfileRegistry;
use crate::constants::{defaults, keys, notices};
use crate::host::{HostState, ServiceInstance};

/// Result of removing a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Profile removed; `current` is the profile on display afterwards
    Removed { current: ServiceId },
    /// The last profile was removed and a default one was created in its place
    AllRemoved { replacement: ServiceId },
}

impl RemoveOutcome {
    pub fn current(&self) -> ServiceId {
        match self {
            Self::Removed { current } => *current,
            Self::AllRemoved { replacement } => *replacement,
        }
    }

    /// One-time notice for the user, if any
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::Removed { .. } => None,
            Self::AllRemoved { .. } => Some(notices::ALL_REMOVED),
        }
    }
}

/// Display-list row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub id: ServiceId,
    pub name: String,
    pub descriptor: ServiceDescriptor,
    pub current: bool,
}

#[derive(Debug, Clone, Default)]
enum Session {
    #[default]
    Idle,
    Editing {
        current: ServiceId,
        form: ServiceForm,
        /// Form as it was materialized; commit is skipped while unchanged
        baseline: ServiceForm,
    },
}

#[derive(Debug)]
struct Inner {
    registry: ProfileRegistry,
    session: Session,
}

pub struct ProfileController {
    inner: Mutex<Inner>,
}

impl Default for ProfileController {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileController {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                registry: ProfileRegistry::new(defaults::SERVICE_LIMIT),
                session: Session::Idle,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner is only mutated through methods that leave it consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Populate the registry from the host and start editing
    ///
    /// Returns the id of the profile on display.
    pub fn load(&self, state: HostState, limit: usize) -> ProfileResult<ServiceId> {
        let mut inner = self.lock();

        let limit = if limit == 0 {
            warn!("Service limit of 0 is unusable, using 1");
            1
        } else {
            limit
        };

        let payloads: Vec<SettingPayload> = state.services.into_iter().map(to_payload).collect();

        // First occurrence of each usable id keeps it; the rest are re-numbered
        let mut seen = HashSet::new();
        let claimed: Vec<Option<ServiceId>> = payloads
            .iter()
            .map(|payload| persisted_id(payload).filter(|id| seen.insert(*id)))
            .collect();

        let allocator = IdAllocator::seed(claimed.iter().flatten().copied(), state.available_ids);
        let mut registry = ProfileRegistry::with_allocator(allocator, limit);

        for (mut payload, claimed) in payloads.into_iter().zip(claimed) {
            let id = match claimed {
                Some(id) => id,
                None => {
                    let id = registry.allocate_id()?;
                    warn!(
                        name = %payload.name(),
                        id,
                        "Saved service had no usable id, assigned a new one"
                    );
                    id
                }
            };
            restamp_type(&mut payload, id);
            registry.insert_loaded(id, payload);
        }

        if registry.count() > limit {
            warn!(count = registry.count(), limit, "More saved services than the limit allows");
        }

        if registry.is_empty() {
            let id = add_empty_service(&mut registry, true)?;
            info!(id, "No saved services, created default service");
        }

        let current = state
            .selected_id
            .filter(|id| registry.contains(*id))
            .or_else(|| {
                if let Some(id) = state.selected_id {
                    warn!(id, "Selected service not found, falling back to first");
                }
                registry.id_at_index(0)
            })
            .ok_or(ProfileError::NotLoaded)?;

        inner.registry = registry;
        inner.session = Session::Idle;
        inner.materialize(current)?;

        info!(
            count = inner.registry.count(),
            current,
            "Loaded {} service(s)",
            inner.registry.count()
        );
        Ok(current)
    }

    /// Commit the current form, then display `id`
    pub fn select(&self, id: ServiceId) -> ProfileResult<()> {
        let mut inner = self.lock();
        inner.current()?;
        if !inner.registry.contains(id) {
            return Err(ProfileError::NotFound(id));
        }

        inner.commit()?;
        inner.materialize(id)?;
        debug!(id, "Selected service");
        Ok(())
    }

    /// Add an empty "New Service <id>" profile and display it
    pub fn add_new(&self) -> ProfileResult<ServiceId> {
        let mut inner = self.lock();
        inner.current()?;

        let limit = inner.registry.limit();
        if inner.registry.count() >= limit {
            warn!(limit, "Service limit reached");
            return Err(ProfileError::LimitReached { limit });
        }

        inner.commit()?;
        let id = add_empty_service(&mut inner.registry, false)?;
        inner.materialize(id)?;
        info!(id, count = inner.registry.count(), "Added service");
        Ok(id)
    }

    /// Remove the profile on display
    pub fn remove_current(&self) -> ProfileResult<RemoveOutcome> {
        let mut inner = self.lock();
        let current = inner.current()?;
        inner.remove(current, None)
    }

    /// Remove `id`
    ///
    /// If `id` is on display, the next selection is `fallback` when it is
    /// still live, otherwise the profile that moved into the removed slot,
    /// otherwise the last one. Removing the only profile creates a default
    /// profile and reports [`RemoveOutcome::AllRemoved`].
    pub fn remove(&self, id: ServiceId, fallback: Option<ServiceId>) -> ProfileResult<RemoveOutcome> {
        self.lock().remove(id, fallback)
    }

    /// Commit, produce the host-side state and end the session
    pub fn finalize(&self) -> ProfileResult<HostState> {
        let mut inner = self.lock();
        inner.commit()?;
        let state = inner.host_state()?;

        let limit = inner.registry.limit();
        inner.registry = ProfileRegistry::new(limit);
        inner.session = Session::Idle;

        info!(count = state.services.len(), "Finalized services");
        Ok(state)
    }

    /// Copy of the in-progress form
    pub fn form(&self) -> ProfileResult<ServiceForm> {
        match &self.lock().session {
            Session::Editing { form, .. } => Ok(form.clone()),
            Session::Idle => Err(ProfileError::NotLoaded),
        }
    }

    /// Replace the in-progress form (not committed until the next switch or save)
    pub fn update_form(&self, new_form: ServiceForm) -> ProfileResult<()> {
        match &mut self.lock().session {
            Session::Editing { form, .. } => {
                *form = new_form;
                Ok(())
            }
            Session::Idle => Err(ProfileError::NotLoaded),
        }
    }

    /// Edit the name of the profile on display
    pub fn rename_current(&self, name: &str) -> ProfileResult<()> {
        match &mut self.lock().session {
            Session::Editing { form, .. } => {
                form.name = name.to_string();
                Ok(())
            }
            Session::Idle => Err(ProfileError::NotLoaded),
        }
    }

    /// Whether the in-progress form differs from the stored profile
    pub fn is_dirty(&self) -> bool {
        matches!(&self.lock().session, Session::Editing { form, baseline, .. } if form != baseline)
    }

    pub fn current_id(&self) -> Option<ServiceId> {
        self.lock().current().ok()
    }

    /// Committed payload of `id`
    pub fn get(&self, id: ServiceId) -> ProfileResult<SettingPayload> {
        self.lock().registry.get(id).cloned()
    }

    pub fn count(&self) -> usize {
        self.lock().registry.count()
    }

    pub fn limit(&self) -> usize {
        self.lock().registry.limit()
    }

    /// Rows for the display list, in order
    ///
    /// The profile on display shows its in-progress name and kind.
    pub fn list(&self) -> Vec<ServiceEntry> {
        let inner = self.lock();
        inner
            .registry
            .iter()
            .map(|(id, payload)| match &inner.session {
                Session::Editing { current, form, .. } if *current == id => ServiceEntry {
                    id,
                    name: form.name.clone(),
                    descriptor: form.descriptor,
                    current: true,
                },
                _ => ServiceEntry {
                    id,
                    name: payload.name().to_string(),
                    descriptor: ServiceDescriptor::parse_type(payload.service_type())
                        .map(|(descriptor, _)| descriptor)
                        .unwrap_or_default(),
                    current: false,
                },
            })
            .collect()
    }

    /// Throwaway service built from the uncommitted form, for connection tests
    pub fn spawn_test_service(&self) -> ProfileResult<ServiceInstance> {
        let form = self.form()?;
        Ok(ServiceInstance {
            service_type: form.descriptor.kind_id().to_string(),
            name: defaults::TEMP_SERVICE_NAME.to_string(),
            settings: form.test_settings(),
            hotkey_data: None,
        })
    }
}

impl Inner {
    fn current(&self) -> ProfileResult<ServiceId> {
        match &self.session {
            Session::Editing { current, .. } => Ok(*current),
            Session::Idle => Err(ProfileError::NotLoaded),
        }
    }

    fn remove(&mut self, id: ServiceId, fallback: Option<ServiceId>) -> ProfileResult<RemoveOutcome> {
        let current = self.current()?;
        let index = self.registry.index_of(id).ok_or(ProfileError::NotFound(id))?;

        self.registry.remove(id)?;
        info!(id, count = self.registry.count(), "Removed service");

        if self.registry.is_empty() {
            let replacement = add_empty_service(&mut self.registry, true)?;
            self.materialize(replacement)?;
            warn!(replacement, "{}", notices::ALL_REMOVED);
            return Ok(RemoveOutcome::AllRemoved { replacement });
        }

        if id != current {
            return Ok(RemoveOutcome::Removed { current });
        }

        let registry = &self.registry;
        let next = fallback
            .filter(|candidate| *candidate != id && registry.contains(*candidate))
            .or_else(|| registry.id_at_index(index))
            .or_else(|| registry.id_at_index(registry.count() - 1))
            .ok_or(ProfileError::NotFound(id))?;

        self.materialize(next)?;
        debug!(id = next, "Selected service after removal");
        Ok(RemoveOutcome::Removed { current: next })
    }

    /// Write the form back into the registry if it was edited
    fn commit(&mut self) -> ProfileResult<()> {
        let Session::Editing {
            current,
            form,
            baseline,
        } = &mut self.session
        else {
            return Err(ProfileError::NotLoaded);
        };

        if form == baseline {
            return Ok(());
        }

        let id = *current;
        let mut changes = form.to_payload(id);
        if let Some(hotkeys) = self.registry.get(id)?.hotkey_data() {
            changes.set(keys::HOTKEY_DATA, hotkeys.clone());
        }
        self.registry.replace(id, changes)?;
        *baseline = form.clone();
        debug!(id, "Committed form changes");
        Ok(())
    }

    /// Make `id` the profile on display, discarding any uncommitted form
    fn materialize(&mut self, id: ServiceId) -> ProfileResult<()> {
        let form = ServiceForm::from_payload(self.registry.get(id)?);
        self.session = Session::Editing {
            current: id,
            baseline: form.clone(),
            form,
        };
        Ok(())
    }

    fn host_state(&self) -> ProfileResult<HostState> {
        let current = self.current()?;
        let services = self
            .registry
            .iter()
            .map(|(_, payload)| to_instance(payload))
            .collect();

        Ok(HostState {
            services,
            selected_id: Some(current),
            available_ids: self.registry.allocator().released(),
        })
    }
}

/// Host service -> registry payload, folding hotkeys into `hotkey-data`
fn to_payload(service: ServiceInstance) -> SettingPayload {
    let ServiceInstance {
        service_type,
        name,
        mut settings,
        hotkey_data,
    } = service;

    if !settings.contains_key(keys::TYPE) {
        settings.set(keys::TYPE, service_type);
    }
    if !settings.contains_key(keys::NAME) {
        settings.set(keys::NAME, name);
    }
    if let Some(hotkeys) = hotkey_data {
        settings.set(keys::HOTKEY_DATA, hotkeys);
    }
    settings
}

/// Registry payload -> host service, hotkeys split back out
fn to_instance(payload: &SettingPayload) -> ServiceInstance {
    let mut settings = payload.clone();
    let hotkey_data = match settings.remove(keys::HOTKEY_DATA) {
        Some(SettingValue::Payload(hotkeys)) => Some(hotkeys),
        Some(other) => {
            // Not a nested payload; keep it where it was found
            settings.set(keys::HOTKEY_DATA, other);
            None
        }
        None => None,
    };

    ServiceInstance {
        service_type: payload.service_type().to_string(),
        name: payload.name().to_string(),
        settings,
        hotkey_data,
    }
}

/// Id stored in a persisted payload: the `id` field, else the type suffix
///
/// Ids outside `1..=MAX_SERVICE_ID` are treated as missing.
fn persisted_id(payload: &SettingPayload) -> Option<ServiceId> {
    let usable = |id: &ServiceId| (1..=defaults::MAX_SERVICE_ID).contains(id);
    let from_field = payload
        .get_int(keys::ID)
        .and_then(|id| ServiceId::try_from(id).ok())
        .filter(usable);
    let from_type = ServiceDescriptor::parse_type(payload.service_type())
        .and_then(|(_, id)| id)
        .filter(usable);

    from_field.or(from_type)
}

/// Keep the `type` suffix equal to the payload id
fn restamp_type(payload: &mut SettingPayload, id: ServiceId) {
    if let Some((descriptor, suffix)) = ServiceDescriptor::parse_type(payload.service_type())
        && suffix != Some(id)
    {
        payload.set(keys::TYPE, descriptor.type_string(id));
    }
}

fn add_empty_service(registry: &mut ProfileRegistry, is_default: bool) -> ProfileResult<ServiceId> {
    registry.add_with(|id| {
        let name = if is_default {
            defaults::DEFAULT_SERVICE_NAME.to_string()
        } else {
            format!("{} {}", defaults::NEW_SERVICE_PREFIX, id)
        };

        let mut payload = SettingPayload::new();
        payload.set(keys::ID, i64::from(id));
        payload.set(keys::NAME, name);
        payload.set(keys::TYPE, ServiceDescriptor::Common.type_string(id));
        payload
    })
}
