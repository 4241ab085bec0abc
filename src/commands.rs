//! Command handlers
//!
//! Each handler starts a session from the store, runs one controller
//! operation and writes the result back when something changed.

use anyhow::{Context, Result};
use std::io::Write;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::{Command, EditArgs};
use crate::constants::keys;
use crate::host::ServiceStore;
use crate::probe;
use crate::profiles::payload::SettingValue;
use crate::profiles::{ProfileController, ProfileError, ServiceDescriptor, ServiceId};

pub fn execute(command: Command, store: &mut impl ServiceStore, out: &mut impl Write) -> Result<()> {
    let controller = ProfileController::new();
    controller
        .load(store.load()?, store.service_limit())
        .context("Failed to load saved services")?;

    let changed = match command {
        Command::List => {
            list(&controller, out)?;
            false
        }
        Command::Show { id } => {
            show(&controller, id, out)?;
            false
        }
        Command::Add => match controller.add_new() {
            Ok(id) => {
                writeln!(out, "Added service {id}")?;
                true
            }
            Err(e @ ProfileError::LimitReached { .. }) => {
                writeln!(out, "{e}")?;
                false
            }
            Err(e) => return Err(e.into()),
        },
        Command::Remove { id } => {
            let outcome = match id {
                Some(id) => controller.remove(id, None)?,
                None => controller.remove_current()?,
            };
            if let Some(notice) = outcome.notice() {
                writeln!(out, "{notice}")?;
            }
            writeln!(out, "Current service: {}", outcome.current())?;
            true
        }
        Command::Select { id } => {
            controller.select(id)?;
            writeln!(out, "Selected service {id}")?;
            true
        }
        Command::Edit(args) => {
            if args.is_empty() {
                warn!("Nothing to edit");
                false
            } else {
                edit(&controller, args)?;
                controller.is_dirty()
            }
        }
        Command::Probe { timeout_ms } => {
            let instance = controller.spawn_test_service()?;
            let report = probe::probe_service(&instance, Duration::from_millis(timeout_ms))?;
            writeln!(
                out,
                "{} reachable at {} ({} ms)",
                report.endpoint.host,
                report.address,
                report.elapsed.as_millis()
            )?;
            false
        }
    };

    if changed {
        let state = controller.finalize()?;
        store.save(&state)?;
        info!(services = state.services.len(), "Saved services");
    }

    Ok(())
}

fn list(controller: &ProfileController, out: &mut impl Write) -> Result<()> {
    for entry in controller.list() {
        let marker = if entry.current { '*' } else { ' ' };
        writeln!(out, "{marker} {:>3}  {:<8} {}", entry.id, entry.descriptor, entry.name)?;
    }
    writeln!(out, "{} of {} services", controller.count(), controller.limit())?;
    Ok(())
}

fn show(controller: &ProfileController, id: Option<ServiceId>, out: &mut impl Write) -> Result<()> {
    let id = match id {
        Some(id) => id,
        None => controller.current_id().ok_or(ProfileError::NotLoaded)?,
    };
    let payload = controller.get(id)?;
    let descriptor = ServiceDescriptor::parse_type(payload.service_type())
        .map(|(descriptor, _)| descriptor)
        .unwrap_or_default();

    writeln!(out, "{} ({}, id {id})", payload.name(), descriptor)?;
    for field in descriptor
        .required_fields()
        .iter()
        .chain(descriptor.optional_fields())
    {
        if let Some(value) = payload.get(field) {
            writeln!(out, "  {field}: {}", render(field, value))?;
        }
    }
    if let Some(hotkeys) = payload.hotkey_data()
        && !hotkeys.is_empty()
    {
        writeln!(out, "  {}: {} binding(s)", keys::HOTKEY_DATA, hotkeys.len())?;
    }
    Ok(())
}

fn render(field: &str, value: &SettingValue) -> String {
    match value {
        SettingValue::String(_) if field == keys::KEY || field == keys::PASSWORD => {
            "********".to_string()
        }
        SettingValue::String(s) => s.clone(),
        SettingValue::Bool(b) => b.to_string(),
        SettingValue::Int(i) => i.to_string(),
        SettingValue::Payload(p) => format!("{{{} field(s)}}", p.len()),
    }
}

fn edit(controller: &ProfileController, args: EditArgs) -> Result<()> {
    if let Some(name) = &args.name {
        controller.rename_current(name)?;
    }
    let mut form = controller.form()?;

    if args.custom {
        form.descriptor = ServiceDescriptor::Custom;
    } else if args.common {
        form.descriptor = ServiceDescriptor::Common;
    }
    if let Some(service) = args.service {
        form.service = service;
    }
    if let Some(server) = args.server {
        form.server = server;
    }
    if let Some(key) = args.key {
        form.key = key;
    }
    if let Some(use_auth) = args.use_auth {
        form.use_auth = use_auth;
    }
    if let Some(username) = args.username {
        form.username = username;
    }
    if let Some(password) = args.password {
        form.password = password;
    }
    if let Some(bwtest) = args.bwtest {
        form.bwtest = bwtest;
    }

    if form.use_auth && !form.descriptor.supports_auth() {
        warn!(kind = %form.descriptor, "Authentication is only stored for custom servers");
    }

    controller.update_form(form)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JsonStore;
    use crate::constants::{defaults, notices};
    use std::fs;

    fn run(store: &mut JsonStore, command: Command) -> String {
        let mut out = Vec::new();
        execute(command, store, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn edit_args() -> EditArgs {
        EditArgs {
            name: None,
            service: None,
            server: None,
            key: None,
            custom: false,
            common: false,
            use_auth: None,
            username: None,
            password: None,
            bwtest: None,
        }
    }

    #[test]
    fn test_list_on_fresh_store_shows_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::open(temp_dir.path().join("services.json")).unwrap();

        let output = run(&mut store, Command::List);
        assert!(output.contains(defaults::DEFAULT_SERVICE_NAME));
        assert!(output.contains("1 of 20 services"));

        // Listing does not persist the synthesized default
        assert!(store.config().services.is_empty());
    }

    #[test]
    fn test_add_edit_remove_persist() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("services.json");
        let mut store = JsonStore::open(&path).unwrap();

        run(&mut store, Command::Add);
        assert_eq!(store.config().services.len(), 2);
        assert_eq!(store.config().selected_service_id, Some(2));

        let mut args = edit_args();
        args.name = Some("Studio".to_string());
        args.custom = true;
        args.server = Some("rtmp://ingest.local/live".to_string());
        run(&mut store, Command::Edit(args));

        let reopened = JsonStore::open(&path).unwrap();
        let studio = &reopened.config().services[1];
        assert_eq!(studio.name, "Studio");
        assert_eq!(studio.service_type, "rtmp_custom.2");

        let mut store = reopened;
        let output = run(&mut store, Command::Remove { id: None });
        assert!(output.contains("Current service: 1"));
        assert_eq!(store.config().services.len(), 1);
        assert_eq!(store.config().available_ids, vec![2]);
    }

    #[test]
    fn test_add_at_limit_prints_notice() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("services.json");
        fs::write(&path, r#"{"global":{"service_limit":1}}"#).unwrap();
        let mut store = JsonStore::open(&path).unwrap();

        let output = run(&mut store, Command::Add);
        assert!(output.contains(notices::LIMIT_REACHED));
        assert!(store.config().services.is_empty());
    }

    #[test]
    fn test_remove_last_prints_notice() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::open(temp_dir.path().join("services.json")).unwrap();

        let output = run(&mut store, Command::Remove { id: Some(1) });
        assert!(output.contains(notices::ALL_REMOVED));
        assert_eq!(store.config().services.len(), 1);
        assert_eq!(store.config().services[0].name, defaults::DEFAULT_SERVICE_NAME);
    }

    #[test]
    fn test_show_masks_secrets() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::open(temp_dir.path().join("services.json")).unwrap();

        let mut args = edit_args();
        args.key = Some("live_secret".to_string());
        run(&mut store, Command::Edit(args));

        let output = run(&mut store, Command::Show { id: None });
        assert!(output.contains("key: ********"));
        assert!(!output.contains("live_secret"));
    }

    #[test]
    fn test_select_missing_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::open(temp_dir.path().join("services.json")).unwrap();

        let mut out = Vec::new();
        let err = execute(Command::Select { id: 9 }, &mut store, &mut out).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ProfileError>(),
            Some(&ProfileError::NotFound(9))
        );
    }
}
