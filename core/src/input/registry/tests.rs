//! Tests for BindingRegistry

use std::time::Instant;

use super::{BindingRegistry, DISCONNECTED_CONTROLLER};
use crate::config::{FrontendConfig, SettingsStore, SharedSettings, lock_settings};
use crate::input::action::BindAction;
use crate::input::binding::{BindingSource, FULL_SCALE, PhysicalInput, Sign};
use crate::input::controller::{ControllerId, HatDirection};
use crate::test_utils::MockControllerHost;

const PAD: ControllerId = ControllerId(1);

fn settings() -> SharedSettings {
    SettingsStore::new(FrontendConfig::default(), None).shared()
}

fn generic_host() -> MockControllerHost {
    let mut host = MockControllerHost::new();
    host.connect(PAD, "Generic Pad", 4, 1, 0, 12);
    host
}

fn axis(index: u16, sign: Sign) -> BindingSource {
    BindingSource::bound(PAD, PhysicalInput::Axis { index, sign })
}

#[test]
fn test_resolve_stick_axis_full_and_rest() {
    let mut host = generic_host();
    let settings = settings();
    let mut registry = BindingRegistry::new();
    registry.refresh_controllers(&host, &settings, Instant::now());
    registry.commit_binding(
        0,
        BindAction::LStickRight,
        axis(0, Sign::Positive),
        &host,
        &settings,
        Instant::now(),
    );

    host.state_mut(PAD).axes[0] = 32767;
    assert_eq!(registry.resolve(0, BindAction::LStickRight, &host), 32767);

    host.state_mut(PAD).axes[0] = 0;
    assert_eq!(registry.resolve(0, BindAction::LStickRight, &host), 0);
}

#[test]
fn test_resolve_opposing_inputs_cancel() {
    let mut host = generic_host();
    let settings = settings();
    let now = Instant::now();
    let mut registry = BindingRegistry::new();
    registry.refresh_controllers(&host, &settings, now);

    registry.commit_binding(
        0,
        BindAction::LStickLeft,
        BindingSource::bound(PAD, PhysicalInput::Button { index: 0 }),
        &host,
        &settings,
        now,
    );
    registry.commit_binding(
        0,
        BindAction::LStickRight,
        BindingSource::bound(PAD, PhysicalInput::Button { index: 1 }),
        &host,
        &settings,
        now,
    );

    host.state_mut(PAD).buttons[0] = true;
    assert_eq!(registry.resolve(0, BindAction::LStickRight, &host), -FULL_SCALE);
    assert_eq!(registry.resolve(0, BindAction::LStickLeft, &host), -FULL_SCALE);

    host.state_mut(PAD).buttons[1] = true;
    assert_eq!(registry.resolve(0, BindAction::LStickRight, &host), 0);
}

#[test]
fn test_resolve_digital_projects_to_full_scale() {
    let mut host = generic_host();
    let settings = settings();
    let now = Instant::now();
    let mut registry = BindingRegistry::new();
    registry.refresh_controllers(&host, &settings, now);
    registry.commit_binding(0, BindAction::L2, axis(2, Sign::Positive), &host, &settings, now);

    host.state_mut(PAD).axes[2] = 8000;
    assert_eq!(registry.resolve(0, BindAction::L2, &host), 0);
    host.state_mut(PAD).axes[2] = 20000;
    assert_eq!(registry.resolve(0, BindAction::L2, &host), FULL_SCALE);
}

#[test]
fn test_resolve_unbound_and_bad_port() {
    let host = generic_host();
    let registry = BindingRegistry::new();
    assert_eq!(registry.resolve(0, BindAction::A, &host), 0);
    assert_eq!(registry.resolve(9, BindAction::A, &host), 0);
}

#[test]
fn test_ps4_template_applied() {
    let mut host = MockControllerHost::new();
    host.connect(PAD, "Wireless Controller", 6, 1, 0, 14);
    let settings = settings();
    let mut registry = BindingRegistry::new();

    assert!(registry.refresh_controllers(&host, &settings, Instant::now()));
    assert_eq!(registry.active_template(), Some("PS4"));
    assert_eq!(
        registry.binding(0, BindAction::Up),
        BindingSource::bound(
            PAD,
            PhysicalInput::Hat {
                index: 0,
                direction: HatDirection::UP
            }
        )
    );

    host.state_mut(PAD).buttons[1] = true;
    assert_eq!(registry.resolve(0, BindAction::B, &host), FULL_SCALE);

    let description = registry.describe(0, BindAction::B).unwrap();
    assert_eq!(description.controller, "Wireless Controller");
    assert_eq!(description.binding, "Cross Button (Down)");
}

#[test]
fn test_refresh_without_change_is_noop() {
    let host = generic_host();
    let settings = settings();
    let mut registry = BindingRegistry::new();
    assert!(registry.refresh_controllers(&host, &settings, Instant::now()));
    assert!(!registry.refresh_controllers(&host, &settings, Instant::now()));
}

#[test]
fn test_disconnect_invalidates_bindings() {
    let mut host = generic_host();
    host.connect(ControllerId(2), "Second Pad", 2, 0, 0, 4);
    let settings = settings();
    let now = Instant::now();
    let mut registry = BindingRegistry::new();
    registry.refresh_controllers(&host, &settings, now);

    let second = BindingSource::bound(ControllerId(2), PhysicalInput::Button { index: 3 });
    registry.commit_binding(1, BindAction::Start, second, &host, &settings, now);
    registry.commit_binding(0, BindAction::A, axis(1, Sign::Negative), &host, &settings, now);

    host.disconnect(ControllerId(2));
    assert!(registry.refresh_controllers(&host, &settings, now));

    assert_eq!(registry.binding(1, BindAction::Start), BindingSource::None);
    assert_eq!(registry.binding(0, BindAction::A), axis(1, Sign::Negative));
}

#[test]
fn test_commit_persists_and_snapshots() {
    let mut host = MockControllerHost::new();
    host.connect(PAD, "XInput Controller #1", 6, 0, 0, 14);
    let settings = settings();
    let now = Instant::now();
    let mut registry = BindingRegistry::new();
    registry.refresh_controllers(&host, &settings, now);
    assert_eq!(registry.active_template(), Some("XInput"));

    let binding = BindingSource::bound(PAD, PhysicalInput::Button { index: 12 });
    assert!(registry.commit_binding(0, BindAction::A, binding, &host, &settings, now));
    assert_eq!(registry.active_template(), None);

    let store = lock_settings(&settings);
    let input = &store.config().input;
    assert!(input.custom_controller_bindings);
    assert!(store.is_dirty());
    assert_eq!(
        input.bindings.get("bind_port_1_a").map(String::as_str),
        Some("XInput Controller #1|Button|13")
    );
    // the rest of the template got snapshotted
    assert_eq!(input.bindings.len(), BindAction::COUNT);
    assert_eq!(
        input.bindings.get("bind_port_1_lstickup").map(String::as_str),
        Some("XInput Controller #1|Axis|2|Negative")
    );
}

#[test]
fn test_commit_same_binding_is_noop() {
    let mut host = MockControllerHost::new();
    host.connect(PAD, "Wireless Controller", 6, 1, 0, 14);
    let settings = settings();
    let now = Instant::now();
    let mut registry = BindingRegistry::new();
    registry.refresh_controllers(&host, &settings, now);

    let current = registry.binding(0, BindAction::Start);
    assert!(!registry.commit_binding(0, BindAction::Start, current, &host, &settings, now));
    assert_eq!(registry.active_template(), Some("PS4"));
    assert!(!lock_settings(&settings).is_dirty());
}

#[test]
fn test_custom_bindings_loaded_on_refresh() {
    let host = generic_host();
    let mut config = FrontendConfig::default();
    config.input.custom_controller_bindings = true;
    config
        .input
        .bindings
        .insert("bind_port_2_x".to_string(), "Generic Pad|Hat|1|Left".to_string());
    config
        .input
        .bindings
        .insert("bind_port_2_y".to_string(), "Generic Pad|Button|40".to_string());
    let settings = SettingsStore::new(config, None).shared();

    let mut registry = BindingRegistry::new();
    registry.refresh_controllers(&host, &settings, Instant::now());

    assert_eq!(
        registry.binding(1, BindAction::X),
        BindingSource::bound(
            PAD,
            PhysicalInput::Hat {
                index: 0,
                direction: HatDirection::LEFT
            }
        )
    );
    // out of range index parses to nothing
    assert_eq!(registry.binding(1, BindAction::Y), BindingSource::None);
    assert!(lock_settings(&settings).config().input.custom_controller_bindings);
}

#[test]
fn test_template_equal_port1_bindings_are_dropped() {
    let mut host = MockControllerHost::new();
    host.connect(PAD, "XInput Controller #1", 6, 0, 0, 14);
    let settings = settings();
    let now = Instant::now();

    // Commit once to snapshot the template, then put the original value back.
    let mut registry = BindingRegistry::new();
    registry.refresh_controllers(&host, &settings, now);
    let original = registry.binding(0, BindAction::A);
    let other = BindingSource::bound(PAD, PhysicalInput::Button { index: 0 });
    registry.commit_binding(0, BindAction::A, other, &host, &settings, now);
    registry.commit_binding(0, BindAction::A, original, &host, &settings, now);

    let mut fresh = BindingRegistry::new();
    fresh.refresh_controllers(&host, &settings, now);

    let store = lock_settings(&settings);
    assert!(store.config().input.bindings.is_empty());
    assert!(!store.config().input.custom_controller_bindings);
    drop(store);
    assert_eq!(fresh.active_template(), Some("XInput"));
    assert_eq!(fresh.binding(0, BindAction::A), original);
}

#[test]
fn test_describe_disconnected_and_unbound() {
    let mut host = generic_host();
    let settings = settings();
    let now = Instant::now();
    let mut registry = BindingRegistry::new();
    registry.refresh_controllers(&host, &settings, now);

    assert_eq!(registry.describe(0, BindAction::A), None);

    registry.commit_binding(2, BindAction::A, axis(3, Sign::Negative), &host, &settings, now);
    let description = registry.describe(2, BindAction::A).unwrap();
    assert_eq!(description.controller, "Generic Pad");
    assert_eq!(description.binding, "Axis 4 Negative");

    // A controller the registry was not refreshed for has no known name.
    host.connect(ControllerId(5), "Late Pad", 1, 0, 0, 1);
    let late = BindingSource::bound(ControllerId(5), PhysicalInput::Button { index: 0 });
    registry.commit_binding(3, BindAction::B, late, &host, &settings, now);
    assert_eq!(
        registry.describe(3, BindAction::B).unwrap().controller,
        DISCONNECTED_CONTROLLER
    );

    host.disconnect(PAD);
    registry.refresh_controllers(&host, &settings, now);
    assert_eq!(registry.describe(2, BindAction::A), None);
}
