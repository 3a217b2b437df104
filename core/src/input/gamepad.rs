//! Gamepad controller host backed by gilrs
//!
//! gilrs normalises every pad to the XInput layout but reports the pad's own
//! product name, so the XInput template (matched on `XInput Controller #n`)
//! only applies when the platform names pads that way.

use gilrs::{Axis, Button, Gilrs};
use hashbrown::HashMap;

use super::controller::{ControllerHost, ControllerId, ControllerState, PhysicalController};

#[derive(Debug, Clone, Copy)]
enum AxisSource {
    /// Stick axis, optionally inverted
    Stick(Axis, bool),
    /// Analog trigger, reported by gilrs as a button value
    Trigger(Button),
}

/// Axes in reported order: left stick, right stick, triggers.
///
/// Stick Y is flipped so that up reads negative.
const AXES: [AxisSource; 6] = [
    AxisSource::Stick(Axis::LeftStickX, false),
    AxisSource::Stick(Axis::LeftStickY, true),
    AxisSource::Stick(Axis::RightStickX, false),
    AxisSource::Stick(Axis::RightStickY, true),
    AxisSource::Trigger(Button::LeftTrigger2),
    AxisSource::Trigger(Button::RightTrigger2),
];

/// Buttons in reported order (XInput layout).
const BUTTONS: [Button; 14] = [
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Start,
    Button::Select,
    Button::LeftThumb,
    Button::RightThumb,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::South,
    Button::East,
    Button::West,
    Button::North,
];

fn scale_axis(value: f32, invert: bool) -> i16 {
    let v = if invert { -value } else { value };
    (v.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Trigger travel `0.0..=1.0` as a positive axis; released when unknown.
fn trigger_axis(value: Option<f32>) -> i16 {
    scale_axis(value.unwrap_or(0.0).max(0.0), false)
}

fn read_axis(gamepad: &gilrs::Gamepad<'_>, source: AxisSource) -> i16 {
    match source {
        AxisSource::Stick(axis, invert) => scale_axis(gamepad.value(axis), invert),
        AxisSource::Trigger(button) => {
            trigger_axis(gamepad.button_data(button).map(|data| data.value()))
        }
    }
}

/// Connected gamepads and their latest state.
pub struct GilrsHost {
    /// None if initialization failed
    gilrs: Option<Gilrs>,
    controllers: Vec<PhysicalController>,
    states: HashMap<ControllerId, ControllerState>,
    listed: bool,
}

impl Default for GilrsHost {
    fn default() -> Self {
        Self::new()
    }
}

impl GilrsHost {
    pub fn new() -> Self {
        let gilrs = match Gilrs::new() {
            Ok(g) => Some(g),
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize gamepad support: {}. Gamepads will not be available.",
                    e
                );
                None
            }
        };
        Self {
            gilrs,
            controllers: Vec::new(),
            states: HashMap::new(),
            listed: false,
        }
    }

    /// Drain gamepad events and snapshot every connected gamepad.
    ///
    /// Returns `true` when the controller list changed, which is the cue to
    /// refresh the binding registry.
    pub fn poll(&mut self) -> bool {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return false;
        };

        let mut changed = !self.listed;
        while let Some(event) = gilrs.next_event() {
            match event.event {
                gilrs::EventType::Connected => {
                    tracing::info!("Gamepad {} connected", event.id);
                    changed = true;
                }
                gilrs::EventType::Disconnected => {
                    tracing::info!("Gamepad {} disconnected", event.id);
                    changed = true;
                }
                _ => {}
            }
        }

        if changed {
            self.controllers = gilrs
                .gamepads()
                .map(|(id, gamepad)| PhysicalController {
                    id: ControllerId(usize::from(id) as u32),
                    name: gamepad.name().to_string(),
                    axes: AXES.len(),
                    hats: 0,
                    balls: 0,
                    buttons: BUTTONS.len(),
                })
                .collect();
            self.states.clear();
            self.listed = true;
        }

        for (id, gamepad) in gilrs.gamepads() {
            let state = ControllerState {
                axes: AXES
                    .iter()
                    .map(|&source| read_axis(&gamepad, source))
                    .collect(),
                hats: Vec::new(),
                balls: Vec::new(),
                buttons: BUTTONS.iter().map(|&b| gamepad.is_pressed(b)).collect(),
            };
            self.states.insert(ControllerId(usize::from(id) as u32), state);
        }
        changed
    }
}

impl ControllerHost for GilrsHost {
    fn controllers(&self) -> &[PhysicalController] {
        &self.controllers
    }

    fn state(&self, id: ControllerId) -> Option<&ControllerState> {
        self.states.get(&id)
    }
}
