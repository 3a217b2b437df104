//! Built-in port 1 layouts for well-known controllers

use super::action::BindAction;
use super::binding::Sign::{Negative as NEG, Positive as POS};
use super::binding::{BindingSource, PhysicalInput, Sign};
use super::controller::{ControllerId, HatDirection, PhysicalController};

const XINPUT_PREFIX: &str = "XInput Controller #";
const PS4_NAME: &str = "Wireless Controller";

/// A default layout with friendly per-action names.
#[derive(Debug)]
pub struct ControllerTemplate {
    pub name: &'static str,
    inputs: [PhysicalInput; BindAction::COUNT],
    labels: [&'static str; BindAction::COUNT],
}

impl ControllerTemplate {
    pub fn input(&self, action: BindAction) -> PhysicalInput {
        self.inputs[action.index()]
    }

    /// Friendly name of the control an action is mapped to.
    pub fn label(&self, action: BindAction) -> &'static str {
        self.labels[action.index()]
    }

    /// The full port table bound to one controller.
    pub fn bindings(&self, controller: ControllerId) -> [BindingSource; BindAction::COUNT] {
        self.inputs.map(|input| BindingSource::bound(controller, input))
    }
}

const fn button(index: u16) -> PhysicalInput {
    PhysicalInput::Button { index }
}

const fn axis(index: u16, sign: Sign) -> PhysicalInput {
    PhysicalInput::Axis { index, sign }
}

const fn hat(direction: HatDirection) -> PhysicalInput {
    PhysicalInput::Hat {
        index: 0,
        direction,
    }
}

pub static XINPUT: ControllerTemplate = ControllerTemplate {
    name: "XInput",
    inputs: [
        // dpad
        button(0),
        button(1),
        button(2),
        button(3),
        // B A Y X
        button(10),
        button(11),
        button(12),
        button(13),
        // select start L R
        button(5),
        button(4),
        button(8),
        button(9),
        // L2 R2 L3 R3
        axis(4, POS),
        axis(5, POS),
        button(6),
        button(7),
        // left stick
        axis(1, NEG),
        axis(1, POS),
        axis(0, NEG),
        axis(0, POS),
        // right stick
        axis(3, NEG),
        axis(3, POS),
        axis(2, NEG),
        axis(2, POS),
    ],
    labels: [
        "D-Pad Up",
        "D-Pad Down",
        "D-Pad Left",
        "D-Pad Right",
        "A Button (Down)",
        "B Button (Right)",
        "X Button (Left)",
        "Y Button (Up)",
        "Select / View",
        "Start / Menu",
        "Left Bumper",
        "Right Bumper",
        "Left Trigger",
        "Right Trigger",
        "Left Stick Press",
        "Right Stick Press",
        "Left Stick Up",
        "Left Stick Down",
        "Left Stick Left",
        "Left Stick Right",
        "Right Stick Up",
        "Right Stick Down",
        "Right Stick Left",
        "Right Stick Right",
    ],
};

pub static PS4: ControllerTemplate = ControllerTemplate {
    name: "PS4",
    inputs: [
        hat(HatDirection::UP),
        hat(HatDirection::DOWN),
        hat(HatDirection::LEFT),
        hat(HatDirection::RIGHT),
        button(1),
        button(2),
        button(0),
        button(3),
        button(8),
        button(9),
        button(4),
        button(5),
        button(6),
        button(7),
        button(10),
        button(11),
        axis(2, NEG),
        axis(2, POS),
        axis(3, NEG),
        axis(3, POS),
        axis(0, NEG),
        axis(0, POS),
        axis(1, NEG),
        axis(1, POS),
    ],
    labels: [
        "D-Pad Up",
        "D-Pad Down",
        "D-Pad Left",
        "D-Pad Right",
        "Cross Button (Down)",
        "Circle Button (Right)",
        "Square Button (Left)",
        "Triangle Button (Up)",
        "Select / Create",
        "Start / Options",
        "L1",
        "R1",
        "L2",
        "R2",
        "Left Stick Press",
        "Right Stick Press",
        "Left Stick Up",
        "Left Stick Down",
        "Left Stick Left",
        "Left Stick Right",
        "Right Stick Up",
        "Right Stick Down",
        "Right Stick Left",
        "Right Stick Right",
    ],
};

fn is_ps4_layout(c: &PhysicalController) -> bool {
    c.name == PS4_NAME && c.axes == 6 && c.hats == 1 && c.balls == 0 && c.buttons == 14
}

/// Pick the template for the connected controllers.
///
/// The lowest-numbered XInput controller wins; otherwise the first controller
/// with the exact PS4 layout.
pub fn select_template(
    controllers: &[PhysicalController],
) -> Option<(&'static ControllerTemplate, ControllerId)> {
    let xinput = controllers
        .iter()
        .filter_map(|c| c.name.strip_prefix(XINPUT_PREFIX).map(|n| (n, c.id)))
        .min_by(|a, b| a.0.cmp(b.0));
    if let Some((_, id)) = xinput {
        return Some((&XINPUT, id));
    }
    controllers
        .iter()
        .find(|c| is_ps4_layout(c))
        .map(|c| (&PS4, c.id))
}
