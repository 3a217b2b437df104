//! Physical controllers as reported by the host

use bitflags::bitflags;

/// Stable identity of a connected controller.
///
/// Identities are never reused while the controller stays connected; a binding
/// holds one as a weak reference and is invalidated when the controller goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(pub u32);

bitflags! {
    /// Hat switch directions, as a bitmask of the pressed directions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HatDirection: u8 {
        const UP = 1;
        const RIGHT = 2;
        const DOWN = 4;
        const LEFT = 8;
    }
}

/// Kind of physical input on a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Axis,
    Hat,
    Ball,
    Button,
}

impl InputKind {
    /// Kinds in canonical enumeration order.
    pub const ALL: [InputKind; 4] = [Self::Axis, Self::Hat, Self::Ball, Self::Button];

    pub fn label(self) -> &'static str {
        match self {
            Self::Axis => "Axis",
            Self::Hat => "Hat",
            Self::Ball => "Ball",
            Self::Button => "Button",
        }
    }

    /// Case-insensitive inverse of [`InputKind::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(label))
    }
}

/// A connected controller and its capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalController {
    pub id: ControllerId,
    pub name: String,
    pub axes: usize,
    pub hats: usize,
    pub balls: usize,
    pub buttons: usize,
}

impl PhysicalController {
    /// Number of inputs of the given kind.
    pub fn count(&self, kind: InputKind) -> usize {
        match kind {
            InputKind::Axis => self.axes,
            InputKind::Hat => self.hats,
            InputKind::Ball => self.balls,
            InputKind::Button => self.buttons,
        }
    }
}

/// Snapshot of a controller's inputs for the current frame.
///
/// Out-of-range reads return the resting value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    /// Axis positions, -32768..=32767
    pub axes: Vec<i16>,
    pub hats: Vec<HatDirection>,
    /// Relative ball motion since the last poll, (dx, dy)
    pub balls: Vec<(i16, i16)>,
    pub buttons: Vec<bool>,
}

impl ControllerState {
    /// Resting state sized for a controller.
    pub fn for_controller(controller: &PhysicalController) -> Self {
        Self {
            axes: vec![0; controller.axes],
            hats: vec![HatDirection::empty(); controller.hats],
            balls: vec![(0, 0); controller.balls],
            buttons: vec![false; controller.buttons],
        }
    }

    pub fn axis(&self, index: usize) -> i16 {
        self.axes.get(index).copied().unwrap_or(0)
    }

    pub fn hat(&self, index: usize) -> HatDirection {
        self.hats.get(index).copied().unwrap_or_default()
    }

    pub fn ball(&self, index: usize) -> (i16, i16) {
        self.balls.get(index).copied().unwrap_or((0, 0))
    }

    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }
}

/// Host-side controller access.
///
/// The gilrs backend implements this for real devices; tests script it.
pub trait ControllerHost {
    /// Currently connected controllers, in a stable order.
    fn controllers(&self) -> &[PhysicalController];

    /// Current input state of a controller, `None` once it is disconnected.
    fn state(&self, id: ControllerId) -> Option<&ControllerState>;

    /// Look up a connected controller by identity.
    fn controller(&self, id: ControllerId) -> Option<&PhysicalController> {
        self.controllers().iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(InputKind::from_label("axis"), Some(InputKind::Axis));
        assert_eq!(InputKind::from_label("BUTTON"), Some(InputKind::Button));
        assert_eq!(InputKind::from_label("Trigger"), None);
    }

    #[test]
    fn test_state_out_of_range_is_resting() {
        let state = ControllerState::default();
        assert_eq!(state.axis(3), 0);
        assert_eq!(state.hat(0), HatDirection::empty());
        assert_eq!(state.ball(1), (0, 0));
        assert!(!state.button(7));
    }
}
