//! Binding sources: which physical input drives a logical action
//!
//! A [`BindingSource`] names one directional input on one controller and knows
//! how to evaluate it (digitally or as an analog magnitude) and how to persist
//! itself as a `|`-separated config string:
//!
//! ```text
//! Wireless Controller|Axis|3|Negative
//! XInput Controller #1|Hat|1|Up
//! Trackball|Ball|1|X|Positive
//! Wireless Controller|Button|2
//! ```

use std::fmt;

use super::controller::{
    ControllerHost, ControllerId, ControllerState, HatDirection, InputKind, PhysicalController,
};

/// Full-scale analog magnitude.
pub const FULL_SCALE: i16 = i16::MAX;

/// Axis deflection at which an axis counts as pressed.
pub const AXIS_PRESS_THRESHOLD: i32 = 12000;

/// Ball motion is amplified by this factor before thresholding.
const BALL_SCALE: i32 = 10;

/// Direction along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Negative,
    Positive,
}

impl Sign {
    fn factor(self) -> i32 {
        match self {
            Self::Negative => -1,
            Self::Positive => 1,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Negative => "Negative",
            Self::Positive => "Positive",
        }
    }

    /// Anything starting with `n` is negative.
    fn from_word(word: Option<&str>) -> Self {
        if first_letter(word) == Some('n') {
            Self::Negative
        } else {
            Self::Positive
        }
    }
}

/// Which relative axis of a trackball.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BallAxis {
    X,
    Y,
}

/// One directional physical input on a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalInput {
    Axis { index: u16, sign: Sign },
    /// `direction` holds exactly one of the [`HatDirection`] flags.
    Hat { index: u16, direction: HatDirection },
    Ball { index: u16, axis: BallAxis, sign: Sign },
    Button { index: u16 },
}

impl PhysicalInput {
    pub fn kind(&self) -> InputKind {
        match self {
            Self::Axis { .. } => InputKind::Axis,
            Self::Hat { .. } => InputKind::Hat,
            Self::Ball { .. } => InputKind::Ball,
            Self::Button { .. } => InputKind::Button,
        }
    }

    pub fn index(&self) -> usize {
        match *self {
            Self::Axis { index, .. }
            | Self::Hat { index, .. }
            | Self::Ball { index, .. }
            | Self::Button { index } => index as usize,
        }
    }

    /// Evaluate against a controller snapshot.
    ///
    /// Digital evaluation yields 0 or 1, analog evaluation 0..=[`FULL_SCALE`].
    pub fn evaluate(&self, state: &ControllerState, analog: bool) -> i16 {
        let full = |on: bool| match (on, analog) {
            (false, _) => 0,
            (true, false) => 1,
            (true, true) => FULL_SCALE,
        };
        match *self {
            Self::Axis { index, sign } => {
                let v = state.axis(index as usize) as i32 * sign.factor();
                if analog {
                    v.clamp(0, FULL_SCALE as i32) as i16
                } else {
                    (v >= AXIS_PRESS_THRESHOLD) as i16
                }
            }
            Self::Hat { index, direction } => full(state.hat(index as usize).intersects(direction)),
            Self::Ball { index, axis, sign } => {
                let (dx, dy) = state.ball(index as usize);
                let delta = match axis {
                    BallAxis::X => dx,
                    BallAxis::Y => dy,
                };
                let v = delta as i32 * sign.factor() * BALL_SCALE;
                if analog {
                    v.clamp(0, FULL_SCALE as i32) as i16
                } else {
                    (v > BALL_SCALE) as i16
                }
            }
            Self::Button { index } => full(state.button(index as usize)),
        }
    }
}

fn hat_label(direction: HatDirection) -> &'static str {
    if direction.contains(HatDirection::UP) {
        "Up"
    } else if direction.contains(HatDirection::RIGHT) {
        "Right"
    } else if direction.contains(HatDirection::DOWN) {
        "Down"
    } else {
        "Left"
    }
}

impl fmt::Display for PhysicalInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.index() + 1;
        match *self {
            Self::Axis { sign, .. } => write!(f, "Axis {} {}", n, sign.label()),
            Self::Hat { direction, .. } => write!(f, "Hat {} {}", n, hat_label(direction)),
            Self::Ball { axis, sign, .. } => {
                let axis = match axis {
                    BallAxis::X => 'X',
                    BallAxis::Y => 'Y',
                };
                write!(f, "Ball {} {} {}", n, axis, sign.label())
            }
            Self::Button { .. } => write!(f, "Button {}", n),
        }
    }
}

/// Physical source bound to a logical action slot.
///
/// Equality compares only the semantic fields, so re-capturing the input
/// already in a slot is detected reliably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BindingSource {
    #[default]
    None,
    Bound {
        controller: ControllerId,
        input: PhysicalInput,
    },
}

impl BindingSource {
    pub fn bound(controller: ControllerId, input: PhysicalInput) -> Self {
        Self::Bound { controller, input }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound { .. })
    }

    pub fn controller(&self) -> Option<ControllerId> {
        match self {
            Self::None => None,
            Self::Bound { controller, .. } => Some(*controller),
        }
    }

    pub fn input(&self) -> Option<&PhysicalInput> {
        match self {
            Self::None => None,
            Self::Bound { input, .. } => Some(input),
        }
    }

    /// Current value of the source, 0 when unbound or the controller is gone.
    pub fn value<H: ControllerHost + ?Sized>(&self, host: &H, analog: bool) -> i16 {
        match self {
            Self::None => 0,
            Self::Bound { controller, input } => host
                .state(*controller)
                .map_or(0, |state| input.evaluate(state, analog)),
        }
    }

    /// Config string for this binding.
    ///
    /// Returns `None` for an unbound slot or when the controller is no longer listed.
    pub fn to_config(&self, controllers: &[PhysicalController]) -> Option<String> {
        let Self::Bound { controller, input } = self else {
            return None;
        };
        let joy = controllers.iter().find(|c| c.id == *controller)?;
        Some(format!("{}|{}", joy.name, input.to_string().replace(' ', "|")))
    }

    /// Parse a config string against the connected controllers.
    ///
    /// The controller is matched by name and the index is re-validated against
    /// its current capabilities; anything that does not fit parses to `None`.
    pub fn from_config(config: &str, controllers: &[PhysicalController]) -> Self {
        let parts: Vec<&str> = config.split('|').collect();
        if parts.len() < 3 {
            return Self::None;
        }
        let n: u32 = match parts[2].trim().parse() {
            Ok(n) if n > 0 => n,
            _ => return Self::None,
        };
        let Some(kind) = InputKind::from_label(parts[1]) else {
            return Self::None;
        };
        let Ok(index) = u16::try_from(n - 1) else {
            return Self::None;
        };

        let input = match kind {
            InputKind::Axis => PhysicalInput::Axis {
                index,
                sign: Sign::from_word(parts.get(3).copied()),
            },
            InputKind::Hat => PhysicalInput::Hat {
                index,
                direction: match first_letter(parts.get(3).copied()) {
                    Some('u') => HatDirection::UP,
                    Some('r') => HatDirection::RIGHT,
                    Some('d') => HatDirection::DOWN,
                    _ => HatDirection::LEFT,
                },
            },
            InputKind::Ball => PhysicalInput::Ball {
                index,
                axis: if first_letter(parts.get(3).copied()) == Some('x') {
                    BallAxis::X
                } else {
                    BallAxis::Y
                },
                sign: Sign::from_word(parts.get(4).copied()),
            },
            InputKind::Button => PhysicalInput::Button { index },
        };

        let Some(joy) = controllers.iter().find(|c| c.name == parts[0]) else {
            tracing::debug!("Binding '{}' names no connected controller", config);
            return Self::None;
        };
        if input.index() >= joy.count(kind) {
            tracing::debug!(
                "Binding '{}' out of range for '{}' ({} {}s)",
                config,
                joy.name,
                joy.count(kind),
                kind.label().to_lowercase()
            );
            return Self::None;
        }
        Self::bound(joy.id, input)
    }
}

fn first_letter(word: Option<&str>) -> Option<char> {
    word.and_then(|w| w.chars().next())
        .map(|c| c.to_ascii_lowercase())
}
