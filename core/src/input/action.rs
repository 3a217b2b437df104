//! Logical emulator actions a port exposes

/// Number of controller ports.
pub const PORT_COUNT: usize = 4;

/// Libretro device id for the digital joypad.
pub const DEVICE_JOYPAD: u32 = 1;
/// Libretro device id for the analog sticks.
pub const DEVICE_ANALOG: u32 = 5;

const ANALOG_INDEX_LEFT: u32 = 0;
const ANALOG_INDEX_RIGHT: u32 = 1;
const ANALOG_ID_X: u32 = 0;

/// A logical input of an emulated controller.
///
/// The first sixteen are digital; the last eight form four negative/positive
/// stick pairs, negative member first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum BindAction {
    Up,
    Down,
    Left,
    Right,
    B,
    A,
    Y,
    X,
    Select,
    Start,
    L,
    R,
    L2,
    R2,
    L3,
    R3,
    LStickUp,
    LStickDown,
    LStickLeft,
    LStickRight,
    RStickUp,
    RStickDown,
    RStickLeft,
    RStickRight,
}

impl BindAction {
    pub const COUNT: usize = 24;

    pub const ALL: [BindAction; Self::COUNT] = [
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::B,
        Self::A,
        Self::Y,
        Self::X,
        Self::Select,
        Self::Start,
        Self::L,
        Self::R,
        Self::L2,
        Self::R2,
        Self::L3,
        Self::R3,
        Self::LStickUp,
        Self::LStickDown,
        Self::LStickLeft,
        Self::LStickRight,
        Self::RStickUp,
        Self::RStickDown,
        Self::RStickLeft,
        Self::RStickRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Name used in `bind_port_<n>_<name>` settings keys.
    pub fn config_name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::B => "b",
            Self::A => "a",
            Self::Y => "y",
            Self::X => "x",
            Self::Select => "select",
            Self::Start => "start",
            Self::L => "l",
            Self::R => "r",
            Self::L2 => "l2",
            Self::R2 => "r2",
            Self::L3 => "l3",
            Self::R3 => "r3",
            Self::LStickUp => "lstickup",
            Self::LStickDown => "lstickdown",
            Self::LStickLeft => "lstickleft",
            Self::LStickRight => "lstickright",
            Self::RStickUp => "rstickup",
            Self::RStickDown => "rstickdown",
            Self::RStickLeft => "rstickleft",
            Self::RStickRight => "rstickright",
        }
    }

    pub fn is_analog(self) -> bool {
        self >= Self::LStickUp
    }

    /// The (negative, positive) stick pair this action belongs to.
    pub fn analog_pair(self) -> Option<(BindAction, BindAction)> {
        if !self.is_analog() {
            return None;
        }
        let base = self.index() & !1;
        Some((Self::ALL[base], Self::ALL[base + 1]))
    }

    /// Map a libretro input query to an action.
    ///
    /// Joypad queries use `id`; analog queries use `index` (left/right stick),
    /// `id` (X/Y) and the requested half of the axis. The analog button index
    /// and unknown ids map to nothing.
    pub fn from_device(device: u32, index: u32, id: u32, axis_positive: bool) -> Option<Self> {
        match device {
            DEVICE_JOYPAD => match id {
                0 => Some(Self::B),
                1 => Some(Self::Y),
                2 => Some(Self::Select),
                3 => Some(Self::Start),
                4 => Some(Self::Up),
                5 => Some(Self::Down),
                6 => Some(Self::Left),
                7 => Some(Self::Right),
                8 => Some(Self::A),
                9 => Some(Self::X),
                10 => Some(Self::L),
                11 => Some(Self::R),
                12 => Some(Self::L2),
                13 => Some(Self::R2),
                14 => Some(Self::L3),
                15 => Some(Self::R3),
                _ => None,
            },
            DEVICE_ANALOG => {
                let (up, down, left, right) = match index {
                    ANALOG_INDEX_LEFT => (
                        Self::LStickUp,
                        Self::LStickDown,
                        Self::LStickLeft,
                        Self::LStickRight,
                    ),
                    ANALOG_INDEX_RIGHT => (
                        Self::RStickUp,
                        Self::RStickDown,
                        Self::RStickLeft,
                        Self::RStickRight,
                    ),
                    _ => return None,
                };
                Some(match (id == ANALOG_ID_X, axis_positive) {
                    (true, true) => right,
                    (true, false) => left,
                    (false, true) => down,
                    (false, false) => up,
                })
            }
            _ => None,
        }
    }

    /// Settings key for this action on a 0-based port.
    pub fn settings_key(self, port: usize) -> String {
        format!("bind_port_{}_{}", port + 1, self.config_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_index_order() {
        for (i, action) in BindAction::ALL.iter().enumerate() {
            assert_eq!(action.index(), i);
            assert_eq!(BindAction::from_index(i), Some(*action));
        }
        assert_eq!(BindAction::from_index(BindAction::COUNT), None);
    }

    #[test]
    fn test_analog_pairs() {
        assert_eq!(BindAction::A.analog_pair(), None);
        assert_eq!(
            BindAction::LStickRight.analog_pair(),
            Some((BindAction::LStickLeft, BindAction::LStickRight))
        );
        assert_eq!(
            BindAction::RStickUp.analog_pair(),
            Some((BindAction::RStickUp, BindAction::RStickDown))
        );
    }

    #[test]
    fn test_from_device() {
        assert_eq!(
            BindAction::from_device(DEVICE_JOYPAD, 0, 8, false),
            Some(BindAction::A)
        );
        assert_eq!(
            BindAction::from_device(DEVICE_ANALOG, 0, 0, true),
            Some(BindAction::LStickRight)
        );
        assert_eq!(
            BindAction::from_device(DEVICE_ANALOG, 1, 1, false),
            Some(BindAction::RStickUp)
        );
        // analog button index
        assert_eq!(BindAction::from_device(DEVICE_ANALOG, 2, 0, false), None);
        assert_eq!(BindAction::from_device(2, 0, 0, false), None);
    }

    #[test]
    fn test_settings_key() {
        assert_eq!(BindAction::LStickUp.settings_key(0), "bind_port_1_lstickup");
        assert_eq!(BindAction::Start.settings_key(3), "bind_port_4_start");
    }
}
