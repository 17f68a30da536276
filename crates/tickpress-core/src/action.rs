use std::fmt;

/// Represents the action state of a key event.
///
/// From `evtest` output, the "magic numbers" for assignment to enums:
///   0 == 'released'
///   1 == 'pressed'
///   2 == 'repeated'
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Action {
    Release = 0,
    Press = 1,
    Repeat = 2,
}

impl Action {
    /// Returns true only for the initial key-down, never for autorepeat.
    ///
    /// Hotkeys fire on this edge so holding a trigger key does not
    /// re-arm or re-prompt.
    pub fn just_pressed(self) -> bool {
        matches!(self, Action::Press)
    }

    /// Create Action from i32 value (from evdev)
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Action::Release),
            1 => Some(Action::Press),
            2 => Some(Action::Repeat),
            _ => None,
        }
    }

    /// Convert Action to its i32 representation
    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Release => write!(f, "release"),
            Action::Press => write!(f, "press"),
            Action::Repeat => write!(f, "repeat"),
        }
    }
}
