//! P1/JOYP (0xFF00): button matrix selection and latch.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default)]
pub struct ButtonState {
    pub right: bool,
    pub left: bool,
    pub up: bool,
    pub down: bool,
    pub a: bool,
    pub b: bool,
    pub select: bool,
    pub start: bool,
}

impl ButtonState {
    #[must_use]
    pub const fn any_pressed(&self) -> bool {
        self.right
            || self.left
            || self.up
            || self.down
            || self.a
            || self.b
            || self.select
            || self.start
    }
}

#[derive(Default, Serialize, Deserialize)]
pub struct Joypad {
    select_buttons: bool,
    select_dpad: bool,
    #[serde(skip)]
    state: ButtonStateRaw,
    #[serde(skip)]
    line_active: bool,
}

/// Plain-data mirror of [`ButtonState`] so the register can derive `serde`
/// without pulling the host input type into (de)serialization.
#[derive(Clone, Copy, Default)]
struct ButtonStateRaw(u8);

impl Joypad {
    pub fn set_buttons(&mut self, state: ButtonState) {
        let mut bits = 0u8;
        bits |= u8::from(state.right);
        bits |= u8::from(state.left) << 1;
        bits |= u8::from(state.up) << 2;
        bits |= u8::from(state.down) << 3;
        bits |= u8::from(state.a) << 4;
        bits |= u8::from(state.b) << 5;
        bits |= u8::from(state.select) << 6;
        bits |= u8::from(state.start) << 7;
        self.state = ButtonStateRaw(bits);
    }

    pub const fn write(&mut self, value: u8) {
        self.select_buttons = value & 0x20 == 0;
        self.select_dpad = value & 0x10 == 0;
    }

    #[must_use]
    pub const fn read(&self) -> u8 {
        let mut lower = 0x0F;
        if self.select_dpad {
            lower &= !(self.state.0 & 0x0F);
        }
        if self.select_buttons {
            lower &= !((self.state.0 >> 4) & 0x0F);
        }
        0xC0 | ((u8::from(!self.select_buttons)) << 5)
            | ((u8::from(!self.select_dpad)) << 4)
            | lower
    }

    /// True if any of the currently-selected lines read low (pressed).
    /// Used to detect the STOP-with-no-joypad-line hang condition.
    #[must_use]
    pub const fn any_selected_line_active(&self) -> bool {
        (self.select_dpad && (self.state.0 & 0x0F != 0))
            || (self.select_buttons && (self.state.0 >> 4) & 0x0F != 0)
    }

    /// Recomputes the selected-line signal and returns `true` on the
    /// high-to-low transition of a selected line (one interrupt per press,
    /// not one per cycle held).
    pub fn update_signal(&mut self) -> bool {
        let level = self.any_selected_line_active();
        let falling_edge = level && !self.line_active;
        self.line_active = level;
        falling_edge
    }
}
