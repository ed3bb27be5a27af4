//! SB/SC (0xFF01-0xFF02): serial transfer stub.
//!
//! Link-cable multiplayer emulation is out of scope (spec Non-goals); this
//! only reproduces the transfer-complete interrupt timing for programs that
//! poll it, by completing every transfer with the shift register unchanged
//! (as if no device were connected).

use serde::{Deserialize, Serialize};

#[derive(Default, Serialize, Deserialize)]
pub struct Serial {
    pub data: u8,
    pub control: u8,
    cycles_until_done: u16,
}

impl Serial {
    pub const fn write_control(&mut self, value: u8) {
        self.control = value & 0x83;
        if self.control & 0x81 == 0x81 {
            // Internal clock, transfer requested: 8 bits at 8192 Hz.
            self.cycles_until_done = 8 * 512;
        }
    }

    /// Advances by one machine cycle. Returns `true` if the transfer just
    /// completed and a Serial interrupt should be requested.
    pub const fn step(&mut self, cycles: u16) -> bool {
        if self.cycles_until_done == 0 {
            return false;
        }
        self.cycles_until_done = self.cycles_until_done.saturating_sub(cycles);
        if self.cycles_until_done == 0 {
            self.control &= !0x80;
            return true;
        }
        false
    }
}
