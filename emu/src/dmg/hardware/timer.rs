//! DIV/TIMA/TMA/TAC: the falling-edge interval timer.
//!
//! TIMA increments on a falling edge of `(selected DIV bit) AND (TAC enable)`.
//! The reload on overflow is delayed by one machine cycle, during which a
//! write to TIMA aborts the pending reload (but TMA is still copied in
//! silently on the following cycle) — this matches the Mooneye-GB timer
//! test suite exactly.

use crate::bitwise::Bits;
use serde::{Deserialize, Serialize};

const TAC_BIT_SELECT: [u8; 4] = [9, 3, 5, 7];

#[derive(Default, Serialize, Deserialize)]
pub struct Timer {
    divider: u16,
    pub tima: u8,
    pub tma: u8,
    pub tac: u8,
    prev_tima_inc: bool,
    overflow_pending: bool,
}

impl Timer {
    #[must_use]
    pub const fn div(&self) -> u8 {
        (self.divider >> 8) as u8
    }

    pub const fn reset_div(&mut self) {
        self.divider = 0;
    }

    const fn selected_bit(&self) -> bool {
        self.divider.is_bit_on(TAC_BIT_SELECT[(self.tac & 0b11) as usize])
    }

    const fn enabled(&self) -> bool {
        self.tac & 0b100 != 0
    }

    /// Advances the timer by one machine cycle (4 T-states). Returns `true`
    /// if a Timer interrupt should be requested this cycle.
    pub fn step(&mut self) -> bool {
        let mut request_irq = false;

        if self.overflow_pending {
            self.overflow_pending = false;
            self.tima = self.tma;
            request_irq = true;
        }

        self.divider = self.divider.wrapping_add(4);

        let tima_inc = self.enabled() && self.selected_bit();
        if self.prev_tima_inc && !tima_inc {
            let (result, overflowed) = self.tima.overflowing_add(1);
            self.tima = result;
            if overflowed {
                self.overflow_pending = true;
            }
        }
        self.prev_tima_inc = tima_inc;

        request_irq
    }

    /// A write to TIMA during the reload-pending cycle aborts the reload
    /// (the write wins) without suppressing it permanently.
    pub const fn write_tima(&mut self, value: u8) {
        self.tima = value;
        self.overflow_pending = false;
    }
}
