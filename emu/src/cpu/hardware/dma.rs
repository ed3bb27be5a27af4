use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// When a channel starts moving words, relative to the PPU.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StartTiming {
    Immediate,
    VBlank,
    HBlank,
    /// Sound FIFO / video capture triggers; not driven by this core.
    Special,
}

#[derive(Default, Serialize, Deserialize, Clone)]
pub struct DmaRegisters {
    pub source_address: u32,
    pub destination_address: u32,
    pub word_count: u16,
    pub control: u16,

    /// Live copies advanced one transfer unit at a time; reloaded from
    /// `source_address`/`destination_address` when a channel (re)starts.
    pub internal_source: u32,
    pub internal_dest: u32,
    internal_count: u32,
    /// Set while a channel is armed/running, cleared on completion (unless
    /// repeat is set, in which case it is re-armed instead of cleared).
    active: bool,
    /// Whether this channel has completed at least one run since its
    /// destination address was last written. Plain increment/decrement
    /// destination control only reloads from `destination_address` on the
    /// first run of a repeating transfer, not on every repeat.
    ever_started: bool,
}

pub type Registers = DmaRegisters;

/// Destination/source address control field values (bits 5-6 / 7-8).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AddrControl {
    Increment,
    Decrement,
    Fixed,
    IncrementReload,
}

impl AddrControl {
    const fn from_bits(bits: u16) -> Self {
        match bits {
            0 => Self::Increment,
            1 => Self::Decrement,
            2 => Self::Fixed,
            _ => Self::IncrementReload,
        }
    }
}

impl DmaRegisters {
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.control.get_bit(15)
    }

    #[must_use]
    pub const fn repeat(&self) -> bool {
        self.control.get_bit(9)
    }

    #[must_use]
    pub const fn is_32bit(&self) -> bool {
        self.control.get_bit(10)
    }

    #[must_use]
    pub const fn irq_enabled(&self) -> bool {
        self.control.get_bit(14)
    }

    #[must_use]
    pub fn start_timing(&self) -> StartTiming {
        match (self.control >> 12) & 0b11 {
            0 => StartTiming::Immediate,
            1 => StartTiming::VBlank,
            2 => StartTiming::HBlank,
            _ => StartTiming::Special,
        }
    }

    fn dest_control(&self) -> AddrControl {
        AddrControl::from_bits((self.control >> 5) & 0b11)
    }

    fn source_control(&self) -> AddrControl {
        AddrControl::from_bits((self.control >> 7) & 0b11)
    }

    /// A word count of zero means "maximum transfer size" on real hardware.
    const fn effective_word_count(&self, max_count: u32) -> u32 {
        if self.word_count == 0 {
            max_count
        } else {
            self.word_count as u32
        }
    }

    /// Arms the channel: reloads the internal source/count registers, and
    /// the internal dest register too unless this is a repeat run with a
    /// plain increment/decrement destination control (which continues from
    /// wherever the previous run left off).
    fn arm(&mut self, max_count: u32) {
        self.internal_source = self.source_address;
        if !self.ever_started || self.dest_control() == AddrControl::IncrementReload {
            self.internal_dest = self.destination_address;
        }
        self.internal_count = self.effective_word_count(max_count);
        self.active = true;
        self.ever_started = true;
    }
}

#[derive(Default, Serialize, Deserialize)]
pub struct Dma {
    pub channels: [DmaRegisters; 4],
}

impl Dma {
    /// Max transfer-unit count per channel when `word_count == 0`: DMA3
    /// has an extra address bit, so its "zero means max" is larger.
    const fn max_count(channel_idx: usize) -> u32 {
        if channel_idx == 3 { 0x1_0000 } else { 0x4000 }
    }

    /// Looks for a channel that is enabled, set to fire immediately, and not
    /// already running, arms it, and returns its index. Called after every
    /// register write, matching how the control register's enable bit can be
    /// set by either of the two byte writes that make it up.
    pub fn check_immediate_transfer(&mut self) -> Option<usize> {
        self.channels.iter_mut().enumerate().find_map(|(idx, channel)| {
            if channel.is_enabled() && !channel.active && channel.start_timing() == StartTiming::Immediate {
                channel.arm(Self::max_count(idx));
                Some(idx)
            } else {
                None
            }
        })
    }

    /// Arms every enabled channel waiting on the given PPU edge that isn't
    /// already running, returning their indices in priority order (0..3).
    fn trigger(&mut self, timing: StartTiming) -> Vec<usize> {
        let mut started = Vec::new();
        for (idx, channel) in self.channels.iter_mut().enumerate() {
            if channel.is_enabled() && !channel.active && channel.start_timing() == timing {
                channel.arm(Self::max_count(idx));
                started.push(idx);
            }
        }
        started
    }

    #[must_use]
    pub fn trigger_vblank(&mut self) -> Vec<usize> {
        self.trigger(StartTiming::VBlank)
    }

    #[must_use]
    pub fn trigger_hblank(&mut self) -> Vec<usize> {
        self.trigger(StartTiming::HBlank)
    }

    /// Advances one channel's internal source/dest pointers by one transfer
    /// unit and decrements its remaining count. `on_word` is invoked with
    /// `(channel_idx, source, dest)` before the pointers move, giving callers
    /// a hook for side effects (e.g. future FIFO refills). Returns `true` if
    /// the channel has more units left to transfer this run.
    pub fn execute_transfer(
        &mut self,
        channel_idx: usize,
        mut on_word: impl FnMut(usize, u32, u32),
    ) -> bool {
        let channel = &mut self.channels[channel_idx];
        let unit_size: u32 = if channel.is_32bit() { 4 } else { 2 };

        on_word(channel_idx, channel.internal_source, channel.internal_dest);

        match channel.source_control() {
            AddrControl::Increment | AddrControl::IncrementReload => {
                channel.internal_source = channel.internal_source.wrapping_add(unit_size);
            }
            AddrControl::Decrement => {
                channel.internal_source = channel.internal_source.wrapping_sub(unit_size);
            }
            AddrControl::Fixed => {}
        }

        match channel.dest_control() {
            AddrControl::Increment | AddrControl::IncrementReload => {
                channel.internal_dest = channel.internal_dest.wrapping_add(unit_size);
            }
            AddrControl::Decrement => {
                channel.internal_dest = channel.internal_dest.wrapping_sub(unit_size);
            }
            AddrControl::Fixed => {}
        }

        channel.internal_count -= 1;
        if channel.internal_count > 0 {
            return true;
        }

        channel.active = false;
        if !channel.repeat() || channel.start_timing() == StartTiming::Immediate {
            // One-shot transfers clear the enable bit; the host has to write
            // it again (and relatch the dest on increment modes) to restart.
            channel.control.set_bit(15, false);
            channel.ever_started = false;
        }
        false
    }
}
