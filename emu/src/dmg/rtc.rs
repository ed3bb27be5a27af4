//! MBC3 real-time clock.
//!
//! The RTC is exposed through seven BCD date-time registers plus a control
//! byte; the latch snapshot is what the 0xA000 window actually reads after
//! a `0x00`-then-`0x01` write to 0x6000-0x7FFF.

use crate::bitwise::{from_bcd, to_bcd};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Copy, Serialize, Deserialize)]
pub struct RtcRegisters {
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
    pub day_low: u8,
    /// Control byte: bit 0 = day-counter bit 8, bit 6 = halt, bit 7 = day
    /// carry (set when the 9-bit day counter overflows).
    pub control: u8,
}

#[derive(Default, Serialize, Deserialize)]
pub struct Rtc {
    /// Registers as they currently stand (kept up to date by `tick`).
    live: RtcRegisters,
    /// Snapshot taken on the last latch command; this is what the cartridge
    /// RAM window reads.
    pub latched: RtcRegisters,
    /// Wall-clock timestamp (host `SystemTime`, seconds since epoch) at the
    /// moment of the last latch, persisted in the save file.
    pub last_latch_unix_time: u64,
}

impl Rtc {
    /// Builds a freshly-inserted cartridge's RTC, with the wall-clock
    /// reference point set to the moment of construction so the first
    /// latch doesn't see a bogus multi-decade jump from the zero epoch.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_latch_unix_time: Self::now_unix(),
            ..Self::default()
        }
    }

    fn now_unix() -> u64 {
        Utc::now().timestamp().max(0) as u64
    }

    /// Advances `live` by however many real seconds elapsed since the last
    /// latch, then snapshots it into `latched`. The registers only move
    /// forward on a latch, matching how games observe MBC3 time: the chip
    /// itself always ticks, but software only ever sees the latched value.
    pub fn latch(&mut self) {
        let now = Self::now_unix();
        let elapsed = now.saturating_sub(self.last_latch_unix_time);
        for _ in 0..elapsed {
            self.tick_one_second();
        }
        self.last_latch_unix_time = now;
        self.latched = self.live;
    }

    /// Advances the live registers by one real second (called by the host
    /// from wall-clock time, not from the emulated cycle count).
    pub fn tick_one_second(&mut self) {
        if self.live.control & 0x40 != 0 {
            return; // halted
        }

        let mut seconds = from_bcd(self.live.seconds) + 1;
        let mut minutes = from_bcd(self.live.minutes);
        let mut hours = from_bcd(self.live.hours);
        let mut day = (u16::from(self.live.control & 0x01) << 8) | u16::from(self.live.day_low);

        if seconds >= 60 {
            seconds = 0;
            minutes += 1;
        }
        if minutes >= 60 {
            minutes = 0;
            hours += 1;
        }
        if hours >= 24 {
            hours = 0;
            day += 1;
        }
        if day > 0x1FF {
            day = 0;
            self.live.control |= 0x80; // day-counter carry
        }

        self.live.seconds = to_bcd(seconds);
        self.live.minutes = to_bcd(minutes);
        self.live.hours = to_bcd(hours);
        self.live.day_low = day as u8;
        self.live.control = (self.live.control & !0x01) | ((day >> 8) as u8 & 0x01);
    }

    pub const fn write_register(&mut self, selector: u8, value: u8) {
        match selector {
            0x08 => self.live.seconds = value,
            0x09 => self.live.minutes = value,
            0x0A => self.live.hours = value,
            0x0B => self.live.day_low = value,
            0x0C => self.live.control = value & 0xC1,
            _ => {}
        }
    }

    #[must_use]
    pub const fn read_register(&self, selector: u8) -> Option<u8> {
        match selector {
            0x08 => Some(self.latched.seconds),
            0x09 => Some(self.latched.minutes),
            0x0A => Some(self.latched.hours),
            0x0B => Some(self.latched.day_low),
            0x0C => Some(self.latched.control),
            _ => None,
        }
    }

    /// Encodes the save-file RTC dump: the five live MBC3 registers widened
    /// to `u32` each (with three reserved zero slots padding the layout out
    /// to eight fields), followed by the last-latch timestamp and eight
    /// bytes of trailing reserved padding. 8*4 + 8 + 8 = 48 bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 48] {
        let mut bytes = [0u8; 48];
        let fields = [
            u32::from(self.live.seconds),
            u32::from(self.live.minutes),
            u32::from(self.live.hours),
            u32::from(self.live.day_low),
            u32::from(self.live.control),
            0,
            0,
            0,
        ];
        for (i, field) in fields.iter().enumerate() {
            bytes[i * 4..i * 4 + 4].copy_from_slice(&field.to_le_bytes());
        }
        bytes[32..40].copy_from_slice(&self.last_latch_unix_time.to_le_bytes());
        bytes
    }

    #[must_use]
    pub fn from_bytes(bytes: &[u8; 48]) -> Self {
        let field = |i: usize| u32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap());
        let registers = RtcRegisters {
            seconds: field(0) as u8,
            minutes: field(1) as u8,
            hours: field(2) as u8,
            day_low: field(3) as u8,
            control: field(4) as u8,
        };
        let last_latch_unix_time = u64::from_le_bytes(bytes[32..40].try_into().unwrap());
        Self {
            live: registers,
            latched: registers,
            last_latch_unix_time,
        }
    }
}
