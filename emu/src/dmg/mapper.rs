//! Cartridge mapper (MBC) banking logic.

use crate::dmg::rtc::Rtc;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MapperKind {
    None,
    Mbc1,
    Mbc1Multicart,
    Mbc2,
    Mbc3,
    Mbc5,
}

pub struct Mapper {
    pub kind: MapperKind,
    rom_banks: usize,
    ram_banks: usize,

    ram_enabled: bool,
    rom_bank_low: u8,
    rom_bank_high: u8,
    ram_bank: u8,
    /// MBC1 banking-mode latch: false = ROM banking mode, true = RAM banking mode.
    mode_ram_banking: bool,

    /// MBC3 RTC, present only when the cartridge header declares one.
    pub rtc: Option<Rtc>,
    rtc_latch_write: Option<u8>,
}

impl Mapper {
    #[must_use]
    pub fn new(kind: MapperKind, rom_banks: usize, ram_banks: usize, has_rtc: bool) -> Self {
        Self {
            kind,
            rom_banks,
            ram_banks,
            ram_enabled: false,
            rom_bank_low: 1,
            rom_bank_high: 0,
            ram_bank: 0,
            mode_ram_banking: false,
            rtc: has_rtc.then(Rtc::new),
            rtc_latch_write: None,
        }
    }

    #[must_use]
    pub fn rom_bank0_index(&self) -> usize {
        match self.kind {
            MapperKind::Mbc1 if self.mode_ram_banking => {
                (usize::from(self.rom_bank_high) << 5) % self.rom_banks.max(1)
            }
            MapperKind::Mbc1Multicart if self.mode_ram_banking => {
                // Each of the four 16-bank games starts at a multiple of 0x10;
                // RAM-banking mode exposes that game's bank 0 in this window.
                (usize::from(self.rom_bank_high) << 4) % self.rom_banks.max(1)
            }
            _ => 0,
        }
    }

    #[must_use]
    pub fn rom_bank_switchable_index(&self) -> usize {
        let bank = match self.kind {
            MapperKind::None => 1,
            MapperKind::Mbc1 => {
                let low = if self.rom_bank_low == 0 { 1 } else { self.rom_bank_low };
                (usize::from(self.rom_bank_high) << 5) | usize::from(low)
            }
            MapperKind::Mbc1Multicart => {
                // The multicart PCB wires the $2000 write directly onto a
                // single 6-bit bank-select register (rather than splitting
                // 5 bits to $2000 and 2 bits to $4000 as plain MBC1 does),
                // so the zero-to-one substitution is applied to the full
                // 6-bit value instead of per sub-field.
                if self.rom_bank_low == 0 { 1 } else { self.rom_bank_low }.into()
            }
            MapperKind::Mbc2 => {
                if self.rom_bank_low == 0 { 1 } else { self.rom_bank_low & 0x0F }.into()
            }
            MapperKind::Mbc3 => {
                if self.rom_bank_low == 0 { 1 } else { self.rom_bank_low }.into()
            }
            MapperKind::Mbc5 => (usize::from(self.rom_bank_high) << 8) | usize::from(self.rom_bank_low),
        };
        bank % self.rom_banks.max(1)
    }

    #[must_use]
    pub fn ram_bank_index(&self) -> usize {
        if self.ram_banks == 0 {
            return 0;
        }
        usize::from(self.ram_bank) % self.ram_banks
    }

    #[must_use]
    pub const fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    /// Handles a write into the 0x0000-0x7FFF mapper-control window.
    pub fn write_control(&mut self, address: u16, value: u8) {
        match self.kind {
            MapperKind::Mbc1 | MapperKind::Mbc1Multicart => match address {
                0x0000..=0x1FFF => self.ram_enabled = value & 0x0F == 0x0A,
                0x2000..=0x3FFF => {
                    self.rom_bank_low = if self.kind == MapperKind::Mbc1Multicart {
                        value & 0x3F
                    } else {
                        value & 0x1F
                    };
                }
                0x4000..=0x5FFF => {
                    if self.mode_ram_banking {
                        self.ram_bank = value & 0x03;
                    } else {
                        self.rom_bank_high = value & 0x03;
                    }
                }
                0x6000..=0x7FFF => self.mode_ram_banking = value & 0x01 != 0,
                _ => {}
            },
            MapperKind::Mbc2 => {
                if address <= 0x3FFF {
                    if address & 0x0100 != 0 {
                        self.rom_bank_low = value & 0x0F;
                    } else {
                        self.ram_enabled = value & 0x0F == 0x0A;
                    }
                }
            }
            MapperKind::Mbc3 => match address {
                0x0000..=0x1FFF => self.ram_enabled = value & 0x0F == 0x0A,
                0x2000..=0x3FFF => self.rom_bank_low = value & 0x7F,
                0x4000..=0x5FFF => self.ram_bank = value,
                0x6000..=0x7FFF => {
                    if let Some(rtc) = self.rtc.as_mut() {
                        if self.rtc_latch_write == Some(0x00) && value == 0x01 {
                            rtc.latch();
                        }
                    }
                    self.rtc_latch_write = Some(value);
                }
                _ => {}
            },
            MapperKind::Mbc5 => match address {
                0x0000..=0x1FFF => self.ram_enabled = value & 0x0F == 0x0A,
                0x2000..=0x2FFF => self.rom_bank_low = value,
                0x3000..=0x3FFF => self.rom_bank_high = value & 0x01,
                0x4000..=0x5FFF => self.ram_bank = value & 0x0F,
                _ => {}
            },
            MapperKind::None => {}
        }
    }

    /// For MBC3, RAM-bank register values 0x08-0x0C select one of the RTC
    /// registers instead of a RAM bank.
    #[must_use]
    pub const fn rtc_register_selected(&self) -> Option<u8> {
        if matches!(self.kind, MapperKind::Mbc3) && self.ram_bank >= 0x08 && self.ram_bank <= 0x0C {
            Some(self.ram_bank)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mbc1_bank_zero_is_remapped_to_one() {
        let mut m = Mapper::new(MapperKind::Mbc1, 128, 4, false);
        m.write_control(0x2000, 0x00);
        assert_eq!(m.rom_bank_switchable_index(), 1);
        m.write_control(0x2000, 0x20);
        assert_eq!(m.rom_bank_switchable_index(), 0x20);
    }

    #[test]
    fn mbc1_multicart_bank_20_selection() {
        // 8 Mbit ROM = 64 16KiB banks. Writing 0x20 then 0x00 to $4000
        // must select bank 0x20, not 0x21 (plain MBC1's quirk would bump it).
        let mut m = Mapper::new(MapperKind::Mbc1Multicart, 64, 0, false);
        m.write_control(0x2000, 0x20);
        m.write_control(0x4000, 0x00);
        assert_eq!(m.rom_bank_switchable_index(), 0x20);
    }

    #[test]
    fn mbc3_rtc_latch_sequence() {
        let mut m = Mapper::new(MapperKind::Mbc3, 4, 1, true);
        m.write_control(0x6000, 0x00);
        m.write_control(0x6000, 0x01);
        assert!(m.rtc.is_some());
    }
}
