//! Game Boy cartridge header (0x0100-0x014F) and mapper/RAM-size decoding.

use crate::bitwise::fnv1a_hash;
use crate::error::CoreError;

use super::mapper::MapperKind;

/// Console this ROM targets, as declared by the header's CGB flag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConsoleTarget {
    Dmg,
    /// CGB-compatible but also runs on DMG hardware.
    CgbCompatible,
    /// CGB-only (0x143 == 0xC0).
    CgbOnly,
}

pub struct CartridgeHeader {
    pub title: String,
    pub console_target: ConsoleTarget,
    pub mapper: MapperKind,
    pub rom_banks: usize,
    pub ram_banks: usize,
    pub has_rtc: bool,
    pub has_rumble: bool,
    pub has_battery: bool,
    pub logo_valid: bool,
    pub checksum_valid: bool,
}

const NINTENDO_LOGO_HASH: u32 = 0x46ec_1bf2;

impl CartridgeHeader {
    pub fn new(data: &[u8]) -> Result<Self, CoreError> {
        if data.len() < 0x150 {
            return Err(CoreError::RomSizeMismatch);
        }

        let title_bytes = &data[0x134..0x144];
        let title = String::from_utf8_lossy(title_bytes)
            .trim_end_matches('\0')
            .to_string();

        let console_target = match data[0x143] {
            0xC0 => ConsoleTarget::CgbOnly,
            0x80 => ConsoleTarget::CgbCompatible,
            _ => ConsoleTarget::Dmg,
        };

        let (mapper, has_rtc, has_rumble, has_battery) = Self::decode_mapper(data[0x147])?;

        if has_rtc && mapper != MapperKind::Mbc3 {
            return Err(CoreError::UnsupportedRtc);
        }
        if has_rumble && !matches!(mapper, MapperKind::Mbc5) {
            return Err(CoreError::UnsupportedRumble);
        }

        let rom_banks = match data[0x148] {
            n @ 0x00..=0x08 => 2usize << n,
            _ => 2,
        };

        let ram_banks = match data[0x149] {
            0x00 => 0,
            0x01 => 1, // unofficial 2 KiB variant, rounds up to one bank
            0x02 => 1,
            0x03 => 4,
            0x04 => 16,
            0x05 => 8,
            _ => 0,
        };

        let logo_valid = fnv1a_hash(&data[0x104..0x134]) == NINTENDO_LOGO_HASH;
        let checksum_valid = Self::header_checksum(data) == data[0x14D];

        Ok(Self {
            title,
            console_target,
            mapper,
            rom_banks,
            ram_banks: if mapper == MapperKind::Mbc2 { 0 } else { ram_banks },
            has_rtc,
            has_rumble,
            has_battery,
            logo_valid,
            checksum_valid,
        })
    }

    fn header_checksum(data: &[u8]) -> u8 {
        data[0x134..0x14D]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1))
    }

    fn decode_mapper(code: u8) -> Result<(MapperKind, bool, bool, bool), CoreError> {
        Ok(match code {
            0x00 => (MapperKind::None, false, false, false),
            0x01 => (MapperKind::Mbc1, false, false, false),
            0x02 => (MapperKind::Mbc1, false, false, false),
            0x03 => (MapperKind::Mbc1, false, false, true),
            0x05 => (MapperKind::Mbc2, false, false, false),
            0x06 => (MapperKind::Mbc2, false, false, true),
            0x0F => (MapperKind::Mbc3, true, false, true),
            0x10 => (MapperKind::Mbc3, true, false, true),
            0x11 => (MapperKind::Mbc3, false, false, false),
            0x12 => (MapperKind::Mbc3, false, false, false),
            0x13 => (MapperKind::Mbc3, false, false, true),
            0x19 => (MapperKind::Mbc5, false, false, false),
            0x1A => (MapperKind::Mbc5, false, false, false),
            0x1B => (MapperKind::Mbc5, false, false, true),
            0x1C => (MapperKind::Mbc5, false, true, false),
            0x1D => (MapperKind::Mbc5, false, true, false),
            0x1E => (MapperKind::Mbc5, false, true, true),
            other => return Err(CoreError::UnknownMapper(other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn blank_rom() -> Vec<u8> {
        vec![0u8; 0x8000]
    }

    #[test]
    fn unknown_mapper_is_fatal() {
        let mut rom = blank_rom();
        rom[0x147] = 0xFE;
        assert!(matches!(
            CartridgeHeader::new(&rom),
            Err(CoreError::UnknownMapper(0xFE))
        ));
    }

    #[test]
    fn mbc3_with_rtc_code_is_accepted() {
        let mut rom = blank_rom();
        rom[0x147] = 0x10;
        let header = CartridgeHeader::new(&rom).unwrap();
        assert_eq!(header.mapper, MapperKind::Mbc3);
        assert!(header.has_rtc);
    }

    #[test]
    fn bad_checksum_is_a_warning_not_fatal() {
        // An all-zero header has an incorrect checksum, but parsing must
        // still succeed (only unknown mappers are fatal).
        let rom = blank_rom();
        let header = CartridgeHeader::new(&rom).expect("bad checksum must not be fatal");
        assert!(!header.checksum_valid);
    }
}
