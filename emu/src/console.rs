//! Console autodetection, the `Machine` union, and on-disk save layout.

use crate::dmg::gb::GameBoy;
use crate::error::CoreError;
use crate::gba::Gba;

/// Which hardware a ROM targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConsoleModel {
    Dmg,
    Cgb,
    Agb,
}

impl ConsoleModel {
    /// Inspects the header bytes a cartridge carries for each platform: the
    /// GBA fixed `0x96` marker at 0xB2, otherwise the CGB flag at 0x143.
    #[must_use]
    pub fn detect(rom: &[u8]) -> Self {
        if rom.len() > 0xB2 && rom[0xB2] == 0x96 {
            return Self::Agb;
        }
        if rom.len() > 0x143 && matches!(rom[0x143], 0x80 | 0xC0) {
            return Self::Cgb;
        }
        Self::Dmg
    }
}

/// Either a GBA or a DMG/CGB machine, selected at load time.
pub enum Machine {
    Gba(Box<Gba>),
    Dmg(Box<GameBoy>),
}

impl Machine {
    /// Builds the machine matching `model`. The GBA path requires a BIOS
    /// image; the DMG/CGB path boots directly into cartridge code (no BIOS
    /// ROM dump is required or emulated, per the console's Non-goals).
    pub fn new(
        model: ConsoleModel,
        rom: Vec<u8>,
        gba_bios: Option<[u8; 0x4000]>,
        saved_ram: Option<Vec<u8>>,
        multicart: bool,
    ) -> Result<Self, CoreError> {
        match model {
            ConsoleModel::Agb => {
                let bios = gba_bios.ok_or(CoreError::RomSizeMismatch)?;
                Ok(Self::Gba(Box::new(Gba::new(bios, &rom))))
            }
            ConsoleModel::Dmg | ConsoleModel::Cgb => {
                Ok(Self::Dmg(Box::new(GameBoy::new(rom, saved_ram, multicart)?)))
            }
        }
    }

    /// Advances by one CPU instruction (GBA) or one machine cycle worth of
    /// work (DMG/CGB, driven internally cycle-by-cycle). Returns `true` on
    /// VBlank, i.e. a frame is ready to present.
    pub fn step(&mut self) -> bool {
        match self {
            Self::Gba(gba) => gba.step(),
            Self::Dmg(gb) => gb.step(),
        }
    }
}

/// Layout persisted alongside a ROM at `<rom-path>.sav`: the raw cartridge
/// RAM contents followed, when the cartridge has one, by a little-endian
/// 48-byte RTC register dump.
pub struct SaveData {
    pub cartridge_ram: Vec<u8>,
    pub rtc: Option<[u8; 48]>,
}

impl SaveData {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = self.cartridge_ram.clone();
        if let Some(rtc) = &self.rtc {
            bytes.extend_from_slice(rtc);
        }
        bytes
    }

    /// Splits a save file back into cartridge RAM and an optional RTC dump.
    /// `ram_size` is the size declared by the cartridge header; anything
    /// beyond it is assumed to be the 48-byte RTC tail.
    #[must_use]
    pub fn decode(data: &[u8], ram_size: usize) -> Self {
        let ram_size = ram_size.min(data.len());
        let cartridge_ram = data[..ram_size].to_vec();
        let rtc = data[ram_size..]
            .get(..48)
            .and_then(|tail| <[u8; 48]>::try_from(tail).ok());
        Self { cartridge_ram, rtc }
    }
}
