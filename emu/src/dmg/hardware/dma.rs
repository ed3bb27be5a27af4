//! OAM DMA (DMG/CGB) and HDMA/general-purpose DMA (CGB only).

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum OamDmaStage {
    #[default]
    Inactive,
    /// The cycle right after the DMA register is written: one source byte is
    /// read, nothing is written yet.
    Starting,
    Active,
}

#[derive(Default, Serialize, Deserialize)]
pub struct OamDma {
    pub stage: OamDmaStage,
    pub source_high: u8,
    index: u8,
}

impl OamDma {
    pub fn start(&mut self, source_high: u8) {
        self.source_high = source_high;
        self.stage = OamDmaStage::Starting;
        self.index = 0;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.stage != OamDmaStage::Inactive
    }

    /// Returns `Some((source_addr, dest_oam_index))` to copy this cycle, or
    /// `None` once the 160-byte transfer has completed.
    pub fn step(&mut self) -> Option<(u16, u8)> {
        match self.stage {
            OamDmaStage::Inactive => None,
            OamDmaStage::Starting => {
                self.stage = OamDmaStage::Active;
                None
            }
            OamDmaStage::Active => {
                let source = (u16::from(self.source_high) << 8) | u16::from(self.index);
                let dest = self.index;
                self.index += 1;
                if self.index >= 160 {
                    self.stage = OamDmaStage::Inactive;
                }
                Some((source, dest))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum HdmaMode {
    General,
    HBlank,
}

#[derive(Default, Serialize, Deserialize)]
pub struct Hdma {
    pub source: u16,
    pub destination: u16,
    pub length_blocks: u16,
    pub mode: Option<HdmaMode>,
    pub active: bool,
}

impl Hdma {
    pub fn start(&mut self, source: u16, destination: u16, blocks: u16, mode: HdmaMode) {
        self.source = source;
        self.destination = destination & 0x1FFF;
        self.length_blocks = blocks;
        self.mode = Some(mode);
        self.active = true;
    }

    pub const fn cancel(&mut self) {
        self.active = false;
        self.mode = None;
    }

    /// Called once at each entry into PPU mode 0 for HBlank-mode transfers,
    /// or immediately (repeatedly) for general-purpose transfers. Returns
    /// the 16-byte `(source, destination)` block to copy, if any is due.
    pub fn next_block(&mut self) -> Option<(u16, u16)> {
        if !self.active || self.length_blocks == 0 {
            return None;
        }
        let block = (self.source, self.destination);
        self.source = self.source.wrapping_add(16);
        self.destination = (self.destination.wrapping_add(16)) & 0x1FFF;
        self.length_blocks -= 1;
        if self.length_blocks == 0 {
            self.active = false;
            self.mode = None;
        }
        Some(block)
    }
}
