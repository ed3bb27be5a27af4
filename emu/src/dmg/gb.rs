//! Top-level Game Boy / Game Boy Color machine.

use crate::dmg::bus::Bus;
use crate::dmg::cartridge::{CartridgeHeader, ConsoleTarget};
use crate::dmg::cpu::Cpu;
use crate::dmg::mapper::{Mapper, MapperKind};
use crate::dmg::registers::Mode;
use crate::error::CoreError;

/// One real second's worth of STOP-with-nothing-wired-up before the core
/// gives up and reports it as a fatal hang rather than spinning forever.
const STOP_HANG_CYCLE_BUDGET: u64 = 4_194_304;

pub struct GameBoy {
    pub cpu: Cpu,
    pub bus: Bus,
    pub header: CartridgeHeader,
    stalled_cycles: u64,
}

impl GameBoy {
    /// Builds a machine from raw ROM bytes, optionally seeding cartridge RAM
    /// and an RTC snapshot from a save file (see `console::SaveData`).
    /// `multicart` forces MBC1 to use the M161-style 6-bit bank-select
    /// routing; the header byte alone cannot distinguish a multicart board.
    pub fn new(rom: Vec<u8>, saved_ram: Option<Vec<u8>>, multicart: bool) -> Result<Self, CoreError> {
        let mut header = CartridgeHeader::new(&rom)?;
        if !header.logo_valid {
            tracing::warn!("cartridge logo does not match the Nintendo boot logo");
        }
        if !header.checksum_valid {
            tracing::warn!("cartridge header checksum is invalid");
        }
        if multicart && header.mapper == MapperKind::Mbc1 {
            header.mapper = MapperKind::Mbc1Multicart;
        }

        let mapper = Mapper::new(header.mapper, header.rom_banks, header.ram_banks, header.has_rtc);
        let ram_size = if header.mapper == MapperKind::Mbc2 {
            512 // MBC2 has a fixed 512x4-bit internal RAM, addressed separately
        } else {
            header.ram_banks * 0x2000
        };
        let mut bus = Bus::new(rom, mapper, ram_size, header.console_target);

        if let Some(ram) = saved_ram {
            let n = ram.len().min(bus.external_ram.len());
            bus.external_ram[..n].copy_from_slice(&ram[..n]);
        }

        let is_cgb = header.console_target != ConsoleTarget::Dmg;

        Ok(Self {
            cpu: Cpu::new(is_cgb),
            bus,
            header,
            stalled_cycles: 0,
        })
    }

    /// Executes exactly one CPU instruction (or one cycle of interrupt
    /// service, or one idle cycle while halted/stopped). Returns `true` if
    /// VBlank was crossed at any point during it.
    pub fn step(&mut self) -> bool {
        self.bus.frame_ready = false;
        self.cpu.step(&mut self.bus);
        self.bus.frame_ready
    }

    /// Runs until at least `target_cycles` T-states have elapsed or a fatal
    /// hang is detected. Callers that need per-frame boundaries should poll
    /// `bus.ppu.front_buffer`, swapped in on every VBlank.
    pub fn run_cycles(&mut self, target_cycles: u64) -> Result<(), CoreError> {
        let deadline = self.bus.total_cycles + target_cycles;

        while self.bus.total_cycles < deadline {
            let before = self.bus.total_cycles;
            self.cpu.step(&mut self.bus);

            if self.cpu.regs.mode == Mode::Stopped {
                self.stalled_cycles += self.bus.total_cycles - before;
                if self.stalled_cycles > STOP_HANG_CYCLE_BUDGET {
                    return Err(CoreError::StopWithNoJoypad);
                }
            } else {
                self.stalled_cycles = 0;
            }
        }

        Ok(())
    }
}
