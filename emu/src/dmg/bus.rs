//! Game Boy memory bus: region decode, MBC banking, and I/O dispatch.

use crate::dmg::cartridge::ConsoleTarget;
use crate::dmg::hardware::dma::{HdmaMode, Hdma, OamDma};
use crate::dmg::hardware::interrupts::{InterruptController, IrqKind};
use crate::dmg::hardware::joypad::Joypad;
use crate::dmg::hardware::ppu::{Ppu, StatMode};
use crate::dmg::hardware::serial::Serial;
use crate::dmg::hardware::timer::Timer;
use crate::dmg::mapper::{Mapper, MapperKind};

pub struct Bus {
    pub rom: Vec<u8>,
    pub external_ram: Vec<u8>,
    pub vram: [u8; 0x2000],
    pub vram_bank1: [u8; 0x2000],
    pub vram_bank_select: u8,
    pub bg_attr_map: [u8; 0x2000],

    pub wram: [u8; 0x8000],
    pub wram_bank_select: u8,
    pub oam: [u8; 0xA0],
    pub hram: [u8; 0x7F],

    pub mapper: Mapper,
    pub interrupts: InterruptController,
    pub timer: Timer,
    pub joypad: Joypad,
    pub serial: Serial,
    pub ppu: Ppu,
    pub oam_dma: OamDma,
    pub hdma: Hdma,
    hdma_source: u16,
    hdma_dest: u16,

    pub is_cgb: bool,
    pub double_speed: bool,
    speed_switch_pending: bool,

    /// Set once by STOP when every joypad input line is inactive: the
    /// machine would hang forever, which the spec treats as fatal.
    pub hang_detected: bool,

    /// Total T-states elapsed, used by the host loop to budget execution
    /// and by tests that assert "after N cycles" scenarios.
    pub total_cycles: u64,

    /// Latched true the instant any `step` call crosses into VBlank; callers
    /// that drive the bus one CPU instruction at a time read and clear this
    /// to detect "a frame is ready" across multi-cycle instructions.
    pub frame_ready: bool,
}

impl Bus {
    #[must_use]
    pub fn new(rom: Vec<u8>, mapper: Mapper, ram_size: usize, console: ConsoleTarget) -> Self {
        let is_cgb = matches!(console, ConsoleTarget::CgbOnly | ConsoleTarget::CgbCompatible);
        Self {
            rom,
            external_ram: vec![0xFF; ram_size],
            vram: [0; 0x2000],
            vram_bank1: [0; 0x2000],
            vram_bank_select: 0,
            bg_attr_map: [0; 0x2000],
            wram: [0; 0x8000],
            wram_bank_select: 1,
            oam: [0; 0xA0],
            hram: [0; 0x7F],
            mapper,
            interrupts: InterruptController::default(),
            timer: Timer::default(),
            joypad: Joypad::default(),
            serial: Serial::default(),
            ppu: Ppu {
                is_cgb,
                ..Ppu::default()
            },
            oam_dma: OamDma::default(),
            hdma: Hdma::default(),
            hdma_source: 0,
            hdma_dest: 0,
            is_cgb,
            double_speed: false,
            speed_switch_pending: false,
            hang_detected: false,
            total_cycles: 0,
            frame_ready: false,
        }
    }

    /// Consumes a pending `KEY1` speed-switch request, toggling double-speed
    /// mode. Called from `STOP` handling, the only instruction that can
    /// trigger the switch.
    pub fn perform_speed_switch_if_requested(&mut self) -> bool {
        if self.speed_switch_pending {
            self.double_speed = !self.double_speed;
            self.speed_switch_pending = false;
            true
        } else {
            false
        }
    }

    fn wram_bank(&self) -> usize {
        if self.is_cgb {
            let bank = self.wram_bank_select & 0x07;
            if bank == 0 { 1 } else { usize::from(bank) }
        } else {
            1
        }
    }

    #[must_use]
    pub fn read(&self, address: u16) -> u8 {
        // While OAM DMA is active, only HRAM remains accessible to the CPU.
        if self.oam_dma.is_active() && !(0xFF80..=0xFFFE).contains(&address) {
            return 0xFF;
        }

        match address {
            0x0000..=0x3FFF => {
                let bank0 = self.mapper.rom_bank0_index();
                let offset = bank0 * 0x4000 + usize::from(address);
                self.rom.get(offset).copied().unwrap_or(0xFF)
            }
            0x4000..=0x7FFF => {
                let bank = self.mapper.rom_bank_switchable_index();
                let offset = bank * 0x4000 + usize::from(address - 0x4000);
                self.rom.get(offset).copied().unwrap_or(0xFF)
            }
            0x8000..=0x9FFF => {
                if matches!(self.ppu.mode(), StatMode::PixelTransfer) {
                    return 0xFF;
                }
                let idx = usize::from(address - 0x8000);
                if self.is_cgb && self.vram_bank_select & 1 == 1 {
                    self.vram_bank1[idx]
                } else {
                    self.vram[idx]
                }
            }
            0xA000..=0xBFFF => self.read_external_ram(address),
            0xC000..=0xCFFF => self.wram[usize::from(address - 0xC000)],
            0xD000..=0xDFFF => {
                self.wram[self.wram_bank() * 0x1000 + usize::from(address - 0xD000)]
            }
            0xE000..=0xFDFF => self.read(address - 0x2000),
            0xFE00..=0xFE9F => {
                if matches!(
                    self.ppu.mode(),
                    StatMode::PixelTransfer
                        | StatMode::OamSearch
                ) {
                    0xFF
                } else {
                    self.oam[usize::from(address - 0xFE00)]
                }
            }
            0xFEA0..=0xFEFF => 0xFF,
            0xFF00..=0xFF7F => self.read_io(address),
            0xFF80..=0xFFFE => self.hram[usize::from(address - 0xFF80)],
            0xFFFF => self.interrupts.read_ie(),
        }
    }

    fn read_external_ram(&self, address: u16) -> u8 {
        if let Some(selector) = self.mapper.rtc_register_selected() {
            return self
                .mapper
                .rtc
                .as_ref()
                .and_then(|rtc| rtc.read_register(selector))
                .unwrap_or(0xFF);
        }
        if !self.mapper.ram_enabled() || self.external_ram.is_empty() {
            return 0xFF;
        }
        if self.mapper.kind == MapperKind::Mbc2 {
            let idx = usize::from(address - 0xA000) % 512;
            return self.external_ram[idx] | 0xF0;
        }
        let bank = self.mapper.ram_bank_index();
        let offset = bank * 0x2000 + usize::from(address - 0xA000);
        self.external_ram.get(offset).copied().unwrap_or(0xFF)
    }

    pub fn write(&mut self, address: u16, value: u8) {
        if self.oam_dma.is_active() && !(0xFF80..=0xFFFE).contains(&address) {
            return;
        }

        match address {
            0x0000..=0x7FFF => self.mapper.write_control(address, value),
            0x8000..=0x9FFF => {
                if matches!(self.ppu.mode(), StatMode::PixelTransfer) {
                    return;
                }
                let idx = usize::from(address - 0x8000);
                if self.is_cgb && self.vram_bank_select & 1 == 1 {
                    self.vram_bank1[idx] = value;
                } else {
                    self.vram[idx] = value;
                }
            }
            0xA000..=0xBFFF => self.write_external_ram(address, value),
            0xC000..=0xCFFF => self.wram[usize::from(address - 0xC000)] = value,
            0xD000..=0xDFFF => {
                let bank = self.wram_bank();
                self.wram[bank * 0x1000 + usize::from(address - 0xD000)] = value;
            }
            0xE000..=0xFDFF => self.write(address - 0x2000, value),
            0xFE00..=0xFE9F => {
                if !matches!(
                    self.ppu.mode(),
                    StatMode::PixelTransfer
                        | StatMode::OamSearch
                ) {
                    self.oam[usize::from(address - 0xFE00)] = value;
                }
            }
            0xFEA0..=0xFEFF => {}
            0xFF00..=0xFF7F => self.write_io(address, value),
            0xFF80..=0xFFFE => self.hram[usize::from(address - 0xFF80)] = value,
            0xFFFF => self.interrupts.write_ie(value),
        }
    }

    fn write_external_ram(&mut self, address: u16, value: u8) {
        if let Some(selector) = self.mapper.rtc_register_selected() {
            if let Some(rtc) = self.mapper.rtc.as_mut() {
                rtc.write_register(selector, value);
            }
            return;
        }
        if !self.mapper.ram_enabled() || self.external_ram.is_empty() {
            return;
        }
        if self.mapper.kind == MapperKind::Mbc2 {
            let idx = usize::from(address - 0xA000) % 512;
            self.external_ram[idx] = value & 0x0F;
            return;
        }
        let bank = self.mapper.ram_bank_index();
        let offset = bank * 0x2000 + usize::from(address - 0xA000);
        if let Some(slot) = self.external_ram.get_mut(offset) {
            *slot = value;
        }
    }

    fn read_io(&self, address: u16) -> u8 {
        match address {
            0xFF00 => self.joypad.read(),
            0xFF01 => self.serial.data,
            0xFF02 => self.serial.control | 0x7C,
            0xFF04 => self.timer.div(),
            0xFF05 => self.timer.tima,
            0xFF06 => self.timer.tma,
            0xFF07 => self.timer.tac | 0xF8,
            0xFF0F => self.interrupts.read_if(),
            0xFF40 => self.ppu.lcdc,
            0xFF41 => self.ppu.stat | 0x80,
            0xFF42 => self.ppu.scy,
            0xFF43 => self.ppu.scx,
            0xFF44 => self.ppu.ly,
            0xFF45 => self.ppu.lyc,
            0xFF47 => self.ppu.bgp,
            0xFF48 => self.ppu.obp0,
            0xFF49 => self.ppu.obp1,
            0xFF4A => self.ppu.wy,
            0xFF4B => self.ppu.wx,
            0xFF4D => u8::from(self.double_speed) << 7 | u8::from(self.speed_switch_pending),
            0xFF4F => self.vram_bank_select | 0xFE,
            0xFF55 => {
                if self.hdma.active {
                    self.hdma.length_blocks.wrapping_sub(1) as u8 & 0x7F
                } else {
                    0xFF
                }
            }
            0xFF68 => self.ppu.cgb_bg_palette_index,
            0xFF69 => self.ppu.cgb_bg_palette_ram[usize::from(self.ppu.cgb_bg_palette_index & 0x3F)],
            0xFF6A => self.ppu.cgb_obj_palette_index,
            0xFF6B => self.ppu.cgb_obj_palette_ram[usize::from(self.ppu.cgb_obj_palette_index & 0x3F)],
            0xFF70 => self.wram_bank_select | 0xF8,
            _ => 0xFF,
        }
    }

    #[allow(clippy::too_many_lines)]
    fn write_io(&mut self, address: u16, value: u8) {
        match address {
            0xFF00 => self.joypad.write(value),
            0xFF01 => self.serial.data = value,
            0xFF02 => self.serial.write_control(value),
            0xFF04 => self.timer.reset_div(),
            0xFF05 => self.timer.write_tima(value),
            0xFF06 => self.timer.tma = value,
            0xFF07 => self.timer.tac = value & 0x07,
            0xFF0F => self.interrupts.write_if(value),
            0xFF40 => self.ppu.lcdc = value,
            0xFF41 => self.ppu.stat = (self.ppu.stat & 0x07) | (value & 0xF8),
            0xFF42 => self.ppu.scy = value,
            0xFF43 => self.ppu.scx = value,
            0xFF45 => self.ppu.lyc = value,
            0xFF46 => self.oam_dma.start(value),
            0xFF47 => self.ppu.bgp = value,
            0xFF48 => self.ppu.obp0 = value,
            0xFF49 => self.ppu.obp1 = value,
            0xFF4A => self.ppu.wy = value,
            0xFF4B => self.ppu.wx = value,
            0xFF4D => self.speed_switch_pending = value & 0x01 != 0,
            0xFF4F => self.vram_bank_select = value & 0x01,
            0xFF51..=0xFF54 => self.write_hdma_source_dest(address, value),
            0xFF55 => self.start_hdma(value),
            0xFF68 => self.ppu.cgb_bg_palette_index = value,
            0xFF69 => {
                let idx = usize::from(self.ppu.cgb_bg_palette_index & 0x3F);
                self.ppu.cgb_bg_palette_ram[idx] = value;
                if self.ppu.cgb_bg_palette_index & 0x80 != 0 {
                    self.ppu.cgb_bg_palette_index = 0x80 | ((idx as u8 + 1) & 0x3F);
                }
            }
            0xFF6A => self.ppu.cgb_obj_palette_index = value,
            0xFF6B => {
                let idx = usize::from(self.ppu.cgb_obj_palette_index & 0x3F);
                self.ppu.cgb_obj_palette_ram[idx] = value;
                if self.ppu.cgb_obj_palette_index & 0x80 != 0 {
                    self.ppu.cgb_obj_palette_index = 0x80 | ((idx as u8 + 1) & 0x3F);
                }
            }
            0xFF70 => self.wram_bank_select = value & 0x07,
            _ => {}
        }
    }

    fn write_hdma_source_dest(&mut self, address: u16, value: u8) {
        // Registers accumulate into the pending-transfer fields, which are
        // only consulted when 0xFF55 is written.
        match address {
            0xFF51 => self.hdma_source = (self.hdma_source & 0x00FF) | (u16::from(value) << 8),
            0xFF52 => self.hdma_source = (self.hdma_source & 0xFF00) | u16::from(value & 0xF0),
            0xFF53 => self.hdma_dest = (self.hdma_dest & 0x00FF) | (u16::from(value & 0x1F) << 8),
            0xFF54 => self.hdma_dest = (self.hdma_dest & 0xFF00) | u16::from(value & 0xF0),
            _ => unreachable!(),
        }
    }

    fn start_hdma(&mut self, value: u8) {
        if self.hdma.active && value & 0x80 == 0 {
            self.hdma.cancel();
            return;
        }
        let blocks = u16::from(value & 0x7F) + 1;
        let mode = if value & 0x80 != 0 { HdmaMode::HBlank } else { HdmaMode::General };
        self.hdma.start(self.hdma_source, 0x8000 | self.hdma_dest, blocks, mode);
    }

    /// Advances every timing-coupled peripheral by one machine cycle and
    /// returns `true` if a VBlank just occurred (a frame is ready).
    pub fn step(&mut self) -> bool {
        self.total_cycles += 4;
        self.interrupts.begin_cycle();

        if self.timer.step() {
            self.interrupts.request(IrqKind::Timer);
        }
        if self.serial.step(4) {
            self.interrupts.request(IrqKind::Serial);
        }

        let ppu_out = self.ppu.step();
        if ppu_out.request_vblank_irq {
            self.interrupts.request(IrqKind::VBlank);
        }
        if ppu_out.request_stat_irq {
            self.interrupts.request(IrqKind::Stat);
        }
        if ppu_out.hblank_entered {
            self.render_current_scanline();
            if self.hdma.mode == Some(HdmaMode::HBlank) {
                self.run_hdma_block();
            }
        }

        if let Some((source, dest)) = self.oam_dma.step() {
            let byte = self.read(source);
            self.oam[usize::from(dest)] = byte;
        }

        if self.joypad.update_signal() {
            self.interrupts.request(IrqKind::Joypad);
        }

        self.frame_ready |= ppu_out.frame_ready;
        ppu_out.frame_ready
    }

    fn render_current_scanline(&mut self) {
        let bg_attr = self.is_cgb.then_some(self.bg_attr_map.as_slice());
        let vram1 = self.is_cgb.then_some(self.vram_bank1.as_slice());
        self.ppu
            .render_scanline_with(&self.vram, &self.oam, vram1, bg_attr);
    }

    fn run_hdma_block(&mut self) {
        if let Some((src, dst)) = self.hdma.next_block() {
            for i in 0..16u16 {
                let byte = self.read(src + i);
                let vram_idx = usize::from((dst + i) & 0x1FFF);
                if self.is_cgb && self.vram_bank_select & 1 == 1 {
                    self.vram_bank1[vram_idx] = byte;
                } else {
                    self.vram[vram_idx] = byte;
                }
            }
        }
    }

    /// Runs a general-purpose HDMA transfer to completion in one shot (the
    /// CPU is halted for its whole duration, per spec).
    pub fn run_general_hdma(&mut self) {
        while self.hdma.mode == Some(HdmaMode::General) {
            self.run_hdma_block();
        }
    }
}
