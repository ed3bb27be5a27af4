//! Scanline-at-once PPU/LCD.
//!
//! No pixel FIFO: `step` drives the mode state machine cycle-by-cycle, and
//! a whole background+window+sprite row is composited in one shot the
//! instant the machine enters mode 3's end (pixel-transfer boundary).

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

const OAM_SEARCH_CYCLES: u16 = 80;
const SCANLINE_CYCLES: u16 = 456;
const VBLANK_START_LINE: u8 = 144;
const LAST_LINE: u8 = 153;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum StatMode {
    HBlank = 0,
    VBlank = 1,
    OamSearch = 2,
    PixelTransfer = 3,
}

#[derive(Default)]
pub struct PpuStepOutput {
    pub request_vblank_irq: bool,
    pub request_stat_irq: bool,
    pub hblank_entered: bool,
    pub frame_ready: bool,
}

#[derive(Serialize, Deserialize)]
pub struct Ppu {
    pub lcdc: u8,
    pub stat: u8,
    pub scy: u8,
    pub scx: u8,
    pub ly: u8,
    pub lyc: u8,
    pub bgp: u8,
    pub obp0: u8,
    pub obp1: u8,
    pub wy: u8,
    pub wx: u8,

    /// CGB background palette RAM index register (BCPS/BGPI) and data.
    pub cgb_bg_palette_index: u8,
    pub cgb_bg_palette_ram: [u8; 64],
    pub cgb_obj_palette_index: u8,
    pub cgb_obj_palette_ram: [u8; 64],

    scanline_cycles: u16,
    mode3_length: u16,
    window_line_counter: u8,
    stat_signal: bool,

    #[serde(with = "serde_big_array_bg")]
    pub back_buffer: [u16; SCREEN_WIDTH * SCREEN_HEIGHT],
    #[serde(with = "serde_big_array_bg")]
    pub front_buffer: [u16; SCREEN_WIDTH * SCREEN_HEIGHT],

    pub is_cgb: bool,
}

mod serde_big_array_bg {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u16; 23040], s: S) -> Result<S::Ok, S::Error> {
        data.as_slice().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u16; 23040], D::Error> {
        let v = Vec::<u16>::deserialize(d)?;
        v.try_into()
            .map_err(|_| serde::de::Error::custom("wrong framebuffer length"))
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self {
            lcdc: 0,
            stat: 0,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            bgp: 0,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            cgb_bg_palette_index: 0,
            cgb_bg_palette_ram: [0; 64],
            cgb_obj_palette_index: 0,
            cgb_obj_palette_ram: [0; 64],
            scanline_cycles: 0,
            mode3_length: 172,
            window_line_counter: 0,
            stat_signal: false,
            back_buffer: [0; SCREEN_WIDTH * SCREEN_HEIGHT],
            front_buffer: [0; SCREEN_WIDTH * SCREEN_HEIGHT],
            is_cgb: false,
        }
    }
}

impl Ppu {
    #[must_use]
    pub const fn mode(&self) -> StatMode {
        match self.stat & 0b11 {
            0 => StatMode::HBlank,
            1 => StatMode::VBlank,
            2 => StatMode::OamSearch,
            _ => StatMode::PixelTransfer,
        }
    }

    const fn set_mode(&mut self, mode: StatMode) {
        self.stat = (self.stat & !0b11) | (mode as u8);
    }

    #[must_use]
    pub const fn lcd_enabled(&self) -> bool {
        self.lcdc & 0x80 != 0
    }

    /// Recomputes the four-way STAT OR signal and returns `true` on its
    /// rising edge only (one interrupt per edge, even if several sources
    /// assert in the same cycle).
    fn update_stat_signal(&mut self) -> bool {
        let lyc_match = self.ly == self.lyc;
        let level = (self.stat & 0x08 != 0 && matches!(self.mode(), StatMode::HBlank))
            || (self.stat & 0x10 != 0 && matches!(self.mode(), StatMode::VBlank))
            || (self.stat & 0x20 != 0 && matches!(self.mode(), StatMode::OamSearch))
            || (self.stat & 0x40 != 0 && lyc_match);

        self.stat = (self.stat & !0x04) | (u8::from(lyc_match) << 2);

        let rising = level && !self.stat_signal;
        self.stat_signal = level;
        rising
    }

    fn mode3_length_for_scx(&self) -> u16 {
        172 + match self.scx % 8 {
            0 => 0,
            1..=4 => 4,
            _ => 8,
        }
    }

    /// Advances the PPU by one machine cycle (4 T-states).
    pub fn step(&mut self) -> PpuStepOutput {
        let mut out = PpuStepOutput::default();
        if !self.lcd_enabled() {
            return out;
        }

        self.scanline_cycles += 4;

        match self.mode() {
            StatMode::OamSearch if self.scanline_cycles >= OAM_SEARCH_CYCLES => {
                self.mode3_length = self.mode3_length_for_scx();
                self.set_mode(StatMode::PixelTransfer);
            }
            StatMode::PixelTransfer if self.scanline_cycles >= OAM_SEARCH_CYCLES + self.mode3_length => {
                self.render_scanline();
                self.set_mode(StatMode::HBlank);
                out.hblank_entered = true;
            }
            StatMode::HBlank | StatMode::OamSearch | StatMode::PixelTransfer
                if self.scanline_cycles >= SCANLINE_CYCLES =>
            {
                self.advance_line(&mut out);
            }
            StatMode::VBlank if self.scanline_cycles >= SCANLINE_CYCLES => {
                self.advance_line(&mut out);
            }
            _ => {}
        }

        out.request_stat_irq = self.update_stat_signal();
        out
    }

    fn advance_line(&mut self, out: &mut PpuStepOutput) {
        self.scanline_cycles = 0;
        if self.ly == LAST_LINE {
            self.ly = 0;
            self.window_line_counter = 0;
            self.set_mode(StatMode::OamSearch);
        } else {
            self.ly += 1;
            if self.ly == VBLANK_START_LINE {
                self.set_mode(StatMode::VBlank);
                out.request_vblank_irq = true;
                out.frame_ready = true;
                std::mem::swap(&mut self.front_buffer, &mut self.back_buffer);
            } else if self.ly < VBLANK_START_LINE {
                self.set_mode(StatMode::OamSearch);
            }
        }
    }

    fn bg_color(&self, color_index: u8) -> u16 {
        let shade = (self.bgp >> (color_index * 2)) & 0b11;
        Self::dmg_shade_to_bgr555(shade)
    }

    const fn dmg_shade_to_bgr555(shade: u8) -> u16 {
        match shade {
            0 => 0x7FFF,
            1 => 0x56B5,
            2 => 0x2D6B,
            _ => 0x0000,
        }
    }

    /// Renders the whole current row into the back buffer. Background tiles
    /// are read through `vram`/`tile_maps`, callers pass already-resolved
    /// byte slices because VRAM bank selection (CGB) is owned by the bus.
    fn render_scanline(&mut self) {
        let row = usize::from(self.ly);
        if row >= SCREEN_HEIGHT {
            return;
        }
        // Background-only fallback renderer: the bus-level renderer in
        // `dmg::bus` calls `render_scanline_with` (below) once it has VRAM
        // access; this default keeps the buffer deterministic when no
        // background is enabled (LCDC bit 0 off, DMG only).
        if self.lcdc & 0x01 == 0 && !self.is_cgb {
            for x in 0..SCREEN_WIDTH {
                self.back_buffer[row * SCREEN_WIDTH + x] = self.bg_color(0);
            }
        }
    }

    /// Full compositor, invoked by the bus (which owns VRAM/OAM) once per
    /// scanline at the pixel-transfer boundary.
    #[allow(clippy::too_many_arguments)]
    pub fn render_scanline_with(
        &mut self,
        vram: &[u8],
        oam: &[u8],
        vram_bank1: Option<&[u8]>,
        bg_attr_map: Option<&[u8]>,
    ) {
        let row = usize::from(self.ly);
        if row >= SCREEN_HEIGHT {
            return;
        }

        let bg_window_enable = self.lcdc & 0x01 != 0 || self.is_cgb;
        let window_enable = self.lcdc & 0x20 != 0 && self.wy <= self.ly;
        let tile_data_signed = self.lcdc & 0x10 == 0;

        let mut bg_color_index_row = [0u8; SCREEN_WIDTH];
        let mut bg_priority_row = [false; SCREEN_WIDTH];

        for x in 0..SCREEN_WIDTH {
            let (map_base, tile_x, tile_y, using_window) =
                if window_enable && x + 7 >= usize::from(self.wx) {
                    let wx = x + 7 - usize::from(self.wx);
                    let map = if self.lcdc & 0x40 != 0 { 0x1C00 } else { 0x1800 };
                    (map, wx / 8, usize::from(self.window_line_counter) / 8, true)
                } else {
                    let bx = (usize::from(self.scx) + x) % 256;
                    let by = (usize::from(self.scy) + row) % 256;
                    let map = if self.lcdc & 0x08 != 0 { 0x1C00 } else { 0x1800 };
                    (map, bx / 8, by / 8, false)
                };

            let map_index = tile_y * 32 + tile_x;
            let tile_id = vram[map_base + map_index];

            let attr = bg_attr_map.map_or(0, |m| m[map_base + map_index]);
            let attr_bank = (attr & 0x08) != 0;
            let attr_palette = (attr & 0x07) as usize;
            let flip_x = attr & 0x20 != 0;
            let flip_y = attr & 0x40 != 0;
            let priority = attr & 0x80 != 0;

            let tile_addr = if tile_data_signed {
                let signed_id = i16::from(tile_id as i8);
                (0x1000 + signed_id * 16) as usize
            } else {
                0x0000 + usize::from(tile_id) * 16
            };

            let fine_y = if using_window {
                usize::from(self.window_line_counter) % 8
            } else {
                (usize::from(self.scy) + row) % 8
            };
            let fine_y = if flip_y { 7 - fine_y } else { fine_y };

            let bank = if attr_bank { vram_bank1.unwrap_or(vram) } else { vram };
            let lo = bank[tile_addr + fine_y * 2];
            let hi = bank[tile_addr + fine_y * 2 + 1];

            let fine_x = if using_window {
                (x + 7 - usize::from(self.wx)) % 8
            } else {
                (usize::from(self.scx) + x) % 8
            };
            let bit = if flip_x { fine_x } else { 7 - fine_x };
            let color_index = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);

            bg_color_index_row[x] = color_index;
            bg_priority_row[x] = priority;

            let color = if self.is_cgb {
                self.cgb_palette_color(&self.cgb_bg_palette_ram, attr_palette, color_index)
            } else {
                self.bg_color(color_index)
            };

            if bg_window_enable {
                self.back_buffer[row * SCREEN_WIDTH + x] = color;
            } else {
                self.back_buffer[row * SCREEN_WIDTH + x] = 0x7FFF;
            }
        }

        if window_enable {
            self.window_line_counter += 1;
        }

        if self.lcdc & 0x02 != 0 {
            self.render_sprites(oam, vram, vram_bank1, &bg_color_index_row, &bg_priority_row, row);
        }
    }

    fn cgb_palette_color(&self, ram: &[u8; 64], palette: usize, color_index: u8) -> u16 {
        let offset = palette * 8 + usize::from(color_index) * 2;
        let lo = ram[offset];
        let hi = ram[offset + 1];
        (u16::from(hi) << 8) | u16::from(lo)
    }

    fn render_sprites(
        &mut self,
        oam: &[u8],
        vram: &[u8],
        vram_bank1: Option<&[u8]>,
        bg_color_index_row: &[u8; SCREEN_WIDTH],
        bg_priority_row: &[bool; SCREEN_WIDTH],
        row: usize,
    ) {
        let tall = self.lcdc & 0x04 != 0;
        let sprite_height = if tall { 16 } else { 8 };

        let mut candidates: Vec<usize> = (0..40)
            .filter(|&i| {
                let y = i32::from(oam[i * 4]) - 16;
                let ly = i32::try_from(row).unwrap();
                ly >= y && ly < y + i32::from(sprite_height)
            })
            .take(10)
            .collect();

        if !self.is_cgb {
            candidates.sort_by_key(|&i| oam[i * 4 + 1]);
        }

        let bg_master_priority = self.is_cgb && self.lcdc & 0x01 == 0;

        for &i in candidates.iter().rev() {
            let y = i32::from(oam[i * 4]) - 16;
            let x = i32::from(oam[i * 4 + 1]) - 8;
            let mut tile = oam[i * 4 + 2];
            if tall {
                tile &= 0xFE;
            }
            let flags = oam[i * 4 + 3];
            let flip_x = flags & 0x20 != 0;
            let flip_y = flags & 0x40 != 0;
            let behind_bg = flags & 0x80 != 0;
            let palette_dmg = if flags & 0x10 != 0 { self.obp1 } else { self.obp0 };
            let cgb_bank = flags & 0x08 != 0;
            let cgb_palette = (flags & 0x07) as usize;

            let mut line = i32::try_from(row).unwrap() - y;
            if flip_y {
                line = i32::from(sprite_height) - 1 - line;
            }

            let bank = if cgb_bank { vram_bank1.unwrap_or(vram) } else { vram };
            let tile_addr = usize::from(tile) * 16 + (line as usize) * 2;
            let lo = bank[tile_addr];
            let hi = bank[tile_addr + 1];

            for px in 0..8 {
                let screen_x = x + px;
                if screen_x < 0 || screen_x as usize >= SCREEN_WIDTH {
                    continue;
                }
                let screen_x = screen_x as usize;
                let bit = if flip_x { px } else { 7 - px };
                let color_index = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
                if color_index == 0 {
                    continue;
                }

                let bg_opaque = bg_color_index_row[screen_x] != 0;
                let hidden_by_bg = if bg_master_priority {
                    false
                } else {
                    (behind_bg || bg_priority_row[screen_x]) && bg_opaque
                };
                if hidden_by_bg {
                    continue;
                }

                let color = if self.is_cgb {
                    self.cgb_palette_color(&self.cgb_obj_palette_ram, cgb_palette, color_index)
                } else {
                    let shade = (palette_dmg >> (color_index * 2)) & 0b11;
                    Self::dmg_shade_to_bgr555(shade)
                };
                self.back_buffer[row * SCREEN_WIDTH + screen_x] = color;
            }
        }
    }
}
