//! LR35902 fetch-decode-execute core.
//!
//! Every memory access ticks the bus by exactly one machine cycle, so
//! peripherals (timer, PPU, serial) observe the same cycle-by-cycle timing
//! the real chip would produce mid-instruction, not just between
//! instructions.

use serde::{Deserialize, Serialize};

use crate::dmg::bus::Bus;
use crate::dmg::registers::{flag_bit, Mode, Registers};

#[derive(Default, Serialize, Deserialize)]
pub struct Cpu {
    pub regs: Registers,
    /// Counts down to zero after `EI`; `IME` is set exactly when it reaches
    /// zero, one instruction after the one following `EI`.
    ime_enable_delay: u8,
}

impl Cpu {
    /// Builds a CPU with registers already at the post-boot-ROM state
    /// (`Registers::post_boot`), since this core never executes a boot ROM.
    #[must_use]
    pub fn new(is_cgb: bool) -> Self {
        Self {
            regs: Registers::post_boot(is_cgb),
            ime_enable_delay: 0,
        }
    }

    fn read8(&mut self, bus: &mut Bus, addr: u16) -> u8 {
        let value = bus.read(addr);
        bus.step();
        value
    }

    fn write8(&mut self, bus: &mut Bus, addr: u16, value: u8) {
        bus.write(addr, value);
        bus.step();
    }

    fn internal_delay(&mut self, bus: &mut Bus) {
        bus.step();
    }

    fn fetch8(&mut self, bus: &mut Bus) -> u8 {
        let value = self.read8(bus, self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    /// Fetches the opcode byte. Honors the HALT bug: the first fetch after
    /// `HaltBug` mode reads the same byte again on the *next* call, since PC
    /// isn't advanced this time.
    fn fetch_opcode(&mut self, bus: &mut Bus) -> u8 {
        let opcode = self.read8(bus, self.regs.pc);
        if self.regs.mode == Mode::HaltBug {
            self.regs.mode = Mode::Running;
        } else {
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }
        opcode
    }

    /// Runs one instruction, or services a pending interrupt, or idles one
    /// cycle while halted/stopped.
    pub fn step(&mut self, bus: &mut Bus) {
        if self.ime_enable_delay > 0 {
            self.ime_enable_delay -= 1;
            if self.ime_enable_delay == 0 {
                self.regs.ime = true;
            }
        }

        if self.regs.mode == Mode::Stopped {
            if bus.joypad.any_selected_line_active() {
                self.regs.mode = Mode::Running;
            } else {
                bus.step();
                return;
            }
        }

        if self.regs.mode == Mode::Halted {
            if bus.interrupts.has_pending() {
                self.regs.mode = Mode::Running;
            } else {
                bus.step();
                return;
            }
        }

        if self.regs.ime && bus.interrupts.has_pending() {
            self.service_interrupt(bus);
            return;
        }

        let opcode = self.fetch_opcode(bus);
        self.execute(bus, opcode);
    }

    fn service_interrupt(&mut self, bus: &mut Bus) {
        self.regs.ime = false;
        self.internal_delay(bus);
        self.internal_delay(bus);
        let (kind, vector) = bus
            .interrupts
            .highest_priority()
            .expect("has_pending() just confirmed a pending interrupt");
        self.push(bus, self.regs.pc);
        bus.interrupts.clear(kind);
        self.regs.pc = vector;
    }

    // -- register file helpers -------------------------------------------

    fn read_r8(&mut self, bus: &mut Bus, idx: u8) -> u8 {
        match idx {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            6 => self.read8(bus, self.regs.hl()),
            7 => self.regs.a,
            _ => unreachable!("register index is always masked to 3 bits"),
        }
    }

    fn write_r8(&mut self, bus: &mut Bus, idx: u8, value: u8) {
        match idx {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            6 => self.write8(bus, self.regs.hl(), value),
            7 => self.regs.a = value,
            _ => unreachable!("register index is always masked to 3 bits"),
        }
    }

    fn read_rp(&self, idx: u8) -> u16 {
        match idx {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            3 => self.regs.sp,
            _ => unreachable!("pair index is always masked to 2 bits"),
        }
    }

    fn write_rp(&mut self, idx: u8, value: u16) {
        match idx {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            3 => self.regs.sp = value,
            _ => unreachable!("pair index is always masked to 2 bits"),
        }
    }

    fn read_rp2(&self, idx: u8) -> u16 {
        match idx {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            3 => self.regs.af(),
            _ => unreachable!("pair index is always masked to 2 bits"),
        }
    }

    fn write_rp2(&mut self, idx: u8, value: u16) {
        match idx {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            3 => self.regs.set_af(value),
            _ => unreachable!("pair index is always masked to 2 bits"),
        }
    }

    const fn check_cc(&self, idx: u8) -> bool {
        match idx {
            0 => !self.regs.zero(),
            1 => self.regs.zero(),
            2 => !self.regs.carry(),
            3 => self.regs.carry(),
            _ => unreachable!("condition index is always masked to 2 bits"),
        }
    }

    // -- stack --------------------------------------------------------------

    fn push(&mut self, bus: &mut Bus, value: u16) {
        self.internal_delay(bus);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(bus, self.regs.sp, (value >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(bus, self.regs.sp, value as u8);
    }

    fn pop(&mut self, bus: &mut Bus) -> u16 {
        let low = self.read8(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let high = self.read8(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        (u16::from(high) << 8) | u16::from(low)
    }

    // -- arithmetic/logic ---------------------------------------------------

    fn sub_impl(&mut self, value: u8, carry_in: u8) -> u8 {
        let a = self.regs.a;
        let result = a.wrapping_sub(value).wrapping_sub(carry_in);
        let half = (a & 0xF) < (value & 0xF) + carry_in;
        let full = u16::from(a) < u16::from(value) + u16::from(carry_in);
        self.regs.set_flag(flag_bit::ZERO, result == 0);
        self.regs.set_flag(flag_bit::SUBTRACT, true);
        self.regs.set_flag(flag_bit::HALF_CARRY, half);
        self.regs.set_flag(flag_bit::CARRY, full);
        result
    }

    fn alu_add(&mut self, value: u8, with_carry: bool) {
        let carry_in = u8::from(with_carry && self.regs.carry());
        let a = self.regs.a;
        let (r1, c1) = a.overflowing_add(value);
        let (result, c2) = r1.overflowing_add(carry_in);
        let half = (a & 0xF) + (value & 0xF) + carry_in > 0xF;
        self.regs.a = result;
        self.regs.set_flag(flag_bit::ZERO, result == 0);
        self.regs.set_flag(flag_bit::SUBTRACT, false);
        self.regs.set_flag(flag_bit::HALF_CARRY, half);
        self.regs.set_flag(flag_bit::CARRY, c1 || c2);
    }

    fn alu_sub(&mut self, value: u8, with_carry: bool) {
        let carry_in = u8::from(with_carry && self.regs.carry());
        self.regs.a = self.sub_impl(value, carry_in);
    }

    fn alu_cp(&mut self, value: u8) {
        self.sub_impl(value, 0);
    }

    fn alu_and(&mut self, value: u8) {
        self.regs.a &= value;
        let z = self.regs.a == 0;
        self.regs.set_flag(flag_bit::ZERO, z);
        self.regs.set_flag(flag_bit::SUBTRACT, false);
        self.regs.set_flag(flag_bit::HALF_CARRY, true);
        self.regs.set_flag(flag_bit::CARRY, false);
    }

    fn alu_xor(&mut self, value: u8) {
        self.regs.a ^= value;
        let z = self.regs.a == 0;
        self.regs.set_flag(flag_bit::ZERO, z);
        self.regs.set_flag(flag_bit::SUBTRACT, false);
        self.regs.set_flag(flag_bit::HALF_CARRY, false);
        self.regs.set_flag(flag_bit::CARRY, false);
    }

    fn alu_or(&mut self, value: u8) {
        self.regs.a |= value;
        let z = self.regs.a == 0;
        self.regs.set_flag(flag_bit::ZERO, z);
        self.regs.set_flag(flag_bit::SUBTRACT, false);
        self.regs.set_flag(flag_bit::HALF_CARRY, false);
        self.regs.set_flag(flag_bit::CARRY, false);
    }

    fn alu_apply(&mut self, op: u8, value: u8) {
        match op {
            0 => self.alu_add(value, false),
            1 => self.alu_add(value, true),
            2 => self.alu_sub(value, false),
            3 => self.alu_sub(value, true),
            4 => self.alu_and(value),
            5 => self.alu_xor(value),
            6 => self.alu_or(value),
            7 => self.alu_cp(value),
            _ => unreachable!("ALU op index is always masked to 3 bits"),
        }
    }

    fn inc_r8_value(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.regs.set_flag(flag_bit::ZERO, result == 0);
        self.regs.set_flag(flag_bit::SUBTRACT, false);
        self.regs.set_flag(flag_bit::HALF_CARRY, value & 0xF == 0xF);
        result
    }

    fn dec_r8_value(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.regs.set_flag(flag_bit::ZERO, result == 0);
        self.regs.set_flag(flag_bit::SUBTRACT, true);
        self.regs.set_flag(flag_bit::HALF_CARRY, value & 0xF == 0);
        result
    }

    fn add_hl_rr(&mut self, value: u16) {
        let hl = self.regs.hl();
        let (result, carry) = hl.overflowing_add(value);
        let half = (hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF;
        self.regs.set_hl(result);
        self.regs.set_flag(flag_bit::SUBTRACT, false);
        self.regs.set_flag(flag_bit::HALF_CARRY, half);
        self.regs.set_flag(flag_bit::CARRY, carry);
    }

    fn add_sp_r8(&mut self, bus: &mut Bus) -> u16 {
        let offset = self.fetch8(bus) as i8;
        let sp = self.regs.sp;
        let signed_offset = offset as i16 as u16;
        let half = (sp & 0xF) + (signed_offset & 0xF) > 0xF;
        let full = (sp & 0xFF) + (signed_offset & 0xFF) > 0xFF;
        self.regs.set_flag(flag_bit::ZERO, false);
        self.regs.set_flag(flag_bit::SUBTRACT, false);
        self.regs.set_flag(flag_bit::HALF_CARRY, half);
        self.regs.set_flag(flag_bit::CARRY, full);
        sp.wrapping_add(signed_offset)
    }

    fn daa(&mut self) {
        let mut a = self.regs.a;
        let mut adjust = 0u8;
        let mut carry = self.regs.carry();
        if self.regs.half_carry() || (!self.regs.subtract() && (a & 0xF) > 9) {
            adjust |= 0x06;
        }
        if carry || (!self.regs.subtract() && a > 0x99) {
            adjust |= 0x60;
            carry = true;
        }
        a = if self.regs.subtract() {
            a.wrapping_sub(adjust)
        } else {
            a.wrapping_add(adjust)
        };
        self.regs.a = a;
        self.regs.set_flag(flag_bit::ZERO, a == 0);
        self.regs.set_flag(flag_bit::HALF_CARRY, false);
        self.regs.set_flag(flag_bit::CARRY, carry);
    }

    // -- rotate/shift (shared by RLCA..CCF and the CB table) ---------------

    fn rotate_flags(&mut self, result: u8, carry: bool, force_z_false: bool) {
        let z = !force_z_false && result == 0;
        self.regs.set_flag(flag_bit::ZERO, z);
        self.regs.set_flag(flag_bit::SUBTRACT, false);
        self.regs.set_flag(flag_bit::HALF_CARRY, false);
        self.regs.set_flag(flag_bit::CARRY, carry);
    }

    fn op_rlc(&mut self, v: u8, force_z_false: bool) -> u8 {
        let carry = v & 0x80 != 0;
        let r = (v << 1) | u8::from(carry);
        self.rotate_flags(r, carry, force_z_false);
        r
    }

    fn op_rrc(&mut self, v: u8, force_z_false: bool) -> u8 {
        let carry = v & 0x01 != 0;
        let r = (v >> 1) | (u8::from(carry) << 7);
        self.rotate_flags(r, carry, force_z_false);
        r
    }

    fn op_rl(&mut self, v: u8, force_z_false: bool) -> u8 {
        let old_carry = u8::from(self.regs.carry());
        let carry = v & 0x80 != 0;
        let r = (v << 1) | old_carry;
        self.rotate_flags(r, carry, force_z_false);
        r
    }

    fn op_rr(&mut self, v: u8, force_z_false: bool) -> u8 {
        let old_carry = u8::from(self.regs.carry());
        let carry = v & 0x01 != 0;
        let r = (v >> 1) | (old_carry << 7);
        self.rotate_flags(r, carry, force_z_false);
        r
    }

    fn op_sla(&mut self, v: u8) -> u8 {
        let carry = v & 0x80 != 0;
        let r = v << 1;
        self.rotate_flags(r, carry, false);
        r
    }

    fn op_sra(&mut self, v: u8) -> u8 {
        let carry = v & 0x01 != 0;
        let r = (v >> 1) | (v & 0x80);
        self.rotate_flags(r, carry, false);
        r
    }

    fn op_swap(&mut self, v: u8) -> u8 {
        let r = (v << 4) | (v >> 4);
        self.regs.set_flag(flag_bit::ZERO, r == 0);
        self.regs.set_flag(flag_bit::SUBTRACT, false);
        self.regs.set_flag(flag_bit::HALF_CARRY, false);
        self.regs.set_flag(flag_bit::CARRY, false);
        r
    }

    fn op_srl(&mut self, v: u8) -> u8 {
        let carry = v & 0x01 != 0;
        let r = v >> 1;
        self.rotate_flags(r, carry, false);
        r
    }

    fn op_bit(&mut self, v: u8, bit: u8) {
        self.regs.set_flag(flag_bit::ZERO, v & (1 << bit) == 0);
        self.regs.set_flag(flag_bit::SUBTRACT, false);
        self.regs.set_flag(flag_bit::HALF_CARRY, true);
    }

    // -- control flow --------------------------------------------------------

    fn jr(&mut self, bus: &mut Bus, taken: bool) {
        let offset = self.fetch8(bus) as i8;
        if taken {
            self.internal_delay(bus);
            self.regs.pc = self.regs.pc.wrapping_add(offset as i16 as u16);
        }
    }

    fn jp_imm(&mut self, bus: &mut Bus, taken: bool) {
        let low = self.fetch8(bus);
        let high = self.fetch8(bus);
        if taken {
            self.internal_delay(bus);
            self.regs.pc = (u16::from(high) << 8) | u16::from(low);
        }
    }

    fn call_imm(&mut self, bus: &mut Bus, taken: bool) {
        let low = self.fetch8(bus);
        let high = self.fetch8(bus);
        if taken {
            let target = (u16::from(high) << 8) | u16::from(low);
            let return_addr = self.regs.pc;
            self.push(bus, return_addr);
            self.regs.pc = target;
        }
    }

    fn ret(&mut self, bus: &mut Bus) {
        let pc = self.pop(bus);
        self.regs.pc = pc;
        self.internal_delay(bus);
    }

    // -- CB-prefixed table ----------------------------------------------------

    fn execute_cb(&mut self, bus: &mut Bus) {
        let opcode = self.fetch8(bus);
        let z = opcode & 7;
        let y = (opcode >> 3) & 7;
        let x = opcode >> 6;

        let value = self.read_r8(bus, z);
        match x {
            0 => {
                let result = match y {
                    0 => self.op_rlc(value, false),
                    1 => self.op_rrc(value, false),
                    2 => self.op_rl(value, false),
                    3 => self.op_rr(value, false),
                    4 => self.op_sla(value),
                    5 => self.op_sra(value),
                    6 => self.op_swap(value),
                    7 => self.op_srl(value),
                    _ => unreachable!("CB sub-op index is always masked to 3 bits"),
                };
                self.write_r8(bus, z, result);
            }
            1 => self.op_bit(value, y),
            2 => self.write_r8(bus, z, value & !(1 << y)),
            3 => self.write_r8(bus, z, value | (1 << y)),
            _ => unreachable!("CB group index is always masked to 2 bits"),
        }
    }

    // -- main dispatch ----------------------------------------------------------

    #[allow(clippy::too_many_lines)]
    fn execute(&mut self, bus: &mut Bus, opcode: u8) {
        if opcode == 0xCB {
            self.execute_cb(bus);
            return;
        }

        let x = opcode >> 6;
        let y = (opcode >> 3) & 7;
        let z = opcode & 7;
        let p = y >> 1;
        let q = y & 1;

        match x {
            0 => match z {
                0 => match y {
                    0 => {}
                    1 => {
                        let low = self.fetch8(bus);
                        let high = self.fetch8(bus);
                        let addr = (u16::from(high) << 8) | u16::from(low);
                        let sp = self.regs.sp;
                        self.write8(bus, addr, sp as u8);
                        self.write8(bus, addr.wrapping_add(1), (sp >> 8) as u8);
                    }
                    2 => {
                        let _padding = self.fetch8(bus);
                        if bus.is_cgb && bus.perform_speed_switch_if_requested() {
                            // resumes immediately at (near) full speed
                        } else if !bus.joypad.any_selected_line_active() {
                            self.regs.mode = Mode::Stopped;
                        }
                    }
                    3 => self.jr(bus, true),
                    cc => self.jr(bus, self.check_cc(cc - 4)),
                },
                1 => {
                    if q == 0 {
                        let low = self.fetch8(bus);
                        let high = self.fetch8(bus);
                        self.write_rp(p, (u16::from(high) << 8) | u16::from(low));
                    } else {
                        self.internal_delay(bus);
                        self.add_hl_rr(self.read_rp(p));
                    }
                }
                2 => {
                    let addr = match p {
                        0 => self.regs.bc(),
                        1 => self.regs.de(),
                        2 => {
                            let hl = self.regs.hl();
                            self.regs.set_hl(hl.wrapping_add(1));
                            hl
                        }
                        3 => {
                            let hl = self.regs.hl();
                            self.regs.set_hl(hl.wrapping_sub(1));
                            hl
                        }
                        _ => unreachable!("pair index is always masked to 2 bits"),
                    };
                    if q == 0 {
                        let a = self.regs.a;
                        self.write8(bus, addr, a);
                    } else {
                        self.regs.a = self.read8(bus, addr);
                    }
                }
                3 => {
                    self.internal_delay(bus);
                    let value = self.read_rp(p);
                    if q == 0 {
                        self.write_rp(p, value.wrapping_add(1));
                    } else {
                        self.write_rp(p, value.wrapping_sub(1));
                    }
                }
                4 => {
                    let v = self.read_r8(bus, y);
                    let r = self.inc_r8_value(v);
                    self.write_r8(bus, y, r);
                }
                5 => {
                    let v = self.read_r8(bus, y);
                    let r = self.dec_r8_value(v);
                    self.write_r8(bus, y, r);
                }
                6 => {
                    let v = self.fetch8(bus);
                    self.write_r8(bus, y, v);
                }
                7 => match y {
                    0 => {
                        let a = self.regs.a;
                        self.regs.a = self.op_rlc(a, true);
                    }
                    1 => {
                        let a = self.regs.a;
                        self.regs.a = self.op_rrc(a, true);
                    }
                    2 => {
                        let a = self.regs.a;
                        self.regs.a = self.op_rl(a, true);
                    }
                    3 => {
                        let a = self.regs.a;
                        self.regs.a = self.op_rr(a, true);
                    }
                    4 => self.daa(),
                    5 => {
                        self.regs.a = !self.regs.a;
                        self.regs.set_flag(flag_bit::SUBTRACT, true);
                        self.regs.set_flag(flag_bit::HALF_CARRY, true);
                    }
                    6 => {
                        self.regs.set_flag(flag_bit::SUBTRACT, false);
                        self.regs.set_flag(flag_bit::HALF_CARRY, false);
                        self.regs.set_flag(flag_bit::CARRY, true);
                    }
                    7 => {
                        let carry = self.regs.carry();
                        self.regs.set_flag(flag_bit::SUBTRACT, false);
                        self.regs.set_flag(flag_bit::HALF_CARRY, false);
                        self.regs.set_flag(flag_bit::CARRY, !carry);
                    }
                    _ => unreachable!("y is always masked to 3 bits"),
                },
                _ => unreachable!("z is always masked to 3 bits"),
            },
            1 => {
                if y == 6 && z == 6 {
                    if self.regs.ime {
                        self.regs.mode = Mode::Halted;
                    } else if bus.interrupts.has_pending() {
                        self.regs.mode = Mode::HaltBug;
                    } else {
                        self.regs.mode = Mode::Halted;
                    }
                } else {
                    let v = self.read_r8(bus, z);
                    self.write_r8(bus, y, v);
                }
            }
            2 => {
                let v = self.read_r8(bus, z);
                self.alu_apply(y, v);
            }
            3 => match z {
                0 => match y {
                    0..=3 => {
                        self.internal_delay(bus);
                        if self.check_cc(y) {
                            self.ret(bus);
                        }
                    }
                    4 => {
                        let offset = self.fetch8(bus);
                        let a = self.regs.a;
                        self.write8(bus, 0xFF00 | u16::from(offset), a);
                    }
                    5 => {
                        let result = self.add_sp_r8(bus);
                        self.internal_delay(bus);
                        self.internal_delay(bus);
                        self.regs.sp = result;
                    }
                    6 => {
                        let offset = self.fetch8(bus);
                        self.regs.a = self.read8(bus, 0xFF00 | u16::from(offset));
                    }
                    7 => {
                        let result = self.add_sp_r8(bus);
                        self.internal_delay(bus);
                        self.regs.set_hl(result);
                    }
                    _ => unreachable!("y is always masked to 3 bits"),
                },
                1 => {
                    if q == 0 {
                        let value = self.pop(bus);
                        self.write_rp2(p, value);
                    } else {
                        match p {
                            0 => self.ret(bus),
                            1 => {
                                self.ret(bus);
                                self.regs.ime = true;
                                self.ime_enable_delay = 0;
                            }
                            2 => self.regs.pc = self.regs.hl(),
                            3 => {
                                self.internal_delay(bus);
                                self.regs.sp = self.regs.hl();
                            }
                            _ => unreachable!("p is always masked to 2 bits"),
                        }
                    }
                }
                2 => match y {
                    0..=3 => self.jp_imm(bus, self.check_cc(y)),
                    4 => {
                        let a = self.regs.a;
                        self.write8(bus, 0xFF00 | u16::from(self.regs.c), a);
                    }
                    5 => {
                        let low = self.fetch8(bus);
                        let high = self.fetch8(bus);
                        let addr = (u16::from(high) << 8) | u16::from(low);
                        let a = self.regs.a;
                        self.write8(bus, addr, a);
                    }
                    6 => self.regs.a = self.read8(bus, 0xFF00 | u16::from(self.regs.c)),
                    7 => {
                        let low = self.fetch8(bus);
                        let high = self.fetch8(bus);
                        let addr = (u16::from(high) << 8) | u16::from(low);
                        self.regs.a = self.read8(bus, addr);
                    }
                    _ => unreachable!("y is always masked to 3 bits"),
                },
                3 => match y {
                    0 => self.jp_imm(bus, true),
                    6 => {
                        self.regs.ime = false;
                        self.ime_enable_delay = 0;
                    }
                    7 => self.ime_enable_delay = 2,
                    _ => tracing::warn!(opcode, "executed an illegal LR35902 opcode; treated as a stall"),
                },
                4 => match y {
                    0..=3 => self.call_imm(bus, self.check_cc(y)),
                    _ => tracing::warn!(opcode, "executed an illegal LR35902 opcode; treated as a stall"),
                },
                5 => {
                    if q == 0 {
                        let value = self.read_rp2(p);
                        self.push(bus, value);
                    } else if p == 0 {
                        self.call_imm(bus, true);
                    } else {
                        tracing::warn!(opcode, "executed an illegal LR35902 opcode; treated as a stall");
                    }
                }
                6 => {
                    let v = self.fetch8(bus);
                    self.alu_apply(y, v);
                }
                7 => {
                    self.push(bus, self.regs.pc);
                    self.regs.pc = u16::from(y) * 8;
                }
                _ => unreachable!("z is always masked to 3 bits"),
            },
            _ => unreachable!("x is always masked to 2 bits"),
        }
    }
}
