use log::debug;
use thiserror::Error;

use crate::interrupts::Interrupt;
use crate::mmu::Mmu;

#[cfg(feature = "cpu-trace")]
macro_rules! cpu_trace {
    ($($arg:tt)*) => {
        log::trace!(target: "gbmu_core::cpu", $($arg)*);
    };
}
#[cfg(not(feature = "cpu-trace"))]
macro_rules! cpu_trace {
    ($($arg:tt)*) => {};
}

// CPU flag bits as documented in gbdev.io/pandocs/The_CPU_Flags.html
const FLAG_Z: u8 = 0x80; // Zero
const FLAG_N: u8 = 0x40; // Subtract
const FLAG_H: u8 = 0x20; // Half Carry
const FLAG_C: u8 = 0x10; // Carry

// Post-boot CPU state from gbdev.io/pandocs/Power_Up_State.html
const BOOT_AF: u16 = 0x01B0;
const BOOT_BC: u16 = 0x0013;
const BOOT_DE: u16 = 0x00D8;
const BOOT_HL: u16 = 0x014D;
const BOOT_SP: u16 = 0xFFFE;
const BOOT_PC: u16 = 0x0100;

const DOTS_PER_M_CYCLE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("unimplemented opcode {opcode:#04X} (CB-prefixed: {prefixed}) at {pc:#06X}")]
    UnimplementedOpcode { opcode: u8, prefixed: bool, pc: u16 },
}

/// Two 8-bit registers addressed together as one 16-bit value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegPair(pub u16);

impl RegPair {
    #[inline(always)]
    pub fn hi(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline(always)]
    pub fn lo(self) -> u8 {
        self.0 as u8
    }

    #[inline(always)]
    pub fn set_hi(&mut self, val: u8) {
        self.0 = (self.0 & 0x00FF) | ((val as u16) << 8);
    }

    #[inline(always)]
    pub fn set_lo(&mut self, val: u8) {
        self.0 = (self.0 & 0xFF00) | val as u16;
    }
}

/// LR35902 register file. F's low nibble is forced to zero on every write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub af: RegPair,
    pub bc: RegPair,
    pub de: RegPair,
    pub hl: RegPair,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    pub fn post_boot() -> Self {
        Self {
            af: RegPair(BOOT_AF),
            bc: RegPair(BOOT_BC),
            de: RegPair(BOOT_DE),
            hl: RegPair(BOOT_HL),
            sp: BOOT_SP,
            pc: BOOT_PC,
        }
    }

    #[inline(always)]
    pub fn a(&self) -> u8 {
        self.af.hi()
    }

    #[inline(always)]
    pub fn set_a(&mut self, val: u8) {
        self.af.set_hi(val);
    }

    #[inline(always)]
    pub fn f(&self) -> u8 {
        self.af.lo()
    }

    #[inline(always)]
    pub fn set_f(&mut self, val: u8) {
        self.af.set_lo(val & 0xF0);
    }

    pub fn set_af(&mut self, val: u16) {
        self.af = RegPair(val & 0xFFF0);
    }

    #[inline(always)]
    fn carry(&self) -> bool {
        self.f() & FLAG_C != 0
    }

    /// 16-bit operand group used by LD/INC/DEC/ADD HL: BC, DE, HL, SP.
    fn r16(&self, index: u8) -> u16 {
        match index & 0x03 {
            0 => self.bc.0,
            1 => self.de.0,
            2 => self.hl.0,
            _ => self.sp,
        }
    }

    fn set_r16(&mut self, index: u8, val: u16) {
        match index & 0x03 {
            0 => self.bc.0 = val,
            1 => self.de.0 = val,
            2 => self.hl.0 = val,
            _ => self.sp = val,
        }
    }

    /// 16-bit operand group used by PUSH/POP: BC, DE, HL, AF.
    fn r16_stack(&self, index: u8) -> u16 {
        match index & 0x03 {
            0 => self.bc.0,
            1 => self.de.0,
            2 => self.hl.0,
            _ => self.af.0,
        }
    }

    fn set_r16_stack(&mut self, index: u8, val: u16) {
        match index & 0x03 {
            0 => self.bc.0 = val,
            1 => self.de.0 = val,
            2 => self.hl.0 = val,
            _ => self.set_af(val),
        }
    }

    /// Branch condition encoded in opcode bits 3-4: NZ, Z, NC, C.
    fn condition(&self, index: u8) -> bool {
        let f = self.f();
        match index & 0x03 {
            0 => f & FLAG_Z == 0,
            1 => f & FLAG_Z != 0,
            2 => f & FLAG_C == 0,
            _ => f & FLAG_C != 0,
        }
    }
}

pub struct Cpu {
    pub regs: Registers,
    pub ime: bool,
    pub halted: bool,
    pub stopped: bool,
    /// EI executed; IME turns on at the next instruction boundary.
    ime_pending: bool,
    /// Next opcode fetch does not advance PC.
    halt_bug: bool,
    /// Dots left before the next instruction boundary.
    busy_dots: u32,
    /// Dots consumed by the instruction being executed.
    instr_dots: u32,
    /// Total dots elapsed.
    pub cycles: u64,
    fault: Option<CpuError>,
}

impl Cpu {
    /// CPU in the post-boot state, about to execute 0x0100.
    pub fn new() -> Self {
        Self::with_registers(Registers::post_boot())
    }

    /// CPU at power-on, about to execute a boot program from 0x0000.
    pub fn new_power_on() -> Self {
        Self::with_registers(Registers::default())
    }

    fn with_registers(regs: Registers) -> Self {
        Self {
            regs,
            ime: false,
            halted: false,
            stopped: false,
            ime_pending: false,
            halt_bug: false,
            busy_dots: 0,
            instr_dots: 0,
            cycles: 0,
            fault: None,
        }
    }

    /// True between instructions, when the next `step` will fetch or service.
    pub fn at_boundary(&self) -> bool {
        self.busy_dots == 0
    }

    pub fn fault(&self) -> Option<CpuError> {
        self.fault
    }

    /// Formatted CPU state string for debugging.
    pub fn debug_state(&self) -> String {
        format!(
            "AF:{:04X} BC:{:04X} DE:{:04X} HL:{:04X} PC:{:04X} SP:{:04X} CY:{}",
            self.regs.af.0,
            self.regs.bc.0,
            self.regs.de.0,
            self.regs.hl.0,
            self.regs.pc,
            self.regs.sp,
            self.cycles
        )
    }

    #[inline(always)]
    fn tick(&mut self, m_cycles: u32) {
        self.instr_dots += m_cycles * DOTS_PER_M_CYCLE;
    }

    #[inline(always)]
    fn fetch8(&mut self, mmu: &mut Mmu) -> u8 {
        let val = mmu.read_byte(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.tick(1);
        val
    }

    #[inline(always)]
    fn fetch16(&mut self, mmu: &mut Mmu) -> u16 {
        let lo = self.fetch8(mmu) as u16;
        let hi = self.fetch8(mmu) as u16;
        (hi << 8) | lo
    }

    #[inline(always)]
    fn read8(&mut self, mmu: &mut Mmu, addr: u16) -> u8 {
        let val = mmu.read_byte(addr);
        self.tick(1);
        val
    }

    #[inline(always)]
    fn write8(&mut self, mmu: &mut Mmu, addr: u16, val: u8) {
        mmu.write_byte(addr, val);
        self.tick(1);
    }

    fn push_stack(&mut self, mmu: &mut Mmu, val: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(mmu, self.regs.sp, (val >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(mmu, self.regs.sp, val as u8);
    }

    fn pop_stack(&mut self, mmu: &mut Mmu) -> u16 {
        let lo = self.read8(mmu, self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = self.read8(mmu, self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        (hi << 8) | lo
    }

    /// 8-bit operand selected by a 3-bit field; index 6 is the byte at (HL).
    fn read_r8(&mut self, mmu: &mut Mmu, index: u8) -> u8 {
        match index & 0x07 {
            0 => self.regs.bc.hi(),
            1 => self.regs.bc.lo(),
            2 => self.regs.de.hi(),
            3 => self.regs.de.lo(),
            4 => self.regs.hl.hi(),
            5 => self.regs.hl.lo(),
            6 => self.read8(mmu, self.regs.hl.0),
            _ => self.regs.a(),
        }
    }

    fn write_r8(&mut self, mmu: &mut Mmu, index: u8, val: u8) {
        match index & 0x07 {
            0 => self.regs.bc.set_hi(val),
            1 => self.regs.bc.set_lo(val),
            2 => self.regs.de.set_hi(val),
            3 => self.regs.de.set_lo(val),
            4 => self.regs.hl.set_hi(val),
            5 => self.regs.hl.set_lo(val),
            6 => self.write8(mmu, self.regs.hl.0, val),
            _ => self.regs.set_a(val),
        }
    }

    /// Advance by one dot.
    ///
    /// An instruction runs in full on the first dot of its slot and the CPU
    /// then idles for the rest of its cost, so memory side effects land on
    /// instruction boundaries. Once an undefined opcode has been hit every
    /// later call returns the same error.
    pub fn step(&mut self, mmu: &mut Mmu) -> Result<(), CpuError> {
        if let Some(err) = self.fault {
            return Err(err);
        }
        self.cycles += 1;

        if self.busy_dots > 0 {
            self.busy_dots -= 1;
            return Ok(());
        }

        if self.stopped {
            if !mmu.interrupts.is_pending(Interrupt::Joypad) {
                return Ok(());
            }
            self.stopped = false;
            debug!("STOP left at PC={:04X}", self.regs.pc);
        }

        self.instr_dots = 0;
        let fired = mmu.interrupts.fired();

        if self.ime && fired != 0 {
            self.service_interrupt(mmu, fired);
        } else {
            if self.halted {
                if fired == 0 {
                    return Ok(());
                }
                // With IME clear the CPU wakes without servicing.
                self.halted = false;
            }

            if self.ime_pending {
                self.ime_pending = false;
                self.ime = true;
            }

            if let Err(err) = self.execute(mmu) {
                self.fault = Some(err);
                return Err(err);
            }
        }

        self.busy_dots = self.instr_dots.saturating_sub(1);
        Ok(())
    }

    fn service_interrupt(&mut self, mmu: &mut Mmu, fired: u8) {
        let Some(interrupt) = Interrupt::highest_priority(fired) else {
            return;
        };
        mmu.interrupts.acknowledge(interrupt);
        self.ime = false;
        self.ime_pending = false;
        self.halted = false;
        // Two wait states, two stack writes, then the jump: 5 M-cycles.
        self.tick(2);
        let pc = self.regs.pc;
        self.push_stack(mmu, pc);
        self.tick(1);
        self.regs.pc = interrupt.vector();
        cpu_trace!("IRQ {:?} -> {:04X}", interrupt, self.regs.pc);
    }

    fn execute(&mut self, mmu: &mut Mmu) -> Result<(), CpuError> {
        let pc = self.regs.pc;
        let opcode = if self.halt_bug {
            self.halt_bug = false;
            self.read8(mmu, pc)
        } else {
            self.fetch8(mmu)
        };
        cpu_trace!("{:02X} {}", opcode, self.debug_state());

        match opcode {
            0x00 => {}
            opcode @ (0x01 | 0x11 | 0x21 | 0x31) => {
                let val = self.fetch16(mmu);
                self.regs.set_r16(opcode >> 4, val);
            }
            0x02 => self.write8(mmu, self.regs.bc.0, self.regs.a()),
            0x12 => self.write8(mmu, self.regs.de.0, self.regs.a()),
            0x22 => {
                let addr = self.regs.hl.0;
                self.write8(mmu, addr, self.regs.a());
                self.regs.hl.0 = addr.wrapping_add(1);
            }
            0x32 => {
                let addr = self.regs.hl.0;
                self.write8(mmu, addr, self.regs.a());
                self.regs.hl.0 = addr.wrapping_sub(1);
            }
            0x0A => {
                let val = self.read8(mmu, self.regs.bc.0);
                self.regs.set_a(val);
            }
            0x1A => {
                let val = self.read8(mmu, self.regs.de.0);
                self.regs.set_a(val);
            }
            0x2A => {
                let addr = self.regs.hl.0;
                let val = self.read8(mmu, addr);
                self.regs.set_a(val);
                self.regs.hl.0 = addr.wrapping_add(1);
            }
            0x3A => {
                let addr = self.regs.hl.0;
                let val = self.read8(mmu, addr);
                self.regs.set_a(val);
                self.regs.hl.0 = addr.wrapping_sub(1);
            }
            opcode @ (0x03 | 0x13 | 0x23 | 0x33) => {
                let r = opcode >> 4;
                self.regs.set_r16(r, self.regs.r16(r).wrapping_add(1));
                self.tick(1);
            }
            opcode @ (0x0B | 0x1B | 0x2B | 0x3B) => {
                let r = opcode >> 4;
                self.regs.set_r16(r, self.regs.r16(r).wrapping_sub(1));
                self.tick(1);
            }
            opcode if opcode & 0xC7 == 0x04 => {
                let r = (opcode >> 3) & 0x07;
                let val = self.read_r8(mmu, r);
                let res = val.wrapping_add(1);
                self.write_r8(mmu, r, res);
                self.regs.set_f(
                    (self.regs.f() & FLAG_C)
                        | if res == 0 { FLAG_Z } else { 0 }
                        | if val & 0x0F == 0x0F { FLAG_H } else { 0 },
                );
            }
            opcode if opcode & 0xC7 == 0x05 => {
                let r = (opcode >> 3) & 0x07;
                let val = self.read_r8(mmu, r);
                let res = val.wrapping_sub(1);
                self.write_r8(mmu, r, res);
                self.regs.set_f(
                    (self.regs.f() & FLAG_C)
                        | FLAG_N
                        | if res == 0 { FLAG_Z } else { 0 }
                        | if val & 0x0F == 0 { FLAG_H } else { 0 },
                );
            }
            opcode if opcode & 0xC7 == 0x06 => {
                let val = self.fetch8(mmu);
                self.write_r8(mmu, (opcode >> 3) & 0x07, val);
            }
            0x07 => {
                let a = self.regs.a();
                self.regs.set_a(a.rotate_left(1));
                self.regs.set_f(if a & 0x80 != 0 { FLAG_C } else { 0 });
            }
            0x0F => {
                let a = self.regs.a();
                self.regs.set_a(a.rotate_right(1));
                self.regs.set_f(if a & 0x01 != 0 { FLAG_C } else { 0 });
            }
            0x17 => {
                let a = self.regs.a();
                self.regs.set_a((a << 1) | self.regs.carry() as u8);
                self.regs.set_f(if a & 0x80 != 0 { FLAG_C } else { 0 });
            }
            0x1F => {
                let a = self.regs.a();
                self.regs.set_a((a >> 1) | ((self.regs.carry() as u8) << 7));
                self.regs.set_f(if a & 0x01 != 0 { FLAG_C } else { 0 });
            }
            0x08 => {
                let addr = self.fetch16(mmu);
                let sp = self.regs.sp;
                self.write8(mmu, addr, sp as u8);
                self.write8(mmu, addr.wrapping_add(1), (sp >> 8) as u8);
            }
            opcode @ (0x09 | 0x19 | 0x29 | 0x39) => {
                let hl = self.regs.hl.0;
                let val = self.regs.r16(opcode >> 4);
                let res = hl as u32 + val as u32;
                self.regs.set_f(
                    (self.regs.f() & FLAG_Z)
                        | if (hl & 0x0FFF) + (val & 0x0FFF) > 0x0FFF {
                            FLAG_H
                        } else {
                            0
                        }
                        | if res > 0xFFFF { FLAG_C } else { 0 },
                );
                self.regs.hl.0 = res as u16;
                self.tick(1);
            }
            0x10 => {
                // STOP: the byte after the opcode is skipped.
                let _ = self.fetch8(mmu);
                mmu.reset_div();
                self.stopped = true;
                debug!("STOP entered at PC={:04X}", pc);
            }
            0x18 => {
                let offset = self.fetch8(mmu) as i8;
                self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                self.tick(1);
            }
            opcode @ (0x20 | 0x28 | 0x30 | 0x38) => {
                let offset = self.fetch8(mmu) as i8;
                if self.regs.condition(opcode >> 3) {
                    self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                    self.tick(1);
                }
            }
            0x27 => self.daa(),
            0x2F => {
                self.regs.set_a(!self.regs.a());
                self.regs
                    .set_f((self.regs.f() & (FLAG_Z | FLAG_C)) | FLAG_N | FLAG_H);
            }
            0x37 => self.regs.set_f((self.regs.f() & FLAG_Z) | FLAG_C),
            0x3F => self
                .regs
                .set_f((self.regs.f() & (FLAG_Z | FLAG_C)) ^ FLAG_C),
            0x76 => {
                if !self.ime && mmu.interrupts.fired() != 0 {
                    // HALT falls through immediately and the following
                    // byte is read twice.
                    self.halt_bug = true;
                } else {
                    self.halted = true;
                }
            }
            opcode @ 0x40..=0x7F => {
                let val = self.read_r8(mmu, opcode & 0x07);
                self.write_r8(mmu, (opcode >> 3) & 0x07, val);
            }
            opcode @ 0x80..=0xBF => {
                let val = self.read_r8(mmu, opcode & 0x07);
                self.alu(opcode >> 3, val);
            }
            opcode @ (0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE) => {
                let val = self.fetch8(mmu);
                self.alu(opcode >> 3, val);
            }
            opcode @ (0xC0 | 0xC8 | 0xD0 | 0xD8) => {
                self.tick(1);
                if self.regs.condition(opcode >> 3) {
                    self.regs.pc = self.pop_stack(mmu);
                    self.tick(1);
                }
            }
            0xC9 => {
                self.regs.pc = self.pop_stack(mmu);
                self.tick(1);
            }
            0xD9 => {
                self.regs.pc = self.pop_stack(mmu);
                self.tick(1);
                self.ime = true;
            }
            opcode @ (0xC1 | 0xD1 | 0xE1 | 0xF1) => {
                let val = self.pop_stack(mmu);
                self.regs.set_r16_stack(opcode >> 4, val);
            }
            opcode @ (0xC5 | 0xD5 | 0xE5 | 0xF5) => {
                let val = self.regs.r16_stack(opcode >> 4);
                self.tick(1);
                self.push_stack(mmu, val);
            }
            0xC3 => {
                self.regs.pc = self.fetch16(mmu);
                self.tick(1);
            }
            opcode @ (0xC2 | 0xCA | 0xD2 | 0xDA) => {
                let addr = self.fetch16(mmu);
                if self.regs.condition(opcode >> 3) {
                    self.regs.pc = addr;
                    self.tick(1);
                }
            }
            0xE9 => self.regs.pc = self.regs.hl.0,
            0xCD => {
                let addr = self.fetch16(mmu);
                self.tick(1);
                let ret = self.regs.pc;
                self.push_stack(mmu, ret);
                self.regs.pc = addr;
            }
            opcode @ (0xC4 | 0xCC | 0xD4 | 0xDC) => {
                let addr = self.fetch16(mmu);
                if self.regs.condition(opcode >> 3) {
                    self.tick(1);
                    let ret = self.regs.pc;
                    self.push_stack(mmu, ret);
                    self.regs.pc = addr;
                }
            }
            opcode @ (0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF) => {
                self.tick(1);
                let ret = self.regs.pc;
                self.push_stack(mmu, ret);
                self.regs.pc = (opcode & 0x38) as u16;
            }
            0xCB => {
                let cb = self.fetch8(mmu);
                self.execute_cb(mmu, cb);
            }
            0xE0 => {
                let addr = 0xFF00 | self.fetch8(mmu) as u16;
                self.write8(mmu, addr, self.regs.a());
            }
            0xF0 => {
                let addr = 0xFF00 | self.fetch8(mmu) as u16;
                let val = self.read8(mmu, addr);
                self.regs.set_a(val);
            }
            0xE2 => {
                let addr = 0xFF00 | self.regs.bc.lo() as u16;
                self.write8(mmu, addr, self.regs.a());
            }
            0xF2 => {
                let addr = 0xFF00 | self.regs.bc.lo() as u16;
                let val = self.read8(mmu, addr);
                self.regs.set_a(val);
            }
            0xEA => {
                let addr = self.fetch16(mmu);
                self.write8(mmu, addr, self.regs.a());
            }
            0xFA => {
                let addr = self.fetch16(mmu);
                let val = self.read8(mmu, addr);
                self.regs.set_a(val);
            }
            0xE8 => {
                let offset = self.fetch8(mmu);
                self.regs.sp = self.sp_plus_offset(offset);
                self.tick(2);
            }
            0xF8 => {
                let offset = self.fetch8(mmu);
                self.regs.hl.0 = self.sp_plus_offset(offset);
                self.tick(1);
            }
            0xF9 => {
                self.regs.sp = self.regs.hl.0;
                self.tick(1);
            }
            0xF3 => {
                self.ime = false;
                self.ime_pending = false;
            }
            0xFB => self.ime_pending = true,
            opcode => {
                return Err(CpuError::UnimplementedOpcode {
                    opcode,
                    prefixed: false,
                    pc,
                });
            }
        }
        Ok(())
    }

    /// 8-bit ALU group selected by opcode bits 3-5:
    /// ADD, ADC, SUB, SBC, AND, XOR, OR, CP.
    fn alu(&mut self, op: u8, val: u8) {
        let a = self.regs.a();
        let carry = self.regs.carry() as u8;
        match op & 0x07 {
            op @ (0 | 1) => {
                let c = if op == 1 { carry } else { 0 };
                let sum = a as u16 + val as u16 + c as u16;
                let res = sum as u8;
                self.regs.set_f(
                    if res == 0 { FLAG_Z } else { 0 }
                        | if (a & 0x0F) + (val & 0x0F) + c > 0x0F {
                            FLAG_H
                        } else {
                            0
                        }
                        | if sum > 0xFF { FLAG_C } else { 0 },
                );
                self.regs.set_a(res);
            }
            op @ (2 | 3 | 7) => {
                let c = if op == 3 { carry } else { 0 };
                let res = a.wrapping_sub(val).wrapping_sub(c);
                self.regs.set_f(
                    FLAG_N
                        | if res == 0 { FLAG_Z } else { 0 }
                        | if (a & 0x0F) < (val & 0x0F) + c {
                            FLAG_H
                        } else {
                            0
                        }
                        | if (a as u16) < val as u16 + c as u16 {
                            FLAG_C
                        } else {
                            0
                        },
                );
                // CP only sets flags.
                if op != 7 {
                    self.regs.set_a(res);
                }
            }
            4 => {
                let res = a & val;
                self.regs.set_a(res);
                self.regs
                    .set_f(if res == 0 { FLAG_Z } else { 0 } | FLAG_H);
            }
            5 => {
                let res = a ^ val;
                self.regs.set_a(res);
                self.regs.set_f(if res == 0 { FLAG_Z } else { 0 });
            }
            _ => {
                let res = a | val;
                self.regs.set_a(res);
                self.regs.set_f(if res == 0 { FLAG_Z } else { 0 });
            }
        }
    }

    /// SP plus a signed immediate. H and C come from the unsigned low-byte add.
    fn sp_plus_offset(&mut self, offset: u8) -> u16 {
        let sp = self.regs.sp;
        let res = sp.wrapping_add(offset as i8 as u16);
        self.regs.set_f(
            if (sp & 0x0F) + (offset as u16 & 0x0F) > 0x0F {
                FLAG_H
            } else {
                0
            } | if (sp & 0xFF) + offset as u16 > 0xFF {
                FLAG_C
            } else {
                0
            },
        );
        res
    }

    fn daa(&mut self) {
        let f = self.regs.f();
        let mut a = self.regs.a();
        let mut correction = 0u8;
        let mut carry = false;
        if f & FLAG_H != 0 || (f & FLAG_N == 0 && (a & 0x0F) > 9) {
            correction |= 0x06;
        }
        if f & FLAG_C != 0 || (f & FLAG_N == 0 && a > 0x99) {
            correction |= 0x60;
            carry = true;
        }
        if f & FLAG_N == 0 {
            a = a.wrapping_add(correction);
        } else {
            a = a.wrapping_sub(correction);
        }
        self.regs.set_a(a);
        self.regs.set_f(
            if a == 0 { FLAG_Z } else { 0 } | (f & FLAG_N) | if carry { FLAG_C } else { 0 },
        );
    }

    fn execute_cb(&mut self, mmu: &mut Mmu, opcode: u8) {
        let r = opcode & 0x07;
        let bit = (opcode >> 3) & 0x07;
        let val = self.read_r8(mmu, r);
        match opcode >> 6 {
            0 => {
                let (res, carry_out) = match bit {
                    0 => (val.rotate_left(1), val & 0x80 != 0),
                    1 => (val.rotate_right(1), val & 0x01 != 0),
                    2 => ((val << 1) | self.regs.carry() as u8, val & 0x80 != 0),
                    3 => (
                        (val >> 1) | ((self.regs.carry() as u8) << 7),
                        val & 0x01 != 0,
                    ),
                    4 => (val << 1, val & 0x80 != 0),
                    5 => ((val >> 1) | (val & 0x80), val & 0x01 != 0),
                    6 => (val.rotate_left(4), false),
                    _ => (val >> 1, val & 0x01 != 0),
                };
                self.write_r8(mmu, r, res);
                self.regs.set_f(
                    if res == 0 { FLAG_Z } else { 0 } | if carry_out { FLAG_C } else { 0 },
                );
            }
            1 => {
                self.regs.set_f(
                    (self.regs.f() & FLAG_C)
                        | FLAG_H
                        | if val & (1 << bit) == 0 { FLAG_Z } else { 0 },
                );
            }
            2 => self.write_r8(mmu, r, val & !(1 << bit)),
            _ => self.write_r8(mmu, r, val | (1 << bit)),
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
