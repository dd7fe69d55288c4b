#![allow(dead_code)]

use gbmu_core::cartridge::Cartridge;
use gbmu_core::gameboy::{GameBoy, GameBoyConfig};

pub const BANK_SIZE: usize = 0x4000;
pub const ENTRY: usize = 0x0100;

/// Assembles a cartridge image in memory. Header fields are filled in and
/// the header checksum is fixed up by [`RomBuilder::build`].
pub struct RomBuilder {
    rom: Vec<u8>,
}

impl RomBuilder {
    pub fn new(cart_type: u8, banks: usize, ram_code: u8) -> Self {
        assert!(banks.is_power_of_two() && banks >= 2, "bad bank count {banks}");
        let mut rom = vec![0u8; banks * BANK_SIZE];
        rom[0x0134..0x0138].copy_from_slice(b"TEST");
        rom[0x0147] = cart_type;
        rom[0x0148] = banks.trailing_zeros() as u8 - 1;
        rom[0x0149] = ram_code;
        Self { rom }
    }

    /// Plain 32 KiB ROM-only image.
    pub fn rom_only() -> Self {
        Self::new(0x00, 2, 0x00)
    }

    pub fn code(mut self, addr: usize, bytes: &[u8]) -> Self {
        self.rom[addr..addr + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Write each bank's index into the first byte of every switchable bank.
    pub fn tag_banks(mut self) -> Self {
        let banks = self.rom.len() / BANK_SIZE;
        for bank in 1..banks {
            self.rom[bank * BANK_SIZE] = bank as u8;
        }
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let checksum = self.rom[0x0134..=0x014C]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1));
        self.rom[0x014D] = checksum;
        self.rom
    }
}

/// Post-boot machine running `program` from the cartridge entry point.
pub fn gameboy_with_program(program: &[u8]) -> GameBoy {
    let rom = RomBuilder::rom_only().code(ENTRY, program).build();
    let cart = Cartridge::load(rom).expect("test ROM should load");
    GameBoy::with_cartridge(GameBoyConfig::default(), cart)
}

pub fn run_dots(gb: &mut GameBoy, dots: u32) {
    for _ in 0..dots {
        gb.advance_one_dot().expect("no CPU fault");
    }
}

/// Advance until the CPU reaches its next instruction boundary.
pub fn step_instruction(gb: &mut GameBoy) {
    gb.advance_one_dot().expect("no CPU fault");
    while !gb.cpu.at_boundary() {
        gb.advance_one_dot().expect("no CPU fault");
    }
}

/// Step whole instructions until PC equals `pc`. Panics after `limit` steps.
pub fn run_to_pc(gb: &mut GameBoy, pc: u16, limit: usize) {
    for _ in 0..limit {
        if gb.cpu.regs.pc == pc {
            return;
        }
        step_instruction(gb);
    }
    panic!(
        "PC never reached {pc:#06X}; state {}",
        gb.cpu.debug_state()
    );
}
