use log::debug;

use crate::{
    audio::{AUDIO_REG_END, AUDIO_REG_START, AudioRegs},
    cartridge::Cartridge,
    interrupts::InterruptController,
    joypad::Joypad,
    ppu::{OAM_SIZE, Ppu},
    serial::Serial,
    timer::Timer,
};

const WRAM_SIZE: usize = 0x2000;
const HRAM_SIZE: usize = 0x7F;
const BOOT_ROM_END: u16 = 0x00FF;

/// Owner of an address, resolved from fixed ranges plus the boot overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    BootRom,
    CartRom,
    Vram,
    CartRam,
    Wram,
    /// 0xE000-0xFDFF mirror of 0xC000-0xDDFF.
    Echo,
    Oam,
    Io,
    Hram,
    InterruptEnable,
    Unmapped,
}

pub struct Mmu {
    pub wram: [u8; WRAM_SIZE],
    pub hram: [u8; HRAM_SIZE],
    pub cart: Option<Cartridge>,
    pub boot_rom: Option<Vec<u8>>,
    pub boot_mapped: bool,
    pub interrupts: InterruptController,
    pub serial: Serial,
    pub ppu: Ppu,
    pub timer: Timer,
    pub joypad: Joypad,
    pub audio: AudioRegs,
}

impl Mmu {
    /// Address space as the boot program leaves it.
    pub fn new() -> Self {
        Self {
            wram: [0; WRAM_SIZE],
            hram: [0; HRAM_SIZE],
            cart: None,
            boot_rom: None,
            boot_mapped: false,
            interrupts: InterruptController::new(),
            serial: Serial::new(),
            ppu: Ppu::new_post_boot(),
            timer: Timer::new_post_boot(),
            joypad: Joypad::new(),
            audio: AudioRegs::new_post_boot(),
        }
    }

    /// Address space at power-on with `boot_rom` overlaid on 0x0000-0x00FF.
    pub fn new_with_boot_rom(boot_rom: Vec<u8>) -> Self {
        Self {
            boot_rom: Some(boot_rom),
            boot_mapped: true,
            ppu: Ppu::new(),
            timer: Timer::new(),
            audio: AudioRegs::new(),
            ..Self::new()
        }
    }

    pub fn load_cart(&mut self, cart: Cartridge) {
        self.cart = Some(cart);
    }

    pub fn region(&self, addr: u16) -> Region {
        match addr {
            0x0000..=BOOT_ROM_END if self.boot_overlay_covers(addr) => Region::BootRom,
            0x0000..=0x7FFF => Region::CartRom,
            0x8000..=0x9FFF => Region::Vram,
            0xA000..=0xBFFF => Region::CartRam,
            0xC000..=0xDFFF => Region::Wram,
            0xE000..=0xFDFF => Region::Echo,
            0xFE00..=0xFE9F => Region::Oam,
            0xFEA0..=0xFEFF => Region::Unmapped,
            0xFF00..=0xFF7F => Region::Io,
            0xFF80..=0xFFFE => Region::Hram,
            0xFFFF => Region::InterruptEnable,
        }
    }

    fn boot_overlay_covers(&self, addr: u16) -> bool {
        self.boot_mapped
            && self
                .boot_rom
                .as_ref()
                .is_some_and(|rom| (addr as usize) < rom.len())
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        match self.region(addr) {
            Region::BootRom => self
                .boot_rom
                .as_ref()
                .and_then(|rom| rom.get(addr as usize).copied())
                .unwrap_or(0xFF),
            Region::CartRom | Region::CartRam => {
                self.cart.as_ref().map(|c| c.read(addr)).unwrap_or(0xFF)
            }
            Region::Vram => self.ppu.vram[(addr - 0x8000) as usize],
            Region::Wram => self.wram[(addr - 0xC000) as usize],
            Region::Echo => self.wram[(addr - 0xE000) as usize],
            Region::Oam => self.ppu.oam[(addr - 0xFE00) as usize],
            Region::Io => self.read_io(addr),
            Region::Hram => self.hram[(addr - 0xFF80) as usize],
            Region::InterruptEnable => self.interrupts.read_enable(),
            Region::Unmapped => 0xFF,
        }
    }

    pub fn write_byte(&mut self, addr: u16, val: u8) {
        match self.region(addr) {
            // The overlay is read-only and the cartridge under it never sees
            // the write.
            Region::BootRom => {}
            Region::CartRom | Region::CartRam => {
                if let Some(cart) = self.cart.as_mut() {
                    cart.write(addr, val);
                }
            }
            Region::Vram => self.ppu.vram[(addr - 0x8000) as usize] = val,
            Region::Wram => self.wram[(addr - 0xC000) as usize] = val,
            Region::Echo => self.wram[(addr - 0xE000) as usize] = val,
            Region::Oam => self.ppu.oam[(addr - 0xFE00) as usize] = val,
            Region::Io => self.write_io(addr, val),
            Region::Hram => self.hram[(addr - 0xFF80) as usize] = val,
            Region::InterruptEnable => self.interrupts.write_enable(val),
            Region::Unmapped => {}
        }
    }

    fn read_io(&self, addr: u16) -> u8 {
        match addr {
            0xFF00 => self.joypad.read(),
            0xFF01 | 0xFF02 => self.serial.read(addr),
            0xFF04..=0xFF07 => self.timer.read(addr),
            0xFF0F => self.interrupts.read_flags(),
            AUDIO_REG_START..=AUDIO_REG_END => self.audio.read(addr),
            0xFF40..=0xFF4B => self.ppu.read_reg(addr),
            _ => 0xFF,
        }
    }

    fn write_io(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF00 => self.joypad.write(val),
            0xFF01 | 0xFF02 => self.serial.write(addr, val, &mut self.interrupts),
            0xFF04..=0xFF07 => self.timer.write(addr, val),
            0xFF0F => self.interrupts.write_flags(val),
            AUDIO_REG_START..=AUDIO_REG_END => self.audio.write(addr, val),
            0xFF46 => {
                self.ppu.write_reg(addr, val);
                self.oam_dma(val);
            }
            0xFF40..=0xFF4B => self.ppu.write_reg(addr, val),
            0xFF50 => {
                if val & 0x01 != 0 && self.boot_mapped {
                    self.boot_mapped = false;
                    debug!("Boot ROM unmapped");
                }
            }
            _ => {}
        }
    }

    /// Copy 160 bytes from `page << 8` into OAM in a single step.
    fn oam_dma(&mut self, page: u8) {
        let src = (page as u16) << 8;
        debug!("OAM DMA from {src:#06X}");
        for i in 0..OAM_SIZE as u16 {
            let byte = self.read_byte(src + i);
            self.ppu.oam[i as usize] = byte;
        }
    }

    /// Advance the LCD and the timer by one dot.
    pub fn tick(&mut self) {
        self.ppu.step(&mut self.interrupts);
        self.timer.step(&mut self.interrupts);
    }

    pub fn take_serial(&mut self) -> Vec<u8> {
        self.serial.take_output()
    }

    /// Divider reset used by STOP.
    pub fn reset_div(&mut self) {
        self.timer.write(0xFF04, 0);
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}
