use log::error;
use thiserror::Error;

use crate::{
    cartridge::{Cartridge, CartridgeError},
    cpu::{Cpu, CpuError},
    host::{AudioSink, DisplaySink},
    joypad::Button,
    mmu::Mmu,
    ppu::{SCREEN_HEIGHT, SCREEN_WIDTH},
    theme::ThemeId,
};

/// Dots in one full frame: 154 scanlines of 456 dots.
pub const DOTS_PER_FRAME: u32 = 70_224;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Cpu(#[from] CpuError),
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
}

#[derive(Debug, Clone, Default)]
pub struct GameBoyConfig {
    pub theme: ThemeId,
    /// Boot program mapped over 0x0000-0x00FF until the game writes FF50.
    pub boot_rom: Option<Vec<u8>>,
}

pub struct GameBoy {
    pub cpu: Cpu,
    pub mmu: Mmu,
    config: GameBoyConfig,
    fault_reported: bool,
}

impl GameBoy {
    pub fn new(config: GameBoyConfig) -> Self {
        let (cpu, mut mmu) = Self::power_on(&config);
        mmu.ppu.set_theme(config.theme);
        Self {
            cpu,
            mmu,
            config,
            fault_reported: false,
        }
    }

    pub fn with_cartridge(config: GameBoyConfig, cart: Cartridge) -> Self {
        let mut gb = Self::new(config);
        gb.load_cartridge(cart);
        gb
    }

    fn power_on(config: &GameBoyConfig) -> (Cpu, Mmu) {
        match &config.boot_rom {
            Some(boot) => (Cpu::new_power_on(), Mmu::new_with_boot_rom(boot.clone())),
            None => (Cpu::new(), Mmu::new()),
        }
    }

    pub fn load_cartridge(&mut self, cart: Cartridge) {
        self.mmu.load_cart(cart);
    }

    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.mmu.cart.as_ref()
    }

    /// Advance the whole machine by one dot: CPU first, then LCD and timer.
    pub fn advance_one_dot(&mut self) -> Result<(), Error> {
        if let Err(e) = self.cpu.step(&mut self.mmu) {
            if !self.fault_reported {
                self.fault_reported = true;
                error!("{e}; CPU halted at {}", self.cpu.debug_state());
            }
            return Err(e.into());
        }
        self.mmu.tick();
        Ok(())
    }

    /// Advance exactly one frame's worth of dots.
    pub fn run_frame(&mut self) -> Result<(), Error> {
        for _ in 0..DOTS_PER_FRAME {
            self.advance_one_dot()?;
        }
        Ok(())
    }

    /// Like [`run_frame`](Self::run_frame), handing the finished frame to
    /// `display` and the audio registers to `audio`. Nothing is presented
    /// while the LCD is off.
    pub fn run_frame_with(
        &mut self,
        display: &mut dyn DisplaySink,
        audio: &mut dyn AudioSink,
    ) -> Result<(), Error> {
        for _ in 0..DOTS_PER_FRAME {
            self.advance_one_dot()?;
            if self.mmu.ppu.frame_ready() {
                display.present(self.mmu.ppu.framebuffer());
                self.mmu.ppu.clear_frame_flag();
            }
        }
        audio.push_registers(self.mmu.audio.snapshot());
        Ok(())
    }

    pub fn press(&mut self, button: Button) {
        self.mmu.joypad.press(button, &mut self.mmu.interrupts);
    }

    pub fn release(&mut self, button: Button) {
        self.mmu.joypad.release(button);
    }

    pub fn framebuffer(&self) -> &[u32; SCREEN_WIDTH * SCREEN_HEIGHT] {
        self.mmu.ppu.framebuffer()
    }

    pub fn frames(&self) -> u64 {
        self.mmu.ppu.frames()
    }

    pub fn set_theme(&mut self, theme: ThemeId) {
        self.config.theme = theme;
        self.mmu.ppu.set_theme(theme);
    }

    pub fn theme(&self) -> ThemeId {
        self.mmu.ppu.theme()
    }

    /// Bytes shifted out of the serial port since the last call.
    pub fn take_serial(&mut self) -> Vec<u8> {
        self.mmu.take_serial()
    }

    /// Sync cartridge RAM to its backing store. Safe to call more than once;
    /// only the first call writes.
    pub fn shutdown(&mut self) -> Result<(), Error> {
        if let Some(cart) = self.mmu.cart.as_mut() {
            cart.flush()?;
        }
        Ok(())
    }

    /// Return to the startup state while keeping the cartridge and its RAM.
    pub fn reset(&mut self) {
        let cart = self.mmu.cart.take();
        let (cpu, mut mmu) = Self::power_on(&self.config);
        mmu.ppu.set_theme(self.config.theme);
        self.cpu = cpu;
        self.mmu = mmu;
        self.fault_reported = false;
        if let Some(mut cart) = cart {
            cart.reset_banking();
            self.mmu.load_cart(cart);
        }
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new(GameBoyConfig::default())
    }
}
