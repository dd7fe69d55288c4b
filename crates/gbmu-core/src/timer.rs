use crate::interrupts::{Interrupt, InterruptController};

/// Dots per TIMA increment for each TAC frequency select.
const TIMA_PERIODS: [u16; 4] = [1024, 16, 64, 256];

const TAC_ENABLE: u8 = 0x04;
const TAC_CLOCK_SELECT: u8 = 0x03;

// Post-boot DIV phase measured on DMG revisions A-C.
const BOOT_DIV: u16 = 0xABCC;

pub struct Timer {
    /// 16-bit internal divider counter. DIV register is the upper 8 bits.
    pub div: u16,
    /// Timer counter
    pub tima: u8,
    /// Timer modulo
    pub tma: u8,
    /// Timer control
    pub tac: u8,
    /// Dots accumulated towards the next TIMA increment.
    ticks: u16,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            div: 0,
            tima: 0,
            tma: 0,
            tac: 0,
            ticks: 0,
        }
    }

    /// Timer with the divider phase left behind by the boot program.
    pub fn new_post_boot() -> Self {
        Self {
            div: BOOT_DIV,
            ..Self::new()
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF04 => (self.div >> 8) as u8,
            0xFF05 => self.tima,
            0xFF06 => self.tma,
            0xFF07 => self.tac | 0xF8,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            // Any write clears the whole divider, not just the visible byte.
            0xFF04 => self.div = 0,
            0xFF05 => self.tima = val,
            0xFF06 => self.tma = val,
            0xFF07 => self.tac = val & 0x07,
            _ => {}
        }
    }

    #[inline]
    fn enabled(&self) -> bool {
        self.tac & TAC_ENABLE != 0
    }

    /// Dots per TIMA increment for the current frequency select.
    #[inline]
    pub fn period(&self) -> u16 {
        TIMA_PERIODS[(self.tac & TAC_CLOCK_SELECT) as usize]
    }

    /// Advance the timer by one dot. TIMA overflow reloads from TMA and
    /// requests the timer interrupt within the same dot.
    pub fn step(&mut self, interrupts: &mut InterruptController) {
        self.div = self.div.wrapping_add(1);

        if !self.enabled() {
            return;
        }

        self.ticks += 1;
        if self.ticks < self.period() {
            return;
        }
        self.ticks = 0;

        let (next, overflow) = self.tima.overflowing_add(1);
        if overflow {
            self.tima = self.tma;
            interrupts.request(Interrupt::Timer);
        } else {
            self.tima = next;
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
