//! Audio register block (0xFF10-0xFF3F).
//!
//! The core does not synthesise sound. Channel registers and wave RAM are
//! kept as plain bytes and handed to an [`AudioSink`](crate::host::AudioSink)
//! once per frame; the sink owns waveform generation.

pub const AUDIO_REG_START: u16 = 0xFF10;
pub const AUDIO_REG_END: u16 = 0xFF3F;
pub const AUDIO_REG_LEN: usize = (AUDIO_REG_END - AUDIO_REG_START + 1) as usize;

// NR10..NR52 as left by the boot program; wave RAM is unspecified and
// starts cleared.
const POST_BOOT_REGS: [u8; AUDIO_REG_LEN] = [
    0x80, 0xBF, 0xF3, 0xFF, 0xBF, 0xFF, 0x3F, 0x00, 0xFF, 0xBF, 0x7F, 0xFF, 0x9F, 0xFF, 0xBF, 0xFF,
    0xFF, 0x00, 0x00, 0xBF, 0x77, 0xF3, 0xF1, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

pub struct AudioRegs {
    regs: [u8; AUDIO_REG_LEN],
}

impl AudioRegs {
    pub fn new() -> Self {
        Self {
            regs: [0; AUDIO_REG_LEN],
        }
    }

    pub fn new_post_boot() -> Self {
        Self {
            regs: POST_BOOT_REGS,
        }
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.regs[(addr - AUDIO_REG_START) as usize]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, val: u8) {
        self.regs[(addr - AUDIO_REG_START) as usize] = val;
    }

    /// Raw snapshot of 0xFF10-0xFF3F in address order.
    pub fn snapshot(&self) -> &[u8; AUDIO_REG_LEN] {
        &self.regs
    }
}

impl Default for AudioRegs {
    fn default() -> Self {
        Self::new()
    }
}
