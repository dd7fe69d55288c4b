use crate::audio::AUDIO_REG_LEN;
use crate::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Receives each completed frame, `SCREEN_WIDTH * SCREEN_HEIGHT` pixels in
/// row-major order as 0x00RRGGBB.
pub trait DisplaySink {
    fn present(&mut self, frame: &[u32; SCREEN_WIDTH * SCREEN_HEIGHT]);
}

/// Receives the raw audio register block (0xFF10-0xFF3F) once per frame.
pub trait AudioSink {
    fn push_registers(&mut self, regs: &[u8; AUDIO_REG_LEN]);
}

/// Sink that discards everything.
#[derive(Default)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn present(&mut self, _frame: &[u32; SCREEN_WIDTH * SCREEN_HEIGHT]) {}
}

impl AudioSink for NullSink {
    fn push_registers(&mut self, _regs: &[u8; AUDIO_REG_LEN]) {}
}
