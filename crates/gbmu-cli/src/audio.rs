use gbmu_core::audio::{AUDIO_REG_LEN, AUDIO_REG_START};
use gbmu_core::host::AudioSink;
use log::{Level, log_enabled, trace};

// NR52 offset within the register block.
const NR52: usize = 0x16;

/// Audio sink without a synthesizer: logs register changes at trace level.
#[derive(Default)]
pub struct RegisterTrace {
    last: Option<[u8; AUDIO_REG_LEN]>,
}

impl RegisterTrace {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioSink for RegisterTrace {
    fn push_registers(&mut self, regs: &[u8; AUDIO_REG_LEN]) {
        if !log_enabled!(Level::Trace) {
            return;
        }
        let prev = self.last.replace(*regs);
        if prev.as_ref() == Some(regs) {
            return;
        }
        let changed: Vec<String> = regs
            .iter()
            .enumerate()
            .filter(|&(i, &v)| prev.is_none_or(|p| p[i] != v))
            .map(|(i, v)| format!("{:04X}={v:02X}", AUDIO_REG_START as usize + i))
            .collect();
        trace!(
            "APU regs (NR52={:02X}): {}",
            regs[NR52],
            changed.join(" ")
        );
    }
}
