use crate::interrupts::{Interrupt, InterruptController};

const SC_START: u8 = 0x80;
const SC_INTERNAL_CLOCK: u8 = 0x01;

/// Serial port (SB 0xFF01, SC 0xFF02) with no link partner attached.
///
/// A transfer started with the internal clock completes as soon as it is
/// requested: the outgoing byte is captured in `out_buf` and the incoming
/// byte is the idle line level, 0xFF. Test ROMs print through this port.
pub struct Serial {
    sb: u8,
    sc: u8,
    out_buf: Vec<u8>,
}

impl Serial {
    pub fn new() -> Self {
        Self {
            sb: 0,
            sc: 0x7E,
            out_buf: Vec::new(),
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF01 => self.sb,
            0xFF02 => self.sc | 0x7E,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8, interrupts: &mut InterruptController) {
        match addr {
            0xFF01 => self.sb = val,
            0xFF02 => {
                self.sc = val;
                if val & (SC_START | SC_INTERNAL_CLOCK) == SC_START | SC_INTERNAL_CLOCK {
                    self.out_buf.push(self.sb);
                    self.sb = 0xFF;
                    self.sc &= !SC_START;
                    interrupts.request(Interrupt::Serial);
                }
                // An externally clocked transfer never completes without a
                // partner, so SC bit 7 simply stays set.
            }
            _ => {}
        }
    }

    /// Drain everything sent since the last call.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out_buf)
    }

    pub fn peek_output(&self) -> &[u8] {
        &self.out_buf
    }
}

impl Default for Serial {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_clock_transfer_completes_immediately() {
        let mut ic = InterruptController::new();
        let mut serial = Serial::new();
        serial.write(0xFF01, b'O', &mut ic);
        serial.write(0xFF02, 0x81, &mut ic);

        assert_eq!(serial.read(0xFF01), 0xFF);
        assert_eq!(serial.read(0xFF02) & 0x80, 0);
        assert!(ic.is_pending(Interrupt::Serial));
        assert_eq!(serial.take_output(), b"O");
        assert!(serial.peek_output().is_empty());
    }

    #[test]
    fn external_clock_transfer_stays_pending() {
        let mut ic = InterruptController::new();
        let mut serial = Serial::new();
        serial.write(0xFF01, 0x42, &mut ic);
        serial.write(0xFF02, 0x80, &mut ic);

        assert_eq!(serial.read(0xFF02), 0xFE);
        assert_eq!(serial.read(0xFF01), 0x42);
        assert!(!ic.is_pending(Interrupt::Serial));
        assert!(serial.peek_output().is_empty());
    }
}
