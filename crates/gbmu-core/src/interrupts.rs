/// Interrupt sources in priority order (gbdev.io/pandocs/Interrupts.html).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    VBlank = 0,
    Stat = 1,
    Timer = 2,
    Serial = 3,
    Joypad = 4,
}

impl Interrupt {
    pub const ALL: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::Stat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    #[inline]
    pub const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Fixed jump target used when the interrupt is serviced.
    #[inline]
    pub const fn vector(self) -> u16 {
        0x40 + 8 * self as u16
    }

    /// Highest-priority source present in `mask` (lowest bit index wins).
    pub fn highest_priority(mask: u8) -> Option<Interrupt> {
        Self::ALL.into_iter().find(|i| mask & i.bit() != 0)
    }
}

const INTERRUPT_MASK: u8 = 0x1F;

/// Pending (IF, 0xFF0F) and enabled (IE, 0xFFFF) interrupt registers.
///
/// Passive: any unit may request an interrupt, and only the CPU consumes
/// them. The master enable lives in the CPU because it is architecturally
/// part of the processor.
#[derive(Clone, Debug, Default)]
pub struct InterruptController {
    pending: u8,
    enabled: u8,
}

impl InterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn request(&mut self, interrupt: Interrupt) {
        self.pending |= interrupt.bit();
    }

    #[inline]
    pub fn acknowledge(&mut self, interrupt: Interrupt) {
        self.pending &= !interrupt.bit();
    }

    #[inline]
    pub fn is_pending(&self, interrupt: Interrupt) -> bool {
        self.pending & interrupt.bit() != 0
    }

    /// Sources that are both pending and enabled.
    #[inline]
    pub fn fired(&self) -> u8 {
        self.pending & self.enabled & INTERRUPT_MASK
    }

    pub fn pending(&self) -> u8 {
        self.pending
    }

    pub fn enabled(&self) -> u8 {
        self.enabled
    }

    /// IF as seen on the bus: the three unused bits read back as 1.
    pub fn read_flags(&self) -> u8 {
        self.pending | 0xE0
    }

    pub fn write_flags(&mut self, val: u8) {
        self.pending = val & INTERRUPT_MASK;
    }

    pub fn read_enable(&self) -> u8 {
        self.enabled
    }

    /// IE keeps all eight bits even though only the low five matter.
    pub fn write_enable(&mut self, val: u8) {
        self.enabled = val;
    }
}
