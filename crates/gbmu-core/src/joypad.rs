use crate::interrupts::{Interrupt, InterruptController};

const SELECT_DIRECTIONS: u8 = 0x10;
const SELECT_ACTIONS: u8 = 0x20;

/// The eight logical buttons of the handheld.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::Right,
        Button::Left,
        Button::Up,
        Button::Down,
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
    ];

    /// Bit in the pressed-state byte. The low nibble is the direction row
    /// and the high nibble the action row, each laid out as P10..P13.
    #[inline]
    const fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// P1/JOYP register (0xFF00).
pub struct Joypad {
    /// Row select bits 4 and 5 as last written. A cleared bit selects.
    select: u8,
    pressed: u8,
}

impl Joypad {
    pub fn new() -> Self {
        Self {
            select: SELECT_DIRECTIONS | SELECT_ACTIONS,
            pressed: 0,
        }
    }

    pub fn read(&self) -> u8 {
        let mut lines = 0x0F;
        if self.select & SELECT_DIRECTIONS == 0 {
            lines &= !(self.pressed & 0x0F);
        }
        if self.select & SELECT_ACTIONS == 0 {
            lines &= !(self.pressed >> 4);
        }
        0xC0 | self.select | lines
    }

    pub fn write(&mut self, val: u8) {
        self.select = val & (SELECT_DIRECTIONS | SELECT_ACTIONS);
    }

    /// Every press requests the joypad interrupt, including repeats.
    pub fn press(&mut self, button: Button, interrupts: &mut InterruptController) {
        self.pressed |= button.mask();
        interrupts.request(Interrupt::Joypad);
    }

    pub fn release(&mut self, button: Button) {
        self.pressed &= !button.mask();
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.pressed & button.mask() != 0
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unselected_rows_read_high() {
        let mut ic = InterruptController::new();
        let mut joypad = Joypad::new();
        joypad.press(Button::A, &mut ic);
        assert_eq!(joypad.read(), 0xFF);
    }

    #[test]
    fn selected_row_reports_pressed_lines_low() {
        let mut ic = InterruptController::new();
        let mut joypad = Joypad::new();
        joypad.press(Button::Start, &mut ic);
        joypad.press(Button::Left, &mut ic);

        joypad.write(0x10);
        assert_eq!(joypad.read(), 0xD7, "Start is P13 on the action row");

        joypad.write(0x20);
        assert_eq!(joypad.read(), 0xED, "Left is P11 on the direction row");

        joypad.release(Button::Left);
        assert_eq!(joypad.read(), 0xEF);
        assert!(ic.is_pending(Interrupt::Joypad));
    }

    #[test]
    fn each_button_drives_exactly_one_line() {
        let mut ic = InterruptController::new();
        let mut seen = 0u8;
        for button in Button::ALL {
            let mut joypad = Joypad::new();
            joypad.press(button, &mut ic);
            assert!(joypad.is_pressed(button));

            joypad.write(0x20);
            let directions = !joypad.read() & 0x0F;
            joypad.write(0x10);
            let actions = !joypad.read() & 0x0F;
            assert_eq!(
                directions.count_ones() + actions.count_ones(),
                1,
                "{button:?} should pull one line low"
            );
            seen |= directions | actions << 4;

            joypad.release(button);
            assert!(!joypad.is_pressed(button));
            assert_eq!(joypad.read() & 0x0F, 0x0F);
        }
        assert_eq!(seen, 0xFF, "all eight lines are covered");
    }
}
