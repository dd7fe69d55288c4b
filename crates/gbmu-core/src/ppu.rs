use crate::interrupts::{Interrupt, InterruptController};
use crate::theme::ThemeId;

#[cfg(feature = "ppu-trace")]
macro_rules! ppu_trace {
    ($($arg:tt)*) => {
        log::trace!(target: "gbmu_core::ppu", $($arg)*);
    };
}
#[cfg(not(feature = "ppu-trace"))]
macro_rules! ppu_trace {
    ($($arg:tt)*) => {};
}

// Screen resolution used by the Game Boy PPU
pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

// Timing constants per LCD mode in dots
const MODE0_DOTS: u16 = 204; // HBlank
const MODE1_DOTS: u16 = 456; // One line during VBlank
const MODE2_DOTS: u16 = 80; // OAM search
const MODE3_DOTS: u16 = 172; // Pixel transfer

// Number of lines spent in VBlank
const VBLANK_LINES: u8 = 10;
const LAST_LINE: u8 = SCREEN_HEIGHT as u8 + VBLANK_LINES - 1;

// Sprite limits
const MAX_SPRITES_PER_LINE: usize = 10;
const TOTAL_SPRITES: usize = 40;

// Internal memory sizes
pub const VRAM_SIZE: usize = 0x2000;
pub const OAM_SIZE: usize = 0xA0;

// Window X position is clipped if greater than this value
const WINDOW_X_MAX: u8 = 166;

// VRAM layout constants
const BG_MAP_0_BASE: usize = 0x1800;
const BG_MAP_1_BASE: usize = 0x1C00;
const TILE_DATA_0_BASE: usize = 0x0000;
const TILE_DATA_1_BASE: usize = 0x0800;

// LCDC bits
const LCDC_ENABLE: u8 = 0x80;
const LCDC_WINDOW_MAP: u8 = 0x40;
const LCDC_WINDOW_ENABLE: u8 = 0x20;
const LCDC_TILE_DATA: u8 = 0x10;
const LCDC_BG_MAP: u8 = 0x08;
const LCDC_OBJ_SIZE: u8 = 0x04;
const LCDC_OBJ_ENABLE: u8 = 0x02;
const LCDC_BG_ENABLE: u8 = 0x01;

// STAT interrupt source selects and the coincidence flag
const STAT_LYC_INT: u8 = 0x40;
const STAT_MODE2_INT: u8 = 0x20;
const STAT_MODE1_INT: u8 = 0x10;
const STAT_MODE0_INT: u8 = 0x08;
const STAT_LYC_EQUAL: u8 = 0x04;
const STAT_WRITABLE: u8 = 0x78;

// OAM attribute bits
const OBJ_BEHIND_BG: u8 = 0x80;
const OBJ_Y_FLIP: u8 = 0x40;
const OBJ_X_FLIP: u8 = 0x20;
const OBJ_PALETTE1: u8 = 0x10;

/// LCD mode as reported in STAT bits 0-1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamSearch = 2,
    PixelTransfer = 3,
}

#[derive(Copy, Clone, Default)]
struct Sprite {
    x: i16,
    y: i16,
    tile: u8,
    flags: u8,
}

pub struct Ppu {
    pub vram: [u8; VRAM_SIZE],
    pub oam: [u8; OAM_SIZE],

    lcdc: u8,
    stat: u8,
    scy: u8,
    scx: u8,
    ly: u8,
    lyc: u8,
    lyc_eq_ly: bool,
    pub dma: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,

    /// Internal window line counter
    win_line_counter: u8,

    mode_clock: u16,
    mode: Mode,
    /// Set once the current line has been drawn during pixel transfer.
    line_composed: bool,
    theme: ThemeId,

    pub framebuffer: [u32; SCREEN_WIDTH * SCREEN_HEIGHT],
    /// Background colour id 0 at each column of the line being drawn.
    line_color_zero: [bool; SCREEN_WIDTH],
    /// Latched sprites for the current scanline, in OAM order
    line_sprites: [Sprite; MAX_SPRITES_PER_LINE],
    sprite_count: usize,
    /// Indicates a completed frame is available in `framebuffer`
    frame_ready: bool,
    frame_counter: u64,
}

impl Ppu {
    /// Power-on state: LCD off, every register cleared.
    pub fn new() -> Self {
        Self {
            vram: [0; VRAM_SIZE],
            oam: [0; OAM_SIZE],
            lcdc: 0,
            stat: 0,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            lyc_eq_ly: true,
            dma: 0,
            bgp: 0,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            win_line_counter: 0,
            mode_clock: 0,
            mode: Mode::OamSearch,
            line_composed: false,
            theme: ThemeId::default(),
            framebuffer: [0; SCREEN_WIDTH * SCREEN_HEIGHT],
            line_color_zero: [true; SCREEN_WIDTH],
            line_sprites: [Sprite::default(); MAX_SPRITES_PER_LINE],
            sprite_count: 0,
            frame_ready: false,
            frame_counter: 0,
        }
    }

    /// Registers as left by the boot program: LCD on at the start of line 0.
    pub fn new_post_boot() -> Self {
        Self {
            lcdc: 0x91,
            dma: 0xFF,
            bgp: 0xFC,
            obp0: 0xFF,
            obp1: 0xFF,
            ..Self::new()
        }
    }

    pub fn set_theme(&mut self, theme: ThemeId) {
        self.theme = theme;
    }

    pub fn theme(&self) -> ThemeId {
        self.theme
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }

    pub fn lcd_enabled(&self) -> bool {
        self.lcdc & LCDC_ENABLE != 0
    }

    /// Returns true if a full frame has been rendered and is ready to display.
    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    /// Clears the frame ready flag after a frame has been consumed.
    pub fn clear_frame_flag(&mut self) {
        self.frame_ready = false;
    }

    /// Number of frames completed since power on.
    pub fn frames(&self) -> u64 {
        self.frame_counter
    }

    /// Returns the current value of the internal window line counter.
    pub fn window_line_counter(&self) -> u8 {
        self.win_line_counter
    }

    pub fn framebuffer(&self) -> &[u32; SCREEN_WIDTH * SCREEN_HEIGHT] {
        &self.framebuffer
    }

    pub fn read_reg(&self, addr: u16) -> u8 {
        match addr {
            0xFF40 => self.lcdc,
            0xFF41 => {
                // Mode bits read as 0 while the LCD is off.
                let mode = if self.lcd_enabled() {
                    self.mode as u8
                } else {
                    0
                };
                0x80 | (self.stat & STAT_WRITABLE)
                    | mode
                    | if self.lyc_eq_ly { STAT_LYC_EQUAL } else { 0 }
            }
            0xFF42 => self.scy,
            0xFF43 => self.scx,
            0xFF44 => self.ly,
            0xFF45 => self.lyc,
            0xFF46 => self.dma,
            0xFF47 => self.bgp,
            0xFF48 => self.obp0,
            0xFF49 => self.obp1,
            0xFF4A => self.wy,
            0xFF4B => self.wx,
            _ => 0xFF,
        }
    }

    pub fn write_reg(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF40 => {
                let was_on = self.lcd_enabled();
                self.lcdc = val;
                if was_on && !self.lcd_enabled() {
                    self.ly = 0;
                    self.mode = Mode::OamSearch;
                    self.mode_clock = 0;
                    self.win_line_counter = 0;
                    self.line_composed = false;
                    ppu_trace!("LCD off");
                } else if !was_on && self.lcd_enabled() {
                    self.lyc_eq_ly = self.ly == self.lyc;
                    ppu_trace!("LCD on");
                }
            }
            0xFF41 => self.stat = val & STAT_WRITABLE,
            0xFF42 => self.scy = val,
            0xFF43 => self.scx = val,
            // LY is read-only.
            0xFF44 => {}
            0xFF45 => {
                self.lyc = val;
                self.lyc_eq_ly = self.ly == self.lyc;
            }
            0xFF46 => self.dma = val,
            0xFF47 => self.bgp = val,
            0xFF48 => self.obp0 = val,
            0xFF49 => self.obp1 = val,
            0xFF4A => self.wy = val,
            0xFF4B => self.wx = val,
            _ => {}
        }
    }

    fn enter_mode(&mut self, mode: Mode, interrupts: &mut InterruptController) {
        ppu_trace!("LY={} {:?} -> {:?}", self.ly, self.mode, mode);
        self.mode = mode;
        self.mode_clock = 0;
        let source = match mode {
            Mode::HBlank => STAT_MODE0_INT,
            Mode::VBlank => STAT_MODE1_INT,
            Mode::OamSearch => STAT_MODE2_INT,
            Mode::PixelTransfer => 0,
        };
        if self.stat & source != 0 {
            interrupts.request(Interrupt::Stat);
        }
    }

    fn set_ly(&mut self, ly: u8, interrupts: &mut InterruptController) {
        self.ly = ly;
        self.lyc_eq_ly = self.ly == self.lyc;
        if self.lyc_eq_ly && self.stat & STAT_LYC_INT != 0 {
            interrupts.request(Interrupt::Stat);
        }
    }

    /// Advance the LCD by one dot. Does nothing while the LCD is off.
    pub fn step(&mut self, interrupts: &mut InterruptController) {
        if !self.lcd_enabled() {
            return;
        }

        self.mode_clock += 1;

        match self.mode {
            Mode::OamSearch => {
                if self.mode_clock >= MODE2_DOTS {
                    self.oam_scan();
                    self.line_composed = false;
                    self.enter_mode(Mode::PixelTransfer, interrupts);
                }
            }
            Mode::PixelTransfer => {
                if !self.line_composed {
                    self.render_scanline();
                    self.line_composed = true;
                }
                if self.mode_clock >= MODE3_DOTS {
                    self.enter_mode(Mode::HBlank, interrupts);
                }
            }
            Mode::HBlank => {
                if self.mode_clock >= MODE0_DOTS {
                    self.set_ly(self.ly + 1, interrupts);
                    if self.ly == SCREEN_HEIGHT as u8 {
                        self.frame_ready = true;
                        self.frame_counter = self.frame_counter.wrapping_add(1);
                        interrupts.request(Interrupt::VBlank);
                        self.enter_mode(Mode::VBlank, interrupts);
                    } else {
                        self.enter_mode(Mode::OamSearch, interrupts);
                    }
                }
            }
            Mode::VBlank => {
                if self.mode_clock >= MODE1_DOTS {
                    self.mode_clock = 0;
                    if self.ly == LAST_LINE {
                        self.win_line_counter = 0;
                        self.set_ly(0, interrupts);
                        self.enter_mode(Mode::OamSearch, interrupts);
                    } else {
                        self.set_ly(self.ly + 1, interrupts);
                    }
                }
            }
        }
    }

    /// Collect the first 10 sprites in OAM order that cover the current line.
    fn oam_scan(&mut self) {
        let sprite_height: i16 = if self.lcdc & LCDC_OBJ_SIZE != 0 { 16 } else { 8 };
        let ly = self.ly as i16;
        self.sprite_count = 0;
        for i in 0..TOTAL_SPRITES {
            if self.sprite_count >= MAX_SPRITES_PER_LINE {
                break;
            }
            let base = i * 4;
            let y = self.oam[base] as i16 - 16;
            if ly >= y && ly < y + sprite_height {
                self.line_sprites[self.sprite_count] = Sprite {
                    x: self.oam[base + 1] as i16 - 8,
                    y,
                    tile: self.oam[base + 2],
                    flags: self.oam[base + 3],
                };
                self.sprite_count += 1;
            }
        }
    }

    #[inline(always)]
    fn dmg_shade(palette: u8, color_id: u8) -> u8 {
        (palette >> (color_id * 2)) & 0x03
    }

    /// Colour id (0-3) of pixel `x` (0 = leftmost) on row `row` of a BG/window tile.
    fn bg_tile_pixel(&self, tile_index: u8, row: usize, x: usize) -> u8 {
        let addr = if self.lcdc & LCDC_TILE_DATA != 0 {
            TILE_DATA_0_BASE + tile_index as usize * 16
        } else {
            TILE_DATA_1_BASE + ((tile_index as i8 as i16 + 128) as usize) * 16
        };
        let bit = 7 - x;
        let lo = self.vram[addr + row * 2];
        let hi = self.vram[addr + row * 2 + 1];
        ((hi >> bit) & 1) << 1 | ((lo >> bit) & 1)
    }

    fn render_scanline(&mut self) {
        let ly = self.ly as usize;
        if ly >= SCREEN_HEIGHT {
            return;
        }
        let row_start = ly * SCREEN_WIDTH;
        let shades = self.theme.shades();

        // With LCDC bit 0 clear, background and window both show colour 0
        // and sprites see every pixel as transparent background.
        let blank = shades[Self::dmg_shade(self.bgp, 0) as usize];
        self.framebuffer[row_start..row_start + SCREEN_WIDTH].fill(blank);
        self.line_color_zero.fill(true);

        if self.lcdc & LCDC_BG_ENABLE != 0 {
            let bg_map = if self.lcdc & LCDC_BG_MAP != 0 {
                BG_MAP_1_BASE
            } else {
                BG_MAP_0_BASE
            };
            let window_map = if self.lcdc & LCDC_WINDOW_MAP != 0 {
                BG_MAP_1_BASE
            } else {
                BG_MAP_0_BASE
            };
            let window_visible = self.lcdc & LCDC_WINDOW_ENABLE != 0
                && self.ly >= self.wy
                && self.wx <= WINDOW_X_MAX;
            let window_start = self.wx as i16 - 7;
            let window_y = self.win_line_counter as usize;
            let bg_y = self.ly.wrapping_add(self.scy) as usize;

            let mut window_drawn = false;
            for x in 0..SCREEN_WIDTH {
                let color_id = if window_visible && x as i16 >= window_start {
                    window_drawn = true;
                    let window_x = (x as i16 - window_start) as usize;
                    let tile_index =
                        self.vram[window_map + (window_y / 8) * 32 + window_x / 8];
                    self.bg_tile_pixel(tile_index, window_y % 8, window_x % 8)
                } else {
                    let bg_x = (x as u8).wrapping_add(self.scx) as usize;
                    let tile_index = self.vram[bg_map + (bg_y / 8) * 32 + bg_x / 8];
                    self.bg_tile_pixel(tile_index, bg_y % 8, bg_x % 8)
                };
                self.framebuffer[row_start + x] =
                    shades[Self::dmg_shade(self.bgp, color_id) as usize];
                self.line_color_zero[x] = color_id == 0;
            }
            if window_drawn {
                self.win_line_counter = self.win_line_counter.wrapping_add(1);
            }
        }

        if self.lcdc & LCDC_OBJ_ENABLE != 0 {
            self.render_sprites(row_start, &shades);
        }
    }

    fn render_sprites(&mut self, row_start: usize, shades: &[u32; 4]) {
        let sprite_height: i16 = if self.lcdc & LCDC_OBJ_SIZE != 0 { 16 } else { 8 };
        // Lower OAM index wins where sprites overlap.
        let mut drawn = [false; SCREEN_WIDTH];
        for s in &self.line_sprites[..self.sprite_count] {
            let tile = if sprite_height == 16 {
                s.tile & 0xFE
            } else {
                s.tile
            };
            let mut line_idx = self.ly as i16 - s.y;
            if s.flags & OBJ_Y_FLIP != 0 {
                line_idx = sprite_height - 1 - line_idx;
            }
            let line_idx = line_idx as usize;
            let addr = (tile as usize + (line_idx >> 3)) * 16 + (line_idx & 7) * 2;
            let lo = self.vram[addr];
            let hi = self.vram[addr + 1];
            let palette = if s.flags & OBJ_PALETTE1 != 0 {
                self.obp1
            } else {
                self.obp0
            };

            for px in 0..8u8 {
                let bit = if s.flags & OBJ_X_FLIP != 0 { px } else { 7 - px };
                let color_id = ((hi >> bit) & 1) << 1 | ((lo >> bit) & 1);
                if color_id == 0 {
                    continue;
                }
                let sx = s.x + px as i16;
                if !(0i16..SCREEN_WIDTH as i16).contains(&sx) || drawn[sx as usize] {
                    continue;
                }
                let sx = sx as usize;
                drawn[sx] = true;
                if s.flags & OBJ_BEHIND_BG != 0 && !self.line_color_zero[sx] {
                    continue;
                }
                self.framebuffer[row_start + sx] =
                    shades[Self::dmg_shade(palette, color_id) as usize];
            }
        }
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ppu_with_tile(tile_row: [u8; 2]) -> Ppu {
        let mut ppu = Ppu::new_post_boot();
        // Tile 0 in the 0x8000 area, every row identical.
        for row in 0..8 {
            ppu.vram[row * 2] = tile_row[0];
            ppu.vram[row * 2 + 1] = tile_row[1];
        }
        ppu.bgp = 0xE4;
        ppu.obp0 = 0xE4;
        ppu
    }

    #[test]
    fn background_uses_palette_and_theme() {
        let mut ppu = ppu_with_tile([0xFF, 0x00]);
        ppu.render_scanline();
        let shades = ThemeId::Classic.shades();
        assert_eq!(ppu.framebuffer[0], shades[1]);
        assert_eq!(ppu.framebuffer[SCREEN_WIDTH - 1], shades[1]);
    }

    #[test]
    fn sprite_color_zero_is_transparent() {
        let mut ppu = ppu_with_tile([0x00, 0x00]);
        ppu.lcdc |= LCDC_OBJ_ENABLE;
        // Sprite 0 at screen (0, 0) using tile 1, left half opaque colour 3.
        ppu.oam[..4].copy_from_slice(&[16, 8, 1, 0]);
        for row in 0..8 {
            ppu.vram[16 + row * 2] = 0xF0;
            ppu.vram[16 + row * 2 + 1] = 0xF0;
        }
        ppu.oam_scan();
        ppu.render_scanline();
        let shades = ThemeId::Classic.shades();
        assert_eq!(ppu.framebuffer[0], shades[3]);
        assert_eq!(ppu.framebuffer[4], shades[0]);
    }

    #[test]
    fn behind_bg_sprite_only_shows_over_color_zero() {
        let mut ppu = ppu_with_tile([0xF0, 0x00]);
        ppu.lcdc |= LCDC_OBJ_ENABLE;
        ppu.oam[..4].copy_from_slice(&[16, 8, 1, OBJ_BEHIND_BG]);
        for row in 0..8 {
            ppu.vram[16 + row * 2] = 0xFF;
            ppu.vram[16 + row * 2 + 1] = 0xFF;
        }
        ppu.oam_scan();
        ppu.render_scanline();
        let shades = ThemeId::Classic.shades();
        assert_eq!(ppu.framebuffer[0], shades[1], "BG colour 1 wins");
        assert_eq!(ppu.framebuffer[7], shades[3], "sprite shows over BG colour 0");
    }

    fn fill_tile(ppu: &mut Ppu, tile: usize, lo: u8, hi: u8) {
        for row in 0..8 {
            ppu.vram[tile * 16 + row * 2] = lo;
            ppu.vram[tile * 16 + row * 2 + 1] = hi;
        }
    }

    fn render_line(ppu: &mut Ppu, ly: u8) -> [u32; SCREEN_WIDTH] {
        ppu.ly = ly;
        ppu.oam_scan();
        ppu.render_scanline();
        let start = ly as usize * SCREEN_WIDTH;
        let mut line = [0; SCREEN_WIDTH];
        line.copy_from_slice(&ppu.framebuffer[start..start + SCREEN_WIDTH]);
        line
    }

    #[test]
    fn sprite_x_flip_mirrors_pixels() {
        let mut ppu = ppu_with_tile([0x00, 0x00]);
        ppu.lcdc |= LCDC_OBJ_ENABLE;
        fill_tile(&mut ppu, 1, 0x80, 0x80);
        let shades = ThemeId::Classic.shades();

        ppu.oam[..4].copy_from_slice(&[16, 8, 1, 0]);
        let line = render_line(&mut ppu, 0);
        assert_eq!(line[0], shades[3]);
        assert_eq!(line[7], shades[0]);

        ppu.oam[3] = OBJ_X_FLIP;
        let line = render_line(&mut ppu, 0);
        assert_eq!(line[0], shades[0]);
        assert_eq!(line[7], shades[3]);
    }

    #[test]
    fn sprite_y_flip_reads_rows_bottom_up() {
        let mut ppu = ppu_with_tile([0x00, 0x00]);
        ppu.lcdc |= LCDC_OBJ_ENABLE;
        // Only the top row of tile 1 is opaque.
        ppu.vram[16] = 0xFF;
        ppu.vram[17] = 0xFF;
        ppu.oam[..4].copy_from_slice(&[16, 8, 1, 0]);
        let shades = ThemeId::Classic.shades();

        assert_eq!(render_line(&mut ppu, 0)[0], shades[3]);
        assert_eq!(render_line(&mut ppu, 7)[0], shades[0]);

        ppu.oam[3] = OBJ_Y_FLIP;
        assert_eq!(render_line(&mut ppu, 0)[0], shades[0]);
        assert_eq!(render_line(&mut ppu, 7)[0], shades[3]);
    }

    #[test]
    fn tall_sprites_pair_even_and_odd_tiles() {
        let mut ppu = ppu_with_tile([0x00, 0x00]);
        ppu.lcdc |= LCDC_OBJ_ENABLE | LCDC_OBJ_SIZE;
        fill_tile(&mut ppu, 2, 0xFF, 0x00);
        fill_tile(&mut ppu, 3, 0x00, 0xFF);
        // The low bit of the tile index is ignored in 8x16 mode.
        ppu.oam[..4].copy_from_slice(&[16, 8, 3, 0]);
        let shades = ThemeId::Classic.shades();

        assert_eq!(render_line(&mut ppu, 0)[0], shades[1], "top half is tile 2");
        assert_eq!(render_line(&mut ppu, 8)[0], shades[2], "bottom half is tile 3");
        assert_eq!(render_line(&mut ppu, 15)[0], shades[2]);
        assert_eq!(render_line(&mut ppu, 16)[0], shades[0], "16 rows tall");

        ppu.oam[3] = OBJ_Y_FLIP;
        assert_eq!(render_line(&mut ppu, 0)[0], shades[2], "flip swaps the halves");
        assert_eq!(render_line(&mut ppu, 15)[0], shades[1]);
    }

    #[test]
    fn palette_bit_selects_obp1() {
        let mut ppu = ppu_with_tile([0x00, 0x00]);
        ppu.lcdc |= LCDC_OBJ_ENABLE;
        ppu.obp1 = 0x1B;
        fill_tile(&mut ppu, 1, 0xFF, 0x00);
        ppu.oam[..4].copy_from_slice(&[16, 8, 1, 0]);
        ppu.oam[4..8].copy_from_slice(&[16, 16, 1, OBJ_PALETTE1]);
        let shades = ThemeId::Classic.shades();

        let line = render_line(&mut ppu, 0);
        assert_eq!(line[0], shades[1], "OBP0 maps colour 1 to shade 1");
        assert_eq!(line[8], shades[2], "OBP1 maps colour 1 to shade 2");
    }

    #[test]
    fn background_scroll_wraps_around_the_map() {
        let mut ppu = ppu_with_tile([0x00, 0x00]);
        fill_tile(&mut ppu, 1, 0xFF, 0xFF);
        // Map entry (0, 0) of the 0x9800 map is the only solid tile.
        ppu.vram[0x1800] = 1;
        ppu.scx = 252;
        ppu.scy = 250;
        let shades = ThemeId::Classic.shades();

        let line = render_line(&mut ppu, 6);
        assert_eq!(line[3], shades[0], "x 255 is column 31");
        assert_eq!(line[4], shades[3], "x wraps to column 0");
        assert_eq!(line[11], shades[3]);
        assert_eq!(line[12], shades[0]);

        let line = render_line(&mut ppu, 5);
        assert_eq!(line[4], shades[0], "y 255 is row 31");
    }

    #[test]
    fn oam_scan_keeps_first_ten_in_oam_order() {
        let mut ppu = Ppu::new_post_boot();
        for i in 0..12 {
            ppu.oam[i * 4] = 16;
            ppu.oam[i * 4 + 1] = 100 - i as u8;
        }
        ppu.oam_scan();
        assert_eq!(ppu.sprite_count, MAX_SPRITES_PER_LINE);
        assert_eq!(ppu.line_sprites[0].x, 92);
        assert_eq!(ppu.line_sprites[9].x, 83);
    }
}
