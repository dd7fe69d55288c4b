use std::io;

use log::{debug, info, warn};
use thiserror::Error;

use crate::save::{MemoryRegion, SaveId, SaveRegion, SaveStore};

const ROM_BANK_SIZE: usize = 0x4000;
const RAM_BANK_SIZE: usize = 0x2000;
const HEADER_END: usize = 0x150;
const MBC2_RAM_SIZE: usize = 0x200;
const RAM_ENABLE_CODE: u8 = 0x0A;

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("cartridge image is {len} bytes, too small to hold a header")]
    ImageTooSmall { len: usize },

    #[error("failed to open save RAM: {0}")]
    SaveStore(#[source] io::Error),

    #[error("save region is {actual} bytes but the cartridge declares {expected}")]
    SaveSizeMismatch { expected: usize, actual: usize },

    #[error("failed to flush save RAM: {0}")]
    Flush(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbcType {
    NoMbc,
    Mbc1,
    Mbc2,
    Mbc3,
    Mbc5,
}

#[derive(Debug)]
enum MbcState {
    NoMbc,
    Mbc1 {
        rom_bank: u8,
        /// Shared 2-bit register at 0x4000-0x5FFF.
        bank2: u8,
        mode: u8,
        ram_enable: bool,
    },
    Mbc2 {
        rom_bank: u8,
        ram_enable: bool,
    },
    Mbc3 {
        rom_bank: u8,
        ram_bank: u8,
        ram_enable: bool,
    },
    Mbc5 {
        rom_bank: u16,
        ram_bank: u8,
        ram_enable: bool,
    },
}

impl MbcState {
    fn power_on(mbc: MbcType) -> Self {
        match mbc {
            MbcType::NoMbc => MbcState::NoMbc,
            MbcType::Mbc1 => MbcState::Mbc1 {
                rom_bank: 1,
                bank2: 0,
                mode: 0,
                ram_enable: false,
            },
            MbcType::Mbc2 => MbcState::Mbc2 {
                rom_bank: 1,
                ram_enable: false,
            },
            MbcType::Mbc3 => MbcState::Mbc3 {
                rom_bank: 1,
                ram_bank: 0,
                ram_enable: false,
            },
            MbcType::Mbc5 => MbcState::Mbc5 {
                rom_bank: 1,
                ram_bank: 0,
                ram_enable: false,
            },
        }
    }
}

pub struct Cartridge {
    rom: Vec<u8>,
    ram: Box<dyn SaveRegion>,
    mbc: MbcType,
    mbc_state: MbcState,
    save_id: SaveId,
    persistent: bool,
    flushed: bool,
}

impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("rom_len", &self.rom.len())
            .field("mbc", &self.mbc)
            .field("mbc_state", &self.mbc_state)
            .field("save_id", &self.save_id)
            .field("persistent", &self.persistent)
            .field("flushed", &self.flushed)
            .finish_non_exhaustive()
    }
}

impl Cartridge {
    /// Cartridge with volatile RAM, lost when the cartridge is dropped.
    pub fn load(rom: Vec<u8>) -> Result<Self, CartridgeError> {
        Self::build(rom, None)
    }

    /// Cartridge whose battery-backed RAM is opened from `store`, keyed by
    /// the ROM's [`SaveId`]. Carts without a battery get volatile RAM.
    pub fn with_save_store(
        rom: Vec<u8>,
        store: &mut dyn SaveStore,
    ) -> Result<Self, CartridgeError> {
        Self::build(rom, Some(store))
    }

    fn build(rom: Vec<u8>, store: Option<&mut dyn SaveStore>) -> Result<Self, CartridgeError> {
        if rom.len() < HEADER_END {
            return Err(CartridgeError::ImageTooSmall { len: rom.len() });
        }

        let header = Header::parse(&rom);
        let cart_type = header.cart_type();
        let mbc = header.mbc_type();
        let ram_size = header.ram_size();
        let battery = header.has_battery();
        let title = header.title();

        if !header.header_checksum_ok() {
            warn!("Header checksum mismatch for \"{title}\"; loading anyway");
        }
        if mbc == MbcType::NoMbc && !matches!(cart_type, 0x00 | 0x08 | 0x09) {
            warn!(
                "Unsupported cartridge type {cart_type:#04X} ({}); treating as ROM only",
                header.type_name()
            );
        }

        let save_id = SaveId::from_rom(&rom);
        let persistent = battery && ram_size > 0 && store.is_some();
        let ram: Box<dyn SaveRegion> = match store {
            Some(store) if persistent => {
                let region = store
                    .open(&save_id, ram_size)
                    .map_err(CartridgeError::SaveStore)?;
                let actual = region.bytes().len();
                if actual != ram_size {
                    return Err(CartridgeError::SaveSizeMismatch {
                        expected: ram_size,
                        actual,
                    });
                }
                region
            }
            _ => Box::new(MemoryRegion::new(ram_size)),
        };

        info!(
            "Loaded ROM: {title} (MBC: {mbc:?}, ROM: {} KiB, RAM: {} B, save id: {save_id}{})",
            rom.len() / 1024,
            ram_size,
            if persistent { ", persistent" } else { "" }
        );

        Ok(Self {
            rom,
            ram,
            mbc,
            mbc_state: MbcState::power_on(mbc),
            save_id,
            persistent,
            flushed: false,
        })
    }

    pub fn header(&self) -> Header<'_> {
        Header::parse(&self.rom)
    }

    pub fn title(&self) -> String {
        self.header().title()
    }

    pub fn mbc(&self) -> MbcType {
        self.mbc
    }

    pub fn save_id(&self) -> &SaveId {
        &self.save_id
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn ram(&self) -> &[u8] {
        self.ram.bytes()
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Return every bank register to its power-on value. RAM contents stay.
    pub fn reset_banking(&mut self) {
        self.mbc_state = MbcState::power_on(self.mbc);
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF => {
                let bank = self.rom_bank_for(addr);
                let offset = bank * ROM_BANK_SIZE + (addr as usize & (ROM_BANK_SIZE - 1));
                // Banks past the end of the image are open bus, not mirrors.
                self.rom.get(offset).copied().unwrap_or(0xFF)
            }
            0xA000..=0xBFFF => {
                let Some(idx) = self.ram_offset(addr) else {
                    return 0xFF;
                };
                let val = self.ram.bytes().get(idx).copied().unwrap_or(0xFF);
                if self.mbc == MbcType::Mbc2 {
                    0xF0 | (val & 0x0F)
                } else {
                    val
                }
            }
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x7FFF => self.write_register(addr, val),
            0xA000..=0xBFFF => {
                let Some(idx) = self.ram_offset(addr) else {
                    return;
                };
                let val = if self.mbc == MbcType::Mbc2 {
                    val & 0x0F
                } else {
                    val
                };
                if let Some(b) = self.ram.bytes_mut().get_mut(idx) {
                    *b = val;
                }
            }
            _ => {}
        }
    }

    fn rom_bank_for(&self, addr: u16) -> usize {
        match (&self.mbc_state, addr) {
            (_, 0x0000..=0x3FFF) => 0,
            (MbcState::NoMbc, _) => 1,
            // The shared 2-bit field extends the ROM bank in mode 0 and
            // selects the RAM bank in mode 1.
            (
                MbcState::Mbc1 {
                    rom_bank,
                    bank2,
                    mode: 0,
                    ..
                },
                _,
            ) => ((*bank2 as usize) << 5) | *rom_bank as usize,
            (MbcState::Mbc1 { rom_bank, .. }, _) => *rom_bank as usize,
            (MbcState::Mbc2 { rom_bank, .. }, _) | (MbcState::Mbc3 { rom_bank, .. }, _) => {
                *rom_bank as usize
            }
            (MbcState::Mbc5 { rom_bank, .. }, _) => *rom_bank as usize,
        }
    }

    /// Offset into cartridge RAM for an access in 0xA000-0xBFFF, or `None`
    /// when the access is gated off.
    fn ram_offset(&self, addr: u16) -> Option<usize> {
        let rel = addr as usize - 0xA000;
        match &self.mbc_state {
            MbcState::NoMbc => Some(rel),
            MbcState::Mbc1 {
                bank2,
                mode,
                ram_enable,
                ..
            } => {
                let bank = if *mode == 1 { *bank2 as usize } else { 0 };
                ram_enable.then_some(bank * RAM_BANK_SIZE + rel)
            }
            // 512 half-bytes, mirrored across the whole window.
            MbcState::Mbc2 { ram_enable, .. } => ram_enable.then_some(rel & (MBC2_RAM_SIZE - 1)),
            // Banks 0x08-0x0C select clock registers, which are not fitted.
            MbcState::Mbc3 {
                ram_bank,
                ram_enable,
                ..
            } => (*ram_enable && *ram_bank <= 0x03)
                .then_some(*ram_bank as usize * RAM_BANK_SIZE + rel),
            MbcState::Mbc5 {
                ram_bank,
                ram_enable,
                ..
            } => ram_enable.then_some(*ram_bank as usize * RAM_BANK_SIZE + rel),
        }
    }

    fn write_register(&mut self, addr: u16, val: u8) {
        match (&mut self.mbc_state, addr) {
            (MbcState::NoMbc, _) => {}
            (MbcState::Mbc1 { ram_enable, .. }, 0x0000..=0x1FFF)
            | (MbcState::Mbc3 { ram_enable, .. }, 0x0000..=0x1FFF)
            | (MbcState::Mbc5 { ram_enable, .. }, 0x0000..=0x1FFF) => {
                *ram_enable = val & 0x0F == RAM_ENABLE_CODE;
            }
            (MbcState::Mbc1 { rom_bank, .. }, 0x2000..=0x3FFF) => {
                *rom_bank = val & 0x1F;
                if *rom_bank == 0 {
                    *rom_bank = 1;
                }
                debug!("MBC1 ROM bank low bits = {:#04X}", *rom_bank);
            }
            (MbcState::Mbc1 { bank2, .. }, 0x4000..=0x5FFF) => {
                *bank2 = val & 0x03;
                debug!("MBC1 upper bank bits = {}", *bank2);
            }
            (MbcState::Mbc1 { mode, .. }, 0x6000..=0x7FFF) => {
                *mode = val & 0x01;
                debug!("MBC1 banking mode = {}", *mode);
            }
            (
                MbcState::Mbc2 {
                    rom_bank,
                    ram_enable,
                },
                0x0000..=0x3FFF,
            ) => {
                // Address bit 8 picks the register: clear for RAM enable,
                // set for ROM bank.
                if addr & 0x0100 == 0 {
                    *ram_enable = val & 0x0F == RAM_ENABLE_CODE;
                } else {
                    *rom_bank = val & 0x0F;
                    if *rom_bank == 0 {
                        *rom_bank = 1;
                    }
                    debug!("MBC2 ROM bank = {}", *rom_bank);
                }
            }
            (MbcState::Mbc3 { rom_bank, .. }, 0x2000..=0x3FFF) => {
                *rom_bank = val & 0x7F;
                if *rom_bank == 0 {
                    *rom_bank = 1;
                }
                debug!("MBC3 ROM bank = {}", *rom_bank);
            }
            (MbcState::Mbc3 { ram_bank, .. }, 0x4000..=0x5FFF) => {
                *ram_bank = val;
                debug!("MBC3 RAM bank = {val:#04X}");
            }
            (MbcState::Mbc5 { rom_bank, .. }, 0x2000..=0x2FFF) => {
                *rom_bank = (*rom_bank & 0x100) | val as u16;
                if *rom_bank == 0 {
                    *rom_bank = 1;
                }
                debug!("MBC5 ROM bank = {}", *rom_bank);
            }
            (MbcState::Mbc5 { rom_bank, .. }, 0x3000..=0x3FFF) => {
                *rom_bank = (*rom_bank & 0xFF) | (((val & 0x01) as u16) << 8);
                if *rom_bank == 0 {
                    *rom_bank = 1;
                }
                debug!("MBC5 ROM bank = {}", *rom_bank);
            }
            (MbcState::Mbc5 { ram_bank, .. }, 0x4000..=0x5FFF) => {
                *ram_bank = val & 0x0F;
                debug!("MBC5 RAM bank = {}", *ram_bank);
            }
            // MBC3 clock latch and the unused MBC5/MBC2 ranges.
            _ => {}
        }
    }

    /// Sync RAM to the backing store. Only the first call does any work;
    /// later calls, and the one made on drop, return immediately.
    pub fn flush(&mut self) -> Result<(), CartridgeError> {
        if self.flushed {
            return Ok(());
        }
        self.flushed = true;
        if !self.persistent {
            return Ok(());
        }
        self.ram.flush().map_err(CartridgeError::Flush)?;
        debug!("Flushed {} bytes of save RAM for {}", self.ram.bytes().len(), self.save_id);
        Ok(())
    }
}

impl Drop for Cartridge {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!("{e}");
        }
    }
}

/// Read-only view of the cartridge header at 0x0100-0x014F.
///
/// The image is at least `0x150` bytes once a [`Cartridge`] exists, but
/// every accessor still bounds-checks so a raw slice can be inspected too.
pub struct Header<'a> {
    data: &'a [u8],
}

impl<'a> Header<'a> {
    pub fn parse(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn byte(&self, offset: usize) -> u8 {
        self.data.get(offset).copied().unwrap_or(0)
    }

    /// Title at 0x134-0x143, cut at the first NUL and trimmed.
    pub fn title(&self) -> String {
        let start = 0x0134.min(self.data.len());
        let end = 0x0144.min(self.data.len());
        let mut slice = &self.data[start..end];
        if let Some(pos) = slice.iter().position(|&b| b == 0) {
            slice = &slice[..pos];
        }
        String::from_utf8_lossy(slice).trim().to_string()
    }

    pub fn cart_type(&self) -> u8 {
        self.byte(0x0147)
    }

    pub fn rom_size_code(&self) -> u8 {
        self.byte(0x0148)
    }

    pub fn ram_size_code(&self) -> u8 {
        self.byte(0x0149)
    }

    pub fn licensee_code(&self) -> u8 {
        self.byte(0x014B)
    }

    pub fn header_checksum(&self) -> u8 {
        self.byte(0x014D)
    }

    pub fn global_checksum(&self) -> u16 {
        u16::from_be_bytes([self.byte(0x014E), self.byte(0x014F)])
    }

    /// Recompute the checksum over 0x134-0x14C and compare it with 0x14D.
    pub fn header_checksum_ok(&self) -> bool {
        let sum = (0x0134..=0x014C).fold(0u8, |acc: u8, i| {
            acc.wrapping_sub(self.byte(i)).wrapping_sub(1)
        });
        sum == self.header_checksum()
    }

    pub fn mbc_type(&self) -> MbcType {
        match self.cart_type() {
            0x01..=0x03 => MbcType::Mbc1,
            0x05 | 0x06 => MbcType::Mbc2,
            0x0F..=0x13 => MbcType::Mbc3,
            0x19..=0x1E => MbcType::Mbc5,
            _ => MbcType::NoMbc,
        }
    }

    pub fn has_battery(&self) -> bool {
        matches!(
            self.cart_type(),
            0x03 | 0x06 | 0x09 | 0x0D | 0x0F | 0x10 | 0x13 | 0x1B | 0x1E | 0xFF
        )
    }

    /// ROM size declared by the header: 32 KiB shifted by the size code.
    pub fn rom_size(&self) -> usize {
        match self.rom_size_code() {
            code @ 0x00..=0x08 => 0x8000 << code,
            _ => 0,
        }
    }

    pub fn ram_size(&self) -> usize {
        // MBC2 has 512x4-bit internal RAM regardless of header RAM size.
        if self.mbc_type() == MbcType::Mbc2 {
            return MBC2_RAM_SIZE;
        }

        match self.ram_size_code() {
            0x01 => 0x800,   // 2KB
            0x02 => 0x2000,  // 8KB
            0x03 => 0x8000,  // 32KB (4 banks)
            0x04 => 0x20000, // 128KB (16 banks)
            0x05 => 0x10000, // 64KB (8 banks)
            _ => 0,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.cart_type() {
            0x00 => "ROM ONLY",
            0x01 => "MBC1",
            0x02 => "MBC1+RAM",
            0x03 => "MBC1+RAM+BATTERY",
            0x05 => "MBC2",
            0x06 => "MBC2+BATTERY",
            0x08 => "ROM+RAM",
            0x09 => "ROM+RAM+BATTERY",
            0x0B => "MMM01",
            0x0C => "MMM01+RAM",
            0x0D => "MMM01+RAM+BATTERY",
            0x0F => "MBC3+TIMER+BATTERY",
            0x10 => "MBC3+TIMER+RAM+BATTERY",
            0x11 => "MBC3",
            0x12 => "MBC3+RAM",
            0x13 => "MBC3+RAM+BATTERY",
            0x19 => "MBC5",
            0x1A => "MBC5+RAM",
            0x1B => "MBC5+RAM+BATTERY",
            0x1C => "MBC5+RUMBLE",
            0x1D => "MBC5+RUMBLE+RAM",
            0x1E => "MBC5+RUMBLE+RAM+BATTERY",
            0x20 => "MBC6",
            0x22 => "MBC7+SENSOR+RUMBLE+RAM+BATTERY",
            0xFC => "POCKET CAMERA",
            0xFD => "BANDAI TAMA5",
            0xFE => "HuC3",
            0xFF => "HuC1+RAM+BATTERY",
            _ => "UNKNOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(cart_type: u8, banks: usize, ram_code: u8) -> Vec<u8> {
        let mut rom = vec![0u8; banks * ROM_BANK_SIZE];
        for bank in 0..banks {
            rom[bank * ROM_BANK_SIZE + 1] = bank as u8;
        }
        rom[0x0147] = cart_type;
        rom[0x0149] = ram_code;
        rom
    }

    #[test]
    fn image_without_header_is_rejected() {
        assert!(matches!(
            Cartridge::load(vec![0; 0x14F]),
            Err(CartridgeError::ImageTooSmall { len: 0x14F })
        ));
    }

    #[test]
    fn mbc1_mode_bit_moves_upper_bits_between_rom_and_ram() {
        let mut cart = Cartridge::load(image(0x01, 128, 0)).unwrap();
        cart.write(0x4000, 0x01);
        assert_eq!(cart.read(0x0001), 0, "bank 0 stays fixed");
        assert_eq!(cart.read(0x4001), 0x21);

        cart.write(0x6000, 0x01);
        assert_eq!(cart.read(0x0001), 0, "bank 0 stays fixed in mode 1");
        assert_eq!(cart.read(0x4001), 0x01, "upper bits now select RAM");
        assert_eq!(cart.ram_offset(0xA000), None, "RAM still disabled");
        cart.write(0x0000, 0x0A);
        assert_eq!(cart.ram_offset(0xA000), Some(RAM_BANK_SIZE));
    }

    #[test]
    fn mbc2_address_bit8_selects_register() {
        let mut cart = Cartridge::load(image(0x05, 16, 0)).unwrap();
        cart.write(0x0000, 0x0A);
        cart.write(0x0100, 0x03);
        assert_eq!(cart.read(0x4001), 3);

        cart.write(0xA000, 0xAB);
        assert_eq!(cart.read(0xA000), 0xFB, "upper nibble reads as 1s");
        assert_eq!(cart.read(0xA200), 0xFB, "mirrored every 512 bytes");
    }

    #[test]
    fn mbc3_clock_registers_read_open_bus() {
        let mut cart = Cartridge::load(image(0x10, 8, 0x03)).unwrap();
        cart.write(0x0000, 0x0A);
        cart.write(0xA000, 0x12);
        cart.write(0x4000, 0x08);
        assert_eq!(cart.read(0xA000), 0xFF);
        cart.write(0x4000, 0x00);
        assert_eq!(cart.read(0xA000), 0x12);
    }

    #[test]
    fn mbc5_bank_zero_maps_to_one() {
        let mut cart = Cartridge::load(image(0x19, 512, 0)).unwrap();
        cart.write(0x2000, 0x00);
        assert_eq!(cart.rom_bank_for(0x4000), 1);
        assert_eq!(cart.read(0x4001), 1);

        cart.write(0x2000, 0x05);
        cart.write(0x3000, 0x01);
        assert_eq!(cart.read(0x4001), 5, "bank 0x105 low byte tag");
        assert_eq!(cart.rom_bank_for(0x4000), 0x105);

        cart.write(0x2000, 0x00);
        assert_eq!(cart.rom_bank_for(0x4000), 0x100, "only a zero index is remapped");
        cart.write(0x3000, 0x00);
        assert_eq!(cart.rom_bank_for(0x4000), 1);
    }

    #[test]
    fn header_fields() {
        let mut rom = image(0x03, 2, 0x02);
        rom[0x0134..0x0139].copy_from_slice(b"HELLO");
        rom[0x014B] = 0x33;
        rom[0x014E] = 0x12;
        rom[0x014F] = 0x34;
        let header = Header::parse(&rom);
        assert_eq!(header.title(), "HELLO");
        assert_eq!(header.type_name(), "MBC1+RAM+BATTERY");
        assert_eq!(header.ram_size(), 0x2000);
        assert_eq!(header.licensee_code(), 0x33);
        assert_eq!(header.global_checksum(), 0x1234);
        assert!(header.has_battery());
    }

    #[test]
    fn header_checksum_matches_recomputed_value() {
        let mut rom = image(0x00, 2, 0);
        let sum = (0x0134..=0x014C).fold(0u8, |acc: u8, i| {
            acc.wrapping_sub(rom[i]).wrapping_sub(1)
        });
        rom[0x014D] = sum;
        assert!(Header::parse(&rom).header_checksum_ok());
        rom[0x014D] = sum.wrapping_add(1);
        assert!(!Header::parse(&rom).header_checksum_ok());
    }
}
