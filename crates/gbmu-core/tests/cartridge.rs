mod common;

use common::{BANK_SIZE, RomBuilder};
use gbmu_core::cartridge::{Cartridge, CartridgeError, MbcType};
use gbmu_core::save::{MemorySaveStore, SaveId, SaveStore};

#[test]
fn mbc1_bank_select_reads_switched_bank() {
    let rom = RomBuilder::new(0x01, 4, 0x00).tag_banks().build();
    let expected = rom[2 * BANK_SIZE];
    let mut cart = Cartridge::load(rom).unwrap();

    cart.write(0x2000, 0x02);
    assert_eq!(cart.read(0x4000), expected);
    assert_eq!(cart.read(0x4000), 2);
}

#[test]
fn mbc1_bank_zero_maps_to_one_in_both_modes() {
    let rom = RomBuilder::new(0x01, 4, 0x00).tag_banks().build();
    let mut cart = Cartridge::load(rom).unwrap();

    for mode in [0x00, 0x01] {
        cart.write(0x6000, mode);
        cart.write(0x2000, 0x00);
        assert_eq!(cart.read(0x4000), 1, "mode {mode}: bank 0 must select bank 1");
        cart.write(0x2000, 0x20);
        assert_eq!(cart.read(0x4000), 1, "mode {mode}: low five bits are zero");
    }
}

#[test]
fn mbc1_upper_bits_extend_rom_bank_in_mode_zero() {
    let rom = RomBuilder::new(0x01, 64, 0x00).tag_banks().build();
    let mut cart = Cartridge::load(rom).unwrap();

    cart.write(0x2000, 0x03);
    cart.write(0x4000, 0x01);
    assert_eq!(cart.read(0x4000), 0x23);
    assert_eq!(cart.read(0x0000), 0x00);
}

#[test]
fn mbc1_mode_one_keeps_bank_zero_fixed() {
    let rom = RomBuilder::new(0x01, 64, 0x00).tag_banks().build();
    let fixed = rom[0];
    let mut cart = Cartridge::load(rom).unwrap();

    cart.write(0x2000, 0x03);
    cart.write(0x4000, 0x01);
    cart.write(0x6000, 0x01);
    assert_eq!(cart.read(0x0000), fixed, "0x0000-0x3FFF is always bank 0");
    assert_eq!(cart.read(0x4000), 0x03, "upper bits no longer reach the ROM bank");
}

#[test]
fn out_of_range_bank_reads_open_bus() {
    let rom = RomBuilder::new(0x19, 4, 0x00).tag_banks().build();
    let mut cart = Cartridge::load(rom).unwrap();

    cart.write(0x2000, 0x07);
    assert_eq!(cart.read(0x4000), 0xFF);
    assert_eq!(cart.read(0x7FFF), 0xFF);
}

#[test]
fn mbc5_bank_zero_selects_bank_one() {
    let rom = RomBuilder::new(0x19, 4, 0x00).tag_banks().build();
    let mut cart = Cartridge::load(rom).unwrap();

    cart.write(0x2000, 0x03);
    assert_eq!(cart.read(0x4000), 0x03);
    cart.write(0x2000, 0x00);
    assert_eq!(cart.read(0x4000), 0x01);
    cart.write(0x3000, 0x00);
    assert_eq!(cart.read(0x4000), 0x01, "high bit write keeps the remap");
}

#[test]
fn ram_is_gated_by_enable_latch() {
    let rom = RomBuilder::new(0x02, 4, 0x02).build();
    let mut cart = Cartridge::load(rom).unwrap();

    cart.write(0xA000, 0x42);
    assert_eq!(cart.read(0xA000), 0xFF, "disabled RAM reads open bus");

    cart.write(0x0000, 0x0A);
    cart.write(0xA000, 0x42);
    assert_eq!(cart.read(0xA000), 0x42);

    cart.write(0x0000, 0x00);
    assert_eq!(cart.read(0xA000), 0xFF);
    cart.write(0x0000, 0x0A);
    assert_eq!(cart.read(0xA000), 0x42, "disable keeps contents");
}

#[test]
fn mbc1_ram_banks_need_mode_one() {
    let rom = RomBuilder::new(0x03, 4, 0x03).build();
    let mut cart = Cartridge::load(rom).unwrap();
    cart.write(0x0000, 0x0A);

    cart.write(0x4000, 0x02);
    cart.write(0xA000, 0x11);
    cart.write(0x6000, 0x01);
    cart.write(0xA000, 0x22);

    assert_eq!(cart.ram()[0], 0x11, "mode 0 always uses RAM bank 0");
    assert_eq!(cart.ram()[2 * 0x2000], 0x22);
}

#[test]
fn mbc2_ram_is_four_bits_wide() {
    let rom = RomBuilder::new(0x06, 4, 0x00).build();
    let mut cart = Cartridge::load(rom).unwrap();
    assert_eq!(cart.mbc(), MbcType::Mbc2);
    assert_eq!(cart.ram().len(), 0x200);

    cart.write(0x0000, 0x0A);
    cart.write(0xA005, 0xAB);
    assert_eq!(cart.read(0xA005), 0xFB);
    // The 512-byte RAM repeats through the window.
    assert_eq!(cart.read(0xA205), 0xFB);
}

#[test]
fn mbc3_clock_registers_read_open_bus() {
    let rom = RomBuilder::new(0x13, 4, 0x03).build();
    let mut cart = Cartridge::load(rom).unwrap();
    cart.write(0x0000, 0x0A);

    cart.write(0x4000, 0x01);
    cart.write(0xA000, 0x5A);
    assert_eq!(cart.read(0xA000), 0x5A);

    cart.write(0x4000, 0x08);
    assert_eq!(cart.read(0xA000), 0xFF);
}

#[test]
fn header_fields_are_exposed() {
    let rom = RomBuilder::new(0x13, 4, 0x03).build();
    let cart = Cartridge::load(rom).unwrap();
    let header = cart.header();

    assert_eq!(cart.title(), "TEST");
    assert_eq!(header.cart_type(), 0x13);
    assert_eq!(header.type_name(), "MBC3+RAM+BATTERY");
    assert_eq!(header.rom_size(), 4 * BANK_SIZE);
    assert_eq!(header.ram_size(), 0x8000);
    assert!(header.has_battery());
    assert!(header.header_checksum_ok());
}

#[test]
fn bad_header_checksum_still_loads() {
    let mut rom = RomBuilder::rom_only().build();
    rom[0x014D] ^= 0xFF;
    let cart = Cartridge::load(rom).unwrap();
    assert!(!cart.header().header_checksum_ok());
}

#[test]
fn unknown_type_falls_back_to_rom_only() {
    let rom = RomBuilder::new(0xFC, 2, 0x00).build();
    let cart = Cartridge::load(rom).unwrap();
    assert_eq!(cart.mbc(), MbcType::NoMbc);
}

#[test]
fn short_image_is_rejected() {
    let err = Cartridge::load(vec![0; 0x100]).unwrap_err();
    assert!(matches!(err, CartridgeError::ImageTooSmall { len: 0x100 }));
}

#[test]
fn battery_ram_resumes_from_store() {
    let rom = RomBuilder::new(0x03, 4, 0x02).build();
    let id = SaveId::from_rom(&rom);
    let mut store = MemorySaveStore::new();
    store.preload(id.clone(), vec![0x77; 0x2000]);

    let mut cart = Cartridge::with_save_store(rom, &mut store).unwrap();
    assert!(cart.is_persistent());
    assert_eq!(cart.save_id(), &id);

    cart.write(0x0000, 0x0A);
    assert_eq!(cart.read(0xA123), 0x77);
}

#[test]
fn cart_without_battery_ignores_store() {
    let rom = RomBuilder::new(0x02, 4, 0x02).build();
    let mut store = MemorySaveStore::new();
    store.preload(SaveId::from_rom(&rom), vec![0x77; 0x2000]);

    let mut cart = Cartridge::with_save_store(rom, &mut store).unwrap();
    assert!(!cart.is_persistent());
    cart.write(0x0000, 0x0A);
    assert_eq!(cart.read(0xA000), 0x00);
}

mod flushing {
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;

    use super::*;
    use gbmu_core::save::SaveRegion;

    struct CountingRegion {
        data: Vec<u8>,
        flushes: Rc<Cell<u32>>,
    }

    impl SaveRegion for CountingRegion {
        fn bytes(&self) -> &[u8] {
            &self.data
        }

        fn bytes_mut(&mut self) -> &mut [u8] {
            &mut self.data
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes.set(self.flushes.get() + 1);
            Ok(())
        }
    }

    struct CountingStore {
        flushes: Rc<Cell<u32>>,
        size_override: Option<usize>,
    }

    impl SaveStore for CountingStore {
        fn open(&mut self, _id: &SaveId, len: usize) -> io::Result<Box<dyn SaveRegion>> {
            Ok(Box::new(CountingRegion {
                data: vec![0; self.size_override.unwrap_or(len)],
                flushes: self.flushes.clone(),
            }))
        }
    }

    struct FailingStore;

    impl SaveStore for FailingStore {
        fn open(&mut self, _id: &SaveId, _len: usize) -> io::Result<Box<dyn SaveRegion>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    #[test]
    fn flush_happens_exactly_once() {
        let flushes = Rc::new(Cell::new(0));
        let mut store = CountingStore {
            flushes: flushes.clone(),
            size_override: None,
        };
        let rom = RomBuilder::new(0x03, 4, 0x02).build();

        let mut cart = Cartridge::with_save_store(rom, &mut store).unwrap();
        cart.flush().unwrap();
        cart.flush().unwrap();
        drop(cart);
        assert_eq!(flushes.get(), 1);
    }

    #[test]
    fn drop_flushes_when_never_flushed() {
        let flushes = Rc::new(Cell::new(0));
        let mut store = CountingStore {
            flushes: flushes.clone(),
            size_override: None,
        };
        let rom = RomBuilder::new(0x03, 4, 0x02).build();

        drop(Cartridge::with_save_store(rom, &mut store).unwrap());
        assert_eq!(flushes.get(), 1);
    }

    #[test]
    fn wrong_region_size_is_an_error() {
        let mut store = CountingStore {
            flushes: Rc::new(Cell::new(0)),
            size_override: Some(16),
        };
        let rom = RomBuilder::new(0x03, 4, 0x02).build();

        let err = Cartridge::with_save_store(rom, &mut store).unwrap_err();
        assert!(matches!(
            err,
            CartridgeError::SaveSizeMismatch {
                expected: 0x2000,
                actual: 16
            }
        ));
    }

    #[test]
    fn store_failure_prevents_construction() {
        let rom = RomBuilder::new(0x03, 4, 0x02).build();
        let err = Cartridge::with_save_store(rom, &mut FailingStore).unwrap_err();
        assert!(matches!(err, CartridgeError::SaveStore(_)));
    }
}
