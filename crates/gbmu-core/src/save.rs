//! Persistent cartridge RAM.
//!
//! The core never touches the filesystem. A [`SaveStore`] hands out a
//! [`SaveRegion`] per cartridge, keyed by a [`SaveId`] derived from the ROM
//! contents, and the cartridge uses that region directly as its RAM.

use std::collections::HashMap;
use std::fmt;
use std::io;

use sha1::{Digest, Sha1};

/// Stable identifier of a cartridge image: lowercase hex SHA-1 of the ROM.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SaveId(String);

impl SaveId {
    pub fn from_rom(rom: &[u8]) -> Self {
        let digest = Sha1::digest(rom);
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest.iter() {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Byte region whose contents survive the session once flushed.
pub trait SaveRegion {
    fn bytes(&self) -> &[u8];
    fn bytes_mut(&mut self) -> &mut [u8];
    fn flush(&mut self) -> io::Result<()>;
}

/// Source of save regions. `open` must return a region of exactly `len`
/// bytes, holding whatever was last flushed for `id` (zero-filled if new).
pub trait SaveStore {
    fn open(&mut self, id: &SaveId, len: usize) -> io::Result<Box<dyn SaveRegion>>;
}

/// Region that lives only as long as the process.
pub struct MemoryRegion {
    data: Vec<u8>,
}

impl MemoryRegion {
    pub fn new(len: usize) -> Self {
        Self { data: vec![0; len] }
    }
}

impl SaveRegion for MemoryRegion {
    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Volatile store for tests and embedders without persistent storage.
///
/// Regions are seeded from `preload` when an entry exists for the id, so
/// tests can simulate a save file left by an earlier session.
#[derive(Default)]
pub struct MemorySaveStore {
    preload: HashMap<SaveId, Vec<u8>>,
}

impl MemorySaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preload(&mut self, id: SaveId, data: Vec<u8>) {
        self.preload.insert(id, data);
    }
}

impl SaveStore for MemorySaveStore {
    fn open(&mut self, id: &SaveId, len: usize) -> io::Result<Box<dyn SaveRegion>> {
        let mut region = MemoryRegion::new(len);
        if let Some(seed) = self.preload.get(id) {
            let n = seed.len().min(len);
            region.data[..n].copy_from_slice(&seed[..n]);
        }
        Ok(Box::new(region))
    }
}
