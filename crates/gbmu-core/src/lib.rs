//! Dot-accurate original Game Boy (DMG) emulation core.
//!
//! This crate contains the platform-agnostic emulator logic. Frontends load
//! ROM images, provide save storage and present frames, and drive the core
//! through the [`gameboy`] facade.

/// Audio register block handed to an external synthesizer.
pub mod audio;

/// Cartridge header parsing and MBC bank switching.
pub mod cartridge;

/// LR35902 CPU core.
pub mod cpu;

/// High-level facade that wires the CPU and MMU into a single machine.
pub mod gameboy;

/// Collaborator traits for presenting frames and audio state.
pub mod host;

/// Interrupt flag and enable registers.
pub mod interrupts;

/// Joypad input register.
pub mod joypad;

/// Memory map and hardware plumbing.
pub mod mmu;

/// Pixel Processing Unit (PPU) emulation.
pub mod ppu;

/// Persistent cartridge RAM keyed by ROM hash.
pub mod save;

/// Serial port with no link partner.
pub mod serial;

/// DMG palette themes.
pub mod theme;

/// Divider/timer unit.
pub mod timer;
