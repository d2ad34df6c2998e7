//! DMG (original Game Boy) emulation core.
//!
//! Three tightly coupled subsystems do the real work: the SM83 instruction
//! interpreter ([`cpu`]), the address-decoded memory bus with cartridge
//! banking ([`bus`], [`cartridge`]), and the scanline PPU ([`ppu`]). The
//! [`Emulator`] frame runner owns all of them and keeps the PPU and CPU in
//! cycle lock-step.
//!
//! Presentation, audio, input sampling, and file handling live in host
//! crates; this one only ever touches bytes.

pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod emulator;
pub mod interrupt;
pub mod ppu;
pub mod timer;

pub use bus::Bus;
pub use cartridge::{Cartridge, CartridgeError};
pub use cpu::{Cpu, StepError};
pub use emulator::Emulator;
pub use ppu::Ppu;
