use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mapper kinds this core implements. The header byte space is much larger;
/// anything outside ROM-only and MBC1 is rejected at load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartridgeType {
    RomOnly,
    Mbc1,
    Mbc1Ram,
    Mbc1RamBattery,
}

impl CartridgeType {
    fn from_byte(byte: u8) -> Result<Self, HeaderError> {
        match byte {
            0x00 => Ok(CartridgeType::RomOnly),
            0x01 => Ok(CartridgeType::Mbc1),
            0x02 => Ok(CartridgeType::Mbc1Ram),
            0x03 => Ok(CartridgeType::Mbc1RamBattery),
            _ => Err(HeaderError::UnsupportedCartridgeType(byte)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RomSize {
    Kilobytes32,  // 2 banks
    Kilobytes64,  // 4 banks
    Kilobytes128, // 8 banks
    Kilobytes256, // 16 banks
    Kilobytes512, // 32 banks
    Megabyte1,    // 64 banks
    Megabyte2,    // 128 banks
}

impl RomSize {
    /// Number of 16 KiB pages.
    pub fn bank_count(self) -> usize {
        match self {
            RomSize::Kilobytes32 => 2,
            RomSize::Kilobytes64 => 4,
            RomSize::Kilobytes128 => 8,
            RomSize::Kilobytes256 => 16,
            RomSize::Kilobytes512 => 32,
            RomSize::Megabyte1 => 64,
            RomSize::Megabyte2 => 128,
        }
    }

    pub fn byte_len(self) -> usize {
        self.bank_count() * 0x4000
    }

    fn from_byte(byte: u8) -> Result<Self, HeaderError> {
        match byte {
            0x00 => Ok(RomSize::Kilobytes32),
            0x01 => Ok(RomSize::Kilobytes64),
            0x02 => Ok(RomSize::Kilobytes128),
            0x03 => Ok(RomSize::Kilobytes256),
            0x04 => Ok(RomSize::Kilobytes512),
            0x05 => Ok(RomSize::Megabyte1),
            0x06 => Ok(RomSize::Megabyte2),
            _ => Err(HeaderError::UnsupportedRomSize(byte)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RamSize {
    None,
    Kilobytes8,
    Kilobytes32,
}

impl RamSize {
    pub fn byte_len(self) -> usize {
        match self {
            RamSize::None => 0,
            RamSize::Kilobytes8 => 0x2000,
            RamSize::Kilobytes32 => 0x8000,
        }
    }

    fn from_byte(byte: u8) -> Result<Self, HeaderError> {
        match byte {
            0x00 | 0x01 => Ok(RamSize::None),
            0x02 => Ok(RamSize::Kilobytes8),
            0x03 => Ok(RamSize::Kilobytes32),
            _ => Err(HeaderError::UnsupportedRamSize(byte)),
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum HeaderError {
    #[error("ROM image too small to contain a cartridge header")]
    RomTooSmall,
    #[error("unsupported cartridge type byte 0x{0:02X}")]
    UnsupportedCartridgeType(u8),
    #[error("unsupported ROM size byte 0x{0:02X}")]
    UnsupportedRomSize(u8),
    #[error("unsupported RAM size byte 0x{0:02X}")]
    UnsupportedRamSize(u8),
}

/// The boot ROM compares 0x0104..=0x0133 against this bitmap and locks up on
/// mismatch. Parsing only warns; the overlay is what actually enforces it.
pub const NINTENDO_LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00, 0x0D,
    0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E, 0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD, 0xD9, 0x99,
    0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC, 0xDD, 0xDC, 0x99, 0x9F, 0xBB, 0xB9, 0x33, 0x3E,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub cartridge_type: CartridgeType,
    pub rom_size: RomSize,
    pub ram_size: RamSize,
    pub logo_ok: bool,
}

impl Header {
    pub fn parse(rom: &[u8]) -> Result<Self, HeaderError> {
        if rom.len() < 0x014A {
            return Err(HeaderError::RomTooSmall);
        }

        let cartridge_type = CartridgeType::from_byte(rom[0x0147])?;
        let rom_size = RomSize::from_byte(rom[0x0148])?;
        let ram_size = RamSize::from_byte(rom[0x0149])?;
        let logo_ok = rom[0x0104..=0x0133] == NINTENDO_LOGO;

        Ok(Header {
            cartridge_type,
            rom_size,
            ram_size,
            logo_ok,
        })
    }
}
