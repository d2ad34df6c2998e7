pub mod header;
pub mod mbc;
pub mod mbc0;
pub mod mbc1;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::header::{CartridgeType, Header, HeaderError};
use self::mbc::{Mbc, MbcEnum};

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum CartridgeError {
    #[error("bad cartridge header: {0}")]
    InvalidHeader(#[from] HeaderError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Cartridge {
    #[serde(with = "serde_bytes")]
    pub rom: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub ram: Vec<u8>,
    pub header: Header,
    pub mbc: MbcEnum,
}

impl Cartridge {
    pub fn from_rom(rom: Vec<u8>) -> Result<Self, CartridgeError> {
        let header = Header::parse(&rom)?;
        let ram = vec![0; header.ram_size.byte_len()];

        let mbc = match header.cartridge_type {
            CartridgeType::RomOnly => MbcEnum::Mbc0(mbc0::Mbc0::new()),
            CartridgeType::Mbc1 | CartridgeType::Mbc1Ram | CartridgeType::Mbc1RamBattery => {
                MbcEnum::Mbc1(mbc1::Mbc1::new())
            }
        };

        if !header.logo_ok {
            log::warn!("cartridge logo region does not match; the boot ROM would reject this image");
        }
        log::debug!(
            "loaded cartridge: {:?}, rom {} bytes ({} banks), ram {} bytes",
            header.cartridge_type,
            rom.len(),
            header.rom_size.bank_count(),
            ram.len()
        );

        Ok(Self {
            rom,
            ram,
            header,
            mbc,
        })
    }

    pub fn read_rom(&self, addr: u16) -> u8 {
        self.mbc.read_rom(&self.rom, addr)
    }

    pub fn write_rom(&mut self, addr: u16, val: u8) {
        self.mbc.write_rom(addr, val);
    }

    pub fn read_ram(&self, addr: u16) -> u8 {
        self.mbc.read_ram(&self.ram, addr)
    }

    pub fn write_ram(&mut self, addr: u16, val: u8) {
        self.mbc.write_ram(&mut self.ram, addr, val);
    }

    pub fn has_battery(&self) -> bool {
        matches!(self.header.cartridge_type, CartridgeType::Mbc1RamBattery)
    }

    /// Dump external RAM for battery-backed carts. No-op otherwise.
    pub fn save_to_path(&self, path: &Path) -> std::io::Result<()> {
        if !self.has_battery() {
            return Ok(());
        }
        std::fs::write(path, &self.ram)
    }

    /// Restore external RAM from a raw dump. Short or missing files load
    /// what they can; oversized files are truncated to the RAM size.
    pub fn load_from_path(&mut self, path: &Path) -> std::io::Result<()> {
        if !self.has_battery() || !path.exists() {
            return Ok(());
        }

        let data = std::fs::read(path)?;
        let n = data.len().min(self.ram.len());
        self.ram[..n].copy_from_slice(&data[..n]);
        Ok(())
    }
}
