use serde::{Deserialize, Serialize};

use super::{mbc0::Mbc0, mbc1::Mbc1};

/// Bank-controller seam. The cartridge owns the rom/ram buffers and lends
/// them per call so controller state stays plain data.
pub trait Mbc {
    fn read_rom(&self, rom: &[u8], addr: u16) -> u8;
    fn write_rom(&mut self, addr: u16, val: u8);
    fn read_ram(&self, ram: &[u8], addr: u16) -> u8;
    fn write_ram(&mut self, ram: &mut [u8], addr: u16, val: u8);
}

/// Enum dispatch over the supported controllers.
#[derive(Debug, Serialize, Deserialize)]
pub enum MbcEnum {
    Mbc0(Mbc0),
    Mbc1(Mbc1),
}

impl Mbc for MbcEnum {
    fn read_rom(&self, rom: &[u8], addr: u16) -> u8 {
        match self {
            MbcEnum::Mbc0(m) => m.read_rom(rom, addr),
            MbcEnum::Mbc1(m) => m.read_rom(rom, addr),
        }
    }

    fn write_rom(&mut self, addr: u16, val: u8) {
        match self {
            MbcEnum::Mbc0(m) => m.write_rom(addr, val),
            MbcEnum::Mbc1(m) => m.write_rom(addr, val),
        }
    }

    fn read_ram(&self, ram: &[u8], addr: u16) -> u8 {
        match self {
            MbcEnum::Mbc0(m) => m.read_ram(ram, addr),
            MbcEnum::Mbc1(m) => m.read_ram(ram, addr),
        }
    }

    fn write_ram(&mut self, ram: &mut [u8], addr: u16, val: u8) {
        match self {
            MbcEnum::Mbc0(m) => m.write_ram(ram, addr, val),
            MbcEnum::Mbc1(m) => m.write_ram(ram, addr, val),
        }
    }
}
