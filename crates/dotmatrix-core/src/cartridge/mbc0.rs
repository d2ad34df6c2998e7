use serde::{Deserialize, Serialize};

use super::mbc::Mbc;

/// ROM-only cartridge: 32 KiB mapped flat, writes ignored. External RAM, if
/// the header declares any, is a single unbanked 8 KiB window.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Mbc0;

impl Mbc0 {
    pub fn new() -> Self {
        Mbc0
    }
}

impl Mbc for Mbc0 {
    fn read_rom(&self, rom: &[u8], addr: u16) -> u8 {
        rom.get(addr as usize).copied().unwrap_or(0xFF)
    }

    fn write_rom(&mut self, _addr: u16, _val: u8) {}

    fn read_ram(&self, ram: &[u8], addr: u16) -> u8 {
        let offset = addr.wrapping_sub(0xA000) as usize;
        ram.get(offset).copied().unwrap_or(0xFF)
    }

    fn write_ram(&mut self, ram: &mut [u8], addr: u16, val: u8) {
        let offset = addr.wrapping_sub(0xA000) as usize;
        if let Some(slot) = ram.get_mut(offset) {
            *slot = val;
        }
    }
}
