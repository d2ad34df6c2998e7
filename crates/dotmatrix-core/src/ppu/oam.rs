//! Sprite attributes and the per-scanline OAM scan.

use serde::{Deserialize, Serialize};

use crate::bus::Bus;

pub const OAM_SPRITES: usize = 40;
pub const MAX_LINE_SPRITES: usize = 10;

const OAM_BASE: u16 = 0xFE00;

/// One OAM entry, with Y/X already translated to screen coordinates
/// (the stored values carry +16 / +8 offsets).
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Sprite {
    pub oam_index: u8,
    pub y: i16,
    pub x: i16,
    pub tile: u8,
    pub attrs: u8,
}

impl Sprite {
    pub fn from_oam(bus: &Bus, index: u8) -> Self {
        let base = OAM_BASE + (index as u16) * 4;
        Sprite {
            oam_index: index,
            y: bus.ppu_read(base) as i16 - 16,
            x: bus.ppu_read(base + 1) as i16 - 8,
            tile: bus.ppu_read(base + 2),
            attrs: bus.ppu_read(base + 3),
        }
    }

    pub fn behind_bg(&self) -> bool {
        (self.attrs & 0x80) != 0
    }

    pub fn y_flip(&self) -> bool {
        (self.attrs & 0x40) != 0
    }

    pub fn x_flip(&self) -> bool {
        (self.attrs & 0x20) != 0
    }

    pub fn use_obp1(&self) -> bool {
        (self.attrs & 0x10) != 0
    }
}

/// Mode-2 scan: walk OAM in order, keep the first ten sprites whose Y span
/// covers `ly`, then order them for drawing: lower X first, OAM index
/// breaking ties.
pub fn select_line_sprites(bus: &Bus, ly: u8, tall: bool) -> Vec<Sprite> {
    let height = if tall { 16 } else { 8 };
    let ly = ly as i16;

    let mut selected = Vec::with_capacity(MAX_LINE_SPRITES);
    for index in 0..OAM_SPRITES as u8 {
        let sprite = Sprite::from_oam(bus, index);
        if ly >= sprite.y && ly < sprite.y + height {
            selected.push(sprite);
            if selected.len() == MAX_LINE_SPRITES {
                break;
            }
        }
    }

    selected.sort_by_key(|s| (s.x, s.oam_index));
    selected
}
