//! Interrupt lines: request bits, service vectors, dispatch priority.

use serde::{Deserialize, Serialize};

/// The five DMG interrupt lines. The discriminant is the line's bit
/// position in IF and IE; service vectors sit 8 bytes apart from 0x0040.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Interrupt {
    VBlank = 0,
    LcdStat = 1,
    Timer = 2,
    Serial = 3,
    Joypad = 4,
}

/// Service order when several lines are raised in the same instant.
const PRIORITY: [Interrupt; 5] = [
    Interrupt::VBlank,
    Interrupt::LcdStat,
    Interrupt::Timer,
    Interrupt::Serial,
    Interrupt::Joypad,
];

impl Interrupt {
    #[inline]
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    #[inline]
    pub const fn vector(self) -> u16 {
        0x0040 + (self as u16) * 8
    }
}

/// Snapshot of the lines that are both requested and enabled
/// (`IF & IE`, low five bits).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Pending(u8);

impl Pending {
    #[inline]
    pub fn new(ie: u8, iflag: u8) -> Self {
        Pending(ie & iflag & 0x1F)
    }

    /// True when anything wants service; this is what ends HALT.
    #[inline]
    pub fn any(self) -> bool {
        self.0 != 0
    }

    /// The line the CPU must dispatch first, if any is raised.
    #[inline]
    pub fn highest(self) -> Option<Interrupt> {
        PRIORITY.into_iter().find(|line| self.0 & line.bit() != 0)
    }
}
