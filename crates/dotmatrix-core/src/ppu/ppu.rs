use serde::{Deserialize, Serialize};

use crate::bus::Bus;
use crate::interrupt::Interrupt;

use super::fetcher::{fetch_map_row, BgFifo, ObjFifo, ObjPixel};
use super::oam::{select_line_sprites, Sprite};
use super::{FRAMEBUFFER_LEN, LCD_WIDTH, LINES_PER_FRAME, VBLANK_START_LINE};

// IO register indices (low address byte).
const LCDC: usize = 0x40;
const STAT: usize = 0x41;
const SCY: usize = 0x42;
const SCX: usize = 0x43;
const LY: usize = 0x44;
const LYC: usize = 0x45;
const BGP: usize = 0x47;
const OBP0: usize = 0x48;
const OBP1: usize = 0x49;
const WY: usize = 0x4A;
const WX: usize = 0x4B;

// STAT interrupt source selects.
const STAT_SRC_HBLANK: u8 = 0x08;
const STAT_SRC_VBLANK: u8 = 0x10;
const STAT_SRC_OAM: u8 = 0x20;
const STAT_SRC_LYC: u8 = 0x40;

/// Mode 3 opens with a 12-dot fetcher warm-up on top of the 172-dot minimum.
const DRAW_BASE_DOTS: u32 = 172 + 12;
/// Each sprite reaching the mixer stalls the fetcher roughly this long.
const SPRITE_FETCH_DOTS: u32 = 6;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    Drawing = 3,
}

impl Mode {
    fn bits(self) -> u8 {
        self as u8
    }
}

/// Scanline-at-a-time PPU. The FrameRunner drives the mode transitions and
/// interleaves CPU execution; this type owns the pixel pipeline, the STAT/LY
/// register view, and the accessibility latches on the bus.
#[derive(Serialize, Deserialize)]
pub struct Ppu {
    #[serde(with = "serde_bytes")]
    framebuffer: Vec<u8>,
    frame_ready: bool,
    ly: u8,
    mode: Mode,
    prev_coincidence: bool,
    /// Lines the window has actually rendered this frame; the window fetcher
    /// resumes from here rather than from LY.
    window_line: u8,
    /// Sprites picked during the mode-2 scan, in draw-priority order.
    line_sprites: Vec<Sprite>,
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            framebuffer: vec![0; FRAMEBUFFER_LEN],
            frame_ready: false,
            ly: 0,
            mode: Mode::HBlank,
            prev_coincidence: false,
            window_line: 0,
            line_sprites: Vec::new(),
        }
    }

    /// 2-bit shades, row-major, 160x144.
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    pub fn line(&self) -> u8 {
        self.ly
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    pub fn clear_frame_ready(&mut self) {
        self.frame_ready = false;
    }

    pub fn lcd_enabled(&self, bus: &Bus) -> bool {
        (bus.io_reg(LCDC) & 0x80) != 0
    }

    /// LCD off: LY and the mode machine reset, both memories open to the
    /// CPU, and the panel blanks to shade 0.
    pub fn lcd_off(&mut self, bus: &mut Bus) {
        self.ly = 0;
        self.mode = Mode::HBlank;
        self.prev_coincidence = false;
        self.window_line = 0;
        self.frame_ready = false;
        self.framebuffer.fill(0);
        bus.vram_accessible = true;
        bus.oam_accessible = true;
        self.sync_registers(bus);
    }

    /// Publish LY for the new scanline and run the LYC comparison edge.
    pub fn begin_line(&mut self, bus: &mut Bus) {
        self.sync_registers(bus);
    }

    /// Mode 2: pick this line's sprites; OAM closes to the CPU.
    pub fn enter_oam_scan(&mut self, bus: &mut Bus) {
        let tall = (bus.io_reg(LCDC) & 0x04) != 0;
        self.line_sprites = select_line_sprites(bus, self.ly, tall);
        bus.oam_accessible = false;
        self.set_mode(bus, Mode::OamScan);
    }

    /// Mode 3: VRAM closes as well. No STAT source exists for this mode.
    pub fn enter_drawing(&mut self, bus: &mut Bus) {
        bus.vram_accessible = false;
        self.set_mode(bus, Mode::Drawing);
    }

    /// Mode 0: both memories reopen for the rest of the line.
    pub fn enter_hblank(&mut self, bus: &mut Bus) {
        bus.vram_accessible = true;
        bus.oam_accessible = true;
        self.set_mode(bus, Mode::HBlank);
    }

    /// Mode 1 line. Entering the first one (LY=144) raises the VBlank
    /// interrupt and publishes the finished frame.
    pub fn enter_vblank_line(&mut self, bus: &mut Bus) {
        if self.ly == VBLANK_START_LINE {
            bus.request_interrupt(Interrupt::VBlank);
            self.frame_ready = true;
        }
        self.set_mode(bus, Mode::VBlank);
    }

    /// Advance to the next scanline, wrapping into a new frame after 154.
    pub fn advance_line(&mut self, bus: &mut Bus) {
        self.ly += 1;
        if self.ly >= LINES_PER_FRAME {
            self.ly = 0;
            self.window_line = 0;
        }
        self.sync_registers(bus);
    }

    fn set_mode(&mut self, bus: &mut Bus, mode: Mode) {
        if mode == self.mode {
            self.publish_stat(bus);
            return;
        }
        self.mode = mode;

        let sources = bus.io_reg(STAT);
        let fired = match mode {
            Mode::HBlank => (sources & STAT_SRC_HBLANK) != 0,
            Mode::VBlank => (sources & STAT_SRC_VBLANK) != 0,
            Mode::OamScan => (sources & STAT_SRC_OAM) != 0,
            Mode::Drawing => false,
        };
        if fired {
            bus.request_interrupt(Interrupt::LcdStat);
        }

        self.publish_stat(bus);
    }

    fn sync_registers(&mut self, bus: &mut Bus) {
        bus.set_io_reg(LY, self.ly);

        let coincidence = self.ly == bus.io_reg(LYC);
        if coincidence && !self.prev_coincidence && (bus.io_reg(STAT) & STAT_SRC_LYC) != 0 {
            bus.request_interrupt(Interrupt::LcdStat);
        }
        self.prev_coincidence = coincidence;

        self.publish_stat(bus);
    }

    fn publish_stat(&self, bus: &mut Bus) {
        let mut stat = bus.io_reg(STAT) & 0x78; // keep the source selects
        stat |= self.mode.bits();
        if self.ly == bus.io_reg(LYC) {
            stat |= 0x04;
        }
        bus.set_io_reg(STAT, stat);
    }

    /// Render the 160 pixels of the current line through the fetcher and the
    /// two FIFOs, and return how many dots mode 3 takes: the 172+12 base,
    /// the SCX%8 fine-scroll stall, and a fetch stall per sprite drawn.
    pub fn render_line(&mut self, bus: &mut Bus) -> u32 {
        let lcdc = bus.io_reg(LCDC);
        let scx = bus.io_reg(SCX);
        let scy = bus.io_reg(SCY);
        let bgp = bus.io_reg(BGP);
        let obp0 = bus.io_reg(OBP0);
        let obp1 = bus.io_reg(OBP1);

        let bg_enabled = (lcdc & 0x01) != 0;
        let obj_enabled = (lcdc & 0x02) != 0;
        let tall_sprites = (lcdc & 0x04) != 0;
        let bg_map: u16 = if (lcdc & 0x08) != 0 { 0x9C00 } else { 0x9800 };
        let window_enabled = bg_enabled && (lcdc & 0x20) != 0;
        let win_map: u16 = if (lcdc & 0x40) != 0 { 0x9C00 } else { 0x9800 };

        let wy = bus.io_reg(WY);
        let win_start = bus.io_reg(WX) as i16 - 7;
        let window_reachable = window_enabled && self.ly >= wy && win_start < LCD_WIDTH as i16;

        let bg_y = (scy.wrapping_add(self.ly)) as u16;

        let mut bg_fifo = BgFifo::default();
        let mut obj_fifo = ObjFifo::default();

        // Coarse fetch column; starts mid-map for the background, restarts
        // at zero when the window takes over.
        let mut fetch_x = (scx / 8) as u16;
        let mut in_window = false;

        // Fine scroll: prime the first tile and drop the leading remainder
        // so pixel 0 starts inside it.
        let fine_scroll = (scx % 8) as u32;
        bg_fifo.push_row(fetch_map_row(bus, lcdc, bg_map, fetch_x, bg_y));
        fetch_x += 1;
        for _ in 0..fine_scroll {
            bg_fifo.pop();
        }

        let mut dots = DRAW_BASE_DOTS + fine_scroll;
        let mut next_sprite = 0;
        let row_base = self.ly as usize * LCD_WIDTH;

        for x in 0..LCD_WIDTH as i16 {
            if window_reachable && !in_window && x >= win_start {
                in_window = true;
                fetch_x = 0;
                bg_fifo.clear();
                // WX below 7 clips the window's leading columns off-screen.
                if win_start < 0 {
                    let row = fetch_map_row(bus, lcdc, win_map, fetch_x, self.window_line as u16);
                    bg_fifo.push_row(row);
                    fetch_x += 1;
                    for _ in 0..(-win_start) {
                        bg_fifo.pop();
                    }
                }
            }

            if bg_fifo.is_empty() {
                let row = if in_window {
                    fetch_map_row(bus, lcdc, win_map, fetch_x, self.window_line as u16)
                } else {
                    fetch_map_row(bus, lcdc, bg_map, fetch_x, bg_y)
                };
                bg_fifo.push_row(row);
                fetch_x += 1;
            }

            if obj_enabled {
                while let Some(sprite) = self.line_sprites.get(next_sprite) {
                    if sprite.x > x {
                        break;
                    }
                    let row = sprite_row(bus, sprite, self.ly, tall_sprites);
                    obj_fifo.merge(&row, (x - sprite.x) as usize);
                    next_sprite += 1;
                    dots += SPRITE_FETCH_DOTS;
                }
            }

            let bg_color = if bg_enabled { bg_fifo.pop() } else { 0 };
            let mut shade = (bgp >> (bg_color * 2)) & 0x03;

            if let Some(obj) = obj_fifo.pop() {
                let visible = obj_enabled && obj.color != 0 && !(obj.behind_bg && bg_color != 0);
                if visible {
                    let pal = if obj.use_obp1 { obp1 } else { obp0 };
                    shade = (pal >> (obj.color * 2)) & 0x03;
                }
            }

            self.framebuffer[row_base + x as usize] = shade;
        }

        if in_window {
            self.window_line += 1;
        }

        dots
    }
}

/// Decode the eight object pixels of `sprite` on scanline `ly`, honoring
/// flips and the 8x16 tile-pair rule.
fn sprite_row(bus: &Bus, sprite: &Sprite, ly: u8, tall: bool) -> [ObjPixel; 8] {
    let height: i16 = if tall { 16 } else { 8 };
    let mut row = ly as i16 - sprite.y;
    if sprite.y_flip() {
        row = height - 1 - row;
    }

    let mut tile = sprite.tile;
    if tall {
        tile &= 0xFE;
        if row >= 8 {
            tile += 1;
            row -= 8;
        }
    }

    // Objects always use the 0x8000 block, unsigned.
    let addr = 0x8000 + (tile as u16) * 16 + (row as u16) * 2;
    let lo = bus.ppu_read(addr);
    let hi = bus.ppu_read(addr + 1);

    let mut pixels = [ObjPixel::default(); 8];
    for (i, px) in pixels.iter_mut().enumerate() {
        let bit = if sprite.x_flip() { i } else { 7 - i };
        px.color = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
        px.use_obp1 = sprite.use_obp1();
        px.behind_bg = sprite.behind_bg();
    }
    pixels
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}
