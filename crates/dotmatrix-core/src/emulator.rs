use serde::{Deserialize, Serialize};

use crate::bus::Bus;
use crate::cartridge::Cartridge;
use crate::cpu::{Cpu, StepError};
use crate::ppu::{Ppu, DOTS_PER_LINE, LINES_PER_FRAME, OAM_SCAN_DOTS, VBLANK_START_LINE};

/// Top-level frame runner: owns all three subsystems and advances the PPU
/// and CPU in lock-step, one scanline at a time. The PPU hands out dot
/// budgets; the CPU repays them at 4 dots per M-cycle, with instruction
/// overshoot carried into the next budget.
#[derive(Serialize, Deserialize)]
pub struct Emulator {
    pub cpu: Cpu,
    pub ppu: Ppu,
    pub bus: Bus,
    /// Dots the CPU still owes (positive) or has prepaid (negative).
    dot_debt: i32,
    frame_count: u64,
}

impl Emulator {
    /// Start from the post-boot state, overlay disabled: registers as the
    /// boot ROM leaves them, LCD running, default background palette.
    pub fn new(cart: Cartridge) -> Self {
        let mut bus = Bus::new(cart);
        bus.set_io_reg(0x40, 0x91); // LCDC
        bus.set_io_reg(0x47, 0xFC); // BGP
        Self {
            cpu: Cpu::post_boot(),
            ppu: Ppu::new(),
            bus,
            dot_debt: 0,
            frame_count: 0,
        }
    }

    /// Start cold with the 256-byte boot ROM overlaying the cartridge.
    pub fn with_boot_rom(cart: Cartridge, boot: Vec<u8>) -> Self {
        Self {
            cpu: Cpu::new(),
            ppu: Ppu::new(),
            bus: Bus::with_boot_rom(cart, boot),
            dot_debt: 0,
            frame_count: 0,
        }
    }

    pub fn framebuffer(&self) -> &[u8] {
        self.ppu.framebuffer()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Execute one CPU instruction (without advancing the PPU). Exposed for
    /// hosts and tests that drive time manually.
    pub fn step(&mut self) -> Result<u32, StepError> {
        self.cpu.step(&mut self.bus)
    }

    /// Run one full 154-line frame (70224 dots of emulated time).
    pub fn run_frame(&mut self) -> Result<(), StepError> {
        self.ppu.clear_frame_ready();
        for _ in 0..LINES_PER_FRAME {
            self.run_scanline()?;
        }
        self.frame_count += 1;
        Ok(())
    }

    /// Advance exactly one scanline worth of machine time.
    pub fn run_scanline(&mut self) -> Result<(), StepError> {
        if !self.ppu.lcd_enabled(&self.bus) {
            // Panel off: no modes, no interrupts, but time still passes.
            self.ppu.lcd_off(&mut self.bus);
            self.run_cpu(DOTS_PER_LINE)?;
            return Ok(());
        }

        self.ppu.begin_line(&mut self.bus);

        if self.ppu.line() < VBLANK_START_LINE {
            self.ppu.enter_oam_scan(&mut self.bus);
            self.run_cpu(OAM_SCAN_DOTS)?;

            self.ppu.enter_drawing(&mut self.bus);
            let draw_dots = self.ppu.render_line(&mut self.bus);
            self.run_cpu(draw_dots)?;

            self.ppu.enter_hblank(&mut self.bus);
            self.run_cpu(DOTS_PER_LINE - OAM_SCAN_DOTS - draw_dots)?;
        } else {
            self.ppu.enter_vblank_line(&mut self.bus);
            self.run_cpu(DOTS_PER_LINE)?;
        }

        self.ppu.advance_line(&mut self.bus);
        Ok(())
    }

    /// Pull CPU instructions until `dots` of machine time are covered.
    fn run_cpu(&mut self, dots: u32) -> Result<(), StepError> {
        self.dot_debt += dots as i32;
        while self.dot_debt > 0 {
            let mcycles = self.cpu.step(&mut self.bus)?;
            self.dot_debt -= (mcycles * 4) as i32;
        }
        Ok(())
    }
}
