//! Passive display collaborator.
//!
//! The CPU never calls into the display. Games program it through ordinary
//! stores to the I/O page; this side reads those registers back out of memory
//! and owns a framebuffer for a host window to present.

use crate::memory::Memory;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

// Register offsets within the I/O page (0xFF00 + offset)
pub const LCDC: u8 = 0x40;
pub const STAT: u8 = 0x41;
pub const SCY: u8 = 0x42;
pub const SCX: u8 = 0x43;
pub const LY: u8 = 0x44;
pub const LYC: u8 = 0x45;

/// Classic green palette (0RGB), lightest first.
pub const PALETTE: [u32; 4] = [0x9BBC0F, 0x8BAC0F, 0x306230, 0x0F380F];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayRegisters {
    pub lcdc: u8,
    pub stat: u8,
    pub scy: u8,
    pub scx: u8,
    pub ly: u8,
    pub lyc: u8,
}

impl DisplayRegisters {
    pub fn read(memory: &Memory) -> Self {
        DisplayRegisters {
            lcdc: memory.read_io(LCDC),
            stat: memory.read_io(STAT),
            scy: memory.read_io(SCY),
            scx: memory.read_io(SCX),
            ly: memory.read_io(LY),
            lyc: memory.read_io(LYC),
        }
    }

    pub fn lcd_enabled(&self) -> bool {
        self.lcdc & 0x80 != 0
    }
}

pub struct Display {
    pub framebuffer: Vec<u32>,
    pub registers: DisplayRegisters,
}

impl Display {
    pub fn new() -> Self {
        Display {
            framebuffer: vec![PALETTE[0]; SCREEN_WIDTH * SCREEN_HEIGHT],
            registers: DisplayRegisters::default(),
        }
    }

    /// Pick up the register values the CPU last stored. A disabled LCD blanks the screen.
    pub fn sync(&mut self, memory: &Memory) {
        self.registers = DisplayRegisters::read(memory);
        if !self.registers.lcd_enabled() {
            self.framebuffer.fill(PALETTE[0]);
        }
    }

    /// One-line status for a window title.
    pub fn status(&self) -> String {
        let r = &self.registers;
        format!(
            "LCDC={:02X} STAT={:02X} SCY={:02X} SCX={:02X} LY={:02X} LYC={:02X}",
            r.lcdc, r.stat, r.scy, r.scx, r.ly, r.lyc
        )
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_come_from_the_io_page() {
        let mut mem = Memory::new();
        mem.write_byte(0xFF40, 0x91);
        mem.write_byte(0xFF42, 0x10);
        mem.write_byte(0xFF43, 0x20);
        mem.write_byte(0xFF45, 0x90);
        let mut display = Display::new();
        display.sync(&mem);
        assert_eq!(display.registers.lcdc, 0x91);
        assert_eq!(display.registers.scy, 0x10);
        assert_eq!(display.registers.scx, 0x20);
        assert_eq!(display.registers.lyc, 0x90);
        assert!(display.registers.lcd_enabled());
        assert!(display.status().starts_with("LCDC=91"));
    }

    #[test]
    fn disabled_lcd_blanks_framebuffer() {
        let mem = Memory::new();
        let mut display = Display::new();
        display.framebuffer[0] = PALETTE[3];
        display.sync(&mem);
        assert!(display.framebuffer.iter().all(|&p| p == PALETTE[0]));
        assert_eq!(display.framebuffer.len(), SCREEN_WIDTH * SCREEN_HEIGHT);
    }
}
