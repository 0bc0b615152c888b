use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cartridge_header::CartridgeHeader;

/// Save RAM size: 64 KiB, 8-bit bus.
pub const SRAM_SIZE: usize = 0x1_0000;

/// The battery-backed save RAM. Its on-disk format is the byte array
/// itself, so the wrapper serializes transparently.
#[derive(Clone, Serialize, Deserialize)]
pub struct SaveRam(pub Vec<u8>);

impl Default for SaveRam {
    fn default() -> Self {
        Self(vec![0; SRAM_SIZE])
    }
}

/// A Game Pak: the ROM behind the 0x08000000 window plus its save RAM.
pub struct Cartridge {
    rom: Vec<u8>,
    sram: SaveRam,
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl Cartridge {
    pub fn new(rom: Vec<u8>) -> Self {
        Self {
            rom,
            sram: SaveRam::default(),
        }
    }

    pub fn header(&self) -> Result<CartridgeHeader, String> {
        CartridgeHeader::try_from(self.rom.as_slice())
    }

    /// Reads the ROM at an offset local to the 32 MiB window. The three
    /// wait-state windows all fold to the same bytes.
    ///
    /// Reads past the end of the image hit the Game Pak bus with nothing
    /// driving the data lines, so the CPU sees the address itself: the ROM
    /// is halfword-addressed over a shared address/data bus and an empty
    /// fetch leaves the low 16 address bits on it.
    pub fn read_rom(&self, offset: usize) -> u8 {
        if offset < self.rom.len() {
            self.rom[offset]
        } else {
            (((offset >> 1) & 0xFFFF) as u16).get_byte((offset & 1) as u8)
        }
    }

    pub fn read_sram(&self, offset: usize) -> u8 {
        self.sram.0[offset % SRAM_SIZE]
    }

    pub fn write_sram(&mut self, offset: usize, value: u8) {
        self.sram.0[offset % SRAM_SIZE] = value;
    }

    /// The persisted form of the save RAM is exactly these bytes.
    pub fn sram(&self) -> &[u8] {
        &self.sram.0
    }

    /// Restores a previously saved RAM image. Short images load at the
    /// start; oversized ones are truncated.
    pub fn load_sram(&mut self, data: &[u8]) {
        let len = data.len().min(SRAM_SIZE);
        self.sram.0[..len].copy_from_slice(&data[..len]);
    }
}
