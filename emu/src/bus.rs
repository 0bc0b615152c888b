use logger::log;

use crate::bitwise::Bits;
use crate::cartridge::Cartridge;
use crate::memory::internal_memory::{InternalMemory, OPEN_BUS_VALUE};
use crate::memory::io_device::IoDevice;
use crate::memory::io_registers::IoRegisters;
use crate::ppu::Ppu;

/// The system bus: routes every CPU access to its backing store and ticks
/// the time-driven collaborators.
///
/// | window                  | target                        |
/// |-------------------------|-------------------------------|
/// | 0x00000000-0x00003FFF   | boot ROM (read-only)          |
/// | 0x02000000-0x02FFFFFF   | on-board work RAM, mirrored   |
/// | 0x03000000-0x03FFFFFF   | on-chip work RAM, mirrored    |
/// | 0x04000000-0x04FFFFFF   | I/O register file, mirrored   |
/// | 0x05000000-0x07FFFFFF   | palette / VRAM / OAM          |
/// | 0x08000000-0x0DFFFFFF   | cartridge ROM, three aliases  |
/// | 0x0E000000-0x0E00FFFF   | cartridge save RAM            |
///
/// Anything else is open bus: reads see 0xFF, writes vanish. Collaborators
/// are plain owned fields; the region set is fixed, so there is nothing to
/// dispatch dynamically.
#[derive(Default)]
pub struct Bus {
    pub internal_memory: InternalMemory,
    pub io_registers: IoRegisters,
    pub ppu: Ppu,
    pub cartridge: Cartridge,
    cycles_count: u64,
}

const IO_FILE_SIZE: usize = 0x400;

impl Bus {
    pub fn with_devices(internal_memory: InternalMemory, cartridge: Cartridge) -> Self {
        Self {
            internal_memory,
            cartridge,
            ..Default::default()
        }
    }

    /// Advances the tick-driven collaborators by the cycles one CPU step
    /// consumed.
    pub fn tick(&mut self, cycles: u32) {
        self.cycles_count += u64::from(cycles);
        self.ppu.tick(cycles, &mut self.io_registers);
    }

    /// The interrupt line the CPU samples between instructions.
    pub fn irq_line(&self) -> bool {
        self.io_registers.irq_pending()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles_count
    }

    pub fn read_word(&self, address: usize) -> u32 {
        if address & 3 != 0 {
            log(format!("read_word on unaligned address {address:#010X}"));
        }

        let part_0 = u32::from(self.read_at(address));
        let part_1 = u32::from(self.read_at(address + 1));
        let part_2 = u32::from(self.read_at(address + 2));
        let part_3 = u32::from(self.read_at(address + 3));

        part_3 << 24 | part_2 << 16 | part_1 << 8 | part_0
    }

    pub fn write_word(&mut self, address: usize, value: u32) {
        if address & 3 != 0 {
            log(format!("write_word on unaligned address {address:#010X}"));
        }

        self.write_at(address, value.get_byte(0));
        self.write_at(address + 1, value.get_byte(1));
        self.write_at(address + 2, value.get_byte(2));
        self.write_at(address + 3, value.get_byte(3));
    }

    pub fn read_half_word(&self, address: usize) -> u16 {
        if address & 1 != 0 {
            log(format!("read_half_word on unaligned address {address:#010X}"));
        }

        let part_0 = u16::from(self.read_at(address));
        let part_1 = u16::from(self.read_at(address + 1));

        part_1 << 8 | part_0
    }

    pub fn write_half_word(&mut self, address: usize, value: u16) {
        if address & 1 != 0 {
            log(format!("write_half_word on unaligned address {address:#010X}"));
        }

        self.write_at(address, value.get_byte(0));
        self.write_at(address + 1, value.get_byte(1));
    }
}

impl IoDevice for Bus {
    type Address = usize;
    type Value = u8;

    fn read_at(&self, address: Self::Address) -> Self::Value {
        match address {
            // The I/O file repeats through its 24-bit window.
            0x0400_0000..=0x04FF_FFFF => self.io_registers.read_at(address % IO_FILE_SIZE),
            // The three cartridge windows differ only in wait states.
            0x0800_0000..=0x0DFF_FFFF => self.cartridge.read_rom(address & 0x01FF_FFFF),
            0x0E00_0000..=0x0E00_FFFF => self.cartridge.read_sram(address - 0x0E00_0000),
            0x0E01_0000..=0x0FFF_FFFF => {
                log(format!("read on unmapped memory {address:#010X}"));
                OPEN_BUS_VALUE
            }
            _ => self.internal_memory.read_at(address),
        }
    }

    fn write_at(&mut self, address: Self::Address, value: Self::Value) {
        match address {
            0x0400_0000..=0x04FF_FFFF => {
                self.io_registers.write_at(address % IO_FILE_SIZE, value);
            }
            0x0800_0000..=0x0DFF_FFFF => {
                log(format!("dropped write to read-only ROM {address:#010X}"));
            }
            0x0E00_0000..=0x0E00_FFFF => self.cartridge.write_sram(address - 0x0E00_0000, value),
            0x0E01_0000..=0x0FFF_FFFF => {
                log(format!("dropped write to unmapped memory {address:#010X}"));
            }
            _ => self.internal_memory.write_at(address, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn words_are_little_endian() {
        let mut bus = Bus::default();

        bus.write_word(0x0300_0000, 0x1234_5678);

        assert_eq!(bus.read_at(0x0300_0000), 0x78);
        assert_eq!(bus.read_at(0x0300_0001), 0x56);
        assert_eq!(bus.read_at(0x0300_0002), 0x34);
        assert_eq!(bus.read_at(0x0300_0003), 0x12);
        assert_eq!(bus.read_word(0x0300_0000), 0x1234_5678);
    }

    #[test]
    fn half_words_are_little_endian() {
        let mut bus = Bus::default();

        bus.write_half_word(0x0200_0010, 0xBEEF);

        assert_eq!(bus.read_at(0x0200_0010), 0xEF);
        assert_eq!(bus.read_at(0x0200_0011), 0xBE);
        assert_eq!(bus.read_half_word(0x0200_0010), 0xBEEF);
    }

    #[test]
    fn word_reads_compose_from_bytes() {
        let mut bus = Bus::default();

        for (i, byte) in [0x11, 0x22, 0x33, 0x44].into_iter().enumerate() {
            bus.write_at(0x0300_0020 + i, byte);
        }

        assert_eq!(
            bus.read_word(0x0300_0020),
            u32::from(bus.read_at(0x0300_0020))
                | u32::from(bus.read_at(0x0300_0021)) << 8
                | u32::from(bus.read_at(0x0300_0022)) << 16
                | u32::from(bus.read_at(0x0300_0023)) << 24
        );
    }

    #[test]
    fn rom_window_aliases_fold_to_the_same_bytes() {
        let bus = Bus::with_devices(
            InternalMemory::default(),
            Cartridge::new(vec![0xAA, 0xBB, 0xCC, 0xDD]),
        );

        assert_eq!(bus.read_at(0x0800_0002), 0xCC);
        assert_eq!(bus.read_at(0x0A00_0002), 0xCC);
        assert_eq!(bus.read_at(0x0C00_0002), 0xCC);
    }

    #[test]
    fn rom_writes_are_dropped() {
        let mut bus = Bus::with_devices(
            InternalMemory::default(),
            Cartridge::new(vec![0xAA, 0xBB, 0xCC, 0xDD]),
        );

        bus.write_at(0x0800_0002, 0x00);

        assert_eq!(bus.read_at(0x0800_0002), 0xCC);
    }

    #[test]
    fn sram_is_reachable_and_writable() {
        let mut bus = Bus::default();

        bus.write_at(0x0E00_1234, 0x5A);

        assert_eq!(bus.read_at(0x0E00_1234), 0x5A);
        assert_eq!(bus.cartridge.read_sram(0x1234), 0x5A);
    }

    #[test]
    fn io_file_mirrors_through_its_window() {
        let mut bus = Bus::default();

        bus.write_at(0x0400_0000, 0x42);

        assert_eq!(bus.read_at(0x0400_0400), 0x42);
        assert_eq!(bus.read_at(0x04FF_FC00), 0x42);
    }

    #[test]
    fn open_bus_reads_placeholder() {
        let bus = Bus::default();

        assert_eq!(bus.read_at(0x0100_0000), OPEN_BUS_VALUE);
        assert_eq!(bus.read_at(0x0E01_0000), OPEN_BUS_VALUE);
        assert_eq!(bus.read_at(0xF000_0000), OPEN_BUS_VALUE);
    }

    #[test]
    fn ticking_accumulates_cycles() {
        let mut bus = Bus::default();

        bus.tick(4);
        bus.tick(4);

        assert_eq!(bus.cycles(), 8);
    }
}
