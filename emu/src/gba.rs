use crate::bus::Bus;
use crate::cartridge::Cartridge;
use crate::cartridge_header::CartridgeHeader;
use crate::cpu::arm7tdmi::Arm7tdmi;
use crate::memory::internal_memory::{InternalMemory, BIOS_SIZE};

/// The whole console: the CPU and, through the bus it owns, every memory
/// and peripheral. The driver calls [`step`](Self::step) in a loop and
/// presents a frame whenever [`take_frame_ready`](Self::take_frame_ready)
/// reports one.
pub struct Gba {
    pub cpu: Arm7tdmi,
}

impl Gba {
    pub fn new(bios: [u8; BIOS_SIZE], cartridge: Cartridge) -> Self {
        let bus = Bus::with_devices(InternalMemory::new(bios), cartridge);

        Self {
            cpu: Arm7tdmi::new(bus),
        }
    }

    /// Runs one instruction and advances the tick-driven collaborators by
    /// the cycles it consumed.
    pub fn step(&mut self) {
        let cycles = self.cpu.step();
        self.cpu.bus.tick(cycles);
    }

    pub fn take_frame_ready(&mut self) -> bool {
        self.cpu.bus.ppu.take_frame_ready()
    }

    pub fn cartridge_header(&self) -> Result<CartridgeHeader, String> {
        self.cpu.bus.cartridge.header()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cpu::arm7tdmi::tests::build_rom;
    use crate::cpu::cpu_modes::Mode;
    use crate::cpu::psr::CpuState;

    fn gba_with_rom(rom: Vec<u8>) -> Gba {
        let mut gba = Gba::new([0; BIOS_SIZE], Cartridge::new(rom));
        gba.cpu.registers.set_program_counter(0x0800_0000);
        gba
    }

    #[test]
    fn boots_into_supervisor_at_the_reset_vector() {
        let gba = Gba::new([0; BIOS_SIZE], Cartridge::default());

        assert_eq!(gba.cpu.cpsr.mode(), Mode::Supervisor);
        assert!(gba.cpu.cpsr.irq_disable());
        assert!(gba.cpu.cpsr.fiq_disable());
        assert_eq!(gba.cpu.cpsr.cpu_state(), CpuState::Arm);
        assert_eq!(gba.cpu.registers.program_counter(), 0x0000_0000);
    }

    #[test]
    fn executes_a_stream_from_the_cartridge() {
        // MOV R0, #0x12 then ADD R0, R0, #1, fetched through the ROM
        // window.
        let mut gba = gba_with_rom(build_rom(0, &[0xE3A0_0012, 0xE280_0001]));
        let flags_before = u32::from(gba.cpu.cpsr) >> 28;

        gba.step();
        assert_eq!(gba.cpu.register_at(0), 0x12);
        assert_eq!(gba.cpu.registers.program_counter(), 0x0800_0004);
        assert_eq!(u32::from(gba.cpu.cpsr) >> 28, flags_before);

        gba.step();
        assert_eq!(gba.cpu.register_at(0), 0x13);
        assert_eq!(gba.cpu.registers.program_counter(), 0x0800_0008);
    }

    #[test]
    fn a_busy_loop_eventually_produces_a_frame() {
        // B . : the classic idle loop.
        let mut gba = gba_with_rom(build_rom(0, &[0xEAFF_FFFE]));

        let mut steps = 0_u32;
        while !gba.take_frame_ready() {
            gba.step();
            steps += 1;
            assert!(steps < 100_000, "no frame after far too many steps");
        }

        assert_eq!(gba.cpu.registers.program_counter(), 0x0800_0000);
    }

    #[test]
    fn header_parsing_reaches_through_the_cartridge() {
        let mut rom = build_rom(0, &[0; 48]);
        rom[0xA0..0xA4].copy_from_slice(b"TEST");
        rom[0xB2] = 0x96;

        let gba = gba_with_rom(rom);
        let header = gba.cartridge_header().unwrap();

        assert_eq!(header.game_title, "TEST");
        assert_eq!(header.fixed_value, 0x96);
    }
}
