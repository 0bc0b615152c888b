use crate::bitwise::Bits;
use crate::memory::io_registers::{IoRegisters, IRQ_VBLANK};

/// A dot takes four CPU cycles.
const CYCLES_PER_DOT: u32 = 4;
const DOTS_PER_SCANLINE: u32 = 308;
const CYCLES_PER_SCANLINE: u32 = DOTS_PER_SCANLINE * CYCLES_PER_DOT;
const VISIBLE_DOTS: u32 = 240;
const VISIBLE_LINES: u16 = 160;
const LINES_PER_FRAME: u16 = 228;

/// Cycles in a whole frame: 280896.
pub const CYCLES_PER_FRAME: u32 = CYCLES_PER_SCANLINE * LINES_PER_FRAME as u32;

const DISPSTAT_VBLANK_FLAG: u8 = 0;
const DISPSTAT_HBLANK_FLAG: u8 = 1;
const DISPSTAT_VBLANK_IRQ_ENABLE: u8 = 3;

/// The scanline side of the picture processing unit.
///
/// Rendering lives elsewhere; what the core needs from the PPU is its
/// timing: VCOUNT advancing through 228 lines, the vblank/hblank DISPSTAT
/// bits, the vblank interrupt request and a frame-ready pulse for the
/// driver. Ticked by the bus with the cycles each CPU step consumed.
#[derive(Default)]
pub struct Ppu {
    scanline_cycles: u32,
    vcount: u16,
    frame_ready: bool,
}

impl Ppu {
    pub fn tick(&mut self, cycles: u32, io: &mut IoRegisters) {
        self.scanline_cycles += cycles;

        while self.scanline_cycles >= CYCLES_PER_SCANLINE {
            self.scanline_cycles -= CYCLES_PER_SCANLINE;
            self.vcount = (self.vcount + 1) % LINES_PER_FRAME;
            io.set_vcount(self.vcount);

            if self.vcount == VISIBLE_LINES {
                self.frame_ready = true;
                io.set_dispstat_flag(DISPSTAT_VBLANK_FLAG, true);
                if io.dispstat().get_bit(DISPSTAT_VBLANK_IRQ_ENABLE) {
                    io.request_interrupt(IRQ_VBLANK);
                }
            } else if self.vcount == 0 {
                io.set_dispstat_flag(DISPSTAT_VBLANK_FLAG, false);
            }
        }

        io.set_dispstat_flag(
            DISPSTAT_HBLANK_FLAG,
            self.scanline_cycles >= VISIBLE_DOTS * CYCLES_PER_DOT,
        );
    }

    pub fn vcount(&self) -> u16 {
        self.vcount
    }

    /// True once per frame, at the start of vblank. Reading clears it.
    pub fn take_frame_ready(&mut self) -> bool {
        std::mem::take(&mut self.frame_ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::io_device::IoDevice;
    use crate::memory::io_registers::{DISPSTAT, IE, IME};
    use pretty_assertions::assert_eq;

    #[test]
    fn one_frame_of_cycles_wraps_vcount() {
        let mut ppu = Ppu::default();
        let mut io = IoRegisters::default();

        ppu.tick(CYCLES_PER_FRAME, &mut io);

        assert_eq!(ppu.vcount(), 0);
        assert!(ppu.take_frame_ready());
        assert!(!ppu.take_frame_ready());
    }

    #[test]
    fn vcount_advances_per_scanline() {
        let mut ppu = Ppu::default();
        let mut io = IoRegisters::default();

        ppu.tick(CYCLES_PER_SCANLINE * 3, &mut io);

        assert_eq!(ppu.vcount(), 3);
        assert_eq!(io.vcount(), 3);
        assert!(!ppu.take_frame_ready());
    }

    #[test]
    fn vblank_flag_spans_the_invisible_lines() {
        let mut ppu = Ppu::default();
        let mut io = IoRegisters::default();

        ppu.tick(CYCLES_PER_SCANLINE * u32::from(VISIBLE_LINES), &mut io);
        assert!(io.dispstat().get_bit(0));
        assert!(ppu.take_frame_ready());

        ppu.tick(
            CYCLES_PER_SCANLINE * u32::from(LINES_PER_FRAME - VISIBLE_LINES),
            &mut io,
        );
        assert!(!io.dispstat().get_bit(0));
    }

    #[test]
    fn vblank_interrupt_fires_only_when_enabled() {
        let mut ppu = Ppu::default();
        let mut io = IoRegisters::default();
        io.write_at(IE, 0b1);
        io.write_at(IME, 1);

        ppu.tick(CYCLES_PER_FRAME, &mut io);
        assert!(!io.irq_pending());

        io.write_at(DISPSTAT, 1 << 3);
        ppu.tick(CYCLES_PER_FRAME, &mut io);
        assert!(io.irq_pending());
    }
}
