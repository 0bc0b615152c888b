use serde::{Deserialize, Serialize};

/// CPU operating mode, held in bits 4:0 of the CPSR.
///
/// The mode selects which physical bank backs R13/R14 (and R8-R12 for FIQ)
/// and whether an SPSR exists. Five of the modes are entered automatically
/// on an exception:
///
/// | Exception          | Mode       | Vector     |
/// |--------------------|------------|------------|
/// | Reset              | Supervisor | 0x00000000 |
/// | Undefined          | Undefined  | 0x00000004 |
/// | Software interrupt | Supervisor | 0x00000008 |
/// | Prefetch abort     | Abort      | 0x0000000C |
/// | Data abort         | Abort      | 0x00000010 |
/// | IRQ                | Irq        | 0x00000018 |
/// | FIQ                | Fiq        | 0x0000001C |
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Mode {
    /// Normal program execution, unprivileged.
    User = 0b10000,

    /// Fast interrupt handling. Banks R8-R14 so the handler has scratch
    /// registers for free. The GBA wires no FIQ source, but the mode is
    /// still reachable through MSR.
    Fiq = 0b10001,

    /// Interrupt handling: VBlank, HBlank, timers, DMA, keypad.
    Irq = 0b10010,

    /// Privileged mode for the BIOS; entered on reset and SWI.
    Supervisor = 0b10011,

    /// Entered after a data or prefetch abort.
    Abort = 0b10111,

    /// Entered when an instruction cannot be decoded.
    Undefined = 0b11011,

    /// Privileged, but shares the User register bank.
    System = 0b11111,
}

impl From<Mode> for u32 {
    fn from(m: Mode) -> Self {
        m as Self
    }
}

impl TryFrom<u32> for Mode {
    type Error = String;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n {
            0b10000 => Ok(Self::User),
            0b10001 => Ok(Self::Fiq),
            0b10010 => Ok(Self::Irq),
            0b10011 => Ok(Self::Supervisor),
            0b10111 => Ok(Self::Abort),
            0b11011 => Ok(Self::Undefined),
            0b11111 => Ok(Self::System),
            _ => Err(format!("invalid mode bits 0b{n:05b}")),
        }
    }
}
