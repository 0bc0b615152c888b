//! The banked register file.
//!
//! Sixteen registers are visible at any time, but several logical numbers
//! map to different physical storage depending on the operating mode:
//!
//! ```text
//! Register │ User/Sys │  FIQ   │  IRQ   │  SVC   │ Abort  │ Undef  │
//! ─────────┼──────────┼────────┼────────┼────────┼────────┼────────┤
//!   R0-R7  │              shared by every mode                     │
//!   R8-R12 │   R8-R12 │ _fiq   │      shared with User/Sys         │
//!   R13/SP │   _usr   │ _fiq   │ _irq   │ _svc   │ _abt   │ _und   │
//!   R14/LR │   _usr   │ _fiq   │ _irq   │ _svc   │ _abt   │ _und   │
//!   R15/PC │                  never banked                         │
//!   SPSR   │   none   │ _fiq   │ _irq   │ _svc   │ _abt   │ _und   │
//! ```
//!
//! Every bank is a plain field and selection happens at access time, keyed
//! by `(register number, mode)`. Changing mode therefore never moves any
//! value around; it only changes which field the next access lands on.

use serde::{Deserialize, Serialize};

use crate::cpu::cpu_modes::Mode;
use crate::cpu::psr::Psr;

/// Stack pointer register index.
pub const REG_SP: usize = 0xD;

/// Link register index.
pub const REG_LR: usize = 0xE;

/// Program counter register index.
pub const REG_PROGRAM_COUNTER: u32 = 0xF;

/// All physical registers of the ARM7TDMI: 31 general-purpose slots and
/// the five saved status registers. The CPSR lives in the CPU itself.
#[derive(Default, Serialize, Deserialize)]
pub struct Registers {
    /// R0-R12 for every mode except FIQ's R8-R12.
    r: [u32; 13],

    r8_fiq: u32,
    r9_fiq: u32,
    r10_fiq: u32,
    r11_fiq: u32,
    r12_fiq: u32,

    r13_usr: u32,
    r14_usr: u32,
    r13_fiq: u32,
    r14_fiq: u32,
    r13_svc: u32,
    r14_svc: u32,
    r13_abt: u32,
    r14_abt: u32,
    r13_irq: u32,
    r14_irq: u32,
    r13_und: u32,
    r14_und: u32,

    pc: u32,

    spsr_fiq: Psr,
    spsr_svc: Psr,
    spsr_abt: Psr,
    spsr_irq: Psr,
    spsr_und: Psr,
}

impl Registers {
    /// Reads a logical register through the bank selected by `mode`.
    pub fn register_at(&self, reg: usize, mode: Mode) -> u32 {
        assert!(reg <= 15, "invalid register index: {reg}");

        match (reg, mode) {
            (15, _) => self.pc,
            (0..=7, _) => self.r[reg],
            (8, Mode::Fiq) => self.r8_fiq,
            (9, Mode::Fiq) => self.r9_fiq,
            (10, Mode::Fiq) => self.r10_fiq,
            (11, Mode::Fiq) => self.r11_fiq,
            (12, Mode::Fiq) => self.r12_fiq,
            (8..=12, _) => self.r[reg],
            (13, Mode::User | Mode::System) => self.r13_usr,
            (13, Mode::Fiq) => self.r13_fiq,
            (13, Mode::Supervisor) => self.r13_svc,
            (13, Mode::Abort) => self.r13_abt,
            (13, Mode::Irq) => self.r13_irq,
            (13, Mode::Undefined) => self.r13_und,
            (14, Mode::User | Mode::System) => self.r14_usr,
            (14, Mode::Fiq) => self.r14_fiq,
            (14, Mode::Supervisor) => self.r14_svc,
            (14, Mode::Abort) => self.r14_abt,
            (14, Mode::Irq) => self.r14_irq,
            (14, Mode::Undefined) => self.r14_und,
            _ => unreachable!(),
        }
    }

    /// Writes a logical register through the bank selected by `mode`.
    ///
    /// Writing R15 only moves the program counter; the caller decides
    /// whether the write implies a pipeline flush.
    pub fn set_register_at(&mut self, reg: usize, mode: Mode, value: u32) {
        assert!(reg <= 15, "invalid register index: {reg}");

        let slot = match (reg, mode) {
            (15, _) => &mut self.pc,
            (0..=7, _) => &mut self.r[reg],
            (8, Mode::Fiq) => &mut self.r8_fiq,
            (9, Mode::Fiq) => &mut self.r9_fiq,
            (10, Mode::Fiq) => &mut self.r10_fiq,
            (11, Mode::Fiq) => &mut self.r11_fiq,
            (12, Mode::Fiq) => &mut self.r12_fiq,
            (8..=12, _) => &mut self.r[reg],
            (13, Mode::User | Mode::System) => &mut self.r13_usr,
            (13, Mode::Fiq) => &mut self.r13_fiq,
            (13, Mode::Supervisor) => &mut self.r13_svc,
            (13, Mode::Abort) => &mut self.r13_abt,
            (13, Mode::Irq) => &mut self.r13_irq,
            (13, Mode::Undefined) => &mut self.r13_und,
            (14, Mode::User | Mode::System) => &mut self.r14_usr,
            (14, Mode::Fiq) => &mut self.r14_fiq,
            (14, Mode::Supervisor) => &mut self.r14_svc,
            (14, Mode::Abort) => &mut self.r14_abt,
            (14, Mode::Irq) => &mut self.r14_irq,
            (14, Mode::Undefined) => &mut self.r14_und,
            _ => unreachable!(),
        };

        *slot = value;
    }

    pub fn program_counter(&self) -> u32 {
        self.pc
    }

    pub const fn set_program_counter(&mut self, new_value: u32) {
        self.pc = new_value;
    }

    /// The SPSR of `mode`. User and System have none; reads yield zero.
    pub fn spsr(&self, mode: Mode) -> Psr {
        match mode {
            Mode::Fiq => self.spsr_fiq,
            Mode::Supervisor => self.spsr_svc,
            Mode::Abort => self.spsr_abt,
            Mode::Irq => self.spsr_irq,
            Mode::Undefined => self.spsr_und,
            Mode::User | Mode::System => Psr::default(),
        }
    }

    /// Writes the SPSR of `mode`. Silently dropped for User and System.
    pub fn set_spsr(&mut self, mode: Mode, value: Psr) {
        match mode {
            Mode::Fiq => self.spsr_fiq = value,
            Mode::Supervisor => self.spsr_svc = value,
            Mode::Abort => self.spsr_abt = value,
            Mode::Irq => self.spsr_irq = value,
            Mode::Undefined => self.spsr_und = value,
            Mode::User | Mode::System => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn low_registers_are_shared() {
        let mut regs = Registers::default();

        for reg in 0..=7 {
            regs.set_register_at(reg, Mode::User, reg as u32 + 1);
        }

        for mode in [
            Mode::User,
            Mode::Fiq,
            Mode::Irq,
            Mode::Supervisor,
            Mode::Abort,
            Mode::Undefined,
            Mode::System,
        ] {
            for reg in 0..=7 {
                assert_eq!(regs.register_at(reg, mode), reg as u32 + 1);
            }
        }
    }

    #[test]
    fn fiq_banks_r8_to_r14() {
        let mut regs = Registers::default();

        for reg in 8..=14 {
            regs.set_register_at(reg, Mode::System, 100 + reg as u32);
            regs.set_register_at(reg, Mode::Fiq, 200 + reg as u32);
        }

        for reg in 8..=14 {
            assert_eq!(regs.register_at(reg, Mode::System), 100 + reg as u32);
            assert_eq!(regs.register_at(reg, Mode::Fiq), 200 + reg as u32);
        }

        // R8-R12 of the non-FIQ bank are visible to every other mode.
        for mode in [Mode::Irq, Mode::Supervisor, Mode::Abort, Mode::Undefined] {
            for reg in 8..=12 {
                assert_eq!(regs.register_at(reg, mode), 100 + reg as u32);
            }
        }
    }

    #[test]
    fn sp_and_lr_are_banked_per_mode() {
        let mut regs = Registers::default();

        let modes = [
            (Mode::User, 1),
            (Mode::Fiq, 2),
            (Mode::Irq, 3),
            (Mode::Supervisor, 4),
            (Mode::Abort, 5),
            (Mode::Undefined, 6),
        ];

        for (mode, tag) in modes {
            regs.set_register_at(REG_SP, mode, tag * 10);
            regs.set_register_at(REG_LR, mode, tag * 10 + 1);
        }

        for (mode, tag) in modes {
            assert_eq!(regs.register_at(REG_SP, mode), tag * 10);
            assert_eq!(regs.register_at(REG_LR, mode), tag * 10 + 1);
        }

        // System shares the User bank.
        assert_eq!(regs.register_at(REG_SP, Mode::System), 10);
        assert_eq!(regs.register_at(REG_LR, Mode::System), 11);
    }

    #[test]
    fn pc_is_never_banked() {
        let mut regs = Registers::default();
        regs.set_register_at(15, Mode::Fiq, 0x0800_0000);

        assert_eq!(regs.register_at(15, Mode::User), 0x0800_0000);
        assert_eq!(regs.program_counter(), 0x0800_0000);
    }

    #[test]
    fn spsr_missing_in_user_and_system() {
        let mut regs = Registers::default();

        let mut psr = Psr::default();
        psr.set_carry_flag(true);

        regs.set_spsr(Mode::User, psr);
        regs.set_spsr(Mode::System, psr);
        assert_eq!(u32::from(regs.spsr(Mode::User)), 0);
        assert_eq!(u32::from(regs.spsr(Mode::System)), 0);

        regs.set_spsr(Mode::Irq, psr);
        assert!(regs.spsr(Mode::Irq).carry_flag());
        assert!(!regs.spsr(Mode::Supervisor).carry_flag());
    }

    #[test]
    #[should_panic]
    fn out_of_range_register_is_a_programming_error() {
        let regs = Registers::default();
        regs.register_at(16, Mode::User);
    }
}
