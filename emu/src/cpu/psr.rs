//! Program status registers (CPSR and SPSR).
//!
//! ```text
//! 31 30 29 28 27      8 7 6 5 4   0
//! ┌──┬──┬──┬──┬────────┬─┬─┬─┬─────┐
//! │N │Z │C │V │Reserved│I│F│T│Mode │
//! └──┴──┴──┴──┴────────┴─┴─┴─┴─────┘
//! ```
//!
//! One `Psr` value serves as the CPSR; each exception mode additionally
//! keeps one as its SPSR (see the register file).

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::ArithmeticOpResult;
use crate::cpu::{condition::Condition, cpu_modes::Mode};

/// A program status register: the four condition flags, the IRQ/FIQ
/// disable bits, the Thumb state bit and the mode field, packed in 32 bits.
#[derive(Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Psr(u32);

impl Psr {
    /// Evaluates an instruction's condition field against the flags.
    pub(crate) fn can_execute(self, cond: Condition) -> bool {
        use Condition::{AL, CC, CS, EQ, GE, GT, HI, LE, LS, LT, MI, NE, NV, PL, VC, VS};
        match cond {
            EQ => self.zero_flag(),
            NE => !self.zero_flag(),
            CS => self.carry_flag(),
            CC => !self.carry_flag(),
            MI => self.sign_flag(),
            PL => !self.sign_flag(),
            VS => self.overflow_flag(),
            VC => !self.overflow_flag(),
            HI => self.carry_flag() && !self.zero_flag(),
            LS => !self.carry_flag() || self.zero_flag(),
            GE => self.sign_flag() == self.overflow_flag(),
            LT => self.sign_flag() != self.overflow_flag(),
            GT => !self.zero_flag() && (self.sign_flag() == self.overflow_flag()),
            LE => self.zero_flag() || (self.sign_flag() != self.overflow_flag()),
            AL => true,
            NV => false,
        }
    }

    /// N, bit 31.
    #[must_use]
    pub fn sign_flag(self) -> bool {
        self.0.get_bit(31)
    }

    /// Z, bit 30.
    #[must_use]
    pub fn zero_flag(self) -> bool {
        self.0.get_bit(30)
    }

    /// C, bit 29. Set means carry / no borrow.
    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.0.get_bit(29)
    }

    /// V, bit 28.
    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.0.get_bit(28)
    }

    /// I, bit 7. Set means IRQ disabled.
    #[must_use]
    pub fn irq_disable(self) -> bool {
        self.0.get_bit(7)
    }

    /// F, bit 6. Set means FIQ disabled.
    #[must_use]
    pub fn fiq_disable(self) -> bool {
        self.0.get_bit(6)
    }

    /// T, bit 5. Set means Thumb state.
    #[must_use]
    pub fn state_bit(self) -> bool {
        self.0.get_bit(5)
    }

    /// Mode field, bits 4:0.
    ///
    /// The GBA BIOS occasionally writes invalid mode bits (often zero) into
    /// an SPSR; such a value decodes as Supervisor so a later restore keeps
    /// the CPSR mode field valid.
    #[must_use]
    pub fn mode(self) -> Mode {
        let mode_bits = self.0 & 0b11111;
        Mode::try_from(mode_bits).unwrap_or_else(|_| {
            logger::log(format!(
                "invalid mode bits 0b{mode_bits:05b} in PSR 0x{:08X}, treating as Supervisor",
                self.0
            ));
            Mode::Supervisor
        })
    }

    pub fn set_sign_flag(&mut self, value: bool) {
        self.0.set_bit(31, value);
    }

    pub fn set_zero_flag(&mut self, value: bool) {
        self.0.set_bit(30, value);
    }

    pub fn set_carry_flag(&mut self, value: bool) {
        self.0.set_bit(29, value);
    }

    pub fn set_overflow_flag(&mut self, value: bool) {
        self.0.set_bit(28, value);
    }

    /// Applies all four flags of an ALU result at once.
    pub fn set_flags(&mut self, op_result: ArithmeticOpResult) {
        self.set_sign_flag(op_result.sign);
        self.set_zero_flag(op_result.zero);
        self.set_carry_flag(op_result.carry);
        self.set_overflow_flag(op_result.overflow);
    }

    pub fn set_irq_disable(&mut self, value: bool) {
        self.0.set_bit(7, value);
    }

    pub fn set_fiq_disable(&mut self, value: bool) {
        self.0.set_bit(6, value);
    }

    pub fn set_state_bit(&mut self, value: bool) {
        self.0.set_bit(5, value);
    }

    pub const fn set_mode(&mut self, m: Mode) {
        self.0 = (self.0 & !0b11111) | m as u32;
    }

    /// Writes raw mode bits without validation. Used for SPSR writes, where
    /// the stored value only matters when it is later restored.
    pub const fn set_mode_raw(&mut self, m: u32) {
        self.0 = (self.0 & !0b11111) | (m & 0b11111);
    }

    #[must_use]
    pub fn cpu_state(self) -> CpuState {
        self.state_bit().into()
    }

    pub fn set_cpu_state(&mut self, state: CpuState) {
        self.set_state_bit(state.into());
    }
}

impl From<Mode> for Psr {
    fn from(m: Mode) -> Self {
        Self(m as u32)
    }
}

impl From<u32> for Psr {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<Psr> for u32 {
    fn from(p: Psr) -> Self {
        p.0
    }
}

impl std::fmt::Debug for Psr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Psr({:#010X})", self.0)
    }
}

/// Instruction set state, selected by the T bit: 32-bit ARM or 16-bit Thumb.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum CpuState {
    Thumb,
    Arm,
}

impl From<CpuState> for bool {
    fn from(state: CpuState) -> Self {
        match state {
            CpuState::Arm => false,
            CpuState::Thumb => true,
        }
    }
}

impl From<bool> for CpuState {
    fn from(state: bool) -> Self {
        if state {
            Self::Thumb
        } else {
            Self::Arm
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_flags() {
        let mut cpsr = Psr::default();

        cpsr.set_sign_flag(true);
        assert!(cpsr.sign_flag());

        cpsr.set_zero_flag(true);
        assert!(cpsr.zero_flag());

        cpsr.set_carry_flag(true);
        assert!(cpsr.carry_flag());

        cpsr.set_overflow_flag(true);
        assert!(cpsr.overflow_flag());

        assert_eq!(u32::from(cpsr) >> 28, 0b1111);
    }

    #[test]
    fn check_control_bits() {
        let mut cpsr = Psr::default();

        cpsr.set_irq_disable(true);
        assert!(cpsr.irq_disable());

        cpsr.set_fiq_disable(true);
        assert!(cpsr.fiq_disable());

        cpsr.set_state_bit(true);
        assert!(cpsr.state_bit());
        assert_eq!(cpsr.cpu_state(), CpuState::Thumb);
    }

    #[test]
    fn check_modes_round_trip() {
        for mode in [
            Mode::User,
            Mode::Fiq,
            Mode::Irq,
            Mode::Supervisor,
            Mode::Abort,
            Mode::Undefined,
            Mode::System,
        ] {
            let mut cpsr = Psr::default();
            cpsr.set_mode(mode);
            assert_eq!(u32::from(cpsr) & 0b11111, mode as u32);
            assert_eq!(cpsr.mode(), mode);
        }
    }

    #[test]
    fn invalid_mode_bits_decode_as_supervisor() {
        let cpsr = Psr::from(0b00000_u32);
        assert_eq!(cpsr.mode(), Mode::Supervisor);
    }

    #[test]
    fn check_conditions() {
        let mut cpsr = Psr::default();
        assert!(cpsr.can_execute(Condition::AL));
        assert!(!cpsr.can_execute(Condition::NV));
        assert!(cpsr.can_execute(Condition::NE));
        assert!(cpsr.can_execute(Condition::GE));

        cpsr.set_zero_flag(true);
        assert!(cpsr.can_execute(Condition::EQ));
        assert!(cpsr.can_execute(Condition::LS));
        assert!(!cpsr.can_execute(Condition::HI));

        cpsr.set_sign_flag(true);
        assert!(cpsr.can_execute(Condition::LT));
        assert!(!cpsr.can_execute(Condition::GT));

        cpsr.set_overflow_flag(true);
        assert!(cpsr.can_execute(Condition::GE));
        assert!(cpsr.can_execute(Condition::LE));
    }
}
