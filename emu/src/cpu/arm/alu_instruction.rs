//! ALU opcodes, the barrel shifter and the PSR transfer operands.
//!
//! Data processing instructions carry a 4-bit opcode and a flexible second
//! operand that passes through the barrel shifter:
//!
//! ```text
//! 31-28  27-26  25   24-21   20   19-16  15-12  11-0
//! [Cond] [ 00 ] [I] [OpCode] [S] [ Rn ] [ Rd ] [Operand2]
//! ```
//!
//! When I=1, operand2 is an 8-bit immediate rotated right by twice a 4-bit
//! field; when I=0 it is a register shifted by an immediate amount or by
//! the low byte of another register. Logical opcodes take their carry from
//! the shifter, arithmetic ones from the ALU itself.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::flags::ShiftKind;

/// The 16 data processing opcodes, bits 24:21 of the instruction.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum ArmModeAluInstruction {
    /// `Rd = Rn AND Op2`
    And = 0x0,
    /// `Rd = Rn XOR Op2`
    Eor = 0x1,
    /// `Rd = Rn - Op2`
    Sub = 0x2,
    /// `Rd = Op2 - Rn`
    Rsb = 0x3,
    /// `Rd = Rn + Op2`
    Add = 0x4,
    /// `Rd = Rn + Op2 + C`
    Adc = 0x5,
    /// `Rd = Rn - Op2 + C - 1`
    Sbc = 0x6,
    /// `Rd = Op2 - Rn + C - 1`
    Rsc = 0x7,
    /// AND, flags only.
    Tst = 0x8,
    /// XOR, flags only.
    Teq = 0x9,
    /// SUB, flags only.
    Cmp = 0xA,
    /// ADD, flags only.
    Cmn = 0xB,
    /// `Rd = Rn OR Op2`
    Orr = 0xC,
    /// `Rd = Op2`, Rn ignored.
    Mov = 0xD,
    /// `Rd = Rn AND NOT Op2`
    Bic = 0xE,
    /// `Rd = NOT Op2`, Rn ignored.
    Mvn = 0xF,
}

impl ArmModeAluInstruction {
    /// Logical opcodes take C from the barrel shifter and leave V alone to
    /// the caller; arithmetic ones produce both from the operation.
    pub fn kind(self) -> AluInstructionKind {
        use ArmModeAluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match self {
            And | Eor | Tst | Teq | Orr | Mov | Bic | Mvn => AluInstructionKind::Logical,
            Sub | Rsb | Add | Adc | Sbc | Rsc | Cmp | Cmn => AluInstructionKind::Arithmetic,
        }
    }
}

impl From<u32> for ArmModeAluInstruction {
    fn from(alu_op_code: u32) -> Self {
        match alu_op_code {
            0x0 => Self::And,
            0x1 => Self::Eor,
            0x2 => Self::Sub,
            0x3 => Self::Rsb,
            0x4 => Self::Add,
            0x5 => Self::Adc,
            0x6 => Self::Sbc,
            0x7 => Self::Rsc,
            0x8 => Self::Tst,
            0x9 => Self::Teq,
            0xA => Self::Cmp,
            0xB => Self::Cmn,
            0xC => Self::Orr,
            0xD => Self::Mov,
            0xE => Self::Bic,
            0xF => Self::Mvn,
            _ => unreachable!(),
        }
    }
}

impl std::fmt::Display for ArmModeAluInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = format!("{self:?}");
        f.write_str(&s.to_uppercase())
    }
}

/// Flag-handling class of an ALU opcode.
#[derive(Eq, PartialEq, Debug)]
pub enum AluInstructionKind {
    Logical,
    Arithmetic,
}

/// A 32-bit result together with the four condition flags it implies.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Default)]
pub struct ArithmeticOpResult {
    pub result: u32,
    /// Last bit shifted out, or the unsigned carry of the arithmetic.
    pub carry: bool,
    /// Signed overflow.
    pub overflow: bool,
    /// Bit 31 of the result.
    pub sign: bool,
    /// Result is exactly zero.
    pub zero: bool,
}

/// The barrel shifter.
///
/// Computes `rm` shifted by `shift_amount` and the carry the shifter emits;
/// `overflow`, `sign` and `zero` of the returned value are not populated.
/// The amount-zero encodings of the immediate-shift form are special:
///
/// - `LSL #0` passes the value through with the old carry
/// - `LSR #0` encodes `LSR #32`: result 0, carry = bit 31
/// - `ASR #0` encodes `ASR #32`: sign fill, carry = bit 31
/// - `ROR #0` encodes `RRX`: rotate right through the carry by one
///
/// Register-specified amounts never reach here as zero; the operand
/// resolution short-circuits them to "value and carry unchanged".
pub fn shift(kind: ShiftKind, shift_amount: u32, rm: u32, carry: bool) -> ArithmeticOpResult {
    match kind {
        ShiftKind::Lsl => match shift_amount {
            0 => ArithmeticOpResult {
                result: rm,
                carry,
                ..Default::default()
            },
            // Shifting in u64 keeps the last bit shifted out addressable
            // even for an amount of exactly 32.
            1..=32 => {
                let wide = u64::from(rm) << shift_amount;
                ArithmeticOpResult {
                    result: wide as u32,
                    carry: wide.get_bit(32),
                    ..Default::default()
                }
            }
            _ => ArithmeticOpResult::default(),
        },
        ShiftKind::Lsr => match shift_amount {
            0 | 32 => ArithmeticOpResult {
                result: 0,
                carry: rm.get_bit(31),
                ..Default::default()
            },
            1..=31 => ArithmeticOpResult {
                result: rm >> shift_amount,
                carry: rm.get_bit((shift_amount - 1) as u8),
                ..Default::default()
            },
            _ => ArithmeticOpResult::default(),
        },
        ShiftKind::Asr => match shift_amount {
            1..=31 => ArithmeticOpResult {
                result: ((rm as i32) >> shift_amount) as u32,
                carry: rm.get_bit((shift_amount - 1) as u8),
                ..Default::default()
            },
            // 0 encodes ASR #32; any amount past 31 behaves the same.
            _ => ArithmeticOpResult {
                result: ((rm as i32) >> 31) as u32,
                carry: rm.get_bit(31),
                ..Default::default()
            },
        },
        ShiftKind::Ror => {
            // ROR by n > 32 equals ROR by n mod 32, with multiples of 32
            // behaving as ROR #32.
            let mut amount = shift_amount;
            if amount > 32 {
                amount %= 32;
                if amount == 0 {
                    amount = 32;
                }
            }

            match amount {
                // RRX: the carry is appended on the left.
                0 => ArithmeticOpResult {
                    result: (rm >> 1) | (u32::from(carry) << 31),
                    carry: rm.get_bit(0),
                    ..Default::default()
                },
                1..=31 => ArithmeticOpResult {
                    result: rm.rotate_right(amount),
                    carry: rm.get_bit((amount - 1) as u8),
                    ..Default::default()
                },
                32 => ArithmeticOpResult {
                    result: rm,
                    carry: rm.get_bit(31),
                    ..Default::default()
                },
                _ => unreachable!(),
            }
        }
    }
}

/// Which program status register a PSR transfer addresses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PsrKind {
    Cpsr,
    /// The SPSR of the current mode; absent in User and System.
    Spsr,
}

impl From<bool> for PsrKind {
    fn from(value: bool) -> Self {
        if value {
            Self::Spsr
        } else {
            Self::Cpsr
        }
    }
}

impl std::fmt::Display for PsrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpsr => write!(f, "CPSR"),
            Self::Spsr => write!(f, "SPSR"),
        }
    }
}

/// The two PSR transfer operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PsrOpKind {
    /// `MRS Rd, <psr>`: read the PSR into a register.
    Mrs { destination_register: u32 },

    /// `MSR <psr>_<fields>, Rm|#imm`: write the selected fields.
    ///
    /// `field_mask` holds the f/s/x/c bits (instruction bits 19:16); bit 3
    /// selects the flag byte, bit 0 the control byte. The plain
    /// `MSR <psr>, Rm` assembles with mask 0b1001.
    Msr {
        operand: AluSecondOperandInfo,
        field_mask: u32,
    },
}

impl TryFrom<u32> for PsrOpKind {
    type Error = String;

    fn try_from(op_code: u32) -> Result<Self, Self::Error> {
        if op_code.get_bits(23..=27) == 0b00010
            && op_code.get_bits(16..=21) == 0b00_1111
            && op_code.get_bits(0..=11) == 0
        {
            Ok(Self::Mrs {
                destination_register: op_code.get_bits(12..=15),
            })
        } else if op_code.get_bits(26..=27) == 0b00
            && op_code.get_bits(23..=24) == 0b10
            && op_code.get_bits(20..=21) == 0b10
            && op_code.get_bits(12..=15) == 0b1111
        {
            let operand = if op_code.get_bit(25) {
                AluSecondOperandInfo::Immediate {
                    base: op_code.get_bits(0..=7),
                    shift: op_code.get_bits(8..=11) * 2,
                }
            } else {
                AluSecondOperandInfo::Register {
                    shift_op: ShiftOperator::Immediate(0),
                    shift_kind: ShiftKind::Lsl,
                    register: op_code.get_bits(0..=3),
                }
            };

            Ok(Self::Msr {
                operand,
                field_mask: op_code.get_bits(16..=19),
            })
        } else {
            Err(format!("not a PSR transfer: {op_code:#010X}"))
        }
    }
}

/// Where the shift amount of a register operand comes from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ShiftOperator {
    /// Encoded in the instruction, 0-31 with the special zero meanings.
    Immediate(u32),

    /// Low byte of the named register.
    Register(u32),
}

impl std::fmt::Display for ShiftOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate(value) => write!(f, "#{value}"),
            Self::Register(register) => write!(f, "R{register}"),
        }
    }
}

/// Second operand of a data processing instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum AluSecondOperandInfo {
    /// A register passed through the barrel shifter.
    Register {
        shift_op: ShiftOperator,
        shift_kind: ShiftKind,
        register: u32,
    },

    /// An 8-bit immediate rotated right by `shift` (already doubled).
    Immediate { base: u32, shift: u32 },
}

impl std::fmt::Display for AluSecondOperandInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Register {
                shift_op,
                shift_kind,
                register,
            } => {
                if shift_op == ShiftOperator::Immediate(0) {
                    return match shift_kind {
                        ShiftKind::Lsl => write!(f, "R{register}"),
                        ShiftKind::Ror => write!(f, "R{register}, RRX"),
                        _ => write!(f, "R{register}, {shift_kind} #32"),
                    };
                }

                write!(f, "R{register}, {shift_kind} {shift_op}")
            }
            Self::Immediate { base, shift } => write!(f, "#{}", base.rotate_right(shift)),
        }
    }
}
