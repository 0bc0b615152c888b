use logger::log;

use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::{
    AluSecondOperandInfo, ArmModeAluInstruction, PsrKind, PsrOpKind, ShiftOperator,
};
use crate::cpu::condition::Condition;
use crate::cpu::flags::{
    HalfwordDataTransferOffsetKind, HalfwordTransferKind, Indexing, LoadStoreKind, Offsetting,
    OperandKind, ReadWriteKind, ShiftKind,
};

/// Direction of a single data transfer.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SingleDataTransferKind {
    /// Load from memory into a register.
    Ldr,

    /// Store a register into memory.
    Str,
}

impl From<u32> for SingleDataTransferKind {
    fn from(op_code: u32) -> Self {
        if op_code.get_bit(20) {
            Self::Ldr
        } else {
            Self::Str
        }
    }
}

/// Offset of a single data transfer: a 12-bit immediate, or a register
/// shifted by an immediate amount.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SingleDataTransferOffsetInfo {
    Immediate {
        offset: u32,
    },
    RegisterImmediate {
        shift_amount: u32,
        shift_kind: ShiftKind,
        reg_offset: u32,
    },
}

/// MUL and MLA, distinguished by the accumulate bit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArmModeMultiplyVariant {
    Mul,
    Mla,
}

impl From<u32> for ArmModeMultiplyVariant {
    fn from(op_code: u32) -> Self {
        match op_code.get_bits(21..=24) {
            0b0000 => Self::Mul,
            0b0001 => Self::Mla,
            _ => unreachable!(),
        }
    }
}

/// The four 64-bit multiply forms.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArmModeMultiplyLongVariant {
    Umull,
    Umlal,
    Smull,
    Smlal,
}

impl From<u32> for ArmModeMultiplyLongVariant {
    fn from(op_code: u32) -> Self {
        match op_code.get_bits(21..=24) {
            0b0100 => Self::Umull,
            0b0101 => Self::Umlal,
            0b0110 => Self::Smull,
            0b0111 => Self::Smlal,
            _ => unreachable!(),
        }
    }
}

/// One decoded ARM instruction with every field extracted.
///
/// A value of this type lives for exactly one `step`: the decoder produces
/// it and the dispatcher consumes it.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ArmModeInstruction {
    DataProcessing {
        condition: Condition,
        alu_instruction: ArmModeAluInstruction,
        set_conditions: bool,
        op_kind: OperandKind,
        rn: u32,
        destination: u32,
        op2: AluSecondOperandInfo,
    },
    Multiply {
        variant: ArmModeMultiplyVariant,
        condition: Condition,
        set_conditions: bool,
        rd: u32,
        rn_accumulate: u32,
        rs: u32,
        rm: u32,
    },
    MultiplyLong {
        variant: ArmModeMultiplyLongVariant,
        condition: Condition,
        set_conditions: bool,
        rdhi: u32,
        rdlo: u32,
        rs: u32,
        rm: u32,
    },
    PsrTransfer {
        condition: Condition,
        psr_kind: PsrKind,
        kind: PsrOpKind,
    },
    BranchAndExchange {
        condition: Condition,
        link: bool,
        register: usize,
    },
    HalfwordDataTransfer {
        condition: Condition,
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        load_store_kind: LoadStoreKind,
        offset_kind: HalfwordDataTransferOffsetKind,
        base_register: u32,
        source_destination_register: u32,
        transfer_kind: HalfwordTransferKind,
    },
    SingleDataTransfer {
        condition: Condition,
        kind: SingleDataTransferKind,
        quantity: ReadWriteKind,
        write_back: bool,
        indexing: Indexing,
        rd: u32,
        base_register: u32,
        offset_info: SingleDataTransferOffsetInfo,
        offsetting: Offsetting,
    },
    BlockDataTransfer {
        condition: Condition,
        indexing: Indexing,
        offsetting: Offsetting,
        load_psr: bool,
        write_back: bool,
        load_store: LoadStoreKind,
        rn: u32,
        register_list: u32,
    },
    Branch {
        condition: Condition,
        link: bool,
        offset: u32,
    },
    SoftwareInterrupt {
        condition: Condition,
        comment: u32,
    },
    Undefined,
}

impl From<u32> for ArmModeInstruction {
    fn from(op_code: u32) -> Self {
        use ArmModeInstruction::{
            BlockDataTransfer, Branch, BranchAndExchange, DataProcessing, HalfwordDataTransfer,
            Multiply, MultiplyLong, PsrTransfer, SingleDataTransfer, SoftwareInterrupt, Undefined,
        };

        let condition = Condition::from(op_code.get_bits(28..=31) as u8);

        // Subpatterns are tested before the patterns that contain them:
        // multiplies before halfword transfers, both before data processing.
        if op_code.get_bits(24..=27) == 0b1111 {
            SoftwareInterrupt {
                condition,
                comment: op_code.get_bits(0..=23),
            }
        } else if op_code.get_bits(4..=27) == 0b0001_0010_1111_1111_1111_0001
            || op_code.get_bits(4..=27) == 0b0001_0010_1111_1111_1111_0011
        {
            BranchAndExchange {
                condition,
                link: op_code.get_bit(5),
                register: op_code.get_bits(0..=3) as usize,
            }
        } else if op_code.get_bits(23..=27) == 0b00001 && op_code.get_bits(4..=7) == 0b1001 {
            MultiplyLong {
                variant: ArmModeMultiplyLongVariant::from(op_code),
                condition,
                set_conditions: op_code.get_bit(20),
                rdhi: op_code.get_bits(16..=19),
                rdlo: op_code.get_bits(12..=15),
                rs: op_code.get_bits(8..=11),
                rm: op_code.get_bits(0..=3),
            }
        } else if op_code.get_bits(22..=27) == 0b000000 && op_code.get_bits(4..=7) == 0b1001 {
            Multiply {
                variant: ArmModeMultiplyVariant::from(op_code),
                condition,
                set_conditions: op_code.get_bit(20),
                rd: op_code.get_bits(16..=19),
                rn_accumulate: op_code.get_bits(12..=15),
                rs: op_code.get_bits(8..=11),
                rm: op_code.get_bits(0..=3),
            }
        } else if op_code.get_bits(25..=27) == 0b000
            && op_code.get_bit(7)
            && op_code.get_bit(4)
            && op_code.get_bits(5..=6) != 0
        {
            let operand_kind: OperandKind = op_code.get_bit(22).into();

            let offset_kind = if operand_kind == OperandKind::Register {
                HalfwordDataTransferOffsetKind::Register {
                    register: op_code.get_bits(0..=3),
                }
            } else {
                HalfwordDataTransferOffsetKind::Immediate {
                    offset: (op_code.get_bits(8..=11) << 4) | op_code.get_bits(0..=3),
                }
            };

            HalfwordDataTransfer {
                condition,
                indexing: op_code.get_bit(24).into(),
                offsetting: op_code.get_bit(23).into(),
                write_back: op_code.get_bit(21),
                load_store_kind: op_code.get_bit(20).into(),
                offset_kind,
                base_register: op_code.get_bits(16..=19),
                source_destination_register: op_code.get_bits(12..=15),
                transfer_kind: HalfwordTransferKind::from(op_code.get_bits(5..=6) as u8),
            }
        } else if op_code.get_bits(25..=27) == 0b011 && op_code.get_bit(4) {
            Undefined
        } else if op_code.get_bits(25..=27) == 0b100 {
            BlockDataTransfer {
                condition,
                indexing: op_code.get_bit(24).into(),
                offsetting: op_code.get_bit(23).into(),
                load_psr: op_code.get_bit(22),
                write_back: op_code.get_bit(21),
                load_store: op_code.get_bit(20).into(),
                rn: op_code.get_bits(16..=19),
                register_list: op_code.get_bits(0..=15),
            }
        } else if op_code.get_bits(25..=27) == 0b101 {
            Branch {
                condition,
                link: op_code.get_bit(24),
                offset: op_code.get_bits(0..=23) << 2,
            }
        } else if op_code.get_bits(26..=27) == 0b01 {
            // The I bit of single transfers is inverted with respect to
            // data processing: set means register offset.
            let op_kind: OperandKind = (!op_code.get_bit(25)).into();

            let offset_info = match op_kind {
                OperandKind::Immediate => SingleDataTransferOffsetInfo::Immediate {
                    offset: op_code.get_bits(0..=11),
                },
                OperandKind::Register => SingleDataTransferOffsetInfo::RegisterImmediate {
                    shift_amount: op_code.get_bits(7..=11),
                    shift_kind: op_code.get_bits(5..=6).into(),
                    reg_offset: op_code.get_bits(0..=3),
                },
            };

            SingleDataTransfer {
                condition,
                kind: op_code.into(),
                quantity: op_code.get_bit(22).into(),
                write_back: op_code.get_bit(21),
                indexing: op_code.get_bit(24).into(),
                rd: op_code.get_bits(12..=15),
                base_register: op_code.get_bits(16..=19),
                offset_info,
                offsetting: op_code.get_bit(23).into(),
            }
        } else if op_code.get_bits(26..=27) == 0b00 {
            let alu_instruction: ArmModeAluInstruction = op_code.get_bits(21..=24).into();
            let set_conditions = op_code.get_bit(20);

            // A test opcode that does not set flags is a PSR transfer.
            if !set_conditions
                && matches!(
                    alu_instruction,
                    ArmModeAluInstruction::Tst
                        | ArmModeAluInstruction::Teq
                        | ArmModeAluInstruction::Cmp
                        | ArmModeAluInstruction::Cmn
                )
            {
                return match PsrOpKind::try_from(op_code) {
                    Ok(kind) => PsrTransfer {
                        condition,
                        psr_kind: PsrKind::from(op_code.get_bit(22)),
                        kind,
                    },
                    Err(e) => {
                        log(e);
                        Undefined
                    }
                };
            }

            let op_kind: OperandKind = op_code.get_bit(25).into();

            let op2 = match op_kind {
                OperandKind::Immediate => AluSecondOperandInfo::Immediate {
                    base: op_code.get_bits(0..=7),
                    shift: op_code.get_bits(8..=11) * 2,
                },
                OperandKind::Register => {
                    let shift_op = if op_code.get_bit(4) {
                        ShiftOperator::Register(op_code.get_bits(8..=11))
                    } else {
                        ShiftOperator::Immediate(op_code.get_bits(7..=11))
                    };

                    AluSecondOperandInfo::Register {
                        shift_op,
                        shift_kind: op_code.get_bits(5..=6).into(),
                        register: op_code.get_bits(0..=3),
                    }
                }
            };

            DataProcessing {
                condition,
                alu_instruction,
                set_conditions,
                op_kind,
                rn: op_code.get_bits(16..=19),
                destination: op_code.get_bits(12..=15),
                op2,
            }
        } else {
            log(format!("unrecognized ARM pattern {op_code:#010X}"));
            Undefined
        }
    }
}

impl std::fmt::Display for ArmModeInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A decoded instruction bundled with its condition and raw encoding.
pub struct ArmModeOpcode {
    pub instruction: ArmModeInstruction,
    pub condition: Condition,
    pub raw: u32,
}

impl From<u32> for ArmModeOpcode {
    fn from(op_code: u32) -> Self {
        Self {
            instruction: ArmModeInstruction::from(op_code),
            condition: Condition::from(op_code.get_bits(28..=31) as u8),
            raw: op_code,
        }
    }
}

impl std::fmt::Display for ArmModeOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010X}: {}", self.raw, self.instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_branch() {
        let output = ArmModeInstruction::from(0b1110_1011_0000_0000_0000_0000_0111_1111);
        assert_eq!(
            ArmModeInstruction::Branch {
                condition: Condition::AL,
                link: true,
                offset: 508,
            },
            output
        );

        let output = ArmModeInstruction::from(0b0000_1010_0000_0000_0000_0000_0111_1111);
        assert_eq!(
            ArmModeInstruction::Branch {
                condition: Condition::EQ,
                link: false,
                offset: 508,
            },
            output
        );
    }

    #[test]
    fn decode_branch_and_exchange() {
        let output = ArmModeInstruction::from(0b1110_0001_0010_1111_1111_1111_0001_0001);
        assert_eq!(
            ArmModeInstruction::BranchAndExchange {
                condition: Condition::AL,
                link: false,
                register: 1,
            },
            output
        );

        let output = ArmModeInstruction::from(0b1110_0001_0010_1111_1111_1111_0011_0001);
        assert_eq!(
            ArmModeInstruction::BranchAndExchange {
                condition: Condition::AL,
                link: true,
                register: 1,
            },
            output
        );
    }

    #[test]
    fn decode_software_interrupt() {
        let output = ArmModeInstruction::from(0b1110_1111_0000_0000_0000_0001_0000_0000);
        assert_eq!(
            ArmModeInstruction::SoftwareInterrupt {
                condition: Condition::AL,
                comment: 0x100,
            },
            output
        );
    }

    #[test]
    fn decode_multiply() {
        // MLAS R4, R2, R3, R1
        let output = ArmModeInstruction::from(0b1110_0000_0011_0100_0001_0011_1001_0010);
        assert_eq!(
            ArmModeInstruction::Multiply {
                variant: ArmModeMultiplyVariant::Mla,
                condition: Condition::AL,
                set_conditions: true,
                rd: 4,
                rn_accumulate: 1,
                rs: 3,
                rm: 2,
            },
            output
        );
    }

    #[test]
    fn decode_multiply_long() {
        // UMULL R2, R3, R0, R1
        let output = ArmModeInstruction::from(0b1110_0000_1000_0011_0010_0001_1001_0000);
        assert_eq!(
            ArmModeInstruction::MultiplyLong {
                variant: ArmModeMultiplyLongVariant::Umull,
                condition: Condition::AL,
                set_conditions: false,
                rdhi: 3,
                rdlo: 2,
                rs: 1,
                rm: 0,
            },
            output
        );
    }

    #[test]
    fn decode_data_processing() {
        // MOV R0, #18
        let output = ArmModeInstruction::from(0xE3A0_0012);
        assert_eq!(
            ArmModeInstruction::DataProcessing {
                condition: Condition::AL,
                alu_instruction: ArmModeAluInstruction::Mov,
                set_conditions: false,
                op_kind: OperandKind::Immediate,
                rn: 0,
                destination: 0,
                op2: AluSecondOperandInfo::Immediate {
                    base: 0x12,
                    shift: 0,
                },
            },
            output
        );
    }

    #[test]
    fn decode_psr_transfer() {
        // MSR SPSR, R14
        let output = ArmModeInstruction::from(0b1110_00_0_1011_0_1001_1111_000000001110);
        assert_eq!(
            ArmModeInstruction::PsrTransfer {
                condition: Condition::AL,
                psr_kind: PsrKind::Spsr,
                kind: PsrOpKind::Msr {
                    operand: AluSecondOperandInfo::Register {
                        shift_op: ShiftOperator::Immediate(0),
                        shift_kind: ShiftKind::Lsl,
                        register: 14,
                    },
                    field_mask: 0b1001,
                },
            },
            output
        );
    }

    #[test]
    fn decode_half_word_data_transfer() {
        // STRH R0, [R2, +R1]
        let output = ArmModeInstruction::from(0b1110_0001_1000_0010_0000_0000_1011_0001);
        assert_eq!(
            ArmModeInstruction::HalfwordDataTransfer {
                condition: Condition::AL,
                indexing: Indexing::Pre,
                offsetting: Offsetting::Up,
                write_back: false,
                load_store_kind: LoadStoreKind::Store,
                offset_kind: HalfwordDataTransferOffsetKind::Register { register: 1 },
                base_register: 2,
                source_destination_register: 0,
                transfer_kind: HalfwordTransferKind::UnsignedHalfword,
            },
            output
        );
    }

    #[test]
    fn decode_single_data_transfer() {
        // LDR R1, [R0, #8]
        let output = ArmModeInstruction::from(0b1110_0101_1001_0000_0001_0000_0000_1000);
        assert_eq!(
            ArmModeInstruction::SingleDataTransfer {
                condition: Condition::AL,
                kind: SingleDataTransferKind::Ldr,
                quantity: ReadWriteKind::Word,
                write_back: false,
                indexing: Indexing::Pre,
                rd: 1,
                base_register: 0,
                offset_info: SingleDataTransferOffsetInfo::Immediate { offset: 8 },
                offsetting: Offsetting::Up,
            },
            output
        );
    }

    #[test]
    fn decode_block_data_transfer() {
        // LDMIA R13!, {R0-R3}
        let output = ArmModeInstruction::from(0b1110_1000_1011_1101_0000_0000_0000_1111);
        assert_eq!(
            ArmModeInstruction::BlockDataTransfer {
                condition: Condition::AL,
                indexing: Indexing::Post,
                offsetting: Offsetting::Up,
                load_psr: false,
                write_back: true,
                load_store: LoadStoreKind::Load,
                rn: 13,
                register_list: 0b1111,
            },
            output
        );
    }

    #[test]
    fn undecodable_patterns_are_undefined() {
        // The reserved "undefined" encoding space: 011 with bit 4 set.
        let output = ArmModeInstruction::from(0b1110_0110_0000_0000_0000_0000_0001_0000);
        assert_eq!(ArmModeInstruction::Undefined, output);
    }
}
