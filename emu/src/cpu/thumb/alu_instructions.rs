/// The 16 operations of the Thumb ALU format (bits 9:6).
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ThumbModeAluInstruction {
    And = 0x0,
    Eor = 0x1,
    Lsl = 0x2,
    Lsr = 0x3,
    Asr = 0x4,
    Adc = 0x5,
    Sbc = 0x6,
    Ror = 0x7,
    Tst = 0x8,
    Neg = 0x9,
    Cmp = 0xA,
    Cmn = 0xB,
    Orr = 0xC,
    Mul = 0xD,
    Bic = 0xE,
    Mvn = 0xF,
}

impl From<u16> for ThumbModeAluInstruction {
    fn from(op: u16) -> Self {
        match op {
            0x0 => Self::And,
            0x1 => Self::Eor,
            0x2 => Self::Lsl,
            0x3 => Self::Lsr,
            0x4 => Self::Asr,
            0x5 => Self::Adc,
            0x6 => Self::Sbc,
            0x7 => Self::Ror,
            0x8 => Self::Tst,
            0x9 => Self::Neg,
            0xA => Self::Cmp,
            0xB => Self::Cmn,
            0xC => Self::Orr,
            0xD => Self::Mul,
            0xE => Self::Bic,
            0xF => Self::Mvn,
            _ => unreachable!(),
        }
    }
}

/// The hi-register operations: the only Thumb format that reaches R8-R15.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ThumbHighRegisterOperation {
    Add = 0x0,
    Cmp = 0x1,
    Mov = 0x2,
    BxOrBlx = 0x3,
}

impl From<u16> for ThumbHighRegisterOperation {
    fn from(op: u16) -> Self {
        match op {
            0x0 => Self::Add,
            0x1 => Self::Cmp,
            0x2 => Self::Mov,
            0x3 => Self::BxOrBlx,
            _ => unreachable!(),
        }
    }
}

/// Operations of the move/compare/add/subtract-immediate format.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ThumbImmediateOperation {
    Mov = 0x0,
    Cmp = 0x1,
    Add = 0x2,
    Sub = 0x3,
}

impl From<u16> for ThumbImmediateOperation {
    fn from(op: u16) -> Self {
        match op {
            0x0 => Self::Mov,
            0x1 => Self::Cmp,
            0x2 => Self::Add,
            0x3 => Self::Sub,
            _ => unreachable!(),
        }
    }
}
