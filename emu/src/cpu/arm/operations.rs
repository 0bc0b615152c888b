use logger::log;

use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::{
    shift, AluSecondOperandInfo, ArithmeticOpResult, ArmModeAluInstruction, PsrKind, PsrOpKind,
    ShiftOperator,
};
use crate::cpu::arm::instructions::{
    ArmModeMultiplyLongVariant, ArmModeMultiplyVariant, SingleDataTransferKind,
    SingleDataTransferOffsetInfo,
};
use crate::cpu::arm7tdmi::Arm7tdmi;
use crate::cpu::cpu_modes::Mode;
use crate::cpu::flags::{
    HalfwordDataTransferOffsetKind, HalfwordTransferKind, Indexing, LoadStoreKind, Offsetting,
    ReadWriteKind,
};
use crate::cpu::psr::{CpuState, Psr};
use crate::cpu::registers::{REG_LR, REG_PROGRAM_COUNTER};
use crate::memory::io_device::IoDevice;

pub const SIZE_OF_INSTRUCTION: u32 = 4;

impl Arm7tdmi {
    pub(crate) fn data_processing(
        &mut self,
        alu_instruction: ArmModeAluInstruction,
        set_conditions: bool,
        rn: u32,
        destination: u32,
        op2: AluSecondOperandInfo,
    ) {
        use ArmModeAluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };

        let carry_in = self.cpsr.carry_flag();

        // A register-specified shift takes an internal cycle, so R15 reads
        // another word ahead: instruction address + 12.
        let shift_by_register = matches!(
            op2,
            AluSecondOperandInfo::Register {
                shift_op: ShiftOperator::Register(_),
                ..
            }
        );
        let pc_shift_extra = if shift_by_register { 4 } else { 0 };

        let op1 = if rn == REG_PROGRAM_COUNTER {
            self.r15_operand().wrapping_add(pc_shift_extra)
        } else {
            self.register_at(rn as usize)
        };

        let (op2, shifter_carry) = self.resolve_operand2(op2, carry_in);

        let op_result = match alu_instruction {
            And | Tst => Self::logical_op_result(op1 & op2, shifter_carry),
            Eor | Teq => Self::logical_op_result(op1 ^ op2, shifter_carry),
            Orr => Self::logical_op_result(op1 | op2, shifter_carry),
            Bic => Self::logical_op_result(op1 & !op2, shifter_carry),
            Mov => Self::logical_op_result(op2, shifter_carry),
            Mvn => Self::logical_op_result(!op2, shifter_carry),
            Sub | Cmp => Self::sub_inner_op(op1, op2),
            Rsb => Self::sub_inner_op(op2, op1),
            Add | Cmn => Self::add_inner_op(op1, op2),
            Adc => Self::adc_inner_op(op1, op2, carry_in),
            Sbc => Self::sbc_inner_op(op1, op2, carry_in),
            Rsc => Self::sbc_inner_op(op2, op1, carry_in),
        };

        let is_test = matches!(alu_instruction, Tst | Teq | Cmp | Cmn);
        if !is_test {
            self.set_register_at(destination as usize, op_result.result);
        }

        if set_conditions {
            if !is_test && destination == REG_PROGRAM_COUNTER {
                // Exception return: the S bit on a PC write restores the
                // CPSR from the current mode's SPSR instead of the flags.
                if !matches!(self.cpsr.mode(), Mode::User | Mode::System) {
                    self.cpsr = self.spsr();
                }
            } else {
                self.cpsr.set_flags(op_result);
            }
        }
    }

    fn logical_op_result(result: u32, shifter_carry: bool) -> ArithmeticOpResult {
        ArithmeticOpResult {
            result,
            carry: shifter_carry,
            overflow: false,
            sign: result.get_bit(31),
            zero: result == 0,
        }
    }

    /// Resolves operand2 to its value and the shifter carry-out.
    ///
    /// Never touches the CPSR: logical instructions with S apply the carry
    /// themselves, everything else discards it.
    pub(crate) fn resolve_operand2(
        &self,
        op2: AluSecondOperandInfo,
        carry_in: bool,
    ) -> (u32, bool) {
        match op2 {
            AluSecondOperandInfo::Immediate { base, shift } => {
                let value = base.rotate_right(shift);
                let carry = if shift == 0 { carry_in } else { value.get_bit(31) };
                (value, carry)
            }
            AluSecondOperandInfo::Register {
                shift_op,
                shift_kind,
                register,
            } => {
                let rm = if register == REG_PROGRAM_COUNTER {
                    let extra = match shift_op {
                        ShiftOperator::Register(_) => 4,
                        ShiftOperator::Immediate(_) => 0,
                    };
                    self.r15_operand().wrapping_add(extra)
                } else {
                    self.register_at(register as usize)
                };

                match shift_op {
                    ShiftOperator::Immediate(amount) => {
                        let r = shift(shift_kind, amount, rm, carry_in);
                        (r.result, r.carry)
                    }
                    ShiftOperator::Register(rs) => {
                        let amount = self.register_at(rs as usize) & 0xFF;
                        // Amount zero from a register leaves value and
                        // carry untouched, unlike the immediate encodings.
                        if amount == 0 {
                            (rm, carry_in)
                        } else {
                            let r = shift(shift_kind, amount, rm, carry_in);
                            (r.result, r.carry)
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn add_inner_op(first_op: u32, second_op: u32) -> ArithmeticOpResult {
        // The sum is done in 64 bits so bit 32 is the carry-out.
        let wide = u64::from(first_op) + u64::from(second_op);
        let result = wide as u32;

        ArithmeticOpResult {
            result,
            carry: wide.get_bit(32),
            overflow: ((first_op ^ result) & (second_op ^ result)).get_bit(31),
            sign: result.get_bit(31),
            zero: result == 0,
        }
    }

    pub(crate) fn sub_inner_op(first_op: u32, second_op: u32) -> ArithmeticOpResult {
        let result = first_op.wrapping_sub(second_op);

        ArithmeticOpResult {
            result,
            // C means "no borrow occurred".
            carry: first_op >= second_op,
            overflow: ((first_op ^ second_op) & (first_op ^ result)).get_bit(31),
            sign: result.get_bit(31),
            zero: result == 0,
        }
    }

    pub(crate) fn adc_inner_op(first_op: u32, second_op: u32, carry_in: bool) -> ArithmeticOpResult {
        let wide = u64::from(first_op) + u64::from(second_op) + u64::from(carry_in);
        let result = wide as u32;

        ArithmeticOpResult {
            result,
            carry: wide.get_bit(32),
            overflow: ((first_op ^ result) & (second_op ^ result)).get_bit(31),
            sign: result.get_bit(31),
            zero: result == 0,
        }
    }

    pub(crate) fn sbc_inner_op(first_op: u32, second_op: u32, carry_in: bool) -> ArithmeticOpResult {
        // a - b - !C computed as a + NOT b + C, which keeps the carry-out
        // meaning "no borrow".
        let wide = u64::from(first_op) + u64::from(!second_op) + u64::from(carry_in);
        let result = wide as u32;

        ArithmeticOpResult {
            result,
            carry: wide.get_bit(32),
            overflow: ((first_op ^ second_op) & (first_op ^ result)).get_bit(31),
            sign: result.get_bit(31),
            zero: result == 0,
        }
    }

    pub(crate) fn psr_transfer(&mut self, op_kind: PsrOpKind, psr_kind: PsrKind) {
        match op_kind {
            PsrOpKind::Mrs {
                destination_register,
            } => {
                // SPSR reads in User/System come back as zero.
                let psr = match psr_kind {
                    PsrKind::Cpsr => self.cpsr,
                    PsrKind::Spsr => self.spsr(),
                };

                self.set_register_at(destination_register as usize, psr.into());
            }
            PsrOpKind::Msr {
                operand,
                field_mask,
            } => {
                let value = match operand {
                    AluSecondOperandInfo::Register { register, .. } => {
                        self.register_value(register as usize)
                    }
                    AluSecondOperandInfo::Immediate { base, shift } => base.rotate_right(shift),
                };

                self.write_psr(psr_kind, field_mask, value);
            }
        }
    }

    /// Applies a masked MSR write and stores the result back into the
    /// selected PSR.
    fn write_psr(&mut self, psr_kind: PsrKind, field_mask: u32, value: u32) {
        let current_mode = self.cpsr.mode();

        // User code can only touch the flag byte.
        let mut mask = field_mask;
        if current_mode == Mode::User {
            mask &= 0b1000;
        }

        let old: u32 = match psr_kind {
            PsrKind::Cpsr => self.cpsr.into(),
            PsrKind::Spsr => self.spsr().into(),
        };

        let mut new = old;
        for field in 0_u8..4 {
            if mask.get_bit(field) {
                new.set_byte(field, value.get_byte(field));
            }
        }

        match psr_kind {
            PsrKind::Cpsr => {
                // The CPSR mode field must stay valid; a garbage write
                // keeps the old mode.
                if Mode::try_from(new & 0b11111).is_err() {
                    log(format!("MSR with invalid mode bits {:#04X}", new & 0b11111));
                    new = (new & !0b11111) | (old & 0b11111);
                }

                if Psr::from(new).state_bit() != self.cpsr.state_bit() {
                    log("MSR toggles the state bit; software is not supposed to do this");
                }

                self.cpsr = Psr::from(new);
            }
            // SPSR writes in User/System are silently dropped.
            PsrKind::Spsr => self.set_spsr(Psr::from(new)),
        }
    }

    pub(crate) fn branch_and_exchange(&mut self, link: bool, register: usize) {
        let raw_target = self.register_value(register);

        if link {
            // The return address is the instruction after this one.
            let lr = self.registers.program_counter();
            self.set_register_at(REG_LR, lr);
        }

        let state: CpuState = raw_target.get_bit(0).into();
        self.cpsr.set_cpu_state(state);

        let target = match state {
            CpuState::Thumb => raw_target & !0b1,
            CpuState::Arm => raw_target & !0b11,
        };

        self.registers.set_program_counter(target);
    }

    pub(crate) fn branch(&mut self, link: bool, offset: u32) {
        let offset = offset.sign_extended(26) as i32;
        let base = self.r15_operand();

        if link {
            let lr = self.registers.program_counter();
            self.set_register_at(REG_LR, lr);
        }

        self.registers
            .set_program_counter((base as i32).wrapping_add(offset) as u32);
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn single_data_transfer(
        &mut self,
        kind: SingleDataTransferKind,
        quantity: ReadWriteKind,
        write_back: bool,
        indexing: Indexing,
        rd: u32,
        base_register: u32,
        offset_info: SingleDataTransferOffsetInfo,
        offsetting: Offsetting,
    ) {
        let base = self.register_value(base_register as usize);

        let amount = match offset_info {
            SingleDataTransferOffsetInfo::Immediate { offset } => offset,
            SingleDataTransferOffsetInfo::RegisterImmediate {
                shift_amount,
                shift_kind,
                reg_offset,
            } => {
                let rm = self.register_value(reg_offset as usize);
                shift(shift_kind, shift_amount, rm, self.cpsr.carry_flag()).result
            }
        };

        let offset_address = match offsetting {
            Offsetting::Down => base.wrapping_sub(amount),
            Offsetting::Up => base.wrapping_add(amount),
        };

        let address = match indexing {
            Indexing::Pre => offset_address,
            Indexing::Post => base,
        } as usize;

        match kind {
            SingleDataTransferKind::Ldr => {
                let value = match quantity {
                    ReadWriteKind::Byte => u32::from(self.bus.read_at(address)),
                    ReadWriteKind::Word => {
                        // An unaligned word access reads the aligned word
                        // rotated so the addressed byte lands in the low
                        // lane.
                        let aligned = address & !0b11;
                        self.bus
                            .read_word(aligned)
                            .rotate_right(8 * (address as u32 & 0b11))
                    }
                };

                // Write-back happens before the load lands, so a load into
                // the base register wins.
                if write_back {
                    self.set_register_at(base_register as usize, offset_address);
                }

                if rd == REG_PROGRAM_COUNTER {
                    // Bit 0 of a word load into PC selects Thumb.
                    if quantity == ReadWriteKind::Word && value.get_bit(0) {
                        self.cpsr.set_cpu_state(CpuState::Thumb);
                        self.registers.set_program_counter(value & !0b1);
                    } else {
                        self.cpsr.set_cpu_state(CpuState::Arm);
                        self.registers.set_program_counter(value & !0b11);
                    }
                } else {
                    self.set_register_at(rd as usize, value);
                }
            }
            SingleDataTransferKind::Str => {
                let mut value = self.register_value(rd as usize);

                // A stored R15 reads one extra word ahead: address + 12.
                if rd == REG_PROGRAM_COUNTER {
                    value = value.wrapping_add(4);
                }

                match quantity {
                    ReadWriteKind::Byte => self.bus.write_at(address, value as u8),
                    ReadWriteKind::Word => self.bus.write_word(address & !0b11, value),
                }

                if write_back {
                    self.set_register_at(base_register as usize, offset_address);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn half_word_data_transfer(
        &mut self,
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        load_store_kind: LoadStoreKind,
        offset_kind: HalfwordDataTransferOffsetKind,
        base_register: u32,
        source_destination_register: u32,
        transfer_kind: HalfwordTransferKind,
    ) {
        let base = self.register_value(base_register as usize);

        let offset = match offset_kind {
            HalfwordDataTransferOffsetKind::Immediate { offset } => offset,
            HalfwordDataTransferOffsetKind::Register { register } => {
                self.register_value(register as usize)
            }
        };

        let offset_address = match offsetting {
            Offsetting::Down => base.wrapping_sub(offset),
            Offsetting::Up => base.wrapping_add(offset),
        };

        let address = match indexing {
            Indexing::Pre => offset_address,
            Indexing::Post => base,
        } as usize;

        match load_store_kind {
            LoadStoreKind::Store => {
                let mut value = self.register_value(source_destination_register as usize);
                if source_destination_register == REG_PROGRAM_COUNTER {
                    value = value.wrapping_add(4);
                }

                match transfer_kind {
                    HalfwordTransferKind::UnsignedHalfword => {
                        self.bus.write_half_word(address & !0b1, value as u16);
                    }
                    _ => unreachable!("signed halfword transfers only exist as loads"),
                }

                if write_back {
                    self.set_register_at(base_register as usize, offset_address);
                }
            }
            LoadStoreKind::Load => {
                let value = match transfer_kind {
                    HalfwordTransferKind::UnsignedHalfword => {
                        let v = u32::from(self.bus.read_half_word(address & !0b1));
                        v.rotate_right(8 * (address as u32 & 0b1))
                    }
                    HalfwordTransferKind::SignedByte => {
                        u32::from(self.bus.read_at(address)).sign_extended(8)
                    }
                    HalfwordTransferKind::SignedHalfword => {
                        u32::from(self.bus.read_half_word(address & !0b1)).sign_extended(16)
                    }
                };

                if write_back {
                    self.set_register_at(base_register as usize, offset_address);
                }

                self.set_register_at(source_destination_register as usize, value);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn block_data_transfer(
        &mut self,
        indexing: Indexing,
        offsetting: Offsetting,
        load_psr: bool,
        write_back: bool,
        load_store: LoadStoreKind,
        rn: u32,
        register_list: u32,
    ) {
        let base = self.register_at(rn as usize);

        if register_list == 0 {
            // Architectural quirk: an empty list transfers nothing, yet
            // write-back still moves the base a full 16 registers' worth.
            if write_back {
                let moved = match offsetting {
                    Offsetting::Up => base.wrapping_add(0x40),
                    Offsetting::Down => base.wrapping_sub(0x40),
                };
                self.set_register_at(rn as usize, moved);
            }
            return;
        }

        let count = register_list.count_ones();

        // Transfers always walk ascending addresses in ascending register
        // order; direction and indexing only pick the starting point.
        let start = match (offsetting, indexing) {
            (Offsetting::Up, Indexing::Post) => base,
            (Offsetting::Up, Indexing::Pre) => base.wrapping_add(4),
            (Offsetting::Down, Indexing::Pre) => base.wrapping_sub(4 * count),
            (Offsetting::Down, Indexing::Post) => base.wrapping_sub(4 * count).wrapping_add(4),
        };

        let final_base = match offsetting {
            Offsetting::Up => base.wrapping_add(4 * count),
            Offsetting::Down => base.wrapping_sub(4 * count),
        };

        // S without R15 in an LDM list means "use the User bank"; with R15
        // in an LDM it instead restores the CPSR at the end.
        let restores_cpsr =
            load_store == LoadStoreKind::Load && register_list.get_bit(15) && load_psr;
        let access_mode = if load_psr && !restores_cpsr {
            Mode::User
        } else {
            self.cpsr.mode()
        };

        match load_store {
            LoadStoreKind::Store => {
                let first = register_list.trailing_zeros();
                let mut address = start;

                for reg in 0_u8..=15 {
                    if !register_list.get_bit(reg) {
                        continue;
                    }

                    let value = if u32::from(reg) == REG_PROGRAM_COUNTER {
                        // R15 stores as instruction address + 12.
                        self.r15_operand().wrapping_add(4)
                    } else if u32::from(reg) == rn && write_back && u32::from(reg) != first {
                        // A base that is not the first transferred register
                        // stores its written-back value.
                        final_base
                    } else {
                        self.registers.register_at(reg as usize, access_mode)
                    };

                    self.bus.write_word(address as usize, value);
                    address = address.wrapping_add(4);
                }

                if write_back {
                    self.set_register_at(rn as usize, final_base);
                }
            }
            LoadStoreKind::Load => {
                // Write-back first: a loaded base register wins over it.
                if write_back {
                    self.set_register_at(rn as usize, final_base);
                }

                let mut address = start;
                for reg in 0_u8..=15 {
                    if !register_list.get_bit(reg) {
                        continue;
                    }

                    let value = self.bus.read_word(address as usize);
                    address = address.wrapping_add(4);

                    if u32::from(reg) == REG_PROGRAM_COUNTER {
                        if restores_cpsr {
                            self.cpsr = self.spsr();
                        }
                        let mask = match self.cpsr.cpu_state() {
                            CpuState::Thumb => !0b1,
                            CpuState::Arm => !0b11,
                        };
                        self.registers.set_program_counter(value & mask);
                    } else {
                        self.registers
                            .set_register_at(reg as usize, access_mode, value);
                    }
                }
            }
        }
    }

    pub(crate) fn multiply(
        &mut self,
        variant: ArmModeMultiplyVariant,
        set_conditions: bool,
        rd: u32,
        rn_accumulate: u32,
        rs: u32,
        rm: u32,
    ) {
        let mut result = self
            .register_value(rm as usize)
            .wrapping_mul(self.register_value(rs as usize));

        if variant == ArmModeMultiplyVariant::Mla {
            result = result.wrapping_add(self.register_value(rn_accumulate as usize));
        }

        self.set_register_at(rd as usize, result);

        // C is architecturally meaningless after a multiply; V unchanged.
        if set_conditions {
            self.cpsr.set_zero_flag(result == 0);
            self.cpsr.set_sign_flag(result.get_bit(31));
        }
    }

    pub(crate) fn multiply_long(
        &mut self,
        variant: ArmModeMultiplyLongVariant,
        set_conditions: bool,
        rdhi: u32,
        rdlo: u32,
        rs: u32,
        rm: u32,
    ) {
        use ArmModeMultiplyLongVariant::{Smlal, Smull, Umlal, Umull};

        let rm_value = self.register_value(rm as usize);
        let rs_value = self.register_value(rs as usize);

        let accumulator = (u64::from(self.register_at(rdhi as usize)) << 32)
            | u64::from(self.register_at(rdlo as usize));

        let result = match variant {
            Umull => u64::from(rm_value).wrapping_mul(u64::from(rs_value)),
            Umlal => u64::from(rm_value)
                .wrapping_mul(u64::from(rs_value))
                .wrapping_add(accumulator),
            Smull => i64::from(rm_value as i32).wrapping_mul(i64::from(rs_value as i32)) as u64,
            Smlal => i64::from(rm_value as i32)
                .wrapping_mul(i64::from(rs_value as i32))
                .wrapping_add(accumulator as i64) as u64,
        };

        self.set_register_at(rdlo as usize, result as u32);
        self.set_register_at(rdhi as usize, (result >> 32) as u32);

        if set_conditions {
            self.cpsr.set_zero_flag(result == 0);
            self.cpsr.set_sign_flag(result.get_bit(63));
        }
    }
}
