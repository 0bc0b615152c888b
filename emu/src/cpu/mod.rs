//! The ARM7TDMI: decoders for both instruction sets, the banked register
//! file and the interpreter that drives them.
//!
//! The processor executes 32-bit ARM or 16-bit Thumb instructions
//! depending on the T bit of the CPSR; `BX` switches between the two.
//! Reading R15 during execution observes the address of the current
//! instruction plus 8 (ARM) or plus 4 (Thumb), the visible remnant of the
//! hardware fetch queue.
//!
//! - [`arm7tdmi`] - the interpreter: fetch, decode, dispatch, exceptions
//! - [`arm`] / [`thumb`] - per-ISA decoders and operation handlers
//! - [`registers`] - banked register file, bank picked at access time
//! - [`psr`] - CPSR/SPSR wrapper
//! - [`condition`] - the 16 condition codes
//! - [`cpu_modes`] - the seven operating modes

pub mod arm;
pub mod arm7tdmi;
pub mod condition;
pub mod cpu_modes;
pub mod flags;
pub mod psr;
pub mod registers;
pub mod thumb;
