//! # Satsuma emulation core
//!
//! Everything that makes up the Game Boy Advance hardware model lives in
//! this crate; there is deliberately no UI or I/O code here.
//!
//! | Module               | Description                                  |
//! |----------------------|----------------------------------------------|
//! | [`gba`]              | Top-level system wiring (start here)         |
//! | [`cpu`]              | ARM7TDMI interpreter and both decoders       |
//! | [`bus`]              | Address routing to every backing store       |
//! | [`memory`]           | Work RAMs, video memories, I/O register file |
//! | [`cartridge`]        | Game Pak ROM window and save RAM             |
//! | [`cartridge_header`] | ROM header parsing                           |
//! | [`ppu`]              | Scanline timing and the vblank interrupt     |
//!
//! ## Quick start
//!
//! ```ignore
//! use emu::{cartridge::Cartridge, gba::Gba};
//!
//! let rom = std::fs::read("game.gba")?;
//! let bios = std::fs::read("gba_bios.bin")?;
//!
//! let mut gba = Gba::new(bios.try_into().unwrap(), Cartridge::new(rom));
//! loop {
//!     gba.step();
//!     if gba.take_frame_ready() {
//!         // hand the frame to the display
//!     }
//! }
//! ```

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
pub mod bitwise;

pub mod bus;
pub mod cartridge;

#[allow(clippy::similar_names)]
pub mod cartridge_header;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
pub mod cpu;

pub mod gba;
pub mod memory;
pub mod ppu;
