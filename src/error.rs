use crate::lr35902::sm83::{Instruction, Operand};
use snafu::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DmgError {
    #[snafu(display("Failed to read {}: {}", path.display(), source))]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[snafu(display("Failed to write {}: {}", path.display(), source))]
    WriteFile { path: PathBuf, source: std::io::Error },
    #[snafu(display("Failed to open archive {}: {}", path.display(), source))]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },
    #[snafu(display("No ROM image found in archive {}", path.display()))]
    NoRomInArchive { path: PathBuf },
    #[snafu(display("ROM image too small to hold a cartridge header ({} bytes)", length))]
    HeaderTooShort { length: usize },
    #[snafu(display("Unsupported cartridge type: ${:02x}", cartridge_type))]
    UnsupportedCartridge { cartridge_type: u8 },
    #[snafu(display("Unsupported ROM size code: ${:02x}", code))]
    UnsupportedRomSize { code: u8 },
    #[snafu(display("Unsupported RAM size code: ${:02x}", code))]
    UnsupportedRamSize { code: u8 },
    #[snafu(display("Battery RAM has {} bytes, cartridge expects {}", actual, expected))]
    BatterySizeMismatch { expected: usize, actual: usize },
    #[snafu(display("Illegal opcode ({:02x}) at address: ${:04x}", opcode, address))]
    IllegalOpcode { opcode: u8, address: u16 },
    #[snafu(display("Unknown condition bits: {:08b}", data))]
    UnknownConditionBits { data: u8 },
    #[snafu(display("Unknown register bits: {:08b}", data))]
    UnknownRegisterBits { data: u8 },
    #[snafu(display("Invalid instruction handler implementation: {}", instruction))]
    InvalidHandler { instruction: Instruction },
    #[snafu(display("Unresolved target: {:?}", target))]
    UnresolvedTarget { target: Operand },
    #[snafu(display("CPU is no longer executing"))]
    CpuNotAlive,
    #[snafu(display("System must be reset before advancing the clock"))]
    NotReset,
}
