use crate::error::{BatterySizeMismatchSnafu, DmgError};
use crate::memory::banks::Banks;
use dyn_clone::DynClone;
use snafu::ensure;

pub mod mbc3;
pub mod mbc5;
pub mod rom;
mod rtc;

pub trait Mapper: DynClone + Send {
    /// Serves reads of $0000-$7FFF and $A000-$BFFF.
    fn read(&self, addr: u16) -> u8;
    /// Interprets writes to $0000-$7FFF as register writes and stores $A000-$BFFF.
    fn write(&mut self, addr: u16, data: u8);
    fn dump_ram(&self) -> Vec<u8>;
    fn load_ram(&mut self, ram: &[u8]) -> Result<(), DmgError>;
    fn current_rom_bank(&self) -> u16;
    fn current_ram_bank(&self) -> u8;
    fn rom_bank_count(&self) -> usize;
    fn ram_bank_count(&self) -> usize;
    fn name(&self) -> String;

    /// Advances cartridge-side clocks by emulated CPU cycles.
    fn tick(&mut self, _cycles: usize) {}
}

dyn_clone::clone_trait_object!(Mapper);

pub(crate) fn load_banks(banks: &mut Banks, ram: &[u8]) -> Result<(), DmgError> {
    ensure!(
        ram.len() == banks.len(),
        BatterySizeMismatchSnafu {
            expected: banks.len(),
            actual: ram.len(),
        }
    );
    banks.copy_from(ram);
    Ok(())
}
