use crate::error::DmgError;
use crate::memory::banks::Banks;
use crate::memory::mapper::{load_banks, Mapper};
use crate::memory::{EXTERNAL_RAM_END, EXTERNAL_RAM_START, OPEN_BUS, ROM_BANK_0_END, ROM_BANK_N_END};
use log::debug;

/// Cartridge without a bank controller: two fixed ROM banks and at most one RAM bank.
#[derive(Clone)]
pub struct Rom {
    rom: Banks,
    ram: Banks,
}

impl Rom {
    pub fn new(rom: Banks, ram: Banks) -> Rom {
        Rom { rom, ram }
    }
}

impl Mapper for Rom {
    #[inline]
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=ROM_BANK_0_END => self.rom.read(0, addr as usize),
            // The switchable region always shows bank 1.
            0x4000..=ROM_BANK_N_END => self.rom.read(1 & self.rom.mask(), addr as usize),
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END if !self.ram.is_empty() => {
                self.ram.read(0, (addr - EXTERNAL_RAM_START) as usize)
            }
            _ => OPEN_BUS,
        }
    }

    #[inline]
    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END if !self.ram.is_empty() => {
                self.ram.write(0, (addr - EXTERNAL_RAM_START) as usize, data)
            }
            // We simply only have a ROM. There is nothing to switch.
            _ => debug!("ROM: Ignoring write of {:02x} to {:04x}", data, addr),
        }
    }

    fn dump_ram(&self) -> Vec<u8> {
        self.ram.as_bytes().to_vec()
    }

    fn load_ram(&mut self, ram: &[u8]) -> Result<(), DmgError> {
        load_banks(&mut self.ram, ram)
    }

    #[inline]
    fn current_rom_bank(&self) -> u16 {
        1 & self.rom.mask() as u16
    }

    #[inline]
    fn current_ram_bank(&self) -> u8 {
        0
    }

    fn rom_bank_count(&self) -> usize {
        self.rom.count()
    }

    fn ram_bank_count(&self) -> usize {
        self.ram.count()
    }

    #[inline]
    fn name(&self) -> String {
        String::from("ROM")
    }
}
