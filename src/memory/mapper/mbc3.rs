use crate::error::DmgError;
use crate::memory::banks::Banks;
use crate::memory::mapper::rtc::Rtc;
use crate::memory::mapper::{load_banks, Mapper};
use crate::memory::{EXTERNAL_RAM_END, EXTERNAL_RAM_START, OPEN_BUS, ROM_BANK_0_END, ROM_BANK_N_END, ROM_BANK_N_START};
use log::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RamSelect {
    Bank(u8),
    Clock(u8),
}

#[derive(Clone)]
pub struct Mbc3 {
    rom: Banks,
    ram: Banks,
    rtc: Option<Rtc>,
    rom_bank: usize,
    select: RamSelect,
    ram_enabled: bool,
}

impl Mbc3 {
    pub fn new(rom: Banks, ram: Banks, with_rtc: bool) -> Mbc3 {
        let rom_bank = 1 & rom.mask();
        Mbc3 {
            rom,
            ram,
            rtc: if with_rtc { Some(Rtc::new()) } else { None },
            rom_bank,
            select: RamSelect::Bank(0),
            ram_enabled: false,
        }
    }

    fn read_external(&self, addr: u16) -> u8 {
        if !self.ram_enabled {
            return OPEN_BUS;
        }

        match (self.select, &self.rtc) {
            (RamSelect::Clock(register), Some(rtc)) => rtc.read(register),
            (RamSelect::Bank(bank), _) if !self.ram.is_empty() => {
                self.ram.read(bank as usize, (addr - EXTERNAL_RAM_START) as usize)
            }
            _ => OPEN_BUS,
        }
    }

    fn write_external(&mut self, addr: u16, data: u8) {
        if !self.ram_enabled {
            debug!("MBC3: Dropping write to {:04x} while RAM is disabled", addr);
            return;
        }

        match (self.select, &mut self.rtc) {
            (RamSelect::Clock(register), Some(rtc)) => rtc.write(register, data),
            (RamSelect::Bank(bank), _) if !self.ram.is_empty() => {
                self.ram.write(bank as usize, (addr - EXTERNAL_RAM_START) as usize, data)
            }
            _ => {}
        }
    }
}

impl Mapper for Mbc3 {
    #[inline]
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=ROM_BANK_0_END => self.rom.read(0, addr as usize),
            ROM_BANK_N_START..=ROM_BANK_N_END => self.rom.read(self.rom_bank, addr as usize),
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END => self.read_external(addr),
            _ => OPEN_BUS,
        }
    }

    #[inline]
    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1fff => {
                self.ram_enabled = data & 0x0f == 0x0a;
            }
            0x2000..=0x3fff => {
                let mut bank = (data & 0b0111_1111) as usize;
                if bank == 0 {
                    bank = 1;
                }
                self.rom_bank = bank & self.rom.mask();
            }
            0x4000..=0x5fff => match data {
                0x00..=0x03 => self.select = RamSelect::Bank(data & self.ram.mask() as u8),
                _ if self.rtc.is_some() && Rtc::is_register(data) => self.select = RamSelect::Clock(data),
                _ => debug!("MBC3: Ignoring RAM select {:02x}", data),
            },
            0x6000..=0x7fff => {
                if let Some(rtc) = &mut self.rtc {
                    rtc.write_latch(data);
                }
            }
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END => self.write_external(addr, data),
            _ => debug!("MBC3: Unmapped write of {:02x} to {:04x}", data, addr),
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
        self.rom_bank as u16
    }

    #[inline]
    fn current_ram_bank(&self) -> u8 {
        match self.select {
            RamSelect::Bank(bank) => bank,
            RamSelect::Clock(register) => register,
        }
    }

    fn rom_bank_count(&self) -> usize {
        self.rom.count()
    }

    fn ram_bank_count(&self) -> usize {
        self.ram.count()
    }

    #[inline]
    fn name(&self) -> String {
        if self.rtc.is_some() {
            String::from("MBC3+RTC")
        } else {
            String::from("MBC3")
        }
    }

    fn tick(&mut self, cycles: usize) {
        if let Some(rtc) = &mut self.rtc {
            rtc.tick(cycles);
        }
    }
}
