use crate::error::DmgError;
use crate::memory::banks::Banks;
use crate::memory::mapper::{load_banks, Mapper};
use crate::memory::{EXTERNAL_RAM_END, EXTERNAL_RAM_START, OPEN_BUS, ROM_BANK_0_END, ROM_BANK_N_END, ROM_BANK_N_START};
use log::{debug, info};

const RUMBLE_MOTOR: u8 = 0b1000;

#[derive(Clone)]
pub struct Mbc5 {
    rom: Banks,
    ram: Banks,
    /// 9-bit bank number as written by software, before masking.
    rom_select: u16,
    ram_bank: u8,
    ram_enabled: bool,
    allow_rumble: bool,
    rumbling: bool,
}

impl Mbc5 {
    pub fn new(rom: Banks, ram: Banks) -> Mbc5 {
        Mbc5 {
            rom,
            ram,
            rom_select: 1,
            ram_bank: 0,
            ram_enabled: false,
            allow_rumble: false,
            rumbling: false,
        }
    }

    pub fn with_rumble(rom: Banks, ram: Banks) -> Mbc5 {
        Mbc5 {
            allow_rumble: true,
            ..Mbc5::new(rom, ram)
        }
    }

    pub fn is_rumbling(&self) -> bool {
        self.rumbling
    }

    #[inline]
    fn rom_bank(&self) -> usize {
        self.rom_select as usize & self.rom.mask()
    }
}

impl Mapper for Mbc5 {
    #[inline]
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=ROM_BANK_0_END => self.rom.read(0, addr as usize),
            ROM_BANK_N_START..=ROM_BANK_N_END => self.rom.read(self.rom_bank(), addr as usize),
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END if self.ram_enabled && !self.ram.is_empty() => {
                self.ram.read(self.ram_bank as usize, (addr - EXTERNAL_RAM_START) as usize)
            }
            _ => OPEN_BUS,
        }
    }

    #[inline]
    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1fff => {
                self.ram_enabled = data & 0x0f == 0x0a;
            }
            0x2000..=0x2fff => {
                self.rom_select = (self.rom_select & 0x100) | data as u16;
            }
            0x3000..=0x3fff => {
                self.rom_select = (self.rom_select & 0xff) | ((data as u16 & 0x1) << 8);
            }
            0x4000..=0x5fff => {
                let select = if self.allow_rumble {
                    let rumbling = data & RUMBLE_MOTOR != 0;
                    if rumbling != self.rumbling {
                        info!("MBC5: Rumble motor {}", if rumbling { "on" } else { "off" });
                        self.rumbling = rumbling;
                    }
                    data & 0x07
                } else {
                    data & 0x0f
                };
                self.ram_bank = select & self.ram.mask() as u8;
            }
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END if self.ram_enabled && !self.ram.is_empty() => {
                self.ram.write(self.ram_bank as usize, (addr - EXTERNAL_RAM_START) as usize, data)
            }
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END => {
                debug!("MBC5: Dropping write to RAM bank {} while RAM is disabled", self.ram_bank);
            }
            _ => debug!("MBC5: Unmapped write of {:02x} to {:04x}", data, addr),
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
        self.rom_bank() as u16
    }

    #[inline]
    fn current_ram_bank(&self) -> u8 {
        self.ram_bank
    }

    fn rom_bank_count(&self) -> usize {
        self.rom.count()
    }

    fn ram_bank_count(&self) -> usize {
        self.ram.count()
    }

    #[inline]
    fn name(&self) -> String {
        if !self.allow_rumble {
            String::from("MBC5")
        } else {
            String::from("MBC5+RUMBLE")
        }
    }
}
