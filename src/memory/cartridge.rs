use crate::error::{DmgError, HeaderTooShortSnafu, UnsupportedCartridgeSnafu, UnsupportedRamSizeSnafu, UnsupportedRomSizeSnafu};
use crate::memory::banks::Banks;
use crate::memory::mapper::mbc3::Mbc3;
use crate::memory::mapper::mbc5::Mbc5;
use crate::memory::mapper::rom::Rom;
use crate::memory::mapper::Mapper;
use crate::memory::{RAM_BANK_SIZE, ROM_BANK_SIZE};
use log::{info, warn};
use snafu::ensure;

pub const HEADER_END: usize = 0x150;

const TITLE_START: usize = 0x134;
const TITLE_END: usize = 0x143;
const CGB_FLAG: usize = 0x143;
const CARTRIDGE_TYPE: usize = 0x147;
const ROM_SIZE: usize = 0x148;
const RAM_SIZE: usize = 0x149;
const DESTINATION: usize = 0x14a;
const OLD_LICENSEE: usize = 0x14b;
const VERSION: usize = 0x14c;
const HEADER_CHECKSUM: usize = 0x14d;
const GLOBAL_CHECKSUM: usize = 0x14e;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub title: String,
    pub cgb_flag: u8,
    pub cartridge_type: u8,
    pub rom_size_code: u8,
    pub ram_size_code: u8,
    pub destination: u8,
    pub old_licensee: u8,
    pub version: u8,
    pub header_checksum: u8,
    pub global_checksum: u16,
}

impl Header {
    pub fn parse(image: &[u8]) -> Result<Header, DmgError> {
        ensure!(image.len() >= HEADER_END, HeaderTooShortSnafu { length: image.len() });

        let title = &image[TITLE_START..TITLE_END];
        let title = match title.iter().position(|&b| b == 0) {
            Some(end) => &title[..end],
            None => title,
        };

        Ok(Header {
            title: String::from_utf8_lossy(title).trim().to_string(),
            cgb_flag: image[CGB_FLAG],
            cartridge_type: image[CARTRIDGE_TYPE],
            rom_size_code: image[ROM_SIZE],
            ram_size_code: image[RAM_SIZE],
            destination: image[DESTINATION],
            old_licensee: image[OLD_LICENSEE],
            version: image[VERSION],
            header_checksum: image[HEADER_CHECKSUM],
            global_checksum: u16::from_be_bytes([image[GLOBAL_CHECKSUM], image[GLOBAL_CHECKSUM + 1]]),
        })
    }

    /// Checksum over $0134-$014C as computed by the boot ROM.
    pub fn compute_checksum(image: &[u8]) -> u8 {
        image[TITLE_START..HEADER_CHECKSUM]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1))
    }

    pub fn rom_bank_count(&self) -> Result<usize, DmgError> {
        match self.rom_size_code {
            0x00..=0x08 => Ok(2 << self.rom_size_code),
            code => UnsupportedRomSizeSnafu { code }.fail(),
        }
    }

    pub fn ram_bank_count(&self) -> Result<usize, DmgError> {
        match self.ram_size_code {
            0x00 => Ok(0),
            // 2KB parts still get a whole bank.
            0x01 | 0x02 => Ok(1),
            0x03 => Ok(4),
            0x04 => Ok(16),
            0x05 => Ok(8),
            code => UnsupportedRamSizeSnafu { code }.fail(),
        }
    }

    pub fn has_ram(&self) -> bool {
        matches!(self.cartridge_type, 0x08 | 0x09 | 0x10 | 0x12 | 0x13 | 0x1a | 0x1b | 0x1d | 0x1e)
    }

    pub fn has_battery(&self) -> bool {
        matches!(self.cartridge_type, 0x09 | 0x0f | 0x10 | 0x13 | 0x1b | 0x1e)
    }

    pub fn has_rtc(&self) -> bool {
        matches!(self.cartridge_type, 0x0f | 0x10)
    }

    pub fn has_rumble(&self) -> bool {
        matches!(self.cartridge_type, 0x1c..=0x1e)
    }

    pub fn is_cgb(&self) -> bool {
        self.cgb_flag & 0x80 != 0
    }
}

/// Cartridge Controller: header, bank storage and the installed bank controller.
#[derive(Clone)]
pub struct Cartridge {
    header: Header,
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    pub fn from_image(image: Vec<u8>) -> Result<Cartridge, DmgError> {
        let header = Header::parse(&image)?;

        let checksum = Header::compute_checksum(&image);
        if checksum != header.header_checksum {
            warn!(
                "Header checksum mismatch: expected {:02x}, computed {:02x}",
                header.header_checksum, checksum
            );
        }

        let rom_banks = header.rom_bank_count()?;
        let ram_banks = if header.has_ram() { header.ram_bank_count()? } else { 0 };

        if image.len() < rom_banks * ROM_BANK_SIZE {
            warn!(
                "ROM image is {} bytes but the header declares {}, padding with $ff",
                image.len(),
                rom_banks * ROM_BANK_SIZE
            );
        }
        // Anything beyond the declared size is unreachable through the mapper.
        let rom = Banks::from_image(image, rom_banks, ROM_BANK_SIZE, 0xff);
        let ram = Banks::new(ram_banks, RAM_BANK_SIZE);

        let mapper: Box<dyn Mapper> = match header.cartridge_type {
            0x00 | 0x08 | 0x09 => Box::new(Rom::new(rom, ram)),
            0x0f..=0x13 => Box::new(Mbc3::new(rom, ram, header.has_rtc())),
            0x19..=0x1b => Box::new(Mbc5::new(rom, ram)),
            0x1c..=0x1e => Box::new(Mbc5::with_rumble(rom, ram)),
            cartridge_type => return UnsupportedCartridgeSnafu { cartridge_type }.fail(),
        };

        info!(
            "Loaded \"{}\" ({}, {} ROM banks, {} RAM banks{})",
            header.title,
            mapper.name(),
            rom_banks,
            ram_banks,
            if header.has_battery() { ", battery" } else { "" }
        );
        if header.is_cgb() {
            info!("Cartridge advertises Game Boy Color features, running in DMG mode");
        }

        Ok(Cartridge { header, mapper })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn mapper(&self) -> &dyn Mapper {
        self.mapper.as_ref()
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.mapper.read(addr)
    }

    #[inline]
    pub fn write(&mut self, addr: u16, data: u8) {
        self.mapper.write(addr, data)
    }

    #[inline]
    pub fn tick(&mut self, cycles: usize) {
        self.mapper.tick(cycles)
    }

    pub fn has_battery(&self) -> bool {
        self.header.has_battery()
    }

    pub fn dump_ram(&self) -> Vec<u8> {
        self.mapper.dump_ram()
    }

    pub fn load_ram(&mut self, ram: &[u8]) -> Result<(), DmgError> {
        self.mapper.load_ram(ram)
    }
}

/// Zero-filled image with a valid header, for tests elsewhere in the crate.
#[cfg(test)]
pub(crate) fn test_image(cartridge_type: u8, rom_code: u8, ram_code: u8) -> Vec<u8> {
    let mut image = vec![0u8; ROM_BANK_SIZE * (2 << rom_code)];
    image[TITLE_START..TITLE_START + 6].copy_from_slice(b"TETRIS");
    image[CARTRIDGE_TYPE] = cartridge_type;
    image[ROM_SIZE] = rom_code;
    image[RAM_SIZE] = ram_code;
    image[HEADER_CHECKSUM] = Header::compute_checksum(&image);
    image
}
