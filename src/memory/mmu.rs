use crate::joypad::Joypad;
use crate::lr35902::irq::Irq;
use crate::lr35902::timer::Timer;
use crate::memory::cartridge::Cartridge;
use crate::memory::*;
use crate::serial::Serial;
use crate::video::ppu::Ppu;
use crate::video::{LCD_CONTROL_REGISTER, OAM_SIZE, WINDOW_X_REGISTER};
use log::debug;

// The last instruction of the boot ROM unmaps it. Execution continues
// normally, thus entering the cartridge entrypoint at $100.
const BOOTROM_END: u16 = 0x00ff;

/// Logical region an address decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Rom,
    Vram,
    ExternalRam,
    Wram,
    Echo,
    Oam,
    Prohibited,
    Io,
    Hram,
    InterruptEnable,
}

impl Region {
    pub fn decode(addr: u16) -> Region {
        match addr {
            ROM_BANK_0_START..=ROM_BANK_N_END => Region::Rom,
            VRAM_START..=VRAM_END => Region::Vram,
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END => Region::ExternalRam,
            WRAM_START..=WRAM_END => Region::Wram,
            ECHO_RAM_START..=ECHO_RAM_END => Region::Echo,
            OAM_START..=OAM_END => Region::Oam,
            PROHIBITED_START..=PROHIBITED_END => Region::Prohibited,
            IO_START..=IO_END => Region::Io,
            HRAM_START..=HRAM_END => Region::Hram,
            INTERRUPT_ENABLE_REGISTER => Region::InterruptEnable,
        }
    }
}

/// Address Space Router. Owns every memory-mapped component.
#[derive(Clone)]
pub struct Mmu {
    memory: Vec<u8>,
    bootrom: Vec<u8>,
    bootrom_enabled: bool,
    cartridge: Cartridge,
    pub ppu: Ppu,
    pub timer: Timer,
    pub serial: Serial,
    pub joypad: Joypad,
    pub irq: Irq,
}

impl Mmu {
    /// An empty `bootrom` starts with the overlay unmapped.
    pub fn new(cartridge: Cartridge, bootrom: Vec<u8>, ppu: Ppu, joypad: Joypad) -> Mmu {
        Mmu {
            memory: vec![0; 0x10000],
            bootrom_enabled: !bootrom.is_empty(),
            bootrom,
            cartridge,
            ppu,
            timer: Timer::new(),
            serial: Serial::new(),
            joypad,
            irq: Irq::new(),
        }
    }

    /// I/O state the boot ROM leaves behind.
    pub fn apply_post_boot(&mut self) {
        self.bootrom_enabled = false;
        self.ppu.apply_post_boot();
        self.irq.write_flags(0x01);
    }

    pub fn read(&self, addr: u16) -> u8 {
        match Region::decode(addr) {
            Region::Rom if addr <= BOOTROM_END && self.bootrom_enabled => {
                self.bootrom.get(addr as usize).copied().unwrap_or(OPEN_BUS)
            }
            Region::Rom | Region::ExternalRam => self.cartridge.read(addr),
            Region::Vram => self.ppu.read_vram(addr),
            Region::Oam => self.ppu.read_oam(addr),
            Region::Echo => self.memory[(addr - 0x2000) as usize],
            Region::Prohibited => OPEN_BUS,
            Region::Io => self.read_io(addr),
            Region::InterruptEnable => self.irq.read_enable(),
            Region::Wram | Region::Hram => self.memory[addr as usize],
        }
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        match Region::decode(addr) {
            Region::Rom | Region::ExternalRam => self.cartridge.write(addr, data),
            Region::Vram => self.ppu.write_vram(addr, data),
            Region::Oam => self.ppu.write_oam(addr, data),
            Region::Echo => self.memory[(addr - 0x2000) as usize] = data,
            Region::Prohibited => {}
            Region::Io => self.write_io(addr, data),
            Region::InterruptEnable => self.irq.write_enable(data),
            Region::Wram | Region::Hram => self.memory[addr as usize] = data,
        }
    }

    pub fn read16(&self, addr: u16) -> u16 {
        let lo = self.read(addr);
        let hi = self.read(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    pub fn write16(&mut self, addr: u16, data: u16) {
        let [lo, hi] = data.to_le_bytes();
        self.write(addr, lo);
        self.write(addr.wrapping_add(1), hi);
    }

    fn read_io(&self, addr: u16) -> u8 {
        match addr {
            JOYPAD_REGISTER => self.joypad.read(),
            SERIAL_DATA_REGISTER | SERIAL_CONTROL_REGISTER => self.serial.read(addr),
            DIV_REGISTER..=TAC_REGISTER => self.timer.read(addr),
            INTERRUPT_FLAGS_REGISTER => self.irq.read_flags(),
            LCD_CONTROL_REGISTER..=WINDOW_X_REGISTER => self.ppu.read_register(addr),
            BOOTROM_MAPPER_REGISTER => OPEN_BUS,
            _ => self.memory[addr as usize],
        }
    }

    fn write_io(&mut self, addr: u16, data: u8) {
        match addr {
            JOYPAD_REGISTER => self.joypad.write(data),
            SERIAL_DATA_REGISTER | SERIAL_CONTROL_REGISTER => self.serial.write(addr, data),
            DIV_REGISTER..=TAC_REGISTER => self.timer.write(addr, data),
            INTERRUPT_FLAGS_REGISTER => self.irq.write_flags(data),
            OAM_DMA_REGISTER => {
                self.ppu.write_register(addr, data);
                self.dma(data);
            }
            LCD_CONTROL_REGISTER..=WINDOW_X_REGISTER => self.ppu.write_register(addr, data),
            BOOTROM_MAPPER_REGISTER => {
                if data != 0 && self.bootrom_enabled {
                    debug!("Unmapping boot ROM");
                    self.bootrom_enabled = false;
                }
            }
            _ => self.memory[addr as usize] = data,
        }
    }

    /// Copies 160 bytes from `page << 8` into OAM in one go.
    fn dma(&mut self, page: u8) {
        // Pages above $DF hit the echo of work RAM.
        let page = if page > 0xdf { page - 0x20 } else { page };
        let source = (page as u16) << 8;
        debug!("OAM DMA from {:04x}", source);
        for index in 0..OAM_SIZE {
            let addr = source + index as u16;
            let data = match Region::decode(addr) {
                Region::Vram => self.ppu.dma_read_vram(addr),
                _ => self.read(addr),
            };
            self.ppu.dma_write_oam(index, data);
        }
    }

    /// Advances the display controller by `cycles`.
    pub fn step_display(&mut self, cycles: usize) {
        self.ppu.step(cycles, &mut self.irq);
    }

    /// Advances timer, serial, joypad sampling and cartridge clocks by `cycles`.
    pub fn step_io(&mut self, cycles: usize) {
        self.timer.tick(cycles, &mut self.irq);
        self.serial.tick(cycles, &mut self.irq);
        self.joypad.tick(&mut self.irq);
        self.cartridge.tick(cycles);
    }

    pub fn is_bootrom_mapped(&self) -> bool {
        self.bootrom_enabled
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }

    pub fn current_rom_bank(&self) -> u16 {
        self.cartridge.mapper().current_rom_bank()
    }
}
