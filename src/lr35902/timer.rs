use crate::lr35902::irq::Irq;
use crate::memory::registers::InterruptFlags;
use crate::memory::{DIV_REGISTER, OPEN_BUS, TAC_REGISTER, TIMA_REGISTER, TMA_REGISTER};

const TAC_ENABLE: u8 = 0b100;

/// DIV/TIMA/TMA/TAC block at $FF04-$FF07.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    /// Internal divider; DIV is its upper byte.
    divider: u16,
    tima: u8,
    tma: u8,
    tac: u8,
    cycles: usize,
}

impl Timer {
    pub fn new() -> Timer {
        Timer::default()
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            DIV_REGISTER => (self.divider >> 8) as u8,
            TIMA_REGISTER => self.tima,
            TMA_REGISTER => self.tma,
            TAC_REGISTER => self.tac | 0b1111_1000,
            _ => OPEN_BUS,
        }
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        match addr {
            DIV_REGISTER => self.reset_divider(),
            TIMA_REGISTER => self.tima = data,
            TMA_REGISTER => self.tma = data,
            TAC_REGISTER => self.tac = data & 0b111,
            _ => {}
        }
    }

    pub fn reset_divider(&mut self) {
        self.divider = 0;
    }

    #[inline]
    fn period(&self) -> usize {
        match self.tac & 0b11 {
            0b00 => 1024,
            0b01 => 16,
            0b10 => 64,
            _ => 256,
        }
    }

    pub fn tick(&mut self, cycles: usize, irq: &mut Irq) {
        self.divider = self.divider.wrapping_add(cycles as u16);

        if self.tac & TAC_ENABLE == 0 {
            return;
        }

        self.cycles += cycles;
        let period = self.period();
        while self.cycles >= period {
            self.cycles -= period;
            if self.tima == 0xff {
                self.tima = self.tma;
                irq.request(InterruptFlags::TIMER);
            } else {
                self.tima += 1;
            }
        }
    }
}
