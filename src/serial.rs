use crate::lr35902::irq::Irq;
use crate::memory::registers::InterruptFlags;
use crate::memory::{OPEN_BUS, SERIAL_CONTROL_REGISTER, SERIAL_DATA_REGISTER};
use log::trace;

const TRANSFER_START: u8 = 0b1000_0000;
const INTERNAL_CLOCK: u8 = 0b0000_0001;
/// 8 bits at 8192 Hz.
const TRANSFER_CYCLES: usize = 4096;

/// SB/SC registers with no link partner attached: every transfer shifts in $FF.
#[derive(Debug, Clone, Default)]
pub struct Serial {
    data: u8,
    control: u8,
    remaining: Option<usize>,
    output: Vec<u8>,
}

impl Serial {
    pub fn new() -> Serial {
        Serial::default()
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            SERIAL_DATA_REGISTER => self.data,
            SERIAL_CONTROL_REGISTER => self.control | 0b0111_1110,
            _ => OPEN_BUS,
        }
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        match addr {
            SERIAL_DATA_REGISTER => self.data = data,
            SERIAL_CONTROL_REGISTER => {
                self.control = data & (TRANSFER_START | INTERNAL_CLOCK);
                if data & TRANSFER_START != 0 && data & INTERNAL_CLOCK != 0 {
                    trace!("Serial: Sending {:02x}", self.data);
                    self.output.push(self.data);
                    self.remaining = Some(TRANSFER_CYCLES);
                } else {
                    // External clock never ticks without a partner.
                    self.remaining = None;
                }
            }
            _ => {}
        }
    }

    pub fn tick(&mut self, cycles: usize, irq: &mut Irq) {
        let Some(remaining) = self.remaining else {
            return;
        };

        if remaining > cycles {
            self.remaining = Some(remaining - cycles);
            return;
        }

        self.remaining = None;
        self.data = 0xff;
        self.control &= !TRANSFER_START;
        irq.request(InterruptFlags::SERIAL);
    }

    /// Every byte sent with the internal clock, in order.
    pub fn output(&self) -> &[u8] {
        &self.output
    }
}
