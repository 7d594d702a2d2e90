use crate::memory::registers::InterruptFlags;

#[derive(Debug, Clone, Default)]
pub struct Ime {
    pub enabled: bool,
    pub enable_pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vector {
    VBlank,
    Stat,
    Timer,
    Serial,
    Joypad,
}

impl Vector {
    /// Lowest bit position wins.
    pub fn from_flags(flags: InterruptFlags) -> Option<Vector> {
        if flags.contains(InterruptFlags::VBLANK) {
            Some(Vector::VBlank)
        } else if flags.contains(InterruptFlags::LCD_STAT) {
            Some(Vector::Stat)
        } else if flags.contains(InterruptFlags::TIMER) {
            Some(Vector::Timer)
        } else if flags.contains(InterruptFlags::SERIAL) {
            Some(Vector::Serial)
        } else if flags.contains(InterruptFlags::JOYPAD) {
            Some(Vector::Joypad)
        } else {
            None
        }
    }

    pub fn to_address(self) -> u16 {
        match self {
            Vector::VBlank => 0x0040,
            Vector::Stat => 0x0048,
            Vector::Timer => 0x0050,
            Vector::Serial => 0x0058,
            Vector::Joypad => 0x0060,
        }
    }

    pub fn to_flag(self) -> InterruptFlags {
        match self {
            Vector::VBlank => InterruptFlags::VBLANK,
            Vector::Stat => InterruptFlags::LCD_STAT,
            Vector::Timer => InterruptFlags::TIMER,
            Vector::Serial => InterruptFlags::SERIAL,
            Vector::Joypad => InterruptFlags::JOYPAD,
        }
    }
}

impl std::fmt::Display for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Vector::VBlank => write!(f, "VBLANK"),
            Vector::Stat => write!(f, "STAT"),
            Vector::Timer => write!(f, "TIMER"),
            Vector::Serial => write!(f, "SERIAL"),
            Vector::Joypad => write!(f, "JOYPAD"),
        }
    }
}

/// Interrupt enable ($FFFF) and request ($FF0F) registers.
#[derive(Debug, Clone)]
pub struct Irq {
    enable: u8,
    flags: InterruptFlags,
}

impl Irq {
    pub fn new() -> Irq {
        Irq {
            enable: 0,
            flags: InterruptFlags::empty(),
        }
    }

    pub fn request(&mut self, flag: InterruptFlags) {
        self.flags |= flag;
    }

    pub fn acknowledge(&mut self, vector: Vector) {
        self.flags.remove(vector.to_flag());
    }

    /// Requests that are also enabled, regardless of IME.
    pub fn pending(&self) -> InterruptFlags {
        InterruptFlags::from_bits_truncate(self.enable) & self.flags
    }

    pub fn has_pending(&self) -> bool {
        !self.pending().is_empty()
    }

    pub fn next_vector(&self) -> Option<Vector> {
        Vector::from_flags(self.pending())
    }

    pub fn read_flags(&self) -> u8 {
        self.flags.bits() | 0b1110_0000
    }

    pub fn write_flags(&mut self, data: u8) {
        self.flags = InterruptFlags::from_bits_truncate(data);
    }

    pub fn read_enable(&self) -> u8 {
        self.enable
    }

    pub fn write_enable(&mut self, data: u8) {
        self.enable = data;
    }
}

impl Default for Irq {
    fn default() -> Irq {
        Irq::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_bit_has_priority() {
        let mut irq = Irq::new();
        irq.write_enable(0x1f);
        irq.request(InterruptFlags::JOYPAD);
        irq.request(InterruptFlags::TIMER);
        assert_eq!(irq.next_vector(), Some(Vector::Timer));

        irq.request(InterruptFlags::VBLANK);
        assert_eq!(irq.next_vector(), Some(Vector::VBlank));

        irq.acknowledge(Vector::VBlank);
        assert_eq!(irq.next_vector(), Some(Vector::Timer));
    }

    #[test]
    fn disabled_requests_are_not_pending() {
        let mut irq = Irq::new();
        irq.request(InterruptFlags::SERIAL);
        assert!(!irq.has_pending());
        assert_eq!(irq.read_flags(), 0b1110_1000);

        irq.write_enable(InterruptFlags::SERIAL.bits());
        assert_eq!(irq.next_vector(), Some(Vector::Serial));
    }
}
