use crate::lr35902::T_CYCLES_PER_SECOND;

const SECONDS: u8 = 0x08;
const MINUTES: u8 = 0x09;
const HOURS: u8 = 0x0a;
const DAYS_LOW: u8 = 0x0b;
const DAYS_HIGH: u8 = 0x0c;

const HALT_BIT: u8 = 0b0100_0000;
const CARRY_BIT: u8 = 0b1000_0000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counters {
    seconds: u8,
    minutes: u8,
    hours: u8,
    days: u16,
    halt: bool,
    carry: bool,
}

impl Counters {
    fn control(&self) -> u8 {
        let mut control = ((self.days >> 8) as u8) & 0x01;
        if self.halt {
            control |= HALT_BIT;
        }
        if self.carry {
            control |= CARRY_BIT;
        }
        control
    }
}

/// MBC3 real-time clock, driven by emulated cycles.
#[derive(Debug, Clone, Default)]
pub struct Rtc {
    live: Counters,
    latched: Counters,
    subsecond_cycles: usize,
    latch_armed: bool,
}

impl Rtc {
    pub fn new() -> Rtc {
        Rtc::default()
    }

    pub fn is_register(select: u8) -> bool {
        (SECONDS..=DAYS_HIGH).contains(&select)
    }

    /// Latching happens on a $00 -> $01 write sequence.
    pub fn write_latch(&mut self, data: u8) {
        if self.latch_armed && data == 0x01 {
            self.latched = self.live;
        }
        self.latch_armed = data == 0x00;
    }

    pub fn read(&self, select: u8) -> u8 {
        match select {
            SECONDS => self.latched.seconds,
            MINUTES => self.latched.minutes,
            HOURS => self.latched.hours,
            DAYS_LOW => (self.latched.days & 0xff) as u8,
            DAYS_HIGH => self.latched.control(),
            _ => 0xff,
        }
    }

    pub fn write(&mut self, select: u8, data: u8) {
        match select {
            SECONDS => {
                self.live.seconds = data & 0x3f;
                self.subsecond_cycles = 0;
            }
            MINUTES => self.live.minutes = data & 0x3f,
            HOURS => self.live.hours = data & 0x1f,
            DAYS_LOW => self.live.days = (self.live.days & 0x100) | data as u16,
            DAYS_HIGH => {
                self.live.days = (self.live.days & 0xff) | (((data & 0x01) as u16) << 8);
                self.live.halt = data & HALT_BIT != 0;
                self.live.carry = data & CARRY_BIT != 0;
            }
            _ => {}
        }
        self.latched = self.live;
    }

    pub fn tick(&mut self, cycles: usize) {
        if self.live.halt {
            return;
        }

        self.subsecond_cycles += cycles;
        while self.subsecond_cycles >= T_CYCLES_PER_SECOND {
            self.subsecond_cycles -= T_CYCLES_PER_SECOND;
            self.advance_second();
        }
    }

    fn advance_second(&mut self) {
        // Out-of-range values written by software keep counting up to the
        // register width before wrapping, without carrying into the next unit.
        if self.live.seconds != 59 {
            self.live.seconds = (self.live.seconds + 1) & 0x3f;
            return;
        }
        self.live.seconds = 0;

        if self.live.minutes != 59 {
            self.live.minutes = (self.live.minutes + 1) & 0x3f;
            return;
        }
        self.live.minutes = 0;

        if self.live.hours != 23 {
            self.live.hours = (self.live.hours + 1) & 0x1f;
            return;
        }
        self.live.hours = 0;

        if self.live.days == 0x1ff {
            self.live.days = 0;
            self.live.carry = true;
        } else {
            self.live.days += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_show_latched_values_only() {
        let mut rtc = Rtc::new();
        rtc.tick(T_CYCLES_PER_SECOND * 3);
        assert_eq!(rtc.read(SECONDS), 0);

        rtc.write_latch(0x00);
        rtc.write_latch(0x01);
        assert_eq!(rtc.read(SECONDS), 3);

        rtc.tick(T_CYCLES_PER_SECOND);
        assert_eq!(rtc.read(SECONDS), 3);
    }

    #[test]
    fn day_counter_overflow_sets_carry() {
        let mut rtc = Rtc::new();
        rtc.write(DAYS_LOW, 0xff);
        rtc.write(DAYS_HIGH, 0x01);
        rtc.write(HOURS, 23);
        rtc.write(MINUTES, 59);
        rtc.write(SECONDS, 59);

        rtc.tick(T_CYCLES_PER_SECOND);
        rtc.write_latch(0x00);
        rtc.write_latch(0x01);

        assert_eq!(rtc.read(SECONDS), 0);
        assert_eq!(rtc.read(MINUTES), 0);
        assert_eq!(rtc.read(HOURS), 0);
        assert_eq!(rtc.read(DAYS_LOW), 0);
        assert_eq!(rtc.read(DAYS_HIGH), CARRY_BIT);
    }

    #[test]
    fn halted_clock_does_not_advance() {
        let mut rtc = Rtc::new();
        rtc.write(DAYS_HIGH, HALT_BIT);
        rtc.tick(T_CYCLES_PER_SECOND * 10);
        rtc.write_latch(0x00);
        rtc.write_latch(0x01);
        assert_eq!(rtc.read(SECONDS), 0);
    }
}
