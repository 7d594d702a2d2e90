use bitflags::bitflags;

bitflags! {
    /// The F register. The low nibble always reads zero; writes truncate it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u8 {
        const ZERO       = 0b1000_0000;
        /// Last ALU op was a subtraction; DAA reads it.
        const SUBTRACT   = 0b0100_0000;
        /// Carry out of bit 3, or bit 11 for 16-bit adds.
        const HALF_CARRY = 0b0010_0000;
        const CARRY      = 0b0001_0000;
    }
}

#[derive(Debug, Clone)]
pub struct Registers {
    pub a: u8,
    pub f: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    /// Register contents the DMG boot ROM leaves behind when it jumps to $0100.
    pub fn post_boot() -> Registers {
        Registers {
            a: 0x01,
            f: Flags::ZERO | Flags::HALF_CARRY | Flags::CARRY,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xd8,
            h: 0x01,
            l: 0x4d,
            sp: 0xfffe,
            pc: 0x0100,
        }
    }
}

impl Default for Registers {
    fn default() -> Registers {
        Registers {
            a: 0,
            f: Flags::empty(),
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            sp: 0,
            pc: 0,
        }
    }
}
