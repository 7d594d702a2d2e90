use bitflags::bitflags;

bitflags! {
    /// IF ($FF0F) and IE ($FFFF). Bit order is also dispatch priority, VBLANK
    /// first; each source's vector is $40 + 8 * bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InterruptFlags: u8 {
        const VBLANK    = 0b00001;
        const LCD_STAT  = 0b00010;
        const TIMER     = 0b00100;
        const SERIAL    = 0b01000;
        const JOYPAD    = 0b10000;
    }
}

bitflags! {
    /// LCDC ($FF40).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LcdControl: u8 {
        /// Clear blanks background and window to white on DMG.
        const BG_DISPLAY = 0b0000_0001;
        const OBJ_DISPLAY = 0b0000_0010;
        /// 8x16 sprites when set.
        const OBJ_SIZE = 0b0000_0100;
        /// Background map at $9C00 instead of $9800.
        const BG_TILE_MAP = 0b0000_1000;
        /// Unsigned tile indices from $8000; otherwise signed around $9000.
        const BG_TILE_DATA = 0b0001_0000;
        const WINDOW_DISPLAY = 0b0010_0000;
        /// Window map at $9C00 instead of $9800.
        const WINDOW_TILE_MAP = 0b0100_0000;
        /// Turning this off resets LY and parks the controller in mode 0.
        const LCD_DISPLAY = 0b1000_0000;
    }
}

bitflags! {
    /// The writable interrupt-select bits of STAT. Mode and coincidence bits
    /// are owned by the display controller and composed on read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LcdStatus: u8 {
        const HBLANK_INT = 0b0000_1000;
        const VBLANK_INT = 0b0001_0000;
        const OAM_INT    = 0b0010_0000;
        const LYC_INT    = 0b0100_0000;
    }
}

bitflags! {
    /// Byte 3 of an OAM entry. The low nibble is CGB-only and ignored here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SpriteAttributes: u8 {
        /// OBP1 instead of OBP0.
        const PALETTE  = 0b0001_0000;
        const FLIP_X   = 0b0010_0000;
        const FLIP_Y   = 0b0100_0000;
        /// Hidden behind background colors 1-3.
        const PRIORITY = 0b1000_0000;
    }
}

impl From<u8> for InterruptFlags {
    fn from(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }
}

impl From<u8> for LcdControl {
    fn from(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }
}

impl From<u8> for LcdStatus {
    fn from(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }
}

impl From<u8> for SpriteAttributes {
    fn from(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }
}
