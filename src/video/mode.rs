use crate::video::SCANLINE_CYCLES;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    HBlank,  // H-Blank
    VBlank,  // V-Blank
    OamScan, // OAM Scan
    Drawing, // Drawing
}

impl Mode {
    /// Mode number as reported in STAT bits 0-1.
    pub fn as_u8(self) -> u8 {
        match self {
            Mode::HBlank => 0,
            Mode::VBlank => 1,
            Mode::OamScan => 2,
            Mode::Drawing => 3,
        }
    }

    /// Cycles spent in this mode per scanline.
    pub fn cycles(self) -> usize {
        match self {
            Mode::OamScan => 80,
            Mode::Drawing => 172,
            Mode::HBlank => 204,
            Mode::VBlank => SCANLINE_CYCLES,
        }
    }
}
