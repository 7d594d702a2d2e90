/// Packed `0xAARRGGBB` pixel.
pub type Color = u32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Palette {
    #[default]
    White,
    LightGray,
    DarkGray,
    Black,
}

impl Palette {
    /// Maps a 2-bit color number through a BGP/OBP0/OBP1 register.
    pub fn from_register(register: u8, color: u8) -> Palette {
        match (register >> ((color & 0b11) * 2)) & 0b11 {
            0b00 => Palette::White,
            0b01 => Palette::LightGray,
            0b10 => Palette::DarkGray,
            _ => Palette::Black,
        }
    }
}

impl From<Palette> for Color {
    fn from(shade: Palette) -> Color {
        match shade {
            Palette::White => 0xffff_ffff,
            Palette::LightGray => 0xffaa_aaaa,
            Palette::DarkGray => 0xff55_5555,
            Palette::Black => 0xff00_0000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_boot_background_palette() {
        // BGP $FC maps color 0 to white and 1-3 to black.
        assert_eq!(Palette::from_register(0xfc, 0), Palette::White);
        assert_eq!(Palette::from_register(0xfc, 1), Palette::Black);
        assert_eq!(Palette::from_register(0xe4, 2), Palette::DarkGray);
        assert_eq!(Color::from(Palette::LightGray), 0xffaaaaaa);
    }
}
