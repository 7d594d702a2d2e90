use crate::memory::registers::SpriteAttributes;

#[derive(Debug, Clone, Copy)]
pub struct Sprite {
    /// Screen coordinates of the top-left corner.
    pub x: i16,
    pub y: i16,
    pub tile_index: u8,
    pub attributes: SpriteAttributes,
    pub oam_index: usize,
}

impl Sprite {
    pub fn from_oam(oam: &[u8], index: usize) -> Sprite {
        let entry = &oam[index * 4..index * 4 + 4];

        Sprite {
            y: entry[0] as i16 - 16,
            x: entry[1] as i16 - 8,
            tile_index: entry[2],
            attributes: SpriteAttributes::from(entry[3]),
            oam_index: index,
        }
    }

    pub fn is_visible_on_scanline(&self, scanline: u8, height: i16) -> bool {
        let scanline = scanline as i16;
        scanline >= self.y && scanline < self.y + height
    }
}
