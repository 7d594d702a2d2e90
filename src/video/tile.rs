use crate::video::{TILESET_0_OFFSET, TILESET_1_OFFSET};

/// One 8-pixel row of a tile, as two bit planes.
#[derive(Debug, Clone, Copy)]
pub struct TileLine {
    lo: u8,
    hi: u8,
}

impl TileLine {
    /// `tile_offset` is the VRAM offset of the tile's first byte.
    pub fn fetch(vram: &[u8], tile_offset: usize, row: usize) -> TileLine {
        TileLine {
            lo: vram[tile_offset + row * 2],
            hi: vram[tile_offset + row * 2 + 1],
        }
    }

    /// Color number (0-3) of pixel `x`, leftmost first.
    pub fn color(&self, x: usize) -> u8 {
        let bit = 7 - (x & 7);
        (((self.hi >> bit) & 1) << 1) | ((self.lo >> bit) & 1)
    }
}

/// Resolves a background/window tile index to its VRAM offset.
pub fn tile_data_offset(index: u8, unsigned_addressing: bool) -> usize {
    if unsigned_addressing {
        TILESET_0_OFFSET + index as usize * 16
    } else {
        (TILESET_1_OFFSET as isize + (index as i8 as isize) * 16) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_addressing_is_centered_on_9000() {
        assert_eq!(tile_data_offset(0x00, false), 0x1000);
        assert_eq!(tile_data_offset(0x80, false), 0x0800);
        assert_eq!(tile_data_offset(0xff, false), 0x0ff0);
        assert_eq!(tile_data_offset(0xff, true), 0x0ff0);
        assert_eq!(tile_data_offset(0x01, true), 0x0010);
    }

    #[test]
    fn color_combines_both_planes() {
        let line = TileLine { lo: 0b1010_0000, hi: 0b1100_0000 };
        assert_eq!(line.color(0), 3);
        assert_eq!(line.color(1), 2);
        assert_eq!(line.color(2), 1);
        assert_eq!(line.color(3), 0);
    }
}
