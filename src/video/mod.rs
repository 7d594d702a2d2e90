pub mod frame;
pub mod mode;
pub mod palette;
pub mod ppu;
mod sprite;
mod tile;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

pub const VRAM_SIZE: usize = 0x2000;
pub const OAM_SIZE: usize = 0xa0;
pub const SPRITE_COUNT: usize = 40;
pub const MAX_SPRITES_PER_LINE: usize = 10;

/// Offsets into VRAM, which starts at $8000.
pub const TILESET_0_OFFSET: usize = 0x0000;
pub const TILESET_1_OFFSET: usize = 0x1000;
pub const TILEMAP_0_OFFSET: usize = 0x1800;
pub const TILEMAP_1_OFFSET: usize = 0x1c00;

pub const LCD_CONTROL_REGISTER: u16 = 0xff40;
pub const LCD_STATUS_REGISTER: u16 = 0xff41;
pub const SCROLL_Y_REGISTER: u16 = 0xff42;
pub const SCROLL_X_REGISTER: u16 = 0xff43;
pub const SCANLINE_Y_REGISTER: u16 = 0xff44;
pub const SCANLINE_Y_COMPARE_REGISTER: u16 = 0xff45;
pub const DMA_REGISTER: u16 = 0xff46;
pub const BG_PALETTE_REGISTER: u16 = 0xff47;
pub const OBJ0_PALETTE_REGISTER: u16 = 0xff48;
pub const OBJ1_PALETTE_REGISTER: u16 = 0xff49;
pub const WINDOW_Y_REGISTER: u16 = 0xff4a;
pub const WINDOW_X_REGISTER: u16 = 0xff4b;

pub const SCANLINE_CYCLES: usize = 456;
pub const VBLANK_LINES: u8 = 10;
pub const LAST_SCANLINE: u8 = SCREEN_HEIGHT as u8 + VBLANK_LINES - 1;
pub const FRAME_CYCLES: usize = SCANLINE_CYCLES * (LAST_SCANLINE as usize + 1);
