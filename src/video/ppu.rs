use crate::lr35902::irq::Irq;
use crate::memory::registers::{InterruptFlags, LcdControl, LcdStatus, SpriteAttributes};
use crate::memory::{OAM_START, OPEN_BUS, VRAM_START};
use crate::video::frame::{Frame, FrameHandoff};
use crate::video::mode::Mode;
use crate::video::palette::Palette;
use crate::video::sprite::Sprite;
use crate::video::tile::{tile_data_offset, TileLine};
use crate::video::*;
use log::debug;

/// Window X values above this put the window off-screen.
const WINDOW_X_MAX: u8 = 166;

#[derive(Clone)]
pub struct Ppu {
    vram: Vec<u8>,
    oam: Vec<u8>,
    lcdc: LcdControl,
    stat: LcdStatus,
    scy: u8,
    scx: u8,
    ly: u8,
    lyc: u8,
    dma: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,
    mode: Mode,
    mode_clock: usize,
    window_line: u8,
    line_sprites: Vec<Sprite>,
    /// Per-pixel "background color is 0" for the line being drawn.
    line_color_zero: [bool; SCREEN_WIDTH],
    back: Frame,
    handoff: FrameHandoff,
    access_contention: bool,
    /// LY matched LYC when the LCD came on; raised on the next step.
    lyc_match_pending: bool,
}

impl Ppu {
    pub fn new(handoff: FrameHandoff, access_contention: bool) -> Ppu {
        Ppu {
            vram: vec![0; VRAM_SIZE],
            oam: vec![0; OAM_SIZE],
            lcdc: LcdControl::empty(),
            stat: LcdStatus::empty(),
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            dma: 0,
            bgp: 0,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            mode: Mode::HBlank,
            mode_clock: 0,
            window_line: 0,
            line_sprites: Vec::with_capacity(MAX_SPRITES_PER_LINE),
            line_color_zero: [true; SCREEN_WIDTH],
            back: Frame::new(),
            handoff,
            access_contention,
            lyc_match_pending: false,
        }
    }

    /// Register values left behind by the boot ROM.
    pub fn apply_post_boot(&mut self) {
        self.lcdc = LcdControl::from(0x91);
        self.dma = 0xff;
        self.bgp = 0xfc;
        self.obp0 = 0xff;
        self.obp1 = 0xff;
        self.start_frame();
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.lcdc.contains(LcdControl::LCD_DISPLAY)
    }

    pub fn mode(&self) -> Mode {
        if self.is_enabled() {
            self.mode
        } else {
            Mode::HBlank
        }
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }

    fn start_frame(&mut self) {
        self.ly = 0;
        self.window_line = 0;
        self.mode = Mode::OamScan;
        self.mode_clock = 0;
        self.lyc_match_pending = self.ly == self.lyc && self.stat.contains(LcdStatus::LYC_INT);
    }

    fn vram_accessible(&self) -> bool {
        !self.access_contention || self.mode() != Mode::Drawing
    }

    fn oam_accessible(&self) -> bool {
        !self.access_contention || !matches!(self.mode(), Mode::OamScan | Mode::Drawing)
    }

    pub fn read_vram(&self, addr: u16) -> u8 {
        if !self.vram_accessible() {
            return OPEN_BUS;
        }
        self.vram[(addr - VRAM_START) as usize]
    }

    pub fn write_vram(&mut self, addr: u16, data: u8) {
        if self.vram_accessible() {
            self.vram[(addr - VRAM_START) as usize] = data;
        }
    }

    pub fn read_oam(&self, addr: u16) -> u8 {
        if !self.oam_accessible() {
            return OPEN_BUS;
        }
        self.oam[(addr - OAM_START) as usize]
    }

    pub fn write_oam(&mut self, addr: u16, data: u8) {
        if self.oam_accessible() {
            self.oam[(addr - OAM_START) as usize] = data;
        }
    }

    /// OAM DMA destination. Bypasses contention.
    /// DMA source reads see VRAM regardless of mode.
    pub fn dma_read_vram(&self, addr: u16) -> u8 {
        self.vram[(addr - VRAM_START) as usize]
    }

    pub fn dma_write_oam(&mut self, index: usize, data: u8) {
        self.oam[index] = data;
    }

    pub fn read_register(&self, addr: u16) -> u8 {
        match addr {
            LCD_CONTROL_REGISTER => self.lcdc.bits(),
            LCD_STATUS_REGISTER => {
                let coincidence = if self.ly == self.lyc { 0b100 } else { 0 };
                0b1000_0000 | self.stat.bits() | coincidence | self.mode().as_u8()
            }
            SCROLL_Y_REGISTER => self.scy,
            SCROLL_X_REGISTER => self.scx,
            SCANLINE_Y_REGISTER => self.ly,
            SCANLINE_Y_COMPARE_REGISTER => self.lyc,
            DMA_REGISTER => self.dma,
            BG_PALETTE_REGISTER => self.bgp,
            OBJ0_PALETTE_REGISTER => self.obp0,
            OBJ1_PALETTE_REGISTER => self.obp1,
            WINDOW_Y_REGISTER => self.wy,
            WINDOW_X_REGISTER => self.wx,
            _ => OPEN_BUS,
        }
    }

    pub fn write_register(&mut self, addr: u16, data: u8) {
        match addr {
            LCD_CONTROL_REGISTER => {
                let was_enabled = self.is_enabled();
                self.lcdc = LcdControl::from(data);
                match (was_enabled, self.is_enabled()) {
                    (true, false) => {
                        debug!("PPU: LCD off at LY {}", self.ly);
                        self.ly = 0;
                        self.window_line = 0;
                        self.mode = Mode::HBlank;
                        self.mode_clock = 0;
                        self.lyc_match_pending = false;
                    }
                    (false, true) => {
                        debug!("PPU: LCD on");
                        self.start_frame();
                    }
                    _ => {}
                }
            }
            LCD_STATUS_REGISTER => self.stat = LcdStatus::from(data),
            SCROLL_Y_REGISTER => self.scy = data,
            SCROLL_X_REGISTER => self.scx = data,
            // LY is read-only
            SCANLINE_Y_REGISTER => {}
            SCANLINE_Y_COMPARE_REGISTER => self.lyc = data,
            DMA_REGISTER => self.dma = data,
            BG_PALETTE_REGISTER => self.bgp = data,
            OBJ0_PALETTE_REGISTER => self.obp0 = data,
            OBJ1_PALETTE_REGISTER => self.obp1 = data,
            WINDOW_Y_REGISTER => self.wy = data,
            WINDOW_X_REGISTER => self.wx = data,
            _ => {}
        }
    }

    /// Advances the mode state machine by `cycles`, rendering and raising
    /// interrupts on each boundary crossed.
    pub fn step(&mut self, cycles: usize, irq: &mut Irq) {
        if !self.is_enabled() {
            return;
        }
        if std::mem::take(&mut self.lyc_match_pending) {
            irq.request(InterruptFlags::LCD_STAT);
        }

        self.mode_clock += cycles;
        while self.mode_clock >= self.mode.cycles() {
            self.mode_clock -= self.mode.cycles();

            match self.mode {
                Mode::OamScan => {
                    self.oam_scan();
                    self.enter(Mode::Drawing, irq);
                }
                Mode::Drawing => {
                    self.render_scanline();
                    self.enter(Mode::HBlank, irq);
                }
                Mode::HBlank => {
                    self.next_line(irq);
                    if self.ly == SCREEN_HEIGHT as u8 {
                        irq.request(InterruptFlags::VBLANK);
                        self.handoff.present(&mut self.back);
                        self.enter(Mode::VBlank, irq);
                    } else {
                        self.enter(Mode::OamScan, irq);
                    }
                }
                Mode::VBlank => {
                    self.next_line(irq);
                    if self.ly == 0 {
                        self.window_line = 0;
                        self.enter(Mode::OamScan, irq);
                    }
                }
            }
        }
    }

    fn next_line(&mut self, irq: &mut Irq) {
        self.ly = if self.ly == LAST_SCANLINE { 0 } else { self.ly + 1 };
        if self.ly == self.lyc && self.stat.contains(LcdStatus::LYC_INT) {
            irq.request(InterruptFlags::LCD_STAT);
        }
    }

    fn enter(&mut self, mode: Mode, irq: &mut Irq) {
        self.mode = mode;
        let enabled = match mode {
            Mode::HBlank => self.stat.contains(LcdStatus::HBLANK_INT),
            Mode::VBlank => self.stat.contains(LcdStatus::VBLANK_INT),
            Mode::OamScan => self.stat.contains(LcdStatus::OAM_INT),
            Mode::Drawing => false,
        };
        if enabled {
            irq.request(InterruptFlags::LCD_STAT);
        }
    }

    #[inline]
    fn sprite_height(&self) -> i16 {
        if self.lcdc.contains(LcdControl::OBJ_SIZE) {
            16
        } else {
            8
        }
    }

    /// Picks up to ten sprites in OAM order, then orders them so that the
    /// lowest X (then lowest OAM index) is drawn on top.
    fn oam_scan(&mut self) {
        let height = self.sprite_height();
        self.line_sprites.clear();
        for index in 0..SPRITE_COUNT {
            if self.line_sprites.len() == MAX_SPRITES_PER_LINE {
                break;
            }
            let sprite = Sprite::from_oam(&self.oam, index);
            if sprite.is_visible_on_scanline(self.ly, height) {
                self.line_sprites.push(sprite);
            }
        }
        self.line_sprites.sort_by_key(|sprite| (sprite.x, sprite.oam_index));
    }

    fn render_scanline(&mut self) {
        let y = self.ly as usize;
        if y >= SCREEN_HEIGHT {
            return;
        }

        let blank = Palette::from_register(self.bgp, 0);
        for x in 0..SCREEN_WIDTH {
            self.back.set_pixel(x, y, blank.into());
        }
        self.line_color_zero = [true; SCREEN_WIDTH];

        if self.lcdc.contains(LcdControl::BG_DISPLAY) {
            self.render_background(y);
            self.render_window(y);
        }
        if self.lcdc.contains(LcdControl::OBJ_DISPLAY) {
            self.render_sprites(y);
        }
    }

    fn map_offset(&self, flag: LcdControl) -> usize {
        if self.lcdc.contains(flag) {
            TILEMAP_1_OFFSET
        } else {
            TILEMAP_0_OFFSET
        }
    }

    /// Color number at (`map_x`, `map_y`) of the 256x256 map at `map`.
    fn map_color(&self, map: usize, map_x: usize, map_y: usize) -> u8 {
        let index = self.vram[map + (map_y / 8) * 32 + map_x / 8];
        let offset = tile_data_offset(index, self.lcdc.contains(LcdControl::BG_TILE_DATA));
        TileLine::fetch(&self.vram, offset, map_y % 8).color(map_x % 8)
    }

    fn put_background(&mut self, x: usize, y: usize, color: u8) {
        self.back
            .set_pixel(x, y, Palette::from_register(self.bgp, color).into());
        self.line_color_zero[x] = color == 0;
    }

    fn render_background(&mut self, y: usize) {
        let map = self.map_offset(LcdControl::BG_TILE_MAP);
        let map_y = (y + self.scy as usize) & 0xff;
        for x in 0..SCREEN_WIDTH {
            let map_x = (x + self.scx as usize) & 0xff;
            let color = self.map_color(map, map_x, map_y);
            self.put_background(x, y, color);
        }
    }

    fn render_window(&mut self, y: usize) {
        if !self.lcdc.contains(LcdControl::WINDOW_DISPLAY) || self.ly < self.wy || self.wx > WINDOW_X_MAX {
            return;
        }

        let map = self.map_offset(LcdControl::WINDOW_TILE_MAP);
        let map_y = self.window_line as usize;
        for x in 0..SCREEN_WIDTH {
            // The window's left edge sits at WX - 7.
            if x + 7 < self.wx as usize {
                continue;
            }
            let map_x = x + 7 - self.wx as usize;
            let color = self.map_color(map, map_x, map_y);
            self.put_background(x, y, color);
        }
        self.window_line = self.window_line.wrapping_add(1);
    }

    fn render_sprites(&mut self, y: usize) {
        let height = self.sprite_height();
        let mut drawn = [false; SCREEN_WIDTH];

        for sprite in &self.line_sprites {
            let mut tile = sprite.tile_index;
            if height == 16 {
                tile &= 0xfe;
            }

            let mut row = self.ly as i16 - sprite.y;
            if sprite.attributes.contains(SpriteAttributes::FLIP_Y) {
                row = height - 1 - row;
            }
            let line = TileLine::fetch(&self.vram, tile as usize * 16, row as usize);
            let palette = if sprite.attributes.contains(SpriteAttributes::PALETTE) {
                self.obp1
            } else {
                self.obp0
            };

            for px in 0..8 {
                let screen_x = sprite.x + px as i16;
                if !(0..SCREEN_WIDTH as i16).contains(&screen_x) || drawn[screen_x as usize] {
                    continue;
                }
                let screen_x = screen_x as usize;

                let column = if sprite.attributes.contains(SpriteAttributes::FLIP_X) {
                    7 - px
                } else {
                    px
                };
                let color = line.color(column);
                // Color 0 is transparent.
                if color == 0 {
                    continue;
                }
                drawn[screen_x] = true;

                if sprite.attributes.contains(SpriteAttributes::PRIORITY) && !self.line_color_zero[screen_x] {
                    continue;
                }
                self.back
                    .set_pixel(screen_x, y, Palette::from_register(palette, color).into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_ppu() -> (Ppu, Irq, FrameHandoff) {
        let handoff = FrameHandoff::new();
        let mut ppu = Ppu::new(handoff.clone(), true);
        ppu.write_register(LCD_CONTROL_REGISTER, 0x91);
        ppu.write_register(BG_PALETTE_REGISTER, 0xe4);
        let mut irq = Irq::new();
        irq.write_enable(0xff);
        (ppu, irq, handoff)
    }

    #[test]
    fn frame_takes_70224_cycles_and_visits_every_line_once() {
        let (mut ppu, mut irq, handoff) = enabled_ppu();
        let mut seen = [0u32; LAST_SCANLINE as usize + 1];
        let mut last = None;

        for _ in 0..FRAME_CYCLES / 4 {
            if last != Some(ppu.ly()) {
                seen[ppu.ly() as usize] += 1;
                last = Some(ppu.ly());
            }
            ppu.step(4, &mut irq);
        }

        assert!(seen.iter().all(|&count| count == 1));
        assert_eq!(ppu.ly(), 0);
        assert_eq!(ppu.mode(), Mode::OamScan);
        assert_eq!(handoff.frame_count(), 1);
    }

    #[test]
    fn vblank_raised_at_line_144() {
        let (mut ppu, mut irq, handoff) = enabled_ppu();
        ppu.step(SCANLINE_CYCLES * 144 - 1, &mut irq);
        assert!(!irq.pending().contains(InterruptFlags::VBLANK));
        assert_eq!(handoff.frame_count(), 0);

        ppu.step(1, &mut irq);
        assert!(irq.pending().contains(InterruptFlags::VBLANK));
        assert_eq!(ppu.mode(), Mode::VBlank);
        assert_eq!(ppu.ly(), 144);
        assert_eq!(handoff.frame_count(), 1);
    }

    #[test]
    fn stat_interrupt_on_enabled_mode_entry() {
        let (mut ppu, mut irq, _) = enabled_ppu();
        ppu.write_register(LCD_STATUS_REGISTER, LcdStatus::HBLANK_INT.bits());
        ppu.step(80, &mut irq);
        assert!(!irq.has_pending());
        ppu.step(172, &mut irq);
        assert!(irq.pending().contains(InterruptFlags::LCD_STAT));
        assert_eq!(ppu.read_register(LCD_STATUS_REGISTER) & 0b11, 0);
    }

    #[test]
    fn stat_interrupt_on_lyc_match() {
        let (mut ppu, mut irq, _) = enabled_ppu();
        ppu.write_register(SCANLINE_Y_COMPARE_REGISTER, 2);
        ppu.write_register(LCD_STATUS_REGISTER, LcdStatus::LYC_INT.bits());
        ppu.step(SCANLINE_CYCLES, &mut irq);
        assert!(!irq.has_pending());
        ppu.step(SCANLINE_CYCLES, &mut irq);
        assert!(irq.pending().contains(InterruptFlags::LCD_STAT));
        assert_eq!(ppu.read_register(LCD_STATUS_REGISTER) & 0b100, 0b100);
    }

    #[test]
    fn lcd_enable_raises_lyc_match_on_line_zero() {
        let mut ppu = Ppu::new(FrameHandoff::new(), true);
        let mut irq = Irq::new();
        irq.write_enable(0xff);
        ppu.write_register(LCD_STATUS_REGISTER, LcdStatus::LYC_INT.bits());
        ppu.write_register(LCD_CONTROL_REGISTER, 0x91);
        assert_eq!(ppu.read_register(LCD_STATUS_REGISTER) & 0b100, 0b100);

        ppu.step(4, &mut irq);
        assert!(irq.pending().contains(InterruptFlags::LCD_STAT));

        // Only once per enable.
        irq.write_flags(0);
        ppu.step(4, &mut irq);
        assert!(!irq.has_pending());
    }

    #[test]
    fn lcd_enable_without_lyc_match_stays_quiet() {
        let mut ppu = Ppu::new(FrameHandoff::new(), true);
        let mut irq = Irq::new();
        irq.write_enable(0xff);
        ppu.write_register(SCANLINE_Y_COMPARE_REGISTER, 5);
        ppu.write_register(LCD_STATUS_REGISTER, LcdStatus::LYC_INT.bits());
        ppu.write_register(LCD_CONTROL_REGISTER, 0x91);
        ppu.step(4, &mut irq);
        assert!(!irq.has_pending());
    }

    #[test]
    fn vram_and_oam_blocked_while_drawing() {
        let (mut ppu, mut irq, _) = enabled_ppu();
        ppu.write_vram(0x8000, 0x11);
        assert_eq!(ppu.mode(), Mode::OamScan);
        assert_eq!(ppu.read_oam(0xfe00), OPEN_BUS);
        ppu.write_oam(0xfe00, 0x22);

        ppu.step(80, &mut irq);
        assert_eq!(ppu.mode(), Mode::Drawing);
        assert_eq!(ppu.read_vram(0x8000), OPEN_BUS);
        ppu.write_vram(0x8000, 0x33);

        ppu.step(172, &mut irq);
        assert_eq!(ppu.read_vram(0x8000), 0x11);
        assert_eq!(ppu.read_oam(0xfe00), 0x00);
    }

    #[test]
    fn contention_can_be_disabled() {
        let mut ppu = Ppu::new(FrameHandoff::new(), false);
        ppu.write_register(LCD_CONTROL_REGISTER, 0x80);
        let mut irq = Irq::new();
        ppu.step(100, &mut irq);
        assert_eq!(ppu.mode(), Mode::Drawing);
        ppu.write_vram(0x8000, 0x44);
        assert_eq!(ppu.read_vram(0x8000), 0x44);
    }

    #[test]
    fn disabled_lcd_holds_line_zero() {
        let (mut ppu, mut irq, _) = enabled_ppu();
        ppu.step(SCANLINE_CYCLES * 3 + 10, &mut irq);
        assert_eq!(ppu.ly(), 3);

        ppu.write_register(LCD_CONTROL_REGISTER, 0x11);
        irq.write_flags(0);
        ppu.step(FRAME_CYCLES, &mut irq);
        assert_eq!(ppu.ly(), 0);
        assert_eq!(ppu.read_register(LCD_STATUS_REGISTER) & 0b11, 0);
        assert!(!irq.has_pending());

        ppu.write_register(SCANLINE_Y_REGISTER, 0x50);
        assert_eq!(ppu.ly(), 0);
    }

    #[test]
    fn renders_background_tile() {
        let (mut ppu, mut irq, handoff) = enabled_ppu();
        // Tile 1, row 0: leftmost pixel color 3, next color 1.
        ppu.write_vram(0x8010, 0b1100_0000);
        ppu.write_vram(0x8011, 0b1000_0000);
        ppu.write_vram(0x9800, 0x01);

        ppu.step(FRAME_CYCLES, &mut irq);
        let frame = handoff.latest();
        assert_eq!(frame.pixel(0, 0), 0xff000000);
        assert_eq!(frame.pixel(1, 0), 0xffaaaaaa);
        assert_eq!(frame.pixel(2, 0), 0xffffffff);
        assert_eq!(frame.pixel(8, 0), 0xffffffff);
    }

    #[test]
    fn lower_x_sprite_wins_overlap() {
        let (mut ppu, mut irq, handoff) = enabled_ppu();
        ppu.write_register(LCD_CONTROL_REGISTER, 0x93);
        ppu.write_register(OBJ0_PALETTE_REGISTER, 0xe4);
        ppu.write_register(OBJ1_PALETTE_REGISTER, 0x1b);
        // Tile 2 is a solid color 3 row.
        ppu.write_vram(0x8020, 0xff);
        ppu.write_vram(0x8021, 0xff);

        // OAM index 0 at x=12 using OBP1, index 1 at x=10 using OBP0.
        for (index, byte) in [16, 20, 2, 0x10, 16, 18, 2, 0x00].iter().enumerate() {
            ppu.dma_write_oam(index, *byte);
        }

        ppu.step(FRAME_CYCLES, &mut irq);
        let frame = handoff.latest();
        // OBP0 maps 3 to black, OBP1 maps 3 to white.
        assert_eq!(frame.pixel(10, 0), 0xff000000);
        assert_eq!(frame.pixel(17, 0), 0xff000000);
        assert_eq!(frame.pixel(18, 0), 0xffffffff);
    }
}
