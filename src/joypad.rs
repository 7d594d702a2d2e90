use crate::lr35902::irq::Irq;
use crate::memory::registers::InterruptFlags;
use log::warn;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const SELECT_DIRECTIONS: u8 = 0b0001_0000;
const SELECT_BUTTONS: u8 = 0b0010_0000;

/// Frontend-facing button snapshot. Packs into one byte: bit 0 A, 1 B, 2 Start,
/// 3 Select, 4 Up, 5 Down, 6 Left, 7 Right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub a: bool,
    pub b: bool,
    pub start: bool,
    pub select: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl ButtonState {
    pub fn bits(&self) -> u8 {
        [
            self.a,
            self.b,
            self.start,
            self.select,
            self.up,
            self.down,
            self.left,
            self.right,
        ]
        .iter()
        .enumerate()
        .fold(0, |acc, (bit, &pressed)| acc | ((pressed as u8) << bit))
    }

    pub fn from_bits(bits: u8) -> ButtonState {
        let pressed = |bit: u8| bits & (1 << bit) != 0;
        ButtonState {
            a: pressed(0),
            b: pressed(1),
            start: pressed(2),
            select: pressed(3),
            up: pressed(4),
            down: pressed(5),
            left: pressed(6),
            right: pressed(7),
        }
    }
}

/// Shared button byte, written by the presentation thread as a whole.
#[derive(Debug, Clone, Default)]
pub struct InputHandle(Arc<AtomicU8>);

impl InputHandle {
    pub fn new() -> InputHandle {
        InputHandle::default()
    }

    pub fn set(&self, state: ButtonState) {
        self.0.store(state.bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> ButtonState {
        ButtonState::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// P1 register at $FF00.
#[derive(Debug, Clone)]
pub struct Joypad {
    select: u8,
    input: InputHandle,
    /// Low nibble as last sampled, active low.
    lines: u8,
}

impl Joypad {
    pub fn new(input: InputHandle) -> Joypad {
        Joypad {
            select: SELECT_DIRECTIONS | SELECT_BUTTONS,
            input,
            lines: 0x0f,
        }
    }

    fn lines(&self) -> u8 {
        let state = self.input.get().bits();
        let mut pressed = 0;
        if self.select & SELECT_BUTTONS == 0 {
            // A, B, Select, Start on the wire; Start and Select swap places.
            let start = (state >> 2) & 1;
            let select = (state >> 3) & 1;
            pressed |= (state & 0b11) | (select << 2) | (start << 3);
        }
        if self.select & SELECT_DIRECTIONS == 0 {
            // Right, Left, Up, Down occupy bits 0-3 on the wire.
            let right = (state >> 7) & 1;
            let left = (state >> 6) & 1;
            let up = (state >> 4) & 1;
            let down = (state >> 5) & 1;
            pressed |= right | (left << 1) | (up << 2) | (down << 3);
        }
        !pressed & 0x0f
    }

    pub fn read(&self) -> u8 {
        0b1100_0000 | self.select | self.lines()
    }

    pub fn write(&mut self, data: u8) {
        let select = data & (SELECT_DIRECTIONS | SELECT_BUTTONS);
        if select == 0 && self.select != 0 {
            warn!("Joypad has buttons and d-pad mode selected");
        }
        self.select = select;
    }

    /// Requests JOYPAD when a selected line goes from high to low.
    pub fn tick(&mut self, irq: &mut Irq) {
        let lines = self.lines();
        if self.lines & !lines != 0 {
            irq.request(InterruptFlags::JOYPAD);
        }
        self.lines = lines;
    }
}
