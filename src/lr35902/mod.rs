pub mod cpu;
mod handlers;
pub mod irq;
pub mod registers;
pub mod sm83;
pub mod timer;

pub const T_CYCLES_PER_SECOND: usize = 4_194_304;
